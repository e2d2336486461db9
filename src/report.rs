//! The report aggregate and its persisted row shapes.
//!
//! A report is assembled from four separately persisted sources (header
//! row, raw-capture row, photo rows, generated-content row) into the one
//! canonical object the rest of the system reads. The nested entry lists
//! live inside the raw-capture row as a JSON region in `snake_case`
//! record shapes; conversion in both directions is lossless for
//! activities, operations, equipment, and user edits.

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::project::Project;

/// User overrides keyed by dotted field path (or `activity_<id>` /
/// `operations_<id>` for per-contractor records). Insertion order is kept
/// so persisted edit lists stay stable across saves.
pub type UserEdits = IndexMap<String, Value>;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportStatus {
    #[default]
    Draft,
    PendingRefine,
    Refined,
    Submitted,
}

impl ReportStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::PendingRefine => "pending_refine",
            Self::Refined => "refined",
            Self::Submitted => "submitted",
        }
    }

    pub fn parse(s: &str) -> Self {
        match s {
            "pending_refine" => Self::PendingRefine,
            "refined" => Self::Refined,
            "submitted" => Self::Submitted,
            _ => Self::Draft,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CaptureMode {
    /// Structured prompts: work summary, issues, safety
    #[default]
    Guided,
    /// One freeform block
    Minimal,
}

impl CaptureMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guided => "guided",
            Self::Minimal => "minimal",
        }
    }

    pub fn parse(s: &str) -> Self {
        if s == "minimal" {
            Self::Minimal
        } else {
            Self::Guided
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportMeta {
    pub created_at: DateTime<Utc>,
    pub last_saved: Option<DateTime<Utc>>,
    pub status: ReportStatus,
    pub capture_mode: CaptureMode,
    pub report_viewed: bool,
}

impl Default for ReportMeta {
    fn default() -> Self {
        Self {
            created_at: Utc::now(),
            last_saved: None,
            status: ReportStatus::Draft,
            capture_mode: CaptureMode::Guided,
            report_viewed: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Weather {
    pub high_temp: String,
    pub low_temp: String,
    pub precipitation: String,
    pub general_condition: String,
    pub job_site_condition: String,
    pub adverse_conditions: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Overview {
    pub project_name: String,
    pub noab_project_no: String,
    pub cno_solicitation_no: String,
    pub location: String,
    /// Report date as `YYYY-MM-DD`
    pub date: String,
    pub contract_day: String,
    pub weather_days: i32,
    pub engineer: String,
    pub contractor: String,
    pub start_time: String,
    pub end_time: String,
    pub completed_by: String,
    pub weather: Weather,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Activity {
    pub contractor_id: String,
    pub no_work: bool,
    pub narrative: String,
    pub equipment_used: String,
    pub crew: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Operation {
    pub contractor_id: String,
    pub superintendents: i32,
    pub foremen: i32,
    pub operators: i32,
    pub laborers: i32,
    pub surveyors: i32,
    pub others: i32,
}

impl Operation {
    pub fn total(&self) -> i32 {
        self.superintendents + self.foremen + self.operators + self.laborers + self.surveyors
            + self.others
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentEntry {
    pub equipment_id: Option<String>,
    pub contractor_id: String,
    pub contractor_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub qty: i32,
    /// Display status: `IDLE` or `<n> hrs`
    pub status: String,
    pub hours_utilized: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Safety {
    pub has_incident: bool,
    pub notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Signature {
    pub name: String,
    pub title: String,
    pub company: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GpsPoint {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PhotoView {
    pub id: String,
    /// Public URL derived from the storage path and the configured base
    pub url: String,
    pub storage_path: String,
    pub file_name: String,
    pub caption: String,
    pub date: String,
    pub time: String,
    pub gps: Option<GpsPoint>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FieldNotes {
    pub freeform_notes: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GuidedNotes {
    pub work_summary: String,
    pub issues: String,
    pub safety: String,
}

/// The assembled report aggregate. Serializes to `camelCase`, which is the
/// namespace the field-precedence resolver navigates with dotted paths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Report {
    pub meta: ReportMeta,
    pub overview: Overview,
    pub activities: Vec<Activity>,
    pub operations: Vec<Operation>,
    pub equipment: Vec<EquipmentEntry>,
    pub issues: String,
    pub qaqc: String,
    pub safety: Safety,
    pub communications: String,
    pub visitors: String,
    pub photos: Vec<PhotoView>,
    pub signature: Signature,
    /// Generated content, kept untyped: the system is permissive about
    /// remote-returned shapes and the diagnostics module reports drift.
    pub ai_generated: Option<Value>,
    pub user_edits: UserEdits,
    pub field_notes: FieldNotes,
    pub guided_notes: GuidedNotes,
}

impl Report {
    /// A fresh report seeded from the active project's defaults. Used when
    /// no header row exists for the requested date; "not found" is never an
    /// error on the read path.
    pub fn fresh(project: Option<&Project>, date: &str) -> Self {
        let mut report = Report::default();
        report.overview.date = date.to_string();
        report.overview.start_time = "06:00".to_string();
        report.overview.end_time = "16:00".to_string();
        if let Some(p) = project {
            report.overview.project_name = p.project_name.clone();
            report.overview.noab_project_no = p.noab_project_no.clone();
            report.overview.cno_solicitation_no = if p.cno_solicitation_no.is_empty() {
                "N/A".to_string()
            } else {
                p.cno_solicitation_no.clone()
            };
            report.overview.location = p.location.clone();
            report.overview.weather_days = p.weather_days;
            report.overview.engineer = p.engineer.clone();
            report.overview.contractor = p.prime_contractor.clone();
            if !p.default_start_time.is_empty() {
                report.overview.start_time = p.default_start_time.clone();
            }
            if !p.default_end_time.is_empty() {
                report.overview.end_time = p.default_end_time.clone();
            }
        }
        report
    }

    /// Record a user edit: the override map always gets the value, and the
    /// known scalar paths are mirrored into the typed fields so the next
    /// disassembly persists what the user sees.
    pub fn apply_edit(&mut self, path: &str, value: Value) {
        self.mirror_edit(path, &value);
        self.user_edits.insert(path.to_string(), value);
    }

    fn mirror_edit(&mut self, path: &str, value: &Value) {
        let text = || match value {
            Value::String(s) => s.clone(),
            Value::Null => String::new(),
            other => other.to_string(),
        };
        match path {
            "overview.projectName" => self.overview.project_name = text(),
            "overview.noabProjectNo" => self.overview.noab_project_no = text(),
            "overview.cnoSolicitationNo" => self.overview.cno_solicitation_no = text(),
            "overview.location" => self.overview.location = text(),
            "overview.date" => self.overview.date = text(),
            "overview.contractDay" => self.overview.contract_day = text(),
            "overview.weatherDays" => {
                self.overview.weather_days = match value {
                    Value::Number(n) => n.as_i64().unwrap_or(0) as i32,
                    Value::String(s) => s.trim().parse().unwrap_or(0),
                    _ => 0,
                }
            }
            "overview.engineer" => self.overview.engineer = text(),
            "overview.contractor" => self.overview.contractor = text(),
            "overview.startTime" => self.overview.start_time = text(),
            "overview.endTime" => self.overview.end_time = text(),
            "overview.completedBy" => self.overview.completed_by = text(),
            "overview.weather.highTemp" => self.overview.weather.high_temp = text(),
            "overview.weather.lowTemp" => self.overview.weather.low_temp = text(),
            "overview.weather.precipitation" => self.overview.weather.precipitation = text(),
            "overview.weather.generalCondition" => {
                self.overview.weather.general_condition = text()
            }
            "overview.weather.jobSiteCondition" => {
                self.overview.weather.job_site_condition = text()
            }
            "overview.weather.adverseConditions" => {
                self.overview.weather.adverse_conditions = text()
            }
            "issues" => self.issues = text(),
            "qaqc" => self.qaqc = text(),
            "communications" => self.communications = text(),
            "visitors" => self.visitors = text(),
            "safety.notes" => self.safety.notes = text(),
            "safety.hasIncident" => self.safety.has_incident = value.as_bool().unwrap_or(false),
            "signature.name" => self.signature.name = text(),
            "signature.title" => self.signature.title = text(),
            "signature.company" => self.signature.company = text(),
            "guidedNotes.workSummary" => self.guided_notes.work_summary = text(),
            // Composite keys (activity_<id>, operations_<id>) and unknown
            // paths live in the override map only.
            _ => {}
        }
    }

    /// Find this report's own activity entry for a contractor.
    pub fn activity_for(&self, contractor_id: &str) -> Option<&Activity> {
        self.activities.iter().find(|a| a.contractor_id == contractor_id)
    }

    /// Find this report's own personnel entry for a contractor.
    pub fn operation_for(&self, contractor_id: &str) -> Option<&Operation> {
        self.operations.iter().find(|o| o.contractor_id == contractor_id)
    }

    /// Denormalize the four nested lists into the persisted JSON region.
    pub fn to_raw_entries(&self, edited_at: DateTime<Utc>) -> RawEntries {
        RawEntries {
            user_edits: self
                .user_edits
                .iter()
                .map(|(path, value)| UserEditRecord {
                    field_path: path.clone(),
                    edited_value: value.clone(),
                    edited_at,
                })
                .collect(),
            contractor_work: self.activities.iter().map(ContractorWorkRecord::from).collect(),
            personnel: self.operations.iter().map(PersonnelRecord::from).collect(),
            equipment_usage: self.equipment.iter().map(EquipmentUsageRecord::from).collect(),
        }
    }

    /// Unpack a persisted JSON region back into the canonical lists.
    pub fn apply_raw_entries(&mut self, entries: RawEntries) {
        self.activities = entries.contractor_work.iter().map(Activity::from).collect();
        self.operations = entries.personnel.iter().map(Operation::from).collect();
        self.equipment = entries.equipment_usage.iter().map(EquipmentEntry::from).collect();
        self.user_edits = entries
            .user_edits
            .into_iter()
            .map(|record| (record.field_path, record.edited_value))
            .collect();
    }
}

// ---------------------------------------------------------------------------
// Persisted row shapes (the snake_case JSON region inside the raw capture)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawEntries {
    pub user_edits: Vec<UserEditRecord>,
    pub contractor_work: Vec<ContractorWorkRecord>,
    pub personnel: Vec<PersonnelRecord>,
    pub equipment_usage: Vec<EquipmentUsageRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserEditRecord {
    pub field_path: String,
    pub edited_value: Value,
    pub edited_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractorWorkRecord {
    pub contractor_id: String,
    pub no_work_performed: bool,
    pub narrative: String,
    pub equipment_used: String,
    pub crew: String,
}

impl From<&Activity> for ContractorWorkRecord {
    fn from(a: &Activity) -> Self {
        Self {
            contractor_id: a.contractor_id.clone(),
            no_work_performed: a.no_work,
            narrative: a.narrative.clone(),
            equipment_used: a.equipment_used.clone(),
            crew: a.crew.clone(),
        }
    }
}

impl From<&ContractorWorkRecord> for Activity {
    fn from(record: &ContractorWorkRecord) -> Self {
        Self {
            contractor_id: record.contractor_id.clone(),
            no_work: record.no_work_performed,
            narrative: record.narrative.clone(),
            equipment_used: record.equipment_used.clone(),
            crew: record.crew.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonnelRecord {
    pub contractor_id: String,
    pub superintendents: i32,
    pub foremen: i32,
    pub operators: i32,
    pub laborers: i32,
    pub surveyors: i32,
    pub others: i32,
}

impl From<&Operation> for PersonnelRecord {
    fn from(o: &Operation) -> Self {
        Self {
            contractor_id: o.contractor_id.clone(),
            superintendents: o.superintendents,
            foremen: o.foremen,
            operators: o.operators,
            laborers: o.laborers,
            surveyors: o.surveyors,
            others: o.others,
        }
    }
}

impl From<&PersonnelRecord> for Operation {
    fn from(record: &PersonnelRecord) -> Self {
        Self {
            contractor_id: record.contractor_id.clone(),
            superintendents: record.superintendents,
            foremen: record.foremen,
            operators: record.operators,
            laborers: record.laborers,
            surveyors: record.surveyors,
            others: record.others,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EquipmentUsageRecord {
    pub equipment_id: Option<String>,
    pub contractor_id: String,
    pub contractor_name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub qty: i32,
    /// `idle` or `active`
    pub status: String,
    pub hours_used: i32,
    pub notes: String,
}

impl From<&EquipmentEntry> for EquipmentUsageRecord {
    fn from(e: &EquipmentEntry) -> Self {
        let idle = e.status == "IDLE";
        Self {
            equipment_id: e.equipment_id.clone(),
            contractor_id: e.contractor_id.clone(),
            contractor_name: e.contractor_name.clone(),
            kind: e.kind.clone(),
            qty: e.qty.max(1),
            status: if idle { "idle" } else { "active" }.to_string(),
            hours_used: if idle { 0 } else { leading_int(&e.status) },
            notes: String::new(),
        }
    }
}

impl From<&EquipmentUsageRecord> for EquipmentEntry {
    fn from(record: &EquipmentUsageRecord) -> Self {
        let idle = record.status == "idle";
        Self {
            equipment_id: record.equipment_id.clone(),
            contractor_id: record.contractor_id.clone(),
            contractor_name: record.contractor_name.clone(),
            kind: record.kind.clone(),
            qty: record.qty,
            status: if idle {
                "IDLE".to_string()
            } else {
                format!("{} hrs", record.hours_used)
            },
            hours_utilized: (record.hours_used != 0).then_some(record.hours_used),
        }
    }
}

fn leading_int(s: &str) -> i32 {
    let digits: String = s.trim().chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().unwrap_or(0)
}
