//! Field-precedence resolution.
//!
//! Every displayed field value is decided by the same strict order: a user
//! edit wins if the key is present (whatever the value, including `false`,
//! `0`, and the empty string), then generated content, then the report's
//! own captured data, then the caller's default. Array values become
//! newline-joined display strings. Missing intermediate objects resolve to
//! the default; resolution never fails.

use serde::Deserialize;
use serde_json::Value;

use crate::project::{Contractor, Project};
use crate::report::{Activity, EquipmentEntry, Operation, Report};

/// Where to look for one field: the path in the report's own namespace,
/// the path in the generated payload, and optionally an older generated
/// field name kept alive across payload schema revisions.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec<'a> {
    pub report_path: &'a str,
    pub ai_path: &'a str,
    pub legacy_ai_path: Option<&'a str>,
}

impl<'a> FieldSpec<'a> {
    pub fn new(report_path: &'a str, ai_path: &'a str) -> Self {
        Self {
            report_path,
            ai_path,
            legacy_ai_path: None,
        }
    }

    pub fn with_legacy(mut self, legacy: &'a str) -> Self {
        self.legacy_ai_path = Some(legacy);
        self
    }
}

/// Walk a dotted path through nested JSON objects.
pub fn json_path<'v>(root: &'v Value, path: &str) -> Option<&'v Value> {
    let mut current = root;
    for segment in path.split('.') {
        current = current.get(segment)?;
    }
    Some(current)
}

/// Arrays are display-joined with newlines; everything else passes through.
fn displayable(value: &Value) -> Value {
    match value {
        Value::Array(items) => {
            let joined = items
                .iter()
                .map(|item| match item {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("\n");
            Value::String(joined)
        }
        other => other.clone(),
    }
}

/// A candidate counts only when it is present, non-null, and not `""`.
fn usable(value: Option<&Value>) -> Option<Value> {
    let value = value?;
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        other => Some(displayable(other)),
    }
}

/// Read-only view over one report for precedence resolution. The canonical
/// report is serialized once so dotted paths work uniformly across both
/// namespaces.
pub struct Resolver<'a> {
    report: &'a Report,
    report_json: Value,
}

impl<'a> Resolver<'a> {
    pub fn new(report: &'a Report) -> Self {
        let report_json = serde_json::to_value(report).unwrap_or_default();
        Self {
            report,
            report_json,
        }
    }

    /// Resolve one field. `field_path` keys the user-edit map; the
    /// [`FieldSpec`] names the fallback locations.
    pub fn resolve(&self, field_path: &str, spec: FieldSpec<'_>, default: Value) -> Value {
        if let Some(edited) = self.report.user_edits.get(field_path) {
            return edited.clone();
        }

        if let Some(ai) = &self.report.ai_generated {
            let mut candidate = usable(json_path(ai, spec.ai_path));
            if candidate.is_none() {
                if let Some(legacy) = spec.legacy_ai_path {
                    candidate = usable(json_path(ai, legacy));
                }
            }
            if let Some(value) = candidate {
                return value;
            }
        }

        if let Some(value) = usable(json_path(&self.report_json, spec.report_path)) {
            return value;
        }

        default
    }

    /// Text convenience over [`resolve`]: the common case for form fields.
    pub fn resolve_text(&self, field_path: &str, spec: FieldSpec<'_>, default: &str) -> String {
        match self.resolve(field_path, spec, Value::String(default.to_string())) {
            Value::String(s) => s,
            Value::Null => default.to_string(),
            other => other.to_string(),
        }
    }

    /// Single-namespace variant: report path and edit key are the same and
    /// there is no generated counterpart.
    pub fn value(&self, path: &str, default: Value) -> Value {
        self.resolve(path, FieldSpec::new(path, path), default)
    }
}

// ---------------------------------------------------------------------------
// Per-contractor sub-resolution
// ---------------------------------------------------------------------------

/// Tolerant parse shape for generated activity entries. Generated payloads
/// have drifted between camelCase and snake_case; accept both.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedActivity {
    #[serde(alias = "contractorId")]
    contractor_id: Option<String>,
    #[serde(alias = "contractorName")]
    contractor_name: Option<String>,
    #[serde(alias = "noWork", alias = "no_work_performed")]
    no_work: Option<bool>,
    narrative: Option<String>,
    #[serde(alias = "equipmentUsed")]
    equipment_used: Option<String>,
    crew: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedOperation {
    #[serde(alias = "contractorId")]
    contractor_id: Option<String>,
    #[serde(alias = "contractorName")]
    contractor_name: Option<String>,
    superintendents: Option<i32>,
    foremen: Option<i32>,
    operators: Option<i32>,
    laborers: Option<i32>,
    surveyors: Option<i32>,
    others: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GeneratedEquipment {
    #[serde(alias = "equipmentId")]
    equipment_id: Option<String>,
    #[serde(alias = "contractorId")]
    contractor_id: Option<String>,
    #[serde(alias = "contractorName")]
    contractor_name: Option<String>,
    #[serde(rename = "type")]
    kind: Option<String>,
    #[serde(alias = "quantity")]
    qty: Option<i32>,
    status: Option<String>,
    #[serde(alias = "hoursUsed", alias = "hours_used")]
    hours_used: Option<i32>,
}

fn generated_entries<T: for<'de> Deserialize<'de>>(ai: Option<&Value>, key: &str) -> Vec<T> {
    let Some(items) = ai.and_then(|v| v.get(key)).and_then(Value::as_array) else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(|item| serde_json::from_value(item.clone()).ok())
        .collect()
}

/// Match a generated entry to a contractor: exact id first, then (for
/// freeform capture, where ids are absent) a case-insensitive name match.
fn matches_contractor(
    entry_id: &Option<String>,
    entry_name: &Option<String>,
    contractor: &Contractor,
) -> bool {
    match entry_id {
        Some(id) if !id.is_empty() => id == &contractor.id,
        _ => entry_name
            .as_deref()
            .map(|name| contractor.name.eq_ignore_ascii_case(name))
            .unwrap_or(false),
    }
}

/// Work-activity resolution for one contractor:
/// user edit → generated entry → the report's own list → None.
pub fn contractor_activity(
    report: &Report,
    contractors: &[Contractor],
    contractor_id: &str,
) -> Option<Activity> {
    let edit_key = format!("activity_{contractor_id}");
    if let Some(edited) = report.user_edits.get(&edit_key) {
        if !edited.is_null() {
            if let Ok(activity) = serde_json::from_value::<Activity>(edited.clone()) {
                return Some(activity);
            }
        }
    }

    let contractor = contractors.iter().find(|c| c.id == contractor_id);
    if let Some(contractor) = contractor {
        let generated: Vec<GeneratedActivity> =
            generated_entries(report.ai_generated.as_ref(), "activities");
        if let Some(entry) = generated
            .iter()
            .find(|g| matches_contractor(&g.contractor_id, &g.contractor_name, contractor))
        {
            return Some(Activity {
                contractor_id: contractor_id.to_string(),
                no_work: entry.no_work.unwrap_or(false),
                narrative: entry.narrative.clone().unwrap_or_default(),
                equipment_used: entry.equipment_used.clone().unwrap_or_default(),
                crew: entry.crew.clone().unwrap_or_default(),
            });
        }
    }

    report.activity_for(contractor_id).cloned()
}

/// Personnel-count resolution for one contractor, same order as
/// [`contractor_activity`].
pub fn contractor_operations(
    report: &Report,
    contractors: &[Contractor],
    contractor_id: &str,
) -> Option<Operation> {
    let edit_key = format!("operations_{contractor_id}");
    if let Some(edited) = report.user_edits.get(&edit_key) {
        if !edited.is_null() {
            if let Ok(operation) = serde_json::from_value::<Operation>(edited.clone()) {
                return Some(operation);
            }
        }
    }

    let contractor = contractors.iter().find(|c| c.id == contractor_id);
    if let Some(contractor) = contractor {
        let generated: Vec<GeneratedOperation> =
            generated_entries(report.ai_generated.as_ref(), "operations");
        if let Some(entry) = generated
            .iter()
            .find(|g| matches_contractor(&g.contractor_id, &g.contractor_name, contractor))
        {
            return Some(Operation {
                contractor_id: contractor_id.to_string(),
                superintendents: entry.superintendents.unwrap_or(0),
                foremen: entry.foremen.unwrap_or(0),
                operators: entry.operators.unwrap_or(0),
                laborers: entry.laborers.unwrap_or(0),
                surveyors: entry.surveyors.unwrap_or(0),
                others: entry.others.unwrap_or(0),
            });
        }
    }

    report.operation_for(contractor_id).cloned()
}

/// Equipment resolution is list-level: a non-empty list on the report is
/// already user-reconciled and wins outright. Otherwise every generated
/// entry is mapped, resolving the kind from the project's equipment
/// catalog and the contractor id from the name when absent. Unknown
/// contractor ids are kept; diagnostics reports them.
pub fn equipment_rows(report: &Report, project: &Project) -> Vec<EquipmentEntry> {
    if !report.equipment.is_empty() {
        return report.equipment.clone();
    }

    let generated: Vec<GeneratedEquipment> =
        generated_entries(report.ai_generated.as_ref(), "equipment");
    generated
        .into_iter()
        .map(|entry| {
            let mut kind = entry.kind.clone().unwrap_or_default();
            if let Some(id) = entry.equipment_id.as_deref() {
                if let Some(item) = project.catalog_item(id) {
                    kind = if item.kind.is_empty() {
                        item.model.clone()
                    } else {
                        item.kind.clone()
                    };
                }
            }

            let mut contractor_id = entry.contractor_id.clone().unwrap_or_default();
            if contractor_id.is_empty() {
                if let Some(name) = entry.contractor_name.as_deref() {
                    if let Some(known) = project.contractor_by_name(name) {
                        contractor_id = known.id.clone();
                    }
                }
            }

            let status = match (&entry.status, entry.hours_used) {
                (Some(s), _) if !s.is_empty() => s.clone(),
                (_, Some(hours)) if hours > 0 => format!("{hours} hrs"),
                _ => "IDLE".to_string(),
            };

            EquipmentEntry {
                equipment_id: entry.equipment_id,
                contractor_id,
                contractor_name: entry.contractor_name.unwrap_or_default(),
                kind,
                qty: entry.qty.unwrap_or(1),
                status,
                hours_utilized: entry.hours_used.filter(|h| *h > 0),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::project::EquipmentCatalogItem;
    use serde_json::json;

    fn contractor(id: &str, name: &str) -> Contractor {
        Contractor {
            id: id.to_string(),
            name: name.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn user_edit_wins_even_when_falsy() {
        let mut report = Report::default();
        report.issues = "captured issue".to_string();
        report.user_edits.insert("issues".to_string(), json!(""));

        let resolver = Resolver::new(&report);
        let value = resolver.resolve(
            "issues",
            FieldSpec::new("issues", "issues_delays"),
            json!("default"),
        );
        assert_eq!(value, json!(""));

        report.user_edits.insert("safety.hasIncident".to_string(), json!(false));
        let resolver = Resolver::new(&report);
        assert_eq!(
            resolver.value("safety.hasIncident", json!(true)),
            json!(false)
        );
    }

    #[test]
    fn generated_value_beats_captured_and_joins_arrays() {
        let mut report = Report::default();
        report.issues = "captured".to_string();
        report.ai_generated = Some(json!({
            "issues_delays": ["Crane late", "Rain 10:00-11:00"]
        }));

        let resolver = Resolver::new(&report);
        let value = resolver.resolve_text("issues", FieldSpec::new("issues", "issues_delays"), "");
        assert_eq!(value, "Crane late\nRain 10:00-11:00");
    }

    #[test]
    fn legacy_path_is_tried_when_current_is_empty() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "issues_delays": "",
            "generalIssues": ["Old-format issue"]
        }));

        let resolver = Resolver::new(&report);
        let value = resolver.resolve_text(
            "issues",
            FieldSpec::new("issues", "issues_delays").with_legacy("generalIssues"),
            "",
        );
        assert_eq!(value, "Old-format issue");
    }

    #[test]
    fn falls_through_to_captured_notes_without_generated_payload() {
        let mut report = Report::default();
        report.guided_notes.work_summary = "Poured foundation".to_string();

        let resolver = Resolver::new(&report);
        let value = resolver.resolve_text(
            "guidedNotes.workSummary",
            FieldSpec::new("guidedNotes.workSummary", "work_summary"),
            "",
        );
        assert_eq!(value, "Poured foundation");
    }

    #[test]
    fn missing_segments_resolve_to_default() {
        let report = Report::default();
        let resolver = Resolver::new(&report);
        let value = resolver.resolve(
            "nope.deeper.path",
            FieldSpec::new("nope.deeper.path", "also.missing"),
            json!("fallback"),
        );
        assert_eq!(value, json!("fallback"));
    }

    #[test]
    fn activity_matches_generated_by_exact_id() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "activities": [
                {"contractorId": "c1", "narrative": "Set forms", "noWork": false}
            ]
        }));
        let contractors = vec![contractor("c1", "Acme")];

        let activity = contractor_activity(&report, &contractors, "c1").unwrap();
        assert_eq!(activity.narrative, "Set forms");
        assert_eq!(activity.contractor_id, "c1");
    }

    #[test]
    fn activity_falls_back_to_case_insensitive_name() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "activities": [
                {"contractorId": null, "contractorName": "Acme", "narrative": "Demo walls"}
            ]
        }));
        let contractors = vec![contractor("c1", "ACME")];

        let activity = contractor_activity(&report, &contractors, "c1").unwrap();
        assert_eq!(activity.narrative, "Demo walls");
    }

    #[test]
    fn user_edited_activity_preempts_generated() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "activities": [{"contractorId": "c1", "narrative": "generated"}]
        }));
        report.user_edits.insert(
            "activity_c1".to_string(),
            json!({"contractorId": "c1", "narrative": "edited by hand"}),
        );
        let contractors = vec![contractor("c1", "Acme")];

        let activity = contractor_activity(&report, &contractors, "c1").unwrap();
        assert_eq!(activity.narrative, "edited by hand");
    }

    #[test]
    fn activity_falls_back_to_report_list() {
        let mut report = Report::default();
        report.activities = vec![Activity {
            contractor_id: "c2".to_string(),
            narrative: "Hauled spoil".to_string(),
            ..Default::default()
        }];
        let contractors = vec![contractor("c2", "Delta")];

        let activity = contractor_activity(&report, &contractors, "c2").unwrap();
        assert_eq!(activity.narrative, "Hauled spoil");
        assert!(contractor_activity(&report, &contractors, "c9").is_none());
    }

    #[test]
    fn operations_resolve_generated_counts() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "operations": [
                {"contractorId": "c1", "foremen": 1, "laborers": 6}
            ]
        }));
        let contractors = vec![contractor("c1", "Acme")];

        let ops = contractor_operations(&report, &contractors, "c1").unwrap();
        assert_eq!(ops.foremen, 1);
        assert_eq!(ops.laborers, 6);
        assert_eq!(ops.total(), 7);
    }

    #[test]
    fn own_equipment_list_wins_outright() {
        let mut report = Report::default();
        report.equipment = vec![EquipmentEntry {
            kind: "Grader".to_string(),
            qty: 1,
            status: "IDLE".to_string(),
            ..Default::default()
        }];
        report.ai_generated = Some(json!({
            "equipment": [{"type": "Dozer", "qty": 3}]
        }));
        let project = Project::default();

        let rows = equipment_rows(&report, &project);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "Grader");
    }

    #[test]
    fn generated_equipment_resolves_catalog_and_contractor_name() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "equipment": [
                {"equipmentId": "e7", "contractorName": "acme", "hoursUsed": 6}
            ]
        }));
        let project = Project {
            contractors: vec![contractor("c1", "Acme")],
            equipment: vec![EquipmentCatalogItem {
                id: "e7".to_string(),
                kind: "CAT 320 Excavator".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };

        let rows = equipment_rows(&report, &project);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].kind, "CAT 320 Excavator");
        assert_eq!(rows[0].contractor_id, "c1");
        assert_eq!(rows[0].status, "6 hrs");
        assert_eq!(rows[0].hours_utilized, Some(6));
    }

    #[test]
    fn unknown_generated_contractor_id_is_retained() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "equipment": [{"type": "Roller", "contractorId": "ghost"}]
        }));
        let project = Project::default();

        let rows = equipment_rows(&report, &project);
        assert_eq!(rows[0].contractor_id, "ghost");
    }
}
