//! Advisory detection of drift between generated payloads and the shapes
//! the reconciliation layer expects, plus the operator-facing debug
//! exports. Nothing here gates data flow: a report with detected issues
//! still saves and submits normally.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::project::Contractor;
use crate::report::Report;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Unexpected key versus the expected-key allowlist
    Schema,
    /// Generated field empty while the captured note has content
    Empty,
    /// String where an array was expected
    TypeShape,
    /// Generated contractor id matches no known contractor
    Contractor,
}

impl IssueKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Schema => "schema",
            Self::Empty => "empty",
            Self::TypeShape => "type_shape",
            Self::Contractor => "contractor",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldIssue {
    pub kind: IssueKind,
    pub field: String,
    pub message: String,
}

impl FieldIssue {
    fn new(kind: IssueKind, field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            message: message.into(),
        }
    }
}

// Current payload keys plus the older spellings still seen from payloads
// generated before the field-name revision.
const EXPECTED_TOP_LEVEL: &[&str] = &[
    "activities",
    "operations",
    "equipment",
    "safety",
    "issues_delays",
    "qaqc_notes",
    "communications",
    "visitors_deliveries",
    "executive_summary",
    "generalIssues",
    "qaqcNotes",
    "contractorCommunications",
    "visitorsRemarks",
];

const EXPECTED_ACTIVITY_KEYS: &[&str] = &[
    "contractorId",
    "contractor_id",
    "contractorName",
    "contractor_name",
    "narrative",
    "noWork",
    "no_work",
    "equipmentUsed",
    "equipment_used",
    "crew",
];

const EXPECTED_OPERATION_KEYS: &[&str] = &[
    "contractorId",
    "contractor_id",
    "contractorName",
    "contractor_name",
    "superintendents",
    "foremen",
    "operators",
    "laborers",
    "surveyors",
    "others",
];

const EXPECTED_SAFETY_KEYS: &[&str] = &[
    "notes",
    "summary",
    "hasIncident",
    "hasIncidents",
    "has_incidents",
    "noIncidents",
    "no_incidents",
];

/// Fields that must be arrays when present.
const ARRAY_FIELDS: &[&str] = &["generalIssues", "qaqcNotes", "activities", "operations", "equipment"];

fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        _ => false,
    }
}

/// Inspect the report's generated payload against the expected shapes.
/// Pure and read-only; returns one entry per independent finding.
pub fn detect(report: &Report, contractors: &[Contractor]) -> Vec<FieldIssue> {
    let mut issues = Vec::new();
    let Some(ai) = report.ai_generated.as_ref() else {
        return issues;
    };

    // (a) schema drift: unexpected keys
    if let Some(map) = ai.as_object() {
        for key in map.keys() {
            if !EXPECTED_TOP_LEVEL.contains(&key.as_str()) {
                issues.push(FieldIssue::new(
                    IssueKind::Schema,
                    format!("aiGenerated.{key}"),
                    format!("Unexpected top-level key \"{key}\" in generated payload"),
                ));
            }
        }
    }
    check_entry_keys(ai, "activities", EXPECTED_ACTIVITY_KEYS, &mut issues);
    check_entry_keys(ai, "operations", EXPECTED_OPERATION_KEYS, &mut issues);
    if let Some(safety) = ai.get("safety").and_then(Value::as_object) {
        for key in safety.keys() {
            if !EXPECTED_SAFETY_KEYS.contains(&key.as_str()) {
                issues.push(FieldIssue::new(
                    IssueKind::Schema,
                    format!("aiGenerated.safety.{key}"),
                    format!("Unexpected key \"{key}\" in safety section"),
                ));
            }
        }
    }

    // (b) silent loss: generated field empty while the captured note isn't
    let guided = &report.guided_notes;
    if !guided.issues.trim().is_empty()
        && is_blank(ai.get("issues_delays"))
        && is_blank(ai.get("generalIssues"))
    {
        issues.push(FieldIssue::new(
            IssueKind::Empty,
            "aiGenerated.issues_delays",
            "Generated issues are empty but the captured issues note has content",
        ));
    }
    if !guided.safety.trim().is_empty() {
        let summary = ai.get("safety").and_then(|s| s.get("summary"));
        let notes = ai.get("safety").and_then(|s| s.get("notes"));
        if is_blank(summary) && is_blank(notes) {
            issues.push(FieldIssue::new(
                IssueKind::Empty,
                "aiGenerated.safety.notes",
                "Generated safety notes are empty but the captured safety note has content",
            ));
        }
    }
    let has_captured_work = !guided.work_summary.trim().is_empty()
        || !report.field_notes.freeform_notes.trim().is_empty();
    if has_captured_work && is_blank(ai.get("activities")) {
        issues.push(FieldIssue::new(
            IssueKind::Empty,
            "aiGenerated.activities",
            "Generated activities are empty but captured work notes have content",
        ));
    }

    // (c) type drift: string where an array belongs
    for field in ARRAY_FIELDS {
        if let Some(Value::String(s)) = ai.get(*field) {
            if !s.trim().is_empty() {
                issues.push(FieldIssue::new(
                    IssueKind::TypeShape,
                    format!("aiGenerated.{field}"),
                    format!("Expected array for \"{field}\" but got string"),
                ));
            }
        }
    }
    if let Some(notes) = ai.get("safety").and_then(|s| s.get("notes")) {
        if !notes.is_null() && !notes.is_string() && !notes.is_array() {
            issues.push(FieldIssue::new(
                IssueKind::TypeShape,
                "aiGenerated.safety.notes",
                "Expected array or string for \"safety.notes\"",
            ));
        }
    }

    // (d) referential drift: contractor ids nothing in the project matches
    for section in ["activities", "operations", "equipment"] {
        let Some(entries) = ai.get(section).and_then(Value::as_array) else {
            continue;
        };
        for (index, entry) in entries.iter().enumerate() {
            let id = entry
                .get("contractorId")
                .or_else(|| entry.get("contractor_id"))
                .and_then(Value::as_str)
                .unwrap_or("");
            if !id.is_empty() && !contractors.iter().any(|c| c.id == id) {
                issues.push(FieldIssue::new(
                    IssueKind::Contractor,
                    format!("aiGenerated.{section}[{index}].contractorId"),
                    format!("Contractor id \"{id}\" matches no project contractor"),
                ));
            }
        }
    }

    issues
}

fn check_entry_keys(ai: &Value, section: &str, expected: &[&str], issues: &mut Vec<FieldIssue>) {
    let Some(entries) = ai.get(section).and_then(Value::as_array) else {
        return;
    };
    for (index, entry) in entries.iter().enumerate() {
        let Some(map) = entry.as_object() else {
            continue;
        };
        for key in map.keys() {
            if !expected.contains(&key.as_str()) {
                issues.push(FieldIssue::new(
                    IssueKind::Schema,
                    format!("aiGenerated.{section}[{index}].{key}"),
                    format!("Unexpected key \"{key}\" in {section} entry {index}"),
                ));
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Debug exports
// ---------------------------------------------------------------------------

/// Everything an operator needs to troubleshoot a mis-mapped report:
/// the generated payload, the raw notes, the overrides, the reconciled
/// lists, and the detected issues.
pub struct DebugExport<'a> {
    report: &'a Report,
    project_name: &'a str,
    issues: Vec<FieldIssue>,
    exported_at: DateTime<Utc>,
}

impl<'a> DebugExport<'a> {
    pub fn new(report: &'a Report, contractors: &[Contractor], project_name: &'a str) -> Self {
        Self {
            report,
            project_name,
            issues: detect(report, contractors),
            exported_at: Utc::now(),
        }
    }

    pub fn issues(&self) -> &[FieldIssue] {
        &self.issues
    }

    pub fn to_json(&self) -> Value {
        json!({
            "exportedAt": self.exported_at.to_rfc3339(),
            "reportDate": self.report.overview.date,
            "projectName": self.project_name,
            "aiGenerated": self.report.ai_generated,
            "fieldNotes": self.report.field_notes,
            "guidedNotes": self.report.guided_notes,
            "userEdits": self.report.user_edits,
            "currentState": {
                "activities": self.report.activities,
                "operations": self.report.operations,
                "equipment": self.report.equipment,
            },
            "detectedIssues": self.issues,
        })
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();
        md.push_str("# Report Debug Export\n\n");
        md.push_str(&format!("**Exported:** {}\n", self.exported_at.to_rfc3339()));
        md.push_str(&format!("**Report Date:** {}\n", self.report.overview.date));
        md.push_str(&format!("**Project:** {}\n\n", self.project_name));

        md.push_str("## Detected Issues\n\n");
        if self.issues.is_empty() {
            md.push_str("No issues detected.\n\n");
        } else {
            for (index, issue) in self.issues.iter().enumerate() {
                md.push_str(&format!(
                    "### Issue {}: {}\n- **Field:** {}\n- **Message:** {}\n\n",
                    index + 1,
                    issue.kind.as_str().to_uppercase(),
                    issue.field,
                    issue.message
                ));
            }
        }

        md.push_str("## Generated Payload\n\n");
        match &self.report.ai_generated {
            Some(ai) => push_json_block(&mut md, ai),
            None => md.push_str("No generated payload.\n\n"),
        }

        md.push_str("## Raw Field Notes\n\n### Field Notes\n");
        push_json_block(&mut md, &json!(self.report.field_notes));
        md.push_str("### Guided Notes\n");
        push_json_block(&mut md, &json!(self.report.guided_notes));

        md.push_str("## User Edits\n\n");
        if self.report.user_edits.is_empty() {
            md.push_str("No user edits.\n\n");
        } else {
            push_json_block(&mut md, &json!(self.report.user_edits));
        }

        md.push_str("## Current Report State\n\n### Activities\n");
        push_json_block(&mut md, &json!(self.report.activities));
        md.push_str("### Operations\n");
        push_json_block(&mut md, &json!(self.report.operations));
        md.push_str("### Equipment\n");
        push_json_block(&mut md, &json!(self.report.equipment));

        md
    }
}

fn push_json_block(md: &mut String, value: &Value) {
    let pretty = serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string());
    md.push_str(&format!("```json\n{pretty}\n```\n\n"));
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn contractor(id: &str) -> Contractor {
        Contractor {
            id: id.to_string(),
            name: id.to_uppercase(),
            ..Default::default()
        }
    }

    #[test]
    fn no_payload_means_no_issues() {
        let report = Report::default();
        assert!(detect(&report, &[]).is_empty());
    }

    #[test]
    fn unexpected_top_level_key_is_schema_drift() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({"weather_report": {}}));
        let issues = detect(&report, &[]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].kind, IssueKind::Schema);
        assert_eq!(issues[0].field, "aiGenerated.weather_report");
    }

    #[test]
    fn empty_activities_with_captured_work_is_flagged() {
        let mut report = Report::default();
        report.guided_notes.work_summary = "Poured foundation".to_string();
        report.ai_generated = Some(json!({"activities": []}));

        let issues = detect(&report, &[]);
        let empty: Vec<_> = issues.iter().filter(|i| i.kind == IssueKind::Empty).collect();
        assert_eq!(empty.len(), 1);
        assert_eq!(empty[0].field, "aiGenerated.activities");
    }

    #[test]
    fn string_where_array_expected_is_type_drift() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({"generalIssues": "one long paragraph"}));
        let issues = detect(&report, &[]);
        assert!(issues
            .iter()
            .any(|i| i.kind == IssueKind::TypeShape && i.field == "aiGenerated.generalIssues"));
    }

    #[test]
    fn unknown_contractor_id_is_flagged_not_dropped() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "activities": [{"contractorId": "ghost", "narrative": "x"}]
        }));
        let issues = detect(&report, &[contractor("c1")]);
        assert!(issues.iter().any(|i| i.kind == IssueKind::Contractor
            && i.field == "aiGenerated.activities[0].contractorId"));
    }

    #[test]
    fn well_formed_payload_is_clean() {
        let mut report = Report::default();
        report.ai_generated = Some(json!({
            "activities": [{"contractorId": "c1", "narrative": "Formwork", "noWork": false}],
            "operations": [{"contractorId": "c1", "laborers": 3}],
            "equipment": [],
            "safety": {"summary": "Toolbox talk held", "has_incidents": false},
            "issues_delays": []
        }));
        let issues = detect(&report, &[contractor("c1")]);
        assert!(issues.is_empty(), "unexpected issues: {issues:?}");
    }

    #[test]
    fn markdown_export_includes_issue_sections() {
        let mut report = Report::default();
        report.overview.date = "2026-03-02".to_string();
        report.guided_notes.work_summary = "Graded subbase".to_string();
        report.ai_generated = Some(json!({"activities": []}));

        let export = DebugExport::new(&report, &[], "Runway 18L");
        let md = export.to_markdown();
        assert!(md.contains("# Report Debug Export"));
        assert!(md.contains("**Project:** Runway 18L"));
        assert!(md.contains("### Issue 1: EMPTY"));

        let doc = export.to_json();
        assert_eq!(doc["projectName"], "Runway 18L");
        assert!(doc["detectedIssues"].as_array().is_some());
    }
}
