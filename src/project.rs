//! Canonical in-memory shapes for projects, contractors, and user settings.
//!
//! Rows arrive from the store in `snake_case`, from drafts and older
//! payloads sometimes in `camelCase`, and occasionally mixed. Each struct
//! here is the single canonical shape: serde aliases accept every persisted
//! spelling, so there is exactly one total normalization per entity and no
//! key-presence branching at call sites.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Project {
    pub id: String,
    #[serde(alias = "project_name")]
    pub project_name: String,
    pub location: String,
    pub status: String,
    #[serde(alias = "prime_contractor")]
    pub prime_contractor: String,
    pub engineer: String,
    #[serde(alias = "logo_url")]
    pub logo_url: Option<String>,
    #[serde(alias = "cno_solicitation_no")]
    pub cno_solicitation_no: String,
    #[serde(alias = "noab_project_no")]
    pub noab_project_no: String,
    #[serde(alias = "contract_duration")]
    pub contract_duration: String,
    #[serde(alias = "notice_to_proceed")]
    pub notice_to_proceed: String,
    #[serde(alias = "expected_completion")]
    pub expected_completion: String,
    #[serde(alias = "weather_days")]
    pub weather_days: i32,
    #[serde(alias = "default_start_time")]
    pub default_start_time: String,
    #[serde(alias = "default_end_time")]
    pub default_end_time: String,
    #[serde(alias = "created_by")]
    pub created_by: String,
    pub contractors: Vec<Contractor>,
    pub equipment: Vec<EquipmentCatalogItem>,
}

impl Project {
    /// Normalize an arbitrary JSON representation (raw row shape, canonical
    /// shape, or a mix) into the canonical struct. Unknown keys are ignored,
    /// missing keys default.
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    pub fn contractor_by_id(&self, id: &str) -> Option<&Contractor> {
        self.contractors.iter().find(|c| c.id == id)
    }

    /// Case-insensitive lookup by contractor name, for generated entries
    /// that carry a name instead of an id.
    pub fn contractor_by_name(&self, name: &str) -> Option<&Contractor> {
        self.contractors
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    pub fn catalog_item(&self, id: &str) -> Option<&EquipmentCatalogItem> {
        self.equipment.iter().find(|e| e.id == id)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractorKind {
    Prime,
    #[default]
    Sub,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Contractor {
    pub id: String,
    #[serde(alias = "project_id")]
    pub project_id: String,
    pub name: String,
    pub company: String,
    pub abbreviation: String,
    #[serde(rename = "type")]
    pub kind: ContractorKind,
    pub trades: String,
    pub status: String,
    #[serde(alias = "added_date")]
    pub added_date: String,
    #[serde(alias = "removed_date")]
    pub removed_date: String,
}

impl Contractor {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EquipmentCatalogItem {
    pub id: String,
    #[serde(alias = "project_id")]
    pub project_id: String,
    #[serde(rename = "type", alias = "equipment_type")]
    pub kind: String,
    pub model: String,
    pub status: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub id: String,
    #[serde(alias = "device_id")]
    pub device_id: String,
    #[serde(alias = "full_name")]
    pub full_name: String,
    pub title: String,
    pub company: String,
    pub email: String,
    pub phone: String,
}

impl UserSettings {
    pub fn from_value(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn normalizes_snake_case_rows() {
        let project = Project::from_value(&json!({
            "id": "p1",
            "project_name": "Canal Levee Rehab",
            "prime_contractor": "Acme Civil",
            "weather_days": 3,
            "default_start_time": "06:30"
        }))
        .unwrap();
        assert_eq!(project.project_name, "Canal Levee Rehab");
        assert_eq!(project.prime_contractor, "Acme Civil");
        assert_eq!(project.weather_days, 3);
        assert_eq!(project.default_start_time, "06:30");
    }

    #[test]
    fn normalizes_camel_case_rows() {
        let project = Project::from_value(&json!({
            "id": "p1",
            "projectName": "Canal Levee Rehab",
            "primeContractor": "Acme Civil"
        }))
        .unwrap();
        assert_eq!(project.project_name, "Canal Levee Rehab");
        assert_eq!(project.prime_contractor, "Acme Civil");
    }

    #[test]
    fn contractor_kind_defaults_to_sub() {
        let contractor = Contractor::from_value(&json!({"id": "c1", "name": "Delta"})).unwrap();
        assert_eq!(contractor.kind, ContractorKind::Sub);
    }

    #[test]
    fn contractor_name_lookup_is_case_insensitive() {
        let project = Project {
            contractors: vec![Contractor {
                id: "c1".to_string(),
                name: "ACME".to_string(),
                ..Default::default()
            }],
            ..Default::default()
        };
        assert!(project.contractor_by_name("acme").is_some());
        assert!(project.contractor_by_name("delta").is_none());
    }
}
