use serde::Serialize;
use serde_json::{Map, Value};
use shared::json::{serialize_number, serialize_opt_number};
use shared::validation::{Fields, Presence, ValidationErrors};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: String,
    pub name: String,
    pub location: String,
    #[serde(
        skip_serializing_if = "Option::is_none",
        serialize_with = "serialize_opt_number"
    )]
    pub hectares: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub certifier: Option<String>,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchStatus {
    Available,
    Reserved,
    Sold,
}

impl BatchStatus {
    pub const NAMES: &'static [&'static str] = &["AVAILABLE", "RESERVED", "SOLD"];

    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Available => "AVAILABLE",
            BatchStatus::Reserved => "RESERVED",
            BatchStatus::Sold => "SOLD",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BatchStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AVAILABLE" => Ok(BatchStatus::Available),
            "RESERVED" => Ok(BatchStatus::Reserved),
            "SOLD" => Ok(BatchStatus::Sold),
            other => Err(format!("unknown batch status {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Batch {
    pub id: String,
    pub project_id: String,
    #[serde(rename = "tonsCO2", serialize_with = "serialize_number")]
    pub tons_co2: f64,
    #[serde(serialize_with = "serialize_number")]
    pub price_per_ton: f64,
    pub status: BatchStatus,
    pub created_at: String,
}

/// Body of `POST /projects`. Unknown members are ignored.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub name: String,
    pub location: String,
    pub hectares: Option<f64>,
    pub description: Option<String>,
    pub certifier: Option<String>,
}

/// Body of `PUT /projects/{id}`: only the supplied members change.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectChanges {
    pub name: Option<String>,
    pub location: Option<String>,
    pub hectares: Option<f64>,
    pub description: Option<String>,
    pub certifier: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewBatch {
    pub project_id: String,
    pub tons_co2: f64,
    pub price_per_ton: f64,
    pub status: BatchStatus,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchChanges {
    pub project_id: Option<String>,
    pub tons_co2: Option<f64>,
    pub price_per_ton: Option<f64>,
    pub status: Option<BatchStatus>,
}

fn project_fields(
    fields: &mut Fields<'_>,
    presence: Presence,
) -> (Option<String>, Option<String>, Option<f64>, Option<String>, Option<String>) {
    (
        fields.non_empty_string("name", presence),
        fields.non_empty_string("location", presence),
        fields.number("hectares", Presence::Optional),
        fields
            .string("description", Presence::Optional)
            .map(String::from),
        fields.string("certifier", Presence::Optional).map(String::from),
    )
}

impl NewProject {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(body);
        let (name, location, hectares, description, certifier) =
            project_fields(&mut fields, Presence::Required);
        fields.finish()?;

        match (name, location) {
            (Some(name), Some(location)) => Ok(NewProject {
                name,
                location,
                hectares,
                description,
                certifier,
            }),
            _ => Err(ValidationErrors::form("name and location are required")),
        }
    }
}

impl ProjectChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(body);
        let (name, location, hectares, description, certifier) =
            project_fields(&mut fields, Presence::Optional);
        fields.finish()?;

        Ok(ProjectChanges {
            name,
            location,
            hectares,
            description,
            certifier,
        })
    }
}

fn batch_fields(
    fields: &mut Fields<'_>,
    presence: Presence,
) -> (Option<String>, Option<f64>, Option<f64>, Option<BatchStatus>) {
    let project_id = fields.non_empty_string("projectId", presence);
    let tons_co2 = fields.positive_number("tonsCO2", presence);
    let price_per_ton = fields.positive_number("pricePerTon", presence);
    let status = fields
        .one_of("status", BatchStatus::NAMES, Presence::Optional)
        .and_then(|s| s.parse().ok());
    (project_id, tons_co2, price_per_ton, status)
}

impl NewBatch {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(body);
        let (project_id, tons_co2, price_per_ton, status) =
            batch_fields(&mut fields, Presence::Required);
        fields.finish()?;

        match (project_id, tons_co2, price_per_ton) {
            (Some(project_id), Some(tons_co2), Some(price_per_ton)) => Ok(NewBatch {
                project_id,
                tons_co2,
                price_per_ton,
                status: status.unwrap_or(BatchStatus::Available),
            }),
            _ => Err(ValidationErrors::form(
                "projectId, tonsCO2 and pricePerTon are required",
            )),
        }
    }
}

impl BatchChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(body);
        let (project_id, tons_co2, price_per_ton, status) =
            batch_fields(&mut fields, Presence::Optional);
        fields.finish()?;

        Ok(BatchChanges {
            project_id,
            tons_co2,
            price_per_ton,
            status,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(o) => o,
            _ => panic!("not an object"),
        }
    }

    #[test]
    fn test_new_project() {
        let body = object(json!({
            "name": "Forest",
            "location": "Amazonas",
            "hectares": 120.5,
            "ignored": true,
        }));
        let project = NewProject::from_json(&body).unwrap();
        assert_eq!(project.name, "Forest");
        assert_eq!(project.hectares, Some(120.5));
        assert_eq!(project.description, None);

        let errors = NewProject::from_json(&object(json!({"name": ""}))).unwrap_err();
        assert_eq!(
            errors.field_errors["name"],
            vec!["String must contain at least 1 character(s)"]
        );
        assert_eq!(errors.field_errors["location"], vec!["Required"]);
    }

    #[test]
    fn test_project_changes() {
        let changes = ProjectChanges::from_json(&object(json!({"certifier": "Verra"}))).unwrap();
        assert_eq!(
            changes,
            ProjectChanges {
                certifier: Some("Verra".into()),
                ..Default::default()
            }
        );

        let errors = ProjectChanges::from_json(&object(json!({"hectares": "ten"}))).unwrap_err();
        assert_eq!(
            errors.field_errors["hectares"],
            vec!["Expected number, received string"]
        );
    }

    #[test]
    fn test_new_batch() {
        let batch = NewBatch::from_json(&object(json!({
            "projectId": "65f1a2b3c4d5e6f7a8b9c0d1",
            "tonsCO2": 10,
            "pricePerTon": 5,
        })))
        .unwrap();
        assert_eq!(batch.status, BatchStatus::Available);
        assert_eq!(batch.tons_co2, 10.0);

        let errors = NewBatch::from_json(&object(json!({
            "projectId": "p",
            "tonsCO2": 0,
            "pricePerTon": 5,
            "status": "LOST",
        })))
        .unwrap_err();
        assert_eq!(
            errors.field_errors["tonsCO2"],
            vec!["Number must be greater than 0"]
        );
        assert_eq!(
            errors.field_errors["status"],
            vec!["Invalid enum value. Expected 'AVAILABLE' | 'RESERVED' | 'SOLD', received 'LOST'"]
        );
    }

    #[test]
    fn test_batch_changes_apply_no_defaults() {
        let changes = BatchChanges::from_json(&object(json!({"pricePerTon": 7.5}))).unwrap();
        assert_eq!(changes.status, None);
        assert_eq!(changes.price_per_ton, Some(7.5));
    }

    #[test]
    fn test_serialization() {
        let project = Project {
            id: "65f1a2b3c4d5e6f7a8b9c0d1".into(),
            name: "Forest".into(),
            location: "Amazonas".into(),
            hectares: Some(100.0),
            description: None,
            certifier: None,
            created_at: "2026-10-19T08:30:00.000Z".into(),
        };
        assert_eq!(
            serde_json::to_value(&project).unwrap(),
            json!({
                "id": "65f1a2b3c4d5e6f7a8b9c0d1",
                "name": "Forest",
                "location": "Amazonas",
                "hectares": 100,
                "createdAt": "2026-10-19T08:30:00.000Z",
            })
        );

        let batch = Batch {
            id: "65f1a2b3c4d5e6f7a8b9c0d2".into(),
            project_id: "65f1a2b3c4d5e6f7a8b9c0d1".into(),
            tons_co2: 10.0,
            price_per_ton: 12.5,
            status: BatchStatus::Reserved,
            created_at: "2026-10-19T08:30:00.000Z".into(),
        };
        assert_eq!(
            serde_json::to_value(&batch).unwrap(),
            json!({
                "id": "65f1a2b3c4d5e6f7a8b9c0d2",
                "projectId": "65f1a2b3c4d5e6f7a8b9c0d1",
                "tonsCO2": 10,
                "pricePerTon": 12.5,
                "status": "RESERVED",
                "createdAt": "2026-10-19T08:30:00.000Z",
            })
        );
    }
}
