use serde::Serialize;
use serde_json::{Map, Value};
use shared::json::serialize_number;
use shared::time::normalize_timestamp;
use shared::validation::{Fields, Presence, ValidationErrors};

/// Status given to orders created without one.
pub const PENDING: &str = "PENDING";
/// Status set once payment has been received.
pub const PAID: &str = "PAID";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    pub project_id: String,
    pub batch_id: String,
    pub buyer_name: String,
    #[serde(serialize_with = "serialize_number")]
    pub qty_tons: f64,
    #[serde(serialize_with = "serialize_number")]
    pub total: f64,
    pub status: String,
    pub created_at: String,
    pub processed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewOrder {
    pub project_id: String,
    pub batch_id: String,
    pub buyer_name: String,
    pub qty_tons: f64,
    pub total: f64,
    pub status: String,
}

/// Body of `PUT /orders/{id}`. Every supplied member replaces the stored
/// value; `processed_at` is `Some(None)` when the caller cleared it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderChanges {
    pub project_id: Option<String>,
    pub batch_id: Option<String>,
    pub buyer_name: Option<String>,
    pub qty_tons: Option<f64>,
    pub total: Option<f64>,
    pub status: Option<String>,
    pub processed_at: Option<Option<String>>,
}

const UPDATABLE: &[&str] = &[
    "projectId",
    "batchId",
    "buyerName",
    "qtyTons",
    "total",
    "status",
    "processedAt",
];

impl NewOrder {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(body);
        let project_id = fields.non_empty_string("projectId", Presence::Required);
        let batch_id = fields.non_empty_string("batchId", Presence::Required);
        let buyer_name = fields.non_empty_string("buyerName", Presence::Required);
        let qty_tons = fields.coerced_number("qtyTons", Presence::Required);
        let total = fields.coerced_number("total", Presence::Required);
        let status = fields
            .string("status", Presence::Optional)
            .filter(|s| !s.is_empty())
            .unwrap_or(PENDING)
            .to_string();
        fields.finish()?;

        match (project_id, batch_id, buyer_name, qty_tons, total) {
            (Some(project_id), Some(batch_id), Some(buyer_name), Some(qty_tons), Some(total)) => {
                Ok(NewOrder {
                    project_id,
                    batch_id,
                    buyer_name,
                    qty_tons,
                    total,
                    status,
                })
            }
            _ => Err(ValidationErrors::form(
                "projectId, batchId, buyerName, qtyTons and total are required",
            )),
        }
    }
}

impl OrderChanges {
    pub fn from_json(body: &Map<String, Value>) -> Result<Self, ValidationErrors> {
        let mut fields = Fields::new(body);
        fields.reject_unknown(UPDATABLE);

        let project_id = fields.string("projectId", Presence::Optional).map(String::from);
        let batch_id = fields.string("batchId", Presence::Optional).map(String::from);
        let buyer_name = fields.string("buyerName", Presence::Optional).map(String::from);
        let qty_tons = fields.number("qtyTons", Presence::Optional);
        let total = fields.number("total", Presence::Optional);
        let status = fields.string("status", Presence::Optional).map(String::from);
        let processed_at = match fields.nullable_string("processedAt") {
            Some(Some(raw)) => match normalize_timestamp(raw) {
                Some(at) => Some(Some(at)),
                None => {
                    fields.error("processedAt", "Invalid datetime");
                    None
                }
            },
            other => other.map(|_| None),
        };
        fields.finish()?;

        Ok(OrderChanges {
            project_id,
            batch_id,
            buyer_name,
            qty_tons,
            total,
            status,
            processed_at,
        })
    }
}
