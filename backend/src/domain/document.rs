//! Document Entity
//!
//! A JSON document owned by one user inside a named collection.

use chrono::{DateTime, Utc};
use serde_json::{Map, Value};

use super::entity::{DomainError, DomainResult, Entity};
use super::object_id::DocumentId;

/// Keys owned by the store; stripped from incoming payloads
pub const RESERVED_KEYS: &[&str] = &["_id", "userId", "createdAt", "updatedAt"];

/// A stored document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: DocumentId,
    pub collection: String,
    pub owner_id: String,
    pub body: Map<String, Value>,
    /// Milliseconds since the epoch
    pub created_at: i64,
    pub updated_at: i64,
}

impl Document {
    /// Build an unsaved document from a caller payload.
    ///
    /// The id is a placeholder until the repository assigns one.
    pub fn from_payload(collection: &str, owner_id: &str, payload: Value) -> DomainResult<Self> {
        let mut body = match payload {
            Value::Object(map) => map,
            other => {
                return Err(DomainError::InvalidInput(format!(
                    "Document body must be an object, got {}",
                    json_kind(&other)
                )))
            }
        };
        for key in RESERVED_KEYS {
            body.remove(*key);
        }

        Ok(Self {
            id: DocumentId::generate(),
            collection: collection.to_string(),
            owner_id: owner_id.to_string(),
            body,
            created_at: 0,
            updated_at: 0,
        })
    }

    /// Wire shape: body fields plus `_id`, `userId` and RFC 3339 timestamps
    pub fn to_wire(&self) -> Value {
        let mut map = self.body.clone();
        map.insert("_id".to_string(), Value::String(self.id.to_string()));
        map.insert("userId".to_string(), Value::String(self.owner_id.clone()));
        if let Some(ts) = millis_to_rfc3339(self.created_at) {
            map.insert("createdAt".to_string(), Value::String(ts));
        }
        if let Some(ts) = millis_to_rfc3339(self.updated_at) {
            map.insert("updatedAt".to_string(), Value::String(ts));
        }
        Value::Object(map)
    }
}

impl Entity for Document {
    type Id = DocumentId;

    fn id(&self) -> &Self::Id {
        &self.id
    }
}

fn millis_to_rfc3339(ms: i64) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ms).map(|ts| ts.to_rfc3339())
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
