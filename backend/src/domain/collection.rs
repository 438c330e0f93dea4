//! Collection Schemas
//!
//! Minimal shape checks applied before a document is written.

use serde_json::{Map, Value};
use std::collections::HashMap;

use super::entity::{DomainError, DomainResult};

/// Required top-level fields for one collection
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionSchema {
    pub name: String,
    pub required: Vec<String>,
}

impl CollectionSchema {
    pub fn new(name: &str, required: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            required: required.iter().map(|f| f.to_string()).collect(),
        }
    }

    /// Reject bodies with missing, null or blank required fields
    pub fn validate(&self, body: &Map<String, Value>) -> DomainResult<()> {
        for field in &self.required {
            let present = match body.get(field) {
                None | Some(Value::Null) => false,
                Some(Value::String(s)) => !s.trim().is_empty(),
                Some(_) => true,
            };
            if !present {
                return Err(DomainError::InvalidInput(format!(
                    "{}: field '{}' is required",
                    self.name, field
                )));
            }
        }
        Ok(())
    }
}

/// Known collections by name
#[derive(Debug, Clone, Default)]
pub struct CollectionRegistry {
    schemas: HashMap<String, CollectionSchema>,
}

impl CollectionRegistry {
    /// Collections used by the inventory client
    pub fn hobby() -> Self {
        let mut registry = Self::default();
        registry.register(CollectionSchema::new("keycaps", &["name", "image", "details"]));
        registry.register(CollectionSchema::new("switches", &["name", "image", "details"]));
        registry.register(CollectionSchema::new("keyboards", &["name", "image", "details"]));
        registry
    }

    pub fn register(&mut self, schema: CollectionSchema) {
        self.schemas.insert(schema.name.clone(), schema);
    }

    pub fn get(&self, name: &str) -> DomainResult<&CollectionSchema> {
        self.schemas
            .get(name)
            .ok_or_else(|| DomainError::NotFound(format!("collection '{}'", name)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn body(value: Value) -> Map<String, Value> {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_required_fields() {
        let schema = CollectionSchema::new("switches", &["name", "image"]);
        assert!(schema.validate(&body(json!({"name": "Boba U4", "image": "https://a/b.png"}))).is_ok());
        assert!(schema.validate(&body(json!({"name": "  ", "image": "https://a/b.png"}))).is_err());
        assert!(schema.validate(&body(json!({"name": "Boba U4", "image": null}))).is_err());
        assert!(schema.validate(&body(json!({"image": "https://a/b.png"}))).is_err());
    }

    #[test]
    fn test_unknown_collection() {
        let registry = CollectionRegistry::hobby();
        assert!(registry.get("switches").is_ok());
        assert_eq!(registry.get("mice").unwrap_err().status(), 404);
    }
}
