use serde_json::{Map, Value as JsonValue};

use crate::{error::AppError, models::validation::validate_field_name};

/// A stored record: a JSON object keyed by its `id` attribute.
pub type Item = Map<String, JsonValue>;

pub const ID_FIELD: &str = "id";

pub fn item_id(item: &Item) -> Option<&str> {
    item.get(ID_FIELD).and_then(JsonValue::as_str)
}

/// Ordered `(field, new value)` pairs applied to an existing item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct FieldDiff {
    changes: Vec<(String, JsonValue)>,
}

impl FieldDiff {
    pub fn from_object(object: Item) -> Result<Self, AppError> {
        if object.is_empty() {
            return Err(AppError::Validation("Update body cannot be empty".to_string()));
        }

        let mut changes = Vec::with_capacity(object.len());

        for (field, value) in object {
            validate_field_name(&field)?;

            if field == ID_FIELD {
                return Err(AppError::Validation("Field 'id' cannot be updated".to_string()));
            }

            changes.push((field, value));
        }

        Ok(Self { changes })
    }

    pub fn get(&self, field: &str) -> Option<&JsonValue> {
        self.changes
            .iter()
            .find(|(name, _)| name == field)
            .map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.changes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    pub fn apply(&self, item: &mut Item) {
        for (field, value) in &self.changes {
            item.insert(field.clone(), value.clone());
        }
    }
}

/// Equality filter for scans.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanFilter {
    pub field: String,
    pub value: JsonValue,
}

impl ScanFilter {
    pub fn equals(field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn matches(&self, item: &Item) -> bool {
        item.get(&self.field) == Some(&self.value)
    }
}

/// Equality condition against a named secondary index.
#[derive(Debug, Clone, PartialEq)]
pub struct IndexQuery {
    pub index_name: String,
    pub condition: ScanFilter,
}

impl IndexQuery {
    pub fn new(index_name: impl Into<String>, condition: ScanFilter) -> Self {
        Self {
            index_name: index_name.into(),
            condition,
        }
    }
}
