use serde_json::Value as JsonValue;

use crate::{error::AppError, models::item::Item};

pub fn validate_field_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() {
        return Err(AppError::Validation("Field name cannot be empty".to_string()));
    }

    if name.len() > 64 {
        return Err(AppError::Validation(format!(
            "Field name too long (maximum 64 characters): {}",
            name
        )));
    }

    let mut chars = name.chars();
    let starts_with_letter = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
    let valid_chars = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

    if !starts_with_letter || !valid_chars {
        return Err(AppError::Validation(format!(
            "Field name contains invalid characters: {}",
            name
        )));
    }

    Ok(())
}

pub fn validate_topic_name(name: &str) -> Result<(), AppError> {
    if name.is_empty() || name.len() > 256 {
        return Err(AppError::Validation(
            "Topic name must be between 1 and 256 characters".to_string(),
        ));
    }

    let valid_chars = name
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');

    if !valid_chars {
        return Err(AppError::Validation(format!(
            "Topic name contains invalid characters: {}",
            name
        )));
    }

    Ok(())
}

/// Returns the field as a non-empty string, if present.
pub fn optional_str<'a>(item: &'a Item, field: &str) -> Option<&'a str> {
    item.get(field)
        .and_then(JsonValue::as_str)
        .filter(|value| !value.trim().is_empty())
}

pub fn require_str<'a>(item: &'a Item, field: &str, message: &str) -> Result<&'a str, AppError> {
    optional_str(item, field).ok_or_else(|| AppError::Validation(message.to_string()))
}
