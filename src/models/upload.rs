use serde::Serialize;
use uuid::Uuid;

use crate::error::AppError;

pub const FILE_FIELD: &str = "file";
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadedFile {
    pub file_name: String,
    pub key: String,
    pub url: String,
    pub size: usize,
    pub content_type: String,
}

/// Reduces a client-supplied file name to a safe final path segment.
///
/// Directory parts are dropped and anything outside `[A-Za-z0-9._-]` becomes
/// `_`. Names with nothing left but dots are rejected.
pub fn sanitize_file_name(raw: &str) -> Result<String, AppError> {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default().trim();

    let sanitized: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();

    if sanitized.chars().all(|c| c == '.') || sanitized.len() > 255 {
        return Err(AppError::Validation("File name is invalid".to_string()));
    }

    Ok(sanitized)
}

/// Uploads never overwrite each other, even under the same file name.
pub fn object_key(file_name: &str) -> String {
    format!("{}/{}", Uuid::new_v4(), file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directories_are_stripped() {
        assert_eq!(sanitize_file_name("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_file_name("C:\\images\\shirt.png").unwrap(), "shirt.png");
    }

    #[test]
    fn unsafe_characters_are_replaced() {
        assert_eq!(sanitize_file_name("red shirt (1).jpg").unwrap(), "red_shirt__1_.jpg");
    }

    #[test]
    fn empty_and_dot_names_are_rejected() {
        for name in ["", "   ", ".", "..", "uploads/", "a/.."] {
            assert!(sanitize_file_name(name).is_err(), "{:?} accepted", name);
        }
    }

    #[test]
    fn keys_are_unique_per_upload() {
        let first = object_key("shirt.png");
        let second = object_key("shirt.png");

        assert!(first.ends_with("/shirt.png"));
        assert_ne!(first, second);
    }
}
