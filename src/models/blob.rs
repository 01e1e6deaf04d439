//! Blob data models.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Content type reported for blobs written without one.
pub fn default_content_type() -> String {
    mime::APPLICATION_OCTET_STREAM.to_string()
}

/// Properties persisted alongside a blob's content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobProperties {
    #[serde(default = "default_content_type")]
    pub content_type: String,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

impl Default for BlobProperties {
    fn default() -> Self {
        Self {
            content_type: default_content_type(),
            metadata: HashMap::new(),
        }
    }
}

impl BlobProperties {
    /// Builds properties from upload inputs, substituting the default content type
    /// when none was given.
    pub fn new(content_type: Option<&str>, metadata: HashMap<String, String>) -> Self {
        let content_type = content_type
            .map(str::trim)
            .filter(|ct| !ct.is_empty())
            .map(String::from)
            .unwrap_or_else(default_content_type);
        Self {
            content_type,
            metadata,
        }
    }
}

/// A blob with its full content.
#[derive(Debug, Clone)]
pub struct Blob {
    /// Account name.
    pub account: String,
    /// Container name.
    pub container: String,
    /// Blob name, possibly containing `/` separated segments.
    pub name: String,
    /// Raw content.
    pub content: Bytes,
    /// MIME type of the content.
    pub content_type: String,
    /// Content length in bytes.
    pub size: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    /// User-defined metadata.
    pub metadata: HashMap<String, String>,
}

/// Listing entry for a blob. Carries everything but the content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlobInfo {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub content_type: String,
    pub content_length: u64,
    pub last_modified: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, String>,
}

/// Body of a list-blobs response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BlobListResult {
    pub blobs: Vec<BlobInfo>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub prefix: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub max_results: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_properties_default_content_type() {
        let props = BlobProperties::new(None, HashMap::new());
        assert_eq!(props.content_type, "application/octet-stream");

        let props = BlobProperties::new(Some("  "), HashMap::new());
        assert_eq!(props.content_type, "application/octet-stream");

        let props = BlobProperties::new(Some("text/plain"), HashMap::new());
        assert_eq!(props.content_type, "text/plain");
    }

    #[test]
    fn test_list_result_field_names() {
        let result = BlobListResult {
            blobs: vec![BlobInfo {
                name: "a/x".to_string(),
                content_type: "text/plain".to_string(),
                content_length: 5,
                last_modified: Utc::now(),
                metadata: HashMap::new(),
            }],
            prefix: String::new(),
            max_results: 0,
        };

        let value = serde_json::to_value(&result).unwrap();
        let entry = &value["Blobs"][0];
        assert_eq!(entry["Name"], "a/x");
        assert_eq!(entry["ContentLength"], 5);
        assert!(entry.get("Metadata").is_none());
        assert!(value.get("Prefix").is_none());
        assert!(value.get("MaxResults").is_none());
    }

    #[test]
    fn test_sidecar_tolerates_missing_fields() {
        let props: BlobProperties = serde_json::from_str("{}").unwrap();
        assert_eq!(props, BlobProperties::default());
    }
}
