//! Request decoding helpers shared by the handlers.

use axum::http::{header, HeaderMap};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::HashMap;

/// Header prefix carrying user-defined metadata.
pub const META_HEADER_PREFIX: &str = "x-ms-meta-";

/// Returns user-defined metadata from `x-ms-meta-*` headers.
///
/// Header names arrive lower-cased, so keys are lower-case too. Values that
/// are not visible ASCII are skipped.
pub fn metadata_from_headers(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .filter_map(|(name, value)| {
            let key = name.as_str().strip_prefix(META_HEADER_PREFIX)?;
            if key.is_empty() {
                return None;
            }
            value.to_str().ok().map(|v| (key.to_string(), v.to_string()))
        })
        .collect()
}

/// Returns the Content-Type header value, if present and non-empty.
pub fn content_type(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .filter(|v| !v.trim().is_empty())
}

/// Query parameters for list operations.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListParams {
    pub prefix: Option<String>,
    pub maxresults: Option<String>,
}

impl ListParams {
    /// The requested cap. Missing, non-numeric and non-positive values all
    /// mean no cap.
    pub fn max_results(&self) -> Option<usize> {
        self.maxresults
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|&n| n > 0)
            .map(|n| n as usize)
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref().filter(|p| !p.is_empty())
    }
}

/// Formats a DateTime as RFC 1123 format for HTTP headers.
pub fn format_http_date(dt: &DateTime<Utc>) -> String {
    dt.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}
