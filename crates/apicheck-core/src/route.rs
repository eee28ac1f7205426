//! # Routes and Schema Keys
//!
//! Typed forms of the keys the schema index is organized by:
//!
//! - [`HttpMethod`]: the five methods an OpenAPI path item may declare
//!   operations for. Anything else (`parameters`, `summary`, `head`, …)
//!   is not an operation for indexing purposes.
//! - [`ResponseKey`]: `"<METHOD> <PATH> <STATUS>"`, e.g.
//!   `"POST /users/register 201"`.
//! - [`request_key`]: `"<operationId>_request"`.
//! - [`PathTemplate`]: a spec path (`/problems/{id}`) that can match
//!   concrete endpoints (`/problems/42`).
//! - [`normalize_endpoint`]: strips the API-version prefix and query
//!   string from a dispatched endpoint.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// HTTP methods that carry indexed operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
}

impl HttpMethod {
    /// All indexed methods, in declaration order.
    pub const ALL: [HttpMethod; 5] = [
        HttpMethod::Get,
        HttpMethod::Post,
        HttpMethod::Put,
        HttpMethod::Delete,
        HttpMethod::Patch,
    ];

    /// Upper-case wire name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Delete => "DELETE",
            Self::Patch => "PATCH",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the indexed HTTP methods.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported HTTP method '{0}'")]
pub struct UnsupportedMethod(pub String);

impl FromStr for HttpMethod {
    type Err = UnsupportedMethod;

    /// Case-insensitive.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HttpMethod::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| UnsupportedMethod(s.to_string()))
    }
}

/// Key of a response schema: method, spec path and status code.
///
/// `status` is kept as a string because OpenAPI response keys include
/// ranges (`2XX`) and `default` as well as numeric codes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ResponseKey {
    pub method: HttpMethod,
    pub path: String,
    pub status: String,
}

impl ResponseKey {
    pub fn new(method: HttpMethod, path: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            status: status.into(),
        }
    }
}

impl fmt::Display for ResponseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.method, self.path, self.status)
    }
}

/// Index key of a request-body schema.
pub fn request_key(operation_id: &str) -> String {
    format!("{operation_id}_request")
}

/// Response-map keys to try for an actual status code, most specific first:
/// the code itself, its range (`4XX`), then `default`.
pub fn status_candidates(status: u16) -> [String; 3] {
    [
        status.to_string(),
        format!("{}XX", status / 100),
        "default".to_string(),
    ]
}

/// Strip a leading API prefix and any query string from an endpoint.
///
/// The prefix is only removed when it is a whole leading segment run:
/// with prefix `/api/v1`, `/api/v1/users` becomes `/users`, while
/// `/api/v10/users` is left alone. An endpoint equal to the prefix
/// becomes `/`.
pub fn normalize_endpoint<'a>(endpoint: &'a str, api_prefix: &str) -> &'a str {
    let path = endpoint.split(['?', '#']).next().unwrap_or(endpoint);
    let prefix = api_prefix.trim_end_matches('/');
    if prefix.is_empty() {
        return path;
    }
    match path.strip_prefix(prefix) {
        Some("") => "/",
        Some(rest) if rest.starts_with('/') => rest,
        _ => path,
    }
}

/// One segment of a spec path.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Param,
}

/// A spec path such as `/problems/{id}/submissions`, pre-split for
/// matching against concrete endpoints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    raw: String,
    segments: Vec<Segment>,
}

impl PathTemplate {
    pub fn parse(raw: &str) -> Self {
        let segments = split_path(raw)
            .map(|s| {
                if s.len() >= 2 && s.starts_with('{') && s.ends_with('}') {
                    Segment::Param
                } else {
                    Segment::Literal(s.to_string())
                }
            })
            .collect();
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    /// The path exactly as written in the spec.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Number of `{param}` segments.
    pub fn param_count(&self) -> usize {
        self.segments
            .iter()
            .filter(|s| matches!(s, Segment::Param))
            .count()
    }

    /// Whether a concrete endpoint path matches this template. Each
    /// placeholder matches exactly one non-empty segment.
    pub fn matches(&self, endpoint: &str) -> bool {
        let mut actual = split_path(endpoint);
        for expected in &self.segments {
            match (expected, actual.next()) {
                (Segment::Literal(lit), Some(seg)) if lit == seg => {}
                (Segment::Param, Some(seg)) if !seg.is_empty() => {}
                _ => return false,
            }
        }
        actual.next().is_none()
    }
}

fn split_path(path: &str) -> impl Iterator<Item = &str> {
    path.trim_matches('/').split('/').filter(|s| !s.is_empty())
}
