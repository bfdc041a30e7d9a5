// src/dtos/error_dtos.rs
use serde::{Deserialize, Serialize};

pub const VALIDATION_ERROR: &str = "validation_error";
pub const UNAUTHORIZED: &str = "unauthorized";
pub const NOT_FOUND: &str = "not_found";
pub const SUPABASE_ERROR: &str = "supabase_error";
pub const UNEXPECTED_ERROR: &str = "unexpected_error";

/// Error envelope every non-2xx API response carries: a stable machine code
/// in `error` and a human-readable `detail`. The client half parses the same
/// shape back out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl ErrorBody {
    pub fn new(error: &str, detail: impl Into<String>) -> Self {
        Self {
            error: error.to_string(),
            detail: Some(detail.into()),
        }
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(VALIDATION_ERROR, detail)
    }

    pub fn unauthorized() -> Self {
        Self {
            error: UNAUTHORIZED.to_string(),
            detail: None,
        }
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(NOT_FOUND, detail)
    }

    pub fn supabase(detail: impl Into<String>) -> Self {
        Self::new(SUPABASE_ERROR, detail)
    }

    pub fn unexpected(detail: impl Into<String>) -> Self {
        Self::new(UNEXPECTED_ERROR, detail)
    }
}
