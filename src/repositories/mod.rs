pub mod profile_repository;
pub mod spot_repository;
pub mod storage_repository;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum RepoError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("supabase error: {0}")]
    Supabase(String),
    #[error("not found")]
    NotFound,
    #[error("other: {0}")]
    Other(String),
}

/// Upstream bodies go into logs and error strings; cap them so an HTML error
/// page does not flood either.
pub(crate) fn snippet(body: &str) -> &str {
    if body.len() > 500 {
        let mut end = 500;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        &body[..end]
    } else {
        body
    }
}
