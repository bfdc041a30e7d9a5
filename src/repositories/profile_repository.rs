// src/repositories/profile_repository.rs
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::repositories::{snippet, RepoError};

/// Repository for the `profiles` table. A profile row must exist before the
/// first spot referencing it, so writes go through [`ensure_profile`] first.
///
/// [`ensure_profile`]: ProfileRepository::ensure_profile
#[derive(Clone)]
pub struct ProfileRepository {
    client: Client,
    base_rest_url: String,
    service_role_key: String,
    anon_key: Option<String>,
}

impl ProfileRepository {
    pub fn new(cfg: &SupabaseConfig, client: Client) -> Self {
        Self {
            client,
            base_rest_url: cfg.rest_url(),
            service_role_key: cfg.service_role_key.clone(),
            anon_key: Some(cfg.anon_key.clone()),
        }
    }

    fn profiles_url(&self) -> String {
        format!("{}/profiles", self.base_rest_url.trim_end_matches('/'))
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        if let Some(ref key) = self.anon_key {
            headers.insert("apikey", HeaderValue::from_str(key).unwrap());
        }
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_role_key)).unwrap(),
        );
        headers
    }

    /// Upsert a bare profile row for `user_id`. An existing row is left
    /// untouched (merge-duplicates with no fields to merge).
    pub async fn ensure_profile(&self, user_id: Uuid) -> Result<(), RepoError> {
        #[derive(Serialize)]
        struct Payload {
            id: Uuid,
        }

        let resp = self
            .client
            .post(&self.profiles_url())
            .headers(self.headers())
            .header("Prefer", "resolution=merge-duplicates,return=minimal")
            .json(&Payload { id: user_id })
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                snippet(&text)
            )));
        }
        Ok(())
    }
}
