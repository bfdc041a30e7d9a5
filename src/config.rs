// src/config.rs
use std::env;

use anyhow::{Context, Result};

/// Connection settings for the Supabase project everything is delegated to.
/// `url` is the project root (no trailing slash); REST, GoTrue and Storage
/// paths are derived from it.
#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    /// When set, access tokens are verified (HS256). Without it the claims
    /// are parsed unverified, which is only acceptable behind trusted infra.
    pub jwt_secret: Option<String>,
    pub storage_bucket: String,
}

impl SupabaseConfig {
    pub fn from_env() -> Result<Self> {
        let url = env::var("SUPABASE_URL")
            .context("SUPABASE_URL not set")?
            .trim()
            .trim_end_matches('/')
            .to_string();
        let anon_key = env::var("SUPABASE_ANON_KEY")
            .context("SUPABASE_ANON_KEY not set")?
            .trim()
            .to_string();
        let service_role_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .context("SUPABASE_SERVICE_ROLE_KEY not set")?
            .trim()
            .to_string();
        let jwt_secret = env::var("SUPABASE_JWT_SECRET")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty());
        let storage_bucket = env::var("SUPABASE_STORAGE_BUCKET")
            .unwrap_or_else(|_| "spots".to_string());

        Ok(Self {
            url,
            anon_key,
            service_role_key,
            jwt_secret,
            storage_bucket,
        })
    }

    pub fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }
}

/// Seeding endpoint is opt-in; it writes fixture rows with the service key.
pub fn seed_enabled() -> bool {
    matches!(
        env::var("SEED_ENABLED").as_deref(),
        Ok("1") | Ok("true") | Ok("TRUE")
    )
}

pub fn allowed_origins() -> String {
    env::var("ALLOWED_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:3000,http://127.0.0.1:3000".into())
}

pub fn bind_address() -> String {
    let port = env::var("PORT").unwrap_or_else(|_| "8080".to_string());
    format!("0.0.0.0:{}", port)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_flag_defaults_off() {
        unsafe { env::remove_var("SEED_ENABLED") };
        assert!(!seed_enabled());
    }

    #[test]
    fn bind_address_defaults_to_8080() {
        unsafe { env::remove_var("PORT") };
        assert_eq!(bind_address(), "0.0.0.0:8080");
    }
}
