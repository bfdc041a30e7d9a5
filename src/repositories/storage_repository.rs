// src/repositories/storage_repository.rs
use log::debug;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::repositories::{snippet, RepoError};

pub const ALLOWED_IMAGE_TYPES: [&str; 5] = [
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
];

/// Supabase Storage client for the spot-images bucket: raw object upload,
/// best-effort removal and public URL composition.
#[derive(Clone)]
pub struct StorageRepository {
    client: Client,
    base_url: String,
    service_role_key: String,
    anon_key: Option<String>,
    bucket: String,
}

impl StorageRepository {
    pub fn new(cfg: &SupabaseConfig, client: Client) -> Self {
        Self {
            client,
            base_url: cfg.url.trim_end_matches('/').to_string(),
            service_role_key: cfg.service_role_key.clone(),
            anon_key: Some(cfg.anon_key.clone()),
            bucket: cfg.storage_bucket.clone(),
        }
    }

    fn object_url(&self, path: &str) -> String {
        format!("{}/storage/v1/object/{}/{}", self.base_url, self.bucket, path)
    }

    fn headers(&self) -> reqwest::header::HeaderMap {
        use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
        let mut headers = HeaderMap::new();
        if let Some(ref key) = self.anon_key {
            headers.insert("apikey", HeaderValue::from_str(key).unwrap());
        }
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", self.service_role_key)).unwrap(),
        );
        headers
    }

    /// Upload raw bytes under `path`. Returns the path so callers can thread
    /// it straight into the metadata row.
    pub async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> Result<String, RepoError> {
        let size = bytes.len();
        let resp = self
            .client
            .post(&self.object_url(path))
            .headers(self.headers())
            .header("Content-Type", content_type)
            .header("x-upsert", "false")
            .body(bytes)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await.unwrap_or_default();
        if !status.is_success() {
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                snippet(&text)
            )));
        }

        debug!("uploaded {} ({} bytes)", path, size);
        Ok(path.to_string())
    }

    /// Delete objects by path. Used as compensation after a failed metadata
    /// write, so the orphaned blob does not linger.
    pub async fn remove(&self, paths: &[String]) -> Result<(), RepoError> {
        if paths.is_empty() {
            return Ok(());
        }

        #[derive(Serialize)]
        struct Payload<'a> {
            prefixes: &'a [String],
        }

        let url = format!("{}/storage/v1/object/{}", self.base_url, self.bucket);
        let resp = self
            .client
            .delete(&url)
            .headers(self.headers())
            .header("Content-Type", "application/json")
            .json(&Payload { prefixes: paths })
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

    /// Public URL for an object path. Absolute URLs (seed fixtures point at
    /// external hosts) pass through unchanged.
    pub fn public_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.base_url, self.bucket, path
        )
    }
}

/// Object key for an uploaded image: `{owner}/{uuid}.{ext}`. Anonymous
/// submissions share the `anon` namespace.
pub fn object_path(user_id: Option<Uuid>, content_type: &str) -> String {
    let owner = user_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "anon".to_string());
    let extension = match content_type {
        "image/jpeg" | "image/jpg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    };
    format!("{}/{}.{}", owner, Uuid::new_v4(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn repo() -> StorageRepository {
        let cfg = SupabaseConfig {
            url: "https://proj.supabase.co".into(),
            anon_key: "anon".into(),
            service_role_key: "service".into(),
            jwt_secret: None,
            storage_bucket: "spots".into(),
        };
        StorageRepository::new(&cfg, Client::new())
    }

    #[test]
    fn public_url_composes_bucket_path() {
        assert_eq!(
            repo().public_url("anon/abc.jpg"),
            "https://proj.supabase.co/storage/v1/object/public/spots/anon/abc.jpg"
        );
    }

    #[test]
    fn public_url_passes_absolute_urls_through() {
        let external = "https://images.unsplash.com/photo-1519996529931-28324d5a630e";
        assert_eq!(repo().public_url(external), external);
    }

    #[test]
    fn object_path_namespaces_by_owner() {
        let user = Uuid::new_v4();
        let p = object_path(Some(user), "image/png");
        assert!(p.starts_with(&format!("{}/", user)));
        assert!(p.ends_with(".png"));

        let anon = object_path(None, "image/webp");
        assert!(anon.starts_with("anon/"));
        assert!(anon.ends_with(".webp"));
    }

    #[test]
    fn object_path_falls_back_to_bin() {
        assert!(object_path(None, "application/pdf").ends_with(".bin"));
    }
}
