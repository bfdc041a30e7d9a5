// src/repositories/spot_repository.rs
use log::debug;
use reqwest::Client;
use serde::Serialize;
use uuid::Uuid;

use crate::config::SupabaseConfig;
use crate::models::spot::{Spot, SpotImage};
use crate::repositories::{snippet, RepoError};

/// Repository for the `spots` and `spot_images` tables via PostgREST.
#[derive(Clone)]
pub struct SpotRepository {
    client: Client,
    base_rest_url: String,
    service_role_key: String,
    anon_key: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct NewSpotRow {
    pub user_id: Option<Uuid>,
    pub title: String,
    pub body: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize)]
pub struct NewSpotImageRow {
    pub spot_id: Uuid,
    pub path: String,
    pub mime: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub sort_order: i32,
}

impl SpotRepository {
    pub fn new(cfg: &SupabaseConfig, client: Client) -> Self {
        Self {
            client,
            base_rest_url: cfg.rest_url(),
            service_role_key: cfg.service_role_key.clone(),
            anon_key: Some(cfg.anon_key.clone()),
        }
    }

    fn spots_url(&self) -> String {
        format!("{}/spots", self.base_rest_url.trim_end_matches('/'))
    }

    fn images_url(&self) -> String {
        format!("{}/spot_images", self.base_rest_url.trim_end_matches('/'))
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

    /// All spots, newest first, with their images embedded in `sort_order`.
    pub async fn list_with_images(&self) -> Result<Vec<Spot>, RepoError> {
        let url = format!(
            "{}?select=*,spot_images(*)&order=created_at.desc&spot_images.order=sort_order.asc",
            self.spots_url()
        );

        let resp = self.client.get(&url).headers(self.headers()).send().await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                snippet(&text)
            )));
        }

        debug!("spots list response ({} bytes)", text.len());
        let spots: Vec<Spot> = serde_json::from_str(&text)?;
        Ok(spots)
    }

    /// Insert one spot and return the stored row.
    pub async fn insert_spot(&self, row: &NewSpotRow) -> Result<Spot, RepoError> {
        let resp = self
            .client
            .post(&self.spots_url())
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .json(row)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                snippet(&text)
            )));
        }

        let arr: Vec<Spot> = serde_json::from_str(&text)?;
        arr.into_iter()
            .next()
            .ok_or_else(|| RepoError::Other("empty representation from spot insert".to_string()))
    }

    /// Insert image metadata rows and return them in `sort_order`.
    pub async fn insert_images(
        &self,
        rows: &[NewSpotImageRow],
    ) -> Result<Vec<SpotImage>, RepoError> {
        if rows.is_empty() {
            return Ok(Vec::new());
        }

        let resp = self
            .client
            .post(&self.images_url())
            .headers(self.headers())
            .header("Prefer", "return=representation")
            .json(rows)
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(RepoError::Supabase(format!(
                "{} -> {}",
                status.as_u16(),
                snippet(&text)
            )));
        }

        let mut images: Vec<SpotImage> = serde_json::from_str(&text)?;
        images.sort_by_key(|img| img.sort_order);
        Ok(images)
    }
}
