// src/models/spot.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A geotagged note as served by the API. PostgREST returns the embedded
/// image rows under the table name `spot_images`; the alias lets the same
/// struct read that shape while serializing as `images`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spot {
    pub id: Uuid,
    pub user_id: Option<Uuid>,
    pub title: String,
    pub body: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_at: DateTime<Utc>,
    #[serde(alias = "spot_images", default)]
    pub images: Vec<SpotImage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpotImage {
    pub id: Uuid,
    pub spot_id: Uuid,
    /// Storage object key, or an absolute URL for externally hosted images.
    pub path: String,
    pub mime: String,
    pub size_bytes: i64,
    pub width: i32,
    pub height: i32,
    pub sort_order: i32,
}
