// src/dtos/spot_dtos.rs
use serde::{Deserialize, Serialize};

/// JSON body for `POST /api/spots`. Everything is optional at the serde
/// layer so missing fields surface as a 400 with a usable message instead of
/// a deserialization error.
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct NewSpotRequest {
    pub title: Option<String>,
    pub body: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub images: Option<Vec<NewSpotImage>>,
}

/// Image metadata accompanying the JSON variant. The bytes themselves are
/// expected to already be in storage (the multipart variant uploads them).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewSpotImage {
    pub path: String,
    pub mime: String,
    #[serde(default)]
    pub size_bytes: i64,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
    #[serde(default)]
    pub sort_order: Option<i32>,
}

/// The fields every new spot must carry, produced by [`validate_new_spot`].
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedSpot {
    pub title: String,
    pub body: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

/// Shared by the JSON handler, the multipart handler and the composer:
/// a spot needs a non-empty title and finite coordinates, nothing else.
pub fn validate_new_spot(
    title: Option<&str>,
    body: Option<&str>,
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<ValidatedSpot, String> {
    let title = title.map(str::trim).unwrap_or_default();
    if title.is_empty() {
        return Err("title is required".to_string());
    }
    let latitude = match latitude {
        Some(v) if v.is_finite() => v,
        _ => return Err("latitude must be a finite number".to_string()),
    };
    let longitude = match longitude {
        Some(v) if v.is_finite() => v,
        _ => return Err("longitude must be a finite number".to_string()),
    };

    Ok(ValidatedSpot {
        title: title.to_string(),
        body: body.map(str::trim).filter(|b| !b.is_empty()).map(String::from),
        latitude,
        longitude,
    })
}
