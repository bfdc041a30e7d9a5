// src/components/api_client.rs
use serde::Deserialize;
use thiserror::Error;

use crate::dtos::error_dtos::{ErrorBody, SUPABASE_ERROR, UNEXPECTED_ERROR};
use crate::dtos::spot_dtos::{NewSpotRequest, ValidatedSpot};
use crate::models::spot::Spot;
use crate::repositories::snippet;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("request rejected: {}", .0.error)]
    Rejected(ErrorBody),
}

/// What a list fetch produced, decided once at the boundary. Historically
/// every reader re-inspected the payload (bare array? `{data}` envelope?
/// error object?); that three-way runtime check lives here and nowhere else.
#[derive(Debug)]
pub enum ListOutcome {
    Items(Vec<Spot>),
    Failed(ErrorBody),
}

/// An image the composer wants to attach, with the dimensions the form
/// reports alongside the bytes.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
    pub width: i32,
    pub height: i32,
}

/// HTTP boundary used by the UI components. Owns base-URL knowledge so the
/// components never build URLs themselves.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    /// Public storage prefix (`.../storage/v1/object/public/{bucket}`) for
    /// turning stored image paths into fetchable URLs.
    image_base_url: Option<String>,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            image_base_url: None,
        }
    }

    pub fn with_image_base(mut self, image_base_url: impl Into<String>) -> Self {
        self.image_base_url = Some(image_base_url.into().trim_end_matches('/').to_string());
        self
    }

    fn spots_url(&self) -> String {
        format!("{}/api/spots", self.base_url)
    }

    /// Fetch the spot collection. Transport failures are `Err`; everything
    /// the server actually answered becomes a [`ListOutcome`].
    pub async fn list_spots(&self) -> Result<ListOutcome, ClientError> {
        let resp = self.http.get(self.spots_url()).send().await?;
        let status = resp.status().as_u16();
        let text = resp.text().await?;
        Ok(normalize_list_body(status, &text))
    }

    /// JSON create. Image metadata, if any, must already point at uploaded
    /// blobs.
    pub async fn create_spot(
        &self,
        token: Option<&str>,
        request: &NewSpotRequest,
    ) -> Result<Spot, ClientError> {
        let mut req = self.http.post(self.spots_url()).json(request);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Rejected(parse_error_body(
                status.as_u16(),
                &text,
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            ClientError::Rejected(ErrorBody::unexpected(format!(
                "invalid create response: {}",
                e
            )))
        })
    }

    /// Multipart create carrying the image bytes. Works without a token;
    /// the server files anonymous submissions under its placeholder owner.
    pub async fn create_spot_multipart(
        &self,
        token: Option<&str>,
        validated: &ValidatedSpot,
        image: Option<&ImageUpload>,
    ) -> Result<Spot, ClientError> {
        let mut form = reqwest::multipart::Form::new()
            .text("title", validated.title.clone())
            .text("latitude", validated.latitude.to_string())
            .text("longitude", validated.longitude.to_string());
        if let Some(ref body) = validated.body {
            form = form.text("body", body.clone());
        }
        if let Some(image) = image {
            let part = reqwest::multipart::Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.mime)?;
            form = form
                .text("width", image.width.to_string())
                .text("height", image.height.to_string())
                .part("image", part);
        }

        let mut req = self.http.post(self.spots_url()).multipart(form);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }

        let resp = req.send().await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Rejected(parse_error_body(
                status.as_u16(),
                &text,
            )));
        }

        serde_json::from_str(&text).map_err(|e| {
            ClientError::Rejected(ErrorBody::unexpected(format!(
                "invalid create response: {}",
                e
            )))
        })
    }

    /// Fetchable URL for a stored image path. Absolute paths (externally
    /// hosted images) pass through; relative paths need a configured base.
    pub fn image_url(&self, path: &str) -> Option<String> {
        if path.starts_with("http://") || path.starts_with("https://") {
            return Some(path.to_string());
        }
        self.image_base_url
            .as_ref()
            .map(|base| format!("{}/{}", base, path))
    }
}

/// One decision point for every list-response shape the backend boundary
/// has been observed to produce.
fn normalize_list_body(status: u16, body: &str) -> ListOutcome {
    if let Ok(items) = serde_json::from_str::<Vec<Spot>>(body) {
        return ListOutcome::Items(items);
    }

    #[derive(Deserialize)]
    struct Enveloped {
        data: Vec<Spot>,
    }
    if let Ok(enveloped) = serde_json::from_str::<Enveloped>(body) {
        return ListOutcome::Items(enveloped.data);
    }

    if let Ok(err) = serde_json::from_str::<ErrorBody>(body) {
        return ListOutcome::Failed(err);
    }

    // Non-JSON (an HTML error page, typically) or an unrecognized shape.
    let code = if status >= 500 {
        SUPABASE_ERROR
    } else {
        UNEXPECTED_ERROR
    };
    ListOutcome::Failed(ErrorBody::new(
        code,
        format!("unparseable response (status {}): {}", status, snippet(body)),
    ))
}

fn parse_error_body(status: u16, body: &str) -> ErrorBody {
    serde_json::from_str(body).unwrap_or_else(|_| {
        let code = if status >= 500 {
            SUPABASE_ERROR
        } else {
            UNEXPECTED_ERROR
        };
        ErrorBody::new(code, format!("status {}: {}", status, snippet(body)))
    })
}
