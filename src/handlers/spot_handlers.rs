// src/handlers/spot_handlers.rs
use actix_multipart::Multipart;
use actix_web::{get, post, web, HttpMessage, HttpRequest, HttpResponse};
use futures::StreamExt;
use log::{error, warn};
use uuid::Uuid;

use crate::dtos::error_dtos::ErrorBody;
use crate::dtos::spot_dtos::{validate_new_spot, NewSpotRequest, ValidatedSpot};
use crate::middleware::auth_extractor::AuthenticatedUser;
use crate::models::spot::Spot;
use crate::repositories::spot_repository::{NewSpotImageRow, NewSpotRow};
use crate::repositories::storage_repository::{object_path, ALLOWED_IMAGE_TYPES};
use crate::repositories::RepoError;
use crate::AppState;

const JSON_BODY_LIMIT: usize = 256 * 1024;
const TEXT_FIELD_LIMIT: usize = 64 * 1024;
const IMAGE_BYTES_LIMIT: usize = 10 * 1024 * 1024;

pub fn repo_error_response(e: &RepoError) -> HttpResponse {
    match e {
        RepoError::Http(_) | RepoError::Serde(_) | RepoError::Supabase(_) => {
            HttpResponse::BadGateway().json(ErrorBody::supabase(e.to_string()))
        }
        RepoError::NotFound => HttpResponse::NotFound().json(ErrorBody::not_found(e.to_string())),
        RepoError::Other(_) => {
            HttpResponse::InternalServerError().json(ErrorBody::unexpected(e.to_string()))
        }
    }
}

#[get("/spots")]
pub async fn list_spots(app_state: web::Data<AppState>) -> HttpResponse {
    match app_state.spots.list_with_images().await {
        Ok(spots) => HttpResponse::Ok().json(spots),
        Err(e) => {
            error!("listing spots failed: {}", e);
            repo_error_response(&e)
        }
    }
}

/// One route, two content types. The JSON variant carries pre-uploaded image
/// metadata and requires a signed-in user; the multipart variant carries the
/// image bytes and also serves anonymous submissions.
#[post("/spots")]
pub async fn create_spot(
    req: HttpRequest,
    app_state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
    payload: web::Payload,
) -> HttpResponse {
    if req.content_type() == mime::MULTIPART_FORM_DATA.essence_str() {
        let form = Multipart::new(req.headers(), payload);
        create_spot_from_form(app_state, user, form).await
    } else {
        create_spot_from_json(app_state, user, payload).await
    }
}

async fn create_spot_from_json(
    app_state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
    mut payload: web::Payload,
) -> HttpResponse {
    let user = match user {
        Some(u) => u,
        None => return HttpResponse::Unauthorized().json(ErrorBody::unauthorized()),
    };

    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = match chunk {
            Ok(c) => c,
            Err(e) => {
                return HttpResponse::BadRequest()
                    .json(ErrorBody::validation(format!("broken request body: {}", e)));
            }
        };
        if body.len() + chunk.len() > JSON_BODY_LIMIT {
            return HttpResponse::PayloadTooLarge()
                .json(ErrorBody::validation("request body too large"));
        }
        body.extend_from_slice(&chunk);
    }

    let request: NewSpotRequest = match serde_json::from_slice(&body) {
        Ok(r) => r,
        Err(e) => {
            return HttpResponse::BadRequest()
                .json(ErrorBody::validation(format!("invalid json body: {}", e)));
        }
    };

    let validated = match validate_new_spot(
        request.title.as_deref(),
        request.body.as_deref(),
        request.latitude,
        request.longitude,
    ) {
        Ok(v) => v,
        Err(msg) => return HttpResponse::BadRequest().json(ErrorBody::validation(msg)),
    };

    let spot = match insert_spot_for(&app_state, Some(user.user_id), &validated).await {
        Ok(spot) => spot,
        Err(resp) => return resp,
    };

    // Image blobs were uploaded by the caller; only metadata rows are due.
    let images = request.images.unwrap_or_default();
    let paths: Vec<String> = images.iter().map(|img| img.path.clone()).collect();
    let rows: Vec<NewSpotImageRow> = images
        .into_iter()
        .enumerate()
        .map(|(idx, img)| NewSpotImageRow {
            spot_id: spot.id,
            path: img.path,
            mime: img.mime,
            size_bytes: img.size_bytes,
            width: img.width,
            height: img.height,
            sort_order: img.sort_order.unwrap_or(idx as i32),
        })
        .collect();

    finish_with_images(&app_state, spot, rows, paths).await
}

async fn create_spot_from_form(
    app_state: web::Data<AppState>,
    user: Option<AuthenticatedUser>,
    form: Multipart,
) -> HttpResponse {
    let form = match read_spot_form(form).await {
        Ok(f) => f,
        Err(FormReadError::TooLarge) => {
            return HttpResponse::PayloadTooLarge()
                .json(ErrorBody::validation("image exceeds the upload limit"));
        }
        Err(FormReadError::Broken(msg)) => {
            return HttpResponse::BadRequest()
                .json(ErrorBody::validation(format!("broken multipart body: {}", msg)));
        }
    };

    let validated = match validate_new_spot(
        form.title.as_deref(),
        form.body.as_deref(),
        form.latitude,
        form.longitude,
    ) {
        Ok(v) => v,
        Err(msg) => return HttpResponse::BadRequest().json(ErrorBody::validation(msg)),
    };

    if let Some(ref image) = form.image {
        if !ALLOWED_IMAGE_TYPES.contains(&image.content_type.as_str()) {
            return HttpResponse::BadRequest().json(ErrorBody::validation(format!(
                "unsupported image type: {}",
                image.content_type
            )));
        }
    }

    let user_id = user.map(|u| u.user_id);
    let spot = match insert_spot_for(&app_state, user_id, &validated).await {
        Ok(spot) => spot,
        Err(resp) => return resp,
    };

    // The spot row is committed; from here on image trouble is logged and
    // compensated, never surfaced as a request failure.
    let mut rows = Vec::new();
    let mut uploaded = Vec::new();
    if let Some(image) = form.image {
        let size_bytes = image.bytes.len() as i64;
        let path = object_path(user_id, &image.content_type);
        match app_state
            .storage
            .upload(&path, image.bytes, &image.content_type)
            .await
        {
            Ok(path) => {
                rows.push(NewSpotImageRow {
                    spot_id: spot.id,
                    path: path.clone(),
                    mime: image.content_type,
                    size_bytes,
                    width: form.width,
                    height: form.height,
                    sort_order: 0,
                });
                uploaded.push(path);
            }
            Err(e) => {
                warn!(
                    "image upload failed for spot {} ({}): {}",
                    spot.id, image.file_name, e
                );
            }
        }
    }

    finish_with_images(&app_state, spot, rows, uploaded).await
}

/// Profile guard plus the primary write. A failure here aborts the request.
async fn insert_spot_for(
    app_state: &AppState,
    user_id: Option<Uuid>,
    validated: &ValidatedSpot,
) -> Result<Spot, HttpResponse> {
    if let Some(id) = user_id {
        if let Err(e) = app_state.profiles.ensure_profile(id).await {
            error!("profile upsert failed for {}: {}", id, e);
            return Err(repo_error_response(&e));
        }
    }

    let row = NewSpotRow {
        user_id,
        title: validated.title.clone(),
        body: validated.body.clone(),
        latitude: validated.latitude,
        longitude: validated.longitude,
    };

    match app_state.spots.insert_spot(&row).await {
        Ok(spot) => Ok(spot),
        Err(e) => {
            error!("spot insert failed: {}", e);
            Err(repo_error_response(&e))
        }
    }
}

/// Secondary write with compensation: if the metadata rows cannot be stored,
/// the freshly uploaded blobs are removed so nothing points at them, and the
/// spot is served with an empty image list.
async fn finish_with_images(
    app_state: &AppState,
    mut spot: Spot,
    rows: Vec<NewSpotImageRow>,
    uploaded: Vec<String>,
) -> HttpResponse {
    match app_state.spots.insert_images(&rows).await {
        Ok(images) => spot.images = images,
        Err(e) => {
            warn!("image metadata insert failed for spot {}: {}", spot.id, e);
            if !uploaded.is_empty() {
                if let Err(e) = app_state.storage.remove(&uploaded).await {
                    warn!("orphaned blob cleanup failed: {}", e);
                }
            }
            spot.images = Vec::new();
        }
    }

    HttpResponse::Created().json(spot)
}

struct SpotForm {
    title: Option<String>,
    body: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    width: i32,
    height: i32,
    image: Option<FormImage>,
}

struct FormImage {
    file_name: String,
    content_type: String,
    bytes: Vec<u8>,
}

enum FormReadError {
    TooLarge,
    Broken(String),
}

async fn read_spot_form(mut form: Multipart) -> Result<SpotForm, FormReadError> {
    let mut out = SpotForm {
        title: None,
        body: None,
        latitude: None,
        longitude: None,
        width: 0,
        height: 0,
        image: None,
    };

    while let Some(item) = form.next().await {
        let mut field = item.map_err(|e| FormReadError::Broken(e.to_string()))?;
        match field.name() {
            "title" => out.title = Some(read_text(&mut field).await?),
            "body" => out.body = Some(read_text(&mut field).await?),
            "latitude" => out.latitude = read_text(&mut field).await?.trim().parse().ok(),
            "longitude" => out.longitude = read_text(&mut field).await?.trim().parse().ok(),
            "width" => out.width = read_text(&mut field).await?.trim().parse().unwrap_or(0),
            "height" => out.height = read_text(&mut field).await?.trim().parse().unwrap_or(0),
            "image" => {
                let file_name = field
                    .content_disposition()
                    .get_filename()
                    .map(String::from)
                    .unwrap_or_else(|| "upload.bin".to_string());
                let content_type = field
                    .content_type()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| mime::APPLICATION_OCTET_STREAM.to_string());

                let mut bytes = Vec::new();
                while let Some(chunk) = field.next().await {
                    let chunk = chunk.map_err(|e| FormReadError::Broken(e.to_string()))?;
                    if bytes.len() + chunk.len() > IMAGE_BYTES_LIMIT {
                        return Err(FormReadError::TooLarge);
                    }
                    bytes.extend_from_slice(&chunk);
                }

                out.image = Some(FormImage {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            // Unknown fields (the legacy form sent user_id, which is never
            // trusted) are drained and dropped.
            _ => {
                while let Some(chunk) = field.next().await {
                    chunk.map_err(|e| FormReadError::Broken(e.to_string()))?;
                }
            }
        }
    }

    Ok(out)
}

async fn read_text(field: &mut actix_multipart::Field) -> Result<String, FormReadError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(|e| FormReadError::Broken(e.to_string()))?;
        if bytes.len() + chunk.len() > TEXT_FIELD_LIMIT {
            return Err(FormReadError::TooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}
