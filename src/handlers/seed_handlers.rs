// src/handlers/seed_handlers.rs
use actix_web::{post, web, HttpResponse};
use log::{error, info};
use serde::Serialize;

use crate::dtos::error_dtos::ErrorBody;
use crate::handlers::spot_handlers::repo_error_response;
use crate::models::spot::Spot;
use crate::repositories::spot_repository::{NewSpotImageRow, NewSpotRow};
use crate::AppState;

struct SeedFixture {
    title: &'static str,
    body: &'static str,
    latitude: f64,
    longitude: f64,
    image_url: &'static str,
}

const FIXTURES: [SeedFixture; 2] = [
    SeedFixture {
        title: "公園のベンチ",
        body: "日当たりが良い場所",
        latitude: 35.6812,
        longitude: 139.7671,
        image_url: "https://images.unsplash.com/photo-1519996529931-28324d5a630e",
    },
    SeedFixture {
        title: "静かなカフェ",
        body: "勉強しやすい店",
        latitude: 35.6809,
        longitude: 139.7680,
        image_url: "https://images.unsplash.com/photo-1503602642458-232111445657",
    },
];

#[derive(Serialize)]
struct SeedResponse {
    inserted: Vec<Spot>,
}

/// Insert the fixture rows. Gated behind `SEED_ENABLED`; in production the
/// route answers 404 as if it did not exist.
#[post("/seed-spots")]
pub async fn seed_spots(app_state: web::Data<AppState>) -> HttpResponse {
    if !app_state.seed_enabled {
        return HttpResponse::NotFound().json(ErrorBody::not_found("seeding is disabled"));
    }

    let mut inserted = Vec::with_capacity(FIXTURES.len());
    for fixture in &FIXTURES {
        let row = NewSpotRow {
            user_id: None,
            title: fixture.title.to_string(),
            body: Some(fixture.body.to_string()),
            latitude: fixture.latitude,
            longitude: fixture.longitude,
        };

        let mut spot = match app_state.spots.insert_spot(&row).await {
            Ok(spot) => spot,
            Err(e) => {
                error!("seed insert failed: {}", e);
                return repo_error_response(&e);
            }
        };

        let image_row = NewSpotImageRow {
            spot_id: spot.id,
            path: fixture.image_url.to_string(),
            mime: "image/jpeg".to_string(),
            size_bytes: 0,
            width: 0,
            height: 0,
            sort_order: 0,
        };
        match app_state.spots.insert_images(&[image_row]).await {
            Ok(images) => spot.images = images,
            Err(e) => {
                error!("seed image insert failed: {}", e);
                return repo_error_response(&e);
            }
        }

        inserted.push(spot);
    }

    info!("seeded {} spots", inserted.len());
    HttpResponse::Ok().json(SeedResponse { inserted })
}
