// src/main.rs
use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use log::{error, info};
use reqwest::Client;

use kizuki_be::config::{self, SupabaseConfig};
use kizuki_be::handlers;
use kizuki_be::services::auth_services::AuthService;
use kizuki_be::AppState;

fn mask_key(k: &str) -> String {
    if k.len() <= 8 { "[REDACTED]".to_string() }
    else { format!("{}***{}", &k[..4], &k[k.len()-4..]) }
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    env_logger::init();
    dotenv::dotenv().ok();

    let cfg = match SupabaseConfig::from_env() {
        Ok(c) => c,
        Err(e) => {
            error!("Failed to load Supabase config: {:#}", e);
            std::process::exit(1);
        }
    };

    info!("Supabase URL: {}", cfg.url);
    info!("Supabase Key: {}", mask_key(&cfg.service_role_key));

    let http_client = Client::builder()
        .user_agent("kizuki-be/0.1")
        .build()
        .expect("failed to build http client");

    let seed_enabled = config::seed_enabled();
    if seed_enabled {
        info!("Seed endpoint enabled");
    }

    let auth_service = AuthService::new(&cfg, http_client.clone());
    let auth_data = web::Data::new(auth_service);

    let state = web::Data::new(AppState::new(&cfg, http_client, seed_enabled));

    let allowed_origins = config::allowed_origins();
    let bind_address = config::bind_address();

    info!("Starting server on {}", bind_address);

    HttpServer::new(move || {
        let mut cors = Cors::default()
            .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
            .allowed_headers(vec![
                "authorization",
                "content-type",
                "accept",
                "x-requested-with",
            ])
            .supports_credentials()
            .max_age(3600);

        for origin in allowed_origins
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
        {
            cors = cors.allowed_origin(origin);
        }

        App::new()
            .wrap(cors)
            .wrap(Logger::default())
            .app_data(state.clone())
            .app_data(auth_data.clone())
            .configure(handlers::routes)
    })
    .bind(&bind_address)?
    .run()
    .await
}
