// src/lib.rs
pub mod components;
pub mod config;
pub mod dtos;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod services;

use reqwest::Client;

use crate::config::SupabaseConfig;
use crate::repositories::profile_repository::ProfileRepository;
use crate::repositories::spot_repository::SpotRepository;
use crate::repositories::storage_repository::StorageRepository;

#[derive(Clone)]
pub struct AppState {
    pub spots: SpotRepository,
    pub profiles: ProfileRepository,
    pub storage: StorageRepository,
    pub seed_enabled: bool,
}

impl AppState {
    pub fn new(cfg: &SupabaseConfig, client: Client, seed_enabled: bool) -> Self {
        Self {
            spots: SpotRepository::new(cfg, client.clone()),
            profiles: ProfileRepository::new(cfg, client.clone()),
            storage: StorageRepository::new(cfg, client),
            seed_enabled,
        }
    }
}
