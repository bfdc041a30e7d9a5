pub mod auth_services;
