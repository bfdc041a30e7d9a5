pub mod auth_dtos;
pub mod error_dtos;
pub mod spot_dtos;
