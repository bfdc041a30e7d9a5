pub mod profile;
pub mod spot;
