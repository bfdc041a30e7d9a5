pub mod api_client;
pub mod composer;
pub mod map_view;
pub mod signals;
pub mod spots_list;
