pub mod handlers;
pub mod models;

pub use handlers::{AppState, api_routes};
