pub mod aggregate;
pub mod api;
pub mod auth;
pub mod config;
pub mod constants;
pub mod error;
pub mod models;
pub mod notify;
pub mod ocr;
pub mod service;
pub mod storage;

pub use error::TagbookError;
pub use notify::in_memory::InMemoryNotifier;
pub use service::TagbookService;
pub use storage::in_memory::InMemoryStorage;

#[cfg(test)]
mod tests;
