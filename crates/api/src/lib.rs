pub mod cache;
pub mod client;
pub mod models;
pub mod response;

pub use cache::Family;
pub use client::{ApiClient, ApiError, TokenStore};
