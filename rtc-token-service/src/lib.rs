pub mod access_token;
pub mod app;
pub mod config;
pub mod expiry;
pub mod handlers;
pub mod metrics;
pub mod request;
pub mod signer;

pub use app::{build_router, AppState};
