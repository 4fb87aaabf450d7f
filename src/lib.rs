//! Student registration and authentication backend.
//!
//! Students register with a multipart form (profile fields plus an optional
//! national ID copy and profile logo), wait for an administrator to activate
//! the account, then log in with their phone or email to receive a JWT.

pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod response;
pub mod state;
pub mod storage;
pub mod students;
pub mod uploads;

pub use app::build_app;
pub use config::AppConfig;
pub use error::AppError;
pub use state::AppState;
