pub mod accounts;
pub mod app;
pub mod auth;
pub mod config;
pub mod error;
pub mod payments;
pub mod state;

pub use app::{build_app, serve};
pub use error::AppError;
pub use state::AppState;
