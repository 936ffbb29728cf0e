use crate::state::AppState;
use axum::Router;

pub mod dto;
pub mod handlers;
pub mod repo;
pub mod repo_types;

pub use repo::{AccountStore, MemoryAccountStore, PgAccountStore, StoreError};
pub use repo_types::{Account, NewAccount, ProfileUpdate};

pub fn router() -> Router<AppState> {
    handlers::account_routes()
}
