//! Payment placeholder. No transaction is performed; the route only proves the
//! caller holds a valid token.

use axum::{routing::post, Json, Router};
use tracing::{info, instrument};

use crate::{accounts::dto::MessageResponse, auth::AuthUser, error::AppError, state::AppState};

pub fn router() -> Router<AppState> {
    Router::new().route("/payment", post(payment))
}

#[instrument(skip(user), fields(email = %user.email()))]
pub async fn payment(user: AuthUser) -> Result<Json<MessageResponse>, AppError> {
    info!("payment accepted");
    Ok(Json(MessageResponse::new("Payment successful")))
}
