use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record in the store.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub phone: String,
    pub email: String, // unique lookup key
    #[serde(skip_serializing)]
    pub password_hash: String, // Argon2 hash, not exposed in JSON
    pub gender: String,
    pub country: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Fields supplied at signup.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub phone: String,
    pub email: String,
    pub password_hash: String,
}

/// Replacement values for the mutable profile fields.
#[derive(Debug, Clone)]
pub struct ProfileUpdate {
    pub name: String,
    pub gender: String,
    pub country: String,
}
