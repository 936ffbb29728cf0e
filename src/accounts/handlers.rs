use axum::{
    extract::{rejection::JsonRejection, State},
    http::HeaderMap,
    routing::{post, put},
    Json, Router,
};
use lazy_static::lazy_static;
use regex::Regex;
use tracing::{info, instrument, warn};

use super::{
    dto::{
        MessageResponse, PhoneInput, ProfileRequest, ProfileResponse, SigninRequest,
        SigninResponse, SignupRequest, SignupResponse, UpdatePasswordRequest,
    },
    repo_types::{NewAccount, ProfileUpdate},
};
use crate::{
    auth::{authenticate, hash_password, verify_password, AuthUser},
    error::AppError,
    state::AppState,
};

pub const MIN_PASSWORD_LEN: usize = 8;

pub fn account_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/profile", put(update_profile))
        .route("/update-password", post(update_password))
}

pub(crate) fn is_valid_phone(phone: &str) -> bool {
    lazy_static! {
        static ref PHONE_RE: Regex = Regex::new(r"^[0-9]{10,15}$").unwrap();
    }
    PHONE_RE.is_match(phone)
}

fn is_strong_enough(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
}

fn normalize_email(email: Option<String>) -> Option<String> {
    email
        .map(|e| e.trim().to_lowercase())
        .filter(|e| !e.is_empty())
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    payload: Result<Json<SignupRequest>, JsonRejection>,
) -> Result<Json<SignupResponse>, AppError> {
    let Json(payload) = payload?;

    let password = payload.password.unwrap_or_default();
    if !is_strong_enough(&password) {
        warn!("password too short");
        return Err(AppError::invalid_input(
            "Password must be at least 8 characters long!",
        ));
    }

    let phone = payload.phone.map(PhoneInput::into_text).unwrap_or_default();
    if !is_valid_phone(&phone) {
        warn!("invalid phone number");
        return Err(AppError::invalid_input("Invalid phone number format!"));
    }

    let name = payload.name.map(|n| n.trim().to_string()).unwrap_or_default();
    let Some(email) = normalize_email(payload.email).filter(|_| !name.is_empty()) else {
        warn!("missing name or email");
        return Err(AppError::invalid_input("Name and email are required!"));
    };

    if state.accounts.find_by_email(&email).await?.is_some() {
        warn!(email = %email, "email already registered");
        return Err(AppError::Conflict);
    }

    let password_hash = hash_password(&password)?;
    // The unique index still catches a concurrent signup for the same email.
    let account = state
        .accounts
        .create(NewAccount {
            name,
            phone,
            email,
            password_hash,
        })
        .await?;

    let token = state.tokens.issue(&account.email)?;

    info!(account_id = %account.id, email = %account.email, "account created");
    Ok(Json(SignupResponse {
        message: "User created successfully!".into(),
        id: account.id,
        token,
    }))
}

/// Unknown email and wrong password share one "Invalid credentials" reply so the
/// response does not reveal which accounts exist.
#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    payload: Result<Json<SigninRequest>, JsonRejection>,
) -> Result<Json<SigninResponse>, AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(payload.email).ok_or(AppError::InvalidCredentials)?;
    let password = payload.password.unwrap_or_default();

    let Some(account) = state.accounts.find_by_email(&email).await? else {
        warn!(email = %email, "signin unknown email");
        return Err(AppError::InvalidCredentials);
    };

    if !verify_password(&password, &account.password_hash)? {
        warn!(email = %email, account_id = %account.id, "signin invalid password");
        return Err(AppError::InvalidCredentials);
    }

    let token = state.tokens.issue(&account.email)?;

    info!(account_id = %account.id, email = %account.email, "account signed in");
    Ok(Json(SigninResponse {
        message: "User login done successfully!".into(),
        id: account.id,
        name: account.name,
        email: account.email,
        token,
    }))
}

/// The account is chosen by the token's email, never by the body.
#[instrument(skip(state, user, payload), fields(email = %user.email()))]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    payload: Result<Json<ProfileRequest>, JsonRejection>,
) -> Result<Json<ProfileResponse>, AppError> {
    let Json(payload) = payload?;

    // Replace, not merge: absent fields become empty.
    let profile = ProfileUpdate {
        name: payload.name.unwrap_or_default(),
        gender: payload.gender.unwrap_or_default(),
        country: payload.country.unwrap_or_default(),
    };

    let Some(account) = state.accounts.update_profile(user.email(), &profile).await? else {
        warn!("profile update for missing account");
        return Err(AppError::NotFound("User not found".into()));
    };

    info!(account_id = %account.id, "profile updated");
    Ok(Json(ProfileResponse {
        message: "Profile updated successfully".into(),
        data: account,
    }))
}

#[instrument(skip(state, headers, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<UpdatePasswordRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, AppError> {
    let Json(payload) = payload?;

    let Some(email) = normalize_email(payload.email) else {
        return Err(AppError::invalid_input(
            "Email and new password are required!",
        ));
    };

    let new_password = payload.new_password.unwrap_or_default();
    if !is_strong_enough(&new_password) {
        return Err(AppError::invalid_input(
            "New password must be at least 8 characters long!",
        ));
    }

    if state.config.password_reset_requires_token {
        let claims = authenticate(&headers, &state.tokens)?;
        if claims.email != email {
            warn!(email = %email, token_email = %claims.email, "password reset for another account");
            return Err(AppError::Forbidden);
        }
    } else {
        warn!(email = %email, "unauthenticated password reset");
    }

    let password_hash = hash_password(&new_password)?;
    if state
        .accounts
        .update_password(&email, &password_hash)
        .await?
        .is_none()
    {
        warn!(email = %email, "password reset for missing account");
        return Err(AppError::NotFound("User not found".into()));
    }

    info!(email = %email, "password updated");
    Ok(Json(MessageResponse::new("Password updated successfully!")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phone_must_be_ten_to_fifteen_digits() {
        assert!(is_valid_phone("1234567890"));
        assert!(is_valid_phone("123456789012345"));
        assert!(!is_valid_phone("123456789"));
        assert!(!is_valid_phone("1234567890123456"));
        assert!(!is_valid_phone("12a456789"));
        assert!(!is_valid_phone("+1234567890"));
        assert!(!is_valid_phone(""));
    }

    #[test]
    fn password_length_counts_characters() {
        assert!(!is_strong_enough("1234567"));
        assert!(is_strong_enough("12345678"));
        assert!(!is_strong_enough(""));
    }

    #[test]
    fn email_is_trimmed_and_lowercased() {
        assert_eq!(normalize_email(Some("  Ann@X.com ".into())).as_deref(), Some("ann@x.com"));
        assert_eq!(normalize_email(Some("   ".into())), None);
        assert_eq!(normalize_email(None), None);
    }
}
