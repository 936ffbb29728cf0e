use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::debug;

/// Lifetime of every issued token.
pub const TOKEN_TTL: Duration = Duration::hours(1);

/// JWT payload. The email is the only identity the token carries.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    pub email: String,
    pub iat: i64, // issued at (unix timestamp)
    pub exp: i64, // expires at (unix timestamp)
}

#[derive(Debug, Error)]
pub enum TokenError {
    /// Bad signature, malformed token and expiry all collapse into this.
    #[error("invalid or expired token")]
    Invalid,

    #[error("failed to sign token: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),
}

/// Signs and verifies bearer tokens with a process-wide HMAC secret.
#[derive(Clone)]
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenService {
    pub fn new(secret: &str) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: TOKEN_TTL,
        }
    }

    pub fn issue(&self, email: &str) -> Result<String, TokenError> {
        self.issue_at(email, OffsetDateTime::now_utc())
    }

    pub fn issue_at(&self, email: &str, now: OffsetDateTime) -> Result<String, TokenError> {
        let claims = Claims {
            email: email.to_string(),
            iat: now.unix_timestamp(),
            exp: (now + self.ttl).unix_timestamp(),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?;
        debug!(email = %email, "jwt signed");
        Ok(token)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, OffsetDateTime::now_utc())
    }

    pub fn verify_at(&self, token: &str, now: OffsetDateTime) -> Result<Claims, TokenError> {
        // Expiry is checked below against `now` so callers control the clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "iat"]);

        let data = decode::<Claims>(token, &self.decoding, &validation).map_err(|e| {
            debug!(error = %e, "jwt rejected");
            TokenError::Invalid
        })?;

        if now.unix_timestamp() > data.claims.exp {
            debug!(email = %data.claims.email, exp = data.claims.exp, "jwt expired");
            return Err(TokenError::Invalid);
        }

        debug!(email = %data.claims.email, "jwt verified");
        Ok(data.claims)
    }
}
