use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Algorithm, Argon2, Params, Version,
};
use rand::rngs::OsRng;
use tracing::error;

/// Argon2id memory cost in KiB.
pub const MEMORY_COST_KIB: u32 = 19 * 1024;
/// Argon2id passes over memory.
pub const TIME_COST: u32 = 2;
pub const PARALLELISM: u32 = 1;

/// The account hasher with its cost pinned, so stored hashes do not drift with
/// upstream defaults.
fn account_hasher() -> anyhow::Result<Argon2<'static>> {
    let params = Params::new(MEMORY_COST_KIB, TIME_COST, PARALLELISM, None).map_err(|e| {
        error!(error = %e, "argon2 params rejected");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::new(Algorithm::Argon2id, Version::V0x13, params))
}

/// Salted one-way hash of an account password, as a PHC string.
pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    account_hasher()?
        .hash_password(plain.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| {
            error!(error = %e, "password hashing failed");
            anyhow::anyhow!(e.to_string())
        })
}

/// Checks a password against a stored hash. The hash carries its own cost
/// parameters, so accounts hashed under older settings still verify.
///
/// `Ok(false)` on mismatch; `Err` only when the stored hash cannot be parsed.
pub fn verify_password(plain: &str, stored_hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| {
        error!(error = %e, "stored password hash is malformed");
        anyhow::anyhow!(e.to_string())
    })?;
    let matches = account_hasher()?
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok();
    Ok(matches)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_and_verify_roundtrip() {
        let hash = hash_password("longpass1").expect("hashing should succeed");
        assert!(verify_password("longpass1", &hash).expect("verify should succeed"));
    }

    #[test]
    fn verify_rejects_wrong_password() {
        let hash = hash_password("correct-horse-battery-staple").expect("hashing should succeed");
        assert!(!verify_password("wrong-password", &hash).expect("verify should not error"));
    }

    #[test]
    fn hash_records_pinned_cost() {
        let hash = hash_password("longpass1").unwrap();
        assert!(hash.starts_with("$argon2id$v=19$"));
        assert!(hash.contains(&format!(
            "m={MEMORY_COST_KIB},t={TIME_COST},p={PARALLELISM}"
        )));
    }

    #[test]
    fn verifies_hash_made_with_other_cost() {
        let salt = SaltString::generate(&mut OsRng);
        let params = Params::new(8 * 1024, 1, 1, None).unwrap();
        let legacy = Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
            .hash_password(b"longpass1", &salt)
            .unwrap()
            .to_string();
        assert!(verify_password("longpass1", &legacy).unwrap());
    }

    #[test]
    fn same_password_hashes_differently() {
        let a = hash_password("longpass1").unwrap();
        let b = hash_password("longpass1").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("longpass1"));
    }

    #[test]
    fn verify_errors_on_malformed_hash() {
        let err = verify_password("anything", "not-a-valid-hash").unwrap_err();
        assert!(!err.to_string().is_empty());
    }
}
