use std::collections::HashMap;

use anyhow::Context;
use axum::async_trait;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::repo_types::{Account, NewAccount, ProfileUpdate};

const ACCOUNT_COLUMNS: &str = "id, name, phone, email, password_hash, gender, country, created_at";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("an account with this email already exists")]
    Duplicate,

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Persistence for accounts, keyed by email.
#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create(&self, account: NewAccount) -> Result<Account, StoreError>;

    async fn update_profile(
        &self,
        email: &str,
        profile: &ProfileUpdate,
    ) -> Result<Option<Account>, StoreError>;

    async fn update_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, StoreError>;
}

#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connect to database")?;
        Ok(Self { db })
    }

    pub async fn migrate(&self) -> anyhow::Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.db)
            .await
            .context("run migrations")?;
        Ok(())
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let created = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (id, name, phone, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(&account.name)
        .bind(&account.phone)
        .bind(&account.email)
        .bind(&account.password_hash)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Duplicate,
            other => StoreError::Database(other),
        })?;
        Ok(created)
    }

    async fn update_profile(
        &self,
        email: &str,
        profile: &ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let updated = sqlx::query_as::<_, Account>(&format!(
            r#"
            UPDATE accounts
               SET name = $2, gender = $3, country = $4
             WHERE email = $1
            RETURNING {ACCOUNT_COLUMNS}
            "#
        ))
        .bind(email)
        .bind(&profile.name)
        .bind(&profile.gender)
        .bind(&profile.country)
        .fetch_optional(&self.db)
        .await?;
        Ok(updated)
    }

    async fn update_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, StoreError> {
        let updated = sqlx::query_as::<_, Account>(&format!(
            "UPDATE accounts SET password_hash = $2 WHERE email = $1 RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(email)
        .bind(password_hash)
        .fetch_optional(&self.db)
        .await?;
        Ok(updated)
    }
}

/// In-process store with the same contract as [`PgAccountStore`].
#[derive(Default)]
pub struct MemoryAccountStore {
    accounts: RwLock<HashMap<String, Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.accounts.read().await.is_empty()
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self.accounts.read().await.get(email).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut accounts = self.accounts.write().await;
        if accounts.contains_key(&account.email) {
            return Err(StoreError::Duplicate);
        }
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name,
            phone: account.phone,
            email: account.email,
            password_hash: account.password_hash,
            gender: String::new(),
            country: String::new(),
            created_at: OffsetDateTime::now_utc(),
        };
        accounts.insert(created.email.clone(), created.clone());
        Ok(created)
    }

    async fn update_profile(
        &self,
        email: &str,
        profile: &ProfileUpdate,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.get_mut(email).map(|account| {
            account.name = profile.name.clone();
            account.gender = profile.gender.clone();
            account.country = profile.country.clone();
            account.clone()
        }))
    }

    async fn update_password(
        &self,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<Account>, StoreError> {
        let mut accounts = self.accounts.write().await;
        Ok(accounts.get_mut(email).map(|account| {
            account.password_hash = password_hash.to_string();
            account.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            name: "Ann".into(),
            phone: "1234567890".into(),
            email: email.into(),
            password_hash: "$argon2id$stub".into(),
        }
    }

    #[tokio::test]
    async fn create_then_find() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("a@x.com")).await.unwrap();
        assert_eq!(created.gender, "");
        assert_eq!(created.country, "");

        let found = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(store.find_by_email("b@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_duplicate_email() {
        let store = MemoryAccountStore::new();
        store.create(new_account("a@x.com")).await.unwrap();
        let err = store.create(new_account("a@x.com")).await.unwrap_err();
        assert!(matches!(err, StoreError::Duplicate));
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn profile_update_replaces_fields() {
        let store = MemoryAccountStore::new();
        let created = store.create(new_account("a@x.com")).await.unwrap();
        let profile = ProfileUpdate {
            name: "Annie".into(),
            gender: "female".into(),
            country: "IN".into(),
        };
        let updated = store.update_profile("a@x.com", &profile).await.unwrap().unwrap();
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.name, "Annie");
        assert_eq!(updated.gender, "female");
        assert_eq!(updated.country, "IN");
        assert_eq!(updated.phone, "1234567890");

        let missing = store.update_profile("nobody@x.com", &profile).await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn password_update_overwrites_hash() {
        let store = MemoryAccountStore::new();
        store.create(new_account("a@x.com")).await.unwrap();
        let updated = store.update_password("a@x.com", "new-hash").await.unwrap().unwrap();
        assert_eq!(updated.password_hash, "new-hash");
        assert!(store.update_password("b@x.com", "h").await.unwrap().is_none());
    }

    #[test]
    fn account_json_hides_password_hash() {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Ann".into(),
            phone: "1234567890".into(),
            email: "a@x.com".into(),
            password_hash: "secret-hash".into(),
            gender: String::new(),
            country: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
        };
        let json = serde_json::to_string(&account).unwrap();
        assert!(json.contains("a@x.com"));
        assert!(!json.contains("secret-hash"));
        assert!(!json.contains("password_hash"));
        assert!(json.contains("1970-01-01T00:00:00Z"));
    }
}
