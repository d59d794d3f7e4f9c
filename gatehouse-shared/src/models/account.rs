/// Account model and database operations
///
/// An account is created at registration and mutated on login (token
/// appended, last-login stamped) and logout (token removed). Accounts are
/// never deleted by this service.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     name VARCHAR(255) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_login_at TIMESTAMPTZ
/// );
///
/// CREATE TABLE account_tokens (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     token TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `email` carries only a lookup index, not a uniqueness constraint:
/// duplicate rejection is the registration flow's find-before-insert, and
/// the two statements are not atomic.
///
/// # Example
///
/// ```no_run
/// use gatehouse_shared::models::account::{Account, NewAccount};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) -> Result<(), Box<dyn std::error::Error>> {
/// if Account::find_by_email(&pool, "a@x.com").await?.is_none() {
///     let account = Account::create(
///         &pool,
///         NewAccount {
///             name: "A".to_string(),
///             email: "a@x.com".to_string(),
///             password: "p1".to_string(),
///         },
///     )
///     .await?;
///     println!("created {}", account.id);
/// }
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::auth::password::{self, PasswordError};

/// Error type for account creation
///
/// Creation is the one operation that touches both the hasher and the
/// store; every other operation surfaces `sqlx::Error` directly.
#[derive(Debug, thiserror::Error)]
pub enum AccountError {
    /// Hashing the plaintext password failed
    #[error(transparent)]
    Password(#[from] PasswordError),

    /// The insert failed
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Account record
///
/// The password is stored only as an Argon2id hash. [`Account::create`] is
/// the single path that accepts a plaintext password, so a stored hash is
/// never re-hashed.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Account {
    /// Unique account ID, assigned at creation
    pub id: Uuid,

    /// Display name
    pub name: String,

    /// Lookup key; uniqueness is enforced by the registration flow only
    pub email: String,

    /// Argon2id PHC string, never the plaintext
    pub password_hash: String,

    /// When the account was created
    pub created_at: DateTime<Utc>,

    /// When the account was last updated
    pub updated_at: DateTime<Utc>,

    /// When the account last logged in (None if never)
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Input for creating an account
///
/// Carries the plaintext password; hashing happens inside
/// [`Account::create`], immediately before persistence.
#[derive(Debug, Clone, Deserialize)]
pub struct NewAccount {
    /// Display name
    pub name: String,

    /// Email address
    pub email: String,

    /// Plaintext password (hashed before insert, never persisted)
    pub password: String,
}

impl Account {
    /// Creates an account, hashing the password before the insert.
    ///
    /// Callers are expected to have checked [`Account::find_by_email`]
    /// first; this method does not reject duplicates itself.
    ///
    /// # Errors
    ///
    /// Returns [`AccountError::Password`] if hashing fails and
    /// [`AccountError::Database`] if the insert fails.
    pub async fn create(pool: &PgPool, data: NewAccount) -> Result<Self, AccountError> {
        let password_hash = password::hash_password(&data.password)?;

        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO accounts (name, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, name, email, password_hash, created_at, updated_at, last_login_at
            "#,
        )
        .bind(data.name)
        .bind(data.email)
        .bind(password_hash)
        .fetch_one(pool)
        .await?;

        Ok(account)
    }

    /// Finds an account by email address.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at, last_login_at
            FROM accounts
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Finds an account by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, name, email, password_hash, created_at, updated_at, last_login_at
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(account)
    }

    /// Stamps the last-login timestamp after successful authentication.
    ///
    /// Returns true if the account was found and updated.
    pub async fn update_last_login(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET last_login_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Appends a token to the account's collection.
    ///
    /// Called by the token issuer before the token is handed out; a token
    /// the client holds is always listed at the moment of issue.
    pub async fn push_token(pool: &PgPool, id: Uuid, token: &str) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO account_tokens (account_id, token)
            VALUES ($1, $2)
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// Removes a token from the account's collection on logout.
    ///
    /// Returns true if the token was present and removed.
    pub async fn remove_token(pool: &PgPool, id: Uuid, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            DELETE FROM account_tokens
            WHERE account_id = $1 AND token = $2
            "#,
        )
        .bind(id)
        .bind(token)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Lists the account's active tokens in issue order.
    pub async fn tokens(pool: &PgPool, id: Uuid) -> Result<Vec<String>, sqlx::Error> {
        let rows: Vec<(String,)> = sqlx::query_as(
            r#"
            SELECT token
            FROM account_tokens
            WHERE account_id = $1
            ORDER BY created_at
            "#,
        )
        .bind(id)
        .fetch_all(pool)
        .await?;

        Ok(rows.into_iter().map(|(token,)| token).collect())
    }
}
