/// Server-side session model
///
/// A session is the second admission mechanism, distinct from the
/// identity token: a row in the same database as the accounts, referenced
/// by the signed `sid` cookie and carrying a fixed time-to-live. Login
/// creates one; logout destroys it; expiry is checked on every lookup.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE sessions (
///     id VARCHAR(64) PRIMARY KEY,
///     account_id UUID NOT NULL REFERENCES accounts(id) ON DELETE CASCADE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Fixed session time-to-live
pub const SESSION_TTL_DAYS: i64 = 14;

/// Length of generated session identifiers
const SESSION_ID_LEN: usize = 32;

/// Session record
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Session {
    /// Random identifier carried in the `sid` cookie
    pub id: String,

    /// Account the session belongs to
    pub account_id: Uuid,

    /// When the session was created
    pub created_at: DateTime<Utc>,

    /// When the session stops being honored
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Generates a random session identifier.
    ///
    /// 32 alphanumeric characters from the OS-seeded thread RNG.
    pub fn generate_id() -> String {
        use rand::Rng;
        const CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
        let mut rng = rand::thread_rng();

        (0..SESSION_ID_LEN)
            .map(|_| {
                let idx = rng.gen_range(0..CHARSET.len());
                CHARSET[idx] as char
            })
            .collect()
    }

    /// Creates a session for an account with the fixed TTL.
    pub async fn create(pool: &PgPool, account_id: Uuid) -> Result<Self, sqlx::Error> {
        let id = Self::generate_id();
        let expires_at = Utc::now() + Duration::days(SESSION_TTL_DAYS);

        let session = sqlx::query_as::<_, Session>(
            r#"
            INSERT INTO sessions (id, account_id, expires_at)
            VALUES ($1, $2, $3)
            RETURNING id, account_id, created_at, expires_at
            "#,
        )
        .bind(id)
        .bind(account_id)
        .bind(expires_at)
        .fetch_one(pool)
        .await?;

        Ok(session)
    }

    /// Loads a session if it exists and has not expired.
    ///
    /// Expired rows are treated as absent; [`Session::purge_expired`]
    /// clears them out of the table.
    pub async fn find_valid(pool: &PgPool, id: &str) -> Result<Option<Self>, sqlx::Error> {
        let session = sqlx::query_as::<_, Session>(
            r#"
            SELECT id, account_id, created_at, expires_at
            FROM sessions
            WHERE id = $1 AND expires_at > NOW()
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await?;

        Ok(session)
    }

    /// Destroys a session on logout.
    ///
    /// Returns true if a row was removed.
    pub async fn destroy(pool: &PgPool, id: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes expired rows, returning how many were removed.
    ///
    /// Run at process start; lookups never honor expired rows either way.
    pub async fn purge_expired(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM sessions WHERE expires_at <= NOW()")
            .execute(pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_shape() {
        let id = Session::generate_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_generate_id_is_random() {
        let ids: HashSet<String> = (0..64).map(|_| Session::generate_id()).collect();
        assert_eq!(ids.len(), 64);
    }
}
