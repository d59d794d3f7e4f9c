/// Identity token generation and verification
///
/// Tokens are HS256-signed claim sets binding an account identifier, issued
/// at login and registration and carried back to the server in the `jwt`
/// cookie. Verification is stateless: signature and embedded expiry only.
///
/// Every issued token is also appended to the owning account's token
/// collection and persisted *before* it is handed to the caller, which is
/// what makes logout able to remove it again. Verification deliberately
/// does not consult that collection, so a replayed token that is still
/// signature-valid is accepted by token-gated routes until its claims
/// expire. That asymmetry is known and recorded in DESIGN.md rather than
/// fixed here.
///
/// # Example
///
/// ```
/// use gatehouse_shared::auth::token::{sign, verify, Claims};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let account_id = Uuid::new_v4();
/// let secret = "a-secret-key-at-least-32-bytes-long!";
///
/// let token = sign(&Claims::new(account_id), secret)?;
/// let claims = verify(&token, secret)?;
/// assert_eq!(claims.sub, account_id);
/// # Ok(())
/// # }
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::account::Account;

/// Issuer claim stamped into every token
pub const ISSUER: &str = "gatehouse";

/// Validity window embedded in issued tokens, matching the session TTL
pub const TOKEN_TTL_DAYS: i64 = 14;

/// Error type for token operations
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Failed to sign the claim set
    #[error("failed to sign token: {0}")]
    Sign(String),

    /// Token's embedded expiry has elapsed
    #[error("token has expired")]
    Expired,

    /// Signature, issuer, or format check failed
    #[error("invalid token: {0}")]
    Invalid(String),

    /// Recording the issued token in the account's collection failed
    #[error("failed to record issued token: {0}")]
    Store(#[from] sqlx::Error),
}

/// Claim set bound into an identity token
///
/// - `sub`: account identifier
/// - `iss`: always [`ISSUER`]
/// - `iat` / `exp`: issue and expiry as Unix timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - account ID
    pub sub: Uuid,

    /// Issuer
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Creates claims for an account with the default validity window.
    pub fn new(account_id: Uuid) -> Self {
        Self::with_expiry(account_id, Duration::days(TOKEN_TTL_DAYS))
    }

    /// Creates claims with a custom validity window.
    pub fn with_expiry(account_id: Uuid, expires_in: Duration) -> Self {
        let now = Utc::now();

        Self {
            sub: account_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
        }
    }

    /// Whether the embedded expiry has elapsed.
    pub fn is_expired(&self) -> bool {
        Utc::now().timestamp() >= self.exp
    }
}

/// Signs a claim set with the shared secret.
///
/// # Errors
///
/// Returns [`TokenError::Sign`] if encoding fails.
pub fn sign(claims: &Claims, secret: &str) -> Result<String, TokenError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key).map_err(|e| TokenError::Sign(e.to_string()))
}

/// Verifies a token and extracts its claims.
///
/// Checks the signature, the issuer, and the embedded expiry. Does **not**
/// check that the token is still present in any account's token
/// collection; logout removes tokens from the store but cannot reach a
/// copy the client kept.
///
/// # Errors
///
/// Returns [`TokenError::Expired`] for an elapsed token and
/// [`TokenError::Invalid`] for every other verification failure.
pub fn verify(token: &str, secret: &str) -> Result<Claims, TokenError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Invalid(e.to_string()),
    })?;

    Ok(data.claims)
}

/// Issues identity tokens and records them against the owning account.
///
/// The token is appended to the account's collection and the row is
/// persisted before the token string is returned, so a token the client
/// holds is always listed in the store at the moment of issue.
pub struct TokenIssuer<'a> {
    pool: &'a PgPool,
    secret: &'a str,
}

impl<'a> TokenIssuer<'a> {
    /// Creates an issuer bound to a store handle and signing secret.
    pub fn new(pool: &'a PgPool, secret: &'a str) -> Self {
        Self { pool, secret }
    }

    /// Signs a token for the account, records it, and returns it.
    ///
    /// # Errors
    ///
    /// Returns [`TokenError::Sign`] if signing fails and
    /// [`TokenError::Store`] if persisting the token fails; in the latter
    /// case the token is not returned to the caller.
    pub async fn issue(&self, account_id: Uuid) -> Result<String, TokenError> {
        let token = sign(&Claims::new(account_id), self.secret)?;

        Account::push_token(self.pool, account_id, &token).await?;

        Ok(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_claims_defaults() {
        let account_id = Uuid::new_v4();
        let claims = Claims::new(account_id);

        assert_eq!(claims.sub, account_id);
        assert_eq!(claims.iss, ISSUER);
        assert!(!claims.is_expired());
        assert_eq!(claims.exp - claims.iat, TOKEN_TTL_DAYS * 24 * 60 * 60);
    }

    #[test]
    fn test_sign_and_verify_roundtrip() {
        let account_id = Uuid::new_v4();
        let token = sign(&Claims::new(account_id), SECRET).expect("should sign");

        let claims = verify(&token, SECRET).expect("should verify");
        assert_eq!(claims.sub, account_id);
        assert_eq!(claims.iss, ISSUER);
    }

    #[test]
    fn test_verify_rejects_wrong_secret() {
        let token = sign(&Claims::new(Uuid::new_v4()), SECRET).expect("should sign");

        let result = verify(&token, "a-completely-different-secret-value!!");
        assert!(matches!(result, Err(TokenError::Invalid(_))));
    }

    #[test]
    fn test_verify_rejects_expired_token() {
        let claims = Claims::with_expiry(Uuid::new_v4(), Duration::seconds(-3600));
        assert!(claims.is_expired());

        let token = sign(&claims, SECRET).expect("should sign");
        let result = verify(&token, SECRET);
        assert!(matches!(result, Err(TokenError::Expired)));
    }

    #[test]
    fn test_verify_rejects_garbage() {
        assert!(matches!(
            verify("not.a.token", SECRET),
            Err(TokenError::Invalid(_))
        ));
    }
}
