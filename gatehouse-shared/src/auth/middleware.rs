/// Admission gates for Axum routes
///
/// Two independent gates coexist and protect different routes:
///
/// - **Token gate** ([`require_token`]): extracts the identity token from
///   the `jwt` cookie and verifies its signature. Failure is a
///   `401 Unauthorized`; success attaches a [`TokenContext`] (decoded
///   claims plus the raw token string) to the request extensions.
/// - **Session gate** ([`require_session`]): extracts the signed `sid`
///   cookie and loads the matching non-expired session row. Absence
///   redirects to `/login`; success attaches the [`Session`] to the
///   request extensions.
///
/// The gates are not unified: a route is protected by one, the other, or
/// neither.
///
/// # Example
///
/// ```no_run
/// use axum::{extract::Request, middleware::{from_fn, Next}, routing::get, Extension, Router};
/// use gatehouse_shared::auth::middleware::{require_token, TokenContext};
///
/// async fn product(Extension(ctx): Extension<TokenContext>) -> String {
///     format!("hello, {}", ctx.claims.sub)
/// }
///
/// let app: Router = Router::new()
///     .route("/product", get(product))
///     .layer(from_fn(|req: Request, next: Next| async move {
///         require_token("the-signing-secret", req, next).await
///     }));
/// ```

use axum::{
    extract::Request,
    http::{header, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::cookie::{CookieJar, Key, SignedCookieJar};
use sqlx::PgPool;

use super::token::{self, Claims};
use crate::models::session::Session;

/// Cookie carrying the signed identity token
pub const TOKEN_COOKIE: &str = "jwt";

/// Cookie referencing the server-side session row
pub const SESSION_COOKIE: &str = "sid";

/// Decoded identity attached to requests admitted by the token gate
///
/// Carries the raw token string alongside the claims so that logout can
/// remove exactly the presented token from the account's collection.
#[derive(Debug, Clone)]
pub struct TokenContext {
    /// Verified claims
    pub claims: Claims,

    /// The token exactly as presented in the cookie
    pub token: String,
}

/// Error type for the admission gates
#[derive(Debug)]
pub enum GateError {
    /// No identity cookie on the request
    MissingToken,

    /// Identity cookie present but failed verification
    InvalidToken(String),

    /// No valid server-side session for the request
    SessionRequired,

    /// Session lookup failed in the store
    Store(String),
}

impl IntoResponse for GateError {
    fn into_response(self) -> Response {
        match self {
            GateError::MissingToken => {
                (StatusCode::UNAUTHORIZED, "Unauthorized: missing token").into_response()
            }
            GateError::InvalidToken(reason) => {
                tracing::debug!(%reason, "rejected identity token");
                (StatusCode::UNAUTHORIZED, "Unauthorized: invalid token").into_response()
            }
            GateError::SessionRequired => redirect_found("/login"),
            GateError::Store(reason) => {
                tracing::error!(%reason, "session lookup failed");
                redirect_found("/error")
            }
        }
    }
}

/// Builds a `302 Found` redirect response.
///
/// Redirect-as-control-flow is the service's only way of steering the
/// browser, and it uses the classic 302 throughout.
pub fn redirect_found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Token gate: admits requests carrying a verifiable identity cookie.
///
/// On success the [`TokenContext`] is inserted into request extensions.
/// Verification is stateless (signature and embedded expiry); the
/// account's stored token collection is not consulted.
///
/// # Errors
///
/// `401 Unauthorized` when the cookie is missing or fails verification.
pub async fn require_token(
    secret: &str,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let jar = CookieJar::from_headers(req.headers());

    let token = jar
        .get(TOKEN_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(GateError::MissingToken)?;

    let claims =
        token::verify(&token, secret).map_err(|e| GateError::InvalidToken(e.to_string()))?;

    req.extensions_mut().insert(TokenContext { claims, token });

    Ok(next.run(req).await)
}

/// Session gate: admits requests referencing a live server-side session.
///
/// The `sid` cookie is signed, so a tampered value never reaches the
/// store. On success the [`Session`] is inserted into request extensions.
///
/// # Errors
///
/// Redirects to `/login` when the cookie is absent, unreadable, or points
/// at an expired or destroyed session; redirects to `/error` when the
/// lookup itself fails.
pub async fn require_session(
    pool: &PgPool,
    key: &Key,
    mut req: Request,
    next: Next,
) -> Result<Response, GateError> {
    let jar = SignedCookieJar::from_headers(req.headers(), key.clone());

    let session_id = jar
        .get(SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .ok_or(GateError::SessionRequired)?;

    let session = Session::find_valid(pool, &session_id)
        .await
        .map_err(|e| GateError::Store(e.to_string()))?
        .ok_or(GateError::SessionRequired)?;

    req.extensions_mut().insert(session);

    Ok(next.run(req).await)
}
