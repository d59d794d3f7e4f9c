/// Registration, login, and logout flows
///
/// Per-client states move `Anonymous → Authenticated (cookie) →
/// Authenticated (session) → Anonymous`:
///
/// - `POST /register` creates the account, issues an identity token, sets
///   the `jwt` cookie, and redirects to `/login`. A duplicate email
///   redirects to `/error`.
/// - `POST /login` verifies the password against the stored hash; on a
///   match it issues a fresh token, sets the `jwt` cookie, creates a
///   server session behind the signed `sid` cookie, and redirects to
///   `/home`. On a mismatch it redirects to `/error`.
/// - `GET /logout` (token-gated) removes the presented token from the
///   account's collection, destroys the server session, clears both
///   cookies, and redirects to `/login`.
///
/// The duplicate-email check and the insert are two separate statements:
/// concurrent registrations of the same address can both pass the check.

use crate::{
    app::AppState,
    error::{ApiError, ApiResult, FieldError},
};
use axum::{extract::State, response::Response, Extension, Form};
use axum_extra::extract::cookie::{Cookie, CookieJar, SignedCookieJar};
use gatehouse_shared::{
    auth::{
        middleware::{redirect_found, TokenContext, SESSION_COOKIE, TOKEN_COOKIE},
        password,
        token::TokenIssuer,
    },
    models::{
        account::{Account, NewAccount},
        session::{Session, SESSION_TTL_DAYS},
    },
};
use serde::Deserialize;
use validator::Validate;

/// Lifetime of the identity cookie
///
/// Deliberately short; the token inside carries its own, much longer
/// expiry, and the server-side session outlives the cookie as well.
pub const IDENTITY_COOKIE_TTL: time::Duration = time::Duration::minutes(2);

/// Registration form
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterForm {
    /// Display name
    #[validate(length(min = 1, max = 255, message = "Name is required"))]
    pub name: String,

    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password (any non-empty value is accepted)
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Login form
#[derive(Debug, Deserialize, Validate)]
pub struct LoginForm {
    /// Email address
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    /// Password
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Register a new account
///
/// ```text
/// POST /register
/// Content-Type: application/x-www-form-urlencoded
///
/// name=A&email=a%40x.com&password=p1
/// ```
///
/// On success: `302` to `/login`, with the `jwt` cookie set. On a
/// duplicate email or any failure: `302` to `/error`.
pub async fn register(
    State(state): State<AppState>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> ApiResult<(CookieJar, Response)> {
    form.validate().map_err(validation_errors)?;

    // Lookup and insert are separate statements, not an atomic upsert.
    if Account::find_by_email(&state.db, &form.email).await?.is_some() {
        return Err(ApiError::DuplicateEmail(form.email));
    }

    let account = Account::create(
        &state.db,
        NewAccount {
            name: form.name,
            email: form.email,
            password: form.password,
        },
    )
    .await?;

    let token = TokenIssuer::new(&state.db, state.jwt_secret())
        .issue(account.id)
        .await?;

    tracing::info!(account_id = %account.id, "account registered");

    Ok((jar.add(identity_cookie(token)), redirect_found("/login")))
}

/// Authenticate and open a session
///
/// ```text
/// POST /login
/// Content-Type: application/x-www-form-urlencoded
///
/// email=a%40x.com&password=p1
/// ```
///
/// On success: `302` to `/home` with the `jwt` cookie and the signed
/// `sid` cookie set, the token appended to the account's collection, and
/// the last-login timestamp stamped. On unknown email or wrong password:
/// `302` to `/error` with no cookies set.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    signed: SignedCookieJar,
    Form(form): Form<LoginForm>,
) -> ApiResult<(CookieJar, SignedCookieJar, Response)> {
    form.validate().map_err(validation_errors)?;

    let account = Account::find_by_email(&state.db, &form.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    // Always through the hash; the stored value is never a plaintext.
    let matches = password::verify_password(&form.password, &account.password_hash)?;
    if !matches {
        return Err(ApiError::InvalidCredentials);
    }

    let token = TokenIssuer::new(&state.db, state.jwt_secret())
        .issue(account.id)
        .await?;

    let session = Session::create(&state.db, account.id).await?;
    Account::update_last_login(&state.db, account.id).await?;

    tracing::info!(account_id = %account.id, "login succeeded");

    Ok((
        jar.add(identity_cookie(token)),
        signed.add(session_cookie(session.id)),
        redirect_found("/home"),
    ))
}

/// Close the current session
///
/// Requires a valid identity cookie (the token gate runs first). Removes
/// exactly the presented token from the account's collection, destroys
/// the server-side session, clears both cookies, and redirects to
/// `/login`. A storage failure surfaces to the caller without retry.
pub async fn logout(
    State(state): State<AppState>,
    Extension(ctx): Extension<TokenContext>,
    jar: CookieJar,
    signed: SignedCookieJar,
) -> ApiResult<(CookieJar, SignedCookieJar, Response)> {
    if let Some(account) = Account::find_by_id(&state.db, ctx.claims.sub).await? {
        let removed = Account::remove_token(&state.db, account.id, &ctx.token).await?;
        if !removed {
            tracing::debug!(account_id = %account.id, "presented token was not in the collection");
        }
    }

    if let Some(cookie) = signed.get(SESSION_COOKIE) {
        Session::destroy(&state.db, cookie.value()).await?;
    }

    tracing::info!(account_id = %ctx.claims.sub, "logged out");

    Ok((
        jar.remove(removal_cookie(TOKEN_COOKIE)),
        signed.remove(removal_cookie(SESSION_COOKIE)),
        redirect_found("/login"),
    ))
}

/// Builds the short-lived HttpOnly identity cookie.
fn identity_cookie(token: String) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token))
        .path("/")
        .http_only(true)
        .max_age(IDENTITY_COOKIE_TTL)
        .build()
}

/// Builds the session-reference cookie, living as long as the session.
fn session_cookie(session_id: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, session_id))
        .path("/")
        .http_only(true)
        .max_age(time::Duration::days(SESSION_TTL_DAYS))
        .build()
}

/// Builds a cookie that clears its namesake (same name and path).
fn removal_cookie(name: &'static str) -> Cookie<'static> {
    Cookie::build((name, "")).path("/").build()
}

/// Flattens validator output into the typed error.
fn validation_errors(errors: validator::ValidationErrors) -> ApiError {
    let details: Vec<FieldError> = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |error| FieldError {
                field: field.to_string(),
                message: error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Validation failed".to_string()),
            })
        })
        .collect();

    ApiError::Validation(details)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_cookie_shape() {
        let cookie = identity_cookie("some-token".to_string());
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.value(), "some-token");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(2)));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_session_cookie_lives_as_long_as_the_session() {
        let cookie = session_cookie("abc".to_string());
        assert_eq!(cookie.name(), SESSION_COOKIE);
        assert_eq!(cookie.max_age(), Some(time::Duration::days(SESSION_TTL_DAYS)));
    }

    #[test]
    fn test_register_form_accepts_short_passwords() {
        let form = RegisterForm {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            password: "p1".to_string(),
        };
        assert!(form.validate().is_ok());
    }

    #[test]
    fn test_register_form_rejects_bad_email() {
        let form = RegisterForm {
            name: "A".to_string(),
            email: "not-an-email".to_string(),
            password: "p1".to_string(),
        };

        let err = form.validate().expect_err("should fail validation");
        let mapped = validation_errors(err);
        assert!(matches!(mapped, ApiError::Validation(ref details) if details
            .iter()
            .any(|d| d.field == "email")));
    }
}
