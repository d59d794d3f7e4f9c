/// Integration tests for the Gatehouse HTTP server
///
/// Verifies the register / login / logout lifecycle end to end against a
/// real database:
/// - duplicate registration is rejected and leaves a single account
/// - login issues cookies and grows the token collection
/// - a wrong password sets nothing
/// - logout clears cookies, revokes the token, and destroys the session
/// - the stored password is a hash, never the plaintext
///
/// Requires `DATABASE_URL`; every test skips itself when it is unset.

mod common;

use axum::http::{header, StatusCode};
use common::TestContext;
use gatehouse_shared::models::account::Account;

#[tokio::test]
async fn test_register_sets_identity_cookie_and_redirects_to_login() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("register");

    let response = ctx.register("A", &email, "p1").await;
    common::assert_redirect(&response, "/login");

    let cookie = common::raw_set_cookie(&response, "jwt").expect("jwt cookie should be set");
    assert!(cookie.contains("HttpOnly"), "cookie should be HttpOnly: {cookie}");
    assert!(cookie.contains("Max-Age=120"), "cookie should expire in 2 minutes: {cookie}");

    // The token was recorded against the account before the response.
    let account = Account::find_by_email(&ctx.db, &email)
        .await
        .expect("lookup should succeed")
        .expect("account should exist");
    let tokens = Account::tokens(&ctx.db, account.id)
        .await
        .expect("token list should load");
    let issued = common::set_cookie_value(&response, "jwt").expect("jwt cookie value");
    assert_eq!(tokens, vec![issued]);

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_duplicate_registration_is_rejected() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("duplicate");

    let response = ctx.register("A", &email, "p1").await;
    common::assert_redirect(&response, "/login");

    let response = ctx.register("A", &email, "p1").await;
    common::assert_redirect(&response, "/error");

    assert_eq!(ctx.account_count(&email).await, 1);

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_password_is_stored_hashed() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("hashed");

    ctx.register("A", &email, "plaintext-password").await;

    let account = Account::find_by_email(&ctx.db, &email)
        .await
        .expect("lookup should succeed")
        .expect("account should exist");
    assert_ne!(account.password_hash, "plaintext-password");
    assert!(account.password_hash.starts_with("$argon2id$"));

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_login_issues_cookies_and_grows_token_collection() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("login");

    ctx.register("A", &email, "p1").await;

    let response = ctx.login(&email, "p1").await;
    common::assert_redirect(&response, "/home");

    let jwt = common::raw_set_cookie(&response, "jwt").expect("jwt cookie should be set");
    assert!(jwt.contains("Max-Age=120"));
    assert!(common::raw_set_cookie(&response, "sid").is_some(), "sid cookie should be set");

    let account = Account::find_by_email(&ctx.db, &email)
        .await
        .expect("lookup should succeed")
        .expect("account should exist");
    assert!(account.last_login_at.is_some());

    // One token from registration, one from login.
    let tokens = Account::tokens(&ctx.db, account.id)
        .await
        .expect("token list should load");
    assert_eq!(tokens.len(), 2);

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_login_with_wrong_password_sets_nothing() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("wrong-password");

    ctx.register("A", &email, "p1").await;

    let response = ctx.login(&email, "not-p1").await;
    common::assert_redirect(&response, "/error");
    assert!(response.headers().get(header::SET_COOKIE).is_none());

    let account = Account::find_by_email(&ctx.db, &email)
        .await
        .expect("lookup should succeed")
        .expect("account should exist");
    let tokens = Account::tokens(&ctx.db, account.id)
        .await
        .expect("token list should load");
    assert_eq!(tokens.len(), 1, "only the registration token should exist");

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_login_with_unknown_email_redirects_to_error() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };

    let response = ctx.login("nobody@example.com", "p1").await;
    common::assert_redirect(&response, "/error");
}

#[tokio::test]
async fn test_logout_revokes_token_and_destroys_session() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("logout");

    ctx.register("A", &email, "p1").await;
    let login = ctx.login(&email, "p1").await;

    let jwt = common::set_cookie_value(&login, "jwt").expect("jwt cookie value");
    let sid = common::set_cookie_value(&login, "sid").expect("sid cookie value");

    let cookies = format!("jwt={jwt}; sid={sid}");
    let response = ctx.get("/logout", Some(&cookies)).await;
    common::assert_redirect(&response, "/login");

    // Both cookies are cleared on the way out.
    let cleared_jwt = common::raw_set_cookie(&response, "jwt").expect("jwt should be cleared");
    assert!(cleared_jwt.contains("Max-Age=0"), "jwt should be expired: {cleared_jwt}");
    assert!(common::raw_set_cookie(&response, "sid").is_some(), "sid should be cleared");

    // The presented token is gone from the collection; the session row too.
    let account = Account::find_by_email(&ctx.db, &email)
        .await
        .expect("lookup should succeed")
        .expect("account should exist");
    let tokens = Account::tokens(&ctx.db, account.id)
        .await
        .expect("token list should load");
    assert!(!tokens.contains(&jwt), "logged-out token should be removed");

    let (sessions,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM sessions WHERE account_id = $1")
            .bind(account.id)
            .fetch_one(&ctx.db)
            .await
            .expect("count should succeed");
    assert_eq!(sessions, 0);

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_gated_routes_reject_anonymous_requests() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };

    // Token gate: 401 without a cookie.
    let response = ctx.get("/product", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx.get("/logout", None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Session gate: redirect to the login page.
    let response = ctx.get("/home", None).await;
    common::assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_session_cookie_admits_home() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };
    let email = TestContext::unique_email("home");

    ctx.register("A", &email, "p1").await;
    let login = ctx.login(&email, "p1").await;
    let sid = common::set_cookie_value(&login, "sid").expect("sid cookie value");

    let response = ctx.get("/home", Some(&format!("sid={sid}"))).await;
    assert_eq!(response.status(), StatusCode::OK);

    ctx.cleanup(&email).await.expect("cleanup should succeed");
}

#[tokio::test]
async fn test_public_pages_and_health() {
    let Some(ctx) = TestContext::new().await.expect("context should build") else {
        return;
    };

    for uri in ["/", "/login", "/success", "/error"] {
        let response = ctx.get(uri, None).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri} should be public");
    }

    let response = ctx.get("/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body should read");
    let health: serde_json::Value = serde_json::from_slice(&body).expect("health should be JSON");
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["database"], "connected");
}
