/// Application state and router builder
///
/// # Route map
///
/// ```text
/// /
/// ├── GET  /            # landing page with the registration form
/// ├── POST /register    # create an account
/// ├── GET  /login       # login page
/// ├── POST /login       # authenticate
/// ├── GET  /success     # static page
/// ├── GET  /error       # generic error page
/// ├── GET  /home        # session-gated
/// ├── GET  /product     # token-gated
/// ├── GET  /logout      # token-gated
/// └── GET  /health      # health check
/// ```
///
/// `/home` is admitted by the server-session gate (redirects to `/login`),
/// while `/product` and `/logout` are admitted by the cookie/token gate
/// (401 on failure). The two gates are deliberately separate mechanisms.
///
/// # Example
///
/// ```no_run
/// use gatehouse_api::{app::{build_router, AppState}, config::Config};
/// use sqlx::PgPool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = PgPool::connect(&config.database.url).await?;
/// let state = AppState::new(pool, config);
/// let app = build_router(state);
///
/// let listener = tokio::net::TcpListener::bind("0.0.0.0:6006").await?;
/// axum::serve(listener, app).await?;
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, routes};
use axum::{
    extract::{FromRef, Request, State},
    middleware::{from_fn_with_state, Next},
    response::Response,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::Key;
use gatehouse_shared::auth::middleware::{self, GateError};
use sqlx::PgPool;
use std::sync::Arc;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;

/// Shared application state
///
/// Cloned per request via Axum's `State` extractor; cloning is cheap.
/// Constructed once in `main` around the process lifetime; there is no
/// global connection state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: PgPool,

    /// Application configuration
    pub config: Arc<Config>,

    /// Key signing the session cookie, derived from the session secret
    session_key: Key,
}

impl AppState {
    /// Creates application state from a pool and configuration.
    pub fn new(db: PgPool, config: Config) -> Self {
        let session_key = Key::derive_from(config.auth.session_secret.as_bytes());

        Self {
            db,
            config: Arc::new(config),
            session_key,
        }
    }

    /// Secret used to sign and verify identity tokens.
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }
}

/// Lets `SignedCookieJar` extract its key from the application state.
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.session_key.clone()
    }
}

/// Builds the complete router with routes, gates, and request logging.
pub fn build_router(state: AppState) -> Router {
    // Public routes: no gate
    let public = Router::new()
        .route("/", get(routes::pages::index))
        .route("/login", get(routes::pages::login).post(routes::auth::login))
        .route("/register", post(routes::auth::register))
        .route("/success", get(routes::pages::success))
        .route("/error", get(routes::pages::error));

    // Server-session gate: absence redirects to /login
    let session_gated = Router::new()
        .route("/home", get(routes::pages::home))
        .layer(from_fn_with_state(state.clone(), session_gate));

    // Cookie/token gate: failure is a 401
    let token_gated = Router::new()
        .route("/product", get(routes::pages::product))
        .route("/logout", get(routes::auth::logout))
        .layer(from_fn_with_state(state.clone(), token_gate));

    Router::new()
        .merge(public)
        .merge(session_gated)
        .merge(token_gated)
        .route("/health", get(routes::health::health_check))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .with_state(state)
}

/// Token gate bound to the application state.
async fn token_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GateError> {
    middleware::require_token(state.jwt_secret(), req, next).await
}

/// Session gate bound to the application state.
async fn session_gate(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, GateError> {
    middleware::require_session(&state.db, &state.session_key, req, next).await
}
