/// Configuration management for the server
///
/// Configuration comes from environment variables, with a `.env` file
/// loaded first in development.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string. When unset, one is
///   composed from `DATABASE_USERNAME`, `DATABASE_PASSWORD`,
///   `DATABASE_HOST`, and `DATABASE_NAME`.
/// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
/// - `JWT_SECRET`: token signing secret (required, at least 32 bytes)
/// - `SESSION_SECRET`: session-cookie signing secret (required, at least
///   32 bytes, kept distinct from the token secret)
/// - `HTTP_HOST`: bind host (default: 0.0.0.0)
/// - `HTTP_PORT`: bind port (default: 6006)
/// - `RUST_LOG`: log level filtering

use std::env;

/// Complete application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server configuration
    pub http: HttpConfig,

    /// Database configuration
    pub database: DatabaseSettings,

    /// Secrets for tokens and session cookies
    pub auth: AuthConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseSettings {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,
}

/// Secret material
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// Identity-token signing secret
    ///
    /// Generate with: `openssl rand -hex 32`
    pub jwt_secret: String,

    /// Session-cookie signing secret
    pub session_secret: String,
}

impl Config {
    /// Loads configuration from the environment.
    ///
    /// # Errors
    ///
    /// Returns an error if a required variable is missing, a numeric
    /// variable fails to parse, or a secret is shorter than 32 bytes.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env if present (for development)
        dotenvy::dotenv().ok();

        let host = env::var("HTTP_HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("HTTP_PORT")
            .unwrap_or_else(|_| "6006".to_string())
            .parse::<u16>()?;

        let url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => Self::compose_database_url()?,
        };

        let max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = require_secret("JWT_SECRET")?;
        let session_secret = require_secret("SESSION_SECRET")?;

        Ok(Self {
            http: HttpConfig { host, port },
            database: DatabaseSettings {
                url,
                max_connections,
            },
            auth: AuthConfig {
                jwt_secret,
                session_secret,
            },
        })
    }

    /// Assembles a connection string from individual credentials.
    ///
    /// Some deployments provide the username and password as separate
    /// variables instead of a full `DATABASE_URL`.
    fn compose_database_url() -> anyhow::Result<String> {
        let username = env::var("DATABASE_USERNAME")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL or DATABASE_USERNAME must be set"))?;
        let password = env::var("DATABASE_PASSWORD")
            .map_err(|_| anyhow::anyhow!("DATABASE_PASSWORD must be set"))?;
        let host = env::var("DATABASE_HOST").unwrap_or_else(|_| "localhost".to_string());
        let name = env::var("DATABASE_NAME").unwrap_or_else(|_| "registration".to_string());

        Ok(format!("postgres://{username}:{password}@{host}/{name}"))
    }

    /// Returns the server bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.http.host, self.http.port)
    }
}

fn require_secret(name: &str) -> anyhow::Result<String> {
    let value =
        env::var(name).map_err(|_| anyhow::anyhow!("{name} environment variable is required"))?;

    if value.len() < 32 {
        anyhow::bail!("{name} must be at least 32 characters long");
    }

    Ok(value)
}
