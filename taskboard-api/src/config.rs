/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct.
///
/// # Environment Variables
///
/// - `DATABASE_URL`: PostgreSQL connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size (default: 10)
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to, falling back to `PORT` (default: 3002)
/// - `CORS_ORIGINS`: Comma-separated allowed origins, `*` for any
///   (default: the local dashboard dev servers)
/// - `IDENTITY_JWT_SECRET`: Identity provider's signing secret (optional)
/// - `IDENTITY_AUDIENCE`: Expected token audience (default: authenticated)
/// - `RUN_MIGRATIONS`: Apply migrations on startup (default: true)
/// - `RUST_LOG`: Log filter
///
/// # Example
///
/// ```no_run
/// use taskboard_api::config::Config;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}:{}", config.api.host, config.api.port);
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::env;
use taskboard_shared::auth::jwt::{DEFAULT_AUDIENCE, MIN_SECRET_LEN};

const DEFAULT_PORT: u16 = 3002;
const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Database configuration
    pub database: DatabaseConfig,

    /// Identity token configuration
    pub identity: IdentityConfig,

    /// Apply pending migrations before serving
    pub run_migrations: bool,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Origins allowed by CORS; `*` allows any
    pub cors_origins: Vec<String>,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    /// Maximum number of connections in pool
    pub max_connections: u32,
}

/// Identity token configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    /// Identity provider's HS256 secret; `None` turns the identity layer off
    #[serde(skip_serializing)]
    pub jwt_secret: Option<String>,

    /// Expected `aud` claim
    pub audience: String,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// A `.env` file in the working directory is read first if present.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `DATABASE_URL` is missing
    /// - A numeric or boolean variable does not parse
    /// - `IDENTITY_JWT_SECRET` is set but shorter than 32 characters
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_vars(|key| env::var(key).ok())
    }

    /// Builds configuration from any variable source
    pub fn from_vars<F>(var: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = match var("API_PORT").or_else(|| var("PORT")) {
            Some(port) => port
                .parse::<u16>()
                .map_err(|e| anyhow::anyhow!("Invalid API_PORT '{}': {}", port, e))?,
            None => DEFAULT_PORT,
        };

        let cors_origins = parse_origins(
            &var("CORS_ORIGINS").unwrap_or_else(|| DEFAULT_CORS_ORIGINS.to_string()),
        );

        let database_url = var("DATABASE_URL")
            .ok_or_else(|| anyhow::anyhow!("DATABASE_URL environment variable is required"))?;

        let max_connections = var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|| "10".to_string())
            .parse::<u32>()?;

        let jwt_secret = var("IDENTITY_JWT_SECRET").filter(|s| !s.is_empty());
        if let Some(secret) = &jwt_secret {
            if secret.len() < MIN_SECRET_LEN {
                anyhow::bail!("IDENTITY_JWT_SECRET must be at least {} characters long", MIN_SECRET_LEN);
            }
        }

        let audience = var("IDENTITY_AUDIENCE").unwrap_or_else(|| DEFAULT_AUDIENCE.to_string());

        let run_migrations = var("RUN_MIGRATIONS")
            .map(|v| v.parse::<bool>())
            .transpose()
            .map_err(|e| anyhow::anyhow!("Invalid RUN_MIGRATIONS: {}", e))?
            .unwrap_or(true);

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
            },
            database: DatabaseConfig {
                url: database_url,
                max_connections,
            },
            identity: IdentityConfig {
                jwt_secret,
                audience,
            },
            run_migrations,
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_vars(vars(&[("DATABASE_URL", "postgresql://localhost/test")])).unwrap();

        assert_eq!(config.bind_address(), "0.0.0.0:3002");
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(
            config.api.cors_origins,
            vec!["http://localhost:5173", "http://localhost:3000"]
        );
        assert!(config.identity.jwt_secret.is_none());
        assert_eq!(config.identity.audience, "authenticated");
        assert!(config.run_migrations);
    }

    #[test]
    fn test_database_url_required() {
        assert!(Config::from_vars(vars(&[])).is_err());
    }

    #[test]
    fn test_port_fallback() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("PORT", "4000"),
        ]))
        .unwrap();
        assert_eq!(config.api.port, 4000);

        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("PORT", "4000"),
            ("API_PORT", "5000"),
        ]))
        .unwrap();
        assert_eq!(config.api.port, 5000);
    }

    #[test]
    fn test_short_identity_secret_rejected() {
        let result = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("IDENTITY_JWT_SECRET", "too-short"),
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn test_cors_origins_parsing() {
        let config = Config::from_vars(vars(&[
            ("DATABASE_URL", "postgresql://localhost/test"),
            ("CORS_ORIGINS", " https://board.example.com , ,*"),
            ("RUN_MIGRATIONS", "false"),
        ]))
        .unwrap();
        assert_eq!(config.api.cors_origins, vec!["https://board.example.com", "*"]);
        assert!(!config.run_migrations);
    }
}
