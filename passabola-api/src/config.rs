/// Configuration management for the API server
///
/// This module loads configuration from environment variables and provides
/// a type-safe configuration struct. A `.env` file is read first when present.
///
/// # Environment Variables
///
/// - `API_HOST`: Host to bind to (default: 0.0.0.0)
/// - `API_PORT`: Port to bind to (default: 8080)
/// - `SITE_URL`: Public site URL, used in account confirmation emails
///   (default: http://localhost:8080)
/// - `BACKEND`: `hosted` or `memory` (default: hosted)
/// - `SUPABASE_URL`: Hosted project URL (required for `hosted`)
/// - `SUPABASE_ANON_KEY`: Hosted project public key (required for `hosted`)
/// - `JWT_SECRET`: Token secret, at least 32 bytes. Required for `memory`;
///   optional for `hosted`, where it enables local token verification
/// - `DATABASE_URL`: Optional; read and write site tables directly in Postgres
/// - `CORS_ORIGINS`: Comma-separated allowed origins, or `*` (default: *)
/// - `PRODUCTION`: `true` enables HSTS (default: false)
/// - `RUST_LOG`: Log level (default: passabola_api=debug,tower_http=debug)
///
/// # Example
///
/// ```no_run
/// use passabola_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use serde::{Deserialize, Serialize};
use std::{env, str::FromStr};

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// API server configuration
    pub api: ApiConfig,

    /// Public site configuration
    pub site: SiteConfig,

    /// Backend configuration
    pub backend: BackendConfig,
}

/// API server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Host to bind to
    pub host: String,

    /// Port to bind to
    pub port: u16,

    /// Allowed CORS origins; `*` allows any
    pub cors_origins: Vec<String>,

    /// Production mode (enables HSTS)
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    /// Where account confirmation emails send new players
    pub url: String,
}

/// Which backend serves identities and tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Hosted auth and table APIs
    Hosted,

    /// In-process backend for development
    Memory,
}

impl FromStr for BackendKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hosted" => Ok(BackendKind::Hosted),
            "memory" => Ok(BackendKind::Memory),
            other => anyhow::bail!("BACKEND must be 'hosted' or 'memory', got '{}'", other),
        }
    }
}

/// Backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Hosted project URL
    pub supabase_url: Option<String>,

    /// Hosted project public key
    pub anon_key: Option<String>,

    /// Secret for access tokens
    ///
    /// IMPORTANT: This must be kept secret and should be at least 32 bytes.
    pub jwt_secret: Option<String>,

    /// Direct Postgres connection for the site tables
    pub database_url: Option<String>,
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Required environment variables are missing
    /// - Environment variables have invalid values
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration from an arbitrary variable source
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| get(key).filter(|v| !v.trim().is_empty());

        let api_host = var("API_HOST").unwrap_or_else(|| "0.0.0.0".to_string());
        let api_port = var("API_PORT")
            .unwrap_or_else(|| "8080".to_string())
            .parse::<u16>()?;

        let cors_origins = var("CORS_ORIGINS")
            .unwrap_or_else(|| "*".to_string())
            .split(',')
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty())
            .collect();

        let production = var("PRODUCTION")
            .map(|v| v.parse::<bool>())
            .transpose()?
            .unwrap_or(false);

        let site_url = var("SITE_URL").unwrap_or_else(|| "http://localhost:8080".to_string());

        let kind = var("BACKEND")
            .map(|v| v.parse::<BackendKind>())
            .transpose()?
            .unwrap_or(BackendKind::Hosted);

        let jwt_secret = var("JWT_SECRET");
        if let Some(secret) = &jwt_secret {
            if secret.len() < 32 {
                anyhow::bail!("JWT_SECRET must be at least 32 characters long");
            }
        }

        let supabase_url = var("SUPABASE_URL");
        let anon_key = var("SUPABASE_ANON_KEY");

        match kind {
            BackendKind::Hosted => {
                if supabase_url.is_none() {
                    anyhow::bail!("SUPABASE_URL environment variable is required");
                }
                if anon_key.is_none() {
                    anyhow::bail!("SUPABASE_ANON_KEY environment variable is required");
                }
            }
            BackendKind::Memory => {
                if jwt_secret.is_none() {
                    anyhow::bail!("JWT_SECRET environment variable is required for BACKEND=memory");
                }
            }
        }

        Ok(Self {
            api: ApiConfig {
                host: api_host,
                port: api_port,
                cors_origins,
                production,
            },
            site: SiteConfig { url: site_url },
            backend: BackendConfig {
                kind,
                supabase_url,
                anon_key,
                jwt_secret,
                database_url: var("DATABASE_URL"),
            },
        })
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }
}
