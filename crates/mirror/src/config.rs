//! Mirror configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `MIRROR_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//! - `SHOPIFY_STORE_DOMAIN` - Shopify store domain (e.g., your-store.myshopify.com)
//! - `SHOPIFY_ACCESS_TOKEN` - Admin API access token
//!
//! ## Optional
//! - `MIRROR_HOST` - Bind address (default: 127.0.0.1)
//! - `MIRROR_PORT` - Listen port (default: 3002)
//! - `SHOPIFY_API_VERSION` - API version (default: 2024-01)
//! - `SHOPIFY_WEBHOOK_SECRET` - Shared webhook secret. Without it every webhook is rejected.
//! - `MIRROR_WORKERS` - In-process job workers (default: 2, `0` disables)
//! - `MIRROR_POLL_INTERVAL_MS` - Idle worker poll interval (default: 1000)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT`, `SENTRY_SAMPLE_RATE`, `SENTRY_TRACES_SAMPLE_RATE`

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const DEFAULT_API_VERSION: &str = "2024-01";
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.0;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "xxx",
    "todo",
    "insert",
    "put-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Mirror application configuration.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// `PostgreSQL` database connection URL (contains password)
    pub database_url: SecretString,
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Shopify Admin API configuration
    pub shopify: ShopifyConfig,
    /// Shared secret for webhook HMAC verification
    pub webhook_secret: Option<SecretString>,
    /// Background worker settings
    pub workers: WorkerConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g., "development", "staging", "production")
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate (0.0 to 1.0)
    pub sentry_sample_rate: f32,
    /// Sentry traces sample rate for performance monitoring (0.0 to 1.0)
    pub sentry_traces_sample_rate: f32,
}

/// Shopify Admin REST API configuration.
///
/// Implements `Debug` manually to redact the access token.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store_domain: String,
    /// Shopify API version (e.g., 2024-01)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store_domain", &self.store_domain)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .finish()
    }
}

/// Background job worker configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerConfig {
    /// Number of concurrent workers (0 disables in-process workers)
    pub concurrency: usize,
    /// How long an idle worker sleeps before polling again
    pub poll_interval: Duration,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            concurrency: 2,
            poll_interval: Duration::from_millis(1000),
        }
    }
}

impl MirrorConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let database_url = database_url(&env)?;
        let host = env.parsed::<IpAddr>("MIRROR_HOST", "127.0.0.1")?;
        let port = env.parsed::<u16>("MIRROR_PORT", "3002")?;

        let shopify = ShopifyConfig::from_env(&env)?;
        let webhook_secret = env
            .optional("SHOPIFY_WEBHOOK_SECRET")
            .map(SecretString::from);

        let workers = WorkerConfig {
            concurrency: env.parsed::<usize>("MIRROR_WORKERS", "2")?,
            poll_interval: Duration::from_millis(
                env.parsed::<u64>("MIRROR_POLL_INTERVAL_MS", "1000")?,
            ),
        };

        Ok(Self {
            database_url,
            host,
            port,
            shopify,
            webhook_secret,
            workers,
            sentry_dsn: env.optional("SENTRY_DSN"),
            sentry_environment: env.optional("SENTRY_ENVIRONMENT"),
            sentry_sample_rate: env
                .optional("SENTRY_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
            sentry_traces_sample_rate: env
                .optional("SENTRY_TRACES_SAMPLE_RATE")
                .and_then(|s| s.parse().ok())
                .unwrap_or(1.0),
        })
    }

    /// Load only the database URL, for commands that never call Shopify.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if neither URL variable is set.
    pub fn database_url_from_env() -> Result<SecretString, ConfigError> {
        let _ = dotenvy::dotenv();

        database_url(&Env(|key: &str| std::env::var(key).ok()))
    }

    /// Problems that do not stop startup: weak-looking secrets and a
    /// missing webhook secret.
    #[must_use]
    pub fn warnings(&self) -> Vec<String> {
        let mut warnings = Vec::new();

        if let Err(e) = validate_secret_strength(
            self.shopify.access_token.expose_secret(),
            "SHOPIFY_ACCESS_TOKEN",
        ) {
            warnings.push(e.to_string());
        }
        match &self.webhook_secret {
            Some(secret) => {
                if let Err(e) =
                    validate_secret_strength(secret.expose_secret(), "SHOPIFY_WEBHOOK_SECRET")
                {
                    warnings.push(e.to_string());
                }
            }
            None => warnings
                .push("SHOPIFY_WEBHOOK_SECRET not set, all webhooks will be rejected".to_string()),
        }

        warnings
    }

    /// Emit [`Self::warnings`]. Call once tracing is initialized.
    pub fn log_warnings(&self) {
        for warning in self.warnings() {
            tracing::warn!("{warning}");
        }
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

fn database_url<F>(env: &Env<F>) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    env.optional("MIRROR_DATABASE_URL")
        .or_else(|| env.optional("DATABASE_URL"))
        .map(SecretString::from)
        .ok_or_else(|| ConfigError::MissingEnvVar("MIRROR_DATABASE_URL".to_string()))
}

impl ShopifyConfig {
    fn from_env<F>(env: &Env<F>) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token = env.required("SHOPIFY_ACCESS_TOKEN")?;

        Ok(Self {
            store_domain: env.required("SHOPIFY_STORE_DOMAIN")?,
            api_version: env
                .optional("SHOPIFY_API_VERSION")
                .unwrap_or_else(|| DEFAULT_API_VERSION.to_string()),
            access_token: SecretString::from(access_token),
        })
    }

    /// Admin REST API base URL, without a trailing slash.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!(
            "https://{}/admin/api/{}",
            self.store_domain.trim_end_matches('/'),
            self.api_version
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Variable lookup wrapper.
struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, key: &str) -> Option<String> {
        (self.0)(key).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.optional(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn parsed<T>(&self, key: &str, default: &str) -> Result<T, ConfigError>
    where
        T: std::str::FromStr,
        T::Err: std::fmt::Display,
    {
        self.optional(key)
            .as_deref()
            .unwrap_or(default)
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    }
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Check that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})"
            ),
        ));
    }

    Ok(())
}
