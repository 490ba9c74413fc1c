use crate::auth::jwt::{JwtConfig, MIN_SECRET_LEN, generate_printable_secret};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Server configuration
///
/// # Environment variables
///
/// | Variable | Default | Notes |
/// |----------|---------|-------|
/// | DATABASE_PATH | salon.db | SQLite file |
/// | HTTP_PORT | 3000 | |
/// | ENVIRONMENT | development | development \| staging \| production |
/// | LOG_LEVEL | info | |
/// | LOG_JSON | false | |
/// | LOG_DIR | - | daily rolling file when set |
/// | JWT_SECRET | - | required outside development, ≥ 32 chars |
/// | JWT_ISSUER | salon-server | |
/// | JWT_EXPIRATION_MINUTES | 1440 | |
/// | STRIPE_WEBHOOK_SECRET | - | required outside development |
/// | REQUEST_TIMEOUT_MS | 30000 | |
#[derive(Debug, Clone)]
pub struct Config {
    pub database_path: String,
    pub http_port: u16,
    /// development | staging | production
    pub environment: String,
    pub log_level: String,
    pub log_json: bool,
    pub log_dir: Option<String>,
    pub jwt: JwtConfig,
    pub stripe_webhook_secret: String,
    pub request_timeout_ms: u64,
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<Option<String>, BoxError> {
        match std::env::var(name) {
            Ok(v) if !v.is_empty() => Ok(Some(v)),
            _ if environment != "development" => {
                Err(format!("{name} must be set in {environment} environment").into())
            }
            _ => Ok(None),
        }
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let jwt_secret = match Self::require_secret("JWT_SECRET", &environment)? {
            Some(secret) if secret.len() < MIN_SECRET_LEN => {
                return Err(format!(
                    "JWT_SECRET must be at least {MIN_SECRET_LEN} characters long"
                )
                .into());
            }
            Some(secret) => secret,
            None => generate_printable_secret(),
        };
        let mut jwt = JwtConfig::new(
            jwt_secret,
            std::env::var("JWT_ISSUER").unwrap_or_else(|_| "salon-server".into()),
        );
        if let Some(minutes) = std::env::var("JWT_EXPIRATION_MINUTES")
            .ok()
            .and_then(|v| v.parse().ok())
        {
            jwt.expiration_minutes = minutes;
        }

        Ok(Self {
            database_path: std::env::var("DATABASE_PATH").unwrap_or_else(|_| "salon.db".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: environment.clone(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_json: std::env::var("LOG_JSON")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(false),
            log_dir: std::env::var("LOG_DIR").ok().filter(|s| !s.is_empty()),
            jwt,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?
                .unwrap_or_else(|| "dev-STRIPE_WEBHOOK_SECRET-not-for-production".into()),
            request_timeout_ms: std::env::var("REQUEST_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(30000),
        })
    }

    /// In-process configuration for tests
    pub fn for_tests(jwt_secret: &str, stripe_webhook_secret: &str) -> Self {
        Self {
            database_path: ":memory:".into(),
            http_port: 0,
            environment: "development".into(),
            log_level: "debug".into(),
            log_json: false,
            log_dir: None,
            jwt: JwtConfig::new(jwt_secret, "salon-server"),
            stripe_webhook_secret: stripe_webhook_secret.into(),
            request_timeout_ms: 30000,
        }
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
