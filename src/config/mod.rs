use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub api: ApiConfig,
    pub security: SecurityConfig,
    pub identity: IdentityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub run_migrations: bool,
    pub retry_max_attempts: u32,
    pub retry_base_delay_ms: u64,
    pub retry_max_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    pub default_page_size: u32,
    pub max_page_size: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    pub enable_cors: bool,
    pub cors_origins: Vec<String>,
    pub jwt_secret: String,
    pub jwt_issuer: String,
    pub jwt_audience: String,
    pub jwt_expiry_minutes: i64,
    pub jwt_leeway_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityConfig {
    pub password_min_length: usize,
    pub password_require_digit: bool,
    pub password_require_lowercase: bool,
    pub password_require_uppercase: bool,
    pub password_require_non_alphanumeric: bool,
    pub admin_role: String,
    pub default_roles: Vec<String>,
    pub allow_registration: bool,
    pub seed_admin_email: Option<String>,
    pub seed_admin_password: Option<String>,
}

const DEV_JWT_SECRET: &str = "zero-api-development-secret-change-me-0123456789";

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_env_overrides()
    }

    fn with_env_overrides(mut self) -> Self {
        // Database overrides
        if let Ok(v) = env::var("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Ok(v) = env::var("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Ok(v) = env::var("DATABASE_RUN_MIGRATIONS") {
            self.database.run_migrations = v.parse().unwrap_or(self.database.run_migrations);
        }
        if let Ok(v) = env::var("DATABASE_RETRY_MAX_ATTEMPTS") {
            self.database.retry_max_attempts = v.parse().unwrap_or(self.database.retry_max_attempts);
        }
        if let Ok(v) = env::var("DATABASE_RETRY_BASE_DELAY_MS") {
            self.database.retry_base_delay_ms = v.parse().unwrap_or(self.database.retry_base_delay_ms);
        }
        if let Ok(v) = env::var("DATABASE_RETRY_MAX_DELAY_MS") {
            self.database.retry_max_delay_ms = v.parse().unwrap_or(self.database.retry_max_delay_ms);
        }

        // API overrides
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Ok(v) = env::var("API_DEFAULT_PAGE_SIZE") {
            self.api.default_page_size = v.parse().unwrap_or(self.api.default_page_size);
        }
        if let Ok(v) = env::var("API_MAX_PAGE_SIZE") {
            self.api.max_page_size = v.parse().unwrap_or(self.api.max_page_size);
        }

        // Security overrides
        if let Ok(v) = env::var("SECURITY_ENABLE_CORS") {
            self.security.enable_cors = v.parse().unwrap_or(self.security.enable_cors);
        }
        if let Ok(v) = env::var("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = split_list(&v);
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            self.security.jwt_secret = v;
        }
        if let Ok(v) = env::var("JWT_ISSUER") {
            self.security.jwt_issuer = v;
        }
        if let Ok(v) = env::var("JWT_AUDIENCE") {
            self.security.jwt_audience = v;
        }
        if let Ok(v) = env::var("JWT_EXPIRY_MINUTES") {
            self.security.jwt_expiry_minutes = v.parse().unwrap_or(self.security.jwt_expiry_minutes);
        }
        if let Ok(v) = env::var("JWT_LEEWAY_SECS") {
            self.security.jwt_leeway_secs = v.parse().unwrap_or(self.security.jwt_leeway_secs);
        }

        // Identity overrides
        if let Ok(v) = env::var("IDENTITY_PASSWORD_MIN_LENGTH") {
            self.identity.password_min_length = v.parse().unwrap_or(self.identity.password_min_length);
        }
        if let Ok(v) = env::var("IDENTITY_ADMIN_ROLE") {
            if !v.trim().is_empty() {
                self.identity.admin_role = v.trim().to_string();
            }
        }
        if let Ok(v) = env::var("IDENTITY_DEFAULT_ROLES") {
            self.identity.default_roles = split_list(&v);
        }
        if let Ok(v) = env::var("IDENTITY_ALLOW_REGISTRATION") {
            self.identity.allow_registration = v.parse().unwrap_or(self.identity.allow_registration);
        }
        if let Ok(v) = env::var("ZERO_SEED_ADMIN_EMAIL") {
            self.identity.seed_admin_email = Some(v);
        }
        if let Ok(v) = env::var("ZERO_SEED_ADMIN_PASSWORD") {
            self.identity.seed_admin_password = Some(v);
        }

        self
    }

    fn development() -> Self {
        Self {
            environment: Environment::Development,
            database: DatabaseConfig {
                max_connections: 10,
                connection_timeout: 30,
                run_migrations: true,
                retry_max_attempts: 6,
                retry_base_delay_ms: 100,
                retry_max_delay_ms: 5_000,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                default_page_size: 20,
                max_page_size: 200,
            },
            security: SecurityConfig {
                enable_cors: true,
                cors_origins: vec!["http://localhost:3000".to_string(), "http://localhost:5173".to_string()],
                jwt_secret: DEV_JWT_SECRET.to_string(),
                jwt_issuer: "zero-api".to_string(),
                jwt_audience: "zero-frontend".to_string(),
                jwt_expiry_minutes: 60 * 24,
                jwt_leeway_secs: 30,
            },
            identity: IdentityConfig {
                password_min_length: 8,
                password_require_digit: true,
                password_require_lowercase: true,
                password_require_uppercase: true,
                password_require_non_alphanumeric: false,
                admin_role: "Admin".to_string(),
                default_roles: vec![],
                allow_registration: true,
                seed_admin_email: None,
                seed_admin_password: None,
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.database.retry_max_delay_ms = 15_000;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.security.cors_origins = vec!["https://staging.example.com".to_string()];
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_minutes = 60 * 8;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.retry_max_delay_ms = 30_000;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.security.cors_origins = vec!["https://app.example.com".to_string()];
        // Production must supply JWT_SECRET explicitly
        config.security.jwt_secret = String::new();
        config.security.jwt_expiry_minutes = 60;
        config.identity.allow_registration = false;
        config
    }
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

// Global singleton config - initialized once at startup
pub static CONFIG: Lazy<AppConfig> = Lazy::new(AppConfig::from_env);

// Convenience function for accessing config
pub fn config() -> &'static AppConfig {
    &CONFIG
}

#[macro_export]
macro_rules! is_production {
    () => {
        matches!($crate::config::CONFIG.environment, $crate::config::Environment::Production)
    };
}
