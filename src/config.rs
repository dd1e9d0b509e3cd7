//! Runtime configuration.
//!
//! `Config` is read once from the process environment in `main` and then handed
//! to every component that needs it through `AppState`. Nothing in the crate reads
//! environment variables after startup.

use std::env;
use std::fmt;

/// Deployment mode, from `APP_ENV`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" => Environment::Development,
            "production" | "prod" => Environment::Production,
            _ => Environment::Test,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }

    pub fn is_development(self) -> bool {
        self == Environment::Development
    }
}

/// Signing secrets and lifetimes for both token classes.
#[derive(Debug, Clone)]
pub struct JwtSettings {
    pub access_secret: String,
    pub refresh_secret: String,
    /// Access token lifetime in seconds.
    pub access_expiry_secs: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expiry_secs: i64,
}

/// Credentials for the admin account created at startup.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Postgres connection string. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub server_port: u16,
    pub server_host: String,
    pub environment: Environment,
    pub jwt: JwtSettings,
    pub allowed_origins: Vec<String>,
    pub bcrypt_cost: u32,
    pub admin_seed: Option<AdminSeed>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "{} must be set", key),
            ConfigError::Invalid { key, reason } => write!(f, "{} is invalid: {}", key, reason),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    /// Reads the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let jwt = JwtSettings {
            access_secret: get("JWT_SECRET").ok_or(ConfigError::Missing("JWT_SECRET"))?,
            refresh_secret: get("JWT_REFRESH_SECRET")
                .ok_or(ConfigError::Missing("JWT_REFRESH_SECRET"))?,
            access_expiry_secs: parse_or("JWT_EXPIRY_SECS", get("JWT_EXPIRY_SECS"), 60 * 60 * 24)?,
            refresh_expiry_secs: parse_or(
                "JWT_REFRESH_EXPIRY_SECS",
                get("JWT_REFRESH_EXPIRY_SECS"),
                60 * 60 * 24 * 7,
            )?,
        };

        if jwt.access_secret == jwt.refresh_secret {
            return Err(ConfigError::Invalid {
                key: "JWT_REFRESH_SECRET",
                reason: "must differ from JWT_SECRET".into(),
            });
        }
        if jwt.access_expiry_secs <= 0 || jwt.refresh_expiry_secs <= 0 {
            return Err(ConfigError::Invalid {
                key: "JWT_EXPIRY_SECS",
                reason: "token lifetimes must be positive".into(),
            });
        }

        let allowed_origins = get("ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["http://localhost:5173".to_string()]);

        let admin_seed = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password,
                name: get("ADMIN_NAME").unwrap_or_else(|| "Admin".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            database_url: get("DATABASE_URL"),
            server_port: parse_or("SERVER_PORT", get("SERVER_PORT"), 8080)?,
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            environment: get("APP_ENV")
                .map(|v| Environment::parse(&v))
                .unwrap_or(Environment::Production),
            jwt,
            allowed_origins,
            bcrypt_cost: parse_or("BCRYPT_COST", get("BCRYPT_COST"), bcrypt::DEFAULT_COST)?,
            admin_seed,
        })
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

fn parse_or<T>(key: &'static str, value: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match value {
        Some(raw) => raw.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
            key,
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lazy_static::lazy_static;
    use std::collections::HashMap;

    lazy_static! {
        static ref ENV_LOCK: std::sync::Mutex<()> = std::sync::Mutex::new(());
    }

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "access"),
            ("JWT_REFRESH_SECRET", "refresh"),
        ]))
        .unwrap();

        assert!(config.database_url.is_none());
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.jwt.access_expiry_secs, 86_400);
        assert_eq!(config.jwt.refresh_expiry_secs, 604_800);
        assert_eq!(config.allowed_origins, vec!["http://localhost:5173"]);
        assert_eq!(config.bcrypt_cost, bcrypt::DEFAULT_COST);
        assert!(config.admin_seed.is_none());
    }

    #[test]
    fn test_config_custom_values() {
        let config = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "access"),
            ("JWT_REFRESH_SECRET", "refresh"),
            ("SERVER_PORT", "3000"),
            ("SERVER_HOST", "0.0.0.0"),
            ("APP_ENV", "development"),
            ("ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
            ("ADMIN_EMAIL", "root@example.com"),
            ("ADMIN_PASSWORD", "hunter22"),
        ]))
        .unwrap();

        assert_eq!(config.server_url(), "http://0.0.0.0:3000");
        assert!(config.environment.is_development());
        assert_eq!(config.allowed_origins, vec!["http://a.test", "http://b.test"]);
        let seed = config.admin_seed.unwrap();
        assert_eq!(seed.email, "root@example.com");
        assert_eq!(seed.name, "Admin");
    }

    #[test]
    fn test_config_rejects_shared_secret() {
        let err = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "same"),
            ("JWT_REFRESH_SECRET", "same"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "JWT_REFRESH_SECRET", .. }));
    }

    #[test]
    fn test_config_missing_and_invalid() {
        let err = Config::from_lookup(lookup(&[("JWT_REFRESH_SECRET", "refresh")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let err = Config::from_lookup(lookup(&[
            ("JWT_SECRET", "access"),
            ("JWT_REFRESH_SECRET", "refresh"),
            ("SERVER_PORT", "eighty"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "SERVER_PORT", .. }));
    }

    #[test]
    fn test_config_from_env() {
        let _guard = ENV_LOCK.lock().unwrap();
        env::set_var("JWT_SECRET", "env_access");
        env::set_var("JWT_REFRESH_SECRET", "env_refresh");
        env::set_var("APP_ENV", "production");

        let config = Config::from_env().unwrap();
        assert_eq!(config.jwt.access_secret, "env_access");
        assert!(config.environment.is_production());

        env::remove_var("JWT_SECRET");
        env::remove_var("JWT_REFRESH_SECRET");
        env::remove_var("APP_ENV");
    }
}
