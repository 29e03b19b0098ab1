//! Environment-driven configuration.

use std::time::Duration;

use thiserror::Error;
use tracing::warn;

pub const ADMIN_USERNAME_ENV: &str = "STOREHUB_ADMIN_USERNAME";
pub const ADMIN_EMAIL_ENV: &str = "STOREHUB_ADMIN_EMAIL";
pub const ADMIN_PASSWORD_ENV: &str = "STOREHUB_ADMIN_PASSWORD";
pub const CACHE_ENABLED_ENV: &str = "STOREHUB_CACHE_ENABLED";
pub const CACHE_CAPACITY_ENV: &str = "STOREHUB_CACHE_CAPACITY";
pub const CACHE_TTL_SECS_ENV: &str = "STOREHUB_CACHE_TTL_SECS";
pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be true or false, got {value:?}")]
    InvalidBool { var: &'static str, value: String },
    #[error("{var} must be a positive integer, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },
}

/// Bootstrap administrator created by the seed loader.
#[derive(Clone, PartialEq, Eq)]
pub struct AdminSeed {
    pub username: String,
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for AdminSeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AdminSeed")
            .field("username", &self.username)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

impl Default for AdminSeed {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            email: "admin@storehub.local".to_string(),
            password: "admin".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub admin: AdminSeed,
    pub cache_enabled: bool,
    /// Upper bound on cached read results.
    pub cache_capacity: u64,
    pub cache_ttl: Duration,
    pub database_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            admin: AdminSeed::default(),
            cache_enabled: true,
            cache_capacity: crate::cache::DEFAULT_CAPACITY,
            cache_ttl: crate::cache::DEFAULT_TTL,
            database_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = AdminSeed::default();

        let username = lookup(ADMIN_USERNAME_ENV).unwrap_or(defaults.username);
        let email = lookup(ADMIN_EMAIL_ENV).unwrap_or(defaults.email);
        let password = lookup(ADMIN_PASSWORD_ENV).unwrap_or_else(|| {
            warn!("{ADMIN_PASSWORD_ENV} not set; using insecure dev default");
            defaults.password
        });

        let cache_enabled = match lookup(CACHE_ENABLED_ENV) {
            None => true,
            Some(raw) => parse_bool(CACHE_ENABLED_ENV, &raw)?,
        };

        let cache_capacity = match lookup(CACHE_CAPACITY_ENV) {
            None => crate::cache::DEFAULT_CAPACITY,
            Some(raw) => parse_positive(CACHE_CAPACITY_ENV, &raw)?,
        };
        let cache_ttl = match lookup(CACHE_TTL_SECS_ENV) {
            None => crate::cache::DEFAULT_TTL,
            Some(raw) => Duration::from_secs(parse_positive(CACHE_TTL_SECS_ENV, &raw)?),
        };

        let database_url = lookup(DATABASE_URL_ENV).filter(|url| !url.trim().is_empty());

        Ok(Self {
            admin: AdminSeed {
                username,
                email,
                password,
            },
            cache_enabled,
            cache_capacity,
            cache_ttl,
            database_url,
        })
    }
}

fn parse_bool(var: &'static str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" => Ok(true),
        "false" | "0" => Ok(false),
        _ => Err(ConfigError::InvalidBool {
            var,
            value: raw.to_string(),
        }),
    }
}

fn parse_positive(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ConfigError::InvalidNumber {
            var,
            value: raw.to_string(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn values_are_read_from_the_lookup() {
        let config = AppConfig::from_lookup(lookup(&[
            (ADMIN_USERNAME_ENV, "root"),
            (ADMIN_EMAIL_ENV, "root@example.com"),
            (ADMIN_PASSWORD_ENV, "s3cret"),
            (CACHE_ENABLED_ENV, "FALSE"),
            (CACHE_CAPACITY_ENV, "250"),
            (CACHE_TTL_SECS_ENV, "30"),
            (DATABASE_URL_ENV, "postgres://localhost/storehub"),
        ]))
        .unwrap();
        assert_eq!(config.admin.username, "root");
        assert_eq!(config.admin.email, "root@example.com");
        assert_eq!(config.admin.password, "s3cret");
        assert!(!config.cache_enabled);
        assert_eq!(config.cache_capacity, 250);
        assert_eq!(config.cache_ttl, Duration::from_secs(30));
        assert_eq!(config.database_url.as_deref(), Some("postgres://localhost/storehub"));
    }

    #[test]
    fn malformed_bool_is_rejected() {
        let err = AppConfig::from_lookup(lookup(&[(CACHE_ENABLED_ENV, "sometimes")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidBool {
                var: CACHE_ENABLED_ENV,
                value: "sometimes".into()
            }
        );
    }

    #[test]
    fn cache_limits_must_be_positive_integers() {
        for raw in ["0", "-5", "lots"] {
            let err = AppConfig::from_lookup(lookup(&[(CACHE_CAPACITY_ENV, raw)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidNumber {
                    var: CACHE_CAPACITY_ENV,
                    value: raw.into()
                }
            );
        }
        assert!(AppConfig::from_lookup(lookup(&[(CACHE_TTL_SECS_ENV, "0")])).is_err());
    }

    #[test]
    fn admin_password_is_not_debug_printed() {
        let rendered = format!("{:?}", AdminSeed::default());
        assert!(!rendered.contains("password"));
    }
}
