//! API Configuration Module
//!
//! Server, CORS and request-limit settings. Everything is read once at
//! startup from environment variables; a missing required variable or an
//! unparsable value is a startup error.

use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Configuration loading failures.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing required environment variable {var}")]
    Missing { var: &'static str },

    #[error("invalid value {value:?} for {var}")]
    Invalid { var: &'static str, value: String },
}

/// Read a variable, falling back to `default` when unset or blank.
pub(crate) fn var_or<T, F>(lookup: &F, var: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(var).filter(|v| !v.trim().is_empty()) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { var, value }),
        None => Ok(default),
    }
}

/// Read a variable that has no default.
pub(crate) fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(var)
        .filter(|v| !v.trim().is_empty())
        .ok_or(ConfigError::Missing { var })
}

pub(crate) fn process_env(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

// ============================================================================
// API CONFIGURATION
// ============================================================================

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Address the listener binds to.
    pub bind_addr: SocketAddr,

    /// Allowed CORS origins. Empty means any origin.
    pub cors_origins: Vec<String>,

    /// Max age for CORS preflight cache in seconds.
    pub cors_max_age_secs: u64,

    /// Upper bound on a request's lifetime, store calls included.
    pub request_timeout: Duration,

    /// Largest accepted request body.
    pub body_limit_bytes: usize,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 8082)),
            cors_origins: Vec::new(),
            cors_max_age_secs: 86400,
            request_timeout: Duration::from_secs(30),
            body_limit_bytes: 1024 * 1024,
        }
    }
}

impl ApiConfig {
    /// Create ApiConfig from environment variables.
    ///
    /// Environment variables:
    /// - `SCHEMATA_API_BIND`: Bind host (default: 0.0.0.0)
    /// - `PORT` or `SCHEMATA_API_PORT`: Bind port (default: 8082)
    /// - `SCHEMATA_CORS_ORIGINS`: Comma-separated allowed origins (empty = allow all)
    /// - `SCHEMATA_REQUEST_TIMEOUT_SECS`: Request timeout (default: 30)
    /// - `SCHEMATA_BODY_LIMIT_BYTES`: Body size limit (default: 1 MiB)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    /// Same as [`ApiConfig::from_env`] with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let host = lookup("SCHEMATA_API_BIND")
            .filter(|h| !h.trim().is_empty())
            .unwrap_or_else(|| "0.0.0.0".to_string());
        let port_var = if lookup("PORT").is_some() {
            "PORT"
        } else {
            "SCHEMATA_API_PORT"
        };
        let port: u16 = var_or(&lookup, port_var, defaults.bind_addr.port())?;
        let addr = format!("{}:{}", host.trim(), port);
        let bind_addr = addr.parse().map_err(|_| ConfigError::Invalid {
            var: "SCHEMATA_API_BIND",
            value: host.clone(),
        })?;

        let cors_origins = lookup("SCHEMATA_CORS_ORIGINS")
            .map(|s| {
                s.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let timeout_secs: u64 = var_or(
            &lookup,
            "SCHEMATA_REQUEST_TIMEOUT_SECS",
            defaults.request_timeout.as_secs(),
        )?;
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                var: "SCHEMATA_REQUEST_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        Ok(Self {
            bind_addr,
            cors_origins,
            cors_max_age_secs: defaults.cors_max_age_secs,
            request_timeout: Duration::from_secs(timeout_secs),
            body_limit_bytes: var_or(&lookup, "SCHEMATA_BODY_LIMIT_BYTES", defaults.body_limit_bytes)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup(&[]))?;
        assert_eq!(config.bind_addr, SocketAddr::from(([0, 0, 0, 0], 8082)));
        assert!(config.cors_origins.is_empty());
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.body_limit_bytes, 1024 * 1024);
        Ok(())
    }

    #[test]
    fn test_port_prefers_port_variable() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup(&[
            ("PORT", "9000"),
            ("SCHEMATA_API_PORT", "9100"),
            ("SCHEMATA_API_BIND", "127.0.0.1"),
        ]))?;
        assert_eq!(config.bind_addr.port(), 9000);
        assert!(config.bind_addr.ip().is_loopback());

        let config = ApiConfig::from_lookup(lookup(&[("SCHEMATA_API_PORT", "9100")]))?;
        assert_eq!(config.bind_addr.port(), 9100);
        Ok(())
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = ApiConfig::from_lookup(lookup(&[("PORT", "eighty")])).err();
        assert_eq!(
            err,
            Some(ConfigError::Invalid {
                var: "PORT",
                value: "eighty".to_string()
            })
        );
        assert!(ApiConfig::from_lookup(lookup(&[("SCHEMATA_REQUEST_TIMEOUT_SECS", "0")])).is_err());
        assert!(ApiConfig::from_lookup(lookup(&[("SCHEMATA_API_BIND", "not a host")])).is_err());
    }

    #[test]
    fn test_cors_origins_are_split_and_trimmed() -> Result<(), ConfigError> {
        let config = ApiConfig::from_lookup(lookup(&[(
            "SCHEMATA_CORS_ORIGINS",
            "https://a.example, https://b.example,,",
        )]))?;
        assert_eq!(config.cors_origins, vec!["https://a.example", "https://b.example"]);
        Ok(())
    }

    #[test]
    fn test_required_variable() {
        let vars = lookup(&[("SET", "x")]);
        assert_eq!(required(&vars, "SET"), Ok("x".to_string()));
        assert_eq!(
            required(&vars, "UNSET"),
            Err(ConfigError::Missing { var: "UNSET" })
        );
    }
}
