//! Process configuration read from the environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use thiserror::Error;

pub const DEFAULT_BIND: &str = "0.0.0.0:31415";
pub const DEFAULT_REDIS_URL: &str = "redis://localhost:6379";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} has an invalid value '{value}': {reason}")]
    Invalid {
        var: &'static str,
        value: String,
        reason: String,
    },
}

impl ConfigError {
    fn invalid(var: &'static str, value: &str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            var,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Which inventory store backs the process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    InMemory,
    Redis { url: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind: SocketAddr,
    pub store: StoreBackend,
    /// Optional JSON stock file loaded into an empty store at startup.
    pub seed_path: Option<PathBuf>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the configuration from an arbitrary variable lookup.
    ///
    /// Recognised variables:
    /// - `PIESTAND_BIND`: listen address (default `0.0.0.0:31415`)
    /// - `USE_PERSISTENT_STORES`: `true` selects Redis (default in-memory)
    /// - `REDIS_URL`: Redis connection URL (default `redis://localhost:6379`)
    /// - `REDIS_PASSWORD`: injected into the URL when it carries none
    /// - `PIESTAND_SEED_FILE`: stock file for the startup load
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let bind_raw = lookup("PIESTAND_BIND").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind = bind_raw
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::invalid("PIESTAND_BIND", &bind_raw, e.to_string()))?;

        let use_persistent = match lookup("USE_PERSISTENT_STORES") {
            None => false,
            Some(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|e| ConfigError::invalid("USE_PERSISTENT_STORES", &raw, e.to_string()))?,
        };

        let store = if use_persistent {
            let url = lookup("REDIS_URL").unwrap_or_else(|| DEFAULT_REDIS_URL.to_string());
            let url = match lookup("REDIS_PASSWORD").filter(|p| !p.is_empty()) {
                Some(password) => with_password(&url, &password)?,
                None => url,
            };
            StoreBackend::Redis { url }
        } else {
            StoreBackend::InMemory
        };

        let seed_path = lookup("PIESTAND_SEED_FILE")
            .filter(|p| !p.is_empty())
            .map(PathBuf::from);

        Ok(Self {
            bind,
            store,
            seed_path,
        })
    }
}

/// Insert `:password@` after the scheme unless the URL already has credentials.
fn with_password(url: &str, password: &str) -> Result<String, ConfigError> {
    let Some((scheme, rest)) = url.split_once("://") else {
        return Err(ConfigError::invalid("REDIS_URL", url, "missing scheme"));
    };

    let authority = rest.split('/').next().unwrap_or_default();
    if authority.contains('@') {
        return Ok(url.to_string());
    }

    Ok(format!("{scheme}://:{password}@{rest}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let vars: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        AppConfig::from_lookup(|var| vars.get(var).cloned())
    }

    #[test]
    fn defaults_to_in_memory_on_pi_port() {
        let cfg = config(&[]).unwrap();
        assert_eq!(cfg.bind, "0.0.0.0:31415".parse().unwrap());
        assert_eq!(cfg.store, StoreBackend::InMemory);
        assert_eq!(cfg.seed_path, None);
    }

    #[test]
    fn persistent_stores_select_redis() {
        let cfg = config(&[("USE_PERSISTENT_STORES", "true")]).unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Redis {
                url: DEFAULT_REDIS_URL.to_string()
            }
        );
    }

    #[test]
    fn password_is_injected_into_url() {
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("REDIS_URL", "redis://cache:6380/2"),
            ("REDIS_PASSWORD", "s3cret"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Redis {
                url: "redis://:s3cret@cache:6380/2".to_string()
            }
        );
    }

    #[test]
    fn explicit_credentials_win_over_password() {
        let cfg = config(&[
            ("USE_PERSISTENT_STORES", "true"),
            ("REDIS_URL", "redis://user:pw@cache:6379"),
            ("REDIS_PASSWORD", "other"),
        ])
        .unwrap();
        assert_eq!(
            cfg.store,
            StoreBackend::Redis {
                url: "redis://user:pw@cache:6379".to_string()
            }
        );
    }

    #[test]
    fn invalid_values_are_rejected() {
        assert!(matches!(
            config(&[("PIESTAND_BIND", "not an address")]),
            Err(ConfigError::Invalid { var: "PIESTAND_BIND", .. })
        ));
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "yes")]),
            Err(ConfigError::Invalid { var: "USE_PERSISTENT_STORES", .. })
        ));
        assert!(matches!(
            config(&[("USE_PERSISTENT_STORES", "true"), ("REDIS_URL", "cache:6379"), ("REDIS_PASSWORD", "x")]),
            Err(ConfigError::Invalid { var: "REDIS_URL", .. })
        ));
    }
}
