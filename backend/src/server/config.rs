//! Environment-driven start-up configuration.
//!
//! Every setting is read once through [`mockable::Env`] and validated before
//! the server binds, so misconfiguration fails fast and can be tested without
//! touching the process environment.

use std::net::SocketAddr;
use std::path::PathBuf;

use actix_web::cookie::{Key, SameSite};
use mockable::Env;
use tracing::warn;
use zeroize::Zeroize;

use cancel_flow::outbound::persistence::PoolConfig;

pub(crate) const DATABASE_URL_ENV: &str = "DATABASE_URL";
pub(crate) const MAX_CONNECTIONS_ENV: &str = "DATABASE_MAX_CONNECTIONS";
pub(crate) const BIND_ADDR_ENV: &str = "BIND_ADDR";
pub(crate) const KEY_FILE_ENV: &str = "SESSION_KEY_FILE";
pub(crate) const COOKIE_SECURE_ENV: &str = "SESSION_COOKIE_SECURE";
pub(crate) const SAMESITE_ENV: &str = "SESSION_SAMESITE";
pub(crate) const ALLOW_EPHEMERAL_ENV: &str = "SESSION_ALLOW_EPHEMERAL";

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const SESSION_KEY_DEFAULT_PATH: &str = "/var/run/secrets/session_key";
pub(crate) const SESSION_KEY_MIN_LEN: usize = 64;
const BOOL_EXPECTED: &str = "1|0|true|false|yes|no|y|n";

/// Build mode for configuration validation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BuildMode {
    /// Debug builds tolerate missing session toggles and log a warning.
    Debug,
    /// Release builds require explicit, valid session toggles.
    Release,
}

impl BuildMode {
    #[must_use]
    pub fn from_debug_assertions() -> Self {
        if cfg!(debug_assertions) {
            Self::Debug
        } else {
            Self::Release
        }
    }

    fn is_debug(self) -> bool {
        matches!(self, Self::Debug)
    }
}

/// Errors raised while validating start-up configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {name}")]
    MissingEnv { name: &'static str },
    #[error("invalid value for {name}='{value}'; expected {expected}")]
    InvalidEnv {
        name: &'static str,
        value: String,
        expected: &'static str,
    },
    #[error("failed to read session key at {path}: {source}")]
    KeyRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session key at {path} too short: need >= {min_len} bytes, got {length}")]
    KeyTooShort {
        path: PathBuf,
        length: usize,
        min_len: usize,
    },
    #[error("SESSION_SAMESITE=None requires SESSION_COOKIE_SECURE=1")]
    InsecureSameSiteNone,
    #[error("SESSION_ALLOW_EPHEMERAL must be 0 in release builds")]
    EphemeralNotAllowed,
}

/// Cookie session settings.
#[derive(Clone)]
pub struct SessionSettings {
    pub key: Key,
    pub cookie_secure: bool,
    pub same_site: SameSite,
}

/// Validated process configuration.
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    /// `None` selects the in-memory store.
    pub database: Option<PoolConfig>,
    pub session: SessionSettings,
}

/// Read and validate the whole configuration.
pub fn config_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<AppConfig, ConfigError> {
    Ok(AppConfig {
        bind_addr: bind_addr_from_env(env)?,
        database: database_from_env(env)?,
        session: session_from_env(env, mode)?,
    })
}

fn bind_addr_from_env<E: Env>(env: &E) -> Result<SocketAddr, ConfigError> {
    let raw = env
        .string(BIND_ADDR_ENV)
        .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_owned());
    raw.parse().map_err(|_| ConfigError::InvalidEnv {
        name: BIND_ADDR_ENV,
        value: raw,
        expected: "host:port socket address",
    })
}

fn database_from_env<E: Env>(env: &E) -> Result<Option<PoolConfig>, ConfigError> {
    let Some(url) = env
        .string(DATABASE_URL_ENV)
        .filter(|url| !url.trim().is_empty())
    else {
        return Ok(None);
    };

    let max_size = match env.string(MAX_CONNECTIONS_ENV) {
        None => DEFAULT_MAX_CONNECTIONS,
        Some(value) => match value.trim().parse::<u32>() {
            Ok(size) if size > 0 => size,
            _ => {
                return Err(ConfigError::InvalidEnv {
                    name: MAX_CONNECTIONS_ENV,
                    value,
                    expected: "a positive integer",
                });
            }
        },
    };

    Ok(Some(PoolConfig::new(url).with_max_size(max_size)))
}

/// Resolve a boolean toggle. Debug builds fall back to `debug_default` with a
/// warning; release builds reject missing or unparsable values.
fn flag_from_env<E: Env>(
    env: &E,
    name: &'static str,
    mode: BuildMode,
    debug_default: bool,
) -> Result<bool, ConfigError> {
    let Some(value) = env.string(name) else {
        if mode.is_debug() {
            warn!(setting = name, default = debug_default, "setting not present; using default");
            return Ok(debug_default);
        }
        return Err(ConfigError::MissingEnv { name });
    };
    match parse_bool(&value) {
        Some(flag) => Ok(flag),
        None if mode.is_debug() => {
            warn!(setting = name, value = %value, "invalid boolean; using default");
            Ok(debug_default)
        }
        None => Err(ConfigError::InvalidEnv {
            name,
            value,
            expected: BOOL_EXPECTED,
        }),
    }
}

fn same_site_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    cookie_secure: bool,
) -> Result<SameSite, ConfigError> {
    let Some(value) = env.string(SAMESITE_ENV) else {
        return Ok(SameSite::Strict);
    };
    match value.to_ascii_lowercase().as_str() {
        "strict" => Ok(SameSite::Strict),
        "lax" => Ok(SameSite::Lax),
        "none" if cookie_secure || mode.is_debug() => Ok(SameSite::None),
        "none" => Err(ConfigError::InsecureSameSiteNone),
        _ => Err(ConfigError::InvalidEnv {
            name: SAMESITE_ENV,
            value,
            expected: "Strict|Lax|None",
        }),
    }
}

fn session_from_env<E: Env>(env: &E, mode: BuildMode) -> Result<SessionSettings, ConfigError> {
    let cookie_secure = flag_from_env(env, COOKIE_SECURE_ENV, mode, true)?;
    let same_site = same_site_from_env(env, mode, cookie_secure)?;
    let allow_ephemeral = flag_from_env(env, ALLOW_EPHEMERAL_ENV, mode, false)?;
    if allow_ephemeral && !mode.is_debug() {
        return Err(ConfigError::EphemeralNotAllowed);
    }
    let key = session_key_from_env(env, mode, allow_ephemeral)?;

    Ok(SessionSettings {
        key,
        cookie_secure,
        same_site,
    })
}

fn session_key_from_env<E: Env>(
    env: &E,
    mode: BuildMode,
    allow_ephemeral: bool,
) -> Result<Key, ConfigError> {
    let path = PathBuf::from(
        env.string(KEY_FILE_ENV)
            .unwrap_or_else(|| SESSION_KEY_DEFAULT_PATH.to_owned()),
    );

    match std::fs::read(&path) {
        Ok(mut bytes) => {
            let length = bytes.len();
            if length < SESSION_KEY_MIN_LEN {
                bytes.zeroize();
                return Err(ConfigError::KeyTooShort {
                    path,
                    length,
                    min_len: SESSION_KEY_MIN_LEN,
                });
            }
            let key = Key::derive_from(&bytes);
            bytes.zeroize();
            Ok(key)
        }
        Err(source) if mode.is_debug() || allow_ephemeral => {
            warn!(
                path = %path.display(),
                error = %source,
                "using temporary session key (dev only)"
            );
            Ok(Key::generate())
        }
        Err(source) => Err(ConfigError::KeyRead { path, source }),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" => Some(true),
        "0" | "false" | "no" | "n" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
