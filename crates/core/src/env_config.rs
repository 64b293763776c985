//! Environment configuration with warn-level logging for invalid values.

use std::fmt;
use std::str::FromStr;

use crate::constants::{
    DEFAULT_MAX_UPLOAD_BYTES, DEFAULT_PORT, DEFAULT_REQUEST_TIMEOUT_SECS, MAX_STRIKE_INCREMENT,
    MYSQL_CONNECT_TIMEOUT_SECS,
};

/// Parse an already looked-up variable with a default fallback.
///
/// - If the variable is not set: returns `default` silently (expected case).
/// - If the variable is set but cannot be parsed: logs a warning and returns `default`.
pub fn parse_with_default<T: FromStr + fmt::Display>(
    var: &str,
    raw: Option<String>,
    default: T,
) -> T {
    match raw {
        Some(v) => match v.trim().parse() {
            Ok(n) => n,
            Err(_) => {
                tracing::warn!(
                    var,
                    value = %v,
                    default = %default,
                    "invalid env var value, using default"
                );
                default
            },
        },
        None => default,
    }
}

fn non_empty(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

/// Where the MySQL server lives and how to log in.
///
/// `url` (from `DATABASE_URL`) wins over the individual `MYSQL_*` parts.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub url: Option<String>,
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            host: "127.0.0.1".to_owned(),
            port: 3306,
            user: "root".to_owned(),
            password: String::new(),
            database: "spydata".to_owned(),
            connect_timeout_secs: MYSQL_CONNECT_TIMEOUT_SECS,
        }
    }
}

impl DatabaseConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        Self {
            url: non_empty(lookup("DATABASE_URL")),
            host: non_empty(lookup("MYSQL_HOST")).unwrap_or(defaults.host),
            port: parse_with_default("MYSQL_PORT", lookup("MYSQL_PORT"), defaults.port),
            user: non_empty(lookup("MYSQL_USER")).unwrap_or(defaults.user),
            password: lookup("MYSQL_PASSWORD").unwrap_or(defaults.password),
            database: non_empty(lookup("MYSQL_DB")).unwrap_or(defaults.database),
            connect_timeout_secs: parse_with_default(
                "MYSQL_CONNECT_TIMEOUT_SECS",
                lookup("MYSQL_CONNECT_TIMEOUT_SECS"),
                defaults.connect_timeout_secs,
            ),
        }
    }

    /// Human-readable target with credentials removed, safe for logs and error messages.
    pub fn target(&self) -> String {
        match &self.url {
            Some(url) => redact_url(url),
            None => format!("mysql://{}@{}:{}/{}", self.user, self.host, self.port, self.database),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("target", &self.target())
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Replace the user-info part of a connection URL with `***`.
pub fn redact_url(url: &str) -> String {
    let Some(scheme_end) = url.find("://") else {
        return url.to_owned();
    };
    let rest = &url[scheme_end + 3..];
    let authority_end = rest.find('/').unwrap_or(rest.len());
    match rest[..authority_end].rfind('@') {
        Some(at) => format!("{}***{}", &url[..scheme_end + 3], &rest[at..]),
        None => url.to_owned(),
    }
}

/// Process-wide settings for the HTTP server.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub request_timeout_secs: u64,
    pub max_upload_bytes: usize,
    /// Distance between adjacent listed strikes, used to lay out the chain grid.
    pub strike_increment: f64,
    pub database: DatabaseConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_owned(),
            port: DEFAULT_PORT,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            strike_increment: 1.0,
            database: DatabaseConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F: Fn(&str) -> Option<String>>(lookup: F) -> Self {
        let defaults = Self::default();
        let strike_increment =
            parse_with_default("STRIKE_INCREMENT", lookup("STRIKE_INCREMENT"), defaults.strike_increment);
        let strike_increment = if strike_increment.is_finite()
            && strike_increment > 0.0
            && strike_increment <= MAX_STRIKE_INCREMENT
        {
            strike_increment
        } else {
            tracing::warn!(
                value = strike_increment,
                max = MAX_STRIKE_INCREMENT,
                "STRIKE_INCREMENT out of range, using 1.0"
            );
            defaults.strike_increment
        };
        Self {
            host: non_empty(lookup("HOST")).unwrap_or(defaults.host),
            port: parse_with_default("PORT", lookup("PORT"), defaults.port),
            request_timeout_secs: parse_with_default(
                "REQUEST_TIMEOUT_SECS",
                lookup("REQUEST_TIMEOUT_SECS"),
                defaults.request_timeout_secs,
            ),
            max_upload_bytes: parse_with_default(
                "MAX_UPLOAD_BYTES",
                lookup("MAX_UPLOAD_BYTES"),
                defaults.max_upload_bytes,
            ),
            strike_increment,
            database: DatabaseConfig::from_lookup(&lookup),
        }
    }
}
