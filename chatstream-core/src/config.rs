use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

use crate::error::{ChatStreamError, CoreResult};

/// Environment variable that overrides `base_url`.
pub const ENV_API_URL: &str = "CHATSTREAM_API_URL";

fn default_base_url() -> String {
    "http://localhost:8000".to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct HttpCfg {
    /// TCP connect timeout in milliseconds (default 5000ms)
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// Total request timeout in milliseconds, body included (default 300000ms).
    /// A reply that streams longer than this fails with a transport error.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
    /// Optional per-host idle connection pool cap (None = reqwest default)
    #[serde(default)]
    pub pool_max_idle_per_host: Option<usize>,
}

impl Default for HttpCfg {
    fn default() -> Self {
        Self {
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            pool_max_idle_per_host: None,
        }
    }
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}
fn default_request_timeout_ms() -> u64 {
    300_000
}

/// Where to find credentials of an already logged-in session.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct AuthCfg {
    /// Name of the environment variable holding the `Cookie` header value.
    #[serde(default)]
    pub session_cookie_env: Option<String>,
    /// Name of the environment variable holding the CSRF token.
    #[serde(default)]
    pub csrf_token_env: Option<String>,
}

/// Resolved credentials sent with every request.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub session_cookie: Option<SecretString>,
    pub csrf_token: Option<SecretString>,
}

impl AuthCfg {
    pub fn resolve(&self) -> Credentials {
        self.resolve_with(|name| std::env::var(name).ok())
    }

    pub fn resolve_with(&self, lookup: impl Fn(&str) -> Option<String>) -> Credentials {
        let read = |env: &Option<String>| {
            env.as_deref()
                .and_then(&lookup)
                .filter(|v| !v.is_empty())
                .map(|v| SecretString::new(v.into()))
        };
        Credentials {
            session_cookie: read(&self.session_cookie_env),
            csrf_token: read(&self.csrf_token_env),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Config {
    /// Backend origin, without a trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default)]
    pub auth: AuthCfg,
    /// HTTP client configuration (timeouts, pooling). Missing → defaults.
    #[serde(default)]
    pub http: HttpCfg,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth: AuthCfg::default(),
            http: HttpCfg::default(),
        }
    }
}

impl Config {
    /// Load a Config from a file path (JSON or TOML by extension). If the
    /// extension is missing or unrecognized, try JSON first, then TOML.
    pub fn from_path<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path)?;
        let s = std::str::from_utf8(&bytes)
            .map_err(|e| ChatStreamError::Config(format!("{}: {e}", path.display())))?;
        let parse_err = |e: String| ChatStreamError::Config(format!("{}: {e}", path.display()));
        let mut cfg: Self = match path.extension().and_then(|e| e.to_str()) {
            Some("json") => serde_json::from_str::<Self>(s).map_err(|e| parse_err(e.to_string()))?,
            Some("toml") => toml::from_str::<Self>(s).map_err(|e| parse_err(e.to_string()))?,
            _ => serde_json::from_str::<Self>(s)
                .or_else(|_| toml::from_str::<Self>(s))
                .map_err(|e| parse_err(e.to_string()))?,
        };
        cfg.base_url = trim_base(&cfg.base_url);
        cfg.validate()?;
        Ok(cfg)
    }

    /// Apply `CHATSTREAM_API_URL` if it is set.
    pub fn with_env_overrides(self) -> CoreResult<Self> {
        self.with_overrides_from(|name| std::env::var(name).ok())
    }

    pub fn with_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> CoreResult<Self> {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            self.base_url = trim_base(&url);
        }
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> CoreResult<()> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ChatStreamError::Config(format!(
                "base_url must be an http(s) URL, got {:?}",
                self.base_url
            )));
        }
        Ok(())
    }
}

fn trim_base(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
