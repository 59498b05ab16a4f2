use std::path::PathBuf;
use std::time::Duration;

/// Default REST base URL, including the versioned API prefix.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/api/v1";

/// Default push-update endpoint.
pub const DEFAULT_WS_URL: &str = "ws://localhost:8080/ws/dashboard";

/// Per-request network timeout applied to every call.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST base URL without a trailing slash.
    pub base_url: String,
    /// WebSocket URL for the push-update channel.
    pub ws_url: String,
    pub request_timeout: Duration,
    /// Where the bearer token is persisted. `None` when no home directory
    /// can be determined and no override is set.
    pub token_file: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            token_file: default_token_file(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from the process environment.
    ///
    /// | Env Var                       | Default                             |
    /// |-------------------------------|-------------------------------------|
    /// | `TRIAGE_API_BASE_URL`         | `http://localhost:8080/api/v1`      |
    /// | `TRIAGE_WS_URL`               | `ws://localhost:8080/ws/dashboard`  |
    /// | `TRIAGE_REQUEST_TIMEOUT_SECS` | `30`                                |
    /// | `TRIAGE_TOKEN_FILE`           | `~/.triage/auth_token`              |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let base_url = lookup("TRIAGE_API_BASE_URL")
            .map(|v| normalize_base_url(&v))
            .unwrap_or(defaults.base_url);

        let ws_url = lookup("TRIAGE_WS_URL").unwrap_or(defaults.ws_url);

        let request_timeout = match lookup("TRIAGE_REQUEST_TIMEOUT_SECS") {
            Some(raw) => Duration::from_secs(parse_var("TRIAGE_REQUEST_TIMEOUT_SECS", &raw)?),
            None => defaults.request_timeout,
        };

        let token_file = lookup("TRIAGE_TOKEN_FILE")
            .map(PathBuf::from)
            .or(defaults.token_file);

        Ok(Self {
            base_url,
            ws_url,
            request_timeout,
            token_file,
        })
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = normalize_base_url(base_url);
        self
    }
}

/// `~/.triage/auth_token`, if a home directory exists.
pub fn default_token_file() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".triage").join("auth_token"))
}

fn normalize_base_url(raw: &str) -> String {
    raw.trim().trim_end_matches('/').to_string()
}

/// Parse a numeric environment value, naming the variable on failure.
pub fn parse_var<T: std::str::FromStr>(var: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        var,
        value: raw.to_string(),
    })
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },
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
        let config = ClientConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.ws_url, DEFAULT_WS_URL);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn overrides_are_applied_and_trailing_slash_trimmed() {
        let config = ClientConfig::from_lookup(lookup(&[
            ("TRIAGE_API_BASE_URL", "https://efficiency.example.com/api/v1/"),
            ("TRIAGE_REQUEST_TIMEOUT_SECS", "5"),
            ("TRIAGE_TOKEN_FILE", "/tmp/token"),
        ]))
        .unwrap();
        assert_eq!(config.base_url, "https://efficiency.example.com/api/v1");
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert_eq!(config.token_file, Some(PathBuf::from("/tmp/token")));
    }

    #[test]
    fn invalid_timeout_is_reported() {
        let err = ClientConfig::from_lookup(lookup(&[("TRIAGE_REQUEST_TIMEOUT_SECS", "soon")]))
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                var: "TRIAGE_REQUEST_TIMEOUT_SECS",
                ..
            }
        ));
    }
}
