use std::env;
use std::fmt;
use std::time::Duration;

use crate::types::State;

/// Deployment environment; supplies the default root prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    /// Anything other than `production` is treated as development.
    pub fn parse(s: &str) -> Environment {
        if s.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Engine configuration supplied by the embedding host.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Key prefix inside the bucket; empty means the backend root.
    pub root: String,
    /// Versions retained per live key; non-positive means unlimited.
    pub max_versions: i32,
    /// State assumed when a caller supplies none.
    pub default_state: State,
    /// Per-delivery webhook POST timeout.
    pub webhook_timeout: Duration,
    /// Overall budget for one event's fan-out.
    pub webhook_dispatch_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            max_versions: 10,
            default_state: State::Live,
            webhook_timeout: Duration::from_secs(10),
            webhook_dispatch_timeout: Duration::from_secs(30),
        }
    }
}

impl EngineConfig {
    /// Build the configuration from environment variables.
    ///
    /// `S3_ROOT` overrides the root; otherwise the `ENVIRONMENT` name is
    /// used. `MAX_VERSIONS` accepts a number or `all` for unlimited.
    pub fn from_env() -> Self {
        let environment = Environment::parse(&env::var("ENVIRONMENT").unwrap_or_default());
        let root = env::var("S3_ROOT").unwrap_or_else(|_| environment.as_str().to_string());

        let max_versions = match env::var("MAX_VERSIONS") {
            Ok(v) if v.eq_ignore_ascii_case("all") => -1,
            Ok(v) => v.parse().unwrap_or(10),
            Err(_) => 10,
        };

        Self {
            root,
            max_versions,
            webhook_timeout: duration_from_env("WEBHOOK_TIMEOUT_SECS", 10),
            webhook_dispatch_timeout: duration_from_env("WEBHOOK_DISPATCH_TIMEOUT_SECS", 30),
            ..Self::default()
        }
    }
}

fn duration_from_env(var: &str, default_secs: u64) -> Duration {
    let secs = env::var(var)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn environment_parsing() {
        assert_eq!(Environment::parse("production"), Environment::Production);
        assert_eq!(Environment::parse("Production"), Environment::Production);
        assert_eq!(Environment::parse("development"), Environment::Development);
        assert_eq!(Environment::parse(""), Environment::Development);
        assert_eq!(Environment::parse("staging"), Environment::Development);
    }

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert_eq!(config.max_versions, 10);
        assert_eq!(config.default_state, State::Live);
        assert_eq!(config.webhook_timeout, Duration::from_secs(10));
        assert_eq!(config.webhook_dispatch_timeout, Duration::from_secs(30));
    }
}
