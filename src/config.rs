//! Configuration management for Querygate
//!
//! Loads configuration from environment variables (with `.env` support).

use crate::{Error, Result};
use secrecy::{ExposeSecret, SecretString};
use url::Url;

/// How gateway routes are assembled.
///
/// Manual mode mounts only the gateway's own routes. Auto mode also mounts
/// any auxiliary routes the runner wants registered on the same app.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RouteMode {
    /// Only the gateway's own routes (`/` and `/predict`) are mounted
    #[default]
    Manual,
    /// Additionally mount auxiliary routes exposed by the runner
    Auto,
}

impl std::str::FromStr for RouteMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "manual" => Ok(RouteMode::Manual),
            "auto" => Ok(RouteMode::Auto),
            _ => Err(Error::Config(format!(
                "Invalid route mode: {}. Valid options: manual, auto",
                s
            ))),
        }
    }
}

impl std::fmt::Display for RouteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteMode::Manual => write!(f, "manual"),
            RouteMode::Auto => write!(f, "auto"),
        }
    }
}

/// Session identity policy for queries hitting the runtime.
///
/// `Shared` reuses one fixed (user id, session id) pair for every caller, so
/// all requests land in a single conversation. `PerRequest` derives a fresh
/// session id per request under the configured user id, trading conversational
/// continuity for caller isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPolicy {
    /// One fixed session shared by all callers for the process lifetime
    #[default]
    Shared,
    /// A fresh session id per incoming request
    PerRequest,
}

impl std::str::FromStr for SessionPolicy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "shared" => Ok(SessionPolicy::Shared),
            "per-request" | "per_request" => Ok(SessionPolicy::PerRequest),
            _ => Err(Error::Config(format!(
                "Invalid session policy: {}. Valid options: shared, per-request",
                s
            ))),
        }
    }
}

impl std::fmt::Display for SessionPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionPolicy::Shared => write!(f, "shared"),
            SessionPolicy::PerRequest => write!(f, "per-request"),
        }
    }
}

/// Agent runtime (collaborator) configuration
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Base URL of the agent runtime's API
    pub base_url: Url,
    /// API key for the agent runtime
    pub api_key: SecretString,
    /// Application name scoped into the runtime's session store
    pub app_name: String,
    /// Connection string for the runtime's persistent session store,
    /// forwarded verbatim; the store itself is the runtime's responsibility
    pub session_service_uri: Option<String>,
    /// Request timeout in seconds for runtime calls
    pub timeout_secs: u64,
}

/// Session identity configuration
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Identity policy
    pub policy: SessionPolicy,
    /// User id passed to the runtime
    pub user_id: String,
    /// Session id passed to the runtime under the shared policy
    pub session_id: String,
}

/// HTTP surface configuration
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// CORS allow-list; a literal "*" entry means fully permissive
    pub allowed_origins: Vec<String>,
    /// Route assembly mode
    pub route_mode: RouteMode,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Log level filter
    pub level: String,
    /// Log format (pretty, json)
    pub format: String,
}

/// Main application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Agent runtime settings
    pub runner: RunnerConfig,
    /// Session identity settings
    pub session: SessionConfig,
    /// HTTP surface settings
    pub http: HttpConfig,
    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Ok(Config {
            runner: RunnerConfig {
                base_url: std::env::var("AGENT_BASE_URL")
                    .unwrap_or_else(|_| "http://127.0.0.1:8000".to_string())
                    .parse()
                    .map_err(|e| Error::Config(format!("Invalid AGENT_BASE_URL: {}", e)))?,
                api_key: SecretString::from(std::env::var("AGENT_API_KEY")?),
                app_name: std::env::var("AGENT_APP_NAME")
                    .unwrap_or_else(|_| crate::NAME.to_string()),
                session_service_uri: std::env::var("SESSION_SERVICE_URI").ok(),
                timeout_secs: std::env::var("AGENT_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "120".to_string())
                    .parse()
                    .unwrap_or(120),
            },
            session: SessionConfig {
                policy: std::env::var("SESSION_POLICY")
                    .unwrap_or_else(|_| "shared".to_string())
                    .parse()?,
                user_id: std::env::var("SESSION_USER_ID")
                    .unwrap_or_else(|_| "gateway-user".to_string()),
                session_id: std::env::var("SESSION_ID")
                    .unwrap_or_else(|_| "gateway-session-001".to_string()),
            },
            http: HttpConfig {
                allowed_origins: std::env::var("ALLOWED_ORIGINS")
                    .unwrap_or_else(|_| "*".to_string())
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                route_mode: std::env::var("ROUTE_MODE")
                    .unwrap_or_else(|_| "manual".to_string())
                    .parse()?,
            },
            log: LogConfig {
                level: std::env::var("RUST_LOG")
                    .unwrap_or_else(|_| "info,querygate=debug".to_string()),
                format: std::env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string()),
            },
        })
    }

    /// Create a minimal config for tests
    pub fn minimal() -> Self {
        Config {
            runner: RunnerConfig {
                base_url: "http://127.0.0.1:8000"
                    .parse()
                    .expect("static URL is valid"),
                api_key: SecretString::from(""),
                app_name: crate::NAME.to_string(),
                session_service_uri: None,
                timeout_secs: 120,
            },
            session: SessionConfig {
                policy: SessionPolicy::Shared,
                user_id: "gateway-user".to_string(),
                session_id: "gateway-session-001".to_string(),
            },
            http: HttpConfig {
                allowed_origins: vec!["*".to_string()],
                route_mode: RouteMode::Manual,
            },
            log: LogConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }

    /// Validate that all required configuration is present
    pub fn validate(&self) -> Result<()> {
        if self.runner.api_key.expose_secret().is_empty() {
            return Err(Error::Config("AGENT_API_KEY is required".to_string()));
        }
        if self.runner.app_name.is_empty() {
            return Err(Error::Config("AGENT_APP_NAME must not be empty".to_string()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_mode_parsing() {
        assert_eq!("manual".parse::<RouteMode>().unwrap(), RouteMode::Manual);
        assert_eq!("auto".parse::<RouteMode>().unwrap(), RouteMode::Auto);
        assert_eq!("AUTO".parse::<RouteMode>().unwrap(), RouteMode::Auto);
        assert!("webui".parse::<RouteMode>().is_err());
    }

    #[test]
    fn test_session_policy_parsing() {
        assert_eq!(
            "shared".parse::<SessionPolicy>().unwrap(),
            SessionPolicy::Shared
        );
        assert_eq!(
            "per-request".parse::<SessionPolicy>().unwrap(),
            SessionPolicy::PerRequest
        );
        assert_eq!(
            "per_request".parse::<SessionPolicy>().unwrap(),
            SessionPolicy::PerRequest
        );
        assert!("sticky".parse::<SessionPolicy>().is_err());
    }

    #[test]
    fn test_minimal_config() {
        let config = Config::minimal();
        assert!(config.validate().is_err()); // Should fail validation
    }
}
