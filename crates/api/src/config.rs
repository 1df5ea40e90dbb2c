use courier_core::env::parse_or;
use courier_core::error::CoreError;
use courier_queue::config::MAX_WAIT_TIMEOUT_MS;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 3000,
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default   |
    /// |------------------------|-----------|
    /// | `HOST`                 | `0.0.0.0` |
    /// | `PORT`                 | `3000`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`      |
    pub fn from_env() -> Result<Self, CoreError> {
        let defaults = Self::default();

        let host = std::env::var("HOST").unwrap_or(defaults.host);
        let port = parse_or("PORT", defaults.port)?;
        let request_timeout_secs = parse_or("REQUEST_TIMEOUT_SECS", defaults.request_timeout_secs)?;

        let config = Self {
            host,
            port,
            request_timeout_secs,
        };
        config.validate()?;
        Ok(config)
    }

    /// The request timeout must leave room for the longest allowed wait,
    /// otherwise a legal wait comes back as a 408 from the middleware.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.request_timeout_secs.saturating_mul(1000) <= MAX_WAIT_TIMEOUT_MS {
            return Err(CoreError::Validation(format!(
                "REQUEST_TIMEOUT_SECS must exceed the maximum wait of {MAX_WAIT_TIMEOUT_MS}ms"
            )));
        }
        Ok(())
    }
}
