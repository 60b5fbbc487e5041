use std::time::Duration;

use seating_client::poller::DEFAULT_POLL_INTERVAL;
use seating_core::geometry::{Size, Viewport};
use seating_core::interaction::PreviewLayout;
use seating_core::session::SessionConfig;
use validator::Validate;

/// Errors raised while loading [`ViewerConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} environment variable is required")]
    Missing(&'static str),

    #[error("{var} has an invalid value: {value:?}")]
    Invalid { var: &'static str, value: String },

    #[error("Invalid configuration: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

/// Viewer configuration loaded from environment variables.
#[derive(Debug, Clone, Validate)]
pub struct ViewerConfig {
    /// Site root the seating endpoints live under.
    #[validate(url)]
    pub base_url: String,
    #[validate(range(min = 1))]
    pub event_id: i64,
    pub csrf_token: Option<String>,
    pub session_cookie: Option<String>,
    /// Whether the caller may read the revision log and publish.
    pub is_publisher: bool,
    /// The logged-in user, highlighted in the plan.
    pub user_id: Option<i64>,
    #[validate(range(min = 1, max = 3600))]
    pub poll_interval_secs: u64,
    #[validate(range(min = 1, max = 600))]
    pub request_timeout_secs: u64,
    /// Use the in-memory sample store instead of the HTTP API.
    pub demo: bool,
}

impl ViewerConfig {
    /// Load configuration from environment variables.
    ///
    /// | Env Var                        | Default                 |
    /// |--------------------------------|-------------------------|
    /// | `SEATING_BASE_URL`             | `http://localhost:8000` |
    /// | `SEATING_EVENT_ID`             | required (`1` in demo)  |
    /// | `SEATING_CSRF_TOKEN`           | none                    |
    /// | `SEATING_SESSION_COOKIE`       | none                    |
    /// | `SEATING_PUBLISHER`            | `false`                 |
    /// | `SEATING_USER_ID`              | none                    |
    /// | `SEATING_POLL_INTERVAL_SECS`   | `5`                     |
    /// | `SEATING_REQUEST_TIMEOUT_SECS` | `30`                    |
    /// | `SEATING_DEMO`                 | `false`                 |
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Load from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let demo = parse_flag("SEATING_DEMO", var("SEATING_DEMO"))?;
        let base_url = var("SEATING_BASE_URL").unwrap_or_else(|| "http://localhost:8000".into());

        let event_id = match var("SEATING_EVENT_ID") {
            Some(raw) => parse_number("SEATING_EVENT_ID", raw)?,
            None if demo => 1,
            None => return Err(ConfigError::Missing("SEATING_EVENT_ID")),
        };
        let user_id = var("SEATING_USER_ID")
            .map(|raw| parse_number("SEATING_USER_ID", raw))
            .transpose()?;
        let poll_interval_secs = var("SEATING_POLL_INTERVAL_SECS")
            .map(|raw| parse_number("SEATING_POLL_INTERVAL_SECS", raw))
            .transpose()?
            .unwrap_or(DEFAULT_POLL_INTERVAL.as_secs());
        let request_timeout_secs = var("SEATING_REQUEST_TIMEOUT_SECS")
            .map(|raw| parse_number("SEATING_REQUEST_TIMEOUT_SECS", raw))
            .transpose()?
            .unwrap_or(30);

        let config = Self {
            base_url,
            event_id,
            csrf_token: var("SEATING_CSRF_TOKEN"),
            session_cookie: var("SEATING_SESSION_COOKIE"),
            is_publisher: parse_flag("SEATING_PUBLISHER", var("SEATING_PUBLISHER"))?,
            user_id,
            poll_interval_secs,
            request_timeout_secs,
            demo,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Session settings. A terminal has no real popup or viewport, so a
    /// nominal 80x24 cell layout is used for preview placement.
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            logged_in_user: self.user_id,
            is_publisher: self.is_publisher,
            layout: PreviewLayout {
                popup: Size::new(20.0, 1.0),
                viewport: Viewport::new(80.0, 24.0, 0.0),
            },
        }
    }
}

fn parse_flag(var: &'static str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid { var, value: raw }),
    }
}

fn parse_number<T: std::str::FromStr>(var: &'static str, raw: String) -> Result<T, ConfigError> {
    raw.parse()
        .map_err(|_| ConfigError::Invalid { var, value: raw })
}
