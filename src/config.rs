use std::time::Duration;

use anyhow::{Context, Result};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Connection settings for the device client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Root of the device's web server; API paths are appended to it.
    pub base_url: String,
    /// Cadence of full-state refreshes.
    pub poll_interval: Duration,
    /// Transport defaults apply when unset.
    pub connect_timeout: Option<Duration>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            connect_timeout: None,
        }
    }
}

impl ClientConfig {
    /// Reads `SMARTSTUDY_URL` and `SMARTSTUDY_POLL_SECS`, falling back to defaults.
    /// Only the headless runner uses this; library callers build the struct directly.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(url) = lookup("SMARTSTUDY_URL").filter(|value| !value.trim().is_empty()) {
            config.base_url = url.trim().to_string();
        }

        if let Some(raw) = lookup("SMARTSTUDY_POLL_SECS") {
            let secs: u64 = raw
                .trim()
                .parse()
                .with_context(|| format!("SMARTSTUDY_POLL_SECS must be whole seconds, got '{raw}'"))?;
            anyhow::ensure!(secs > 0, "SMARTSTUDY_POLL_SECS must be greater than zero");
            config.poll_interval = Duration::from_secs(secs);
        }

        Ok(config)
    }
}
