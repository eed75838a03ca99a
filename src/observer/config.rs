use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the browser hosting the watched page
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserConfig {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// Wait time after page load before installing the observer, in milliseconds (default: 2000)
    pub wait_after_load_ms: u64,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Extra command-line switches passed to Chrome
    pub extra_args: Vec<String>,
}

impl Default for BrowserConfig {
    fn default() -> Self {
        Self {
            headless: true,
            wait_after_load_ms: 2000,
            user_agent: Some(
                "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            extra_args: Vec::new(),
        }
    }
}

impl BrowserConfig {
    /// Get the wait time after load as a Duration
    pub fn wait_after_load(&self) -> Duration {
        Duration::from_millis(self.wait_after_load_ms)
    }
}
