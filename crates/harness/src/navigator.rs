//! Page loading and ready-state detection

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::assertion::find_laid_out;
use crate::engine::Page;
use crate::error::{HarnessError, HarnessResult};
use crate::scenario::ReadyCondition;
use crate::wait::Poller;

/// Proof that a page reached its ready condition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReadyHandle {
    pub url: String,
    pub elapsed_ms: u64,
}

/// Drives a page to a target path and waits until it is ready
#[derive(Debug, Clone)]
pub struct Navigator {
    base_url: String,
    poll_interval: Duration,
}

impl Navigator {
    pub fn new(base_url: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            base_url: base_url.into(),
            poll_interval,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a path relative to the base URL
    pub fn url_for(&self, target_path: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if target_path.starts_with('/') {
            format!("{}{}", base, target_path)
        } else {
            format!("{}/{}", base, target_path)
        }
    }

    /// Navigate `page` to `target_path` and block until `ready` holds.
    ///
    /// The whole load, including network quiescence, shares one timeout.
    pub async fn load(
        &self,
        page: &mut dyn Page,
        target_path: &str,
        ready: &ReadyCondition,
    ) -> HarnessResult<ReadyHandle> {
        let timeout_ms = ready.effective_timeout_ms();
        let timeout = Duration::from_millis(timeout_ms);
        let url = self.url_for(target_path);
        let not_ready = || HarnessError::NavigationTimeout {
            path: target_path.to_string(),
            timeout_ms,
        };

        let mut poller = Poller::new(timeout, self.poll_interval);
        debug!("Navigating to {} (ready within {} ms)", url, timeout_ms);

        match tokio::time::timeout(timeout, page.goto(&url, timeout)).await {
            Err(_) | Ok(Err(HarnessError::EngineTimeout(_))) => return Err(not_ready()),
            Ok(result) => result?,
        }

        if ready.network_idle {
            let remaining = poller.remaining();
            match tokio::time::timeout(remaining, page.wait_for_network_idle(remaining)).await {
                Err(_) | Ok(Err(HarnessError::EngineTimeout(_))) => return Err(not_ready()),
                Ok(result) => result?,
            }
            debug!("Network idle on {}", url);
        }

        // Engine requests inside the poll carry their own, longer timeouts
        let remaining = poller.remaining();
        match tokio::time::timeout(remaining, wait_for_heading(page, ready, &mut poller)).await {
            Ok(Ok(true)) => {}
            Ok(Err(e)) => return Err(e),
            Ok(Ok(false)) | Err(_) => {
                debug!(
                    "{} never showed {} after {} polls",
                    url,
                    ready.heading,
                    poller.attempts()
                );
                return Err(not_ready());
            }
        }

        let elapsed_ms = poller.elapsed().as_millis() as u64;
        debug!("{} ready after {} ms", url, elapsed_ms);
        Ok(ReadyHandle { url, elapsed_ms })
    }
}

/// Poll until the ready heading is laid out. `false` once the poller expires.
async fn wait_for_heading(
    page: &mut dyn Page,
    ready: &ReadyCondition,
    poller: &mut Poller,
) -> HarnessResult<bool> {
    loop {
        if find_laid_out(page, &ready.heading, false).await?.is_some() {
            return Ok(true);
        }
        if !poller.tick().await {
            return Ok(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_for_joins_without_double_slash() {
        let nav = Navigator::new("https://maugx3.github.io/ai-tools/", Duration::from_millis(10));
        assert_eq!(
            nav.url_for("/docs/guides/information-sharing-workflow"),
            "https://maugx3.github.io/ai-tools/docs/guides/information-sharing-workflow"
        );
        assert_eq!(nav.url_for("/"), "https://maugx3.github.io/ai-tools/");
    }

    #[test]
    fn test_url_for_adds_missing_slash() {
        let nav = Navigator::new("http://127.0.0.1:4000", Duration::from_millis(10));
        assert_eq!(nav.url_for("prompts/"), "http://127.0.0.1:4000/prompts/");
    }
}
