use crate::extractor::Extractor;
use gleaner_core::{ExtractError, Locator, NodeHandle};
use std::time::Duration;
use tracing::trace;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Readiness {
    /// The locator resolves to some node.
    Present,
    /// The node is also attached and interactable.
    Ready,
}

impl Extractor {
    /// Polls the tree until `locator` resolves, or the wait budget is spent.
    ///
    /// The budget is spent by the time handed to the sleep function or by the
    /// clock, whichever is further along. An injected sleep keeps the number of
    /// probes deterministic; slow tree calls still end the wait on time.
    pub(crate) fn resolve(
        &self,
        locator: &Locator,
        timeout: Duration,
        readiness: Readiness,
    ) -> Result<NodeHandle, ExtractError> {
        let start = self.now();
        let mut slept = Duration::ZERO;
        loop {
            self.check_cancelled()?;
            if let Some(handle) = self.tree().locate(locator)? {
                if readiness == Readiness::Present || self.tree().is_ready(&handle)? {
                    return Ok(handle);
                }
                trace!(%locator, %handle, "node present but not ready");
            }
            let waited = slept.max(self.now().saturating_duration_since(start));
            if waited >= timeout {
                return Err(ExtractError::NotFound { locator: locator.clone(), waited });
            }
            let pause = self.settings().poll_interval.min(timeout - waited).max(Duration::from_millis(1));
            self.check_cancelled()?;
            self.sleep(pause);
            slept += pause;
        }
    }

    pub(crate) fn check_cancelled(&self) -> Result<(), ExtractError> {
        if self.cancel_token().is_cancelled() { Err(ExtractError::Cancelled) } else { Ok(()) }
    }
}
