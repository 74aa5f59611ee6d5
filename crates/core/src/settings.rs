use std::time::Duration;

/// Timing and lookahead knobs of an extractor.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExtractSettings {
    /// Wait for the base node of a directly populated record.
    pub ready_timeout: Duration,
    /// Wait for each scalar field node.
    pub field_timeout: Duration,
    /// Wait for the base node at each scan position.
    pub probe_timeout: Duration,
    pub poll_interval: Duration,
    /// Consecutive empty positions after which a scan gives up.
    pub lookahead: usize,
}

impl Default for ExtractSettings {
    fn default() -> Self {
        Self {
            ready_timeout: Duration::from_secs(15),
            field_timeout: Duration::from_secs(10),
            probe_timeout: Duration::from_secs(1),
            poll_interval: Duration::from_millis(250),
            lookahead: 30,
        }
    }
}

impl ExtractSettings {
    pub fn with_overrides(mut self, overrides: &ExtractOverrides) -> Self {
        overrides.apply(&mut self);
        self
    }
}

/// Partial settings layered on top of [`ExtractSettings`].
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub struct ExtractOverrides {
    pub ready_timeout: Option<Duration>,
    pub field_timeout: Option<Duration>,
    pub probe_timeout: Option<Duration>,
    pub poll_interval: Option<Duration>,
    pub lookahead: Option<usize>,
}

impl ExtractOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ready_timeout(mut self, timeout: Duration) -> Self {
        self.ready_timeout = Some(timeout);
        self
    }

    pub fn field_timeout(mut self, timeout: Duration) -> Self {
        self.field_timeout = Some(timeout);
        self
    }

    pub fn probe_timeout(mut self, timeout: Duration) -> Self {
        self.probe_timeout = Some(timeout);
        self
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    pub fn lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = Some(lookahead);
        self
    }

    /// Values set in `other` win over the ones set here.
    pub fn merge(self, other: &ExtractOverrides) -> Self {
        Self {
            ready_timeout: other.ready_timeout.or(self.ready_timeout),
            field_timeout: other.field_timeout.or(self.field_timeout),
            probe_timeout: other.probe_timeout.or(self.probe_timeout),
            poll_interval: other.poll_interval.or(self.poll_interval),
            lookahead: other.lookahead.or(self.lookahead),
        }
    }

    pub fn apply(&self, settings: &mut ExtractSettings) {
        if let Some(timeout) = self.ready_timeout {
            settings.ready_timeout = timeout;
        }
        if let Some(timeout) = self.field_timeout {
            settings.field_timeout = timeout;
        }
        if let Some(timeout) = self.probe_timeout {
            settings.probe_timeout = timeout;
        }
        if let Some(interval) = self.poll_interval {
            settings.poll_interval = interval;
        }
        if let Some(lookahead) = self.lookahead {
            settings.lookahead = lookahead;
        }
    }
}
