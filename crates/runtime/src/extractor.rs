use gleaner_core::{
    CancelToken, ConfigurationError, ExtractError, ExtractSettings, LiveTree, Locator, PopulatedRecord,
    RecordType,
};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

type SleepFn = Arc<dyn Fn(Duration) + Send + Sync>;
type ClockFn = Arc<dyn Fn() -> Instant + Send + Sync>;

/// Populates, enumerates and walks records of registered types over a live tree.
///
/// An extractor owns its registry of record types and its settings; nothing is
/// shared between extractors.
pub struct Extractor {
    tree: Arc<dyn LiveTree>,
    settings: ExtractSettings,
    types: HashMap<String, Arc<RecordType>>,
    cancel: CancelToken,
    sleep: SleepFn,
    clock: ClockFn,
}

impl Extractor {
    pub fn new(tree: Arc<dyn LiveTree>, settings: ExtractSettings) -> Self {
        Self {
            tree,
            settings,
            types: HashMap::new(),
            cancel: CancelToken::new(),
            sleep: Arc::new(std::thread::sleep),
            clock: Arc::new(Instant::now),
        }
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Replaces the function used to pause between polls.
    pub fn with_sleep(mut self, sleep: impl Fn(Duration) + Send + Sync + 'static) -> Self {
        self.sleep = Arc::new(sleep);
        self
    }

    /// Replaces the clock that bounds waits in wall-clock time.
    pub fn with_clock(mut self, clock: impl Fn() -> Instant + Send + Sync + 'static) -> Self {
        self.clock = Arc::new(clock);
        self
    }

    pub fn tree(&self) -> &dyn LiveTree {
        self.tree.as_ref()
    }

    pub fn settings(&self) -> &ExtractSettings {
        &self.settings
    }

    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    pub(crate) fn sleep(&self, duration: Duration) {
        if duration.is_zero() {
            return;
        }
        (self.sleep)(duration);
    }

    pub(crate) fn now(&self) -> Instant {
        (self.clock)()
    }

    /// Makes `record_type` available by name, replacing an earlier registration.
    pub fn register(&mut self, record_type: impl Into<Arc<RecordType>>) -> &mut Self {
        let record_type = record_type.into();
        self.types.insert(record_type.name().to_owned(), record_type);
        self
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }

    pub fn registered_types(&self) -> impl Iterator<Item = &RecordType> {
        self.types.values().map(|record| record.as_ref())
    }

    pub fn record_type(&self, name: &str) -> Result<Arc<RecordType>, ExtractError> {
        self.types
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigurationError::UnknownType { record: name.to_owned() }.into())
    }

    pub(crate) fn lookup(&self, name: &str) -> Option<&Arc<RecordType>> {
        self.types.get(name)
    }

    /// Populates `name` at its own root locator. A `{index}` placeholder in the
    /// root addresses the first position.
    pub fn populate(&self, name: &str) -> Result<PopulatedRecord, ExtractError> {
        let record_type = self.record_type(name)?;
        let base = record_type.root_locator()?.with_index(1);
        self.populate_type(&record_type, &base, self.settings.ready_timeout)
    }

    /// Populates `name` anchored at `base` instead of its root locator.
    pub fn populate_at(&self, name: &str, base: &Locator) -> Result<PopulatedRecord, ExtractError> {
        let record_type = self.record_type(name)?;
        self.populate_type(&record_type, base, self.settings.ready_timeout)
    }
}

impl fmt::Debug for Extractor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut types: Vec<_> = self.types.keys().collect();
        types.sort();
        f.debug_struct("Extractor")
            .field("settings", &self.settings)
            .field("types", &types)
            .field("cancelled", &self.cancel.is_cancelled())
            .finish_non_exhaustive()
    }
}
