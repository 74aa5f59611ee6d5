//! Position-by-position probing of indexed record types.

use crate::extractor::Extractor;
use gleaner_core::{ConfigurationError, ExtractError, Locator, PopulatedRecord, RecordType};
use std::sync::Arc;
use tracing::{debug, trace};

/// Outcome of populating one physical position.
#[derive(Clone, Debug, PartialEq)]
pub enum Probe {
    Hit { position: usize, record: PopulatedRecord },
    Absent { position: usize },
}

impl Probe {
    pub fn position(&self) -> usize {
        match self {
            Probe::Hit { position, .. } | Probe::Absent { position } => *position,
        }
    }

    pub fn record(&self) -> Option<&PopulatedRecord> {
        match self {
            Probe::Hit { record, .. } => Some(record),
            Probe::Absent { .. } => None,
        }
    }

    pub fn into_record(self) -> Option<PopulatedRecord> {
        match self {
            Probe::Hit { record, .. } => Some(record),
            Probe::Absent { .. } => None,
        }
    }
}

/// Endless iterator over positions 1, 2, 3, ... of a record type's root.
///
/// Positions where population fails with a not-found error are reported as
/// [`Probe::Absent`]; every other failure is yielded as an `Err` item. The
/// iterator never ends on its own.
pub struct Scan<'e> {
    extractor: &'e Extractor,
    record_type: Arc<RecordType>,
    template: Locator,
    position: usize,
}

impl Iterator for Scan<'_> {
    type Item = Result<Probe, ExtractError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.position += 1;
        let position = self.position;
        let base = self.template.with_index(position);
        let probe_timeout = self.extractor.settings().probe_timeout;
        Some(match self.extractor.populate_type(&self.record_type, &base, probe_timeout) {
            Ok(record) => Ok(Probe::Hit { position, record }),
            Err(err) if err.is_not_found() => {
                trace!(record = self.record_type.name(), position, %err, "position absent");
                Ok(Probe::Absent { position })
            }
            Err(err) => Err(err),
        })
    }
}

/// Consecutive positions without a useful record.
struct Misses {
    record: String,
    count: usize,
    lookahead: usize,
}

impl Misses {
    fn new(record: &str, lookahead: usize) -> Self {
        Self { record: record.to_owned(), count: 0, lookahead }
    }

    fn reset(&mut self) {
        self.count = 0;
    }

    fn miss(&mut self, position: usize) -> Result<(), ExtractError> {
        self.count += 1;
        if self.count >= self.lookahead {
            debug!(record = self.record.as_str(), position, lookahead = self.lookahead, "scan exhausted");
            return Err(self.exhausted(position));
        }
        Ok(())
    }

    fn exhausted(&self, position: usize) -> ExtractError {
        ExtractError::ScanExhausted {
            record: self.record.clone(),
            lookahead: self.lookahead,
            last_position: position,
        }
    }
}

impl Extractor {
    /// Probes the positions of `name`, whose root must contain `{index}`.
    pub fn scan(&self, name: &str) -> Result<Scan<'_>, ExtractError> {
        let record_type = self.record_type(name)?;
        let root = record_type.root_locator()?;
        if !root.has_index_placeholder() {
            return Err(ConfigurationError::MissingIndexPlaceholder {
                record: name.to_owned(),
                locator: root.as_str().to_owned(),
            }
            .into());
        }
        let template = root.clone();
        Ok(Scan { extractor: self, record_type, template, position: 0 })
    }

    /// The record at `index` (0-based) among the present records of `name`.
    pub fn enumerate(&self, name: &str, index: usize) -> Result<PopulatedRecord, ExtractError> {
        self.enumerate_matching(name, index, |_| true)
    }

    /// The record at `index` (0-based) among the records of `name` accepted by
    /// `predicate`.
    ///
    /// Fails with [`ExtractError::ScanExhausted`] once `lookahead` consecutive
    /// positions yield nothing acceptable.
    pub fn enumerate_matching<P>(
        &self,
        name: &str,
        index: usize,
        mut predicate: P,
    ) -> Result<PopulatedRecord, ExtractError>
    where
        P: FnMut(&PopulatedRecord) -> bool,
    {
        let mut remaining = index;
        let mut misses = Misses::new(name, self.settings().lookahead);
        let mut last_position = 0;
        for probe in self.scan(name)? {
            let probe = probe?;
            last_position = probe.position();
            match probe {
                Probe::Hit { record, .. } if predicate(&record) => {
                    misses.reset();
                    if remaining == 0 {
                        return Ok(record);
                    }
                    remaining -= 1;
                }
                _ => misses.miss(last_position)?,
            }
        }
        Err(misses.exhausted(last_position))
    }

    /// The record `steps` positions after the one structurally equal to `anchor`.
    ///
    /// Records equal to `anchor` further down are not counted but do count
    /// towards the lookahead, so the result always differs from the anchor
    /// unless `steps == 0`, which returns the freshly populated anchor itself.
    pub fn find_after(
        &self,
        name: &str,
        anchor: &PopulatedRecord,
        steps: usize,
    ) -> Result<PopulatedRecord, ExtractError> {
        anchor.ensure_type(name)?;
        self.find_after_by(name, steps, |record| Ok(record == anchor))
    }

    pub(crate) fn find_after_by<F>(
        &self,
        name: &str,
        steps: usize,
        mut is_anchor: F,
    ) -> Result<PopulatedRecord, ExtractError>
    where
        F: FnMut(&PopulatedRecord) -> Result<bool, ExtractError>,
    {
        let mut remaining = steps;
        let mut found = false;
        let mut misses = Misses::new(name, self.settings().lookahead);
        let mut last_position = 0;
        for probe in self.scan(name)? {
            let probe = probe?;
            last_position = probe.position();
            let Probe::Hit { record, position } = probe else {
                misses.miss(last_position)?;
                continue;
            };
            if !found {
                misses.reset();
                if is_anchor(&record)? {
                    debug!(record = name, position, "anchor located");
                    found = true;
                    if remaining == 0 {
                        return Ok(record);
                    }
                }
                continue;
            }
            if is_anchor(&record)? {
                trace!(record = name, position, "duplicate of the anchor skipped");
                misses.miss(position)?;
                continue;
            }
            misses.reset();
            remaining -= 1;
            if remaining == 0 {
                return Ok(record);
            }
        }
        Err(misses.exhausted(last_position))
    }
}
