use crate::extractor::Extractor;
use crate::scan::Probe;
use gleaner_core::{ExtractError, PopulatedRecord};
use tracing::{debug, warn};

/// Follows a feed whose newest record sits at position 1.
///
/// Each [`FeedWatcher::poll`] reports the records that appeared above the top
/// record seen by the previous poll.
#[derive(Clone, Debug)]
pub struct FeedWatcher {
    record: String,
    last_seen: Option<PopulatedRecord>,
}

impl FeedWatcher {
    pub fn new(record: impl Into<String>) -> Self {
        Self { record: record.into(), last_seen: None }
    }

    pub fn record(&self) -> &str {
        &self.record
    }

    pub fn last_seen(&self) -> Option<&PopulatedRecord> {
        self.last_seen.as_ref()
    }

    /// New records since the previous poll, newest first.
    ///
    /// The first poll returns the current top record. An empty feed yields an
    /// empty list rather than an error. When the previous top is not within the
    /// first `lookahead` positions, every record in that window is reported.
    pub fn poll(&mut self, extractor: &Extractor) -> Result<Vec<PopulatedRecord>, ExtractError> {
        let Some(last_seen) = self.last_seen.as_ref() else {
            return match extractor.enumerate(&self.record, 0) {
                Ok(top) => {
                    debug!(record = self.record.as_str(), %top, "feed top recorded");
                    self.last_seen = Some(top.clone());
                    Ok(vec![top])
                }
                Err(err) if err.is_not_found() => Ok(Vec::new()),
                Err(err) => Err(err),
            };
        };

        // Only the first `lookahead` positions are examined.
        let window = extractor.settings().lookahead;
        let mut fresh = Vec::new();
        let mut reached = false;
        for probe in extractor.scan(&self.record)?.take(window) {
            match probe? {
                Probe::Hit { record, .. } if &record == last_seen => {
                    reached = true;
                    break;
                }
                Probe::Hit { record, .. } => fresh.push(record),
                Probe::Absent { .. } => {}
            }
        }
        if !reached {
            warn!(
                record = self.record.as_str(),
                reported = fresh.len(),
                "previously seen record is gone from the feed"
            );
        }
        if let Some(top) = fresh.first() {
            self.last_seen = Some(top.clone());
        }
        debug!(record = self.record.as_str(), new = fresh.len(), "feed polled");
        Ok(fresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{extractor_for, feed_document, feed_tree, item_type};
    use gleaner_core::Locator;
    use gleaner_provider_document::ElementSpec;
    use rstest::rstest;
    use std::sync::Arc;

    fn titles(records: &[PopulatedRecord]) -> Vec<&str> {
        records.iter().map(|record| record.text("title").unwrap()).collect()
    }

    fn push_top(tree: &gleaner_provider_document::DocumentTree, title: &str) {
        tree.update(|doc| {
            let feed = doc.select(&Locator::new("/feed")).unwrap()[0];
            doc.insert_spec(feed, 0, &ElementSpec::new("item").with_child(ElementSpec::new("title").with_text(title)));
        });
    }

    #[rstest]
    fn first_poll_reports_the_top_record() {
        let extractor = extractor_for(Arc::new(feed_tree(&["C", "B", "A"])), [item_type()]);
        let mut watcher = FeedWatcher::new("Item");
        assert_eq!(titles(&watcher.poll(&extractor).unwrap()), vec!["C"]);
        assert!(watcher.poll(&extractor).unwrap().is_empty());
        assert_eq!(watcher.last_seen().unwrap().text("title").unwrap(), "C");
    }

    #[rstest]
    fn later_polls_report_new_records_newest_first() {
        let tree = Arc::new(feed_tree(&["B", "A"]));
        let extractor = extractor_for(tree.clone(), [item_type()]);
        let mut watcher = FeedWatcher::new("Item");
        watcher.poll(&extractor).unwrap();

        push_top(&tree, "C");
        push_top(&tree, "D");
        assert_eq!(titles(&watcher.poll(&extractor).unwrap()), vec!["D", "C"]);

        push_top(&tree, "E");
        assert_eq!(titles(&watcher.poll(&extractor).unwrap()), vec!["E"]);
    }

    #[rstest]
    fn navigation_does_not_replay_seen_records() {
        let tree = Arc::new(feed_tree(&["B", "A"]));
        let extractor = extractor_for(tree.clone(), [item_type()]);
        let mut watcher = FeedWatcher::new("Item");
        watcher.poll(&extractor).unwrap();
        tree.navigate(feed_document(&["C", "B", "A"]));
        assert_eq!(titles(&watcher.poll(&extractor).unwrap()), vec!["C"]);
    }

    #[rstest]
    fn vanished_anchor_reports_the_whole_window() {
        let tree = Arc::new(feed_tree(&["B", "A"]));
        let extractor = extractor_for(tree.clone(), [item_type()]);
        let mut watcher = FeedWatcher::new("Item");
        watcher.poll(&extractor).unwrap();
        tree.navigate(feed_document(&["Z", "Y"]));
        assert_eq!(titles(&watcher.poll(&extractor).unwrap()), vec!["Z", "Y"]);
        assert_eq!(watcher.last_seen().unwrap().text("title").unwrap(), "Z");
    }

    #[rstest]
    fn vanished_anchor_reports_at_most_the_lookahead_window() {
        let tree = Arc::new(feed_tree(&["B", "A"]));
        let extractor = extractor_for(tree.clone(), [item_type()]);
        let mut watcher = FeedWatcher::new("Item");
        watcher.poll(&extractor).unwrap();

        let titles_after: Vec<String> = (1..=12).map(|n| format!("N{n}")).collect();
        let titles_after: Vec<&str> = titles_after.iter().map(String::as_str).collect();
        tree.navigate(feed_document(&titles_after));
        assert_eq!(titles(&watcher.poll(&extractor).unwrap()), vec!["N1", "N2", "N3"]);
        assert_eq!(watcher.last_seen().unwrap().text("title").unwrap(), "N1");
    }

    #[rstest]
    fn empty_feed_yields_nothing() {
        let extractor = extractor_for(Arc::new(feed_tree(&[])), [item_type()]);
        let mut watcher = FeedWatcher::new("Item");
        assert!(watcher.poll(&extractor).unwrap().is_empty());
        assert!(watcher.last_seen().is_none());
    }
}
