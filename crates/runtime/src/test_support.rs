use crate::Extractor;
use gleaner_core::{ExtractSettings, FieldBinding, RecordType};
use gleaner_provider_document::{Document, DocumentTree, ElementSpec};
use rstest::fixture;
use std::sync::Arc;
use std::time::Duration;

/// Settings small enough that a missing node fails after a handful of polls.
pub fn quick_settings() -> ExtractSettings {
    ExtractSettings {
        ready_timeout: Duration::from_millis(50),
        field_timeout: Duration::from_millis(50),
        probe_timeout: Duration::from_millis(20),
        poll_interval: Duration::from_millis(10),
        lookahead: 3,
    }
}

/// `<feed>` with one `<item>` per title. An empty title leaves the item
/// without a `<title>` child.
pub fn feed_document(titles: &[&str]) -> Document {
    let items = titles.iter().map(|title| {
        let item = ElementSpec::new("item");
        if title.is_empty() { item } else { item.with_child(ElementSpec::new("title").with_text(*title)) }
    });
    Document::from_spec(&ElementSpec::new("feed").with_children(items))
}

pub fn feed_tree(titles: &[&str]) -> DocumentTree {
    DocumentTree::new(feed_document(titles))
}

/// `Item` record: a title and the item element itself.
pub fn item_type() -> RecordType {
    RecordType::new("Item")
        .with_root("/feed/item[{index}]")
        .with_field(FieldBinding::scalar("title", "/title"))
        .with_field(FieldBinding::handle("element"))
}

/// Extractor with [`quick_settings`] whose sleeps return immediately.
pub fn extractor_for(tree: Arc<DocumentTree>, types: impl IntoIterator<Item = RecordType>) -> Extractor {
    let mut extractor = Extractor::new(tree, quick_settings()).with_sleep(|_| {});
    for record_type in types {
        extractor.register(record_type);
    }
    extractor
}

/// rstest fixture: extractor over the feed `A`, `B`, `C` with `Item` registered
#[fixture]
pub fn abc_extractor() -> Extractor {
    extractor_for(Arc::new(feed_tree(&["A", "B", "C"])), [item_type()])
}
