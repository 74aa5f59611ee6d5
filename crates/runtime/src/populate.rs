//! Breadth-first population of a record and its nested records.

use crate::extractor::Extractor;
use crate::wait::Readiness;
use gleaner_core::{
    ConfigurationError, ExtractError, FieldBinding, FieldKind, FieldValue, Locator, PopulatedRecord,
    RecordType, ScalarSpec,
};
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

enum Pending {
    Done(FieldValue),
    Child(usize),
}

/// One record instance waiting for (or holding) its field values.
struct Slot {
    record_type: Arc<RecordType>,
    base: Locator,
    parent: Option<usize>,
    values: Vec<(String, Pending)>,
}

impl Extractor {
    /// Waits for `base` to become ready, then fills every field of `record_type`.
    ///
    /// Nested records are queued and filled level by level; the finished
    /// records are assembled from the deepest slot upwards.
    pub(crate) fn populate_type(
        &self,
        record_type: &Arc<RecordType>,
        base: &Locator,
        ready_timeout: Duration,
    ) -> Result<PopulatedRecord, ExtractError> {
        record_type.root_locator()?;
        if base.is_blank() {
            return Err(ConfigurationError::BlankLocator { record: record_type.name().to_owned() }.into());
        }
        self.resolve(base, ready_timeout, Readiness::Ready)?;
        debug!(record = record_type.name(), %base, "populating record");

        let root = Slot { record_type: Arc::clone(record_type), base: base.clone(), parent: None, values: Vec::new() };
        let mut slots = vec![root];
        let mut queue = VecDeque::from([0]);

        while let Some(current) = queue.pop_front() {
            let record_type = Arc::clone(&slots[current].record_type);
            let base = slots[current].base.clone();
            let mut values = Vec::with_capacity(record_type.fields().len());

            for field in record_type.fields() {
                check_dialect(&record_type, field, &base)?;
                let effective = field.effective_locator(&base);
                let value = match field.kind() {
                    FieldKind::Handle => {
                        let node = self.resolve(&base, self.settings().field_timeout, Readiness::Present)?;
                        Pending::Done(FieldValue::Handle(node))
                    }
                    FieldKind::Scalar(spec) => {
                        Pending::Done(self.read_scalar(&record_type, field, spec, &effective)?)
                    }
                    FieldKind::Nested { record } => {
                        if is_on_chain(&slots, current, record) {
                            debug!(
                                record = record_type.name(),
                                field = field.name(),
                                nested = record.as_str(),
                                "skipping recursive nested field"
                            );
                            continue;
                        }
                        let nested = self.nested_type(&record_type, field, record)?;
                        let child = slots.len();
                        slots.push(Slot {
                            record_type: nested,
                            base: effective,
                            parent: Some(current),
                            values: Vec::new(),
                        });
                        queue.push_back(child);
                        Pending::Child(child)
                    }
                };
                values.push((field.name().to_owned(), value));
            }
            slots[current].values = values;
        }

        Ok(assemble(slots))
    }

    fn nested_type(
        &self,
        owner: &RecordType,
        field: &FieldBinding,
        nested: &str,
    ) -> Result<Arc<RecordType>, ConfigurationError> {
        let record_type = self.lookup(nested).ok_or_else(|| ConfigurationError::UnregisteredType {
            record: owner.name().to_owned(),
            field: field.name().to_owned(),
            nested: nested.to_owned(),
        })?;
        if record_type.root_locator().is_err() {
            return Err(ConfigurationError::NestedWithoutRoot {
                record: owner.name().to_owned(),
                field: field.name().to_owned(),
                nested: nested.to_owned(),
            });
        }
        Ok(Arc::clone(record_type))
    }

    fn read_scalar(
        &self,
        record_type: &RecordType,
        field: &FieldBinding,
        spec: &ScalarSpec,
        locator: &Locator,
    ) -> Result<FieldValue, ExtractError> {
        let node = self.resolve(locator, self.settings().field_timeout, Readiness::Present)?;
        let text = match &spec.attribute {
            Some(attribute) => self.tree().read_attribute(&node, attribute)?.unwrap_or_default(),
            None => self.tree().read_text(&node)?,
        };
        match spec.shape.convert(&text) {
            Some(value) => Ok(FieldValue::Scalar(value)),
            None => Err(ExtractError::MalformedContent {
                record: record_type.name().to_owned(),
                field: field.name().to_owned(),
                expected: spec.shape,
                text,
            }),
        }
    }
}

fn check_dialect(record_type: &RecordType, field: &FieldBinding, base: &Locator) -> Result<(), ConfigurationError> {
    match field.dialect() {
        Some(dialect) if dialect != base.dialect() => Err(ConfigurationError::DialectMismatch {
            record: record_type.name().to_owned(),
            field: field.name().to_owned(),
            record_dialect: base.dialect(),
            field_dialect: dialect,
        }),
        _ => Ok(()),
    }
}

/// Whether `name` is the type of slot `current` or of any slot enclosing it.
fn is_on_chain(slots: &[Slot], current: usize, name: &str) -> bool {
    let mut cursor = Some(current);
    while let Some(idx) = cursor {
        if slots[idx].record_type.name() == name {
            return true;
        }
        cursor = slots[idx].parent;
    }
    false
}

/// Children are always pushed after their parent, so walking the arena
/// backwards finishes every child before the slot that embeds it.
fn assemble(slots: Vec<Slot>) -> PopulatedRecord {
    let mut built: Vec<Option<PopulatedRecord>> = slots.iter().map(|_| None).collect();
    for (idx, slot) in slots.into_iter().enumerate().rev() {
        let fields = slot
            .values
            .into_iter()
            .filter_map(|(name, pending)| match pending {
                Pending::Done(value) => Some((name, value)),
                Pending::Child(child) => built[child].take().map(|record| (name, FieldValue::Nested(record))),
            })
            .collect();
        built[idx] = Some(PopulatedRecord::new(slot.record_type.name(), fields));
    }
    built.into_iter().next().flatten().unwrap_or_else(|| PopulatedRecord::new("", Vec::new()))
}

#[cfg(test)]
mod tests {
    use crate::test_support::extractor_for;
    use gleaner_core::{
        ConfigurationError, Dialect, ErrorKind, ExtractError, FieldBinding, FieldValue, Locator, RecordType,
        ScalarShape,
    };
    use gleaner_provider_document::{Document, DocumentTree, ElementSpec};
    use rstest::{fixture, rstest};
    use std::sync::Arc;

    fn person_spec(name: &str, handle: &str) -> ElementSpec {
        ElementSpec::new("header")
            .with_attribute("data-handle", handle)
            .with_child(ElementSpec::new("span").with_text(name))
    }

    #[fixture]
    fn thread_tree() -> Arc<DocumentTree> {
        let post = |author: &str, text: &str, comments: &str| {
            ElementSpec::new("div")
                .with_attribute("class", "post")
                .with_child(person_spec(author, &format!("@{}", author.to_lowercase())))
                .with_child(ElementSpec::new("p").with_text(text))
                .with_child(ElementSpec::new("footer").with_child(ElementSpec::new("button").with_text(comments)))
        };
        Arc::new(DocumentTree::new(Document::from_spec(
            &ElementSpec::new("html").with_child(
                ElementSpec::new("main")
                    .with_child(post("Ada", "  Hello\n world ", "3 class comments"))
                    .with_child(post("Grace", "", "no comments")),
            ),
        )))
    }

    fn person() -> RecordType {
        RecordType::new("Person")
            .with_root("/html/main/div[1]/header")
            .with_field(FieldBinding::scalar("name", "/span"))
            .with_field(FieldBinding::scalar("handle", "").from_attribute("data-handle"))
    }

    fn post() -> RecordType {
        RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::nested("author", "/header", "Person"))
            .with_field(FieldBinding::scalar("text", "/p"))
            .with_field(FieldBinding::scalar("comments", "/footer/button").with_shape(ScalarShape::Count))
            .with_field(FieldBinding::handle("element"))
    }

    #[rstest]
    fn populates_scalars_nested_records_and_handles(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree.clone(), [post(), person()]);
        let record = extractor.populate_at("Post", &Locator::new("/html/main/div[1]")).unwrap();

        assert_eq!(record.record_type(), "Post");
        assert_eq!(record.text("text").unwrap(), "Hello world");
        assert_eq!(record.integer("comments").unwrap(), 3);
        let author = record.nested("author").unwrap().unwrap();
        assert_eq!(author.text("name").unwrap(), "Ada");
        assert_eq!(author.text("handle").unwrap(), "@ada");
        let element = record.handle("element").unwrap();
        assert_eq!(thread_tree.describe(&element).unwrap().name, "div");
        let names: Vec<_> = record.fields().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["author", "text", "comments", "element"]);
    }

    #[rstest]
    fn populate_uses_first_position_of_root(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree, [post(), person()]);
        let record = extractor.populate("Post").unwrap();
        assert_eq!(record.text("text").unwrap(), "Hello world");
    }

    #[rstest]
    fn empty_text_is_an_empty_string() {
        let tree = Arc::new(DocumentTree::new(Document::from_spec(
            &ElementSpec::new("html").with_child(ElementSpec::new("main").with_child(
                ElementSpec::new("div").with_child(ElementSpec::new("p")),
            )),
        )));
        let record_type = RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::scalar("text", "/p"))
            .with_field(FieldBinding::scalar("title", "/p").from_attribute("title"));
        let extractor = extractor_for(tree, [record_type]);
        let record = extractor.populate("Post").unwrap();
        assert_eq!(record.text("text").unwrap(), "");
        assert_eq!(record.text("title").unwrap(), "");
    }

    #[rstest]
    fn count_without_digits_is_malformed(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree, [post(), person()]);
        let err = extractor.populate_at("Post", &Locator::new("/html/main/div[2]")).unwrap_err();
        assert!(matches!(
            err,
            ExtractError::MalformedContent { ref field, ref text, expected: ScalarShape::Count, .. }
                if field == "comments" && text == "no comments"
        ));
    }

    #[rstest]
    fn missing_field_node_aborts_population(thread_tree: Arc<DocumentTree>) {
        let broken = RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::scalar("text", "/p"))
            .with_field(FieldBinding::scalar("subtitle", "/h3"));
        let extractor = extractor_for(thread_tree, [broken]);
        let err = extractor.populate("Post").unwrap_err();
        assert!(matches!(err, ExtractError::NotFound { ref locator, .. } if locator.as_str() == "/html/main/div[1]/h3"));
    }

    #[rstest]
    fn inherited_and_absolute_fragments_resolve_differently(thread_tree: Arc<DocumentTree>) {
        let record_type = RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::scalar("relative", "/header/span"))
            .with_field(FieldBinding::scalar("absolute", "/html/main/div[2]/header/span").absolute());
        let extractor = extractor_for(thread_tree, [record_type]);
        let record = extractor.populate("Post").unwrap();
        assert_eq!(record.text("relative").unwrap(), "Ada");
        assert_eq!(record.text("absolute").unwrap(), "Grace");
    }

    #[rstest]
    fn self_recursion_is_skipped(thread_tree: Arc<DocumentTree>) {
        let record_type = RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::scalar("text", "/p"))
            .with_field(FieldBinding::nested("reply", "/div", "Post"));
        let extractor = extractor_for(thread_tree, [record_type]);
        let record = extractor.populate("Post").unwrap();
        assert_eq!(record.get("reply"), None);
        assert_eq!(record.fields().count(), 1);
    }

    #[rstest]
    fn mutual_recursion_terminates(thread_tree: Arc<DocumentTree>) {
        let post = RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::nested("author", "/header", "Person"));
        let person = RecordType::new("Person")
            .with_root("/html/main/div[1]/header")
            .with_field(FieldBinding::scalar("name", "/span"))
            .with_field(FieldBinding::nested("latest", "", "Post"));
        let extractor = extractor_for(thread_tree, [post, person]);
        let record = extractor.populate("Post").unwrap();
        let author = record.nested("author").unwrap().unwrap();
        assert_eq!(author.text("name").unwrap(), "Ada");
        assert_eq!(author.get("latest"), None);
    }

    #[rstest]
    fn unregistered_nested_type_is_a_configuration_error(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree, [post()]);
        let err = extractor.populate("Post").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Configuration(ConfigurationError::UnregisteredType { ref nested, .. }) if nested == "Person"
        ));
    }

    #[rstest]
    fn nested_type_without_root_is_a_configuration_error(thread_tree: Arc<DocumentTree>) {
        let rootless = RecordType::new("Person").with_field(FieldBinding::scalar("name", "/span"));
        let extractor = extractor_for(thread_tree, [post(), rootless]);
        let err = extractor.populate("Post").unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(ConfigurationError::NestedWithoutRoot { .. })));
    }

    #[rstest]
    #[case(RecordType::new("Post").with_field(FieldBinding::scalar("text", "/p")))]
    #[case(RecordType::new("Post").with_root(" ").with_field(FieldBinding::scalar("text", "/p")))]
    fn missing_root_is_a_configuration_error(thread_tree: Arc<DocumentTree>, #[case] record_type: RecordType) {
        let extractor = extractor_for(thread_tree, [record_type]);
        let err = extractor.populate_at("Post", &Locator::new("/html/main/div[1]")).unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(ConfigurationError::MissingRoot { .. })));
    }

    #[rstest]
    fn dialect_mismatch_is_reported(thread_tree: Arc<DocumentTree>) {
        let record_type = RecordType::new("Post")
            .with_root("/html/main/div[{index}]")
            .with_field(FieldBinding::scalar("text", " p"));
        let extractor = extractor_for(thread_tree, [record_type]);
        let err = extractor.populate("Post").unwrap_err();
        assert!(matches!(
            err,
            ExtractError::Configuration(ConfigurationError::DialectMismatch {
                record_dialect: Dialect::Structural,
                field_dialect: Dialect::Attribute,
                ..
            })
        ));
    }

    #[rstest]
    fn attribute_dialect_records_populate(thread_tree: Arc<DocumentTree>) {
        let record_type = RecordType::new("Post")
            .with_root("main > div.post:nth-of-type({index})")
            .with_field(FieldBinding::scalar("author", " header > span"))
            .with_field(FieldBinding::scalar("comments", " footer button").with_shape(ScalarShape::Count));
        let extractor = extractor_for(thread_tree, [record_type]);
        let record = extractor.populate("Post").unwrap();
        assert_eq!(record.text("author").unwrap(), "Ada");
        assert_eq!(record.integer("comments").unwrap(), 3);
    }

    #[rstest]
    fn invalid_locator_is_a_configuration_error(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree, [post(), person()]);
        let err = extractor.populate_at("Post", &Locator::new("/html/main/div[")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
    }

    #[rstest]
    fn blank_base_is_rejected(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree, [post(), person()]);
        let err = extractor.populate_at("Post", &Locator::new("")).unwrap_err();
        assert!(matches!(err, ExtractError::Configuration(ConfigurationError::BlankLocator { .. })));
        assert!(matches!(
            extractor.populate("Comment").unwrap_err(),
            ExtractError::Configuration(ConfigurationError::UnknownType { .. })
        ));
    }

    #[rstest]
    fn absent_base_is_not_found(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree, [post(), person()]);
        let err = extractor.populate_at("Post", &Locator::new("/html/main/div[7]")).unwrap_err();
        assert!(err.is_not_found());
    }

    #[rstest]
    fn repeated_population_is_structurally_equal(thread_tree: Arc<DocumentTree>) {
        let extractor = extractor_for(thread_tree.clone(), [post(), person()]);
        let first = extractor.populate("Post").unwrap();
        thread_tree.navigate(thread_tree.snapshot());
        let second = extractor.populate("Post").unwrap();
        assert_eq!(first, second);
        assert_ne!(first.handle("element").unwrap(), second.handle("element").unwrap());
        assert!(matches!(second.get("element"), Some(FieldValue::Handle(_))));
    }
}
