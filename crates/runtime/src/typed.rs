//! Typed wrappers over the name based extraction calls.

use crate::extractor::Extractor;
use gleaner_core::{ExtractError, Locator, Record};

impl Extractor {
    /// Registers `T`'s binding table together with the tables it nests.
    pub fn register_record<T: Record>(&mut self) -> &mut Self {
        for nested in T::nested_types() {
            self.register(nested.clone());
        }
        self.register(T::record_type().clone())
    }

    pub fn populate_record<T: Record>(&self) -> Result<T, ExtractError> {
        T::from_record(self.populate(T::record_type().name())?)
    }

    pub fn populate_record_at<T: Record>(&self, base: &Locator) -> Result<T, ExtractError> {
        T::from_record(self.populate_at(T::record_type().name(), base)?)
    }

    pub fn enumerate_record<T: Record>(&self, index: usize) -> Result<T, ExtractError> {
        T::from_record(self.enumerate(T::record_type().name(), index)?)
    }

    /// Like [`Extractor::find_after`], with `T`'s own equality locating the anchor.
    pub fn find_record_after<T>(&self, anchor: &T, steps: usize) -> Result<T, ExtractError>
    where
        T: Record + PartialEq,
    {
        let record = self.find_after_by(T::record_type().name(), steps, |candidate| {
            Ok(&T::from_record(candidate.clone())? == anchor)
        })?;
        T::from_record(record)
    }
}

#[cfg(test)]
mod tests {
    use crate::test_support::{extractor_for, feed_tree, item_type};
    use gleaner_core::{ExtractError, NodeHandle, PopulatedRecord, Record, RecordType};
    use rstest::rstest;
    use std::sync::{Arc, LazyLock};

    #[derive(Debug)]
    struct Item {
        title: String,
        element: NodeHandle,
    }

    impl PartialEq for Item {
        fn eq(&self, other: &Self) -> bool {
            self.title == other.title
        }
    }

    impl Record for Item {
        fn record_type() -> &'static RecordType {
            static TYPE: LazyLock<RecordType> = LazyLock::new(item_type);
            &TYPE
        }

        fn from_record(record: PopulatedRecord) -> Result<Self, ExtractError> {
            record.ensure_type("Item")?;
            Ok(Self { title: record.text("title")?.to_owned(), element: record.handle("element")? })
        }
    }

    #[rstest]
    fn typed_calls_convert_records() {
        let mut extractor = extractor_for(Arc::new(feed_tree(&["A", "B", "C"])), Vec::<RecordType>::new());
        extractor.register_record::<Item>();
        assert!(extractor.is_registered("Item"));

        let first: Item = extractor.populate_record().unwrap();
        assert_eq!(first.title, "A");
        let second = extractor.enumerate_record::<Item>(1).unwrap();
        assert_eq!(second.title, "B");
        assert_ne!(first.element, second.element);

        let third = extractor.find_record_after(&second, 1).unwrap();
        assert_eq!(third.title, "C");
        assert!(extractor.find_record_after(&third, 1).unwrap_err().is_not_found());
    }

    #[rstest]
    fn populate_record_at_uses_the_given_base() {
        let mut extractor = extractor_for(Arc::new(feed_tree(&["A", "B"])), Vec::<RecordType>::new());
        extractor.register_record::<Item>();
        let item: Item = extractor.populate_record_at(&gleaner_core::Locator::new("/feed/item[2]")).unwrap();
        assert_eq!(item.title, "B");
    }

    #[rstest]
    fn unregistered_record_types_are_unknown() {
        let extractor = extractor_for(Arc::new(feed_tree(&["A"])), Vec::<RecordType>::new());
        let err = extractor.populate_record::<Item>().unwrap_err();
        assert_eq!(err.kind(), gleaner_core::ErrorKind::Configuration);
    }
}
