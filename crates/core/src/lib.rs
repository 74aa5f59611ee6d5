//! Contracts and value types of the gleaner extraction engine.

pub mod cancel;
pub mod error;
pub mod locator;
pub mod profile;
pub mod record;
pub mod schema;
pub mod settings;
pub mod tree;

pub use cancel::CancelToken;
pub use error::{ConfigurationError, ErrorKind, ExtractError};
pub use locator::{Dialect, INDEX_PLACEHOLDER, Locator};
pub use profile::{Profile, ProfileError, ProfileSettings};
pub use record::{FieldValue, PopulatedRecord, Record, ScalarValue};
pub use schema::{FieldBinding, FieldKind, RecordType, ScalarShape, ScalarSpec};
pub use settings::{ExtractOverrides, ExtractSettings};
pub use tree::{LiveTree, NodeHandle, TreeError, TreeErrorKind};
