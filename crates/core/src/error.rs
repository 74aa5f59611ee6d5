use crate::locator::{Dialect, Locator};
use crate::schema::ScalarShape;
use crate::tree::{TreeError, TreeErrorKind};
use std::time::Duration;
use thiserror::Error;

/// Problems with a record declaration or a caller supplied locator.
///
/// These are programming errors: retrying the same call cannot succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("record type '{record}' is not registered")]
    UnknownType { record: String },
    #[error("record type '{record}' declares no root locator")]
    MissingRoot { record: String },
    #[error("record type '{record}' was asked to populate at a blank locator")]
    BlankLocator { record: String },
    #[error(
        "field '{record}.{field}' uses the {field_dialect} dialect but the record is addressed with the {record_dialect} dialect"
    )]
    DialectMismatch { record: String, field: String, record_dialect: Dialect, field_dialect: Dialect },
    #[error("field '{record}.{field}' refers to record type '{nested}' which is not registered")]
    UnregisteredType { record: String, field: String, nested: String },
    #[error("record type '{nested}' used by field '{record}.{field}' declares no root locator")]
    NestedWithoutRoot { record: String, field: String, nested: String },
    #[error("root locator '{locator}' of record type '{record}' has no {{index}} placeholder")]
    MissingIndexPlaceholder { record: String, locator: String },
    #[error("{reason}")]
    InvalidLocator { reason: String },
    #[error("record type '{record}' has no populated field '{field}'")]
    UnknownField { record: String, field: String },
    #[error("field '{record}.{field}' holds {actual} where {expected} was expected")]
    FieldType { record: String, field: String, expected: &'static str, actual: &'static str },
    #[error("populated record has type '{actual}' but '{expected}' was expected")]
    RecordTypeMismatch { expected: String, actual: String },
}

/// Every failure the extraction engine reports.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("no ready node matched '{locator}' within {waited:?}")]
    NotFound { locator: Locator, waited: Duration },
    #[error(
        "no '{record}' record found after {lookahead} consecutive empty positions (last probed position {last_position})"
    )]
    ScanExhausted { record: String, lookahead: usize, last_position: usize },
    #[error("field '{record}.{field}' expected {expected} content but found {text:?}")]
    MalformedContent { record: String, field: String, expected: ScalarShape, text: String },
    #[error("live tree failure: {0}")]
    Tree(TreeError),
    #[error("extraction cancelled")]
    Cancelled,
}

/// Coarse classification of [`ExtractError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Configuration,
    NotFound,
    MalformedContent,
    Tree,
    Cancelled,
}

impl ExtractError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExtractError::Configuration(_) => ErrorKind::Configuration,
            ExtractError::NotFound { .. } | ExtractError::ScanExhausted { .. } => ErrorKind::NotFound,
            ExtractError::MalformedContent { .. } => ErrorKind::MalformedContent,
            ExtractError::Tree(_) => ErrorKind::Tree,
            ExtractError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// True for "nothing matched (yet)", the only failure scans swallow.
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

impl From<TreeError> for ExtractError {
    fn from(err: TreeError) -> Self {
        match err.kind {
            TreeErrorKind::InvalidLocator => {
                ExtractError::Configuration(ConfigurationError::InvalidLocator { reason: err.to_string() })
            }
            _ => ExtractError::Tree(err),
        }
    }
}
