use std::error::Error;
use std::fmt::{Display, Formatter};

/// Failure reported by a live tree implementation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeError {
    pub kind: TreeErrorKind,
    pub message: Option<String>,
}

impl TreeError {
    pub fn new(kind: TreeErrorKind, message: impl Into<String>) -> Self {
        Self { kind, message: Some(message.into()) }
    }

    pub fn simple(kind: TreeErrorKind) -> Self {
        Self { kind, message: None }
    }

    pub fn invalid_locator(locator: &str, reason: impl Display) -> Self {
        Self::new(TreeErrorKind::InvalidLocator, format!("invalid locator '{locator}': {reason}"))
    }

    pub fn stale(handle: impl Display) -> Self {
        Self::new(TreeErrorKind::StaleHandle, format!("{handle} no longer belongs to the current page"))
    }
}

impl Display for TreeError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match &self.message {
            Some(msg) => write!(f, "{msg}"),
            None => write!(f, "{:#?}", self.kind),
        }
    }
}

impl Error for TreeError {}

/// Categorises live tree failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeErrorKind {
    /// The locator text is not valid in its dialect.
    InvalidLocator,
    /// The handle refers to a page that has since been navigated away.
    StaleHandle,
    /// The session behind the tree is gone.
    Unavailable,
}
