//! Contract between the extraction engine and a live tree of UI nodes.

mod error;
mod handle;

pub use error::{TreeError, TreeErrorKind};
pub use handle::NodeHandle;

use crate::locator::Locator;

/// Capability consumed by the engine.
///
/// Every method is a single, non-blocking probe. Waiting for nodes to appear
/// is the engine's job; implementations only answer what the tree looks like
/// right now.
pub trait LiveTree: Send + Sync {
    /// First node matching `locator` in document order, if any.
    fn locate(&self, locator: &Locator) -> Result<Option<NodeHandle>, TreeError>;

    /// Whether the node is attached and can be interacted with.
    fn is_ready(&self, node: &NodeHandle) -> Result<bool, TreeError>;

    /// Text content of the node; empty when the node has none.
    fn read_text(&self, node: &NodeHandle) -> Result<String, TreeError>;

    fn read_attribute(&self, node: &NodeHandle, name: &str) -> Result<Option<String>, TreeError>;
}
