//! In-memory document provider for gleaner.
//!
//! Documents are loaded from XML or built with [`ElementSpec`], and both
//! locator dialects are evaluated against them. The provider is the reference
//! [`gleaner_core::LiveTree`] used by the command line and the test suites.

mod document;
mod query;
mod selector;
mod spec;
mod structural;
mod tree;
mod xml;

pub use document::{Document, Element, NodeId, NodeKind};
pub use spec::ElementSpec;
pub use tree::{DocumentTree, NodeDescription};
pub use xml::DocumentLoadError;
