use serde::{Serialize, Serializer};
use std::fmt::{Display, Formatter};

/// Opaque reference to a node of the live tree.
///
/// The engine never looks inside a handle. `key` identifies the node within a
/// page and `generation` identifies the page; providers use the pair to detect
/// handles that outlived a navigation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeHandle {
    key: u64,
    generation: u64,
}

impl NodeHandle {
    pub const fn new(key: u64, generation: u64) -> Self {
        Self { key, generation }
    }

    pub const fn key(&self) -> u64 {
        self.key
    }

    pub const fn generation(&self) -> u64 {
        self.generation
    }
}

impl Display for NodeHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "node#{}@{}", self.key, self.generation)
    }
}

impl Serialize for NodeHandle {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}
