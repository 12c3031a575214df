use lasso::{Spur, ThreadedRodeo};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::sync::LazyLock;

/// Global string interner for node IDs.
static INTERNER: LazyLock<ThreadedRodeo> = LazyLock::new(ThreadedRodeo::default);

/// Prefix used for store-generated IDs (`node_0`, `node_1`, ...).
pub const GENERATED_PREFIX: &str = "node";

/// A lightweight, interned identifier for nodes in the component tree.
/// Internally a 4-byte `Spur` index, so copies, comparisons and hashing are O(1).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(Spur);

impl NodeId {
    /// Intern a new string as a NodeId, or return existing if already interned.
    pub fn intern(s: &str) -> Self {
        NodeId(INTERNER.get_or_intern(s))
    }

    /// Resolve back to a string slice.
    pub fn as_str(&self) -> &str {
        INTERNER.resolve(&self.0)
    }

    /// Numeric suffix of a generated ID (`node_7` → `7`).
    fn generated_ordinal(&self) -> Option<u64> {
        self.as_str()
            .strip_prefix(GENERATED_PREFIX)?
            .strip_prefix('_')?
            .parse()
            .ok()
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "@{}", self.as_str())
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(NodeId::intern(&s))
    }
}

/// Monotonic ID source owned by one document store.
///
/// IDs are never handed out twice by the same generator. `observe` lets the
/// store skip past IDs that arrived through a loaded document, so a later
/// `next` can't collide with (or resurrect) a loaded node's ID.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Produce the next ID for which `taken` returns false.
    pub fn next(&mut self, taken: impl Fn(NodeId) -> bool) -> NodeId {
        loop {
            let candidate = NodeId::intern(&format!("{GENERATED_PREFIX}_{}", self.next));
            self.next = self.next.saturating_add(1);
            if !taken(candidate) {
                return candidate;
            }
        }
    }

    /// Advance past `id` if it looks like one of ours. An ordinal at the top
    /// of the counter's range is left alone; `next` skips it as taken.
    pub fn observe(&mut self, id: NodeId) {
        if let Some(after) = id.generated_ordinal().and_then(|n| n.checked_add(1)) {
            self.next = self.next.max(after);
        }
    }
}
