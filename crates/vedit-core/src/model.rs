//! Component-tree data model.
//!
//! The document is a forest stored flat: a map from `NodeId` to `Node`, plus
//! an ordered list of root IDs. Each node records its ordered children and a
//! back-pointer to its parent (`None` at root level). The store keeps the two
//! directions consistent; see `Document::validate` for the full invariant set.

use crate::id::NodeId;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

/// Property bag of a node. Values are opaque JSON to the store.
pub type Props = serde_json::Map<String, serde_json::Value>;

/// Ordered child list. Most containers hold a handful of children.
pub type Children = SmallVec<[NodeId; 4]>;

/// A single component instance placed on the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: NodeId,

    /// Component kind (e.g. `Button`, `Card`), resolved against a registry.
    #[serde(rename = "type")]
    pub component: String,

    #[serde(default)]
    pub props: Props,

    #[serde(default)]
    pub children: Children,

    /// Containing node, or `None` for a root-level node.
    #[serde(default)]
    pub parent_id: Option<NodeId>,
}

impl Node {
    pub fn new(id: NodeId, component: impl Into<String>, props: Props) -> Self {
        Self {
            id,
            component: component.into(),
            props,
            children: Children::new(),
            parent_id: None,
        }
    }

    /// Shallow-merge `partial` into this node's props. Keys in `partial`
    /// overwrite existing keys; other keys are left alone.
    pub fn merge_props(&mut self, partial: Props) {
        for (key, value) in partial {
            self.props.insert(key, value);
        }
    }

    pub fn is_root(&self) -> bool {
        self.parent_id.is_none()
    }
}
