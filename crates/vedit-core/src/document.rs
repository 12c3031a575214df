//! Persistence payloads exchanged with the save/load layer.
//!
//! `Document` is the whole file format: `{ nodes, rootIds, name }` as JSON.
//! `DocumentState` is the same without the name, as produced by an export.

use crate::id::NodeId;
use crate::model::Node;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("invalid document JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("node {key} is stored under a different id ({actual})")]
    IdMismatch { key: NodeId, actual: NodeId },

    #[error("{0} is referenced but not present in nodes")]
    DanglingReference(NodeId),

    #[error("{child} is listed under {container} but its parentId is {parent:?}")]
    ParentMismatch {
        child: NodeId,
        container: String,
        parent: Option<NodeId>,
    },

    #[error("{0} is referenced more than once")]
    DuplicateReference(NodeId),

    #[error("{0} is not referenced by rootIds or any children list")]
    Orphan(NodeId),

    #[error("{0} is part of a parent/child cycle")]
    Cycle(NodeId),
}

/// Full persisted document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    #[serde(default)]
    pub nodes: HashMap<NodeId, Node>,
    #[serde(default)]
    pub root_ids: Vec<NodeId>,
    #[serde(default)]
    pub name: String,
}

impl Document {
    /// # Errors
    /// Returns `DocumentError::Json` if the input is not a document payload.
    pub fn from_json(json: &str) -> Result<Self, DocumentError> {
        Ok(serde_json::from_str(json)?)
    }

    /// # Errors
    /// Returns `DocumentError::Json` if a prop value cannot be serialized.
    pub fn to_json(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string(self)?)
    }

    /// # Errors
    /// Returns `DocumentError::Json` if a prop value cannot be serialized.
    pub fn to_json_pretty(&self) -> Result<String, DocumentError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check the tree invariants. The store trusts loaded documents, so the
    /// persistence layer should call this before `load_project`.
    ///
    /// # Errors
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<(), DocumentError> {
        validate_tree(&self.nodes, &self.root_ids)
    }
}

/// Exported tree without project metadata or UI state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentState {
    pub nodes: HashMap<NodeId, Node>,
    pub root_ids: Vec<NodeId>,
}

impl DocumentState {
    /// # Errors
    /// Returns the first violated invariant found.
    pub fn validate(&self) -> Result<(), DocumentError> {
        validate_tree(&self.nodes, &self.root_ids)
    }

    pub fn into_document(self, name: impl Into<String>) -> Document {
        Document {
            nodes: self.nodes,
            root_ids: self.root_ids,
            name: name.into(),
        }
    }
}

/// Verify that `root_ids` and the children lists partition `nodes` exactly
/// once, that parent pointers agree with containment, and that the
/// parent/child relation is acyclic.
pub fn validate_tree(
    nodes: &HashMap<NodeId, Node>,
    root_ids: &[NodeId],
) -> Result<(), DocumentError> {
    for (key, node) in nodes {
        if *key != node.id {
            return Err(DocumentError::IdMismatch {
                key: *key,
                actual: node.id,
            });
        }
    }

    let mut referenced: HashSet<NodeId> = HashSet::with_capacity(nodes.len());

    for &id in root_ids {
        let node = nodes.get(&id).ok_or(DocumentError::DanglingReference(id))?;
        if node.parent_id.is_some() {
            return Err(DocumentError::ParentMismatch {
                child: id,
                container: "rootIds".into(),
                parent: node.parent_id,
            });
        }
        if !referenced.insert(id) {
            return Err(DocumentError::DuplicateReference(id));
        }
    }

    for node in nodes.values() {
        for &child_id in &node.children {
            let child = nodes
                .get(&child_id)
                .ok_or(DocumentError::DanglingReference(child_id))?;
            if child.parent_id != Some(node.id) {
                return Err(DocumentError::ParentMismatch {
                    child: child_id,
                    container: node.id.to_string(),
                    parent: child.parent_id,
                });
            }
            if !referenced.insert(child_id) {
                return Err(DocumentError::DuplicateReference(child_id));
            }
        }
    }

    if let Some(orphan) = nodes.keys().find(|id| !referenced.contains(id)) {
        return Err(DocumentError::Orphan(*orphan));
    }

    // Every node is referenced exactly once, so anything unreachable from the
    // roots must sit on a cycle.
    let mut visited: HashSet<NodeId> = HashSet::with_capacity(nodes.len());
    let mut stack: Vec<NodeId> = root_ids.to_vec();
    while let Some(id) = stack.pop() {
        if visited.insert(id)
            && let Some(node) = nodes.get(&id)
        {
            stack.extend(node.children.iter().copied());
        }
    }
    if let Some(id) = nodes.keys().find(|id| !visited.contains(id)) {
        return Err(DocumentError::Cycle(*id));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Props;
    use pretty_assertions::assert_eq;

    fn node(id: &str, parent: Option<&str>, children: &[&str]) -> Node {
        let mut n = Node::new(NodeId::intern(id), "Box", Props::new());
        n.parent_id = parent.map(NodeId::intern);
        n.children = children.iter().map(|c| NodeId::intern(c)).collect();
        n
    }

    fn doc(nodes: Vec<Node>, roots: &[&str]) -> Document {
        Document {
            nodes: nodes.into_iter().map(|n| (n.id, n)).collect(),
            root_ids: roots.iter().map(|r| NodeId::intern(r)).collect(),
            name: "test".into(),
        }
    }

    #[test]
    fn valid_tree_passes() {
        let d = doc(
            vec![
                node("v_card", None, &["v_title", "v_btn"]),
                node("v_title", Some("v_card"), &[]),
                node("v_btn", Some("v_card"), &[]),
                node("v_footer", None, &[]),
            ],
            &["v_card", "v_footer"],
        );
        assert!(d.validate().is_ok());
    }

    #[test]
    fn dangling_child_is_rejected() {
        let d = doc(vec![node("d_card", None, &["d_ghost"])], &["d_card"]);
        assert!(matches!(
            d.validate(),
            Err(DocumentError::DanglingReference(id)) if id.as_str() == "d_ghost"
        ));
    }

    #[test]
    fn parent_pointer_must_match_container() {
        let d = doc(
            vec![
                node("p_a", None, &["p_c"]),
                node("p_b", None, &[]),
                node("p_c", Some("p_b"), &[]),
            ],
            &["p_a", "p_b"],
        );
        assert!(matches!(
            d.validate(),
            Err(DocumentError::ParentMismatch { .. })
        ));
    }

    #[test]
    fn double_reference_is_rejected() {
        let d = doc(vec![node("dup_a", None, &[])], &["dup_a", "dup_a"]);
        assert!(matches!(
            d.validate(),
            Err(DocumentError::DuplicateReference(_))
        ));
    }

    #[test]
    fn unreferenced_node_is_orphan() {
        let d = doc(
            vec![node("o_a", None, &[]), node("o_b", None, &[])],
            &["o_a"],
        );
        assert!(matches!(d.validate(), Err(DocumentError::Orphan(id)) if id.as_str() == "o_b"));
    }

    #[test]
    fn detached_cycle_is_rejected() {
        let d = doc(
            vec![
                node("c_root", None, &[]),
                node("c_x", Some("c_y"), &["c_y"]),
                node("c_y", Some("c_x"), &["c_x"]),
            ],
            &["c_root"],
        );
        assert!(matches!(d.validate(), Err(DocumentError::Cycle(_))));
    }

    #[test]
    fn json_roundtrip_preserves_document() {
        let d = doc(
            vec![
                node("j_card", None, &["j_btn"]),
                node("j_btn", Some("j_card"), &[]),
            ],
            &["j_card"],
        );
        let json = d.to_json().unwrap();
        let back = Document::from_json(&json).unwrap();
        assert_eq!(back, d);
    }

    #[test]
    fn state_converts_into_named_document() {
        let state = DocumentState {
            nodes: HashMap::new(),
            root_ids: Vec::new(),
        };
        let d = state.into_document("Onboarding");
        assert_eq!(d.name, "Onboarding");
        assert!(d.validate().is_ok());
    }
}
