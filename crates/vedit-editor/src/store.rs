//! The editor store: authoritative component tree plus transient UI state.
//!
//! - **Tree**: a flat `NodeId → Node` map and ordered root IDs, held in
//!   persistent collections so a history snapshot is a pointer copy that
//!   shares structure with the live state.
//!
//! - **Mutations**: every structural operation validates its arguments
//!   first. A refused call returns an `EditError` and touches nothing (not
//!   even history). An accepted call records a pre-mutation snapshot, marks
//!   the document dirty, then mutates in place.
//!
//! - **UI state**: selection, hover, zoom, pan, active panel and mode are
//!   plain setters that bypass history.

use crate::config::EditorConfig;
use crate::error::EditError;
use crate::history::History;
use crate::shortcuts::ShortcutAction;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use vedit_core::{
    ComponentRegistry, Document, DocumentState, IdGenerator, Node, NodeId, Props,
};

/// Whole-document state captured before a structural mutation.
#[derive(Debug, Clone, PartialEq)]
pub struct Snapshot {
    pub nodes: im::HashMap<NodeId, Node>,
    pub root_ids: im::Vector<NodeId>,
    pub selected: Option<NodeId>,
}

/// Whether the canvas is being edited or previewed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EditorMode {
    #[default]
    Edit,
    Preview,
}

/// Side panel currently shown next to the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Panel {
    #[default]
    Components,
    Layers,
    Properties,
}

/// Canvas view state. Never recorded in history or exported.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewState {
    pub zoom: f32,
    pub pan: (f32, f32),
    pub active_panel: Panel,
    pub mode: EditorMode,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: (0.0, 0.0),
            active_panel: Panel::default(),
            mode: EditorMode::default(),
        }
    }
}

/// In-memory document model of the canvas component tree with undo/redo.
pub struct EditorStore {
    nodes: im::HashMap<NodeId, Node>,
    root_ids: im::Vector<NodeId>,
    selected: Option<NodeId>,
    hovered: Option<NodeId>,
    history: History<Snapshot>,
    ids: IdGenerator,
    registry: Box<dyn ComponentRegistry>,
    config: EditorConfig,
    view: ViewState,
    project_name: String,
    /// Set on every accepted structural mutation; cleared by load/save.
    dirty: bool,
}

impl EditorStore {
    /// Create an empty store with the default configuration.
    pub fn new(registry: impl ComponentRegistry + 'static) -> Self {
        Self::with_config(registry, EditorConfig::default())
    }

    pub fn with_config(registry: impl ComponentRegistry + 'static, config: EditorConfig) -> Self {
        let config = config.normalized();
        Self {
            nodes: im::HashMap::new(),
            root_ids: im::Vector::new(),
            selected: None,
            hovered: None,
            history: History::new(config.history_limit),
            ids: IdGenerator::new(),
            registry: Box::new(registry),
            config,
            view: ViewState::default(),
            project_name: String::new(),
            dirty: false,
        }
    }

    /// Swap the component registry. Existing nodes are not touched.
    pub fn set_registry(&mut self, registry: impl ComponentRegistry + 'static) {
        self.registry = Box::new(registry);
    }

    // ─── Read selectors ──────────────────────────────────────────────────

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn root_ids(&self) -> Vec<NodeId> {
        self.root_ids.iter().copied().collect()
    }

    /// Root-level nodes in canvas order.
    pub fn root_nodes(&self) -> Vec<&Node> {
        self.root_ids
            .iter()
            .filter_map(|id| self.nodes.get(id))
            .collect()
    }

    /// Children of `id` in order. Empty for leaves and unknown IDs.
    pub fn children_of(&self, id: NodeId) -> Vec<&Node> {
        self.nodes
            .get(&id)
            .map(|n| {
                n.children
                    .iter()
                    .filter_map(|c| self.nodes.get(c))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Parent of `id`. `None` for root-level nodes and unknown IDs.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|n| n.parent_id)
    }

    /// All transitive descendants of `id` in pre-order, excluding `id`.
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = match self.nodes.get(&id) {
            Some(n) => n.children.iter().rev().copied().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            out.push(current);
            if let Some(n) = self.nodes.get(&current) {
                stack.extend(n.children.iter().rev().copied());
            }
        }
        out
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        let mut current = self.parent_of(descendant);
        // Bounded walk: a loaded document is trusted, not validated.
        let mut steps = 0;
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            steps += 1;
            if steps > self.nodes.len() {
                break;
            }
            current = self.parent_of(id);
        }
        false
    }

    pub fn selected_id(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn selected_node(&self) -> Option<&Node> {
        self.selected.and_then(|id| self.nodes.get(&id))
    }

    pub fn hovered_id(&self) -> Option<NodeId> {
        self.hovered
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History<Snapshot> {
        &self.history
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn project_name(&self) -> &str {
        &self.project_name
    }

    // ─── Structural mutations ────────────────────────────────────────────

    /// Create a node of `component` with the registry's default props and
    /// insert it under `parent` (or at root level) at `index`, appending when
    /// `index` is `None` or past the end. The new node becomes the selection.
    ///
    /// # Errors
    /// - `UnknownComponent` if the registry has no such type.
    /// - `NodeNotFound` if `parent` does not exist.
    pub fn add_node(
        &mut self,
        component: &str,
        parent: Option<NodeId>,
        index: Option<usize>,
    ) -> Result<NodeId, EditError> {
        let Some(meta) = self.registry.lookup(component) else {
            log::warn!("add_node: unknown component type {component:?}");
            return Err(EditError::UnknownComponent(component.to_string()));
        };
        let props = meta.default_props();
        if let Some(pid) = parent {
            self.require(pid)?;
        }

        self.record();
        let id = self.ids.next(|candidate| self.nodes.contains_key(&candidate));
        self.nodes.insert(id, Node::new(id, component, props));
        self.link(id, parent, index);
        self.selected = Some(id);
        log::debug!("add_node: {id} ({component}) under {parent:?}");
        Ok(id)
    }

    /// Shallow-merge `partial` into the node's props.
    ///
    /// # Errors
    /// `NodeNotFound` if `id` does not exist.
    pub fn update_node_props(&mut self, id: NodeId, partial: Props) -> Result<(), EditError> {
        self.require(id)?;
        self.record();
        if let Some(node) = self.nodes.get_mut(&id) {
            node.merge_props(partial);
        }
        Ok(())
    }

    /// Remove `id` and its whole subtree. Clears selection and hover if they
    /// pointed into the removed subtree. Returns the number of nodes removed.
    ///
    /// # Errors
    /// `NodeNotFound` if `id` does not exist.
    pub fn delete_node(&mut self, id: NodeId) -> Result<usize, EditError> {
        self.require(id)?;
        self.record();

        let mut removed = self.descendants(id);
        removed.push(id);
        let parent = self.parent_of(id);
        self.unlink(id, parent);
        for gone in &removed {
            self.nodes.remove(gone);
        }

        let removed_set: HashSet<NodeId> = removed.iter().copied().collect();
        if self.selected.is_some_and(|s| removed_set.contains(&s)) {
            self.selected = None;
        }
        if self.hovered.is_some_and(|h| removed_set.contains(&h)) {
            self.hovered = None;
        }
        log::debug!("delete_node: {id} ({} nodes)", removed.len());
        Ok(removed.len())
    }

    /// Re-parent `id` under `new_parent` (or to root level) at `index`.
    /// `index` counts positions in the target container after `id` has been
    /// taken out of its current one; past the end appends.
    ///
    /// # Errors
    /// - `NodeNotFound` if `id` or `new_parent` does not exist.
    /// - `CycleDetected` if `new_parent` is `id` or one of its descendants.
    pub fn move_node(
        &mut self,
        id: NodeId,
        new_parent: Option<NodeId>,
        index: usize,
    ) -> Result<(), EditError> {
        self.require(id)?;
        if let Some(target) = new_parent {
            self.require(target)?;
            if target == id || self.is_ancestor_of(id, target) {
                log::warn!("move_node: refusing to move {id} into its own subtree ({target})");
                return Err(EditError::CycleDetected { node: id, target });
            }
        }

        self.record();
        let old_parent = self.parent_of(id);
        self.unlink(id, old_parent);
        self.link(id, new_parent, Some(index));
        Ok(())
    }

    /// Clone `id` without its children and place the copy right after the
    /// original in the same container. The copy becomes the selection.
    ///
    /// # Errors
    /// `NodeNotFound` if `id` does not exist.
    pub fn duplicate_node(&mut self, id: NodeId) -> Result<NodeId, EditError> {
        let original = self.require(id)?.clone();
        let position = self.position_in_container(id);

        self.record();
        let copy_id = self.ids.next(|candidate| self.nodes.contains_key(&candidate));
        let mut copy = Node::new(copy_id, original.component, original.props);
        copy.parent_id = original.parent_id;
        self.nodes.insert(copy_id, copy);
        self.link(copy_id, original.parent_id, position.map(|p| p + 1));
        self.selected = Some(copy_id);
        Ok(copy_id)
    }

    /// Empty the canvas. Undoable.
    pub fn clear_canvas(&mut self) {
        self.record();
        self.nodes = im::HashMap::new();
        self.root_ids = im::Vector::new();
        self.selected = None;
        self.hovered = None;
    }

    // ─── Batching ────────────────────────────────────────────────────────

    /// Group the following mutations into a single undo step until the
    /// matching `end_batch`.
    pub fn begin_batch(&mut self) {
        self.history.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.history.end_batch();
    }

    // ─── Undo / Redo ─────────────────────────────────────────────────────

    /// Restore the state before the last recorded mutation.
    /// Returns `false` if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.undo(current) {
            Some(previous) => {
                self.restore(previous);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    /// Re-apply the last undone mutation.
    /// Returns `false` if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let current = self.snapshot();
        match self.history.redo(current) {
            Some(next) => {
                self.restore(next);
                self.dirty = true;
                true
            }
            None => false,
        }
    }

    // ─── Document lifecycle ──────────────────────────────────────────────

    /// Replace the whole document. Clears selection, hover and history and
    /// resets the dirty flag. The payload is trusted; run
    /// `Document::validate` first if it comes from an untrusted source.
    pub fn load_project(&mut self, document: Document) {
        let Document {
            nodes,
            root_ids,
            name,
        } = document;
        for id in nodes.keys() {
            self.ids.observe(*id);
        }
        self.nodes = nodes.into_iter().collect();
        self.root_ids = root_ids.into_iter().collect();
        self.project_name = name;
        self.selected = None;
        self.hovered = None;
        self.history.clear();
        self.dirty = false;
        log::debug!(
            "load_project: {:?} with {} nodes",
            self.project_name,
            self.nodes.len()
        );
    }

    /// Tree payload for the persistence layer. UI state and history are
    /// not included.
    pub fn export_state(&self) -> DocumentState {
        DocumentState {
            nodes: self
                .nodes
                .iter()
                .map(|(id, node)| (*id, node.clone()))
                .collect(),
            root_ids: self.root_ids(),
        }
    }

    /// `export_state` plus the project name.
    pub fn to_document(&self) -> Document {
        self.export_state().into_document(self.project_name.clone())
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.project_name = name.into();
        self.dirty = true;
    }

    /// Called by the persistence layer once the document has been saved.
    pub fn mark_saved(&mut self) {
        self.dirty = false;
    }

    // ─── UI state (no history) ───────────────────────────────────────────

    /// Select a node, or clear the selection with `None`.
    /// Returns `false` (selection unchanged) if `id` is not in the document.
    pub fn select_node(&mut self, id: Option<NodeId>) -> bool {
        if let Some(id) = id
            && !self.nodes.contains_key(&id)
        {
            return false;
        }
        self.selected = id;
        true
    }

    /// Set the hovered node, or clear it with `None`.
    /// Returns `false` (hover unchanged) if `id` is not in the document.
    pub fn hover_node(&mut self, id: Option<NodeId>) -> bool {
        if let Some(id) = id
            && !self.nodes.contains_key(&id)
        {
            return false;
        }
        self.hovered = id;
        true
    }

    /// Set the zoom, clamped to the configured range. NaN is ignored.
    pub fn set_zoom(&mut self, zoom: f32) {
        if zoom.is_nan() {
            return;
        }
        self.view.zoom = zoom.clamp(self.config.min_zoom, self.config.max_zoom);
    }

    pub fn zoom_in(&mut self) {
        self.set_zoom(self.view.zoom + self.config.zoom_step);
    }

    pub fn zoom_out(&mut self) {
        self.set_zoom(self.view.zoom - self.config.zoom_step);
    }

    pub fn reset_zoom(&mut self) {
        self.set_zoom(1.0);
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.view.pan = (x, y);
    }

    pub fn set_active_panel(&mut self, panel: Panel) {
        self.view.active_panel = panel;
    }

    /// Switch between edit and preview. Entering preview drops the selection
    /// and hover.
    pub fn set_mode(&mut self, mode: EditorMode) {
        self.view.mode = mode;
        if mode == EditorMode::Preview {
            self.selected = None;
            self.hovered = None;
        }
    }

    // ─── Shortcuts ───────────────────────────────────────────────────────

    /// Execute a resolved keyboard shortcut. Returns `true` if anything
    /// changed. Tree-changing actions are ignored in preview mode.
    pub fn dispatch(&mut self, action: ShortcutAction) -> bool {
        if self.view.mode == EditorMode::Preview && action.is_structural() {
            log::debug!("dispatch: {} ignored in preview", action.name());
            return false;
        }
        match action {
            ShortcutAction::Undo => self.undo(),
            ShortcutAction::Redo => self.redo(),
            ShortcutAction::Delete => match self.selected {
                Some(id) => self.delete_node(id).is_ok(),
                None => false,
            },
            ShortcutAction::Duplicate => match self.selected {
                Some(id) => self.duplicate_node(id).is_ok(),
                None => false,
            },
            ShortcutAction::Deselect => self.selected.take().is_some(),
            ShortcutAction::ZoomIn => {
                let before = self.view.zoom;
                self.zoom_in();
                self.view.zoom != before
            }
            ShortcutAction::ZoomOut => {
                let before = self.view.zoom;
                self.zoom_out();
                self.view.zoom != before
            }
            ShortcutAction::ZoomReset => {
                let before = self.view.zoom;
                self.reset_zoom();
                self.view.zoom != before
            }
            ShortcutAction::TogglePreview => {
                let next = match self.view.mode {
                    EditorMode::Edit => EditorMode::Preview,
                    EditorMode::Preview => EditorMode::Edit,
                };
                self.set_mode(next);
                true
            }
        }
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn require(&self, id: NodeId) -> Result<&Node, EditError> {
        self.nodes.get(&id).ok_or(EditError::NodeNotFound(id))
    }

    fn snapshot(&self) -> Snapshot {
        Snapshot {
            nodes: self.nodes.clone(),
            root_ids: self.root_ids.clone(),
            selected: self.selected,
        }
    }

    fn restore(&mut self, snapshot: Snapshot) {
        self.nodes = snapshot.nodes;
        self.root_ids = snapshot.root_ids;
        self.selected = snapshot.selected;
        if self.hovered.is_some_and(|h| !self.nodes.contains_key(&h)) {
            self.hovered = None;
        }
    }

    /// Capture the pre-mutation state and mark the document dirty.
    fn record(&mut self) {
        let snapshot = self.snapshot();
        self.history.record(snapshot);
        self.dirty = true;
    }

    /// Index of `id` within its container (parent's children or roots).
    fn position_in_container(&self, id: NodeId) -> Option<usize> {
        match self.parent_of(id) {
            None => self.root_ids.index_of(&id),
            Some(pid) => self
                .nodes
                .get(&pid)
                .and_then(|p| p.children.iter().position(|c| *c == id)),
        }
    }

    /// Insert `id` into `parent`'s children (or the roots) and point its
    /// `parent_id` there. `None` or an out-of-range index appends.
    fn link(&mut self, id: NodeId, parent: Option<NodeId>, index: Option<usize>) {
        match parent {
            None => {
                let len = self.root_ids.len();
                let at = index.map_or(len, |i| i.min(len));
                self.root_ids.insert(at, id);
            }
            Some(pid) => {
                if let Some(p) = self.nodes.get_mut(&pid) {
                    let len = p.children.len();
                    let at = index.map_or(len, |i| i.min(len));
                    p.children.insert(at, id);
                }
            }
        }
        if let Some(node) = self.nodes.get_mut(&id) {
            node.parent_id = parent;
        }
    }

    /// Remove `id` from `parent`'s children (or the roots).
    fn unlink(&mut self, id: NodeId, parent: Option<NodeId>) {
        match parent {
            None => {
                if let Some(pos) = self.root_ids.index_of(&id) {
                    self.root_ids.remove(pos);
                }
            }
            Some(pid) => {
                if let Some(p) = self.nodes.get_mut(&pid) {
                    p.children.retain(|c| *c != id);
                }
            }
        }
    }
}
