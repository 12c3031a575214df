//! WASM bridge for Vedit: exposes the editor store to the JavaScript UI.
//!
//! Compiled via `wasm-pack build --target web`. Every method takes and
//! returns plain strings, numbers and booleans; structured values cross the
//! boundary as JSON. An empty string stands for "no node" (root level,
//! cleared selection, failed creation).

use serde::Serialize;
use vedit_core::{Document, NodeId, Props, StaticRegistry};
use vedit_editor::{EditorConfig, EditorMode, EditorStore, Panel, ShortcutMap};
use wasm_bindgen::prelude::*;

/// Install the panic hook and route `log` output to the browser console.
/// Call once before constructing an editor.
#[wasm_bindgen]
pub fn vedit_init() {
    console_error_panic_hook::set_once();
    console_log::init_with_level(log::Level::Debug).ok();
}

/// The JS-facing editor handle. All interaction from the UI goes through it.
#[wasm_bindgen]
pub struct VeditEditor {
    store: EditorStore,
}

#[derive(Serialize)]
struct KeyResult {
    changed: bool,
    action: &'static str,
}

#[derive(Serialize)]
struct LoadResult {
    ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl Default for VeditEditor {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl VeditEditor {
    /// Create an editor with an empty component registry and default config.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            store: EditorStore::new(StaticRegistry::new()),
        }
    }

    /// Create an editor from a (possibly partial) JSON config. Falls back to
    /// the defaults if the JSON is malformed.
    pub fn with_config_json(config_json: &str) -> Self {
        let config = EditorConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("invalid editor config, using defaults: {e}");
            EditorConfig::default()
        });
        Self {
            store: EditorStore::with_config(StaticRegistry::new(), config),
        }
    }

    /// Replace the component registry from a JSON catalog.
    /// Returns `false` (registry unchanged) on malformed input.
    pub fn load_registry_json(&mut self, json: &str) -> bool {
        match StaticRegistry::from_json(json) {
            Ok(registry) => {
                self.store.set_registry(registry);
                true
            }
            Err(e) => {
                log::warn!("{e}");
                false
            }
        }
    }

    // ─── Mutations ───────────────────────────────────────────────────────

    /// Add a node. `parent_id` empty = root level; negative `index` appends.
    /// Returns the new node ID, or an empty string if the call was refused.
    pub fn add_node(&mut self, component: &str, parent_id: &str, index: i32) -> String {
        let index = usize::try_from(index).ok();
        self.store
            .add_node(component, parse_id(parent_id), index)
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// Shallow-merge a JSON object into a node's props.
    pub fn update_node_props_json(&mut self, node_id: &str, json: &str) -> bool {
        let Some(id) = parse_id(node_id) else {
            return false;
        };
        let partial: Props = match serde_json::from_str(json) {
            Ok(p) => p,
            Err(e) => {
                log::warn!("update_node_props_json: {e}");
                return false;
            }
        };
        self.store.update_node_props(id, partial).is_ok()
    }

    pub fn delete_node(&mut self, node_id: &str) -> bool {
        parse_id(node_id).is_some_and(|id| self.store.delete_node(id).is_ok())
    }

    /// Move a node. `parent_id` empty = root level.
    pub fn move_node(&mut self, node_id: &str, parent_id: &str, index: u32) -> bool {
        let Some(id) = parse_id(node_id) else {
            return false;
        };
        self.store
            .move_node(id, parse_id(parent_id), index as usize)
            .is_ok()
    }

    /// Returns the copy's ID, or an empty string if `node_id` is unknown.
    pub fn duplicate_node(&mut self, node_id: &str) -> String {
        parse_id(node_id)
            .and_then(|id| self.store.duplicate_node(id).ok())
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    pub fn clear_canvas(&mut self) {
        self.store.clear_canvas();
    }

    pub fn begin_batch(&mut self) {
        self.store.begin_batch();
    }

    pub fn end_batch(&mut self) {
        self.store.end_batch();
    }

    pub fn undo(&mut self) -> bool {
        self.store.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.store.redo()
    }

    pub fn can_undo(&self) -> bool {
        self.store.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.store.can_redo()
    }

    // ─── Selection & view ────────────────────────────────────────────────

    /// Select a node; an empty ID clears the selection.
    pub fn select_node(&mut self, node_id: &str) -> bool {
        self.store.select_node(parse_id(node_id))
    }

    /// Hover a node; an empty ID clears the hover.
    pub fn hover_node(&mut self, node_id: &str) -> bool {
        self.store.hover_node(parse_id(node_id))
    }

    pub fn selected_id(&self) -> String {
        self.store
            .selected_id()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    /// `"edit"` or `"preview"`. Returns `false` for anything else.
    pub fn set_mode(&mut self, mode: &str) -> bool {
        match serde_json::from_value::<EditorMode>(serde_json::Value::from(mode)) {
            Ok(mode) => {
                self.store.set_mode(mode);
                true
            }
            Err(_) => false,
        }
    }

    /// `"components"`, `"layers"` or `"properties"`.
    pub fn set_active_panel(&mut self, panel: &str) -> bool {
        match serde_json::from_value::<Panel>(serde_json::Value::from(panel)) {
            Ok(panel) => {
                self.store.set_active_panel(panel);
                true
            }
            Err(_) => false,
        }
    }

    pub fn set_zoom(&mut self, zoom: f32) {
        self.store.set_zoom(zoom);
    }

    pub fn zoom(&self) -> f32 {
        self.store.view().zoom
    }

    pub fn set_pan(&mut self, x: f32, y: f32) {
        self.store.set_pan(x, y);
    }

    /// Handle a keyboard event. Returns JSON:
    /// `{"changed":bool,"action":"<action_name>"}` (`"none"` if unbound).
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> String {
        let result = match ShortcutMap::resolve(key, ctrl, shift, alt, meta) {
            Some(action) => KeyResult {
                changed: self.store.dispatch(action),
                action: action.name(),
            },
            None => KeyResult {
                changed: false,
                action: "none",
            },
        };
        to_json(&result)
    }

    // ─── Persistence boundary ────────────────────────────────────────────

    /// Load a `{nodes, rootIds, name}` document. The payload is validated
    /// here since it comes straight from JS. Returns JSON
    /// `{"ok":true}` or `{"ok":false,"error":"..."}`.
    pub fn load_project_json(&mut self, json: &str) -> String {
        let loaded = Document::from_json(json).and_then(|doc| {
            doc.validate()?;
            Ok(doc)
        });
        let result = match loaded {
            Ok(doc) => {
                self.store.load_project(doc);
                LoadResult {
                    ok: true,
                    error: None,
                }
            }
            Err(e) => {
                log::warn!("load_project_json: {e}");
                LoadResult {
                    ok: false,
                    error: Some(e.to_string()),
                }
            }
        };
        to_json(&result)
    }

    /// `{nodes, rootIds}` without UI state.
    pub fn export_state_json(&self) -> String {
        to_json(&self.store.export_state())
    }

    /// `{nodes, rootIds, name}` for saving.
    pub fn export_document_json(&self) -> String {
        to_json(&self.store.to_document())
    }

    pub fn is_dirty(&self) -> bool {
        self.store.is_dirty()
    }

    pub fn mark_saved(&mut self) {
        self.store.mark_saved();
    }

    pub fn project_name(&self) -> String {
        self.store.project_name().to_string()
    }

    pub fn set_project_name(&mut self, name: &str) {
        self.store.set_project_name(name);
    }

    // ─── Read selectors ──────────────────────────────────────────────────

    /// A node as JSON, or `null` if it doesn't exist.
    pub fn get_node_json(&self, node_id: &str) -> String {
        let node = parse_id(node_id).and_then(|id| self.store.node(id));
        to_json(&node)
    }

    pub fn get_root_ids_json(&self) -> String {
        to_json(&self.store.root_ids())
    }
}

/// Empty string = no node.
fn parse_id(s: &str) -> Option<NodeId> {
    if s.is_empty() {
        None
    } else {
        Some(NodeId::intern(s))
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| {
        log::error!("bridge serialization failed: {e}");
        "null".to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const CATALOG: &str = r#"[
        { "name": "Button", "props": [{ "name": "label", "defaultValue": "Open" }] },
        { "name": "Card" }
    ]"#;

    fn editor() -> VeditEditor {
        let mut editor = VeditEditor::new();
        assert!(editor.load_registry_json(CATALOG));
        editor
    }

    #[test]
    fn add_and_read_back_node() {
        let mut editor = editor();
        let card = editor.add_node("Card", "", -1);
        let btn = editor.add_node("Button", &card, 0);
        assert!(!btn.is_empty());

        let node: serde_json::Value = serde_json::from_str(&editor.get_node_json(&btn)).unwrap();
        assert_eq!(node["parentId"], serde_json::json!(card));
        assert_eq!(node["props"]["label"], serde_json::json!("Open"));
        assert_eq!(editor.selected_id(), btn);
    }

    #[test]
    fn refused_calls_return_empty_or_false() {
        let mut editor = editor();
        assert_eq!(editor.add_node("Modal", "", -1), "");
        assert_eq!(editor.duplicate_node("missing"), "");
        assert!(!editor.delete_node(""));
        assert!(!editor.update_node_props_json("missing", "{}"));
        assert!(!editor.load_registry_json("not json"));
        assert!(!editor.set_mode("fullscreen"));
        assert_eq!(editor.get_node_json("missing"), "null");
    }

    #[test]
    fn handle_key_dispatches_undo() {
        let mut editor = editor();
        editor.add_node("Card", "", -1);
        assert_eq!(
            editor.handle_key("z", true, false, false, false),
            r#"{"changed":true,"action":"undo"}"#
        );
        assert_eq!(editor.get_root_ids_json(), "[]");
        assert_eq!(
            editor.handle_key("q", false, false, false, false),
            r#"{"changed":false,"action":"none"}"#
        );
    }

    #[test]
    fn load_project_validates_payload() {
        let mut editor = editor();
        let bad = r#"{ "name": "x", "rootIds": ["a"], "nodes": {} }"#;
        let result: serde_json::Value =
            serde_json::from_str(&editor.load_project_json(bad)).unwrap();
        assert_eq!(result["ok"], serde_json::json!(false));

        let good = r#"{ "name": "Inbox", "rootIds": ["a"],
            "nodes": { "a": { "id": "a", "type": "Card", "props": {}, "children": [], "parentId": null } } }"#;
        assert_eq!(editor.load_project_json(good), r#"{"ok":true}"#);
        assert_eq!(editor.project_name(), "Inbox");
        assert!(!editor.is_dirty());
        assert_eq!(editor.get_root_ids_json(), r#"["a"]"#);
    }

    #[test]
    fn partial_config_sets_zoom_range() {
        let mut editor = VeditEditor::with_config_json(r#"{ "maxZoom": 2.0 }"#);
        editor.set_zoom(3.0);
        assert_eq!(editor.zoom(), 2.0);
        editor.set_zoom(0.01);
        assert_eq!(editor.zoom(), 0.1);
    }

    #[test]
    fn inverted_config_zoom_is_safe() {
        let mut editor = VeditEditor::with_config_json(r#"{ "minZoom": 5.0 }"#);
        editor.set_zoom(1.0);
        assert_eq!(editor.zoom(), 4.0);
    }

    #[test]
    fn malformed_config_falls_back_to_defaults() {
        let mut editor = VeditEditor::with_config_json("not json");
        editor.set_zoom(100.0);
        assert_eq!(editor.zoom(), 4.0);
        assert_eq!(
            editor.handle_key("0", true, false, false, false),
            r#"{"changed":true,"action":"zoomReset"}"#
        );
        assert_eq!(editor.zoom(), 1.0);
    }

    #[test]
    fn mode_switch_clears_selection() {
        let mut editor = editor();
        editor.add_node("Card", "", -1);
        assert!(editor.set_mode("preview"));
        assert_eq!(editor.selected_id(), "");
        assert!(editor.set_active_panel("layers"));
    }
}
