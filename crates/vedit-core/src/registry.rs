//! Component registry contract.
//!
//! The editor asks a registry for a component's prop metadata when it
//! materializes a new node. Only `PropMeta::default_value` is read; the rest
//! of the metadata belongs to the UI layer (property panels, palettes).

use crate::model::Props;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

/// Metadata for a single prop of a component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

/// Metadata for a component kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentMeta {
    pub name: String,
    #[serde(default)]
    pub props: Vec<PropMeta>,
}

impl ComponentMeta {
    /// Initial props for a fresh node: every prop that declares a default.
    pub fn default_props(&self) -> Props {
        self.props
            .iter()
            .filter_map(|p| p.default_value.clone().map(|v| (p.name.clone(), v)))
            .collect()
    }
}

/// Lookup of component metadata by type name.
pub trait ComponentRegistry {
    fn lookup(&self, component: &str) -> Option<&ComponentMeta>;
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid registry JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// In-memory registry, typically loaded once from the component catalog.
#[derive(Debug, Clone, Default)]
pub struct StaticRegistry {
    components: HashMap<String, ComponentMeta>,
}

impl StaticRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a JSON array of `ComponentMeta`.
    ///
    /// # Errors
    /// Returns `RegistryError::Json` if the input is not a valid catalog.
    pub fn from_json(json: &str) -> Result<Self, RegistryError> {
        let metas: Vec<ComponentMeta> = serde_json::from_str(json)?;
        let mut registry = Self::new();
        for meta in metas {
            registry.register(meta);
        }
        Ok(registry)
    }

    /// Add or replace a component definition.
    pub fn register(&mut self, meta: ComponentMeta) {
        if self.components.contains_key(&meta.name) {
            log::debug!("registry: replacing component {}", meta.name);
        }
        self.components.insert(meta.name.clone(), meta);
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }
}

impl ComponentRegistry for StaticRegistry {
    fn lookup(&self, component: &str) -> Option<&ComponentMeta> {
        self.components.get(component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const CATALOG: &str = r#"[
        { "name": "Button", "props": [
            { "name": "label", "defaultValue": "Button" },
            { "name": "variant", "defaultValue": "primary" },
            { "name": "onClick" }
        ] },
        { "name": "Card" }
    ]"#;

    #[test]
    fn loads_catalog_from_json() {
        let registry = StaticRegistry::from_json(CATALOG).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.lookup("Card").is_some());
        assert!(registry.lookup("Tooltip").is_none());
    }

    #[test]
    fn default_props_skip_props_without_default() {
        let registry = StaticRegistry::from_json(CATALOG).unwrap();
        let props = registry.lookup("Button").unwrap().default_props();

        assert_eq!(props.len(), 2);
        assert_eq!(props["label"], json!("Button"));
        assert_eq!(props["variant"], json!("primary"));
        assert!(!props.contains_key("onClick"));
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = StaticRegistry::new();
        assert!(registry.is_empty());
        assert_eq!(registry.len(), 0);
        assert!(!StaticRegistry::from_json(CATALOG).unwrap().is_empty());
    }

    #[test]
    fn rejects_malformed_catalog() {
        let err = StaticRegistry::from_json(r#"{ "name": "Button" }"#).unwrap_err();
        assert!(err.to_string().starts_with("invalid registry JSON"));
    }
}
