pub mod document;
pub mod id;
pub mod model;
pub mod registry;

pub use document::{Document, DocumentError, DocumentState, validate_tree};
pub use id::{IdGenerator, NodeId};
pub use model::{Children, Node, Props};
pub use registry::{ComponentMeta, ComponentRegistry, PropMeta, RegistryError, StaticRegistry};
