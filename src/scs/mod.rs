//! Construction scripts: trees of component prototypes.
//!
//! Each blueprint class owns a `NodeTree`. A node holds one component
//! template, where it attaches, and its child nodes. Roots may name a parent
//! that lives outside the tree (a native component, or a node inherited from
//! an ancestor class), resolved by name at construction time.

pub mod cooked;
pub mod metadata;
pub mod migrate;
pub mod naming;
pub mod node;
pub mod parent;
pub mod tree;
pub mod validation;

pub use cooked::{CookedInstancingData, InstancingSource};
pub use metadata::{MetadataEntry, MetadataStore};
pub use migrate::MigrationReport;
pub use naming::{template_name_for, NameChange, NameChangedHook, PreviewInstances};
pub use node::{ConstructionNode, NodeMut};
pub use parent::{resolve_parent, ParentRef, ParentResolution};
pub use tree::NodeTree;
pub use validation::DataValidation;
