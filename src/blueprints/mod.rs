//! Blueprint classes and the owners they construct
//!
//! This module holds the compiled side of the system: generated classes with
//! their parent links, native components, construction trees and overrides,
//! the registry that loads and cooks them, and the runtime owner objects
//! construction builds components on.

pub mod generated;
pub mod instance;
pub mod registry;
pub mod schema;

pub use generated::{ComponentKey, ComponentOverride, GeneratedClass};
pub use instance::*;
pub use registry::ClassRegistry;
pub use schema::*;
