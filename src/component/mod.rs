//! Component classes, templates and property values.

pub mod property;
pub mod template;

pub use property::{PropertyMap, PropertyValue};
pub use template::{ComponentClass, ComponentTemplate};
