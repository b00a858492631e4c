//! Construct Tree - component construction scripts for blueprint classes

pub mod blueprints;
pub mod component;
pub mod construction;
pub mod core;
pub mod scs;
