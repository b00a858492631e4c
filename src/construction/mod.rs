//! Running construction trees to build component instances on an owner.

pub mod executor;
pub mod spawn;

pub use executor::{apply_root_transform, execute_node, ConstructionReport, InstancingContext};
pub use spawn::{run_construction, spawn, SpawnParams};
