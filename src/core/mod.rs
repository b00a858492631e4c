pub mod config;
pub mod error;
pub mod types;

pub use config::{config, set_config, ConstructionConfig};
pub use error::{ConstructError, Result};
pub use types::{names_match, InstanceId, NodeGuid, Transform, TransformFields};
