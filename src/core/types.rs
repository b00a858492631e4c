//! Core type definitions used throughout the codebase

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier of a construction node
///
/// Survives variable renames. A nil guid marks a node loaded from data that
/// predates the field; `NodeTree::post_load` backfills it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeGuid(pub Uuid);

impl NodeGuid {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn nil() -> Self {
        Self(Uuid::nil())
    }

    pub fn is_nil(&self) -> bool {
        self.0.is_nil()
    }

    /// Deterministic guid derived from a qualified name
    ///
    /// Loading the same legacy data twice yields the same identifiers.
    pub fn from_name(qualified_name: &str) -> Self {
        Self(Uuid::new_v5(&Uuid::NAMESPACE_OID, qualified_name.as_bytes()))
    }
}

impl Default for NodeGuid {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for NodeGuid {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a component instance inside its owner
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InstanceId(pub u32);

/// Names compare case-insensitively, matching how variable names are keyed
pub fn names_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b)
}

/// Local transform of a component relative to its attach parent
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Transform {
    pub location: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    pub const IDENTITY: Self = Self {
        location: Vec3::ZERO,
        rotation: Quat::IDENTITY,
        scale: Vec3::ONE,
    };

    pub fn from_location(location: Vec3) -> Self {
        Self {
            location,
            ..Self::IDENTITY
        }
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Which transform fields a template author set explicitly
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformFields {
    pub location: bool,
    pub rotation: bool,
    pub scale: bool,
}

impl TransformFields {
    pub const NONE: Self = Self {
        location: false,
        rotation: false,
        scale: false,
    };

    pub fn any(&self) -> bool {
        self.location || self.rotation || self.scale
    }
}
