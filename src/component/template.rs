//! Component classes and the templates construction nodes own.
//!
//! A `ComponentClass` describes a kind of component: whether it lives in the
//! scene hierarchy, which sockets it exposes, and its default property values.
//! A `ComponentTemplate` is one configured prototype of a class; every
//! instance spawned from a node starts as a copy of its template.

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use super::property::{PropertyMap, PropertyValue};
use crate::core::types::{names_match, Transform, TransformFields};

/// A component type known to the registry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentClass {
    pub name: String,
    /// Scene components carry a transform and take part in attachment
    #[serde(default)]
    pub scene: bool,
    /// Default property values copied into every new template
    #[serde(default)]
    pub defaults: PropertyMap,
    /// Named attach points children may target
    #[serde(default)]
    pub sockets: Vec<String>,
}

impl ComponentClass {
    /// A plain (non-scene) component class
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scene: false,
            defaults: PropertyMap::new(),
            sockets: Vec::new(),
        }
    }

    /// A scene component class
    pub fn scene(name: impl Into<String>) -> Self {
        Self {
            scene: true,
            ..Self::new(name)
        }
    }

    pub fn with_default(mut self, key: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        self.defaults.insert(key.into(), value.into());
        self
    }

    pub fn with_socket(mut self, socket: impl Into<String>) -> Self {
        self.sockets.push(socket.into());
        self
    }

    pub fn has_socket(&self, socket: &str) -> bool {
        self.sockets.iter().any(|s| names_match(s, socket))
    }
}

/// Prototype object for a construction node or native component
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentTemplate {
    /// Object name of the template itself
    #[serde(default)]
    pub name: String,
    /// Name of the `ComponentClass` this template is an instance of
    #[serde(default)]
    pub class: String,
    #[serde(default)]
    pub properties: PropertyMap,
    /// Relative transform (ignored for non-scene classes)
    #[serde(default)]
    pub transform: Transform,
    /// Transform fields explicitly set by the author
    #[serde(default)]
    pub authored: TransformFields,
}

impl ComponentTemplate {
    /// Create a template of `class` with the class defaults
    pub fn from_class(class: &ComponentClass, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.name.clone(),
            properties: class.defaults.clone(),
            transform: Transform::IDENTITY,
            authored: TransformFields::NONE,
        }
    }

    pub fn property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    pub fn set_property(&mut self, key: impl Into<String>, value: impl Into<PropertyValue>) {
        self.properties.insert(key.into(), value.into());
    }

    pub fn set_relative_location(&mut self, location: Vec3) {
        self.transform.location = location;
        self.authored.location = true;
    }

    pub fn set_relative_rotation(&mut self, rotation: Quat) {
        self.transform.rotation = rotation;
        self.authored.rotation = true;
    }

    pub fn set_relative_scale(&mut self, scale: Vec3) {
        self.transform.scale = scale;
        self.authored.scale = true;
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Full property copy used by the generic instancing path
    pub fn duplicate_properties(&self) -> PropertyMap {
        self.properties.clone()
    }

    /// Whether `adopt_class_defaults` would change anything
    pub fn lacks_class_defaults(&self, class: &ComponentClass) -> bool {
        self.class.is_empty() || class.defaults.keys().any(|k| !self.properties.contains_key(k))
    }

    /// Fill in class name and any default properties the template lacks
    ///
    /// Templates read from hand-written files usually list only the values
    /// they change.
    pub fn adopt_class_defaults(&mut self, class: &ComponentClass) {
        if self.class.is_empty() {
            self.class = class.name.clone();
        }
        for (key, value) in &class.defaults {
            self.properties
                .entry(key.clone())
                .or_insert_with(|| value.clone());
        }
    }
}
