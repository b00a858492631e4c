//! Cooked instancing data and the choice between fast and generic instancing.
//!
//! Cooking snapshots the full property set of a template as it stands at
//! cook time. Instancing from cooked data copies that snapshot and never
//! looks at the template or at the class defaults again.

use serde::{Deserialize, Serialize};

use crate::component::{ComponentClass, ComponentTemplate, PropertyMap};
use crate::core::types::{names_match, Transform, TransformFields};

/// Precomputed instancing snapshot for one template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CookedInstancingData {
    /// Class the data was cooked against
    pub component_class: String,
    /// Every property of the template when it was cooked
    pub properties: PropertyMap,
    pub transform: Transform,
    pub authored: TransformFields,
}

impl CookedInstancingData {
    /// Cook `template` against its class
    pub fn build(template: &ComponentTemplate, class: &ComponentClass) -> Self {
        Self {
            component_class: class.name.clone(),
            properties: template.duplicate_properties(),
            transform: template.transform,
            authored: template.authored,
        }
    }

    /// Whether this data can instance a component of `class`
    pub fn is_valid_for(&self, class: &ComponentClass) -> bool {
        names_match(&self.component_class, &class.name)
    }
}

/// Where an instance's initial state comes from
#[derive(Debug, Clone, Copy)]
pub enum InstancingSource<'a> {
    /// Fast path: the cooked snapshot
    Cooked(&'a CookedInstancingData),
    /// Generic path: duplicate the template
    Template(&'a ComponentTemplate),
}

impl InstancingSource<'_> {
    /// Initial properties, transform and authored mask for a new instance
    pub fn instance_state(&self) -> (PropertyMap, Transform, TransformFields) {
        match self {
            InstancingSource::Cooked(data) => {
                (data.properties.clone(), data.transform, data.authored)
            }
            InstancingSource::Template(template) => (
                template.duplicate_properties(),
                template.transform,
                template.authored,
            ),
        }
    }

    pub fn is_cooked(&self) -> bool {
        matches!(self, InstancingSource::Cooked(_))
    }
}
