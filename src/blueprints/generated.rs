//! Generated blueprint classes.
//!
//! A generated class is the compiled form of a blueprint: its parent class,
//! the native components every instance gets, its construction tree, and
//! the overrides it applies to components inherited from ancestor trees.

use serde::{Deserialize, Serialize};

use crate::component::ComponentTemplate;
use crate::core::types::{names_match, NodeGuid};
use crate::scs::{ConstructionNode, CookedInstancingData, NodeTree};

/// Identifies an inherited node: owning class plus guid (or name for data
/// written before guids existed)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentKey {
    pub owner_class: String,
    pub variable_name: String,
    #[serde(default = "NodeGuid::nil")]
    pub guid: NodeGuid,
}

impl ComponentKey {
    pub fn for_node(owner_class: &str, node: &ConstructionNode) -> Self {
        Self {
            owner_class: owner_class.to_string(),
            variable_name: node.variable_name().to_string(),
            guid: node.guid(),
        }
    }

    pub fn matches(&self, owner_class: &str, node: &ConstructionNode) -> bool {
        if !names_match(&self.owner_class, owner_class) {
            return false;
        }
        if self.guid.is_nil() {
            names_match(&self.variable_name, node.variable_name())
        } else {
            self.guid == node.guid()
        }
    }
}

/// A derived class's replacement template for an inherited node
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentOverride {
    pub key: ComponentKey,
    pub template: ComponentTemplate,
    /// Cooked data for `template`; absent means instance from the template
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooked: Option<CookedInstancingData>,
}

/// Compiled blueprint class
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedClass {
    pub name: String,
    #[serde(default)]
    pub parent: Option<String>,
    /// Components declared natively on the class, created before any tree
    #[serde(default)]
    pub native_components: Vec<ComponentTemplate>,
    #[serde(default)]
    pub construction: NodeTree,
    #[serde(default)]
    pub overrides: Vec<ComponentOverride>,
}

impl GeneratedClass {
    pub fn new(name: impl Into<String>, parent: Option<&str>) -> Self {
        let name = name.into();
        Self {
            construction: NodeTree::new(name.clone()),
            name,
            parent: parent.map(str::to_string),
            native_components: Vec::new(),
            overrides: Vec::new(),
        }
    }

    pub fn with_native_component(mut self, template: ComponentTemplate) -> Self {
        self.native_components.push(template);
        self
    }

    pub fn find_native_component(&self, name: &str) -> Option<&ComponentTemplate> {
        self.native_components
            .iter()
            .find(|t| names_match(&t.name, name))
    }

    /// Override this class applies to `node` from `owner_class`'s tree
    pub fn find_override(
        &self,
        owner_class: &str,
        node: &ConstructionNode,
    ) -> Option<&ComponentOverride> {
        self.overrides
            .iter()
            .find(|o| o.key.matches(owner_class, node))
    }

    /// Override `node` (defined by `owner_class`) with `template`
    ///
    /// Replaces any existing override for the same node and drops its cooked
    /// data; cook the class again to restore the fast path.
    pub fn set_override(
        &mut self,
        owner_class: &str,
        node: &ConstructionNode,
        template: ComponentTemplate,
    ) -> &mut ComponentOverride {
        let index = match self
            .overrides
            .iter()
            .position(|o| o.key.matches(owner_class, node))
        {
            Some(index) => {
                self.overrides[index].template = template;
                self.overrides[index].cooked = None;
                index
            }
            None => {
                self.overrides.push(ComponentOverride {
                    key: ComponentKey::for_node(owner_class, node),
                    template,
                    cooked: None,
                });
                self.overrides.len() - 1
            }
        };
        &mut self.overrides[index]
    }

    pub fn remove_override(
        &mut self,
        owner_class: &str,
        node: &ConstructionNode,
    ) -> Option<ComponentOverride> {
        let index = self
            .overrides
            .iter()
            .position(|o| o.key.matches(owner_class, node))?;
        Some(self.overrides.remove(index))
    }
}
