//! Runtime owners and the component instances construction creates on them.

use ahash::AHashMap;
use serde::Serialize;

use crate::component::{ComponentClass, PropertyMap};
use crate::core::error::{ConstructError, Result};
use crate::core::types::{names_match, InstanceId, NodeGuid, Transform};
use crate::scs::PreviewInstances;

/// Where a scene component hangs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Attachment {
    pub parent: InstanceId,
    /// Socket on the parent; `None` attaches at the parent's origin
    pub socket: Option<String>,
}

/// A live component on an owner
#[derive(Debug, Clone, Serialize)]
pub struct ComponentInstance {
    pub id: InstanceId,
    pub name: String,
    pub class: String,
    pub scene: bool,
    pub properties: PropertyMap,
    /// Relative transform
    pub transform: Transform,
    pub attachment: Option<Attachment>,
    /// Construction node this instance was created from (`None` for natives)
    pub source_node: Option<NodeGuid>,
    /// Class that declared this instance as a native component
    pub native_of: Option<String>,
}

/// The object construction builds components on
#[derive(Debug, Clone, Serialize)]
pub struct Owner {
    pub name: String,
    pub class: String,
    components: Vec<ComponentInstance>,
    root: Option<InstanceId>,
    /// Runtime variables, keyed by lowercased variable name
    fields: AHashMap<String, InstanceId>,
}

impl Owner {
    pub fn new(name: impl Into<String>, class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class: class.into(),
            components: Vec::new(),
            root: None,
            fields: AHashMap::new(),
        }
    }

    /// Create an unattached component
    pub fn add_component(
        &mut self,
        name: impl Into<String>,
        class: &ComponentClass,
        properties: PropertyMap,
        transform: Transform,
        source_node: Option<NodeGuid>,
    ) -> InstanceId {
        let id = InstanceId(self.components.len() as u32);
        self.components.push(ComponentInstance {
            id,
            name: name.into(),
            class: class.name.clone(),
            scene: class.scene,
            properties,
            transform,
            attachment: None,
            source_node,
            native_of: None,
        });
        id
    }

    pub fn component(&self, id: InstanceId) -> Option<&ComponentInstance> {
        self.components.get(id.0 as usize)
    }

    pub fn component_mut(&mut self, id: InstanceId) -> Option<&mut ComponentInstance> {
        self.components.get_mut(id.0 as usize)
    }

    pub fn components(&self) -> &[ComponentInstance] {
        &self.components
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn root_component(&self) -> Option<InstanceId> {
        self.root
    }

    /// Make `id` the owner's root; only scene components qualify
    pub fn set_root_component(&mut self, id: InstanceId) -> Result<()> {
        let component = self.scene_component(id)?;
        if component.attachment.is_some() {
            return Err(ConstructError::InvalidAttachment(format!(
                "{} is attached and cannot become the root",
                component.name
            )));
        }
        self.root = Some(id);
        Ok(())
    }

    /// Attach `child` to `parent` at `socket`
    ///
    /// Both must be scene components and the link may not close a loop.
    /// Re-attaching an attached child moves it.
    pub fn attach(
        &mut self,
        child: InstanceId,
        parent: InstanceId,
        socket: Option<&str>,
    ) -> Result<()> {
        let child_name = self.scene_component(child)?.name.clone();
        self.scene_component(parent)?;
        if self.root == Some(child) {
            return Err(ConstructError::InvalidAttachment(format!(
                "root component {} cannot be attached",
                child_name
            )));
        }

        let mut cursor = Some(parent);
        while let Some(current) = cursor {
            if current == child {
                return Err(ConstructError::InvalidAttachment(format!(
                    "attaching {} would create a loop",
                    child_name
                )));
            }
            cursor = self
                .component(current)
                .and_then(|c| c.attachment.as_ref())
                .map(|a| a.parent);
        }

        if let Some(component) = self.component_mut(child) {
            component.attachment = Some(Attachment {
                parent,
                socket: socket.map(str::to_string),
            });
        }
        Ok(())
    }

    /// Instances directly attached to `parent`, in creation order
    pub fn children_of(&self, parent: InstanceId) -> Vec<InstanceId> {
        self.components
            .iter()
            .filter(|c| matches!(&c.attachment, Some(a) if a.parent == parent))
            .map(|c| c.id)
            .collect()
    }

    /// First component with the given object name
    pub fn find_component(&self, name: &str) -> Option<InstanceId> {
        self.components
            .iter()
            .find(|c| names_match(&c.name, name))
            .map(|c| c.id)
    }

    /// Native component `name` declared by `class`
    pub fn native_component(&self, class: &str, name: &str) -> Option<InstanceId> {
        self.components
            .iter()
            .find(|c| {
                c.native_of.as_deref().map_or(false, |owner| names_match(owner, class))
                    && names_match(&c.name, name)
            })
            .map(|c| c.id)
    }

    /// Record that `id` is a native component of `class`
    pub fn mark_native(&mut self, id: InstanceId, class: &str) {
        if let Some(component) = self.component_mut(id) {
            component.native_of = Some(class.to_string());
        }
    }

    /// Component instantiated from construction node `guid`
    pub fn component_from_node(&self, guid: NodeGuid) -> Option<InstanceId> {
        self.components
            .iter()
            .find(|c| c.source_node == Some(guid))
            .map(|c| c.id)
    }

    pub fn field(&self, variable_name: &str) -> Option<InstanceId> {
        self.fields.get(&variable_name.to_ascii_lowercase()).copied()
    }

    pub fn set_field(&mut self, variable_name: &str, id: InstanceId) {
        self.fields.insert(variable_name.to_ascii_lowercase(), id);
    }

    fn scene_component(&self, id: InstanceId) -> Result<&ComponentInstance> {
        let component = self
            .component(id)
            .ok_or_else(|| ConstructError::InvalidAttachment(format!("no component {:?}", id)))?;
        if !component.scene {
            return Err(ConstructError::InvalidAttachment(format!(
                "{} is not a scene component",
                component.name
            )));
        }
        Ok(component)
    }
}

impl PreviewInstances for Owner {
    fn rename_instances_from(&mut self, node: NodeGuid, new_name: &str) -> usize {
        let mut renamed = 0;
        for index in 0..self.components.len() {
            if self.components[index].source_node != Some(node) {
                continue;
            }
            let id = self.components[index].id;
            let old_key = self.components[index].name.to_ascii_lowercase();
            if self.fields.get(&old_key) == Some(&id) {
                self.fields.remove(&old_key);
                self.fields.insert(new_name.to_ascii_lowercase(), id);
            }
            self.components[index].name = new_name.to_string();
            renamed += 1;
        }
        renamed
    }
}
