//! Construction nodes.
//!
//! A node owns one component template and its child nodes. Children are
//! owned outright, so a subtree can only ever hang under one parent; the
//! guid checks on insertion catch the remaining ways of duplicating a node
//! (re-inserting a clone, or data copied between trees).

use std::ops::Deref;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cooked::CookedInstancingData;
use super::metadata::MetadataStore;
use super::naming::{template_name_for, validate_variable_name, NameChange, NameChangedHook};
use super::parent::ParentRef;
use crate::component::{ComponentClass, ComponentTemplate};
use crate::core::error::{ConstructError, Result};
use crate::core::types::{names_match, NodeGuid};

/// One component prototype in a construction tree
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConstructionNode {
    #[serde(default = "NodeGuid::nil")]
    guid: NodeGuid,
    #[serde(default)]
    variable_name: String,
    component_class: String,
    #[serde(default)]
    template: ComponentTemplate,
    /// Cooked fast-path data, written by `ClassRegistry::cook_class`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cooked: Option<CookedInstancingData>,
    /// Socket or bone on the parent instance to attach to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attach_to: Option<String>,
    /// Parent outside the tree structure (roots only)
    #[serde(default, skip_serializing_if = "ParentRef::is_unset")]
    pub parent: ParentRef,
    /// Editor category label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "MetadataStore::is_empty")]
    pub metadata: MetadataStore,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    children: Vec<ConstructionNode>,

    // Deprecated on-disk fields, consumed by `NodeTree::post_load`
    #[serde(default, rename = "is_native", skip_serializing)]
    pub(crate) legacy_is_native: bool,
    #[serde(default, rename = "native_component_name", skip_serializing)]
    pub(crate) legacy_native_component_name: Option<String>,
    #[serde(default, rename = "variable_name_auto_generated", skip_serializing)]
    pub(crate) legacy_name_auto_generated: bool,

    #[serde(skip)]
    on_name_changed: Option<NameChangedHook>,
}

impl ConstructionNode {
    /// Create a node for `class` with a fresh template
    pub fn new(class: &ComponentClass, variable_name: impl Into<String>) -> Result<Self> {
        let variable_name = variable_name.into();
        validate_variable_name(&variable_name)?;
        let template = ComponentTemplate::from_class(class, template_name_for(&variable_name));
        Ok(Self {
            guid: NodeGuid::new(),
            variable_name,
            component_class: class.name.clone(),
            template,
            cooked: None,
            attach_to: None,
            parent: ParentRef::Unset,
            category: None,
            metadata: MetadataStore::new(),
            children: Vec::new(),
            legacy_is_native: false,
            legacy_native_component_name: None,
            legacy_name_auto_generated: false,
            on_name_changed: None,
        })
    }

    /// Builder helper for socket attachment
    pub fn attached_to(mut self, socket: impl Into<String>) -> Self {
        self.attach_to = Some(socket.into());
        self
    }

    pub fn guid(&self) -> NodeGuid {
        self.guid
    }

    pub fn variable_name(&self) -> &str {
        &self.variable_name
    }

    pub fn component_class(&self) -> &str {
        &self.component_class
    }

    pub fn template(&self) -> &ComponentTemplate {
        &self.template
    }

    /// Edit the template; drops any cooked data taken from it
    pub fn template_mut(&mut self) -> &mut ComponentTemplate {
        self.cooked = None;
        &mut self.template
    }

    pub fn children(&self) -> &[ConstructionNode] {
        &self.children
    }

    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    // === STRUCTURE ===

    /// Append `node` (and its subtree) as the last child
    ///
    /// Fails if any node of the incoming subtree is already part of this
    /// subtree, which covers re-adding an ancestor under its own descendant.
    pub fn add_child(&mut self, node: ConstructionNode) -> Result<()> {
        self.check_insertable(&node)?;
        debug!(parent = %self.variable_name, child = %node.variable_name, "add child node");
        self.children.push(node);
        Ok(())
    }

    /// Detach the direct child with `guid`, returning its intact subtree
    pub fn remove_child(&mut self, guid: NodeGuid) -> Option<ConstructionNode> {
        let index = self.children.iter().position(|c| c.guid == guid)?;
        Some(self.children.remove(index))
    }

    /// Detach the direct child at `index`
    pub fn remove_child_at(&mut self, index: usize) -> Result<ConstructionNode> {
        if index >= self.children.len() {
            return Err(ConstructError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        Ok(self.children.remove(index))
    }

    /// Move every child of `source` under this node, keeping their order
    ///
    /// Children are appended, or inserted starting at `insert_at`. Holding
    /// both nodes mutably already rules out `self` living inside `source`.
    pub fn move_children_from(
        &mut self,
        source: &mut ConstructionNode,
        insert_at: Option<usize>,
    ) -> Result<()> {
        let index = insert_at.unwrap_or(self.children.len());
        if index > self.children.len() {
            return Err(ConstructError::IndexOutOfRange {
                index,
                len: self.children.len(),
            });
        }
        for child in &source.children {
            self.check_insertable(child)?;
        }
        let moved = std::mem::take(&mut source.children);
        self.children.splice(index..index, moved);
        Ok(())
    }

    /// Insert a list of subtrees at `index` (already validated by the caller)
    pub(crate) fn insert_children(&mut self, index: usize, nodes: Vec<ConstructionNode>) {
        self.children.splice(index..index, nodes);
    }

    pub(crate) fn take_children(&mut self) -> Vec<ConstructionNode> {
        std::mem::take(&mut self.children)
    }

    pub(crate) fn children_mut(&mut self) -> &mut Vec<ConstructionNode> {
        &mut self.children
    }

    fn check_insertable(&self, incoming: &ConstructionNode) -> Result<()> {
        let existing = self.all_nodes();
        for node in incoming.all_nodes() {
            if existing.iter().any(|e| e.guid == node.guid) {
                return Err(ConstructError::Cycle {
                    node: incoming.variable_name.clone(),
                    target: self.variable_name.clone(),
                });
            }
            if existing
                .iter()
                .any(|e| names_match(&e.variable_name, &node.variable_name))
            {
                return Err(ConstructError::DuplicateName(node.variable_name.clone()));
            }
        }
        Ok(())
    }

    // === TRAVERSAL ===

    /// This node and all descendants, parents before children
    pub fn all_nodes(&self) -> Vec<&ConstructionNode> {
        let mut nodes = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            nodes.push(node);
            stack.extend(node.children.iter().rev());
        }
        nodes
    }

    /// Whether this node or a descendant has `guid`
    pub fn contains(&self, guid: NodeGuid) -> bool {
        self.find(guid).is_some()
    }

    pub fn find(&self, guid: NodeGuid) -> Option<&ConstructionNode> {
        if self.guid == guid {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find(guid))
    }

    pub fn find_mut(&mut self, guid: NodeGuid) -> Option<&mut ConstructionNode> {
        if self.guid == guid {
            return Some(self);
        }
        self.children.iter_mut().find_map(|c| c.find_mut(guid))
    }

    pub fn find_by_name(&self, name: &str) -> Option<&ConstructionNode> {
        if names_match(&self.variable_name, name) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_name(name))
    }

    /// Whether this node is a strict descendant of `candidate`
    pub fn is_child_of(&self, candidate: &ConstructionNode) -> bool {
        candidate.children.iter().any(|c| c.contains(self.guid))
    }

    /// Direct parent of `guid` within this subtree
    pub(crate) fn parent_of(&self, guid: NodeGuid) -> Option<&ConstructionNode> {
        if self.children.iter().any(|c| c.guid == guid) {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.parent_of(guid))
    }

    /// Detach `guid` from anywhere below this node
    pub(crate) fn detach(&mut self, guid: NodeGuid) -> Option<ConstructionNode> {
        if let Some(node) = self.remove_child(guid) {
            return Some(node);
        }
        self.children.iter_mut().find_map(|c| c.detach(guid))
    }

    /// Number of levels in this subtree (a leaf is 1)
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(|c| c.depth()).max().unwrap_or(0)
    }

    /// Depth of `guid` below this node (this node is 1)
    pub(crate) fn depth_of(&self, guid: NodeGuid) -> Option<usize> {
        if self.guid == guid {
            return Some(1);
        }
        self.children
            .iter()
            .find_map(|c| c.depth_of(guid))
            .map(|d| d + 1)
    }

    /// Run `loader` on this node and every descendant, depth first
    ///
    /// Stops at the first error; the caller should treat the tree as not
    /// ready in that case. The loader can edit nodes but not restructure
    /// them.
    pub fn preload_chain<F>(&mut self, mut loader: F) -> Result<()>
    where
        F: FnMut(NodeMut<'_>) -> Result<()>,
    {
        self.preload_with(&mut loader)
    }

    fn preload_with<F>(&mut self, loader: &mut F) -> Result<()>
    where
        F: FnMut(NodeMut<'_>) -> Result<()>,
    {
        loader(NodeMut::new(self))?;
        for child in &mut self.children {
            child.preload_with(loader)?;
        }
        Ok(())
    }

    // === NAMING ===

    /// Register a callback for renames of this node
    pub fn set_on_name_changed(&mut self, hook: NameChangedHook) {
        self.on_name_changed = Some(hook);
    }

    pub fn clear_on_name_changed(&mut self) {
        self.on_name_changed = None;
    }

    /// Report a rename performed outside the tree to the registered hook
    pub fn name_was_modified(&self) {
        if let Some(hook) = &self.on_name_changed {
            hook.notify(&NameChange {
                guid: self.guid,
                old_name: self.variable_name.clone(),
                new_name: self.variable_name.clone(),
                template_name: None,
                previews_renamed: 0,
            });
        }
    }

    pub(crate) fn notify_renamed(&self, change: &NameChange) {
        if let Some(hook) = &self.on_name_changed {
            hook.notify(change);
        }
    }

    pub(crate) fn install_hook_recursive(&mut self, hook: Option<&NameChangedHook>) {
        self.on_name_changed = hook.cloned();
        for child in &mut self.children {
            child.install_hook_recursive(hook);
        }
    }

    /// Apply an already validated rename
    pub(crate) fn apply_rename(&mut self, new_name: &str, rename_template: bool) -> NameChange {
        let old_name = std::mem::replace(&mut self.variable_name, new_name.to_string());
        let template_name = rename_template.then(|| {
            let name = template_name_for(new_name);
            self.template.rename(name.clone());
            name
        });
        NameChange {
            guid: self.guid,
            old_name,
            new_name: new_name.to_string(),
            template_name,
            previews_renamed: 0,
        }
    }

    pub(crate) fn set_guid(&mut self, guid: NodeGuid) {
        self.guid = guid;
    }

    pub(crate) fn set_generated_name(&mut self, name: String) {
        self.variable_name = name;
    }

    // === METADATA ===

    pub fn set_meta_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.set_meta_data(key, value);
    }

    pub fn get_meta_data(&self, key: &str) -> Result<&str> {
        self.metadata.get_meta_data(key)
    }

    pub fn remove_meta_data(&mut self, key: &str) {
        self.metadata.remove_meta_data(key);
    }

    pub fn find_meta_data_index_for_key(&self, key: &str) -> Option<usize> {
        self.metadata.find_index_for_key(key)
    }
}

/// Mutable access to a node that lives in a `NodeTree`
///
/// Allows template, parent, socket and metadata edits. Adding, removing and
/// moving children go through the tree so its names, guids and index stay
/// consistent.
#[derive(Debug)]
pub struct NodeMut<'a> {
    node: &'a mut ConstructionNode,
}

impl<'a> NodeMut<'a> {
    pub(crate) fn new(node: &'a mut ConstructionNode) -> Self {
        Self { node }
    }

    /// Edit the template; drops any cooked data taken from it
    pub fn template_mut(&mut self) -> &mut ComponentTemplate {
        self.node.template_mut()
    }

    pub fn set_parent_node(
        &mut self,
        parent: &ConstructionNode,
        parent_owner_class: &str,
        own_class: &str,
    ) {
        self.node.set_parent_node(parent, parent_owner_class, own_class);
    }

    pub fn set_parent_native(&mut self, component_name: impl Into<String>) {
        self.node.set_parent_native(component_name);
    }

    pub fn clear_parent(&mut self) {
        self.node.clear_parent();
    }

    pub fn set_attach_to(&mut self, socket: Option<String>) {
        self.node.attach_to = socket;
    }

    pub fn set_category(&mut self, category: Option<String>) {
        self.node.category = category;
    }

    pub fn set_meta_data(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.node.set_meta_data(key, value);
    }

    pub fn remove_meta_data(&mut self, key: &str) {
        self.node.remove_meta_data(key);
    }

    /// Run `loader` on this node and every descendant, depth first
    pub fn preload_chain<F>(&mut self, loader: F) -> Result<()>
    where
        F: FnMut(NodeMut<'_>) -> Result<()>,
    {
        self.node.preload_chain(loader)
    }
}

impl Deref for NodeMut<'_> {
    type Target = ConstructionNode;

    fn deref(&self) -> &ConstructionNode {
        self.node
    }
}
