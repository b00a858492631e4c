//! The construction tree of one blueprint class.
//!
//! `NodeTree` owns the root nodes. Structural edits only happen through
//! here, so tree-wide unique names, the depth limit and the rename hooks
//! always hold. Nodes handed out for editing come wrapped in a `NodeMut`.
//! The flat `node_guids` index is rebuilt from the tree after every edit
//! and on deserialization; it is never edited on its own.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::naming::{
    split_numeric_suffix, validate_variable_name, NameChange, NameChangedHook, PreviewInstances,
};
use super::node::{ConstructionNode, NodeMut};
use crate::core::config::config;
use crate::core::error::{ConstructError, Result};
use crate::core::types::{names_match, NodeGuid};

/// Root set of construction nodes for one class
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(from = "StoredTree")]
pub struct NodeTree {
    owner_class: String,
    roots: Vec<ConstructionNode>,
    #[serde(skip)]
    all_nodes: Vec<NodeGuid>,
    #[serde(skip)]
    rename_hook: Option<NameChangedHook>,
}

/// On-disk shape of a `NodeTree`
#[derive(Deserialize)]
struct StoredTree {
    #[serde(default)]
    owner_class: String,
    #[serde(default)]
    roots: Vec<ConstructionNode>,
}

impl From<StoredTree> for NodeTree {
    fn from(stored: StoredTree) -> Self {
        let mut tree = Self {
            owner_class: stored.owner_class,
            roots: stored.roots,
            ..Self::default()
        };
        tree.rebuild_index();
        tree
    }
}

impl NodeTree {
    pub fn new(owner_class: impl Into<String>) -> Self {
        Self {
            owner_class: owner_class.into(),
            ..Self::default()
        }
    }

    /// Name of the class this tree belongs to
    pub fn owner_class(&self) -> &str {
        &self.owner_class
    }

    pub(crate) fn set_owner_class(&mut self, owner_class: &str) {
        self.owner_class = owner_class.to_string();
    }

    pub fn roots(&self) -> &[ConstructionNode] {
        &self.roots
    }

    pub(crate) fn roots_mut(&mut self) -> &mut Vec<ConstructionNode> {
        &mut self.roots
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Total number of nodes
    pub fn len(&self) -> usize {
        self.roots.iter().map(|r| r.all_nodes().len()).sum()
    }

    // === STRUCTURE ===

    /// Add `node` (and its subtree) as a new root
    pub fn add_root(&mut self, mut node: ConstructionNode) -> Result<()> {
        self.check_insertion(&node, "<root>", 0)?;
        node.install_hook_recursive(self.rename_hook.as_ref());
        debug!(class = %self.owner_class, node = %node.variable_name(), "add root node");
        self.roots.push(node);
        self.rebuild_index();
        Ok(())
    }

    /// Append `node` under the node with guid `parent`
    pub fn add_child(&mut self, parent: NodeGuid, mut node: ConstructionNode) -> Result<()> {
        let parent_depth = self
            .depth_of(parent)
            .ok_or_else(|| ConstructError::NodeNotFound(parent.to_string()))?;
        let parent_name = self.node_name(parent);
        self.check_insertion(&node, &parent_name, parent_depth)?;
        node.install_hook_recursive(self.rename_hook.as_ref());

        let target = self
            .find_node_mut(parent)
            .ok_or_else(|| ConstructError::NodeNotFound(parent.to_string()))?;
        target.add_child(node)?;
        self.rebuild_index();
        Ok(())
    }

    /// Detach the node with `guid` from wherever it is, returning its subtree
    ///
    /// The caller owns the result: reattach it or drop it.
    pub fn remove_node(&mut self, guid: NodeGuid) -> Option<ConstructionNode> {
        let removed = match self.roots.iter().position(|n| n.guid() == guid) {
            Some(index) => Some(self.roots.remove(index)),
            None => self.roots.iter_mut().find_map(|n| n.detach(guid)),
        };
        if let Some(mut node) = removed {
            node.install_hook_recursive(None);
            debug!(class = %self.owner_class, node = %node.variable_name(), "removed node");
            self.rebuild_index();
            return Some(node);
        }
        None
    }

    /// Detach the child at `index` of the node `parent`
    pub fn remove_child_at(&mut self, parent: NodeGuid, index: usize) -> Result<ConstructionNode> {
        let target = self
            .find_node_mut(parent)
            .ok_or_else(|| ConstructError::NodeNotFound(parent.to_string()))?;
        let mut node = target.remove_child_at(index)?;
        node.install_hook_recursive(None);
        self.rebuild_index();
        Ok(node)
    }

    /// Move all children of `source` under `target`
    ///
    /// Fails with a cycle error if `target` is `source` or lies below it.
    pub fn move_children(
        &mut self,
        target: NodeGuid,
        source: NodeGuid,
        insert_at: Option<usize>,
    ) -> Result<()> {
        let source_node = self
            .find(source)
            .ok_or_else(|| ConstructError::NodeNotFound(source.to_string()))?;
        if source_node.contains(target) {
            return Err(ConstructError::Cycle {
                node: source_node.variable_name().to_string(),
                target: self.node_name(target),
            });
        }
        let moved_depth = source_node.depth() - 1;
        let target_node = self
            .find(target)
            .ok_or_else(|| ConstructError::NodeNotFound(target.to_string()))?;
        let index = insert_at.unwrap_or(target_node.child_count());
        if index > target_node.child_count() {
            return Err(ConstructError::IndexOutOfRange {
                index,
                len: target_node.child_count(),
            });
        }
        let target_depth = self.depth_of(target).unwrap_or(1);
        self.check_depth(target_depth + moved_depth)?;

        let moved = match self.find_node_mut(source) {
            Some(node) => node.take_children(),
            None => return Err(ConstructError::NodeNotFound(source.to_string())),
        };
        if let Some(node) = self.find_node_mut(target) {
            debug!(target = %node.variable_name(), count = moved.len(), "move children");
            node.insert_children(index, moved);
        }
        self.rebuild_index();
        Ok(())
    }

    /// Remove a node and put its children where it was
    ///
    /// Promoted children take over the removed node's attach socket; children
    /// of a removed root also take over its parent reference.
    pub fn collapse_node(&mut self, guid: NodeGuid) -> Result<ConstructionNode> {
        if let Some(index) = self.roots.iter().position(|n| n.guid() == guid) {
            let mut removed = self.roots.remove(index);
            let mut promoted = removed.take_children();
            for child in &mut promoted {
                child.parent = removed.parent.clone();
                child.attach_to = removed.attach_to.clone();
            }
            self.roots.splice(index..index, promoted);
            removed.install_hook_recursive(None);
            self.rebuild_index();
            return Ok(removed);
        }

        let parent = self
            .parent_of(guid)
            .map(|p| p.guid())
            .ok_or_else(|| ConstructError::NodeNotFound(guid.to_string()))?;
        let parent_node = self
            .find_node_mut(parent)
            .ok_or_else(|| ConstructError::NodeNotFound(parent.to_string()))?;
        let index = parent_node
            .children()
            .iter()
            .position(|c| c.guid() == guid)
            .ok_or_else(|| ConstructError::NodeNotFound(guid.to_string()))?;
        let mut removed = parent_node.remove_child_at(index)?;
        let mut promoted = removed.take_children();
        for child in &mut promoted {
            child.attach_to = removed.attach_to.clone();
        }
        parent_node.insert_children(index, promoted);
        removed.install_hook_recursive(None);
        self.rebuild_index();
        Ok(removed)
    }

    fn check_insertion(
        &self,
        node: &ConstructionNode,
        target_name: &str,
        parent_depth: usize,
    ) -> Result<()> {
        let incoming = node.all_nodes();
        for (index, candidate) in incoming.iter().enumerate() {
            if self.contains(candidate.guid()) {
                return Err(ConstructError::Cycle {
                    node: node.variable_name().to_string(),
                    target: target_name.to_string(),
                });
            }
            validate_variable_name(candidate.variable_name())?;
            let clashes_inside = incoming[..index]
                .iter()
                .any(|other| names_match(other.variable_name(), candidate.variable_name()));
            if clashes_inside || self.find_by_name(candidate.variable_name()).is_some() {
                return Err(ConstructError::DuplicateName(
                    candidate.variable_name().to_string(),
                ));
            }
        }
        self.check_depth(parent_depth + node.depth())
    }

    fn check_depth(&self, depth: usize) -> Result<()> {
        let limit = config().max_tree_depth;
        if depth > limit {
            return Err(ConstructError::TreeTooDeep { depth, limit });
        }
        Ok(())
    }

    // === QUERIES ===

    /// Every node, roots in order, each followed by its subtree
    pub fn all_nodes(&self) -> Vec<&ConstructionNode> {
        self.roots.iter().flat_map(|r| r.all_nodes()).collect()
    }

    /// Flattened guid index in traversal order
    pub fn node_guids(&self) -> &[NodeGuid] {
        &self.all_nodes
    }

    /// Recompute the flat index from the tree
    pub fn rebuild_index(&mut self) {
        self.all_nodes = self
            .roots
            .iter()
            .flat_map(|r| r.all_nodes())
            .map(|n| n.guid())
            .collect();
    }

    pub fn contains(&self, guid: NodeGuid) -> bool {
        self.find(guid).is_some()
    }

    pub fn find(&self, guid: NodeGuid) -> Option<&ConstructionNode> {
        self.roots.iter().find_map(|r| r.find(guid))
    }

    /// Editable view of the node `guid`
    pub fn find_mut(&mut self, guid: NodeGuid) -> Option<NodeMut<'_>> {
        self.find_node_mut(guid).map(NodeMut::new)
    }

    pub(crate) fn find_node_mut(&mut self, guid: NodeGuid) -> Option<&mut ConstructionNode> {
        self.roots.iter_mut().find_map(|r| r.find_mut(guid))
    }

    /// Node whose variable name matches `name` (case-insensitive)
    pub fn find_by_name(&self, name: &str) -> Option<&ConstructionNode> {
        self.roots.iter().find_map(|r| r.find_by_name(name))
    }

    /// Tree parent of `guid`; `None` for roots and unknown nodes
    pub fn parent_of(&self, guid: NodeGuid) -> Option<&ConstructionNode> {
        self.roots.iter().find_map(|r| r.parent_of(guid))
    }

    /// Whether `guid` sits directly in the root list
    pub fn is_root_node(&self, guid: NodeGuid) -> bool {
        self.roots.iter().any(|r| r.guid() == guid)
    }

    /// Depth of `guid` (roots are 1)
    pub fn depth_of(&self, guid: NodeGuid) -> Option<usize> {
        self.roots.iter().find_map(|r| r.depth_of(guid))
    }

    /// Deepest level in the tree
    pub fn depth(&self) -> usize {
        self.roots.iter().map(|r| r.depth()).max().unwrap_or(0)
    }

    fn node_name(&self, guid: NodeGuid) -> String {
        self.find(guid)
            .map(|n| n.variable_name().to_string())
            .unwrap_or_else(|| guid.to_string())
    }

    // === NAMING ===

    /// Whether `name` is free, ignoring the node `except`
    pub fn is_name_available(&self, name: &str, except: Option<NodeGuid>) -> bool {
        self.all_nodes()
            .iter()
            .all(|n| Some(n.guid()) == except || !names_match(n.variable_name(), name))
    }

    /// First free name of the form `base`, `base1`, `base2`, ...
    pub fn generate_unique_name(&self, base: &str) -> String {
        let (stem, _) = split_numeric_suffix(base);
        if self.is_name_available(base, None) {
            return base.to_string();
        }
        (1..)
            .map(|n| format!("{}{}", stem, n))
            .find(|candidate| self.is_name_available(candidate, None))
            .unwrap_or_else(|| base.to_string())
    }

    /// Rename the node `guid`
    ///
    /// With `rename_template`, the template and any preview instances are
    /// renamed too. The node's rename hook fires after everything is
    /// updated. On error nothing changes.
    pub fn set_variable_name(
        &mut self,
        guid: NodeGuid,
        new_name: &str,
        rename_template: bool,
        previews: Option<&mut dyn PreviewInstances>,
    ) -> Result<NameChange> {
        if !self.contains(guid) {
            return Err(ConstructError::NodeNotFound(guid.to_string()));
        }
        validate_variable_name(new_name)?;
        if !self.is_name_available(new_name, Some(guid)) {
            return Err(ConstructError::DuplicateName(new_name.to_string()));
        }

        let node = self
            .find_node_mut(guid)
            .ok_or_else(|| ConstructError::NodeNotFound(guid.to_string()))?;
        let mut change = node.apply_rename(new_name, rename_template);
        if rename_template {
            if let Some(previews) = previews {
                change.previews_renamed = previews.rename_instances_from(guid, new_name);
            }
        }
        node.notify_renamed(&change);

        debug!(
            class = %self.owner_class,
            old = %change.old_name,
            new = %change.new_name,
            "renamed construction node"
        );
        Ok(change)
    }

    /// Install `hook` on every node, now and as nodes are added
    pub fn subscribe_renames(&mut self, hook: NameChangedHook) {
        for root in &mut self.roots {
            root.install_hook_recursive(Some(&hook));
        }
        self.rename_hook = Some(hook);
    }

    pub fn unsubscribe_renames(&mut self) {
        for root in &mut self.roots {
            root.install_hook_recursive(None);
        }
        self.rename_hook = None;
    }

    pub(crate) fn reinstall_rename_hook(&mut self) {
        let hook = self.rename_hook.clone();
        for root in &mut self.roots {
            root.install_hook_recursive(hook.as_ref());
        }
    }
}
