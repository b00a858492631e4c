//! One-time fixups applied after a tree is deserialized.

use ahash::AHashSet;
use tracing::info;

use super::naming::{split_numeric_suffix, template_name_for};
use super::node::ConstructionNode;
use super::parent::ParentRef;
use super::tree::NodeTree;
use crate::core::types::NodeGuid;

/// What `NodeTree::post_load` changed
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Legacy native root markers replaced by native parent references
    pub native_roots_converted: usize,
    /// Nodes that had no variable name
    pub names_generated: usize,
    /// Nodes that had no guid, or shared one with another node
    pub guids_assigned: usize,
    /// Templates whose object name was empty
    pub templates_named: usize,
}

impl MigrationReport {
    pub fn is_clean(&self) -> bool {
        *self == Self::default()
    }
}

impl NodeTree {
    /// Bring freshly loaded data up to the current representation
    ///
    /// Runs once after deserialization. Legacy native roots are dropped and
    /// their children become roots parented to the native component by name.
    /// Missing names and guids are filled in, deprecated fields cleared, and
    /// the flat index rebuilt.
    pub fn post_load(&mut self) -> MigrationReport {
        let mut report = MigrationReport::default();

        convert_native_roots(self.roots_mut(), &mut report);

        let mut taken: AHashSet<String> = self
            .all_nodes()
            .iter()
            .filter(|n| !n.variable_name().is_empty())
            .map(|n| n.variable_name().to_ascii_lowercase())
            .collect();
        let mut seen_guids = AHashSet::new();
        let owner_class = self.owner_class().to_string();
        for root in self.roots_mut() {
            fix_node(root, &owner_class, &mut taken, &mut seen_guids, &mut report);
        }

        self.rebuild_index();
        self.reinstall_rename_hook();

        if !report.is_clean() {
            info!(
                class = %owner_class,
                natives = report.native_roots_converted,
                names = report.names_generated,
                guids = report.guids_assigned,
                templates = report.templates_named,
                "migrated construction tree"
            );
        }
        report
    }
}

fn convert_native_roots(roots: &mut Vec<ConstructionNode>, report: &mut MigrationReport) {
    let mut converted = Vec::with_capacity(roots.len());
    for mut root in roots.drain(..) {
        if !root.legacy_is_native {
            converted.push(root);
            continue;
        }
        let native_name = root
            .legacy_native_component_name
            .take()
            .unwrap_or_else(|| root.variable_name().to_string());
        for mut child in root.take_children() {
            if child.parent.is_unset() {
                child.parent = ParentRef::Native {
                    name: native_name.clone(),
                };
            }
            converted.push(child);
        }
        report.native_roots_converted += 1;
    }
    *roots = converted;
}

fn fix_node(
    node: &mut ConstructionNode,
    owner_class: &str,
    taken: &mut AHashSet<String>,
    seen_guids: &mut AHashSet<NodeGuid>,
    report: &mut MigrationReport,
) {
    if node.variable_name().is_empty() {
        let name = next_free_name(node.component_class(), taken);
        taken.insert(name.to_ascii_lowercase());
        node.set_generated_name(name);
        report.names_generated += 1;
    }

    if node.guid().is_nil() || seen_guids.contains(&node.guid()) {
        let derived = NodeGuid::from_name(&format!("{}.{}", owner_class, node.variable_name()));
        let guid = if seen_guids.contains(&derived) {
            NodeGuid::new()
        } else {
            derived
        };
        node.set_guid(guid);
        report.guids_assigned += 1;
    }
    seen_guids.insert(node.guid());

    if node.template().name.is_empty() {
        let name = template_name_for(node.variable_name());
        node.template_mut().rename(name);
        report.templates_named += 1;
    }

    node.legacy_is_native = false;
    node.legacy_native_component_name = None;
    node.legacy_name_auto_generated = false;

    for child in node.children_mut() {
        fix_node(child, owner_class, taken, seen_guids, report);
    }
}

fn next_free_name(component_class: &str, taken: &AHashSet<String>) -> String {
    let cleaned: String = component_class
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    let base = match cleaned.trim_start_matches(|c: char| c.is_ascii_digit()) {
        "" => "Component".to_string(),
        rest => rest.to_string(),
    };
    let (stem, _) = split_numeric_suffix(&base);
    if !taken.contains(&base.to_ascii_lowercase()) {
        return base;
    }
    (1..)
        .map(|n| format!("{}{}", stem, n))
        .find(|candidate| !taken.contains(&candidate.to_ascii_lowercase()))
        .unwrap_or(base)
}
