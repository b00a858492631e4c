//! Recursive execution of construction nodes on an owner.
//!
//! Each node becomes one component instance. Scene components attach to the
//! instance of their parent node (or to whatever the caller passes for a
//! root); non-scene components are created but pass their parent through to
//! their children.

use tracing::{debug, warn};

use crate::blueprints::{ClassRegistry, Owner};
use crate::core::types::{InstanceId, Transform, TransformFields};
use crate::scs::ConstructionNode;

/// Class context for one tree walk
#[derive(Debug, Clone, Copy)]
pub struct InstancingContext<'a> {
    pub registry: &'a ClassRegistry,
    /// Most-derived class being constructed
    pub actual_class: &'a str,
    /// Class whose tree holds the nodes being executed
    pub defining_class: &'a str,
    pub use_cooked_data: bool,
}

/// What a construction pass did, including everything it had to skip
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConstructionReport {
    /// Instances created, in creation order
    pub created: Vec<InstanceId>,
    /// How many of them came from cooked data
    pub cooked_instances: usize,
    /// Nodes (and native components) whose class could not be resolved
    pub failed_nodes: Vec<String>,
    /// Roots whose parent reference did not resolve to an instance
    pub unresolved_parents: Vec<String>,
}

impl ConstructionReport {
    pub fn is_degraded(&self) -> bool {
        !self.failed_nodes.is_empty() || !self.unresolved_parents.is_empty()
    }
}

/// Instantiate `node` and its subtree on `owner`
///
/// `parent` is the instance the node's component attaches to. A scene
/// component with no parent becomes the owner's root if it has none yet and
/// receives `root_transform`. Returns `None` when the node's component class
/// is unknown; its subtree is skipped.
pub fn execute_node(
    node: &ConstructionNode,
    ctx: &InstancingContext<'_>,
    owner: &mut Owner,
    parent: Option<InstanceId>,
    root_transform: Option<&Transform>,
    is_default_transform: bool,
    report: &mut ConstructionReport,
) -> Option<InstanceId> {
    let Some(class) = ctx.registry.component_class(node.component_class()) else {
        warn!(
            class = %ctx.defining_class,
            node = %node.variable_name(),
            skipped_children = node.all_nodes().len() - 1,
            "unknown component class {}, skipping subtree",
            node.component_class()
        );
        report.failed_nodes.push(node.variable_name().to_string());
        return None;
    };

    let source = ctx.registry.instancing_source(
        node,
        ctx.defining_class,
        ctx.actual_class,
        class,
        ctx.use_cooked_data,
    );
    let (properties, mut transform, authored) = source.instance_state();

    let becomes_root = class.scene && parent.is_none() && owner.root_component().is_none();
    if becomes_root {
        if let Some(root) = root_transform {
            transform = apply_root_transform(&transform, root, authored, is_default_transform);
        }
    }

    let id = owner.add_component(
        node.variable_name(),
        class,
        properties,
        transform,
        Some(node.guid()),
    );
    owner.set_field(node.variable_name(), id);
    report.created.push(id);
    if source.is_cooked() {
        report.cooked_instances += 1;
    }

    if class.scene {
        match parent {
            Some(parent_id) => attach_to_parent(node, ctx, owner, id, parent_id),
            None if becomes_root => {
                if let Err(err) = owner.set_root_component(id) {
                    warn!(node = %node.variable_name(), "cannot become root: {}", err);
                }
            }
            None => debug!(
                node = %node.variable_name(),
                "owner already has a root, leaving component unattached"
            ),
        }
    }

    debug!(
        node = %node.variable_name(),
        class = %class.name,
        cooked = source.is_cooked(),
        "instanced node"
    );

    let child_parent = if class.scene { Some(id) } else { parent };
    for child in node.children() {
        let child_root = if child_parent.is_none() {
            root_transform
        } else {
            None
        };
        execute_node(
            child,
            ctx,
            owner,
            child_parent,
            child_root,
            is_default_transform,
            report,
        );
    }

    Some(id)
}

fn attach_to_parent(
    node: &ConstructionNode,
    ctx: &InstancingContext<'_>,
    owner: &mut Owner,
    id: InstanceId,
    parent_id: InstanceId,
) {
    if let Some(socket) = node.attach_to.as_deref() {
        let known = owner
            .component(parent_id)
            .and_then(|parent| ctx.registry.component_class(&parent.class))
            .map_or(false, |class| class.has_socket(socket));
        if !known {
            warn!(
                node = %node.variable_name(),
                socket = %socket,
                "socket not found on parent, attaching anyway"
            );
        }
    }
    if let Err(err) = owner.attach(id, parent_id, node.attach_to.as_deref()) {
        warn!(node = %node.variable_name(), "attach failed: {}", err);
    }
}

/// Transform a new root component ends up with
///
/// A default (fallback) transform only fills the fields the template did
/// not author; an explicit one replaces everything.
pub fn apply_root_transform(
    current: &Transform,
    supplied: &Transform,
    authored: TransformFields,
    is_default_transform: bool,
) -> Transform {
    if !is_default_transform {
        return *supplied;
    }
    Transform {
        location: if authored.location {
            current.location
        } else {
            supplied.location
        },
        rotation: if authored.rotation {
            current.rotation
        } else {
            supplied.rotation
        },
        scale: if authored.scale {
            current.scale
        } else {
            supplied.scale
        },
    }
}
