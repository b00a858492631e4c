//! Spawning owners from blueprint classes.
//!
//! Native components of the whole class chain are created first, base class
//! first, then each class's construction tree runs in the same order, so a
//! derived tree can hang nodes off anything an ancestor created.

use tracing::{info, warn};

use super::executor::{apply_root_transform, execute_node, ConstructionReport, InstancingContext};
use crate::blueprints::{ClassRegistry, GeneratedClass, Owner};
use crate::component::ComponentTemplate;
use crate::core::config::config;
use crate::core::error::{ConstructError, Result};
use crate::core::types::{InstanceId, Transform};
use crate::scs::{resolve_parent, ConstructionNode, ParentRef, ParentResolution};

/// Placement and instancing options for a spawn
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpawnParams {
    pub root_transform: Transform,
    /// The transform is a fallback; authored root template fields keep theirs
    pub is_default_transform: bool,
    pub use_cooked_data: bool,
}

impl Default for SpawnParams {
    fn default() -> Self {
        Self {
            root_transform: Transform::IDENTITY,
            is_default_transform: true,
            use_cooked_data: config().use_cooked_data,
        }
    }
}

impl SpawnParams {
    /// Place the owner at `transform`, overriding authored root fields
    pub fn at(transform: Transform) -> Self {
        Self {
            root_transform: transform,
            is_default_transform: false,
            ..Self::default()
        }
    }
}

/// Build an owner of `class_name` with every component its class chain declares
pub fn spawn(
    registry: &ClassRegistry,
    class_name: &str,
    owner_name: &str,
    params: &SpawnParams,
) -> Result<(Owner, ConstructionReport)> {
    let chain = registry.ancestors(class_name);
    let Some(actual) = chain.first() else {
        return Err(ConstructError::ClassNotFound(class_name.to_string()));
    };

    let mut owner = Owner::new(owner_name, actual.name.clone());
    let mut report = ConstructionReport::default();

    for class in chain.iter().rev() {
        for native in &class.native_components {
            instance_native(registry, &class.name, native, &mut owner, params, &mut report);
        }
    }
    for class in chain.iter().rev() {
        run_construction(registry, class, &actual.name, &mut owner, params, &mut report);
    }

    info!(
        class = %actual.name,
        owner = %owner_name,
        components = owner.len(),
        cooked = report.cooked_instances,
        degraded = report.is_degraded(),
        "spawned owner"
    );
    Ok((owner, report))
}

/// Run one class's construction tree on `owner`
///
/// `actual_class` is the most-derived class being built; overrides between
/// it and `class` apply to this tree's nodes.
pub fn run_construction(
    registry: &ClassRegistry,
    class: &GeneratedClass,
    actual_class: &str,
    owner: &mut Owner,
    params: &SpawnParams,
    report: &mut ConstructionReport,
) {
    let ctx = InstancingContext {
        registry,
        actual_class,
        defining_class: &class.name,
        use_cooked_data: params.use_cooked_data,
    };

    for root in class.construction.roots() {
        let parent = root_parent(root, class, &ctx, owner, report);
        let root_transform = parent.is_none().then_some(&params.root_transform);
        execute_node(
            root,
            &ctx,
            owner,
            parent,
            root_transform,
            params.is_default_transform,
            report,
        );
    }
}

/// Instance a root node's parent reference resolves to
///
/// Roots without a reference attach to the owner's root component. A
/// reference that resolves to nothing leaves the node unparented.
fn root_parent(
    root: &ConstructionNode,
    class: &GeneratedClass,
    ctx: &InstancingContext<'_>,
    owner: &Owner,
    report: &mut ConstructionReport,
) -> Option<InstanceId> {
    if matches!(root.parent, ParentRef::Unset) {
        return owner.root_component();
    }

    let resolved = match resolve_parent(root, &class.construction, ctx.registry, ctx.actual_class) {
        ParentResolution::Native { class, template } => {
            owner.native_component(class, &template.name)
        }
        ParentResolution::Node { node, .. } => owner
            .component_from_node(node.guid())
            .or_else(|| owner.field(node.variable_name())),
        ParentResolution::Unparented => None,
    };

    if resolved.is_none() {
        warn!(
            class = %class.name,
            node = %root.variable_name(),
            parent = root.parent.name().unwrap_or_default(),
            "parent reference did not resolve, instancing unparented"
        );
        report.unresolved_parents.push(root.variable_name().to_string());
    }
    resolved
}

fn instance_native(
    registry: &ClassRegistry,
    declaring_class: &str,
    native: &ComponentTemplate,
    owner: &mut Owner,
    params: &SpawnParams,
    report: &mut ConstructionReport,
) {
    let Some(class) = registry.component_class(&native.class) else {
        warn!(
            component = %native.name,
            "unknown component class {} for native component",
            native.class
        );
        report.failed_nodes.push(native.name.clone());
        return;
    };

    let becomes_root = class.scene && owner.root_component().is_none();
    let transform = if becomes_root {
        apply_root_transform(
            &native.transform,
            &params.root_transform,
            native.authored,
            params.is_default_transform,
        )
    } else {
        native.transform
    };

    let id = owner.add_component(
        native.name.clone(),
        class,
        native.duplicate_properties(),
        transform,
        None,
    );
    owner.mark_native(id, declaring_class);
    owner.set_field(&native.name, id);
    report.created.push(id);

    if !class.scene {
        return;
    }
    let placed = match owner.root_component() {
        None => owner.set_root_component(id),
        Some(root) => owner.attach(id, root, None),
    };
    if let Err(err) = placed {
        warn!(component = %native.name, "cannot place native component: {}", err);
    }
}
