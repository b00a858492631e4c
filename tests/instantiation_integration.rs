//! Integration tests for spawning owners from blueprint classes

use glam::Vec3;

use construct_tree::blueprints::{ClassRegistry, GeneratedClass, Owner};
use construct_tree::component::{ComponentClass, ComponentTemplate, PropertyMap};
use construct_tree::construction::{
    execute_node, spawn, ConstructionReport, InstancingContext, SpawnParams,
};
use construct_tree::core::types::Transform;
use construct_tree::scs::ConstructionNode;

const DOOR_FILE: &str = r#"
[[component_classes]]
name = "SceneComponent"
scene = true

[[component_classes]]
name = "StaticMesh"
scene = true
sockets = ["hinge", "handle"]
defaults = { mesh = "cube", collision = true }

[[component_classes]]
name = "AudioComponent"
defaults = { volume = 1.0 }

[[classes]]
name = "BP_Door"

[[classes.native_components]]
name = "DefaultRoot"
class = "SceneComponent"

[[classes.construction.roots]]
variable_name = "Frame"
component_class = "StaticMesh"
parent = { kind = "native", name = "DefaultRoot" }

[classes.construction.roots.template]
properties = { mesh = "door_frame" }

[[classes.construction.roots.children]]
variable_name = "Panel"
component_class = "StaticMesh"
attach_to = "hinge"

[[classes.construction.roots.children]]
variable_name = "Creak"
component_class = "AudioComponent"

[[classes]]
name = "BP_VaultDoor"
parent = "BP_Door"

[[classes.construction.roots]]
variable_name = "Wheel"
component_class = "StaticMesh"
attach_to = "handle"
parent = { kind = "inherited", name = "Panel", owner_class = "BP_Door" }

[[classes.construction.roots]]
variable_name = "Alarm"
component_class = "AudioComponent"
parent = { kind = "native", name = "NoSuchComponent" }
"#;

const LAMP_CLASSES: &str = r#"
[[component_classes]]
name = "PointLight"
scene = true
defaults = { intensity = 5000.0, cast_shadows = true }
"#;

const LAMP_BLUEPRINT: &str = r#"
[[classes]]
name = "BP_Lamp"

[[classes.construction.roots]]
variable_name = "Bulb"
component_class = "PointLight"

[classes.construction.roots.template]
properties = { intensity = 10.0 }
"#;

fn door_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry.load_str(DOOR_FILE).unwrap();
    registry
}

fn scene_registry() -> ClassRegistry {
    let mut registry = ClassRegistry::new();
    registry.register_component_class(ComponentClass::scene("SceneComponent").with_socket("top"));
    registry
}

#[test]
fn test_two_level_tree_on_fresh_owner() {
    let registry = scene_registry();
    let class = ComponentClass::scene("SceneComponent");
    let mut root = ConstructionNode::new(&class, "R").unwrap();
    root.add_child(ConstructionNode::new(&class, "C").unwrap().attached_to("top"))
        .unwrap();

    let ctx = InstancingContext {
        registry: &registry,
        actual_class: "BP_Test",
        defining_class: "BP_Test",
        use_cooked_data: true,
    };
    let mut owner = Owner::new("Test_0", "BP_Test");
    let mut report = ConstructionReport::default();
    let supplied = Transform::from_location(Vec3::new(10.0, 0.0, 0.0));
    let r =
        execute_node(&root, &ctx, &mut owner, None, Some(&supplied), true, &mut report).unwrap();

    assert_eq!(owner.len(), 2);
    assert_eq!(owner.root_component(), Some(r));
    assert_eq!(owner.component(r).unwrap().transform.location, supplied.location);

    let c = owner.field("C").unwrap();
    let attachment = owner.component(c).unwrap().attachment.clone().unwrap();
    assert_eq!(attachment.parent, r);
    assert_eq!(attachment.socket.as_deref(), Some("top"));
    // The child is relative to its parent and keeps its own transform
    assert_eq!(owner.component(c).unwrap().transform, Transform::IDENTITY);
}

#[test]
fn test_authored_root_location_beats_default_transform() {
    let registry = scene_registry();
    let class = ComponentClass::scene("SceneComponent");
    let mut root = ConstructionNode::new(&class, "R").unwrap();
    root.template_mut()
        .set_relative_location(Vec3::new(0.0, 0.0, 3.0));

    let ctx = InstancingContext {
        registry: &registry,
        actual_class: "BP_Test",
        defining_class: "BP_Test",
        use_cooked_data: true,
    };
    let supplied = Transform {
        location: Vec3::new(7.0, 7.0, 7.0),
        scale: Vec3::splat(2.0),
        ..Transform::IDENTITY
    };

    let mut owner = Owner::new("Test_0", "BP_Test");
    let mut report = ConstructionReport::default();
    let r =
        execute_node(&root, &ctx, &mut owner, None, Some(&supplied), true, &mut report).unwrap();
    let transform = owner.component(r).unwrap().transform;
    assert_eq!(transform.location, Vec3::new(0.0, 0.0, 3.0));
    assert_eq!(transform.scale, Vec3::splat(2.0));

    let mut owner = Owner::new("Test_1", "BP_Test");
    let r =
        execute_node(&root, &ctx, &mut owner, None, Some(&supplied), false, &mut report).unwrap();
    assert_eq!(owner.component(r).unwrap().transform, supplied);
}

#[test]
fn test_spawn_door_from_file() {
    let registry = door_registry();
    let (owner, report) = spawn(&registry, "BP_Door", "Door_0", &SpawnParams::default()).unwrap();

    let root = owner.find_component("DefaultRoot").unwrap();
    let frame = owner.field("Frame").unwrap();
    let panel = owner.field("Panel").unwrap();
    let creak = owner.field("Creak").unwrap();

    assert_eq!(owner.root_component(), Some(root));
    assert_eq!(owner.children_of(root), vec![frame]);
    assert_eq!(owner.children_of(frame), vec![panel]);
    assert!(owner.component(creak).unwrap().attachment.is_none());

    let frame_props = &owner.component(frame).unwrap().properties;
    assert_eq!(frame_props.get("mesh"), Some(&"door_frame".into()));
    assert_eq!(frame_props.get("collision"), Some(&true.into()));
    assert!(!report.is_degraded());
}

#[test]
fn test_inherited_parent_and_unresolved_parent() {
    let registry = door_registry();
    let (owner, report) =
        spawn(&registry, "BP_VaultDoor", "Vault_0", &SpawnParams::default()).unwrap();

    let panel = owner.field("Panel").unwrap();
    let wheel = owner.field("Wheel").unwrap();
    let attachment = owner.component(wheel).unwrap().attachment.clone().unwrap();
    assert_eq!(attachment.parent, panel);
    assert_eq!(attachment.socket.as_deref(), Some("handle"));

    // The alarm's parent is missing: it still exists, unparented
    let alarm = owner.field("Alarm").unwrap();
    assert!(owner.component(alarm).unwrap().attachment.is_none());
    assert_eq!(report.unresolved_parents, vec!["Alarm".to_string()]);
    assert!(report.is_degraded());
    assert_eq!(owner.len(), 6);
}

#[test]
fn test_unresolved_scene_parent_does_not_stop_siblings() {
    let mut registry = door_registry();
    let mut lonely = GeneratedClass::new("BP_Lonely", Some("BP_Door"));
    let mesh = registry.component_class("StaticMesh").unwrap().clone();
    let mut orphan = ConstructionNode::new(&mesh, "Orphan").unwrap();
    orphan.set_parent_native("Missing");
    lonely.construction.add_root(orphan).unwrap();
    let sibling = ConstructionNode::new(&mesh, "Sibling").unwrap();
    lonely.construction.add_root(sibling).unwrap();
    registry.register_class(lonely);

    let (owner, report) =
        spawn(&registry, "BP_Lonely", "Lonely_0", &SpawnParams::default()).unwrap();

    let orphan = owner.field("Orphan").unwrap();
    let sibling = owner.field("Sibling").unwrap();
    assert!(owner.component(orphan).unwrap().attachment.is_none());
    assert_eq!(
        owner.component(sibling).unwrap().attachment.as_ref().map(|a| a.parent),
        owner.root_component()
    );
    assert_eq!(report.unresolved_parents, vec!["Orphan".to_string()]);
}

#[test]
fn test_cooked_and_generic_paths_agree() {
    let mut registry = door_registry();
    let (slow, slow_report) =
        spawn(&registry, "BP_VaultDoor", "Vault_0", &SpawnParams::default()).unwrap();

    registry.cook_class("BP_Door").unwrap();
    registry.cook_class("BP_VaultDoor").unwrap();
    let params = SpawnParams {
        use_cooked_data: true,
        ..SpawnParams::default()
    };
    let (fast, fast_report) = spawn(&registry, "BP_VaultDoor", "Vault_1", &params).unwrap();

    assert_eq!(slow_report.cooked_instances, 0);
    assert_eq!(fast_report.cooked_instances, 5);
    assert_eq!(slow.len(), fast.len());
    for (a, b) in slow.components().iter().zip(fast.components()) {
        assert_eq!(a.name, b.name);
        assert_eq!(a.properties, b.properties);
        assert_eq!(a.transform, b.transform);
        assert_eq!(a.attachment, b.attachment);
    }
}

#[test]
fn test_derived_override_replaces_inherited_template() {
    let mut registry = door_registry();
    let panel = registry
        .class("BP_Door")
        .unwrap()
        .construction
        .find_by_name("Panel")
        .unwrap()
        .clone();

    let mesh = registry.component_class("StaticMesh").unwrap().clone();
    let mut template = ComponentTemplate::from_class(&mesh, "Panel_GEN_VARIABLE");
    template.set_property("mesh", "steel_plate");
    registry
        .class_mut("BP_VaultDoor")
        .unwrap()
        .set_override("BP_Door", &panel, template);

    let (vault, _) = spawn(&registry, "BP_VaultDoor", "Vault_0", &SpawnParams::default()).unwrap();
    let (door, _) = spawn(&registry, "BP_Door", "Door_0", &SpawnParams::default()).unwrap();

    let mesh_of = |owner: &Owner| {
        let id = owner.field("Panel").unwrap();
        owner.component(id).unwrap().properties.get("mesh").cloned()
    };
    assert_eq!(mesh_of(&vault), Some("steel_plate".into()));
    assert_eq!(mesh_of(&door), Some("cube".into()));

    // Cooking the derived class gives the override a fast path too
    registry.cook_class("BP_Door").unwrap();
    registry.cook_class("BP_VaultDoor").unwrap();
    let (cooked_vault, report) =
        spawn(&registry, "BP_VaultDoor", "Vault_1", &SpawnParams::default()).unwrap();
    assert_eq!(mesh_of(&cooked_vault), Some("steel_plate".into()));
    assert!(report.cooked_instances > 0);
}

#[test]
fn test_validate_loaded_classes() {
    let registry = door_registry();
    assert!(registry.validate_class("BP_Door").unwrap().is_valid());

    let vault = registry.validate_class("BP_VaultDoor").unwrap();
    assert_eq!(vault.errors().len(), 1);
    assert!(vault.errors()[0].contains("Alarm"));
}

fn bulb_properties(registry: &ClassRegistry, use_cooked_data: bool) -> (PropertyMap, usize) {
    let params = SpawnParams {
        use_cooked_data,
        ..SpawnParams::default()
    };
    let (owner, report) = spawn(registry, "BP_Lamp", "Lamp_0", &params).unwrap();
    let bulb = owner.field("Bulb").unwrap();
    (owner.component(bulb).unwrap().properties.clone(), report.cooked_instances)
}

#[test]
fn test_blueprint_loaded_before_component_classes() {
    let mut registry = ClassRegistry::new();
    registry.load_str(LAMP_BLUEPRINT).unwrap();
    registry.load_str(LAMP_CLASSES).unwrap();
    registry.cook_class("BP_Lamp").unwrap();

    let (slow, slow_cooked) = bulb_properties(&registry, false);
    let (fast, fast_cooked) = bulb_properties(&registry, true);

    assert_eq!(slow_cooked, 0);
    assert_eq!(fast_cooked, 1);
    assert_eq!(slow, fast);
    assert_eq!(fast.get("intensity"), Some(&10.0.into()));
    assert_eq!(fast.get("cast_shadows"), Some(&true.into()));
    assert!(registry.validate_class("BP_Lamp").unwrap().is_valid());
}

#[test]
fn test_removed_property_stays_removed_on_both_paths() {
    let mut registry = ClassRegistry::new();
    registry.load_str(LAMP_CLASSES).unwrap();
    registry.load_str(LAMP_BLUEPRINT).unwrap();

    let tree = &mut registry.class_mut("BP_Lamp").unwrap().construction;
    let bulb = tree.find_by_name("Bulb").unwrap().guid();
    tree.find_mut(bulb)
        .unwrap()
        .template_mut()
        .properties
        .remove("intensity");
    registry.cook_class("BP_Lamp").unwrap();

    let (slow, _) = bulb_properties(&registry, false);
    let (fast, fast_cooked) = bulb_properties(&registry, true);
    assert_eq!(fast_cooked, 1);
    assert_eq!(slow, fast);
    assert!(!fast.contains_key("intensity"));
}

#[test]
fn test_component_class_reregistered_after_cooking() {
    let mut registry = ClassRegistry::new();
    registry.load_str(LAMP_CLASSES).unwrap();
    registry.load_str(LAMP_BLUEPRINT).unwrap();
    registry.cook_class("BP_Lamp").unwrap();

    registry.register_component_class(
        ComponentClass::scene("PointLight")
            .with_default("intensity", 5000.0)
            .with_default("cast_shadows", true)
            .with_default("color", "white"),
    );

    let (slow, _) = bulb_properties(&registry, false);
    let (fast, _) = bulb_properties(&registry, true);
    assert_eq!(slow, fast);
    assert_eq!(fast.get("color"), Some(&"white".into()));
}
