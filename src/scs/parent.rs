//! By-name parent references and their resolution.
//!
//! A root node may hang off something that is not in its own tree: a native
//! component declared on a class, or a node in an ancestor blueprint's tree.
//! The link is stored as a name plus scope and resolved against the class
//! being constructed, so it keeps working when a derived class overrides the
//! parent's template.

use serde::{Deserialize, Serialize};

use super::node::ConstructionNode;
use super::tree::NodeTree;
use crate::blueprints::ClassRegistry;
use crate::component::ComponentTemplate;
use crate::core::types::names_match;

/// Where a node's parent lives
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ParentRef {
    /// No explicit parent; roots attach to the owner's root component
    #[default]
    Unset,
    /// A node in the same tree
    Local { name: String },
    /// A node in an ancestor class's tree
    Inherited { name: String, owner_class: String },
    /// A native component declared on a class in the hierarchy
    Native { name: String },
}

impl ParentRef {
    pub fn is_unset(&self) -> bool {
        matches!(self, ParentRef::Unset)
    }

    /// Name of the referenced component or variable
    pub fn name(&self) -> Option<&str> {
        match self {
            ParentRef::Unset => None,
            ParentRef::Local { name }
            | ParentRef::Inherited { name, .. }
            | ParentRef::Native { name } => Some(name),
        }
    }
}

/// Outcome of resolving a `ParentRef` for a given class
#[derive(Debug, Clone, Copy)]
pub enum ParentResolution<'a> {
    Native {
        class: &'a str,
        template: &'a ComponentTemplate,
    },
    Node {
        owner_class: &'a str,
        node: &'a ConstructionNode,
        template: &'a ComponentTemplate,
    },
    Unparented,
}

impl<'a> ParentResolution<'a> {
    pub fn template(&self) -> Option<&'a ComponentTemplate> {
        match self {
            ParentResolution::Native { template, .. } | ParentResolution::Node { template, .. } => {
                Some(template)
            }
            ParentResolution::Unparented => None,
        }
    }

    pub fn is_resolved(&self) -> bool {
        !matches!(self, ParentResolution::Unparented)
    }
}

impl ConstructionNode {
    /// Point this node at another tree node
    ///
    /// `parent_owner_class` is the class whose tree holds `parent`; when it
    /// differs from `own_class` the link is recorded as inherited.
    pub fn set_parent_node(
        &mut self,
        parent: &ConstructionNode,
        parent_owner_class: &str,
        own_class: &str,
    ) {
        let name = parent.variable_name().to_string();
        self.parent = if names_match(parent_owner_class, own_class) {
            ParentRef::Local { name }
        } else {
            ParentRef::Inherited {
                name,
                owner_class: parent_owner_class.to_string(),
            }
        };
    }

    /// Point this node at a native component
    pub fn set_parent_native(&mut self, component_name: impl Into<String>) {
        self.parent = ParentRef::Native {
            name: component_name.into(),
        };
    }

    pub fn clear_parent(&mut self) {
        self.parent = ParentRef::Unset;
    }

    /// Template of this node's declared parent, as seen from `context_class`
    pub fn resolve_parent_template<'a>(
        &self,
        tree: &'a NodeTree,
        registry: &'a ClassRegistry,
        context_class: &str,
    ) -> Option<&'a ComponentTemplate> {
        resolve_parent(self, tree, registry, context_class).template()
    }
}

/// Resolve `node.parent` against `context_class`
///
/// `tree` is the tree `node` belongs to. Native parents are searched nearest
/// class first; inherited parents must live in a class of the context chain.
pub fn resolve_parent<'a>(
    node: &ConstructionNode,
    tree: &'a NodeTree,
    registry: &'a ClassRegistry,
    context_class: &str,
) -> ParentResolution<'a> {
    match &node.parent {
        ParentRef::Unset => ParentResolution::Unparented,
        ParentRef::Native { name } => registry
            .ancestors(context_class)
            .into_iter()
            .find_map(|class| {
                class
                    .find_native_component(name)
                    .map(|template| ParentResolution::Native {
                        class: class.name.as_str(),
                        template,
                    })
            })
            .unwrap_or(ParentResolution::Unparented),
        ParentRef::Inherited { name, owner_class } => {
            let Some(owner) = registry
                .ancestors(context_class)
                .into_iter()
                .find(|class| names_match(&class.name, owner_class))
            else {
                return ParentResolution::Unparented;
            };
            resolve_in_tree(&owner.construction, name, registry, context_class)
        }
        ParentRef::Local { name } => resolve_in_tree(tree, name, registry, context_class),
    }
}

fn resolve_in_tree<'a>(
    tree: &'a NodeTree,
    name: &str,
    registry: &'a ClassRegistry,
    context_class: &str,
) -> ParentResolution<'a> {
    match tree.find_by_name(name) {
        Some(parent) => ParentResolution::Node {
            owner_class: tree.owner_class(),
            node: parent,
            template: registry.actual_component_template(parent, tree.owner_class(), context_class),
        },
        None => ParentResolution::Unparented,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprints::GeneratedClass;
    use crate::component::{ComponentClass, PropertyValue};

    fn scene() -> ComponentClass {
        ComponentClass::scene("SceneComponent")
    }

    fn node(name: &str) -> ConstructionNode {
        ConstructionNode::new(&scene(), name).unwrap()
    }

    fn native(name: &str, tag: &str) -> ComponentTemplate {
        let mut template = ComponentTemplate::from_class(&scene(), name);
        template.set_property("tag", tag);
        template
    }

    /// BP_Base (native Root, tree Arm) <- BP_Mid (native Root) <- BP_Leaf
    fn registry() -> ClassRegistry {
        let mut registry = ClassRegistry::new();
        registry.register_component_class(scene());

        let mut base = GeneratedClass::new("BP_Base", None)
            .with_native_component(native("Root", "base"));
        base.construction.add_root(node("Arm")).unwrap();
        registry.register_class(base);
        registry.register_class(
            GeneratedClass::new("BP_Mid", Some("BP_Base"))
                .with_native_component(native("Root", "mid")),
        );
        registry.register_class(GeneratedClass::new("BP_Leaf", Some("BP_Mid")));
        registry
    }

    fn tag(template: Option<&ComponentTemplate>) -> Option<&PropertyValue> {
        template?.property("tag")
    }

    #[test]
    fn test_parent_ref_round_trips_through_json() {
        let parent = ParentRef::Inherited {
            name: "Frame".into(),
            owner_class: "BP_Door".into(),
        };
        let json = serde_json::to_string(&parent).unwrap();
        assert!(json.contains("\"kind\":\"inherited\""));
        let back: ParentRef = serde_json::from_str(&json).unwrap();
        assert_eq!(back, parent);
    }

    #[test]
    fn test_parent_ref_name() {
        assert_eq!(ParentRef::Unset.name(), None);
        assert_eq!(ParentRef::Native { name: "Root".into() }.name(), Some("Root"));
    }

    #[test]
    fn test_set_parent_node_scope_follows_owner_class() {
        let arm = node("Arm");
        let mut hand = node("Hand");

        hand.set_parent_node(&arm, "bp_base", "BP_Base");
        assert_eq!(hand.parent, ParentRef::Local { name: "Arm".into() });

        hand.set_parent_node(&arm, "BP_Base", "BP_Leaf");
        assert_eq!(
            hand.parent,
            ParentRef::Inherited {
                name: "Arm".into(),
                owner_class: "BP_Base".into()
            }
        );

        hand.clear_parent();
        assert!(hand.parent.is_unset());
    }

    #[test]
    fn test_local_parent_resolves_in_own_tree() {
        let registry = registry();
        let mut tree = NodeTree::new("BP_Leaf");
        tree.add_root(node("Body")).unwrap();
        let body = tree.find_by_name("Body").unwrap().clone();

        let mut hat = node("Hat");
        hat.set_parent_node(&body, "BP_Leaf", "BP_Leaf");
        let template = hat.resolve_parent_template(&tree, &registry, "BP_Leaf");
        assert_eq!(template.map(|t| t.name.as_str()), Some("Body_GEN_VARIABLE"));

        match resolve_parent(&hat, &tree, &registry, "BP_Leaf") {
            ParentResolution::Node { owner_class, node, .. } => {
                assert_eq!(owner_class, "BP_Leaf");
                assert_eq!(node.guid(), body.guid());
            }
            other => panic!("expected a node parent, got {:?}", other),
        }

        let mut lost = node("Lost");
        lost.parent = ParentRef::Local { name: "Nobody".into() };
        assert!(lost.resolve_parent_template(&tree, &registry, "BP_Leaf").is_none());
    }

    #[test]
    fn test_native_parent_prefers_nearest_class() {
        let registry = registry();
        let tree = NodeTree::new("BP_Leaf");
        let mut gun = node("Gun");
        gun.set_parent_native("root");

        match resolve_parent(&gun, &tree, &registry, "BP_Leaf") {
            ParentResolution::Native { class, template } => {
                assert_eq!(class, "BP_Mid");
                assert_eq!(tag(Some(template)), Some(&PropertyValue::from("mid")));
            }
            other => panic!("expected a native parent, got {:?}", other),
        }

        let from_base = gun.resolve_parent_template(&tree, &registry, "BP_Base");
        assert_eq!(tag(from_base), Some(&PropertyValue::from("base")));

        gun.set_parent_native("Missing");
        assert!(!resolve_parent(&gun, &tree, &registry, "BP_Leaf").is_resolved());
    }

    #[test]
    fn test_inherited_parent_uses_context_override() {
        let mut registry = registry();
        let arm = registry
            .class("BP_Base")
            .unwrap()
            .construction
            .find_by_name("Arm")
            .unwrap()
            .clone();
        let mut replacement = ComponentTemplate::from_class(&scene(), "Arm_GEN_VARIABLE");
        replacement.set_property("tag", "leaf");
        registry
            .class_mut("BP_Leaf")
            .unwrap()
            .set_override("BP_Base", &arm, replacement);

        let tree = NodeTree::new("BP_Leaf");
        let mut hand = node("Hand");
        hand.set_parent_node(&arm, "BP_Base", "BP_Leaf");

        let from_leaf = hand.resolve_parent_template(&tree, &registry, "BP_Leaf");
        assert_eq!(tag(from_leaf), Some(&PropertyValue::from("leaf")));
        let from_mid = hand.resolve_parent_template(&tree, &registry, "BP_Mid");
        assert_eq!(from_mid.map(|t| t.name.as_str()), Some("Arm_GEN_VARIABLE"));
        assert_eq!(tag(from_mid), None);

        // The owner class must be part of the context chain
        hand.parent = ParentRef::Inherited {
            name: "Arm".into(),
            owner_class: "BP_Elsewhere".into(),
        };
        assert!(hand.resolve_parent_template(&tree, &registry, "BP_Leaf").is_none());
    }
}
