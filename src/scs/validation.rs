//! Data validation for nodes and trees.
//!
//! Nothing in the construction path calls these; they exist for tooling that
//! wants to report problems before a class is cooked or spawned.

use ahash::AHashSet;

use super::naming::validate_variable_name;
use super::node::ConstructionNode;
use super::tree::NodeTree;
use crate::core::types::names_match;

/// Result of validating an object
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataValidation {
    Valid,
    Invalid(Vec<String>),
    /// No rules applied (e.g. empty tree)
    NotValidated,
}

impl DataValidation {
    pub fn from_errors(errors: Vec<String>) -> Self {
        if errors.is_empty() {
            DataValidation::Valid
        } else {
            DataValidation::Invalid(errors)
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, DataValidation::Valid)
    }

    pub fn errors(&self) -> &[String] {
        match self {
            DataValidation::Invalid(errors) => errors,
            _ => &[],
        }
    }

    /// Merge two results; invalid wins, then valid
    pub fn combine(self, other: DataValidation) -> DataValidation {
        match (self, other) {
            (DataValidation::Invalid(mut a), DataValidation::Invalid(b)) => {
                a.extend(b);
                DataValidation::Invalid(a)
            }
            (DataValidation::Invalid(a), _) | (_, DataValidation::Invalid(a)) => {
                DataValidation::Invalid(a)
            }
            (DataValidation::Valid, _) | (_, DataValidation::Valid) => DataValidation::Valid,
            _ => DataValidation::NotValidated,
        }
    }
}

impl ConstructionNode {
    /// Check this node on its own (children are not visited)
    pub fn validate(&self) -> DataValidation {
        let mut errors = Vec::new();
        let name = self.variable_name();

        if validate_variable_name(name).is_err() {
            errors.push(format!("invalid variable name {:?}", name));
        }
        if self.component_class().is_empty() {
            errors.push(format!("{}: no component class", name));
        }
        if !names_match(&self.template().class, self.component_class()) {
            errors.push(format!(
                "{}: template class '{}' does not match component class '{}'",
                name,
                self.template().class,
                self.component_class()
            ));
        }
        if let Some(cooked) = &self.cooked {
            if !names_match(&cooked.component_class, self.component_class()) {
                errors.push(format!(
                    "{}: cooked data was built for '{}'",
                    name, cooked.component_class
                ));
            }
        }
        if matches!(self.attach_to.as_deref(), Some(socket) if socket.trim().is_empty()) {
            errors.push(format!("{}: empty attach socket", name));
        }
        if matches!(self.parent.name(), Some(parent) if parent.trim().is_empty()) {
            errors.push(format!("{}: parent reference has an empty name", name));
        }
        for key in self.metadata.duplicate_keys() {
            errors.push(format!("{}: duplicate metadata key '{}'", name, key));
        }

        DataValidation::from_errors(errors)
    }
}

impl NodeTree {
    /// Check every node plus the tree-wide invariants
    pub fn validate(&self) -> DataValidation {
        let nodes = self.all_nodes();
        if nodes.is_empty() {
            return DataValidation::NotValidated;
        }

        let mut errors = Vec::new();
        let mut names = AHashSet::new();
        let mut guids = AHashSet::new();

        for node in &nodes {
            errors.extend(node.validate().errors().iter().cloned());

            if !names.insert(node.variable_name().to_ascii_lowercase()) {
                errors.push(format!("duplicate variable name '{}'", node.variable_name()));
            }
            if node.guid().is_nil() {
                errors.push(format!("{}: missing guid", node.variable_name()));
            } else if !guids.insert(node.guid()) {
                errors.push(format!("{}: guid shared with another node", node.variable_name()));
            }
            if !self.is_root_node(node.guid()) && !node.parent.is_unset() {
                errors.push(format!(
                    "{}: parent reference on a non-root node is ignored",
                    node.variable_name()
                ));
            }
        }

        DataValidation::from_errors(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::ComponentClass;

    fn node(name: &str) -> ConstructionNode {
        ConstructionNode::new(&ComponentClass::scene("SceneComponent"), name).unwrap()
    }

    #[test]
    fn test_fresh_node_is_valid() {
        assert_eq!(node("Frame").validate(), DataValidation::Valid);
    }

    #[test]
    fn test_node_rules() {
        let mut n = node("Frame");
        n.template_mut().class = "StaticMesh".into();
        n.attach_to = Some(" ".into());

        let result = n.validate();
        assert!(!result.is_valid());
        assert_eq!(result.errors().len(), 2);
    }

    #[test]
    fn test_empty_tree_not_validated() {
        assert_eq!(NodeTree::new("BP_Empty").validate(), DataValidation::NotValidated);
    }

    #[test]
    fn test_tree_flags_nested_parent_ref() {
        let mut tree = NodeTree::new("BP_Lamp");
        let root = node("Root");
        let root_guid = root.guid();
        tree.add_root(root).unwrap();
        let mut child = node("Bulb");
        child.set_parent_native("Stand");
        tree.add_child(root_guid, child).unwrap();

        let result = tree.validate();
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("non-root"));
    }

    #[test]
    fn test_combine() {
        let invalid = DataValidation::Invalid(vec!["a".into()]);
        assert_eq!(
            DataValidation::Valid.combine(invalid.clone()),
            invalid.clone()
        );
        assert_eq!(
            DataValidation::NotValidated.combine(DataValidation::Valid),
            DataValidation::Valid
        );
        assert_eq!(
            DataValidation::NotValidated.combine(DataValidation::NotValidated),
            DataValidation::NotValidated
        );
        let merged = invalid.combine(DataValidation::Invalid(vec!["b".into()]));
        assert_eq!(merged.errors().len(), 2);
    }
}
