//! Class registry for loading, cooking and resolving blueprint classes.
//!
//! This module provides the `ClassRegistry` which owns the component classes
//! and generated blueprint classes, handles TOML file loading, walks class
//! hierarchies, and picks the template (or cooked data) a node is instanced
//! from for a given most-derived class.

use std::path::Path;

use ahash::{AHashMap, AHashSet};
use tracing::{debug, info, warn};

use super::generated::GeneratedClass;
use super::schema::BlueprintFile;
use crate::component::{ComponentClass, ComponentTemplate};
use crate::core::error::{ConstructError, Result};
use crate::core::types::names_match;
use crate::scs::{
    resolve_parent, ConstructionNode, CookedInstancingData, DataValidation, InstancingSource,
    MigrationReport,
};

/// Registry for component classes and blueprint classes
#[derive(Debug, Default)]
pub struct ClassRegistry {
    /// Component classes indexed by lowercased name
    component_classes: AHashMap<String, ComponentClass>,
    /// Blueprint classes indexed by lowercased name
    classes: AHashMap<String, GeneratedClass>,
}

fn key(name: &str) -> String {
    name.to_ascii_lowercase()
}

impl ClassRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self::default()
    }

    // === COMPONENT CLASSES ===

    /// Register a component class, returning any class it replaced
    ///
    /// Templates of already registered blueprint classes pick up the
    /// defaults they lack, so load order between files does not matter.
    pub fn register_component_class(&mut self, class: ComponentClass) -> Option<ComponentClass> {
        let name = class.name.clone();
        let replaced = self.component_classes.insert(key(&name), class);
        let component_classes = &self.component_classes;
        let filled: usize = self
            .classes
            .values_mut()
            .map(|generated| adopt_defaults(component_classes, generated, Some(&name)))
            .sum();
        if filled > 0 {
            debug!(class = %name, templates = filled, "filled templates from component class");
        }
        replaced
    }

    pub fn component_class(&self, name: &str) -> Option<&ComponentClass> {
        self.component_classes.get(&key(name))
    }

    // === BLUEPRINT CLASSES ===

    /// Register a blueprint class
    ///
    /// Runs the post-load migration on its tree and fills templates in from
    /// their component class defaults. Templates of classes not registered
    /// yet are filled when that class arrives.
    pub fn register_class(&mut self, mut class: GeneratedClass) -> MigrationReport {
        class.construction.set_owner_class(&class.name);
        let report = class.construction.post_load();

        adopt_defaults(&self.component_classes, &mut class, None);

        info!(
            class = %class.name,
            parent = class.parent.as_deref().unwrap_or("-"),
            nodes = class.construction.len(),
            natives = class.native_components.len(),
            "registered class"
        );
        self.classes.insert(key(&class.name), class);
        report
    }

    pub fn class(&self, name: &str) -> Option<&GeneratedClass> {
        self.classes.get(&key(name))
    }

    pub fn class_mut(&mut self, name: &str) -> Option<&mut GeneratedClass> {
        self.classes.get_mut(&key(name))
    }

    /// Registered class names, sorted
    pub fn class_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.classes.values().map(|c| c.name.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// The class itself followed by its ancestors, nearest first
    ///
    /// Stops at the first parent that is not registered, or on a loop.
    pub fn ancestors(&self, name: &str) -> Vec<&GeneratedClass> {
        let mut chain = Vec::new();
        let mut seen = AHashSet::new();
        let mut cursor = self.class(name);
        while let Some(class) = cursor {
            if !seen.insert(key(&class.name)) {
                warn!(class = %name, "class hierarchy loops back on {}", class.name);
                break;
            }
            chain.push(class);
            cursor = class.parent.as_deref().and_then(|parent| self.class(parent));
        }
        chain
    }

    /// Whether `ancestor` is `class` or one of its ancestors
    pub fn is_ancestor(&self, ancestor: &str, class: &str) -> bool {
        self.ancestors(class)
            .iter()
            .any(|c| names_match(&c.name, ancestor))
    }

    // === TEMPLATE RESOLUTION ===

    /// Template `node` (defined by `defining_class`) is instanced from when
    /// constructing `actual_class`
    ///
    /// Classes between `actual_class` and `defining_class` may override the
    /// template; the nearest override wins.
    pub fn actual_component_template<'a>(
        &'a self,
        node: &'a ConstructionNode,
        defining_class: &str,
        actual_class: &str,
    ) -> &'a ComponentTemplate {
        self.ancestors(actual_class)
            .into_iter()
            .take_while(|class| !names_match(&class.name, defining_class))
            .find_map(|class| class.find_override(defining_class, node))
            .map(|o| &o.template)
            .unwrap_or_else(|| node.template())
    }

    /// Fast or generic instancing source for `node`, same search as
    /// `actual_component_template`
    ///
    /// Cooked data is used only when `use_cooked` is set and the data was
    /// cooked for `class`.
    pub fn instancing_source<'a>(
        &'a self,
        node: &'a ConstructionNode,
        defining_class: &str,
        actual_class: &str,
        class: &ComponentClass,
        use_cooked: bool,
    ) -> InstancingSource<'a> {
        let pick = |cooked: Option<&'a CookedInstancingData>, template: &'a ComponentTemplate| {
            match cooked {
                Some(data) if use_cooked && data.is_valid_for(class) => {
                    InstancingSource::Cooked(data)
                }
                _ => InstancingSource::Template(template),
            }
        };

        let found = self
            .ancestors(actual_class)
            .into_iter()
            .take_while(|c| !names_match(&c.name, defining_class))
            .find_map(|c| c.find_override(defining_class, node));
        match found {
            Some(o) => pick(o.cooked.as_ref(), &o.template),
            None => pick(node.cooked.as_ref(), node.template()),
        }
    }

    // === COOKING ===

    /// Write cooked instancing data for every node and override of a class
    ///
    /// Returns how many entries were cooked. Entries whose component class is
    /// unknown have their cooked data cleared and fall back to the template.
    pub fn cook_class(&mut self, name: &str) -> Result<usize> {
        let component_classes = &self.component_classes;
        let class = self
            .classes
            .get_mut(&key(name))
            .ok_or_else(|| ConstructError::ClassNotFound(name.to_string()))?;

        let mut cooked = 0;
        for guid in class.construction.node_guids().to_vec() {
            let Some(node) = class.construction.find_node_mut(guid) else {
                continue;
            };
            match component_classes.get(&key(node.component_class())) {
                Some(component_class) => {
                    let data = CookedInstancingData::build(node.template(), component_class);
                    node.cooked = Some(data);
                    cooked += 1;
                }
                None => {
                    warn!(
                        class = %class.name,
                        node = %node.variable_name(),
                        "cannot cook node of unknown component class {}",
                        node.component_class()
                    );
                    node.cooked = None;
                }
            }
        }
        for component_override in &mut class.overrides {
            match component_classes.get(&key(&component_override.template.class)) {
                Some(component_class) => {
                    component_override.cooked = Some(CookedInstancingData::build(
                        &component_override.template,
                        component_class,
                    ));
                    cooked += 1;
                }
                None => component_override.cooked = None,
            }
        }

        info!(class = %class.name, cooked, "cooked class");
        Ok(cooked)
    }

    // === LOADING ===

    /// Load every class declared in a TOML string; returns their names
    pub fn load_str(&mut self, content: &str) -> Result<Vec<String>> {
        let file: BlueprintFile = toml::from_str(content)?;
        for component_class in file.component_classes {
            debug!(class = %component_class.name, "registered component class");
            self.register_component_class(component_class);
        }
        let mut names = Vec::with_capacity(file.classes.len());
        for class in file.classes {
            names.push(class.name.clone());
            self.register_class(class);
        }
        Ok(names)
    }

    /// Load a blueprint file
    pub fn load_file(&mut self, path: &Path) -> Result<Vec<String>> {
        let content = std::fs::read_to_string(path)?;
        self.load_str(&content)
    }

    /// Load all .toml files from a directory recursively
    pub fn load_directory(&mut self, path: &Path) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in std::fs::read_dir(path)? {
            let entry_path = entry?.path();
            if entry_path.is_dir() {
                names.extend(self.load_directory(&entry_path)?);
            } else if entry_path.extension().map_or(false, |ext| ext == "toml") {
                names.extend(self.load_file(&entry_path)?);
            }
        }
        Ok(names)
    }

    // === VALIDATION ===

    /// Validate a class's tree against the registry
    ///
    /// Adds registry-level checks to `NodeTree::validate`: known parent and
    /// component classes, sockets that exist on the parent node's class,
    /// resolvable root parent references, and overrides that still target
    /// a node.
    pub fn validate_class(&self, name: &str) -> Result<DataValidation> {
        let class = self
            .class(name)
            .ok_or_else(|| ConstructError::ClassNotFound(name.to_string()))?;
        let tree = &class.construction;
        let mut errors = Vec::new();

        if let Some(parent) = &class.parent {
            if self.class(parent).is_none() {
                errors.push(format!("parent class '{}' is not registered", parent));
            }
        }
        for native in &class.native_components {
            if self.component_class(&native.class).is_none() {
                errors.push(format!(
                    "native component {}: unknown component class '{}'",
                    native.name, native.class
                ));
            }
        }

        for node in tree.all_nodes() {
            let name = node.variable_name();
            if self.component_class(node.component_class()).is_none() {
                errors.push(format!(
                    "{}: unknown component class '{}'",
                    name,
                    node.component_class()
                ));
            }
            if let (Some(socket), Some(parent)) = (&node.attach_to, tree.parent_of(node.guid())) {
                if let Some(parent_class) = self.component_class(parent.component_class()) {
                    if !parent_class.has_socket(socket) {
                        errors.push(format!(
                            "{}: socket '{}' not found on {}",
                            name,
                            socket,
                            parent.variable_name()
                        ));
                    }
                }
            }
        }
        for root in tree.roots() {
            if !root.parent.is_unset()
                && !resolve_parent(root, tree, self, &class.name).is_resolved()
            {
                errors.push(format!(
                    "{}: parent '{}' cannot be resolved",
                    root.variable_name(),
                    root.parent.name().unwrap_or_default()
                ));
            }
        }
        for component_override in &class.overrides {
            let target = &component_override.key;
            let found = self.class(&target.owner_class).map_or(false, |owner| {
                owner
                    .construction
                    .all_nodes()
                    .iter()
                    .any(|n| target.matches(&owner.name, n))
            });
            if !found {
                errors.push(format!(
                    "override of {}.{} has no matching node",
                    target.owner_class, target.variable_name
                ));
            }
        }

        let registry_checks = DataValidation::from_errors(errors);
        Ok(tree.validate().combine(registry_checks))
    }
}

/// Fill the templates of `class` in from known component classes
///
/// With `only`, templates of other component classes are left alone.
/// Returns how many templates changed. Cooked data of a changed template
/// is dropped.
fn adopt_defaults(
    component_classes: &AHashMap<String, ComponentClass>,
    class: &mut GeneratedClass,
    only: Option<&str>,
) -> usize {
    let lookup = |name: &str| match only {
        Some(only) if !names_match(only, name) => None,
        _ => component_classes.get(&key(name)),
    };
    let mut filled = 0;
    for guid in class.construction.node_guids().to_vec() {
        let Some(node) = class.construction.find_node_mut(guid) else {
            continue;
        };
        let Some(component_class) = lookup(node.component_class()) else {
            continue;
        };
        if node.template().lacks_class_defaults(component_class) {
            node.template_mut().adopt_class_defaults(component_class);
            filled += 1;
        }
    }
    for template in &mut class.native_components {
        if let Some(component_class) = lookup(&template.class) {
            if template.lacks_class_defaults(component_class) {
                template.adopt_class_defaults(component_class);
                filled += 1;
            }
        }
    }
    for component_override in &mut class.overrides {
        let template = &mut component_override.template;
        if let Some(component_class) = lookup(&template.class) {
            if template.lacks_class_defaults(component_class) {
                template.adopt_class_defaults(component_class);
                component_override.cooked = None;
                filled += 1;
            }
        }
    }
    filled
}
