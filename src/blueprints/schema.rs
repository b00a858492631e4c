//! Blueprint file schema for TOML deserialization.
//!
//! One file may declare any number of component classes and blueprint
//! classes. Classes may refer to component classes and parent classes from
//! other files loaded into the same registry.

use serde::{Deserialize, Serialize};

use super::generated::GeneratedClass;
use crate::component::ComponentClass;

/// Top-level contents of a blueprint file
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BlueprintFile {
    #[serde(default)]
    pub component_classes: Vec<ComponentClass>,
    #[serde(default)]
    pub classes: Vec<GeneratedClass>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scs::ParentRef;

    #[test]
    fn test_parse_blueprint_file() {
        let toml_str = r#"
[[component_classes]]
name = "SceneComponent"
scene = true

[[component_classes]]
name = "StaticMesh"
scene = true
sockets = ["handle"]
defaults = { mesh = "cube", collision = true }

[[classes]]
name = "BP_Door"

[[classes.native_components]]
name = "Root"
class = "SceneComponent"

[classes.construction]
[[classes.construction.roots]]
variable_name = "Frame"
component_class = "StaticMesh"
parent = { kind = "native", name = "Root" }

[classes.construction.roots.template]
properties = { mesh = "door_frame" }
transform = { location = [0.0, 0.0, 10.0] }
authored = { location = true }

[[classes.construction.roots.children]]
variable_name = "Knob"
component_class = "StaticMesh"
attach_to = "handle"
"#;

        let file: BlueprintFile = toml::from_str(toml_str).unwrap();
        assert_eq!(file.component_classes.len(), 2);
        assert!(file.component_classes[1].has_socket("Handle"));

        let door = &file.classes[0];
        assert_eq!(door.native_components[0].name, "Root");
        let frame = &door.construction.roots()[0];
        assert_eq!(frame.parent, ParentRef::Native { name: "Root".into() });
        assert!(frame.template().authored.location);
        assert!(!frame.template().authored.rotation);
        assert_eq!(frame.children()[0].attach_to.as_deref(), Some("handle"));
    }
}
