//! Keeps a node's variable name, its template name and any preview instances
//! in step, and tells listeners when a name changes.

use std::sync::Arc;

use crate::core::config::config;
use crate::core::error::{ConstructError, Result};
use crate::core::types::NodeGuid;

/// A completed rename
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NameChange {
    pub guid: NodeGuid,
    pub old_name: String,
    pub new_name: String,
    /// New template object name, if the template was renamed too
    pub template_name: Option<String>,
    /// Number of preview instances relabelled
    pub previews_renamed: usize,
}

type HookFn = dyn Fn(&NameChange) + Send + Sync;

/// Callback invoked after a node's variable name changes
#[derive(Clone)]
pub struct NameChangedHook(Arc<HookFn>);

impl NameChangedHook {
    pub fn new(f: impl Fn(&NameChange) + Send + Sync + 'static) -> Self {
        Self(Arc::new(f))
    }

    pub fn notify(&self, change: &NameChange) {
        (self.0)(change)
    }
}

impl std::fmt::Debug for NameChangedHook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("NameChangedHook")
    }
}

/// Already-spawned objects that trace back to construction nodes
///
/// Editor previews implement this so a rename can relabel their live
/// instances along with the template.
pub trait PreviewInstances {
    /// Rename every instance created from `node`; returns how many changed
    fn rename_instances_from(&mut self, node: NodeGuid, new_name: &str) -> usize;
}

/// Template object name derived from a variable name
pub fn template_name_for(variable_name: &str) -> String {
    format!("{}{}", variable_name, config().template_name_suffix)
}

/// Reject names that cannot serve as a field name
pub fn validate_variable_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && !name.starts_with(|c: char| c.is_ascii_digit())
        && name.chars().all(|c| c.is_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(ConstructError::InvalidName(name.to_string()))
    }
}

/// Split a trailing number off a name: `Mesh12` -> (`Mesh`, Some(12))
pub(crate) fn split_numeric_suffix(name: &str) -> (&str, Option<u32>) {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 || digits == name.len() {
        return (name, None);
    }
    let (base, number) = name.split_at(name.len() - digits);
    (base, number.parse().ok())
}
