//! Object-to-text rendering for hook input.
//!
//! Hooks receive the event object as a YAML document on stdin.

use crate::error::ClusterError;
use kube::api::DynamicObject;

/// Renders one object as a YAML document.
pub fn to_yaml(object: &DynamicObject) -> Result<String, ClusterError> {
    Ok(serde_yaml::to_string(object)?)
}
