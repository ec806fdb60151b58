//! Keyframe animations.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::types::design::RuleMap;
use crate::types::location::SourceLocation;

/// One `@keyframes` definition. Children are namespaced `parent-child`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Animation {
    pub name: String,
    /// Frame selector (`from`, `50%`) to properties.
    #[serde(default)]
    pub frames: IndexMap<String, RuleMap>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AnimationRef {
    /// Namespaced name, e.g. `fade-in`.
    pub name: String,
    pub frames: IndexMap<String, RuleMap>,
    pub url: Option<String>,
    pub pointer: String,
    pub location: Option<SourceLocation>,
}

pub type AnimationMap = IndexMap<String, AnimationRef>;
