//! Serde model of a declarative animation document.
//!
//! Everything callable is referenced by identifier: a plain string naming a store entry, or an
//! array whose head names a factory and whose tail are its arguments. Literal settings
//! (delays, `repeat`, `ebb`) may be given directly or by identifier.

use indexmap::IndexMap;
use propjockey_core::Value;
use serde::{Deserialize, Serialize};

/// `"ease.linear"` or `["memoize.cubic-bezier", 0.25, 0.1, 0.25, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Identifier {
    Name(String),
    Call(Vec<FactoryArg>),
}

impl Identifier {
    pub fn name(name: impl Into<String>) -> Self {
        Identifier::Name(name.into())
    }
}

impl From<&str> for Identifier {
    fn from(name: &str) -> Self {
        Identifier::Name(name.to_string())
    }
}

/// One element of an array-encoded factory call.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FactoryArg {
    Number(f64),
    Text(String),
    Call(Vec<FactoryArg>),
}

/// A literal setting or the identifier of a registered function producing it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Setting<T> {
    Literal(T),
    Named(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum KeyframeValueDocument {
    /// Read from a registered value source when the keyframe is evaluated.
    Source { source: String },
    Literal(Value),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyframeDocument {
    pub position: f64,
    pub value: KeyframeValueDocument,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ease: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub callback: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyDocument {
    pub keyframes: Vec<KeyframeDocument>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slide: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setter: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

/// Top-level animation document. `props` keeps document order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationDocument {
    #[serde(default)]
    pub name: String,
    pub props: IndexMap<String, PropertyDocument>,
    #[serde(rename = "maxFPS", default, skip_serializing_if = "Option::is_none")]
    pub max_fps: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_delay: Option<Setting<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat_delay: Option<Setting<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repeat: Option<Setting<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ebb: Option<Setting<bool>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_after_frame: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timing_pool: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_ease: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_slide: Option<Identifier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_setter: Option<Identifier>,
}

impl AnimationDocument {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}
