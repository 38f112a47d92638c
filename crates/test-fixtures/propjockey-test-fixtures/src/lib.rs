//! Shared JSON fixtures for the propjockey crates' integration tests.
//!
//! `fixtures/manifest.json` at the workspace root maps fixture names to an animation document
//! and, optionally, a frame script describing ticks and the property values expected after each.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use indexmap::IndexMap;
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::Deserialize;

static MANIFEST: Lazy<Manifest> = Lazy::new(|| {
    let raw = include_str!("../../../../fixtures/manifest.json");
    serde_json::from_str(raw).expect("fixtures manifest should parse")
});

#[derive(Debug, Deserialize)]
struct Manifest {
    animations: HashMap<String, AnimationEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AnimationEntry {
    Path(String),
    Scripted {
        document: String,
        #[serde(default)]
        frames: Option<String>,
    },
}

impl AnimationEntry {
    fn document(&self) -> &str {
        match self {
            AnimationEntry::Path(path) => path,
            AnimationEntry::Scripted { document, .. } => document,
        }
    }

    fn frames(&self) -> Option<&str> {
        match self {
            AnimationEntry::Path(_) => None,
            AnimationEntry::Scripted { frames, .. } => frames.as_deref(),
        }
    }
}

/// One step of a frame script: optional control changes, one tick, then expectations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStep {
    /// Applied before the tick.
    #[serde(default)]
    pub set_speed: Option<f64>,
    #[serde(default)]
    pub seek: Option<f64>,
    /// Milliseconds handed to the pool.
    pub tick: f64,
    /// Property values on the object after the tick; numbers or text.
    #[serde(default)]
    pub expect: IndexMap<String, serde_json::Value>,
    #[serde(default)]
    pub position: Option<f64>,
    /// Whether the object should still be in the pool.
    #[serde(default)]
    pub playing: Option<bool>,
}

fn fixtures_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../../../fixtures")
}

fn resolve_path(rel: &str) -> PathBuf {
    fixtures_root().join(rel)
}

fn read_to_string(rel: &str) -> Result<String> {
    let path = resolve_path(rel);
    fs::read_to_string(&path)
        .with_context(|| format!("failed to read fixture at {}", path.display()))
}

fn load_json<T: DeserializeOwned>(rel: &str) -> Result<T> {
    let text = read_to_string(rel)?;
    serde_json::from_str(&text).with_context(|| format!("failed to parse JSON fixture {rel}"))
}

fn lookup<'a, T>(map: &'a HashMap<String, T>, kind: &str, name: &str) -> Result<&'a T> {
    map.get(name)
        .ok_or_else(|| anyhow!("unknown {kind} fixture '{name}'"))
}

pub mod animations {
    use super::*;

    pub fn keys() -> Vec<String> {
        let mut keys: Vec<String> = MANIFEST.animations.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Raw animation document text.
    pub fn json(name: &str) -> Result<String> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        read_to_string(entry.document())
    }

    pub fn load<T: DeserializeOwned>(name: &str) -> Result<T> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        super::load_json(entry.document())
    }

    pub fn path(name: &str) -> Result<PathBuf> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        Ok(resolve_path(entry.document()))
    }

    /// Frame script for `name`; empty when the fixture has none.
    pub fn frames(name: &str) -> Result<Vec<FrameStep>> {
        let entry = lookup(&MANIFEST.animations, "animation", name)?;
        match entry.frames() {
            Some(rel) => super::load_json(rel),
            None => Ok(Vec::new()),
        }
    }
}
