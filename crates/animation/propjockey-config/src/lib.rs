//! Declarative animation documents for propjockey.
//!
//! A JSON document names its eases, slides, setters, timing pool and callbacks by identifier.
//! [`HydrationStore`] resolves those identifiers to callables and [`hydrate`] assembles a core
//! [`AnimationDefinition`](propjockey_core::AnimationDefinition).
//!
//! ```no_run
//! use propjockey_config::{parse_animation_json, HydrationStore};
//! use propjockey_core::{ObjectRef, PropertyBag};
//!
//! let store = HydrationStore::new();
//! let anim = parse_animation_json(
//!     r#"{ "timingPool": "timing.manual",
//!          "props": { "x": { "keyframes": [
//!              { "position": 0, "value": 0, "ease": "ease.ease-in-out" },
//!              { "position": 1000, "value": 100 } ] } } }"#,
//!     &store,
//! )?;
//! let obj = ObjectRef::new(PropertyBag::new());
//! anim.play(&obj, None)?;
//! anim.timing_pool().tick(16.0)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod document;
pub mod error;
pub mod hydrate;
pub mod kinds;
pub mod store;

pub use document::{
    AnimationDocument, FactoryArg, Identifier, KeyframeDocument, KeyframeValueDocument,
    PropertyDocument, Setting,
};
pub use error::ConfigError;
pub use hydrate::{hydrate, parse_animation_json};
pub use kinds::{EaseKind, SetterKind, SlideKind, TimingKind};
pub use store::HydrationStore;

pub type Result<T> = core::result::Result<T, ConfigError>;
