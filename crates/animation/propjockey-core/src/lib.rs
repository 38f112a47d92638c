//! PropJockey animation core.
//!
//! Frame-driven keyframe animation: a [`TimingPool`] pumps one delta per frame into every
//! active (object, animation) [`InstanceState`], the evaluator resolves each property's value
//! through its ease and slide, and a setter writes it into the object. Cached bezier eases
//! live in a generational [`EaseCache`] arena.
//!
//! Everything here is single-threaded (`Rc`/`RefCell`). Identifier parsing and JSON loading
//! live in `propjockey-config`; this crate only sees resolved callables.

pub mod animation;
pub mod callbacks;
pub mod definition;
pub mod ease;
pub mod error;
pub mod evaluate;
pub mod frames;
pub mod ids;
pub mod instance;
pub mod pool;
pub mod setters;
pub mod slide;
pub mod target;
pub mod tick;
pub mod value;

// Re-exports for hosts and the config crate
pub use animation::Animation;
pub use callbacks::{Ease, FrameCallback, KeyframeCallback, KeyframeValue, Resolvable, Setter, Slide};
pub use definition::{AnimationDefinition, AnimationDefinitionBuilder, Keyframe, PropertyConfig};
pub use ease::{CacheOrigin, CacheStatus, CachedEase, CurveParams, EaseCache, StepJump};
pub use error::{AnimationError, CallbackError, CallbackResult};
pub use evaluate::{evaluate_property, PropertyFrame};
pub use frames::{FrameSource, IntervalFrames, ManualFrames, TimestampFrames};
pub use ids::AnimationId;
pub use instance::{Cursor, InstanceState, PlaySettings};
pub use pool::{PoolTicker, TimingPool};
pub use target::{ObjectRef, PropertyBag, Target};
pub use tick::{tick_instance, TickOutcome};
pub use value::{Value, ValueKind};

/// Result type for animation operations
pub type Result<T> = core::result::Result<T, AnimationError>;
