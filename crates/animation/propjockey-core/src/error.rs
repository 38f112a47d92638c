//! Error types for the animation core.
//!
//! Two layers: [`CallbackError`] is what user-supplied callables (eases, slides, setters,
//! predicates, frame callbacks) return, and [`AnimationError`] is what the public API
//! returns. Callback failures are never swallowed; they bubble out of `TimingPool::tick`.

use crate::value::ValueKind;

/// Failure raised by a resolved callable while a frame is being evaluated.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum CallbackError {
    /// A slide or setter received a value of the wrong kind
    #[error("Value kind mismatch: expected {expected:?}, got {actual:?}")]
    ValueKind {
        expected: ValueKind,
        actual: ValueKind,
    },

    /// A color slide could not parse one of its inputs
    #[error("Invalid hex color: {value:?}")]
    InvalidColor { value: String },

    /// A cached easing evaluator was used after its arena slot was freed
    #[error("Stale easing evaluator for slot {index} (generation {generation})")]
    StaleEase { index: usize, generation: u32 },

    /// Anything a host callback wants to report
    #[error("Callback failed: {message}")]
    Custom { message: String },
}

impl CallbackError {
    /// Create a free-form callback error
    pub fn new(message: impl Into<String>) -> Self {
        Self::Custom {
            message: message.into(),
        }
    }
}

/// Comprehensive error type for animation operations
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum AnimationError {
    /// `play` was called without an object to animate
    #[error("An object must be provided to play an animation")]
    MissingTarget,

    /// A property's keyframes cannot be evaluated
    #[error("Invalid keyframes for property '{property}': {reason}")]
    InvalidKeyframes { property: String, reason: String },

    /// Definition-level settings are out of range
    #[error("Invalid animation definition: {reason}")]
    InvalidDefinition { reason: String },

    /// Every slot of the easing arena is in use
    #[error("Easing cache arena exhausted ({capacity} slots)")]
    ArenaExhausted { capacity: usize },

    /// A user callback failed mid-frame
    #[error(transparent)]
    Callback(#[from] CallbackError),
}

impl AnimationError {
    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::MissingTarget => "usage",
            Self::InvalidKeyframes { .. } | Self::InvalidDefinition { .. } => "validation",
            Self::ArenaExhausted { .. } => "cache",
            Self::Callback(_) => "callback",
        }
    }
}

/// Result type for user-supplied callables
pub type CallbackResult<T> = core::result::Result<T, CallbackError>;
