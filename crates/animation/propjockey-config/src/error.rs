//! Errors raised while turning a document into a definition.

use propjockey_core::AnimationError;

#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum ConfigError {
    /// The JSON text is not a valid animation document
    #[error("Failed to parse animation document: {0}")]
    Parse(#[from] serde_json::Error),

    /// An identifier string names nothing in the hydration store
    #[error("Unknown {kind} identifier '{name}'")]
    UnknownIdentifier { kind: &'static str, name: String },

    /// An array-encoded factory call has the wrong shape or arguments
    #[error("Bad factory call {factory}: {reason}")]
    BadFactoryCall { factory: String, reason: String },

    /// The hydrated definition was rejected by the core
    #[error(transparent)]
    Definition(#[from] AnimationError),
}

impl ConfigError {
    pub(crate) fn unknown(kind: &'static str, name: impl Into<String>) -> Self {
        Self::UnknownIdentifier {
            kind,
            name: name.into(),
        }
    }

    pub(crate) fn bad_call(factory: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::BadFactoryCall {
            factory: factory.into(),
            reason: reason.into(),
        }
    }

    /// Get error category for logging/metrics
    #[inline]
    pub fn category(&self) -> &'static str {
        match self {
            Self::Parse(_) => "parse",
            Self::UnknownIdentifier { .. } | Self::BadFactoryCall { .. } => "identifier",
            Self::Definition(err) => err.category(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories() {
        assert_eq!(ConfigError::unknown("ease", "ease.nope").category(), "identifier");
        let err: ConfigError = AnimationError::InvalidDefinition {
            reason: "maxFPS".into(),
        }
        .into();
        assert_eq!(err.category(), "validation");
        assert_eq!(
            ConfigError::unknown("slide", "slide.nope").to_string(),
            "Unknown slide identifier 'slide.nope'"
        );
    }
}
