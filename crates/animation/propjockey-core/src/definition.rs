//! Immutable animation definitions.
//!
//! A definition is built once through [`AnimationDefinition::builder`] and shared by every
//! instance playing it. Building derives the property order, the `maxFPS` frame interval
//! and the last keyframe position, and rejects keyframes the evaluator cannot scan.

use indexmap::IndexMap;

use crate::callbacks::{Ease, FrameCallback, KeyframeCallback, KeyframeValue, Resolvable, Setter, Slide};
use crate::error::AnimationError;
use crate::ids::AnimationId;
use crate::pool::TimingPool;
use crate::{setters, slide, Result};

#[derive(Clone, Debug)]
pub struct Keyframe {
    pub position: f64,
    pub value: KeyframeValue,
    /// Ease for the segment starting at this keyframe.
    pub ease: Option<Ease>,
    pub callback: Option<KeyframeCallback>,
}

impl Keyframe {
    pub fn new(position: f64, value: impl Into<KeyframeValue>) -> Self {
        Self {
            position,
            value: value.into(),
            ease: None,
            callback: None,
        }
    }

    pub fn with_ease(mut self, ease: impl Into<Ease>) -> Self {
        self.ease = Some(ease.into());
        self
    }

    pub fn with_callback(mut self, callback: KeyframeCallback) -> Self {
        self.callback = Some(callback);
        self
    }
}

#[derive(Clone, Debug)]
pub struct PropertyConfig {
    pub keyframes: Vec<Keyframe>,
    pub slide: Option<Slide>,
    pub setter: Option<Setter>,
    pub unit: Option<String>,
}

impl PropertyConfig {
    pub fn new(keyframes: Vec<Keyframe>) -> Self {
        Self {
            keyframes,
            slide: None,
            setter: None,
            unit: None,
        }
    }

    pub fn with_slide(mut self, slide: Slide) -> Self {
        self.slide = Some(slide);
        self
    }

    pub fn with_setter(mut self, setter: Setter) -> Self {
        self.setter = Some(setter);
        self
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    fn validate(&self, name: &str) -> Result<()> {
        let invalid = |reason: String| AnimationError::InvalidKeyframes {
            property: name.to_string(),
            reason,
        };
        let mut previous = 0.0f64;
        for (i, kf) in self.keyframes.iter().enumerate() {
            if !kf.position.is_finite() || kf.position < 0.0 {
                return Err(invalid(format!(
                    "keyframe {i} has position {}, expected a finite non-negative value",
                    kf.position
                )));
            }
            if kf.position < previous {
                return Err(invalid(format!(
                    "keyframe {i} at {} comes before keyframe {} at {previous}",
                    kf.position,
                    i - 1
                )));
            }
            previous = kf.position;
        }
        Ok(())
    }
}

#[derive(Debug)]
pub struct AnimationDefinition {
    id: AnimationId,
    name: String,
    props: IndexMap<String, PropertyConfig>,
    default_ease: Ease,
    default_slide: Slide,
    default_setter: Setter,
    max_fps: Option<f64>,
    min_timestamp_delta: f64,
    last_keyframe_position: f64,
    initial_delay: Resolvable<f64>,
    repeat_delay: Resolvable<f64>,
    repeat: Resolvable<bool>,
    ebb: Resolvable<bool>,
    on_after_frame: Option<FrameCallback>,
    timing_pool: TimingPool,
}

impl AnimationDefinition {
    pub fn builder(timing_pool: TimingPool) -> AnimationDefinitionBuilder {
        AnimationDefinitionBuilder::new(timing_pool)
    }

    #[inline]
    pub fn id(&self) -> AnimationId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Properties in evaluation order.
    pub fn props(&self) -> impl Iterator<Item = (&str, &PropertyConfig)> {
        self.props.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn prop(&self, name: &str) -> Option<&PropertyConfig> {
        self.props.get(name)
    }

    pub fn prop_names(&self) -> impl Iterator<Item = &str> {
        self.props.keys().map(String::as_str)
    }

    pub fn prop_count(&self) -> usize {
        self.props.len()
    }

    pub fn default_ease(&self) -> &Ease {
        &self.default_ease
    }

    pub fn default_slide(&self) -> &Slide {
        &self.default_slide
    }

    pub fn default_setter(&self) -> &Setter {
        &self.default_setter
    }

    pub fn max_fps(&self) -> Option<f64> {
        self.max_fps
    }

    /// `1000 / maxFPS`, or 0 when unthrottled.
    #[inline]
    pub fn min_timestamp_delta(&self) -> f64 {
        self.min_timestamp_delta
    }

    #[inline]
    pub fn last_keyframe_position(&self) -> f64 {
        self.last_keyframe_position
    }

    pub fn initial_delay(&self) -> &Resolvable<f64> {
        &self.initial_delay
    }

    pub fn repeat_delay(&self) -> &Resolvable<f64> {
        &self.repeat_delay
    }

    pub fn repeat(&self) -> &Resolvable<bool> {
        &self.repeat
    }

    pub fn ebb(&self) -> &Resolvable<bool> {
        &self.ebb
    }

    pub fn on_after_frame(&self) -> Option<&FrameCallback> {
        self.on_after_frame.as_ref()
    }

    pub fn timing_pool(&self) -> &TimingPool {
        &self.timing_pool
    }
}

pub struct AnimationDefinitionBuilder {
    timing_pool: TimingPool,
    name: String,
    props: IndexMap<String, PropertyConfig>,
    default_ease: Option<Ease>,
    default_slide: Option<Slide>,
    default_setter: Option<Setter>,
    max_fps: Option<f64>,
    initial_delay: Resolvable<f64>,
    repeat_delay: Resolvable<f64>,
    repeat: Resolvable<bool>,
    ebb: Resolvable<bool>,
    on_after_frame: Option<FrameCallback>,
}

impl AnimationDefinitionBuilder {
    fn new(timing_pool: TimingPool) -> Self {
        Self {
            timing_pool,
            name: String::new(),
            props: IndexMap::new(),
            default_ease: None,
            default_slide: None,
            default_setter: None,
            max_fps: None,
            initial_delay: Resolvable::default(),
            repeat_delay: Resolvable::default(),
            repeat: Resolvable::default(),
            ebb: Resolvable::default(),
            on_after_frame: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Add (or replace) a property. Properties evaluate in insertion order.
    pub fn prop(mut self, name: impl Into<String>, config: PropertyConfig) -> Self {
        self.props.insert(name.into(), config);
        self
    }

    pub fn default_ease(mut self, ease: impl Into<Ease>) -> Self {
        self.default_ease = Some(ease.into());
        self
    }

    pub fn default_slide(mut self, slide: Slide) -> Self {
        self.default_slide = Some(slide);
        self
    }

    pub fn default_setter(mut self, setter: Setter) -> Self {
        self.default_setter = Some(setter);
        self
    }

    /// Throttle writes to at most `fps` frames per second. 0 disables throttling.
    pub fn max_fps(mut self, fps: f64) -> Self {
        self.max_fps = Some(fps);
        self
    }

    pub fn initial_delay(mut self, delay: impl Into<Resolvable<f64>>) -> Self {
        self.initial_delay = delay.into();
        self
    }

    pub fn repeat_delay(mut self, delay: impl Into<Resolvable<f64>>) -> Self {
        self.repeat_delay = delay.into();
        self
    }

    pub fn repeat(mut self, repeat: impl Into<Resolvable<bool>>) -> Self {
        self.repeat = repeat.into();
        self
    }

    pub fn ebb(mut self, ebb: impl Into<Resolvable<bool>>) -> Self {
        self.ebb = ebb.into();
        self
    }

    pub fn on_after_frame(mut self, callback: FrameCallback) -> Self {
        self.on_after_frame = Some(callback);
        self
    }

    pub fn build(self) -> Result<AnimationDefinition> {
        let max_fps = match self.max_fps {
            Some(fps) if !fps.is_finite() || fps < 0.0 => {
                return Err(AnimationError::InvalidDefinition {
                    reason: format!("maxFPS must be a finite non-negative number, got {fps}"),
                })
            }
            Some(fps) if fps > 0.0 => Some(fps),
            _ => None,
        };

        let mut last_keyframe_position = 0.0f64;
        for (name, prop) in &self.props {
            prop.validate(name)?;
            if let Some(last) = prop.keyframes.last() {
                last_keyframe_position = last_keyframe_position.max(last.position);
            }
        }

        let id = self.timing_pool.alloc_animation_id();
        log::debug!(
            "built animation {:?} '{}' ({} props, last keyframe at {last_keyframe_position})",
            id,
            self.name,
            self.props.len()
        );

        Ok(AnimationDefinition {
            id,
            name: self.name,
            props: self.props,
            default_ease: self.default_ease.unwrap_or_else(Ease::linear),
            default_slide: self.default_slide.unwrap_or_else(slide::number),
            default_setter: self.default_setter.unwrap_or_else(setters::prop),
            max_fps,
            min_timestamp_delta: max_fps.map(|fps| 1000.0 / fps).unwrap_or(0.0),
            last_keyframe_position,
            initial_delay: self.initial_delay,
            repeat_delay: self.repeat_delay,
            repeat: self.repeat,
            ebb: self.ebb,
            on_after_frame: self.on_after_frame,
            timing_pool: self.timing_pool,
        })
    }
}
