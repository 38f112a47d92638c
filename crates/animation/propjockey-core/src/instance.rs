//! Per-(object, animation) playback state.
//!
//! [`InstanceState::tick`] only decides whether a frame should be evaluated; it never computes
//! values. Evaluation lives in [`crate::evaluate`].

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::definition::AnimationDefinition;
use crate::error::CallbackResult;
use crate::target::Target;

/// Settings consumed on the first `play` of an object; later plays reuse the instance.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaySettings {
    pub batch_name: Option<String>,
    pub batch_index: usize,
    /// Initial speed scale. Missing or 0 plays at 1.
    pub speed: Option<f64>,
    /// Repeats already "used up"; the first play reports this as its repeat count.
    pub repeat_count: Option<i64>,
}

impl PlaySettings {
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = Some(speed);
        self
    }

    pub fn with_batch(mut self, name: impl Into<String>, index: usize) -> Self {
        self.batch_name = Some(name.into());
        self.batch_index = index;
        self
    }
}

/// Where a property's playback sits relative to its keyframes.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cursor {
    /// Before the first keyframe, or not yet evaluated.
    BeforeStart,
    /// Inside the segment starting at this keyframe.
    At(usize),
    /// Past the last keyframe; its value has been written.
    AfterEnd,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceState {
    pub batch_name: Option<String>,
    pub batch_index: usize,
    pub current_position: f64,
    pub previous_position: f64,
    /// Signed playback rate; 0 pauses.
    pub current_speed: f64,
    /// Last non-zero speed, restored by `resume`.
    pub resume_speed: f64,
    pub abs_speed: f64,
    pub delay_remaining: f64,
    /// Wall-clock time accumulated while throttled by `maxFPS`.
    pub current_timestamp_delta: f64,
    pub repeat_count: i64,
    pub ebbing: bool,
    /// Position at which a zero-speed frame parked the instance.
    pub paused_at: Option<f64>,
    pub props: IndexMap<String, Cursor>,
}

impl InstanceState {
    /// Fresh state for a first play; resolves the initial delay against `target`.
    pub fn new(settings: &PlaySettings, definition: &AnimationDefinition, target: &dyn Target) -> CallbackResult<Self> {
        let speed = settings.speed.filter(|s| *s != 0.0).unwrap_or(1.0);
        let mut state = Self {
            batch_name: settings.batch_name.clone(),
            batch_index: settings.batch_index,
            current_position: 0.0,
            previous_position: 0.0,
            current_speed: speed,
            resume_speed: speed,
            abs_speed: speed.abs(),
            delay_remaining: 0.0,
            current_timestamp_delta: 0.0,
            repeat_count: settings.repeat_count.unwrap_or(0) - 1,
            ebbing: false,
            paused_at: None,
            props: IndexMap::with_capacity(definition.prop_count()),
        };
        state.force_repeat(definition, target)?;
        Ok(state)
    }

    #[inline]
    pub fn is_paused(&self) -> bool {
        self.paused_at.is_some()
    }

    pub fn cursor(&self, prop: &str) -> Option<Cursor> {
        self.props.get(prop).copied()
    }

    /// Rewind for another pass and return the new repeat count.
    ///
    /// Direction flips back if the previous pass ended while ebbing. The delay comes from
    /// `repeatDelay` once `repeat_count` is non-zero, `initialDelay` otherwise.
    pub fn force_repeat(&mut self, definition: &AnimationDefinition, target: &dyn Target) -> CallbackResult<i64> {
        self.props.clear();
        for name in definition.prop_names() {
            self.props.insert(name.to_string(), Cursor::BeforeStart);
        }
        let speed = if self.ebbing {
            -self.current_speed
        } else {
            self.current_speed
        };
        self.repeat_count += 1;
        self.paused_at = None;
        self.ebbing = false;
        self.delay_remaining = 0.0;
        self.previous_position = 0.0;
        self.current_position = if speed < 0.0 {
            definition.last_keyframe_position()
        } else {
            0.0
        };
        self.current_timestamp_delta = 0.0;
        self.current_speed = speed;
        self.resume_speed = speed;
        self.abs_speed = speed.abs();

        let delay = if self.repeat_count != 0 {
            definition.repeat_delay()
        } else {
            definition.initial_delay()
        };
        self.delay_remaining = delay.resolve(self, target)?.max(0.0);
        Ok(self.repeat_count)
    }

    /// Reverse direction in place and mark the instance as ebbing.
    pub fn force_ebb(&mut self) -> f64 {
        self.current_speed = -self.current_speed;
        self.resume_speed = self.current_speed;
        self.ebbing = true;
        self.current_speed
    }

    /// Advance by `delta` regardless of pause, delay or throttling.
    pub fn force_tick(&mut self, delta: f64) -> f64 {
        self.previous_position = self.current_position;
        self.current_position += delta * self.current_speed;
        self.current_timestamp_delta = 0.0;
        self.park_if_stopped();
        self.current_position
    }

    pub fn repeat(&mut self, definition: &AnimationDefinition, target: &dyn Target) -> CallbackResult<bool> {
        let repeat = definition.repeat().resolve(self, target)?;
        if repeat {
            self.force_repeat(definition, target)?;
        }
        Ok(repeat)
    }

    /// Only an instance that is not already ebbing can start to.
    pub fn ebb(&mut self, definition: &AnimationDefinition, target: &dyn Target) -> CallbackResult<bool> {
        if self.ebbing {
            return Ok(false);
        }
        let ebb = definition.ebb().resolve(self, target)?;
        if ebb {
            self.force_ebb();
        }
        Ok(ebb)
    }

    /// Count down the delay, honor `maxFPS`, and advance the position.
    ///
    /// Returns true when this frame should be evaluated and written.
    pub fn tick(&mut self, definition: &AnimationDefinition, delta: f64) -> bool {
        if self.is_paused() {
            if self.current_speed != 0.0 {
                self.paused_at = None;
            } else {
                return false;
            }
        }

        // the delay runs on the timeline clock, so it shrinks faster at higher speeds
        self.delay_remaining -= delta * self.abs_speed;
        if self.delay_remaining > 0.0 {
            return false;
        }
        let overshoot = (-self.delay_remaining).max(0.0);
        self.delay_remaining = 0.0;
        // back to wall-clock time: the advance below scales by speed again, so a frame with
        // no delay moves the position by exactly delta * speed
        let elapsed = if self.abs_speed > 0.0 {
            overshoot / self.abs_speed
        } else {
            0.0
        };

        self.current_timestamp_delta += elapsed;
        if definition.max_fps().is_some()
            && self.current_timestamp_delta < definition.min_timestamp_delta()
        {
            return false;
        }

        self.previous_position = self.current_position;
        self.current_position += self.current_timestamp_delta * self.current_speed;
        self.current_timestamp_delta = 0.0;
        self.park_if_stopped();
        true
    }

    /// Explicit speed change. A zero scale pauses but keeps `resume_speed`.
    pub fn set_speed(&mut self, scale: f64) {
        if scale != 0.0 {
            self.resume_speed = scale;
        }
        self.current_speed = scale;
        self.abs_speed = scale.abs();
    }

    /// Jump to `position` (clamped to the timeline) and render it on the next tick.
    pub fn seek(&mut self, position: f64, last_keyframe_position: f64) {
        self.delay_remaining = 0.0;
        self.current_position = position.max(0.0).min(last_keyframe_position);
        self.paused_at = None;
    }

    pub fn set_delay(&mut self, delay: f64) {
        self.delay_remaining = delay.max(0.0);
    }

    fn park_if_stopped(&mut self) {
        self.paused_at = (self.current_speed == 0.0).then_some(self.current_position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::Resolvable;
    use crate::definition::{Keyframe, PropertyConfig};
    use crate::pool::TimingPool;
    use crate::target::PropertyBag;

    fn definition(max_fps: Option<f64>) -> AnimationDefinition {
        let mut builder = AnimationDefinition::builder(TimingPool::manual())
            .prop(
                "x",
                PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(1000.0, 1.0)]),
            )
            .initial_delay(100.0)
            .repeat_delay(Resolvable::computed(|state, _| Ok(state.repeat_count as f64 * 10.0)));
        if let Some(fps) = max_fps {
            builder = builder.max_fps(fps);
        }
        builder.build().unwrap()
    }

    fn state(def: &AnimationDefinition, settings: PlaySettings) -> InstanceState {
        InstanceState::new(&settings, def, &PropertyBag::new()).unwrap()
    }

    #[test]
    fn first_play_defaults() {
        let def = definition(None);
        let s = state(&def, PlaySettings::default());
        assert_eq!(s.repeat_count, 0);
        assert_eq!(s.current_speed, 1.0);
        assert_eq!(s.delay_remaining, 100.0);
        assert_eq!(s.cursor("x"), Some(Cursor::BeforeStart));
        assert!(!s.is_paused());

        let s = state(&def, PlaySettings::default().with_speed(0.0));
        assert_eq!(s.current_speed, 1.0);
    }

    #[test]
    fn delay_counts_down_then_overshoot_advances() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default());
        assert!(!s.tick(&def, 60.0));
        assert_eq!(s.delay_remaining, 40.0);
        assert!(s.tick(&def, 60.0));
        assert_eq!(s.delay_remaining, 0.0);
        assert_eq!(s.current_position, 20.0);
    }

    #[test]
    fn speed_scales_position_not_time() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default().with_speed(2.0));
        s.set_delay(0.0);
        assert!(s.tick(&def, 250.0));
        assert_eq!(s.current_position, 500.0);
        assert_eq!(s.previous_position, 0.0);
    }

    #[test]
    fn max_fps_accumulates() {
        let def = definition(Some(30.0));
        let mut s = state(&def, PlaySettings::default());
        s.set_delay(0.0);
        assert!(!s.tick(&def, 10.0));
        assert!(!s.tick(&def, 10.0));
        assert_eq!(s.current_timestamp_delta, 20.0);
        assert!(s.tick(&def, 20.0));
        assert_eq!(s.current_position, 40.0);
        assert_eq!(s.current_timestamp_delta, 0.0);
    }

    #[test]
    fn zero_speed_parks_until_speed_returns() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default());
        s.set_delay(0.0);
        s.tick(&def, 100.0);
        s.set_speed(0.0);
        assert_eq!(s.resume_speed, 1.0);
        // one more frame renders the parked position
        assert!(s.tick(&def, 100.0));
        assert_eq!(s.paused_at, Some(100.0));
        assert!(!s.tick(&def, 100.0));
        assert_eq!(s.current_position, 100.0);

        s.set_speed(s.resume_speed);
        assert!(s.tick(&def, 100.0));
        assert!(!s.is_paused());
        assert_eq!(s.current_position, 200.0);
    }

    #[test]
    fn ebb_then_repeat() {
        let def = definition(None);
        let bag = PropertyBag::new();
        let mut s = state(&def, PlaySettings::default());
        s.force_ebb();
        assert!(s.ebbing);
        assert_eq!(s.current_speed, -1.0);
        assert_eq!(s.resume_speed, -1.0);
        // an ebbing instance does not ebb again
        assert!(!s.ebb(&def, &bag).unwrap());

        let count = s.force_repeat(&def, &bag).unwrap();
        assert_eq!(count, 1);
        assert!(!s.ebbing);
        assert_eq!(s.current_speed, 1.0);
        assert_eq!(s.current_position, 0.0);
        assert_eq!(s.delay_remaining, 10.0);
    }

    #[test]
    fn reverse_repeat_starts_at_the_end() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default().with_speed(-1.0));
        assert_eq!(s.current_position, 1000.0);
        s.current_position = -5.0;
        s.force_repeat(&def, &PropertyBag::new()).unwrap();
        assert_eq!(s.current_position, 1000.0);
    }

    #[test]
    fn repeat_predicate_is_consulted() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default());
        assert!(!s.repeat(&def, &PropertyBag::new()).unwrap());
        assert_eq!(s.repeat_count, 0);
    }

    #[test]
    fn force_tick_ignores_delay() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default());
        assert_eq!(s.force_tick(50.0), 50.0);
        assert_eq!(s.delay_remaining, 100.0);
    }

    #[test]
    fn seek_clamps_and_unparks() {
        let def = definition(None);
        let mut s = state(&def, PlaySettings::default());
        s.paused_at = Some(0.0);
        s.seek(5000.0, def.last_keyframe_position());
        assert_eq!(s.current_position, 1000.0);
        assert_eq!(s.delay_remaining, 0.0);
        assert!(!s.is_paused());
        s.seek(-3.0, def.last_keyframe_position());
        assert_eq!(s.current_position, 0.0);
    }
}
