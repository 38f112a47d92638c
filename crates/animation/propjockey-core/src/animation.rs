//! Public playback handle.
//!
//! An [`Animation`] wraps a shared definition and addresses its per-object state through the
//! definition's timing pool. Object parameters take `&ObjectRef` or `None`; calls for an object
//! that is not playing this animation are no-ops (setters) or return `None` (getters).

use std::rc::Rc;

use crate::definition::AnimationDefinition;
use crate::error::AnimationError;
use crate::ids::AnimationId;
use crate::instance::{InstanceState, PlaySettings};
use crate::pool::{InstanceCell, InstanceEntry, TimingPool};
use crate::target::ObjectRef;
use crate::Result;

#[derive(Clone, Debug)]
pub struct Animation {
    definition: Rc<AnimationDefinition>,
}

impl Animation {
    pub fn new(definition: AnimationDefinition) -> Self {
        Self {
            definition: Rc::new(definition),
        }
    }

    #[inline]
    pub fn id(&self) -> AnimationId {
        self.definition.id()
    }

    pub fn name(&self) -> &str {
        self.definition.name()
    }

    pub fn definition(&self) -> &AnimationDefinition {
        &self.definition
    }

    pub fn timing_pool(&self) -> &TimingPool {
        self.definition.timing_pool()
    }

    /// Snapshot of this animation's state on `object`.
    pub fn animation_state<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> Option<InstanceState> {
        self.read_state(object.into(), InstanceState::clone)
    }

    /// Start (or continue) playing on `object`.
    ///
    /// `settings` only apply when this creates the instance. A paused instance resumes at its
    /// last non-zero speed.
    pub fn play<'a>(&self, object: impl Into<Option<&'a ObjectRef>>, settings: Option<PlaySettings>) -> Result<&Self> {
        let object = object.into().ok_or(AnimationError::MissingTarget)?;
        let pool = self.timing_pool();

        let cell = match pool.instance(object, self.id()) {
            Some(cell) => cell,
            None => {
                let settings = settings.unwrap_or_default();
                let state = object.with(|target| InstanceState::new(&settings, &self.definition, target))?;
                let cell = Rc::new(InstanceCell::new(state));
                pool.insert_instance(
                    object,
                    self.id(),
                    InstanceEntry {
                        definition: self.definition.clone(),
                        state: cell.clone(),
                    },
                );
                log::debug!("'{}' playing on {object:?}", self.name());
                cell
            }
        };
        // the pool only runs while it holds an instance
        if !pool.is_running() {
            pool.start();
        }

        cell.update(|state| {
            if state.resume_speed != 0.0 && state.current_speed == 0.0 {
                let resume = state.resume_speed;
                state.set_speed(resume);
            }
        });
        Ok(self)
    }

    /// Remove this animation's instance from `object`.
    pub fn stop<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> &Self {
        if let Some(object) = object.into() {
            if self.timing_pool().remove_instance(object, self.id()) {
                log::debug!("'{}' stopped on {object:?}", self.name());
            }
        }
        self
    }

    /// Set speed to 0. The frame after this renders once more, then the instance parks.
    ///
    /// Like every setter here, a call made from a callback while its own instance is mid-frame
    /// takes effect once that instance's frame is done.
    pub fn pause<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> &Self {
        self.set_speed(object, 0.0)
    }

    /// Restore the last non-zero speed (1 if there never was one).
    pub fn resume<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> &Self {
        self.write_state(object.into(), |s| {
            let resume = if s.resume_speed != 0.0 { s.resume_speed } else { 1.0 };
            s.set_speed(resume);
        });
        self
    }

    pub fn speed<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> Option<f64> {
        self.read_state(object.into(), |s| s.current_speed)
    }

    pub fn set_speed<'a>(&self, object: impl Into<Option<&'a ObjectRef>>, scale: f64) -> &Self {
        self.write_state(object.into(), move |s| s.set_speed(scale));
        self
    }

    /// Remaining delay in milliseconds.
    pub fn delay<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> Option<f64> {
        self.read_state(object.into(), |s| s.delay_remaining)
    }

    /// Replace the remaining delay; negative values clamp to 0.
    pub fn set_delay<'a>(&self, object: impl Into<Option<&'a ObjectRef>>, delay: f64) -> &Self {
        self.write_state(object.into(), move |s| s.set_delay(delay));
        self
    }

    /// Current timeline position in milliseconds.
    pub fn position<'a>(&self, object: impl Into<Option<&'a ObjectRef>>) -> Option<f64> {
        self.read_state(object.into(), |s| s.current_position)
    }

    /// Jump to `position`, clamped to `[0, lastKeyframePosition]`. Skips any remaining delay
    /// and renders on the next tick even while paused.
    pub fn seek<'a>(&self, object: impl Into<Option<&'a ObjectRef>>, position: f64) -> &Self {
        let last = self.definition.last_keyframe_position();
        self.write_state(object.into(), move |s| s.seek(position, last));
        self
    }

    fn read_state<R>(&self, object: Option<&ObjectRef>, f: impl FnOnce(&InstanceState) -> R) -> Option<R> {
        let cell = self.timing_pool().instance(object?, self.id())?;
        let result = cell.read(f);
        if result.is_none() {
            log::warn!("'{}' state is busy mid-frame; read skipped", self.name());
        }
        result
    }

    /// Updates requested while a frame holds the state run once that frame's instance is done.
    fn write_state(&self, object: Option<&ObjectRef>, f: impl FnOnce(&mut InstanceState) + 'static) {
        let Some(cell) = object.and_then(|o| self.timing_pool().instance(o, self.id())) else {
            return;
        };
        if !cell.update(f) {
            log::debug!("'{}' state is busy mid-frame; update deferred", self.name());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::Resolvable;
    use crate::definition::{Keyframe, PropertyConfig};
    use crate::error::CallbackError;
    use crate::target::PropertyBag;

    fn animation() -> Animation {
        let def = AnimationDefinition::builder(TimingPool::manual())
            .name("unit")
            .prop(
                "x",
                PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 100.0)]),
            )
            .build()
            .unwrap();
        Animation::new(def)
    }

    #[test]
    fn play_requires_an_object() {
        let anim = animation();
        let err = anim.play(None::<&ObjectRef>, None).unwrap_err();
        assert_eq!(err, AnimationError::MissingTarget);
        assert_eq!(err.category(), "usage");
        assert!(!anim.timing_pool().is_running());
    }

    #[test]
    fn failed_play_leaves_the_pool_stopped() {
        let pool = TimingPool::manual();
        let def = AnimationDefinition::builder(pool.clone())
            .prop(
                "x",
                PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(100.0, 100.0)]),
            )
            .initial_delay(Resolvable::<f64>::computed(|_, _| Err(CallbackError::new("no delay"))))
            .build()
            .unwrap();
        let anim = Animation::new(def);
        let obj = ObjectRef::new(PropertyBag::new());

        let err = anim.play(&obj, None).unwrap_err();
        assert_eq!(err.category(), "callback");
        assert!(!pool.is_running());
        assert_eq!(pool.object_count(), 0);
        assert!(anim.animation_state(&obj).is_none());
    }

    #[test]
    fn getters_are_absent_for_idle_objects() {
        let anim = animation();
        let obj = ObjectRef::new(PropertyBag::new());
        assert!(anim.animation_state(&obj).is_none());
        assert!(anim.animation_state(None::<&ObjectRef>).is_none());
        assert_eq!(anim.speed(&obj), None);
        assert_eq!(anim.delay(&obj), None);
        assert_eq!(anim.position(&obj), None);
        // setters on idle objects are no-ops
        anim.set_speed(&obj, 2.0).seek(&obj, 10.0).set_delay(&obj, 5.0);
        assert!(anim.animation_state(&obj).is_none());
    }

    #[test]
    fn play_is_idempotent_and_settings_apply_once() {
        let anim = animation();
        let obj = ObjectRef::new(PropertyBag::new());
        anim.play(&obj, Some(PlaySettings::default().with_speed(3.0).with_batch("intro", 2)))
            .unwrap();
        anim.play(&obj, Some(PlaySettings::default().with_speed(5.0))).unwrap();
        let state = anim.animation_state(&obj).unwrap();
        assert_eq!(state.current_speed, 3.0);
        assert_eq!(state.batch_name.as_deref(), Some("intro"));
        assert_eq!(state.batch_index, 2);
        assert_eq!(anim.timing_pool().instance_count(&obj), 1);
    }

    #[test]
    fn play_resumes_a_paused_instance() {
        let anim = animation();
        let obj = ObjectRef::new(PropertyBag::new());
        anim.play(&obj, None).unwrap().set_speed(&obj, 2.0).pause(&obj);
        assert_eq!(anim.speed(&obj), Some(0.0));
        anim.play(&obj, None).unwrap();
        assert_eq!(anim.speed(&obj), Some(2.0));
    }

    #[test]
    fn resume_without_object_is_a_noop() {
        let anim = animation();
        let obj = ObjectRef::new(PropertyBag::new());
        anim.play(&obj, None).unwrap().pause(&obj);
        anim.resume(None::<&ObjectRef>);
        assert_eq!(anim.speed(&obj), Some(0.0));
        anim.resume(&obj);
        assert_eq!(anim.speed(&obj), Some(1.0));
    }

    #[test]
    fn delay_and_seek_clamp() {
        let anim = animation();
        let obj = ObjectRef::new(PropertyBag::new());
        anim.play(&obj, None).unwrap();
        anim.set_delay(&obj, -50.0);
        assert_eq!(anim.delay(&obj), Some(0.0));
        anim.set_delay(&obj, 250.0).seek(&obj, 1e6);
        assert_eq!(anim.position(&obj), Some(100.0));
        assert_eq!(anim.delay(&obj), Some(0.0));
    }

    #[test]
    fn stop_removes_and_stops_the_pool() {
        let anim = animation();
        let obj = ObjectRef::new(PropertyBag::new());
        anim.play(&obj, None).unwrap();
        assert!(anim.timing_pool().is_running());
        anim.stop(&obj);
        assert!(anim.animation_state(&obj).is_none());
        assert!(!anim.timing_pool().is_running());
        // stopping again is harmless
        anim.stop(&obj).stop(None::<&ObjectRef>);
    }
}
