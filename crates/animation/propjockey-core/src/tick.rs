//! Per-instance frame orchestration: advance, evaluate, write, then handle the timeline end.

use crate::definition::AnimationDefinition;
use crate::error::CallbackResult;
use crate::evaluate::evaluate_property;
use crate::instance::{Cursor, InstanceState};
use crate::target::ObjectRef;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// Paused, delaying or throttled; nothing was written.
    Idle,
    /// Values were written and the instance keeps playing.
    Advanced,
    /// The timeline ended with no ebb or repeat; the instance should be removed.
    Finished,
}

/// Run one frame of `state` against `object`.
///
/// Properties are written in definition order, each through its own setter or the default.
/// Any callback failure aborts the frame and is returned as is.
pub fn tick_instance(
    definition: &AnimationDefinition,
    object: &ObjectRef,
    state: &mut InstanceState,
    delta: f64,
) -> CallbackResult<TickOutcome> {
    if !state.tick(definition, delta) {
        return Ok(TickOutcome::Idle);
    }

    let speed = state.current_speed;
    let position = state.current_position;

    for (name, prop) in definition.props() {
        let cursor = state.cursor(name).unwrap_or(Cursor::BeforeStart);
        let frame = object.with(|target| {
            evaluate_property(definition, name, prop, target, position, speed, cursor)
        })?;

        if let Some(value) = frame.value {
            let setter = prop.setter.as_ref().unwrap_or(definition.default_setter());
            object.with_mut(|target| setter.call(target, name, value, prop))?;
        }
        if let Some(slot) = state.props.get_mut(name) {
            *slot = frame.cursor;
        }
        if let Some(index) = frame.entered {
            if let Some(callback) = &prop.keyframes[index].callback {
                object.with(|target| callback.call(target, name, index))?;
            }
        }
    }

    if let Some(callback) = definition.on_after_frame() {
        object.with(|target| callback.call(definition, target, &*state))?;
    }

    let after_end = speed > 0.0 && position >= definition.last_keyframe_position();
    let after_reverse = speed < 0.0 && position < 0.0;
    if !(after_end || after_reverse) {
        return Ok(TickOutcome::Advanced);
    }

    if object.with(|target| state.ebb(definition, target))? {
        log::debug!("'{}' ebbing on {object:?}", definition.name());
        return Ok(TickOutcome::Advanced);
    }
    if object.with(|target| state.repeat(definition, target))? {
        log::debug!(
            "'{}' repeating on {object:?} (repeat {})",
            definition.name(),
            state.repeat_count
        );
        return Ok(TickOutcome::Advanced);
    }
    Ok(TickOutcome::Finished)
}
