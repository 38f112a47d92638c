//! Keyframe evaluation for one property at one timeline position.
//!
//! Pure with respect to the instance: the caller owns writing the value through a setter and
//! storing the returned cursor.

use crate::callbacks::Ease;
use crate::definition::{AnimationDefinition, PropertyConfig};
use crate::error::CallbackResult;
use crate::instance::Cursor;
use crate::target::Target;
use crate::value::Value;

/// Outcome of evaluating one property for one frame.
#[derive(Clone, Debug, PartialEq)]
pub struct PropertyFrame {
    /// Value to hand to the setter, if this frame writes one.
    pub value: Option<Value>,
    pub cursor: Cursor,
    /// Keyframe index whose segment playback just entered.
    pub entered: Option<usize>,
}

/// Indices of the last keyframe at or before `position` and the first one after it.
pub fn bracket(prop: &PropertyConfig, position: f64) -> (Option<usize>, Option<usize>) {
    let mut from = None;
    for (k, kf) in prop.keyframes.iter().enumerate() {
        if kf.position <= position {
            from = Some(k);
        } else {
            return (from, Some(k));
        }
    }
    (from, None)
}

/// Resolve `name`'s value at `position`.
///
/// Inside the keyframe range the value is eased and slid between the bracketing pair. Outside
/// it, the nearest boundary value is written once when playback leaves the range in its
/// direction of travel (before the start moving backward, after the end moving forward), and
/// nothing is written while parked there.
pub fn evaluate_property(
    definition: &AnimationDefinition,
    name: &str,
    prop: &PropertyConfig,
    target: &dyn Target,
    position: f64,
    speed: f64,
    cursor: Cursor,
) -> CallbackResult<PropertyFrame> {
    let (from, to) = bracket(prop, position);
    let mut frame = PropertyFrame {
        value: None,
        cursor,
        entered: None,
    };
    if let (Some(f), Some(_)) = (from, to) {
        frame.cursor = Cursor::At(f);
        if cursor != Cursor::At(f) {
            frame.entered = Some(f);
        }
    }

    let resolve = |index: usize| {
        let kf = &prop.keyframes[index];
        kf.value.resolve(target, name, definition, kf.position)
    };
    let from_value = from.map(resolve).transpose()?;
    let to_value = to.map(resolve).transpose()?;

    match (from, from_value, to, to_value) {
        (Some(f), Some(a), Some(t), Some(b)) => {
            let start = &prop.keyframes[f];
            let end = &prop.keyframes[t];
            let progress = (position - start.position) / (end.position - start.position);
            let ease: &Ease = start.ease.as_ref().unwrap_or(definition.default_ease());
            let amount = ease.call(progress)?;
            let slide = prop.slide.as_ref().unwrap_or(definition.default_slide());
            frame.value = Some(slide.call(&a, &b, amount)?);
        }
        (None, _, Some(_), Some(b)) if speed < 0.0 && cursor != Cursor::BeforeStart => {
            frame.value = Some(b);
            frame.cursor = Cursor::BeforeStart;
        }
        (Some(_), Some(a), None, _) if speed > 0.0 && cursor != Cursor::AfterEnd => {
            frame.value = Some(a);
            frame.cursor = Cursor::AfterEnd;
        }
        _ => {}
    }
    Ok(frame)
}
