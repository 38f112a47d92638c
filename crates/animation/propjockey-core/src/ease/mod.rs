//! Easing curves: the cached bezier arena plus the small set of curves that need no cache.

pub mod arena;
pub mod cache;
pub mod curve;

use core::str::FromStr;

use crate::callbacks::Ease;
use crate::error::AnimationError;
use crate::Result;

pub use arena::{EaseArena, FreeRecord, SlotHandle, Stamp};
pub use cache::{CacheOrigin, CacheStats, CacheStatus, CachedEase, EaseCache};
pub use curve::{CurveParams, IDENTITY_KEY};

/// CSS `steps()` jump term.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum StepJump {
    Start,
    #[default]
    End,
    None,
    Both,
}

impl FromStr for StepJump {
    type Err = AnimationError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "jump-start" | "start" => Ok(StepJump::Start),
            "jump-end" | "end" => Ok(StepJump::End),
            "jump-none" => Ok(StepJump::None),
            "jump-both" => Ok(StepJump::Both),
            other => Err(AnimationError::InvalidDefinition {
                reason: format!("unknown steps jump term '{other}'"),
            }),
        }
    }
}

/// Stepped progress: `count` intervals, held flat in between.
pub fn steps(count: u32, jump: StepJump) -> Result<Ease> {
    let min = if jump == StepJump::None { 2 } else { 1 };
    if count < min {
        return Err(AnimationError::InvalidDefinition {
            reason: format!("steps({count}, {jump:?}) needs at least {min} steps"),
        });
    }
    let count = f64::from(count);
    let (divisions, jump_start) = match jump {
        StepJump::Start => (count, 1.0),
        StepJump::End => (count, 0.0),
        StepJump::None => (count - 1.0, 0.0),
        StepJump::Both => (count + 1.0, 1.0),
    };
    let step = 1.0 / divisions;
    Ok(Ease::from_fn(move |t| {
        if t <= 0.0 {
            0.0
        } else if t >= 1.0 {
            1.0
        } else {
            (jump_start + (t * count).floor()) * step
        }
    }))
}

pub fn step_start() -> Ease {
    Ease::from_fn(|t| if t <= 0.0 { 0.0 } else { 1.0 })
}

pub fn step_end() -> Ease {
    Ease::from_fn(|t| if t >= 1.0 { 1.0 } else { 0.0 })
}

/// Feed each ease's output into the next.
pub fn chain(eases: Vec<Ease>) -> Ease {
    if eases.is_empty() {
        return Ease::linear();
    }
    Ease::new(move |t| eases.iter().try_fold(t, |acc, ease| ease.call(acc)))
}
