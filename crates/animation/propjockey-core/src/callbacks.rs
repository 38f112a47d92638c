//! Resolved callables consumed by the core.
//!
//! Identifier lookup happens before an [`AnimationDefinition`](crate::AnimationDefinition)
//! is built; by the time the core sees a definition every ease, slide, setter and predicate
//! is one of the wrappers below.

use core::fmt;
use std::rc::Rc;

use crate::definition::{AnimationDefinition, PropertyConfig};
use crate::error::CallbackResult;
use crate::instance::InstanceState;
use crate::target::Target;
use crate::value::Value;

/// Normalized progress -> eased amount. Overshooting curves may leave [0, 1].
#[derive(Clone)]
pub struct Ease(Rc<dyn Fn(f64) -> CallbackResult<f64>>);

impl Ease {
    pub fn new(f: impl Fn(f64) -> CallbackResult<f64> + 'static) -> Self {
        Self(Rc::new(f))
    }

    /// Wrap an infallible curve.
    pub fn from_fn(f: impl Fn(f64) -> f64 + 'static) -> Self {
        Self(Rc::new(move |t| Ok(f(t))))
    }

    pub fn linear() -> Self {
        Self::from_fn(|t| t)
    }

    #[inline]
    pub fn call(&self, t: f64) -> CallbackResult<f64> {
        (self.0)(t)
    }

    /// Whether two handles share the same underlying callable.
    pub fn ptr_eq(&self, other: &Ease) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// `(from, to, easedAmount) -> value`
#[derive(Clone)]
pub struct Slide(Rc<dyn Fn(&Value, &Value, f64) -> CallbackResult<Value>>);

impl Slide {
    pub fn new(f: impl Fn(&Value, &Value, f64) -> CallbackResult<Value> + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn call(&self, from: &Value, to: &Value, amount: f64) -> CallbackResult<Value> {
        (self.0)(from, to, amount)
    }
}

/// Writes a computed value into an object.
#[derive(Clone)]
pub struct Setter(Rc<dyn Fn(&mut dyn Target, &str, Value, &PropertyConfig) -> CallbackResult<()>>);

impl Setter {
    pub fn new(
        f: impl Fn(&mut dyn Target, &str, Value, &PropertyConfig) -> CallbackResult<()> + 'static,
    ) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn call(
        &self,
        target: &mut dyn Target,
        name: &str,
        value: Value,
        prop: &PropertyConfig,
    ) -> CallbackResult<()> {
        (self.0)(target, name, value, prop)
    }
}

type ValueSourceFn = dyn Fn(&dyn Target, &str, &AnimationDefinition, f64) -> CallbackResult<Value>;

/// A keyframe's value: fixed, or computed from the object when the keyframe is read.
#[derive(Clone)]
pub enum KeyframeValue {
    Literal(Value),
    Computed(Rc<ValueSourceFn>),
}

impl KeyframeValue {
    pub fn computed(
        f: impl Fn(&dyn Target, &str, &AnimationDefinition, f64) -> CallbackResult<Value> + 'static,
    ) -> Self {
        Self::Computed(Rc::new(f))
    }

    pub fn resolve(
        &self,
        target: &dyn Target,
        name: &str,
        definition: &AnimationDefinition,
        position: f64,
    ) -> CallbackResult<Value> {
        match self {
            KeyframeValue::Literal(v) => Ok(v.clone()),
            KeyframeValue::Computed(f) => f(target, name, definition, position),
        }
    }
}

impl From<Value> for KeyframeValue {
    fn from(v: Value) -> Self {
        KeyframeValue::Literal(v)
    }
}

impl From<f64> for KeyframeValue {
    fn from(n: f64) -> Self {
        KeyframeValue::Literal(Value::Number(n))
    }
}

impl From<&str> for KeyframeValue {
    fn from(s: &str) -> Self {
        KeyframeValue::Literal(Value::from(s))
    }
}

impl fmt::Debug for KeyframeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyframeValue::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            KeyframeValue::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

type ResolveFn<T> = dyn Fn(&InstanceState, &dyn Target) -> CallbackResult<T>;

/// Literal setting or a function of `(instance state, object)`.
///
/// Used for `initialDelay`, `repeatDelay`, `repeat` and `ebb`.
#[derive(Clone)]
pub enum Resolvable<T> {
    Literal(T),
    Computed(Rc<ResolveFn<T>>),
}

impl<T: Clone> Resolvable<T> {
    pub fn computed(f: impl Fn(&InstanceState, &dyn Target) -> CallbackResult<T> + 'static) -> Self {
        Self::Computed(Rc::new(f))
    }

    pub fn resolve(&self, state: &InstanceState, target: &dyn Target) -> CallbackResult<T> {
        match self {
            Resolvable::Literal(v) => Ok(v.clone()),
            Resolvable::Computed(f) => f(state, target),
        }
    }
}

impl<T> From<T> for Resolvable<T> {
    fn from(v: T) -> Self {
        Resolvable::Literal(v)
    }
}

impl<T: Default> Default for Resolvable<T> {
    fn default() -> Self {
        Resolvable::Literal(T::default())
    }
}

impl<T: fmt::Debug> fmt::Debug for Resolvable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolvable::Literal(v) => f.debug_tuple("Literal").field(v).finish(),
            Resolvable::Computed(_) => f.write_str("Computed(..)"),
        }
    }
}

/// `onAfterFrame(definition, object, state)`, run once per advanced frame.
#[derive(Clone)]
pub struct FrameCallback(Rc<dyn Fn(&AnimationDefinition, &dyn Target, &InstanceState) -> CallbackResult<()>>);

impl FrameCallback {
    pub fn new(
        f: impl Fn(&AnimationDefinition, &dyn Target, &InstanceState) -> CallbackResult<()> + 'static,
    ) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn call(
        &self,
        definition: &AnimationDefinition,
        target: &dyn Target,
        state: &InstanceState,
    ) -> CallbackResult<()> {
        (self.0)(definition, target, state)
    }
}

/// Fired with `(object, property, keyframe index)` when playback lands on a keyframe segment.
#[derive(Clone)]
pub struct KeyframeCallback(Rc<dyn Fn(&dyn Target, &str, usize) -> CallbackResult<()>>);

impl KeyframeCallback {
    pub fn new(f: impl Fn(&dyn Target, &str, usize) -> CallbackResult<()> + 'static) -> Self {
        Self(Rc::new(f))
    }

    #[inline]
    pub fn call(&self, target: &dyn Target, name: &str, index: usize) -> CallbackResult<()> {
        (self.0)(target, name, index)
    }
}

macro_rules! opaque_debug {
    ($($ty:ident),*) => {
        $(impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(concat!(stringify!($ty), "(..)"))
            }
        })*
    };
}

opaque_debug!(Ease, Slide, Setter, FrameCallback, KeyframeCallback);
