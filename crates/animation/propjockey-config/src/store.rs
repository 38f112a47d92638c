//! Hydration store: the lookup table from identifiers to callables.
//!
//! Built-in entries cover the CSS keyword eases, the named sine/quadratic/cubic/back/material
//! curves, the bundled slides and setters, and four shared timing pools created on first use.
//! User registrations are checked before built-ins, so a registration can shadow one.

use std::cell::RefCell;

use hashbrown::HashMap;
use propjockey_core::ease::{chain, step_end, step_start, steps};
use propjockey_core::{
    setters, slide, AnimationDefinition, CallbackResult, CurveParams, Ease, EaseCache,
    FrameCallback, InstanceState, IntervalFrames, KeyframeCallback, KeyframeValue, Resolvable,
    Setter, Slide, Target, TimestampFrames, TimingPool, Value,
};

use crate::error::ConfigError;
use crate::kinds::{EaseKind, SetterKind, SlideKind, TimingKind};
use crate::Result;

/// Named bezier curves, all memoized through the store's cache.
const BUILTIN_CURVES: &[(&str, [f64; 4])] = &[
    ("ease.ease", [0.25, 0.1, 0.25, 1.0]),
    ("ease.ease-in", [0.42, 0.0, 1.0, 1.0]),
    ("ease.ease-out", [0.0, 0.0, 0.58, 1.0]),
    ("ease.ease-in-out", [0.42, 0.0, 0.58, 1.0]),
    ("ease.in-sine", [0.47, 0.0, 0.75, 0.72]),
    ("ease.in-quadratic", [0.55, 0.09, 0.68, 0.53]),
    ("ease.in-cubic", [0.55, 0.06, 0.68, 0.19]),
    ("ease.in-back", [0.6, -0.28, 0.74, 0.05]),
    ("ease.fast-out,linear-in", [0.4, 0.0, 1.0, 1.0]),
    ("ease.in-out-sine", [0.45, 0.05, 0.55, 0.95]),
    ("ease.in-out-quadratic", [0.46, 0.03, 0.52, 0.96]),
    ("ease.in-out-cubic", [0.65, 0.05, 0.36, 1.0]),
    ("ease.in-out-back", [0.68, -0.55, 0.27, 1.55]),
    ("ease.fast-out,slow-in", [0.4, 0.0, 0.2, 1.0]),
    ("ease.out-sine", [0.39, 0.58, 0.57, 1.0]),
    ("ease.out-quadratic", [0.25, 0.46, 0.45, 0.94]),
    ("ease.out-cubic", [0.22, 0.61, 0.36, 1.0]),
    ("ease.out-back", [0.18, 0.89, 0.32, 1.28]),
    ("ease.linear-out,slow-in", [0.0, 0.0, 0.2, 1.0]),
];

pub const DEFAULT_TIMING_POOL: &str = "timing.frame-callback";
pub const DEFAULT_EASE: &str = "ease.linear";
pub const DEFAULT_SLIDE: &str = "slide.number";
pub const DEFAULT_SETTER: &str = "setter.object.prop";

pub fn builtin_curve(name: &str) -> Option<CurveParams> {
    BUILTIN_CURVES
        .iter()
        .find(|(key, _)| *key == name)
        .map(|(_, [x1, y1, x2, y2])| CurveParams::cubic(*x1, *y1, *x2, *y2))
}

/// Names of every built-in ease.
pub fn builtin_ease_names() -> impl Iterator<Item = &'static str> {
    ["ease.linear", "ease.step-start", "ease.step-end"]
        .into_iter()
        .chain(BUILTIN_CURVES.iter().map(|(name, _)| *name))
}

#[derive(Default)]
struct Registrations {
    eases: HashMap<String, Ease>,
    slides: HashMap<String, Slide>,
    setters: HashMap<String, Setter>,
    predicates: HashMap<String, Resolvable<bool>>,
    delays: HashMap<String, Resolvable<f64>>,
    value_sources: HashMap<String, KeyframeValue>,
    frame_callbacks: HashMap<String, FrameCallback>,
    keyframe_callbacks: HashMap<String, KeyframeCallback>,
}

pub struct HydrationStore {
    cache: EaseCache,
    registered: Registrations,
    /// Built-in and registered pools, by identifier.
    pools: RefCell<HashMap<String, TimingPool>>,
    frames: TimestampFrames,
    intervals: RefCell<HashMap<String, IntervalFrames>>,
}

impl HydrationStore {
    pub fn new() -> Self {
        Self::with_cache(EaseCache::new())
    }

    pub fn with_cache(cache: EaseCache) -> Self {
        Self {
            cache,
            registered: Registrations::default(),
            pools: RefCell::new(HashMap::new()),
            frames: TimestampFrames::new(),
            intervals: RefCell::new(HashMap::new()),
        }
    }

    pub fn ease_cache(&self) -> &EaseCache {
        &self.cache
    }

    /// Frame source behind `timing.frame-callback`; the host reports frame timestamps here.
    pub fn frame_callback_source(&self) -> TimestampFrames {
        self.frames.clone()
    }

    /// Frame source behind an interval pool, once that pool has been created.
    pub fn interval_source(&self, kind: &TimingKind) -> Option<IntervalFrames> {
        self.intervals.borrow().get(kind.name()).cloned()
    }

    pub fn register_ease(&mut self, name: impl Into<String>, ease: impl Into<Ease>) -> &mut Self {
        self.registered.eases.insert(name.into(), ease.into());
        self
    }

    pub fn register_slide(&mut self, name: impl Into<String>, slide: Slide) -> &mut Self {
        self.registered.slides.insert(name.into(), slide);
        self
    }

    pub fn register_setter(&mut self, name: impl Into<String>, setter: Setter) -> &mut Self {
        self.registered.setters.insert(name.into(), setter);
        self
    }

    /// Predicate for `repeat` / `ebb`.
    pub fn register_predicate(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&InstanceState, &dyn Target) -> CallbackResult<bool> + 'static,
    ) -> &mut Self {
        self.registered
            .predicates
            .insert(name.into(), Resolvable::computed(f));
        self
    }

    /// Delay function for `initialDelay` / `repeatDelay`.
    pub fn register_delay(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&InstanceState, &dyn Target) -> CallbackResult<f64> + 'static,
    ) -> &mut Self {
        self.registered
            .delays
            .insert(name.into(), Resolvable::computed(f));
        self
    }

    /// Value source for `{ "source": name }` keyframe values.
    pub fn register_value_source(
        &mut self,
        name: impl Into<String>,
        f: impl Fn(&dyn Target, &str, &AnimationDefinition, f64) -> CallbackResult<Value> + 'static,
    ) -> &mut Self {
        self.registered
            .value_sources
            .insert(name.into(), KeyframeValue::computed(f));
        self
    }

    pub fn register_frame_callback(
        &mut self,
        name: impl Into<String>,
        callback: FrameCallback,
    ) -> &mut Self {
        self.registered.frame_callbacks.insert(name.into(), callback);
        self
    }

    pub fn register_keyframe_callback(
        &mut self,
        name: impl Into<String>,
        callback: KeyframeCallback,
    ) -> &mut Self {
        self.registered.keyframe_callbacks.insert(name.into(), callback);
        self
    }

    /// Register a host-driven pool, or replace a built-in one before its first use.
    pub fn register_timing_pool(&mut self, name: impl Into<String>, pool: TimingPool) -> &mut Self {
        self.pools.get_mut().insert(name.into(), pool);
        self
    }

    pub fn resolve_ease(&self, kind: &EaseKind) -> Result<Ease> {
        match kind {
            EaseKind::Named(name) => self.named_ease(name),
            EaseKind::Memoize(params) => Ok(self.cache.memoize(*params)?.into()),
            EaseKind::ReuseCache(params) => Ok(self.cache.reuse_cache(*params, None)?.into()),
            EaseKind::Steps { count, jump } => Ok(steps(*count, *jump)?),
            EaseKind::Chain(kinds) => {
                let eases = kinds
                    .iter()
                    .map(|k| self.resolve_ease(k))
                    .collect::<Result<Vec<_>>>()?;
                Ok(chain(eases))
            }
        }
    }

    fn named_ease(&self, name: &str) -> Result<Ease> {
        if let Some(ease) = self.registered.eases.get(name) {
            return Ok(ease.clone());
        }
        match name {
            "ease.linear" => Ok(self.cache.identity().into()),
            "ease.step-start" => Ok(step_start()),
            "ease.step-end" => Ok(step_end()),
            _ => match builtin_curve(name) {
                Some(params) => Ok(self.cache.memoize(params)?.into()),
                None => Err(ConfigError::unknown("ease", name)),
            },
        }
    }

    pub fn resolve_slide(&self, kind: &SlideKind) -> Result<Slide> {
        Ok(match kind {
            SlideKind::Number => slide::number(),
            SlideKind::Byte => slide::byte(),
            SlideKind::ColorHex => slide::color_hex(),
            SlideKind::ColorHexa => slide::color_hexa(),
            SlideKind::Custom(name) => self
                .registered
                .slides
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::unknown("slide", name.as_str()))?,
        })
    }

    pub fn resolve_setter(&self, kind: &SetterKind) -> Result<Setter> {
        Ok(match kind {
            SetterKind::Prop => setters::prop(),
            SetterKind::PropUnit => setters::prop_unit(),
            SetterKind::PropRound => setters::prop_round(),
            SetterKind::Custom(name) => self
                .registered
                .setters
                .get(name)
                .cloned()
                .ok_or_else(|| ConfigError::unknown("setter", name.as_str()))?,
        })
    }

    /// Shared pool for `kind`. Built-in pools are created on first use and reused after.
    pub fn timing_pool(&self, kind: &TimingKind) -> Result<TimingPool> {
        if let Some(pool) = self.pools.borrow().get(kind.name()) {
            return Ok(pool.clone());
        }
        let pool = match kind {
            TimingKind::Manual => TimingPool::manual(),
            TimingKind::FrameCallback => TimingPool::new(self.frames.clone()),
            TimingKind::Interval60 | TimingKind::Interval30 => {
                let fps = if *kind == TimingKind::Interval60 { 60.0 } else { 30.0 };
                let frames = IntervalFrames::fps(fps);
                self.intervals
                    .borrow_mut()
                    .insert(kind.name().to_string(), frames.clone());
                TimingPool::new(frames)
            }
            TimingKind::Custom(name) => {
                return Err(ConfigError::unknown("timing pool", name.as_str()))
            }
        };
        log::debug!("hydration store: created timing pool '{kind}'");
        self.pools
            .borrow_mut()
            .insert(kind.name().to_string(), pool.clone());
        Ok(pool)
    }

    pub fn predicate(&self, name: &str) -> Result<Resolvable<bool>> {
        lookup(&self.registered.predicates, "predicate", name)
    }

    pub fn delay(&self, name: &str) -> Result<Resolvable<f64>> {
        lookup(&self.registered.delays, "delay", name)
    }

    pub fn value_source(&self, name: &str) -> Result<KeyframeValue> {
        lookup(&self.registered.value_sources, "value source", name)
    }

    pub fn frame_callback(&self, name: &str) -> Result<FrameCallback> {
        lookup(&self.registered.frame_callbacks, "frame callback", name)
    }

    pub fn keyframe_callback(&self, name: &str) -> Result<KeyframeCallback> {
        lookup(&self.registered.keyframe_callbacks, "keyframe callback", name)
    }
}

fn lookup<T: Clone>(map: &HashMap<String, T>, kind: &'static str, name: &str) -> Result<T> {
    map.get(name)
        .cloned()
        .ok_or_else(|| ConfigError::unknown(kind, name))
}

impl Default for HydrationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for HydrationStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let pools: Vec<String> = self.pools.borrow().keys().cloned().collect();
        f.debug_struct("HydrationStore")
            .field("cache", &self.cache)
            .field("eases", &self.registered.eases.len())
            .field("slides", &self.registered.slides.len())
            .field("setters", &self.registered.setters.len())
            .field("pools", &pools)
            .finish()
    }
}
