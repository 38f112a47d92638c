//! Shared easing cache: memoized and reusable curves on top of [`EaseArena`].
//!
//! Memoized curves live until [`EaseCache::free_all_memoized_and_reusable`]. Reusable curves
//! are meant for call sites that churn through short-lived curves; each
//! [`EaseCache::reuse_cache`] call releases the previous curve before handing out the next.

use core::fmt;
use std::cell::RefCell;
use std::rc::Rc;

use hashbrown::HashMap;
use instant::Instant;
use serde::Serialize;

use super::arena::{EaseArena, FreeRecord, SlotHandle, Stamp};
use super::curve::{CurveParams, IDENTITY_KEY};
use crate::callbacks::Ease;
use crate::error::{CallbackError, CallbackResult};
use crate::Result;

/// Slots available to a cache created with [`EaseCache::new`].
pub const DEFAULT_CAPACITY: usize = 1024;

pub const FROM_FREE_REUSABLE: &str = "free-reusable-cache";
pub const FROM_REUSE_CACHE: &str = "reuse-cache";
pub const FROM_FREE_ALL_REUSABLE: &str = "free-all-reusable-cache";
pub const FROM_FULL_RESET: &str = "free-all-memoized-and-reusable-cache";

/// How an evaluator was produced.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CacheOrigin {
    Memoize,
    ReuseCache,
    /// The identity curve; never backed by a slot.
    NotCached,
}

/// Diagnostic answer from [`EaseCache::check_status`].
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CacheStatus {
    pub valid: bool,
    pub origin: CacheOrigin,
    pub allocated: Option<Stamp>,
    pub freed: Option<FreeRecord>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    pub capacity: usize,
    pub in_use: usize,
    pub free: usize,
    pub memoized: usize,
    pub reusable: usize,
}

#[derive(Copy, Clone, Debug)]
struct Allocation {
    origin: CacheOrigin,
    at: Stamp,
}

#[derive(Debug)]
struct CacheInner {
    arena: EaseArena,
    /// memo key -> slot; the identity key is never stored.
    memoized: HashMap<String, SlotHandle>,
    /// Live allocations, memoized and reusable alike.
    allocations: HashMap<SlotHandle, Allocation>,
    created: Instant,
    epoch: u64,
}

impl CacheInner {
    fn stamp(&mut self) -> Stamp {
        self.epoch += 1;
        Stamp {
            epoch: self.epoch,
            elapsed: self.created.elapsed(),
        }
    }

    fn record(&mut self, from: &'static str, details: Option<&str>) -> FreeRecord {
        FreeRecord {
            from,
            details: details.map(str::to_string),
            at: self.stamp(),
        }
    }

    fn materialize(&mut self, params: CurveParams, origin: CacheOrigin) -> Result<SlotHandle> {
        let handle = self.arena.allocate()?;
        self.arena.write(handle, params);
        let at = self.stamp();
        self.allocations.insert(handle, Allocation { origin, at });
        Ok(handle)
    }

    fn free_reusable(&mut self, handle: SlotHandle, from: &'static str, details: Option<&str>) -> bool {
        match self.allocations.get(&handle) {
            Some(a) if a.origin == CacheOrigin::ReuseCache => {}
            _ => return false,
        }
        self.allocations.remove(&handle);
        let record = self.record(from, details);
        self.arena.free(handle, record)
    }
}

/// Cloneable handle to one easing cache.
#[derive(Clone)]
pub struct EaseCache {
    inner: Rc<RefCell<CacheInner>>,
}

impl EaseCache {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: Rc::new(RefCell::new(CacheInner {
                arena: EaseArena::with_capacity(capacity),
                memoized: HashMap::new(),
                allocations: HashMap::new(),
                created: Instant::now(),
                epoch: 0,
            })),
        }
    }

    /// The identity curve. Always valid, never slot-backed.
    pub fn identity(&self) -> CachedEase {
        CachedEase {
            cache: self.inner.clone(),
            slot: None,
            origin: CacheOrigin::NotCached,
        }
    }

    /// Return the memoized evaluator for `params`, materializing it on first use.
    pub fn memoize(&self, params: CurveParams) -> Result<CachedEase> {
        let key = params.memo_key();
        if key == IDENTITY_KEY {
            return Ok(self.identity());
        }
        let mut inner = self.inner.borrow_mut();
        let handle = match inner.memoized.get(&key).copied() {
            Some(handle) if inner.arena.is_live(handle) => handle,
            _ => {
                let handle = inner.materialize(params, CacheOrigin::Memoize)?;
                inner.memoized.insert(key, handle);
                handle
            }
        };
        Ok(self.wrap(handle, CacheOrigin::Memoize))
    }

    /// Release `previous` (when it is a reusable curve), then hand out an evaluator for
    /// `params`: the memoized one if it exists, else a fresh reusable slot.
    pub fn reuse_cache(&self, params: CurveParams, previous: Option<&CachedEase>) -> Result<CachedEase> {
        let key = params.memo_key();
        let mut inner = self.inner.borrow_mut();
        if let Some(handle) = previous.and_then(|p| p.slot) {
            let details = format!("{params:?}");
            inner.free_reusable(handle, FROM_REUSE_CACHE, Some(&details));
        }
        if key == IDENTITY_KEY {
            return Ok(self.identity());
        }
        if let Some(handle) = inner.memoized.get(&key).copied() {
            if inner.arena.is_live(handle) {
                return Ok(self.wrap(handle, CacheOrigin::Memoize));
            }
        }
        let handle = inner.materialize(params, CacheOrigin::ReuseCache)?;
        Ok(self.wrap(handle, CacheOrigin::ReuseCache))
    }

    /// Release one reusable evaluator early. Memoized and untracked evaluators are ignored.
    pub fn free_reusable_cache(&self, ease: &CachedEase, details: Option<&str>) -> bool {
        match ease.slot {
            Some(handle) => self
                .inner
                .borrow_mut()
                .free_reusable(handle, FROM_FREE_REUSABLE, details),
            None => false,
        }
    }

    /// Release every live reusable evaluator back to the free list.
    pub fn free_all_reusable_cache(&self, details: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        let reusable: Vec<SlotHandle> = inner
            .allocations
            .iter()
            .filter(|(_, a)| a.origin == CacheOrigin::ReuseCache)
            .map(|(h, _)| *h)
            .collect();
        log::debug!("ease cache: freeing {} reusable curves", reusable.len());
        for handle in reusable {
            inner.free_reusable(handle, FROM_FREE_ALL_REUSABLE, details);
        }
    }

    /// Invalidate every cached evaluator except identity and rewind the arena.
    pub fn free_all_memoized_and_reusable(&self, details: Option<&str>) {
        let mut inner = self.inner.borrow_mut();
        log::debug!(
            "ease cache: full reset ({} memoized, {} allocations)",
            inner.memoized.len(),
            inner.allocations.len()
        );
        let record = inner.record(FROM_FULL_RESET, details);
        inner.arena.reset(record);
        inner.memoized.clear();
        inner.allocations.clear();
    }

    /// Whether `ease` still reads its own curve, and if not, when and why it was freed.
    pub fn check_status(&self, ease: &CachedEase) -> CacheStatus {
        let Some(handle) = ease.slot else {
            return CacheStatus {
                valid: true,
                origin: CacheOrigin::NotCached,
                allocated: None,
                freed: None,
            };
        };
        let inner = self.inner.borrow();
        if inner.arena.is_live(handle) {
            if let Some(a) = inner.allocations.get(&handle) {
                return CacheStatus {
                    valid: true,
                    origin: a.origin,
                    allocated: Some(a.at),
                    freed: None,
                };
            }
        }
        CacheStatus {
            valid: false,
            origin: ease.origin,
            allocated: None,
            freed: inner.arena.freed_record(handle).cloned(),
        }
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.borrow();
        let reusable = inner
            .allocations
            .values()
            .filter(|a| a.origin == CacheOrigin::ReuseCache)
            .count();
        CacheStats {
            capacity: inner.arena.capacity(),
            in_use: inner.arena.in_use(),
            free: inner.arena.free_len(),
            memoized: inner.memoized.len(),
            reusable,
        }
    }

    /// Whether `ease` was handed out by this cache.
    pub fn owns(&self, ease: &CachedEase) -> bool {
        Rc::ptr_eq(&self.inner, &ease.cache)
    }

    fn wrap(&self, handle: SlotHandle, origin: CacheOrigin) -> CachedEase {
        CachedEase {
            cache: self.inner.clone(),
            slot: Some(handle),
            origin,
        }
    }
}

impl Default for EaseCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EaseCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EaseCache").field("stats", &self.stats()).finish()
    }
}

/// `(slot index, generation)` evaluator handed out by an [`EaseCache`].
#[derive(Clone)]
pub struct CachedEase {
    cache: Rc<RefCell<CacheInner>>,
    slot: Option<SlotHandle>,
    origin: CacheOrigin,
}

impl CachedEase {
    pub fn slot(&self) -> Option<SlotHandle> {
        self.slot
    }

    pub fn origin(&self) -> CacheOrigin {
        self.origin
    }

    pub fn is_identity(&self) -> bool {
        self.slot.is_none()
    }

    /// Evaluate, failing with [`CallbackError::StaleEase`] when the slot was freed.
    pub fn try_eval(&self, t: f64) -> CallbackResult<f64> {
        let Some(handle) = self.slot else {
            return Ok(t);
        };
        self.cache
            .borrow()
            .arena
            .read(handle)
            .map(|c| c.ease(t))
            .ok_or(CallbackError::StaleEase {
                index: handle.index,
                generation: handle.generation,
            })
    }

    /// Evaluate, falling back to linear progress (with a warning) when the slot was freed.
    pub fn eval(&self, t: f64) -> f64 {
        match self.try_eval(t) {
            Ok(v) => v,
            Err(err) => {
                log::warn!("{err}; falling back to linear progress");
                t
            }
        }
    }
}

impl PartialEq for CachedEase {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.cache, &other.cache) && self.slot == other.slot
    }
}

impl fmt::Debug for CachedEase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.slot {
            Some(h) => write!(f, "CachedEase({}@{})", h.index, h.generation),
            None => f.write_str("CachedEase(identity)"),
        }
    }
}

impl From<CachedEase> for Ease {
    fn from(cached: CachedEase) -> Self {
        if cached.is_identity() {
            return Ease::linear();
        }
        Ease::from_fn(move |t| cached.eval(t))
    }
}
