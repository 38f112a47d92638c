//! Timing pool: one shared delta per frame, pumped into every active instance.
//!
//! The pool owns `object -> animation -> state` in insertion order, and starts or stops its
//! [`FrameSource`] only on the empty/non-empty edge.

use core::fmt;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use indexmap::IndexMap;

use crate::definition::AnimationDefinition;
use crate::frames::{FrameSource, ManualFrames};
use crate::ids::{AnimationId, IdAllocator};
use crate::instance::InstanceState;
use crate::target::ObjectRef;
use crate::tick::{tick_instance, TickOutcome};
use crate::Result;

type Deferred = Box<dyn FnOnce(&mut InstanceState)>;

/// An instance's state plus the updates requested while a frame had it borrowed.
pub(crate) struct InstanceCell {
    state: RefCell<InstanceState>,
    deferred: RefCell<Vec<Deferred>>,
}

impl InstanceCell {
    pub fn new(state: InstanceState) -> Self {
        Self {
            state: RefCell::new(state),
            deferred: RefCell::new(Vec::new()),
        }
    }

    /// Read the state; `None` while a frame holds it mutably.
    pub fn read<R>(&self, f: impl FnOnce(&InstanceState) -> R) -> Option<R> {
        let state = self.state.try_borrow().ok()?;
        Some(f(&state))
    }

    /// Apply `f` now, or queue it until the frame holding the state lets go.
    /// Returns false when the update was queued.
    pub fn update(&self, f: impl FnOnce(&mut InstanceState) + 'static) -> bool {
        match self.state.try_borrow_mut() {
            Ok(mut state) => {
                f(&mut state);
                true
            }
            Err(_) => {
                self.deferred.borrow_mut().push(Box::new(f));
                false
            }
        }
    }

    /// Run queued updates in the order they were requested.
    pub fn apply_deferred(&self) {
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        let queued = std::mem::take(&mut *self.deferred.borrow_mut());
        for f in queued {
            f(&mut state);
        }
    }

    fn state_mut(&self) -> std::cell::RefMut<'_, InstanceState> {
        self.state.borrow_mut()
    }
}

/// One active (object, animation) pair.
#[derive(Clone)]
pub(crate) struct InstanceEntry {
    pub definition: Rc<AnimationDefinition>,
    pub state: Rc<InstanceCell>,
}

type FrameEntry = (ObjectRef, AnimationId, InstanceEntry);

type InstanceMap = IndexMap<AnimationId, InstanceEntry>;

struct PoolState {
    running: bool,
    delta_time: f64,
    objects: IndexMap<ObjectRef, InstanceMap>,
    ids: IdAllocator,
}

pub(crate) struct PoolShared {
    state: RefCell<PoolState>,
    source: RefCell<Box<dyn FrameSource>>,
    /// Per-tick snapshot buffer, kept between frames.
    scratch: RefCell<Vec<FrameEntry>>,
}

/// Cloneable handle to a timing pool. Clones share the same pool.
#[derive(Clone)]
pub struct TimingPool {
    shared: Rc<PoolShared>,
}

impl TimingPool {
    pub fn new(source: impl FrameSource + 'static) -> Self {
        Self {
            shared: Rc::new(PoolShared {
                state: RefCell::new(PoolState {
                    running: false,
                    delta_time: 0.0,
                    objects: IndexMap::new(),
                    ids: IdAllocator::new(),
                }),
                source: RefCell::new(Box::new(source)),
                scratch: RefCell::new(Vec::new()),
            }),
        }
    }

    /// Pool driven by explicit [`TimingPool::tick`] calls.
    pub fn manual() -> Self {
        Self::new(ManualFrames)
    }

    pub fn is_running(&self) -> bool {
        self.shared.state.borrow().running
    }

    /// Delta of the most recent tick.
    pub fn delta_time(&self) -> f64 {
        self.shared.state.borrow().delta_time
    }

    pub fn object_count(&self) -> usize {
        self.shared.state.borrow().objects.len()
    }

    pub fn contains(&self, object: &ObjectRef) -> bool {
        self.shared.state.borrow().objects.contains_key(object)
    }

    /// Active animations on `object`.
    pub fn instance_count(&self, object: &ObjectRef) -> usize {
        self.shared
            .state
            .borrow()
            .objects
            .get(object)
            .map_or(0, IndexMap::len)
    }

    /// Mark the pool running and hand the frame source a ticker. No-op when already running.
    pub fn start(&self) -> &Self {
        {
            let mut state = self.shared.state.borrow_mut();
            if state.running {
                return self;
            }
            state.running = true;
        }
        log::debug!("timing pool started");
        self.shared.source.borrow_mut().start_loop(self.ticker());
        self
    }

    /// Mark the pool stopped and tell the frame source. No-op when not running.
    pub fn stop(&self) -> &Self {
        {
            let mut state = self.shared.state.borrow_mut();
            if !state.running {
                return self;
            }
            state.running = false;
        }
        log::debug!("timing pool stopped");
        self.shared.source.borrow_mut().stop_loop();
        self
    }

    /// Advance every active instance by `delta` milliseconds.
    ///
    /// Objects and their animations are visited in insertion order. Instances removed during
    /// the frame are skipped; instances added during the frame wait for the next one. A
    /// callback error aborts the rest of the frame.
    pub fn tick(&self, delta: f64) -> Result<()> {
        // a nested tick from a callback finds the buffer taken and fills a fresh one
        let mut frame = self.shared.scratch.take();
        {
            let mut state = self.shared.state.borrow_mut();
            state.delta_time = delta;
            for (object, instances) in &state.objects {
                for (id, entry) in instances {
                    frame.push((object.clone(), *id, entry.clone()));
                }
            }
        }

        let result = self.tick_entries(&frame, delta);
        frame.clear();
        *self.shared.scratch.borrow_mut() = frame;
        result
    }

    fn tick_entries(&self, frame: &[FrameEntry], delta: f64) -> Result<()> {
        for (object, id, entry) in frame {
            if !self.is_current(object, *id, entry) {
                continue;
            }
            let outcome = {
                let mut state = entry.state.state_mut();
                tick_instance(&entry.definition, object, &mut state, delta)
            };
            entry.state.apply_deferred();
            if outcome? == TickOutcome::Finished {
                log::debug!("'{}' finished on {object:?}", entry.definition.name());
                self.remove_instance(object, *id);
            }
        }
        Ok(())
    }

    /// A weak ticking handle for frame sources.
    pub fn ticker(&self) -> PoolTicker {
        PoolTicker {
            shared: Rc::downgrade(&self.shared),
        }
    }

    pub fn ptr_eq(&self, other: &TimingPool) -> bool {
        Rc::ptr_eq(&self.shared, &other.shared)
    }

    pub(crate) fn alloc_animation_id(&self) -> AnimationId {
        self.shared.state.borrow_mut().ids.alloc_animation()
    }

    pub(crate) fn instance(&self, object: &ObjectRef, id: AnimationId) -> Option<Rc<InstanceCell>> {
        self.shared
            .state
            .borrow()
            .objects
            .get(object)
            .and_then(|instances| instances.get(&id))
            .map(|entry| entry.state.clone())
    }

    pub(crate) fn insert_instance(&self, object: &ObjectRef, id: AnimationId, entry: InstanceEntry) {
        self.shared
            .state
            .borrow_mut()
            .objects
            .entry(object.clone())
            .or_default()
            .insert(id, entry);
    }

    /// Drop one instance; the object leaves with its last instance, and the pool stops with
    /// its last object. Returns whether an instance was removed.
    pub(crate) fn remove_instance(&self, object: &ObjectRef, id: AnimationId) -> bool {
        let now_empty = {
            let mut state = self.shared.state.borrow_mut();
            let Some(instances) = state.objects.get_mut(object) else {
                return false;
            };
            if instances.shift_remove(&id).is_none() {
                return false;
            }
            if instances.is_empty() {
                state.objects.shift_remove(object);
            }
            state.objects.is_empty()
        };
        if now_empty {
            self.stop();
        }
        true
    }

    fn is_current(&self, object: &ObjectRef, id: AnimationId, entry: &InstanceEntry) -> bool {
        self.shared
            .state
            .borrow()
            .objects
            .get(object)
            .and_then(|instances| instances.get(&id))
            .is_some_and(|current| Rc::ptr_eq(&current.state, &entry.state))
    }
}

impl fmt::Debug for TimingPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.state.borrow();
        f.debug_struct("TimingPool")
            .field("running", &state.running)
            .field("delta_time", &state.delta_time)
            .field("objects", &state.objects.len())
            .finish()
    }
}

/// Weak handle a [`FrameSource`] uses to drive its pool.
#[derive(Clone)]
pub struct PoolTicker {
    shared: Weak<PoolShared>,
}

impl PoolTicker {
    /// Tick the pool if it still exists. Returns whether it is (still) running afterwards.
    pub fn tick(&self, delta: f64) -> Result<bool> {
        let Some(shared) = self.shared.upgrade() else {
            return Ok(false);
        };
        let pool = TimingPool { shared };
        pool.tick(delta)?;
        Ok(pool.is_running())
    }

    pub fn is_running(&self) -> bool {
        self.shared
            .upgrade()
            .is_some_and(|shared| shared.state.borrow().running)
    }
}

impl fmt::Debug for PoolTicker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PoolTicker")
            .field("alive", &(self.shared.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definition::{Keyframe, PropertyConfig};
    use crate::instance::PlaySettings;
    use crate::target::PropertyBag;

    fn entry(pool: &TimingPool, object: &ObjectRef) -> (AnimationId, InstanceEntry) {
        let def = AnimationDefinition::builder(pool.clone())
            .prop(
                "x",
                PropertyConfig::new(vec![Keyframe::new(0.0, 0.0), Keyframe::new(10.0, 1.0)]),
            )
            .build()
            .unwrap();
        let state = object
            .with(|t| InstanceState::new(&PlaySettings::default(), &def, t))
            .unwrap();
        (
            def.id(),
            InstanceEntry {
                definition: Rc::new(def),
                state: Rc::new(InstanceCell::new(state)),
            },
        )
    }

    #[test]
    fn start_stop_are_idempotent() {
        let pool = TimingPool::manual();
        assert!(!pool.is_running());
        pool.start().start();
        assert!(pool.is_running());
        pool.stop().stop();
        assert!(!pool.is_running());
    }

    #[test]
    fn finished_instances_leave_the_pool() {
        let pool = TimingPool::manual();
        let a = ObjectRef::new(PropertyBag::new());
        let b = ObjectRef::new(PropertyBag::new());
        let (id_a, entry_a) = entry(&pool, &a);
        let (id_b, entry_b) = entry(&pool, &b);
        pool.insert_instance(&a, id_a, entry_a);
        pool.insert_instance(&b, id_b, entry_b);
        pool.start();

        pool.tick(5.0).unwrap();
        assert_eq!(pool.delta_time(), 5.0);
        assert_eq!(pool.object_count(), 2);
        assert_eq!(a.number("x"), Some(0.5));

        pool.tick(5.0).unwrap();
        assert_eq!(pool.object_count(), 0);
        assert!(!pool.is_running());
        assert_eq!(b.number("x"), Some(1.0));
    }

    #[test]
    fn removal_keeps_the_pool_running_while_others_remain() {
        let pool = TimingPool::manual();
        let a = ObjectRef::new(PropertyBag::new());
        let (id1, e1) = entry(&pool, &a);
        let (id2, e2) = entry(&pool, &a);
        pool.insert_instance(&a, id1, e1);
        pool.insert_instance(&a, id2, e2);
        pool.start();
        assert!(pool.remove_instance(&a, id1));
        assert!(!pool.remove_instance(&a, id1));
        assert_eq!(pool.instance_count(&a), 1);
        assert!(pool.is_running());
        assert!(pool.remove_instance(&a, id2));
        assert!(!pool.contains(&a));
        assert!(!pool.is_running());
    }

    #[test]
    fn updates_on_a_busy_instance_wait_for_the_frame() {
        let pool = TimingPool::manual();
        let a = ObjectRef::new(PropertyBag::new());
        let (_, entry) = entry(&pool, &a);
        let cell = entry.state.clone();
        {
            let _frame = cell.state_mut();
            assert!(!cell.update(|s| s.set_speed(0.0)));
            assert!(!cell.update(|s| s.set_delay(25.0)));
            assert_eq!(cell.read(|s| s.current_speed), None);
        }
        assert_eq!(cell.read(|s| s.current_speed), Some(1.0));
        cell.apply_deferred();
        assert_eq!(cell.read(|s| (s.current_speed, s.delay_remaining)), Some((0.0, 25.0)));
        assert!(cell.update(|s| s.set_speed(2.0)));
        assert_eq!(cell.read(|s| s.current_speed), Some(2.0));
    }

    #[test]
    fn tick_reuses_its_snapshot_buffer() {
        let pool = TimingPool::manual();
        let a = ObjectRef::new(PropertyBag::new());
        let (id1, e1) = entry(&pool, &a);
        let (id2, e2) = entry(&pool, &a);
        pool.insert_instance(&a, id1, e1);
        pool.insert_instance(&a, id2, e2);
        pool.start();

        pool.tick(1.0).unwrap();
        let capacity = pool.shared.scratch.borrow().capacity();
        assert!(capacity >= 2);
        assert!(pool.shared.scratch.borrow().is_empty());
        pool.tick(1.0).unwrap();
        assert_eq!(pool.shared.scratch.borrow().capacity(), capacity);
        assert_eq!(a.number("x"), Some(0.2));
    }

    #[test]
    fn ticker_is_weak() {
        let pool = TimingPool::manual();
        let ticker = pool.ticker();
        pool.start();
        assert!(ticker.is_running());
        drop(pool);
        assert!(!ticker.is_running());
        assert_eq!(ticker.tick(16.0), Ok(false));
    }
}
