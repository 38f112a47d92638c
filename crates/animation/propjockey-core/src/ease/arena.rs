//! Fixed-capacity slot arena backing cached easing curves.
//!
//! Every slot carries a generation. A [`SlotHandle`] is only live while its generation
//! matches the slot's; freeing or resetting bumps the generation so old handles read as
//! stale instead of silently evaluating whatever curve was written next.

use std::time::Duration;

use serde::Serialize;

use super::curve::{CurveCoefficients, CurveParams};
use crate::error::AnimationError;

/// Index + generation pair identifying one allocation of one slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct SlotHandle {
    pub index: usize,
    pub generation: u32,
}

/// Logical and wall-clock time of a cache event.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Stamp {
    /// Monotonic counter bumped by every cache mutation.
    pub epoch: u64,
    /// Time since the owning cache was created.
    pub elapsed: Duration,
}

/// Why and when a slot allocation was invalidated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FreeRecord {
    pub from: &'static str,
    pub details: Option<String>,
    pub at: Stamp,
}

#[derive(Debug, Default)]
struct Slot {
    generation: u32,
    curve: Option<(CurveParams, CurveCoefficients)>,
    last_freed: Option<(u32, FreeRecord)>,
}

#[derive(Debug)]
pub struct EaseArena {
    slots: Vec<Slot>,
    capacity: usize,
    /// Slots below this index have been handed out since the last reset.
    next: usize,
    free: Vec<usize>,
}

impl EaseArena {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
            next: 0,
            free: Vec::new(),
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Slots currently handed out (allocated and not on the free list).
    #[inline]
    pub fn in_use(&self) -> usize {
        self.next - self.free.len()
    }

    #[inline]
    pub fn free_len(&self) -> usize {
        self.free.len()
    }

    /// Hand out a slot, preferring the most recently freed index.
    pub fn allocate(&mut self) -> Result<SlotHandle, AnimationError> {
        let index = match self.free.pop() {
            Some(index) => index,
            None => {
                if self.next >= self.capacity {
                    return Err(AnimationError::ArenaExhausted {
                        capacity: self.capacity,
                    });
                }
                let index = self.next;
                self.next += 1;
                if index == self.slots.len() {
                    self.slots.push(Slot::default());
                }
                index
            }
        };
        let generation = self.slots[index].generation;
        log::trace!("ease arena: allocated slot {index} gen {generation}");
        Ok(SlotHandle { index, generation })
    }

    /// Write curve parameters into a live slot. Returns false for stale handles.
    pub fn write(&mut self, handle: SlotHandle, params: CurveParams) -> bool {
        match self.live_slot_mut(handle) {
            Some(slot) => {
                slot.curve = Some((params, params.coefficients()));
                true
            }
            None => false,
        }
    }

    /// Coefficients for a live handle.
    pub fn read(&self, handle: SlotHandle) -> Option<&CurveCoefficients> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.curve.as_ref())
            .map(|(_, coefficients)| coefficients)
    }

    pub fn params(&self, handle: SlotHandle) -> Option<CurveParams> {
        self.slots
            .get(handle.index)
            .filter(|slot| slot.generation == handle.generation)
            .and_then(|slot| slot.curve.as_ref())
            .map(|(params, _)| *params)
    }

    #[inline]
    pub fn is_live(&self, handle: SlotHandle) -> bool {
        self.read(handle).is_some()
    }

    /// Invalidate one allocation and return its index to the free list.
    pub fn free(&mut self, handle: SlotHandle, record: FreeRecord) -> bool {
        let Some(slot) = self.live_slot_mut(handle) else {
            return false;
        };
        Self::invalidate(slot, record);
        if !self.free.contains(&handle.index) {
            self.free.push(handle.index);
        }
        log::trace!("ease arena: freed slot {}", handle.index);
        true
    }

    /// Invalidate everything handed out and rewind the allocation counter.
    pub fn reset(&mut self, record: FreeRecord) {
        for (index, slot) in self.slots.iter_mut().enumerate().take(self.next) {
            // Free-listed slots were already invalidated when they were freed.
            if !self.free.contains(&index) {
                Self::invalidate(slot, record.clone());
            }
        }
        self.free.clear();
        self.next = 0;
        log::trace!("ease arena: reset");
    }

    /// The record left behind when `handle`'s allocation was invalidated, if it is the
    /// most recent one for that slot.
    pub fn freed_record(&self, handle: SlotHandle) -> Option<&FreeRecord> {
        self.slots
            .get(handle.index)
            .and_then(|slot| slot.last_freed.as_ref())
            .filter(|(generation, _)| *generation == handle.generation)
            .map(|(_, record)| record)
    }

    fn live_slot_mut(&mut self, handle: SlotHandle) -> Option<&mut Slot> {
        self.slots
            .get_mut(handle.index)
            .filter(|slot| slot.generation == handle.generation)
    }

    fn invalidate(slot: &mut Slot, record: FreeRecord) {
        slot.last_freed = Some((slot.generation, record));
        slot.curve = None;
        slot.generation = slot.generation.wrapping_add(1);
    }
}
