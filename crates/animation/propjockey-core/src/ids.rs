//! Identifiers and simple allocators for core entities.

use serde::{Deserialize, Serialize};

/// Identity of an [`AnimationDefinition`](crate::AnimationDefinition) within its timing pool.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct AnimationId(pub u32);

/// Monotonic allocator for AnimationId.
/// IDs are opaque externally; they only key a pool's per-object instance maps.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_animation: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_animation(&mut self) -> AnimationId {
        let id = AnimationId(self.next_animation);
        self.next_animation = self.next_animation.wrapping_add(1);
        id
    }
}
