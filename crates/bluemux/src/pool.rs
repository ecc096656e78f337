//! Fixed-capacity channel pool
//!
//! This module provides the arena that owns all channel storage. Slots
//! are handed out through generational handles: a handle to a slot that
//! has since been freed (or freed and reused) is detectably stale and
//! rejected with a checked error rather than silently aliasing the new
//! occupant.

use crate::channel::Channel;
use crate::types::{L2capError, L2capResult};

/// Opaque handle to a channel slot in a [`ChannelPool`]
///
/// Cheap to copy; validity is checked on every use against the slot's
/// generation counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChannelHandle {
    index: u32,
    generation: u32,
}

struct Slot<C> {
    generation: u32,
    entry: Option<Channel<C>>,
}

/// Fixed-capacity allocator owning all channel storage
///
/// Backing storage is allocated once at construction; allocation beyond
/// capacity is reported as `None`, never growth.
pub struct ChannelPool<C> {
    slots: Vec<Slot<C>>,
    free: Vec<u32>,
}

impl<C> ChannelPool<C> {
    /// Create a pool with storage for `capacity` channels
    ///
    /// Fails with `InvalidConfig` when `capacity` is zero.
    pub fn new(capacity: usize) -> L2capResult<Self> {
        if capacity == 0 {
            return Err(L2capError::InvalidConfig("channel capacity must be nonzero"));
        }

        let mut slots = Vec::with_capacity(capacity);
        let mut free = Vec::with_capacity(capacity);
        for i in 0..capacity {
            slots.push(Slot {
                generation: 0,
                entry: None,
            });
            free.push(i as u32);
        }

        Ok(Self { slots, free })
    }

    /// Number of live channels
    pub fn len(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    /// Whether no channels are live
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of slots
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Whether every slot is occupied
    pub fn is_full(&self) -> bool {
        self.free.is_empty()
    }

    /// Take the next free slot and initialize a channel in it
    ///
    /// Returns `None` when the pool is at capacity; exhaustion is an
    /// expected condition the caller reports upward, not an error.
    pub fn alloc(&mut self, cid: u16, default_mtu: u16) -> Option<ChannelHandle> {
        let index = self.free.pop()?;
        let slot = &mut self.slots[index as usize];

        debug_assert!(slot.entry.is_none());
        slot.entry = Some(Channel::new(cid, default_mtu));

        Some(ChannelHandle {
            index,
            generation: slot.generation,
        })
    }

    /// Return a slot to the free set
    ///
    /// The channel is handed back to the caller for any final teardown.
    /// A stale, reused, or foreign handle fails with `StaleHandle`; the
    /// pool's bookkeeping is left untouched in that case.
    pub fn free(&mut self, handle: ChannelHandle) -> L2capResult<Channel<C>> {
        let slot = self
            .slots
            .get_mut(handle.index as usize)
            .ok_or(L2capError::StaleHandle)?;

        if slot.generation != handle.generation {
            return Err(L2capError::StaleHandle);
        }

        let chan = slot.entry.take().ok_or(L2capError::StaleHandle)?;

        // Invalidate every outstanding handle to this slot.
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index);

        Ok(chan)
    }

    /// Look up a channel by handle
    pub fn get(&self, handle: ChannelHandle) -> Option<&Channel<C>> {
        let slot = self.slots.get(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_ref()
    }

    /// Look up a channel by handle, mutably
    pub fn get_mut(&mut self, handle: ChannelHandle) -> Option<&mut Channel<C>> {
        let slot = self.slots.get_mut(handle.index as usize)?;
        if slot.generation != handle.generation {
            return None;
        }
        slot.entry.as_mut()
    }

    /// Free every live channel and rebuild the free list
    ///
    /// The backing storage is reused; all outstanding handles become
    /// stale. Safe to call on an already-empty pool.
    pub fn reset(&mut self) {
        self.free.clear();
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.entry.take().is_some() {
                slot.generation = slot.generation.wrapping_add(1);
            }
            self.free.push(i as u32);
        }
    }
}
