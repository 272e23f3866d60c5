//! Generic object pool keyed by instance kind.
//!
//! Instances live in a slot arena owned by the pool. Checking one out hands
//! the caller a [`PoolHandle`]; returning it puts the slot at the back of its
//! kind's free list so the oldest returned instance is reused first. An empty
//! free list never blocks: the pool constructs a new instance and grows.

use ahash::AHashMap;
use onslaught_common::{PoolError, PoolHandle};
use std::collections::VecDeque;
use std::fmt;
use std::hash::Hash;
use tracing::debug;

/// An instance that can live in an [`ObjectPool`].
pub trait Poolable {
    /// Kind key selecting the free list.
    type Kind: Copy + Eq + Hash + fmt::Debug;

    /// Returns the kind this instance was constructed for.
    fn kind(&self) -> Self::Kind;

    /// Deactivates the instance as it goes back to the free list.
    fn on_release(&mut self);
}

/// Factory used when a free list runs dry.
type Factory<T> = Box<dyn Fn(<T as Poolable>::Kind) -> T>;

#[derive(Debug)]
struct Slot<T> {
    value: T,
    generation: u32,
    free: bool,
}

/// Reusable-instance cache with one FIFO free list per kind.
pub struct ObjectPool<T: Poolable> {
    /// Human-readable pool name for logs
    label: &'static str,
    /// Every instance ever constructed
    slots: Vec<Slot<T>>,
    /// Free slot indices per kind, oldest first
    free: AHashMap<T::Kind, VecDeque<u32>>,
    /// Number of checked-out instances
    active: usize,
    /// Constructs a fresh inactive instance
    factory: Factory<T>,
}

impl<T: Poolable> fmt::Debug for ObjectPool<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectPool")
            .field("label", &self.label)
            .field("total", &self.slots.len())
            .field("active", &self.active)
            .finish_non_exhaustive()
    }
}

impl<T: Poolable> ObjectPool<T> {
    /// Creates an empty pool that builds instances with `factory`.
    pub fn new<F>(label: &'static str, factory: F) -> Self
    where
        F: Fn(T::Kind) -> T + 'static,
    {
        Self {
            label,
            slots: Vec::new(),
            free: AHashMap::new(),
            active: 0,
            factory: Box::new(factory),
        }
    }

    /// Constructs `count` inactive instances of `kind` up front.
    pub fn prewarm(&mut self, kind: T::Kind, count: usize) {
        for _ in 0..count {
            let mut value = (self.factory)(kind);
            value.on_release();
            let index = self.push_slot(value, true);
            self.free.entry(kind).or_default().push_back(index);
        }
        debug!("{} pool pre-warmed with {count} x {kind:?}", self.label);
    }

    /// Checks out an instance of `kind`, reusing the oldest free one.
    pub fn acquire(&mut self, kind: T::Kind) -> PoolHandle {
        self.active += 1;

        if let Some(index) = self.free.get_mut(&kind).and_then(VecDeque::pop_front) {
            let slot = &mut self.slots[index as usize];
            slot.free = false;
            slot.generation = slot.generation.wrapping_add(1);
            return PoolHandle::new(index, slot.generation);
        }

        let value = (self.factory)(kind);
        let index = self.push_slot(value, false);
        debug!(
            "{} pool grew to {} instances ({kind:?})",
            self.label,
            self.slots.len()
        );
        PoolHandle::new(index, 0)
    }

    /// Returns a checked-out instance to its free list.
    pub fn release(&mut self, handle: PoolHandle) -> Result<(), PoolError> {
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .ok_or(PoolError::UnknownHandle {
                index: handle.index(),
            })?;

        if slot.generation != handle.generation() {
            return Err(PoolError::StaleHandle(handle));
        }
        if slot.free {
            return Err(PoolError::AlreadyFree(handle));
        }

        slot.value.on_release();
        slot.free = true;
        self.active -= 1;
        self.free
            .entry(slot.value.kind())
            .or_default()
            .push_back(handle.index());
        Ok(())
    }

    /// Returns the checked-out instance behind `handle`.
    #[must_use]
    pub fn get(&self, handle: PoolHandle) -> Option<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| !slot.free && slot.generation == handle.generation())
            .map(|slot| &slot.value)
    }

    /// Returns the checked-out instance behind `handle` mutably.
    pub fn get_mut(&mut self, handle: PoolHandle) -> Option<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| !slot.free && slot.generation == handle.generation())
            .map(|slot| &mut slot.value)
    }

    /// Whether the slot named by `handle` is currently in a free list.
    #[must_use]
    pub fn is_free(&self, handle: PoolHandle) -> bool {
        self.slots
            .get(handle.index() as usize)
            .is_some_and(|slot| slot.free)
    }

    /// Number of free instances of `kind`.
    #[must_use]
    pub fn free_count(&self, kind: T::Kind) -> usize {
        self.free.get(&kind).map_or(0, VecDeque::len)
    }

    /// Number of checked-out instances across all kinds.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.active
    }

    /// Number of instances ever constructed.
    #[must_use]
    pub fn total_count(&self) -> usize {
        self.slots.len()
    }

    /// Iterates checked-out instances.
    pub fn iter_active(&self) -> impl Iterator<Item = (PoolHandle, &T)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            (!slot.free).then(|| (PoolHandle::new(index as u32, slot.generation), &slot.value))
        })
    }

    /// Iterates checked-out instances mutably.
    pub fn iter_active_mut(&mut self) -> impl Iterator<Item = (PoolHandle, &mut T)> {
        self.slots
            .iter_mut()
            .enumerate()
            .filter(|(_, slot)| !slot.free)
            .map(|(index, slot)| (PoolHandle::new(index as u32, slot.generation), &mut slot.value))
    }

    /// Returns every checked-out instance to the pool.
    pub fn release_all(&mut self) -> usize {
        let handles: Vec<PoolHandle> = self.iter_active().map(|(handle, _)| handle).collect();
        let count = handles.len();
        for handle in handles {
            // Handles were just read from live slots.
            let _ = self.release(handle);
        }
        count
    }

    fn push_slot(&mut self, value: T, free: bool) -> u32 {
        let index = self.slots.len() as u32;
        self.slots.push(Slot {
            value,
            generation: 0,
            free,
        });
        index
    }
}
