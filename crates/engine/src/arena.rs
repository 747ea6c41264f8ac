//! Generation-checked slots for per-invocation resources.
//!
//! Every release bumps the slot generation, so a handle from before the
//! release can be told apart from a handle to whatever reuses the slot:
//! an older generation means the handle was already released.

use ember_core::{Error, KeyHandle, ReplyHandle, Result};

/// Handle types that address arena slots.
pub(crate) trait SlotHandle: Copy {
    /// Resource kind used in error messages
    const KIND: &'static str;

    fn new(index: u32, generation: u32) -> Self;
    fn index(self) -> u32;
    fn generation(self) -> u32;
}

impl SlotHandle for KeyHandle {
    const KIND: &'static str = "key";

    fn new(index: u32, generation: u32) -> Self {
        KeyHandle { index, generation }
    }

    fn index(self) -> u32 {
        self.index
    }

    fn generation(self) -> u32 {
        self.generation
    }
}

impl SlotHandle for ReplyHandle {
    const KIND: &'static str = "reply";

    fn new(index: u32, generation: u32) -> Self {
        ReplyHandle { index, generation }
    }

    fn index(self) -> u32 {
        self.index
    }

    fn generation(self) -> u32 {
        self.generation
    }
}

#[derive(Debug)]
struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

#[derive(Debug)]
pub(crate) struct Arena<H, T> {
    slots: Vec<Slot<T>>,
    free: Vec<u32>,
    _handle: std::marker::PhantomData<H>,
}

impl<H: SlotHandle, T> Arena<H, T> {
    pub(crate) fn new() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
            _handle: std::marker::PhantomData,
        }
    }

    pub(crate) fn insert(&mut self, value: T) -> H {
        match self.free.pop() {
            Some(index) => {
                let slot = &mut self.slots[index as usize];
                slot.value = Some(value);
                H::new(index, slot.generation)
            }
            None => {
                self.slots.push(Slot {
                    generation: 0,
                    value: Some(value),
                });
                H::new(self.slots.len() as u32 - 1, 0)
            }
        }
    }

    pub(crate) fn get(&self, handle: H) -> Result<&T> {
        self.slots
            .get(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_ref())
            .ok_or(Error::InvalidHandle { kind: H::KIND })
    }

    pub(crate) fn get_mut(&mut self, handle: H) -> Result<&mut T> {
        self.slots
            .get_mut(handle.index() as usize)
            .filter(|slot| slot.generation == handle.generation())
            .and_then(|slot| slot.value.as_mut())
            .ok_or(Error::InvalidHandle { kind: H::KIND })
    }

    /// Release a slot. Releasing a handle twice is `DoubleRelease`.
    pub(crate) fn remove(&mut self, handle: H) -> Result<T> {
        let slot = self
            .slots
            .get_mut(handle.index() as usize)
            .ok_or(Error::InvalidHandle { kind: H::KIND })?;
        if handle.generation() < slot.generation {
            return Err(Error::DoubleRelease { kind: H::KIND });
        }
        if handle.generation() > slot.generation {
            return Err(Error::InvalidHandle { kind: H::KIND });
        }
        let value = slot.value.take().ok_or(Error::InvalidHandle { kind: H::KIND })?;
        slot.generation = slot.generation.wrapping_add(1);
        self.free.push(handle.index());
        Ok(value)
    }

    /// Release every live slot matching `pred`.
    pub(crate) fn remove_where(&mut self, mut pred: impl FnMut(&T) -> bool) -> usize {
        let mut removed = 0;
        for (index, slot) in self.slots.iter_mut().enumerate() {
            if slot.value.as_ref().map_or(false, &mut pred) {
                slot.value = None;
                slot.generation = slot.generation.wrapping_add(1);
                self.free.push(index as u32);
                removed += 1;
            }
        }
        removed
    }

    pub(crate) fn values(&self) -> impl Iterator<Item = &T> + '_ {
        self.slots.iter().filter_map(|slot| slot.value.as_ref())
    }

    pub(crate) fn len(&self) -> usize {
        self.values().count()
    }
}
