//! Named owners of a shared value.
//!
//! `SharedHandle` wraps a [`RefCountedBox`] in a slot that can be empty,
//! live, or released, the way a `shared_ptr` member can be null or reset.
//! Resetting a slot twice is reported as an error rather than ignored.

use std::fmt;
use std::mem;

use crate::error::HandleError;
use crate::refcount::{RefCountedBox, Release};
use crate::trace::Tracer;

enum Slot<T> {
    Empty,
    Live(RefCountedBox<T>),
    Released,
}

pub struct SharedHandle<T> {
    name: String,
    slot: Slot<T>,
    tracer: Tracer,
}

impl<T> SharedHandle<T> {
    /// Allocates `value` with a count of one, owned by a handle called `name`.
    pub fn new(name: impl Into<String>, value: T, tracer: &Tracer) -> Self {
        let name = name.into();
        let inner = RefCountedBox::traced(name.clone(), value, tracer);
        SharedHandle {
            name,
            slot: Slot::Live(inner),
            tracer: tracer.clone(),
        }
    }

    /// A handle that owns nothing yet.
    pub fn empty(name: impl Into<String>, tracer: &Tracer) -> Self {
        let name = name.into();
        tracer.event(&name, "init", format_args!("empty"));
        SharedHandle {
            name,
            slot: Slot::Empty,
            tracer: tracer.clone(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.tracer
            .event(&self.name, "rename", format_args!("-> {name}"));
        self.name = name;
    }

    fn live(&self) -> Result<&RefCountedBox<T>, HandleError> {
        match &self.slot {
            Slot::Live(inner) => Ok(inner),
            Slot::Empty => Err(HandleError::empty(&self.name)),
            Slot::Released => Err(HandleError::already_released(&self.name)),
        }
    }

    /// A second owner of the same value under a new name.
    pub fn share(&self, name: impl Into<String>) -> Result<SharedHandle<T>, HandleError> {
        let inner = self.live()?.clone();
        let name = name.into();
        self.tracer
            .event(&name, "share", format_args!("from {} count={}", self.name, inner.count()));
        Ok(SharedHandle {
            name,
            slot: Slot::Live(inner),
            tracer: self.tracer.clone(),
        })
    }

    /// Points this handle at `other`'s value, giving up whatever it held.
    pub fn assign_from(&mut self, other: &SharedHandle<T>) -> Result<(), HandleError> {
        let inner = other.live()?.clone();
        self.tracer
            .event(&self.name, "assign", format_args!("from {}", other.name));
        let previous = mem::replace(&mut self.slot, Slot::Live(inner));
        drop(previous);
        Ok(())
    }

    pub fn get(&self) -> Option<&T> {
        self.live().ok().map(|inner| &**inner)
    }

    pub fn try_get(&self) -> Result<&T, HandleError> {
        self.live().map(|inner| &**inner)
    }

    /// Owners of the held value; zero when nothing is held.
    pub fn use_count(&self) -> usize {
        self.live().map_or(0, |inner| inner.count())
    }

    pub fn is_live(&self) -> bool {
        matches!(self.slot, Slot::Live(_))
    }

    /// Releases the held value. Fails if the slot is empty or already reset.
    pub fn reset(&mut self) -> Result<Release, HandleError> {
        match mem::replace(&mut self.slot, Slot::Released) {
            Slot::Live(inner) => {
                self.tracer.event(&self.name, "reset", format_args!(""));
                Ok(inner.release())
            }
            Slot::Empty => {
                self.slot = Slot::Empty;
                Err(HandleError::empty(&self.name))
            }
            Slot::Released => Err(HandleError::already_released(&self.name)),
        }
    }
}

impl<T> Drop for SharedHandle<T> {
    fn drop(&mut self) {
        self.tracer
            .event(&self.name, "drop", format_args!("count={}", self.use_count()));
    }
}

impl<T: fmt::Debug> fmt::Debug for SharedHandle<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedHandle")
            .field("name", &self.name)
            .field("use_count", &self.use_count())
            .field("value", &self.get())
            .finish()
    }
}
