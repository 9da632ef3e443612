//! Intrusive reference counting.
//!
//! The count and the value live in one heap node. Every handle points at the
//! node; the handle whose release brings the count to zero frees it.
//!
//! ```text
//!   handle ─┐
//!   handle ─┼──▶ ┌──────────────┐
//!   handle ─┘    │ count: 3     │
//!                │ label/tracer │
//!                │ value: T     │
//!                └──────────────┘
//! ```

use std::cell::Cell;
use std::fmt;
use std::marker::PhantomData;
use std::mem::ManuallyDrop;
use std::ops::Deref;
use std::process;
use std::ptr::NonNull;
use std::sync::atomic::{self, AtomicUsize, Ordering};

use crate::trace::Tracer;

// Past this many owners a count increment aborts instead of wrapping.
const MAX_REFCOUNT: usize = isize::MAX as usize;

/// Storage for the owner count of a [`RefCountedBox`].
///
/// # Safety
///
/// `decrement` must return zero exactly once per node, after every other
/// owner is gone, and must make all prior accesses to the value by other
/// owners visible to the caller that observes zero. `claim_unique` may only
/// return `true` when the caller is the single remaining owner.
pub unsafe trait RefCounter {
    /// A count of one.
    fn one() -> Self;

    fn get(&self) -> usize;

    /// Adds an owner and returns the new count.
    fn increment(&self) -> usize;

    /// Removes an owner and returns the remaining count.
    fn decrement(&self) -> usize;

    /// Drops the count from one to zero if this is the only owner.
    fn claim_unique(&self) -> bool;
}

/// Single-threaded count. Handles using it are neither `Send` nor `Sync`.
#[derive(Debug)]
pub struct LocalCount(Cell<usize>);

unsafe impl RefCounter for LocalCount {
    fn one() -> Self {
        LocalCount(Cell::new(1))
    }

    fn get(&self) -> usize {
        self.0.get()
    }

    fn increment(&self) -> usize {
        let count = self.0.get() + 1;
        if count > MAX_REFCOUNT {
            process::abort();
        }
        self.0.set(count);
        count
    }

    fn decrement(&self) -> usize {
        let count = self.0.get() - 1;
        self.0.set(count);
        count
    }

    fn claim_unique(&self) -> bool {
        if self.0.get() == 1 {
            self.0.set(0);
            true
        } else {
            false
        }
    }
}

/// Thread-safe count, ordered the same way `std::sync::Arc` orders its own.
#[derive(Debug)]
pub struct AtomicCount(AtomicUsize);

unsafe impl RefCounter for AtomicCount {
    fn one() -> Self {
        AtomicCount(AtomicUsize::new(1))
    }

    fn get(&self) -> usize {
        self.0.load(Ordering::Acquire)
    }

    fn increment(&self) -> usize {
        // A new owner can only come from an existing one, so no ordering is needed.
        let old = self.0.fetch_add(1, Ordering::Relaxed);
        if old >= MAX_REFCOUNT {
            process::abort();
        }
        old + 1
    }

    fn decrement(&self) -> usize {
        let old = self.0.fetch_sub(1, Ordering::Release);
        if old == 1 {
            atomic::fence(Ordering::Acquire);
        }
        old - 1
    }

    fn claim_unique(&self) -> bool {
        self.0
            .compare_exchange(1, 0, Ordering::Acquire, Ordering::Relaxed)
            .is_ok()
    }
}

/// Outcome of giving up one handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other handles still own the value.
    Shared { remaining: usize },
    /// This was the last handle; the value has been dropped.
    Freed,
}

impl Release {
    pub fn is_freed(self) -> bool {
        matches!(self, Release::Freed)
    }
}

struct Node<T, C> {
    count: C,
    label: String,
    tracer: Tracer,
    value: T,
}

/// A handle to a reference-counted heap value.
///
/// Cloning a handle adds an owner. Dropping it, or calling
/// [`release`](RefCountedBox::release), removes one. The value is dropped
/// exactly once, by whichever handle goes last. `release` consumes the
/// handle, so a handle cannot be released twice.
pub struct RefCountedBox<T, C: RefCounter = LocalCount> {
    node: NonNull<Node<T, C>>,
    _owns: PhantomData<Node<T, C>>,
}

/// A [`RefCountedBox`] whose count is atomic, shareable across threads.
pub type SyncRefCountedBox<T> = RefCountedBox<T, AtomicCount>;

unsafe impl<T: Send + Sync> Send for RefCountedBox<T, AtomicCount> {}
unsafe impl<T: Send + Sync> Sync for RefCountedBox<T, AtomicCount> {}

impl<T, C: RefCounter> RefCountedBox<T, C> {
    pub fn new(value: T) -> Self {
        Self::traced("", value, &Tracer::silent())
    }

    /// Creates a handle whose lifecycle is reported to `tracer` under `label`.
    pub fn traced(label: impl Into<String>, value: T, tracer: &Tracer) -> Self {
        let node = Box::new(Node {
            count: C::one(),
            label: label.into(),
            tracer: tracer.clone(),
            value,
        });
        let node = NonNull::from(Box::leak(node));
        let this = RefCountedBox {
            node,
            _owns: PhantomData,
        };
        let inner = this.inner();
        inner
            .tracer
            .event(&inner.label, "make_shared", format_args!("count=1"));
        this
    }

    fn inner(&self) -> &Node<T, C> {
        // SAFETY: the node outlives every handle that points at it.
        unsafe { self.node.as_ref() }
    }

    /// Number of live handles to this value.
    pub fn count(&self) -> usize {
        self.inner().count.get()
    }

    pub fn label(&self) -> &str {
        &self.inner().label
    }

    /// True when both handles point at the same value.
    pub fn ptr_eq(this: &Self, other: &Self) -> bool {
        this.node == other.node
    }

    /// Gives up this handle. Returns [`Release::Freed`] when it was the last.
    pub fn release(self) -> Release {
        let this = ManuallyDrop::new(self);
        // SAFETY: `this` is never used or dropped again.
        unsafe { this.drop_ref() }
    }

    /// Returns the value if this is the only handle, otherwise the handle back.
    pub fn try_unwrap(self) -> Result<T, Self> {
        if !self.inner().count.claim_unique() {
            return Err(self);
        }
        let this = ManuallyDrop::new(self);
        // SAFETY: the count is now zero and `this` held the last reference.
        let node = unsafe { Box::from_raw(this.node.as_ptr()) };
        let Node {
            label,
            tracer,
            value,
            ..
        } = *node;
        tracer.event(&label, "unwrap", format_args!("count=0"));
        Ok(value)
    }

    /// Removes one owner; frees the node when none are left.
    ///
    /// # Safety
    ///
    /// Must be called at most once per handle, and the handle must not be
    /// dereferenced afterwards.
    unsafe fn drop_ref(&self) -> Release {
        let inner = self.inner();
        // Once our decrement lands another thread may free the node, so
        // anything needed for tracing is taken beforehand.
        let trace = inner
            .tracer
            .is_enabled()
            .then(|| (inner.tracer.clone(), inner.label.clone()));

        let remaining = inner.count.decrement();
        if remaining > 0 {
            if let Some((tracer, label)) = trace {
                tracer.event(&label, "release", format_args!("count={remaining}"));
            }
            return Release::Shared { remaining };
        }

        inner.tracer.event(&inner.label, "delete", format_args!("count=0"));
        drop(Box::from_raw(self.node.as_ptr()));
        Release::Freed
    }
}

impl<T, C: RefCounter> Clone for RefCountedBox<T, C> {
    fn clone(&self) -> Self {
        let inner = self.inner();
        let count = inner.count.increment();
        inner
            .tracer
            .event(&inner.label, "clone", format_args!("count={count}"));
        RefCountedBox {
            node: self.node,
            _owns: PhantomData,
        }
    }
}

impl<T, C: RefCounter> Drop for RefCountedBox<T, C> {
    fn drop(&mut self) {
        // SAFETY: drop runs once and the handle is gone afterwards.
        unsafe {
            self.drop_ref();
        }
    }
}

impl<T, C: RefCounter> Deref for RefCountedBox<T, C> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.inner().value
    }
}

impl<T: fmt::Debug, C: RefCounter> fmt::Debug for RefCountedBox<T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefCountedBox")
            .field("label", &self.label())
            .field("count", &self.count())
            .field("value", &**self)
            .finish()
    }
}
