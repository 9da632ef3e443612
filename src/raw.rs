// Raw storage behind GrowableBuffer.
use std::alloc::{self, Layout};
use std::marker::PhantomData;
use std::mem;
use std::ptr::NonNull;

use crate::error::BufferError;

/// Manages an allocation of `cap` slots for `T`.
/// Does NOT track which slots are initialized; that is the owner's job.
pub(crate) struct RawBlock<T> {
    ptr: NonNull<T>,
    cap: usize,
    _marker: PhantomData<T>,
}

// Safety: RawBlock uniquely owns its allocation.
unsafe impl<T: Send> Send for RawBlock<T> {}
unsafe impl<T: Sync> Sync for RawBlock<T> {}

impl<T> RawBlock<T> {
    /// No allocation; the pointer is dangling and must not be read.
    pub fn new() -> Self {
        RawBlock {
            ptr: NonNull::dangling(),
            cap: 0,
            _marker: PhantomData,
        }
    }

    pub fn with_capacity(cap: usize) -> Result<Self, BufferError> {
        let layout = Self::layout(cap)?;
        Ok(RawBlock {
            ptr: Self::allocate(layout),
            cap,
            _marker: PhantomData,
        })
    }

    fn layout(cap: usize) -> Result<Layout, BufferError> {
        Layout::array::<T>(cap).map_err(|_| BufferError::CapacityOverflow { requested: cap })
    }

    // Zero-sized layouts get a dangling pointer instead of an allocation.
    fn allocate(layout: Layout) -> NonNull<T> {
        if layout.size() == 0 {
            return NonNull::dangling();
        }
        let ptr = unsafe { alloc::alloc(layout) } as *mut T;
        NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(layout))
    }

    /// Doubles capacity, or sets it to 1 if currently zero.
    /// Existing slot contents are carried over. Returns the new capacity.
    pub fn grow(&mut self) -> Result<usize, BufferError> {
        let new_cap = if self.cap == 0 {
            1
        } else {
            self.cap
                .checked_mul(2)
                .ok_or(BufferError::CapacityOverflow { requested: usize::MAX })?
        };
        let old_layout = Self::layout(self.cap)?;
        let new_layout = Self::layout(new_cap)?;

        let new_ptr = if old_layout.size() == 0 {
            Self::allocate(new_layout)
        } else {
            let ptr = unsafe {
                alloc::realloc(self.ptr.as_ptr() as *mut u8, old_layout, new_layout.size())
            } as *mut T;
            NonNull::new(ptr).unwrap_or_else(|| alloc::handle_alloc_error(new_layout))
        };

        self.ptr = new_ptr;
        self.cap = new_cap;
        Ok(new_cap)
    }

    /// Hands the allocation to the caller and leaves `self` unallocated.
    pub fn take(&mut self) -> Self {
        mem::replace(self, RawBlock::new())
    }

    pub fn ptr(&self) -> *mut T {
        self.ptr.as_ptr()
    }

    pub fn cap(&self) -> usize {
        self.cap
    }
}

impl<T> Drop for RawBlock<T> {
    fn drop(&mut self) {
        if let Ok(layout) = Self::layout(self.cap) {
            if layout.size() != 0 {
                unsafe {
                    alloc::dealloc(self.ptr.as_ptr() as *mut u8, layout);
                }
            }
        }
    }
}
