//! A growable, contiguous buffer built directly on `std::alloc`.
//!
//! Appending to a full buffer doubles its capacity (starting from 1).
//! Cloning makes a deep copy into a block of the same capacity. [`take`]
//! moves the block out and leaves the source empty but usable.
//!
//! ```text
//!   with_capacity(1)   push(10)   push(11)      push(12)
//!   cap 1  [ ]         [10]       [10|11]       [10|11|12| ]
//!                                 grow 1 -> 2   grow 2 -> 4
//! ```
//!
//! [`take`]: GrowableBuffer::take

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::mem;
use std::ops::{Index, IndexMut};
use std::ptr;
use std::slice;

use crate::error::BufferError;
use crate::raw::RawBlock;
use crate::trace::Tracer;

pub struct GrowableBuffer<T> {
    raw: RawBlock<T>,
    len: usize,
    label: String,
    tracer: Tracer,
}

impl<T> GrowableBuffer<T> {
    /// An empty buffer with no allocation.
    pub fn new() -> Self {
        GrowableBuffer {
            raw: RawBlock::new(),
            len: 0,
            label: String::new(),
            tracer: Tracer::silent(),
        }
    }

    /// Panics if `capacity` elements cannot be laid out in memory.
    pub fn with_capacity(capacity: usize) -> Self {
        match Self::try_with_capacity(capacity) {
            Ok(buffer) => buffer,
            Err(err) => panic!("{err}"),
        }
    }

    pub fn try_with_capacity(capacity: usize) -> Result<Self, BufferError> {
        Ok(GrowableBuffer {
            raw: RawBlock::with_capacity(capacity)?,
            len: 0,
            label: String::new(),
            tracer: Tracer::silent(),
        })
    }

    /// Reports this buffer's lifecycle to `tracer` under `label`.
    pub fn traced(mut self, label: impl Into<String>, tracer: &Tracer) -> Self {
        self.label = label.into();
        self.tracer = tracer.clone();
        self.tracer
            .event(&self.label, "new", format_args!("{}", self.describe()));
        self
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn capacity(&self) -> usize {
        self.raw.cap()
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Appends `value`, growing the block first when it is full.
    pub fn push(&mut self, value: T) {
        if self.len == self.raw.cap() {
            self.grow();
        }

        unsafe {
            ptr::write(self.raw.ptr().add(self.len), value);
        }
        self.len += 1;

        self.tracer
            .event(&self.label, "push", format_args!("{}", self.describe()));
    }

    fn grow(&mut self) {
        let old = self.raw.cap();
        match self.raw.grow() {
            Ok(new) => self
                .tracer
                .event(&self.label, "grow", format_args!("{old} -> {new}")),
            Err(err) => panic!("{err}"),
        }
    }

    /// Removes and returns the last element, or None if empty.
    pub fn pop(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        self.len -= 1;
        unsafe { Some(ptr::read(self.raw.ptr().add(self.len))) }
    }

    /// Drops every element; capacity is kept.
    pub fn clear(&mut self) {
        let len = self.len;
        // Zeroed first: a panicking element drop leaks the rest.
        self.len = 0;
        unsafe {
            ptr::drop_in_place(ptr::slice_from_raw_parts_mut(self.raw.ptr(), len));
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.as_mut_slice().get_mut(index)
    }

    /// Bounds-checked access that reports the failing index.
    pub fn at(&self, index: usize) -> Result<&T, BufferError> {
        self.get(index).ok_or(BufferError::IndexOutOfBounds {
            index,
            len: self.len,
        })
    }

    pub fn as_slice(&self) -> &[T] {
        // The pointer is dangling but aligned when nothing is allocated, which is fine for len 0.
        unsafe { slice::from_raw_parts(self.raw.ptr(), self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [T] {
        unsafe { slice::from_raw_parts_mut(self.raw.ptr(), self.len) }
    }

    /// Walks the current elements once, in insertion order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            ptr: self.raw.ptr(),
            remaining: self.len,
            _marker: PhantomData,
        }
    }

    /// Moves the whole block into a new buffer and leaves this one empty
    /// (capacity 0, length 0) and ready for more pushes.
    pub fn take(&mut self) -> Self {
        let moved = GrowableBuffer {
            raw: self.raw.take(),
            len: mem::replace(&mut self.len, 0),
            label: self.label.clone(),
            tracer: self.tracer.clone(),
        };
        self.tracer.event(
            &self.label,
            "move",
            format_args!("{} -> {}", moved.describe(), self.describe()),
        );
        moved
    }

    /// Length and capacity, for trace lines.
    pub fn describe(&self) -> String {
        format!("len={} cap={}", self.len, self.raw.cap())
    }
}

impl<T> Drop for GrowableBuffer<T> {
    fn drop(&mut self) {
        self.tracer
            .event(&self.label, "delete", format_args!("{}", self.describe()));
        self.clear();
    }
}

impl<T: Clone> Clone for GrowableBuffer<T> {
    /// Deep copy into a fresh block with the source's capacity.
    fn clone(&self) -> Self {
        let mut copy = GrowableBuffer::with_capacity(self.capacity());
        for item in self.iter() {
            copy.push(item.clone());
        }
        copy.label = self.label.clone();
        copy.tracer = self.tracer.clone();
        copy.tracer
            .event(&copy.label, "copy", format_args!("{}", copy.describe()));
        copy
    }
}

impl<T> Default for GrowableBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Index<usize> for GrowableBuffer<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.at(index) {
            Ok(item) => item,
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T> IndexMut<usize> for GrowableBuffer<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len;
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("{}", BufferError::IndexOutOfBounds { index, len }),
        }
    }
}

impl<T> FromIterator<T> for GrowableBuffer<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut buffer = GrowableBuffer::new();
        buffer.extend(iter);
        buffer
    }
}

impl<T> Extend<T> for GrowableBuffer<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for item in iter {
            self.push(item);
        }
    }
}

impl<'a, T> IntoIterator for &'a GrowableBuffer<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Iter<'a, T> {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for GrowableBuffer<T> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl<T: Eq> Eq for GrowableBuffer<T> {}

impl<T: fmt::Debug> fmt::Debug for GrowableBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

/// Prints each element in brackets: `[10][11][12]`.
impl<T: fmt::Display> fmt::Display for GrowableBuffer<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for item in self.iter() {
            write!(f, "[{item}]")?;
        }
        Ok(())
    }
}

/// Forward iterator over a [`GrowableBuffer`]. Holding one borrows the
/// buffer, so it cannot outlive a reallocation.
pub struct Iter<'a, T> {
    ptr: *const T,
    remaining: usize,
    _marker: PhantomData<&'a T>,
}

unsafe impl<T: Sync> Send for Iter<'_, T> {}
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<&'a T> {
        if self.remaining == 0 {
            return None;
        }
        let item = unsafe { &*self.ptr };
        self.ptr = unsafe { self.ptr.add(1) };
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::cell::Cell;
    use std::rc::Rc;

    struct DropCounter(Rc<Cell<usize>>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    fn collect<T: Clone>(buffer: &GrowableBuffer<T>) -> Vec<T> {
        buffer.iter().cloned().collect()
    }

    // ============================================================================
    // Construction and growth
    // ============================================================================

    #[test]
    fn new_buffer_is_empty() {
        let buffer: GrowableBuffer<i32> = GrowableBuffer::new();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 0);
        assert!(buffer.is_empty());
        assert_eq!(buffer.iter().next(), None);
    }

    #[test]
    fn with_capacity_preallocates() {
        let buffer: GrowableBuffer<u8> = GrowableBuffer::with_capacity(16);
        assert_eq!(buffer.capacity(), 16);
        assert_eq!(buffer.len(), 0);
    }

    #[test]
    fn push_from_capacity_one_grows_twice() {
        let tracer = Tracer::capture();
        let mut vec1 = GrowableBuffer::with_capacity(1).traced("vec1", &tracer);
        let mut caps = Vec::new();
        for value in [10, 11, 12] {
            vec1.push(value);
            caps.push(vec1.capacity());
        }

        assert_eq!(caps, vec![1, 2, 4]);
        assert_eq!(collect(&vec1), vec![10, 11, 12]);

        let grows: Vec<String> = tracer
            .lines()
            .into_iter()
            .filter(|line| line.starts_with("vec1: grow"))
            .collect();
        assert_eq!(grows, vec!["vec1: grow 1 -> 2", "vec1: grow 2 -> 4"]);
    }

    #[test]
    fn push_into_unallocated_starts_at_one() {
        let mut buffer = GrowableBuffer::new();
        let mut caps = Vec::new();
        for i in 0..5 {
            buffer.push(i);
            caps.push(buffer.capacity());
        }
        assert_eq!(caps, vec![1, 2, 4, 4, 8]);
    }

    #[test]
    fn try_with_capacity_reports_overflow() {
        let result = GrowableBuffer::<u64>::try_with_capacity(usize::MAX);
        assert_eq!(
            result.err(),
            Some(BufferError::CapacityOverflow { requested: usize::MAX })
        );
    }

    #[test]
    #[should_panic(expected = "capacity overflow")]
    fn with_capacity_panics_on_overflow() {
        let _ = GrowableBuffer::<u64>::with_capacity(usize::MAX);
    }

    #[test]
    fn zero_sized_elements() {
        let mut buffer = GrowableBuffer::new();
        for _ in 0..1000 {
            buffer.push(());
        }
        assert_eq!(buffer.len(), 1000);
        assert_eq!(buffer.iter().count(), 1000);
        assert_eq!(buffer.pop(), Some(()));
    }

    // ============================================================================
    // Access
    // ============================================================================

    #[test]
    fn at_and_get_check_bounds() {
        let buffer: GrowableBuffer<i32> = [1, 2, 3].into_iter().collect();
        assert_eq!(buffer.get(2), Some(&3));
        assert_eq!(buffer.get(3), None);
        assert_eq!(buffer.at(0), Ok(&1));
        assert_eq!(
            buffer.at(5),
            Err(BufferError::IndexOutOfBounds { index: 5, len: 3 })
        );
    }

    #[test]
    #[should_panic(expected = "index 3 is out of bounds for length 3")]
    fn index_past_len_panics() {
        let buffer: GrowableBuffer<i32> = [1, 2, 3].into_iter().collect();
        let _item = &buffer[3];
    }

    #[test]
    fn index_mut_writes_in_place() {
        let mut buffer: GrowableBuffer<i32> = [1, 2, 3].into_iter().collect();
        buffer[1] = 20;
        *buffer.get_mut(2).unwrap() += 10;
        assert_eq!(buffer.as_slice(), &[1, 20, 13]);
    }

    #[test]
    fn pop_returns_in_reverse() {
        let mut buffer: GrowableBuffer<i32> = (1..=3).collect();
        assert_eq!(buffer.pop(), Some(3));
        assert_eq!(buffer.pop(), Some(2));
        assert_eq!(buffer.pop(), Some(1));
        assert_eq!(buffer.pop(), None);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn iterator_is_exact_size() {
        let buffer: GrowableBuffer<i32> = (0..7).collect();
        let mut iter = buffer.iter();
        assert_eq!(iter.len(), 7);
        iter.next();
        assert_eq!(iter.size_hint(), (6, Some(6)));
        assert_eq!(iter.last(), Some(&6));
    }

    #[test]
    fn for_loop_over_reference() {
        let buffer: GrowableBuffer<String> = ["elem1", "elem2"].iter().map(|s| s.to_string()).collect();
        let mut seen = Vec::new();
        for item in &buffer {
            seen.push(item.as_str());
        }
        assert_eq!(seen, vec!["elem1", "elem2"]);
    }

    // ============================================================================
    // Copy and move
    // ============================================================================

    #[test]
    fn clone_is_deep_and_independent() {
        let mut vec1 = GrowableBuffer::with_capacity(1);
        vec1.push(10);
        vec1.push(11);

        let mut vec2 = vec1.clone();
        assert_eq!(vec2, vec1);
        assert_eq!(vec2.capacity(), vec1.capacity());

        vec2.push(12);
        vec2.push(13);
        assert_eq!(collect(&vec2), vec![10, 11, 12, 13]);
        assert_eq!(collect(&vec1), vec![10, 11]);
    }

    #[test]
    fn take_leaves_source_empty_and_usable() {
        let mut vec1: GrowableBuffer<i32> = [10, 11].into_iter().collect();
        let cap = vec1.capacity();

        let mut vec3 = vec1.take();
        assert_eq!(collect(&vec3), vec![10, 11]);
        assert_eq!(vec3.capacity(), cap);
        assert_eq!(vec1.len(), 0);
        assert_eq!(vec1.capacity(), 0);

        vec3.push(14);
        vec3.push(15);
        assert_eq!(collect(&vec3), vec![10, 11, 14, 15]);

        vec1.push(99);
        assert_eq!(vec1.at(0), Ok(&99));
        assert_eq!(vec1.capacity(), 1);
    }

    #[test]
    fn copy_and_move_are_traced() {
        let tracer = Tracer::capture();
        let mut vec1 = GrowableBuffer::with_capacity(2).traced("vec1", &tracer);
        vec1.push(1);
        let vec2 = vec1.clone();
        let vec3 = vec1.take();
        drop(vec2);
        drop(vec3);

        assert_eq!(
            tracer.lines(),
            vec![
                "vec1: new len=0 cap=2",
                "vec1: push len=1 cap=2",
                "vec1: copy len=1 cap=2",
                "vec1: move len=1 cap=2 -> len=0 cap=0",
                "vec1: delete len=1 cap=2",
                "vec1: delete len=1 cap=2",
            ]
        );
    }

    // ============================================================================
    // Element drops
    // ============================================================================

    #[test]
    fn elements_dropped_exactly_once() {
        let drops = Rc::new(Cell::new(0));
        {
            let mut buffer = GrowableBuffer::new();
            for _ in 0..5 {
                buffer.push(DropCounter(Rc::clone(&drops)));
            }
            let popped = buffer.pop();
            assert_eq!(drops.get(), 0);
            drop(popped);
            assert_eq!(drops.get(), 1);
        }
        assert_eq!(drops.get(), 5);
    }

    #[test]
    fn clear_keeps_capacity() {
        let drops = Rc::new(Cell::new(0));
        let mut buffer = GrowableBuffer::with_capacity(4);
        for _ in 0..3 {
            buffer.push(DropCounter(Rc::clone(&drops)));
        }
        buffer.clear();
        assert_eq!(drops.get(), 3);
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.capacity(), 4);
    }

    #[test]
    fn moved_elements_are_not_dropped_twice() {
        let drops = Rc::new(Cell::new(0));
        let mut source = GrowableBuffer::new();
        source.push(DropCounter(Rc::clone(&drops)));
        let moved = source.take();
        drop(source);
        assert_eq!(drops.get(), 0);
        drop(moved);
        assert_eq!(drops.get(), 1);
    }

    // ============================================================================
    // Formatting
    // ============================================================================

    #[test]
    fn display_brackets_each_element() {
        let buffer: GrowableBuffer<i32> = [10, 11].into_iter().collect();
        assert_eq!(buffer.to_string(), "[10][11]");
        assert_eq!(format!("{:?}", buffer), "[10, 11]");
        assert_eq!(GrowableBuffer::<i32>::new().to_string(), "");
    }

    // ============================================================================
    // Properties
    // ============================================================================

    proptest! {
        #[test]
        fn iteration_matches_pushes(values in prop::collection::vec(any::<i64>(), 0..200)) {
            let mut buffer = GrowableBuffer::new();
            for v in &values {
                buffer.push(*v);
            }
            prop_assert_eq!(buffer.len(), values.len());
            prop_assert!(buffer.len() <= buffer.capacity());
            prop_assert_eq!(collect(&buffer), values);
        }

        #[test]
        fn clone_then_push_leaves_source(
            values in prop::collection::vec(".*", 0..50),
            extra in ".*",
        ) {
            let source: GrowableBuffer<String> = values.iter().cloned().collect();
            let mut copy = source.clone();
            prop_assert_eq!(&copy, &source);

            copy.push(extra.clone());
            prop_assert_eq!(collect(&source), values.clone());
            prop_assert_eq!(copy.len(), values.len() + 1);
            prop_assert_eq!(copy.get(values.len()), Some(&extra));
        }

        #[test]
        fn take_transfers_everything(
            values in prop::collection::vec(any::<u32>(), 0..100),
            after in any::<u32>(),
        ) {
            let mut source: GrowableBuffer<u32> = values.iter().copied().collect();
            let moved = source.take();
            prop_assert_eq!(collect(&moved), values);
            prop_assert_eq!(source.len(), 0);
            prop_assert_eq!(source.capacity(), 0);

            source.push(after);
            prop_assert_eq!(source.as_slice(), &[after][..]);
        }
    }
}
