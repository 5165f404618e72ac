//! Pool-backed, growable, contiguous component arrays.
//!
//! `ComponentStore<T>` is the building block for the parallel actor
//! arrays. It behaves like a `Vec<T>` with two differences that matter on
//! the simulation hot path:
//!
//! - growth and shrinking rent/return backing buffers through a
//!   [`BufferPool`] instead of reallocating every time, and
//! - [`ComponentStore::compact`] removes every element matching a
//!   predicate while moving whole *survivor blocks* at once, so the number
//!   of copies is the number of contiguous kept runs rather than the number
//!   of kept elements.
//!
//! Slices returned by [`as_slice`](ComponentStore::as_slice) and friends
//! borrow the store, so the borrow checker already forbids holding a view
//! across any structural mutation.

use crate::pool::{BufferPool, RawBuffer};
use std::fmt;
use std::ops::Range;
use std::ptr;
use thiserror::Error;

/// Errors raised by structural store operations. Every check happens
/// before the store is touched, so a failed call leaves it unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("index {index} out of bounds for store of length {len}")]
    IndexOutOfBounds { index: usize, len: usize },

    #[error("range {start}..{end} out of bounds for store of length {len}")]
    RangeOutOfBounds { start: usize, end: usize, len: usize },
}

/// Growable contiguous array backed by pooled buffers.
pub struct ComponentStore<T> {
    buf: RawBuffer<T>,
    len: usize,
    pool: BufferPool<T>,
}

impl<T> ComponentStore<T> {
    /// Shrink only when fewer than 90% of the slots are in use.
    const TRIM_THRESHOLD_PERCENT: usize = 90;

    pub fn new() -> Self {
        Self {
            buf: Vec::new().into_boxed_slice(),
            len: 0,
            pool: BufferPool::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let mut store = Self::new();
        store.ensure_capacity(capacity);
        store
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Buffers parked in this store's pool, ready for the next resize.
    pub fn pooled_buffers(&self) -> usize {
        self.pool.retained()
    }

    #[inline]
    fn base(&self) -> *const T {
        self.buf.as_ptr() as *const T
    }

    #[inline]
    fn base_mut(&mut self) -> *mut T {
        self.buf.as_mut_ptr() as *mut T
    }

    /// Read-only view over the live elements.
    #[inline]
    pub fn as_slice(&self) -> &[T] {
        // SAFETY: slots 0..len are initialised.
        unsafe { std::slice::from_raw_parts(self.base(), self.len) }
    }

    /// Mutable view over the live elements.
    #[inline]
    pub fn as_mut_slice(&mut self) -> &mut [T] {
        let len = self.len;
        // SAFETY: slots 0..len are initialised.
        unsafe { std::slice::from_raw_parts_mut(self.base_mut(), len) }
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.as_mut_slice().iter_mut()
    }

    pub fn get(&self, index: usize) -> Result<&T, StoreError> {
        let len = self.len;
        self.as_slice()
            .get(index)
            .ok_or(StoreError::IndexOutOfBounds { index, len })
    }

    pub fn get_mut(&mut self, index: usize) -> Result<&mut T, StoreError> {
        let len = self.len;
        self.as_mut_slice()
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfBounds { index, len })
    }

    // ------------------------------------------------------------------
    // Capacity management
    // ------------------------------------------------------------------

    /// Make room for at least `min` elements. Capacity doubles (starting
    /// from one); if doubling is not enough the request is raised to `min`.
    /// Either way the buffer comes from the pool's power-of-two size class,
    /// so the resulting capacity is `min` rounded up to a power of two.
    pub fn ensure_capacity(&mut self, min: usize) {
        let cap = self.capacity();
        if min <= cap {
            return;
        }
        let doubled = if cap == 0 { 1 } else { cap.saturating_mul(2) };
        self.reallocate(doubled.max(min));
    }

    /// Shrink the backing buffer when less than 90% of it is in use.
    pub fn trim_excess(&mut self) {
        let cap = self.capacity();
        if self.len * 100 >= cap * Self::TRIM_THRESHOLD_PERCENT {
            return;
        }
        if self.len == 0 {
            let old = std::mem::replace(&mut self.buf, Vec::new().into_boxed_slice());
            self.pool.give_back(old);
            return;
        }
        if BufferPool::<T>::class_len(self.len) < cap {
            self.reallocate(self.len);
        }
    }

    fn reallocate(&mut self, min_len: usize) {
        debug_assert!(min_len >= self.len);
        let mut next = self.pool.rent(min_len);
        // SAFETY: both buffers hold at least `len` slots and do not overlap;
        // ownership of the initialised prefix moves to `next`.
        unsafe {
            ptr::copy_nonoverlapping(self.base(), next.as_mut_ptr() as *mut T, self.len);
        }
        let old = std::mem::replace(&mut self.buf, next);
        self.pool.give_back(old);
    }

    // ------------------------------------------------------------------
    // Single-element operations
    // ------------------------------------------------------------------

    /// Append `value` and return a writable reference to its slot.
    pub fn push(&mut self, value: T) -> &mut T {
        let index = self.len;
        self.ensure_capacity(index + 1);
        // SAFETY: capacity > index; slot `index` is uninitialised.
        unsafe {
            let slot = self.base_mut().add(index);
            ptr::write(slot, value);
            self.len += 1;
            &mut *slot
        }
    }

    /// Insert `value` at `index`, shifting trailing elements right.
    pub fn insert(&mut self, index: usize, value: T) -> Result<&mut T, StoreError> {
        if index > self.len {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        self.ensure_capacity(self.len + 1);
        let tail = self.len - index;
        // SAFETY: capacity >= len + 1, so the shifted tail fits.
        unsafe {
            let slot = self.base_mut().add(index);
            ptr::copy(slot, slot.add(1), tail);
            ptr::write(slot, value);
            self.len += 1;
            Ok(&mut *slot)
        }
    }

    /// Remove and return the element at `index`, shifting the tail left.
    pub fn remove_at(&mut self, index: usize) -> Result<T, StoreError> {
        if index >= self.len {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let tail = self.len - index - 1;
        // SAFETY: `index` is initialised; the value is moved out before the
        // tail is shifted over it.
        unsafe {
            let slot = self.base_mut().add(index);
            let value = ptr::read(slot);
            ptr::copy(slot.add(1), slot, tail);
            self.len -= 1;
            Ok(value)
        }
    }

    // ------------------------------------------------------------------
    // Bulk operations
    // ------------------------------------------------------------------

    /// Insert every item of `values` starting at `index`. Returns the range
    /// the new elements occupy.
    ///
    /// If the iterator reports more items than it yields, the gap is closed
    /// and only the yielded items are kept.
    pub fn insert_range<I>(&mut self, index: usize, values: I) -> Result<Range<usize>, StoreError>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: ExactSizeIterator,
    {
        if index > self.len {
            return Err(StoreError::IndexOutOfBounds {
                index,
                len: self.len,
            });
        }
        let values = values.into_iter();
        let count = values.len();
        if count == 0 {
            return Ok(index..index);
        }

        let old_len = self.len;
        let tail = old_len - index;
        self.ensure_capacity(old_len + count);

        // A panicking iterator leaks the tail instead of double-dropping it.
        self.len = index;
        let base = self.base_mut();
        let mut written = 0;
        // SAFETY: capacity >= old_len + count; the tail is moved clear of the
        // insertion window before any item is written.
        unsafe {
            ptr::copy(base.add(index), base.add(index + count), tail);
            for value in values.take(count) {
                ptr::write(base.add(index + written), value);
                written += 1;
            }
            if written < count {
                ptr::copy(base.add(index + count), base.add(index + written), tail);
            }
        }
        self.len = old_len + written;
        Ok(index..index + written)
    }

    /// Append clones of `values`.
    pub fn extend_from_slice(&mut self, values: &[T]) -> Range<usize>
    where
        T: Clone,
    {
        let len = self.len;
        match self.insert_range(len, values.iter().cloned()) {
            Ok(range) => range,
            Err(_) => unreachable!("insertion at len is always in bounds"),
        }
    }

    /// Drop `count` elements starting at `index` and shift the tail left.
    pub fn remove_range(&mut self, index: usize, count: usize) -> Result<(), StoreError> {
        let end = index
            .checked_add(count)
            .filter(|&end| end <= self.len)
            .ok_or(StoreError::RangeOutOfBounds {
                start: index,
                end: index.saturating_add(count),
                len: self.len,
            })?;
        if count == 0 {
            return Ok(());
        }

        let old_len = self.len;
        self.len = index;
        let base = self.base_mut();
        // SAFETY: index..end is initialised and in bounds; after the drop
        // the tail is moved down over the vacated slots.
        unsafe {
            ptr::drop_in_place(std::slice::from_raw_parts_mut(base.add(index), count));
            ptr::copy(base.add(end), base.add(index), old_len - end);
        }
        self.len = old_len - count;
        Ok(())
    }

    /// Drop every element, keeping the backing buffer.
    pub fn clear(&mut self) {
        let len = self.len;
        self.len = 0;
        // SAFETY: 0..len was initialised and is no longer reachable.
        unsafe {
            ptr::drop_in_place(std::slice::from_raw_parts_mut(self.base_mut(), len));
        }
    }

    /// Remove every element in `range` for which `should_remove` returns
    /// true, preserving the order of the survivors. Returns the number of
    /// removed elements.
    ///
    /// The scan walks `range` once. Each maximal run of survivors is moved
    /// down to the write cursor with a single block copy; runs that already
    /// sit at the write cursor are not copied at all. Elements after
    /// `range` are shifted down with one final copy.
    pub fn compact<F>(&mut self, range: Range<usize>, mut should_remove: F) -> Result<usize, StoreError>
    where
        F: FnMut(&T) -> bool,
    {
        if range.start > range.end || range.end > self.len {
            return Err(StoreError::RangeOutOfBounds {
                start: range.start,
                end: range.end,
                len: self.len,
            });
        }
        if range.is_empty() {
            return Ok(0);
        }

        let old_len = self.len;
        let Range { start, end } = range;
        // A panicking predicate leaks instead of double-dropping.
        self.len = start;
        let base = self.base_mut();

        let mut read = start;
        let mut write = start;
        // SAFETY: every slot in start..old_len is initialised on entry. Each
        // element is either dropped exactly once (predicate true) or moved
        // exactly once into write..; `write <= read` always holds, so block
        // copies never clobber unread elements.
        unsafe {
            while read < end {
                let block_start = read;
                let mut hit = false;
                while read < end {
                    if should_remove(&*base.add(read)) {
                        hit = true;
                        break;
                    }
                    read += 1;
                }

                let kept = read - block_start;
                if kept > 0 {
                    if write != block_start {
                        ptr::copy(base.add(block_start), base.add(write), kept);
                    }
                    write += kept;
                }

                if hit {
                    ptr::drop_in_place(base.add(read));
                    read += 1;
                }
            }

            let tail = old_len - end;
            if tail > 0 && write != end {
                ptr::copy(base.add(end), base.add(write), tail);
            }
            self.len = write + tail;
        }

        Ok(end - write)
    }

    /// [`compact`](Self::compact) over the whole store.
    pub fn compact_all<F>(&mut self, should_remove: F) -> usize
    where
        F: FnMut(&T) -> bool,
    {
        let len = self.len;
        match self.compact(0..len, should_remove) {
            Ok(removed) => removed,
            Err(_) => unreachable!("full range is always in bounds"),
        }
    }
}

impl<T> Default for ComponentStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ComponentStore<T> {
    fn drop(&mut self) {
        self.clear();
    }
}

impl<T: fmt::Debug> fmt::Debug for ComponentStore<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.as_slice()).finish()
    }
}

impl<'a, T> IntoIterator for &'a ComponentStore<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> FromIterator<T> for ComponentStore<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut store = Self::new();
        for value in iter {
            store.push(value);
        }
        store
    }
}
