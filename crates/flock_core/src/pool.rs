//! Reusable backing buffers for component stores.
//!
//! Stores grow by doubling and shrink on `trim_excess`; in a spawn-heavy
//! simulation that produces a steady churn of same-sized allocations.
//! `BufferPool` keeps retired buffers in power-of-two size classes and
//! hands them back out on the next grow/shrink instead of going through
//! the allocator again.

use std::mem::MaybeUninit;

/// Uninitialised backing storage handed out by a [`BufferPool`].
pub type RawBuffer<T> = Box<[MaybeUninit<T>]>;

/// Size-classed pool of uninitialised buffers.
///
/// Buffers are bucketed by `capacity.trailing_zeros()`; every rented buffer
/// has a power-of-two length so a returned buffer always lands back in the
/// bucket it was rented from.
pub struct BufferPool<T> {
    buckets: Vec<Vec<RawBuffer<T>>>,
    max_per_bucket: usize,
}

impl<T> BufferPool<T> {
    /// Number of buffers kept per size class before extras are freed.
    pub const DEFAULT_MAX_PER_BUCKET: usize = 4;

    pub fn new() -> Self {
        Self::with_max_per_bucket(Self::DEFAULT_MAX_PER_BUCKET)
    }

    pub fn with_max_per_bucket(max_per_bucket: usize) -> Self {
        Self {
            buckets: Vec::new(),
            max_per_bucket,
        }
    }

    /// Size class a request for `min_len` elements is served from.
    #[inline]
    pub fn class_len(min_len: usize) -> usize {
        min_len.max(1).next_power_of_two()
    }

    #[inline]
    fn bucket_of(len: usize) -> usize {
        len.trailing_zeros() as usize
    }

    /// Rent a buffer holding at least `min_len` elements.
    pub fn rent(&mut self, min_len: usize) -> RawBuffer<T> {
        let len = Self::class_len(min_len);
        let bucket = Self::bucket_of(len);
        if let Some(buf) = self.buckets.get_mut(bucket).and_then(Vec::pop) {
            debug_assert_eq!(buf.len(), len);
            return buf;
        }
        let mut vec: Vec<MaybeUninit<T>> = Vec::with_capacity(len);
        // SAFETY: MaybeUninit<T> needs no initialisation.
        unsafe {
            vec.set_len(len);
        }
        vec.into_boxed_slice()
    }

    /// Return a buffer to the pool. The caller must already have dropped or
    /// moved out every initialised element it held.
    pub fn give_back(&mut self, buf: RawBuffer<T>) {
        let len = buf.len();
        if len == 0 || !len.is_power_of_two() {
            return;
        }
        let bucket = Self::bucket_of(len);
        if self.buckets.len() <= bucket {
            self.buckets.resize_with(bucket + 1, Vec::new);
        }
        let slot = &mut self.buckets[bucket];
        if slot.len() < self.max_per_bucket {
            slot.push(buf);
        }
    }

    /// Number of buffers currently parked in the pool.
    pub fn retained(&self) -> usize {
        self.buckets.iter().map(Vec::len).sum()
    }

    /// Release every parked buffer back to the allocator.
    pub fn clear(&mut self) {
        self.buckets.clear();
    }
}

impl<T> Default for BufferPool<T> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rented_buffers_are_rounded_to_power_of_two() {
        let mut pool = BufferPool::<u32>::new();
        assert_eq!(pool.rent(0).len(), 1);
        assert_eq!(pool.rent(5).len(), 8);
        assert_eq!(pool.rent(16).len(), 16);
    }

    #[test]
    fn returned_buffer_is_reused() {
        let mut pool = BufferPool::<u64>::new();
        let buf = pool.rent(10);
        let ptr = buf.as_ptr();
        pool.give_back(buf);
        assert_eq!(pool.retained(), 1);

        let again = pool.rent(9);
        assert_eq!(again.as_ptr(), ptr);
        assert_eq!(pool.retained(), 0);
    }

    #[test]
    fn bucket_limit_drops_extras() {
        let mut pool = BufferPool::<u8>::with_max_per_bucket(1);
        let a = pool.rent(4);
        let b = pool.rent(4);
        pool.give_back(a);
        pool.give_back(b);
        assert_eq!(pool.retained(), 1);

        pool.clear();
        assert_eq!(pool.retained(), 0);
    }
}
