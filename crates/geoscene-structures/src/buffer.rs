//! Capacity-tracked flat buffers.
//!
//! A [`GrowableBuffer`] mirrors a renderer vertex attribute: a flat array of
//! `item_size`-wide items whose allocation is fixed once handed to the GPU.
//! The logical item count may be smaller than the allocation; edits shift data
//! in place and only reallocate when the spare capacity runs out.

use std::ops::Range;

use bytemuck::Pod;
use geoscene_core::GrowthPolicy;

/// A flat numeric buffer with a logical item count and spare capacity.
#[derive(Debug, Clone)]
pub struct GrowableBuffer<T> {
    data: Vec<T>,
    item_size: usize,
    len: usize,
    growth: GrowthPolicy,
    needs_update: bool,
    reallocations: usize,
}

impl<T: Pod> GrowableBuffer<T> {
    /// Creates an unallocated buffer of `item_size`-wide items.
    #[must_use]
    pub fn new(item_size: usize, growth: GrowthPolicy) -> Self {
        assert!(item_size > 0, "item size must be positive");
        Self {
            data: Vec::new(),
            item_size,
            len: 0,
            growth,
            needs_update: false,
            reallocations: 0,
        }
    }

    /// Creates a buffer with room for exactly `capacity` items.
    #[must_use]
    pub fn with_capacity(item_size: usize, capacity: usize, growth: GrowthPolicy) -> Self {
        let mut buffer = Self::new(item_size, growth);
        buffer.data = vec![T::zeroed(); capacity * item_size];
        buffer
    }

    /// Width of one item in elements.
    #[must_use]
    pub fn item_size(&self) -> usize {
        self.item_size
    }

    /// Logical item count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the buffer holds no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Allocated item count.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len() / self.item_size
    }

    /// Items that can still be added without reallocating.
    #[must_use]
    pub fn spare(&self) -> usize {
        self.capacity() - self.len
    }

    /// How many times the backing storage has been replaced.
    #[must_use]
    pub fn reallocations(&self) -> usize {
        self.reallocations
    }

    /// Whether the logical contents changed since the last [`Self::clear_dirty`].
    #[must_use]
    pub fn needs_update(&self) -> bool {
        self.needs_update
    }

    /// Flags the contents as changed.
    pub fn mark_dirty(&mut self) {
        self.needs_update = true;
    }

    /// Acknowledges an upload of the current contents.
    pub fn clear_dirty(&mut self) {
        self.needs_update = false;
    }

    /// Logical contents as a flat slice.
    #[must_use]
    pub fn as_slice(&self) -> &[T] {
        &self.data[..self.len * self.item_size]
    }

    /// Logical contents as raw bytes for upload.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(self.as_slice())
    }

    /// Iterates over the logical items.
    pub fn items(&self) -> std::slice::ChunksExact<'_, T> {
        self.as_slice().chunks_exact(self.item_size)
    }

    /// Returns one item.
    #[must_use]
    pub fn item(&self, index: usize) -> Option<&[T]> {
        (index < self.len).then(|| &self.data[self.span(index..index + 1)])
    }

    fn span(&self, items: Range<usize>) -> Range<usize> {
        items.start * self.item_size..items.end * self.item_size
    }

    fn check_values(&self, values: &[T]) -> usize {
        debug_assert_eq!(
            values.len() % self.item_size,
            0,
            "values must be whole items"
        );
        values.len() / self.item_size
    }

    /// Makes room for `additional` more items, reallocating if needed.
    ///
    /// Returns true when the backing storage was replaced.
    pub fn ensure_capacity(&mut self, additional: usize) -> bool {
        let required = self.len + additional;
        let capacity = self.capacity();
        if required <= capacity {
            return false;
        }
        let new_capacity = self.growth.next_capacity(capacity, required);
        let mut data = vec![T::zeroed(); new_capacity * self.item_size];
        let live = self.span(0..self.len);
        data[live.clone()].copy_from_slice(&self.data[live]);
        log::debug!(
            "buffer reallocated: {} -> {} items ({} live)",
            capacity,
            new_capacity,
            self.len
        );
        self.data = data;
        self.reallocations += 1;
        true
    }

    /// Moves items `[from, len)` right by `by`, opening a zeroed gap at `from`.
    pub fn shift_right(&mut self, from: usize, by: usize) {
        assert!(from <= self.len, "shift origin past end");
        if by == 0 {
            return;
        }
        self.ensure_capacity(by);
        let src = self.span(from..self.len);
        self.data.copy_within(src, (from + by) * self.item_size);
        let gap = self.span(from..from + by);
        self.data[gap].fill(T::zeroed());
        self.len += by;
        self.needs_update = true;
    }

    /// Moves items `[from, len)` left by `by`, overwriting the `by` items before `from`.
    pub fn shift_left(&mut self, from: usize, by: usize) {
        assert!(by <= from && from <= self.len, "shift range out of bounds");
        if by == 0 {
            return;
        }
        let src = self.span(from..self.len);
        self.data.copy_within(src, (from - by) * self.item_size);
        self.len -= by;
        self.needs_update = true;
    }

    /// Appends whole items.
    pub fn push(&mut self, values: &[T]) {
        let count = self.check_values(values);
        self.ensure_capacity(count);
        let span = self.span(self.len..self.len + count);
        self.data[span].copy_from_slice(values);
        self.len += count;
        self.needs_update = true;
    }

    /// Inserts whole items at `index`.
    pub fn insert(&mut self, index: usize, values: &[T]) {
        let count = self.check_values(values);
        self.shift_right(index, count);
        self.write(index, values);
    }

    /// Overwrites items starting at `index`; the range must be in bounds.
    pub fn write(&mut self, index: usize, values: &[T]) {
        let count = self.check_values(values);
        assert!(index + count <= self.len, "write past end");
        let span = self.span(index..index + count);
        self.data[span].copy_from_slice(values);
        self.needs_update = true;
    }

    /// Removes `count` items starting at `start`.
    pub fn remove(&mut self, start: usize, count: usize) {
        self.shift_left(start + count, count);
    }

    /// Removes several sorted, non-overlapping item ranges in one pass.
    pub fn remove_ranges(&mut self, ranges: &[Range<usize>]) {
        let Some(first) = ranges.first() else {
            return;
        };
        let mut write = first.start;
        for (k, range) in ranges.iter().enumerate() {
            let keep_end = ranges.get(k + 1).map_or(self.len, |next| next.start);
            let src = self.span(range.end..keep_end);
            self.data.copy_within(src, write * self.item_size);
            write += keep_end - range.end;
        }
        self.len = write;
        self.needs_update = true;
    }

    /// Inserts items so that they land at the given sorted, non-overlapping
    /// final positions, in one pass. `values` holds the items of every range
    /// back to back.
    pub fn insert_ranges(&mut self, ranges: &[Range<usize>], values: &[T]) {
        let total = self.check_values(values);
        debug_assert_eq!(total, ranges.iter().map(|r| r.len()).sum::<usize>());
        self.ensure_capacity(total);

        let mut src_end = self.len;
        let mut dst_end = self.len + total;
        let mut value_end = total;
        for range in ranges.iter().rev() {
            let moved = dst_end - range.end;
            let src = self.span(src_end - moved..src_end);
            self.data.copy_within(src, range.end * self.item_size);
            src_end -= moved;

            let value_start = value_end - range.len();
            let dst = self.span(range.clone());
            let value_span = self.span(value_start..value_end);
            self.data[dst].copy_from_slice(&values[value_span]);
            value_end = value_start;
            dst_end = range.start;
        }
        self.len += total;
        self.needs_update = true;
    }

    /// Swaps two items.
    pub fn swap_items(&mut self, a: usize, b: usize) {
        if a == b {
            return;
        }
        for k in 0..self.item_size {
            self.data.swap(a * self.item_size + k, b * self.item_size + k);
        }
        self.needs_update = true;
    }

    /// Reverses the order of all logical items.
    pub fn reverse_items(&mut self) {
        let n = self.len;
        for i in 0..n / 2 {
            self.swap_items(i, n - 1 - i);
        }
    }

    /// Drops items past `len`; capacity is kept.
    pub fn truncate(&mut self, len: usize) {
        if len < self.len {
            self.len = len;
            self.needs_update = true;
        }
    }

    /// Empties the buffer; capacity is kept.
    pub fn clear(&mut self) {
        self.truncate(0);
    }

    /// Frees the backing storage.
    pub fn release(&mut self) {
        self.data = Vec::new();
        self.len = 0;
        self.needs_update = true;
    }
}
