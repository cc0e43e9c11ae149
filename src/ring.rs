/// Growable FIFO ring buffer.
///
/// Backs the lookahead of [`StreamSource`](crate::source::StreamSource):
/// characters are pushed at the back as they are decoded and popped from the
/// front as the lexer consumes them. Capacity doubles when full and element
/// order survives the growth.
#[derive(Debug, Clone)]
pub struct RingBuffer<T> {
    slots: Vec<Option<T>>,
    start: usize,
    len: usize,
}

const DEFAULT_CAPACITY: usize = 8;

impl<T> Default for RingBuffer<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> RingBuffer<T> {
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        let mut slots = Vec::with_capacity(capacity.max(1));
        slots.resize_with(capacity.max(1), || None);
        Self {
            slots,
            start: 0,
            len: 0,
        }
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Append an element at the back, growing the storage when full.
    pub fn push_back(&mut self, item: T) {
        if self.len == self.slots.len() {
            self.grow();
        }
        let idx = self.physical(self.len);
        self.slots[idx] = Some(item);
        self.len += 1;
    }

    /// Remove and return the front element.
    pub fn pop_front(&mut self) -> Option<T> {
        if self.len == 0 {
            return None;
        }
        let item = self.slots[self.start].take();
        self.start = (self.start + 1) % self.slots.len();
        self.len -= 1;
        item
    }

    #[must_use]
    pub fn front(&self) -> Option<&T> {
        self.get(0)
    }

    /// Element at logical `index`, counted from the front.
    #[must_use]
    pub fn get(&self, index: usize) -> Option<&T> {
        if index >= self.len {
            return None;
        }
        self.slots[self.physical(index)].as_ref()
    }

    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.start = 0;
        self.len = 0;
    }

    /// Logical index of the last element among the first `limit` that
    /// satisfies `pred`.
    pub fn last_index_of<P>(&self, limit: usize, mut pred: P) -> Option<usize>
    where
        P: FnMut(&T) -> bool,
    {
        (0..limit.min(self.len))
            .rev()
            .find(|&i| self.get(i).is_some_and(&mut pred))
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        (0..self.len).filter_map(|i| self.get(i))
    }

    const fn physical(&self, index: usize) -> usize {
        (self.start + index) % self.slots.len()
    }

    fn grow(&mut self) {
        let old_capacity = self.slots.len();
        let mut slots = Vec::with_capacity(old_capacity * 2);
        for i in 0..self.len {
            let idx = self.physical(i);
            slots.push(self.slots[idx].take());
        }
        slots.resize_with(old_capacity * 2, || None);
        self.slots = slots;
        self.start = 0;
    }
}
