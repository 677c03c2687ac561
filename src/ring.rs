use heapless::Deque;

/// Fixed-capacity ordered sequence with FIFO and positional removal.
///
/// Indices are always logical: position 0 is the oldest surviving element,
/// regardless of where it sits in the underlying circular buffer.
///
/// # Full-buffer policy
/// [`enqueue`](Self::enqueue) rejects a new element when `len() == N` and
/// hands it back. [`enqueue_evicting`](Self::enqueue_evicting) drops the
/// oldest element instead. Callers pick the policy that fits their data.
pub struct RingStore<T, const N: usize> {
    items: Deque<T, N>,
}

impl<T, const N: usize> RingStore<T, N> {
    pub const fn new() -> Self {
        Self {
            items: Deque::new(),
        }
    }

    /// Appends `item` at the logical tail, or returns it if the store is full.
    pub fn enqueue(&mut self, item: T) -> Result<(), T> {
        self.items.push_back(item)
    }

    /// Appends `item`, evicting and returning the oldest element when full.
    ///
    /// Nothing is ever dropped silently: with `N == 0` the returned element
    /// is `item` itself.
    pub fn enqueue_evicting(&mut self, item: T) -> Option<T> {
        let evicted = if self.items.is_full() {
            self.items.pop_front()
        } else {
            None
        };
        match self.items.push_back(item) {
            Ok(()) => evicted,
            // Only a zero-capacity store still refuses here.
            Err(item) => Some(item),
        }
    }

    /// Removes and returns the logical head.
    pub fn dequeue(&mut self) -> Option<T> {
        self.items.pop_front()
    }

    /// Removes the element at logical position `index`, closing the gap.
    ///
    /// Survivors keep their relative order. Returns `None` if `index` is out
    /// of range.
    pub fn remove(&mut self, index: usize) -> Option<T> {
        let len = self.items.len();
        if index >= len {
            return None;
        }

        // Rotate every element once through the deque, skipping the victim.
        let mut removed = None;
        for pos in 0..len {
            let Some(item) = self.items.pop_front() else {
                break;
            };
            if pos == index {
                removed = Some(item);
            } else {
                let _ = self.items.push_back(item);
            }
        }
        removed
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        let (front, back) = self.items.as_slices();
        if index < front.len() {
            front.get(index)
        } else {
            back.get(index - front.len())
        }
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (front, back) = self.items.as_mut_slices();
        if index < front.len() {
            front.get_mut(index)
        } else {
            back.get_mut(index - front.len())
        }
    }

    /// Iterates from the logical head to the tail.
    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        let (front, back) = self.items.as_slices();
        front.iter().chain(back.iter())
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.items.is_full()
    }

    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        while self.items.pop_front().is_some() {}
    }
}

impl<T, const N: usize> Default for RingStore<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> core::ops::Index<usize> for RingStore<T, N> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(item) => item,
            None => panic!("ring index {} out of range (len {})", index, self.len()),
        }
    }
}

impl<T, const N: usize> core::ops::IndexMut<usize> for RingStore<T, N> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let len = self.len();
        match self.get_mut(index) {
            Some(item) => item,
            None => panic!("ring index {} out of range (len {})", index, len),
        }
    }
}

impl<T: core::fmt::Debug, const N: usize> core::fmt::Debug for RingStore<T, N> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
