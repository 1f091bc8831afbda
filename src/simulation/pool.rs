//! Pools and the pending-pool stack.
//!
//! A pool is a contiguous slice of the population, identified by its
//! absolute start index so every resolution can be written straight into
//! the outcome array.

/// A contiguous run of samples tested together.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pool {
    pub start: usize,
    pub len: usize,
}

impl Pool {
    pub fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// One past the last index covered.
    pub fn end(&self) -> usize {
        self.start + self.len
    }

    pub fn is_singleton(&self) -> bool {
        self.len == 1
    }

    /// Bisect into a lower half of `floor(len / 2)` samples and an upper
    /// half holding the rest.
    pub fn split(&self) -> (Pool, Pool) {
        let lower = self.len / 2;
        (
            Pool::new(self.start, lower),
            Pool::new(self.start + lower, self.len - lower),
        )
    }

    /// Whether any sample in this pool is truly infected.
    pub fn contains_infected(&self, ground_truth: &[bool]) -> bool {
        ground_truth[self.start..self.end()].iter().any(|&infected| infected)
    }
}

/// Pools awaiting a test, processed depth-first.
///
/// The top of the stack is the front of the queue: a split pool's halves
/// are resolved before anything queued behind them, lower half first.
#[derive(Debug, Default)]
pub struct PoolStack {
    pending: Vec<Pool>,
}

impl PoolStack {
    /// Partition `[0, sample_count)` into consecutive pools of `block_size`
    /// (the last one truncated), with the first pool on top.
    pub fn partition(sample_count: usize, block_size: usize) -> Self {
        let mut pending = Vec::new();
        if block_size > 0 {
            let mut start = 0;
            while start < sample_count {
                let len = block_size.min(sample_count - start);
                pending.push(Pool::new(start, len));
                start += len;
            }
        }
        pending.reverse();
        Self { pending }
    }

    pub fn pop(&mut self) -> Option<Pool> {
        self.pending.pop()
    }

    /// Queue both halves of a split at the front, lower half first.
    pub fn push_halves(&mut self, lower: Pool, upper: Pool) {
        self.pending.push(upper);
        self.pending.push(lower);
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}
