//! Bounded history of the most recent normalized frames.
//!
//! Oldest frames are evicted first; the capacity is a hard bound after
//! every push. Detectors only read a suffix via [`SlidingWindowBuffer::take_last`].

use std::collections::VecDeque;

use super::NormalizedFrame;

/// Frames allocated up front; larger windows grow on demand.
const PREALLOCATED_FRAMES: usize = 1024;

#[derive(Debug, Clone)]
pub struct SlidingWindowBuffer {
    frames: VecDeque<NormalizedFrame>,
    capacity: usize,
}

impl SlidingWindowBuffer {
    /// A capacity of zero is raised to one so the newest frame is always
    /// visible.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            frames: VecDeque::with_capacity(capacity.min(PREALLOCATED_FRAMES)),
            capacity,
        }
    }

    /// Append at the tail, evicting from the head past capacity.
    pub fn push(&mut self, frame: NormalizedFrame) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            self.frames.pop_front();
        }
    }

    /// Up to `n` most recent frames, oldest first.
    ///
    /// A shorter result means there is not enough history yet.
    pub fn take_last(&self, n: usize) -> Vec<&NormalizedFrame> {
        let start = self.frames.len().saturating_sub(n);
        self.frames.range(start..).collect()
    }

    /// Drop the oldest frame.
    pub fn dequeue(&mut self) -> Option<NormalizedFrame> {
        self.frames.pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
