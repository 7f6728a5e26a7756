use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// One observation of the stream
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub index: u64,
    pub value: f64,
}

impl Sample {
    pub fn new(index: u64, value: f64) -> Self {
        Self { index, value }
    }
}

/// Fixed-capacity FIFO of the most recent samples
///
/// Appends at the tail, evicts from the head. `pop_last` exists only for the
/// detector's suppression policy and never touches the head.
#[derive(Debug, Clone)]
pub struct SlidingWindow {
    samples: VecDeque<Sample>,
    capacity: usize,
}

impl SlidingWindow {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append a sample, returning the evicted head if the window overflowed
    pub fn push(&mut self, sample: Sample) -> Option<Sample> {
        self.samples.push_back(sample);
        if self.samples.len() > self.capacity {
            self.samples.pop_front()
        } else {
            None
        }
    }

    /// Remove the most recently pushed sample
    pub fn pop_last(&mut self) -> Option<Sample> {
        self.samples.pop_back()
    }

    pub fn is_full(&self) -> bool {
        self.samples.len() == self.capacity
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.back()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Sample> {
        self.samples.iter()
    }

    /// Values in arrival order
    pub fn values(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.value).collect()
    }

    /// Values laid out on sample-index time.
    ///
    /// Slots left empty by `pop_last` are filled by linear interpolation
    /// between their neighbours, so every value keeps its true offset from
    /// the head. Indices that do not increase, or a layout that would grow
    /// past twice the capacity, fall back to plain arrival order for that
    /// step.
    pub fn timeline(&self) -> Vec<f64> {
        let mut values = Vec::with_capacity(self.capacity + 1);
        let mut prev: Option<&Sample> = None;

        for sample in &self.samples {
            if let Some(p) = prev {
                let gap = sample.index.saturating_sub(p.index) as usize;
                let fits = values.len() + gap <= 2 * self.capacity;
                if gap > 1 && fits {
                    for k in 1..gap {
                        let t = k as f64 / gap as f64;
                        values.push(p.value + (sample.value - p.value) * t);
                    }
                }
            }
            values.push(sample.value);
            prev = Some(sample);
        }
        values
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
