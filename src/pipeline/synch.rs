//! Arrival bookkeeping for synchronous operators.
//!
//! Each input port has a pending count of buffered arrivals. Arrivals are
//! slotted into generations: the `k`-th pending value on a port lands in
//! the `k`-th oldest generation. A generation fires once every port has at
//! least one pending value, which is always the oldest one. Fast ports just
//! accumulate extra generations until the slow ones catch up.

use crate::data::Data;
use std::collections::VecDeque;

#[derive(Debug, Clone)]
pub struct SynchState {
    pending: Vec<usize>,
    generations: VecDeque<Vec<Option<Data>>>,
}

impl SynchState {
    pub fn new(num_inputs: usize) -> Self {
        Self {
            pending: vec![0; num_inputs],
            generations: VecDeque::new(),
        }
    }

    pub fn num_inputs(&self) -> usize {
        self.pending.len()
    }

    /// Buffer `value` on `port`. Returns the oldest generation once it is
    /// complete; a single arrival can complete at most one.
    ///
    /// # Panics
    ///
    /// Panics if `port` is out of range.
    pub fn arrive(&mut self, port: usize, value: Data) -> Option<Vec<Data>> {
        let slot = self.pending[port];
        if slot == self.generations.len() {
            self.generations.push_back(vec![None; self.pending.len()]);
        }
        self.generations[slot][port] = Some(value);
        self.pending[port] += 1;

        if self.pending.iter().any(|&n| n == 0) {
            return None;
        }
        let ready = self.generations.pop_front()?;
        for n in &mut self.pending {
            *n -= 1;
        }
        ready.into_iter().collect()
    }

    /// Buffered arrivals on `port`.
    pub fn pending(&self, port: usize) -> usize {
        self.pending.get(port).copied().unwrap_or(0)
    }

    /// Generations holding at least one value.
    pub fn buffered_generations(&self) -> usize {
        self.generations.len()
    }

    /// Drop everything buffered and return the number of discarded values.
    pub fn clear(&mut self) -> usize {
        let dropped = self.pending.iter().sum();
        self.generations.clear();
        self.pending.iter_mut().for_each(|n| *n = 0);
        dropped
    }
}
