// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2025 Daniel Negri
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program. If not, see <https://www.gnu.org/licenses/>.

//! Max-ordered priority queue of outstanding balances.
//!
//! A binary max-heap keyed by [`BalanceEntry::magnitude`]. The sift rules are
//! fixed so that pop order among equal magnitudes depends only on the push
//! sequence: sift-up moves an entry only while it is strictly larger than its
//! parent, and sift-down prefers the left child when both children tie.
//! Beyond that, order among exact ties is not meaningful to callers.

use crate::base::BankId;
use rust_decimal::Decimal;

/// Remaining magnitude owed by (or to) a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BalanceEntry {
    pub magnitude: Decimal,
    pub bank_id: BankId,
}

impl BalanceEntry {
    pub fn new(bank_id: BankId, magnitude: Decimal) -> Self {
        Self { magnitude, bank_id }
    }
}

/// A max-heap of [`BalanceEntry`] values.
#[derive(Debug, Clone, Default)]
pub struct BalanceQueue {
    heap: Vec<BalanceEntry>,
}

impl BalanceQueue {
    /// Creates a new empty queue.
    pub fn new() -> Self {
        Self { heap: Vec::new() }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            heap: Vec::with_capacity(capacity),
        }
    }

    /// Inserts an entry. O(log n).
    pub fn push(&mut self, entry: BalanceEntry) {
        self.heap.push(entry);
        self.sift_up(self.heap.len() - 1);
    }

    /// Removes and returns the largest entry, or `None` when empty. O(log n).
    pub fn pop(&mut self) -> Option<BalanceEntry> {
        let last = self.heap.pop()?;
        if self.heap.is_empty() {
            return Some(last);
        }
        let root = std::mem::replace(&mut self.heap[0], last);
        self.sift_down(0);
        Some(root)
    }

    /// Returns the largest entry without removing it.
    pub fn peek(&self) -> Option<&BalanceEntry> {
        self.heap.first()
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }

    /// Empties the queue, yielding entries in heap (not priority) order.
    pub fn drain(&mut self) -> impl Iterator<Item = BalanceEntry> + '_ {
        self.heap.drain(..)
    }

    fn sift_up(&mut self, mut index: usize) {
        while index > 0 {
            let parent = (index - 1) / 2;
            if self.heap[index].magnitude <= self.heap[parent].magnitude {
                break;
            }
            self.heap.swap(index, parent);
            index = parent;
        }
    }

    fn sift_down(&mut self, mut index: usize) {
        let len = self.heap.len();
        loop {
            let left = 2 * index + 1;
            let right = left + 1;
            let mut largest = index;

            if left < len && self.heap[left].magnitude > self.heap[largest].magnitude {
                largest = left;
            }
            if right < len && self.heap[right].magnitude > self.heap[largest].magnitude {
                largest = right;
            }
            if largest == index {
                break;
            }
            self.heap.swap(index, largest);
            index = largest;
        }
    }
}

impl Extend<BalanceEntry> for BalanceQueue {
    fn extend<T: IntoIterator<Item = BalanceEntry>>(&mut self, iter: T) {
        for entry in iter {
            self.push(entry);
        }
    }
}

impl FromIterator<BalanceEntry> for BalanceQueue {
    fn from_iter<T: IntoIterator<Item = BalanceEntry>>(iter: T) -> Self {
        let mut queue = BalanceQueue::new();
        queue.extend(iter);
        queue
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn entry(id: u32, magnitude: Decimal) -> BalanceEntry {
        BalanceEntry::new(BankId(id), magnitude)
    }

    #[test]
    fn empty_queue_returns_none() {
        let mut queue = BalanceQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.peek(), None);
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.len(), 0);
    }

    #[test]
    fn pops_in_descending_magnitude() {
        let mut queue: BalanceQueue = [
            entry(1, dec!(30)),
            entry(2, dec!(100)),
            entry(3, dec!(5.5)),
            entry(4, dec!(70)),
            entry(5, dec!(42.01)),
        ]
        .into_iter()
        .collect();

        let order: Vec<_> = std::iter::from_fn(|| queue.pop())
            .map(|e| e.magnitude)
            .collect();
        assert_eq!(order, vec![dec!(100), dec!(70), dec!(42.01), dec!(30), dec!(5.5)]);
    }

    #[test]
    fn peek_does_not_remove() {
        let mut queue = BalanceQueue::new();
        queue.push(entry(1, dec!(10)));
        queue.push(entry(2, dec!(20)));

        assert_eq!(queue.peek(), Some(&entry(2, dec!(20))));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.pop(), Some(entry(2, dec!(20))));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn equal_push_keeps_earlier_entry_on_top() {
        let mut queue = BalanceQueue::new();
        queue.push(entry(1, dec!(50)));
        queue.push(entry(2, dec!(50)));
        assert_eq!(queue.peek().map(|e| e.bank_id), Some(BankId(1)));
    }

    #[test]
    fn sift_down_prefers_left_child_on_tie() {
        // Heap layout after pushes: [9, 5(id 2), 5(id 3), 1]
        let mut queue = BalanceQueue::new();
        queue.push(entry(1, dec!(9)));
        queue.push(entry(2, dec!(5)));
        queue.push(entry(3, dec!(5)));
        queue.push(entry(4, dec!(1)));

        assert_eq!(queue.pop().map(|e| e.bank_id), Some(BankId(1)));
        assert_eq!(queue.pop().map(|e| e.bank_id), Some(BankId(2)));
        assert_eq!(queue.pop().map(|e| e.bank_id), Some(BankId(3)));
        assert_eq!(queue.pop().map(|e| e.bank_id), Some(BankId(4)));
    }

    #[test]
    fn interleaved_push_pop() {
        let mut queue = BalanceQueue::with_capacity(4);
        queue.push(entry(1, dec!(3)));
        queue.push(entry(2, dec!(8)));
        assert_eq!(queue.pop().map(|e| e.magnitude), Some(dec!(8)));
        queue.push(entry(3, dec!(1)));
        queue.push(entry(4, dec!(6)));
        assert_eq!(queue.pop().map(|e| e.magnitude), Some(dec!(6)));
        assert_eq!(queue.pop().map(|e| e.magnitude), Some(dec!(3)));
        assert_eq!(queue.pop().map(|e| e.magnitude), Some(dec!(1)));
        assert!(queue.is_empty());
    }

    #[test]
    fn drain_empties_queue() {
        let mut queue: BalanceQueue = (1..=5).map(|i| entry(i, Decimal::from(i))).collect();
        let drained: Vec<_> = queue.drain().collect();
        assert_eq!(drained.len(), 5);
        assert!(queue.is_empty());
    }
}
