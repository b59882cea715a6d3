//! Binary-heap priority queue of resting orders.
//!
//! [`OrderQueue`] is a contiguous array heap parameterized over a [`QueuePriority`]
//! (best bid = highest price, best ask = lowest price). Among equal prices the
//! earlier `created_at` wins, then earlier insertion. An `OrderId -> index` map is
//! kept in step with every swap so an order can be removed from the middle of the
//! heap in O(log n).

use crate::types::{Order, OrderId};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::marker::PhantomData;

/// Price ordering for one side of the book.
pub trait QueuePriority {
    /// True if price `a` should be matched before price `b`.
    fn better_price(a: Decimal, b: Decimal) -> bool;
}

/// Bid side: highest price first.
#[derive(Clone, Copy, Debug, Default)]
pub struct BidPriority;

impl QueuePriority for BidPriority {
    fn better_price(a: Decimal, b: Decimal) -> bool {
        a > b
    }
}

/// Ask side: lowest price first.
#[derive(Clone, Copy, Debug, Default)]
pub struct AskPriority;

impl QueuePriority for AskPriority {
    fn better_price(a: Decimal, b: Decimal) -> bool {
        a < b
    }
}

#[derive(Clone, Debug)]
struct Entry {
    order: Order,
    /// Insertion sequence; final tie-break for equal price and timestamp.
    seq: u64,
}

/// Heap of resting orders for one side. Order ids are assumed unique within a queue.
#[derive(Clone, Debug)]
pub struct OrderQueue<P> {
    entries: Vec<Entry>,
    positions: HashMap<OrderId, usize>,
    next_seq: u64,
    _priority: PhantomData<P>,
}

pub type BidQueue = OrderQueue<BidPriority>;
pub type AskQueue = OrderQueue<AskPriority>;

impl<P: QueuePriority> Default for OrderQueue<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: QueuePriority> OrderQueue<P> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            positions: HashMap::new(),
            next_seq: 0,
            _priority: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, order_id: OrderId) -> bool {
        self.positions.contains_key(&order_id)
    }

    /// Best order, if any.
    pub fn peek(&self) -> Option<&Order> {
        self.entries.first().map(|e| &e.order)
    }

    /// Inserts an order. Returns false, leaving the queue unchanged, if an order with
    /// the same id is already queued.
    pub fn push(&mut self, order: Order) -> bool {
        if self.positions.contains_key(&order.order_id) {
            return false;
        }
        let seq = self.next_seq;
        self.next_seq += 1;
        let idx = self.entries.len();
        self.positions.insert(order.order_id, idx);
        self.entries.push(Entry { order, seq });
        self.sift_up(idx);
        true
    }

    /// Removes and returns the best order.
    pub fn pop(&mut self) -> Option<Order> {
        self.remove_at(0)
    }

    /// Current array index of an order, if it is in the queue.
    pub fn position(&self, order_id: OrderId) -> Option<usize> {
        self.positions.get(&order_id).copied()
    }

    /// Removes the order at array index `idx` and restores the heap property.
    pub fn remove_at(&mut self, idx: usize) -> Option<Order> {
        if idx >= self.entries.len() {
            return None;
        }
        let last = self.entries.len() - 1;
        self.swap(idx, last);
        let entry = self.entries.pop()?;
        self.positions.remove(&entry.order.order_id);
        if idx < self.entries.len() {
            if !self.sift_down(idx) {
                self.sift_up(idx);
            }
        }
        Some(entry.order)
    }

    /// Removes an order by id.
    pub fn remove(&mut self, order_id: OrderId) -> Option<Order> {
        let idx = self.position(order_id)?;
        self.remove_at(idx)
    }

    /// Fills `qty` of the best order. Returns the order if that left it with nothing
    /// remaining (it is then no longer in the queue).
    ///
    /// Filling never changes price or time, so the heap stays valid in place.
    pub(crate) fn fill_front(&mut self, qty: Decimal, now: u64) -> Option<Order> {
        let front = self.entries.first_mut()?;
        front.order.fill(qty, now);
        if front.order.quantity <= Decimal::ZERO {
            self.pop()
        } else {
            None
        }
    }

    /// Orders in heap-array order (not priority order).
    pub fn iter(&self) -> impl Iterator<Item = &Order> {
        self.entries.iter().map(|e| &e.order)
    }

    /// Clones of all orders, best first.
    pub fn sorted(&self) -> Vec<Order> {
        let mut entries: Vec<&Entry> = self.entries.iter().collect();
        entries.sort_by(|a, b| {
            if Self::outranks(a, b) {
                std::cmp::Ordering::Less
            } else if Self::outranks(b, a) {
                std::cmp::Ordering::Greater
            } else {
                std::cmp::Ordering::Equal
            }
        });
        entries.into_iter().map(|e| e.order.clone()).collect()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    /// Checks the heap property and the index map. Used by tests.
    pub fn is_valid_heap(&self) -> bool {
        for i in 1..self.entries.len() {
            let parent = (i - 1) / 2;
            if Self::outranks(&self.entries[i], &self.entries[parent]) {
                return false;
            }
        }
        self.positions.len() == self.entries.len()
            && self
                .entries
                .iter()
                .enumerate()
                .all(|(i, e)| self.positions.get(&e.order.order_id) == Some(&i))
    }

    fn outranks(a: &Entry, b: &Entry) -> bool {
        if a.order.price != b.order.price {
            return P::better_price(a.order.price, b.order.price);
        }
        if a.order.created_at != b.order.created_at {
            return a.order.created_at < b.order.created_at;
        }
        a.seq < b.seq
    }

    fn swap(&mut self, i: usize, j: usize) {
        if i == j {
            return;
        }
        self.entries.swap(i, j);
        self.positions.insert(self.entries[i].order.order_id, i);
        self.positions.insert(self.entries[j].order.order_id, j);
    }

    fn sift_up(&mut self, mut idx: usize) {
        while idx > 0 {
            let parent = (idx - 1) / 2;
            if !Self::outranks(&self.entries[idx], &self.entries[parent]) {
                break;
            }
            self.swap(idx, parent);
            idx = parent;
        }
    }

    /// Returns true if the entry moved.
    fn sift_down(&mut self, mut idx: usize) -> bool {
        let start = idx;
        let len = self.entries.len();
        loop {
            let left = 2 * idx + 1;
            let right = left + 1;
            let mut best = idx;
            if left < len && Self::outranks(&self.entries[left], &self.entries[best]) {
                best = left;
            }
            if right < len && Self::outranks(&self.entries[right], &self.entries[best]) {
                best = right;
            }
            if best == idx {
                break;
            }
            self.swap(idx, best);
            idx = best;
        }
        idx != start
    }
}
