//! Single-symbol order book: bid and ask heaps plus pending stop orders.
//!
//! Best bid is the highest price, best ask the lowest; equal prices are served in
//! time order. Stop orders sit in an unindexed list and are invisible to matching
//! until [`OrderBook::check_and_trigger_stop_orders`] releases them as market orders.
//!
//! All state lives behind one `RwLock`. Mutations (add, remove, matching, stop
//! triggering) take the write lock for their whole duration, so matching on a symbol
//! is strictly serialized. Reads (best bid/ask, depth) take the read lock.

use crate::execution::Trade;
use crate::matching;
use crate::order_queue::{AskQueue, BidQueue};
use crate::types::{now_millis, Order, OrderId, OrderStatus, OrderType, Side, Symbol};
use log::warn;
use parking_lot::RwLock;
use rust_decimal::Decimal;

/// Aggregated resting quantity at one price.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthLevel {
    pub price: Decimal,
    pub quantity: Decimal,
    pub orders: usize,
}

/// Depth view of both sides, best price first.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct DepthSnapshot {
    pub symbol: Symbol,
    pub bids: Vec<DepthLevel>,
    pub asks: Vec<DepthLevel>,
    /// Unix millis.
    pub timestamp: u64,
}

/// The mutable state guarded by the book lock.
#[derive(Debug, Default)]
pub(crate) struct BookSides {
    pub(crate) bids: BidQueue,
    pub(crate) asks: AskQueue,
    pub(crate) stop_orders: Vec<Order>,
}

/// Per-symbol order book.
#[derive(Debug)]
pub struct OrderBook {
    symbol: Symbol,
    state: RwLock<BookSides>,
}

impl OrderBook {
    pub fn new(symbol: Symbol) -> Self {
        Self {
            symbol,
            state: RwLock::new(BookSides::default()),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Rests an order: bids if buy, asks otherwise. No matching.
    ///
    /// Order ids must be unique within the book. An order whose id is already resting
    /// or pending as a stop is refused with a warning and `false` is returned.
    pub fn add_order(&self, order: Order) -> bool {
        let mut state = self.state.write();
        push_resting(&mut state, &self.symbol, order)
    }

    /// Removes a resting or pending-stop order by id. The returned copy is marked
    /// `Canceled`. Returns `None` if the id is not in the book.
    pub fn remove_order(&self, order_id: OrderId) -> Option<Order> {
        let mut guard = self.state.write();
        let state = &mut *guard;
        let removed = if let Some(o) = state.bids.remove(order_id) {
            Some(o)
        } else if let Some(o) = state.asks.remove(order_id) {
            Some(o)
        } else {
            let stops = &mut state.stop_orders;
            stops
                .iter()
                .position(|o| o.order_id == order_id)
                .map(|idx| stops.remove(idx))
        };
        removed.map(|mut o| {
            o.status = OrderStatus::Canceled;
            o.updated_at = now_millis();
            o
        })
    }

    /// Appends to the stop list. The order is not matchable until triggered.
    pub fn add_stop_order(&self, order: Order) {
        self.state.write().stop_orders.push(order);
    }

    /// Releases every stop order whose trigger `last_price` has crossed.
    ///
    /// A buy stop fires when `last_price >= price`, a sell stop when
    /// `last_price <= price`. Fired orders leave the stop list, become
    /// [`OrderType::Market`], and are returned in the order they were added.
    pub fn check_and_trigger_stop_orders(&self, last_price: Decimal) -> Vec<Order> {
        let mut state = self.state.write();
        let now = now_millis();
        let (mut triggered, remaining): (Vec<Order>, Vec<Order>) = state
            .stop_orders
            .drain(..)
            .partition(|o| match o.side {
                Side::Buy => last_price >= o.price,
                Side::Sell => last_price <= o.price,
            });
        state.stop_orders = remaining;
        for order in triggered.iter_mut() {
            order.order_type = OrderType::Market;
            order.status = OrderStatus::Triggered;
            order.updated_at = now;
        }
        triggered
    }

    /// Runs the crossing loop until no bid/ask pair crosses.
    pub fn match_orders(&self) -> Vec<Trade> {
        let mut state = self.state.write();
        matching::cross_book(&mut state, &self.symbol, Side::Buy, now_millis())
    }

    /// Rests `order` and runs the crossing loop under a single lock acquisition.
    pub fn add_order_and_match(&self, order: Order) -> Vec<Trade> {
        let aggressor = order.side;
        let mut state = self.state.write();
        push_resting(&mut state, &self.symbol, order);
        matching::cross_book(&mut state, &self.symbol, aggressor, now_millis())
    }

    /// Sweeps the opposite side for a marketable order; the order never rests.
    pub fn match_market_order(&self, order: &Order) -> Vec<Trade> {
        let mut state = self.state.write();
        matching::sweep_book(&mut state, &self.symbol, order, now_millis())
    }

    pub fn best_bid(&self) -> Option<Order> {
        self.state.read().bids.peek().cloned()
    }

    pub fn best_ask(&self) -> Option<Order> {
        self.state.read().asks.peek().cloned()
    }

    /// Aggregates up to `levels` distinct prices per side, best first.
    pub fn market_depth(&self, levels: usize) -> DepthSnapshot {
        let state = self.state.read();
        DepthSnapshot {
            symbol: self.symbol.clone(),
            bids: aggregate_levels(state.bids.sorted(), levels),
            asks: aggregate_levels(state.asks.sorted(), levels),
            timestamp: now_millis(),
        }
    }

    /// Resting bids, best first.
    pub fn bid_orders(&self) -> Vec<Order> {
        self.state.read().bids.sorted()
    }

    /// Resting asks, best first.
    pub fn ask_orders(&self) -> Vec<Order> {
        self.state.read().asks.sorted()
    }

    /// Pending stop orders in insertion order.
    pub fn stop_orders(&self) -> Vec<Order> {
        self.state.read().stop_orders.clone()
    }

    /// Number of resting orders on both sides (stop orders excluded).
    pub fn resting_len(&self) -> usize {
        let state = self.state.read();
        state.bids.len() + state.asks.len()
    }

    /// True if both heaps satisfy their ordering and index invariants.
    pub fn is_consistent(&self) -> bool {
        let state = self.state.read();
        state.bids.is_valid_heap() && state.asks.is_valid_heap()
    }
}

fn push_resting(state: &mut BookSides, symbol: &Symbol, order: Order) -> bool {
    let id = order.order_id;
    let duplicate = state.bids.contains(id)
        || state.asks.contains(id)
        || state.stop_orders.iter().any(|o| o.order_id == id);
    if duplicate {
        warn!("duplicate order id refused order_id={} symbol={}", id.0, symbol);
        return false;
    }
    match order.side {
        Side::Buy => state.bids.push(order),
        Side::Sell => state.asks.push(order),
    }
}

fn aggregate_levels(sorted: Vec<Order>, levels: usize) -> Vec<DepthLevel> {
    let mut out: Vec<DepthLevel> = Vec::with_capacity(levels);
    for order in sorted {
        match out.last_mut() {
            Some(level) if level.price == order.price => {
                level.quantity += order.quantity;
                level.orders += 1;
            }
            _ => {
                if out.len() == levels {
                    break;
                }
                out.push(DepthLevel {
                    price: order.price,
                    quantity: order.quantity,
                    orders: 1,
                });
            }
        }
    }
    out
}
