//! Registry of per-symbol order books and the two admission paths.
//!
//! The registry lock is held only to look up or create a book; matching always runs
//! under the individual book's lock, never under the registry lock.

use crate::execution::Trade;
use crate::order_book::OrderBook;
use crate::types::{Order, Symbol};
use log::debug;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct OrderBookManager {
    books: RwLock<HashMap<Symbol, Arc<OrderBook>>>,
}

impl OrderBookManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the book for `symbol`, creating it on first reference. Repeated calls
    /// return the same instance.
    pub fn get_or_create_order_book(&self, symbol: &Symbol) -> Arc<OrderBook> {
        if let Some(book) = self.books.read().get(symbol) {
            return Arc::clone(book);
        }
        let mut books = self.books.write();
        Arc::clone(books.entry(symbol.clone()).or_insert_with(|| {
            debug!("order book created symbol={}", symbol);
            Arc::new(OrderBook::new(symbol.clone()))
        }))
    }

    pub fn get_order_book(&self, symbol: &Symbol) -> Option<Arc<OrderBook>> {
        self.books.read().get(symbol).cloned()
    }

    /// Drops the book for `symbol`. Its resting and stop orders are discarded.
    pub fn remove_order_book(&self, symbol: &Symbol) -> Option<Arc<OrderBook>> {
        self.books.write().remove(symbol)
    }

    pub fn symbols(&self) -> Vec<Symbol> {
        let mut symbols: Vec<Symbol> = self.books.read().keys().cloned().collect();
        symbols.sort();
        symbols
    }

    /// Rests a limit order and runs the matcher. The remainder stays on the book.
    pub fn add_order_and_match(&self, order: Order) -> Vec<Trade> {
        let book = self.get_or_create_order_book(&order.symbol);
        book.add_order_and_match(order)
    }

    /// Fills a marketable order against resting liquidity without ever resting it.
    pub fn add_market_order_and_match(&self, order: &Order) -> Vec<Trade> {
        let book = self.get_or_create_order_book(&order.symbol);
        book.match_market_order(order)
    }

    /// Adds a stop order, then immediately checks the stop list against `last_price`.
    pub fn add_stop_order_and_check(&self, order: Order, last_price: Decimal) -> Vec<Order> {
        let book = self.get_or_create_order_book(&order.symbol);
        book.add_stop_order(order);
        book.check_and_trigger_stop_orders(last_price)
    }
}
