//! Engine context: the single entry point for order flow and market-data reads.
//!
//! One [`Engine`] is built at startup and shared (by reference or `Arc`) with every
//! request path. It owns the order book registry, the market-data caches, and the
//! ticker lifecycle; there is no global state.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::execution::Trade;
use crate::manager::OrderBookManager;
use crate::market_data::{MarketDataStore, MarketSnapshot};
use crate::order_book::DepthSnapshot;
use crate::ticker::{InMemoryTickerStore, JsonFileTickerStore, Ticker, TickerManager, TickerStore};
use crate::types::{Order, OrderId, OrderType, Symbol};
use log::{info, warn};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::runtime::Handle;

/// Multi-symbol matching engine.
///
/// Use [`Engine::submit_order`] for market and limit orders (stop orders are routed to
/// the stop list). Every trade, including trades from stop orders it triggers, is
/// returned to the caller and recorded into the symbol's market data.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    books: Arc<OrderBookManager>,
    market_data: Arc<MarketDataStore>,
    tickers: TickerManager,
}

impl Engine {
    /// Builds an engine whose ticker list lives in `config.tickers_path` (JSON), or in
    /// memory when no path is set. Feeds are spawned on the current tokio runtime, if any.
    pub fn new(config: EngineConfig) -> Self {
        let store: Box<dyn TickerStore> = match config.tickers_path.as_ref() {
            Some(path) => Box::new(JsonFileTickerStore::new(path)),
            None => Box::new(InMemoryTickerStore::new()),
        };
        Self::with_store(config, store)
    }

    pub fn with_store(config: EngineConfig, store: Box<dyn TickerStore>) -> Self {
        let books = Arc::new(OrderBookManager::new());
        let market_data = Arc::new(MarketDataStore::new(config.max_recent_trades));
        let tickers = TickerManager::new(
            config.clone(),
            store,
            Arc::clone(&books),
            Arc::clone(&market_data),
            Handle::try_current().ok(),
        );
        Self {
            config,
            books,
            market_data,
            tickers,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn order_books(&self) -> &OrderBookManager {
        &self.books
    }

    pub fn market_data(&self) -> &MarketDataStore {
        &self.market_data
    }

    pub fn tickers(&self) -> &TickerManager {
        &self.tickers
    }

    /// Submits an order and returns every trade it caused.
    ///
    /// Limit orders rest and match; market orders sweep the opposite side and never
    /// rest; stop orders go to the stop list and return no trades. Each trade's price is
    /// checked against the symbol's stop list, and triggered stops are matched as
    /// market orders until no more stops fire.
    pub fn submit_order(&self, order: Order) -> Vec<Trade> {
        info!(
            "order submitted order_id={} symbol={} side={:?} type={:?} quantity={} price={}",
            order.order_id.0,
            order.symbol,
            order.side,
            order.order_type,
            order.quantity,
            order.price
        );
        let symbol = order.symbol.clone();
        let trades = match order.order_type {
            OrderType::Limit => self.books.add_order_and_match(order),
            OrderType::Market => self.books.add_market_order_and_match(&order),
            OrderType::Stop => {
                self.books.get_or_create_order_book(&symbol).add_stop_order(order);
                return Vec::new();
            }
        };
        self.settle(&symbol, trades)
    }

    /// Queues a stop order. It produces no trades until a later trade crosses its trigger.
    pub fn submit_stop_order(&self, order: Order) {
        info!(
            "stop order submitted order_id={} symbol={} side={:?} trigger={} quantity={}",
            order.order_id.0, order.symbol, order.side, order.price, order.quantity
        );
        self.books
            .get_or_create_order_book(&order.symbol)
            .add_stop_order(order);
    }

    /// Removes a resting or pending stop order. Returns the canceled order if found.
    pub fn cancel_order(&self, symbol: &Symbol, order_id: OrderId) -> Option<Order> {
        let removed = self.books.get_order_book(symbol)?.remove_order(order_id);
        if removed.is_some() {
            info!("order canceled order_id={} symbol={}", order_id.0, symbol);
        }
        removed
    }

    pub fn best_bid(&self, symbol: &Symbol) -> Option<Order> {
        self.books.get_or_create_order_book(symbol).best_bid()
    }

    pub fn best_ask(&self, symbol: &Symbol) -> Option<Order> {
        self.books.get_or_create_order_book(symbol).best_ask()
    }

    pub fn market_depth(&self, symbol: &Symbol, levels: usize) -> DepthSnapshot {
        self.books.get_or_create_order_book(symbol).market_depth(levels)
    }

    /// `None` when the symbol is not active.
    pub fn market_snapshot(&self, symbol: &Symbol) -> Option<MarketSnapshot> {
        self.market_data.snapshot(symbol)
    }

    /// Persists and activates a ticker: order book, market-data cache, and feed.
    pub fn activate_symbol(&self, ticker: Ticker) -> EngineResult<()> {
        self.tickers.add_ticker(ticker)
    }

    /// Tears down a symbol. Resting and stop orders are discarded without notice.
    pub fn deactivate_symbol(&self, symbol: &Symbol) -> EngineResult<bool> {
        self.tickers.remove_ticker(symbol)
    }

    pub fn active_symbols(&self) -> Vec<Ticker> {
        self.tickers.list_tickers()
    }

    /// Reactivates every ticker in the store. Call once at startup.
    pub fn load_tickers(&self) -> EngineResult<usize> {
        self.tickers.load_tickers()
    }

    /// Stops all synthetic feeds (shutdown).
    pub fn shutdown(&self) {
        self.tickers.stop_feeds();
    }

    /// Records trades into market data and runs the stop cascade to a fixed point.
    /// Trades come back in execution order: a triggered stop's fills follow every
    /// trade already executed before it.
    fn settle(&self, symbol: &Symbol, trades: Vec<Trade>) -> Vec<Trade> {
        let book = self.books.get_or_create_order_book(symbol);
        let mut settled = Vec::with_capacity(trades.len());
        let mut pending: VecDeque<Trade> = trades.into();
        while let Some(trade) = pending.pop_front() {
            info!(
                "trade symbol={} buy_order={} sell_order={} price={} quantity={}",
                trade.symbol, trade.buy_order_id.0, trade.sell_order_id.0, trade.price, trade.quantity
            );
            self.market_data.record_trade(&trade);
            for stop in book.check_and_trigger_stop_orders(trade.price) {
                info!(
                    "stop order triggered order_id={} symbol={} side={:?} trigger={} last_price={}",
                    stop.order_id.0, stop.symbol, stop.side, stop.price, trade.price
                );
                let stop_trades = self.books.add_market_order_and_match(&stop);
                if stop_trades.is_empty() {
                    warn!(
                        "triggered stop found no liquidity order_id={} symbol={}",
                        stop.order_id.0, stop.symbol
                    );
                }
                pending.extend(stop_trades);
            }
            settled.push(trade);
        }
        settled
    }
}
