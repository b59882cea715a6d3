//! Per-symbol market data: a bounded newest-first trade tape and the current
//! one-minute OHLC candle.
//!
//! Each [`MarketDataCache`] has its own lock, independent of the order book lock, so
//! the synthetic feed and real matching never wait on each other. Only the candle for
//! the current minute is kept; a trade in a new minute replaces it.

use crate::execution::Trade;
use crate::types::{minute_start, Side, Symbol};
use log::debug;
use parking_lot::RwLock;
use rust_decimal::Decimal;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// One trade as seen by market data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TradeTick {
    pub price: Decimal,
    pub quantity: Decimal,
    pub side: Side,
    /// Unix millis.
    pub timestamp: u64,
}

impl From<&Trade> for TradeTick {
    fn from(trade: &Trade) -> Self {
        Self {
            price: trade.price,
            quantity: trade.quantity,
            side: trade.aggressor_side,
            timestamp: trade.timestamp,
        }
    }
}

/// Open/high/low/close/volume for the minute starting at `start` (Unix millis).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Ohlc {
    pub open: Decimal,
    pub high: Decimal,
    pub low: Decimal,
    pub close: Decimal,
    pub volume: Decimal,
    pub start: u64,
}

impl Ohlc {
    fn opening(price: Decimal, volume: Decimal, start: u64) -> Self {
        Self {
            open: price,
            high: price,
            low: price,
            close: price,
            volume,
            start,
        }
    }
}

/// Point-in-time copy of a symbol's market data.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct MarketSnapshot {
    pub symbol: Symbol,
    pub last_price: Option<Decimal>,
    pub last_trade_time: Option<u64>,
    pub ohlc: Ohlc,
    /// Newest first.
    pub recent_trades: Vec<TradeTick>,
}

#[derive(Debug)]
struct CacheState {
    recent_trades: VecDeque<TradeTick>,
    ohlc: Ohlc,
}

#[derive(Debug)]
pub struct MarketDataCache {
    symbol: Symbol,
    max_trades: usize,
    state: RwLock<CacheState>,
}

impl MarketDataCache {
    /// Empty tape and a flat candle at `open_price` for the minute containing `now`.
    pub fn new(symbol: Symbol, max_trades: usize, open_price: Decimal, now: u64) -> Self {
        Self {
            symbol,
            max_trades,
            state: RwLock::new(CacheState {
                recent_trades: VecDeque::with_capacity(max_trades),
                ohlc: Ohlc::opening(open_price, Decimal::ZERO, minute_start(now)),
            }),
        }
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Prepends to the tape (dropping the oldest past the cap) and updates the candle.
    pub fn record(&self, tick: TradeTick) {
        let mut state = self.state.write();
        let minute = minute_start(tick.timestamp);
        if minute != state.ohlc.start {
            state.ohlc = Ohlc::opening(tick.price, tick.quantity, minute);
        } else {
            let ohlc = &mut state.ohlc;
            ohlc.high = ohlc.high.max(tick.price);
            ohlc.low = ohlc.low.min(tick.price);
            ohlc.close = tick.price;
            ohlc.volume += tick.quantity;
        }
        state.recent_trades.push_front(tick);
        state.recent_trades.truncate(self.max_trades);
    }

    pub fn snapshot(&self) -> MarketSnapshot {
        let state = self.state.read();
        let last = state.recent_trades.front();
        MarketSnapshot {
            symbol: self.symbol.clone(),
            last_price: last.map(|t| t.price),
            last_trade_time: last.map(|t| t.timestamp),
            ohlc: state.ohlc.clone(),
            recent_trades: state.recent_trades.iter().cloned().collect(),
        }
    }

    pub fn last_price(&self) -> Option<Decimal> {
        self.state.read().recent_trades.front().map(|t| t.price)
    }
}

/// Registry of per-symbol caches. Caches exist only for active symbols.
#[derive(Debug)]
pub struct MarketDataStore {
    max_trades: usize,
    caches: RwLock<HashMap<Symbol, Arc<MarketDataCache>>>,
}

impl MarketDataStore {
    pub fn new(max_trades: usize) -> Self {
        Self {
            max_trades,
            caches: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the cache for `symbol`, creating it seeded at `open_price` if missing.
    pub fn create(&self, symbol: &Symbol, open_price: Decimal, now: u64) -> Arc<MarketDataCache> {
        let mut caches = self.caches.write();
        Arc::clone(caches.entry(symbol.clone()).or_insert_with(|| {
            debug!("market data cache created symbol={}", symbol);
            Arc::new(MarketDataCache::new(symbol.clone(), self.max_trades, open_price, now))
        }))
    }

    pub fn remove(&self, symbol: &Symbol) -> Option<Arc<MarketDataCache>> {
        self.caches.write().remove(symbol)
    }

    pub fn get(&self, symbol: &Symbol) -> Option<Arc<MarketDataCache>> {
        self.caches.read().get(symbol).cloned()
    }

    /// Records a trade into its symbol's cache. Returns false if the symbol has no cache.
    pub fn record_trade(&self, trade: &Trade) -> bool {
        match self.get(&trade.symbol) {
            Some(cache) => {
                cache.record(TradeTick::from(trade));
                true
            }
            None => false,
        }
    }

    /// `None` if the symbol has no cache ("no data"), never a zero-filled snapshot.
    pub fn snapshot(&self, symbol: &Symbol) -> Option<MarketSnapshot> {
        self.get(symbol).map(|cache| cache.snapshot())
    }
}
