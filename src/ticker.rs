//! Symbol activation and the durable ticker list.
//!
//! [`TickerManager`] ties a symbol's order book, market-data cache, and synthetic feed
//! together: activating a ticker creates all of them, removing it tears all of them
//! down. The list of known tickers goes through a [`TickerStore`] so it survives a
//! restart; book state does not.

use crate::config::EngineConfig;
use crate::error::EngineResult;
use crate::feed::{spawn_price_feed, FeedHandle};
use crate::manager::OrderBookManager;
use crate::market_data::MarketDataStore;
use crate::market_data_gen::PriceWalk;
use crate::types::{now_millis, Symbol};
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::runtime::Handle;

/// A tradable symbol and its display name.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Ticker {
    pub symbol: Symbol,
    pub name: String,
}

impl Ticker {
    pub fn new(symbol: impl Into<Symbol>, name: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            name: name.into(),
        }
    }
}

/// Durable storage for the ticker list. Implementations write to a file, a database,
/// or memory (tests).
pub trait TickerStore: Send + Sync {
    /// Inserts or replaces by symbol.
    fn save_ticker(&self, ticker: &Ticker) -> EngineResult<()>;
    fn list_tickers(&self) -> EngineResult<Vec<Ticker>>;
    fn delete_ticker(&self, symbol: &Symbol) -> EngineResult<()>;
}

/// File-based store: one JSON array of tickers. A missing file is an empty list.
#[derive(Debug)]
pub struct JsonFileTickerStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonFileTickerStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            write_lock: Mutex::new(()),
        }
    }

    fn load(&self) -> EngineResult<Vec<Ticker>> {
        let data = match std::fs::read_to_string(&self.path) {
            Ok(d) => d,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if data.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&data)?)
    }

    fn write(&self, tickers: &[Ticker]) -> EngineResult<()> {
        let json = serde_json::to_string_pretty(tickers)?;
        std::fs::write(&self.path, json)?;
        Ok(())
    }
}

impl TickerStore for JsonFileTickerStore {
    fn save_ticker(&self, ticker: &Ticker) -> EngineResult<()> {
        let _guard = self.write_lock.lock();
        let mut tickers = self.load()?;
        match tickers.iter_mut().find(|t| t.symbol == ticker.symbol) {
            Some(existing) => *existing = ticker.clone(),
            None => tickers.push(ticker.clone()),
        }
        self.write(&tickers)
    }

    fn list_tickers(&self) -> EngineResult<Vec<Ticker>> {
        self.load()
    }

    fn delete_ticker(&self, symbol: &Symbol) -> EngineResult<()> {
        let _guard = self.write_lock.lock();
        let mut tickers = self.load()?;
        tickers.retain(|t| &t.symbol != symbol);
        self.write(&tickers)
    }
}

/// In-memory store for tests and for running without a tickers file.
/// Clone shares the same backing map.
#[derive(Clone, Debug, Default)]
pub struct InMemoryTickerStore {
    tickers: Arc<Mutex<BTreeMap<Symbol, Ticker>>>,
}

impl InMemoryTickerStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TickerStore for InMemoryTickerStore {
    fn save_ticker(&self, ticker: &Ticker) -> EngineResult<()> {
        self.tickers.lock().insert(ticker.symbol.clone(), ticker.clone());
        Ok(())
    }

    fn list_tickers(&self) -> EngineResult<Vec<Ticker>> {
        Ok(self.tickers.lock().values().cloned().collect())
    }

    fn delete_ticker(&self, symbol: &Symbol) -> EngineResult<()> {
        self.tickers.lock().remove(symbol);
        Ok(())
    }
}

/// Lifecycle owner for active symbols.
pub struct TickerManager {
    config: EngineConfig,
    store: Box<dyn TickerStore>,
    books: Arc<OrderBookManager>,
    market_data: Arc<MarketDataStore>,
    runtime: Option<Handle>,
    tickers: RwLock<BTreeMap<Symbol, Ticker>>,
    feeds: Mutex<HashMap<Symbol, FeedHandle>>,
}

impl TickerManager {
    /// `runtime` is where feed tasks are spawned; without one, symbols activate with no
    /// synthetic feed.
    pub fn new(
        config: EngineConfig,
        store: Box<dyn TickerStore>,
        books: Arc<OrderBookManager>,
        market_data: Arc<MarketDataStore>,
        runtime: Option<Handle>,
    ) -> Self {
        Self {
            config,
            store,
            books,
            market_data,
            runtime,
            tickers: RwLock::new(BTreeMap::new()),
            feeds: Mutex::new(HashMap::new()),
        }
    }

    /// Persists the ticker and activates its symbol.
    pub fn add_ticker(&self, ticker: Ticker) -> EngineResult<()> {
        let mut tickers = self.tickers.write();
        self.store.save_ticker(&ticker)?;
        self.activate(&ticker.symbol);
        info!("ticker added symbol={} name={}", ticker.symbol, ticker.name);
        tickers.insert(ticker.symbol.clone(), ticker);
        Ok(())
    }

    /// Stops the feed, discards the symbol's book and market data, and deletes the
    /// ticker from the store. Returns whether the symbol was active.
    pub fn remove_ticker(&self, symbol: &Symbol) -> EngineResult<bool> {
        let mut tickers = self.tickers.write();
        let existed = tickers.remove(symbol).is_some();
        if let Some(feed) = self.feeds.lock().remove(symbol) {
            feed.stop();
        }
        self.market_data.remove(symbol);
        if let Some(book) = self.books.remove_order_book(symbol) {
            let discarded = book.resting_len() + book.stop_orders().len();
            if discarded > 0 {
                warn!("ticker removed with open orders symbol={} discarded={}", symbol, discarded);
            }
        }
        self.store.delete_ticker(symbol)?;
        info!("ticker removed symbol={}", symbol);
        Ok(existed)
    }

    /// Active tickers sorted by symbol.
    pub fn list_tickers(&self) -> Vec<Ticker> {
        self.tickers.read().values().cloned().collect()
    }

    pub fn is_active(&self, symbol: &Symbol) -> bool {
        self.tickers.read().contains_key(symbol)
    }

    pub fn has_feed(&self, symbol: &Symbol) -> bool {
        self.feeds.lock().contains_key(symbol)
    }

    /// Reloads tickers from the store and activates each. Returns how many were loaded.
    pub fn load_tickers(&self) -> EngineResult<usize> {
        let stored = self.store.list_tickers()?;
        let mut tickers = self.tickers.write();
        for ticker in &stored {
            self.activate(&ticker.symbol);
            tickers.insert(ticker.symbol.clone(), ticker.clone());
        }
        info!("tickers loaded count={}", stored.len());
        Ok(stored.len())
    }

    /// Stops every feed. Books and caches stay.
    pub fn stop_feeds(&self) {
        for (_, feed) in self.feeds.lock().drain() {
            feed.stop();
        }
    }

    fn activate(&self, symbol: &Symbol) {
        self.books.get_or_create_order_book(symbol);
        let cache = self
            .market_data
            .create(symbol, self.config.feed_open_price, now_millis());
        if !self.config.feed_enabled {
            return;
        }
        let Some(runtime) = self.runtime.as_ref() else {
            debug!("no async runtime; price feed not started symbol={}", symbol);
            return;
        };
        let mut feeds = self.feeds.lock();
        if feeds.contains_key(symbol) {
            return;
        }
        let feed = spawn_price_feed(
            runtime,
            cache,
            PriceWalk::from_config(&self.config),
            self.config.feed_interval(),
        );
        feeds.insert(symbol.clone(), feed);
    }
}

impl std::fmt::Debug for TickerManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TickerManager")
            .field("tickers", &*self.tickers.read())
            .field("feeds", &self.feeds.lock().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Order, OrderId, OrderType, Side};
    use rust_decimal::Decimal;

    fn manager(store: InMemoryTickerStore) -> (TickerManager, Arc<OrderBookManager>, Arc<MarketDataStore>) {
        let books = Arc::new(OrderBookManager::new());
        let market_data = Arc::new(MarketDataStore::new(100));
        let config = EngineConfig {
            feed_enabled: false,
            ..Default::default()
        };
        let m = TickerManager::new(
            config,
            Box::new(store),
            Arc::clone(&books),
            Arc::clone(&market_data),
            None,
        );
        (m, books, market_data)
    }

    #[test]
    fn add_ticker_creates_book_and_cache_together() {
        let store = InMemoryTickerStore::new();
        let (m, books, market_data) = manager(store.clone());
        m.add_ticker(Ticker::new("ABC", "Abc Corp")).unwrap();
        let sym = Symbol::from("ABC");
        assert!(m.is_active(&sym));
        assert!(books.get_order_book(&sym).is_some());
        assert!(market_data.get(&sym).is_some());
        assert_eq!(store.list_tickers().unwrap().len(), 1);
        assert!(!m.has_feed(&sym));
    }

    #[test]
    fn remove_ticker_tears_down_everything() {
        let store = InMemoryTickerStore::new();
        let (m, books, market_data) = manager(store.clone());
        m.add_ticker(Ticker::new("ABC", "Abc Corp")).unwrap();
        let sym = Symbol::from("ABC");
        books.get_or_create_order_book(&sym).add_order(Order::at(
            OrderId(1),
            "u",
            "ABC",
            Side::Buy,
            OrderType::Limit,
            Decimal::from(10),
            Decimal::from(1),
            1,
        ));
        assert!(m.remove_ticker(&sym).unwrap());
        assert!(!m.is_active(&sym));
        assert!(books.get_order_book(&sym).is_none());
        assert!(market_data.get(&sym).is_none());
        assert!(store.list_tickers().unwrap().is_empty());
        assert!(!m.remove_ticker(&sym).unwrap());
    }

    #[test]
    fn load_tickers_reactivates_stored_symbols() {
        let store = InMemoryTickerStore::new();
        store.save_ticker(&Ticker::new("ABC", "Abc")).unwrap();
        store.save_ticker(&Ticker::new("XYZ", "Xyz")).unwrap();
        let (m, books, market_data) = manager(store);
        assert_eq!(m.load_tickers().unwrap(), 2);
        let symbols: Vec<Symbol> = m.list_tickers().into_iter().map(|t| t.symbol).collect();
        assert_eq!(symbols, vec![Symbol::from("ABC"), Symbol::from("XYZ")]);
        assert_eq!(books.symbols().len(), 2);
        assert!(market_data.get(&Symbol::from("XYZ")).is_some());
    }

    #[test]
    fn json_store_round_trips_through_file() {
        let path = std::env::temp_dir().join(format!("tickers-{}-{}.json", std::process::id(), now_millis()));
        let store = JsonFileTickerStore::new(&path);
        assert!(store.list_tickers().unwrap().is_empty());
        store.save_ticker(&Ticker::new("ABC", "Abc")).unwrap();
        store.save_ticker(&Ticker::new("XYZ", "Xyz")).unwrap();
        store.save_ticker(&Ticker::new("ABC", "Abc Renamed")).unwrap();
        let reopened = JsonFileTickerStore::new(&path);
        let tickers = reopened.list_tickers().unwrap();
        assert_eq!(tickers.len(), 2);
        assert_eq!(tickers[0].name, "Abc Renamed");
        reopened.delete_ticker(&Symbol::from("ABC")).unwrap();
        assert_eq!(store.list_tickers().unwrap(), vec![Ticker::new("XYZ", "Xyz")]);
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn json_store_rejects_corrupt_file() {
        let path = std::env::temp_dir().join(format!("tickers-bad-{}-{}.json", std::process::id(), now_millis()));
        std::fs::write(&path, "not json").unwrap();
        let store = JsonFileTickerStore::new(&path);
        assert!(matches!(store.list_tickers(), Err(crate::error::EngineError::Json(_))));
        let _ = std::fs::remove_file(&path);
    }
}
