//! # Tickbook Engine
//!
//! In-memory continuous double-auction matching engine for many symbols: per-symbol
//! order books with price-time priority, stop orders released by trade prices, and a
//! simulated market-data feed.
//!
//! ## Entry point
//!
//! Use [`Engine`] as the single entry point: create with [`Engine::new`], activate
//! symbols with [`Engine::activate_symbol`], then send orders with
//! [`Engine::submit_order`].
//!
//! ## Example
//!
//! ```rust
//! use tickbook_engine::{Engine, EngineConfig, Order, OrderId, OrderType, Side, Symbol, Ticker};
//! use rust_decimal::Decimal;
//!
//! let engine = Engine::new(EngineConfig { feed_enabled: false, ..Default::default() });
//! engine.activate_symbol(Ticker::new("ABC", "Abc Corp")).unwrap();
//!
//! let sell = Order::new(OrderId(1), "alice", "ABC", Side::Sell, OrderType::Limit,
//!     Decimal::from(100), Decimal::from(10));
//! assert!(engine.submit_order(sell).is_empty());
//!
//! let buy = Order::new(OrderId(2), "bob", "ABC", Side::Buy, OrderType::Market,
//!     Decimal::ZERO, Decimal::from(4));
//! let trades = engine.submit_order(buy);
//! assert_eq!(trades.len(), 1);
//! assert_eq!(trades[0].price, Decimal::from(100));
//!
//! let snapshot = engine.market_snapshot(&Symbol::from("ABC")).unwrap();
//! assert_eq!(snapshot.last_price, Some(Decimal::from(100)));
//! ```
//!
//! ## Lower-level API
//!
//! [`OrderBookManager`] and [`OrderBook`] can be used directly when the caller drives
//! the stop cascade and market-data updates itself.

pub mod config;
pub mod engine;
pub mod error;
pub mod execution;
pub mod feed;
pub mod manager;
pub mod market_data;
pub mod market_data_gen;
pub mod matching;
pub mod order_book;
pub mod order_queue;
pub mod ticker;
pub mod types;

pub use config::EngineConfig;
pub use engine::Engine;
pub use error::{EngineError, EngineResult};
pub use execution::Trade;
pub use feed::{spawn_price_feed, FeedHandle};
pub use manager::OrderBookManager;
pub use market_data::{MarketDataCache, MarketDataStore, MarketSnapshot, Ohlc, TradeTick};
pub use market_data_gen::{replay_into_engine, Generator, GeneratorConfig, PriceWalk};
pub use matching::{maker_price, Cross};
pub use order_book::{DepthLevel, DepthSnapshot, OrderBook};
pub use order_queue::{AskQueue, BidQueue, OrderQueue};
pub use ticker::{InMemoryTickerStore, JsonFileTickerStore, Ticker, TickerManager, TickerStore};
pub use types::{OrderId, Order, OrderStatus, OrderType, Side, Symbol};
