//! Demo runner for the matching engine.
//!
//! Reloads tickers from `TICKERS_PATH` (or activates `DEMO_SYMBOL`), replays a seeded
//! order stream, and logs depth and market data while the synthetic feed runs for
//! `DEMO_SECONDS`.

use std::time::Duration;

use log::{error, info, warn};
use tickbook_engine::market_data_gen::{replay_into_engine, Generator, GeneratorConfig};
use tickbook_engine::{Engine, EngineConfig, Symbol, Ticker};

#[tokio::main]
async fn main() {
    let _ = env_logger::try_init();
    let config = EngineConfig::from_env();
    let symbol = Symbol::new(std::env::var("DEMO_SYMBOL").unwrap_or_else(|_| "SIM".into()));
    let seconds: u64 = std::env::var("DEMO_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(5);
    let seed: u64 = std::env::var("DEMO_SEED")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(42);

    let engine = Engine::new(config);
    if let Err(e) = engine.load_tickers() {
        warn!("could not reload tickers error={}", e);
    }
    if !engine.tickers().is_active(&symbol) {
        if let Err(e) = engine.activate_symbol(Ticker::new(symbol.clone(), "Simulated")) {
            error!("failed to activate symbol={} error={}", symbol, e);
            return;
        }
    }

    let orders = Generator::new(GeneratorConfig {
        seed,
        symbol: symbol.clone(),
        num_orders: 500,
        ..Default::default()
    })
    .all_orders();
    let trades = replay_into_engine(&engine, orders);
    let depth = engine.market_depth(&symbol, 5);
    info!(
        "replay done symbol={} trades={} bid_levels={} ask_levels={}",
        symbol,
        trades,
        depth.bids.len(),
        depth.asks.len()
    );

    for _ in 0..seconds {
        tokio::time::sleep(Duration::from_secs(1)).await;
        if let Some(snap) = engine.market_snapshot(&symbol) {
            info!(
                "market symbol={} last={:?} open={} high={} low={} close={} volume={} tape={}",
                snap.symbol,
                snap.last_price,
                snap.ohlc.open,
                snap.ohlc.high,
                snap.ohlc.low,
                snap.ohlc.close,
                snap.ohlc.volume,
                snap.recent_trades.len()
            );
        }
    }
    engine.shutdown();
}
