//! Background synthetic price feed, one task per active symbol.
//!
//! The task wakes on a fixed interval, advances a [`PriceWalk`], and records the
//! resulting tick into the symbol's [`MarketDataCache`]. It touches nothing but the
//! cache, so it never contends with matching. It stops when its [`FeedHandle`] is
//! stopped or dropped.

use crate::market_data::MarketDataCache;
use crate::market_data_gen::PriceWalk;
use crate::types::{now_millis, Symbol};
use log::debug;
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// Owner of a running feed task.
#[derive(Debug)]
pub struct FeedHandle {
    symbol: Symbol,
    stop_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl FeedHandle {
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Signals the task to exit after its current tick.
    pub fn stop(&self) {
        let _ = self.stop_tx.send(true);
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for FeedHandle {
    fn drop(&mut self) {
        let _ = self.stop_tx.send(true);
    }
}

/// Spawns the feed for `cache` on `runtime`. The first tick is recorded immediately.
pub fn spawn_price_feed(
    runtime: &Handle,
    cache: Arc<MarketDataCache>,
    walk: PriceWalk,
    interval: Duration,
) -> FeedHandle {
    let (stop_tx, mut stop_rx) = watch::channel(false);
    let symbol = cache.symbol().clone();
    let task_symbol = symbol.clone();
    let task = runtime.spawn(async move {
        let mut walk = walk;
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        debug!("price feed started symbol={} interval_ms={}", task_symbol, interval.as_millis());
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    cache.record(walk.next_tick(now_millis()));
                }
                changed = stop_rx.changed() => {
                    if changed.is_err() || *stop_rx.borrow() {
                        break;
                    }
                }
            }
        }
        debug!("price feed stopped symbol={}", task_symbol);
    });
    FeedHandle {
        symbol,
        stop_tx,
        task,
    }
}
