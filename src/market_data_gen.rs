//! Synthetic market data.
//!
//! [`Generator`] is a deterministic, configurable order stream for replay tests,
//! demos, and benchmarks: same seed ⇒ same sequence of orders. [`PriceWalk`] is the
//! bounded random walk behind the per-symbol synthetic trade feed (see [`crate::feed`]).

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::config::EngineConfig;
use crate::engine::Engine;
use crate::market_data::TradeTick;
use crate::types::{Order, OrderId, OrderType, Side, Symbol};

/// Configuration for the synthetic order generator.
/// All ranges are inclusive. Same config + seed produces the same stream.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// RNG seed. Same seed ⇒ same order stream.
    pub seed: u64,
    /// Symbol for all generated orders.
    pub symbol: Symbol,
    /// Number of orders produced by [`Generator::all_orders`].
    pub num_orders: usize,
    /// Probability of Buy (0.0..=1.0). Sell otherwise.
    pub buy_ratio: f64,
    /// Probability of a limit order, then of a market order; stop otherwise.
    pub limit_ratio: f64,
    pub market_ratio: f64,
    /// Price range (inclusive) for limit and stop orders. Market orders carry price 0.
    pub price_min: i64,
    pub price_max: i64,
    /// Quantity range (inclusive), whole units.
    pub quantity_min: u64,
    pub quantity_max: u64,
    /// Number of distinct users (`user1..=userN`).
    pub num_users: u64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            symbol: Symbol::from("SIM"),
            num_orders: 1000,
            buy_ratio: 0.5,
            limit_ratio: 0.8,
            market_ratio: 0.1,
            price_min: 95,
            price_max: 105,
            quantity_min: 1,
            quantity_max: 100,
            num_users: 5,
        }
    }
}

/// Deterministic order stream. Create with [`Generator::new`]; pull orders with
/// [`Generator::next_order`].
pub struct Generator {
    rng: StdRng,
    config: GeneratorConfig,
    next_order_id: u64,
    next_timestamp: u64,
}

impl Generator {
    /// Builds a generator with the given config. Same config (including seed) ⇒ same stream.
    pub fn new(config: GeneratorConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            rng,
            config,
            next_order_id: 1,
            next_timestamp: 1,
        }
    }

    /// Generates the next order. Advances internal state (order id, timestamp, RNG).
    pub fn next_order(&mut self) -> Order {
        let order_id = OrderId(self.next_order_id);
        self.next_order_id += 1;
        let side = if self.rng.gen::<f64>() < self.config.buy_ratio {
            Side::Buy
        } else {
            Side::Sell
        };
        let r = self.rng.gen::<f64>();
        let order_type = if r < self.config.limit_ratio {
            OrderType::Limit
        } else if r < self.config.limit_ratio + self.config.market_ratio {
            OrderType::Market
        } else {
            OrderType::Stop
        };
        let quantity = Decimal::from(
            self.rng
                .gen_range(self.config.quantity_min.max(1)..=self.config.quantity_max.max(1)),
        );
        let price = match order_type {
            OrderType::Market => Decimal::ZERO,
            _ => Decimal::from(
                self.rng
                    .gen_range(self.config.price_min..=self.config.price_max),
            ),
        };
        let timestamp = self.next_timestamp;
        self.next_timestamp += 1;
        let user = format!(
            "user{}",
            self.rng.gen_range(1..=self.config.num_users.max(1))
        );
        Order::at(
            order_id,
            user,
            self.config.symbol.clone(),
            side,
            order_type,
            price,
            quantity,
            timestamp,
        )
    }

    /// Returns exactly `n` orders. Advances the generator state.
    pub fn take_orders(&mut self, n: usize) -> Vec<Order> {
        (0..n).map(|_| self.next_order()).collect()
    }

    /// Returns the full stream of orders as defined by `config.num_orders`.
    pub fn all_orders(&mut self) -> Vec<Order> {
        self.take_orders(self.config.num_orders)
    }
}

/// Replays a sequence of orders into the engine. Returns the total number of trades,
/// including trades from triggered stop orders.
pub fn replay_into_engine(engine: &Engine, orders: impl IntoIterator<Item = Order>) -> usize {
    orders
        .into_iter()
        .map(|order| engine.submit_order(order).len())
        .sum()
}

/// Bounded random walk that produces synthetic trade ticks.
///
/// Each step moves the price by up to `max_step` in 0.01 increments and clamps it to
/// `[min, max]`. Quantity is 1..=10 and the side is a coin flip.
#[derive(Debug)]
pub struct PriceWalk {
    rng: StdRng,
    price: Decimal,
    min: Decimal,
    max: Decimal,
    step_cents: i64,
}

impl PriceWalk {
    pub fn new(seed: u64, open: Decimal, min: Decimal, max: Decimal, max_step: Decimal) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), open, min, max, max_step)
    }

    /// Walk described by the feed settings of `config`; seeded from entropy unless
    /// `feed_seed` is set.
    pub fn from_config(config: &EngineConfig) -> Self {
        let rng = match config.feed_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Self::with_rng(
            rng,
            config.feed_open_price,
            config.feed_min_price,
            config.feed_max_price,
            config.feed_max_step,
        )
    }

    fn with_rng(rng: StdRng, open: Decimal, min: Decimal, max: Decimal, max_step: Decimal) -> Self {
        let step_cents = (max_step.abs() * Decimal::ONE_HUNDRED)
            .round()
            .to_i64()
            .unwrap_or(100);
        Self {
            rng,
            price: open.clamp(min, max),
            min,
            max,
            step_cents,
        }
    }

    pub fn price(&self) -> Decimal {
        self.price
    }

    /// Advances the walk one step and returns the resulting tick stamped `now`.
    pub fn next_tick(&mut self, now: u64) -> TradeTick {
        let cents = self.rng.gen_range(-self.step_cents..=self.step_cents);
        self.price = (self.price + Decimal::new(cents, 2)).clamp(self.min, self.max);
        let side = if self.rng.gen::<bool>() {
            Side::Buy
        } else {
            Side::Sell
        };
        TradeTick {
            price: self.price,
            quantity: Decimal::from(self.rng.gen_range(1..=10u32)),
            side,
            timestamp: now,
        }
    }
}
