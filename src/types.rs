//! Core types and IDs for the matching engine.
//!
//! All identifiers are newtype wrappers. [`Order`], [`Side`], [`OrderType`], and
//! [`OrderStatus`] define the order message and its lifecycle inside a book.

use rust_decimal::Decimal;
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Unique order identifier, assigned by the caller.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct OrderId(pub u64);

/// Ticker symbol, e.g. `"RELIANCE"`. One order book and one market-data cache per symbol.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, serde::Serialize, serde::Deserialize)]
pub struct Symbol(pub String);

impl Symbol {
    pub fn new(s: impl Into<String>) -> Self {
        Symbol(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Symbol {
    fn from(s: &str) -> Self {
        Symbol(s.to_string())
    }
}

impl From<String> for Symbol {
    fn from(s: String) -> Self {
        Symbol(s)
    }
}

/// Order side.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn opposite(self) -> Side {
        match self {
            Side::Buy => Side::Sell,
            Side::Sell => Side::Buy,
        }
    }
}

/// Order type.
///
/// `Market` never rests; `Limit` rests until filled or removed; `Stop` waits in the
/// book's stop list until a trade price crosses its trigger, then becomes `Market`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Market,
    Limit,
    Stop,
}

/// Lifecycle status of the engine's own copy of an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum OrderStatus {
    Open,
    PartiallyFilled,
    Filled,
    /// Stop order whose trigger was crossed; now handled as a market order.
    Triggered,
    Canceled,
}

/// Order message.
///
/// `quantity` is the *remaining* quantity and shrinks as the order is filled;
/// `original_quantity` is the submitted size and never changes. For market orders
/// `price` is advisory and ignored by matching; for stop orders it is the trigger.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub order_id: OrderId,
    pub user: String,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub price: Decimal,
    pub original_quantity: Decimal,
    pub quantity: Decimal,
    pub status: OrderStatus,
    /// Unix millis. Earlier wins among same-priced resting orders.
    pub created_at: u64,
    pub updated_at: u64,
}

impl Order {
    /// Builds an open order stamped with the current time.
    pub fn new(
        order_id: OrderId,
        user: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        order_type: OrderType,
        price: Decimal,
        quantity: Decimal,
    ) -> Self {
        let now = now_millis();
        Self {
            order_id,
            user: user.into(),
            symbol: symbol.into(),
            side,
            order_type,
            price,
            original_quantity: quantity,
            quantity,
            status: OrderStatus::Open,
            created_at: now,
            updated_at: now,
        }
    }

    /// Same as [`Order::new`] with an explicit creation time (replay, tests).
    #[allow(clippy::too_many_arguments)]
    pub fn at(
        order_id: OrderId,
        user: impl Into<String>,
        symbol: impl Into<Symbol>,
        side: Side,
        order_type: OrderType,
        price: Decimal,
        quantity: Decimal,
        created_at: u64,
    ) -> Self {
        let mut order = Self::new(order_id, user, symbol, side, order_type, price, quantity);
        order.created_at = created_at;
        order.updated_at = created_at;
        order
    }

    pub fn is_limit(&self) -> bool {
        matches!(self.order_type, OrderType::Limit)
    }

    pub fn is_market(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }

    pub fn is_stop(&self) -> bool {
        matches!(self.order_type, OrderType::Stop)
    }

    pub fn filled_quantity(&self) -> Decimal {
        self.original_quantity - self.quantity
    }

    /// Reduces remaining quantity by `qty` and updates status accordingly.
    pub(crate) fn fill(&mut self, qty: Decimal, now: u64) {
        self.quantity -= qty;
        self.status = if self.quantity <= Decimal::ZERO {
            OrderStatus::Filled
        } else {
            OrderStatus::PartiallyFilled
        };
        self.updated_at = now;
    }
}

/// Current wall-clock time as Unix milliseconds.
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Start of the minute containing `ts` (Unix millis).
pub fn minute_start(ts: u64) -> u64 {
    ts - ts % 60_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_order_starts_open_with_full_quantity() {
        let o = Order::new(
            OrderId(1),
            "alice",
            "ABC",
            Side::Buy,
            OrderType::Limit,
            Decimal::from(100),
            Decimal::from(10),
        );
        assert_eq!(o.status, OrderStatus::Open);
        assert_eq!(o.original_quantity, o.quantity);
        assert_eq!(o.filled_quantity(), Decimal::ZERO);
        assert!(o.is_limit());
    }

    #[test]
    fn fill_tracks_remaining_and_status() {
        let mut o = Order::at(
            OrderId(1),
            "alice",
            "ABC",
            Side::Sell,
            OrderType::Limit,
            Decimal::from(100),
            Decimal::from(10),
            5,
        );
        o.fill(Decimal::from(4), 6);
        assert_eq!(o.quantity, Decimal::from(6));
        assert_eq!(o.original_quantity, Decimal::from(10));
        assert_eq!(o.status, OrderStatus::PartiallyFilled);
        o.fill(Decimal::from(6), 7);
        assert_eq!(o.status, OrderStatus::Filled);
        assert_eq!(o.updated_at, 7);
    }

    #[test]
    fn minute_start_truncates() {
        assert_eq!(minute_start(125_000), 120_000);
        assert_eq!(minute_start(120_000), 120_000);
        assert_eq!(minute_start(59_999), 0);
    }
}
