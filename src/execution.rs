//! Trades produced by matching.
//!
//! A [`Trade`] is emitted for each match between a buy and a sell. The engine never
//! reads a trade back once it is handed to the caller.

use crate::types::{OrderId, Side, Symbol};
use rust_decimal::Decimal;

/// One fill between a buy order and a sell order.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub buy_order_id: OrderId,
    pub sell_order_id: OrderId,
    pub symbol: Symbol,
    pub quantity: Decimal,
    pub price: Decimal,
    /// Unix millis.
    pub timestamp: u64,
    /// Side of the order that took liquidity.
    pub aggressor_side: Side,
}
