//! Price-time priority matching.
//!
//! [`cross_book`] drains crossing bid/ask pairs from one book until the best bid is
//! below the best ask. [`sweep_book`] walks the opposite side for a marketable order
//! that must never rest: it fills what it can and drops the rest.
//!
//! Both run on the book state with the book's write lock already held.

use crate::execution::Trade;
use crate::order_book::BookSides;
use crate::order_queue::{OrderQueue, QueuePriority};
use crate::types::{Order, Side, Symbol};
use log::debug;
use rust_decimal::Decimal;

/// How the two sides of a fill met.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cross {
    /// Both orders were resting in the book.
    BookVsBook,
    /// A marketable order on the given side took resting liquidity.
    Taker(Side),
}

/// Execution price of a fill: the price of the order that was resting first.
///
/// Between two resting orders the ask counts as the earlier one, so the ask price is
/// used regardless of which order arrived last. A taker always trades at the price of
/// the resting order it hits.
pub fn maker_price(cross: Cross, bid_price: Decimal, ask_price: Decimal) -> Decimal {
    match cross {
        Cross::BookVsBook => ask_price,
        Cross::Taker(Side::Buy) => ask_price,
        Cross::Taker(Side::Sell) => bid_price,
    }
}

/// Crosses best bid against best ask until nothing crosses. `aggressor` is recorded on
/// each trade (the side of the order that was just added).
pub(crate) fn cross_book(
    state: &mut BookSides,
    symbol: &Symbol,
    aggressor: Side,
    now: u64,
) -> Vec<Trade> {
    let mut trades = Vec::new();
    loop {
        let (bid, ask) = match (state.bids.peek(), state.asks.peek()) {
            (Some(bid), Some(ask)) => (bid, ask),
            _ => break,
        };
        if bid.price < ask.price {
            break;
        }
        let qty = bid.quantity.min(ask.quantity);
        let trade = Trade {
            buy_order_id: bid.order_id,
            sell_order_id: ask.order_id,
            symbol: symbol.clone(),
            quantity: qty,
            price: maker_price(Cross::BookVsBook, bid.price, ask.price),
            timestamp: now,
            aggressor_side: aggressor,
        };
        debug!(
            "cross symbol={} buy_order={} sell_order={} price={} quantity={}",
            symbol, trade.buy_order_id.0, trade.sell_order_id.0, trade.price, trade.quantity
        );
        trades.push(trade);
        state.bids.fill_front(qty, now);
        state.asks.fill_front(qty, now);
    }
    trades
}

/// Matches a marketable order against the opposite side, best first. The incoming
/// order is never pushed onto a heap; any unfilled remainder is discarded.
pub(crate) fn sweep_book(
    state: &mut BookSides,
    symbol: &Symbol,
    order: &Order,
    now: u64,
) -> Vec<Trade> {
    let trades = match order.side {
        Side::Buy => sweep_side(&mut state.asks, symbol, order, now),
        Side::Sell => sweep_side(&mut state.bids, symbol, order, now),
    };
    let filled: Decimal = trades.iter().map(|t| t.quantity).sum();
    if filled < order.quantity {
        debug!(
            "market order remainder dropped order_id={} symbol={} unfilled={}",
            order.order_id.0,
            symbol,
            order.quantity - filled
        );
    }
    trades
}

fn sweep_side<P: QueuePriority>(
    resting: &mut OrderQueue<P>,
    symbol: &Symbol,
    order: &Order,
    now: u64,
) -> Vec<Trade> {
    let mut trades = Vec::new();
    let mut remaining = order.quantity;
    while remaining > Decimal::ZERO {
        let Some(maker) = resting.peek() else {
            break;
        };
        let qty = remaining.min(maker.quantity);
        let (buy_order_id, sell_order_id, bid_price, ask_price) = match order.side {
            Side::Buy => (order.order_id, maker.order_id, order.price, maker.price),
            Side::Sell => (maker.order_id, order.order_id, maker.price, order.price),
        };
        trades.push(Trade {
            buy_order_id,
            sell_order_id,
            symbol: symbol.clone(),
            quantity: qty,
            price: maker_price(Cross::Taker(order.side), bid_price, ask_price),
            timestamp: now,
            aggressor_side: order.side,
        });
        remaining -= qty;
        resting.fill_front(qty, now);
    }
    trades
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::order_book::OrderBook;
    use crate::types::{OrderId, OrderType};

    fn order(id: u64, side: Side, order_type: OrderType, price: i64, qty: i64, t: u64) -> Order {
        Order::at(
            OrderId(id),
            "u",
            "ABC",
            side,
            order_type,
            Decimal::from(price),
            Decimal::from(qty),
            t,
        )
    }

    fn limit(id: u64, side: Side, price: i64, qty: i64, t: u64) -> Order {
        order(id, side, OrderType::Limit, price, qty, t)
    }

    #[test]
    fn maker_price_rule() {
        let bid = Decimal::from(105);
        let ask = Decimal::from(100);
        assert_eq!(maker_price(Cross::BookVsBook, bid, ask), ask);
        assert_eq!(maker_price(Cross::Taker(Side::Buy), bid, ask), ask);
        assert_eq!(maker_price(Cross::Taker(Side::Sell), bid, ask), bid);
    }

    #[test]
    fn no_cross_when_bid_below_ask() {
        let book = OrderBook::new(Symbol::from("ABC"));
        book.add_order(limit(1, Side::Sell, 101, 5, 1));
        let trades = book.add_order_and_match(limit(2, Side::Buy, 100, 5, 2));
        assert!(trades.is_empty());
        assert_eq!(book.resting_len(), 2);
    }

    #[test]
    fn resting_cross_uses_ask_price_even_when_buy_rested_first() {
        let book = OrderBook::new(Symbol::from("ABC"));
        book.add_order(limit(1, Side::Buy, 105, 5, 1));
        let trades = book.add_order_and_match(limit(2, Side::Sell, 100, 5, 2));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Decimal::from(100));
        assert_eq!(trades[0].buy_order_id, OrderId(1));
        assert_eq!(trades[0].sell_order_id, OrderId(2));
        assert_eq!(trades[0].aggressor_side, Side::Sell);
    }

    #[test]
    fn same_price_bids_fill_in_time_order() {
        let book = OrderBook::new(Symbol::from("ABC"));
        book.add_order(limit(1, Side::Buy, 50, 10, 1));
        book.add_order(limit(2, Side::Buy, 50, 10, 2));
        let trades = book.add_order_and_match(limit(3, Side::Sell, 50, 15, 3));
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].buy_order_id, OrderId(1));
        assert_eq!(trades[0].quantity, Decimal::from(10));
        assert_eq!(trades[1].buy_order_id, OrderId(2));
        assert_eq!(trades[1].quantity, Decimal::from(5));
        let rest = book.best_bid().unwrap();
        assert_eq!(rest.order_id, OrderId(2));
        assert_eq!(rest.quantity, Decimal::from(5));
        assert_eq!(rest.original_quantity, Decimal::from(10));
        assert!(book.best_ask().is_none());
    }

    #[test]
    fn crossing_runs_to_exhaustion() {
        let book = OrderBook::new(Symbol::from("ABC"));
        book.add_order(limit(1, Side::Sell, 100, 3, 1));
        book.add_order(limit(2, Side::Sell, 101, 3, 2));
        book.add_order(limit(3, Side::Sell, 103, 3, 3));
        let trades = book.add_order_and_match(limit(4, Side::Buy, 102, 10, 4));
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].price, Decimal::from(100));
        assert_eq!(trades[1].price, Decimal::from(101));
        let bid = book.best_bid().unwrap();
        let ask = book.best_ask().unwrap();
        assert_eq!(bid.quantity, Decimal::from(4));
        assert!(bid.price < ask.price);
    }

    #[test]
    fn market_buy_walks_asks_and_drops_nothing_on_full_fill() {
        let book = OrderBook::new(Symbol::from("ABC"));
        book.add_order(limit(1, Side::Sell, 100, 5, 1));
        book.add_order(limit(2, Side::Sell, 101, 5, 2));
        let trades = book.match_market_order(&order(3, Side::Buy, OrderType::Market, 0, 7, 3));
        assert_eq!(trades.len(), 2);
        assert_eq!((trades[0].quantity, trades[0].price), (Decimal::from(5), Decimal::from(100)));
        assert_eq!((trades[1].quantity, trades[1].price), (Decimal::from(2), Decimal::from(101)));
        let asks = book.ask_orders();
        assert_eq!(asks.len(), 1);
        assert_eq!(asks[0].price, Decimal::from(101));
        assert_eq!(asks[0].quantity, Decimal::from(3));
        assert!(book.best_bid().is_none(), "market order must never rest");
    }

    #[test]
    fn market_sell_trades_at_resting_bid_and_drops_remainder() {
        let book = OrderBook::new(Symbol::from("ABC"));
        book.add_order(limit(1, Side::Buy, 99, 4, 1));
        let trades = book.match_market_order(&order(2, Side::Sell, OrderType::Market, 1, 10, 2));
        assert_eq!(trades.len(), 1);
        assert_eq!(trades[0].price, Decimal::from(99));
        assert_eq!(trades[0].quantity, Decimal::from(4));
        assert_eq!(trades[0].buy_order_id, OrderId(1));
        assert_eq!(trades[0].sell_order_id, OrderId(2));
        assert_eq!(book.resting_len(), 0);
    }

    #[test]
    fn market_order_on_empty_side_produces_nothing() {
        let book = OrderBook::new(Symbol::from("ABC"));
        let trades = book.match_market_order(&order(1, Side::Buy, OrderType::Market, 0, 5, 1));
        assert!(trades.is_empty());
        assert_eq!(book.resting_len(), 0);
    }
}
