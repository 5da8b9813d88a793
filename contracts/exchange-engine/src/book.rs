use std::cmp::Ordering;
use std::collections::VecDeque;
use std::sync::Arc;

use dashmap::DashMap;
use exchange_core::{Order, Side, Symbol};
use parking_lot::Mutex;

/// One side of one symbol's resting orders, kept in priority order
/// (§4.4.2) with the highest-priority order at the front.
#[derive(Default)]
pub struct BookSide {
    orders: VecDeque<Order>,
}

impl BookSide {
    pub fn head(&self) -> Option<&Order> {
        self.orders.front()
    }

    pub fn head_mut(&mut self) -> Option<&mut Order> {
        self.orders.front_mut()
    }

    pub fn pop_head(&mut self) -> Option<Order> {
        self.orders.pop_front()
    }

    /// Inserts `order` at its priority position (§4.4.2). Re-sorts the
    /// (typically short) deque rather than binary-searching: resting
    /// depth per symbol/side is not expected to be large enough to
    /// justify a tree structure, and a stable sort preserves FIFO among
    /// equal-priority limit orders.
    pub fn insert(&mut self, order: Order) {
        self.orders.push_back(order);
        let mut as_vec: Vec<Order> = self.orders.drain(..).collect();
        as_vec.sort_by(priority_cmp);
        self.orders = as_vec.into();
    }

    pub fn remove_cancelled(&mut self, order_id: u64) -> Option<Order> {
        let pos = self.orders.iter().position(|o| o.id == order_id)?;
        self.orders.remove(pos)
    }

    pub fn len(&self) -> usize {
        self.orders.len()
    }

    pub fn is_empty(&self) -> bool {
        self.orders.is_empty()
    }
}

/// Orders more in front of the deque sort earlier (`Ordering::Less`).
///
/// §4.4.2, preserved per §9's "order comparator oddity": two market
/// orders compare by **later** `created` first (LIFO), which is
/// inconsistent with the FIFO tie-break used everywhere else in this
/// function. This is legacy behavior, not a bug to fix.
fn priority_cmp(a: &Order, b: &Order) -> Ordering {
    match (a.is_market(), b.is_market()) {
        (true, true) => b.created.cmp(&a.created),
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (false, false) => match a.side {
            Side::Buy => a
                .price
                .cmp(&b.price)
                .reverse()
                .then_with(|| a.created.cmp(&b.created)),
            Side::Sell => a.price.cmp(&b.price).then_with(|| a.created.cmp(&b.created)),
        },
    }
}

/// Two orders cross when opposite-sided AND (either is market) OR
/// (buy.price ≥ sell.price) (§4.4.3).
pub fn crosses(buy: &Order, sell: &Order) -> bool {
    buy.is_market() || sell.is_market() || buy.price >= sell.price
}

/// One symbol's full book: a buy side and a sell side, each with its own
/// priority ordering (§4.4.6 "per-symbol concurrency" — the whole struct
/// is the critical section, guarded by the directory's per-symbol mutex).
#[derive(Default)]
pub struct OrderBook {
    pub buys: BookSide,
    pub sells: BookSide,
}

impl OrderBook {
    pub fn side(&self, side: Side) -> &BookSide {
        match side {
            Side::Buy => &self.buys,
            Side::Sell => &self.sells,
        }
    }

    pub fn side_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.buys,
            Side::Sell => &mut self.sells,
        }
    }

    pub fn opposite_mut(&mut self, side: Side) -> &mut BookSide {
        match side {
            Side::Buy => &mut self.sells,
            Side::Sell => &mut self.buys,
        }
    }
}

/// Symbol → shard directory (§5, ambient stack note on concurrency).
/// `DashMap` so opening a new symbol's book never blocks matching on
/// another symbol; each shard's own `Mutex` is the exclusive-writer lock
/// §4.4.6 requires.
#[derive(Default)]
pub struct BookDirectory {
    shards: DashMap<Symbol, Arc<Mutex<OrderBook>>>,
}

impl BookDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shard_for(&self, symbol: &Symbol) -> Arc<Mutex<OrderBook>> {
        self.shards
            .entry(symbol.clone())
            .or_insert_with(|| Arc::new(Mutex::new(OrderBook::default())))
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use exchange_core::{AccountId, BrokerId, OrderType};

    fn limit(id: u64, side: Side, price: i64, created: u64) -> Order {
        Order::new(
            id,
            AccountId(1),
            AccountId(1),
            BrokerId(1),
            Symbol::new("BTCUSD"),
            side,
            OrderType::Limit,
            price,
            100_000_000,
            0,
            None,
            created,
        )
    }

    fn market(id: u64, side: Side, created: u64) -> Order {
        Order::new(
            id,
            AccountId(1),
            AccountId(1),
            BrokerId(1),
            Symbol::new("BTCUSD"),
            side,
            OrderType::Market,
            0,
            100_000_000,
            0,
            None,
            created,
        )
    }

    #[test]
    fn limit_buys_are_highest_price_first() {
        let mut side = BookSide::default();
        side.insert(limit(1, Side::Buy, 400, 1));
        side.insert(limit(2, Side::Buy, 450, 2));
        assert_eq!(side.head().unwrap().id, 2);
    }

    #[test]
    fn limit_sells_are_lowest_price_first() {
        let mut side = BookSide::default();
        side.insert(limit(1, Side::Sell, 450, 1));
        side.insert(limit(2, Side::Sell, 400, 2));
        assert_eq!(side.head().unwrap().id, 2);
    }

    #[test]
    fn markets_precede_limits_and_tie_break_lifo() {
        let mut side = BookSide::default();
        side.insert(limit(1, Side::Buy, 450, 1));
        side.insert(market(2, Side::Buy, 2));
        side.insert(market(3, Side::Buy, 3));
        assert_eq!(side.head().unwrap().id, 3, "newer market order wins per §9");
    }

    #[test]
    fn crossing_requires_marketable_or_price_overlap() {
        let buy = limit(1, Side::Buy, 400, 1);
        let sell = limit(2, Side::Sell, 401, 2);
        assert!(!crosses(&buy, &sell));
        let sell2 = limit(3, Side::Sell, 400, 3);
        assert!(crosses(&buy, &sell2));
    }
}
