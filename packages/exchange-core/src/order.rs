use crate::ids::{AccountId, BrokerId, Symbol};

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OrderType {
    Market,
    Limit,
}

/// Order status (§4.4.5). Numeric wire values match the source schema
/// (`'0' '1' '2' '4'`) so events/persistence round-trip the same codes.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum OrderStatus {
    New = 0,
    Partial = 1,
    Filled = 2,
    Cancelled = 4,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Order {
    pub id: u64,
    pub user_id: AccountId,
    pub account_id: AccountId,
    pub broker_id: BrokerId,
    pub client_order_id: Option<String>,
    pub status: OrderStatus,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub price: i64,
    pub order_qty: i64,
    pub cum_qty: i64,
    pub leaves_qty: i64,
    pub cxl_qty: i64,
    pub last_price: i64,
    pub last_qty: i64,
    pub average_price: i64,
    /// Trading fee, in basis points (1 bp = 0.01%).
    pub fee_bps: i64,
    pub created: u64,
}

impl Order {
    pub fn new(
        id: u64,
        user_id: AccountId,
        account_id: AccountId,
        broker_id: BrokerId,
        symbol: Symbol,
        side: Side,
        order_type: OrderType,
        price: i64,
        order_qty: i64,
        fee_bps: i64,
        client_order_id: Option<String>,
        created: u64,
    ) -> Self {
        Self {
            id,
            user_id,
            account_id,
            broker_id,
            client_order_id,
            status: OrderStatus::New,
            symbol,
            side,
            order_type,
            price,
            order_qty,
            cum_qty: 0,
            leaves_qty: order_qty,
            cxl_qty: 0,
            last_price: 0,
            last_qty: 0,
            average_price: 0,
            fee_bps,
            created,
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self.side, Side::Buy)
    }

    pub fn is_sell(&self) -> bool {
        matches!(self.side, Side::Sell)
    }

    pub fn is_market(&self) -> bool {
        matches!(self.order_type, OrderType::Market)
    }

    pub fn has_leaves(&self) -> bool {
        self.leaves_qty > 0
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.status, OrderStatus::Cancelled)
    }

    /// Invariant O1 (§3): `order_qty == cum_qty + leaves_qty + cxl_qty`.
    pub fn conserves_quantity(&self) -> bool {
        self.order_qty == self.cum_qty + self.leaves_qty + self.cxl_qty
    }

    /// Applies a fill of `qty` at `price` (§4.4.5): updates `cum_qty`,
    /// `leaves_qty`, `last_price`/`last_qty`, the running `average_price`,
    /// and `status`.
    pub fn execute(&mut self, qty: i64, price: i64) {
        let new_cum = self.cum_qty + qty;
        self.average_price = if new_cum == 0 {
            0
        } else {
            ((price as i128) * (qty as i128) + (self.cum_qty as i128) * (self.average_price as i128))
                / (new_cum as i128)
        } as i64;
        self.cum_qty = new_cum;
        self.leaves_qty -= qty;
        self.last_price = price;
        self.last_qty = qty;
        self.adjust_status();
    }

    /// Moves `qty` from `leaves_qty` to `cxl_qty` (§4.4.4 residual
    /// cancellation, §4.4.5 `cancel_qty`).
    pub fn cancel_qty(&mut self, qty: i64) {
        let qty = qty.min(self.leaves_qty);
        self.leaves_qty -= qty;
        self.cxl_qty += qty;
        self.adjust_status();
    }

    /// Status transition table (§4.4.5). Order of checks matters: a fully
    /// filled order is `Filled` even if it was also partially cancelled
    /// along the way (`cum_qty == order_qty` wins), and an order whose
    /// remaining leaves were cancelled is `Cancelled` even though it was
    /// also partially filled (checked before the `Partial` case, or a
    /// partial-fill-then-cancel would never leave `Partial`).
    fn adjust_status(&mut self) {
        self.status = if self.cum_qty == self.order_qty {
            OrderStatus::Filled
        } else if self.cum_qty + self.cxl_qty == self.order_qty && self.cum_qty < self.order_qty {
            OrderStatus::Cancelled
        } else if self.cum_qty > 0 {
            OrderStatus::Partial
        } else {
            OrderStatus::New
        };
    }
}


#[cfg(test)]
mod invariant_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Invariant O1 over arbitrary fill/cancel sequences: no matter how
        /// `order_qty` is carved up between fills and cancellation, the
        /// three buckets always sum back to the original quantity.
        #[test]
        fn conserves_quantity_across_fill_and_cancel_sequences(
            order_qty in 1_i64..10_000_000_000,
            fills in proptest::collection::vec(1_i64..1_000_000_000, 0..8),
        ) {
            let mut order = Order::new(
                1, AccountId(1), AccountId(1), BrokerId(1), Symbol::new("BTCUSD"),
                Side::Buy, OrderType::Limit, 400 * 100_000_000, order_qty, 0, None, 0,
            );

            for fill in fills {
                if order.leaves_qty <= 0 {
                    break;
                }
                let qty = fill.min(order.leaves_qty);
                order.execute(qty, 400 * 100_000_000);
                prop_assert!(order.conserves_quantity());
            }

            if order.leaves_qty > 0 {
                order.cancel_qty(order.leaves_qty);
            }

            prop_assert!(order.conserves_quantity());
            prop_assert_eq!(order.leaves_qty, 0);
            prop_assert!(order.cum_qty >= 0 && order.cxl_qty >= 0);
        }
    }
}
