use crate::ids::Symbol;
use crate::order::Side;

/// Append-only execution record (C5, §4.5). Never mutated after creation.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Trade {
    pub id: String,
    pub order_id: u64,
    pub counter_order_id: u64,
    pub buyer_username: String,
    pub seller_username: String,
    /// Side of the aggressive (incoming) order.
    pub side: Side,
    pub symbol: Symbol,
    pub size: i64,
    pub price: i64,
    pub created: u64,
    pub trade_type: TradeType,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum TradeType {
    Normal,
}

impl Trade {
    /// `id = "{order.id}.{counter.id}"` per §4.5.
    pub fn derive_id(order_id: u64, counter_order_id: u64) -> String {
        format!("{order_id}.{counter_order_id}")
    }
}
