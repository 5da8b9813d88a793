use crate::ids::{AccountId, BrokerId, CurrencyCode};

/// Withdraw status (§4.7). Numeric values match the wire schema.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum WithdrawStatus {
    PendingEmailConfirm = 0,
    UserConfirmed = 1,
    InProgress = 2,
    Complete = 4,
    Cancelled = 8,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Withdraw {
    pub id: u64,
    pub user_id: AccountId,
    pub account_id: AccountId,
    pub broker_id: BrokerId,
    pub username: String,
    pub broker_username: String,
    pub currency: CurrencyCode,
    pub amount: i64,
    pub method: String,
    pub data: serde_json::Value,
    pub confirmation_token: String,
    pub status: WithdrawStatus,
    pub created: u64,
    pub reason_id: Option<i32>,
    pub reason: Option<String>,
    pub client_order_id: Option<String>,
    pub percent_fee: i64,
    pub fixed_fee: i64,
    /// Total amount debited from the user once fees settle (§4.7
    /// `set_in_progress`): `amount + total_fees`.
    pub paid_amount: i64,
}

/// A broker's fee schedule entry for one withdraw method (§3 Broker,
/// `withdraw_structure[currency][*]`).
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct WithdrawMethod {
    pub method: String,
    pub percent_fee: i64,
    pub fixed_fee: i64,
}
