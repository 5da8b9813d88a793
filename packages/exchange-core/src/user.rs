use crate::ids::{AccountId, BrokerId};

/// An account holder (§3 User/Account). Authentication fields
/// (`password_algo`/`password_salt`/`password`, `two_factor_secret`) are
/// out of scope here (§1) beyond the flags this engine's ledger effects key
/// off of; the host owns the credential store.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct User {
    pub id: AccountId,
    pub username: String,
    pub email: String,
    pub broker_id: Option<BrokerId>,
    pub broker_username: String,
    pub country_code: String,
    pub state: String,
    /// `0`, `1`, or `>=2` per §3; §4.8's `B11`/bonus behavior keys off the
    /// transition, not the absolute value, so this stays a plain `i32`
    /// rather than an enum with a fixed upper bound.
    pub verified: i32,
    pub is_broker: bool,
    pub is_system: bool,
    pub two_factor_enabled: bool,
    pub two_factor_secret: Option<String>,
    pub transaction_fee_buy: Option<i64>,
    pub transaction_fee_sell: Option<i64>,
    pub withdraw_email_validation: bool,
}

impl User {
    pub fn account_id(&self) -> AccountId {
        self.id
    }
}
