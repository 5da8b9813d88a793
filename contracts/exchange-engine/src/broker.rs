use std::collections::HashMap;

use exchange_core::{AccountId, BrokerId, ConfirmationThreshold, CurrencyCode, WithdrawMethod};

/// Broker configuration (§3 Broker). Per §9 "Broker PK anomaly", `id` is
/// the functional key everywhere in this crate; `short_name` is carried
/// only as a unique display field, never as a lookup key.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Broker {
    pub id: BrokerId,
    pub short_name: String,
    pub withdraw_structure: HashMap<CurrencyCode, Vec<WithdrawMethod>>,
    pub crypto_currencies: HashMap<CurrencyCode, Vec<ConfirmationThreshold>>,
    pub transaction_fee_buy: i64,
    pub transaction_fee_sell: i64,
    pub accept_customers_from: Vec<String>,
    pub status: BrokerStatus,
    pub is_broker_hub: bool,
    /// Data-driven generalization of a hardcoded `200 VEF` verified-customer
    /// bonus: `(currency, amount)` paid from the broker pool on verification.
    pub verified_bonus: Option<(CurrencyCode, i64)>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum BrokerStatus {
    Active,
    Suspended,
}

impl Broker {
    pub fn withdraw_method(&self, currency: &CurrencyCode, method: &str) -> Option<&WithdrawMethod> {
        self.withdraw_structure
            .get(currency)?
            .iter()
            .find(|m| m.method == method)
    }

    pub fn confirmation_thresholds(&self, currency: &CurrencyCode) -> &[ConfirmationThreshold] {
        self.crypto_currencies
            .get(currency)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

/// Broker-pool account id: the broker's own `User.id` acts as the
/// counterparty for deposits/withdraws/bonuses (§4.2, §4.6, §4.7).
pub fn broker_pool_account(broker_id: BrokerId) -> AccountId {
    AccountId(broker_id.0)
}
