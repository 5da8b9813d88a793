use thiserror::Error;

/// Errors raised by pure, storage-free operations in this crate: amount
/// parsing/scaling and symbol/currency validation. The stateful errors
/// (insufficient funds, unknown order, bad state transition, ...) live in
/// `exchange-engine::ContractError`, which wraps this type.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CoreError {
    #[error("symbol must be at least 4 characters (base + quote), got {symbol:?}")]
    InvalidSymbol { symbol: String },

    #[error("currency code must not be empty")]
    EmptyCurrencyCode {},

    #[error("amount must be non-negative, got {amount}")]
    NegativeAmount { amount: i64 },

    #[error("pip must be positive, got {pip}")]
    InvalidPip { pip: i64 },
}
