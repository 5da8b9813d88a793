use cosmwasm_std::StdError;
use exchange_core::CoreError;
use thiserror::Error;

/// ## Description
/// This enum describes exchange engine errors.
#[derive(Error, Debug, PartialEq)]
pub enum ContractError {
    #[error("{0}")]
    Std(#[from] StdError),

    #[error("{0}")]
    Core(#[from] CoreError),

    #[error("Insufficient funds: {account_id} has {available} of {currency}, needs {required}")]
    InsufficientFunds {
        account_id: u64,
        currency: String,
        available: i64,
        required: i64,
    },

    #[error("Order {order_id} not found in account's active set")]
    OrderNotFound { order_id: u64 },

    #[error("Deposit {deposit_id} not found")]
    DepositNotFound { deposit_id: String },

    #[error("Withdraw {withdraw_id} not found")]
    WithdrawNotFound { withdraw_id: u64 },

    #[error("User {account_id} not found")]
    UserNotFound { account_id: u64 },

    #[error("Broker {broker_id} does not exist")]
    BrokerDoesNotExist { broker_id: u64 },

    #[error("Missing broker configuration for {currency} method {method}")]
    ConfigurationError { currency: String, method: String },

    #[error("Username or email already in use")]
    UserAlreadyExists {},

    #[error("Second factor required or incorrect")]
    NeedSecondFactor {},

    #[error("Invalid state transition")]
    InvalidStateTransition {},

    #[error("Unauthorized")]
    Unauthorized {},
}
