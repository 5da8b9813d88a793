pub mod account;
pub mod balance;
pub mod book;
pub mod broker;
pub mod config;
pub mod deposit;
pub mod error;
pub mod ledger;
pub mod matcher;
pub mod state;
pub mod withdraw;

pub use book::BookDirectory;
pub use config::HostConfig;
pub use error::ContractError;
pub use matcher::{NewOrderRequest, PlaceOrderOutcome};
