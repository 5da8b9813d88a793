pub mod deposit;
pub mod error;
pub mod event;
pub mod ids;
pub mod money;
pub mod order;
pub mod trade;
pub mod user;
pub mod withdraw;

pub use deposit::{
    confirmation_threshold_for, resolve_instruction, ConfirmationThreshold, Deposit, DepositStatus,
    DepositType, Instruction, InstructionFilter, OnTimeout,
};
pub use error::CoreError;
pub use event::{DomainEvent, NullPublisher, Publisher, RecordingPublisher};
pub use ids::{AccountId, BrokerId, CurrencyCode, Symbol};
pub use money::{fee_amount, notional, total_fees, Currency};
pub use order::{Order, OrderStatus, OrderType, Side};
pub use trade::{Trade, TradeType};
pub use user::User;
pub use withdraw::{Withdraw, WithdrawMethod, WithdrawStatus};
