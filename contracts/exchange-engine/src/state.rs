use cosmwasm_std::{StdResult, Storage};
use cw_storage_plus::{Item, Map};
use exchange_core::{BrokerId, Currency, CurrencyCode, Deposit, Order, Symbol, Trade, User, Withdraw};

use crate::broker::Broker;
use crate::ledger::LedgerEntry;

/// `balances(account_id, broker_id, currency) -> balance` (§6.2). The
/// `last_update` timestamp from the logical schema is folded into
/// [`BalanceRecord`] rather than kept as a parallel map.
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BalanceRecord {
    pub balance: i64,
    pub last_update: u64,
}

pub const BALANCES: Map<(u64, u64, String), BalanceRecord> = Map::new("balances");
pub const LEDGER: Map<u64, LedgerEntry> = Map::new("ledger");
pub const NEXT_LEDGER_ID: Item<u64> = Item::new("next_ledger_id");

pub const ORDERS: Map<u64, Order> = Map::new("orders");
pub const NEXT_ORDER_ID: Item<u64> = Item::new("next_order_id");
/// Active order ids per account, for O(1) `OrderNotFound` checks on
/// cancel (§7) without scanning the whole book.
pub const ACCOUNT_ACTIVE_ORDERS: Map<(u64, u64), ()> = Map::new("account_active_orders");

pub const TRADES: Map<String, Trade> = Map::new("trades");

pub const DEPOSITS: Map<String, Deposit> = Map::new("deposits");
pub const DEPOSITS_BY_SECRET: Map<String, String> = Map::new("deposits_by_secret");
pub const DEPOSITS_BY_CTRL_NUM: Map<String, String> = Map::new("deposits_by_ctrl_num");

pub const WITHDRAWS: Map<u64, Withdraw> = Map::new("withdraws");
pub const NEXT_WITHDRAW_ID: Item<u64> = Item::new("next_withdraw_id");
pub const WITHDRAWS_BY_TOKEN: Map<String, u64> = Map::new("withdraws_by_token");

pub const BROKERS: Map<u64, Broker> = Map::new("brokers");
pub const CURRENCIES: Map<String, Currency> = Map::new("currencies");
pub const USERS: Map<u64, User> = Map::new("users");

pub fn next_ledger_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = NEXT_LEDGER_ID.may_load(storage)?.unwrap_or(0) + 1;
    NEXT_LEDGER_ID.save(storage, &id)?;
    Ok(id)
}

pub fn next_order_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = NEXT_ORDER_ID.may_load(storage)?.unwrap_or(0) + 1;
    NEXT_ORDER_ID.save(storage, &id)?;
    Ok(id)
}

pub fn next_withdraw_id(storage: &mut dyn Storage) -> StdResult<u64> {
    let id = NEXT_WITHDRAW_ID.may_load(storage)?.unwrap_or(0) + 1;
    NEXT_WITHDRAW_ID.save(storage, &id)?;
    Ok(id)
}

pub fn balance_key(account_id: u64, broker_id: BrokerId, currency: &CurrencyCode) -> (u64, u64, String) {
    (account_id, broker_id.0, currency.as_str().to_string())
}

pub fn load_broker(storage: &dyn Storage, broker_id: BrokerId) -> StdResult<Option<Broker>> {
    BROKERS.may_load(storage, broker_id.0)
}

pub fn load_currency(storage: &dyn Storage, code: &CurrencyCode) -> StdResult<Option<Currency>> {
    CURRENCIES.may_load(storage, code.as_str().to_string())
}

pub fn load_user(storage: &dyn Storage, account_id: exchange_core::AccountId) -> StdResult<Option<User>> {
    USERS.may_load(storage, account_id.0)
}

/// All currently-resting symbols with at least one order ever placed, so
/// `book::shard_for` callers can discover which `OrderBook`s to open on a
/// cold start (the in-memory `DashMap` directory does not survive a
/// process restart on its own).
pub const KNOWN_SYMBOLS: Map<String, ()> = Map::new("known_symbols");

pub fn remember_symbol(storage: &mut dyn Storage, symbol: &Symbol) -> StdResult<()> {
    KNOWN_SYMBOLS.save(storage, symbol.as_str().to_string(), &())
}
