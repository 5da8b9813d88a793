use cosmwasm_std::Storage;
use exchange_core::{AccountId, BrokerId, CurrencyCode, DomainEvent, Publisher};

use crate::error::ContractError;
use crate::state::{balance_key, BalanceRecord, BALANCES};

/// `get_balance(account, broker, currency)` (§4.1): returns 0 when no row
/// exists rather than erroring — balances are lazily materialized on
/// first touch.
pub fn get_balance(
    storage: &dyn Storage,
    account_id: AccountId,
    broker_id: BrokerId,
    currency: &CurrencyCode,
) -> Result<i64, ContractError> {
    let key = balance_key(account_id.0, broker_id, currency);
    Ok(BALANCES.may_load(storage, key)?.map(|r| r.balance).unwrap_or(0))
}

enum Op {
    Credit,
    Debit,
}

/// `update_balance` (§4.1). The store itself never rejects on overdraft —
/// callers (matcher's self-affordability cap, withdraw's `set_in_progress`
/// balance check) enforce sufficiency before calling this. `amount` must
/// be non-negative; the sign of the mutation is carried by `op`, not by
/// the caller negating `amount`.
fn update_balance(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    account_id: AccountId,
    account_name: &str,
    broker_id: BrokerId,
    broker_name: &str,
    currency: &CurrencyCode,
    amount: i64,
    op: Op,
    now: u64,
) -> Result<i64, ContractError> {
    debug_assert!(amount >= 0, "balance update amount must be non-negative");
    let key = balance_key(account_id.0, broker_id, currency);
    let current = BALANCES.may_load(storage, key.clone())?.unwrap_or(BalanceRecord {
        balance: 0,
        last_update: now,
    });
    let new_balance = match op {
        Op::Credit => current.balance + amount,
        Op::Debit => current.balance - amount,
    };
    BALANCES.save(
        storage,
        key,
        &BalanceRecord {
            balance: new_balance,
            last_update: now,
        },
    )?;

    tracing::debug!(
        account_id = account_id.0,
        broker_id = broker_id.0,
        currency = %currency,
        new_balance,
        "balance updated"
    );
    let _ = account_name;
    let _ = broker_name;

    publisher.emit(&DomainEvent::BalanceUpdate {
        account_id,
        broker_id,
        currency: currency.clone(),
        new_balance,
    });

    Ok(new_balance)
}

#[allow(clippy::too_many_arguments)]
pub fn credit(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    account_id: AccountId,
    account_name: &str,
    broker_id: BrokerId,
    broker_name: &str,
    currency: &CurrencyCode,
    amount: i64,
    now: u64,
) -> Result<i64, ContractError> {
    update_balance(
        storage, publisher, account_id, account_name, broker_id, broker_name, currency, amount,
        Op::Credit, now,
    )
}

#[allow(clippy::too_many_arguments)]
pub fn debit(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    account_id: AccountId,
    account_name: &str,
    broker_id: BrokerId,
    broker_name: &str,
    currency: &CurrencyCode,
    amount: i64,
    now: u64,
) -> Result<i64, ContractError> {
    update_balance(
        storage, publisher, account_id, account_name, broker_id, broker_name, currency, amount,
        Op::Debit, now,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use exchange_core::NullPublisher;

    #[test]
    fn get_balance_defaults_to_zero() {
        let storage = MockStorage::new();
        let balance = get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("USD")).unwrap();
        assert_eq!(balance, 0);
    }

    #[test]
    fn credit_then_debit_roundtrips() {
        let mut storage = MockStorage::new();
        let publisher = NullPublisher;
        let currency = CurrencyCode::new("USD");
        credit(&mut storage, &publisher, AccountId(1), "alice", BrokerId(1), "b1", &currency, 1000, 0).unwrap();
        let balance = debit(&mut storage, &publisher, AccountId(1), "alice", BrokerId(1), "b1", &currency, 400, 0).unwrap();
        assert_eq!(balance, 600);
    }
}
