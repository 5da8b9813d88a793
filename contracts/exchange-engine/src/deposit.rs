use cosmwasm_std::Storage;
use exchange_core::{
    confirmation_threshold_for, resolve_instruction, total_fees, AccountId, BrokerId, CurrencyCode,
    Deposit, DepositStatus, DepositType, Publisher,
};

use crate::broker::broker_pool_account;
use crate::error::ContractError;
use crate::ledger::{self, Party};
use crate::matcher::display_name;
use crate::state::{load_broker, DEPOSITS, DEPOSITS_BY_CTRL_NUM, DEPOSITS_BY_SECRET};

fn party(account_id: AccountId, broker_id: BrokerId) -> Party {
    Party::new(account_id, display_name(account_id.0), broker_id, display_name(broker_id.0))
}

#[allow(clippy::too_many_arguments)]
pub fn create(
    storage: &mut dyn Storage,
    account_id: AccountId,
    broker_id: BrokerId,
    deposit_type: DepositType,
    currency: CurrencyCode,
    value: i64,
    instructions: Vec<exchange_core::Instruction>,
    client_order_id: Option<String>,
    broker_deposit_ctrl_num: Option<String>,
    secret: Option<String>,
    now: u64,
) -> Result<Deposit, ContractError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let deposit = Deposit {
        id: id.clone(),
        user_id: account_id,
        account_id,
        broker_id,
        deposit_option_id: None,
        deposit_option_name: None,
        broker_deposit_ctrl_num: broker_deposit_ctrl_num.clone(),
        secret: secret.clone(),
        deposit_type,
        currency,
        value,
        paid_value: 0,
        status: DepositStatus::PendingUnconfirmed,
        data: serde_json::json!({}),
        instructions,
        client_order_id,
        percent_fee: 0,
        fixed_fee: 0,
        reason_id: None,
        reason: None,
        created: now,
    };
    DEPOSITS.save(storage, id.clone(), &deposit)?;
    if let Some(ctrl_num) = broker_deposit_ctrl_num {
        DEPOSITS_BY_CTRL_NUM.save(storage, ctrl_num, &id)?;
    }
    if let Some(secret) = secret {
        DEPOSITS_BY_SECRET.save(storage, secret, &id)?;
    }
    Ok(deposit)
}

/// `create_crypto_currency_deposit(user, currency, input_address, destination, secret, client_order_id, instructions?, value?)`
/// (§4.6 "crypto-direct deposits may go straight to waiting"). Records
/// the on-chain `InputAddress`/`Destination` pair in `data` up front so the
/// external watcher that later calls `process_confirmation` can resolve
/// which address/secret a confirmation belongs to.
#[allow(clippy::too_many_arguments)]
pub fn create_crypto(
    storage: &mut dyn Storage,
    account_id: AccountId,
    broker_id: BrokerId,
    currency: CurrencyCode,
    input_address: String,
    destination: String,
    secret: String,
    client_order_id: Option<String>,
    instructions: Vec<exchange_core::Instruction>,
    value: i64,
    now: u64,
) -> Result<Deposit, ContractError> {
    let id = uuid::Uuid::new_v4().simple().to_string();
    let deposit = Deposit {
        id: id.clone(),
        user_id: account_id,
        account_id,
        broker_id,
        deposit_option_id: None,
        deposit_option_name: Some(format!("deposit_{}", currency.as_str().to_lowercase())),
        broker_deposit_ctrl_num: None,
        secret: Some(secret.clone()),
        deposit_type: DepositType::Cry,
        currency,
        value,
        paid_value: 0,
        status: DepositStatus::PendingUnconfirmed,
        data: serde_json::json!({ "InputAddress": input_address, "Destination": destination }),
        instructions,
        client_order_id,
        percent_fee: 0,
        fixed_fee: 0,
        reason_id: None,
        reason: None,
        created: now,
    };
    DEPOSITS.save(storage, id.clone(), &deposit)?;
    DEPOSITS_BY_SECRET.save(storage, secret, &id)?;
    Ok(deposit)
}

fn load(storage: &dyn Storage, deposit_id: &str) -> Result<Deposit, ContractError> {
    DEPOSITS
        .may_load(storage, deposit_id.to_string())?
        .ok_or_else(|| ContractError::DepositNotFound {
            deposit_id: deposit_id.to_string(),
        })
}

/// `user_confirm(data?)` (§4.6): `0 → 1`, merging `data` into the stored
/// JSON blob. Transitions outside `{0}` are silent no-ops (§7
/// `InvalidStateTransition`).
pub fn user_confirm(
    storage: &mut dyn Storage,
    deposit_id: &str,
    data: serde_json::Value,
) -> Result<Deposit, ContractError> {
    let mut deposit = load(storage, deposit_id)?;
    if matches!(deposit.status, DepositStatus::PendingUnconfirmed) {
        merge_json(&mut deposit.data, data);
        deposit.status = DepositStatus::UserConfirmed;
        DEPOSITS.save(storage, deposit_id.to_string(), &deposit)?;
    }
    Ok(deposit)
}

/// `set_in_progress()` (§4.6): `{0,1} → 2`; `{2,4}` are no-ops.
pub fn set_in_progress(storage: &mut dyn Storage, deposit_id: &str) -> Result<Deposit, ContractError> {
    let mut deposit = load(storage, deposit_id)?;
    if matches!(
        deposit.status,
        DepositStatus::PendingUnconfirmed | DepositStatus::UserConfirmed
    ) {
        deposit.status = DepositStatus::InProgress;
        DEPOSITS.save(storage, deposit_id.to_string(), &deposit)?;
    }
    Ok(deposit)
}

/// `process_confirmation(amount, percent_fee, fixed_fee, data)` (§4.6).
/// Returns the resolved auto-route instruction message, if any.
#[allow(clippy::too_many_arguments)]
pub fn process_confirmation(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    deposit_id: &str,
    amount: i64,
    percent_fee: i64,
    fixed_fee: i64,
    data: serde_json::Value,
    observed_confirmations: u32,
    now: u64,
) -> Result<Option<serde_json::Value>, ContractError> {
    let mut deposit = load(storage, deposit_id)?;
    deposit.paid_value = amount;

    let confirmable = match deposit.deposit_type {
        DepositType::Cry => {
            let broker = load_broker(storage, deposit.broker_id)?.ok_or(ContractError::BrokerDoesNotExist {
                broker_id: deposit.broker_id.0,
            })?;
            let thresholds = broker.confirmation_thresholds(&deposit.currency);
            match confirmation_threshold_for(thresholds, amount) {
                Some(threshold) => observed_confirmations >= threshold.min_confirmations,
                None => false,
            }
        }
        DepositType::Bti | DepositType::Bbs => true,
    };

    if !confirmable {
        DEPOSITS.save(storage, deposit_id.to_string(), &deposit)?;
        return Ok(None);
    }

    if matches!(deposit.status, DepositStatus::Complete) {
        // Already settled; a later watcher callback with a different
        // paid_value must create a new deposit row upstream (§4.6, §9).
        DEPOSITS.save(storage, deposit_id.to_string(), &deposit)?;
        return Ok(None);
    }

    deposit.status = DepositStatus::Complete;
    deposit.percent_fee = percent_fee;
    deposit.fixed_fee = fixed_fee;
    merge_json(&mut deposit.data, data);

    let broker_pool = party(broker_pool_account(deposit.broker_id), deposit.broker_id);
    let account = party(deposit.account_id, deposit.broker_id);

    ledger::transfer(
        storage,
        publisher,
        now,
        &broker_pool,
        &account,
        &deposit.currency,
        deposit.paid_value,
        &deposit.id,
        "D",
    )?;

    let total_fees_due = total_fees(deposit.paid_value, percent_fee, fixed_fee);
    if total_fees_due > 0 {
        ledger::transfer(
            storage,
            publisher,
            now,
            &account,
            &broker_pool,
            &deposit.currency,
            total_fees_due,
            &deposit.id,
            "DF",
        )?;
    }

    let resolved = if deposit.instructions.is_empty() {
        None
    } else {
        resolve_instruction(&deposit, now)
    };

    DEPOSITS.save(storage, deposit_id.to_string(), &deposit)?;
    Ok(resolved)
}

/// `cancel(reason_id, reason)` (§4.6): reverses the net credit if the
/// deposit was already complete, then marks it cancelled either way.
pub fn cancel(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    deposit_id: &str,
    reason_id: i32,
    reason: String,
    now: u64,
) -> Result<Deposit, ContractError> {
    let mut deposit = load(storage, deposit_id)?;

    if matches!(deposit.status, DepositStatus::Complete) {
        let broker_pool = party(broker_pool_account(deposit.broker_id), deposit.broker_id);
        let account = party(deposit.account_id, deposit.broker_id);
        // `process_confirmation` posted two legs: a `D` credit of the full
        // `paid_value` from the pool, then a `DF` debit of `total_fees_due`
        // back to the pool. The account's net gain was `paid_value -
        // total_fees_due`, so that (not the gross `paid_value`) is what
        // this reversal must take back.
        let total_fees_due = total_fees(deposit.paid_value, deposit.percent_fee, deposit.fixed_fee);
        let net_credited = deposit.paid_value - total_fees_due;
        ledger::transfer(
            storage,
            publisher,
            now,
            &account,
            &broker_pool,
            &deposit.currency,
            net_credited,
            &deposit.id,
            "D",
        )?;
    }

    deposit.status = DepositStatus::Cancelled;
    deposit.reason_id = Some(reason_id);
    deposit.reason = Some(reason);
    DEPOSITS.save(storage, deposit_id.to_string(), &deposit)?;
    Ok(deposit)
}

fn merge_json(target: &mut serde_json::Value, patch: serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                target_map.insert(key, value);
            }
        }
        (target, patch) => {
            if !patch.is_null() {
                *target = patch;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use exchange_core::{ConfirmationThreshold, NullPublisher, RecordingPublisher};
    use std::collections::HashMap;

    fn seed_broker(storage: &mut dyn Storage) {
        let mut crypto_currencies = HashMap::new();
        crypto_currencies.insert(
            CurrencyCode::new("BTC"),
            vec![
                ConfirmationThreshold { amount_lo: 0, amount_hi: 3 * 100_000_000, min_confirmations: 1 },
                ConfirmationThreshold {
                    amount_lo: 3 * 100_000_000,
                    amount_hi: 200 * 100_000_000,
                    min_confirmations: 3,
                },
                ConfirmationThreshold { amount_lo: 200 * 100_000_000, amount_hi: i64::MAX, min_confirmations: 6 },
            ],
        );
        crate::state::BROKERS
            .save(
                storage,
                1,
                &crate::broker::Broker {
                    id: BrokerId(1),
                    short_name: "b1".to_string(),
                    withdraw_structure: HashMap::new(),
                    crypto_currencies,
                    transaction_fee_buy: 0,
                    transaction_fee_sell: 0,
                    accept_customers_from: vec![],
                    status: crate::broker::BrokerStatus::Active,
                    is_broker_hub: false,
                    verified_bonus: None,
                },
            )
            .unwrap();
    }

    /// E5: `paid=2e8`, observed confirmations `1` against the `(0, 3e8, 1)`
    /// bracket confirms the deposit and credits the user.
    #[test]
    fn crypto_deposit_confirms_with_sufficient_confirmations() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);
        let publisher = NullPublisher;

        let dep = create(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            DepositType::Cry,
            CurrencyCode::new("BTC"),
            2 * 100_000_000,
            vec![],
            None,
            None,
            None,
            0,
        )
        .unwrap();

        let resolved =
            process_confirmation(&mut storage, &publisher, &dep.id, 2 * 100_000_000, 0, 0, serde_json::json!({}), 1, 0)
                .unwrap();
        assert!(resolved.is_none());

        let balance = crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("BTC")).unwrap();
        assert_eq!(balance, 2 * 100_000_000);

        // L1: the credit must come from the broker pool, not out of thin air.
        let pool_balance = crate::balance::get_balance(
            &storage,
            crate::broker::broker_pool_account(BrokerId(1)),
            BrokerId(1),
            &CurrencyCode::new("BTC"),
        )
        .unwrap();
        assert_eq!(pool_balance, -2 * 100_000_000);
    }

    /// Same deposit, but `Confirmations=0` never crosses the `min_confirmations=1`
    /// bracket, so the deposit stays unconfirmed and no credit is posted.
    #[test]
    fn crypto_deposit_stays_unconfirmed_without_enough_confirmations() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);
        let publisher = NullPublisher;

        let dep = create(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            DepositType::Cry,
            CurrencyCode::new("BTC"),
            2 * 100_000_000,
            vec![],
            None,
            None,
            None,
            0,
        )
        .unwrap();

        let resolved =
            process_confirmation(&mut storage, &publisher, &dep.id, 2 * 100_000_000, 0, 0, serde_json::json!({}), 0, 0)
                .unwrap();
        assert!(resolved.is_none());

        let balance = crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("BTC")).unwrap();
        assert_eq!(balance, 0);
    }

    /// Fee identity (§8 property 6): net credit equals
    /// `paid_value - floor((paid_value - fixed_fee) * percent_fee / 100) - fixed_fee`.
    #[test]
    fn fee_is_deducted_after_confirmation() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);
        let publisher = NullPublisher;

        let dep = create(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            DepositType::Bti,
            CurrencyCode::new("USD"),
            10_100,
            vec![],
            None,
            None,
            None,
            0,
        )
        .unwrap();

        process_confirmation(&mut storage, &publisher, &dep.id, 10_100, 200, 100, serde_json::json!({}), 0, 0).unwrap();

        let gross_balance = crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("USD")).unwrap();
        let total = total_fees(10_100, 200, 100);
        assert_eq!(gross_balance, 10_100 - total);

        // L1: broker pool is debited the full deposit credit, then credited
        // back the fee leg — net pool balance is -(10_100 - total).
        let pool_balance = crate::balance::get_balance(
            &storage,
            crate::broker::broker_pool_account(BrokerId(1)),
            BrokerId(1),
            &CurrencyCode::new("USD"),
        )
        .unwrap();
        assert_eq!(pool_balance, -(10_100 - total));
    }

    #[test]
    fn cancel_after_complete_reverses_credit() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);
        let publisher = NullPublisher;

        let dep = create(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            DepositType::Bti,
            CurrencyCode::new("USD"),
            5_000,
            vec![],
            None,
            None,
            None,
            0,
        )
        .unwrap();
        process_confirmation(&mut storage, &publisher, &dep.id, 5_000, 0, 0, serde_json::json!({}), 0, 0).unwrap();
        assert_eq!(
            crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("USD")).unwrap(),
            5_000
        );

        cancel(&mut storage, &publisher, &dep.id, 1, "chargeback".to_string(), 0).unwrap();
        assert_eq!(
            crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("USD")).unwrap(),
            0
        );
        // L1: cancel's account->pool reversal nets the pool back to zero too.
        assert_eq!(
            crate::balance::get_balance(
                &storage,
                crate::broker::broker_pool_account(BrokerId(1)),
                BrokerId(1),
                &CurrencyCode::new("USD")
            )
            .unwrap(),
            0
        );
    }

    /// L1/L2 with a nonzero fee: cancelling a completed deposit must
    /// reverse the net credit (`paid_value - total_fees_due`), not the
    /// gross `paid_value`, or both balances end up off by the fee amount.
    #[test]
    fn cancel_after_complete_with_fee_reverses_net_credit_not_gross() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);
        let publisher = NullPublisher;

        let dep = create(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            DepositType::Bti,
            CurrencyCode::new("USD"),
            10_100,
            vec![],
            None,
            None,
            None,
            0,
        )
        .unwrap();
        process_confirmation(&mut storage, &publisher, &dep.id, 10_100, 200, 100, serde_json::json!({}), 0, 0).unwrap();
        let total = total_fees(10_100, 200, 100);
        assert_eq!(
            crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("USD")).unwrap(),
            10_100 - total
        );

        cancel(&mut storage, &publisher, &dep.id, 1, "chargeback".to_string(), 0).unwrap();
        assert_eq!(
            crate::balance::get_balance(&storage, AccountId(1), BrokerId(1), &CurrencyCode::new("USD")).unwrap(),
            0
        );
        assert_eq!(
            crate::balance::get_balance(
                &storage,
                crate::broker::broker_pool_account(BrokerId(1)),
                BrokerId(1),
                &CurrencyCode::new("USD")
            )
            .unwrap(),
            0
        );
    }

    #[test]
    fn create_crypto_records_address_and_secret_index() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);

        let dep = create_crypto(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            CurrencyCode::new("BTC"),
            "1Input".to_string(),
            "1Destination".to_string(),
            "secret-1".to_string(),
            None,
            vec![],
            0,
            0,
        )
        .unwrap();

        assert_eq!(dep.data["InputAddress"], "1Input");
        assert_eq!(
            DEPOSITS_BY_SECRET.load(&storage, "secret-1".to_string()).unwrap(),
            dep.id
        );
    }

    #[test]
    fn instruction_resolves_on_confirmation() {
        let mut storage = MockStorage::new();
        seed_broker(&mut storage);
        let publisher = RecordingPublisher::new();

        let instruction = exchange_core::Instruction {
            timeout: None,
            on_timeout: exchange_core::OnTimeout::Continue,
            filter: exchange_core::InstructionFilter::default(),
            msg: serde_json::json!({"MsgType": "D", "OrderQty": "{$Value}"}),
        };
        let dep = create(
            &mut storage,
            AccountId(1),
            BrokerId(1),
            DepositType::Bti,
            CurrencyCode::new("USD"),
            1_000,
            vec![instruction],
            None,
            None,
            None,
            0,
        )
        .unwrap();

        let resolved = process_confirmation(&mut storage, &publisher, &dep.id, 1_000, 0, 0, serde_json::json!({}), 0, 0)
            .unwrap();
        assert_eq!(resolved.unwrap()["OrderQty"], "1000");
    }
}
