use cosmwasm_std::Storage;
use exchange_core::{
    total_fees, AccountId, BrokerId, CurrencyCode, DomainEvent, Publisher, Withdraw, WithdrawStatus,
};

use crate::error::ContractError;
use crate::ledger::{self, Party};
use crate::matcher::display_name;
use crate::state::{load_broker, next_withdraw_id, WITHDRAWS, WITHDRAWS_BY_TOKEN};

fn party(account_id: AccountId, broker_id: BrokerId) -> Party {
    Party::new(account_id, display_name(account_id.0), broker_id, display_name(broker_id.0))
}

fn load(storage: &dyn Storage, withdraw_id: u64) -> Result<Withdraw, ContractError> {
    WITHDRAWS
        .may_load(storage, withdraw_id)?
        .ok_or(ContractError::WithdrawNotFound { withdraw_id })
}

/// `create(user, broker, currency, amount, method, data, client_order_id)`
/// (§4.7). Looks up the method's fee entry in
/// `broker.withdraw_structure[currency]` (§7 `ConfigurationError` when
/// absent); emits a `"CW"` confirmation e-mail job when the account
/// requires it, otherwise starts already user-confirmed.
#[allow(clippy::too_many_arguments)]
pub fn create(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    account_id: AccountId,
    broker_id: BrokerId,
    currency: CurrencyCode,
    amount: i64,
    method: String,
    data: serde_json::Value,
    client_order_id: Option<String>,
    withdraw_email_validation: bool,
    now: u64,
) -> Result<Withdraw, ContractError> {
    let broker = load_broker(storage, broker_id)?.ok_or(ContractError::BrokerDoesNotExist { broker_id: broker_id.0 })?;
    let fee_entry = broker
        .withdraw_method(&currency, &method)
        .ok_or_else(|| ContractError::ConfigurationError {
            currency: currency.as_str().to_string(),
            method: method.clone(),
        })?;
    let percent_fee = fee_entry.percent_fee;
    let fixed_fee = fee_entry.fixed_fee;

    let id = next_withdraw_id(storage)?;
    let confirmation_token = uuid::Uuid::new_v4().simple().to_string();

    let status = if withdraw_email_validation {
        WithdrawStatus::PendingEmailConfirm
    } else {
        WithdrawStatus::UserConfirmed
    };

    let withdraw = Withdraw {
        id,
        user_id: account_id,
        account_id,
        broker_id,
        username: display_name(account_id.0),
        broker_username: display_name(broker_id.0),
        currency: currency.clone(),
        amount,
        method,
        data,
        confirmation_token: confirmation_token.clone(),
        status,
        created: now,
        reason_id: None,
        reason: None,
        client_order_id,
        percent_fee,
        fixed_fee,
        paid_amount: 0,
    };
    WITHDRAWS.save(storage, id, &withdraw)?;
    WITHDRAWS_BY_TOKEN.save(storage, confirmation_token, &id)?;

    if withdraw_email_validation {
        publisher.emit(&DomainEvent::email(
            format!("withdraw-{id}"),
            display_name(account_id.0),
            "CW",
            "en",
            format!("withdraw-confirmation-{}", withdraw.method.to_lowercase()),
            "",
            serde_json::json!({
                "amount": withdraw.amount,
                "currency": withdraw.currency.as_str(),
                "method": withdraw.method,
            }),
        ));
    }

    Ok(withdraw)
}

/// `user_confirm(token)` (§4.7): matches a status-`0` row by token,
/// `0 → 1`. Any other status (or unknown token) is a silent no-op.
pub fn user_confirm(storage: &mut dyn Storage, token: &str) -> Result<Option<Withdraw>, ContractError> {
    let Some(id) = WITHDRAWS_BY_TOKEN.may_load(storage, token.to_string())? else {
        return Ok(None);
    };
    let mut withdraw = load(storage, id)?;
    if !matches!(withdraw.status, WithdrawStatus::PendingEmailConfirm) {
        return Ok(None);
    }
    withdraw.status = WithdrawStatus::UserConfirmed;
    WITHDRAWS.save(storage, id, &withdraw)?;
    Ok(Some(withdraw))
}

/// `set_in_progress(percent_fee, fixed_fee)` (§4.7). Only legal from
/// status `1`; recomputes `paid_amount` and hard-cancels with
/// `reason_id=-1` on insufficient funds rather than erroring (§7
/// `InsufficientFunds` is surfaced here as a state transition, not a
/// `Result::Err`).
pub fn set_in_progress(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    withdraw_id: u64,
    percent_fee: i64,
    fixed_fee: i64,
    now: u64,
) -> Result<Withdraw, ContractError> {
    let mut withdraw = load(storage, withdraw_id)?;
    if !matches!(withdraw.status, WithdrawStatus::UserConfirmed) {
        return Ok(withdraw);
    }

    withdraw.percent_fee = percent_fee;
    withdraw.fixed_fee = fixed_fee;
    withdraw.paid_amount = withdraw.amount + total_fees(withdraw.amount, percent_fee, fixed_fee);

    let current_balance =
        crate::balance::get_balance(storage, withdraw.account_id, withdraw.broker_id, &withdraw.currency)?;
    if withdraw.paid_amount > current_balance {
        WITHDRAWS.save(storage, withdraw_id, &withdraw)?;
        return cancel(storage, publisher, withdraw_id, -1, "Insufficient funds".to_string(), now);
    }

    withdraw.status = WithdrawStatus::InProgress;
    let account = party(withdraw.account_id, withdraw.broker_id);
    let broker_pool = party(
        crate::broker::broker_pool_account(withdraw.broker_id),
        withdraw.broker_id,
    );
    ledger::transfer(
        storage,
        publisher,
        now,
        &account,
        &broker_pool,
        &withdraw.currency,
        withdraw.amount,
        &withdraw.id.to_string(),
        "W",
    )?;

    WITHDRAWS.save(storage, withdraw_id, &withdraw)?;
    Ok(withdraw)
}

/// `set_as_complete(data?)` (§4.7): only from status `2`. The principal
/// was already debited in `set_in_progress`; this posts the separate
/// `'WF'` fee leg on top (§9 "double-counted withdraw fee" — preserved
/// deliberately, net user debit across both steps is `amount + total_fees
/// == paid_amount`).
pub fn set_as_complete(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    withdraw_id: u64,
    data: Option<serde_json::Value>,
    now: u64,
) -> Result<Withdraw, ContractError> {
    let mut withdraw = load(storage, withdraw_id)?;
    if !matches!(withdraw.status, WithdrawStatus::InProgress) {
        return Ok(withdraw);
    }

    if let Some(patch) = data {
        merge_json(&mut withdraw.data, patch);
    }
    withdraw.status = WithdrawStatus::Complete;

    let total = total_fees(withdraw.amount, withdraw.percent_fee, withdraw.fixed_fee);
    if total > 0 {
        let account = party(withdraw.account_id, withdraw.broker_id);
        let broker_pool = party(
            crate::broker::broker_pool_account(withdraw.broker_id),
            withdraw.broker_id,
        );
        ledger::transfer(
            storage,
            publisher,
            now,
            &account,
            &broker_pool,
            &withdraw.currency,
            total,
            &withdraw.id.to_string(),
            "WF",
        )?;
    }

    WITHDRAWS.save(storage, withdraw_id, &withdraw)?;
    Ok(withdraw)
}

/// `cancel(reason_id, reason)` (§4.7): reverses the held principal when
/// cancelled from `2` (in-progress); a no-op when already `4` (complete);
/// emits a `"WC"` e-mail job with the post-cancel balance either way.
pub fn cancel(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    withdraw_id: u64,
    reason_id: i32,
    reason: String,
    now: u64,
) -> Result<Withdraw, ContractError> {
    let mut withdraw = load(storage, withdraw_id)?;
    if matches!(withdraw.status, WithdrawStatus::Complete) {
        return Ok(withdraw);
    }

    if matches!(withdraw.status, WithdrawStatus::InProgress) {
        let broker_pool = party(
            crate::broker::broker_pool_account(withdraw.broker_id),
            withdraw.broker_id,
        );
        let account = party(withdraw.account_id, withdraw.broker_id);
        ledger::transfer(
            storage,
            publisher,
            now,
            &broker_pool,
            &account,
            &withdraw.currency,
            withdraw.amount,
            &withdraw.id.to_string(),
            "W",
        )?;
    }

    withdraw.status = WithdrawStatus::Cancelled;
    withdraw.reason_id = Some(reason_id);
    withdraw.reason = Some(reason.clone());
    WITHDRAWS.save(storage, withdraw_id, &withdraw)?;

    let balance = crate::balance::get_balance(storage, withdraw.account_id, withdraw.broker_id, &withdraw.currency)?;
    publisher.emit(&DomainEvent::email(
        format!("withdraw-{withdraw_id}"),
        display_name(withdraw.account_id.0),
        "WC",
        "en",
        "withdraw-cancelled",
        "",
        serde_json::json!({
            "amount": withdraw.amount,
            "currency": withdraw.currency.as_str(),
            "reason_id": reason_id,
            "reason": reason,
            "balance": balance,
        }),
    ));

    Ok(withdraw)
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
