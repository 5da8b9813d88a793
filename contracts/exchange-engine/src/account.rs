use cosmwasm_std::Storage;
use exchange_core::{AccountId, DomainEvent, Publisher, User};

use crate::broker::broker_pool_account;
use crate::error::ContractError;
use crate::ledger::{self, Party};
use crate::matcher::display_name;
use crate::state::{load_broker, load_user, USERS};

/// `User.set_verified(verified, verification_data?)`, generalizing a
/// hardcoded bonus transfer into the broker's configured
/// `verified_bonus`. A no-op when `verified` does not actually change,
/// matching the original's `if self.verified != verified` guard.
///
/// Emits `B11` unconditionally on a real transition; `verified == 1`
/// additionally emits a `"VS"` e-mail job to the broker (submission
/// notice); `verified > 1` pays the broker's configured `verified_bonus`
/// (if any) from the broker pool and emits an `"AV"` e-mail job to the
/// user (E6).
pub fn set_verified(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    account_id: AccountId,
    verified: i32,
    verification_data: Option<String>,
    now: u64,
) -> Result<User, ContractError> {
    let mut user = load_user(storage, account_id)?.ok_or(ContractError::UserNotFound { account_id: account_id.0 })?;

    if user.verified == verified {
        return Ok(user);
    }

    // `user.broker_id` is `None`, not a real broker id pointing nowhere, so
    // there is no id to report here; `0` is never a valid broker id.
    let broker_id = user.broker_id.ok_or(ContractError::BrokerDoesNotExist { broker_id: 0 })?;

    user.verified = verified;
    USERS.save(storage, account_id.0, &user)?;

    publisher.emit(&DomainEvent::VerificationUpdate {
        account_id,
        broker_id,
        username: user.username.clone(),
        verified,
        verification_data: verification_data.clone(),
    });

    if verified == 1 {
        publisher.emit(&DomainEvent::email(
            format!("verify-{}", account_id.0),
            display_name(broker_id.0),
            "VS",
            "en",
            "customer-verification-submit",
            "",
            serde_json::json!({
                "username": user.username,
                "email": user.email,
                "verified": verified,
                "verification_data": verification_data,
            }),
        ));
    } else if verified > 1 {
        if let Some(broker) = load_broker(storage, broker_id)? {
            if let Some((currency, amount)) = broker.verified_bonus.clone() {
                let broker_pool = Party::new(
                    broker_pool_account(broker_id),
                    display_name(broker_id.0),
                    broker_id,
                    display_name(broker_id.0),
                );
                let account = Party::new(account_id, display_name(account_id.0), broker_id, display_name(broker_id.0));
                ledger::transfer(
                    storage,
                    publisher,
                    now,
                    &broker_pool,
                    &account,
                    &currency,
                    amount,
                    &account_id.0.to_string(),
                    "B",
                )?;
            }
        }

        publisher.emit(&DomainEvent::email(
            format!("verify-{}", account_id.0),
            user.email.clone(),
            "AV",
            "en",
            "your-account-has-been-verified",
            "",
            serde_json::json!({
                "username": user.username,
                "email": user.email,
                "verified": verified,
                "verification_data": verification_data,
            }),
        ));
    }

    Ok(user)
}
