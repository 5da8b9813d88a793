use cosmwasm_std::Storage;
use exchange_core::{AccountId, BrokerId, CurrencyCode, DomainEvent, Publisher};

use crate::balance;
use crate::error::ContractError;
use crate::state::{next_ledger_id, LEDGER};

/// One append-only journal row (§3 Ledger entry, §4.2). `'C'`/`'D'` match
/// the wire operation codes exactly so event/export code need not remap.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum Operation {
    Credit,
    Debit,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LedgerEntry {
    pub id: u64,
    pub currency: CurrencyCode,
    pub account_id: AccountId,
    pub account_name: String,
    pub broker_id: BrokerId,
    pub broker_name: String,
    pub payee_id: AccountId,
    pub payee_name: String,
    pub payee_broker_id: BrokerId,
    pub payee_broker_name: String,
    pub operation: Operation,
    pub amount: i64,
    pub balance_after: i64,
    pub reference: String,
    pub created: u64,
    pub description: String,
}

/// A named party in a posting: the identifiers plus a display name. Used
/// so `transfer`/`deposit`/`withdraw` calls read as "from X to Y" instead
/// of a wall of bare ids. Owns its names rather than borrowing: postings
/// are not a hot enough path to justify threading lifetimes through every
/// call site for a handful of small allocations.
#[derive(Clone, Debug)]
pub struct Party {
    pub account_id: AccountId,
    pub account_name: String,
    pub broker_id: BrokerId,
    pub broker_name: String,
}

impl Party {
    pub fn new(account_id: AccountId, account_name: impl Into<String>, broker_id: BrokerId, broker_name: impl Into<String>) -> Self {
        Self {
            account_id,
            account_name: account_name.into(),
            broker_id,
            broker_name: broker_name.into(),
        }
    }
}

fn post(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    now: u64,
    party: &Party,
    payee: &Party,
    op: Operation,
    currency: &CurrencyCode,
    amount: i64,
    reference: &str,
    description: &str,
) -> Result<(), ContractError> {
    let new_balance = match op {
        Operation::Credit => balance::credit(
            storage,
            publisher,
            party.account_id,
            &party.account_name,
            party.broker_id,
            &party.broker_name,
            currency,
            amount,
            now,
        )?,
        Operation::Debit => balance::debit(
            storage,
            publisher,
            party.account_id,
            &party.account_name,
            party.broker_id,
            &party.broker_name,
            currency,
            amount,
            now,
        )?,
    };

    let id = next_ledger_id(storage)?;
    let entry = LedgerEntry {
        id,
        currency: currency.clone(),
        account_id: party.account_id,
        account_name: party.account_name.to_string(),
        broker_id: party.broker_id,
        broker_name: party.broker_name.to_string(),
        payee_id: payee.account_id,
        payee_name: payee.account_name.to_string(),
        payee_broker_id: payee.broker_id,
        payee_broker_name: payee.broker_name.to_string(),
        operation: op,
        amount,
        balance_after: new_balance,
        reference: reference.to_string(),
        created: now,
        description: description.to_string(),
    };
    LEDGER.save(storage, id, &entry)?;
    Ok(())
}

/// `transfer(from, to, currency, amount, reference, description)` (§4.2):
/// DEBIT `from` with a `'D'` posting, CREDIT `to` with a `'C'` posting,
/// sharing `reference`. Invariant L1 holds because the two postings carry
/// the same signed amount with opposite signs.
#[allow(clippy::too_many_arguments)]
pub fn transfer(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    now: u64,
    from: &Party,
    to: &Party,
    currency: &CurrencyCode,
    amount: i64,
    reference: &str,
    description: &str,
) -> Result<(), ContractError> {
    post(
        storage, publisher, now, from, to, Operation::Debit, currency, amount, reference,
        description,
    )?;
    post(
        storage, publisher, now, to, from, Operation::Credit, currency, amount, reference,
        description,
    )?;
    Ok(())
}

/// Settlement on a fill (§4.3, C5). Four or six ledger postings depending
/// on whether either side owes a non-zero fee: base/quote legs always
/// post, `'TF'` fee legs post only when the computed fee is non-zero.
/// `buyer_broker_pool`/`seller_broker_pool` are each side's own broker's
/// counterparty pool — the fee is debited from the trader and credited to
/// *their* broker, not to the other side of the trade.
#[allow(clippy::too_many_arguments)]
pub fn execute_order(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    now: u64,
    buyer: &Party,
    buyer_broker_pool: &Party,
    buyer_fee_bps: i64,
    seller: &Party,
    seller_broker_pool: &Party,
    seller_fee_bps: i64,
    base: &CurrencyCode,
    quote: &CurrencyCode,
    qty: i64,
    price: i64,
    trade_id: &str,
) -> Result<(), ContractError> {
    let notional = exchange_core::notional(price, qty);

    // quote leg: buyer pays notional, seller receives notional
    transfer(
        storage, publisher, now, buyer, seller, quote, notional, trade_id, "T",
    )?;
    // base leg: seller delivers qty, buyer receives qty
    transfer(
        storage, publisher, now, seller, buyer, base, qty, trade_id, "T",
    )?;

    let buyer_fee = exchange_core::fee_amount(qty, buyer_fee_bps);
    settle_trade_fee(storage, publisher, now, buyer, buyer_broker_pool, base, buyer_fee, trade_id)?;

    let seller_fee = exchange_core::fee_amount(notional, seller_fee_bps);
    settle_trade_fee(
        storage,
        publisher,
        now,
        seller,
        seller_broker_pool,
        quote,
        seller_fee,
        trade_id,
    )?;

    Ok(())
}

/// The trader fee leg of `execute_order`: the trader is debited and their
/// broker pool is credited (§4.3). A no-op when `amount <= 0`.
#[allow(clippy::too_many_arguments)]
pub fn settle_trade_fee(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    now: u64,
    trader: &Party,
    broker_pool: &Party,
    currency: &CurrencyCode,
    amount: i64,
    trade_id: &str,
) -> Result<(), ContractError> {
    if amount <= 0 {
        return Ok(());
    }
    transfer(
        storage, publisher, now, trader, broker_pool, currency, amount, trade_id, "TF",
    )
}

/// Helper for satisfying the `emit(..)` signature when a caller only wants
/// to side-effect the event bus with a precomputed [`DomainEvent`] that
/// isn't a balance posting (e.g. verification updates, e-mail jobs).
pub fn emit(publisher: &dyn Publisher, event: &DomainEvent) {
    publisher.emit(event);
}


#[cfg(test)]
mod invariant_properties {
    use super::*;
    use cosmwasm_std::testing::MockStorage;
    use exchange_core::NullPublisher;
    use proptest::prelude::*;

    proptest! {
        /// Invariants L1/L2 over an arbitrary sequence of transfers between
        /// two parties: every posting's signed amounts still sum to zero
        /// per reference, and each side's running balance never diverges
        /// from the sum of its own signed postings.
        #[test]
        fn alternating_transfers_hold_zero_sum_and_balance_consistency(
            amounts in proptest::collection::vec(1_i64..1_000_000, 1..12),
            alice_starts in proptest::bool::ANY,
        ) {
            let mut storage = MockStorage::new();
            let publisher = NullPublisher;
            let currency = CurrencyCode::new("USD");
            let alice = Party::new(AccountId(1), "alice", BrokerId(1), "b1");
            let bob = Party::new(AccountId(2), "bob", BrokerId(1), "b1");

            balance::credit(&mut storage, &publisher, AccountId(1), "alice", BrokerId(1), "b1", &currency, 10_000_000, 0).unwrap();
            balance::credit(&mut storage, &publisher, AccountId(2), "bob", BrokerId(1), "b1", &currency, 10_000_000, 0).unwrap();

            let mut alice_signed: i64 = 10_000_000;
            let mut bob_signed: i64 = 10_000_000;

            for (i, amount) in amounts.iter().enumerate() {
                let alice_to_bob = if alice_starts { i % 2 == 0 } else { i % 2 == 1 };
                let reference = format!("ref-{i}");
                if alice_to_bob {
                    transfer(&mut storage, &publisher, 0, &alice, &bob, &currency, *amount, &reference, "T").unwrap();
                    alice_signed -= amount;
                    bob_signed += amount;
                } else {
                    transfer(&mut storage, &publisher, 0, &bob, &alice, &currency, *amount, &reference, "T").unwrap();
                    bob_signed -= amount;
                    alice_signed += amount;
                }

                let entries: Vec<LedgerEntry> = LEDGER
                    .range(&storage, None, None, cosmwasm_std::Order::Ascending)
                    .map(|item| item.unwrap().1)
                    .filter(|entry| entry.reference == reference)
                    .collect();
                let signed_sum: i64 = entries
                    .iter()
                    .map(|e| match e.operation {
                        Operation::Credit => e.amount,
                        Operation::Debit => -e.amount,
                    })
                    .sum();
                prop_assert_eq!(signed_sum, 0);
            }

            prop_assert_eq!(
                balance::get_balance(&storage, AccountId(1), BrokerId(1), &currency).unwrap(),
                alice_signed
            );
            prop_assert_eq!(
                balance::get_balance(&storage, AccountId(2), BrokerId(1), &currency).unwrap(),
                bob_signed
            );
        }
    }
}
