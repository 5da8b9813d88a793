use cosmwasm_std::Storage;
use exchange_core::{AccountId, BrokerId, CoreError, Order, OrderType, Publisher, Side, Symbol, Trade, TradeType};

use crate::balance;
use crate::book::{crosses, BookDirectory};
use crate::broker::broker_pool_account;
use crate::error::ContractError;
use crate::ledger::{self, Party};
use crate::state::{self, next_order_id, ACCOUNT_ACTIVE_ORDERS, ORDERS, TRADES};

/// Display name for ledger postings. No full `User` store is in scope
/// here (§1 keeps account/broker identity out of this crate beyond the
/// ids this engine actually needs); a stable, derived label is enough for
/// the ledger's human-readable columns.
pub fn display_name(id: u64) -> String {
    format!("account-{id}")
}

#[derive(Clone, Debug)]
pub struct NewOrderRequest {
    pub user_id: AccountId,
    pub account_id: AccountId,
    pub broker_id: BrokerId,
    pub symbol: Symbol,
    pub side: Side,
    pub order_type: OrderType,
    pub price: i64,
    pub qty: i64,
    pub fee_bps: i64,
    pub client_order_id: Option<String>,
}

pub struct PlaceOrderOutcome {
    pub order: Order,
    pub trades: Vec<Trade>,
}

/// `place_order` (§4.4.4).
///
/// Returns `Ok(None)` when the self-affordability cap reduces the
/// requested quantity to zero — per §4.4.4 step 1 this is a rejection,
/// not an error, so no `Order` row is ever created for it.
pub fn place_order(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    books: &BookDirectory,
    now: u64,
    req: NewOrderRequest,
) -> Result<Option<PlaceOrderOutcome>, ContractError> {
    // `req.symbol` may have been built from untrusted wire input by the
    // session handler (out of scope, §1); re-validate here rather than
    // let `base()`/`quote()` panic on a too-short string below.
    let symbol = Symbol::parse(req.symbol.as_str())?;
    let base = symbol.base();
    let quote = symbol.quote();

    if req.qty <= 0 {
        return Err(CoreError::NegativeAmount { amount: req.qty }.into());
    }

    let qty = self_affordability_cap(storage, books, &req, &base, &quote)?;
    if qty == 0 {
        return Ok(None);
    }

    let id = next_order_id(storage)?;
    let mut order = Order::new(
        id,
        req.user_id,
        req.account_id,
        req.broker_id,
        symbol.clone(),
        req.side,
        req.order_type,
        req.price,
        qty,
        req.fee_bps,
        req.client_order_id,
        now,
    );

    let shard = books.shard_for(&symbol);
    let mut trades = Vec::new();
    {
        let mut book = shard.lock();

        loop {
            let opposite_side = match order.side {
                Side::Buy => Side::Sell,
                Side::Sell => Side::Buy,
            };
            let head = match book.side(opposite_side).head() {
                Some(h) => h.clone(),
                None => break,
            };

            let (buy, sell) = match order.side {
                Side::Buy => (&order, &head),
                Side::Sell => (&head, &order),
            };
            if !crosses(buy, sell) {
                break;
            }

            let trade_price = if !head.is_market() {
                head.price
            } else if !order.is_market() {
                order.price
            } else {
                // Both market: §4.4.4 edge case, no trade occurs.
                break;
            };

            let execute_qty = order.leaves_qty.min(head.leaves_qty);

            let trade_id = Trade::derive_id(order.id, head.id);
            let mut counter = head.clone();

            tracing::debug!(symbol = %symbol, %trade_id, execute_qty, trade_price, "match decision");

            settle_fill(storage, publisher, now, &order, &counter, execute_qty, trade_price, &base, &quote, &trade_id)?;

            order.execute(execute_qty, trade_price);
            counter.execute(execute_qty, trade_price);

            let (buyer_order, seller_order) = match order.side {
                Side::Buy => (&order, &counter),
                Side::Sell => (&counter, &order),
            };
            let trade = Trade {
                id: trade_id,
                order_id: order.id,
                counter_order_id: counter.id,
                buyer_username: display_name(buyer_order.account_id.0),
                seller_username: display_name(seller_order.account_id.0),
                side: order.side,
                symbol: symbol.clone(),
                size: execute_qty,
                price: trade_price,
                created: now,
                trade_type: TradeType::Normal,
            };
            TRADES.save(storage, trade.id.clone(), &trade)?;
            trades.push(trade);

            if counter.has_leaves() {
                if let Some(slot) = book.side_mut(opposite_side).head_mut() {
                    *slot = counter;
                }
            } else {
                book.side_mut(opposite_side).pop_head();
                ACCOUNT_ACTIVE_ORDERS.remove(storage, (counter.account_id.0, counter.id));
            }
            ORDERS.save(storage, counter.id, &counter)?;

            if !order.has_leaves() {
                break;
            }
        }

        if order.has_leaves() {
            match order.order_type {
                OrderType::Limit => {
                    book.side_mut(order.side).insert(order.clone());
                    ACCOUNT_ACTIVE_ORDERS.save(storage, (order.account_id.0, order.id), &())?;
                }
                OrderType::Market => {
                    let remainder = order.leaves_qty;
                    order.cancel_qty(remainder);
                }
            }
        }
    }

    state::remember_symbol(storage, &symbol)?;
    ORDERS.save(storage, order.id, &order)?;

    Ok(Some(PlaceOrderOutcome { order, trades }))
}

#[allow(clippy::too_many_arguments)]
fn settle_fill(
    storage: &mut dyn Storage,
    publisher: &dyn Publisher,
    now: u64,
    incoming: &Order,
    counter: &Order,
    qty: i64,
    price: i64,
    base: &exchange_core::CurrencyCode,
    quote: &exchange_core::CurrencyCode,
    trade_id: &str,
) -> Result<(), ContractError> {
    let (buyer, seller) = match incoming.side {
        Side::Buy => (incoming, counter),
        Side::Sell => (counter, incoming),
    };

    let buyer_party = Party::new(buyer.account_id, display_name(buyer.account_id.0), buyer.broker_id, display_name(buyer.broker_id.0));
    let buyer_pool = Party::new(
        broker_pool_account(buyer.broker_id),
        display_name(buyer.broker_id.0),
        buyer.broker_id,
        display_name(buyer.broker_id.0),
    );
    let seller_party = Party::new(seller.account_id, display_name(seller.account_id.0), seller.broker_id, display_name(seller.broker_id.0));
    let seller_pool = Party::new(
        broker_pool_account(seller.broker_id),
        display_name(seller.broker_id.0),
        seller.broker_id,
        display_name(seller.broker_id.0),
    );

    ledger::execute_order(
        storage,
        publisher,
        now,
        &buyer_party,
        &buyer_pool,
        buyer.fee_bps,
        &seller_party,
        &seller_pool,
        seller.fee_bps,
        base,
        quote,
        qty,
        price,
        trade_id,
    )
}

/// §4.4.4 step 1. For a market buy the available quote balance is capped
/// by the current best opposite ask snapshot at call time.
///
/// A market buy against an *empty* ask book is a different case from a
/// zero affordable quantity: there is no price to cap against at all, so
/// the cap passes the full requested quantity through uncapped (E3) —
/// the match loop then finds no head, and step 3's residual placement
/// cancels the whole order (`status='4'`, `cxl_qty=order_qty`) rather
/// than this function rejecting it before an `Order` row ever exists.
fn self_affordability_cap(
    storage: &dyn Storage,
    books: &BookDirectory,
    req: &NewOrderRequest,
    base: &exchange_core::CurrencyCode,
    quote: &exchange_core::CurrencyCode,
) -> Result<i64, ContractError> {
    match req.side {
        Side::Sell => {
            let base_balance = balance::get_balance(storage, req.account_id, req.broker_id, base)?;
            Ok(req.qty.min(base_balance.max(0)))
        }
        Side::Buy => {
            let quote_balance = balance::get_balance(storage, req.account_id, req.broker_id, quote)?;
            let price = if req.order_type == OrderType::Limit {
                req.price
            } else {
                let shard = books.shard_for(&req.symbol);
                let book = shard.lock();
                match book.sells.head() {
                    Some(ask) => ask.price,
                    None => return Ok(req.qty),
                }
            };
            if price <= 0 {
                return Ok(0);
            }
            let affordable = ((quote_balance as i128) * 100_000_000 / (price as i128)) as i64;
            Ok(req.qty.min(affordable.max(0)))
        }
    }
}

/// `cancel_order` (§4.4.6, §5 "cancellation"). A no-op-with-error when the
/// order is not in the account's active set (§7 `OrderNotFound`); already
/// fully filled/cancelled orders are a silent no-op per §5's "observe the
/// post-matching state" rule, surfaced here as `Ok(order)` unchanged.
pub fn cancel_order(
    storage: &mut dyn Storage,
    books: &BookDirectory,
    account_id: AccountId,
    order_id: u64,
) -> Result<Order, ContractError> {
    if ACCOUNT_ACTIVE_ORDERS
        .may_load(storage, (account_id.0, order_id))?
        .is_none()
    {
        return Err(ContractError::OrderNotFound { order_id });
    }

    let mut order = ORDERS
        .may_load(storage, order_id)?
        .ok_or(ContractError::OrderNotFound { order_id })?;

    if !order.has_leaves() {
        return Ok(order);
    }

    let shard = books.shard_for(&order.symbol);
    {
        let mut book = shard.lock();
        if let Some(mut resting) = book.side_mut(order.side).remove_cancelled(order_id) {
            resting.cancel_qty(resting.leaves_qty);
            order = resting;
        } else {
            order.cancel_qty(order.leaves_qty);
        }
    }

    ACCOUNT_ACTIVE_ORDERS.remove(storage, (account_id.0, order_id));
    ORDERS.save(storage, order_id, &order)?;
    Ok(order)
}
