use crate::error::CoreError;
use crate::ids::CurrencyCode;

/// Reference data for one currency (§3 Data model).
///
/// Immutable once loaded — the engine never mutates a `Currency`, it only
/// reads `pip` to scale amounts. Bootstrap/catalogue population is out of
/// scope (§1); callers construct these from whatever broker/currency
/// catalogue the host maintains.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Currency {
    pub code: CurrencyCode,
    pub sign: String,
    pub description: String,
    pub is_crypto: bool,
    /// Integer scaling factor: `1 unit = 1 / pip` of the currency.
    pub pip: i64,
}

impl Currency {
    /// Default `pip` for a currency code under the host's `satoshi_mode`
    /// flag (§6.3). Outside of `satoshi_mode`, everything defaults to
    /// `10^8`; inside it, USD and BTC use smaller denominators.
    pub fn default_pip(code: &CurrencyCode, satoshi_mode: bool) -> i64 {
        if satoshi_mode {
            match code.as_str() {
                "USD" => 100,
                "BTC" => 10_000,
                _ => 100_000_000,
            }
        } else {
            100_000_000
        }
    }

    /// Rejects a non-positive `pip` (§3: "Immutable reference data ... the
    /// integer scaling factor"; a zero or negative scale makes every
    /// `notional`/fee computation meaningless).
    pub fn new(code: impl Into<CurrencyCode>, is_crypto: bool, pip: i64) -> Result<Self, CoreError> {
        if pip <= 0 {
            return Err(CoreError::InvalidPip { pip });
        }
        let code = code.into();
        Ok(Self {
            sign: code.as_str().to_string(),
            description: code.as_str().to_string(),
            code,
            is_crypto,
            pip,
        })
    }
}

/// Quote-currency value of `qty` base-currency pips filled at `price`
/// (quote pips per 1.0 base unit), truncated toward zero (§3 "Notional").
///
/// `price * qty` is computed in `i128` to avoid overflow before the
/// division back down to `i64`; both operands are already pip-scaled
/// integers so the `10^8` divisor undoes exactly one unit of scaling.
pub fn notional(price: i64, qty: i64) -> i64 {
    ((price as i128) * (qty as i128) / 100_000_000) as i64
}

/// Fee amount on a `base_amount`, where `fee_bps` is in basis points
/// (`1 bp = 0.01%`, so 10000 bps = 100%), truncated toward zero (§4.3).
pub fn fee_amount(base_amount: i64, fee_bps: i64) -> i64 {
    ((base_amount as i128) * (fee_bps as i128) / 10_000) as i64
}

/// `floor((amount - fixed_fee) * percent_fee / 100) + fixed_fee`, the fee
/// identity used by both the deposit (§4.6) and withdraw (§4.7) state
/// machines. `percent_fee` is expressed in whole percent (e.g. `2.5` for
/// 2.5%) as a scaled integer: `percent_fee_bps_hundredths` carries two
/// decimal digits of precision (so `2.5%` is passed as `250`).
pub fn total_fees(amount: i64, percent_fee_hundredths: i64, fixed_fee: i64) -> i64 {
    let base = amount - fixed_fee;
    let percent_part = ((base as i128) * (percent_fee_hundredths as i128) / 10_000) as i64;
    percent_part + fixed_fee
}
