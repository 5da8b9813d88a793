use std::fmt;

use crate::error::CoreError;

/// Identifier of a `User` row acting as an account holder.
///
/// `account_id == user.id` everywhere in this crate (see GLOSSARY); a
/// dedicated type keeps balance/ledger keys from being accidentally
/// transposed with a [`BrokerId`] or a raw order/trade id.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct AccountId(pub u64);

/// Identifier of a `User` row with `is_broker = true`.
///
/// Broker ids share the same id space as [`AccountId`] (a broker *is* a
/// user), but the newtype still prevents passing one where the other is
/// expected.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct BrokerId(pub u64);

/// A currency code such as `"BTC"` or `"USD"`.
///
/// Kept as an owned, uppercased `String` rather than a fixed-size array:
/// the data model imposes no hard length limit beyond the reference
/// schema's `VARCHAR(4)`, and a handful of allocations per order is not on
/// a hot path worth a custom small-string type.
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct CurrencyCode(String);

impl CurrencyCode {
    pub fn new(code: impl AsRef<str>) -> Self {
        Self(code.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallible counterpart to [`CurrencyCode::new`] for untrusted/wire
    /// input (§7 `ConfigurationError`'s sibling at the currency-code
    /// boundary): rejects a code that is empty once trimmed.
    pub fn parse(code: impl AsRef<str>) -> Result<Self, CoreError> {
        let candidate = Self::new(code);
        if candidate.0.is_empty() {
            return Err(CoreError::EmptyCurrencyCode {});
        }
        Ok(candidate)
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

/// A trading symbol such as `"BTCUSD"`. `symbol[0..3]` is the base
/// currency, `symbol[3..]` is the quote currency (§3).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(symbol: impl AsRef<str>) -> Self {
        Self(symbol.as_ref().trim().to_ascii_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fallible counterpart to [`Symbol::new`] for untrusted/wire input:
    /// `symbol[..3]` is the base currency and `symbol[3..]` is the quote
    /// (§3), so anything shorter than 4 characters has no quote leg and is
    /// rejected rather than panicking on the slice in [`Symbol::base`]/
    /// [`Symbol::quote`].
    pub fn parse(symbol: impl AsRef<str>) -> Result<Self, CoreError> {
        let candidate = Self::new(symbol);
        if candidate.0.len() < 4 {
            return Err(CoreError::InvalidSymbol { symbol: candidate.0 });
        }
        Ok(candidate)
    }

    /// Base currency, the first three characters of the symbol.
    ///
    /// Panics if the symbol is shorter than 4 characters — callers taking
    /// symbols from untrusted input should construct via [`Symbol::parse`]
    /// first, which rejects that case with [`CoreError::InvalidSymbol`].
    pub fn base(&self) -> CurrencyCode {
        CurrencyCode::new(&self.0[..3])
    }

    /// Quote currency, everything past the first three characters.
    pub fn quote(&self) -> CurrencyCode {
        CurrencyCode::new(&self.0[3..])
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
