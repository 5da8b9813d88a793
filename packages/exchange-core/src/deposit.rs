use crate::ids::{AccountId, BrokerId, CurrencyCode};

/// Deposit status (§4.6). Numeric values match the wire schema.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
#[repr(u8)]
pub enum DepositStatus {
    PendingUnconfirmed = 0,
    UserConfirmed = 1,
    InProgress = 2,
    Complete = 4,
    Cancelled = 8,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum DepositType {
    /// Crypto, direct on-chain deposit.
    Cry,
    /// Bank transfer in.
    Bti,
    /// Bank-branch settlement.
    Bbs,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Deposit {
    pub id: String,
    pub user_id: AccountId,
    pub account_id: AccountId,
    pub broker_id: BrokerId,
    pub deposit_option_id: Option<u64>,
    pub deposit_option_name: Option<String>,
    pub broker_deposit_ctrl_num: Option<String>,
    pub secret: Option<String>,
    pub deposit_type: DepositType,
    pub currency: CurrencyCode,
    pub value: i64,
    pub paid_value: i64,
    pub status: DepositStatus,
    pub data: serde_json::Value,
    pub instructions: Vec<Instruction>,
    pub client_order_id: Option<String>,
    pub percent_fee: i64,
    pub fixed_fee: i64,
    pub reason_id: Option<i32>,
    pub reason: Option<String>,
    pub created: u64,
}

/// One confirmation threshold: `amount_lo < amount <= amount_hi` requires
/// `min_confirmations` observed confirmations (§3 glossary, §4.6).
#[derive(Copy, Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ConfirmationThreshold {
    pub amount_lo: i64,
    pub amount_hi: i64,
    pub min_confirmations: u32,
}

/// Finds the threshold bracket covering `amount`, per §4.6's
/// `amount_lo < amount ≤ amount_hi` rule. `amount_hi = i64::MAX` models an
/// unbounded upper bracket (E5's `(200·10^8, ∞, 6)`).
pub fn confirmation_threshold_for(
    thresholds: &[ConfirmationThreshold],
    amount: i64,
) -> Option<&ConfirmationThreshold> {
    thresholds
        .iter()
        .find(|t| t.amount_lo < amount && amount <= t.amount_hi)
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum OnTimeout {
    Continue,
    Break,
}

impl Default for OnTimeout {
    fn default() -> Self {
        OnTimeout::Continue
    }
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct InstructionFilter {
    pub value: Option<i64>,
    pub paid_value: Option<i64>,
}

impl InstructionFilter {
    fn matches(&self, deposit_value: i64, deposit_paid_value: i64) -> bool {
        self.value.map_or(true, |v| v == deposit_value)
            && self.paid_value.map_or(true, |pv| pv == deposit_paid_value)
    }
}

/// An auto-routing directive embedded in a deposit (§4.6 "Embedded
/// instruction interpreter"). `msg` carries `{$Value}`/`{$PaidValue}`/
/// `{$ClOrdID}` template tokens substituted by [`resolve_instruction`].
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Instruction {
    pub timeout: Option<u64>,
    #[serde(default)]
    pub on_timeout: OnTimeout,
    #[serde(default)]
    pub filter: InstructionFilter,
    pub msg: serde_json::Value,
}

/// Picks the first matching, non-timed-out instruction and substitutes its
/// template tokens, per §4.6. `now - created` is the deposit's age in
/// seconds against each instruction's `timeout`. An instruction whose `msg`
/// is not a `MsgType: "D"` new-order message is skipped, not returned.
///
/// Malformed instructions never abort the search (§7 "exceptions from the
/// embedded instruction interpreter are swallowed") — this function has no
/// error path; a instruction that fails to resolve is simply skipped.
pub fn resolve_instruction(deposit: &Deposit, now: u64) -> Option<serde_json::Value> {
    let age = now.saturating_sub(deposit.created);
    for instruction in &deposit.instructions {
        let timed_out = instruction.timeout.map_or(false, |t| age >= t);
        if timed_out {
            if matches!(instruction.on_timeout, OnTimeout::Break) {
                return None;
            }
            continue;
        }
        if instruction.msg.get("MsgType").and_then(|v| v.as_str()) != Some("D") {
            continue;
        }
        if instruction
            .filter
            .matches(deposit.value, deposit.paid_value)
        {
            return Some(substitute_tokens(&instruction.msg, deposit));
        }
    }
    None
}

fn substitute_tokens(msg: &serde_json::Value, deposit: &Deposit) -> serde_json::Value {
    let client_order_id = deposit.client_order_id.clone().unwrap_or_default();
    match msg {
        serde_json::Value::String(s) => {
            let replaced = s
                .replace("{$Value}", &deposit.value.to_string())
                .replace("{$PaidValue}", &deposit.paid_value.to_string())
                .replace("{$ClOrdID}", &client_order_id);
            serde_json::Value::String(replaced)
        }
        serde_json::Value::Object(map) => serde_json::Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), substitute_tokens(v, deposit)))
                .collect(),
        ),
        serde_json::Value::Array(items) => {
            serde_json::Value::Array(items.iter().map(|v| substitute_tokens(v, deposit)).collect())
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_deposit() -> Deposit {
        Deposit {
            id: "dep-1".into(),
            user_id: AccountId(1),
            account_id: AccountId(1),
            broker_id: BrokerId(1),
            deposit_option_id: None,
            deposit_option_name: None,
            broker_deposit_ctrl_num: None,
            secret: None,
            deposit_type: DepositType::Cry,
            currency: CurrencyCode::new("BTC"),
            value: 2 * 100_000_000,
            paid_value: 2 * 100_000_000,
            status: DepositStatus::PendingUnconfirmed,
            data: serde_json::json!({}),
            instructions: vec![],
            client_order_id: Some("clord-1".into()),
            percent_fee: 0,
            fixed_fee: 0,
            reason_id: None,
            reason: None,
            created: 1_000,
        }
    }

    #[test]
    fn confirmation_threshold_picks_matching_bracket() {
        let thresholds = vec![
            ConfirmationThreshold { amount_lo: 0, amount_hi: 3 * 100_000_000, min_confirmations: 1 },
            ConfirmationThreshold { amount_lo: 3 * 100_000_000, amount_hi: 200 * 100_000_000, min_confirmations: 3 },
            ConfirmationThreshold { amount_lo: 200 * 100_000_000, amount_hi: i64::MAX, min_confirmations: 6 },
        ];
        let found = confirmation_threshold_for(&thresholds, 2 * 100_000_000).unwrap();
        assert_eq!(found.min_confirmations, 1);
    }

    #[test]
    fn instruction_substitutes_tokens() {
        let mut deposit = base_deposit();
        deposit.instructions.push(Instruction {
            timeout: None,
            on_timeout: OnTimeout::Continue,
            filter: InstructionFilter::default(),
            msg: serde_json::json!({"MsgType": "D", "OrderQty": "{$Value}", "ClOrdID": "{$ClOrdID}"}),
        });
        let resolved = resolve_instruction(&deposit, 1_500).unwrap();
        assert_eq!(resolved["OrderQty"], "200000000");
        assert_eq!(resolved["ClOrdID"], "clord-1");
    }

    #[test]
    fn non_order_msg_type_is_skipped_in_favor_of_the_next_instruction() {
        let mut deposit = base_deposit();
        deposit.instructions.push(Instruction {
            timeout: None,
            on_timeout: OnTimeout::Continue,
            filter: InstructionFilter::default(),
            msg: serde_json::json!({"MsgType": "C", "OrderQty": "{$Value}"}),
        });
        deposit.instructions.push(Instruction {
            timeout: None,
            on_timeout: OnTimeout::Continue,
            filter: InstructionFilter::default(),
            msg: serde_json::json!({"MsgType": "D", "OrderQty": "{$Value}"}),
        });
        let resolved = resolve_instruction(&deposit, 1_500).unwrap();
        assert_eq!(resolved["MsgType"], "D");
        assert_eq!(resolved["OrderQty"], "200000000");
    }

    #[test]
    fn timed_out_break_stops_search() {
        let mut deposit = base_deposit();
        deposit.instructions.push(Instruction {
            timeout: Some(10),
            on_timeout: OnTimeout::Break,
            filter: InstructionFilter::default(),
            msg: serde_json::json!({"MsgType": "D"}),
        });
        assert!(resolve_instruction(&deposit, 2_000).is_none());
    }
}
