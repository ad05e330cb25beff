//! Payment rule for ladder (fixed order) circles.
//!
//! Exemptions match the auction rule. A configured fixed due amount then wins
//! over everything else; without one the auction dead/alive formulas apply.

use super::rules::{
    alive_hand_with_bid, Rule, RuleChain, DEAD_HAND, ORGANIZER, ROUND_WINNER, SETTLED_UPFRONT,
    SETTLING_UPFRONT,
};
use super::{CalculationInput, CalculationResult, PaymentStatus};
use crate::domain::Decimal;

const FIXED_DUE: Rule = Rule {
    name: "fixed_due",
    applies: has_fixed_due,
    outcome: fixed_due,
};

// DEAD_HAND and the catch-all repeat the auction formulas for circles that
// never configured per-slot amounts.
static RULES: [Rule; 6] = [
    ORGANIZER,
    ROUND_WINNER,
    SETTLING_UPFRONT,
    SETTLED_UPFRONT,
    FIXED_DUE,
    DEAD_HAND,
];

static CHAIN: RuleChain = RuleChain {
    rules: &RULES,
    catch_all: ladder_alive_hand,
};

pub(crate) fn calculate(input: &CalculationInput<'_>) -> CalculationResult {
    CHAIN.evaluate(input)
}

fn has_fixed_due(input: &CalculationInput<'_>) -> bool {
    input.member.fixed_due().is_some()
}

fn fixed_due(input: &CalculationInput<'_>) -> CalculationResult {
    let amount = input.member.fixed_due().unwrap_or_default();
    let status = if input.member.won_before(input.round_number) {
        PaymentStatus::DeadHand
    } else {
        PaymentStatus::AliveHand
    };
    CalculationResult::new(
        amount,
        status,
        format!("Fixed ladder due of {} for slot {}", amount, input.member.slot_number),
    )
}

/// An open ladder round has no named interest yet.
fn ladder_alive_hand(input: &CalculationInput<'_>) -> CalculationResult {
    let bid = if input.is_round_open {
        Decimal::zero()
    } else {
        input.bid_amount
    };
    alive_hand_with_bid(input, bid)
}
