//! Ordered predicate→outcome rules shared by both payment variants.
//!
//! A chain is evaluated top to bottom; the first rule whose predicate holds
//! produces the result, otherwise the chain's catch-all does.

use super::{CalculationInput, CalculationResult, PaymentStatus};
use crate::domain::{Decimal, ShareType};

pub(crate) type Predicate = fn(&CalculationInput<'_>) -> bool;
pub(crate) type Outcome = fn(&CalculationInput<'_>) -> CalculationResult;

pub(crate) struct Rule {
    pub name: &'static str,
    pub applies: Predicate,
    pub outcome: Outcome,
}

pub(crate) struct RuleChain {
    pub rules: &'static [Rule],
    pub catch_all: Outcome,
}

impl RuleChain {
    pub fn evaluate(&self, input: &CalculationInput<'_>) -> CalculationResult {
        match self.rules.iter().find(|rule| (rule.applies)(input)) {
            Some(rule) => {
                tracing::trace!(
                    rule = rule.name,
                    member = %input.member.id,
                    round = input.round_number,
                    "share rule matched"
                );
                (rule.outcome)(input)
            }
            None => (self.catch_all)(input),
        }
    }
}

// ---------------------------------------------------------------------------
// Exemptions common to both variants
// ---------------------------------------------------------------------------

pub(crate) const ORGANIZER: Rule = Rule {
    name: "organizer",
    applies: is_organizer,
    outcome: organizer_exempt,
};

pub(crate) const ROUND_WINNER: Rule = Rule {
    name: "round_winner",
    applies: is_round_winner,
    outcome: round_winner,
};

pub(crate) const SETTLING_UPFRONT: Rule = Rule {
    name: "settling_upfront",
    applies: settles_this_round,
    outcome: settling_upfront,
};

pub(crate) const SETTLED_UPFRONT: Rule = Rule {
    name: "settled_upfront",
    applies: settles_upfront,
    outcome: settled_upfront,
};

fn is_organizer(input: &CalculationInput<'_>) -> bool {
    input.member.is_organizer()
}

fn organizer_exempt(_: &CalculationInput<'_>) -> CalculationResult {
    CalculationResult::new(
        Decimal::zero(),
        PaymentStatus::OrganizerExempt,
        "Organizer slot does not contribute",
    )
}

fn is_round_winner(input: &CalculationInput<'_>) -> bool {
    input.winner_id == Some(input.member.id)
}

fn round_winner(input: &CalculationInput<'_>) -> CalculationResult {
    CalculationResult::new(
        Decimal::zero(),
        PaymentStatus::RoundWinner,
        format!("Receives the pot of round {}", input.round_number),
    )
}

fn settles_upfront(input: &CalculationInput<'_>) -> bool {
    input.member.settle_upfront().is_some()
}

fn settles_this_round(input: &CalculationInput<'_>) -> bool {
    settles_upfront(input) && input.round_number == 1
}

fn settling_upfront(input: &CalculationInput<'_>) -> CalculationResult {
    let amount = input.member.settle_upfront().unwrap_or_default();
    CalculationResult::new(
        amount,
        PaymentStatus::SettlingUpfront,
        format!("Lump-sum settlement of {} for the whole circle", amount),
    )
}

fn settled_upfront(_: &CalculationInput<'_>) -> CalculationResult {
    CalculationResult::new(
        Decimal::zero(),
        PaymentStatus::SettledUpfront,
        "Already settled by lump sum in round 1",
    )
}

// ---------------------------------------------------------------------------
// Dead / alive formulas
// ---------------------------------------------------------------------------

pub(crate) const DEAD_HAND: Rule = Rule {
    name: "dead_hand",
    applies: is_dead_hand,
    outcome: dead_hand_repayment,
};

fn is_dead_hand(input: &CalculationInput<'_>) -> bool {
    input.member.won_before(input.round_number)
}

fn dead_hand_repayment(input: &CalculationInput<'_>) -> CalculationResult {
    let principal = input.circle.principal;
    match input.circle.share_type {
        ShareType::InterestAdded => {
            let interest = input.member.winning_bid();
            CalculationResult::new(
                principal + interest,
                PaymentStatus::DeadHand,
                format!(
                    "Repays principal {} plus interest {} taken in round {}",
                    principal,
                    interest,
                    input.member.won_round.unwrap_or_default()
                ),
            )
        }
        ShareType::InterestDeducted => CalculationResult::new(
            principal,
            PaymentStatus::DeadHand,
            format!("Pays full principal {} after winning", principal),
        ),
    }
}

/// Catch-all for a hand that has not yet won before this round.
pub(crate) fn alive_hand(input: &CalculationInput<'_>) -> CalculationResult {
    alive_hand_with_bid(input, input.bid_amount)
}

pub(crate) fn alive_hand_with_bid(input: &CalculationInput<'_>, bid: Decimal) -> CalculationResult {
    let principal = input.circle.principal;
    match input.circle.share_type {
        ShareType::InterestDeducted => {
            let amount = (principal - bid).non_negative();
            let note = if input.is_round_open && bid.is_zero() {
                format!("Awaiting bid finalization; principal {} before interest", principal)
            } else {
                format!("Principal {} less round interest {}", principal, bid)
            };
            CalculationResult::new(amount, PaymentStatus::AliveHand, note)
        }
        ShareType::InterestAdded => CalculationResult::new(
            principal,
            PaymentStatus::AliveHand,
            format!("Pays principal {}", principal),
        ),
    }
}
