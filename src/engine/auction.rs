//! Payment rule for auction circles.
//!
//! Order: organizer, round winner, lump-sum settlement (round 1 then later),
//! dead hand repaying, and finally the alive-hand share of the round.

use super::rules::{
    alive_hand, Rule, RuleChain, DEAD_HAND, ORGANIZER, ROUND_WINNER, SETTLED_UPFRONT,
    SETTLING_UPFRONT,
};
use super::{CalculationInput, CalculationResult};

static RULES: [Rule; 5] = [
    ORGANIZER,
    ROUND_WINNER,
    SETTLING_UPFRONT,
    SETTLED_UPFRONT,
    DEAD_HAND,
];

static CHAIN: RuleChain = RuleChain {
    rules: &RULES,
    catch_all: alive_hand,
};

pub(crate) fn calculate(input: &CalculationInput<'_>) -> CalculationResult {
    CHAIN.evaluate(input)
}
