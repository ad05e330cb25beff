//! Share engine: what one member owes for one round.
//!
//! Pure and stateless. [`calculate_share_payment`] is the single entry point
//! used by settlement, collection tracking and the upcoming-dues worklist;
//! the auction and ladder rules behind it are not reachable on their own.

use crate::domain::{BiddingType, Circle, CircleMember, Decimal, MemberId, RoundNumber};
use serde::{Deserialize, Serialize};

mod auction;
mod ladder;
mod rules;

/// Why a member owes what they owe in a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    OrganizerExempt,
    RoundWinner,
    DeadHand,
    AliveHand,
    /// Paying the lump sum this round (round 1).
    SettlingUpfront,
    /// Lump sum already paid; owes nothing from round 2 on.
    SettledUpfront,
}

impl PaymentStatus {
    /// Statuses that can never accrue a late fine.
    pub fn is_fine_exempt(&self) -> bool {
        matches!(
            self,
            PaymentStatus::OrganizerExempt
                | PaymentStatus::RoundWinner
                | PaymentStatus::SettledUpfront
        )
    }
}

/// Parameters of one engine invocation. Borrowed snapshots, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct CalculationInput<'a> {
    pub circle: &'a Circle,
    pub member: &'a CircleMember,
    pub round_number: RoundNumber,
    pub winner_id: Option<MemberId>,
    /// Decided or provisional interest of the round.
    pub bid_amount: Decimal,
    pub is_round_open: bool,
}

impl<'a> CalculationInput<'a> {
    /// No winner, zero bid, round closed.
    pub fn new(circle: &'a Circle, member: &'a CircleMember, round_number: RoundNumber) -> Self {
        Self {
            circle,
            member,
            round_number,
            winner_id: None,
            bid_amount: Decimal::zero(),
            is_round_open: false,
        }
    }

    pub fn with_winner(mut self, winner_id: Option<MemberId>) -> Self {
        self.winner_id = winner_id;
        self
    }

    pub fn with_bid(mut self, bid_amount: Decimal) -> Self {
        self.bid_amount = bid_amount;
        self
    }

    pub fn round_open(mut self, is_round_open: bool) -> Self {
        self.is_round_open = is_round_open;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResult {
    pub pay_amount: Decimal,
    pub status: PaymentStatus,
    pub note: String,
}

impl CalculationResult {
    pub fn new(pay_amount: Decimal, status: PaymentStatus, note: impl Into<String>) -> Self {
        Self {
            pay_amount,
            status,
            note: note.into(),
        }
    }

    /// Amount this member stands for in aggregate "expected" totals.
    ///
    /// A hand settled upfront pays zero per round but its lump sum covers the
    /// round, so it counts as the circle principal. Every aggregator goes
    /// through this instead of summing `pay_amount` for expectations.
    pub fn expected_contribution(&self, circle: &Circle) -> Decimal {
        match self.status {
            PaymentStatus::SettledUpfront => circle.principal,
            _ => self.pay_amount,
        }
    }
}

/// Compute what `input.member` owes for `input.round_number`.
pub fn calculate_share_payment(input: &CalculationInput<'_>) -> CalculationResult {
    match input.circle.bidding_type {
        BiddingType::Ladder => ladder::calculate(input),
        BiddingType::Auction => auction::calculate(input),
    }
}
