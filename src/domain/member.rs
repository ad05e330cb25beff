//! A hand (slot) held within a circle.

use crate::domain::circle::str_enum;
use crate::domain::{CircleId, Decimal, MemberId, RoundNumber, UserId, ORGANIZER_SLOT};
use serde::{Deserialize, Serialize};

/// Whether a hand has already taken a pot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandStatus {
    Alive,
    Dead,
}

str_enum!(HandStatus, "hand status", {
    Alive => "alive",
    Dead => "dead",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleMember {
    pub id: MemberId,
    pub circle_id: CircleId,
    pub user_id: UserId,
    pub display_name: String,
    pub slot_number: u32,
    pub hand_status: HandStatus,
    /// Round this hand won, set once dead.
    pub won_round: Option<RoundNumber>,
    /// Interest this hand bid when it won.
    pub won_bid_amount: Option<Decimal>,
    /// Ladder circles: exact amount owed every round.
    pub fixed_due_amount: Option<Decimal>,
    /// Lump sum paid in round 1 in lieu of all later contributions.
    pub settle_upfront_amount: Option<Decimal>,
}

impl CircleMember {
    pub fn is_organizer(&self) -> bool {
        self.slot_number == ORGANIZER_SLOT
    }

    pub fn is_dead(&self) -> bool {
        self.hand_status == HandStatus::Dead
    }

    /// True when this hand took a pot strictly before `round`.
    pub fn won_before(&self, round: RoundNumber) -> bool {
        self.is_dead() && self.won_round.is_some_and(|won| won < round)
    }

    pub fn settle_upfront(&self) -> Option<Decimal> {
        self.settle_upfront_amount.and_then(Decimal::positive)
    }

    pub fn fixed_due(&self) -> Option<Decimal> {
        self.fixed_due_amount.and_then(Decimal::positive)
    }

    pub fn winning_bid(&self) -> Decimal {
        self.won_bid_amount.unwrap_or_default()
    }

    /// Mark this hand as the winner of `round` with `bid`.
    pub fn record_win(&mut self, round: RoundNumber, bid: Decimal) {
        self.hand_status = HandStatus::Dead;
        self.won_round = Some(round);
        self.won_bid_amount = Some(bid);
    }
}
