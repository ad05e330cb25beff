//! One payout round of a circle.

use crate::domain::circle::str_enum;
use crate::domain::{BiddingType, CircleId, CircleMember, Decimal, MemberId, RoundNumber};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoundStatus {
    /// Winner and bid not yet decided.
    Open,
    /// Winner decided, contributions being gathered.
    Collecting,
    /// Fully settled.
    Completed,
}

str_enum!(RoundStatus, "round status", {
    Open => "open",
    Collecting => "collecting",
    Completed => "completed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Round {
    pub circle_id: CircleId,
    pub round_number: RoundNumber,
    pub round_date: NaiveDate,
    pub status: RoundStatus,
    pub winner_id: Option<MemberId>,
    /// Winning interest; zero until decided.
    pub bid_amount: Decimal,
    pub total_pot: Option<Decimal>,
}

impl Round {
    pub fn open(circle_id: CircleId, round_number: RoundNumber, round_date: NaiveDate) -> Self {
        Self {
            circle_id,
            round_number,
            round_date,
            status: RoundStatus::Open,
            winner_id: None,
            bid_amount: Decimal::zero(),
            total_pot: None,
        }
    }

    pub fn is_open(&self) -> bool {
        self.status == RoundStatus::Open
    }

    /// Whether contributions for this round can be asked for.
    ///
    /// Auction rounds only once a winner is decided; ladder rounds as soon as
    /// they exist, since the winner is known from the slot order.
    pub fn is_collectible(&self, bidding_type: BiddingType) -> bool {
        match bidding_type {
            BiddingType::Auction => self.status == RoundStatus::Collecting,
            BiddingType::Ladder => {
                matches!(self.status, RoundStatus::Open | RoundStatus::Collecting)
            }
        }
    }

    /// Decided winner, or for ladder circles the member occupying slot N.
    pub fn effective_winner(
        &self,
        bidding_type: BiddingType,
        members: &[CircleMember],
    ) -> Option<MemberId> {
        self.winner_id.or_else(|| match bidding_type {
            BiddingType::Ladder => members
                .iter()
                .find(|m| m.slot_number == self.round_number)
                .map(|m| m.id),
            BiddingType::Auction => None,
        })
    }
}
