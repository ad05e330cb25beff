//! Bidding settlement: the pot a proposed (winner, bid) pair produces.
//!
//! Manual entry and a closed live auction both end up in [`settle`], so the
//! same inputs always yield the same totals whatever decided the winner.

use crate::domain::{
    Circle, CircleId, CircleMember, CircleStatus, Decimal, MemberId, Round, RoundNumber,
    RoundStatus,
};
use crate::engine::{calculate_share_payment, CalculationInput, PaymentStatus};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidSource {
    Manual,
    LiveAuction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementProposal {
    pub winner_id: MemberId,
    pub bid_amount: Decimal,
    pub source: BidSource,
}

/// Rejected settlement input. Reported to the user, never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettlementError {
    #[error("circle {0} is not active")]
    CircleNotActive(CircleId),
    #[error("round {round} is outside 1..={total_slots}")]
    RoundOutOfRange {
        round: RoundNumber,
        total_slots: u32,
    },
    #[error("round {0} already has a winner")]
    RoundAlreadyDecided(RoundNumber),
    #[error("bid amount cannot be negative")]
    NegativeBid,
    #[error("bid {bid} is below the minimum bid of {minimum}")]
    BidBelowMinimum { bid: Decimal, minimum: Decimal },
    #[error("member {0} is not part of this circle")]
    UnknownWinner(MemberId),
    #[error("member {member} already won round {round}")]
    WinnerAlreadyWon { member: MemberId, round: RoundNumber },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberShare {
    pub member_id: MemberId,
    pub slot_number: u32,
    pub display_name: String,
    pub pay_amount: Decimal,
    pub status: PaymentStatus,
    pub note: String,
    pub expected_contribution: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementPreview {
    pub circle_id: CircleId,
    pub round_number: RoundNumber,
    pub winner_id: MemberId,
    pub bid_amount: Decimal,
    pub source: BidSource,
    pub shares: Vec<MemberShare>,
    /// Sum of every member's pay amount for the round.
    pub total_pot: Decimal,
    /// Same sum with lump-sum hands counted at the principal.
    pub expected_total: Decimal,
    pub admin_fee: Decimal,
    /// What the winner is handed: pot less the admin fee.
    pub net_payout: Decimal,
}

impl SettlementPreview {
    /// Round record after the winner is decided.
    pub fn finalized_round(&self, round: &Round) -> Round {
        Round {
            status: RoundStatus::Collecting,
            winner_id: Some(self.winner_id),
            bid_amount: self.bid_amount,
            total_pot: Some(self.total_pot),
            ..round.clone()
        }
    }
}

/// Round 1, the final round and a single remaining living hand may be won
/// with a zero bid.
pub fn minimum_bid_waived(circle: &Circle, members: &[CircleMember], round: RoundNumber) -> bool {
    let living = members
        .iter()
        .filter(|m| !m.is_organizer() && !m.is_dead())
        .count();
    round == 1 || circle.is_final_round(round) || living <= 1
}

pub fn validate_proposal(
    circle: &Circle,
    members: &[CircleMember],
    round: &Round,
    proposal: &SettlementProposal,
) -> Result<(), SettlementError> {
    if circle.status != CircleStatus::Active {
        return Err(SettlementError::CircleNotActive(circle.id));
    }
    if !circle.contains_round(round.round_number) {
        return Err(SettlementError::RoundOutOfRange {
            round: round.round_number,
            total_slots: circle.total_slots,
        });
    }
    if !round.is_open() || round.winner_id.is_some() {
        return Err(SettlementError::RoundAlreadyDecided(round.round_number));
    }

    let winner = members
        .iter()
        .find(|m| m.id == proposal.winner_id)
        .ok_or(SettlementError::UnknownWinner(proposal.winner_id))?;
    if let Some(won) = winner.won_round.filter(|_| winner.is_dead()) {
        return Err(SettlementError::WinnerAlreadyWon {
            member: winner.id,
            round: won,
        });
    }

    if proposal.bid_amount.is_negative() {
        return Err(SettlementError::NegativeBid);
    }
    if !circle.is_ladder()
        && proposal.bid_amount < circle.min_bid
        && !minimum_bid_waived(circle, members, round.round_number)
    {
        return Err(SettlementError::BidBelowMinimum {
            bid: proposal.bid_amount,
            minimum: circle.min_bid,
        });
    }

    Ok(())
}

/// Per-member breakdown and pot for `proposal`, without validation.
pub fn compute(
    circle: &Circle,
    members: &[CircleMember],
    round_number: RoundNumber,
    proposal: &SettlementProposal,
) -> SettlementPreview {
    let mut ordered: Vec<&CircleMember> = members.iter().collect();
    ordered.sort_by_key(|m| m.slot_number);

    let shares: Vec<MemberShare> = ordered
        .into_iter()
        .map(|member| {
            let input = CalculationInput::new(circle, member, round_number)
                .with_winner(Some(proposal.winner_id))
                .with_bid(proposal.bid_amount);
            let result = calculate_share_payment(&input);
            MemberShare {
                member_id: member.id,
                slot_number: member.slot_number,
                display_name: member.display_name.clone(),
                pay_amount: result.pay_amount,
                status: result.status,
                expected_contribution: result.expected_contribution(circle),
                note: result.note,
            }
        })
        .collect();

    let total_pot: Decimal = shares.iter().map(|s| s.pay_amount).sum();
    let expected_total: Decimal = shares.iter().map(|s| s.expected_contribution).sum();

    SettlementPreview {
        circle_id: circle.id,
        round_number,
        winner_id: proposal.winner_id,
        bid_amount: proposal.bid_amount,
        source: proposal.source,
        shares,
        total_pot,
        expected_total,
        admin_fee: circle.admin_fee,
        net_payout: (total_pot - circle.admin_fee).non_negative(),
    }
}

/// Validate then compute.
pub fn settle(
    circle: &Circle,
    members: &[CircleMember],
    round: &Round,
    proposal: &SettlementProposal,
) -> Result<SettlementPreview, SettlementError> {
    validate_proposal(circle, members, round, proposal)?;
    Ok(compute(circle, members, round.round_number, proposal))
}
