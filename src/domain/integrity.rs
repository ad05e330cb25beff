//! Snapshot consistency checks run before the share engine is invoked.
//!
//! The engine trusts its input. Anything caught here is a configuration
//! integrity problem for an operator to fix, not a user input error.

use crate::domain::{Circle, CircleId, CircleMember, CircleStatus, Decimal, MemberId, RoundNumber};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IntegrityError {
    #[error("circle {circle} has negative {field} {amount}")]
    NegativeAmount {
        circle: CircleId,
        field: &'static str,
        amount: Decimal,
    },
    #[error("circle {circle} declares {declared} slots but has {actual} members")]
    SlotCountMismatch {
        circle: CircleId,
        declared: u32,
        actual: usize,
    },
    #[error("member {member} holds slot {slot} outside 1..={total_slots}")]
    SlotOutOfRange {
        member: MemberId,
        slot: u32,
        total_slots: u32,
    },
    #[error("slot {slot} of circle {circle} is held by more than one member")]
    DuplicateSlot { circle: CircleId, slot: u32 },
    #[error("round {round} of circle {circle} was won by more than one member")]
    DuplicateWinner { circle: CircleId, round: RoundNumber },
    #[error("member {member} does not belong to circle {circle}")]
    ForeignMember { circle: CircleId, member: MemberId },
    #[error("round {round} is outside 1..={total_slots}")]
    RoundOutOfRange {
        round: RoundNumber,
        total_slots: u32,
    },
    #[error("winner {winner} is not a member of circle {circle}")]
    UnknownWinner { circle: CircleId, winner: MemberId },
}

/// Validate a circle and its full member list.
pub fn validate_circle(circle: &Circle, members: &[CircleMember]) -> Result<(), IntegrityError> {
    for (field, amount) in [
        ("principal", circle.principal),
        ("fine rate", circle.fine_rate),
        ("minimum bid", circle.min_bid),
        ("admin fee", circle.admin_fee),
    ] {
        if amount.is_negative() {
            return Err(IntegrityError::NegativeAmount {
                circle: circle.id,
                field,
                amount,
            });
        }
    }

    // Hands are still being assigned while the circle initializes.
    if circle.status != CircleStatus::Initializing && members.len() != circle.total_slots as usize
    {
        return Err(IntegrityError::SlotCountMismatch {
            circle: circle.id,
            declared: circle.total_slots,
            actual: members.len(),
        });
    }

    let mut slots = HashSet::new();
    let mut winners: HashMap<RoundNumber, MemberId> = HashMap::new();
    for member in members {
        if member.circle_id != circle.id {
            return Err(IntegrityError::ForeignMember {
                circle: circle.id,
                member: member.id,
            });
        }
        if !circle.contains_round(member.slot_number) {
            return Err(IntegrityError::SlotOutOfRange {
                member: member.id,
                slot: member.slot_number,
                total_slots: circle.total_slots,
            });
        }
        if !slots.insert(member.slot_number) {
            return Err(IntegrityError::DuplicateSlot {
                circle: circle.id,
                slot: member.slot_number,
            });
        }
        if let Some(round) = member.won_round.filter(|_| member.is_dead()) {
            if winners.insert(round, member.id).is_some() {
                return Err(IntegrityError::DuplicateWinner {
                    circle: circle.id,
                    round,
                });
            }
        }
    }

    Ok(())
}

/// Validate the round-level arguments of one engine invocation.
pub fn validate_round(
    circle: &Circle,
    members: &[CircleMember],
    round: RoundNumber,
    winner: Option<MemberId>,
) -> Result<(), IntegrityError> {
    if !circle.contains_round(round) {
        return Err(IntegrityError::RoundOutOfRange {
            round,
            total_slots: circle.total_slots,
        });
    }
    if let Some(winner) = winner {
        if !members.iter().any(|m| m.id == winner) {
            return Err(IntegrityError::UnknownWinner {
                circle: circle.id,
                winner,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BiddingType, HandStatus, PaymentWindow, ShareType, UserId};

    fn circle(total_slots: u32) -> Circle {
        Circle {
            id: CircleId::generate(),
            name: "test".to_string(),
            principal: Decimal::from_i64(10000),
            total_slots,
            share_type: ShareType::InterestDeducted,
            bidding_type: BiddingType::Auction,
            status: CircleStatus::Active,
            fine_rate: Decimal::from_i64(10),
            min_bid: Decimal::from_i64(100),
            admin_fee: Decimal::zero(),
            payment_window: PaymentWindow::default(),
        }
    }

    fn members(circle: &Circle) -> Vec<CircleMember> {
        (1..=circle.total_slots)
            .map(|slot| CircleMember {
                id: MemberId::generate(),
                circle_id: circle.id,
                user_id: UserId::generate(),
                display_name: String::new(),
                slot_number: slot,
                hand_status: HandStatus::Alive,
                won_round: None,
                won_bid_amount: None,
                fixed_due_amount: None,
                settle_upfront_amount: None,
            })
            .collect()
    }

    #[test]
    fn test_consistent_snapshot_passes() {
        let c = circle(4);
        let ms = members(&c);
        assert_eq!(validate_circle(&c, &ms), Ok(()));
        assert_eq!(validate_round(&c, &ms, 4, Some(ms[1].id)), Ok(()));
    }

    #[test]
    fn test_negative_principal_rejected() {
        let mut c = circle(3);
        c.principal = Decimal::from_i64(-1);
        let ms = members(&c);
        assert!(matches!(
            validate_circle(&c, &ms),
            Err(IntegrityError::NegativeAmount { field: "principal", .. })
        ));
    }

    #[test]
    fn test_slot_count_mismatch_only_after_initializing() {
        let mut c = circle(5);
        let mut ms = members(&c);
        ms.pop();
        assert!(matches!(
            validate_circle(&c, &ms),
            Err(IntegrityError::SlotCountMismatch { actual: 4, .. })
        ));

        c.status = CircleStatus::Initializing;
        assert_eq!(validate_circle(&c, &ms), Ok(()));
    }

    #[test]
    fn test_duplicate_winner_rejected() {
        let c = circle(4);
        let mut ms = members(&c);
        ms[1].record_win(2, Decimal::from_i64(300));
        ms[2].record_win(2, Decimal::from_i64(400));
        assert!(matches!(
            validate_circle(&c, &ms),
            Err(IntegrityError::DuplicateWinner { round: 2, .. })
        ));
    }

    #[test]
    fn test_round_and_winner_checks() {
        let c = circle(4);
        let ms = members(&c);
        assert!(matches!(
            validate_round(&c, &ms, 0, None),
            Err(IntegrityError::RoundOutOfRange { .. })
        ));
        assert!(matches!(
            validate_round(&c, &ms, 5, None),
            Err(IntegrityError::RoundOutOfRange { .. })
        ));
        assert!(matches!(
            validate_round(&c, &ms, 2, Some(MemberId::generate())),
            Err(IntegrityError::UnknownWinner { .. })
        ));
    }
}
