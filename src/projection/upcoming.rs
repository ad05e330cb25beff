//! Upcoming dues: a member's payment worklist across all their circles.

use super::lateness::Lateness;
use crate::domain::{
    Circle, CircleId, CircleMember, CircleStatus, Decimal, MemberId, PaymentTally, Round,
    RoundNumber, RoundStatus, Transaction,
};
use crate::engine::{calculate_share_payment, CalculationInput, PaymentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// One hand of the member together with the circle snapshot it lives in.
#[derive(Debug, Clone, Copy)]
pub struct Membership<'a> {
    pub circle: &'a Circle,
    pub member: &'a CircleMember,
    /// All hands of the circle, for slot-implied ladder winners.
    pub members: &'a [CircleMember],
    pub rounds: &'a [Round],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDue {
    pub circle_id: CircleId,
    pub circle_name: String,
    pub member_id: MemberId,
    pub round_number: RoundNumber,
    pub round_date: NaiveDate,
    pub due_at: DateTime<Utc>,
    pub round_status: RoundStatus,
    pub payment_status: PaymentStatus,
    pub note: String,
    pub amount_due: Decimal,
    /// Paid plus awaiting approval.
    pub committed: Decimal,
    pub remaining: Decimal,
    pub expected_contribution: Decimal,
    pub is_overdue: bool,
    pub days_late: i64,
    pub estimated_fine: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingDues {
    pub entries: Vec<UpcomingDue>,
    pub total_remaining: Decimal,
    pub total_estimated_fines: Decimal,
    /// Expected contributions over every collectible round evaluated,
    /// including rounds with nothing left to pay.
    pub expected_total: Decimal,
}

/// Build the worklist for the hands in `memberships`.
///
/// `transactions` are the member's ledger rows; rows of other members are
/// ignored by the tally.
pub fn project(
    memberships: &[Membership<'_>],
    transactions: &[Transaction],
    now: DateTime<Utc>,
) -> UpcomingDues {
    let mut dues = UpcomingDues::default();

    for membership in memberships {
        let circle = membership.circle;
        if circle.status != CircleStatus::Active {
            continue;
        }

        for round in membership
            .rounds
            .iter()
            .filter(|r| r.is_collectible(circle.bidding_type))
        {
            let winner = round.effective_winner(circle.bidding_type, membership.members);
            let input = CalculationInput::new(circle, membership.member, round.round_number)
                .with_winner(winner)
                .with_bid(round.bid_amount)
                .round_open(round.is_open());
            let result = calculate_share_payment(&input);
            let expected = result.expected_contribution(circle);
            dues.expected_total += expected;

            let tally = PaymentTally::collect(
                transactions.iter().filter(|t| t.circle_id == circle.id),
                membership.member.id,
                round.round_number,
            );
            let remaining = (result.pay_amount - tally.committed()).non_negative();
            if remaining.is_zero() {
                continue;
            }

            let lateness = if result.status.is_fine_exempt() {
                Lateness::on_time()
            } else {
                Lateness::assess(circle, round.round_date, now)
            };

            dues.total_remaining += remaining;
            dues.total_estimated_fines += lateness.fine;
            dues.entries.push(UpcomingDue {
                circle_id: circle.id,
                circle_name: circle.name.clone(),
                member_id: membership.member.id,
                round_number: round.round_number,
                round_date: round.round_date,
                due_at: circle.due_at(round.round_date),
                round_status: round.status,
                payment_status: result.status,
                note: result.note,
                amount_due: result.pay_amount,
                committed: tally.committed(),
                remaining,
                expected_contribution: expected,
                is_overdue: lateness.is_late,
                days_late: lateness.days_late,
                estimated_fine: lateness.fine,
            });
        }
    }

    dues.entries.sort_by(|a, b| {
        a.due_at
            .cmp(&b.due_at)
            .then_with(|| a.circle_name.cmp(&b.circle_name))
            .then_with(|| a.round_number.cmp(&b.round_number))
    });
    dues
}
