//! Collection tracking: who owes what for a round, what has been paid, and
//! what is late.

use super::lateness::Lateness;
use crate::domain::{
    Circle, CircleId, CircleMember, Decimal, MemberId, PaymentTally, Payout, Round, RoundNumber,
    RoundStatus, Transaction,
};
use crate::engine::{calculate_share_payment, CalculationInput, CalculationResult, PaymentStatus};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    Paid,
    Partial,
    AwaitingApproval,
    Unpaid,
    /// Round winner whose pot has not been handed over yet.
    AwaitingPayout,
    PayoutCompleted,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionEntry {
    pub member_id: MemberId,
    pub slot_number: u32,
    pub display_name: String,
    pub pay_amount: Decimal,
    pub payment_status: PaymentStatus,
    pub note: String,
    pub expected_contribution: Decimal,
    pub paid: Decimal,
    pub pending: Decimal,
    /// Owed amount not yet approved.
    pub outstanding: Decimal,
    pub status: CollectionStatus,
    pub lateness: Lateness,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionTotals {
    pub expected_total: Decimal,
    pub collected_total: Decimal,
    pub pending_total: Decimal,
    pub outstanding_total: Decimal,
    pub fines_total: Decimal,
}

impl CollectionTotals {
    fn add_entry(&mut self, entry: &CollectionEntry) {
        self.expected_total += entry.expected_contribution;
        self.collected_total += entry.paid;
        self.pending_total += entry.pending;
        self.outstanding_total += entry.outstanding;
        self.fines_total += entry.lateness.fine;
    }

    fn merge(&mut self, other: &CollectionTotals) {
        self.expected_total += other.expected_total;
        self.collected_total += other.collected_total;
        self.pending_total += other.pending_total;
        self.outstanding_total += other.outstanding_total;
        self.fines_total += other.fines_total;
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RoundCollection {
    pub round_number: RoundNumber,
    pub round_date: NaiveDate,
    pub round_status: RoundStatus,
    pub winner_id: Option<MemberId>,
    pub bid_amount: Decimal,
    pub entries: Vec<CollectionEntry>,
    #[serde(flatten)]
    pub totals: CollectionTotals,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleCollection {
    pub circle_id: CircleId,
    pub rounds: Vec<RoundCollection>,
    #[serde(flatten)]
    pub totals: CollectionTotals,
}

/// Recorded payments and payouts of one circle.
#[derive(Debug, Clone, Copy)]
pub struct LedgerView<'a> {
    pub transactions: &'a [Transaction],
    pub payouts: &'a [Payout],
}

pub struct CollectionProjector<'a> {
    circle: &'a Circle,
    members: &'a [CircleMember],
    ledger: LedgerView<'a>,
    now: DateTime<Utc>,
}

impl<'a> CollectionProjector<'a> {
    pub fn new(
        circle: &'a Circle,
        members: &'a [CircleMember],
        ledger: LedgerView<'a>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            circle,
            members,
            ledger,
            now,
        }
    }

    /// Collection view of one round, one entry per member in slot order.
    pub fn project_round(&self, round: &Round) -> RoundCollection {
        let winner = round.effective_winner(self.circle.bidding_type, self.members);
        let payout_done = self
            .ledger
            .payouts
            .iter()
            .any(|p| p.round_number == round.round_number);
        // Open auction rounds have nothing to collect yet.
        let accrues_fines = round.status != RoundStatus::Open || self.circle.is_ladder();

        let mut members: Vec<&CircleMember> = self.members.iter().collect();
        members.sort_by_key(|m| m.slot_number);

        let mut totals = CollectionTotals::default();
        let entries: Vec<CollectionEntry> = members
            .into_iter()
            .map(|member| {
                let input = CalculationInput::new(self.circle, member, round.round_number)
                    .with_winner(winner)
                    .with_bid(round.bid_amount)
                    .round_open(round.is_open());
                let result = calculate_share_payment(&input);
                let tally =
                    PaymentTally::collect(self.ledger.transactions, member.id, round.round_number);
                let entry = self.entry(member, round, result, tally, payout_done, accrues_fines);
                totals.add_entry(&entry);
                entry
            })
            .collect();

        RoundCollection {
            round_number: round.round_number,
            round_date: round.round_date,
            round_status: round.status,
            winner_id: winner,
            bid_amount: round.bid_amount,
            entries,
            totals,
        }
    }

    /// Collection view of every round, current and historical.
    pub fn project_all(&self, rounds: &[Round]) -> CircleCollection {
        let mut rounds: Vec<&Round> = rounds.iter().collect();
        rounds.sort_by_key(|r| r.round_number);

        let mut totals = CollectionTotals::default();
        let rounds: Vec<RoundCollection> = rounds
            .into_iter()
            .map(|round| {
                let projected = self.project_round(round);
                totals.merge(&projected.totals);
                projected
            })
            .collect();

        CircleCollection {
            circle_id: self.circle.id,
            rounds,
            totals,
        }
    }

    fn entry(
        &self,
        member: &CircleMember,
        round: &Round,
        result: CalculationResult,
        tally: PaymentTally,
        payout_done: bool,
        accrues_fines: bool,
    ) -> CollectionEntry {
        let outstanding = (result.pay_amount - tally.paid).non_negative();
        let uncovered = (result.pay_amount - tally.committed()).non_negative();
        let status = collection_status(&result, &tally, payout_done);

        let fineable = accrues_fines && !result.status.is_fine_exempt() && uncovered.is_positive();
        let lateness = if fineable {
            Lateness::assess(self.circle, round.round_date, self.now)
        } else {
            Lateness::on_time()
        };

        CollectionEntry {
            member_id: member.id,
            slot_number: member.slot_number,
            display_name: member.display_name.clone(),
            pay_amount: result.pay_amount,
            payment_status: result.status,
            expected_contribution: result.expected_contribution(self.circle),
            note: result.note,
            paid: tally.paid,
            pending: tally.pending,
            outstanding,
            status,
            lateness,
        }
    }
}

fn collection_status(
    result: &CalculationResult,
    tally: &PaymentTally,
    payout_done: bool,
) -> CollectionStatus {
    if result.status == PaymentStatus::RoundWinner {
        return if payout_done {
            CollectionStatus::PayoutCompleted
        } else {
            CollectionStatus::AwaitingPayout
        };
    }

    let owed = result.pay_amount;
    if owed.is_zero() || tally.paid >= owed {
        CollectionStatus::Paid
    } else if tally.pending.is_positive() && tally.committed() >= owed {
        CollectionStatus::AwaitingApproval
    } else if tally.paid.is_positive() {
        CollectionStatus::Partial
    } else if tally.pending.is_positive() {
        CollectionStatus::AwaitingApproval
    } else {
        CollectionStatus::Unpaid
    }
}
