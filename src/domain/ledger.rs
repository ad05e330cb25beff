//! Transaction and payout ledger rows.

use crate::domain::circle::str_enum;
use crate::domain::{CircleId, Decimal, MemberId, RoundNumber, TransactionId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Approved by the organizer.
    Paid,
    /// Submitted by the member, not yet approved.
    AwaitingApproval,
    Rejected,
}

str_enum!(TransactionStatus, "transaction status", {
    Paid => "paid",
    AwaitingApproval => "awaiting_approval",
    Rejected => "rejected",
});

/// A recorded contribution by one member towards one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: TransactionId,
    pub circle_id: CircleId,
    pub member_id: MemberId,
    pub round_number: RoundNumber,
    pub amount: Decimal,
    pub status: TransactionStatus,
    pub created_at: DateTime<Utc>,
}

/// Record that a round's net pot was physically handed to the winner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payout {
    pub circle_id: CircleId,
    pub round_number: RoundNumber,
    pub winner_id: MemberId,
    pub gross_pot: Decimal,
    pub admin_fee: Decimal,
    pub net_amount: Decimal,
    pub paid_at: DateTime<Utc>,
}

/// Approved and pending sums for one member in one round.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentTally {
    pub paid: Decimal,
    pub pending: Decimal,
}

impl PaymentTally {
    /// Sum the ledger rows belonging to `member` in `round`. Rejected rows are ignored.
    pub fn collect<'a, I>(transactions: I, member: MemberId, round: RoundNumber) -> Self
    where
        I: IntoIterator<Item = &'a Transaction>,
    {
        transactions
            .into_iter()
            .filter(|t| t.member_id == member && t.round_number == round)
            .fold(PaymentTally::default(), |mut tally, t| {
                match t.status {
                    TransactionStatus::Paid => tally.paid += t.amount,
                    TransactionStatus::AwaitingApproval => tally.pending += t.amount,
                    TransactionStatus::Rejected => {}
                }
                tally
            })
    }

    /// Amount already paid or submitted for approval.
    pub fn committed(&self) -> Decimal {
        self.paid + self.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(
        member: MemberId,
        round: RoundNumber,
        amount: i64,
        status: TransactionStatus,
    ) -> Transaction {
        Transaction {
            id: TransactionId::generate(),
            circle_id: CircleId::generate(),
            member_id: member,
            round_number: round,
            amount: Decimal::from_i64(amount),
            status,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_tally_splits_paid_and_pending() {
        let member = MemberId::generate();
        let other = MemberId::generate();
        let rows = vec![
            tx(member, 2, 5000, TransactionStatus::Paid),
            tx(member, 2, 2000, TransactionStatus::AwaitingApproval),
            tx(member, 2, 9700, TransactionStatus::Rejected),
            tx(member, 3, 9700, TransactionStatus::Paid),
            tx(other, 2, 9700, TransactionStatus::Paid),
        ];

        let tally = PaymentTally::collect(&rows, member, 2);
        assert_eq!(tally.paid, Decimal::from_i64(5000));
        assert_eq!(tally.pending, Decimal::from_i64(2000));
        assert_eq!(tally.committed(), Decimal::from_i64(7000));
    }

    #[test]
    fn test_status_strings() {
        assert_eq!(TransactionStatus::AwaitingApproval.as_str(), "awaiting_approval");
        assert_eq!(
            "rejected".parse::<TransactionStatus>().unwrap(),
            TransactionStatus::Rejected
        );
    }
}
