//! Payment transactions and payouts for the repository.

use crate::domain::{CircleId, MemberId, Payout, Transaction};
use sqlx::sqlite::SqliteRow;

use super::{instant_column, parse_column, u32_column, Repository};

impl Repository {
    /// Insert a payment transaction.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn insert_transaction(&self, transaction: &Transaction) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, circle_id, member_id, round_number, amount, status, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(transaction.id.to_string())
        .bind(transaction.circle_id.to_string())
        .bind(transaction.member_id.to_string())
        .bind(i64::from(transaction.round_number))
        .bind(transaction.amount.to_canonical_string())
        .bind(transaction.status.as_str())
        .bind(transaction.created_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Every transaction recorded against a circle.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn list_transactions_for_circle(
        &self,
        circle_id: CircleId,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, circle_id, member_id, round_number, amount, status, created_at
            FROM transactions
            WHERE circle_id = ?
            ORDER BY round_number ASC, created_at ASC, id ASC
            "#,
        )
        .bind(circle_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    /// Every transaction recorded by one hand.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn list_transactions_for_member(
        &self,
        member_id: MemberId,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, circle_id, member_id, round_number, amount, status, created_at
            FROM transactions
            WHERE member_id = ?
            ORDER BY round_number ASC, created_at ASC, id ASC
            "#,
        )
        .bind(member_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(transaction_from_row).collect()
    }

    /// Record the payout of a round idempotently.
    ///
    /// Returns `false` if the round already has a payout.
    ///
    /// # Errors
    /// Returns an error if the insert fails.
    pub async fn record_payout(&self, payout: &Payout) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO payouts (
                circle_id, round_number, winner_id, gross_pot, admin_fee, net_amount, paid_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT(circle_id, round_number) DO NOTHING
            "#,
        )
        .bind(payout.circle_id.to_string())
        .bind(i64::from(payout.round_number))
        .bind(payout.winner_id.to_string())
        .bind(payout.gross_pot.to_canonical_string())
        .bind(payout.admin_fee.to_canonical_string())
        .bind(payout.net_amount.to_canonical_string())
        .bind(payout.paid_at.timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Payouts of a circle in round order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn list_payouts(&self, circle_id: CircleId) -> Result<Vec<Payout>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT circle_id, round_number, winner_id, gross_pot, admin_fee, net_amount, paid_at
            FROM payouts
            WHERE circle_id = ?
            ORDER BY round_number ASC
            "#,
        )
        .bind(circle_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(payout_from_row).collect()
    }
}

fn transaction_from_row(row: &SqliteRow) -> Result<Transaction, sqlx::Error> {
    Ok(Transaction {
        id: parse_column(row, "id")?,
        circle_id: parse_column(row, "circle_id")?,
        member_id: parse_column(row, "member_id")?,
        round_number: u32_column(row, "round_number")?,
        amount: parse_column(row, "amount")?,
        status: parse_column(row, "status")?,
        created_at: instant_column(row, "created_at")?,
    })
}

fn payout_from_row(row: &SqliteRow) -> Result<Payout, sqlx::Error> {
    Ok(Payout {
        circle_id: parse_column(row, "circle_id")?,
        round_number: u32_column(row, "round_number")?,
        winner_id: parse_column(row, "winner_id")?,
        gross_pot: parse_column(row, "gross_pot")?,
        admin_fee: parse_column(row, "admin_fee")?,
        net_amount: parse_column(row, "net_amount")?,
        paid_at: instant_column(row, "paid_at")?,
    })
}
