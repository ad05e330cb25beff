//! Round records and settlement finalization for the repository.

use crate::domain::{CircleId, HandStatus, MemberId, Round, RoundNumber, RoundStatus};
use chrono::NaiveDate;
use sqlx::sqlite::SqliteRow;

use super::{parse_column, parse_optional_column, u32_column, Repository};

impl Repository {
    /// Insert a round record.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including when the round exists.
    pub async fn insert_round(&self, round: &Round) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO rounds (
                circle_id, round_number, round_date, status, winner_id, bid_amount, total_pot
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(round.circle_id.to_string())
        .bind(i64::from(round.round_number))
        .bind(round.round_date.to_string())
        .bind(round.status.as_str())
        .bind(round.winner_id.map(|id| id.to_string()))
        .bind(round.bid_amount.to_canonical_string())
        .bind(round.total_pot.map(|d| d.to_canonical_string()))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get one round of a circle.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn get_round(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<Option<Round>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT circle_id, round_number, round_date, status, winner_id, bid_amount, total_pot
            FROM rounds
            WHERE circle_id = ? AND round_number = ?
            "#,
        )
        .bind(circle_id.to_string())
        .bind(i64::from(round_number))
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(round_from_row).transpose()
    }

    /// List every round of a circle in round order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn list_rounds(&self, circle_id: CircleId) -> Result<Vec<Round>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT circle_id, round_number, round_date, status, winner_id, bid_amount, total_pot
            FROM rounds
            WHERE circle_id = ?
            ORDER BY round_number ASC
            "#,
        )
        .bind(circle_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(round_from_row).collect()
    }

    /// Persist a settled round and mark its winner as a dead hand atomically.
    ///
    /// Only an open round is updated. Returns `false` without writing
    /// anything when the round was already decided by a concurrent caller.
    ///
    /// # Errors
    /// Returns an error if any database operation fails.
    pub async fn finalize_round(&self, round: &Round) -> Result<bool, sqlx::Error> {
        let Some(winner_id) = round.winner_id else {
            return Ok(false);
        };

        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            r#"
            UPDATE rounds
            SET status = ?, winner_id = ?, bid_amount = ?, total_pot = ?
            WHERE circle_id = ? AND round_number = ? AND status = ? AND winner_id IS NULL
            "#,
        )
        .bind(round.status.as_str())
        .bind(winner_id.to_string())
        .bind(round.bid_amount.to_canonical_string())
        .bind(round.total_pot.map(|d| d.to_canonical_string()))
        .bind(round.circle_id.to_string())
        .bind(i64::from(round.round_number))
        .bind(RoundStatus::Open.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        mark_winner(&mut tx, winner_id, round).await?;

        tx.commit().await?;
        Ok(true)
    }
}

async fn mark_winner(
    tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
    winner_id: MemberId,
    round: &Round,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE circle_members
        SET hand_status = ?, won_round = ?, won_bid_amount = ?
        WHERE id = ? AND circle_id = ?
        "#,
    )
    .bind(HandStatus::Dead.as_str())
    .bind(i64::from(round.round_number))
    .bind(round.bid_amount.to_canonical_string())
    .bind(winner_id.to_string())
    .bind(round.circle_id.to_string())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

fn round_from_row(row: &SqliteRow) -> Result<Round, sqlx::Error> {
    Ok(Round {
        circle_id: parse_column(row, "circle_id")?,
        round_number: u32_column(row, "round_number")?,
        round_date: parse_column::<NaiveDate>(row, "round_date")?,
        status: parse_column(row, "status")?,
        winner_id: parse_optional_column(row, "winner_id")?,
        bid_amount: parse_column(row, "bid_amount")?,
        total_pot: parse_optional_column(row, "total_pot")?,
    })
}
