//! Circle and member operations for the repository.

use crate::domain::{Circle, CircleId, CircleMember, PaymentWindow, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

use super::{optional_u32_column, parse_column, parse_optional_column, u32_column, Repository};

impl Repository {
    /// Insert a circle.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including on a duplicate id.
    pub async fn insert_circle(&self, circle: &Circle) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO circles (
                id, name, principal, total_slots, share_type, bidding_type, status,
                fine_rate, min_bid, admin_fee, window_start, window_end, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(circle.id.to_string())
        .bind(&circle.name)
        .bind(circle.principal.to_canonical_string())
        .bind(i64::from(circle.total_slots))
        .bind(circle.share_type.as_str())
        .bind(circle.bidding_type.as_str())
        .bind(circle.status.as_str())
        .bind(circle.fine_rate.to_canonical_string())
        .bind(circle.min_bid.to_canonical_string())
        .bind(circle.admin_fee.to_canonical_string())
        .bind(circle.payment_window.start.to_string())
        .bind(circle.payment_window.end.to_string())
        .bind(chrono::Utc::now().timestamp_millis())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Get a circle by id.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn get_circle(&self, id: CircleId) -> Result<Option<Circle>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT id, name, principal, total_slots, share_type, bidding_type, status,
                   fine_rate, min_bid, admin_fee, window_start, window_end
            FROM circles
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(circle_from_row).transpose()
    }

    /// Insert the hands of a circle in a single transaction.
    ///
    /// # Errors
    /// Returns an error if any insert fails; nothing is written in that case.
    pub async fn insert_members(&self, members: &[CircleMember]) -> Result<(), sqlx::Error> {
        if members.is_empty() {
            return Ok(());
        }

        let mut tx = self.pool.begin().await?;

        for member in members {
            sqlx::query(
                r#"
                INSERT INTO circle_members (
                    id, circle_id, user_id, display_name, slot_number, hand_status,
                    won_round, won_bid_amount, fixed_due_amount, settle_upfront_amount
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(member.id.to_string())
            .bind(member.circle_id.to_string())
            .bind(member.user_id.to_string())
            .bind(&member.display_name)
            .bind(i64::from(member.slot_number))
            .bind(member.hand_status.as_str())
            .bind(member.won_round.map(i64::from))
            .bind(member.won_bid_amount.map(|d| d.to_canonical_string()))
            .bind(member.fixed_due_amount.map(|d| d.to_canonical_string()))
            .bind(member.settle_upfront_amount.map(|d| d.to_canonical_string()))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// List the hands of a circle in slot order.
    ///
    /// # Errors
    /// Returns an error if the query fails or a stored column is malformed.
    pub async fn list_members(
        &self,
        circle_id: CircleId,
    ) -> Result<Vec<CircleMember>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT id, circle_id, user_id, display_name, slot_number, hand_status,
                   won_round, won_bid_amount, fixed_due_amount, settle_upfront_amount
            FROM circle_members
            WHERE circle_id = ?
            ORDER BY slot_number ASC
            "#,
        )
        .bind(circle_id.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(member_from_row).collect()
    }

    /// Ids of every circle in which `user` holds at least one hand.
    ///
    /// # Errors
    /// Returns an error if the query fails.
    pub async fn list_circle_ids_for_user(
        &self,
        user: UserId,
    ) -> Result<Vec<CircleId>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT circle_id
            FROM circle_members
            WHERE user_id = ?
            ORDER BY circle_id ASC
            "#,
        )
        .bind(user.to_string())
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| parse_column::<CircleId>(row, "circle_id"))
            .collect()
    }
}

fn circle_from_row(row: &SqliteRow) -> Result<Circle, sqlx::Error> {
    Ok(Circle {
        id: parse_column(row, "id")?,
        name: row.try_get("name")?,
        principal: parse_column(row, "principal")?,
        total_slots: u32_column(row, "total_slots")?,
        share_type: parse_column(row, "share_type")?,
        bidding_type: parse_column(row, "bidding_type")?,
        status: parse_column(row, "status")?,
        fine_rate: parse_column(row, "fine_rate")?,
        min_bid: parse_column(row, "min_bid")?,
        admin_fee: parse_column(row, "admin_fee")?,
        payment_window: PaymentWindow {
            start: parse_column(row, "window_start")?,
            end: parse_column(row, "window_end")?,
        },
    })
}

fn member_from_row(row: &SqliteRow) -> Result<CircleMember, sqlx::Error> {
    Ok(CircleMember {
        id: parse_column(row, "id")?,
        circle_id: parse_column(row, "circle_id")?,
        user_id: parse_column(row, "user_id")?,
        display_name: row.try_get("display_name")?,
        slot_number: u32_column(row, "slot_number")?,
        hand_status: parse_column(row, "hand_status")?,
        won_round: optional_u32_column(row, "won_round")?,
        won_bid_amount: parse_optional_column(row, "won_bid_amount")?,
        fixed_due_amount: parse_optional_column(row, "fixed_due_amount")?,
        settle_upfront_amount: parse_optional_column(row, "settle_upfront_amount")?,
    })
}
