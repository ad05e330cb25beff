use crate::api::{parse_id, AppState};
use crate::domain::UserId;
use crate::error::AppError;
use crate::projection::UpcomingDues;
use axum::extract::{Path, State};
use axum::Json;
use chrono::Utc;

pub async fn get_upcoming(
    Path(user_id): Path<String>,
    State(state): State<AppState>,
) -> Result<Json<UpcomingDues>, AppError> {
    let user_id: UserId = parse_id(&user_id, "userId")?;
    let dues = state.ledger.upcoming_dues(user_id, Utc::now()).await?;
    Ok(Json(dues))
}
