use crate::api::{parse_id, AppState};
use crate::auction::AuctionSnapshot;
use crate::domain::{CircleId, Decimal, MemberId, RoundNumber};
use crate::error::AppError;
use crate::projection::SettlementPreview;
use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BidRequest {
    pub member_id: String,
    pub amount: Decimal,
}

pub async fn start_auction(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
) -> Result<Json<AuctionSnapshot>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    Ok(Json(state.ledger.start_auction(circle_id, round).await?))
}

pub async fn get_auction(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
) -> Result<Json<AuctionSnapshot>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    Ok(Json(state.ledger.auction_snapshot(circle_id, round).await?))
}

pub async fn place_bid(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
    Json(body): Json<BidRequest>,
) -> Result<Json<AuctionSnapshot>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    let member_id: MemberId = parse_id(&body.member_id, "memberId")?;
    let snapshot = state
        .ledger
        .place_bid(circle_id, round, member_id, body.amount)
        .await?;
    Ok(Json(snapshot))
}

/// Close bidding and settle the round on the highest bid.
pub async fn close_auction(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
) -> Result<Json<SettlementPreview>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    Ok(Json(state.ledger.close_auction(circle_id, round).await?))
}
