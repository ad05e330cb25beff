use crate::api::{parse_id, AppState};
use crate::domain::{CircleId, Decimal, MemberId, Payout, RoundNumber};
use crate::engine::CalculationResult;
use crate::error::AppError;
use crate::orchestration::ShareRequest;
use crate::projection::{
    BidSource, CircleCollection, RoundCollection, SettlementPreview, SettlementProposal,
};
use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShareQuery {
    pub member_id: String,
    pub round: RoundNumber,
    pub winner_id: Option<String>,
    pub bid_amount: Option<String>,
    pub round_open: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub struct CollectionQuery {
    pub round: Option<RoundNumber>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum CollectionResponse {
    Round(RoundCollection),
    Circle(CircleCollection),
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettlementRequest {
    pub winner_id: String,
    pub bid_amount: Decimal,
}

pub async fn get_share(
    Path(circle_id): Path<String>,
    Query(params): Query<ShareQuery>,
    State(state): State<AppState>,
) -> Result<Json<CalculationResult>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    let member_id: MemberId = parse_id(&params.member_id, "memberId")?;
    let winner_id = params
        .winner_id
        .as_deref()
        .map(|raw| parse_id::<MemberId>(raw, "winnerId"))
        .transpose()?;
    let bid_amount = params
        .bid_amount
        .as_deref()
        .map(Decimal::from_str_canonical)
        .transpose()
        .map_err(|_| AppError::BadRequest("Invalid bidAmount".to_string()))?;
    if bid_amount.is_some_and(|bid| bid.is_negative()) {
        return Err(AppError::BadRequest("bidAmount must be >= 0".to_string()));
    }

    let result = state
        .ledger
        .share(
            circle_id,
            ShareRequest {
                member_id,
                round_number: params.round,
                winner_id,
                bid_amount,
                round_open: params.round_open,
            },
        )
        .await?;
    Ok(Json(result))
}

pub async fn get_collection(
    Path(circle_id): Path<String>,
    Query(params): Query<CollectionQuery>,
    State(state): State<AppState>,
) -> Result<Json<CollectionResponse>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    let now = Utc::now();

    let response = match params.round {
        Some(round) => {
            CollectionResponse::Round(state.ledger.collection_round(circle_id, round, now).await?)
        }
        None => CollectionResponse::Circle(state.ledger.collection(circle_id, now).await?),
    };
    Ok(Json(response))
}

pub async fn preview_settlement(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
    Json(body): Json<SettlementRequest>,
) -> Result<Json<SettlementPreview>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    let proposal = manual_proposal(&body)?;
    let preview = state
        .ledger
        .preview_settlement(circle_id, round, proposal)
        .await?;
    Ok(Json(preview))
}

pub async fn finalize_settlement(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
    Json(body): Json<SettlementRequest>,
) -> Result<Json<SettlementPreview>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    let proposal = manual_proposal(&body)?;
    let settled = state
        .ledger
        .finalize_settlement(circle_id, round, proposal)
        .await?;
    Ok(Json(settled))
}

pub async fn record_payout(
    Path((circle_id, round)): Path<(String, RoundNumber)>,
    State(state): State<AppState>,
) -> Result<Json<Payout>, AppError> {
    let circle_id: CircleId = parse_id(&circle_id, "circleId")?;
    let payout = state
        .ledger
        .record_payout(circle_id, round, Utc::now())
        .await?;
    Ok(Json(payout))
}

fn manual_proposal(body: &SettlementRequest) -> Result<SettlementProposal, AppError> {
    Ok(SettlementProposal {
        winner_id: parse_id(&body.winner_id, "winnerId")?,
        bid_amount: body.bid_amount,
        source: BidSource::Manual,
    })
}
