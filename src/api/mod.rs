pub mod auction;
pub mod circles;
pub mod health;
pub mod users;

use crate::auction::AuctionRegistry;
use crate::config::Config;
use crate::db::Repository;
use crate::error::AppError;
use crate::orchestration::LedgerService;
use axum::{
    routing::{get, post},
    Router,
};
use std::str::FromStr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub repo: Arc<Repository>,
    pub ledger: Arc<LedgerService>,
}

impl AppState {
    pub fn new(repo: Arc<Repository>, config: Config) -> Self {
        let auctions = Arc::new(AuctionRegistry::new(
            config.auction_bid_window(),
            config.auction_mailbox_size,
        ));
        let ledger = Arc::new(LedgerService::new(repo.clone(), auctions));
        Self { repo, ledger }
    }
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/circles/:circle_id/share", get(circles::get_share))
        .route("/v1/circles/:circle_id/collection", get(circles::get_collection))
        .route(
            "/v1/circles/:circle_id/rounds/:round/settlement/preview",
            post(circles::preview_settlement),
        )
        .route(
            "/v1/circles/:circle_id/rounds/:round/settlement",
            post(circles::finalize_settlement),
        )
        .route(
            "/v1/circles/:circle_id/rounds/:round/payout",
            post(circles::record_payout),
        )
        .route(
            "/v1/circles/:circle_id/rounds/:round/auction",
            post(auction::start_auction).get(auction::get_auction),
        )
        .route(
            "/v1/circles/:circle_id/rounds/:round/auction/bids",
            post(auction::place_bid),
        )
        .route(
            "/v1/circles/:circle_id/rounds/:round/auction/close",
            post(auction::close_auction),
        )
        .route("/v1/users/:user_id/upcoming", get(users::get_upcoming))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Parse a path or query identifier, naming the field on failure.
pub(crate) fn parse_id<T: FromStr>(raw: &str, field: &str) -> Result<T, AppError> {
    T::from_str(raw).map_err(|_| AppError::BadRequest(format!("Invalid {}", field)))
}
