use axum::body::Body;
use axum::http::{Request, StatusCode};
use chitledger::api::{self, AppState};
use chitledger::config::Config;
use chitledger::db::init_db;
use chitledger::domain::PaymentWindow;
use chitledger::{
    BiddingType, Circle, CircleId, CircleMember, CircleStatus, Decimal, HandStatus, MemberId,
    Repository, Round, ShareType, UserId,
};
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::sync::Arc;
use tempfile::TempDir;
use tower::util::ServiceExt;

struct TestApp {
    router: axum::Router,
    circle: Circle,
    members: Vec<CircleMember>,
    _temp: TempDir,
}

async fn setup_test_app(bidding_type: BiddingType) -> TestApp {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir
        .path()
        .join("test.db")
        .to_string_lossy()
        .to_string();

    let pool = init_db(&db_path).await.expect("init_db failed");
    let repo = Arc::new(Repository::new(pool));

    let circle = Circle {
        id: CircleId::generate(),
        name: "Riverside circle".to_string(),
        principal: Decimal::from_i64(10000),
        total_slots: 5,
        share_type: ShareType::InterestDeducted,
        bidding_type,
        status: CircleStatus::Active,
        fine_rate: Decimal::from_i64(100),
        min_bid: Decimal::from_i64(200),
        admin_fee: Decimal::from_i64(250),
        payment_window: PaymentWindow::default(),
    };
    let members: Vec<CircleMember> = (1..=5)
        .map(|slot| CircleMember {
            id: MemberId::generate(),
            circle_id: circle.id,
            user_id: UserId::generate(),
            display_name: format!("hand {}", slot),
            slot_number: slot,
            hand_status: HandStatus::Alive,
            won_round: None,
            won_bid_amount: None,
            fixed_due_amount: None,
            settle_upfront_amount: None,
        })
        .collect();

    repo.insert_circle(&circle).await.unwrap();
    repo.insert_members(&members).await.unwrap();
    for n in 1..=5 {
        let date = NaiveDate::from_ymd_opt(2026, n, 1).unwrap();
        repo.insert_round(&Round::open(circle.id, n, date))
            .await
            .unwrap();
    }

    let config = Config {
        port: 0,
        database_path: db_path,
        auction_bid_window_secs: 30,
        auction_mailbox_size: 16,
    };

    TestApp {
        router: api::create_router(AppState::new(repo, config)),
        circle,
        members,
        _temp: temp_dir,
    }
}

impl TestApp {
    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post(&self, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method("POST").uri(uri);
        let request = match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, value)
    }

    fn round_uri(&self, round: u32, suffix: &str) -> String {
        format!("/v1/circles/{}/rounds/{}/{}", self.circle.id, round, suffix)
    }
}

fn amount(value: &Value) -> f64 {
    value.as_f64().unwrap()
}

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_test_app(BiddingType::Auction).await;
    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint() {
    let app = setup_test_app(BiddingType::Auction).await;
    let (status, body) = app.get("/ready").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ready");
}

#[tokio::test]
async fn test_share_endpoint() {
    let app = setup_test_app(BiddingType::Auction).await;
    let uri = format!(
        "/v1/circles/{}/share?memberId={}&round=2&winnerId={}&bidAmount=300",
        app.circle.id, app.members[3].id, app.members[2].id
    );
    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&body["payAmount"]), 9700.0);
    assert_eq!(body["status"], "alive_hand");

    let uri = format!(
        "/v1/circles/{}/share?memberId={}&round=2",
        app.circle.id, app.members[0].id
    );
    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "organizer_exempt");
}

#[tokio::test]
async fn test_share_rejects_bad_input() {
    let app = setup_test_app(BiddingType::Auction).await;

    let uri = format!("/v1/circles/{}/share?memberId=nope&round=2", app.circle.id);
    let (status, body) = app.get(&uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].as_str().unwrap().contains("memberId"));

    let uri = format!(
        "/v1/circles/{}/share?memberId={}&round=9",
        app.circle.id, app.members[3].id
    );
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let uri = format!(
        "/v1/circles/{}/share?memberId={}&round=2",
        CircleId::generate(),
        app.members[3].id
    );
    let (status, _) = app.get(&uri).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_settlement_and_payout_flow() {
    let app = setup_test_app(BiddingType::Auction).await;
    let winner = app.members[1].id.to_string();

    let (status, _) = app
        .post(
            &app.round_uri(2, "settlement/preview"),
            Some(json!({"winnerId": winner, "bidAmount": 100})),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.post(&app.round_uri(2, "payout"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let request = json!({"winnerId": winner, "bidAmount": 300});
    let (status, preview) = app
        .post(&app.round_uri(2, "settlement/preview"), Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&preview["totalPot"]), 29100.0);
    assert_eq!(amount(&preview["netPayout"]), 28850.0);
    assert_eq!(preview["source"], "manual");

    let (status, settled) = app
        .post(&app.round_uri(2, "settlement"), Some(request.clone()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["totalPot"], preview["totalPot"]);

    let (status, _) = app
        .post(&app.round_uri(2, "settlement"), Some(request))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/v1/circles/{}/collection?round=2", app.circle.id);
    let (status, collection) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(collection["roundStatus"], "collecting");
    assert_eq!(amount(&collection["expectedTotal"]), 29100.0);
    assert_eq!(collection["entries"][1]["status"], "awaiting_payout");

    let (status, payout) = app.post(&app.round_uri(2, "payout"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&payout["grossPot"]), 29100.0);
    assert_eq!(amount(&payout["netAmount"]), 28850.0);

    let (status, _) = app.post(&app.round_uri(2, "payout"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/v1/circles/{}/collection", app.circle.id);
    let (status, all) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(all["rounds"].as_array().unwrap().len(), 5);
    assert_eq!(all["rounds"][1]["entries"][1]["status"], "payout_completed");
}

#[tokio::test]
async fn test_live_auction_flow_and_upcoming_dues() {
    let app = setup_test_app(BiddingType::Auction).await;

    let (status, _) = app
        .post(
            &app.round_uri(2, "settlement"),
            Some(json!({"winnerId": app.members[1].id.to_string(), "bidAmount": 300})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.get(&app.round_uri(3, "auction")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, started) = app.post(&app.round_uri(3, "auction"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(started["state"], "live");

    let (status, _) = app.post(&app.round_uri(3, "auction"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let bid = |member: &CircleMember, value: i64| {
        json!({"memberId": member.id.to_string(), "amount": value})
    };
    let (status, _) = app
        .post(&app.round_uri(3, "auction/bids"), Some(bid(&app.members[1], 500)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT, "a dead hand may not bid");

    let (status, snapshot) = app
        .post(&app.round_uri(3, "auction/bids"), Some(bid(&app.members[3], 250)))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&snapshot["highest"]["amount"]), 250.0);

    let (status, _) = app
        .post(&app.round_uri(3, "auction/bids"), Some(bid(&app.members[4], 250)))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, settled) = app.post(&app.round_uri(3, "auction/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(settled["winnerId"], app.members[3].id.to_string());
    assert_eq!(settled["source"], "live_auction");

    let uri = format!("/v1/users/{}/upcoming", app.members[2].user_id);
    let (status, dues) = app.get(&uri).await;
    assert_eq!(status, StatusCode::OK);
    let entries = dues["entries"].as_array().unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(amount(&entries[0]["remaining"]), 9700.0);
    assert_eq!(amount(&entries[1]["remaining"]), 9750.0);
    assert_eq!(amount(&dues["totalRemaining"]), 19450.0);
}

#[tokio::test]
async fn test_final_round_settles_live_at_zero_bid() {
    let app = setup_test_app(BiddingType::Auction).await;
    let winner = app.members[3].id.to_string();

    let (status, manual) = app
        .post(
            &app.round_uri(5, "settlement/preview"),
            Some(json!({"winnerId": winner, "bidAmount": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post(&app.round_uri(5, "auction"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, snapshot) = app
        .post(
            &app.round_uri(5, "auction/bids"),
            Some(json!({"memberId": winner, "amount": 0})),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(amount(&snapshot["highest"]["amount"]), 0.0);

    let (status, live) = app.post(&app.round_uri(5, "auction/close"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(live["winnerId"], winner);
    assert_eq!(live["source"], "live_auction");
    assert_eq!(amount(&live["bidAmount"]), 0.0);
    assert_eq!(amount(&live["totalPot"]), 30000.0);
    assert_eq!(live["totalPot"], manual["totalPot"]);
    assert_eq!(live["netPayout"], manual["netPayout"]);
    assert_eq!(live["shares"], manual["shares"]);
}

#[tokio::test]
async fn test_close_without_bids_leaves_round_open() {
    let app = setup_test_app(BiddingType::Auction).await;
    let (status, _) = app.post(&app.round_uri(3, "auction"), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app.post(&app.round_uri(3, "auction/close"), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let uri = format!("/v1/circles/{}/collection?round=3", app.circle.id);
    let (_, collection) = app.get(&uri).await;
    assert_eq!(collection["roundStatus"], "open");
}

#[tokio::test]
async fn test_ladder_circle_refuses_live_auction() {
    let app = setup_test_app(BiddingType::Ladder).await;
    let (status, _) = app.post(&app.round_uri(2, "auction"), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}
