use chitledger::domain::PaymentWindow;
use chitledger::projection::settlement::{compute, minimum_bid_waived, settle};
use chitledger::projection::{BidSource, SettlementError, SettlementProposal};
use chitledger::{
    BiddingType, Circle, CircleId, CircleMember, CircleStatus, Decimal, HandStatus, MemberId,
    PaymentStatus, Round, RoundNumber, RoundStatus, ShareType, UserId,
};
use chrono::NaiveDate;

fn d(v: i64) -> Decimal {
    Decimal::from_i64(v)
}

fn setup(share_type: ShareType) -> (Circle, Vec<CircleMember>) {
    let circle = Circle {
        id: CircleId::generate(),
        name: "market circle".to_string(),
        principal: d(10000),
        total_slots: 5,
        share_type,
        bidding_type: BiddingType::Auction,
        status: CircleStatus::Active,
        fine_rate: d(100),
        min_bid: d(200),
        admin_fee: d(250),
        payment_window: PaymentWindow::default(),
    };
    let members = (1..=5)
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
    (circle, members)
}

fn open_round(circle: &Circle, n: RoundNumber) -> Round {
    Round::open(circle.id, n, NaiveDate::from_ymd_opt(2026, n, 5).unwrap())
}

fn proposal(winner: MemberId, bid: i64, source: BidSource) -> SettlementProposal {
    SettlementProposal {
        winner_id: winner,
        bid_amount: d(bid),
        source,
    }
}

#[test]
fn test_scenario_e_zero_bid_accepted_with_one_living_hand() {
    let (circle, mut members) = setup(ShareType::InterestDeducted);
    // Slots 2, 3 and 4 already won rounds 1 to 3; slot 5 is the last living hand.
    for (slot, round) in [(1usize, 1u32), (2, 2), (3, 3)] {
        members[slot].hand_status = HandStatus::Dead;
        members[slot].won_round = Some(round);
        members[slot].won_bid_amount = Some(d(400));
    }
    let round = open_round(&circle, 4);
    assert!(minimum_bid_waived(&circle, &members, 4));

    let preview = settle(
        &circle,
        &members,
        &round,
        &proposal(members[4].id, 0, BidSource::Manual),
    )
    .unwrap();
    assert_eq!(preview.bid_amount, Decimal::zero());
    // three dead hands at the principal, organizer and winner exempt
    assert_eq!(preview.total_pot, d(30000));
}

#[test]
fn test_minimum_bid_enforced_mid_circle() {
    let (circle, members) = setup(ShareType::InterestDeducted);
    let err = settle(
        &circle,
        &members,
        &open_round(&circle, 3),
        &proposal(members[2].id, 150, BidSource::Manual),
    )
    .unwrap_err();
    assert_eq!(
        err,
        SettlementError::BidBelowMinimum {
            bid: d(150),
            minimum: d(200)
        }
    );
}

#[test]
fn test_minimum_bid_waived_first_and_final_round() {
    let (circle, members) = setup(ShareType::InterestDeducted);
    for n in [1, 5] {
        let result = settle(
            &circle,
            &members,
            &open_round(&circle, n),
            &proposal(members[2].id, 0, BidSource::Manual),
        );
        assert!(result.is_ok(), "round {} should accept a zero bid", n);
    }
}

#[test]
fn test_rejected_inputs() {
    let (circle, mut members) = setup(ShareType::InterestDeducted);
    let round = open_round(&circle, 3);

    let negative = settle(
        &circle,
        &members,
        &round,
        &proposal(members[2].id, -5, BidSource::Manual),
    );
    assert_eq!(negative.unwrap_err(), SettlementError::NegativeBid);

    let stranger = MemberId::generate();
    let unknown = settle(
        &circle,
        &members,
        &round,
        &proposal(stranger, 300, BidSource::Manual),
    );
    assert_eq!(unknown.unwrap_err(), SettlementError::UnknownWinner(stranger));

    let mut decided = round.clone();
    decided.status = RoundStatus::Collecting;
    decided.winner_id = Some(members[3].id);
    let already = settle(
        &circle,
        &members,
        &decided,
        &proposal(members[2].id, 300, BidSource::Manual),
    );
    assert_eq!(already.unwrap_err(), SettlementError::RoundAlreadyDecided(3));

    members[2].hand_status = HandStatus::Dead;
    members[2].won_round = Some(2);
    let repeat = settle(
        &circle,
        &members,
        &round,
        &proposal(members[2].id, 300, BidSource::Manual),
    );
    assert!(matches!(
        repeat.unwrap_err(),
        SettlementError::WinnerAlreadyWon { round: 2, .. }
    ));
}

#[test]
fn test_inactive_circle_rejected() {
    let (mut circle, members) = setup(ShareType::InterestDeducted);
    circle.status = CircleStatus::Completed;
    let err = settle(
        &circle,
        &members,
        &open_round(&circle, 2),
        &proposal(members[2].id, 300, BidSource::Manual),
    )
    .unwrap_err();
    assert_eq!(err, SettlementError::CircleNotActive(circle.id));
}

#[test]
fn test_manual_and_live_proposals_produce_same_totals() {
    let (circle, members) = setup(ShareType::InterestAdded);
    let manual = compute(
        &circle,
        &members,
        2,
        &proposal(members[3].id, 600, BidSource::Manual),
    );
    let live = compute(
        &circle,
        &members,
        2,
        &proposal(members[3].id, 600, BidSource::LiveAuction),
    );
    assert_eq!(manual.total_pot, live.total_pot);
    assert_eq!(manual.shares, live.shares);
    assert_eq!(manual.net_payout, live.net_payout);
    assert_eq!(manual.source, BidSource::Manual);
    assert_eq!(live.source, BidSource::LiveAuction);
}

#[test]
fn test_preview_expected_total_substitutes_principal_for_settled_hand() {
    let (circle, mut members) = setup(ShareType::InterestDeducted);
    members[1].settle_upfront_amount = Some(d(45000));
    let preview = compute(
        &circle,
        &members,
        3,
        &proposal(members[3].id, 300, BidSource::Manual),
    );

    let settled = &preview.shares[1];
    assert_eq!(settled.status, PaymentStatus::SettledUpfront);
    assert_eq!(settled.pay_amount, Decimal::zero());
    assert_eq!(settled.expected_contribution, d(10000));
    // slots 3 and 5 alive at 9700
    assert_eq!(preview.total_pot, d(19400));
    assert_eq!(preview.expected_total, d(29400));
    assert_eq!(preview.net_payout, d(19150));
}

#[test]
fn test_finalized_round_records_winner() {
    let (circle, members) = setup(ShareType::InterestDeducted);
    let round = open_round(&circle, 2);
    let preview = settle(
        &circle,
        &members,
        &round,
        &proposal(members[2].id, 300, BidSource::Manual),
    )
    .unwrap();
    let finalized = preview.finalized_round(&round);
    assert_eq!(finalized.status, RoundStatus::Collecting);
    assert_eq!(finalized.winner_id, Some(members[2].id));
    assert_eq!(finalized.bid_amount, d(300));
    assert_eq!(finalized.total_pot, Some(d(29100)));
    assert_eq!(finalized.round_date, round.round_date);
}
