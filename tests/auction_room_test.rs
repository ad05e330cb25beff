use chitledger::auction::{Actor, AuctionError, AuctionRegistry, AuctionState, BidRejection, Config};
use chitledger::projection::BidSource;
use chitledger::{CircleId, Decimal, MemberId};
use chrono::Duration;

fn d(v: i64) -> Decimal {
    Decimal::from_i64(v)
}

#[tokio::test]
async fn test_concurrent_bids_keep_strict_maximum() {
    let bidders: Vec<MemberId> = (0..8).map(|_| MemberId::generate()).collect();
    let (actor, mailbox) = Actor::new(Config {
        circle_id: CircleId::generate(),
        round_number: 3,
        eligible: bidders.clone(),
        bid_window: Duration::seconds(30),
        mailbox_size: 4,
    });
    let handle = actor.start();
    mailbox.start().await.unwrap();

    let tasks: Vec<_> = bidders
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let mailbox = mailbox.clone();
            let member = *member;
            tokio::spawn(async move { mailbox.place_bid(member, d(100 * (i as i64 + 1))).await })
        })
        .collect();

    let mut accepted = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => accepted += 1,
            Err(AuctionError::Rejected(BidRejection::NotHigher { .. })) => {}
            Err(other) => panic!("unexpected error: {other}"),
        }
    }
    assert!(accepted >= 1);

    let snapshot = mailbox.snapshot().await.unwrap();
    let highest = snapshot.highest.unwrap();
    assert_eq!(highest.amount, d(800));
    assert_eq!(highest.member_id, bidders[7]);
    assert_eq!(snapshot.bid_count, accepted);

    let outcome = mailbox.close().await.unwrap();
    let proposal = outcome.proposal().unwrap();
    assert_eq!(proposal.winner_id, bidders[7]);
    assert_eq!(proposal.bid_amount, d(800));
    assert_eq!(proposal.source, BidSource::LiveAuction);

    handle.await.unwrap();
    assert_eq!(mailbox.snapshot().await, Err(AuctionError::MailboxClosed));
}

#[tokio::test]
async fn test_registry_lifecycle() {
    let registry = AuctionRegistry::new(Duration::seconds(10), 16);
    let circle_id = CircleId::generate();
    let alice = MemberId::generate();
    let bob = MemberId::generate();

    let opened = registry.open(circle_id, 2, vec![alice, bob]).await.unwrap();
    assert_eq!(opened.state, AuctionState::Live);
    assert!(opened.highest.is_none());

    registry.place_bid(circle_id, 2, alice, d(300)).await.unwrap();
    let rejected = registry.place_bid(circle_id, 2, bob, d(300)).await;
    assert_eq!(
        rejected,
        Err(AuctionError::Rejected(BidRejection::NotHigher {
            amount: d(300),
            highest: d(300),
        }))
    );
    registry.place_bid(circle_id, 2, bob, d(350)).await.unwrap();

    let outcome = registry.close(circle_id, 2).await.unwrap();
    assert_eq!(outcome.bid_count, 2);
    assert_eq!(outcome.winner.unwrap().member_id, bob);

    assert!(matches!(
        registry.snapshot(circle_id, 2).await,
        Err(AuctionError::NotRunning { round: 2, .. })
    ));
    // The round can be auctioned again once the previous session is gone.
    registry.open(circle_id, 2, vec![alice]).await.unwrap();
}
