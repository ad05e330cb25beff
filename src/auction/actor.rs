use super::{
    AuctionOutcome, AuctionSnapshot, AuctionState, BidRejection, Config, HighestBid, Mailbox,
    Message,
};
use crate::domain::{Decimal, MemberId};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// Owns the session record of one live auction.
pub struct Actor {
    config: Config,
    mailbox: mpsc::Receiver<Message>,

    state: AuctionState,
    highest: Option<HighestBid>,
    ends_at: Option<DateTime<Utc>>,
    bid_count: u32,
}

impl Actor {
    pub fn new(config: Config) -> (Self, Mailbox) {
        let (sender, mailbox) = mpsc::channel(config.mailbox_size.max(1));
        (
            Self {
                config,
                mailbox,
                state: AuctionState::Pending,
                highest: None,
                ends_at: None,
                bid_count: 0,
            },
            Mailbox::new(sender),
        )
    }

    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        while let Some(message) = self.mailbox.recv().await {
            match message {
                Message::Start { response } => {
                    let now = Utc::now();
                    if self.state == AuctionState::Pending {
                        self.state = AuctionState::Live;
                        self.ends_at = Some(now + self.config.bid_window);
                        info!(
                            circle_id = %self.config.circle_id,
                            round = self.config.round_number,
                            eligible = self.config.eligible.len(),
                            "auction started"
                        );
                    }
                    let _ = response.send(self.snapshot(now));
                }
                Message::PlaceBid {
                    member_id,
                    amount,
                    response,
                } => {
                    let now = Utc::now();
                    let result = self.place_bid(member_id, amount, now);
                    if let Err(rejection) = &result {
                        debug!(
                            circle_id = %self.config.circle_id,
                            round = self.config.round_number,
                            %member_id,
                            %amount,
                            %rejection,
                            "bid rejected"
                        );
                    }
                    let _ = response.send(result.map(|()| self.snapshot(now)));
                }
                Message::Snapshot { response } => {
                    let _ = response.send(self.snapshot(Utc::now()));
                }
                Message::Close { response } => {
                    self.state = AuctionState::Closed;
                    let outcome = AuctionOutcome {
                        circle_id: self.config.circle_id,
                        round_number: self.config.round_number,
                        winner: self.highest.clone(),
                        bid_count: self.bid_count,
                    };
                    info!(
                        circle_id = %self.config.circle_id,
                        round = self.config.round_number,
                        bids = self.bid_count,
                        winner = ?outcome.winner.as_ref().map(|w| w.member_id),
                        "auction closed"
                    );
                    let _ = response.send(outcome);
                    break;
                }
            }
        }

        if self.state != AuctionState::Closed {
            warn!(
                circle_id = %self.config.circle_id,
                round = self.config.round_number,
                "auction mailbox closed before the session was closed"
            );
        }
    }

    fn place_bid(
        &mut self,
        member_id: MemberId,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), BidRejection> {
        if self.state != AuctionState::Live {
            return Err(BidRejection::NotLive(self.state));
        }
        if !self.config.eligible.contains(&member_id) {
            return Err(BidRejection::NotEligible(member_id));
        }
        if amount.is_negative() {
            return Err(BidRejection::Negative(amount));
        }
        // The opening bid may be zero; later bids must beat the current one.
        if let Some(highest) = self.highest.as_ref().map(|bid| bid.amount) {
            if amount <= highest {
                return Err(BidRejection::NotHigher { amount, highest });
            }
        }

        self.highest = Some(HighestBid {
            member_id,
            amount,
            placed_at: now,
        });
        self.bid_count += 1;
        // Countdown restarts on every accepted bid.
        self.ends_at = Some(now + self.config.bid_window);
        Ok(())
    }

    fn snapshot(&self, now: DateTime<Utc>) -> AuctionSnapshot {
        AuctionSnapshot {
            circle_id: self.config.circle_id,
            round_number: self.config.round_number,
            state: self.state,
            highest: self.highest.clone(),
            bid_count: self.bid_count,
            ends_at: self.ends_at,
            countdown_elapsed: self.ends_at.is_some_and(|ends_at| now >= ends_at),
        }
    }
}
