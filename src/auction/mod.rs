//! Live-bidding relay.
//!
//! Each running auction is one tokio task owning its session record. Callers
//! hold a cloneable [`Mailbox`]; the [`AuctionRegistry`] maps a circle round
//! to the mailbox of its running session. The countdown is advisory: closing
//! is always an explicit action, and the closed outcome feeds the settlement
//! calculator like a manual entry would.

mod actor;
mod ingress;

pub use actor::Actor;
pub use ingress::{Mailbox, Message};

use crate::domain::circle::str_enum;
use crate::domain::{CircleId, Decimal, MemberId, RoundNumber};
use crate::projection::{BidSource, SettlementProposal};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::info;

pub struct Config {
    pub circle_id: CircleId,
    pub round_number: RoundNumber,
    /// Hands allowed to bid.
    pub eligible: Vec<MemberId>,
    /// Countdown length, restarted by every accepted bid.
    pub bid_window: Duration,
    pub mailbox_size: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuctionState {
    Pending,
    Live,
    Closed,
}

str_enum!(AuctionState, "auction state", {
    Pending => "pending",
    Live => "live",
    Closed => "closed",
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HighestBid {
    pub member_id: MemberId,
    pub amount: Decimal,
    pub placed_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionSnapshot {
    pub circle_id: CircleId,
    pub round_number: RoundNumber,
    pub state: AuctionState,
    pub highest: Option<HighestBid>,
    pub bid_count: u32,
    pub ends_at: Option<DateTime<Utc>>,
    /// The countdown ran out. Bids are still accepted until closed.
    pub countdown_elapsed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuctionOutcome {
    pub circle_id: CircleId,
    pub round_number: RoundNumber,
    pub winner: Option<HighestBid>,
    pub bid_count: u32,
}

impl AuctionOutcome {
    /// Settlement input for the highest bid, if anyone bid at all.
    pub fn proposal(&self) -> Option<SettlementProposal> {
        self.winner.as_ref().map(|bid| SettlementProposal {
            winner_id: bid.member_id,
            bid_amount: bid.amount,
            source: BidSource::LiveAuction,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidRejection {
    #[error("auction is {0}, not live")]
    NotLive(AuctionState),
    #[error("member {0} may not bid in this auction")]
    NotEligible(MemberId),
    #[error("bid {0} is negative")]
    Negative(Decimal),
    #[error("bid {amount} does not exceed the highest bid of {highest}")]
    NotHigher { amount: Decimal, highest: Decimal },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuctionError {
    #[error("an auction for round {round} of circle {circle_id} is already running")]
    AlreadyRunning {
        circle_id: CircleId,
        round: RoundNumber,
    },
    #[error("no auction is running for round {round} of circle {circle_id}")]
    NotRunning {
        circle_id: CircleId,
        round: RoundNumber,
    },
    #[error("auction session is no longer reachable")]
    MailboxClosed,
    #[error(transparent)]
    Rejected(#[from] BidRejection),
}

/// Running auctions keyed by circle round.
pub struct AuctionRegistry {
    sessions: RwLock<HashMap<(CircleId, RoundNumber), Mailbox>>,
    bid_window: Duration,
    mailbox_size: usize,
}

impl AuctionRegistry {
    pub fn new(bid_window: Duration, mailbox_size: usize) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            bid_window,
            mailbox_size,
        }
    }

    /// Spawn a session for the round and open bidding.
    pub async fn open(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        eligible: Vec<MemberId>,
    ) -> Result<AuctionSnapshot, AuctionError> {
        let mut sessions = self.sessions.write().await;
        let key = (circle_id, round_number);
        if sessions.contains_key(&key) {
            return Err(AuctionError::AlreadyRunning {
                circle_id,
                round: round_number,
            });
        }

        let (actor, mailbox) = Actor::new(Config {
            circle_id,
            round_number,
            eligible,
            bid_window: self.bid_window,
            mailbox_size: self.mailbox_size,
        });
        actor.start();

        let snapshot = mailbox.start().await?;
        sessions.insert(key, mailbox);
        Ok(snapshot)
    }

    pub async fn mailbox(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<Mailbox, AuctionError> {
        self.sessions
            .read()
            .await
            .get(&(circle_id, round_number))
            .cloned()
            .ok_or(AuctionError::NotRunning {
                circle_id,
                round: round_number,
            })
    }

    pub async fn place_bid(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        member_id: MemberId,
        amount: Decimal,
    ) -> Result<AuctionSnapshot, AuctionError> {
        self.mailbox(circle_id, round_number)
            .await?
            .place_bid(member_id, amount)
            .await
    }

    pub async fn snapshot(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<AuctionSnapshot, AuctionError> {
        self.mailbox(circle_id, round_number).await?.snapshot().await
    }

    /// Close the session and drop it from the registry.
    pub async fn close(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<AuctionOutcome, AuctionError> {
        let mailbox = self
            .sessions
            .write()
            .await
            .remove(&(circle_id, round_number))
            .ok_or(AuctionError::NotRunning {
                circle_id,
                round: round_number,
            })?;
        let outcome = mailbox.close().await?;
        info!(%circle_id, round = round_number, "auction session removed");
        Ok(outcome)
    }
}
