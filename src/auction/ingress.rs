use super::{AuctionError, AuctionOutcome, AuctionSnapshot, BidRejection};
use crate::domain::{Decimal, MemberId};
use tokio::sync::{mpsc, oneshot};
use tracing::warn;

pub enum Message {
    Start {
        response: oneshot::Sender<AuctionSnapshot>,
    },
    PlaceBid {
        member_id: MemberId,
        amount: Decimal,
        response: oneshot::Sender<Result<AuctionSnapshot, BidRejection>>,
    },
    Snapshot {
        response: oneshot::Sender<AuctionSnapshot>,
    },
    Close {
        response: oneshot::Sender<AuctionOutcome>,
    },
}

/// Handle to one running auction session.
#[derive(Clone)]
pub struct Mailbox {
    sender: mpsc::Sender<Message>,
}

impl Mailbox {
    pub(super) fn new(sender: mpsc::Sender<Message>) -> Self {
        Self { sender }
    }

    /// Open bidding. Starting a live session again returns its state.
    pub async fn start(&self) -> Result<AuctionSnapshot, AuctionError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Start { response }, "start").await?;
        receiver.await.map_err(|_| dropped("start"))
    }

    pub async fn place_bid(
        &self,
        member_id: MemberId,
        amount: Decimal,
    ) -> Result<AuctionSnapshot, AuctionError> {
        let (response, receiver) = oneshot::channel();
        self.send(
            Message::PlaceBid {
                member_id,
                amount,
                response,
            },
            "place_bid",
        )
        .await?;
        let accepted = receiver.await.map_err(|_| dropped("place_bid"))?;
        Ok(accepted?)
    }

    pub async fn snapshot(&self) -> Result<AuctionSnapshot, AuctionError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Snapshot { response }, "snapshot").await?;
        receiver.await.map_err(|_| dropped("snapshot"))
    }

    /// End bidding. The actor stops after replying.
    pub async fn close(&self) -> Result<AuctionOutcome, AuctionError> {
        let (response, receiver) = oneshot::channel();
        self.send(Message::Close { response }, "close").await?;
        receiver.await.map_err(|_| dropped("close"))
    }

    async fn send(&self, message: Message, action: &'static str) -> Result<(), AuctionError> {
        if self.sender.send(message).await.is_err() {
            warn!(action, "auction mailbox closed; message dropped");
            return Err(AuctionError::MailboxClosed);
        }
        Ok(())
    }
}

fn dropped(action: &'static str) -> AuctionError {
    warn!(action, "auction actor dropped response");
    AuctionError::MailboxClosed
}
