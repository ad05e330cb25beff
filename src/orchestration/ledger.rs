use crate::auction::{AuctionError, AuctionRegistry, AuctionSnapshot};
use crate::db::Repository;
use crate::domain::integrity::{validate_circle, validate_round};
use crate::domain::{
    BiddingType, Circle, CircleId, CircleMember, Decimal, IntegrityError, MemberId, Payout,
    Round, RoundNumber, Transaction, UserId,
};
use crate::engine::{calculate_share_payment, CalculationInput, CalculationResult};
use crate::projection::settlement::{self, SettlementError};
use crate::projection::upcoming::{self, Membership, UpcomingDues};
use crate::projection::{
    CircleCollection, CollectionProjector, LedgerView, RoundCollection, SettlementPreview,
    SettlementProposal,
};
use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use std::sync::Arc;
use thiserror::Error;

/// Share lookup for one member; unset fields come from the stored round.
#[derive(Debug, Clone, Copy)]
pub struct ShareRequest {
    pub member_id: MemberId,
    pub round_number: RoundNumber,
    pub winner_id: Option<MemberId>,
    pub bid_amount: Option<Decimal>,
    pub round_open: Option<bool>,
}

/// Loads consistent circle snapshots and runs the projectors over them.
#[derive(Clone)]
pub struct LedgerService {
    repo: Arc<Repository>,
    auctions: Arc<AuctionRegistry>,
}

struct CircleSnapshot {
    circle: Circle,
    members: Vec<CircleMember>,
}

struct CircleLedger {
    circle: Circle,
    members: Vec<CircleMember>,
    rounds: Vec<Round>,
}

impl LedgerService {
    pub fn new(repo: Arc<Repository>, auctions: Arc<AuctionRegistry>) -> Self {
        Self { repo, auctions }
    }

    /// What one member owes for one round.
    pub async fn share(
        &self,
        circle_id: CircleId,
        request: ShareRequest,
    ) -> Result<CalculationResult, LedgerError> {
        let snapshot = self.load_circle(circle_id).await?;
        let member = snapshot.member(request.member_id)?;

        validate_round(
            &snapshot.circle,
            &snapshot.members,
            request.round_number,
            request.winner_id,
        )
        .map_err(LedgerError::InvalidRequest)?;

        let stored = self
            .repo
            .get_round(circle_id, request.round_number)
            .await?;
        if let Some(round) = &stored {
            check_round(&snapshot, round)?;
        }

        let bidding = snapshot.circle.bidding_type;
        let winner = request.winner_id.or_else(|| match &stored {
            Some(round) => round.effective_winner(bidding, &snapshot.members),
            None if bidding == BiddingType::Ladder => snapshot
                .members
                .iter()
                .find(|m| m.slot_number == request.round_number)
                .map(|m| m.id),
            None => None,
        });
        let bid = request
            .bid_amount
            .or_else(|| stored.as_ref().map(|r| r.bid_amount))
            .unwrap_or_default();
        let open = request
            .round_open
            .or_else(|| stored.as_ref().map(Round::is_open))
            .unwrap_or(false);

        let input = CalculationInput::new(&snapshot.circle, member, request.round_number)
            .with_winner(winner)
            .with_bid(bid)
            .round_open(open);
        Ok(calculate_share_payment(&input))
    }

    pub async fn collection_round(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        now: DateTime<Utc>,
    ) -> Result<RoundCollection, LedgerError> {
        let ledger = self.load_ledger(circle_id).await?;
        let round = ledger
            .rounds
            .iter()
            .find(|r| r.round_number == round_number)
            .ok_or(LedgerError::RoundNotFound {
                circle_id,
                round: round_number,
            })?;

        let (transactions, payouts) = self.load_payments(circle_id).await?;
        let view = LedgerView {
            transactions: &transactions,
            payouts: &payouts,
        };
        let projector = CollectionProjector::new(&ledger.circle, &ledger.members, view, now);
        Ok(projector.project_round(round))
    }

    pub async fn collection(
        &self,
        circle_id: CircleId,
        now: DateTime<Utc>,
    ) -> Result<CircleCollection, LedgerError> {
        let ledger = self.load_ledger(circle_id).await?;
        let (transactions, payouts) = self.load_payments(circle_id).await?;
        let view = LedgerView {
            transactions: &transactions,
            payouts: &payouts,
        };
        Ok(CollectionProjector::new(&ledger.circle, &ledger.members, view, now)
            .project_all(&ledger.rounds))
    }

    /// Pot and per-member breakdown of a proposal, without persisting it.
    pub async fn preview_settlement(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        proposal: SettlementProposal,
    ) -> Result<SettlementPreview, LedgerError> {
        let snapshot = self.load_circle(circle_id).await?;
        let round = self.load_round(&snapshot, round_number).await?;
        Ok(settlement::settle(
            &snapshot.circle,
            &snapshot.members,
            &round,
            &proposal,
        )?)
    }

    /// Settle the round and persist the outcome.
    pub async fn finalize_settlement(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        proposal: SettlementProposal,
    ) -> Result<SettlementPreview, LedgerError> {
        let snapshot = self.load_circle(circle_id).await?;
        let round = self.load_round(&snapshot, round_number).await?;
        let preview = settlement::settle(&snapshot.circle, &snapshot.members, &round, &proposal)?;

        if !self.repo.finalize_round(&preview.finalized_round(&round)).await? {
            return Err(LedgerError::RoundAlreadySettled(round_number));
        }

        tracing::info!(
            circle_id = %circle_id,
            round = round_number,
            winner_id = %preview.winner_id,
            bid = %preview.bid_amount,
            total_pot = %preview.total_pot,
            source = ?preview.source,
            "round settled"
        );
        Ok(preview)
    }

    /// Record that the round's net pot was handed to its winner.
    pub async fn record_payout(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        now: DateTime<Utc>,
    ) -> Result<Payout, LedgerError> {
        let snapshot = self.load_circle(circle_id).await?;
        let round = self.load_round(&snapshot, round_number).await?;

        let (Some(winner_id), Some(gross_pot)) = (round.winner_id, round.total_pot) else {
            return Err(LedgerError::NoWinner(round_number));
        };
        let payout = Payout {
            circle_id,
            round_number,
            winner_id,
            gross_pot,
            admin_fee: snapshot.circle.admin_fee,
            net_amount: (gross_pot - snapshot.circle.admin_fee).non_negative(),
            paid_at: now,
        };

        if !self.repo.record_payout(&payout).await? {
            return Err(LedgerError::PayoutExists(round_number));
        }

        tracing::info!(
            circle_id = %circle_id,
            round = round_number,
            winner_id = %winner_id,
            net_amount = %payout.net_amount,
            "payout recorded"
        );
        Ok(payout)
    }

    /// Payment worklist of a user across every circle they hold a hand in.
    ///
    /// A circle whose stored snapshot fails integrity checks is left out and
    /// reported in the log; the rest of the worklist is still produced.
    pub async fn upcoming_dues(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<UpcomingDues, LedgerError> {
        let circle_ids = self.repo.list_circle_ids_for_user(user_id).await?;

        let loads = circle_ids.into_iter().map(|circle_id| async move {
            match self.load_ledger(circle_id).await {
                Ok(ledger) => Ok(Some(ledger)),
                Err(LedgerError::Integrity(e)) => {
                    tracing::error!(
                        circle_id = %circle_id,
                        error = %e,
                        "skipping circle with integrity violation"
                    );
                    Ok(None)
                }
                Err(e) => Err(e),
            }
        });
        let ledgers: Vec<CircleLedger> = try_join_all(loads).await?.into_iter().flatten().collect();

        let hands: Vec<MemberId> = ledgers
            .iter()
            .flat_map(|l| l.members.iter())
            .filter(|m| m.user_id == user_id)
            .map(|m| m.id)
            .collect();
        let transactions: Vec<Transaction> = try_join_all(
            hands
                .iter()
                .map(|member_id| self.repo.list_transactions_for_member(*member_id)),
        )
        .await?
        .into_iter()
        .flatten()
        .collect();

        let memberships: Vec<Membership<'_>> = ledgers
            .iter()
            .flat_map(|ledger| {
                ledger
                    .members
                    .iter()
                    .filter(move |m| m.user_id == user_id)
                    .map(move |member| Membership {
                        circle: &ledger.circle,
                        member,
                        members: &ledger.members,
                        rounds: &ledger.rounds,
                    })
            })
            .collect();

        Ok(upcoming::project(&memberships, &transactions, now))
    }

    /// Open live bidding on an undecided auction round.
    pub async fn start_auction(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<AuctionSnapshot, LedgerError> {
        let snapshot = self.load_circle(circle_id).await?;
        if snapshot.circle.bidding_type != BiddingType::Auction {
            return Err(LedgerError::NotAuction(circle_id));
        }
        let round = self.load_round(&snapshot, round_number).await?;
        if !round.is_open() || round.winner_id.is_some() {
            return Err(SettlementError::RoundAlreadyDecided(round_number).into());
        }

        let eligible = snapshot
            .members
            .iter()
            .filter(|m| !m.is_organizer() && !m.is_dead())
            .map(|m| m.id)
            .collect();
        Ok(self.auctions.open(circle_id, round_number, eligible).await?)
    }

    pub async fn place_bid(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
        member_id: MemberId,
        amount: Decimal,
    ) -> Result<AuctionSnapshot, LedgerError> {
        Ok(self
            .auctions
            .place_bid(circle_id, round_number, member_id, amount)
            .await?)
    }

    pub async fn auction_snapshot(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<AuctionSnapshot, LedgerError> {
        Ok(self.auctions.snapshot(circle_id, round_number).await?)
    }

    /// Close bidding and settle the round on the highest bid.
    pub async fn close_auction(
        &self,
        circle_id: CircleId,
        round_number: RoundNumber,
    ) -> Result<SettlementPreview, LedgerError> {
        let outcome = self.auctions.close(circle_id, round_number).await?;
        let proposal = outcome
            .proposal()
            .ok_or(LedgerError::NoBids(round_number))?;
        self.finalize_settlement(circle_id, round_number, proposal)
            .await
    }

    async fn load_circle(&self, circle_id: CircleId) -> Result<CircleSnapshot, LedgerError> {
        let circle = self
            .repo
            .get_circle(circle_id)
            .await?
            .ok_or(LedgerError::CircleNotFound(circle_id))?;
        let members = self.repo.list_members(circle_id).await?;

        if let Err(e) = validate_circle(&circle, &members) {
            tracing::error!(
                circle_id = %circle_id,
                error = %e,
                "circle snapshot failed integrity check"
            );
            return Err(e.into());
        }
        Ok(CircleSnapshot { circle, members })
    }

    async fn load_round(
        &self,
        snapshot: &CircleSnapshot,
        round_number: RoundNumber,
    ) -> Result<Round, LedgerError> {
        let circle_id = snapshot.circle.id;
        let round = self
            .repo
            .get_round(circle_id, round_number)
            .await?
            .ok_or(LedgerError::RoundNotFound {
                circle_id,
                round: round_number,
            })?;
        check_round(snapshot, &round)?;
        Ok(round)
    }

    async fn load_ledger(&self, circle_id: CircleId) -> Result<CircleLedger, LedgerError> {
        let snapshot = self.load_circle(circle_id).await?;
        let rounds = self.repo.list_rounds(circle_id).await?;
        for round in &rounds {
            check_round(&snapshot, round)?;
        }
        Ok(CircleLedger {
            circle: snapshot.circle,
            members: snapshot.members,
            rounds,
        })
    }

    async fn load_payments(
        &self,
        circle_id: CircleId,
    ) -> Result<(Vec<Transaction>, Vec<Payout>), LedgerError> {
        let (transactions, payouts) = futures::try_join!(
            self.repo.list_transactions_for_circle(circle_id),
            self.repo.list_payouts(circle_id),
        )?;
        Ok((transactions, payouts))
    }
}

impl CircleSnapshot {
    fn member(&self, member_id: MemberId) -> Result<&CircleMember, LedgerError> {
        self.members
            .iter()
            .find(|m| m.id == member_id)
            .ok_or(LedgerError::MemberNotFound(member_id))
    }
}

fn check_round(snapshot: &CircleSnapshot, round: &Round) -> Result<(), LedgerError> {
    validate_round(
        &snapshot.circle,
        &snapshot.members,
        round.round_number,
        round.winner_id,
    )
    .map_err(|e| {
        tracing::error!(
            circle_id = %snapshot.circle.id,
            round = round.round_number,
            error = %e,
            "stored round failed integrity check"
        );
        LedgerError::Integrity(e)
    })
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("circle {0} not found")]
    CircleNotFound(CircleId),
    #[error("round {round} of circle {circle_id} not found")]
    RoundNotFound {
        circle_id: CircleId,
        round: RoundNumber,
    },
    #[error("member {0} not found in circle")]
    MemberNotFound(MemberId),
    #[error("invalid request: {0}")]
    InvalidRequest(#[source] IntegrityError),
    #[error("circle {0} does not use auction bidding")]
    NotAuction(CircleId),
    #[error("round {0} was settled by another request")]
    RoundAlreadySettled(RoundNumber),
    #[error("round {0} has no decided winner to pay out")]
    NoWinner(RoundNumber),
    #[error("round {0} has already been paid out")]
    PayoutExists(RoundNumber),
    #[error("auction for round {0} closed without any bids")]
    NoBids(RoundNumber),
    #[error(transparent)]
    Integrity(#[from] IntegrityError),
    #[error(transparent)]
    Settlement(#[from] SettlementError),
    #[error(transparent)]
    Auction(#[from] AuctionError),
    #[error(transparent)]
    Db(#[from] sqlx::Error),
}
