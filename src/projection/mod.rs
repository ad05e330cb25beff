//! Consumers of the share engine.
//!
//! This module provides:
//! - Collection tracking per round and across the circle
//! - Bidding settlement (pot and finalized round record)
//! - The upcoming-dues worklist per member
//! - Lateness and fine estimation shared by the above

pub mod collection;
pub mod lateness;
pub mod settlement;
pub mod upcoming;

pub use collection::{
    CircleCollection, CollectionEntry, CollectionProjector, CollectionStatus, CollectionTotals,
    LedgerView, RoundCollection,
};
pub use lateness::Lateness;
pub use settlement::{
    BidSource, MemberShare, SettlementError, SettlementPreview, SettlementProposal,
};
pub use upcoming::{Membership, UpcomingDue, UpcomingDues};
