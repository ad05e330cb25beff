//! Domain types for savings circles.
//!
//! This module provides:
//! - Lossless money handling via the Decimal wrapper
//! - Identifiers: CircleId, MemberId, UserId, TransactionId
//! - Circle, CircleMember and Round snapshots read by the share engine
//! - Transaction and payout ledger rows
//! - Snapshot integrity checks

pub mod circle;
pub mod decimal;
pub mod integrity;
pub mod ledger;
pub mod member;
pub mod primitives;
pub mod round;

pub use circle::{BiddingType, Circle, CircleStatus, ParseEnumError, PaymentWindow, ShareType};
pub use decimal::Decimal;
pub use integrity::IntegrityError;
pub use ledger::{PaymentTally, Payout, Transaction, TransactionStatus};
pub use member::{CircleMember, HandStatus};
pub use primitives::{CircleId, MemberId, RoundNumber, TransactionId, UserId, ORGANIZER_SLOT};
pub use round::{Round, RoundStatus};
