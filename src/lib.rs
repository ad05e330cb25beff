pub mod api;
pub mod auction;
pub mod config;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;
pub mod projection;

pub use config::Config;
pub use db::{init_db, Repository};
pub use domain::{
    BiddingType, Circle, CircleId, CircleMember, CircleStatus, Decimal, HandStatus, MemberId,
    Round, RoundNumber, RoundStatus, ShareType, UserId,
};
pub use engine::{calculate_share_payment, CalculationInput, CalculationResult, PaymentStatus};
pub use error::AppError;
pub use orchestration::{LedgerError, LedgerService};
