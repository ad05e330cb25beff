//! Savings circle configuration.

use crate::domain::{CircleId, Decimal, RoundNumber};
use chrono::{DateTime, NaiveDate, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How the winning bid (interest) is accounted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShareType {
    /// The round's interest is subtracted from every living member's contribution.
    InterestDeducted,
    /// Dead hands repay principal plus the interest they bid when winning.
    InterestAdded,
}

/// How each round's winner is chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BiddingType {
    /// Sealed or live auction: the highest interest bid wins the round.
    Auction,
    /// Fixed order: the member in slot N wins round N.
    Ladder,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircleStatus {
    Initializing,
    Active,
    Completed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind} value: {value}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! str_enum {
    ($ty:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $ty {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($ty::$variant => $s,)+
                }
            }
        }

        impl ::std::fmt::Display for $ty {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl ::std::str::FromStr for $ty {
            type Err = $crate::domain::circle::ParseEnumError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok($ty::$variant),)+
                    other => Err($crate::domain::circle::ParseEnumError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

pub(crate) use str_enum;

str_enum!(ShareType, "share type", {
    InterestDeducted => "interest_deducted",
    InterestAdded => "interest_added",
});

str_enum!(BiddingType, "bidding type", {
    Auction => "auction",
    Ladder => "ladder",
});

str_enum!(CircleStatus, "circle status", {
    Initializing => "initializing",
    Active => "active",
    Completed => "completed",
});

/// Time-of-day window in which contributions are collected on a round's date.
///
/// Times are interpreted in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl Default for PaymentWindow {
    fn default() -> Self {
        Self {
            start: NaiveTime::default(),
            end: NaiveTime::from_hms_opt(23, 59, 59).unwrap_or_default(),
        }
    }
}

/// A rotating savings circle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Circle {
    pub id: CircleId,
    pub name: String,
    /// Contribution unit paid by every non-exempt hand each round.
    pub principal: Decimal,
    /// Number of hands, which is also the number of rounds.
    pub total_slots: u32,
    pub share_type: ShareType,
    pub bidding_type: BiddingType,
    pub status: CircleStatus,
    /// Fine charged per started day of lateness.
    pub fine_rate: Decimal,
    /// Smallest interest an auction bid may name (waived in exempt rounds).
    pub min_bid: Decimal,
    /// Deducted from the pot before it is paid to the winner.
    pub admin_fee: Decimal,
    pub payment_window: PaymentWindow,
}

impl Circle {
    pub fn is_ladder(&self) -> bool {
        self.bidding_type == BiddingType::Ladder
    }

    pub fn contains_round(&self, round: RoundNumber) -> bool {
        (1..=self.total_slots).contains(&round)
    }

    pub fn is_final_round(&self, round: RoundNumber) -> bool {
        round == self.total_slots
    }

    /// Deadline for contributions of a round held on `round_date`.
    pub fn due_at(&self, round_date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&round_date.and_time(self.payment_window.end))
    }
}
