//! Domain primitives: identifiers and round numbering.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! uuid_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new(id: Uuid) -> Self {
                $name(id)
            }

            /// Fresh random identifier.
            pub fn generate() -> Self {
                $name(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> &Uuid {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map($name)
            }
        }
    };
}

uuid_id!(
    /// Savings circle identifier.
    CircleId
);
uuid_id!(
    /// Identifier of one hand (slot) within a circle.
    MemberId
);
uuid_id!(
    /// Identifier of the person holding hands, possibly across several circles.
    UserId
);
uuid_id!(
    /// Ledger transaction identifier.
    TransactionId
);

/// 1-based round number. Round N is the Nth payout of the circle.
pub type RoundNumber = u32;

/// Slot number held by the organizer. The organizer never contributes.
pub const ORGANIZER_SLOT: u32 = 1;
