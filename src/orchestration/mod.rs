pub mod ledger;

pub use ledger::{LedgerError, LedgerService, ShareRequest};
