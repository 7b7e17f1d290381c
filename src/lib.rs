//! Time-banking marketplace core: members exchange services paid in time
//! credits, and a booking carries one exchange from request to settlement
//! (or through mediation when the requester disputes the work).

pub mod booking;
pub mod config;
pub mod error;
mod error_handler;
pub mod input;
pub mod ledger;
pub mod marketplace;
pub mod mediation;
pub mod notify;
pub mod output;
pub mod replay;
pub mod settlement;

pub use booking::{Actor, Booking, BookingId, BookingStatus, Event, EventKind, ServiceRef};
pub use config::Config;
pub use error::MarketError;
pub use ledger::{AccountId, Credits, Ledger};
pub use marketplace::Marketplace;
