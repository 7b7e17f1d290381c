//! Disputed bookings as mediation cases.
//!
//! A case isn't stored on its own: it's the booking (while its status has a
//! case) plus an ordered message log keyed by booking id. Keeping a single
//! record avoids the booking and the case ever disagreeing.

pub mod case;
pub mod manager;

pub use case::{CaseView, MediationMessage};
pub use manager::CaseManager;
