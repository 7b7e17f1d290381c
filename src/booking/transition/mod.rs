//! The guards and field updates of each event, one file per event.
//! Status and role checks happen before any of these run: see `machine`.

mod accept;
mod confirm;
mod dispute;
mod mediation;
mod report_completion;
mod review;
