#![doc(test(attr(deny(warnings))))]

//! Household calendar: folds ledger records into day-level summary events, reconciles
//! them against what is on screen, and overlays solar and lunar anniversaries.

pub mod calendar;
pub mod cli;
pub mod config;
pub mod currency;
pub mod errors;
pub mod ledger;
pub mod storage;
pub mod utils;

pub use errors::{AggregationError, CalendarError, LedgerError};

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("household calendar tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
        super::init();
    }
}
