use thiserror::Error;
use uuid::Uuid;

/// Failures raised by ledger stores while answering range queries.
#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),
    #[error("Ledger store unavailable: {0}")]
    Unavailable(String),
}

/// A record the aggregator could not place into a summary group.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AggregationError {
    #[error("record {record} uses unregistered currency `{currency}`")]
    UnknownCurrency { record: Uuid, currency: String },
    #[error("record {record} references unknown instrument `{instrument}`")]
    UnknownInstrument { record: Uuid, instrument: String },
    #[error("record {record} pushes its amount past the representable range")]
    AmountOverflow { record: Uuid },
    #[error("record {record} appears more than once in the batch")]
    DuplicateRecord { record: Uuid },
}

impl AggregationError {
    /// Id of the offending record.
    pub fn record(&self) -> Uuid {
        match self {
            AggregationError::UnknownCurrency { record, .. }
            | AggregationError::UnknownInstrument { record, .. } => *record,
            AggregationError::AmountOverflow { record }
            | AggregationError::DuplicateRecord { record } => *record,
        }
    }
}

/// Errors surfaced by the calendar controller.
#[derive(Debug, Error)]
pub enum CalendarError {
    #[error("failed to load ledger records: {0}")]
    Store(#[from] LedgerError),
    #[error("no month is displayed yet")]
    NothingDisplayed,
}
