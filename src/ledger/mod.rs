//! Ledger record types, instrument lookup, and month period helpers.

pub mod instrument;
pub mod period;
pub mod record;

pub use instrument::{InstrumentBook, InstrumentRef, InstrumentRegistry};
pub use period::DateWindow;
pub use record::{
    CashKind, CashRecord, ExchangeKind, ExchangeRecord, LedgerRecord, MemoRecord, RecordFamily,
    TradeKind, TradeRecord,
};
