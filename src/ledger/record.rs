use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::instrument::InstrumentRef;
use crate::currency::CurrencyCode;

/// Kinds of plain cash movements.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashKind {
    Spending,
    Income,
    Transfer,
}

impl CashKind {
    pub const ALL: [CashKind; 3] = [CashKind::Spending, CashKind::Income, CashKind::Transfer];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeKind {
    Buy,
    Sell,
}

impl TradeKind {
    pub const ALL: [TradeKind; 2] = [TradeKind::Buy, TradeKind::Sell];
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExchangeKind {
    ExchangeBuy,
    ExchangeSell,
}

impl ExchangeKind {
    pub const ALL: [ExchangeKind; 2] = [ExchangeKind::ExchangeBuy, ExchangeKind::ExchangeSell];
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CashRecord {
    pub id: Uuid,
    pub kind: CashKind,
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub amount: Decimal,
    pub currency: CurrencyCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl CashRecord {
    pub fn new(kind: CashKind, date: NaiveDate, amount: Decimal, currency: CurrencyCode) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            date,
            amount,
            currency,
            note: None,
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub id: Uuid,
    pub kind: TradeKind,
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub quantity: Decimal,
    pub instrument: InstrumentRef,
}

impl TradeRecord {
    pub fn new(
        kind: TradeKind,
        date: NaiveDate,
        price: Decimal,
        quantity: Decimal,
        instrument: impl Into<InstrumentRef>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            date,
            price,
            quantity,
            instrument: instrument.into(),
        }
    }

    /// Monetary magnitude of the trade in the instrument's currency, `None` on overflow.
    pub fn total(&self) -> Option<Decimal> {
        self.price.checked_mul(self.quantity)
    }
}

/// A currency exchange settled in the local currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExchangeRecord {
    pub id: Uuid,
    pub kind: ExchangeKind,
    pub date: NaiveDate,
    #[serde(with = "rust_decimal::serde::str")]
    pub buy_amount: Decimal,
    #[serde(with = "rust_decimal::serde::str")]
    pub sell_amount: Decimal,
}

impl ExchangeRecord {
    pub fn new(
        kind: ExchangeKind,
        date: NaiveDate,
        buy_amount: Decimal,
        sell_amount: Decimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            date,
            buy_amount,
            sell_amount,
        }
    }

    /// The side of the exchange that counts toward the day's summary.
    pub fn settled_amount(&self) -> Decimal {
        match self.kind {
            ExchangeKind::ExchangeBuy => self.buy_amount,
            ExchangeKind::ExchangeSell => self.sell_amount,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MemoRecord {
    pub id: Uuid,
    pub date: NaiveDate,
    pub note: String,
}

impl MemoRecord {
    pub fn new(date: NaiveDate, note: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            note: note.into(),
        }
    }
}

/// Discriminant shared by every ledger record variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFamily {
    Cash,
    Trade,
    Exchange,
    Memo,
}

/// Any record the ledger store hands to the calendar.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "family", rename_all = "lowercase")]
pub enum LedgerRecord {
    Cash(CashRecord),
    Trade(TradeRecord),
    Exchange(ExchangeRecord),
    Memo(MemoRecord),
}

impl LedgerRecord {
    pub fn id(&self) -> Uuid {
        match self {
            LedgerRecord::Cash(record) => record.id,
            LedgerRecord::Trade(record) => record.id,
            LedgerRecord::Exchange(record) => record.id,
            LedgerRecord::Memo(record) => record.id,
        }
    }

    pub fn date(&self) -> NaiveDate {
        match self {
            LedgerRecord::Cash(record) => record.date,
            LedgerRecord::Trade(record) => record.date,
            LedgerRecord::Exchange(record) => record.date,
            LedgerRecord::Memo(record) => record.date,
        }
    }

    pub fn family(&self) -> RecordFamily {
        match self {
            LedgerRecord::Cash(_) => RecordFamily::Cash,
            LedgerRecord::Trade(_) => RecordFamily::Trade,
            LedgerRecord::Exchange(_) => RecordFamily::Exchange,
            LedgerRecord::Memo(_) => RecordFamily::Memo,
        }
    }
}

impl From<CashRecord> for LedgerRecord {
    fn from(record: CashRecord) -> Self {
        LedgerRecord::Cash(record)
    }
}

impl From<TradeRecord> for LedgerRecord {
    fn from(record: TradeRecord) -> Self {
        LedgerRecord::Trade(record)
    }
}

impl From<ExchangeRecord> for LedgerRecord {
    fn from(record: ExchangeRecord) -> Self {
        LedgerRecord::Exchange(record)
    }
}

impl From<MemoRecord> for LedgerRecord {
    fn from(record: MemoRecord) -> Self {
        LedgerRecord::Memo(record)
    }
}
