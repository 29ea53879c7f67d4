use std::fmt;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::currency::{format_amount, CurrencyCode};
use crate::ledger::{CashKind, ExchangeKind, TradeKind};

/// Category of a calendar event. Declaration order is display precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventKind {
    Spending,
    Income,
    Transfer,
    Buy,
    Sell,
    ExchangeBuy,
    ExchangeSell,
    Memo,
}

impl EventKind {
    pub const ALL: [EventKind; 8] = [
        EventKind::Spending,
        EventKind::Income,
        EventKind::Transfer,
        EventKind::Buy,
        EventKind::Sell,
        EventKind::ExchangeBuy,
        EventKind::ExchangeSell,
        EventKind::Memo,
    ];

    pub fn precedence(self) -> u8 {
        self as u8
    }

    pub fn slug(self) -> &'static str {
        match self {
            EventKind::Spending => "spending",
            EventKind::Income => "income",
            EventKind::Transfer => "transfer",
            EventKind::Buy => "buy",
            EventKind::Sell => "sell",
            EventKind::ExchangeBuy => "exchange-buy",
            EventKind::ExchangeSell => "exchange-sell",
            EventKind::Memo => "memo",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            EventKind::Spending => "Spending",
            EventKind::Income => "Income",
            EventKind::Transfer => "Transfer",
            EventKind::Buy => "Buy",
            EventKind::Sell => "Sell",
            EventKind::ExchangeBuy => "Exchange (buy)",
            EventKind::ExchangeSell => "Exchange (sell)",
            EventKind::Memo => "Memo",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            EventKind::Spending => "-",
            EventKind::Income => "+",
            EventKind::Transfer => "=",
            EventKind::Buy => "B",
            EventKind::Sell => "S",
            EventKind::ExchangeBuy | EventKind::ExchangeSell => "$",
            EventKind::Memo => "*",
        }
    }
}

impl From<CashKind> for EventKind {
    fn from(kind: CashKind) -> Self {
        match kind {
            CashKind::Spending => EventKind::Spending,
            CashKind::Income => EventKind::Income,
            CashKind::Transfer => EventKind::Transfer,
        }
    }
}

impl From<TradeKind> for EventKind {
    fn from(kind: TradeKind) -> Self {
        match kind {
            TradeKind::Buy => EventKind::Buy,
            TradeKind::Sell => EventKind::Sell,
        }
    }
}

impl From<ExchangeKind> for EventKind {
    fn from(kind: ExchangeKind) -> Self {
        match kind {
            ExchangeKind::ExchangeBuy => EventKind::ExchangeBuy,
            ExchangeKind::ExchangeSell => EventKind::ExchangeSell,
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What an event is grouped by besides its date and kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventSubject {
    Currency(CurrencyCode),
    Memo { id: Uuid, note: String },
}

/// Stable identity of a summary event, derived from (date, kind, currency) only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EventId(String);

impl EventId {
    pub fn summary(date: NaiveDate, kind: EventKind, currency: &CurrencyCode) -> Self {
        Self(format!("{}:{}:{}", date.format("%Y-%m-%d"), kind.slug(), currency))
    }

    pub fn memo(date: NaiveDate, memo: Uuid) -> Self {
        Self(format!("{}:{}:{}", date.format("%Y-%m-%d"), EventKind::Memo.slug(), memo))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Total display order: date, kind precedence, currency precedence, then memo note and id.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EventOrder {
    pub date: NaiveDate,
    pub kind: u8,
    pub currency: usize,
    pub memo: Option<(String, Uuid)>,
}

/// Day-level summary shown on the calendar.
#[derive(Debug, Clone, PartialEq)]
pub struct SummaryEvent {
    pub id: EventId,
    pub date: NaiveDate,
    pub kind: EventKind,
    pub subject: EventSubject,
    /// Summed amount; `None` for memos.
    pub amount: Option<Decimal>,
    /// Number of ledger records folded into this event.
    pub record_count: usize,
    pub order: EventOrder,
}

impl SummaryEvent {
    pub fn currency(&self) -> Option<&CurrencyCode> {
        match &self.subject {
            EventSubject::Currency(code) => Some(code),
            EventSubject::Memo { .. } => None,
        }
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }

    pub fn title(&self) -> String {
        match (&self.subject, self.amount) {
            (EventSubject::Currency(code), Some(amount)) => {
                format!("{} {}", self.kind.label(), format_amount(amount, code))
            }
            (EventSubject::Memo { note, .. }, _) => note.clone(),
            (EventSubject::Currency(code), None) => format!("{} {}", self.kind.label(), code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_ignores_amount() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let krw = CurrencyCode::new("KRW");
        assert_eq!(
            EventId::summary(date, EventKind::Spending, &krw),
            EventId::summary(date, EventKind::Spending, &krw)
        );
        assert_eq!(
            EventId::summary(date, EventKind::ExchangeSell, &krw).as_str(),
            "2024-03-05:exchange-sell:KRW"
        );
    }

    #[test]
    fn kind_precedence_follows_declaration() {
        let ranks: Vec<u8> = EventKind::ALL.iter().map(|kind| kind.precedence()).collect();
        assert_eq!(ranks, vec![0, 1, 2, 3, 4, 5, 6, 7]);
    }
}
