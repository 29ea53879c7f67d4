use std::collections::{BTreeMap, HashSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::event::{EventId, EventKind, EventOrder, EventSubject, SummaryEvent};
use crate::currency::{CurrencyCode, CurrencyRegistry};
use crate::errors::AggregationError;
use crate::ledger::{InstrumentRegistry, LedgerRecord, MemoRecord, TradeRecord};

/// Events produced for one period plus the records that could not be placed.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AggregationReport {
    pub events: Vec<SummaryEvent>,
    pub errors: Vec<AggregationError>,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct GroupKey {
    date: NaiveDate,
    kind: EventKind,
    currency: CurrencyCode,
}

#[derive(Debug, Default)]
struct GroupTotal {
    amount: Decimal,
    records: usize,
}

/// Folds raw ledger records into day/kind/currency summary events.
pub struct RecordAggregator<'a> {
    currencies: &'a CurrencyRegistry,
    instruments: &'a dyn InstrumentRegistry,
}

impl<'a> RecordAggregator<'a> {
    pub fn new(currencies: &'a CurrencyRegistry, instruments: &'a dyn InstrumentRegistry) -> Self {
        Self {
            currencies,
            instruments,
        }
    }

    pub fn aggregate(&self, records: &[LedgerRecord]) -> AggregationReport {
        let mut groups: BTreeMap<GroupKey, GroupTotal> = BTreeMap::new();
        let mut memos: Vec<&MemoRecord> = Vec::new();
        let mut errors = Vec::new();
        let mut seen = HashSet::with_capacity(records.len());

        for record in records {
            if !seen.insert(record.id()) {
                skip(AggregationError::DuplicateRecord { record: record.id() }, &mut errors);
                continue;
            }

            let placed = match record {
                LedgerRecord::Memo(memo) => {
                    memos.push(memo);
                    continue;
                }
                LedgerRecord::Cash(cash) => {
                    self.group_key(record, cash.kind.into(), cash.currency.clone())
                        .map(|key| (key, cash.amount))
                }
                LedgerRecord::Trade(trade) => self
                    .instrument_currency(trade)
                    .and_then(|currency| self.group_key(record, trade.kind.into(), currency))
                    .and_then(|key| {
                        trade
                            .total()
                            .map(|amount| (key, amount))
                            .ok_or(AggregationError::AmountOverflow { record: trade.id })
                    }),
                LedgerRecord::Exchange(exchange) => self
                    .group_key(record, exchange.kind.into(), self.currencies.local().clone())
                    .map(|key| (key, exchange.settled_amount())),
            };

            let added = placed
                .and_then(|(key, amount)| accumulate(&mut groups, key, amount, record.id()));
            if let Err(err) = added {
                skip(err, &mut errors);
            }
        }

        let mut events: Vec<SummaryEvent> = groups
            .into_iter()
            .map(|(key, total)| self.summary_event(key, total))
            .chain(memos.into_iter().map(memo_event))
            .collect();
        events.sort_by(|a, b| a.order.cmp(&b.order));
        errors.sort_by_key(AggregationError::record);

        verify_unique_identities(&events);
        tracing::debug!(
            records = records.len(),
            events = events.len(),
            errors = errors.len(),
            "aggregated ledger records"
        );

        AggregationReport { events, errors }
    }

    fn instrument_currency(&self, trade: &TradeRecord) -> Result<CurrencyCode, AggregationError> {
        self.instruments
            .currency_of(&trade.instrument)
            .ok_or_else(|| AggregationError::UnknownInstrument {
                record: trade.id,
                instrument: trade.instrument.to_string(),
            })
    }

    fn group_key(
        &self,
        record: &LedgerRecord,
        kind: EventKind,
        currency: CurrencyCode,
    ) -> Result<GroupKey, AggregationError> {
        if !self.currencies.contains(&currency) {
            return Err(AggregationError::UnknownCurrency {
                record: record.id(),
                currency: currency.to_string(),
            });
        }
        Ok(GroupKey {
            date: record.date(),
            kind,
            currency,
        })
    }

    fn summary_event(&self, key: GroupKey, total: GroupTotal) -> SummaryEvent {
        let rank = self
            .currencies
            .precedence(&key.currency)
            .unwrap_or(usize::MAX);
        SummaryEvent {
            id: EventId::summary(key.date, key.kind, &key.currency),
            date: key.date,
            kind: key.kind,
            amount: Some(total.amount),
            record_count: total.records,
            order: EventOrder {
                date: key.date,
                kind: key.kind.precedence(),
                currency: rank,
                memo: None,
            },
            subject: EventSubject::Currency(key.currency),
        }
    }
}

fn accumulate(
    groups: &mut BTreeMap<GroupKey, GroupTotal>,
    key: GroupKey,
    amount: Decimal,
    record: Uuid,
) -> Result<(), AggregationError> {
    let total = groups.entry(key).or_default();
    total.amount = total
        .amount
        .checked_add(amount)
        .ok_or(AggregationError::AmountOverflow { record })?;
    total.records += 1;
    Ok(())
}

fn skip(err: AggregationError, errors: &mut Vec<AggregationError>) {
    tracing::warn!(record = %err.record(), "skipping record: {err}");
    errors.push(err);
}

fn memo_event(memo: &MemoRecord) -> SummaryEvent {
    SummaryEvent {
        id: EventId::memo(memo.date, memo.id),
        date: memo.date,
        kind: EventKind::Memo,
        subject: EventSubject::Memo {
            id: memo.id,
            note: memo.note.clone(),
        },
        amount: None,
        record_count: 1,
        order: EventOrder {
            date: memo.date,
            kind: EventKind::Memo.precedence(),
            currency: 0,
            memo: Some((memo.note.clone(), memo.id)),
        },
    }
}

/// Two events sharing an identity means the grouping key is broken.
fn verify_unique_identities(events: &[SummaryEvent]) {
    let mut seen = HashSet::with_capacity(events.len());
    for event in events {
        let fresh = seen.insert(&event.id);
        if !fresh {
            tracing::error!(event = %event.id, "duplicate summary identity in one aggregation run");
        }
        debug_assert!(fresh, "duplicate summary identity {}", event.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::{CashKind, CashRecord, InstrumentBook};

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn empty_input_yields_empty_report() {
        let currencies = CurrencyRegistry::default();
        let instruments = InstrumentBook::new();
        let report = RecordAggregator::new(&currencies, &instruments).aggregate(&[]);
        assert!(report.events.is_empty());
        assert!(report.errors.is_empty());
    }

    #[test]
    fn net_zero_group_is_still_emitted() {
        let currencies = CurrencyRegistry::default();
        let instruments = InstrumentBook::new();
        let krw = CurrencyCode::new("KRW");
        let records: Vec<LedgerRecord> = vec![
            CashRecord::new(CashKind::Transfer, date(2), Decimal::from(500), krw.clone()).into(),
            CashRecord::new(CashKind::Transfer, date(2), Decimal::from(-500), krw).into(),
        ];
        let report = RecordAggregator::new(&currencies, &instruments).aggregate(&records);
        assert_eq!(report.events.len(), 1);
        assert_eq!(report.events[0].amount, Some(Decimal::ZERO));
        assert_eq!(report.events[0].record_count, 2);
    }

    #[test]
    fn memos_sort_after_summaries_on_the_same_day() {
        let currencies = CurrencyRegistry::default();
        let instruments = InstrumentBook::new();
        let records: Vec<LedgerRecord> = vec![
            MemoRecord::new(date(4), "dentist").into(),
            CashRecord::new(CashKind::Income, date(4), Decimal::from(1), CurrencyCode::new("USD"))
                .into(),
        ];
        let report = RecordAggregator::new(&currencies, &instruments).aggregate(&records);
        let kinds: Vec<EventKind> = report.events.iter().map(|event| event.kind).collect();
        assert_eq!(kinds, vec![EventKind::Income, EventKind::Memo]);
        assert_eq!(report.events[1].title(), "dentist");
    }

    #[test]
    #[should_panic(expected = "duplicate summary identity")]
    fn repeated_identity_panics_in_debug_builds() {
        let memo = MemoRecord::new(date(4), "dentist");
        let event = memo_event(&memo);
        verify_unique_identities(&[event.clone(), event]);
    }
}
