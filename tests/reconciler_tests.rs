mod common;

use std::collections::HashSet;

use common::{cash, date, instruments, krw, usd};
use household_calendar::{
    calendar::{reconcile, EventId, LiveEventState, RecordAggregator, SummaryEvent},
    currency::CurrencyRegistry,
    ledger::{CashKind, LedgerRecord},
};

fn events(records: Vec<LedgerRecord>) -> Vec<SummaryEvent> {
    let currencies = CurrencyRegistry::default();
    let book = instruments();
    RecordAggregator::new(&currencies, &book).aggregate(&records).events
}

fn ids(events: &[SummaryEvent]) -> HashSet<EventId> {
    events.iter().map(|event| event.id.clone()).collect()
}

#[test]
fn replaces_a_with_c_and_keeps_b() {
    let a = cash(CashKind::Spending, date(2024, 3, 1), 10, krw());
    let b = cash(CashKind::Income, date(2024, 3, 2), 20, krw());
    let c = cash(CashKind::Transfer, date(2024, 3, 3), 30, usd());
    let previous = events(vec![a.into(), b.clone().into()]);
    let next = events(vec![b.into(), c.into()]);

    let delta = reconcile(&previous, &next);
    assert_eq!(delta.to_add.len(), 1);
    assert_eq!(delta.to_add[0].date, date(2024, 3, 3));
    assert_eq!(delta.to_remove.len(), 1);
    assert_eq!(delta.to_remove[0].date, date(2024, 3, 1));
    assert_eq!(delta.retained.len(), 1);
    assert_eq!(delta.retained[0].date, date(2024, 3, 2));
}

#[test]
fn delta_partitions_both_snapshots() {
    let previous = events(vec![
        cash(CashKind::Spending, date(2024, 3, 1), 10, krw()).into(),
        cash(CashKind::Spending, date(2024, 3, 2), 10, krw()).into(),
        cash(CashKind::Income, date(2024, 3, 2), 10, usd()).into(),
    ]);
    let next = events(vec![
        cash(CashKind::Spending, date(2024, 3, 2), 99, krw()).into(),
        cash(CashKind::Income, date(2024, 3, 4), 10, usd()).into(),
    ]);

    let delta = reconcile(&previous, &next);
    let added = ids(&delta.to_add);
    let removed = ids(&delta.to_remove);
    let retained = ids(&delta.retained);

    assert_eq!(&retained | &added, ids(&next));
    assert_eq!(&retained | &removed, ids(&previous));
    assert!(added.is_disjoint(&removed));

    let mut state = LiveEventState::new();
    state.apply(reconcile(&[], &previous));
    let summary = state.apply(delta);
    assert_eq!((summary.added, summary.removed, summary.updated), (1, 2, 1));
    assert_eq!(state.snapshot(), next);
}

#[test]
fn identical_snapshots_produce_empty_delta() {
    let snapshot = events(vec![cash(CashKind::Spending, date(2024, 3, 1), 10, krw()).into()]);
    let delta = reconcile(&snapshot, &snapshot);
    assert!(delta.is_empty());
    assert_eq!(delta.retained, snapshot);
}
