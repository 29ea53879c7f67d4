mod common;

use std::sync::Arc;

use common::{cash, date, instruments, krw, usd};
use household_calendar::{
    calendar::{CalendarController, EventKind},
    ledger::{CashKind, DateWindow, MemoRecord, TradeKind, TradeRecord},
    storage::{JsonLedgerStore, LedgerSnapshot, LedgerStore},
    LedgerError,
};
use rust_decimal::Decimal;
use tempfile::TempDir;

fn sample_snapshot() -> LedgerSnapshot {
    let mut snapshot = LedgerSnapshot::new();
    snapshot
        .cash
        .push(cash(CashKind::Spending, date(2024, 3, 5), 3_000, krw()));
    snapshot
        .cash
        .push(cash(CashKind::Spending, date(2024, 3, 5), 7_000, krw()));
    snapshot
        .cash
        .push(cash(CashKind::Income, date(2024, 4, 1), 10, usd()));
    snapshot.trades.push(TradeRecord::new(
        TradeKind::Buy,
        date(2024, 3, 8),
        Decimal::from(70_000),
        Decimal::from(2),
        "005930",
    ));
    snapshot
        .memos
        .push(MemoRecord::new(date(2024, 3, 8), "rebalance"));
    snapshot.instruments = instruments();
    snapshot
}

#[tokio::test]
async fn saves_and_queries_snapshot() {
    let temp = TempDir::new().unwrap();
    let store = JsonLedgerStore::new(temp.path().join("books").join("ledger.json"));
    let snapshot = sample_snapshot();
    store.save(&snapshot).await.unwrap();

    assert_eq!(store.load().await.unwrap(), snapshot);
    let march = DateWindow::month_of(date(2024, 3, 1));
    assert_eq!(store.cash_records(march, &CashKind::ALL).await.unwrap().len(), 2);
    assert_eq!(store.trade_records(march, &[TradeKind::Sell]).await.unwrap().len(), 0);
    assert_eq!(store.memo_records(march).await.unwrap().len(), 1);
}

#[tokio::test]
async fn amounts_are_stored_as_strings() {
    let temp = TempDir::new().unwrap();
    let store = JsonLedgerStore::new(temp.path().join("ledger.json"));
    store.save(&sample_snapshot()).await.unwrap();

    let raw = std::fs::read_to_string(store.path()).unwrap();
    assert!(raw.contains("\"amount\": \"3000\""));
    assert!(raw.contains("\"SPENDING\""));
}

#[tokio::test]
async fn missing_file_is_an_io_error() {
    let temp = TempDir::new().unwrap();
    let store = JsonLedgerStore::new(temp.path().join("absent.json"));
    let err = store
        .memo_records(DateWindow::month_of(date(2024, 3, 1)))
        .await
        .unwrap_err();
    assert!(matches!(err, LedgerError::Io(_)));
}

#[tokio::test]
async fn controller_reads_through_json_store() {
    let temp = TempDir::new().unwrap();
    let store = JsonLedgerStore::new(temp.path().join("ledger.json"));
    let mut snapshot = sample_snapshot();
    store.save(&snapshot).await.unwrap();

    let controller = CalendarController::new(store.clone(), Arc::new(snapshot.instruments.clone()));
    controller.navigate(date(2024, 3, 1)).await.unwrap();
    let kinds: Vec<EventKind> = controller.view().events.iter().map(|e| e.kind).collect();
    assert_eq!(kinds, vec![EventKind::Spending, EventKind::Buy, EventKind::Memo]);

    snapshot.memos.clear();
    store.save(&snapshot).await.unwrap();
    controller.notify_mutation().await.unwrap();
    assert!(controller.events_on(date(2024, 3, 8)).iter().all(|e| e.kind == EventKind::Buy));

    std::fs::write(store.path(), "{ not json").unwrap();
    assert!(controller.notify_mutation().await.is_err());
    assert_eq!(controller.view().events.len(), 2);
}

#[tokio::test]
async fn instruments_added_to_the_file_resolve_on_next_refresh() {
    let temp = TempDir::new().unwrap();
    let store = Arc::new(JsonLedgerStore::new(temp.path().join("ledger.json")));
    let mut snapshot = LedgerSnapshot::new();
    snapshot.trades.push(TradeRecord::new(
        TradeKind::Buy,
        date(2024, 3, 8),
        Decimal::from(190),
        Decimal::from(1),
        "AAPL",
    ));
    store.save(&snapshot).await.unwrap();

    let controller = CalendarController::new(Arc::clone(&store), store.clone());
    controller.navigate(date(2024, 3, 1)).await.unwrap();
    assert!(controller.view().events.is_empty());
    assert_eq!(controller.view().data_errors.len(), 1);

    snapshot.instruments = instruments();
    store.save(&snapshot).await.unwrap();
    controller.notify_mutation().await.unwrap();

    let view = controller.view();
    assert!(view.data_errors.is_empty());
    assert_eq!(view.events.len(), 1);
    assert_eq!(view.events[0].currency(), Some(&usd()));
}

#[tokio::test]
async fn lowercase_currency_codes_in_the_file_are_accepted() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("ledger.json");
    let spending = cash(CashKind::Spending, date(2024, 3, 5), 3_000, krw());
    let raw = serde_json::to_string(&LedgerSnapshot {
        cash: vec![spending],
        ..LedgerSnapshot::new()
    })
    .unwrap()
    .replace("\"KRW\"", "\"krw\"");
    std::fs::write(&path, raw).unwrap();

    let store = JsonLedgerStore::new(path);
    let loaded = store.load().await.unwrap();
    assert_eq!(loaded.cash[0].currency, krw());

    let controller = CalendarController::new(store, Arc::new(instruments()));
    controller.navigate(date(2024, 3, 1)).await.unwrap();
    let view = controller.view();
    assert!(view.data_errors.is_empty());
    assert_eq!(view.events.len(), 1);
}
