#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use household_calendar::{
    calendar::CalendarController,
    currency::CurrencyCode,
    ledger::{
        CashKind, CashRecord, DateWindow, ExchangeKind, ExchangeRecord, InstrumentBook,
        MemoRecord, TradeKind, TradeRecord,
    },
    storage::{LedgerStore, MemoryLedgerStore},
    LedgerError,
};
use rust_decimal::Decimal;
use tokio::sync::Notify;

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
}

pub fn krw() -> CurrencyCode {
    CurrencyCode::new("KRW")
}

pub fn usd() -> CurrencyCode {
    CurrencyCode::new("USD")
}

pub fn cash(kind: CashKind, on: NaiveDate, amount: i64, currency: CurrencyCode) -> CashRecord {
    CashRecord::new(kind, on, Decimal::from(amount), currency)
}

pub fn instruments() -> InstrumentBook {
    InstrumentBook::new()
        .with("005930", krw())
        .with("AAPL", usd())
}

/// Memory-backed store whose queries can be made to fail, or held until released.
#[derive(Default)]
pub struct ScriptedStore {
    pub ledger: MemoryLedgerStore,
    failing: AtomicBool,
    held_window: Mutex<Option<DateWindow>>,
    release: Notify,
    pub cash_queries: AtomicUsize,
}

impl ScriptedStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Cash queries for `window` wait until [`ScriptedStore::release`] is called.
    pub fn hold(&self, window: DateWindow) {
        *self.held_window.lock().unwrap() = Some(window);
    }

    pub fn release(&self) {
        *self.held_window.lock().unwrap() = None;
        self.release.notify_one();
    }

    fn check(&self) -> Result<(), LedgerError> {
        if self.failing.load(Ordering::SeqCst) {
            Err(LedgerError::Unavailable("scripted failure".into()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LedgerStore for ScriptedStore {
    async fn cash_records(
        &self,
        window: DateWindow,
        kinds: &[CashKind],
    ) -> Result<Vec<CashRecord>, LedgerError> {
        self.cash_queries.fetch_add(1, Ordering::SeqCst);
        let held = *self.held_window.lock().unwrap() == Some(window);
        if held {
            self.release.notified().await;
        }
        self.check()?;
        self.ledger.cash_records(window, kinds).await
    }

    async fn trade_records(
        &self,
        window: DateWindow,
        kinds: &[TradeKind],
    ) -> Result<Vec<TradeRecord>, LedgerError> {
        self.check()?;
        self.ledger.trade_records(window, kinds).await
    }

    async fn exchange_records(
        &self,
        window: DateWindow,
        kinds: &[ExchangeKind],
    ) -> Result<Vec<ExchangeRecord>, LedgerError> {
        self.check()?;
        self.ledger.exchange_records(window, kinds).await
    }

    async fn memo_records(&self, window: DateWindow) -> Result<Vec<MemoRecord>, LedgerError> {
        self.check()?;
        self.ledger.memo_records(window).await
    }
}

pub fn controller(store: Arc<ScriptedStore>) -> CalendarController<Arc<ScriptedStore>> {
    CalendarController::new(store, Arc::new(instruments()))
}
