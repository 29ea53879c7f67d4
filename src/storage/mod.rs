pub mod json_backend;
pub mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    errors::LedgerError,
    ledger::{
        CashKind, CashRecord, DateWindow, ExchangeKind, ExchangeRecord, InstrumentBook,
        MemoRecord, TradeKind, TradeRecord,
    },
};

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Range queries the calendar issues against the household ledger.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    async fn cash_records(
        &self,
        window: DateWindow,
        kinds: &[CashKind],
    ) -> Result<Vec<CashRecord>>;
    async fn trade_records(
        &self,
        window: DateWindow,
        kinds: &[TradeKind],
    ) -> Result<Vec<TradeRecord>>;
    async fn exchange_records(
        &self,
        window: DateWindow,
        kinds: &[ExchangeKind],
    ) -> Result<Vec<ExchangeRecord>>;
    async fn memo_records(&self, window: DateWindow) -> Result<Vec<MemoRecord>>;
}

#[async_trait]
impl<T: LedgerStore + ?Sized> LedgerStore for Arc<T> {
    async fn cash_records(
        &self,
        window: DateWindow,
        kinds: &[CashKind],
    ) -> Result<Vec<CashRecord>> {
        (**self).cash_records(window, kinds).await
    }

    async fn trade_records(
        &self,
        window: DateWindow,
        kinds: &[TradeKind],
    ) -> Result<Vec<TradeRecord>> {
        (**self).trade_records(window, kinds).await
    }

    async fn exchange_records(
        &self,
        window: DateWindow,
        kinds: &[ExchangeKind],
    ) -> Result<Vec<ExchangeRecord>> {
        (**self).exchange_records(window, kinds).await
    }

    async fn memo_records(&self, window: DateWindow) -> Result<Vec<MemoRecord>> {
        (**self).memo_records(window).await
    }
}

/// Serialized form of a whole household ledger.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LedgerSnapshot {
    #[serde(default)]
    pub cash: Vec<CashRecord>,
    #[serde(default)]
    pub trades: Vec<TradeRecord>,
    #[serde(default)]
    pub exchanges: Vec<ExchangeRecord>,
    #[serde(default)]
    pub memos: Vec<MemoRecord>,
    #[serde(default)]
    pub instruments: InstrumentBook,
}

impl LedgerSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cash_in(&self, window: DateWindow, kinds: &[CashKind]) -> Vec<CashRecord> {
        self.cash
            .iter()
            .filter(|record| window.contains(record.date) && kinds.contains(&record.kind))
            .cloned()
            .collect()
    }

    pub fn trades_in(&self, window: DateWindow, kinds: &[TradeKind]) -> Vec<TradeRecord> {
        self.trades
            .iter()
            .filter(|record| window.contains(record.date) && kinds.contains(&record.kind))
            .cloned()
            .collect()
    }

    pub fn exchanges_in(&self, window: DateWindow, kinds: &[ExchangeKind]) -> Vec<ExchangeRecord> {
        self.exchanges
            .iter()
            .filter(|record| window.contains(record.date) && kinds.contains(&record.kind))
            .cloned()
            .collect()
    }

    pub fn memos_in(&self, window: DateWindow) -> Vec<MemoRecord> {
        self.memos
            .iter()
            .filter(|record| window.contains(record.date))
            .cloned()
            .collect()
    }

    pub fn record_count(&self) -> usize {
        self.cash.len() + self.trades.len() + self.exchanges.len() + self.memos.len()
    }
}

pub use json_backend::JsonLedgerStore;
pub use memory::MemoryLedgerStore;
