use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use uuid::Uuid;

use super::{LedgerSnapshot, LedgerStore, Result};
use crate::ledger::{
    CashKind, CashRecord, DateWindow, ExchangeKind, ExchangeRecord, InstrumentBook, MemoRecord,
    TradeKind, TradeRecord,
};

/// In-process ledger used by the shell when no file is given, and by tests.
#[derive(Debug, Default)]
pub struct MemoryLedgerStore {
    snapshot: RwLock<LedgerSnapshot>,
}

impl MemoryLedgerStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_snapshot(snapshot: LedgerSnapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, LedgerSnapshot> {
        self.snapshot.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, LedgerSnapshot> {
        self.snapshot.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> LedgerSnapshot {
        self.read().clone()
    }

    pub fn instruments(&self) -> InstrumentBook {
        self.read().instruments.clone()
    }

    pub fn add_cash(&self, record: CashRecord) -> Uuid {
        let id = record.id;
        self.write().cash.push(record);
        id
    }

    pub fn add_trade(&self, record: TradeRecord) -> Uuid {
        let id = record.id;
        self.write().trades.push(record);
        id
    }

    pub fn add_exchange(&self, record: ExchangeRecord) -> Uuid {
        let id = record.id;
        self.write().exchanges.push(record);
        id
    }

    pub fn add_memo(&self, record: MemoRecord) -> Uuid {
        let id = record.id;
        self.write().memos.push(record);
        id
    }

    /// Applies `edit` to the cash record with `id`. Returns `false` when no such record exists.
    pub fn update_cash(&self, id: Uuid, edit: impl FnOnce(&mut CashRecord)) -> bool {
        let mut snapshot = self.write();
        match snapshot.cash.iter_mut().find(|record| record.id == id) {
            Some(record) => {
                edit(record);
                true
            }
            None => false,
        }
    }

    /// Removes the record with `id` from whichever family holds it.
    pub fn remove(&self, id: Uuid) -> bool {
        let mut snapshot = self.write();
        let before = snapshot.record_count();
        snapshot.cash.retain(|record| record.id != id);
        snapshot.trades.retain(|record| record.id != id);
        snapshot.exchanges.retain(|record| record.id != id);
        snapshot.memos.retain(|record| record.id != id);
        snapshot.record_count() != before
    }
}

#[async_trait]
impl LedgerStore for MemoryLedgerStore {
    async fn cash_records(
        &self,
        window: DateWindow,
        kinds: &[CashKind],
    ) -> Result<Vec<CashRecord>> {
        Ok(self.read().cash_in(window, kinds))
    }

    async fn trade_records(
        &self,
        window: DateWindow,
        kinds: &[TradeKind],
    ) -> Result<Vec<TradeRecord>> {
        Ok(self.read().trades_in(window, kinds))
    }

    async fn exchange_records(
        &self,
        window: DateWindow,
        kinds: &[ExchangeKind],
    ) -> Result<Vec<ExchangeRecord>> {
        Ok(self.read().exchanges_in(window, kinds))
    }

    async fn memo_records(&self, window: DateWindow) -> Result<Vec<MemoRecord>> {
        Ok(self.read().memos_in(window))
    }
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;
    use rust_decimal::Decimal;

    use super::*;
    use crate::currency::CurrencyCode;

    #[tokio::test]
    async fn mutations_are_visible_to_queries() {
        let store = MemoryLedgerStore::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();
        let window = DateWindow::month_of(date);
        let id = store.add_cash(CashRecord::new(
            CashKind::Spending,
            date,
            Decimal::from(3000),
            CurrencyCode::new("KRW"),
        ));

        assert!(store.update_cash(id, |record| record.amount = Decimal::from(4000)));
        let cash = store.cash_records(window, &CashKind::ALL).await.unwrap();
        assert_eq!(cash[0].amount, Decimal::from(4000));

        assert!(store.remove(id));
        assert!(!store.remove(id));
        assert!(store.cash_records(window, &CashKind::ALL).await.unwrap().is_empty());
    }
}
