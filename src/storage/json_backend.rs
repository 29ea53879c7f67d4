use std::path::{Path, PathBuf};
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;
use tokio::{fs, io::AsyncWriteExt};

use super::{LedgerSnapshot, LedgerStore, Result};
use crate::currency::CurrencyCode;
use crate::ledger::{
    CashKind, CashRecord, DateWindow, ExchangeKind, ExchangeRecord, InstrumentBook,
    InstrumentRef, InstrumentRegistry, MemoRecord, TradeKind, TradeRecord,
};

const TMP_SUFFIX: &str = "tmp";

/// Ledger store backed by a single JSON snapshot file. Every query re-reads the file so
/// edits made by another process show up on the next refresh.
///
/// The store doubles as the instrument registry: it answers from the instrument book of
/// the snapshot it read last. Clones share that book.
#[derive(Debug, Clone)]
pub struct JsonLedgerStore {
    path: PathBuf,
    instruments: Arc<RwLock<InstrumentBook>>,
}

impl JsonLedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            instruments: Arc::default(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn load(&self) -> Result<LedgerSnapshot> {
        let data = fs::read_to_string(&self.path).await?;
        let snapshot: LedgerSnapshot = serde_json::from_str(&data)?;
        *self
            .instruments
            .write()
            .unwrap_or_else(PoisonError::into_inner) = snapshot.instruments.clone();
        Ok(snapshot)
    }

    pub async fn save(&self, snapshot: &LedgerSnapshot) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }
        let json = serde_json::to_string_pretty(snapshot)?;
        let tmp = tmp_path(&self.path);
        write_atomic(&tmp, &json).await?;
        fs::rename(&tmp, &self.path).await?;
        tracing::debug!(path = %self.path.display(), records = snapshot.record_count(), "saved ledger snapshot");
        Ok(())
    }
}

#[async_trait]
impl LedgerStore for JsonLedgerStore {
    async fn cash_records(
        &self,
        window: DateWindow,
        kinds: &[CashKind],
    ) -> Result<Vec<CashRecord>> {
        Ok(self.load().await?.cash_in(window, kinds))
    }

    async fn trade_records(
        &self,
        window: DateWindow,
        kinds: &[TradeKind],
    ) -> Result<Vec<TradeRecord>> {
        Ok(self.load().await?.trades_in(window, kinds))
    }

    async fn exchange_records(
        &self,
        window: DateWindow,
        kinds: &[ExchangeKind],
    ) -> Result<Vec<ExchangeRecord>> {
        Ok(self.load().await?.exchanges_in(window, kinds))
    }

    async fn memo_records(&self, window: DateWindow) -> Result<Vec<MemoRecord>> {
        Ok(self.load().await?.memos_in(window))
    }
}

impl InstrumentRegistry for JsonLedgerStore {
    fn currency_of(&self, instrument: &InstrumentRef) -> Option<CurrencyCode> {
        self.instruments
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .currency_of(instrument)
    }
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

async fn write_atomic(path: &Path, data: &str) -> Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(data.as_bytes()).await?;
    file.flush().await?;
    file.sync_all().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tmp_path_keeps_original_extension() {
        assert_eq!(
            tmp_path(Path::new("/data/ledger.json")),
            PathBuf::from("/data/ledger.json.tmp")
        );
        assert_eq!(tmp_path(Path::new("ledger")), PathBuf::from("ledger.tmp"));
    }
}
