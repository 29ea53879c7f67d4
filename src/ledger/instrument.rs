use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::currency::CurrencyCode;

/// Reference to a tradable instrument, typically a ticker such as `005930` or `AAPL`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct InstrumentRef(pub String);

impl InstrumentRef {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self(symbol.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstrumentRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for InstrumentRef {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Resolves instruments to the currency they trade in.
pub trait InstrumentRegistry: Send + Sync {
    fn currency_of(&self, instrument: &InstrumentRef) -> Option<CurrencyCode>;
}

/// Static instrument → currency map, persisted alongside ledger snapshots.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct InstrumentBook {
    #[serde(default)]
    instruments: BTreeMap<InstrumentRef, CurrencyCode>,
}

impl InstrumentBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, instrument: impl Into<InstrumentRef>, currency: CurrencyCode) -> Self {
        self.register(instrument, currency);
        self
    }

    pub fn register(&mut self, instrument: impl Into<InstrumentRef>, currency: CurrencyCode) {
        self.instruments.insert(instrument.into(), currency);
    }

    pub fn len(&self) -> usize {
        self.instruments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instruments.is_empty()
    }
}

impl InstrumentRegistry for InstrumentBook {
    fn currency_of(&self, instrument: &InstrumentRef) -> Option<CurrencyCode> {
        self.instruments.get(instrument).cloned()
    }
}

impl<T: InstrumentRegistry + ?Sized> InstrumentRegistry for std::sync::Arc<T> {
    fn currency_of(&self, instrument: &InstrumentRef) -> Option<CurrencyCode> {
        (**self).currency_of(instrument)
    }
}
