use std::fmt;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

/// ISO 4217 currency representation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(from = "String")]
pub struct CurrencyCode(pub String);

impl CurrencyCode {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of fractional digits shown for this currency.
    pub fn minor_digits(&self) -> u32 {
        match self.as_str() {
            "KRW" | "JPY" | "VND" | "CLP" | "ISK" => 0,
            _ => 2,
        }
    }

    pub fn symbol(&self) -> Option<&'static str> {
        match self.as_str() {
            "KRW" => Some("₩"),
            "USD" => Some("$"),
            "JPY" => Some("¥"),
            "EUR" => Some("€"),
            "GBP" => Some("£"),
            "CNY" => Some("元"),
            _ => None,
        }
    }
}

impl Default for CurrencyCode {
    fn default() -> Self {
        Self::new("KRW")
    }
}

impl fmt::Display for CurrencyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for CurrencyCode {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

impl From<&str> for CurrencyCode {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Ordered set of currencies the ledger accepts. The position of a code is its
/// display precedence when events on the same day and kind are sorted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrencyRegistry {
    local: CurrencyCode,
    order: Vec<CurrencyCode>,
}

impl CurrencyRegistry {
    /// Builds a registry. The local currency is registered even when `order` omits it,
    /// in which case it takes precedence over everything else.
    pub fn new(local: CurrencyCode, order: impl IntoIterator<Item = CurrencyCode>) -> Self {
        let mut codes: Vec<CurrencyCode> = Vec::new();
        for code in order {
            if !codes.contains(&code) {
                codes.push(code);
            }
        }
        if !codes.contains(&local) {
            codes.insert(0, local.clone());
        }
        Self {
            local,
            order: codes,
        }
    }

    pub fn local(&self) -> &CurrencyCode {
        &self.local
    }

    pub fn precedence(&self, code: &CurrencyCode) -> Option<usize> {
        self.order.iter().position(|candidate| candidate == code)
    }

    pub fn contains(&self, code: &CurrencyCode) -> bool {
        self.precedence(code).is_some()
    }

    pub fn codes(&self) -> &[CurrencyCode] {
        &self.order
    }
}

impl Default for CurrencyRegistry {
    fn default() -> Self {
        Self::new(
            CurrencyCode::new("KRW"),
            ["KRW", "USD", "JPY", "EUR", "CNY"].map(CurrencyCode::new),
        )
    }
}

/// Formats an amount with thousands grouping and the currency's minor digits,
/// e.g. `₩10,000` or `$1,234.50`.
pub fn format_amount(amount: Decimal, code: &CurrencyCode) -> String {
    let digits = code.minor_digits();
    let rounded = amount.round_dp_with_strategy(digits, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let text = format!("{:.*}", digits as usize, rounded.abs());
    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, Some(fraction)),
        None => (text.as_str(), None),
    };

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (idx, ch) in whole.chars().enumerate() {
        if idx > 0 && (whole.len() - idx) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(fraction) = fraction {
        grouped.push('.');
        grouped.push_str(fraction);
    }

    let sign = if negative { "-" } else { "" };
    match code.symbol() {
        Some(symbol) => format!("{sign}{symbol}{grouped}"),
        None => format!("{sign}{grouped} {code}"),
    }
}
