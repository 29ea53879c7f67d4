use std::fmt;

use chrono::{Datelike, Duration, Months, NaiveDate};
use serde::{Deserialize, Serialize};

/// Inclusive day range queried from the ledger store for one calendar month.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct DateWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateWindow {
    /// First through last day of the month containing `reference`.
    pub fn month_of(reference: NaiveDate) -> Self {
        let start = reference - Duration::days(reference.day0() as i64);
        let end = start
            .checked_add_months(Months::new(1))
            .map(|next| next - Duration::days(1))
            .unwrap_or(NaiveDate::MAX);
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    pub fn year(&self) -> i32 {
        self.start.year()
    }

    pub fn month(&self) -> u32 {
        self.start.month()
    }

    pub fn previous_month(&self) -> Self {
        Self::month_of(shift_month(self.start, -1))
    }

    pub fn next_month(&self) -> Self {
        Self::month_of(shift_month(self.start, 1))
    }

    pub fn day_count(&self) -> u32 {
        ((self.end - self.start).num_days() + 1) as u32
    }

    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        self.start.iter_days().take(self.day_count() as usize)
    }

    /// Clamps `date` into the window.
    pub fn clamp(&self, date: NaiveDate) -> NaiveDate {
        date.clamp(self.start, self.end)
    }
}

impl fmt::Display for DateWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year(), self.month())
    }
}

/// Resolves the query range for the month displayed around `reference`.
pub fn resolve(reference: NaiveDate) -> DateWindow {
    DateWindow::month_of(reference)
}

/// Moves `date` by whole months, pinning the day to the target month's length.
pub fn shift_month(date: NaiveDate, months: i32) -> NaiveDate {
    let shifted = if months >= 0 {
        date.checked_add_months(Months::new(months as u32))
    } else {
        date.checked_sub_months(Months::new(months.unsigned_abs()))
    };
    shifted.unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn resolves_month_boundaries() {
        let window = resolve(date(2024, 2, 17));
        assert_eq!(window.start, date(2024, 2, 1));
        assert_eq!(window.end, date(2024, 2, 29));
        assert_eq!(window.day_count(), 29);

        let window = resolve(date(2023, 12, 31));
        assert_eq!(window.start, date(2023, 12, 1));
        assert_eq!(window.end, date(2023, 12, 31));
    }

    #[test]
    fn navigation_crosses_year_boundaries() {
        let january = resolve(date(2024, 1, 10));
        assert_eq!(january.previous_month(), resolve(date(2023, 12, 1)));
        assert_eq!(resolve(date(2024, 12, 5)).next_month(), resolve(date(2025, 1, 1)));
    }

    #[test]
    fn shift_month_pins_day_to_month_end() {
        assert_eq!(shift_month(date(2024, 1, 31), 1), date(2024, 2, 29));
        assert_eq!(shift_month(date(2024, 3, 31), -1), date(2024, 2, 29));
    }

    #[test]
    fn window_contains_both_ends() {
        let window = resolve(date(2024, 4, 1));
        assert!(window.contains(date(2024, 4, 1)));
        assert!(window.contains(date(2024, 4, 30)));
        assert!(!window.contains(date(2024, 5, 1)));
        assert_eq!(window.days().count(), 30);
        assert_eq!(window.to_string(), "2024-04");
    }
}
