use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::lunar::{self, LunarDate, LunarError};

/// Where an anniversary's solar date came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnniversaryOrigin {
    Fixed,
    Lunar(LunarDate),
}

/// A holiday or observance marker for one calendar day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnniversaryEntry {
    pub date: NaiveDate,
    pub name: String,
    /// Styling hint only; never affects aggregation.
    pub holiday: bool,
    pub origin: AnniversaryOrigin,
}

/// Observance on the same solar month/day every year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct FixedAnniversary {
    pub month: u32,
    pub day: u32,
    pub name: String,
    #[serde(default)]
    pub holiday: bool,
}

impl FixedAnniversary {
    pub fn new(month: u32, day: u32, name: impl Into<String>, holiday: bool) -> Self {
        Self {
            month,
            day,
            name: name.into(),
            holiday,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LunarDay {
    Day(u32),
    /// Last day of the month, whether it has 29 or 30 days.
    Last,
}

/// Observance fixed in the lunar calendar. `year_offset` of -1 selects the previous
/// lunar year, for dates such as lunar new year's eve that land early in the solar year.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LunarAnniversary {
    pub year_offset: i32,
    pub month: u32,
    pub day: LunarDay,
    pub name: String,
    pub holiday: bool,
}

const FIXED_TABLE: [(u32, u32, &str, bool); 9] = [
    (1, 1, "New Year", true),
    (3, 1, "Independence Movement Day", true),
    (5, 5, "Children's Day", true),
    (5, 8, "Parents' Day", false),
    (6, 6, "Memorial Day", true),
    (8, 15, "Liberation Day", true),
    (10, 3, "National Foundation Day", true),
    (10, 9, "Hangul Day", true),
    (12, 25, "Christmas", true),
];

const LUNAR_TABLE: [(i32, u32, LunarDay, &str, bool); 9] = [
    (-1, 12, LunarDay::Last, "Seollal Eve", true),
    (0, 1, LunarDay::Day(1), "Seollal", true),
    (0, 1, LunarDay::Day(2), "Seollal Holiday", true),
    (0, 1, LunarDay::Day(15), "Daeboreum", false),
    (0, 4, LunarDay::Day(8), "Buddha's Birthday", true),
    (0, 5, LunarDay::Day(5), "Dano", false),
    (0, 8, LunarDay::Day(14), "Chuseok Eve", true),
    (0, 8, LunarDay::Day(15), "Chuseok", true),
    (0, 8, LunarDay::Day(16), "Chuseok Holiday", true),
];

/// Produces the anniversary overlay for a solar year.
#[derive(Debug, Clone)]
pub struct AnniversaryCalculator {
    fixed: Vec<FixedAnniversary>,
    lunar: Vec<LunarAnniversary>,
}

impl Default for AnniversaryCalculator {
    fn default() -> Self {
        Self::korean()
    }
}

impl AnniversaryCalculator {
    pub fn new(fixed: Vec<FixedAnniversary>, lunar: Vec<LunarAnniversary>) -> Self {
        Self { fixed, lunar }
    }

    /// Korean public holidays and common observances.
    pub fn korean() -> Self {
        let fixed = FIXED_TABLE
            .iter()
            .map(|&(month, day, name, holiday)| FixedAnniversary::new(month, day, name, holiday))
            .collect();
        let lunar = LUNAR_TABLE
            .iter()
            .map(|&(year_offset, month, day, name, holiday)| LunarAnniversary {
                year_offset,
                month,
                day,
                name: name.to_string(),
                holiday,
            })
            .collect();
        Self { fixed, lunar }
    }

    pub fn with_fixed(mut self, extra: impl IntoIterator<Item = FixedAnniversary>) -> Self {
        self.fixed.extend(extra);
        self
    }

    pub fn without_lunar(mut self) -> Self {
        self.lunar.clear();
        self
    }

    pub fn for_year(&self, year: i32) -> Vec<AnniversaryEntry> {
        let mut seen: HashSet<(NaiveDate, String)> = HashSet::new();
        let mut entries = Vec::with_capacity(self.fixed.len() + self.lunar.len());
        let mut push = |entry: AnniversaryEntry| {
            if seen.insert((entry.date, entry.name.clone())) {
                entries.push(entry);
            }
        };

        for fixed in &self.fixed {
            match NaiveDate::from_ymd_opt(year, fixed.month, fixed.day) {
                Some(date) => push(AnniversaryEntry {
                    date,
                    name: fixed.name.clone(),
                    holiday: fixed.holiday,
                    origin: AnniversaryOrigin::Fixed,
                }),
                None => tracing::debug!(
                    year,
                    name = %fixed.name,
                    "skipping fixed anniversary with no such day"
                ),
            }
        }

        for entry in &self.lunar {
            match resolve_lunar(year, entry) {
                Ok((lunar, date)) if date.year() == year => push(AnniversaryEntry {
                    date,
                    name: entry.name.clone(),
                    holiday: entry.holiday,
                    origin: AnniversaryOrigin::Lunar(lunar),
                }),
                Ok((_, date)) => tracing::debug!(
                    year,
                    %date,
                    name = %entry.name,
                    "lunar anniversary falls outside the solar year"
                ),
                Err(err) => tracing::debug!(
                    year,
                    name = %entry.name,
                    "skipping lunar anniversary: {err}"
                ),
            }
        }

        entries
    }
}

fn resolve_lunar(
    year: i32,
    entry: &LunarAnniversary,
) -> Result<(LunarDate, NaiveDate), LunarError> {
    let lunar_year = year + entry.year_offset;
    let day = match entry.day {
        LunarDay::Day(day) => day,
        LunarDay::Last => lunar::month_length(lunar_year, entry.month)?,
    };
    let lunar = LunarDate::new(lunar_year, entry.month, day);
    Ok((lunar, lunar::lunar_to_solar(lunar)?))
}

/// Per-year memo of computed overlays, owned by a calendar controller.
#[derive(Debug)]
pub struct AnniversaryCache {
    calculator: AnniversaryCalculator,
    years: BTreeMap<i32, Arc<[AnniversaryEntry]>>,
    current_year: Option<i32>,
    computations: usize,
}

impl AnniversaryCache {
    pub fn new(calculator: AnniversaryCalculator) -> Self {
        Self {
            calculator,
            years: BTreeMap::new(),
            current_year: None,
            computations: 0,
        }
    }

    /// Makes `year` the current overlay, computing it only the first time it is seen.
    /// Returns `true` when the current year changed.
    pub fn switch_to(&mut self, year: i32) -> bool {
        if self.current_year == Some(year) {
            return false;
        }
        if !self.years.contains_key(&year) {
            let entries = self.calculator.for_year(year);
            tracing::debug!(year, entries = entries.len(), "computed anniversaries");
            self.years.insert(year, entries.into());
            self.computations += 1;
        }
        self.current_year = Some(year);
        true
    }

    pub fn current(&self) -> Arc<[AnniversaryEntry]> {
        self.current_year
            .and_then(|year| self.years.get(&year).cloned())
            .unwrap_or_else(|| Arc::from(Vec::new()))
    }

    pub fn current_year(&self) -> Option<i32> {
        self.current_year
    }

    /// How many whole-year computations have run so far.
    pub fn computations(&self) -> usize {
        self.computations
    }
}
