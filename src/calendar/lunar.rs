//! Table-driven lunisolar calendar conversion.
//!
//! Each year entry packs the month lengths of one lunar year:
//! bits 15..4 flag months 1..12 as 30 days long (29 otherwise), bits 3..0 hold the leap
//! month number (0 when the year has none) and bit 16 flags the leap month as 30 days long.
//! Lunar 1900-01-01 falls on solar 1900-01-31.
//!
//! Month starts follow Korean standard time, so some years differ from the Chinese
//! calendar by a day or by the placement of the leap month.

use std::fmt;

use chrono::{Duration, NaiveDate};
use thiserror::Error;

pub const FIRST_YEAR: i32 = 1900;
pub const LAST_YEAR: i32 = 2049;

const YEAR_TABLE: [u32; 150] = [
    0x04bd8, 0x04ae0, 0x0a570, 0x05565, 0x0d2a0, 0x0e950, 0x16554, 0x056a0, 0x0aad0, 0x055d2, // 1900
    0x04ae0, 0x0a5d6, 0x0a4d0, 0x0d250, 0x0da95, 0x0b550, 0x056a0, 0x0ada2, 0x095d0, 0x04bb7, // 1910
    0x049b0, 0x0a4b0, 0x0b4b5, 0x06a90, 0x0ad40, 0x0bb54, 0x02b60, 0x095b0, 0x05372, 0x04970, // 1920
    0x06566, 0x0e4a0, 0x0ea50, 0x16a95, 0x05b50, 0x02b60, 0x18ae3, 0x092e0, 0x1c8d7, 0x0c950, // 1930
    0x0d4a0, 0x1d8a6, 0x0b690, 0x056d0, 0x125b4, 0x025d0, 0x092d0, 0x0d2b2, 0x0a950, 0x0d557, // 1940
    0x0b4a0, 0x0b550, 0x15555, 0x04db0, 0x025b0, 0x18573, 0x052b0, 0x0a9b8, 0x06950, 0x06aa0, // 1950
    0x0aea6, 0x0ab50, 0x04b60, 0x0aae4, 0x0a570, 0x05270, 0x07263, 0x0d950, 0x06b57, 0x056a0, // 1960
    0x09ad0, 0x04dd5, 0x04ae0, 0x0a4e0, 0x0d4d4, 0x0d250, 0x0d598, 0x0b540, 0x0d6a0, 0x195a6, // 1970
    0x095b0, 0x049b0, 0x0a9b4, 0x0a4b0, 0x0b27a, 0x06a50, 0x06d40, 0x0b756, 0x02b60, 0x095b0, // 1980
    0x04b75, 0x04970, 0x064b0, 0x074a3, 0x0ea50, 0x06d98, 0x05ad0, 0x02b60, 0x096e5, 0x092e0, // 1990
    0x0c960, 0x0e954, 0x0d4a0, 0x0da50, 0x07552, 0x056c0, 0x0abb7, 0x025d0, 0x092d0, 0x0cab5, // 2000
    0x0a950, 0x0b4a0, 0x1b4a3, 0x0b550, 0x055d9, 0x04ba0, 0x0a5b0, 0x05575, 0x052b0, 0x0a950, // 2010
    0x0b954, 0x06aa0, 0x0ad50, 0x06b52, 0x04b60, 0x0a6e6, 0x0a570, 0x05270, 0x06a65, 0x0d930, // 2020
    0x05aa0, 0x0b6a3, 0x096d0, 0x04afb, 0x04ae0, 0x0a4d0, 0x1d0d6, 0x0d250, 0x0d520, 0x0dd45, // 2030
    0x0b6a0, 0x096d0, 0x055b2, 0x049b0, 0x0a577, 0x0a4b0, 0x0b250, 0x1b255, 0x06d40, 0x0ada0, // 2040
];

fn epoch() -> NaiveDate {
    NaiveDate::from_ymd_opt(1900, 1, 31).unwrap_or(NaiveDate::MIN)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum LunarError {
    #[error("lunar year {0} is outside the supported range 1900-2049")]
    YearOutOfRange(i32),
    #[error("lunar month {0} does not exist")]
    InvalidMonth(u32),
    #[error("lunar year {year} has no leap month {month}")]
    NoLeapMonth { year: i32, month: u32 },
    #[error("lunar month {month} of {year} has no day {day}")]
    InvalidDay { year: i32, month: u32, day: u32 },
    #[error("solar date {0} is outside the supported lunar range")]
    DateOutOfRange(NaiveDate),
}

/// A date in the lunar calendar. `leap` marks the intercalary repeat of `month`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LunarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
    pub leap: bool,
}

impl LunarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            leap: false,
        }
    }

    pub fn leap(year: i32, month: u32, day: u32) -> Self {
        Self {
            year,
            month,
            day,
            leap: true,
        }
    }
}

impl fmt::Display for LunarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let marker = if self.leap { " (leap)" } else { "" };
        write!(f, "{:04}-{:02}-{:02}{}", self.year, self.month, self.day, marker)
    }
}

fn year_info(year: i32) -> Result<u32, LunarError> {
    if !(FIRST_YEAR..=LAST_YEAR).contains(&year) {
        return Err(LunarError::YearOutOfRange(year));
    }
    Ok(YEAR_TABLE[(year - FIRST_YEAR) as usize])
}

/// Leap month of `year`, if it has one.
pub fn leap_month(year: i32) -> Result<Option<u32>, LunarError> {
    let month = year_info(year)? & 0xf;
    Ok((month != 0).then_some(month))
}

/// Length of a regular (non-leap) month.
pub fn month_length(year: i32, month: u32) -> Result<u32, LunarError> {
    if !(1..=12).contains(&month) {
        return Err(LunarError::InvalidMonth(month));
    }
    let info = year_info(year)?;
    Ok(if info & (0x10000 >> month) != 0 { 30 } else { 29 })
}

fn leap_month_length(year: i32) -> Result<u32, LunarError> {
    let info = year_info(year)?;
    Ok(match info & 0xf {
        0 => 0,
        _ if info & 0x10000 != 0 => 30,
        _ => 29,
    })
}

fn year_length(year: i32) -> Result<u32, LunarError> {
    let mut days = leap_month_length(year)?;
    for month in 1..=12 {
        days += month_length(year, month)?;
    }
    Ok(days)
}

/// Months of `year` in calendar order as (month, is_leap, length).
fn months_of(year: i32) -> Result<Vec<(u32, bool, u32)>, LunarError> {
    let leap = leap_month(year)?;
    let mut months = Vec::with_capacity(13);
    for month in 1..=12 {
        months.push((month, false, month_length(year, month)?));
        if leap == Some(month) {
            months.push((month, true, leap_month_length(year)?));
        }
    }
    Ok(months)
}

/// Length of the given month, honouring the leap flag.
pub fn length_of(year: i32, month: u32, leap: bool) -> Result<u32, LunarError> {
    if !leap {
        return month_length(year, month);
    }
    if leap_month(year)? != Some(month) {
        return Err(LunarError::NoLeapMonth { year, month });
    }
    leap_month_length(year)
}

pub fn lunar_to_solar(date: LunarDate) -> Result<NaiveDate, LunarError> {
    let length = length_of(date.year, date.month, date.leap)?;
    if date.day == 0 || date.day > length {
        return Err(LunarError::InvalidDay {
            year: date.year,
            month: date.month,
            day: date.day,
        });
    }

    let mut offset: i64 = 0;
    for year in FIRST_YEAR..date.year {
        offset += year_length(year)? as i64;
    }
    for (month, leap, days) in months_of(date.year)? {
        if month == date.month && leap == date.leap {
            break;
        }
        offset += days as i64;
    }
    offset += (date.day - 1) as i64;

    Ok(epoch() + Duration::days(offset))
}

pub fn solar_to_lunar(date: NaiveDate) -> Result<LunarDate, LunarError> {
    let mut offset = (date - epoch()).num_days();
    if offset < 0 {
        return Err(LunarError::DateOutOfRange(date));
    }

    for year in FIRST_YEAR..=LAST_YEAR {
        let days = year_length(year)? as i64;
        if offset >= days {
            offset -= days;
            continue;
        }
        for (month, leap, length) in months_of(year)? {
            let length = length as i64;
            if offset < length {
                return Ok(LunarDate {
                    year,
                    month,
                    day: offset as u32 + 1,
                    leap,
                });
            }
            offset -= length;
        }
    }
    Err(LunarError::DateOutOfRange(date))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solar(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn converts_known_new_years() {
        assert_eq!(lunar_to_solar(LunarDate::new(1900, 1, 1)), Ok(solar(1900, 1, 31)));
        assert_eq!(lunar_to_solar(LunarDate::new(2000, 1, 1)), Ok(solar(2000, 2, 5)));
        assert_eq!(lunar_to_solar(LunarDate::new(2023, 1, 1)), Ok(solar(2023, 1, 22)));
        assert_eq!(lunar_to_solar(LunarDate::new(2024, 1, 1)), Ok(solar(2024, 2, 10)));
        assert_eq!(lunar_to_solar(LunarDate::new(2025, 1, 1)), Ok(solar(2025, 1, 29)));
        assert_eq!(lunar_to_solar(LunarDate::new(2026, 1, 1)), Ok(solar(2026, 2, 17)));
    }

    #[test]
    fn handles_leap_months() {
        assert_eq!(leap_month(2023), Ok(Some(2)));
        assert_eq!(leap_month(2024), Ok(None));
        assert_eq!(lunar_to_solar(LunarDate::leap(2023, 2, 1)), Ok(solar(2023, 3, 22)));
        assert_eq!(lunar_to_solar(LunarDate::leap(2025, 6, 1)), Ok(solar(2025, 7, 25)));
        assert_eq!(
            lunar_to_solar(LunarDate::leap(2024, 2, 1)),
            Err(LunarError::NoLeapMonth {
                year: 2024,
                month: 2
            })
        );
    }

    #[test]
    fn follows_korean_month_starts() {
        assert_eq!(leap_month(2012), Ok(Some(3)));
        assert_eq!(leap_month(2017), Ok(Some(5)));
        assert_eq!(lunar_to_solar(LunarDate::new(2023, 4, 8)), Ok(solar(2023, 5, 27)));
        assert_eq!(lunar_to_solar(LunarDate::new(2027, 1, 1)), Ok(solar(2027, 2, 7)));
        assert_eq!(lunar_to_solar(LunarDate::new(2028, 1, 1)), Ok(solar(2028, 1, 27)));
    }

    #[test]
    fn rejects_days_past_month_end() {
        assert_eq!(month_length(2024, 1), Ok(29));
        assert_eq!(
            lunar_to_solar(LunarDate::new(2024, 1, 30)),
            Err(LunarError::InvalidDay {
                year: 2024,
                month: 1,
                day: 30
            })
        );
        assert_eq!(
            lunar_to_solar(LunarDate::new(1899, 12, 1)),
            Err(LunarError::YearOutOfRange(1899))
        );
    }

    #[test]
    fn reverse_conversion_handles_leap_and_bounds() {
        assert_eq!(solar_to_lunar(solar(2023, 3, 22)), Ok(LunarDate::leap(2023, 2, 1)));
        assert_eq!(solar_to_lunar(solar(2024, 2, 9)), Ok(LunarDate::new(2023, 12, 30)));
        assert_eq!(solar_to_lunar(solar(2024, 9, 17)), Ok(LunarDate::new(2024, 8, 15)));
        assert_eq!(
            solar_to_lunar(solar(1900, 1, 30)),
            Err(LunarError::DateOutOfRange(solar(1900, 1, 30)))
        );
        assert!(solar_to_lunar(solar(2051, 1, 1)).is_err());
    }

    #[test]
    fn round_trips_every_month_start() {
        for year in [1901, 1950, 1999, 2023, 2025, 2049] {
            for (month, leap, _) in months_of(year).unwrap() {
                let lunar = LunarDate {
                    year,
                    month,
                    day: 1,
                    leap,
                };
                let solar = lunar_to_solar(lunar).unwrap();
                assert_eq!(solar_to_lunar(solar), Ok(lunar));
            }
        }
    }
}
