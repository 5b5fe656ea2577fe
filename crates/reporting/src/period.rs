use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use estatecrm_core::{DomainError, DomainResult};

/// A calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct YearMonth {
    pub year: i32,
    pub month: u32,
}

impl YearMonth {
    pub fn of(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    /// Step back `months` months.
    pub fn back(self, months: u32) -> Self {
        let index = self.year * 12 + self.month as i32 - 1 - months as i32;
        Self {
            year: index.div_euclid(12),
            month: index.rem_euclid(12) as u32 + 1,
        }
    }

    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }
}

impl core::fmt::Display for YearMonth {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

/// Inclusive date range a report covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPeriod {
    start: NaiveDate,
    end: NaiveDate,
}

impl ReportPeriod {
    pub fn new(start: NaiveDate, end: NaiveDate) -> DomainResult<Self> {
        if start > end {
            return Err(DomainError::validation(format!(
                "report period starts after it ends ({start} > {end})"
            )));
        }
        Ok(Self { start, end })
    }

    /// January 1 through December 31 of `year`.
    pub fn calendar_year(year: i32) -> DomainResult<Self> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1);
        let end = NaiveDate::from_ymd_opt(year, 12, 31);
        match (start, end) {
            (Some(start), Some(end)) => Self::new(start, end),
            _ => Err(DomainError::validation(format!("year {year} out of range"))),
        }
    }

    /// The `months` calendar months ending with the month of `today`,
    /// through `today`.
    pub fn trailing_months(today: NaiveDate, months: u32) -> DomainResult<Self> {
        if months == 0 {
            return Err(DomainError::validation("report period needs at least one month"));
        }
        let start = YearMonth::of(today)
            .back(months - 1)
            .first_day()
            .ok_or_else(|| DomainError::validation(format!("{months} months before {today} is out of range")))?;
        Self::new(start, today)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Every month the period touches, in order.
    pub fn months(&self) -> Vec<YearMonth> {
        let last = YearMonth::of(self.end);
        let mut months = Vec::new();
        let mut cursor = YearMonth::of(self.start);
        while cursor <= last {
            months.push(cursor);
            cursor = cursor.next();
        }
        months
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn calendar_year_has_twelve_months() {
        let period = ReportPeriod::calendar_year(2024).unwrap();
        let months = period.months();
        assert_eq!(months.len(), 12);
        assert_eq!(months[0], YearMonth { year: 2024, month: 1 });
        assert_eq!(months[11].to_string(), "2024-12");
        assert!(period.contains(date(2024, 12, 31)));
        assert!(!period.contains(date(2025, 1, 1)));
    }

    #[test]
    fn reversed_period_is_rejected() {
        assert!(ReportPeriod::new(date(2024, 3, 1), date(2024, 2, 1)).is_err());
        assert!(ReportPeriod::new(date(2024, 3, 1), date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn trailing_months_cross_year_boundary() {
        let period = ReportPeriod::trailing_months(date(2024, 2, 10), 4).unwrap();
        assert_eq!(period.start(), date(2023, 11, 1));
        assert_eq!(period.end(), date(2024, 2, 10));
        let labels: Vec<String> = period.months().iter().map(ToString::to_string).collect();
        assert_eq!(labels, vec!["2023-11", "2023-12", "2024-01", "2024-02"]);

        assert!(ReportPeriod::trailing_months(date(2024, 2, 10), 0).is_err());
    }

    #[test]
    fn partial_months_are_included() {
        let period = ReportPeriod::new(date(2024, 1, 31), date(2024, 3, 1)).unwrap();
        assert_eq!(period.months().len(), 3);
    }
}
