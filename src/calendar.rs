use chrono::{Days, Months, NaiveDate};

use crate::errors::{Result, ScheduleError};
use crate::types::Frequency;

/// periods per year for a cadence
pub fn periods_per_year(frequency: Frequency) -> u32 {
    frequency.periods_per_year()
}

/// date of the `periods`-th payment after `start`
///
/// Monthly steps clamp to the last day of shorter months, so Jan 31 + 1 month
/// lands on Feb 28 (or 29). Each call counts from `start`, never from the
/// previous clamped date, so the day of month recovers in longer months.
pub fn add_period(start: NaiveDate, frequency: Frequency, periods: u32) -> Result<NaiveDate> {
    let shifted = match frequency {
        Frequency::Weekly => start.checked_add_days(Days::new(7 * periods as u64)),
        Frequency::Fortnightly => start.checked_add_days(Days::new(14 * periods as u64)),
        Frequency::Monthly => start.checked_add_months(Months::new(periods)),
    };

    shifted.ok_or_else(|| ScheduleError::InvalidDate {
        message: format!("{} + {} {} periods is out of range", start, periods, frequency),
    })
}

/// parse an ISO `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|e| ScheduleError::InvalidDate {
        message: format!("{:?} is not a YYYY-MM-DD date ({})", value, e),
    })
}

/// payment dates of one loan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PeriodCalendar {
    start: NaiveDate,
    frequency: Frequency,
}

impl PeriodCalendar {
    pub fn new(start: NaiveDate, frequency: Frequency) -> Self {
        Self { start, frequency }
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn frequency(&self) -> Frequency {
        self.frequency
    }

    pub fn payment_date(&self, period: u32) -> Result<NaiveDate> {
        add_period(self.start, self.frequency, period)
    }

    /// (previous payment date, this payment date) for a 1-based period;
    /// the first period opens on the start date
    pub fn period_bounds(&self, period: u32) -> Result<(NaiveDate, NaiveDate)> {
        let previous = if period > 1 {
            self.payment_date(period - 1)?
        } else {
            self.start
        };
        Ok((previous, self.payment_date(period)?))
    }
}
