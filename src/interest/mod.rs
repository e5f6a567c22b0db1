pub mod day_count;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::timeline::RateTimeline;
use crate::types::{Frequency, RateChange};

pub use day_count::DayCountConvention;

/// stretch of a period accruing at a single rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubInterval {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub rate: Rate,
    pub days: i64,
}

/// interest due for one period
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodInterest {
    pub interest: Money,
    /// rate in effect on the payment date
    pub rate: Rate,
    pub convention: DayCountConvention,
    /// empty unless a rate change falls strictly inside the period
    pub sub_intervals: Vec<SubInterval>,
}

impl PeriodInterest {
    pub fn is_prorated(&self) -> bool {
        !self.sub_intervals.is_empty()
    }
}

/// interest for a period, pro-rated across rate changes inside it
pub struct PeriodInterestCalculator<'a> {
    rates: &'a RateTimeline,
    frequency: Frequency,
}

impl<'a> PeriodInterestCalculator<'a> {
    pub fn new(rates: &'a RateTimeline, frequency: Frequency) -> Self {
        Self { rates, frequency }
    }

    /// interest on `balance` for (start_exclusive, end_inclusive]
    ///
    /// Without an interior rate change this is `balance * rate / periods_per_year`,
    /// identical to a plain amortization table. Otherwise each sub-interval accrues
    /// Actual/365 at its own rate on the unchanged balance and the sum is rounded once.
    /// `None` when the interest does not fit in a `Decimal`.
    pub fn compute(&self, balance: Money, start_exclusive: NaiveDate, end_inclusive: NaiveDate) -> Option<PeriodInterest> {
        let end_rate = self.rates.rate_at(end_inclusive);
        let boundaries = self.rates.boundaries_within(start_exclusive, end_inclusive);

        if boundaries.is_empty() {
            let convention = DayCountConvention::PeriodFraction;
            let interest = convention.accrue(balance.as_decimal(), end_rate, self.frequency, 0)?;
            return Some(PeriodInterest {
                interest: Money::from_decimal(interest),
                rate: end_rate,
                convention,
                sub_intervals: Vec::new(),
            });
        }

        let convention = DayCountConvention::Actual365;
        let mut sub_intervals = Vec::with_capacity(boundaries.len() + 1);
        let mut interval_start = start_exclusive;
        for interval_end in boundaries.into_iter().chain(std::iter::once(end_inclusive)) {
            sub_intervals.push(SubInterval {
                start: interval_start,
                end: interval_end,
                rate: self.rates.rate_at(interval_start),
                days: (interval_end - interval_start).num_days(),
            });
            interval_start = interval_end;
        }

        let mut total = Decimal::ZERO;
        for sub in &sub_intervals {
            let accrued = convention.accrue(balance.as_decimal(), sub.rate, self.frequency, sub.days)?;
            total = total.checked_add(accrued)?;
        }

        Some(PeriodInterest {
            interest: Money::from_decimal(total),
            rate: end_rate,
            convention,
            sub_intervals,
        })
    }
}

/// interest for one period given the raw rate inputs, `None` outside the decimal range
pub fn compute_period_interest(
    balance: Money,
    start_exclusive: NaiveDate,
    end_inclusive: NaiveDate,
    base_rate: Rate,
    rate_changes: &[RateChange],
    frequency: Frequency,
) -> Option<PeriodInterest> {
    let rates = RateTimeline::new(base_rate, rate_changes);
    PeriodInterestCalculator::new(&rates, frequency).compute(balance, start_exclusive, end_inclusive)
}
