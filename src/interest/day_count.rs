use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Rate;
use crate::types::Frequency;

/// day count convention for period interest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DayCountConvention {
    /// every period is 1 / periods-per-year of a year, whatever its length
    PeriodFraction,
    /// actual days / 365
    Actual365,
}

impl DayCountConvention {
    /// unrounded interest on `balance` at `annual_rate`, `None` outside the decimal range
    ///
    /// `days` is only read by `Actual365`.
    pub fn accrue(&self, balance: Decimal, annual_rate: Rate, frequency: Frequency, days: i64) -> Option<Decimal> {
        let yearly = balance.checked_mul(annual_rate.as_decimal())?;
        match self {
            DayCountConvention::PeriodFraction => {
                yearly.checked_div(Decimal::from(frequency.periods_per_year()))
            }
            DayCountConvention::Actual365 => yearly
                .checked_div(Decimal::from(365))?
                .checked_mul(Decimal::from(days)),
        }
    }
}
