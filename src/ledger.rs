use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;

use crate::decimal::Money;
use crate::types::ExtraPayment;

/// extra principal contributions of one loan
#[derive(Debug, Clone, Copy)]
pub struct ExtraPaymentLedger<'a> {
    extras: &'a [ExtraPayment],
}

impl<'a> ExtraPaymentLedger<'a> {
    pub fn new(extras: &'a [ExtraPayment]) -> Self {
        Self { extras }
    }

    /// total of extras dated in (start_exclusive, end_inclusive]
    pub fn sum_in_window(&self, start_exclusive: NaiveDate, end_inclusive: NaiveDate) -> Option<Money> {
        sum_in_window(start_exclusive, end_inclusive, self.extras)
    }

    /// window opening for a 1-based period whose previous payment date is `previous`
    ///
    /// The first window opens one day before the loan start so an extra dated on
    /// the start date counts toward period 1.
    pub fn window_start(period: u32, previous: NaiveDate) -> NaiveDate {
        if period > 1 {
            previous
        } else {
            previous.checked_sub_days(Days::new(1)).unwrap_or(previous)
        }
    }
}

/// total of extras dated in (start_exclusive, end_inclusive], rounded to cents
///
/// `None` when the total leaves the decimal range.
pub fn sum_in_window(start_exclusive: NaiveDate, end_inclusive: NaiveDate, extras: &[ExtraPayment]) -> Option<Money> {
    extras
        .iter()
        .filter(|e| e.payment_date > start_exclusive && e.payment_date <= end_inclusive)
        .try_fold(Decimal::ZERO, |total, e| total.checked_add(e.amount.as_decimal()))
        .map(Money::from_decimal)
}
