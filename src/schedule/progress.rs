use std::collections::BTreeSet;

use chrono::NaiveDate;
use hourglass_rs::SafeTimeProvider;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::schedule::ScheduleResult;

/// first unpaid row of a schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NextPayment {
    pub number: u32,
    pub date: NaiveDate,
    pub amount: Money,
}

/// repayment progress of a schedule against the periods marked paid
///
/// Paid tagging is applied after the fact; the schedule itself never depends
/// on which periods were paid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleProgress {
    pub total_repayments: u32,
    pub payments_made: u32,
    /// percent of repayments made, one decimal place
    pub progress_pct: Decimal,
    pub next_payment: Option<NextPayment>,
    pub remaining_balance: Money,
    /// unpaid periods dated on or before today
    pub overdue_periods: Vec<u32>,
}

impl ScheduleProgress {
    pub fn compute(
        schedule: &ScheduleResult,
        paid_periods: &BTreeSet<u32>,
        time_provider: &SafeTimeProvider,
    ) -> Self {
        let today = time_provider.now().date_naive();

        let payments_made = schedule
            .rows
            .iter()
            .filter(|r| paid_periods.contains(&r.number))
            .count() as u32;

        let total_repayments = schedule.total_repayments;
        let progress_pct = if total_repayments == 0 {
            Decimal::ZERO
        } else {
            (Decimal::from(payments_made) * Decimal::ONE_HUNDRED / Decimal::from(total_repayments))
                .round_dp_with_strategy(1, RoundingStrategy::MidpointAwayFromZero)
        };

        let mut unpaid = schedule
            .rows
            .iter()
            .filter(|r| !paid_periods.contains(&r.number));

        let first_unpaid = unpaid.next();
        let next_payment = first_unpaid.map(|r| NextPayment {
            number: r.number,
            date: r.date,
            amount: r.actual_payment(),
        });

        let remaining_balance = match first_unpaid {
            Some(row) => row.opening_balance,
            None => schedule.final_balance(),
        };

        let overdue_periods = first_unpaid
            .into_iter()
            .chain(unpaid)
            .take_while(|r| r.date <= today)
            .map(|r| r.number)
            .collect();

        Self {
            total_repayments,
            payments_made,
            progress_pct,
            next_payment,
            remaining_balance,
            overdue_periods,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.total_repayments > 0 && self.payments_made == self.total_repayments
    }
}
