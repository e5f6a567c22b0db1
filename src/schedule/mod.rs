pub mod amortization;
pub mod payoff;
pub mod preview;
pub mod progress;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::decimal::{Money, Rate};

pub use amortization::{calculate_schedule, level_payment, AmortizationEngine};
pub use payoff::{PayoffAdjustment, PayoffOutcome, PayoffSolution, TargetPayoffSolver};
pub use preview::{preview_rate_change, PreviewOptionKind, RateChangeOption, RateChangePreview};
pub use progress::{NextPayment, ScheduleProgress};

/// one period of an amortization schedule
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRow {
    pub number: u32,
    pub date: NaiveDate,
    pub opening_balance: Money,
    pub principal_component: Money,
    pub interest_component: Money,
    pub rate_in_effect: Rate,
    pub calculated_payment: Money,
    pub additional_over_calculated: Money,
    pub extra_payment: Money,
    pub closing_balance: Money,
}

impl ScheduleRow {
    /// scheduled payment actually made this period, excluding extras
    pub fn actual_payment(&self) -> Money {
        self.principal_component + self.interest_component
    }

    /// principal retired this period, extras included
    pub fn principal_reduction(&self) -> Money {
        self.principal_component + self.extra_payment
    }
}

/// why a schedule stopped before paying the loan off
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ScheduleWarning {
    /// the fixed repayment never exceeds a period's interest
    RepaymentBelowInterest,
    ExceededMaxPeriods { max_periods: u32 },
}

impl fmt::Display for ScheduleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScheduleWarning::RepaymentBelowInterest => {
                write!(f, "Repayment does not cover interest. Loan will not be paid off.")
            }
            ScheduleWarning::ExceededMaxPeriods { max_periods } => {
                write!(f, "Schedule exceeded {} periods.", max_periods)
            }
        }
    }
}

/// computed schedule with totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub rows: Vec<ScheduleRow>,
    pub total_interest: Money,
    pub total_paid: Money,
    pub total_repayments: u32,
    pub payoff_date: Option<NaiveDate>,
    pub warning: Option<ScheduleWarning>,
}

impl ScheduleResult {
    /// row for a 1-based period number
    pub fn row(&self, number: u32) -> Option<&ScheduleRow> {
        number
            .checked_sub(1)
            .and_then(|index| self.rows.get(index as usize))
    }

    pub fn final_balance(&self) -> Money {
        self.rows
            .last()
            .map(|r| r.closing_balance)
            .unwrap_or(Money::ZERO)
    }

    pub fn is_paid_off(&self) -> bool {
        self.warning.is_none() && self.final_balance().is_zero()
    }
}
