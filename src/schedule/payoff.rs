use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::LoanInput;
use crate::decimal::Money;
use crate::errors::{Result, ScheduleError};
use crate::schedule::{AmortizationEngine, ScheduleResult};
use crate::types::{LoanParameters, ScheduleOverrides};

/// which repayment amount the solver varies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PayoffAdjustment {
    /// the loan's fixed repayment
    BaseRepayment,
    /// `adjusted_repayment` of one rate change; earlier periods keep the base repayment
    RateChange { index: usize },
}

/// smallest repayment found that clears the loan by the target date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PayoffSolution {
    pub required_repayment: Money,
    pub total_interest: Money,
    pub total_paid: Money,
    pub num_repayments: u32,
    pub payoff_date: NaiveDate,
    /// bisection steps taken
    pub steps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PayoffOutcome {
    Reachable(PayoffSolution),
    /// no repayment inside the search range pays off by `target_date`
    Unreachable { target_date: NaiveDate, steps: u32 },
}

impl PayoffOutcome {
    pub fn is_reachable(&self) -> bool {
        matches!(self, PayoffOutcome::Reachable(_))
    }

    pub fn solution(&self) -> Option<&PayoffSolution> {
        match self {
            PayoffOutcome::Reachable(solution) => Some(solution),
            PayoffOutcome::Unreachable { .. } => None,
        }
    }

    pub fn steps(&self) -> u32 {
        match self {
            PayoffOutcome::Reachable(solution) => solution.steps,
            PayoffOutcome::Unreachable { steps, .. } => *steps,
        }
    }
}

/// bisection search for the repayment that pays a loan off by a date
#[derive(Debug, Clone, Default)]
pub struct TargetPayoffSolver {
    engine: AmortizationEngine,
}

impl TargetPayoffSolver {
    pub fn new(engine: AmortizationEngine) -> Self {
        Self { engine }
    }

    pub fn engine(&self) -> &AmortizationEngine {
        &self.engine
    }

    pub fn solve_input(
        &self,
        input: &LoanInput,
        target_date: NaiveDate,
        adjustment: PayoffAdjustment,
    ) -> Result<PayoffOutcome> {
        self.solve(&input.parameters, &input.overrides, target_date, adjustment)
    }

    /// search repayments between just above interest-only and twice the principal
    ///
    /// Each step runs a full schedule at the cent-rounded midpoint. A success
    /// moves the upper bound to one guard band below the midpoint, a failure
    /// moves the lower bound one guard band above it, so the search always
    /// terminates on the cent grid.
    pub fn solve(
        &self,
        params: &LoanParameters,
        overrides: &ScheduleOverrides,
        target_date: NaiveDate,
        adjustment: PayoffAdjustment,
    ) -> Result<PayoffOutcome> {
        if let PayoffAdjustment::RateChange { index } = adjustment {
            if index >= overrides.rate_changes.len() {
                return Err(ScheduleError::InvalidConfiguration {
                    message: format!(
                        "rate change index {} out of range ({} rate changes)",
                        index,
                        overrides.rate_changes.len()
                    ),
                });
            }
            if params.is_floating() {
                return Err(ScheduleError::InvalidConfiguration {
                    message: "adjusting a rate change repayment requires a fixed repayment".to_string(),
                });
            }
        }

        let config = self.engine.config();
        let guard = config.search_guard_band.as_decimal();
        let mut low = params.interest_only_amount() + guard;
        let mut high = params.principal.as_decimal() * Decimal::TWO;

        let mut best: Option<PayoffSolution> = None;
        let mut steps = 0;

        for _ in 0..config.max_search_steps {
            steps += 1;
            let mid = Money::from_decimal((low + high) / Decimal::TWO);
            let trial = self.trial(params, overrides, mid, adjustment)?;

            if trial.rows.is_empty() {
                break;
            }

            let pays_off = trial.payoff_date.filter(|date| *date <= target_date);
            trace!(step = steps, repayment = %mid, payoff_date = ?trial.payoff_date, "payoff trial");

            match pays_off {
                Some(payoff_date) => {
                    best = Some(PayoffSolution {
                        required_repayment: mid,
                        total_interest: trial.total_interest,
                        total_paid: trial.total_paid,
                        num_repayments: trial.total_repayments,
                        payoff_date,
                        steps,
                    });
                    high = mid.as_decimal() - guard;
                }
                None => {
                    low = mid.as_decimal() + guard;
                }
            }

            if high < low {
                break;
            }
        }

        match best {
            Some(mut solution) => {
                solution.steps = steps;
                debug!(
                    repayment = %solution.required_repayment,
                    payoff_date = %solution.payoff_date,
                    steps,
                    "payoff target solved"
                );
                Ok(PayoffOutcome::Reachable(solution))
            }
            None => {
                warn!(target_date = %target_date, steps, "payoff target unreachable");
                Ok(PayoffOutcome::Unreachable { target_date, steps })
            }
        }
    }

    fn trial(
        &self,
        params: &LoanParameters,
        overrides: &ScheduleOverrides,
        repayment: Money,
        adjustment: PayoffAdjustment,
    ) -> Result<ScheduleResult> {
        match adjustment {
            PayoffAdjustment::BaseRepayment => {
                let mut params = params.clone();
                params.fixed_repayment = Some(repayment);
                self.engine.calculate(&params, overrides)
            }
            PayoffAdjustment::RateChange { index } => {
                let mut overrides = overrides.clone();
                if let Some(change) = overrides.rate_changes.get_mut(index) {
                    change.adjusted_repayment = Some(repayment);
                }
                self.engine.calculate(params, &overrides)
            }
        }
    }
}
