use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::LoanInput;
use crate::decimal::Money;
use crate::errors::Result;
use crate::schedule::{PayoffAdjustment, PayoffOutcome, ScheduleResult, TargetPayoffSolver};
use crate::timeline::RepaymentTimeline;
use crate::types::RateChange;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviewOptionKind {
    /// repayment unchanged, payoff date moves
    KeepRepayment,
    /// repayment changed so the payoff date holds
    AdjustRepayment,
    /// calculated payment follows the new rate
    FloatingPayment,
}

/// one way of absorbing a candidate rate change
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChangeOption {
    pub kind: PreviewOptionKind,
    pub label: String,
    pub repayment: Money,
    pub payoff_date: Option<NaiveDate>,
    pub total_interest: Money,
    pub num_repayments: u32,
    /// against the current schedule; positive means more interest
    pub interest_delta: Money,
    pub repayments_delta: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChangePreview {
    pub has_fixed_repayment: bool,
    pub current_payoff_date: Option<NaiveDate>,
    pub current_repayment: Option<Money>,
    pub current_total_interest: Money,
    pub options: Vec<RateChangeOption>,
}

/// compare the current schedule with one that includes `candidate`
///
/// The candidate is appended to the stored rate changes with any
/// `adjusted_repayment` removed. A fixed-repayment loan gets a keep option and,
/// when the current payoff date is still reachable, an adjust option found by the
/// payoff solver. A floating loan gets a single floating option.
pub fn preview_rate_change(
    solver: &TargetPayoffSolver,
    input: &LoanInput,
    candidate: &RateChange,
) -> Result<RateChangePreview> {
    let engine = solver.engine();
    let current = engine.calculate_input(input)?;

    let candidate = RateChange {
        adjusted_repayment: None,
        ..candidate.clone()
    };
    let mut with_candidate = input.overrides.clone();
    with_candidate.rate_changes.push(candidate.clone());
    let candidate_index = with_candidate.rate_changes.len() - 1;

    let params = &input.parameters;
    let current_repayment = RepaymentTimeline::new(
        params.fixed_repayment,
        &input.overrides.rate_changes,
        &input.overrides.repayment_changes,
    )
    .repayment_at(candidate.effective_date);

    let changed = engine.calculate(params, &with_candidate)?;
    let mut options = Vec::new();

    match current_repayment {
        Some(repayment) => {
            options.push(option_from_schedule(
                PreviewOptionKind::KeepRepayment,
                format!("Keep repayment at ${}", repayment),
                repayment,
                &changed,
                &current,
            ));

            if let Some(target_date) = current.payoff_date {
                let outcome = solver.solve(
                    params,
                    &with_candidate,
                    target_date,
                    PayoffAdjustment::RateChange {
                        index: candidate_index,
                    },
                )?;
                if let PayoffOutcome::Reachable(solution) = outcome {
                    options.push(RateChangeOption {
                        kind: PreviewOptionKind::AdjustRepayment,
                        label: format!(
                            "Adjust repayment to ${} to keep payoff date {}",
                            solution.required_repayment, target_date
                        ),
                        repayment: solution.required_repayment,
                        payoff_date: Some(solution.payoff_date),
                        total_interest: solution.total_interest,
                        num_repayments: solution.num_repayments,
                        interest_delta: solution.total_interest - current.total_interest,
                        repayments_delta: solution.num_repayments as i64 - current.total_repayments as i64,
                    });
                }
            }
        }
        None => {
            // first payment dated on or after the change carries the new rate
            let repayment = changed
                .rows
                .iter()
                .find(|r| r.date >= candidate.effective_date)
                .or_else(|| changed.rows.last())
                .map(|r| r.calculated_payment)
                .unwrap_or(Money::ZERO);
            options.push(option_from_schedule(
                PreviewOptionKind::FloatingPayment,
                format!("Floating repayment of ${}", repayment),
                repayment,
                &changed,
                &current,
            ));
        }
    }

    debug!(
        effective_date = %candidate.effective_date,
        rate = %candidate.annual_rate,
        options = options.len(),
        "rate change previewed"
    );

    Ok(RateChangePreview {
        has_fixed_repayment: current_repayment.is_some(),
        current_payoff_date: current.payoff_date,
        current_repayment,
        current_total_interest: current.total_interest,
        options,
    })
}

fn option_from_schedule(
    kind: PreviewOptionKind,
    label: String,
    repayment: Money,
    schedule: &ScheduleResult,
    current: &ScheduleResult,
) -> RateChangeOption {
    RateChangeOption {
        kind,
        label,
        repayment,
        payoff_date: schedule.payoff_date,
        total_interest: schedule.total_interest,
        num_repayments: schedule.total_repayments,
        interest_delta: schedule.total_interest - current.total_interest,
        repayments_delta: schedule.total_repayments as i64 - current.total_repayments as i64,
    }
}
