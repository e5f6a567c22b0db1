/// serializable views of a computed schedule
use std::collections::BTreeSet;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::schedule::{NextPayment, ScheduleProgress, ScheduleResult, ScheduleRow};

/// schedule plus progress, in the shape returned to callers
#[derive(Debug, Serialize, Deserialize)]
pub struct ScheduleView {
    pub summary: SummaryView,
    pub rows: Vec<RowView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SummaryView {
    pub total_interest: Money,
    pub total_paid: Money,
    pub total_repayments: u32,
    pub payoff_date: Option<NaiveDate>,
    pub warning: Option<String>,
    pub payments_made: u32,
    pub progress_pct: Decimal,
    pub next_payment: Option<NextPayment>,
    pub remaining_balance: Money,
    pub overdue_periods: Vec<u32>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RowView {
    #[serde(flatten)]
    pub row: ScheduleRow,
    pub is_paid: bool,
}

impl ScheduleView {
    pub fn new(schedule: &ScheduleResult, progress: &ScheduleProgress, paid_periods: &BTreeSet<u32>) -> Self {
        ScheduleView {
            summary: SummaryView {
                total_interest: schedule.total_interest,
                total_paid: schedule.total_paid,
                total_repayments: schedule.total_repayments,
                payoff_date: schedule.payoff_date,
                warning: schedule.warning.map(|w| w.to_string()),
                payments_made: progress.payments_made,
                progress_pct: progress.progress_pct,
                next_payment: progress.next_payment.clone(),
                remaining_balance: progress.remaining_balance,
                overdue_periods: progress.overdue_periods.clone(),
            },
            rows: schedule
                .rows
                .iter()
                .map(|row| RowView {
                    row: row.clone(),
                    is_paid: paid_periods.contains(&row.number),
                })
                .collect(),
        }
    }

    /// convert to pretty-printed json string
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::schedule::calculate_schedule;
    use crate::types::{Frequency, LoanParameters, ScheduleOverrides};
    use chrono::{TimeZone, Utc};
    use hourglass_rs::{SafeTimeProvider, TimeSource};

    #[test]
    fn test_view_tags_paid_rows() {
        let params = LoanParameters::builder()
            .principal(Money::from_major(1_000))
            .annual_rate(Rate::ZERO)
            .frequency(Frequency::Monthly)
            .start_date(NaiveDate::from_ymd_opt(2026, 1, 1).unwrap())
            .term(10)
            .build()
            .unwrap();
        let schedule = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        let paid: BTreeSet<u32> = [1, 2].into_iter().collect();
        let time = SafeTimeProvider::new(TimeSource::Test(Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap()));
        let progress = ScheduleProgress::compute(&schedule, &paid, &time);

        let view = ScheduleView::new(&schedule, &progress, &paid);
        let json = view.to_json_pretty().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["summary"]["total_repayments"], 10);
        assert_eq!(value["summary"]["payoff_date"], "2026-11-01");
        assert_eq!(value["summary"]["payments_made"], 2);
        assert_eq!(value["summary"]["overdue_periods"], serde_json::json!([3]));
        assert_eq!(value["rows"][0]["number"], 1);
        assert_eq!(value["rows"][0]["is_paid"], true);
        assert_eq!(value["rows"][2]["is_paid"], false);
        assert_eq!(value["rows"][0]["closing_balance"], "900.00");
    }
}
