/// json document - stored loan in, tagged schedule out
use std::collections::BTreeSet;

use chrono::{TimeZone, Utc};
use loan_schedule_rs::{
    AmortizationEngine, LoanInput, Money, SafeTimeProvider, ScheduleProgress, ScheduleView, TimeSource, WhatIf,
};

const DOCUMENT: &str = r#"{
    "principal": "12000.00",
    "annual_rate": "0.06",
    "frequency": "monthly",
    "start_date": "2026-01-31",
    "loan_term": 12,
    "extra_repayments": [
        {"payment_date": "2026-06-15", "amount": "1500", "note": "tax refund"}
    ]
}"#;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let time = SafeTimeProvider::new(TimeSource::Test(
        Utc.with_ymd_and_hms(2026, 5, 10, 0, 0, 0).unwrap()
    ));

    let input = LoanInput::from_json(DOCUMENT)?;
    let engine = AmortizationEngine::default();
    let paid: BTreeSet<u32> = [1, 2, 3].into_iter().collect();

    let schedule = engine.calculate_input(&input)?;
    let progress = ScheduleProgress::compute(&schedule, &paid, &time);
    println!("{}", ScheduleView::new(&schedule, &progress, &paid).to_json_pretty()?);

    // what if the borrower committed to $1,200 a month?
    let what_if = WhatIf {
        fixed_repayment: Some(Money::from_major(1_200)),
        ..WhatIf::default()
    };
    let preview = engine.calculate_input(&input.with_what_if(&what_if))?;
    println!(
        "\nwhat-if $1200/month: {} repayments, ${} interest (was {} / ${})",
        preview.total_repayments, preview.total_interest, schedule.total_repayments, schedule.total_interest
    );

    Ok(())
}
