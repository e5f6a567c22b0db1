/// overrides - rate changes, repayment changes and extra payments
use loan_schedule_rs::{
    calculate_schedule, parse_date, ExtraPayment, Frequency, LoanParameters, Money, Rate, RateChange,
    RepaymentChange, ScheduleOverrides,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== schedule overrides ===\n");

    let loan = LoanParameters::builder()
        .principal(Money::from_major(30_050))
        .annual_rate(Rate::from_bps(575))
        .frequency(Frequency::Fortnightly)
        .start_date(parse_date("2026-02-20")?)
        .term(52)
        .fixed_repayment(Money::from_minor(61_239))
        .build()?;

    let baseline = calculate_schedule(&loan, &ScheduleOverrides::default())?;
    println!(
        "baseline:  {} repayments, ${} interest",
        baseline.total_repayments, baseline.total_interest
    );

    // a hike part-way through a period is pro-rated by day
    let overrides = ScheduleOverrides::new()
        .with_rate_change(
            RateChange::new(parse_date("2026-04-06")?, Rate::from_bps(650)).with_note("rate rise"),
        )
        .with_repayment_change(RepaymentChange::new(parse_date("2026-05-01")?, Money::from_major(700)))
        .with_extra_payment(ExtraPayment::new(parse_date("2026-06-01")?, Money::from_major(5_000)));

    let schedule = calculate_schedule(&loan, &overrides)?;
    println!(
        "overrides: {} repayments, ${} interest\n",
        schedule.total_repayments, schedule.total_interest
    );

    for row in schedule.rows.iter().take(10) {
        println!(
            "#{:>2} {} rate {:>6} interest ${:>6} calc ${:>7} additional ${:>6} extra ${:>8} balance ${:>9}",
            row.number,
            row.date,
            row.rate_in_effect,
            row.interest_component,
            row.calculated_payment,
            row.additional_over_calculated,
            row.extra_payment,
            row.closing_balance
        );
    }

    Ok(())
}
