/// rate change preview - compare ways of absorbing a rate rise
use loan_schedule_rs::{
    parse_date, preview_rate_change, Frequency, LoanInput, LoanParameters, Money, Rate, RateChange,
    ScheduleOverrides, TargetPayoffSolver,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== rate change preview ===\n");

    let loan = LoanParameters::builder()
        .principal(Money::from_major(30_050))
        .annual_rate(Rate::from_bps(575))
        .frequency(Frequency::Fortnightly)
        .start_date(parse_date("2026-02-20")?)
        .term(52)
        .fixed_repayment(Money::from_minor(61_239))
        .build()?;
    let input = LoanInput::new(loan, ScheduleOverrides::default());

    let candidate = RateChange::new(parse_date("2026-07-01")?, Rate::from_bps(650));
    let preview = preview_rate_change(&TargetPayoffSolver::default(), &input, &candidate)?;

    println!(
        "current: payoff {:?}, ${} interest",
        preview.current_payoff_date, preview.current_total_interest
    );
    for option in &preview.options {
        println!(
            "{:<50} payoff {:?}  interest delta ${}  repayments delta {:+}",
            option.label, option.payoff_date, option.interest_delta, option.repayments_delta
        );
    }

    Ok(())
}
