/// payoff target - find the repayment that clears the loan by a date
use loan_schedule_rs::{
    parse_date, Frequency, LoanParameters, Money, PayoffAdjustment, PayoffOutcome, Rate, ScheduleOverrides,
    TargetPayoffSolver,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("=== payoff target ===\n");

    let loan = LoanParameters::builder()
        .principal(Money::from_major(30_050))
        .annual_rate(Rate::from_bps(575))
        .frequency(Frequency::Fortnightly)
        .start_date(parse_date("2026-02-20")?)
        .term(52)
        .fixed_repayment(Money::from_minor(61_239))
        .build()?;

    let solver = TargetPayoffSolver::default();

    for target in ["2027-06-01", "2028-02-18", "2026-03-01"] {
        let outcome = solver.solve(
            &loan,
            &ScheduleOverrides::default(),
            parse_date(target)?,
            PayoffAdjustment::BaseRepayment,
        )?;

        match outcome {
            PayoffOutcome::Reachable(solution) => println!(
                "by {}: repay ${} ({} repayments, ${} interest, done {}) in {} steps",
                target,
                solution.required_repayment,
                solution.num_repayments,
                solution.total_interest,
                solution.payoff_date,
                solution.steps
            ),
            PayoffOutcome::Unreachable { steps, .. } => {
                println!("by {}: not reachable ({} steps)", target, steps)
            }
        }
    }

    Ok(())
}
