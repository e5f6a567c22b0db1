/// quick start - minimal example to get started
use loan_schedule_rs::{calculate_schedule, parse_date, Frequency, LoanParameters, Money, Rate, ScheduleOverrides};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // $30,050 car loan, fortnightly over two years
    let loan = LoanParameters::builder()
        .principal(Money::from_major(30_050))
        .annual_rate(Rate::from_bps(575))
        .frequency(Frequency::Fortnightly)
        .start_date(parse_date("2026-02-20")?)
        .term(52)
        .fixed_repayment(Money::from_minor(61_239))
        .build()?;

    let schedule = calculate_schedule(&loan, &ScheduleOverrides::default())?;

    for row in schedule.rows.iter().take(3) {
        println!(
            "#{:>3} {}  interest ${:>8}  principal ${:>8}  balance ${:>10}",
            row.number, row.date, row.interest_component, row.principal_component, row.closing_balance
        );
    }

    println!("\nrepayments:     {}", schedule.total_repayments);
    println!("total interest: ${}", schedule.total_interest);
    println!("total paid:     ${}", schedule.total_paid);
    if let Some(date) = schedule.payoff_date {
        println!("paid off on:    {}", date);
    }

    Ok(())
}
