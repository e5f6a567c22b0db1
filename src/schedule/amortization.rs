use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use tracing::{debug, warn};

use crate::calendar::PeriodCalendar;
use crate::config::{LoanInput, ScheduleConfig};
use crate::decimal::Money;
use crate::errors::Result;
use crate::interest::PeriodInterestCalculator;
use crate::ledger::ExtraPaymentLedger;
use crate::schedule::{ScheduleResult, ScheduleRow, ScheduleWarning};
use crate::timeline::{RateTimeline, RepaymentTimeline};
use crate::types::{Frequency, LoanParameters, ScheduleOverrides};

/// below this per-period rate the annuity formula is treated as interest free
const NEAR_ZERO_RATE: Decimal = dec!(0.000000000001);

/// level payment that amortizes `balance` over `periods` at `rate_per_period`
///
/// PMT = pv * r * (1 + r)^n / ((1 + r)^n - 1), rounded to cents. Once the
/// annuity terms leave the decimal range the payment has converged to its
/// interest-only limit `pv * r`, which is used instead. `None` only when that
/// limit is itself out of range.
pub fn level_payment(rate_per_period: Decimal, periods: u32, balance: Money) -> Option<Money> {
    if periods == 0 {
        return Some(balance);
    }

    let pv = balance.as_decimal();
    let r = rate_per_period;

    if r.abs() < NEAR_ZERO_RATE {
        return Some(balance / Decimal::from(periods));
    }

    let interest_only = pv.checked_mul(r)?;

    if periods == 1 {
        return pv.checked_add(interest_only).map(Money::from_decimal);
    }

    let payment = compound_factor(Decimal::ONE + r, periods)
        .and_then(|compound| {
            interest_only
                .checked_mul(compound)?
                .checked_div(compound - Decimal::ONE)
        })
        .unwrap_or(interest_only);

    Some(Money::from_decimal(payment))
}

/// `base^n` by repeated squaring, `None` on overflow
fn compound_factor(base: Decimal, n: u32) -> Option<Decimal> {
    let mut result = Decimal::ONE;
    let mut base = base;
    let mut n = n;

    loop {
        if n & 1 == 1 {
            result = result.checked_mul(base)?;
        }
        n >>= 1;
        if n == 0 {
            break;
        }
        base = base.checked_mul(base)?;
    }

    Some(result)
}

/// period-by-period schedule generator
#[derive(Debug, Clone, Default)]
pub struct AmortizationEngine {
    config: ScheduleConfig,
}

impl AmortizationEngine {
    pub fn new(config: ScheduleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ScheduleConfig {
        &self.config
    }

    pub fn calculate_input(&self, input: &LoanInput) -> Result<ScheduleResult> {
        self.calculate(&input.parameters, &input.overrides)
    }

    /// full schedule for a loan and its overrides
    ///
    /// Runs until the balance falls below the zero threshold or `max_periods`
    /// rows have been produced. Hitting the cap is not an error: the partial
    /// schedule comes back with a warning attached.
    pub fn calculate(&self, params: &LoanParameters, overrides: &ScheduleOverrides) -> Result<ScheduleResult> {
        params.validate()?;
        overrides.validate()?;

        let rates = RateTimeline::new(params.annual_rate, &overrides.rate_changes);
        let pass = SchedulePass {
            config: &self.config,
            calendar: PeriodCalendar::new(params.start_date, params.frequency),
            interest: PeriodInterestCalculator::new(&rates, params.frequency),
            repayments: RepaymentTimeline::new(
                params.fixed_repayment,
                &overrides.rate_changes,
                &overrides.repayment_changes,
            ),
            extras: ExtraPaymentLedger::new(&overrides.extra_payments),
            frequency: params.frequency,
            term: params.term,
        };

        let mut balance = params.principal;
        let mut rows: Vec<ScheduleRow> = Vec::new();
        let mut total_interest = Money::ZERO;
        let mut total_paid = Money::ZERO;

        for period in 1..=self.config.max_periods {
            if balance < self.config.zero_threshold {
                break;
            }

            let Some(row) = pass.row(period, balance)? else {
                warn!(period, balance = %balance, "period amounts exceed the decimal range");
                break;
            };

            let paid = row
                .actual_payment()
                .checked_add(row.extra_payment)
                .and_then(|amount| total_paid.checked_add(amount));
            let (Some(interest_to_date), Some(paid_to_date)) =
                (total_interest.checked_add(row.interest_component), paid)
            else {
                warn!(period, "schedule totals exceed the decimal range");
                break;
            };

            total_interest = interest_to_date;
            total_paid = paid_to_date;
            balance = row.closing_balance;
            rows.push(row);

            if !balance.is_positive() {
                break;
            }
        }

        let warning = if balance >= self.config.zero_threshold {
            let warning = self.cap_warning(params);
            warn!(
                periods = rows.len(),
                remaining_balance = %balance,
                "schedule stopped before payoff: {}",
                warning
            );
            Some(warning)
        } else {
            None
        };

        let payoff_date = match warning {
            None => rows.last().map(|r| r.date),
            Some(_) => None,
        };

        debug!(
            rows = rows.len(),
            total_interest = %total_interest,
            total_paid = %total_paid,
            payoff_date = ?payoff_date,
            "schedule calculated"
        );

        Ok(ScheduleResult {
            total_repayments: rows.len() as u32,
            rows,
            total_interest,
            total_paid,
            payoff_date,
            warning,
        })
    }

    fn cap_warning(&self, params: &LoanParameters) -> ScheduleWarning {
        match params.fixed_repayment {
            Some(repayment) if repayment.as_decimal() <= params.interest_only_amount() => {
                ScheduleWarning::RepaymentBelowInterest
            }
            _ => ScheduleWarning::ExceededMaxPeriods {
                max_periods: self.config.max_periods,
            },
        }
    }
}

/// per-loan lookups shared by every period of one calculation
struct SchedulePass<'a> {
    config: &'a ScheduleConfig,
    calendar: PeriodCalendar,
    interest: PeriodInterestCalculator<'a>,
    repayments: RepaymentTimeline,
    extras: ExtraPaymentLedger<'a>,
    frequency: Frequency,
    term: u32,
}

impl<'a> SchedulePass<'a> {
    /// `Ok(None)` when the period's amounts leave the decimal range
    fn row(&self, period: u32, balance: Money) -> Result<Option<ScheduleRow>> {
        let (previous, payment_date) = self.calendar.period_bounds(period)?;
        Ok(self.settle(period, previous, payment_date, balance))
    }

    fn settle(&self, period: u32, previous: NaiveDate, payment_date: NaiveDate, balance: Money) -> Option<ScheduleRow> {
        let period_interest = self.interest.compute(balance, previous, payment_date)?;
        let interest = period_interest.interest;
        let rate = period_interest.rate;

        let remaining = self.term.saturating_sub(period - 1).max(1);
        let mut calculated = level_payment(rate.per_period(self.frequency), remaining, balance)?;

        let scheduled = self.repayments.repayment_at(payment_date);
        let (mut actual, mut additional) = match scheduled {
            Some(amount) => {
                let difference = amount.checked_sub(calculated)?;
                if difference.abs() < self.config.rounding_noise_band {
                    calculated = amount;
                    (amount, Money::ZERO)
                } else {
                    (amount, difference)
                }
            }
            None => (calculated, Money::ZERO),
        };

        let mut extra = self
            .extras
            .sum_in_window(ExtraPaymentLedger::window_start(period, previous), payment_date)?;

        let mut principal = actual.checked_sub(interest)?;
        let mut total_principal = principal.checked_add(extra)?;

        if total_principal > balance {
            let overshoot = total_principal - balance;
            if extra.is_positive() && extra >= overshoot {
                extra -= overshoot;
            } else {
                actual = interest.checked_add(balance)? - extra;
                principal = balance - extra;
                additional = if scheduled.is_some() {
                    actual.checked_sub(calculated)?
                } else {
                    Money::ZERO
                };
            }
            total_principal = balance;
        }

        // final period of a scheduled repayment: report the reduced payment
        if scheduled.is_some() && total_principal >= balance {
            calculated = interest.checked_add(balance - extra)?;
            additional = actual.checked_sub(calculated)?;
        }

        let mut closing = balance.checked_sub(total_principal)?;
        if closing < self.config.zero_threshold {
            closing = Money::ZERO;
        }

        Some(ScheduleRow {
            number: period,
            date: payment_date,
            opening_balance: balance,
            principal_component: principal,
            interest_component: interest,
            rate_in_effect: rate,
            calculated_payment: calculated,
            additional_over_calculated: additional,
            extra_payment: extra,
            closing_balance: closing,
        })
    }
}

/// schedule with default policy values
pub fn calculate_schedule(params: &LoanParameters, overrides: &ScheduleOverrides) -> Result<ScheduleResult> {
    AmortizationEngine::default().calculate(params, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decimal::Rate;
    use crate::types::{ExtraPayment, RateChange, RepaymentChange};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn base_loan() -> LoanParameters {
        LoanParameters::builder()
            .principal(Money::from_major(30_050))
            .annual_rate(Rate::from_bps(575))
            .frequency(Frequency::Fortnightly)
            .start_date(date(2026, 2, 20))
            .term(52)
            .fixed_repayment(Money::from_minor(61_239))
            .build()
            .unwrap()
    }

    fn floating_loan() -> LoanParameters {
        LoanParameters::builder()
            .principal(Money::from_major(10_000))
            .annual_rate(Rate::from_percentage(6))
            .frequency(Frequency::Monthly)
            .start_date(date(2026, 1, 1))
            .term(12)
            .build()
            .unwrap()
    }

    #[test]
    fn test_level_payment() {
        assert_eq!(
            level_payment(dec!(0.0575) / dec!(26), 52, Money::from_major(30_050)),
            Some(Money::from_minor(61_239))
        );
        assert_eq!(level_payment(Decimal::ZERO, 10, Money::from_major(1_000)), Some(Money::from_major(100)));
        assert_eq!(level_payment(dec!(0.05), 1, Money::from_major(1_000)), Some(Money::from_major(1_050)));
        assert_eq!(level_payment(dec!(0.05), 0, Money::from_major(1_000)), Some(Money::from_major(1_000)));
    }

    #[test]
    fn test_level_payment_overflow_converges_to_interest() {
        // (1.5)^1200 is far outside the decimal range
        let payment = level_payment(dec!(0.5), 1200, Money::from_major(1_000));
        assert_eq!(payment, Some(Money::from_major(500)));
    }

    #[test]
    fn test_level_payment_at_validation_limits() {
        let rate = Rate::from_bps(10_000).per_period(Frequency::Monthly);
        let principal = Money::from_major(100_000_000);

        // (1 + r)^633 fits but pv * r * (1 + r)^633 does not
        assert_eq!(level_payment(rate, 633, principal), Some(Money::from_minor(833_333_333)));
        assert_eq!(level_payment(rate, 1, principal), Some(Money::from_minor(10_833_333_333)));

        let huge = Money::from_decimal(Decimal::MAX);
        assert_eq!(level_payment(rate, 12, huge), Some(Money::from_decimal(huge.as_decimal() * rate)));
        assert_eq!(level_payment(dec!(1.5), 12, huge), None);
        assert_eq!(level_payment(rate, 1, huge), None);
    }

    #[test]
    fn test_floating_schedule_at_validation_limits() {
        let params = LoanParameters::builder()
            .principal(Money::from_major(100_000_000))
            .annual_rate(Rate::from_bps(10_000))
            .frequency(Frequency::Monthly)
            .start_date(date(2026, 1, 1))
            .term(633)
            .build()
            .unwrap();

        let result = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        assert!(result.warning.is_none());
        assert_eq!(result.total_repayments, 633);
        assert_eq!(result.rows[0].interest_component, Money::from_minor(833_333_333));
        assert_eq!(result.rows[0].calculated_payment, Money::from_minor(833_333_333));
        assert_eq!(result.final_balance(), Money::ZERO);
    }

    #[test]
    fn test_runaway_balance_stops_with_warning() {
        let params = LoanParameters::builder()
            .principal(Money::from_major(100_000_000))
            .annual_rate(Rate::from_bps(10_000))
            .frequency(Frequency::Monthly)
            .start_date(date(2026, 1, 1))
            .term(12)
            .fixed_repayment(Money::from_major(1))
            .build()
            .unwrap();

        let result = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        assert_eq!(result.warning, Some(ScheduleWarning::RepaymentBelowInterest));
        assert_eq!(result.payoff_date, None);
        assert!(!result.rows.is_empty());
        assert!(result.total_repayments < 2000);
        assert!(result.final_balance() > params.principal);

        for pair in result.rows.windows(2) {
            assert_eq!(pair[1].opening_balance, pair[0].closing_balance);
        }
    }

    #[test]
    fn test_compound_factor() {
        assert_eq!(compound_factor(dec!(1.1), 0), Some(Decimal::ONE));
        assert_eq!(compound_factor(dec!(2), 10), Some(dec!(1024)));
        assert_eq!(compound_factor(dec!(1.5), 3), Some(dec!(3.375)));
        assert_eq!(compound_factor(dec!(10), 40), None);
    }

    #[test]
    fn test_fixed_repayment_schedule() {
        let result = calculate_schedule(&base_loan(), &ScheduleOverrides::default()).unwrap();

        assert_eq!(result.total_repayments, 52);
        assert_eq!(result.rows.len(), 52);
        assert!(result.warning.is_none());
        assert_eq!(result.payoff_date, Some(date(2028, 2, 18)));
        assert_eq!(result.total_interest, Money::from_minor(179_414));
        assert_eq!(result.total_paid, Money::from_minor(3_184_414));

        let first = &result.rows[0];
        assert_eq!(first.number, 1);
        assert_eq!(first.date, date(2026, 3, 6));
        assert_eq!(first.interest_component, Money::from_minor(6_646));
        assert_eq!(first.principal_component, Money::from_minor(54_593));
        assert_eq!(first.calculated_payment, Money::from_minor(61_239));
        assert_eq!(first.closing_balance, Money::from_minor(2_950_407));

        let second = &result.rows[1];
        assert_eq!(second.opening_balance, first.closing_balance);
        assert_eq!(second.interest_component, Money::from_minor(6_525));
        assert_eq!(second.closing_balance, Money::from_minor(2_895_693));

        let last = result.rows.last().unwrap();
        assert_eq!(last.opening_balance, Money::from_minor(61_090));
        assert_eq!(last.interest_component, Money::from_minor(135));
        assert_eq!(last.calculated_payment, Money::from_minor(61_225));
        assert_eq!(last.additional_over_calculated, Money::ZERO);
        assert_eq!(last.closing_balance, Money::ZERO);
    }

    #[test]
    fn test_floating_schedule_has_no_additional() {
        let result = calculate_schedule(&floating_loan(), &ScheduleOverrides::default()).unwrap();

        assert_eq!(result.total_repayments, 12);
        assert_eq!(result.total_interest, Money::from_minor(32_796));
        assert_eq!(result.total_paid, Money::from_minor(1_032_796));

        let first = &result.rows[0];
        assert_eq!(first.interest_component, Money::from_major(50));
        assert_eq!(first.calculated_payment, Money::from_minor(86_066));
        assert_eq!(first.closing_balance, Money::from_minor(918_934));

        let last = result.rows.last().unwrap();
        assert_eq!(last.opening_balance, Money::from_minor(85_638));
        assert_eq!(last.interest_component, Money::from_minor(428));
        assert_eq!(last.closing_balance, Money::ZERO);

        assert!(result.rows.iter().all(|r| r.additional_over_calculated.is_zero()));
    }

    #[test]
    fn test_zero_rate_accrues_no_interest() {
        let params = LoanParameters::builder()
            .principal(Money::from_major(1_000))
            .annual_rate(Rate::ZERO)
            .frequency(Frequency::Monthly)
            .start_date(date(2026, 1, 1))
            .term(10)
            .build()
            .unwrap();

        let result = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        assert_eq!(result.total_repayments, 10);
        assert!(result.rows.iter().all(|r| r.interest_component.is_zero()));
        assert!(result.total_interest.is_zero());
        assert_eq!(result.payoff_date, Some(date(2026, 11, 1)));
    }

    #[test]
    fn test_extra_on_start_date_counts_in_first_period() {
        let overrides = ScheduleOverrides::new()
            .with_extra_payment(ExtraPayment::new(date(2026, 1, 1), Money::from_major(1_000)));
        let result = calculate_schedule(&floating_loan(), &overrides).unwrap();

        assert_eq!(result.rows[0].extra_payment, Money::from_major(1_000));
        assert_eq!(result.rows[0].closing_balance, Money::from_minor(818_934));
        assert_eq!(result.total_interest, Money::from_minor(29_773));
    }

    #[test]
    fn test_oversized_extra_is_capped_to_balance() {
        let params = LoanParameters::builder()
            .principal(Money::from_major(1_000))
            .annual_rate(Rate::from_percentage(5))
            .frequency(Frequency::Monthly)
            .start_date(date(2026, 1, 1))
            .term(12)
            .build()
            .unwrap();
        let overrides = ScheduleOverrides::new()
            .with_extra_payment(ExtraPayment::new(date(2026, 2, 1), Money::from_major(50_000)));

        let result = calculate_schedule(&params, &overrides).unwrap();
        assert_eq!(result.total_repayments, 1);

        let row = &result.rows[0];
        assert_eq!(row.interest_component, Money::from_minor(417));
        assert_eq!(row.principal_component, Money::from_minor(8_144));
        assert_eq!(row.extra_payment, Money::from_minor(91_856));
        assert_eq!(row.closing_balance, Money::ZERO);
        assert_eq!(result.total_paid, Money::from_minor(100_417));
    }

    #[test]
    fn test_small_extra_in_final_period_reduces_payment() {
        let overrides = ScheduleOverrides::new()
            .with_extra_payment(ExtraPayment::new(date(2028, 2, 10), Money::from_major(100)));
        let result = calculate_schedule(&base_loan(), &overrides).unwrap();

        assert_eq!(result.total_repayments, 52);
        assert!(result.warning.is_none());

        // repayment plus extra overshoots the balance by more than the extra
        let last = result.rows.last().unwrap();
        assert_eq!(last.opening_balance, Money::from_minor(61_090));
        assert_eq!(last.interest_component, Money::from_minor(135));
        assert_eq!(last.extra_payment, Money::from_major(100));
        assert_eq!(last.principal_component, Money::from_minor(51_090));
        assert_eq!(
            last.calculated_payment,
            last.interest_component + last.opening_balance - last.extra_payment
        );
        assert_eq!(last.calculated_payment, Money::from_minor(51_225));
        assert_eq!(last.actual_payment(), Money::from_minor(51_225));
        assert_eq!(last.additional_over_calculated, Money::ZERO);
        assert_eq!(last.closing_balance, Money::ZERO);
    }

    #[test]
    fn test_repayment_below_interest_warns() {
        let mut params = base_loan();
        params.fixed_repayment = Some(Money::from_major(50));

        let result = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        assert_eq!(result.total_repayments, 2000);
        assert_eq!(result.warning, Some(ScheduleWarning::RepaymentBelowInterest));
        assert_eq!(result.payoff_date, None);
        assert_eq!(result.total_paid, Money::from_major(100_000));
    }

    #[test]
    fn test_period_cap_warns_when_repayment_covers_interest() {
        let engine = AmortizationEngine::new(ScheduleConfig {
            max_periods: 12,
            ..ScheduleConfig::default()
        });

        let result = engine.calculate(&base_loan(), &ScheduleOverrides::default()).unwrap();
        assert_eq!(result.total_repayments, 12);
        assert_eq!(result.warning, Some(ScheduleWarning::ExceededMaxPeriods { max_periods: 12 }));
        assert!(result.final_balance().is_positive());
    }

    #[test]
    fn test_near_calculated_repayment_is_rounding_noise() {
        let mut params = base_loan();
        params.fixed_repayment = Some(Money::from_minor(61_245));

        let result = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        assert_eq!(result.rows[0].calculated_payment, Money::from_minor(61_245));
        assert!(result.rows[0].additional_over_calculated.is_zero());
        assert_eq!(result.total_repayments, 52);
        assert_eq!(result.total_interest, Money::from_minor(179_397));
    }

    #[test]
    fn test_higher_repayment_reports_additional() {
        let mut params = base_loan();
        params.fixed_repayment = Some(Money::from_major(700));

        let result = calculate_schedule(&params, &ScheduleOverrides::default()).unwrap();
        assert_eq!(result.rows[0].calculated_payment, Money::from_minor(61_239));
        assert_eq!(result.rows[0].additional_over_calculated, Money::from_minor(8_761));
        assert_eq!(result.total_repayments, 46);
        assert_eq!(result.total_interest, Money::from_minor(155_868));
    }

    #[test]
    fn test_repayment_change_applies_from_its_date() {
        let overrides = ScheduleOverrides::new()
            .with_repayment_change(RepaymentChange::new(date(2026, 5, 1), Money::from_major(700)));
        let result = calculate_schedule(&base_loan(), &overrides).unwrap();

        let fifth = result.row(5).unwrap();
        assert_eq!(fifth.date, date(2026, 5, 1));
        assert_eq!(fifth.calculated_payment, Money::from_minor(61_239));
        assert_eq!(fifth.additional_over_calculated, Money::from_minor(8_761));

        let sixth = result.row(6).unwrap();
        assert_eq!(sixth.calculated_payment, Money::from_minor(61_042));
        assert_eq!(sixth.additional_over_calculated, Money::from_minor(8_958));

        assert_eq!(result.total_repayments, 46);
        assert_eq!(result.total_interest, Money::from_minor(159_404));
        assert_eq!(result.payoff_date, Some(date(2027, 11, 26)));
    }

    #[test]
    fn test_rate_change_on_boundary_differs_from_interior() {
        let on_boundary = ScheduleOverrides::new()
            .with_rate_change(RateChange::new(date(2026, 4, 3), Rate::from_bps(650)));
        let interior = ScheduleOverrides::new()
            .with_rate_change(RateChange::new(date(2026, 4, 6), Rate::from_bps(650)));

        let boundary_result = calculate_schedule(&base_loan(), &on_boundary).unwrap();
        let interior_result = calculate_schedule(&base_loan(), &interior).unwrap();

        assert_eq!(boundary_result.total_interest, Money::from_minor(203_002));
        assert_eq!(boundary_result.row(3).unwrap().interest_component, Money::from_minor(7_239));
        assert_eq!(boundary_result.row(3).unwrap().rate_in_effect, Rate::from_bps(650));

        assert_eq!(interior_result.total_interest, Money::from_minor(201_840));
        assert_eq!(interior_result.row(3).unwrap().interest_component, Money::from_minor(6_404));
        assert_eq!(interior_result.row(3).unwrap().rate_in_effect, Rate::from_bps(575));
        assert_eq!(interior_result.row(4).unwrap().interest_component, Money::from_minor(6_908));
        assert_eq!(interior_result.row(4).unwrap().rate_in_effect, Rate::from_bps(650));

        assert_ne!(boundary_result.total_interest, interior_result.total_interest);
    }

    #[test]
    fn test_invalid_parameters_are_rejected() {
        let mut params = base_loan();
        params.term = 0;
        assert!(calculate_schedule(&params, &ScheduleOverrides::default()).is_err());
    }
}
