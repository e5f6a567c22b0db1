use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::decimal::{Money, Rate};
use crate::errors::{Result, ScheduleError};

/// longest loan term accepted, in periods
pub const MAX_TERM_PERIODS: u32 = 1200;

/// largest principal accepted
pub const MAX_PRINCIPAL: i64 = 100_000_000;

/// repayment cadence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Weekly,
    Fortnightly,
    Monthly,
}

impl Frequency {
    pub fn periods_per_year(&self) -> u32 {
        match self {
            Frequency::Weekly => 52,
            Frequency::Fortnightly => 26,
            Frequency::Monthly => 12,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Weekly => "weekly",
            Frequency::Fortnightly => "fortnightly",
            Frequency::Monthly => "monthly",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "weekly" => Ok(Frequency::Weekly),
            "fortnightly" => Ok(Frequency::Fortnightly),
            "monthly" => Ok(Frequency::Monthly),
            _ => Err(ScheduleError::InvalidFrequency {
                value: s.to_string(),
            }),
        }
    }
}

/// core loan terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanParameters {
    pub principal: Money,
    pub annual_rate: Rate,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    /// number of periods the calculated payment amortizes over
    pub term: u32,
    /// scheduled repayment; `None` means the calculated payment floats with the balance
    pub fixed_repayment: Option<Money>,
}

impl LoanParameters {
    pub fn builder() -> LoanParametersBuilder {
        LoanParametersBuilder::new()
    }

    pub fn is_floating(&self) -> bool {
        self.fixed_repayment.is_none()
    }

    /// simple interest for one period on the original balance at the original rate
    pub fn interest_only_amount(&self) -> Decimal {
        self.principal.as_decimal() * self.annual_rate.per_period(self.frequency)
    }

    pub fn validate(&self) -> Result<()> {
        if !self.principal.is_positive() || self.principal > Money::from_major(MAX_PRINCIPAL) {
            return Err(ScheduleError::InvalidAmount {
                amount: self.principal,
            });
        }

        if self.annual_rate.as_decimal() < Decimal::ZERO || self.annual_rate.as_decimal() > Decimal::ONE {
            return Err(ScheduleError::InvalidInterestRate {
                rate: self.annual_rate,
            });
        }

        if self.term == 0 || self.term > MAX_TERM_PERIODS {
            return Err(ScheduleError::InvalidConfiguration {
                message: format!("term must be between 1 and {} periods, got {}", MAX_TERM_PERIODS, self.term),
            });
        }

        if let Some(repayment) = self.fixed_repayment {
            if !repayment.is_positive() {
                return Err(ScheduleError::InvalidAmount { amount: repayment });
            }
        }

        Ok(())
    }
}

/// builder for loan parameters
#[derive(Debug, Default)]
pub struct LoanParametersBuilder {
    principal: Option<Money>,
    annual_rate: Option<Rate>,
    frequency: Option<Frequency>,
    start_date: Option<NaiveDate>,
    term: Option<u32>,
    fixed_repayment: Option<Money>,
}

impl LoanParametersBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn principal(mut self, principal: Money) -> Self {
        self.principal = Some(principal);
        self
    }

    pub fn annual_rate(mut self, rate: Rate) -> Self {
        self.annual_rate = Some(rate);
        self
    }

    pub fn frequency(mut self, frequency: Frequency) -> Self {
        self.frequency = Some(frequency);
        self
    }

    pub fn start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    pub fn term(mut self, periods: u32) -> Self {
        self.term = Some(periods);
        self
    }

    pub fn fixed_repayment(mut self, repayment: Money) -> Self {
        self.fixed_repayment = Some(repayment);
        self
    }

    pub fn build(self) -> Result<LoanParameters> {
        let params = LoanParameters {
            principal: self.principal.ok_or_else(|| missing("principal"))?,
            annual_rate: self.annual_rate.ok_or_else(|| missing("annual_rate"))?,
            frequency: self.frequency.ok_or_else(|| missing("frequency"))?,
            start_date: self.start_date.ok_or_else(|| missing("start_date"))?,
            term: self.term.ok_or_else(|| missing("term"))?,
            fixed_repayment: self.fixed_repayment,
        };
        params.validate()?;
        Ok(params)
    }
}

fn missing(field: &str) -> ScheduleError {
    ScheduleError::InvalidConfiguration {
        message: format!("{} is required", field),
    }
}

/// change of annual rate from a date, optionally resetting the scheduled repayment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RateChange {
    pub effective_date: NaiveDate,
    pub annual_rate: Rate,
    #[serde(default)]
    pub adjusted_repayment: Option<Money>,
    #[serde(default)]
    pub note: Option<String>,
}

impl RateChange {
    pub fn new(effective_date: NaiveDate, annual_rate: Rate) -> Self {
        Self {
            effective_date,
            annual_rate,
            adjusted_repayment: None,
            note: None,
        }
    }

    pub fn with_adjusted_repayment(mut self, repayment: Money) -> Self {
        self.adjusted_repayment = Some(repayment);
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }
}

/// standalone change of scheduled repayment from a date
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepaymentChange {
    pub effective_date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub note: Option<String>,
}

impl RepaymentChange {
    pub fn new(effective_date: NaiveDate, amount: Money) -> Self {
        Self {
            effective_date,
            amount,
            note: None,
        }
    }
}

/// ad-hoc principal contribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtraPayment {
    pub payment_date: NaiveDate,
    pub amount: Money,
    #[serde(default)]
    pub note: Option<String>,
}

impl ExtraPayment {
    pub fn new(payment_date: NaiveDate, amount: Money) -> Self {
        Self {
            payment_date,
            amount,
            note: None,
        }
    }
}

/// override collections supplied alongside the loan terms
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleOverrides {
    #[serde(default)]
    pub rate_changes: Vec<RateChange>,
    #[serde(default)]
    pub repayment_changes: Vec<RepaymentChange>,
    #[serde(default)]
    pub extra_payments: Vec<ExtraPayment>,
}

impl ScheduleOverrides {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rate_change(mut self, change: RateChange) -> Self {
        self.rate_changes.push(change);
        self
    }

    pub fn with_repayment_change(mut self, change: RepaymentChange) -> Self {
        self.repayment_changes.push(change);
        self
    }

    pub fn with_extra_payment(mut self, extra: ExtraPayment) -> Self {
        self.extra_payments.push(extra);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.rate_changes.is_empty() && self.repayment_changes.is_empty() && self.extra_payments.is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        for change in &self.rate_changes {
            let rate = change.annual_rate.as_decimal();
            if rate < Decimal::ZERO || rate > Decimal::ONE {
                return Err(ScheduleError::InvalidInterestRate {
                    rate: change.annual_rate,
                });
            }
            if let Some(repayment) = change.adjusted_repayment {
                if !repayment.is_positive() {
                    return Err(ScheduleError::InvalidAmount { amount: repayment });
                }
            }
        }

        let amounts = self
            .repayment_changes
            .iter()
            .map(|c| c.amount)
            .chain(self.extra_payments.iter().map(|e| e.amount));
        for amount in amounts {
            if !amount.is_positive() {
                return Err(ScheduleError::InvalidAmount { amount });
            }
        }

        Ok(())
    }
}
