use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::calendar::parse_date;
use crate::decimal::{Money, Rate};
use crate::errors::Result;
use crate::types::{
    ExtraPayment, Frequency, LoanParameters, RateChange, RepaymentChange, ScheduleOverrides,
};

/// policy constants of the schedule engine and payoff solver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// periods computed before giving up on payoff
    pub max_periods: u32,
    /// balances below this are treated as paid off
    pub zero_threshold: Money,
    /// scheduled-vs-calculated payment differences below this are reported as zero
    pub rounding_noise_band: Money,
    /// bisection steps the payoff solver may take
    pub max_search_steps: u32,
    /// amount the solver moves a bound past a tried midpoint
    pub search_guard_band: Money,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            max_periods: 2000,
            zero_threshold: Money::CENT,
            rounding_noise_band: Money::from_minor(10),
            max_search_steps: 100,
            search_guard_band: Money::CENT,
        }
    }
}

/// loan terms plus their override collections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanInput {
    pub parameters: LoanParameters,
    #[serde(default)]
    pub overrides: ScheduleOverrides,
}

impl LoanInput {
    pub fn new(parameters: LoanParameters, overrides: ScheduleOverrides) -> Self {
        Self {
            parameters,
            overrides,
        }
    }

    /// parse and validate a loan document
    pub fn from_json(json: &str) -> Result<Self> {
        LoanDocument::from_json(json)?.into_input()
    }

    /// input with the what-if substitutions applied
    ///
    /// Substituted rate changes carry only their date and rate; any adjusted
    /// repayment on them is dropped.
    pub fn with_what_if(&self, what_if: &WhatIf) -> Self {
        let mut input = self.clone();
        if let Some(repayment) = what_if.fixed_repayment {
            input.parameters.fixed_repayment = Some(repayment);
        }
        if let Some(rate_changes) = &what_if.rate_changes {
            input.overrides.rate_changes = rate_changes
                .iter()
                .map(|change| RateChange {
                    adjusted_repayment: None,
                    ..change.clone()
                })
                .collect();
        }
        if let Some(extra_payments) = &what_if.extra_payments {
            input.overrides.extra_payments = extra_payments.clone();
        }
        input
    }
}

/// hypothetical substitutions previewed without touching the stored loan
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WhatIf {
    #[serde(default)]
    pub fixed_repayment: Option<Money>,
    #[serde(default)]
    pub rate_changes: Option<Vec<RateChange>>,
    #[serde(default)]
    pub extra_payments: Option<Vec<ExtraPayment>>,
}

/// loan record as stored by the surrounding application (dates and frequency as text)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDocument {
    pub principal: Decimal,
    pub annual_rate: Decimal,
    pub frequency: String,
    pub start_date: String,
    pub loan_term: u32,
    #[serde(default)]
    pub fixed_repayment: Option<Decimal>,
    #[serde(default)]
    pub rate_changes: Vec<RateChangeRecord>,
    #[serde(default)]
    pub repayment_changes: Vec<RepaymentChangeRecord>,
    #[serde(default)]
    pub extra_repayments: Vec<ExtraRepaymentRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateChangeRecord {
    pub effective_date: String,
    pub annual_rate: Decimal,
    #[serde(default)]
    pub adjusted_repayment: Option<Decimal>,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentChangeRecord {
    pub effective_date: String,
    pub amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtraRepaymentRecord {
    pub payment_date: String,
    pub amount: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

impl LoanDocument {
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_pretty(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// typed, validated loan input
    pub fn into_input(self) -> Result<LoanInput> {
        let frequency: Frequency = self.frequency.parse()?;

        let mut builder = LoanParameters::builder()
            .principal(Money::from_decimal(self.principal))
            .annual_rate(Rate::from_decimal(self.annual_rate))
            .frequency(frequency)
            .start_date(parse_date(&self.start_date)?)
            .term(self.loan_term);
        if let Some(repayment) = self.fixed_repayment {
            builder = builder.fixed_repayment(Money::from_decimal(repayment));
        }
        let parameters = builder.build()?;

        let rate_changes = self
            .rate_changes
            .into_iter()
            .map(|r| -> Result<RateChange> {
                Ok(RateChange {
                    effective_date: parse_date(&r.effective_date)?,
                    annual_rate: Rate::from_decimal(r.annual_rate),
                    adjusted_repayment: r.adjusted_repayment.map(Money::from_decimal),
                    note: r.note,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let repayment_changes = self
            .repayment_changes
            .into_iter()
            .map(|r| -> Result<RepaymentChange> {
                Ok(RepaymentChange {
                    effective_date: parse_date(&r.effective_date)?,
                    amount: Money::from_decimal(r.amount),
                    note: r.note,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let extra_payments = self
            .extra_repayments
            .into_iter()
            .map(|r| -> Result<ExtraPayment> {
                Ok(ExtraPayment {
                    payment_date: parse_date(&r.payment_date)?,
                    amount: Money::from_decimal(r.amount),
                    note: r.note,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let overrides = ScheduleOverrides {
            rate_changes,
            repayment_changes,
            extra_payments,
        };
        overrides.validate()?;

        Ok(LoanInput {
            parameters,
            overrides,
        })
    }
}
