pub mod calendar;
pub mod config;
pub mod decimal;
pub mod errors;
pub mod interest;
pub mod ledger;
pub mod schedule;
pub mod serialization;
pub mod timeline;
pub mod types;

// re-export key types
pub use calendar::{add_period, parse_date, periods_per_year, PeriodCalendar};
pub use config::{LoanDocument, LoanInput, ScheduleConfig, WhatIf};
pub use decimal::{Money, Rate};
pub use errors::{Result, ScheduleError};
pub use interest::{compute_period_interest, DayCountConvention, PeriodInterest, PeriodInterestCalculator};
pub use ledger::ExtraPaymentLedger;
pub use schedule::{
    calculate_schedule, level_payment, preview_rate_change, AmortizationEngine, NextPayment,
    PayoffAdjustment, PayoffOutcome, PayoffSolution, PreviewOptionKind, RateChangeOption,
    RateChangePreview, ScheduleProgress, ScheduleResult, ScheduleRow, ScheduleWarning,
    TargetPayoffSolver,
};
pub use serialization::ScheduleView;
pub use timeline::{rate_at, repayment_at, RateTimeline, RepaymentTimeline};
pub use types::{
    ExtraPayment, Frequency, LoanParameters, RateChange, RepaymentChange, ScheduleOverrides,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
