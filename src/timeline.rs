//! "value in effect at a date" lookups over dated override events.
//!
//! Rate changes and repayment overrides share one fold: events are stably
//! sorted by (date, source) and the last event dated at or before the query
//! date wins, falling back to a base value when none applies.

use chrono::NaiveDate;

use crate::decimal::{Money, Rate};
use crate::types::{RateChange, RepaymentChange};

/// origin of a timeline event, ordered by tie-break priority (later wins)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum EventSource {
    RateChange,
    RepaymentChange,
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct TimelineEvent<T> {
    date: NaiveDate,
    source: EventSource,
    value: T,
}

/// sorted list of dated values
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline<T> {
    events: Vec<TimelineEvent<T>>,
}

impl<T: Copy> Timeline<T> {
    /// build from events in input order; equal (date, source) keys keep that order
    pub fn from_events(events: impl IntoIterator<Item = (NaiveDate, EventSource, T)>) -> Self {
        let mut events: Vec<_> = events
            .into_iter()
            .map(|(date, source, value)| TimelineEvent { date, source, value })
            .collect();
        events.sort_by_key(|e| (e.date, e.source));
        Self { events }
    }

    /// value of the latest event dated on or before `date`, else `base`
    pub fn value_at(&self, date: NaiveDate, base: T) -> T {
        self.events
            .iter()
            .take_while(|e| e.date <= date)
            .last()
            .map_or(base, |e| e.value)
    }

    /// distinct event dates strictly inside (after, before)
    pub fn dates_between(&self, after: NaiveDate, before: NaiveDate) -> Vec<NaiveDate> {
        let mut dates: Vec<NaiveDate> = self
            .events
            .iter()
            .map(|e| e.date)
            .filter(|d| *d > after && *d < before)
            .collect();
        dates.dedup();
        dates
    }
}

/// annual rate in effect over time
#[derive(Debug, Clone, PartialEq)]
pub struct RateTimeline {
    base_rate: Rate,
    changes: Timeline<Rate>,
}

impl RateTimeline {
    pub fn new(base_rate: Rate, changes: &[RateChange]) -> Self {
        let changes = Timeline::from_events(
            changes
                .iter()
                .map(|c| (c.effective_date, EventSource::RateChange, c.annual_rate)),
        );
        Self { base_rate, changes }
    }

    pub fn rate_at(&self, date: NaiveDate) -> Rate {
        self.changes.value_at(date, self.base_rate)
    }

    /// rate-change dates strictly inside a period
    pub fn boundaries_within(&self, period_start: NaiveDate, period_end: NaiveDate) -> Vec<NaiveDate> {
        self.changes.dates_between(period_start, period_end)
    }
}

/// rate in effect at `date`
pub fn rate_at(date: NaiveDate, base_rate: Rate, changes: &[RateChange]) -> Rate {
    RateTimeline::new(base_rate, changes).rate_at(date)
}

/// scheduled repayment in effect over time
///
/// Merges `adjusted_repayment` entries of rate changes with standalone
/// repayment changes. On the same date a standalone change beats a rate-change
/// adjustment. A floating loan (no base repayment) ignores every override.
#[derive(Debug, Clone, PartialEq)]
pub struct RepaymentTimeline {
    base_repayment: Option<Money>,
    overrides: Timeline<Money>,
}

impl RepaymentTimeline {
    pub fn new(
        base_repayment: Option<Money>,
        rate_changes: &[RateChange],
        repayment_changes: &[RepaymentChange],
    ) -> Self {
        let embedded = rate_changes.iter().filter_map(|c| {
            c.adjusted_repayment
                .map(|amount| (c.effective_date, EventSource::RateChange, amount))
        });
        let standalone = repayment_changes
            .iter()
            .map(|c| (c.effective_date, EventSource::RepaymentChange, c.amount));

        Self {
            base_repayment,
            overrides: Timeline::from_events(embedded.chain(standalone)),
        }
    }

    pub fn repayment_at(&self, date: NaiveDate) -> Option<Money> {
        self.base_repayment
            .map(|base| self.overrides.value_at(date, base))
    }
}

/// scheduled repayment in effect at `date`
pub fn repayment_at(
    date: NaiveDate,
    base_repayment: Option<Money>,
    rate_changes: &[RateChange],
    repayment_changes: &[RepaymentChange],
) -> Option<Money> {
    RepaymentTimeline::new(base_repayment, rate_changes, repayment_changes).repayment_at(date)
}
