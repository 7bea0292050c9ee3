//! Pure functions for net profit and the daily and monthly report figures.
//!
//! None of these functions read the clock. The reference day or month and the
//! local timezone are always passed in by the caller.

use time::{Date, Month};
use time_tz::{OffsetDateTimeExt, Tz};

use crate::transaction::Transaction;

/// The figures entered on the finance form.
///
/// Missing figures are zero.
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct NetProfitInputs {
    /// Money earned.
    pub income: f64,
    /// Interest earned.
    pub interest: f64,
    /// Money lost.
    pub loss: f64,
    /// Money lent out.
    pub loaner: f64,
}

/// `income + interest - loss - loaner`.
pub fn net_profit(inputs: NetProfitInputs) -> f64 {
    inputs.income + inputs.interest - inputs.loss - inputs.loaner
}

/// A month of a particular year.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalendarMonth {
    /// The year, e.g. 2025.
    pub year: i32,
    /// The month of `year`.
    pub month: Month,
}

impl CalendarMonth {
    /// The month that `date` falls in.
    pub fn containing(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Whether `date` falls in this month.
    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// The date of `transaction` in `timezone`, using the UTC offset in effect at
/// the time of the transaction.
fn local_date(transaction: &Transaction, timezone: &Tz) -> Date {
    transaction.transaction_date.to_timezone(timezone).date()
}

/// The amounts of the transactions that happened on `day`, in the order given.
///
/// Dates are compared in `timezone`.
pub fn daily_totals(transactions: &[Transaction], day: Date, timezone: &Tz) -> Vec<f64> {
    transactions
        .iter()
        .filter(|transaction| local_date(transaction, timezone) == day)
        .map(|transaction| transaction.amount)
        .collect()
}

/// The mean amount of the transactions that happened in `month`, or zero if there are none.
///
/// Dates are compared in `timezone`.
pub fn monthly_average(transactions: &[Transaction], month: CalendarMonth, timezone: &Tz) -> f64 {
    let (sum, count) = transactions
        .iter()
        .filter(|transaction| month.contains(local_date(transaction, timezone)))
        .fold((0.0, 0_usize), |(sum, count), transaction| {
            (sum + transaction.amount, count + 1)
        });

    if count == 0 { 0.0 } else { sum / count as f64 }
}
