use crate::error::Rejection;
use chrono::NaiveDate;

/// Monthly rent is prorated over a flat 30-day month
pub const DAYS_PER_MONTH: f64 = 30.0;

/// Price of a stay
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub days: i64,
    pub daily_rate: f64,
    /// `daily_rate * days`, unrounded
    pub total_amount: f64,
}

/// Prorate `monthly_price` over the nights between two calendar dates.
///
/// Dates carry no time component, so the day count is exact. A same-day
/// range is zero days and costs nothing.
pub fn quote(monthly_price: i64, start: NaiveDate, end: NaiveDate) -> Result<Quote, Rejection> {
    if end < start {
        return Err(Rejection::InvalidDateRange { start, end });
    }

    let days = (end - start).num_days();
    let daily_rate = monthly_price as f64 / DAYS_PER_MONTH;

    Ok(Quote {
        days,
        daily_rate,
        total_amount: daily_rate * days as f64,
    })
}
