//! Age in completed months.

use chrono::{Datelike, NaiveDate};

/// Whole months elapsed between `birth_date` and `measurement_date`.
///
/// The raw difference in calendar months is decremented by one when the measurement's
/// day-of-month is earlier than the birth day-of-month (the month is not yet complete). A
/// measurement dated before the birth date yields 0.
pub fn age_in_months(birth_date: NaiveDate, measurement_date: NaiveDate) -> u32 {
    let mut months = (measurement_date.year() - birth_date.year()) * 12
        + (measurement_date.month() as i32 - birth_date.month() as i32);

    if measurement_date.day() < birth_date.day() {
        months -= 1;
    }

    months.max(0) as u32
}
