//! Calendar month helpers shared by budgets, reports and the dashboard.
//!
//! A month is represented as the [Date] of its first day.

use time::{Date, Month};

use crate::Error;

/// The first day of the month containing `date`.
pub fn start_of_month(date: Date) -> Date {
    date.replace_day(1)
        .expect("every month has a first day")
}

/// The last day of the month containing `date`.
pub fn end_of_month(date: Date) -> Date {
    let start = start_of_month(date);
    let days = start.month().length(start.year());

    start
        .replace_day(days)
        .expect("month length is always a valid day")
}

/// The first day of the month after the one containing `date`.
///
/// Returns `None` for the last month [Date] can represent.
pub fn next_month(date: Date) -> Option<Date> {
    end_of_month(date).next_day()
}

/// The first day of the month before the one containing `date`.
///
/// Returns `None` for the first month [Date] can represent.
pub fn previous_month(date: Date) -> Option<Date> {
    start_of_month(date).previous_day().map(start_of_month)
}

/// Parse a month string of the form "2025-03".
///
/// # Errors
///
/// Returns [Error::InvalidMonth] if the string is not a year and month separated by a dash.
pub fn parse_month(raw: &str) -> Result<Date, Error> {
    let invalid = || Error::InvalidMonth(raw.to_owned());

    let (year, month) = raw.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u8 = month.parse().map_err(|_| invalid())?;
    let month = Month::try_from(month).map_err(|_| invalid())?;

    Date::from_calendar_date(year, month, 1).map_err(|_| invalid())
}

/// Format a month as "2025-03", the inverse of [parse_month].
pub fn format_month_query(month: Date) -> String {
    format!("{:04}-{:02}", month.year(), month.month() as u8)
}

/// Format a month for display, e.g. "Mar 2025".
pub fn format_month_label(month: Date) -> String {
    format!("{} {}", short_month_name(month.month()), month.year())
}

pub fn short_month_name(month: Month) -> &'static str {
    match month {
        Month::January => "Jan",
        Month::February => "Feb",
        Month::March => "Mar",
        Month::April => "Apr",
        Month::May => "May",
        Month::June => "Jun",
        Month::July => "Jul",
        Month::August => "Aug",
        Month::September => "Sep",
        Month::October => "Oct",
        Month::November => "Nov",
        Month::December => "Dec",
    }
}

/// Every month that overlaps the inclusive range `from..=to`, in chronological order.
///
/// Returns an empty vector if `from` is after `to`.
pub fn months_in_range(from: Date, to: Date) -> Vec<Date> {
    let mut months = Vec::new();

    if from > to {
        return months;
    }

    let last = start_of_month(to);
    let mut month = start_of_month(from);

    while month <= last {
        months.push(month);
        month = match next_month(month) {
            Some(next) => next,
            None => break,
        };
    }

    months
}

#[cfg(test)]
mod tests {
    use time::{Date, macros::date};

    use crate::{Error, month::*};

    #[test]
    fn end_of_month_handles_leap_years() {
        assert_eq!(end_of_month(date!(2024 - 02 - 10)), date!(2024 - 02 - 29));
        assert_eq!(end_of_month(date!(2025 - 02 - 10)), date!(2025 - 02 - 28));
        assert_eq!(end_of_month(date!(2025 - 12 - 31)), date!(2025 - 12 - 31));
    }

    #[test]
    fn next_and_previous_month_cross_years() {
        assert_eq!(next_month(date!(2024 - 12 - 15)), Some(date!(2025 - 01 - 01)));
        assert_eq!(previous_month(date!(2025 - 01 - 31)), Some(date!(2024 - 12 - 01)));
    }

    #[test]
    fn no_month_beyond_the_calendar_edges() {
        assert_eq!(next_month(Date::MAX), None);
        assert_eq!(next_month(date!(9999 - 12 - 01)), None);
        assert_eq!(previous_month(Date::MIN), None);
        assert_eq!(
            previous_month(start_of_month(Date::MIN).next_day().unwrap()),
            None
        );
    }

    #[test]
    fn months_in_range_stops_at_last_month() {
        let months = months_in_range(date!(9999 - 11 - 01), date!(9999 - 12 - 31));

        assert_eq!(months, vec![date!(9999 - 11 - 01), date!(9999 - 12 - 01)]);
    }

    #[test]
    fn parse_month_round_trips_with_format() {
        let month = parse_month("2025-03").unwrap();

        assert_eq!(month, date!(2025 - 03 - 01));
        assert_eq!(format_month_query(month), "2025-03");
    }

    #[test]
    fn parse_month_rejects_garbage() {
        for raw in ["", "2025", "2025-13", "2025-00", "March 2025", "2025-3-1"] {
            assert_eq!(
                parse_month(raw),
                Err(Error::InvalidMonth(raw.to_owned())),
                "expected {raw:?} to be rejected"
            );
        }
    }

    #[test]
    fn months_in_range_includes_partial_months() {
        let months = months_in_range(date!(2024 - 11 - 20), date!(2025 - 02 - 03));

        assert_eq!(
            months,
            vec![
                date!(2024 - 11 - 01),
                date!(2024 - 12 - 01),
                date!(2025 - 01 - 01),
                date!(2025 - 02 - 01),
            ]
        );
    }

    #[test]
    fn months_in_range_is_empty_for_reversed_range() {
        assert!(months_in_range(date!(2025 - 02 - 01), date!(2025 - 01 - 01)).is_empty());
    }

    #[test]
    fn month_label_uses_short_name() {
        assert_eq!(format_month_label(date!(2025 - 09 - 01)), "Sep 2025");
    }
}
