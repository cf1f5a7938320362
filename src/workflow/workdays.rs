use chrono::{Datelike, Duration, NaiveDate, Weekday};
use derive_more::Display;

/// End date precedes start date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[display(fmt = "end date {} is before start date {}", end, start)]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl std::error::Error for InvalidRange {}

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Working days in the inclusive range, Saturdays and Sundays excluded.
pub fn business_days_between(start: NaiveDate, end: NaiveDate) -> Result<u32, InvalidRange> {
    working_days_between(start, end, &[])
}

/// Like [`business_days_between`] but also skipping the given holiday dates.
pub fn working_days_between(
    start: NaiveDate,
    end: NaiveDate,
    holidays: &[NaiveDate],
) -> Result<u32, InvalidRange> {
    if end < start {
        return Err(InvalidRange { start, end });
    }

    let mut days = 0u32;
    let mut current = start;
    while current <= end {
        if !is_weekend(current) && !holidays.contains(&current) {
            days += 1;
        }
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }
    Ok(days)
}

/// National public holidays for a year, weekend occurrences observed on the
/// following Monday. Sorted and deduplicated.
pub fn public_holidays(year: i32) -> Vec<NaiveDate> {
    let easter = easter_sunday(year);

    let mut holidays = vec![
        ymd(year, 1, 1),   // New Year's Day
        ymd(year, 5, 1),   // Labour Day
        ymd(year, 6, 1),   // Madaraka Day
        ymd(year, 10, 20), // Mashujaa Day
        ymd(year, 12, 12), // Jamhuri Day
        ymd(year, 12, 25), // Christmas Day
        ymd(year, 12, 26), // Boxing Day
        easter - Duration::days(2), // Good Friday
        easter + Duration::days(1), // Easter Monday
    ];

    for holiday in &mut holidays {
        *holiday = match holiday.weekday() {
            Weekday::Sat => *holiday + Duration::days(2),
            Weekday::Sun => *holiday + Duration::days(1),
            _ => *holiday,
        };
    }

    holidays.sort();
    holidays.dedup();
    holidays
}

// Meeus/Jones/Butcher Gregorian computus.
fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    ymd(year, month as u32, day as u32)
}

fn ymd(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_week_counts_five_working_days() {
        // 2024-01-01 is a Monday, 2024-01-07 a Sunday.
        let start = ymd(2024, 1, 1);
        let end = ymd(2024, 1, 7);
        assert_eq!(business_days_between(start, end), Ok(5));
    }

    #[test]
    fn single_day_depends_on_weekday() {
        let saturday = ymd(2024, 1, 6);
        let monday = ymd(2024, 1, 8);
        assert_eq!(business_days_between(saturday, saturday), Ok(0));
        assert_eq!(business_days_between(monday, monday), Ok(1));
    }

    #[test]
    fn spans_year_boundary() {
        // Fri 2024-12-27 .. Fri 2025-01-03: 27, 30, 31, 1, 2, 3.
        let start = ymd(2024, 12, 27);
        let end = ymd(2025, 1, 3);
        assert_eq!(business_days_between(start, end), Ok(6));
    }

    #[test]
    fn rejects_inverted_range() {
        let start = ymd(2024, 1, 8);
        let end = ymd(2024, 1, 1);
        assert_eq!(
            business_days_between(start, end),
            Err(InvalidRange { start, end })
        );
    }

    #[test]
    fn holidays_are_skipped() {
        // Wed 2025-12-24 .. Mon 2025-12-29 with Christmas and Boxing Day:
        // working days are 24 and 29 only.
        let holidays = public_holidays(2025);
        let days = working_days_between(ymd(2025, 12, 24), ymd(2025, 12, 29), &holidays);
        assert_eq!(days, Ok(2));
    }

    #[test]
    fn easter_matches_known_years() {
        assert_eq!(easter_sunday(2024), ymd(2024, 3, 31));
        assert_eq!(easter_sunday(2025), ymd(2025, 4, 20));
        assert_eq!(easter_sunday(2026), ymd(2026, 4, 5));
    }

    #[test]
    fn weekend_holidays_observed_on_monday() {
        // 2027-12-25 and 2027-12-26 fall on Sat/Sun; both observe Mon 27th
        // and the list deduplicates.
        let holidays = public_holidays(2027);
        assert!(holidays.contains(&ymd(2027, 12, 27)));
        assert!(!holidays.contains(&ymd(2027, 12, 25)));
        let mut deduped = holidays.clone();
        deduped.dedup();
        assert_eq!(holidays, deduped);
    }
}
