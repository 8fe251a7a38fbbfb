use chrono::{Datelike, Duration, NaiveDate};

use crate::models::SchedulingError;

/// Expands a recurring weekly pattern into concrete dates. Pure date
/// arithmetic; persistence of the resulting slots is the engine's job.
#[derive(Debug, Clone, Default)]
pub struct AvailabilityExpander;

impl AvailabilityExpander {
    /// Every date in `[start, until]` (inclusive on both ends) whose weekday
    /// appears in `weekdays`, in ascending order. Weekdays are numbered
    /// 0 = Monday through 6 = Sunday. `start` itself is included when its
    /// weekday matches.
    pub fn expand(
        &self,
        start: NaiveDate,
        until: NaiveDate,
        weekdays: &[u8],
    ) -> Result<Vec<NaiveDate>, SchedulingError> {
        if until < start {
            return Err(SchedulingError::InvalidRange(format!(
                "until date {} is before start date {}",
                until, start
            )));
        }
        if weekdays.is_empty() {
            return Err(SchedulingError::InvalidWeekdaySet(
                "weekday set is empty".to_string(),
            ));
        }
        if let Some(bad) = weekdays.iter().find(|day| **day > 6) {
            return Err(SchedulingError::InvalidWeekdaySet(format!(
                "weekday {} is out of range (0 = Monday through 6 = Sunday)",
                bad
            )));
        }

        let mut dates = Vec::new();
        let mut current = start;
        while current <= until {
            let day = current.weekday().num_days_from_monday() as u8;
            if weekdays.contains(&day) {
                dates.push(current);
            }
            current += Duration::days(1);
        }
        Ok(dates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_expands_mondays_and_wednesdays_over_two_weeks() {
        let expander = AvailabilityExpander;
        // 2025-01-06 is a Monday.
        let dates = expander
            .expand(d(2025, 1, 6), d(2025, 1, 20), &[0, 2])
            .unwrap();
        assert_eq!(
            dates,
            vec![
                d(2025, 1, 6),
                d(2025, 1, 8),
                d(2025, 1, 13),
                d(2025, 1, 15),
                d(2025, 1, 20),
            ]
        );
    }

    #[test]
    fn test_includes_start_only_when_weekday_matches() {
        let expander = AvailabilityExpander;
        // Tuesdays only, starting on a Monday.
        let dates = expander
            .expand(d(2025, 1, 6), d(2025, 1, 14), &[1])
            .unwrap();
        assert_eq!(dates, vec![d(2025, 1, 7), d(2025, 1, 14)]);
    }

    #[test]
    fn test_single_day_range_is_legal() {
        let expander = AvailabilityExpander;
        let dates = expander.expand(d(2025, 1, 6), d(2025, 1, 6), &[0]).unwrap();
        assert_eq!(dates, vec![d(2025, 1, 6)]);

        let none = expander.expand(d(2025, 1, 6), d(2025, 1, 6), &[5]).unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_rejects_inverted_range() {
        let expander = AvailabilityExpander;
        let result = expander.expand(d(2025, 1, 20), d(2025, 1, 6), &[0]);
        assert_matches!(result, Err(SchedulingError::InvalidRange(_)));
    }

    #[test]
    fn test_rejects_empty_weekday_set() {
        let expander = AvailabilityExpander;
        let result = expander.expand(d(2025, 1, 6), d(2025, 1, 20), &[]);
        assert_matches!(result, Err(SchedulingError::InvalidWeekdaySet(_)));
    }

    #[test]
    fn test_rejects_out_of_range_weekday() {
        let expander = AvailabilityExpander;
        let result = expander.expand(d(2025, 1, 6), d(2025, 1, 20), &[0, 7]);
        assert_matches!(result, Err(SchedulingError::InvalidWeekdaySet(_)));
    }

    #[test]
    fn test_duplicate_weekdays_do_not_duplicate_dates() {
        let expander = AvailabilityExpander;
        let dates = expander
            .expand(d(2025, 1, 6), d(2025, 1, 12), &[0, 0])
            .unwrap();
        assert_eq!(dates, vec![d(2025, 1, 6)]);
    }
}
