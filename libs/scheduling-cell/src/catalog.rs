use chrono::{Duration, NaiveTime};

/// The fixed universe of bookable slot start times. Every availability row
/// and every appointment time refers to one of these values; times outside
/// the catalog are rejected at booking and availability writes.
///
/// The catalog is a value type so callers can run alternate grids (shorter
/// clinic days in tests, different step sizes per deployment).
#[derive(Debug, Clone, PartialEq)]
pub struct SlotCatalog {
    slots: Vec<NaiveTime>,
}

const STEP_MINUTES: i64 = 30;

impl SlotCatalog {
    /// Standard clinic day: 09:00-11:30 and 13:00-15:30 at 30 minute steps.
    pub fn standard() -> Self {
        let morning = (
            NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(12, 0, 0).unwrap(),
        );
        let afternoon = (
            NaiveTime::from_hms_opt(13, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(16, 0, 0).unwrap(),
        );
        Self::from_windows(&[morning, afternoon], Duration::minutes(STEP_MINUTES))
    }

    /// Build a catalog from half-open `[start, end)` windows stepped every
    /// `step`. Overlapping windows are merged by the sort/dedup.
    pub fn from_windows(windows: &[(NaiveTime, NaiveTime)], step: Duration) -> Self {
        let mut slots = Vec::new();
        for (start, end) in windows {
            let mut current = *start;
            while current < *end {
                slots.push(current);
                current += step;
            }
        }
        Self::from_times(slots)
    }

    pub fn from_times(mut times: Vec<NaiveTime>) -> Self {
        times.sort();
        times.dedup();
        Self { slots: times }
    }

    /// Ascending slot start times.
    pub fn slots(&self) -> &[NaiveTime] {
        &self.slots
    }

    pub fn contains(&self, time: NaiveTime) -> bool {
        self.slots.binary_search(&time).is_ok()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

impl Default for SlotCatalog {
    fn default() -> Self {
        Self::standard()
    }
}
