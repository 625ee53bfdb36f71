//! Football season arithmetic.
//!
//! European leagues roll over in July: a date in March 2025 belongs to the 2024 season,
//! a date in August 2025 to the 2025 season.

use std::fmt;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use time::{Date, Month, OffsetDateTime};

use crate::util::timezone::localized_date;

const ROLLOVER_MONTH: Month = Month::July;

/// A football season, named after the calendar year it starts in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Season(i32);

impl Season {
    pub const fn new(year: i32) -> Self {
        Self(year)
    }

    pub const fn year(self) -> i32 {
        self.0
    }

    /// The season a calendar date falls into.
    pub fn containing(date: Date) -> Self {
        if u8::from(date.month()) >= u8::from(ROLLOVER_MONTH) {
            Self(date.year())
        } else {
            Self(date.year() - 1)
        }
    }

    /// The season that is in progress at `now`, judged on the local calendar date in `tz`.
    pub fn current_at(now: OffsetDateTime, tz: Tz) -> Self {
        Self::containing(localized_date(now, tz))
    }

    /// Past seasons are closed: their results, tables and transfer windows no longer change.
    pub fn is_closed_at(self, now: OffsetDateTime, tz: Tz) -> bool {
        self < Self::current_at(now, tz)
    }
}

impl fmt::Display for Season {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Season {
    fn from(year: i32) -> Self {
        Self(year)
    }
}

#[cfg(test)]
mod tests {
    use time::macros::{date, datetime};

    use super::*;

    #[test]
    fn spring_dates_belong_to_previous_season() {
        assert_eq!(Season::containing(date!(2025 - 03 - 01)), Season::new(2024));
        assert_eq!(Season::containing(date!(2025 - 06 - 30)), Season::new(2024));
    }

    #[test]
    fn july_starts_a_new_season() {
        assert_eq!(Season::containing(date!(2025 - 07 - 01)), Season::new(2025));
        assert_eq!(Season::containing(date!(2025 - 08 - 01)), Season::new(2025));
        assert_eq!(Season::containing(date!(2025 - 12 - 31)), Season::new(2025));
    }

    #[test]
    fn current_season_uses_local_calendar_date() {
        // 20:00 UTC on June 30th is already July 1st in Seoul.
        let now = datetime!(2025-06-30 20:00 UTC);
        assert_eq!(Season::current_at(now, Tz::UTC), Season::new(2024));
        assert_eq!(Season::current_at(now, Tz::Asia__Seoul), Season::new(2025));
    }

    #[test]
    fn closed_seasons_are_strictly_older() {
        let now = datetime!(2025-03-01 12:00 UTC);
        assert!(Season::new(2023).is_closed_at(now, Tz::UTC));
        assert!(!Season::new(2024).is_closed_at(now, Tz::UTC));
        assert!(!Season::new(2025).is_closed_at(now, Tz::UTC));
    }
}
