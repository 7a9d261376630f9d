//! Semester assignment: turning dated outcomes into per-student term indices.

use chrono::{Datelike, NaiveDate};

/// Running term counter for a single student's chronologically sorted
/// outcomes.
///
/// A new term opens when an outcome falls in a later calendar year than the
/// last opening, or lands after the separator month, provided its month
/// differs from the month that opened the current term. Outcomes sharing a
/// month always share a term. The first outcome always opens term 1.
///
/// # Example
///
/// ```
/// use chrono::NaiveDate;
/// use student_pathway_rs::sequence::SemesterClock;
///
/// let mut clock = SemesterClock::new(8);
/// let d = |y, m| NaiveDate::from_ymd_opt(y, m, 28).unwrap();
///
/// assert_eq!(clock.advance(d(2019, 6)), 1);
/// assert_eq!(clock.advance(d(2019, 6)), 1);
/// assert_eq!(clock.advance(d(2019, 11)), 2);
/// assert_eq!(clock.advance(d(2020, 6)), 3);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SemesterClock {
    separator_month: u32,
    current_year: Option<i32>,
    last_month: Option<u32>,
    term: u32,
}

impl SemesterClock {
    /// Create a clock that treats months after `separator_month` as the
    /// second semester.
    #[must_use]
    pub const fn new(separator_month: u32) -> Self {
        Self {
            separator_month,
            current_year: None,
            last_month: None,
            term: 0,
        }
    }

    /// Feed the next outcome date and return its term index.
    ///
    /// Dates must arrive in ascending order.
    pub fn advance(&mut self, date: NaiveDate) -> u32 {
        let year = date.year();
        let month = date.month();
        let new_year = self.current_year.map_or(true, |current| year > current);

        if new_year || month > self.separator_month {
            if self.last_month != Some(month) {
                self.term += 1;
                self.last_month = Some(month);
            }
            self.current_year = Some(year);
        }
        self.term
    }

    /// Term index of the most recent outcome (0 before any outcome).
    #[must_use]
    pub const fn term(&self) -> u32 {
        self.term
    }
}

/// Assign term indices to a chronologically sorted run of outcome dates.
#[must_use]
pub fn assign_terms(dates: &[NaiveDate], separator_month: u32) -> Vec<u32> {
    let mut clock = SemesterClock::new(separator_month);
    dates.iter().map(|&date| clock.advance(date)).collect()
}
