//! Occurrence calculator.
//!
//! Pure date arithmetic: given a [`Schedule`], a watermark and an upper bound,
//! produce the ordered dates on which the schedule fires. Nothing here touches
//! the store or the clock, so the same inputs always yield the same sequence.
//!
//! Bounds are half-open on the watermark side: the search starts at
//! `start_date` when there is no watermark and at the day after it otherwise,
//! and stops at `min(until, end_date)` inclusive.

use chrono::{Datelike, Days, NaiveDate};

use crate::{Cadence, Schedule};

/// Dates on which `schedule` fires in `(after, until]`, also bounded by the
/// schedule's own `[start_date, end_date]`.
pub fn occurrences(schedule: &Schedule, after: Option<NaiveDate>, until: NaiveDate) -> Occurrences {
    let search_start = match after.and_then(|date| date.succ_opt()) {
        Some(next) => next.max(schedule.start_date),
        // A watermark on the last representable day leaves nothing to search.
        None if after.is_some() => return Occurrences::exhausted(),
        None => schedule.start_date,
    };
    let upper = schedule.end_date.map_or(until, |end| end.min(until));

    let cursor = match schedule.cadence {
        Cadence::Weekly { weekday } | Cadence::Biweekly { weekday } => {
            let period = if matches!(schedule.cadence, Cadence::Weekly { .. }) {
                7
            } else {
                14
            };
            // Phase comes from the rule's own first occurrence so that moving
            // the search start never shifts a biweekly cadence.
            let offset = (7 + i64::from(weekday.num_days_from_monday())
                - i64::from(schedule.start_date.weekday().num_days_from_monday()))
                % 7;
            let first = add_days(schedule.start_date, offset)
                .and_then(|anchor| first_on_or_after(anchor, search_start, period));
            match first {
                Some(next) => Cursor::Days { next, period },
                None => return Occurrences::exhausted(),
            }
        }
        Cadence::Monthly { day } => Cursor::Months {
            year: search_start.year(),
            month: search_start.month(),
            day,
        },
        Cadence::Yearly { month, day } => Cursor::Years {
            year: search_start.year(),
            month,
            day,
        },
    };

    Occurrences {
        cursor: Some(cursor),
        lower: search_start,
        upper,
    }
}

/// Ordered, finite iterator over occurrence dates.
///
/// Cloning yields an independent iterator positioned at the same date.
#[derive(Clone, Debug)]
pub struct Occurrences {
    cursor: Option<Cursor>,
    lower: NaiveDate,
    upper: NaiveDate,
}

#[derive(Clone, Copy, Debug)]
enum Cursor {
    Days { next: NaiveDate, period: i64 },
    Months { year: i32, month: u32, day: u32 },
    Years { year: i32, month: u32, day: u32 },
}

impl Occurrences {
    fn exhausted() -> Self {
        Self {
            cursor: None,
            lower: NaiveDate::MIN,
            upper: NaiveDate::MIN,
        }
    }

    /// Yield the cursor's current date and move it one period forward.
    fn step(cursor: &mut Cursor) -> Option<NaiveDate> {
        match cursor {
            Cursor::Days { next, period } => {
                let current = *next;
                *next = add_days(current, *period)?;
                Some(current)
            }
            Cursor::Months { year, month, day } => {
                let current = clamped_date(*year, *month, *day)?;
                if *month == 12 {
                    *year = year.checked_add(1)?;
                    *month = 1;
                } else {
                    *month += 1;
                }
                Some(current)
            }
            Cursor::Years { year, month, day } => {
                let current = clamped_date(*year, *month, *day)?;
                *year = year.checked_add(1)?;
                Some(current)
            }
        }
    }
}

impl Iterator for Occurrences {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let cursor = self.cursor.as_mut()?;
            let Some(date) = Self::step(cursor) else {
                self.cursor = None;
                return None;
            };
            if date > self.upper {
                self.cursor = None;
                return None;
            }
            // Only the first month/year of a search can fall before its start.
            if date >= self.lower {
                return Some(date);
            }
        }
    }
}

impl std::iter::FusedIterator for Occurrences {}

fn add_days(date: NaiveDate, days: i64) -> Option<NaiveDate> {
    date.checked_add_days(Days::new(u64::try_from(days).ok()?))
}

/// First date of the `anchor + k * period` series that is on or after `from`.
fn first_on_or_after(anchor: NaiveDate, from: NaiveDate, period: i64) -> Option<NaiveDate> {
    if from <= anchor {
        return Some(anchor);
    }
    let behind = (from - anchor).num_days();
    let periods = (behind + period - 1) / period;
    add_days(anchor, periods.checked_mul(period)?)
}

/// Last day of `month` in `year` (28..=31).
pub(crate) fn days_in_month(year: i32, month: u32) -> Option<u32> {
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    NaiveDate::from_ymd_opt(next_year, next_month, 1)?
        .pred_opt()
        .map(|last| last.day())
}

/// `day` of the given month, reduced to the month's last day when the month is
/// shorter. Each month is clamped on its own: nothing carries over.
pub(crate) fn clamped_date(year: i32, month: u32, day: u32) -> Option<NaiveDate> {
    let last = days_in_month(year, month)?;
    NaiveDate::from_ymd_opt(year, month, day.min(last))
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn schedule(cadence: Cadence, start: NaiveDate, end: Option<NaiveDate>) -> Schedule {
        Schedule::new(cadence, start, end).unwrap()
    }

    fn collect(schedule: &Schedule, after: Option<NaiveDate>, until: NaiveDate) -> Vec<NaiveDate> {
        occurrences(schedule, after, until).collect()
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), Some(29));
        assert_eq!(days_in_month(2023, 2), Some(28));
        assert_eq!(days_in_month(1900, 2), Some(28));
        assert_eq!(days_in_month(2000, 2), Some(29));
        assert_eq!(days_in_month(2023, 4), Some(30));
        assert_eq!(days_in_month(2023, 12), Some(31));
    }

    #[test]
    fn monthly_clamps_each_month_independently() {
        let s = schedule(Cadence::Monthly { day: 31 }, date(2023, 1, 31), None);
        assert_eq!(
            collect(&s, None, date(2023, 5, 31)),
            vec![
                date(2023, 1, 31),
                date(2023, 2, 28),
                date(2023, 3, 31),
                date(2023, 4, 30),
                date(2023, 5, 31),
            ]
        );

        let leap = schedule(Cadence::Monthly { day: 31 }, date(2024, 1, 31), None);
        assert_eq!(
            collect(&leap, None, date(2024, 3, 31)),
            vec![date(2024, 1, 31), date(2024, 2, 29), date(2024, 3, 31)]
        );
    }

    #[test]
    fn monthly_resumes_after_a_clamped_watermark() {
        let s = schedule(Cadence::Monthly { day: 30 }, date(2023, 1, 30), None);
        // Watermark on the clamped February date: March goes back to the 30th.
        assert_eq!(
            collect(&s, Some(date(2023, 2, 28)), date(2023, 4, 30)),
            vec![date(2023, 3, 30), date(2023, 4, 30)]
        );
    }

    #[test]
    fn monthly_skips_anchor_before_start_in_first_month() {
        let s = schedule(Cadence::Monthly { day: 15 }, date(2023, 1, 20), None);
        assert_eq!(
            collect(&s, None, date(2023, 3, 31)),
            vec![date(2023, 2, 15), date(2023, 3, 15)]
        );
    }

    #[test]
    fn three_full_months_give_three_occurrences() {
        let s = schedule(Cadence::Monthly { day: 1 }, date(2023, 4, 1), None);
        assert_eq!(collect(&s, None, date(2023, 6, 30)).len(), 3);
    }

    #[test]
    fn yearly_clamps_leap_day() {
        let s = schedule(
            Cadence::Yearly { month: 2, day: 29 },
            date(2024, 1, 1),
            None,
        );
        assert_eq!(
            collect(&s, None, date(2028, 12, 31)),
            vec![
                date(2024, 2, 29),
                date(2025, 2, 28),
                date(2026, 2, 28),
                date(2027, 2, 28),
                date(2028, 2, 29),
            ]
        );
    }

    #[test]
    fn yearly_starting_after_the_anchor_waits_a_year() {
        let s = schedule(
            Cadence::Yearly { month: 3, day: 10 },
            date(2023, 6, 1),
            None,
        );
        assert_eq!(
            collect(&s, None, date(2025, 3, 10)),
            vec![date(2024, 3, 10), date(2025, 3, 10)]
        );
    }

    #[test]
    fn weekly_fires_on_every_matching_weekday() {
        // 2024-01-01 is a Monday.
        let s = schedule(
            Cadence::Weekly {
                weekday: Weekday::Mon,
            },
            date(2024, 1, 1),
            None,
        );
        let dates = collect(&s, None, date(2024, 1, 28));
        assert_eq!(
            dates,
            vec![
                date(2024, 1, 1),
                date(2024, 1, 8),
                date(2024, 1, 15),
                date(2024, 1, 22)
            ]
        );
        assert!(dates.iter().all(|d| d.weekday() == Weekday::Mon));
    }

    #[test]
    fn weekly_anchor_is_first_matching_day_on_or_after_start() {
        // 2024-01-03 is a Wednesday, first Friday is the 5th.
        let s = schedule(
            Cadence::Weekly {
                weekday: Weekday::Fri,
            },
            date(2024, 1, 3),
            None,
        );
        assert_eq!(
            collect(&s, None, date(2024, 1, 12)),
            vec![date(2024, 1, 5), date(2024, 1, 12)]
        );
    }

    #[test]
    fn biweekly_keeps_phase_across_watermarks() {
        let s = schedule(
            Cadence::Biweekly {
                weekday: Weekday::Mon,
            },
            date(2024, 1, 1),
            None,
        );
        assert_eq!(
            collect(&s, None, date(2024, 1, 28)),
            vec![date(2024, 1, 1), date(2024, 1, 15)]
        );
        // Searching from the 8th (an off-week Monday) still lands on the 15th.
        assert_eq!(
            collect(&s, Some(date(2024, 1, 7)), date(2024, 2, 12)),
            vec![date(2024, 1, 15), date(2024, 1, 29), date(2024, 2, 12)]
        );
    }

    #[test]
    fn end_date_is_an_inclusive_cutoff() {
        let s = schedule(
            Cadence::Monthly { day: 10 },
            date(2023, 1, 1),
            Some(date(2023, 3, 10)),
        );
        assert_eq!(
            collect(&s, None, date(2023, 12, 31)),
            vec![date(2023, 1, 10), date(2023, 2, 10), date(2023, 3, 10)]
        );
    }

    #[test]
    fn watermark_is_exclusive() {
        let s = schedule(Cadence::Monthly { day: 10 }, date(2023, 1, 1), None);
        assert_eq!(
            collect(&s, Some(date(2023, 2, 10)), date(2023, 3, 10)),
            vec![date(2023, 3, 10)]
        );
        assert!(collect(&s, Some(date(2023, 3, 10)), date(2023, 3, 10)).is_empty());
    }

    #[test]
    fn nothing_before_start_or_after_until() {
        let s = schedule(Cadence::Monthly { day: 10 }, date(2023, 6, 1), None);
        assert!(collect(&s, None, date(2023, 5, 31)).is_empty());
        assert!(collect(&s, None, date(2023, 6, 9)).is_empty());
        assert_eq!(collect(&s, None, date(2023, 6, 10)), vec![date(2023, 6, 10)]);
    }

    #[test]
    fn iterator_is_restartable() {
        let s = schedule(
            Cadence::Weekly {
                weekday: Weekday::Thu,
            },
            date(2023, 1, 1),
            None,
        );
        let iter = occurrences(&s, None, date(2023, 3, 1));
        let first: Vec<_> = iter.clone().collect();
        let second: Vec<_> = iter.collect();
        assert_eq!(first, second);
        assert_eq!(first, collect(&s, None, date(2023, 3, 1)));
    }

    #[test]
    fn watermark_at_max_date_yields_nothing() {
        let s = schedule(Cadence::Monthly { day: 1 }, date(2023, 1, 1), None);
        assert!(collect(&s, Some(NaiveDate::MAX), NaiveDate::MAX).is_empty());
    }
}
