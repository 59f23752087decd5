use chrono::{Datelike, Days, NaiveDate, Weekday};
use proptest::prelude::*;

use engine::{Cadence, Schedule, occurrences};

fn base() -> NaiveDate {
    NaiveDate::from_ymd_opt(2020, 1, 1).unwrap()
}

fn any_date() -> impl Strategy<Value = NaiveDate> {
    (0u64..3_000).prop_map(|offset| base() + Days::new(offset))
}

fn any_weekday() -> impl Strategy<Value = Weekday> {
    (0u8..7).prop_map(|i| Weekday::try_from(i).unwrap())
}

fn any_cadence() -> impl Strategy<Value = Cadence> {
    prop_oneof![
        any_weekday().prop_map(|weekday| Cadence::Weekly { weekday }),
        any_weekday().prop_map(|weekday| Cadence::Biweekly { weekday }),
        (1u32..=31).prop_map(|day| Cadence::Monthly { day }),
        (1u32..=12, 1u32..=31).prop_map(|(month, day)| Cadence::Yearly { month, day }),
    ]
}

fn any_schedule() -> impl Strategy<Value = Schedule> {
    (any_cadence(), any_date(), proptest::option::of(0u64..1_500)).prop_map(
        |(cadence, start, span)| {
            let end = span.map(|days| start + Days::new(days));
            Schedule::new(cadence, start, end).unwrap()
        },
    )
}

fn last_day_of_month(date: NaiveDate) -> u32 {
    let (y, m) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(y, m, 1).unwrap().pred_opt().unwrap().day()
}

proptest! {
    #[test]
    fn dates_are_increasing_and_bounded(schedule in any_schedule(), until in any_date()) {
        let dates: Vec<_> = occurrences(&schedule, None, until).collect();
        prop_assert!(dates.windows(2).all(|w| w[0] < w[1]));
        for date in &dates {
            prop_assert!(*date >= schedule.start_date);
            prop_assert!(*date <= until);
            if let Some(end) = schedule.end_date {
                prop_assert!(*date <= end);
            }
        }
    }

    #[test]
    fn resuming_from_any_watermark_matches_a_single_pass(
        schedule in any_schedule(),
        until in any_date(),
        split in 0usize..64,
    ) {
        let all: Vec<_> = occurrences(&schedule, None, until).collect();
        prop_assume!(!all.is_empty());
        let split = split % all.len();
        let watermark = all[split];

        let mut resumed: Vec<_> = all[..=split].to_vec();
        resumed.extend(occurrences(&schedule, Some(watermark), until));
        prop_assert_eq!(resumed, all);
    }

    #[test]
    fn watermark_before_start_changes_nothing(
        schedule in any_schedule(),
        until in any_date(),
        back in 1u64..400,
    ) {
        let watermark = schedule.start_date - Days::new(back);
        let fresh: Vec<_> = occurrences(&schedule, None, until).collect();
        let resumed: Vec<_> = occurrences(&schedule, Some(watermark), until).collect();
        prop_assert_eq!(fresh, resumed);
    }

    #[test]
    fn anchors_are_respected(schedule in any_schedule(), until in any_date()) {
        let dates: Vec<_> = occurrences(&schedule, None, until).collect();
        match schedule.cadence {
            Cadence::Weekly { weekday } => {
                prop_assert!(dates.iter().all(|d| d.weekday() == weekday));
                prop_assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 7));
            }
            Cadence::Biweekly { weekday } => {
                prop_assert!(dates.iter().all(|d| d.weekday() == weekday));
                prop_assert!(dates.windows(2).all(|w| (w[1] - w[0]).num_days() == 14));
                if let Some(first) = dates.first() {
                    prop_assert!((*first - schedule.start_date).num_days() < 7);
                }
            }
            Cadence::Monthly { day } => {
                for date in &dates {
                    prop_assert_eq!(date.day(), day.min(last_day_of_month(*date)));
                }
                prop_assert!(dates.windows(2).all(|w| {
                    let months = (w[1].year() - w[0].year()) * 12 + w[1].month() as i32
                        - w[0].month() as i32;
                    months == 1
                }), "monthly occurrences must be one month apart");
            }
            Cadence::Yearly { month, day } => {
                for date in &dates {
                    prop_assert_eq!(date.month(), month);
                    prop_assert_eq!(date.day(), day.min(last_day_of_month(*date)));
                }
                prop_assert!(dates.windows(2).all(|w| w[1].year() - w[0].year() == 1));
            }
        }
    }
}
