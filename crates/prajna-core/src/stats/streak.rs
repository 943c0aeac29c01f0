//! Consecutive-day streaks over the days that have at least one session.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Streaks {
    pub current_streak: u32,
    pub longest_streak: u32,
}

/// Compute current and longest streaks relative to `today`.
///
/// The current streak only exists if the newest session day is today or
/// yesterday. It stops growing at the first gap; the walk continues only to
/// find the longest run.
pub fn calculate_streaks(dates: &[NaiveDate], today: NaiveDate) -> Streaks {
    let mut days = dates.to_vec();
    days.sort_unstable_by(|a, b| b.cmp(a));
    days.dedup();

    let Some((&newest, older)) = days.split_first() else {
        return Streaks::default();
    };

    let mut current_alive = (today - newest).num_days() <= 1;
    let mut current = u32::from(current_alive);
    let mut longest = 0;
    let mut run = 1;
    let mut prev = newest;

    for &day in older {
        if (prev - day).num_days() == 1 {
            run += 1;
            if current_alive {
                current = run;
            }
        } else {
            longest = longest.max(run);
            run = 1;
            current_alive = false;
        }
        prev = day;
    }

    Streaks {
        current_streak: current,
        longest_streak: longest.max(run),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 15).unwrap()
    }

    fn days_ago(n: i64) -> NaiveDate {
        today() - chrono::Duration::days(n)
    }

    #[test]
    fn no_sessions_means_no_streaks() {
        assert_eq!(calculate_streaks(&[], today()), Streaks::default());
    }

    #[test]
    fn gap_after_two_days() {
        let s = calculate_streaks(&[today(), days_ago(1), days_ago(3)], today());
        assert_eq!(s, Streaks { current_streak: 2, longest_streak: 2 });
    }

    #[test]
    fn current_freezes_at_first_gap() {
        let s = calculate_streaks(&[today(), days_ago(5), days_ago(6)], today());
        assert_eq!(s, Streaks { current_streak: 1, longest_streak: 2 });
    }

    #[test]
    fn current_streak_can_start_yesterday() {
        let s = calculate_streaks(&[days_ago(1), days_ago(2), days_ago(3)], today());
        assert_eq!(s, Streaks { current_streak: 3, longest_streak: 3 });
    }

    #[test]
    fn stale_newest_day_means_no_current_streak() {
        let s = calculate_streaks(&[days_ago(2), days_ago(3)], today());
        assert_eq!(s, Streaks { current_streak: 0, longest_streak: 2 });

        let s = calculate_streaks(&[days_ago(10)], today());
        assert_eq!(s, Streaks { current_streak: 0, longest_streak: 1 });
    }

    #[test]
    fn longest_found_in_older_history() {
        let dates = [
            today(),
            days_ago(4),
            days_ago(5),
            days_ago(6),
            days_ago(7),
            days_ago(20),
        ];
        let s = calculate_streaks(&dates, today());
        assert_eq!(s, Streaks { current_streak: 1, longest_streak: 4 });
    }

    #[test]
    fn unsorted_and_duplicate_dates_are_normalized() {
        let s = calculate_streaks(&[days_ago(1), today(), days_ago(1), days_ago(2)], today());
        assert_eq!(s, Streaks { current_streak: 3, longest_streak: 3 });
    }

    #[test]
    fn future_dated_session_seeds_current() {
        let tomorrow = today().succ_opt().unwrap();
        let s = calculate_streaks(&[tomorrow, today()], today());
        assert_eq!(s, Streaks { current_streak: 2, longest_streak: 2 });
    }

    mod props {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn current_never_exceeds_longest(offsets in proptest::collection::vec(-3i64..400, 0..60)) {
                let dates: Vec<_> = offsets.iter().map(|&n| days_ago(n)).collect();
                let s = calculate_streaks(&dates, today());

                let mut distinct = dates.clone();
                distinct.sort_unstable();
                distinct.dedup();

                prop_assert!(s.current_streak <= s.longest_streak);
                prop_assert!(s.longest_streak as usize <= distinct.len());
                prop_assert_eq!(s.longest_streak == 0, dates.is_empty());
            }

            #[test]
            fn input_order_does_not_matter(mut offsets in proptest::collection::vec(0i64..60, 0..30)) {
                let forward: Vec<_> = offsets.iter().map(|&n| days_ago(n)).collect();
                offsets.reverse();
                let backward: Vec<_> = offsets.iter().map(|&n| days_ago(n)).collect();
                prop_assert_eq!(
                    calculate_streaks(&forward, today()),
                    calculate_streaks(&backward, today())
                );
            }
        }
    }
}
