//! Late-payment detection and fine estimation.

use crate::domain::{Circle, Decimal};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lateness {
    pub is_late: bool,
    pub days_late: i64,
    pub fine: Decimal,
}

impl Lateness {
    pub fn on_time() -> Self {
        Self::default()
    }

    /// Lateness of a contribution due on `round_date` as of `now`.
    ///
    /// The deadline is the end of the circle's payment window on that date.
    /// Any started day counts as a full day, so one second late is one day.
    pub fn assess(circle: &Circle, round_date: NaiveDate, now: DateTime<Utc>) -> Self {
        let elapsed_ms = (now - circle.due_at(round_date)).num_milliseconds();
        if elapsed_ms <= 0 {
            return Self::on_time();
        }

        let days_late = (elapsed_ms + DAY_MS - 1) / DAY_MS;
        Self {
            is_late: true,
            days_late,
            fine: Decimal::from_i64(days_late) * circle.fine_rate,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{BiddingType, PaymentWindow, ShareType};
    use crate::engine::test_support::circle;
    use chrono::{Duration, NaiveTime, TimeZone};

    fn window_circle() -> Circle {
        let mut c = circle(ShareType::InterestDeducted, BiddingType::Auction);
        c.fine_rate = Decimal::from_i64(50);
        c.payment_window = PaymentWindow {
            start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            end: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
        };
        c
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 10).unwrap()
    }

    #[test]
    fn test_before_window_end_is_on_time() {
        let c = window_circle();
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 16, 59, 59).unwrap();
        assert_eq!(Lateness::assess(&c, date(), now), Lateness::on_time());

        let exactly = Utc.with_ymd_and_hms(2026, 5, 10, 17, 0, 0).unwrap();
        assert!(!Lateness::assess(&c, date(), exactly).is_late);
    }

    #[test]
    fn test_any_positive_delay_is_one_day() {
        let c = window_circle();
        let now = Utc.with_ymd_and_hms(2026, 5, 10, 17, 0, 1).unwrap();
        let lateness = Lateness::assess(&c, date(), now);
        assert!(lateness.is_late);
        assert_eq!(lateness.days_late, 1);
        assert_eq!(lateness.fine, Decimal::from_i64(50));
    }

    #[test]
    fn test_days_round_up() {
        let c = window_circle();
        let due = c.due_at(date());

        let exactly_two = Lateness::assess(&c, date(), due + Duration::days(2));
        assert_eq!(exactly_two.days_late, 2);

        let later = due + Duration::days(2) + Duration::minutes(1);
        let just_over_two = Lateness::assess(&c, date(), later);
        assert_eq!(just_over_two.days_late, 3);
        assert_eq!(just_over_two.fine, Decimal::from_i64(150));
    }
}
