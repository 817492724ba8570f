//! Home screen state: the viewed date, sleep goal, condition reading and
//! the sleep record that feeds the daily summary.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};

use crate::models::{Condition, DailySummaryRequest};
use crate::utils::local_datetime;

/// Goal used when the backend has none or returns something unparsable
pub fn default_sleep_goal() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 0, 0).unwrap_or(NaiveTime::MIN)
}

/// Sleep start/end and condition for one night, filled in via the sleep
/// and condition modals.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SleepRecord {
    pub start: Option<NaiveTime>,
    pub end: Option<NaiveTime>,
    pub condition: Option<Condition>,
}

impl SleepRecord {
    pub fn is_complete(&self) -> bool {
        self.start.is_some() && self.end.is_some() && self.condition.is_some()
    }

    /// Build the summary request for the night ending on `wake_date`.
    /// `None` until start, end and condition are all present.
    pub fn summary_request(&self, user_id: &str, wake_date: NaiveDate) -> Option<DailySummaryRequest> {
        let (start, end) = sleep_window(wake_date, self.start?, self.end?);
        Some(DailySummaryRequest {
            user_id: user_id.to_string(),
            sleep_start_at: start,
            sleep_end_at: end,
            freshness: self.condition?.freshness(),
        })
    }
}

/// Place a bed time and a wake time on the calendar. The wake time falls
/// on `wake_date`; a bed time later than the wake time belongs to the
/// evening before.
pub fn sleep_window(
    wake_date: NaiveDate,
    start: NaiveTime,
    end: NaiveTime,
) -> (DateTime<Utc>, DateTime<Utc>) {
    let start_date = if start > end {
        wake_date - Duration::days(1)
    } else {
        wake_date
    };
    (
        local_datetime(start_date, start).with_timezone(&Utc),
        local_datetime(wake_date, end).with_timezone(&Utc),
    )
}

#[derive(Debug, Clone)]
pub struct HomeState {
    pub date: NaiveDate,
    pub goal: NaiveTime,
    pub condition_temp: Option<f64>,
    pub sleep: SleepRecord,
    pub summary: Option<serde_json::Value>,
}

impl HomeState {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            date: today,
            goal: default_sleep_goal(),
            condition_temp: None,
            sleep: SleepRecord::default(),
            summary: None,
        }
    }

    /// Move the viewed date; per-date readings and the sleep record are
/// cleared
    pub fn change_date(&mut self, days: i64) {
        self.date += Duration::days(days);
        self.goal = default_sleep_goal();
        self.condition_temp = None;
        self.sleep = SleepRecord::default();
        self.summary = None;
    }

    pub fn date_label(&self) -> String {
        self.date.format("%Y-%m-%d (%a)").to_string()
    }

    pub fn condition_temp_label(&self) -> String {
        match self.condition_temp {
            Some(value) => format!("{:.1}", value),
            None => "-".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn may_first() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap()
    }

    fn hm(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    #[test]
    fn default_goal_is_eleven_pm() {
        assert_eq!(default_sleep_goal().hour(), 23);
        assert_eq!(default_sleep_goal().minute(), 0);
    }

    #[test]
    fn summary_requires_every_field() {
        let mut record = SleepRecord::default();
        assert!(record.summary_request("u", may_first()).is_none());
        record.start = Some(hm(23, 30));
        record.end = Some(hm(7, 0));
        assert!(record.summary_request("u", may_first()).is_none());
        record.condition = Some(Condition::Normal);
        let request = record.summary_request("u", may_first()).unwrap();
        assert_eq!(request.freshness, 2);
        assert_eq!(request.user_id, "u");
        assert!(request.sleep_start_at < request.sleep_end_at);
    }

    #[test]
    fn bed_time_after_wake_time_is_previous_evening() {
        let (start, end) = sleep_window(may_first(), hm(23, 30), hm(7, 0));
        assert_eq!(end - start, Duration::minutes(7 * 60 + 30));
    }

    #[test]
    fn nap_stays_on_same_day() {
        let (start, end) = sleep_window(may_first(), hm(1, 0), hm(9, 0));
        assert_eq!(end - start, Duration::hours(8));
    }

    #[test]
    fn changing_date_resets_readings() {
        let mut home = HomeState::new(may_first());
        home.condition_temp = Some(36.5);
        home.goal = hm(22, 0);
        home.sleep.start = Some(hm(23, 30));
        home.sleep.condition = Some(Condition::Bad);
        home.change_date(-1);
        assert_eq!(home.sleep, SleepRecord::default());
        assert_eq!(home.date, NaiveDate::from_ymd_opt(2024, 4, 30).unwrap());
        assert_eq!(home.condition_temp_label(), "-");
        assert_eq!(home.goal, default_sleep_goal());
    }
}
