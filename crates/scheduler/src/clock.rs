use chrono::{DateTime, Duration as ChronoDuration, FixedOffset, NaiveTime, Utc};

/// Seconds from `now` until the next occurrence of `time_of_day` in a fixed
/// `tz_offset_hours` zone, rolling to tomorrow if `time_of_day` has already
/// passed today. Used for the 14:00/08:00 daily jobs (§4.11) — a fixed
/// offset rather than an IANA zone, since the operator's timezone is a
/// single configured constant rather than something that observes DST
/// transitions mid-run.
pub fn seconds_until_next(now: DateTime<Utc>, time_of_day: NaiveTime, tz_offset_hours: i32) -> i64 {
    let offset = FixedOffset::east_opt(tz_offset_hours * 3600).expect("tz_offset_hours in range");
    let local_now = now.with_timezone(&offset);

    let mut target_date = local_now.date_naive();
    if local_now.time() >= time_of_day {
        target_date += ChronoDuration::days(1);
    }
    let target_local = target_date
        .and_time(time_of_day)
        .and_local_timezone(offset)
        .single()
        .expect("fixed offset local time is always unambiguous");

    (target_local.with_timezone(&Utc) - now).num_seconds().max(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schedules_later_today_when_time_has_not_passed() {
        let now: DateTime<Utc> = "2026-01-01T10:00:00Z".parse().unwrap();
        let target = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let secs = seconds_until_next(now, target, 0);
        assert_eq!(secs, 4 * 3600);
    }

    #[test]
    fn rolls_to_tomorrow_once_time_has_passed() {
        let now: DateTime<Utc> = "2026-01-01T15:00:00Z".parse().unwrap();
        let target = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let secs = seconds_until_next(now, target, 0);
        assert_eq!(secs, 23 * 3600);
    }

    #[test]
    fn applies_the_operator_timezone_offset() {
        let now: DateTime<Utc> = "2026-01-01T12:00:00Z".parse().unwrap();
        // 14:00 local in UTC+2 is 12:00 UTC — already arrived, rolls to tomorrow.
        let target = NaiveTime::from_hms_opt(14, 0, 0).unwrap();
        let secs = seconds_until_next(now, target, 2);
        assert_eq!(secs, 24 * 3600);
    }
}
