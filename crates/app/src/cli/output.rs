use humanize_duration::{Truncate, prelude::DurationExt};
use jiff::{Timestamp, tz::TimeZone};
use tabled::{builder::Builder, settings::Style};

/// Print `rows` under `header` as a rounded table.
pub(crate) fn print_table<const N: usize>(header: [&str; N], rows: Vec<[String; N]>) {
    let mut builder = Builder::default();

    builder.push_record(header);

    for row in rows {
        builder.push_record(row);
    }

    let mut table = builder.build();
    table.with(Style::rounded());

    println!("{table}");
}

/// Time left until `deadline`, or `expired`.
pub(crate) fn remaining(now: Timestamp, deadline: Timestamp) -> String {
    let left = deadline.duration_since(now);

    if left.is_negative() || left.is_zero() {
        return "expired".to_string();
    }

    left.unsigned_abs().human(Truncate::Second).to_string()
}

/// How long before `now` something happened.
pub(crate) fn ago(then: Timestamp, now: Timestamp) -> String {
    let elapsed = now.duration_since(then);

    if elapsed.as_secs() < 1 {
        return "just now".to_string();
    }

    format!("{} ago", elapsed.unsigned_abs().human(Truncate::Second))
}

/// `2023-11-15 01:00:00` in `tz`.
pub(crate) fn local(at: Timestamp, tz: &TimeZone) -> String {
    at.to_zoned(tz.clone()).strftime("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use jiff::SignedDuration;
    use testresult::TestResult;

    use super::*;

    #[test]
    fn past_deadlines_read_expired() -> TestResult {
        let now = Timestamp::from_second(1_700_000_000)?;

        assert_eq!(remaining(now, now), "expired");
        assert_eq!(remaining(now, now - SignedDuration::from_secs(5)), "expired");
        assert_ne!(remaining(now, now + SignedDuration::from_mins(5)), "expired");

        Ok(())
    }

    #[test]
    fn recent_events_read_just_now() -> TestResult {
        let now = Timestamp::from_second(1_700_000_000)?;

        assert_eq!(ago(now, now), "just now");
        assert_eq!(ago(now + SignedDuration::from_secs(30), now), "just now");
        assert!(ago(now - SignedDuration::from_mins(3), now).ends_with(" ago"));

        Ok(())
    }

    #[test]
    fn local_times_follow_the_zone() -> TestResult {
        let at = Timestamp::from_second(1_700_000_000)?;

        assert_eq!(local(at, &TimeZone::UTC), "2023-11-14 22:13:20");

        Ok(())
    }
}
