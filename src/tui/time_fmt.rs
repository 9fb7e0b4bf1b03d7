use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// Relative rendering gives up past two weeks; older entries read better as
// dates.
const RELATIVE_CUTOFF_DAYS: i64 = 14;

/// Render an RFC3339 timestamp for the gist list: relative while recent,
/// absolute past the cutoff or for anything unparseable/future.
pub(super) fn fmt_ts(ts: &str, now: OffsetDateTime) -> String {
    let Ok(dt) = OffsetDateTime::parse(ts, &Rfc3339) else {
        return ts.to_string();
    };

    let secs = (now - dt).whole_seconds();
    if secs < 0 {
        return absolute(dt);
    }
    let mins = secs / 60;
    let hours = mins / 60;
    let days = hours / 24;

    if secs < 60 {
        "just now".to_string()
    } else if mins < 60 {
        format!("{mins}m ago")
    } else if hours < 48 {
        format!("{hours}h ago")
    } else if days < RELATIVE_CUTOFF_DAYS {
        format!("{days}d ago")
    } else {
        absolute(dt)
    }
}

fn absolute(dt: OffsetDateTime) -> String {
    format!(
        "{:04}-{:02}-{:02} {:02}:{:02}Z",
        dt.year(),
        u8::from(dt.month()),
        dt.day(),
        dt.hour(),
        dt.minute()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> OffsetDateTime {
        OffsetDateTime::parse(s, &Rfc3339).unwrap()
    }

    #[test]
    fn recent_timestamps_render_relative() {
        let now = at("2026-08-28T12:00:00Z");
        assert_eq!(fmt_ts("2026-08-28T11:59:30Z", now), "just now");
        assert_eq!(fmt_ts("2026-08-28T11:30:00Z", now), "30m ago");
        assert_eq!(fmt_ts("2026-08-27T12:00:00Z", now), "24h ago");
        assert_eq!(fmt_ts("2026-08-20T12:00:00Z", now), "8d ago");
    }

    #[test]
    fn old_future_or_unparseable_timestamps_render_absolute() {
        let now = at("2026-08-28T12:00:00Z");
        assert_eq!(fmt_ts("2026-01-01T08:30:00Z", now), "2026-01-01 08:30Z");
        assert_eq!(fmt_ts("2026-09-05T07:00:00Z", now), "2026-09-05 07:00Z");
        assert_eq!(fmt_ts("not a timestamp", now), "not a timestamp");
    }
}
