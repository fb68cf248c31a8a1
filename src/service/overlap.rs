pub const MINUTES_PER_DAY: i64 = 24 * 60;

/// Half-open overlap: [s1, e1) conflicts with [s2, e2) iff s1 < e2 && s2 < e1.
/// An exact touch (one interval ending where the other starts) is not a
/// conflict.
pub fn intervals_overlap(s1: i64, e1: i64, s2: i64, e2: i64) -> bool {
    s1 < e2 && s2 < e1
}

/// Parses a strict 24-hour "HH:MM" clock into minutes since midnight.
/// A single-digit hour is tolerated; out-of-range components are not.
pub fn parse_clock(text: &str) -> Option<i64> {
    let (hour_text, minute_text) = text.trim().split_once(':')?;
    if hour_text.is_empty() || hour_text.len() > 2 || minute_text.len() != 2 {
        return None;
    }
    if !hour_text.chars().all(|c| c.is_ascii_digit())
        || !minute_text.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let hour: i64 = hour_text.parse().ok()?;
    let minute: i64 = minute_text.parse().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    Some(hour * 60 + minute)
}

/// Renders minutes since midnight as "HH:MM", wrapping past midnight.
pub fn format_clock(minutes: i64) -> String {
    let wrapped = minutes.rem_euclid(MINUTES_PER_DAY);
    format!("{:02}:{:02}", wrapped / 60, wrapped % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn touching_intervals_do_not_overlap() {
        // [14:00, 15:00) against [15:00, 16:00)
        assert!(!intervals_overlap(840, 900, 900, 960));
        assert!(!intervals_overlap(900, 960, 840, 900));
    }

    #[test]
    fn contained_interval_overlaps() {
        // [14:15, 14:45) inside [14:00, 15:00)
        assert!(intervals_overlap(855, 885, 840, 900));
        assert!(intervals_overlap(840, 900, 855, 885));
    }

    #[test]
    fn gap_of_one_minute_does_not_overlap() {
        // [15:01, 16:00) against [14:00, 15:00)
        assert!(!intervals_overlap(901, 960, 840, 900));
    }

    #[test]
    fn partial_overlap_is_symmetric() {
        assert!(intervals_overlap(840, 900, 870, 930));
        assert!(intervals_overlap(870, 930, 840, 900));
    }

    #[test]
    fn parse_clock_accepts_valid_times() {
        assert_eq!(parse_clock("00:00"), Some(0));
        assert_eq!(parse_clock("14:30"), Some(870));
        assert_eq!(parse_clock("23:59"), Some(1439));
        assert_eq!(parse_clock("9:05"), Some(545));
    }

    #[test]
    fn parse_clock_rejects_out_of_range_and_garbage() {
        assert_eq!(parse_clock("24:00"), None);
        assert_eq!(parse_clock("12:60"), None);
        assert_eq!(parse_clock("14h30"), None);
        assert_eq!(parse_clock("14:3"), None);
        assert_eq!(parse_clock(""), None);
        assert_eq!(parse_clock("-1:30"), None);
    }

    #[test]
    fn format_clock_wraps_past_midnight() {
        assert_eq!(format_clock(870), "14:30");
        // 23:45 + 30 minutes
        assert_eq!(format_clock(1425 + 30), "00:15");
        assert_eq!(format_clock(0), "00:00");
    }
}
