use chrono::NaiveTime;

use crate::models::parse_clock;

/// "13:05" -> "1:05 PM", "00:30" -> "12:30 AM".
pub fn format_12_hour(time: NaiveTime) -> String {
    time.format("%-I:%M %p").to_string()
}

/// String front door for `format_12_hour`; `None` when the input isn't "HH:MM".
pub fn to_12_hour(hhmm: &str) -> Option<String> {
    parse_clock(hhmm).map(format_12_hour)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_around_noon_and_midnight() {
        assert_eq!(to_12_hour("00:00").as_deref(), Some("12:00 AM"));
        assert_eq!(to_12_hour("09:30").as_deref(), Some("9:30 AM"));
        assert_eq!(to_12_hour("12:00").as_deref(), Some("12:00 PM"));
        assert_eq!(to_12_hour("13:05").as_deref(), Some("1:05 PM"));
        assert_eq!(to_12_hour("23:59").as_deref(), Some("11:59 PM"));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(to_12_hour("9.30"), None);
        assert_eq!(to_12_hour(""), None);
    }
}
