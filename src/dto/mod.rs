use std::time::SystemTime;
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

pub mod event;
pub mod health;
pub mod validation;

fn format_system_time(time: SystemTime) -> String {
    OffsetDateTime::from(time)
        .format(&Rfc3339)
        .unwrap_or_else(|_| "invalid-timestamp".into())
}

/// Parse an RFC 3339 timestamp typed in a form. Blank input means no value.
pub fn parse_date_time(value: &str) -> Result<Option<SystemTime>, time::error::Parse> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    OffsetDateTime::parse(value, &Rfc3339).map(|parsed| Some(parsed.into()))
}

/// Trim free text and drop control characters other than line breaks.
pub fn sanitize_string(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|c| !c.is_control() || *c == '\n')
        .collect()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    #[test]
    fn dates_round_trip_through_rfc3339() {
        let parsed = parse_date_time("2021-04-23T22:00:00Z").unwrap().unwrap();
        assert_eq!(
            parsed,
            SystemTime::UNIX_EPOCH + Duration::from_secs(1_619_215_200)
        );
        assert_eq!(format_system_time(parsed), "2021-04-23T22:00:00Z");
        assert_eq!(parse_date_time("  ").unwrap(), None);
        assert!(parse_date_time("next friday").is_err());
    }

    #[test]
    fn sanitize_strips_controls_and_padding() {
        assert_eq!(sanitize_string("  Ludum\u{0007} Dare\r\n50 "), "Ludum Dare\n50");
    }
}
