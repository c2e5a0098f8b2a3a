// Module name shadows the `serde` crate; use `::serde` for the external crate.
use ::serde::Serializer;
use chrono::{DateTime, SecondsFormat, Utc};

/// Serialize a `DateTime<Utc>` as RFC 3339 with millisecond precision, the
/// timestamp format every response body uses. Apply with
/// `#[serde(serialize_with = "...")]`.
pub fn to_rfc3339_ms<S>(dt: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    s.serialize_str(&dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use ::serde::Serialize;
    use chrono::{DateTime, TimeZone, Utc};

    #[derive(Serialize)]
    struct Stamped {
        #[serde(serialize_with = "super::to_rfc3339_ms")]
        at: DateTime<Utc>,
    }

    #[test]
    fn should_serialize_timestamps_with_millis_and_z_suffix() {
        let stamped = Stamped {
            at: Utc.with_ymd_and_hms(2026, 8, 1, 7, 30, 15).unwrap(),
        };
        let json = serde_json::to_string(&stamped).unwrap();
        assert_eq!(json, r#"{"at":"2026-08-01T07:30:15.000Z"}"#);
    }
}
