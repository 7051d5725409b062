//! 序列化辅助模块

/// ISO-8601 时间戳的宽松解析
///
/// 优先按 RFC 3339（带时区偏移）解析；失败时按不带时区的日期时间解析并视为 UTC。
/// 序列化统一输出 RFC 3339（毫秒精度，`Z` 结尾）。
pub mod iso8601 {
    use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    const NAIVE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

    pub fn parse(s: &str) -> Option<DateTime<Utc>> {
        let s = s.trim();
        if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
            return Some(dt.with_timezone(&Utc));
        }
        NaiveDateTime::parse_from_str(s, NAIVE_FORMAT)
            .ok()
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_rfc3339_opts(SecondsFormat::Millis, true))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("invalid ISO-8601 timestamp: {raw}")))
    }
}

#[cfg(test)]
mod tests {
    use super::iso8601;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_parse_rfc3339_with_offset() {
        let dt = iso8601::parse("2024-03-01T14:30:00+02:00").unwrap();
        assert_eq!(dt, Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap());
    }

    #[test]
    fn test_parse_naive_as_utc() {
        let dt = iso8601::parse("2024-03-01T12:30:00.250").unwrap();
        assert_eq!(dt.timestamp_millis(), Utc.with_ymd_and_hms(2024, 3, 1, 12, 30, 0).unwrap().timestamp_millis() + 250);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(iso8601::parse("yesterday").is_none());
        assert!(iso8601::parse("").is_none());
    }
}
