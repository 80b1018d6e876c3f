//! # Temporal — The One Timestamp Shape
//!
//! `Timestamp` is the only clock type the workspace uses: UTC, whole
//! seconds, rendered `YYYY-MM-DDTHH:MM:SSZ`.
//!
//! ## Security Invariant
//!
//! A timestamp that reaches a hashed document must have exactly one textual
//! spelling. An offset like `+00:00` names the same instant as `Z` but
//! canonicalizes to different bytes, so strict construction refuses it
//! outright rather than converting. Sub-second precision is dropped for the
//! same reason. Serde passes through the same gate: serialization emits the
//! `Z` form, deserialization runs the strict parser.

use chrono::{DateTime, Timelike, Utc};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::TimestampError;

/// UTC instant at whole-second resolution.
///
/// # Construction
///
/// - [`Timestamp::now()`] — the current instant, sub-seconds dropped.
/// - [`Timestamp::from_utc()`] — wrap an existing `DateTime<Utc>`.
/// - [`Timestamp::parse()`] — strict: the string must end in `Z`.
/// - [`Timestamp::parse_lenient()`] — any RFC 3339 offset, converted to UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(DateTime<Utc>);

impl Timestamp {
    /// The current UTC time at whole-second resolution.
    pub fn now() -> Self {
        Self(drop_subseconds(Utc::now()))
    }

    /// Wrap a `DateTime<Utc>`, dropping any sub-second component.
    pub fn from_utc(dt: DateTime<Utc>) -> Self {
        Self(drop_subseconds(dt))
    }

    /// Strict parse: RFC 3339 with a literal `Z` suffix.
    ///
    /// Explicit offsets are refused even when they denote UTC — `+00:00` and
    /// `Z` would otherwise give one instant two canonical spellings. Use
    /// this on every value destined for a hashed document.
    pub fn parse(s: &str) -> Result<Self, TimestampError> {
        if !s.ends_with('Z') {
            return Err(TimestampError::NonUtc {
                input: s.to_string(),
            });
        }
        Self::parse_lenient(s)
    }

    /// Lenient parse: any RFC 3339 offset, converted to UTC.
    ///
    /// Ingestion path for collaborator responses (TSA tokens, chain
    /// receipts) whose producers pick their own offsets. Values headed into
    /// a hashed document go through [`Timestamp::parse()`] instead.
    pub fn parse_lenient(s: &str) -> Result<Self, TimestampError> {
        let parsed = DateTime::parse_from_rfc3339(s).map_err(|e| TimestampError::Invalid {
            input: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self(drop_subseconds(parsed.with_timezone(&Utc))))
    }

    /// Build from Unix epoch seconds.
    pub fn from_epoch_secs(secs: i64) -> Result<Self, TimestampError> {
        match DateTime::from_timestamp(secs, 0) {
            Some(dt) => Ok(Self(dt)),
            None => Err(TimestampError::EpochOutOfRange { secs }),
        }
    }

    /// Borrow the underlying `DateTime<Utc>`.
    pub fn as_datetime(&self) -> &DateTime<Utc> {
        &self.0
    }

    /// Unix epoch seconds.
    pub fn epoch_secs(&self) -> i64 {
        self.0.timestamp()
    }

    /// This instant shifted by `secs` seconds, saturating at the range
    /// chrono can represent.
    pub fn plus_secs(&self, secs: i64) -> Self {
        let target = self.0.timestamp().saturating_add(secs);
        match DateTime::from_timestamp(target, 0) {
            Some(dt) => Self(dt),
            None => *self,
        }
    }

    /// Whole seconds from `self` until `later`, negative when `later`
    /// precedes `self`.
    pub fn seconds_until(&self, later: &Timestamp) -> i64 {
        later.epoch_secs() - self.epoch_secs()
    }

    /// The canonical `YYYY-MM-DDTHH:MM:SSZ` rendering.
    pub fn to_iso8601(&self) -> String {
        self.0.format("%Y-%m-%dT%H:%M:%SZ").to_string()
    }
}

impl std::fmt::Display for Timestamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_iso8601())
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_iso8601())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Timestamp::parse(&s).map_err(de::Error::custom)
    }
}

/// Zero the nanosecond field; leap-second inputs pass through unchanged.
fn drop_subseconds(dt: DateTime<Utc>) -> DateTime<Utc> {
    dt.with_nanosecond(0).unwrap_or(dt)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_now_is_whole_seconds() {
        assert_eq!(Timestamp::now().as_datetime().nanosecond(), 0);
    }

    #[test]
    fn test_from_utc_drops_nanos() {
        let instant = Utc
            .with_ymd_and_hms(2027, 3, 9, 8, 15, 30)
            .unwrap()
            .with_nanosecond(987_654_321)
            .unwrap();
        let ts = Timestamp::from_utc(instant);
        assert_eq!(ts.as_datetime().nanosecond(), 0);
        assert_eq!(ts.to_iso8601(), "2027-03-09T08:15:30Z");
    }

    #[test]
    fn test_iso8601_rendering() {
        let ts = Timestamp::from_utc(Utc.with_ymd_and_hms(2027, 3, 9, 8, 0, 0).unwrap());
        assert_eq!(ts.to_iso8601(), "2027-03-09T08:00:00Z");
        assert_eq!(ts.to_string(), ts.to_iso8601());
    }

    #[test]
    fn test_midnight_renders_zeroes() {
        let ts = Timestamp::from_utc(Utc.with_ymd_and_hms(2027, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(ts.to_iso8601(), "2027-01-01T00:00:00Z");
    }

    #[test]
    fn test_strict_accepts_z() {
        let ts = Timestamp::parse("2027-03-09T08:15:30Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2027-03-09T08:15:30Z");
    }

    #[test]
    fn test_strict_refuses_offsets() {
        // +00:00 is UTC too, but it is a second spelling of the instant.
        assert!(Timestamp::parse("2027-03-09T08:15:30+00:00").is_err());
        assert!(Timestamp::parse("2027-03-09T13:45:30+05:30").is_err());
        assert!(Timestamp::parse("2027-03-09T03:15:30-05:00").is_err());
    }

    #[test]
    fn test_strict_drops_subseconds() {
        let ts = Timestamp::parse("2027-03-09T08:15:30.250000Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2027-03-09T08:15:30Z");
    }

    #[test]
    fn test_strict_refuses_garbage() {
        for bad in ["never", "2027-03-09", "08:15:30Z", ""] {
            assert!(Timestamp::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_lenient_converts_offset_to_utc() {
        let ts = Timestamp::parse_lenient("2027-03-09T13:45:30+05:30").unwrap();
        assert_eq!(ts.to_iso8601(), "2027-03-09T08:15:30Z");
    }

    #[test]
    fn test_lenient_also_takes_z() {
        let ts = Timestamp::parse_lenient("2027-03-09T08:15:30Z").unwrap();
        assert_eq!(ts.to_iso8601(), "2027-03-09T08:15:30Z");
    }

    #[test]
    fn test_epoch_secs_roundtrip() {
        let ts = Timestamp::parse("2027-03-09T08:15:30Z").unwrap();
        assert_eq!(Timestamp::from_epoch_secs(ts.epoch_secs()).unwrap(), ts);
    }

    #[test]
    fn test_plus_secs_shifts_both_ways() {
        let ts = Timestamp::parse("2027-03-09T08:15:30Z").unwrap();
        assert_eq!(ts.plus_secs(3600).to_iso8601(), "2027-03-09T09:15:30Z");
        assert_eq!(ts.plus_secs(-90).to_iso8601(), "2027-03-09T08:14:00Z");
    }

    #[test]
    fn test_seconds_until_is_signed() {
        let a = Timestamp::parse("2027-03-09T08:00:00Z").unwrap();
        let b = Timestamp::parse("2027-03-09T09:00:00Z").unwrap();
        assert_eq!(a.seconds_until(&b), 3600);
        assert_eq!(b.seconds_until(&a), -3600);
    }

    #[test]
    fn test_ord_follows_time() {
        let earlier = Timestamp::parse("2027-03-09T08:15:30Z").unwrap();
        let later = Timestamp::parse("2027-03-09T08:15:31Z").unwrap();
        assert!(earlier < later);
    }

    #[test]
    fn test_serde_emits_z_string() {
        let ts = Timestamp::parse("2027-03-09T08:15:30Z").unwrap();
        let json = serde_json::to_string(&ts).unwrap();
        assert_eq!(json, r#""2027-03-09T08:15:30Z""#);
        let back: Timestamp = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ts);
    }

    #[test]
    fn test_serde_refuses_offset_input() {
        let outcome: Result<Timestamp, _> = serde_json::from_str(r#""2027-03-09T08:15:30+00:00""#);
        assert!(outcome.is_err());
    }
}
