use crate::date_parser::{self, ParsedDateTime};
use chrono::{DateTime, FixedOffset, Utc};
use serde_json::Value;
use std::{collections::BTreeMap, fmt};

/// Why a stored timestamp could not be used.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SkipReason {
    /// Attribute absent or null.
    Missing,
    /// String that no known date format accepts.
    Unparseable,
    /// Number that is not a representable epoch.
    OutOfRange,
    /// Bool, array or object.
    UnsupportedType,
}

impl SkipReason {
    pub fn as_str(&self) -> &str {
        match self {
            SkipReason::Missing => "missing",
            SkipReason::Unparseable => "unparseable",
            SkipReason::OutOfRange => "out_of_range",
            SkipReason::UnsupportedType => "unsupported_type",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of reading one `timestamp` attribute.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TimestampSource {
    Found(ParsedDateTime),
    Skipped(SkipReason),
}

/// Interpret a raw attribute: strings through the date parser, numbers as epoch seconds.
pub fn extract(value: Option<&Value>) -> TimestampSource {
    match value {
        None | Some(Value::Null) => TimestampSource::Skipped(SkipReason::Missing),
        Some(Value::String(s)) => match date_parser::parse_datetime(s) {
            Some(parsed) => TimestampSource::Found(parsed),
            None => TimestampSource::Skipped(SkipReason::Unparseable),
        },
        Some(Value::Number(n)) => match n.as_f64().and_then(date_parser::from_epoch_seconds) {
            Some(utc) => TimestampSource::Found(ParsedDateTime::Aware(utc.fixed_offset())),
            None => TimestampSource::Skipped(SkipReason::OutOfRange),
        },
        Some(_) => TimestampSource::Skipped(SkipReason::UnsupportedType),
    }
}

/// Per-reason tally of skipped timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SkipCounts(BTreeMap<SkipReason, usize>);

impl SkipCounts {
    pub fn record(&mut self, reason: SkipReason) {
        *self.0.entry(reason).or_default() += 1;
    }

    #[cfg(test)]
    pub fn get(&self, reason: SkipReason) -> usize {
        self.0.get(&reason).copied().unwrap_or_default()
    }

    pub fn total(&self) -> usize {
        self.0.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SkipReason, usize)> + '_ {
        self.0.iter().map(|(r, n)| (*r, *n))
    }
}

/// Earliest usable instant among `values`; every skip is tallied in `skips`.
pub fn earliest<'a>(
    values: impl IntoIterator<Item = Option<&'a Value>>,
    skips: &mut SkipCounts,
) -> Option<DateTime<Utc>> {
    let mut earliest: Option<DateTime<Utc>> = None;
    for value in values {
        match extract(value) {
            TimestampSource::Found(parsed) => {
                let utc = parsed.to_utc();
                if earliest.map_or(true, |e| utc < e) {
                    earliest = Some(utc);
                }
            }
            TimestampSource::Skipped(reason) => skips.record(reason),
        }
    }
    earliest
}

/// Same instant at `offset`; naive input is read as UTC.
pub fn normalize(parsed: ParsedDateTime, offset: FixedOffset) -> DateTime<FixedOffset> {
    parsed.to_utc().with_timezone(&offset)
}

/// True when `parsed` already carries exactly `offset`.
pub fn is_normalized(parsed: &ParsedDateTime, offset: FixedOffset) -> bool {
    matches!(parsed, ParsedDateTime::Aware(dt) if *dt.offset() == offset)
}

/// Stored form of a node timestamp.
pub fn to_value(dt: DateTime<FixedOffset>) -> Value {
    Value::String(dt.to_rfc3339())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::gmt7;
    use serde_json::json;

    fn utc(s: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(s).unwrap().with_timezone(&Utc)
    }

    #[test]
    fn test_extract_variants() {
        assert_eq!(extract(None), TimestampSource::Skipped(SkipReason::Missing));
        assert_eq!(
            extract(Some(&Value::Null)),
            TimestampSource::Skipped(SkipReason::Missing)
        );
        assert_eq!(
            extract(Some(&json!("soon"))),
            TimestampSource::Skipped(SkipReason::Unparseable)
        );
        assert_eq!(
            extract(Some(&json!(true))),
            TimestampSource::Skipped(SkipReason::UnsupportedType)
        );
        assert_eq!(
            extract(Some(&json!(1e300))),
            TimestampSource::Skipped(SkipReason::OutOfRange)
        );

        match extract(Some(&json!(0))) {
            TimestampSource::Found(p) => assert_eq!(p.to_utc(), utc("1970-01-01T00:00:00Z")),
            other => panic!("unexpected {:?}", other),
        }
        match extract(Some(&json!("2025-02-01 10:00:00"))) {
            TimestampSource::Found(p) => assert!(p.is_naive()),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_earliest_compares_instants_and_counts_skips() {
        let values = [
            json!("2025-02-01T10:00:00+07:00"),
            json!("2025-02-01T02:00:00Z"),
            json!("garbage"),
            Value::Null,
        ];
        let mut skips = SkipCounts::default();
        let found = earliest(values.iter().map(Some).chain([None]), &mut skips);
        // 10:00+07:00 is 03:00Z, later than 02:00Z
        assert_eq!(found, Some(utc("2025-02-01T02:00:00Z")));
        assert_eq!(skips.get(SkipReason::Unparseable), 1);
        assert_eq!(skips.get(SkipReason::Missing), 2);
        assert_eq!(skips.total(), 3);
    }

    #[test]
    fn test_earliest_of_nothing() {
        let mut skips = SkipCounts::default();
        assert_eq!(earliest(std::iter::empty(), &mut skips), None);
        assert_eq!(skips.total(), 0);
    }

    #[test]
    fn test_normalize_naive_as_utc() {
        let parsed = date_parser::parse_datetime("2025-02-01 00:00:00").unwrap();
        let dt = normalize(parsed, gmt7());
        assert_eq!(dt.to_rfc3339(), "2025-02-01T07:00:00+07:00");
        assert!(!is_normalized(&parsed, gmt7()));
        assert!(is_normalized(&ParsedDateTime::Aware(dt), gmt7()));
    }

    #[test]
    fn test_to_value_reparses_to_same_instant() {
        let dt = utc("2025-02-01T00:00:00.123Z").with_timezone(&gmt7());
        let value = to_value(dt);
        match extract(Some(&value)) {
            TimestampSource::Found(p) => {
                assert!(is_normalized(&p, gmt7()));
                assert_eq!(p, ParsedDateTime::Aware(dt));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
