use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// A parsed date-time, keeping whether the source carried an offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParsedDateTime {
    Aware(DateTime<FixedOffset>),
    Naive(NaiveDateTime),
}

impl ParsedDateTime {
    /// Naive values are taken to be UTC.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            ParsedDateTime::Aware(dt) => dt.with_timezone(&Utc),
            ParsedDateTime::Naive(naive) => Utc.from_utc_datetime(naive),
        }
    }

    pub fn is_naive(&self) -> bool {
        matches!(self, ParsedDateTime::Naive(_))
    }
}

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
    "%Y-%m-%d %H:%M:%S%.f%#z",
    "%Y-%m-%dT%H:%M:%S%.f%#z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
    "%Y/%m/%d %H:%M",
    "%m/%d/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M",
    "%B %d, %Y %H:%M:%S",
    "%B %d, %Y %H:%M",
    "%d %B %Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y/%m/%d",
    "%m/%d/%Y",
    "%B %d, %Y",
    "%d %B %Y",
];

/// Parse the date-time shapes that show up in article exports and graph attributes.
///
/// Accepts RFC 3339, RFC 2822, ISO-like `YYYY-MM-DD[ T]HH:MM[:SS[.f]]` with an optional
/// `Z`/`±HH:MM`/`±HHMM`/`±HH` suffix, `YYYY/MM/DD HH:MM:SS`, month-name forms
/// (`March 21, 2025`, `21 Mar 2025`, optionally with a time), and the bare
/// dates `YYYY-MM-DD`, `YYYY/MM/DD`, `MM/DD/YYYY` (midnight).
pub fn parse_datetime(raw: &str) -> Option<ParsedDateTime> {
    let s = raw.trim().trim_matches('"').trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(ParsedDateTime::Aware(dt));
    }
    if let Ok(dt) = DateTime::parse_from_rfc2822(s) {
        return Some(ParsedDateTime::Aware(dt));
    }
    for fmt in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(s, fmt) {
            return Some(ParsedDateTime::Aware(dt));
        }
    }

    // A trailing `Z` on an otherwise naive shape means UTC.
    if let Some(stripped) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        if let Some(naive) = parse_naive(stripped) {
            return Some(ParsedDateTime::Aware(
                Utc.from_utc_datetime(&naive).fixed_offset(),
            ));
        }
        return None;
    }

    parse_naive(s).map(ParsedDateTime::Naive)
}

fn parse_naive(s: &str) -> Option<NaiveDateTime> {
    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(naive);
        }
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return date.and_hms_opt(0, 0, 0);
        }
    }
    None
}

/// Epoch seconds (possibly fractional) → UTC instant. `None` for NaN/inf or out of range.
pub fn from_epoch_seconds(secs: f64) -> Option<DateTime<Utc>> {
    if !secs.is_finite() {
        return None;
    }
    let whole = secs.floor();
    if whole < i64::MIN as f64 || whole > i64::MAX as f64 {
        return None;
    }
    let mut nanos = ((secs - whole) * 1e9).round() as u32;
    let mut whole = whole as i64;
    if nanos >= 1_000_000_000 {
        whole = whole.checked_add(1)?;
        nanos -= 1_000_000_000;
    }
    DateTime::from_timestamp(whole, nanos)
}
