// 🗓️ Date Normalizer - Every source date into one canonical calendar date
// Ordered list of pure strategies, first match wins
//
// Exports disagree on everything: spreadsheet serials, Unix seconds and
// milliseconds, ISO timestamps, day-first and month-first text, AM/PM stamps
// from the Google Workspace console and free text typed by HR.

use crate::diagnostics::Diagnostics;
use crate::table::RawValue;
use chrono::{DateTime, Days, NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Storage / round-trip form of every normalized date
pub const CANONICAL_FORMAT: &str = "%d-%m-%Y";

/// Login sentinel exported by the identity systems (compared case-insensitively)
pub const NEVER_LOGGED_IN: &str = "never logged in";

/// Serial day 25569 is 1970-01-01; anything at or below it is not treated as a serial
pub const SERIAL_UNIX_EPOCH: f64 = 25569.0;

/// Last serial a spreadsheet can hold (9999-12-31)
pub const SERIAL_MAX: f64 = 2_958_465.0;

// ============================================================================
// CANONICAL DATE
// ============================================================================

/// Calendar date with no time component; displays as DD-MM-YYYY
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CanonicalDate(NaiveDate);

impl CanonicalDate {
    pub fn new(date: NaiveDate) -> Self {
        CanonicalDate(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(CanonicalDate)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Midnight at the start of the date
    pub fn start_of_day(&self) -> NaiveDateTime {
        self.0.and_time(NaiveTime::MIN)
    }

    /// Whole days elapsed from this date's midnight to `now` (negative if `now` is earlier)
    pub fn days_until(&self, now: NaiveDateTime) -> i64 {
        (now - self.start_of_day()).num_days()
    }
}

impl fmt::Display for CanonicalDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(CANONICAL_FORMAT))
    }
}

impl FromStr for CanonicalDate {
    type Err = chrono::ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), CANONICAL_FORMAT).map(CanonicalDate)
    }
}

impl From<NaiveDate> for CanonicalDate {
    fn from(date: NaiveDate) -> Self {
        CanonicalDate(date)
    }
}

impl Serialize for CanonicalDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for CanonicalDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

// ============================================================================
// STRATEGIES
// ============================================================================

pub type StrategyFn = fn(&str) -> Option<NaiveDate>;

/// One named parsing attempt; input is already trimmed and non-empty
#[derive(Clone, Copy)]
pub struct DateStrategy {
    pub name: &'static str,
    pub parse: StrategyFn,
}

impl fmt::Debug for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DateStrategy").field("name", &self.name).finish()
    }
}

/// Default order. A later strategy only sees input every earlier one rejected.
pub const DEFAULT_STRATEGIES: &[DateStrategy] = &[
    DateStrategy {
        name: "spreadsheet_serial",
        parse: parse_spreadsheet_serial,
    },
    DateStrategy {
        name: "slash_datetime",
        parse: parse_slash_datetime,
    },
    DateStrategy {
        name: "explicit_formats",
        parse: parse_explicit_formats,
    },
    DateStrategy {
        name: "meridiem",
        parse: parse_meridiem,
    },
    DateStrategy {
        name: "unix_timestamp",
        parse: parse_unix_timestamp,
    },
    DateStrategy {
        name: "fuzzy_day_first",
        parse: parse_fuzzy_day_first,
    },
];

/// Formats tried in order by `parse_explicit_formats`
pub const EXPLICIT_FORMATS: &[&str] = &[
    // ISO
    "%Y-%m-%d",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.fZ",
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    // Day / month first
    "%d-%m-%Y",
    "%d/%m/%Y",
    "%m/%d/%Y",
    "%d-%m-%Y %H:%M:%S",
    "%d/%m/%Y %H:%M:%S",
    "%m/%d/%Y %H:%M:%S",
    // Google Workspace console
    "%Y/%m/%d %H:%M:%S",
];

/// Month-first AM/PM layouts, then day-first
const MERIDIEM_FORMATS: &[&str] = &[
    "%Y/%m/%d %I:%M:%S %p",
    "%Y-%m-%d %I:%M:%S %p",
    "%Y/%m/%d %I:%M %p",
    "%m/%d/%Y %I:%M:%S %p",
    "%m/%d/%Y %I:%M %p",
    "%d/%m/%Y %I:%M:%S %p",
    "%d/%m/%Y %I:%M %p",
    "%B %d, %Y %I:%M:%S %p",
    "%B %d, %Y, %I:%M:%S %p",
    "%B %d, %Y %I:%M %p",
    "%B %d, %Y, %I:%M %p",
    "%d %B %Y %I:%M %p",
];

fn parse_with_format(text: &str, format: &str) -> Option<NaiveDate> {
    NaiveDateTime::parse_from_str(text, format)
        .map(|dt| dt.date())
        .or_else(|_| NaiveDate::parse_from_str(text, format))
        .ok()
}

/// Digits with optional dots ("45444", "45444.25", "1717200000000")
fn is_numeric_literal(text: &str) -> bool {
    let mut digits = text.chars().filter(|c| *c != '.').peekable();
    digits.peek().is_some() && digits.all(|c| c.is_ascii_digit())
}

/// Spreadsheet serial day count, day 0 = 1899-12-30
pub fn parse_spreadsheet_serial(text: &str) -> Option<NaiveDate> {
    if !is_numeric_literal(text) {
        return None;
    }
    let serial: f64 = text.parse().ok()?;
    if serial <= SERIAL_UNIX_EPOCH || serial > SERIAL_MAX {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.trunc() as u64))
}

/// "YYYY/MM/DD HH:MM:SS"
pub fn parse_slash_datetime(text: &str) -> Option<NaiveDate> {
    if !(text.contains('/') && text.contains(':')) {
        return None;
    }
    NaiveDateTime::parse_from_str(&text.replace('/', "-"), "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.date())
}

pub fn parse_explicit_formats(text: &str) -> Option<NaiveDate> {
    EXPLICIT_FORMATS
        .iter()
        .find_map(|format| parse_with_format(text, format))
}

/// Text carrying AM/PM; month-first like most US console exports
pub fn parse_meridiem(text: &str) -> Option<NaiveDate> {
    let upper = text.to_uppercase();
    if !(upper.contains("AM") || upper.contains("PM")) {
        return None;
    }
    MERIDIEM_FORMATS
        .iter()
        .find_map(|format| parse_with_format(text, format))
        .or_else(|| fuzzy_date(text, DayOrder::MonthFirst))
}

/// Unix seconds, or milliseconds when longer than 10 characters (UTC)
pub fn parse_unix_timestamp(text: &str) -> Option<NaiveDate> {
    if !is_numeric_literal(text) {
        return None;
    }
    let value: f64 = text.parse().ok()?;
    let seconds = if text.len() > 10 { value / 1000.0 } else { value };
    DateTime::from_timestamp(seconds.trunc() as i64, 0).map(|dt| dt.date_naive())
}

pub fn parse_fuzzy_day_first(text: &str) -> Option<NaiveDate> {
    fuzzy_date(text, DayOrder::DayFirst)
}

// ============================================================================
// FUZZY PARSING
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DayOrder {
    DayFirst,
    MonthFirst,
}

const MONTHS: &[(&str, u32)] = &[
    ("january", 1),
    ("february", 2),
    ("march", 3),
    ("april", 4),
    ("may", 5),
    ("june", 6),
    ("july", 7),
    ("august", 8),
    ("september", 9),
    ("october", 10),
    ("november", 11),
    ("december", 12),
];

const ORDINAL_SUFFIXES: &[&str] = &["st", "nd", "rd", "th"];

fn month_from_name(word: &str) -> Option<u32> {
    let lower = word.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    if lower == "sept" {
        return Some(9);
    }
    MONTHS
        .iter()
        .find(|(name, _)| *name == lower || (lower.len() == 3 && name.starts_with(&lower)))
        .map(|(_, month)| *month)
}

/// Two-digit years pivot at 70 (00-69 → 2000s)
fn expand_year(value: u32, width: usize) -> Option<i32> {
    match width {
        4 => Some(value as i32),
        1 | 2 if value < 70 => Some(2000 + value as i32),
        1 | 2 => Some(1900 + value as i32),
        _ => None,
    }
}

/// Best-effort scan for day, month and year tokens.
///
/// Time components ("10:15:00", "AM"), weekday names and other words are
/// skipped. A month name pins the month; otherwise the first 4-digit token
/// decides between Y-M-D and day/month-first. A missing day means the 1st.
fn fuzzy_date(text: &str, order: DayOrder) -> Option<NaiveDate> {
    let mut numbers: Vec<(u32, usize)> = Vec::new();
    let mut named_month: Option<u32> = None;

    for word in text.split(|c: char| c.is_whitespace() || c == ',') {
        if word.contains(':') {
            continue;
        }
        for part in word.split(|c: char| c == '-' || c == '/' || c == '.') {
            let part = part.trim_matches(|c: char| !c.is_alphanumeric());
            if part.is_empty() {
                continue;
            }

            let digit_len = part.chars().take_while(|c| c.is_ascii_digit()).count();
            if digit_len > 0 {
                let suffix = part[digit_len..].to_lowercase();
                if suffix.is_empty() || ORDINAL_SUFFIXES.contains(&suffix.as_str()) {
                    let value: u32 = part[..digit_len].parse().ok()?;
                    numbers.push((value, digit_len));
                }
            } else if let Some(month) = month_from_name(part) {
                if named_month.replace(month).is_some() {
                    return None;
                }
            }
        }
    }

    let (year, month, day) = match (named_month, numbers.as_slice()) {
        (Some(month), [(y, 4)]) => (*y as i32, month, 1),
        (Some(month), [(y, 4), (d, _)]) | (Some(month), [(d, _), (y, 4)]) => {
            (*y as i32, month, *d)
        }
        (Some(month), [(d, _), (y, w)]) => (expand_year(*y, *w)?, month, *d),
        (None, [(y, 4), (m, _), (d, _)]) => (*y as i32, *m, *d),
        (None, [(a, _), (b, _), (y, w)]) => {
            let year = expand_year(*y, *w)?;
            let (mut day, mut month) = match order {
                DayOrder::DayFirst => (*a, *b),
                DayOrder::MonthFirst => (*b, *a),
            };
            if month > 12 && day <= 12 {
                std::mem::swap(&mut day, &mut month);
            }
            (year, month, day)
        }
        (None, [(m, w), (y, 4)]) if *w <= 2 => (*y as i32, *m, 1),
        _ => return None,
    };

    NaiveDate::from_ymd_opt(year, month, day)
}

// ============================================================================
// NORMALIZER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateOutcome {
    Parsed(CanonicalDate),
    /// Empty cell or the never-logged-in sentinel
    Blank,
    /// Every strategy rejected the value
    Unparseable,
}

impl DateOutcome {
    pub fn date(self) -> Option<CanonicalDate> {
        match self {
            DateOutcome::Parsed(date) => Some(date),
            _ => None,
        }
    }
}

pub struct DateNormalizer {
    strategies: Vec<DateStrategy>,
    diagnostics: Arc<dyn Diagnostics>,
}

impl DateNormalizer {
    pub fn new(diagnostics: Arc<dyn Diagnostics>) -> Self {
        DateNormalizer::with_strategies(DEFAULT_STRATEGIES.to_vec(), diagnostics)
    }

    pub fn with_strategies(strategies: Vec<DateStrategy>, diagnostics: Arc<dyn Diagnostics>) -> Self {
        DateNormalizer {
            strategies,
            diagnostics,
        }
    }

    pub fn strategies(&self) -> &[DateStrategy] {
        &self.strategies
    }

    /// Run the strategy chain without reporting anything
    pub fn classify(&self, raw: &RawValue) -> DateOutcome {
        if let RawValue::DateTime(dt) = raw {
            return DateOutcome::Parsed(CanonicalDate(dt.date()));
        }

        let text = match raw.text() {
            Some(text) => text,
            None => return DateOutcome::Blank,
        };
        if text.to_lowercase() == NEVER_LOGGED_IN {
            return DateOutcome::Blank;
        }

        self.strategies
            .iter()
            .find_map(|strategy| (strategy.parse)(&text))
            .map(|date| DateOutcome::Parsed(CanonicalDate(date)))
            .unwrap_or(DateOutcome::Unparseable)
    }

    /// Classify and report failures to the diagnostics sink
    pub fn outcome(&self, raw: &RawValue) -> DateOutcome {
        let outcome = self.classify(raw);
        if outcome == DateOutcome::Unparseable {
            self.diagnostics
                .warn("normalize", format!("Could not parse date: {}", raw));
        }
        outcome
    }

    /// Canonical date, or `None` for blanks and failures (failures are reported)
    pub fn normalize(&self, raw: &RawValue) -> Option<CanonicalDate> {
        self.outcome(raw).date()
    }

    pub fn normalize_str(&self, raw: &str) -> Option<CanonicalDate> {
        self.normalize(&RawValue::from_text(raw))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{CollectingDiagnostics, Level};

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn normalizer() -> (DateNormalizer, Arc<CollectingDiagnostics>) {
        let sink = Arc::new(CollectingDiagnostics::new());
        (DateNormalizer::new(sink.clone()), sink)
    }

    #[test]
    fn test_canonical_date_display_and_parse() {
        let date = CanonicalDate::from_ymd(2024, 6, 1).unwrap();
        assert_eq!(date.to_string(), "01-06-2024");
        assert_eq!("01-06-2024".parse::<CanonicalDate>().unwrap(), date);
    }

    #[test]
    fn test_days_until_counts_whole_days() {
        let date = CanonicalDate::from_ymd(2024, 6, 1).unwrap();
        let now = ymd(2024, 6, 11).and_hms_opt(15, 30, 0).unwrap();
        assert_eq!(date.days_until(now), 10);
    }

    #[test]
    fn test_spreadsheet_serial() {
        assert_eq!(parse_spreadsheet_serial("45444"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_spreadsheet_serial("45444.75"), Some(ymd(2024, 6, 1)));
        // At or before the 1970 anchor is not a serial
        assert_eq!(parse_spreadsheet_serial("25569"), None);
        assert_eq!(parse_spreadsheet_serial("1717200000"), None);
        assert_eq!(parse_spreadsheet_serial("1.2.3"), None);
    }

    #[test]
    fn test_slash_datetime() {
        assert_eq!(parse_slash_datetime("2024/06/01 10:15:30"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_slash_datetime("2024/06/01"), None);
    }

    #[test]
    fn test_explicit_formats() {
        assert_eq!(parse_explicit_formats("2024-06-01"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_explicit_formats("2024-06-01 08:00:00"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_explicit_formats("2024-06-01T08:00:00"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_explicit_formats("2024-06-01T08:00:00.123Z"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_explicit_formats("01-06-2024"), Some(ymd(2024, 6, 1)));
        // Day-first wins when both readings are valid
        assert_eq!(parse_explicit_formats("02/06/2024"), Some(ymd(2024, 6, 2)));
        // Month-first only when day-first is impossible
        assert_eq!(parse_explicit_formats("06/13/2024"), Some(ymd(2024, 6, 13)));
        assert_eq!(parse_explicit_formats("13/06/2024 09:00:00"), Some(ymd(2024, 6, 13)));
    }

    #[test]
    fn test_meridiem() {
        assert_eq!(parse_meridiem("2024/06/01 10:15:30 PM"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_meridiem("06/01/2024 10:15 AM"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_meridiem("June 1, 2024, 9:05:00 AM"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_meridiem("2024-06-01"), None);
    }

    #[test]
    fn test_unix_timestamp_seconds_and_millis() {
        assert_eq!(parse_unix_timestamp("1717200000"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_unix_timestamp("1717200000000"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_unix_timestamp("17172OOOOO"), None);
    }

    #[test]
    fn test_fuzzy_prefers_day_first() {
        assert_eq!(parse_fuzzy_day_first("3.6.24"), Some(ymd(2024, 6, 3)));
        assert_eq!(parse_fuzzy_day_first("1st June 2024"), Some(ymd(2024, 6, 1)));
        assert_eq!(
            parse_fuzzy_day_first("Saturday, 1 June 2024 10:15"),
            Some(ymd(2024, 6, 1))
        );
        assert_eq!(parse_fuzzy_day_first("June 2024"), Some(ymd(2024, 6, 1)));
        assert_eq!(parse_fuzzy_day_first("Jun 5 24"), Some(ymd(2024, 6, 5)));
        assert_eq!(parse_fuzzy_day_first("13/25/2024"), None);
        assert_eq!(parse_fuzzy_day_first("soon"), None);
    }

    #[test]
    fn test_blank_and_sentinel_are_silent() {
        let (normalizer, sink) = normalizer();

        assert_eq!(normalizer.normalize(&RawValue::Empty), None);
        assert_eq!(normalizer.normalize_str("   "), None);
        assert_eq!(normalizer.normalize_str("Never Logged In"), None);
        assert_eq!(
            normalizer.classify(&RawValue::from_text("NEVER LOGGED IN")),
            DateOutcome::Blank
        );

        assert!(sink.is_empty());
    }

    #[test]
    fn test_unparseable_is_reported_not_fatal() {
        let (normalizer, sink) = normalizer();

        assert_eq!(normalizer.normalize_str("next tuesday-ish"), None);

        let warnings = sink.at_least(Level::Warning);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].message.contains("next tuesday-ish"));
    }

    #[test]
    fn test_numbers_and_datetimes() {
        let (normalizer, _) = normalizer();
        let june_first = CanonicalDate::from_ymd(2024, 6, 1);

        assert_eq!(normalizer.normalize(&RawValue::Number(45444.0)), june_first);
        assert_eq!(normalizer.normalize(&RawValue::Number(1717200000.0)), june_first);
        let dt = ymd(2024, 6, 1).and_hms_opt(23, 59, 0).unwrap();
        assert_eq!(normalizer.normalize(&RawValue::DateTime(dt)), june_first);
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let (normalizer, sink) = normalizer();
        let inputs = [
            "45444",
            "2024/06/01 10:15:30",
            "2024-06-01T08:00:00.123Z",
            "01-06-2024",
            "06/13/2024",
            "2024/06/01 10:15:30 PM",
            "1717200000000",
            "1st June 2024",
            "31-12-1999",
        ];

        for input in inputs {
            let first = normalizer.normalize_str(input).expect(input);
            let second = normalizer.normalize_str(&first.to_string());
            assert_eq!(second, Some(first), "not idempotent for {}", input);
        }
        assert!(sink.is_empty());
    }

    #[test]
    fn test_strategy_order_is_configurable() {
        let sink = Arc::new(CollectingDiagnostics::new());
        let unix_only = DateNormalizer::with_strategies(
            vec![DateStrategy {
                name: "unix_timestamp",
                parse: parse_unix_timestamp,
            }],
            sink,
        );

        // Without the serial strategy first, 45444 reads as seconds since 1970
        assert_eq!(
            unix_only.normalize_str("45444"),
            CanonicalDate::from_ymd(1970, 1, 1)
        );
        assert_eq!(unix_only.strategies().len(), 1);
        assert_eq!(DEFAULT_STRATEGIES[0].name, "spreadsheet_serial");
    }
}
