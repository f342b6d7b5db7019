//! Leaf text classification
//!
//! [`classify`] picks the editing affordance for a leaf value. Checks run in a
//! fixed order and the first match wins, because the formats overlap: a
//! ten-digit string is both a plausible phone number and a plausible number.

use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use time::{Date, Month, Time};

/// Texts longer than this many characters are paragraphs
pub const PARAGRAPH_THRESHOLD: usize = 100;

/// Inferred semantic type of a leaf value
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum ContentKind {
    Email,
    Url,
    Phone,
    Date,
    Time,
    Currency,
    Number,
    Paragraph,
    Plain,
}

impl ContentKind {
    pub const ALL: [Self; 9] = [
        Self::Email,
        Self::Url,
        Self::Phone,
        Self::Date,
        Self::Time,
        Self::Currency,
        Self::Number,
        Self::Paragraph,
        Self::Plain,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Url => "url",
            Self::Phone => "phone",
            Self::Date => "date",
            Self::Time => "time",
            Self::Currency => "currency",
            Self::Number => "number",
            Self::Paragraph => "paragraph",
            Self::Plain => "plain",
        }
    }

    /// Editor hint for the kind, named after the matching HTML input type
    pub const fn input_hint(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Url => "url",
            Self::Phone => "tel",
            Self::Date => "date",
            Self::Time => "time",
            Self::Currency | Self::Number => "number",
            Self::Paragraph => "textarea",
            Self::Plain => "text",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

static EMAIL: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@.]+(\.[^\s@.]+)*\.[A-Za-z]{2,}$").ok());
static RELAXED_URL: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(?i)(www\.)?[a-z0-9](?:[a-z0-9-]*[a-z0-9])?(\.[a-z0-9](?:[a-z0-9-]*[a-z0-9])?)*\.[a-z]{2,6}(:\d+)?(/\S*)?$").ok()
});
static PHONE_CHARS: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"^\+?[\d\s()\-]+$").ok());
static ISO_DATE: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(\d{4})-(\d{2})-(\d{2})(?:[T ](\d{2}):(\d{2})(?::(\d{2})(?:\.\d+)?)?(?:Z|[+-]\d{2}:?\d{2})?)?$").ok()
});
static DAY_FIRST_DATE: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^(\d{1,2})([/-])(\d{1,2})([/-])(\d{4})$").ok());
static TIME: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^(\d{1,2}):(\d{2})(?::(\d{2}))?(?:\s?([AaPp][Mm]))?$").ok()
});
static CURRENCY_PREFIX: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^-?[$€£¥₹]\s?-?(\d{1,3}(,\d{3})+|\d+)(\.\d+)?$").ok()
});
static CURRENCY_SUFFIX: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^-?(\d{1,3}(,\d{3})+|\d+)(\.\d+)?\s?[A-Z]{3}$").ok());
static GROUPED_NUMBER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[+-]?\d{1,3}(,\d{3})+(\.\d+)?$").ok());

fn matches(pattern: &Lazy<Option<Regex>>, text: &str) -> bool {
    pattern.as_ref().is_some_and(|re| re.is_match(text))
}

/// Classify a text value. Total: every input yields exactly one kind.
pub fn classify(text: &str) -> ContentKind {
    classify_with_threshold(text, PARAGRAPH_THRESHOLD)
}

/// [`classify`] with a custom paragraph length threshold
pub fn classify_with_threshold(text: &str, paragraph_threshold: usize) -> ContentKind {
    let text = text.trim();
    if text.is_empty() {
        return ContentKind::Plain;
    }

    if is_email(text) {
        ContentKind::Email
    } else if is_url(text) {
        ContentKind::Url
    } else if is_phone(text) {
        ContentKind::Phone
    } else if is_date(text) {
        ContentKind::Date
    } else if is_time(text) {
        ContentKind::Time
    } else if is_currency(text) {
        ContentKind::Currency
    } else if is_number(text) {
        ContentKind::Number
    } else if text.chars().count() > paragraph_threshold {
        ContentKind::Paragraph
    } else {
        ContentKind::Plain
    }
}

pub fn is_email(text: &str) -> bool {
    matches(&EMAIL, text)
}

pub fn is_url(text: &str) -> bool {
    if text.contains("://") {
        return url::Url::parse(text).is_ok_and(|url| url.has_host());
    }
    matches(&RELAXED_URL, text)
}

pub fn is_phone(text: &str) -> bool {
    if !matches(&PHONE_CHARS, text) || is_date_shaped(text) {
        return false;
    }
    let digits = text.chars().filter(char::is_ascii_digit).count();
    if !(7..=15).contains(&digits) {
        return false;
    }
    // a leading minus with no other separator is a negative number
    let separators = text.chars().filter(|c| !c.is_ascii_digit()).count();
    !(text.starts_with('-') && separators == 1)
}

/// Matches one of the date layouts, valid or not
fn is_date_shaped(text: &str) -> bool {
    matches(&ISO_DATE, text) || matches(&DAY_FIRST_DATE, text)
}

/// Date-shaped token that is also a real calendar date
pub fn is_date(text: &str) -> bool {
    if let Some(caps) = ISO_DATE.as_ref().and_then(|re| re.captures(text)) {
        let date_ok = valid_date(field(&caps, 1), field(&caps, 2), field(&caps, 3));
        let time_ok = match (caps.get(4), caps.get(5)) {
            (Some(hour), Some(minute)) => valid_time(
                hour.as_str().parse().ok(),
                minute.as_str().parse().ok(),
                caps.get(6).map_or(Some(0), |s| s.as_str().parse().ok()),
            ),
            _ => true,
        };
        return date_ok && time_ok;
    }
    if let Some(caps) = DAY_FIRST_DATE.as_ref().and_then(|re| re.captures(text)) {
        // both separators must agree: 15/01/2024 or 15-01-2024
        if caps.get(2).map(|m| m.as_str()) != caps.get(4).map(|m| m.as_str()) {
            return false;
        }
        return valid_date(field(&caps, 5), field(&caps, 3), field(&caps, 1));
    }
    false
}

pub fn is_time(text: &str) -> bool {
    let Some(caps) = TIME.as_ref().and_then(|re| re.captures(text)) else {
        return false;
    };
    let hour: Option<u8> = caps.get(1).and_then(|m| m.as_str().parse().ok());
    let minute = caps.get(2).and_then(|m| m.as_str().parse().ok());
    let second = caps.get(3).map_or(Some(0), |m| m.as_str().parse().ok());

    match (caps.get(4), hour) {
        (Some(_), Some(h)) if !(1..=12).contains(&h) => false,
        _ => valid_time(hour, minute, second),
    }
}

pub fn is_currency(text: &str) -> bool {
    matches(&CURRENCY_PREFIX, text) || matches(&CURRENCY_SUFFIX, text)
}

pub fn is_number(text: &str) -> bool {
    if text.chars().any(char::is_alphabetic) && !is_exponent_form(text) {
        return false;
    }
    if text.contains(char::is_whitespace) || text.contains(['(', ')']) {
        return false;
    }
    // internal dashes make it date-like or phone-like
    if text.get(1..).is_some_and(|rest| rest.contains('-') && !is_exponent_form(text)) {
        return false;
    }
    let candidate = if matches(&GROUPED_NUMBER, text) {
        text.replace(',', "")
    } else {
        text.to_string()
    };
    candidate.parse::<f64>().is_ok_and(f64::is_finite)
}

fn is_exponent_form(text: &str) -> bool {
    let mut parts = text.splitn(2, ['e', 'E']);
    match (parts.next(), parts.next()) {
        (Some(mantissa), Some(exponent)) => {
            !mantissa.is_empty()
                && mantissa
                    .trim_start_matches(['+', '-'])
                    .chars()
                    .all(|c| c.is_ascii_digit() || c == '.')
                && exponent
                    .trim_start_matches(['+', '-'])
                    .chars()
                    .all(|c| c.is_ascii_digit())
                && exponent.chars().any(|c| c.is_ascii_digit())
        }
        _ => false,
    }
}

fn field(caps: &regex::Captures<'_>, index: usize) -> Option<u32> {
    caps.get(index).and_then(|m| m.as_str().parse().ok())
}

fn valid_date(year: Option<u32>, month: Option<u32>, day: Option<u32>) -> bool {
    let (Some(year), Some(month), Some(day)) = (year, month, day) else {
        return false;
    };
    let Ok(year) = i32::try_from(year) else {
        return false;
    };
    let Some(month) = u8::try_from(month).ok().and_then(|m| Month::try_from(m).ok()) else {
        return false;
    };
    let Ok(day) = u8::try_from(day) else {
        return false;
    };
    Date::from_calendar_date(year, month, day).is_ok()
}

fn valid_time(hour: Option<u8>, minute: Option<u8>, second: Option<u8>) -> bool {
    match (hour, minute, second) {
        (Some(h), Some(m), Some(s)) => Time::from_hms(h, m, s).is_ok(),
        _ => false,
    }
}
