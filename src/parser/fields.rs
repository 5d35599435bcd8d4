use chrono::NaiveDateTime;

use super::ParseError;
use crate::command::SortKey;
use crate::index::{Index, MultiIndex};

pub const INDEX_CONSTRAINT: &str = "Index must be a non-zero unsigned integer.";
pub const RANGE_FORMAT_CONSTRAINT: &str =
    "Index ranges must have the form START:END with a single ':'.";
pub const STATUS_CONSTRAINT: &str = "Status must be 'y' or 'n'.";
pub const EXAM_CONSTRAINT: &str = "Exam must be one of: midterm, final, practical, quiz.";
pub const WEEK_CONSTRAINT: &str = "Week must be an integer between 0 and 13.";
pub const ATTENDANCE_CONSTRAINT: &str =
    "Attendance filters must be [==|>=|<=|>|<]VALUE with VALUE between 0 and 100, e.g. >=75%.";
pub const NAME_CONSTRAINT: &str =
    "Names should only contain alphanumeric characters and spaces, and should not be blank.";
pub const PHONE_CONSTRAINT: &str =
    "Phone numbers should only contain digits, and should be at least 3 digits long.";
pub const EMAIL_CONSTRAINT: &str = "Emails should be of the form local-part@domain.";
pub const STUDENT_ID_CONSTRAINT: &str =
    "Student IDs should be 'A' followed by 7 digits and a letter, e.g. A0217529M.";
pub const GITHUB_CONSTRAINT: &str =
    "GitHub usernames should only contain alphanumeric characters or hyphens, and cannot start with a hyphen.";
pub const TAG_CONSTRAINT: &str = "Tags should be a single alphanumeric word.";
pub const SORT_CONSTRAINT: &str = "Sort criterion must be one of: name, id, github.";

pub const EXAM_NAMES: [&str; 4] = ["midterm", "final", "practical", "quiz"];
pub const LAST_WEEK: u8 = 13;

/// Accepted in order: ISO-8601 local date-time (with or without seconds),
/// then the two human-friendly patterns. First match wins.
const DATE_TIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%d %b %Y, %H:%M",
    "%d %b %Y %H:%M",
];

pub fn parse_index(raw: &str) -> Result<Index, ParseError> {
    let trimmed = raw.trim();
    // Overflow and junk both fall out of the integer parse with the same
    // fixed constraint message.
    let value: usize = trimmed
        .parse()
        .map_err(|_| ParseError::new(INDEX_CONSTRAINT))?;
    if value == 0 {
        return Err(ParseError::new(INDEX_CONSTRAINT));
    }
    Ok(Index::from_one_based(value))
}

pub fn parse_multi_index(raw: &str) -> Result<MultiIndex, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(INDEX_CONSTRAINT));
    }
    let mut parts = trimmed.split(':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(single), None, _) => Ok(MultiIndex::single(parse_index(single)?)),
        (Some(low), Some(high), None) => {
            let lower = parse_index(low)?;
            let upper = parse_index(high)?;
            if lower > upper {
                return Err(ParseError::new(format!(
                    "Invalid index range {trimmed}: start must not exceed end."
                )));
            }
            Ok(MultiIndex::new(lower, upper))
        }
        _ => Err(ParseError::new(RANGE_FORMAT_CONSTRAINT)),
    }
}

pub fn parse_date_time(raw: &str) -> Result<NaiveDateTime, ParseError> {
    let trimmed = raw.trim();
    for format in DATE_TIME_FORMATS {
        if let Ok(parsed) = NaiveDateTime::parse_from_str(trimmed, format) {
            return Ok(parsed);
        }
    }
    Err(ParseError::new(format!(
        "Invalid date-time '{trimmed}'. Expected ISO-8601 (2024-03-04T14:00) or 'd MMM yyyy, HH:mm' (4 Mar 2024, 14:00)."
    )))
}

pub fn parse_status(raw: &str) -> Result<bool, ParseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "y" => Ok(true),
        "n" => Ok(false),
        _ => Err(ParseError::new(STATUS_CONSTRAINT)),
    }
}

/// Canonicalizes to lowercase; only the four known exam names are accepted.
pub fn parse_exam(raw: &str) -> Result<String, ParseError> {
    let name = raw.trim().to_ascii_lowercase();
    if EXAM_NAMES.contains(&name.as_str()) {
        Ok(name)
    } else {
        Err(ParseError::new(EXAM_CONSTRAINT))
    }
}

pub fn parse_week(raw: &str) -> Result<u8, ParseError> {
    let week: u8 = raw
        .trim()
        .parse()
        .map_err(|_| ParseError::new(WEEK_CONSTRAINT))?;
    if week > LAST_WEEK {
        return Err(ParseError::new(WEEK_CONSTRAINT));
    }
    Ok(week)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CmpOp {
    Eq,
    Ge,
    Le,
    Gt,
    Lt,
}

/// A comparison against a 0-100 percentage, e.g. `>=75%`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CmpExpr {
    pub op: CmpOp,
    pub value: u8,
}

impl CmpExpr {
    pub fn holds(&self, actual: u32) -> bool {
        let bound = u32::from(self.value);
        match self.op {
            CmpOp::Eq => actual == bound,
            CmpOp::Ge => actual >= bound,
            CmpOp::Le => actual <= bound,
            CmpOp::Gt => actual > bound,
            CmpOp::Lt => actual < bound,
        }
    }
}

/// Parses `[op]VALUE[%]`. Two-character operators are tried before their
/// one-character prefixes. With `op_required` a bare number is rejected;
/// otherwise it reads as an exact match.
pub fn parse_comparison(raw: &str, op_required: bool) -> Result<CmpExpr, ParseError> {
    let trimmed = raw.trim();
    let (op, rest) = if let Some(rest) = trimmed.strip_prefix(">=") {
        (Some(CmpOp::Ge), rest)
    } else if let Some(rest) = trimmed.strip_prefix("<=") {
        (Some(CmpOp::Le), rest)
    } else if let Some(rest) = trimmed.strip_prefix("==") {
        (Some(CmpOp::Eq), rest)
    } else if let Some(rest) = trimmed.strip_prefix('>') {
        (Some(CmpOp::Gt), rest)
    } else if let Some(rest) = trimmed.strip_prefix('<') {
        (Some(CmpOp::Lt), rest)
    } else {
        (None, trimmed)
    };
    let op = match op {
        Some(op) => op,
        None if op_required => return Err(ParseError::new(ATTENDANCE_CONSTRAINT)),
        None => CmpOp::Eq,
    };
    // At most one trailing percent sign.
    let rest = rest.trim();
    let digits = rest.strip_suffix('%').unwrap_or(rest).trim();
    let value: u8 = digits
        .parse()
        .map_err(|_| ParseError::new(ATTENDANCE_CONSTRAINT))?;
    if value > 100 {
        return Err(ParseError::new(ATTENDANCE_CONSTRAINT));
    }
    Ok(CmpExpr { op, value })
}

pub fn parse_name(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_alphanumeric() || c == ' ') {
        return Err(ParseError::new(NAME_CONSTRAINT));
    }
    Ok(trimmed.to_string())
}

pub fn parse_phone(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    if trimmed.len() < 3 || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return Err(ParseError::new(PHONE_CONSTRAINT));
    }
    Ok(trimmed.to_string())
}

pub fn parse_email(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    let Some((local, domain)) = trimmed.split_once('@') else {
        return Err(ParseError::new(EMAIL_CONSTRAINT));
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ParseError::new(EMAIL_CONSTRAINT));
    }
    Ok(trimmed.to_string())
}

pub fn parse_student_id(raw: &str) -> Result<String, ParseError> {
    let id = raw.trim().to_ascii_uppercase();
    let bytes = id.as_bytes();
    let well_formed = bytes.len() == 9
        && bytes[0] == b'A'
        && bytes[1..8].iter().all(u8::is_ascii_digit)
        && bytes[8].is_ascii_alphabetic();
    if well_formed {
        Ok(id)
    } else {
        Err(ParseError::new(STUDENT_ID_CONSTRAINT))
    }
}

pub fn parse_github(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    let well_formed = !trimmed.is_empty()
        && !trimmed.starts_with('-')
        && trimmed.chars().all(|c| c.is_alphanumeric() || c == '-');
    if well_formed {
        Ok(trimmed.to_string())
    } else {
        Err(ParseError::new(GITHUB_CONSTRAINT))
    }
}

pub fn parse_tag(raw: &str) -> Result<String, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || !trimmed.chars().all(char::is_alphanumeric) {
        return Err(ParseError::new(TAG_CONSTRAINT));
    }
    Ok(trimmed.to_string())
}

pub fn parse_sort_key(raw: &str) -> Result<SortKey, ParseError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "name" => Ok(SortKey::Name),
        "id" => Ok(SortKey::StudentId),
        "github" => Ok(SortKey::Github),
        _ => Err(ParseError::new(SORT_CONSTRAINT)),
    }
}
