//! Date extraction: pull the `NGAY_THANG:` marker out of a provider answer.
//!
//! Every instruction asks the model to open its answer with
//! `NGAY_THANG: YYYY-MM-DD`, or `NGAY_THANG: Khong tim thay` when the
//! document carries no date. The marker is only an ordering hint, so this
//! stage never fails: anything it cannot read collapses to `date = None`.
//!
//! Whenever a marker is found it is removed from the content, whether or not
//! its value parses, so it never reaches the rendered document.

use crate::output::AnalysisResult;
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, warn};

/// Marker prefix the model is instructed to emit.
pub const DATE_MARKER: &str = "NGAY_THANG:";

/// Marker value meaning "the document has no date".
pub const DATE_NOT_FOUND: &str = "Khong tim thay";

// The first marker occurrence, up to and including its line break. The
// value ends at the first newline (or at end of input). Anything before the
// marker on the same line (e.g. `**`) belongs to the marker line.
static RE_DATE_MARKER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"NGAY_THANG:[ \t]*([^\r\n]*)(?:\r?\n|\z)").unwrap());

/// Split a raw answer into content and document date.
///
/// - no marker: content is returned unchanged, date is `None`
/// - marker with the not-found sentinel: marker stripped, date is `None`
/// - marker with `YYYY-MM-DD` naming a real day: marker stripped, date set
/// - marker with anything else (including `2023-02-30`): marker stripped,
///   date is `None`
///
/// The whole line holding the marker is removed, including decoration
/// before it. When a marker is stripped, the remaining content is trimmed.
pub fn extract(raw: &str) -> AnalysisResult {
    let Some(caps) = RE_DATE_MARKER.captures(raw) else {
        debug!("No date marker in response");
        return AnalysisResult::new(raw, None);
    };

    let whole = caps.get(0).map(|m| m.range()).unwrap_or(0..0);
    let value = caps
        .get(1)
        .map(|m| m.as_str().trim_matches(|c: char| matches!(c, '*' | '`' | '_') || c.is_whitespace()))
        .unwrap_or("");
    let line_start = raw[..whole.start].rfind('\n').map_or(0, |i| i + 1);

    let mut content = String::with_capacity(raw.len());
    content.push_str(&raw[..line_start]);
    content.push_str(&raw[whole.end..]);
    let content = content.trim().to_string();

    let date = if value.eq_ignore_ascii_case(DATE_NOT_FOUND) {
        debug!("Date marker reports no date");
        None
    } else {
        let parsed = parse_ymd(value);
        if parsed.is_none() {
            warn!("Unparsable date marker value {:?}; sorting last", value);
        }
        parsed
    };

    AnalysisResult::new(content, date)
}

/// Parse `YYYY-MM-DD` into a calendar date.
///
/// The components are validated by constructing the date: month 13 or
/// February 30 have no calendar counterpart and yield `None`. Surrounding
/// markdown emphasis or backticks that models like to add are ignored.
pub fn parse_ymd(value: &str) -> Option<NaiveDate> {
    let value = value.trim_matches(|c: char| c == '*' || c == '`' || c == '_' || c.is_whitespace());
    let mut it = value.split('-');
    let (y, m, d) = (it.next()?, it.next()?, it.next()?);
    if it.next().is_some() {
        return None;
    }
    let all_digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());
    if !(all_digits(y) && all_digits(m) && all_digits(d)) || y.len() != 4 {
        return None;
    }
    let year: i32 = y.parse().ok()?;
    let month: u32 = m.parse().ok()?;
    let day: u32 = d.parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}
