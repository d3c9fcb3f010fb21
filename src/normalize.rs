use once_cell::sync::Lazy;
use rayon::prelude::*;
use regex::Regex;
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::format_description::FormatItem;
use time::macros::format_description;
use time::{Date, OffsetDateTime, PrimitiveDateTime, UtcOffset};

use crate::error::AnalysisError;
use crate::post::{Field, Post, RawRecord, SentimentLabel, Timestamp, UNKNOWN};

/// Result of normalizing a record source.
///
/// When the source could not be obtained, `posts` is empty and `failure`
/// holds the reason; the rest of the pipeline keeps going on empty input.
#[derive(Debug, Default)]
pub struct Normalized {
    pub posts: Vec<Post>,
    pub failure: Option<AnalysisError>,
}

pub fn normalize_source(source: Result<Vec<RawRecord>, AnalysisError>) -> Normalized {
    match source {
        Ok(records) => Normalized {
            posts: normalize_records(&records),
            failure: None,
        },
        Err(e) => {
            tracing::error!(error = %e, "record source unavailable, continuing with no posts");
            Normalized {
                posts: Vec::new(),
                failure: Some(e),
            }
        }
    }
}

/// Normalizes every record independently; `id` is the row ordinal.
pub fn normalize_records(records: &[RawRecord]) -> Vec<Post> {
    let posts: Vec<Post> = records
        .par_iter()
        .enumerate()
        .map(|(id, record)| normalize_record(id, record))
        .collect();
    tracing::debug!(count = posts.len(), "normalized records");
    posts
}

pub fn normalize_record(id: usize, record: &RawRecord) -> Post {
    Post {
        id,
        author: parse_string(record.author_column()),
        text: parse_string(record.text_column()),
        created_at: record
            .created_at
            .as_ref()
            .and_then(Value::as_str)
            .and_then(parse_created_at)
            .into(),
        retweet_count: parse_count(record.retweet_count.as_ref()),
        like_count: parse_count(record.like_count.as_ref()),
        retweet_of: parse_handle(record.retweet_column()),
        sentiment: record
            .sentiment
            .as_ref()
            .and_then(Value::as_str)
            .and_then(SentimentLabel::parse),
        mentions: Vec::new(),
        retweet_source: None,
    }
}

fn parse_string(value: Option<&Value>) -> Field<String> {
    match value {
        Some(Value::String(s)) if s == UNKNOWN => Field::Unknown,
        Some(Value::String(s)) => Field::Known(s.clone()),
        Some(Value::Number(n)) => Field::Known(n.to_string()),
        Some(Value::Bool(b)) => Field::Known(b.to_string()),
        _ => Field::Unknown,
    }
}

fn parse_handle(value: Option<&Value>) -> Field<String> {
    match parse_string(value) {
        Field::Known(s) => {
            let handle = s
                .trim_start_matches(|c: char| c == '@' || c.is_whitespace())
                .trim_end();
            if handle.is_empty() || handle == UNKNOWN {
                Field::Unknown
            } else {
                Field::Known(handle.to_owned())
            }
        }
        Field::Unknown => Field::Unknown,
    }
}

pub fn parse_count(value: Option<&Value>) -> Field<u64> {
    let count = match value {
        Some(Value::Number(n)) => n.as_u64().or_else(|| n.as_f64().and_then(integral)),
        Some(Value::String(s)) => {
            let s = s.trim();
            s.parse::<u64>()
                .ok()
                .or_else(|| s.parse::<f64>().ok().and_then(integral))
        }
        _ => None,
    };
    count.into()
}

fn integral(f: f64) -> Option<u64> {
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f < u64::MAX as f64 {
        Some(f as u64)
    } else {
        None
    }
}

static TIMEZONE_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?P<stamp>.*?)\s+[A-Z]{2,5}$").unwrap());

static DATETIME_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
static DATETIME_SUBSECOND_FORMAT: &[FormatItem<'_>] =
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]");
static DATE_FORMAT: &[FormatItem<'_>] = format_description!("[year]-[month]-[day]");

/// Parses a `created_at` value after dropping a trailing timezone marker
/// such as ` WIB`. Naive timestamps are taken as UTC.
pub fn parse_created_at(raw: &str) -> Option<Timestamp> {
    let raw = raw.trim();
    let stamp = match TIMEZONE_SUFFIX_RE.captures(raw) {
        Some(caps) => caps.name("stamp").map_or(raw, |m| m.as_str()),
        None => raw,
    };

    if let Ok(t) = OffsetDateTime::parse(stamp, &Rfc3339) {
        return Some(Timestamp(t.to_offset(UtcOffset::UTC)));
    }

    let naive = PrimitiveDateTime::parse(stamp, DATETIME_FORMAT)
        .or_else(|_| PrimitiveDateTime::parse(stamp, DATETIME_SUBSECOND_FORMAT))
        .or_else(|_| Date::parse(stamp, DATE_FORMAT).map(Date::midnight))
        .ok()?;
    Some(Timestamp(naive.assume_utc()))
}
