use std::fmt;

use serde::ser::Error as _;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Literal placeholder written in place of missing or unparsable fields.
pub const UNKNOWN: &str = "Unknown";

/// A field value that is either known or replaced by the `Unknown` sentinel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    Known(T),
    Unknown,
}

impl<T> Field<T> {
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            Self::Unknown => None,
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Known(v),
            None => Self::Unknown,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(v) => v.serialize(serializer),
            Self::Unknown => serializer.serialize_str(UNKNOWN),
        }
    }
}

/// Canonical post timestamp, always held in UTC.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(pub OffsetDateTime);

impl Timestamp {
    pub fn date(&self) -> time::Date {
        self.0.date()
    }

    pub fn to_rfc3339(&self) -> Option<String> {
        self.0.format(&Rfc3339).ok()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_rfc3339() {
            Some(s) => f.write_str(&s),
            None => write!(f, "{}", self.0),
        }
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = self
            .to_rfc3339()
            .ok_or_else(|| S::Error::custom("timestamp out of RFC 3339 range"))?;
        serializer.serialize_str(&s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// Decision rule over a polarity score. Zero is neutral.
    pub fn from_polarity(score: f64) -> Self {
        if score > 0.0 {
            Self::Positive
        } else if score < 0.0 {
            Self::Negative
        } else {
            Self::Neutral
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "positive" => Some(Self::Positive),
            "negative" => Some(Self::Negative),
            "neutral" => Some(Self::Neutral),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Positive => "Positive",
            Self::Negative => "Negative",
            Self::Neutral => "Neutral",
        }
    }
}

impl fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a retweet attribution was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RetweetOrigin {
    /// An explicit retweet-target column (`user_rt`).
    Column,
    /// A leading `RT @handle` in the post text.
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RetweetSource {
    pub handle: String,
    pub origin: RetweetOrigin,
}

/// One row as handed over by the ingestion side, before normalization.
///
/// Every column is optional and may carry a string, a number or null.
/// Scraper exports name some columns differently (`username`, `tweet`,
/// `user_rt`); those are kept apart so a row carrying both spellings still
/// parses, and the canonical column wins when both hold a value.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tweet: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweet_count: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub like_count: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retweet_of: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_rt: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sentiment: Option<Value>,
}

fn first_present<'a>(
    primary: &'a Option<Value>,
    fallback: &'a Option<Value>,
) -> Option<&'a Value> {
    primary
        .as_ref()
        .filter(|v| !v.is_null())
        .or_else(|| fallback.as_ref())
}

impl RawRecord {
    pub fn author_column(&self) -> Option<&Value> {
        first_present(&self.author, &self.username)
    }

    pub fn text_column(&self) -> Option<&Value> {
        first_present(&self.text, &self.tweet)
    }

    pub fn retweet_column(&self) -> Option<&Value> {
        first_present(&self.retweet_of, &self.user_rt)
    }
}

/// A normalized post. `id` is the row ordinal in the source record set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Post {
    pub id: usize,
    pub author: Field<String>,
    pub text: Field<String>,
    pub created_at: Field<Timestamp>,
    pub retweet_count: Field<u64>,
    pub like_count: Field<u64>,
    pub retweet_of: Field<String>,
    pub sentiment: Option<SentimentLabel>,
    pub mentions: Vec<String>,
    pub retweet_source: Option<RetweetSource>,
}

impl Post {
    /// A post with every field unknown, mostly useful as a base in tests.
    pub fn empty(id: usize) -> Self {
        Self {
            id,
            author: Field::Unknown,
            text: Field::Unknown,
            created_at: Field::Unknown,
            retweet_count: Field::Unknown,
            like_count: Field::Unknown,
            retweet_of: Field::Unknown,
            sentiment: None,
            mentions: Vec::new(),
            retweet_source: None,
        }
    }

    /// The acting account, if one can be attributed.
    pub fn actor(&self) -> Option<&str> {
        self.author
            .known()
            .map(|s| s.as_str())
            .filter(|s| !s.is_empty())
    }

    /// Text to analyze; the sentinel reads as no text at all.
    pub fn text_or_empty(&self) -> &str {
        self.text.known().map(|s| s.as_str()).unwrap_or("")
    }

    /// Converts back to a raw record. Derived columns are dropped.
    pub fn to_record(&self) -> RawRecord {
        fn string(field: &Field<String>) -> Value {
            match field {
                Field::Known(s) => Value::String(s.clone()),
                Field::Unknown => Value::String(UNKNOWN.to_owned()),
            }
        }
        fn count(field: &Field<u64>) -> Value {
            match field {
                Field::Known(n) => Value::from(*n),
                Field::Unknown => Value::String(UNKNOWN.to_owned()),
            }
        }

        let created_at = self
            .created_at
            .known()
            .and_then(Timestamp::to_rfc3339)
            .unwrap_or_else(|| UNKNOWN.to_owned());

        RawRecord {
            author: Some(string(&self.author)),
            text: Some(string(&self.text)),
            created_at: Some(Value::String(created_at)),
            retweet_count: Some(count(&self.retweet_count)),
            like_count: Some(count(&self.like_count)),
            retweet_of: Some(string(&self.retweet_of)),
            sentiment: self.sentiment.map(|l| Value::String(l.as_str().to_owned())),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_unknown_serializes_as_sentinel() {
        let known: Field<String> = Field::Known(String::new());
        let unknown: Field<String> = Field::Unknown;
        assert_eq!(serde_json::to_string(&known).unwrap(), "\"\"");
        assert_eq!(serde_json::to_string(&unknown).unwrap(), "\"Unknown\"");
    }

    #[test]
    fn test_label_decision_boundary() {
        assert_eq!(SentimentLabel::from_polarity(0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_polarity(-0.0), SentimentLabel::Neutral);
        assert_eq!(SentimentLabel::from_polarity(1e-9), SentimentLabel::Positive);
        assert_eq!(SentimentLabel::from_polarity(-1e-9), SentimentLabel::Negative);
    }

    #[test]
    fn test_label_parse() {
        assert_eq!(SentimentLabel::parse(" positive"), Some(SentimentLabel::Positive));
        assert_eq!(SentimentLabel::parse("NEUTRAL"), Some(SentimentLabel::Neutral));
        assert_eq!(SentimentLabel::parse("meh"), None);
    }

    #[test]
    fn test_record_alternate_columns() {
        let record: RawRecord =
            serde_json::from_str(r#"{"username":"alice","tweet":"hi","user_rt":null}"#).unwrap();
        assert_eq!(record.author_column(), Some(&Value::from("alice")));
        assert_eq!(record.text_column(), Some(&Value::from("hi")));
        assert_eq!(record.retweet_column(), None);
    }

    #[test]
    fn test_canonical_column_wins() {
        let record: RawRecord = serde_json::from_str(
            r#"{"author":"a","username":"b","text":null,"tweet":"x","retweet_of":"c","user_rt":"d"}"#,
        )
        .unwrap();
        assert_eq!(record.author_column(), Some(&Value::from("a")));
        assert_eq!(record.text_column(), Some(&Value::from("x")));
        assert_eq!(record.retweet_column(), Some(&Value::from("c")));
    }

    #[test]
    fn test_actor_skips_unknown_and_empty() {
        let mut post = Post::empty(0);
        assert_eq!(post.actor(), None);
        post.author = Field::Known(String::new());
        assert_eq!(post.actor(), None);
        post.author = Field::Known("bob".into());
        assert_eq!(post.actor(), Some("bob"));
    }
}
