use crate::cbor::{Value, TAG_DATE_TIME};
use serde::{Deserialize, Serialize};
use time::{format_description::well_known::Rfc3339, OffsetDateTime, UtcOffset};

/// The validity window the issuer signed into the MSO.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidityInfo {
    pub signed: Tdate,
    pub valid_from: Tdate,
    pub valid_until: Tdate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected_update: Option<Tdate>,
}

/// A `tdate`: an RFC 3339 date-time string under tag 0, in UTC without fractional seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Value", into = "Value")]
pub struct Tdate {
    datetime: OffsetDateTime,
    text: String,
}

type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("expected a tdate (tag 0 text), received: '{0:?}'")]
    NotATdate(Box<Value>),
    #[error("failed to parse date string as RFC 3339 date: {0}")]
    UnableToParseDate(#[from] time::error::Parse),
    #[error("failed to format date: {0}")]
    UnableToFormatDate(String),
}

impl Tdate {
    pub fn new(datetime: OffsetDateTime) -> Result<Self> {
        let datetime = datetime
            .to_offset(UtcOffset::UTC)
            .replace_nanosecond(0)
            .map_err(|e| Error::UnableToFormatDate(e.to_string()))?;
        let text = datetime
            .format(&Rfc3339)
            .map_err(|e| Error::UnableToFormatDate(e.to_string()))?;
        Ok(Self { datetime, text })
    }

    /// Parse a received date string, keeping the text as it was.
    pub fn parse(text: String) -> Result<Self> {
        let datetime = OffsetDateTime::parse(&text, &Rfc3339)?;
        Ok(Self { datetime, text })
    }

    pub fn datetime(&self) -> OffsetDateTime {
        self.datetime
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }
}

impl TryFrom<Value> for Tdate {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::Tag(TAG_DATE_TIME, inner) => match *inner {
                Value::Text(text) => Tdate::parse(text),
                other => Err(Error::NotATdate(Box::new(other))),
            },
            // Some issuers omit the tag.
            Value::Text(text) => Tdate::parse(text),
            other => Err(Error::NotATdate(Box::new(other))),
        }
    }
}

impl From<Tdate> for Value {
    fn from(t: Tdate) -> Value {
        Value::Tag(TAG_DATE_TIME, Box::new(Value::Text(t.text)))
    }
}

impl ValidityInfo {
    /// Whether `at` falls within `[validFrom, validUntil]`.
    pub fn contains(&self, at: OffsetDateTime) -> bool {
        self.valid_from.datetime <= at && at <= self.valid_until.datetime
    }
}
