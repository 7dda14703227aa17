use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::DateError;

pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub id: i64,
    pub title: String,
    pub author: String,
    #[serde(rename = "publishedDate")]
    pub published_date: NaiveDate,
}

/// A book that has not been written to the store yet, so it has no id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    #[serde(rename = "publishedDate")]
    pub published_date: NaiveDate,
}

impl NewBook {
    pub fn with_id(self, id: i64) -> Book {
        Book {
            id,
            title: self.title,
            author: self.author,
            published_date: self.published_date,
        }
    }
}

/// Parses a zero-padded `YYYY-MM-DD` date. chrono alone also takes short
/// years, unpadded fields, signs and padding spaces, so the layout is checked first.
pub fn parse_date(s: &str) -> Result<NaiveDate, DateError> {
    let canonical = s.len() == 10
        && s.bytes().enumerate().all(|(i, b)| match i {
            4 | 7 => b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !canonical {
        return Err(DateError::Layout(s.to_string()));
    }

    Ok(NaiveDate::parse_from_str(s, DATE_FORMAT)?)
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}
