use chrono::NaiveDate;

use crate::db::EntryChanges;
use crate::models::{EntryRequest, Mood};

pub const MAX_TITLE_CHARS: usize = 20;
pub const MAX_CONTENT_CHARS: usize = 1500;
pub const MAX_SEARCH_CHARS: usize = 100;

/// Validate a create/update payload. The error is the message returned
/// with a 422.
pub fn validate_entry_request(request: &EntryRequest) -> Result<EntryChanges, String> {
    let (Some(title), Some(content), Some(mood)) = (
        non_blank(&request.title),
        non_blank(&request.content),
        non_blank(&request.mood),
    ) else {
        return Err("Please submit with required fields!".to_string());
    };

    let date = request
        .date
        .as_deref()
        .and_then(parse_date)
        .ok_or_else(|| "Please provide a valid date!".to_string())?;

    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(format!("Title length should not be more than {} characters!", MAX_TITLE_CHARS));
    }

    if content.chars().count() > MAX_CONTENT_CHARS {
        return Err(format!("Content length should not be more than {} characters", MAX_CONTENT_CHARS));
    }

    let mood = Mood::parse(mood).ok_or_else(|| "Please provide a valid mood!".to_string())?;

    Ok(EntryChanges {
        date,
        title: title.to_string(),
        mood,
        content: content.to_string(),
    })
}

/// Validate the search text from the query string
pub fn validate_search_text(text: Option<&str>) -> Result<&str, SearchTextError> {
    let text = text.map(str::trim).filter(|t| !t.is_empty()).ok_or(SearchTextError::Missing)?;
    if text.chars().count() > MAX_SEARCH_CHARS {
        return Err(SearchTextError::TooLong);
    }
    Ok(text)
}

#[derive(Debug, PartialEq, Eq)]
pub enum SearchTextError {
    Missing,
    TooLong,
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

// Accepts plain dates and RFC 3339 timestamps, which browsers send for date inputs
fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| chrono::DateTime::parse_from_rfc3339(value).ok().map(|d| d.date_naive()))
}
