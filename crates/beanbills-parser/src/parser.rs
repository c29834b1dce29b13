//! Header parsing and root-ledger extraction

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ParseError;
use crate::format::DATE_FORMAT;

/// Header fields recovered from the first line of a transaction.
///
/// Postings, documents and the payee/narration separator are not recovered.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedHeader {
    /// `None` when the leading token is not a `YYYY-MM-DD` date
    pub date: Option<NaiveDate>,
    pub flag: String,
    pub payee: Option<String>,
    pub narration: Option<String>,
    pub tags: Vec<String>,
    pub link: Option<String>,
}

/// Parse the header line of a transaction
pub fn parse_header(text: &str) -> Result<ParsedHeader, ParseError> {
    static HEADER: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    static TAG: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    static LINK: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();

    let header_regex = HEADER.get_or_init(|| {
        regex::Regex::new(r#"^([^ ]+) ([*!]) *("[^"]+")?[ |]*("[^"]+")?"#).unwrap()
    });
    let tag_regex = TAG.get_or_init(|| regex::Regex::new(r"#[\w-]+").unwrap());
    let link_regex = LINK.get_or_init(|| regex::Regex::new(r"\^[\w-]+").unwrap());

    let first_line = text.trim().lines().next().unwrap_or("").trim();

    let caps = header_regex.captures(first_line).ok_or(ParseError::NoMatches)?;

    let unquote = |i: usize| caps.get(i).map(|m| m.as_str().trim_matches('"').to_string());
    let (payee, narration) = match (unquote(3), unquote(4)) {
        (first, Some(second)) => (first, Some(second)),
        (first, None) => (None, first),
    };

    let date = caps
        .get(1)
        .and_then(|m| NaiveDate::parse_from_str(m.as_str(), DATE_FORMAT).ok());

    Ok(ParsedHeader {
        date,
        flag: caps.get(2).map(|m| m.as_str().to_string()).unwrap_or_default(),
        payee,
        narration,
        tags: tag_regex
            .find_iter(first_line)
            .map(|m| m.as_str().to_string())
            .collect(),
        link: link_regex.find(first_line).map(|m| m.as_str().to_string()),
    })
}

/// Accounts declared with `open` directives, in order of appearance
pub fn extract_open_accounts(text: &str) -> Vec<String> {
    static OPEN: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let open_regex =
        OPEN.get_or_init(|| regex::Regex::new(r"(?m)^[^ \n]+ +open +([^ \n]+)").unwrap());

    open_regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim_end_matches('\r').to_string())
        .collect()
}

/// Currencies from `option "operating_currency"` lines, in order of appearance
pub fn extract_operating_currencies(text: &str) -> Vec<String> {
    static OPTION: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let option_regex = OPTION.get_or_init(|| {
        regex::Regex::new(r#"(?m)^option "operating_currency" +"([^ \n"]+)""#).unwrap()
    });

    option_regex
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect()
}

/// Parse a `YYYY-MM-DD` date; only the first ten characters are significant
pub fn parse_date(value: &str) -> Result<NaiveDate, ParseError> {
    let trimmed = value.trim();
    let head = trimmed.get(..10).ok_or_else(|| ParseError::InvalidDate {
        value: value.to_string(),
    })?;
    NaiveDate::parse_from_str(head, DATE_FORMAT).map_err(|_| ParseError::InvalidDate {
        value: value.to_string(),
    })
}

/// Parse a decimal amount; blank text is zero
pub fn parse_amount(value: &str) -> Result<Decimal, ParseError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(Decimal::ZERO);
    }
    Decimal::from_str(&trimmed.replace(',', "")).map_err(|_| ParseError::InvalidAmount {
        value: value.to_string(),
    })
}

// ==================== Tests ====================
