use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Unknown date style: {0} (expected en-us, en-gb or iso)")]
    UnknownDateStyle(String),
    #[error("UTC offset out of range: {0} minutes")]
    InvalidUtcOffset(i32),
}

/// Locale used when rendering capture dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DateStyle {
    /// `1/1/2023, 12:00:00 PM`
    #[default]
    EnUs,
    /// `01/01/2023, 12:00:00`
    EnGb,
    /// `2023-01-01 12:00:00`
    Iso,
}

impl DateStyle {
    pub(crate) fn pattern(self) -> &'static str {
        match self {
            DateStyle::EnUs => "%-m/%-d/%Y, %-I:%M:%S %p",
            DateStyle::EnGb => "%d/%m/%Y, %H:%M:%S",
            DateStyle::Iso => "%Y-%m-%d %H:%M:%S",
        }
    }
}

impl FromStr for DateStyle {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "en-us" => Ok(DateStyle::EnUs),
            "en-gb" => Ok(DateStyle::EnGb),
            "iso" => Ok(DateStyle::Iso),
            _ => Err(ContextError::UnknownDateStyle(s.to_string())),
        }
    }
}

impl fmt::Display for DateStyle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            DateStyle::EnUs => write!(f, "en-us"),
            DateStyle::EnGb => write!(f, "en-gb"),
            DateStyle::Iso => write!(f, "iso"),
        }
    }
}

/// Everything the client needs to know about where it runs: backend address
/// and display locale. Passed explicitly to the resolver and the controller.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientContext {
    base_url: String,
    date_style: DateStyle,
    utc_offset: FixedOffset,
}

impl ClientContext {
    /// `base_url` may be empty to address the serving origin.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientContext {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            date_style: DateStyle::default(),
            utc_offset: Utc.fix(),
        }
    }

    pub fn with_date_style(mut self, date_style: DateStyle) -> Self {
        self.date_style = date_style;
        self
    }

    pub fn with_utc_offset(mut self, utc_offset: FixedOffset) -> Self {
        self.utc_offset = utc_offset;
        self
    }

    pub fn with_utc_offset_minutes(self, minutes: i32) -> Result<Self, ContextError> {
        let offset = minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .ok_or(ContextError::InvalidUtcOffset(minutes))?;
        Ok(self.with_utc_offset(offset))
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn date_style(&self) -> DateStyle {
        self.date_style
    }

    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset
    }
}

impl Default for ClientContext {
    fn default() -> Self {
        ClientContext::new("")
    }
}
