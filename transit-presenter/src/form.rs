//! Form definitions and request payload construction

use crate::tabs::Tab;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use std::collections::HashMap;
use thiserror::Error;

/// Errors building a request payload from form fields
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PayloadError {
    #[error("{field} has a date but no time")]
    MissingTime { field: &'static str },

    #[error("{field} has an invalid date: {value:?} (expected YYYY-MM-DD)")]
    InvalidDate { field: &'static str, value: String },

    #[error("{field} has an invalid time: {value:?} (expected HH:MM)")]
    InvalidTime { field: &'static str, value: String },
}

/// Kind of input a form field renders as
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    TextArea,
    Number,
    Date,
    Time,
}

impl FieldKind {
    /// `type` attribute for `<input>` fields
    pub fn input_type(&self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::TextArea => "text",
            FieldKind::Number => "number",
            FieldKind::Date => "date",
            FieldKind::Time => "time",
        }
    }
}

/// A single field of a tab's form
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn field(
    name: &'static str,
    label: &'static str,
    kind: FieldKind,
    required: bool,
) -> FieldSpec {
    FieldSpec {
        name,
        label,
        kind,
        required,
    }
}

const TRIP_FIELDS: &[FieldSpec] = &[
    field("origin", "Origin", FieldKind::Text, true),
    field("destination", "Destination", FieldKind::Text, true),
    field("window_start_date", "Departure Window Start (Date)", FieldKind::Date, true),
    field("window_start_time", "Departure Window Start (Time)", FieldKind::Time, true),
    field("window_end_date", "Departure Window End (Date)", FieldKind::Date, true),
    field("window_end_time", "Departure Window End (Time)", FieldKind::Time, true),
    field("departure_date", "Preferred Departure (Date)", FieldKind::Date, false),
    field("departure_time", "Preferred Departure (Time)", FieldKind::Time, false),
];

const WORK_FIELDS: &[FieldSpec] = &[
    field("origins", "Starting Address(es), one per line", FieldKind::TextArea, true),
    field("destination", "Destination", FieldKind::Text, true),
    field("work_duration_hours", "Hours at Destination", FieldKind::Number, true),
    field("window_start_date", "Departure Window Start (Date)", FieldKind::Date, true),
    field("window_start_time", "Departure Window Start (Time)", FieldKind::Time, true),
    field("window_end_date", "Departure Window End (Date)", FieldKind::Date, true),
    field("window_end_time", "Departure Window End (Time)", FieldKind::Time, true),
];

/// Fields of a tab's form, in display order
pub fn form_fields(tab: Tab) -> &'static [FieldSpec] {
    match tab {
        Tab::OptimizeTrip => TRIP_FIELDS,
        Tab::OptimizeWork => WORK_FIELDS,
    }
}

/// Raw field values of a submitted form
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormFields {
    values: HashMap<String, String>,
}

impl FormFields {
    pub fn new() -> Self {
        Self::default()
    }

    /// Form values with every date field set to `now`'s date and every time
    /// field set to `now`'s hour and minute
    pub fn prefilled(tab: Tab, now: NaiveDateTime) -> Self {
        let date = now.format("%Y-%m-%d").to_string();
        let time = now.format("%H:%M").to_string();

        let mut fields = Self::new();
        for spec in form_fields(tab) {
            match spec.kind {
                FieldKind::Date => fields.set(spec.name, date.clone()),
                FieldKind::Time => fields.set(spec.name, time.clone()),
                _ => {}
            }
        }
        fields
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(name, value);
        self
    }

    /// Raw value, including empty strings
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value only when present and non-empty
    pub fn non_empty(&self, name: &str) -> Option<&str> {
        self.get(name).filter(|v| !v.is_empty())
    }
}

/// JSON body posted to an optimization endpoint
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RequestPayload {
    pub api_key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origins: Option<Vec<String>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,

    /// Passed through unparsed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_duration_hours: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_start: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_end: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure_time: Option<String>,
}

impl RequestPayload {
    /// Build the payload from raw form values
    pub fn from_form(api_key: &str, fields: &FormFields) -> Result<Self, PayloadError> {
        Ok(Self {
            api_key: api_key.to_string(),
            destination: fields.get("destination").map(str::to_string),
            origins: fields.non_empty("origins").map(split_origins),
            origin: fields.non_empty("origin").map(str::to_string),
            work_duration_hours: fields.non_empty("work_duration_hours").map(str::to_string),
            window_start: timestamp(
                fields,
                "window_start",
                "window_start_date",
                "window_start_time",
            )?,
            window_end: timestamp(fields, "window_end", "window_end_date", "window_end_time")?,
            departure_time: timestamp(
                fields,
                "departure_time",
                "departure_date",
                "departure_time",
            )?,
        })
    }

    /// Copy of the payload that is safe to log
    pub fn redacted(&self) -> Self {
        Self {
            api_key: "<redacted>".to_string(),
            ..self.clone()
        }
    }
}

fn timestamp(
    fields: &FormFields,
    field: &'static str,
    date_key: &str,
    time_key: &str,
) -> Result<Option<String>, PayloadError> {
    match fields.non_empty(date_key) {
        Some(date) => combine_date_time(field, date, fields.non_empty(time_key)).map(Some),
        None => Ok(None),
    }
}

/// Split a multi-line address field into trimmed, non-empty lines
pub fn split_origins(raw: &str) -> Vec<String> {
    raw.split('\n')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Combine a `YYYY-MM-DD` date and an `HH:MM` time into a local timestamp
/// of the form `YYYY-MM-DDTHH:MM:SS`.
pub fn combine_date_time(
    field: &'static str,
    date: &str,
    time: Option<&str>,
) -> Result<String, PayloadError> {
    let time = time.ok_or(PayloadError::MissingTime { field })?;

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| PayloadError::InvalidDate {
        field,
        value: date.to_string(),
    })?;
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .map_err(|_| PayloadError::InvalidTime {
            field,
            value: time.to_string(),
        })?;

    Ok(date.and_time(time).format("%Y-%m-%dT%H:%M:%S").to_string())
}
