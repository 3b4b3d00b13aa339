use std::{collections::BTreeMap, fmt::Display};

use thiserror::Error;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConversionError {
    #[error("Empty not allowed")]
    Empty,
    #[error("Maximum length exceeded. {max} allowed but found {actual}")]
    MaxExceeded { max: usize, actual: usize },
}

/// A path that does not match any page of the client
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RouteParseError {
    #[error("no page matches the path: {0:?}")]
    UnknownPath(String),
    #[error("invalid id {value:?} in path: {source}")]
    InvalidId {
        value: String,
        source: std::num::ParseIntError,
    },
}

/// An error response returned by the server
///
/// Stored inside of the [`anyhow::Error`] returned by the client so that pages
/// can recover per field messages using [`anyhow::Error::downcast_ref`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiError {
    pub status: u16,
    pub body: ErrorBody,
}

/// The two shapes the server uses to report errors
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ErrorBody {
    /// A single message, as in `{"detail": "Could not log in."}`
    Detail(String),
    /// Validation messages per field, either at the top level or wrapped in
    /// `detail`
    Fields(BTreeMap<String, Vec<String>>),
    #[default]
    Empty,
}

impl ApiError {
    pub fn new(status: u16, body: ErrorBody) -> Self {
        Self { status, body }
    }
}

/// Both unauthenticated and forbidden are treated as the session having ended
pub fn is_auth_failure_status(status: u16) -> bool {
    status == 401 || status == 403
}

impl Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.body {
            ErrorBody::Empty => write!(
                f,
                "request failed with status code: {} and no body",
                self.status
            ),
            body => write!(f, "{body}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl ErrorBody {
    /// Interprets the text of an error response
    ///
    /// Text that is not JSON is treated as a plain detail message
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        if text.is_empty() {
            return Self::Empty;
        }
        match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => Self::from_json(value),
            Err(_) => Self::Detail(text.to_string()),
        }
    }

    fn from_json(value: serde_json::Value) -> Self {
        use serde_json::Value;
        match value {
            Value::Null => Self::Empty,
            Value::String(s) => Self::Detail(s),
            Value::Object(mut map) => match map.remove("detail") {
                Some(Value::String(s)) if map.is_empty() => Self::Detail(s),
                Some(Value::Object(fields)) if map.is_empty() => Self::fields_from_map(fields),
                Some(other) => {
                    map.insert("detail".to_string(), other);
                    Self::fields_from_map(map)
                }
                None => Self::fields_from_map(map),
            },
            Value::Array(items) => Self::Detail(
                items
                    .into_iter()
                    .map(json_to_message)
                    .collect::<Vec<_>>()
                    .join(" "),
            ),
            other => Self::Detail(other.to_string()),
        }
    }

    fn fields_from_map(map: serde_json::Map<String, serde_json::Value>) -> Self {
        let fields: BTreeMap<String, Vec<String>> = map
            .into_iter()
            .map(|(field, value)| {
                let messages = match value {
                    serde_json::Value::Array(items) => {
                        items.into_iter().map(json_to_message).collect()
                    }
                    other => vec![json_to_message(other)],
                };
                (field, messages)
            })
            .collect();
        if fields.is_empty() {
            Self::Empty
        } else {
            Self::Fields(fields)
        }
    }

    /// Builds a body with a single message for one field
    pub fn field_error<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self::Fields(BTreeMap::from([(field.into(), vec![message.into()])]))
    }

    /// Adds a message for the field, converting the body into
    /// [`ErrorBody::Fields`] if needed
    pub fn push_field_error<F: Into<String>, M: Into<String>>(&mut self, field: F, message: M) {
        match self {
            ErrorBody::Fields(fields) => fields
                .entry(field.into())
                .or_default()
                .push(message.into()),
            _ => *self = Self::field_error(field, message),
        }
    }

    /// Messages reported for the given field if any
    pub fn field(&self, name: &str) -> Option<&[String]> {
        match self {
            ErrorBody::Fields(fields) => fields.get(name).map(|x| x.as_slice()),
            _ => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ErrorBody::Detail(_) => false,
            ErrorBody::Fields(fields) => fields.is_empty(),
            ErrorBody::Empty => true,
        }
    }

    /// One line per message group in the form they are shown to the user
    pub fn display_lines(&self) -> Vec<String> {
        match self {
            ErrorBody::Detail(msg) => vec![msg.clone()],
            ErrorBody::Fields(fields) => fields
                .iter()
                .map(|(field, messages)| {
                    format!("{}: {}", capitalize_first_letter(field), messages.join(" "))
                })
                .collect(),
            ErrorBody::Empty => vec![],
        }
    }
}

impl Display for ErrorBody {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_lines().join("\n"))
    }
}

fn json_to_message(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    }
}

pub fn capitalize_first_letter(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
