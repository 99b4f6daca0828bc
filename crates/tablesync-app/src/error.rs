// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body the server sends with any non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorInfo {
    pub type_message: String,
    #[serde(default)]
    pub details: Vec<String>,
}

impl ErrorInfo {
    /// `None` when the body is not the expected JSON shape.
    pub fn parse(body: &str) -> Option<Self> {
        serde_json::from_str(body).ok()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("HTTP {status}: {}", .info.type_message)]
    Api { status: u16, info: ErrorInfo },
    #[error("HTTP {status}")]
    Status { status: u16, body: String },
    #[error("cannot reach {0}")]
    Transport(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

impl ResourceError {
    /// Classifies a failed response by whether its body parses as `ErrorInfo`.
    pub fn from_response(status: u16, body: &str) -> Self {
        match ErrorInfo::parse(body) {
            Some(info) => Self::Api { status, info },
            None => Self::Status {
                status,
                body: body.trim().to_owned(),
            },
        }
    }

    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Status { status, .. } => Some(*status),
            Self::Transport(_) | Self::Decode(_) => None,
        }
    }

    /// Notification text: headline, then one detail per line.
    pub fn notification_text(&self) -> String {
        match self {
            Self::Api { info, .. } => {
                let mut lines = vec![info.type_message.clone()];
                lines.extend(info.details.iter().cloned());
                lines.join("\n")
            }
            Self::Status { status, body } => {
                let mut text = format!("request failed (HTTP {status})");
                if let Some(first) = body.lines().map(str::trim).find(|line| !line.is_empty()) {
                    text.push('\n');
                    text.push_str(first);
                }
                text
            }
            Self::Transport(detail) => format!("request failed\n{detail}"),
            Self::Decode(detail) => format!("unexpected server response\n{detail}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{ErrorInfo, ResourceError};

    #[test]
    fn api_error_renders_type_and_details() {
        let error = ResourceError::from_response(
            422,
            r#"{"typeMessage":"Validation","details":["name required","calories too low"]}"#,
        );
        assert_eq!(error.status(), Some(422));
        assert_eq!(
            error.notification_text(),
            "Validation\nname required\ncalories too low"
        );
    }

    #[test]
    fn non_json_body_falls_back_to_generic_text() {
        let error = ResourceError::from_response(502, "<html>\n<b>Bad Gateway</b>\n</html>");
        assert!(matches!(error, ResourceError::Status { status: 502, .. }));
        assert_eq!(
            error.notification_text(),
            "request failed (HTTP 502)\n<html>"
        );
    }

    #[test]
    fn empty_body_has_no_detail_line() {
        let error = ResourceError::from_response(500, "  ");
        assert_eq!(error.notification_text(), "request failed (HTTP 500)");
    }

    #[test]
    fn details_default_to_empty() {
        let info = ErrorInfo::parse(r#"{"typeMessage":"Not found"}"#).expect("should parse");
        assert!(info.details.is_empty());
    }
}
