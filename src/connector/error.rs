use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

use crate::connector::http_common::redact_endpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectorErrorKind {
    Configuration,
    Authentication,
    InvalidState,
    Dispatch,
    Timeout,
    Internal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConnectorError {
    pub kind: ConnectorErrorKind,
    pub message: String,
    pub endpoint: Option<String>,
    pub http_status: Option<u16>,
}

impl ConnectorError {
    pub fn new(kind: ConnectorErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            endpoint: None,
            http_status: None,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_http_status(mut self, status: u16) -> Self {
        self.http_status = Some(status);
        self
    }

    /// Dispatch failures carry the endpoint and cause in the message itself so the
    /// caller sees one descriptive line.
    pub fn dispatch(endpoint: &str, cause: impl fmt::Display) -> Self {
        let endpoint = redact_endpoint(endpoint);
        Self::new(
            ConnectorErrorKind::Dispatch,
            format!(
                "failed to call endpoint \"{}\" error message \"{}\"",
                endpoint, cause
            ),
        )
        .with_endpoint(endpoint)
    }

    pub fn timeout(endpoint: &str, after: Duration) -> Self {
        let endpoint = redact_endpoint(endpoint);
        Self::new(
            ConnectorErrorKind::Timeout,
            format!(
                "failed to call endpoint \"{}\" error message \"timeout of {}ms exceeded\"",
                endpoint,
                after.as_millis()
            ),
        )
        .with_endpoint(endpoint)
    }

    pub fn is_timeout(&self) -> bool {
        self.kind == ConnectorErrorKind::Timeout
    }
}

impl fmt::Display for ConnectorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.http_status {
            Some(status) => write!(f, "{} (status={})", self.message, status),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ConnectorError {}

pub fn configuration_error(message: impl Into<String>) -> ConnectorError {
    ConnectorError::new(ConnectorErrorKind::Configuration, message)
}

pub fn authentication_error(message: impl Into<String>) -> ConnectorError {
    ConnectorError::new(ConnectorErrorKind::Authentication, message)
}

pub fn invalid_state(message: impl Into<String>) -> ConnectorError {
    ConnectorError::new(ConnectorErrorKind::InvalidState, message)
}

pub fn internal_error(message: impl Into<String>) -> ConnectorError {
    ConnectorError::new(ConnectorErrorKind::Internal, message)
}
