use reqwest::Url;

use crate::connector::{error::ConnectorError, types::RawResponse};

const ERROR_BODY_PREVIEW_CHARS: usize = 240;

pub fn map_http_error(status: u16, endpoint: &str, body: &str) -> ConnectorError {
    let normalized_body = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect::<String>();

    let mut err = ConnectorError::dispatch(
        endpoint,
        format!("Request failed with status code {}", status),
    )
    .with_http_status(status);

    if !normalized_body.trim().is_empty() {
        err.message = format!("{}: {}", err.message, normalized_body);
    }

    err
}

pub fn ensure_success(raw: RawResponse, endpoint: &str) -> Result<RawResponse, ConnectorError> {
    if raw.is_success() {
        Ok(raw)
    } else {
        Err(map_http_error(raw.status, endpoint, &raw.body))
    }
}

/// Voice endpoints carry the session token as a query parameter; it must not
/// end up in error messages or logs.
pub fn redact_endpoint(endpoint: &str) -> String {
    let Ok(mut url) = Url::parse(endpoint) else {
        return endpoint.to_string();
    };
    if !url.query_pairs().any(|(key, _)| key == "token") {
        return endpoint.to_string();
    }

    let pairs = url
        .query_pairs()
        .map(|(key, value)| {
            let value = if key == "token" {
                "<redacted>".to_string()
            } else {
                value.into_owned()
            };
            (key.into_owned(), value)
        })
        .collect::<Vec<_>>();
    url.query_pairs_mut().clear().extend_pairs(pairs);
    url.to_string()
}

/// Media type without parameters, lowercased: `Application/JSON; charset=utf-8`
/// becomes `application/json`.
pub fn media_type(content_type: Option<&str>) -> Option<String> {
    let raw = content_type?.split(';').next()?.trim();
    if raw.is_empty() {
        None
    } else {
        Some(raw.to_ascii_lowercase())
    }
}
