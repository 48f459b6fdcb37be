use std::convert::Infallible;

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header, request::Parts},
    response::{IntoResponse, Response},
};
use serde::Serialize;

use crate::error::AppError;

/// Representation negotiated for the response body.
///
/// A `.json` / `.xml` path suffix wins over the `Accept` header; JSON is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Json,
    Xml,
}

impl Format {
    pub fn from_suffix(path: &str) -> Option<Self> {
        let (_, ext) = path.rsplit_once('.')?;
        match ext {
            "json" => Some(Format::Json),
            "xml" => Some(Format::Xml),
            _ => None,
        }
    }

    /// Highest `q` wins; ties go to the type listed first. Types that are
    /// neither JSON, XML nor a wildcard are ignored.
    pub fn from_accept(accept: &str) -> Self {
        let mut best: Option<(Format, f32)> = None;
        for range in accept.split(',') {
            let mut parts = range.split(';');
            let media = parts.next().unwrap_or("").trim();
            if media.is_empty() {
                continue;
            }
            let q = parts
                .filter_map(|param| param.trim().strip_prefix("q="))
                .find_map(|value| value.trim().parse::<f32>().ok())
                .unwrap_or(1.0);
            if q <= 0.0 {
                continue;
            }
            let format = if media.ends_with("/xml") || media.ends_with("+xml") {
                Format::Xml
            } else if media.ends_with("/json") || media.ends_with("+json") || media.ends_with("/*")
            {
                Format::Json
            } else {
                continue;
            };
            if best.is_none_or(|(_, best_q)| q > best_q) {
                best = Some((format, q));
            }
        }
        best.map(|(format, _)| format).unwrap_or_default()
    }

    pub fn content_type(self) -> &'static str {
        match self {
            Format::Json => "application/json; charset=utf-8",
            Format::Xml => "application/xml; charset=utf-8",
        }
    }

    /// Serialize `body` and build a response carrying the matching `Content-Type`.
    ///
    /// `xml_root` names the document element; JSON output ignores it.
    pub fn body<T: Serialize>(
        self,
        status: StatusCode,
        xml_root: &str,
        body: &T,
    ) -> Result<Response, AppError> {
        let encoded = match self {
            Format::Json => serde_json::to_string(body)
                .map_err(|e| AppError::Internal(format!("JSON encoding failed: {e}")))?,
            Format::Xml => quick_xml::se::to_string_with_root(xml_root, body)
                .map_err(|e| AppError::Internal(format!("XML encoding failed: {e}")))?,
        };

        let mut response = (status, encoded).into_response();
        response.headers_mut().insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static(self.content_type()),
        );
        Ok(response)
    }
}

impl<S> FromRequestParts<S> for Format
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(format) = Format::from_suffix(parts.uri.path()) {
            return Ok(format);
        }

        let format = parts
            .headers
            .get(header::ACCEPT)
            .and_then(|v| v.to_str().ok())
            .map(Format::from_accept)
            .unwrap_or_default();
        Ok(format)
    }
}
