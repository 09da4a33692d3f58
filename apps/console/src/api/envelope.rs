//! # Response Envelope
//!
//! The backend wraps most bodies as `{ success, message?, data? }`, but some
//! endpoints (the order list in particular) answer with the bare entity or
//! array. Both shapes decode here.
//!
//! ```text
//! { "success": true,  "data": [...] }        → Ok([...])
//! { "success": false, "message": "..." }     → Err(ServerError, "...")
//! [ ... ]  or  { "id": ... }                 → Ok(bare body)
//! ```

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;

use crate::error::{ApiError, ApiResult, ErrorCode};

#[derive(Debug, Deserialize)]
struct Envelope {
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Option<Value>,
}

/// A body with the envelope peeled off.
enum Payload {
    Data(Value),
    Empty,
}

/// Only an object with a boolean `success` counts as an envelope.
fn is_envelope(value: &Value) -> bool {
    value
        .as_object()
        .and_then(|fields| fields.get("success"))
        .map_or(false, Value::is_boolean)
}

fn unwrap(body: &[u8]) -> ApiResult<Payload> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Payload::Empty);
    }

    let value: Value = serde_json::from_slice(body)?;
    if !is_envelope(&value) {
        return Ok(Payload::Data(value));
    }

    let envelope: Envelope = serde_json::from_value(value)?;
    if !envelope.success {
        return Err(ApiError::new(
            ErrorCode::ServerError,
            envelope
                .message
                .filter(|m| !m.trim().is_empty())
                .unwrap_or_else(|| "Server reported a failure".to_string()),
        ));
    }

    Ok(match envelope.data {
        Some(Value::Null) | None => Payload::Empty,
        Some(data) => Payload::Data(data),
    })
}

/// Decodes a successful response body into `T`.
pub fn decode<T: DeserializeOwned>(body: &[u8]) -> ApiResult<T> {
    match unwrap(body)? {
        Payload::Data(value) => Ok(serde_json::from_value(value)?),
        Payload::Empty => Err(ApiError::invalid_response("Response carried no data")),
    }
}

/// Checks a successful response that carries no entity (deletes).
pub fn decode_ack(body: &[u8]) -> ApiResult<()> {
    unwrap(body).map(|_| ())
}

/// Maps a non-2xx response to an error, using the envelope message when the
/// server sent one.
///
/// A short non-envelope body (plain text from a proxy) is shown as is. An
/// envelope without a message falls back to the status reason.
pub fn decode_failure(status: StatusCode, body: &[u8]) -> ApiError {
    let envelope = serde_json::from_slice::<Value>(body)
        .ok()
        .filter(is_envelope);

    let message = match envelope {
        Some(envelope) => envelope
            .get("message")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map(str::to_string),
        None => {
            let text = String::from_utf8_lossy(body).trim().to_string();
            (!text.is_empty() && text.len() <= 200).then_some(text)
        }
    };

    let message = message.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    });

    let code = match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ErrorCode::Unauthorized,
        StatusCode::NOT_FOUND => ErrorCode::NotFound,
        StatusCode::BAD_REQUEST | StatusCode::UNPROCESSABLE_ENTITY | StatusCode::CONFLICT => {
            ErrorCode::ValidationError
        }
        StatusCode::REQUEST_TIMEOUT | StatusCode::GATEWAY_TIMEOUT => ErrorCode::Timeout,
        _ => ErrorCode::ServerError,
    };

    ApiError::new(code, message)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_enveloped_and_bare_lists() {
        let enveloped: Vec<u32> = decode(br#"{"success": true, "data": [1, 2]}"#).unwrap();
        let bare: Vec<u32> = decode(b"[1, 2]").unwrap();
        assert_eq!(enveloped, bare);
    }

    #[test]
    fn test_bare_object_with_success_field_is_not_mistaken() {
        #[derive(Deserialize)]
        struct Row {
            success: String,
        }
        let row: Row = decode(br#"{"success": "yes"}"#).unwrap();
        assert_eq!(row.success, "yes");
    }

    #[test]
    fn test_failed_envelope() {
        let err = decode::<Vec<u32>>(br#"{"success": false, "message": "Order is locked"}"#)
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ServerError);
        assert_eq!(err.message, "Order is locked");
    }

    #[test]
    fn test_missing_data() {
        let err = decode::<Vec<u32>>(br#"{"success": true}"#).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidResponse);
        assert!(decode_ack(br#"{"success": true, "message": "Deleted"}"#).is_ok());
        assert!(decode_ack(b"").is_ok());
    }

    #[test]
    fn test_failure_status_mapping() {
        let err = decode_failure(
            StatusCode::NOT_FOUND,
            br#"{"success": false, "message": "No order ORD-1"}"#,
        );
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(err.message, "No order ORD-1");

        let err = decode_failure(StatusCode::UNAUTHORIZED, b"");
        assert_eq!(err.code, ErrorCode::Unauthorized);
        assert_eq!(err.message, "Unauthorized");

        let err = decode_failure(StatusCode::BAD_GATEWAY, b"upstream down");
        assert_eq!(err.code, ErrorCode::ServerError);
        assert_eq!(err.message, "upstream down");
    }

    #[test]
    fn test_failure_envelope_without_message_uses_reason() {
        let err = decode_failure(StatusCode::INTERNAL_SERVER_ERROR, br#"{"success": false}"#);
        assert_eq!(err.code, ErrorCode::ServerError);
        assert_eq!(err.message, "Internal Server Error");

        let err = decode_failure(
            StatusCode::CONFLICT,
            br#"{"success": false, "message": "  "}"#,
        );
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert_eq!(err.message, "Conflict");
    }
}
