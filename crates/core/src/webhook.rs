//! Decoding of inbound webhook deliveries.
//!
//! Deliveries arrive as `application/x-www-form-urlencoded` bodies whose
//! `payload` field carries the push event as JSON. Only the repository name
//! is extracted; the rest of the event is ignored.

use serde::Deserialize;

use crate::error::DecodeError;

/// Form field holding the JSON event.
pub const PAYLOAD_FIELD: &str = "payload";

#[derive(Debug, Deserialize)]
struct PushEvent {
    repository: Repository,
}

#[derive(Debug, Deserialize)]
struct Repository {
    name: String,
}

/// Extract the repository name from a raw request body.
///
/// Pure: calling it twice on the same bytes yields the same result.
pub fn decode_repository(body: &[u8]) -> Result<String, DecodeError> {
    let text = std::str::from_utf8(body)
        .map_err(|e| DecodeError::MalformedQuery(format!("body is not UTF-8: {e}")))?;
    validate_query(text)?;

    let pairs: Vec<(String, String)> = serde_urlencoded::from_str(text)
        .map_err(|e| DecodeError::MalformedQuery(e.to_string()))?;

    let payload = pairs
        .into_iter()
        .find(|(key, _)| key == PAYLOAD_FIELD)
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
        .ok_or(DecodeError::MissingPayload)?;

    let event: PushEvent =
        serde_json::from_str(&payload).map_err(|e| DecodeError::InvalidJson(e.to_string()))?;

    Ok(event.repository.name)
}

/// Reject bodies a strict query parser would refuse: bad percent escapes and
/// `;` separators.
fn validate_query(text: &str) -> Result<(), DecodeError> {
    if text.contains(';') {
        return Err(DecodeError::MalformedQuery(
            "invalid semicolon separator in query".to_string(),
        ));
    }

    let bytes = text.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let valid = bytes
                .get(i + 1..i + 3)
                .is_some_and(|hex| hex.iter().all(u8::is_ascii_hexdigit));
            if !valid {
                let end = (i + 3).min(bytes.len());
                return Err(DecodeError::MalformedQuery(format!(
                    "invalid URL escape {:?}",
                    String::from_utf8_lossy(&bytes[i..end])
                )));
            }
            i += 3;
        } else {
            i += 1;
        }
    }
    Ok(())
}
