//! Wire shapes for `/api/message`

use crate::error::AttemptError;
use serde::Serialize;
use serde_json::Value;

/// Outbound body of `POST /api/message`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageRequest {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jid: Option<String>,
}

impl MessageRequest {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            jid: None,
        }
    }

    pub fn with_jid(mut self, jid: Option<String>) -> Self {
        self.jid = jid;
        self
    }
}

/// Extract the reply text from a response body.
///
/// Accepts `{"response": "..."}` and `{"data": [{"response": "..."}]}`.
/// `{"error": ...}` is a rejection; anything else is malformed. An empty
/// reply counts as malformed.
pub fn parse_reply(body: &[u8]) -> Result<String, AttemptError> {
    let json: Value = serde_json::from_slice(body)
        .map_err(|e| AttemptError::Malformed(format!("invalid JSON: {}", e)))?;

    if let Some(reply) = json.get("response") {
        return non_empty_str(reply);
    }

    if let Some(data) = json.get("data") {
        let first = data
            .as_array()
            .and_then(|items| items.first())
            .ok_or_else(|| AttemptError::Malformed("empty 'data' array".to_string()))?;
        let reply = first
            .get("response")
            .ok_or_else(|| AttemptError::Malformed("missing 'data[0].response'".to_string()))?;
        return non_empty_str(reply);
    }

    if let Some(error) = json.get("error") {
        let message = error
            .as_str()
            .map(String::from)
            .unwrap_or_else(|| error.to_string());
        return Err(AttemptError::Rejected(message));
    }

    Err(AttemptError::Malformed("missing 'response' field".to_string()))
}

fn non_empty_str(value: &Value) -> Result<String, AttemptError> {
    match value.as_str() {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        Some(_) => Err(AttemptError::Malformed("empty reply".to_string())),
        None => Err(AttemptError::Malformed(format!(
            "reply is not a string: {}",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization() {
        let body = serde_json::to_value(MessageRequest::new("hello")).unwrap();
        assert_eq!(body, serde_json::json!({"message": "hello"}));

        let body = serde_json::to_value(
            MessageRequest::new("hello").with_jid(Some("1921681@s.whatsapp.net".into())),
        )
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"message": "hello", "jid": "1921681@s.whatsapp.net"})
        );
    }

    #[test]
    fn test_parse_plain_response() {
        assert_eq!(parse_reply(br#"{"response":"hi"}"#).unwrap(), "hi");
    }

    #[test]
    fn test_parse_data_envelope() {
        assert_eq!(
            parse_reply(br#"{"data":[{"response":"hi"},{"response":"ignored"}]}"#).unwrap(),
            "hi"
        );
        assert!(matches!(
            parse_reply(br#"{"data":[]}"#),
            Err(AttemptError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_malformed() {
        assert!(matches!(parse_reply(b"<html>"), Err(AttemptError::Malformed(_))));
        assert!(matches!(parse_reply(b"{}"), Err(AttemptError::Malformed(_))));
        assert!(matches!(
            parse_reply(br#"{"response":42}"#),
            Err(AttemptError::Malformed(_))
        ));
        assert!(matches!(
            parse_reply(br#"{"response":""}"#),
            Err(AttemptError::Malformed(_))
        ));
    }

    #[test]
    fn test_parse_backend_error() {
        assert_eq!(
            parse_reply(br#"{"error":"session expired"}"#),
            Err(AttemptError::Rejected("session expired".to_string()))
        );
    }
}
