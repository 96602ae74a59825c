//! Response decoding — the single place that turns an HTTP status + body
//! into either the payload or one of the named error kinds.

use texttuner_core::types::{ChatCompletionResponse, ModelListResponse};
use texttuner_core::utils::truncate_string;
use texttuner_core::TunerError;

/// Error bodies are kept for diagnostics but capped.
const MAX_ERROR_BODY_CHARS: usize = 500;

fn is_success(status: u16) -> bool {
    (200..300).contains(&status)
}

fn request_failed(status: u16, body: &str) -> TunerError {
    TunerError::RequestFailed {
        status,
        body: truncate_string(body, MAX_ERROR_BODY_CHARS),
    }
}

/// Decode a chat completion: `choices[0].message.content`.
pub fn decode_completion(status: u16, body: &str) -> Result<String, TunerError> {
    if !is_success(status) {
        return Err(request_failed(status, body));
    }

    let response: ChatCompletionResponse = serde_json::from_str(body)
        .map_err(|e| TunerError::MalformedResponse(format!("invalid JSON: {e}")))?;

    response.first_content().ok_or_else(|| {
        TunerError::MalformedResponse("missing choices[0].message.content".to_string())
    })
}

/// Decode a model list: `data[].id`.
pub fn decode_model_list(status: u16, body: &str) -> Result<Vec<String>, TunerError> {
    if !is_success(status) {
        return Err(request_failed(status, body));
    }

    let response: ModelListResponse = serde_json::from_str(body)
        .map_err(|e| TunerError::MalformedResponse(format!("invalid model list: {e}")))?;

    Ok(response.into_ids())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_success() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"HELLO!!!"}}]}"#;
        assert_eq!(decode_completion(200, body).unwrap(), "HELLO!!!");
    }

    #[test]
    fn test_decode_empty_content_is_valid() {
        let body = r#"{"choices":[{"message":{"content":""}}]}"#;
        assert_eq!(decode_completion(200, body).unwrap(), "");
    }

    #[test]
    fn test_decode_non_success_status() {
        let err = decode_completion(500, "internal").unwrap_err();
        match err {
            TunerError::RequestFailed { status, body } => {
                assert_eq!(status, 500);
                assert_eq!(body, "internal");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_error_body_truncated() {
        let long = "x".repeat(2000);
        let err = decode_completion(429, &long).unwrap_err();
        match err {
            TunerError::RequestFailed { body, .. } => {
                assert_eq!(body.chars().count(), MAX_ERROR_BODY_CHARS)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_decode_missing_path() {
        for body in [
            "{}",
            r#"{"choices":[]}"#,
            r#"{"choices":[{}]}"#,
            r#"{"choices":[{"message":{}}]}"#,
            r#"{"choices":[{"message":{"content":null}}]}"#,
        ] {
            assert!(
                matches!(decode_completion(200, body), Err(TunerError::MalformedResponse(_))),
                "{body}"
            );
        }
    }

    #[test]
    fn test_decode_invalid_json() {
        let err = decode_completion(200, "<html>").unwrap_err();
        assert!(matches!(err, TunerError::MalformedResponse(ref m) if m.starts_with("invalid JSON")));
    }

    #[test]
    fn test_decode_model_list() {
        let body = r#"{"data":[{"id":"a"},{"id":"b"}]}"#;
        assert_eq!(decode_model_list(200, body).unwrap(), vec!["a", "b"]);
        assert!(matches!(
            decode_model_list(200, r#"{"models":[]}"#),
            Err(TunerError::MalformedResponse(_))
        ));
        assert_eq!(decode_model_list(401, "").unwrap_err().status(), Some(401));
    }
}
