//! JSON bodies exchanged over the inference endpoint.
//!
//! The boundary is deliberately small: a multipart request (one `text` field,
//! repeated `images` fields) and one of the two bodies below in response.

use serde::{Deserialize, Serialize};

/// Success body: the assistant's reply, shown verbatim in the transcript.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultBody {
    pub result: String,
}

/// Failure body, returned with any non-2xx status. The client renders it as
/// `"Error: " + error`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_body_round_trip() {
        let body: ResultBody = serde_json::from_str(r#"{"result":"hi there"}"#).unwrap();
        assert_eq!(body.result, "hi there");
    }

    #[test]
    fn test_error_body_decodes() {
        let body: ErrorBody = serde_json::from_str(r#"{"error":"rate limited"}"#).unwrap();
        assert_eq!(body.error, "rate limited");
    }
}
