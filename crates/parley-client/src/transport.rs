//! HTTP transport for submissions.
//!
//! One request per submit, no retry, no timeout, no cancellation. Failures
//! come in exactly two kinds: the server answered with an error body
//! ([`SubmitError::Server`]), or no usable response arrived at all
//! ([`SubmitError::Transport`]). Both are terminal for that submission and
//! surface only as a transcript entry.

use std::future::Future;

use reqwest::multipart::{Form, Part};
use thiserror::Error;

use parley_shared::constants::{IMAGES_FIELD, INFERENCE_API_PATH, TEXT_FIELD};
use parley_shared::protocol::{ErrorBody, ResultBody};

/// A submission's wire content: the draft text plus every attachment's bytes
/// in selection order.
#[derive(Debug, Clone)]
pub struct SubmitPayload {
    pub text: String,
    pub images: Vec<UploadImage>,
}

#[derive(Debug, Clone)]
pub struct UploadImage {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum SubmitError {
    /// The request completed and the server supplied an error description.
    #[error("{0}")]
    Server(String),

    /// The request did not complete: network failure, malformed response.
    #[error("{0}")]
    Transport(String),
}

/// Carries one payload to the inference endpoint and returns the assistant's
/// reply text.
pub trait InferenceTransport {
    fn send(
        &self,
        payload: &SubmitPayload,
    ) -> impl Future<Output = Result<String, SubmitError>> + Send;
}

/// Multipart POST to the gateway's fixed inference route.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    http: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    /// `server_url` is the gateway base, e.g. `http://127.0.0.1:5000`.
    pub fn new(server_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            endpoint: format!("{}{INFERENCE_API_PATH}", server_url.trim_end_matches('/')),
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl InferenceTransport for HttpTransport {
    async fn send(&self, payload: &SubmitPayload) -> Result<String, SubmitError> {
        let mut form = Form::new().text(TEXT_FIELD, payload.text.clone());
        for image in &payload.images {
            let part = Part::bytes(image.bytes.clone()).file_name(image.file_name.clone());
            form = form.part(IMAGES_FIELD, part);
        }

        let response = self
            .http
            .post(&self.endpoint)
            .multipart(form)
            .send()
            .await
            .map_err(|e| SubmitError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            let body: ResultBody = response
                .json()
                .await
                .map_err(|e| SubmitError::Transport(e.to_string()))?;
            Ok(body.result)
        } else {
            // Prefer the server-provided description; fall back to the bare
            // status when the error body itself is unreadable.
            match response.json::<ErrorBody>().await {
                Ok(body) => Err(SubmitError::Server(body.error)),
                Err(_) => Err(SubmitError::Server(format!(
                    "request failed with status {status}"
                ))),
            }
        }
    }
}
