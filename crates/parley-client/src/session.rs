//! The transcript submitter.
//!
//! [`Session`] is a plain owned struct: draft, append-only transcript, and a
//! single in-flight flag. All mutation happens through its own methods, so a
//! front end only needs to hold `&mut Session` in its event handlers — no
//! globals, no locks.
//!
//! The submit flow is split in two so the network call stays outside the
//! state mutation: [`Session::begin_submit`] guards the in-flight flag,
//! appends the optimistic user echo, and produces the payload;
//! [`Session::finish_submit`] appends the assistant entry (reply or rendered
//! error) and clears the draft. [`Session::submit`] composes both around a
//! transport.

use tracing::debug;

use parley_shared::constants::{EMPTY_TEXT_PLACEHOLDER, ERROR_PREFIX};
use parley_shared::types::{Attachment, Draft, Message};

use crate::preview::PreviewRegistry;
use crate::transport::{InferenceTransport, SubmitError, SubmitPayload, UploadImage};

/// An image picked by the user, before it becomes a draft attachment.
#[derive(Debug, Clone)]
pub struct FileInput {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Default)]
pub struct Session {
    draft: Draft,
    transcript: Vec<Message>,
    in_flight: bool,
    previews: PreviewRegistry,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the draft text verbatim. No validation.
    pub fn update_text(&mut self, value: impl Into<String>) {
        self.draft.text = value.into();
    }

    /// Append the given files to the draft's attachments, preserving prior
    /// attachments and selection order. No validation of type or size.
    pub fn select_attachments(&mut self, files: impl IntoIterator<Item = FileInput>) {
        for file in files {
            let preview_uri = self.previews.issue(file.bytes);
            self.draft.attachments.push(Attachment {
                file_name: file.file_name,
                preview_uri,
            });
        }
    }

    pub fn draft(&self) -> &Draft {
        &self.draft
    }

    /// The transcript, oldest first. Only ever grows.
    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    /// True exactly while one submission's network call is pending. Front
    /// ends disable the submit trigger on this.
    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// Bytes behind a preview URI, for rendering thumbnails.
    pub fn preview_bytes(&self, uri: &str) -> Option<&[u8]> {
        self.previews.resolve(uri)
    }

    /// Start a submission: append the optimistic user message and hand back
    /// the payload to send. Returns `None` while a prior submission is still
    /// unresolved — the call has no observable effect in that case.
    pub fn begin_submit(&mut self) -> Option<SubmitPayload> {
        if self.in_flight {
            debug!("submit ignored: prior submission still in flight");
            return None;
        }

        let images = self
            .draft
            .attachments
            .iter()
            .map(|attachment| UploadImage {
                file_name: attachment.file_name.clone(),
                bytes: self
                    .previews
                    .resolve(&attachment.preview_uri)
                    .unwrap_or_default()
                    .to_vec(),
            })
            .collect();

        let content = if self.draft.text.is_empty() {
            EMPTY_TEXT_PLACEHOLDER.to_string()
        } else {
            self.draft.text.clone()
        };

        // The echo is provisional but never retracted, even on failure. It
        // keeps its previews alive independently of the draft.
        let previews: Vec<String> = self
            .draft
            .attachments
            .iter()
            .map(|attachment| attachment.preview_uri.clone())
            .collect();
        for uri in &previews {
            self.previews.retain(uri);
        }
        self.transcript.push(Message::user(content, previews));

        self.in_flight = true;
        Some(SubmitPayload {
            text: self.draft.text.clone(),
            images,
        })
    }

    /// Resolve the in-flight submission: append exactly one assistant entry
    /// (the reply, or `"Error: " + description`) and reset the draft. A call
    /// without a matching `begin_submit` is ignored.
    pub fn finish_submit(&mut self, outcome: Result<String, SubmitError>) {
        if !self.in_flight {
            return;
        }

        let content = match outcome {
            Ok(reply) => reply,
            Err(error) => format!("{ERROR_PREFIX}{error}"),
        };
        self.transcript.push(Message::assistant(content));

        self.in_flight = false;
        self.clear_draft();
    }

    /// Run one full submission. Returns `false` if the call was ignored
    /// because a prior submission was still in flight.
    pub async fn submit<T: InferenceTransport>(&mut self, transport: &T) -> bool {
        let Some(payload) = self.begin_submit() else {
            return false;
        };
        let outcome = transport.send(&payload).await;
        self.finish_submit(outcome);
        true
    }

    /// Empty the draft and release its preview references. Previews still
    /// shown by transcript messages survive; the rest are freed.
    fn clear_draft(&mut self) {
        self.draft.text.clear();
        for attachment in self.draft.attachments.drain(..) {
            self.previews.release(&attachment.preview_uri);
        }
    }
}
