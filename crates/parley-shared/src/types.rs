use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One entry in the transcript. Immutable once appended; the transcript is
/// append-only and ordered oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    /// Message UUID for deduplication.
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Preview URIs for the attachments shown alongside this message.
    /// Always empty for assistant messages.
    pub attachment_previews: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl Message {
    pub fn user(content: impl Into<String>, attachment_previews: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::User,
            content: content.into(),
            attachment_previews,
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role: Role::Assistant,
            content: content.into(),
            attachment_previews: Vec::new(),
            timestamp: Utc::now(),
        }
    }
}

/// An image selected into the draft. The bytes live in the session's preview
/// registry; the attachment only carries the handle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    pub file_name: String,
    pub preview_uri: String,
}

/// The not-yet-submitted text and attachment set. Mutable until submit;
/// reset to empty once a submit attempt resolves, success or failure.
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: String,
    pub attachments: Vec<Attachment>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        self.text.is_empty() && self.attachments.is_empty()
    }
}
