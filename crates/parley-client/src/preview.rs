//! In-memory store for attachment preview blobs.
//!
//! Plays the role a browser's object-URL pool plays for a web client: each
//! selected image gets a `preview://<uuid>` URI that display code can resolve
//! back to bytes. URIs are reference counted — the draft holds one reference
//! per attachment and every appended message holds one per preview it shows —
//! so clearing the draft after a submit frees exactly the blobs nothing
//! displays anymore.

use std::collections::HashMap;

use uuid::Uuid;

use parley_shared::constants::PREVIEW_SCHEME;

#[derive(Debug)]
struct PreviewEntry {
    bytes: Vec<u8>,
    refs: usize,
}

/// Owns preview blobs for one session. Dropping the registry (session
/// teardown) frees everything at once.
#[derive(Debug, Default)]
pub struct PreviewRegistry {
    entries: HashMap<Uuid, PreviewEntry>,
}

impl PreviewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a blob and return its preview URI with one reference held.
    pub fn issue(&mut self, bytes: Vec<u8>) -> String {
        let id = Uuid::new_v4();
        self.entries.insert(id, PreviewEntry { bytes, refs: 1 });
        format!("{PREVIEW_SCHEME}{id}")
    }

    /// Take an additional reference on an existing preview. Unknown URIs are
    /// ignored.
    pub fn retain(&mut self, uri: &str) {
        if let Some(entry) = parse_uri(uri).and_then(|id| self.entries.get_mut(&id)) {
            entry.refs += 1;
        }
    }

    /// Drop one reference; the blob is freed when the last reference goes.
    /// Unknown URIs are ignored.
    pub fn release(&mut self, uri: &str) {
        let Some(id) = parse_uri(uri) else { return };
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.refs -= 1;
            if entry.refs == 0 {
                self.entries.remove(&id);
            }
        }
    }

    /// Resolve a preview URI to its bytes, if still live.
    pub fn resolve(&self, uri: &str) -> Option<&[u8]> {
        let id = parse_uri(uri)?;
        self.entries.get(&id).map(|entry| entry.bytes.as_slice())
    }

    /// Number of live blobs.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn parse_uri(uri: &str) -> Option<Uuid> {
    let raw = uri.strip_prefix(PREVIEW_SCHEME)?;
    Uuid::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_issue_and_resolve() {
        let mut registry = PreviewRegistry::new();
        let uri = registry.issue(b"png-bytes".to_vec());
        assert!(uri.starts_with(PREVIEW_SCHEME));
        assert_eq!(registry.resolve(&uri), Some(b"png-bytes".as_slice()));
    }

    #[test]
    fn test_release_last_reference_frees() {
        let mut registry = PreviewRegistry::new();
        let uri = registry.issue(vec![1, 2, 3]);
        registry.release(&uri);
        assert_eq!(registry.resolve(&uri), None);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_retain_keeps_blob_alive() {
        let mut registry = PreviewRegistry::new();
        let uri = registry.issue(vec![7]);
        registry.retain(&uri);
        registry.release(&uri);
        assert!(registry.resolve(&uri).is_some());
        registry.release(&uri);
        assert!(registry.resolve(&uri).is_none());
    }

    #[test]
    fn test_unknown_uri_is_ignored() {
        let mut registry = PreviewRegistry::new();
        registry.retain("preview://not-a-uuid");
        registry.release("http://elsewhere/img.png");
        assert!(registry.is_empty());
    }
}
