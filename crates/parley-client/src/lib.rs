//! Parley client: the transcript submitter.
//!
//! [`session::Session`] owns the draft, the append-only transcript, and the
//! in-flight flag; [`transport::HttpTransport`] carries one submission at a
//! time to the gateway as a multipart POST. Attachment previews are handed
//! out and reclaimed by [`preview::PreviewRegistry`].

pub mod preview;
pub mod session;
pub mod transport;

pub use session::Session;
pub use transport::{HttpTransport, InferenceTransport, SubmitError};
