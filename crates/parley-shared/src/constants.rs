/// Path of the single inference endpoint exposed by the gateway.
pub const INFERENCE_API_PATH: &str = "/api/openai";

/// Multipart field carrying the draft text.
pub const TEXT_FIELD: &str = "text";

/// Multipart field carrying one image each (repeated, order preserved).
pub const IMAGES_FIELD: &str = "images";

/// User-message content when the draft text is empty at submit time.
pub const EMPTY_TEXT_PLACEHOLDER: &str = "Uploaded images";

/// Prefix prepended to every failure shown in the transcript.
pub const ERROR_PREFIX: &str = "Error: ";

/// Gateway response when a submission carries neither text nor images.
pub const EMPTY_SUBMISSION_ERROR: &str = "No input provided. Please submit text or images.";

/// URI scheme for in-memory attachment previews.
pub const PREVIEW_SCHEME: &str = "preview://";

/// Images are downscaled to fit this bounding box before upload to the
/// model provider.
pub const THUMBNAIL_MAX_WIDTH: u32 = 500;
pub const THUMBNAIL_MAX_HEIGHT: u32 = 500;

/// JPEG re-encode quality for downscaled images.
pub const THUMBNAIL_JPEG_QUALITY: u8 = 85;

/// Default model requested from the upstream provider.
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Default gateway HTTP port.
pub const DEFAULT_HTTP_PORT: u16 = 5000;

/// Maximum multipart body size accepted by the gateway (25 MiB).
pub const MAX_UPLOAD_SIZE: usize = 25 * 1024 * 1024;
