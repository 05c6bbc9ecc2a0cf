//! Error types for the capture pipeline.

/// Errors that can occur while configuring the session or capturing a photo.
///
/// `DeviceUnavailable` is terminal for the session instance: it is surfaced by
/// `configure()` and the session never reaches `start()`. Every other variant
/// is local to a single capture attempt; the session stays running and the
/// caller may retry.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    /// No usable camera input could be attached at configuration time.
    #[error("no usable camera device available")]
    DeviceUnavailable,

    /// A capture was requested while the session was not running.
    #[error("capture requested while the session is not running")]
    SessionNotRunning,

    /// The session is running but has no still-photo connection attached.
    #[error("no active photo connection")]
    NoActiveConnection,

    /// The platform produced a photo but could not encode usable image bytes.
    #[error("failed to encode captured photo")]
    EncodingFailed,

    /// Any other failure reported by the platform photo pipeline.
    #[error("platform capture error: {0}")]
    Platform(String),
}
