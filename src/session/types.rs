//! Session types and data structures.

use std::fmt;
use std::time::{Duration, Instant, SystemTime};

use crate::errors::CaptureError;

/// Which way a camera device faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Facing {
    Back,
    Front,
    External,
}

impl fmt::Display for Facing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Facing::Back => write!(f, "back"),
            Facing::Front => write!(f, "front"),
            Facing::External => write!(f, "external"),
        }
    }
}

/// Information about an available camera device.
#[derive(Debug, Clone)]
pub struct DeviceInfo {
    /// Backend-specific identifier.
    pub id: String,
    /// Human-readable device name.
    pub name: String,
    pub facing: Facing,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} ({})", self.id, self.name, self.facing)
    }
}

/// One raw image buffer pulled from the live stream.
///
/// Ephemeral: frames are classified and dropped, never retained past the
/// debounce step.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Raw pixel data in RGB format.
    pub data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    /// When the frame was pulled from the stream.
    pub timestamp: Instant,
}

/// Lifecycle of a capture session.
///
/// Owned exclusively by the session controller; transitions are serialized
/// through its methods, never mutated from the worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CameraSessionState {
    Unconfigured,
    Configuring,
    Idle,
    Running,
    Stopped,
}

/// A finished still capture, owned by the publisher until handed to the UI.
#[derive(Debug, Clone)]
pub struct CapturedPhoto {
    /// Encoded image bytes as produced by the platform photo pipeline.
    pub bytes: Vec<u8>,
    pub captured_at: SystemTime,
}

/// One capture outcome crossing from the worker thread to the UI context.
#[derive(Debug, Clone)]
pub enum CaptureEvent {
    Photo(CapturedPhoto),
    Failed(CaptureError),
}

/// Caller-owned session configuration.
#[derive(Debug, Clone, Copy)]
pub struct SessionSettings {
    /// Which device facing `configure()` selects.
    pub facing: Facing,
    /// Whether auto-capture starts enabled.
    pub auto_capture: bool,
    /// How long a requested still may stay undelivered before the guard is
    /// force-cleared and a platform error is surfaced.
    pub watchdog: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            facing: Facing::Back,
            auto_capture: true,
            watchdog: Duration::from_secs(5),
        }
    }
}
