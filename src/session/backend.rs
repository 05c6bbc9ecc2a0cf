//! Platform camera boundary.
//!
//! The hardware camera and the platform photo pipeline live behind these
//! traits so the pipeline can be driven by real devices, fakes in tests, or
//! the synthetic backend used by `foodsnap simulate`.

use std::sync::mpsc::{self, Receiver};
use std::time::Instant;

use super::types::{DeviceInfo, Facing, Frame};
use crate::errors::CaptureError;

/// Completion channel for one still-capture request.
///
/// The platform delivers exactly one result on its own schedule. The worker
/// polls this without blocking; if the sender is dropped without a result,
/// that is treated as a platform failure.
pub type PhotoDelivery = Receiver<Result<Vec<u8>, CaptureError>>;

/// An opened camera device: a live frame stream plus a still-photo output.
pub trait CameraDevice: Send {
    /// Begin delivering frames. Called once, on the worker thread.
    fn start_stream(&mut self) -> Result<(), CaptureError>;

    /// Stop the frame stream. Must be safe to call more than once.
    fn stop_stream(&mut self);

    /// Pull the next available frame, or `None` if nothing is ready yet.
    fn next_frame(&mut self) -> Option<Frame>;

    /// Request one still capture from the platform photo pipeline.
    ///
    /// Returns the delivery channel on success. The photo itself arrives
    /// asynchronously; an already-stopped stream does not cancel it.
    fn request_still(&mut self) -> Result<PhotoDelivery, CaptureError>;
}

/// Device discovery and opening.
pub trait CameraBackend: Send {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError>;

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn CameraDevice>, CaptureError>;
}

/// Deterministic in-process backend with a single rear-facing device.
///
/// Produces flat gray frames at a fixed cadence and completes still requests
/// immediately with a copy of the most recent frame's pixels. Real image
/// encoding is out of scope; downstream consumers treat the bytes as opaque.
pub struct SyntheticBackend {
    devices: Vec<DeviceInfo>,
}

impl SyntheticBackend {
    pub fn new(devices: Vec<DeviceInfo>) -> Self {
        Self { devices }
    }
}

impl Default for SyntheticBackend {
    fn default() -> Self {
        Self::new(vec![DeviceInfo {
            id: "synth0".to_string(),
            name: "Synthetic Rear Camera".to_string(),
            facing: Facing::Back,
        }])
    }
}

impl CameraBackend for SyntheticBackend {
    fn list_devices(&self) -> Result<Vec<DeviceInfo>, CaptureError> {
        Ok(self.devices.clone())
    }

    fn open(&self, device: &DeviceInfo) -> Result<Box<dyn CameraDevice>, CaptureError> {
        if !self.devices.iter().any(|d| d.id == device.id) {
            return Err(CaptureError::DeviceUnavailable);
        }
        Ok(Box::new(SyntheticCamera::new()))
    }
}

const SYNTHETIC_WIDTH: u32 = 64;
const SYNTHETIC_HEIGHT: u32 = 48;

/// Synthetic frame source backing [`SyntheticBackend`].
pub struct SyntheticCamera {
    streaming: bool,
    frame_counter: u64,
    last_frame: Option<Frame>,
}

impl SyntheticCamera {
    fn new() -> Self {
        Self {
            streaming: false,
            frame_counter: 0,
            last_frame: None,
        }
    }
}

impl CameraDevice for SyntheticCamera {
    fn start_stream(&mut self) -> Result<(), CaptureError> {
        self.streaming = true;
        Ok(())
    }

    fn stop_stream(&mut self) {
        self.streaming = false;
    }

    fn next_frame(&mut self) -> Option<Frame> {
        if !self.streaming {
            return None;
        }
        // Flat gray field whose shade cycles with the frame counter, so
        // consecutive frames are distinguishable in logs and dumps.
        let shade = (self.frame_counter % 256) as u8;
        self.frame_counter += 1;
        let frame = Frame {
            data: vec![shade; (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize],
            width: SYNTHETIC_WIDTH,
            height: SYNTHETIC_HEIGHT,
            timestamp: Instant::now(),
        };
        self.last_frame = Some(frame.clone());
        Some(frame)
    }

    fn request_still(&mut self) -> Result<PhotoDelivery, CaptureError> {
        let (tx, rx) = mpsc::channel();
        let result = match &self.last_frame {
            Some(frame) => Ok(frame.data.clone()),
            None => Err(CaptureError::EncodingFailed),
        };
        // Receiver outlives this call; a send failure is unreachable here.
        let _ = tx.send(result);
        Ok(rx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_backend_lists_one_rear_device() {
        let backend = SyntheticBackend::default();
        let devices = backend.list_devices().unwrap();
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].facing, Facing::Back);
    }

    #[test]
    fn test_synthetic_backend_rejects_unknown_device() {
        let backend = SyntheticBackend::default();
        let unknown = DeviceInfo {
            id: "ghost".to_string(),
            name: "Ghost".to_string(),
            facing: Facing::Back,
        };
        assert_eq!(
            backend.open(&unknown).err(),
            Some(CaptureError::DeviceUnavailable)
        );
    }

    #[test]
    fn test_synthetic_camera_frames_only_while_streaming() {
        let mut camera = SyntheticCamera::new();
        assert!(camera.next_frame().is_none());

        camera.start_stream().unwrap();
        let frame = camera.next_frame().unwrap();
        assert_eq!(frame.width, SYNTHETIC_WIDTH);
        assert_eq!(frame.height, SYNTHETIC_HEIGHT);
        assert_eq!(
            frame.data.len(),
            (SYNTHETIC_WIDTH * SYNTHETIC_HEIGHT * 3) as usize
        );

        camera.stop_stream();
        assert!(camera.next_frame().is_none());
    }

    #[test]
    fn test_synthetic_still_before_first_frame_fails_encoding() {
        let mut camera = SyntheticCamera::new();
        camera.start_stream().unwrap();
        let delivery = camera.request_still().unwrap();
        assert_eq!(delivery.recv().unwrap(), Err(CaptureError::EncodingFailed));
    }

    #[test]
    fn test_synthetic_still_returns_latest_frame_bytes() {
        let mut camera = SyntheticCamera::new();
        camera.start_stream().unwrap();
        let frame = camera.next_frame().unwrap();
        let delivery = camera.request_still().unwrap();
        assert_eq!(delivery.recv().unwrap(), Ok(frame.data));
    }
}
