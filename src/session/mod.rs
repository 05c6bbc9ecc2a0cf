//! Camera capture session: device boundary, controller, and worker thread.

pub mod backend;
mod controller;
mod types;
mod worker;

pub use backend::{CameraBackend, CameraDevice, PhotoDelivery, SyntheticBackend};
pub use controller::CameraSession;
pub use types::{
    CameraSessionState, CaptureEvent, CapturedPhoto, DeviceInfo, Facing, Frame, SessionSettings,
};
