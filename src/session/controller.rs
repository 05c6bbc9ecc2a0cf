//! Capture session controller.
//!
//! Owns the camera device session: configuration, start/stop, and the
//! single-shot capture entry points consumed by the UI layer. Session
//! mutations are serialized through this controller and its worker thread so
//! they can never race with frame delivery.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;

use super::backend::CameraBackend;
use super::types::{CameraSessionState, CaptureEvent, DeviceInfo, SessionSettings};
use super::worker::{run_session_loop, SessionCommand};
use crate::classify::FrameClassifier;
use crate::detect::{DetectorSettings, FoodDetector};
use crate::errors::CaptureError;
use crate::pipeline::CapturePipeline;
use crate::publish::{CaptureMonitor, ResultPublisher};

/// Outputs attached during configuration: one frame stream for
/// classification, one still-photo output for capture.
#[derive(Debug, Clone, Copy, Default)]
struct SessionOutputs {
    frame_stream: bool,
    photo: bool,
}

/// Camera capture session.
///
/// Created when the capture screen becomes active and torn down when it is
/// dismissed; nothing survives across instances except the caller-owned
/// settings. The worker thread owns the opened device; the controller only
/// sends commands and reads the shared observables.
pub struct CameraSession {
    backend: Box<dyn CameraBackend>,
    classifier: Arc<Mutex<Box<dyn FrameClassifier>>>,
    settings: SessionSettings,
    detector_settings: DetectorSettings,
    state: CameraSessionState,
    device: Option<DeviceInfo>,
    outputs: SessionOutputs,
    worker: Option<JoinHandle<()>>,
    command_tx: Option<Sender<SessionCommand>>,
    stop_signal: Arc<AtomicBool>,
    auto_capture: Arc<AtomicBool>,
    monitor: CaptureMonitor,
    event_tx: Sender<CaptureEvent>,
    event_rx: Option<Receiver<CaptureEvent>>,
}

impl std::fmt::Debug for CameraSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CameraSession")
            .field("state", &self.state)
            .field("device", &self.device)
            .field("is_running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl CameraSession {
    pub fn new(
        backend: Box<dyn CameraBackend>,
        classifier: Box<dyn FrameClassifier>,
        settings: SessionSettings,
        detector_settings: DetectorSettings,
    ) -> Self {
        let (event_tx, event_rx) = mpsc::channel();
        Self {
            backend,
            classifier: Arc::new(Mutex::new(classifier)),
            settings,
            detector_settings,
            state: CameraSessionState::Unconfigured,
            device: None,
            outputs: SessionOutputs::default(),
            worker: None,
            command_tx: None,
            stop_signal: Arc::new(AtomicBool::new(false)),
            auto_capture: Arc::new(AtomicBool::new(settings.auto_capture)),
            monitor: CaptureMonitor::new(),
            event_tx,
            event_rx: Some(event_rx),
        }
    }

    /// Select a capture device and attach the session outputs.
    ///
    /// Transactional: on any failure the partially attached inputs/outputs
    /// are rolled back and the configuration is still committed, leaving the
    /// session object valid for a retry. A failed configure is terminal for
    /// this session instance until it succeeds; `start()` refuses to run an
    /// unconfigured session.
    ///
    /// # Errors
    /// * `CaptureError::DeviceUnavailable` - no device with the requested
    ///   facing could be attached.
    pub fn configure(&mut self) -> Result<(), CaptureError> {
        if self.state != CameraSessionState::Unconfigured {
            return Ok(());
        }

        self.state = CameraSessionState::Configuring;
        match self.attach_inputs_outputs() {
            Ok(()) => {
                self.state = CameraSessionState::Idle;
                Ok(())
            }
            Err(err) => {
                // Commit the canceled configuration: roll back attachments so
                // the session is empty-but-consistent, not half-configured.
                self.device = None;
                self.outputs = SessionOutputs::default();
                self.state = CameraSessionState::Unconfigured;
                Err(err)
            }
        }
    }

    fn attach_inputs_outputs(&mut self) -> Result<(), CaptureError> {
        let devices = self.backend.list_devices()?;
        let device = devices
            .into_iter()
            .find(|d| d.facing == self.settings.facing)
            .ok_or(CaptureError::DeviceUnavailable)?;
        log::info!("configured capture device {}", device);

        self.device = Some(device);
        self.outputs.frame_stream = true;
        self.outputs.photo = true;
        Ok(())
    }

    /// Start the session worker thread.
    ///
    /// Asynchronous from the caller's perspective: returns as soon as the
    /// worker is spawned, without waiting for the stream to be live.
    /// Idempotent; starting a running session is a no-op.
    ///
    /// # Errors
    /// * `CaptureError::DeviceUnavailable` - the session was never
    ///   successfully configured, or the configured device can no longer be
    ///   opened.
    pub fn start(&mut self) -> Result<(), CaptureError> {
        if self.is_running() {
            log::debug!("start ignored: session already running");
            return Ok(());
        }

        let info = self
            .device
            .as_ref()
            .ok_or(CaptureError::DeviceUnavailable)?
            .clone();
        let device = self.backend.open(&info)?;

        self.stop_signal.store(false, Ordering::SeqCst);
        let (tx, rx) = mpsc::channel();
        self.command_tx = Some(tx);

        let pipeline = CapturePipeline::new(
            FoodDetector::new(self.detector_settings),
            self.monitor.clone(),
            ResultPublisher::new(self.event_tx.clone()),
            Arc::clone(&self.auto_capture),
            self.settings.watchdog,
        );
        let classifier = Arc::clone(&self.classifier);
        let stop = Arc::clone(&self.stop_signal);

        self.worker = Some(std::thread::spawn(move || {
            run_session_loop(device, classifier, pipeline, stop, rx);
        }));
        self.state = CameraSessionState::Running;
        log::info!("capture session started on {}", info);
        Ok(())
    }

    /// Stop the session worker thread.
    ///
    /// Idempotent; stopping an already-stopped session is a no-op. A still
    /// capture in flight is not canceled: its eventual completion is dropped
    /// by the deliver-or-drop contract.
    pub fn stop(&mut self) {
        self.stop_signal.store(true, Ordering::SeqCst);

        // Also send a stop command in case the worker is mid-iteration.
        if let Some(tx) = self.command_tx.take() {
            let _ = tx.send(SessionCommand::Stop);
        }
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
            log::info!("capture session stopped");
        }
        if self.state == CameraSessionState::Running {
            self.state = CameraSessionState::Stopped;
        }
    }

    /// Manually trigger a single still capture.
    ///
    /// Valid only while running; while a capture is already in flight this is
    /// a no-op rather than an error, so a double-tap delivers exactly one
    /// photo. The guard itself is taken on the worker thread, before the
    /// still request is handed to the platform.
    ///
    /// # Errors
    /// * `CaptureError::SessionNotRunning` - the session is not running.
    /// * `CaptureError::NoActiveConnection` - no photo output is attached.
    pub fn capture_photo(&mut self) -> Result<(), CaptureError> {
        if !self.is_running() {
            return Err(CaptureError::SessionNotRunning);
        }
        if !self.outputs.photo {
            return Err(CaptureError::NoActiveConnection);
        }
        if self.monitor.is_capturing() {
            log::debug!("capture already in flight, ignoring manual trigger");
            return Ok(());
        }

        self.command_tx
            .as_ref()
            .ok_or(CaptureError::SessionNotRunning)?
            .send(SessionCommand::Capture)
            .map_err(|_| CaptureError::SessionNotRunning)
    }

    /// Return to live preview after the UI discarded a captured photo.
    ///
    /// While the session is running the reset is handed to the worker, which
    /// force-clears the capture guard and the detection state. Otherwise the
    /// stale observables are cleared here and the session is restarted.
    pub fn reset_camera(&mut self) -> Result<(), CaptureError> {
        if self.is_running() {
            // The worker owns the capture state while running; it clears the
            // guard and the detection observables when it handles the command.
            if let Some(tx) = &self.command_tx {
                let _ = tx.send(SessionCommand::Reset);
            }
            Ok(())
        } else {
            // No worker exists to do it, so stale observables from a previous
            // run are cleared here before restarting.
            self.monitor.set_capturing(false);
            self.monitor.clear_detection();
            self.start()
        }
    }

    /// Enable or disable the auto-capture path. Manual captures are
    /// unaffected.
    pub fn set_auto_capture(&self, enabled: bool) {
        self.auto_capture.store(enabled, Ordering::Relaxed);
        log::debug!("auto-capture {}", if enabled { "enabled" } else { "disabled" });
    }

    pub fn auto_capture(&self) -> bool {
        self.auto_capture.load(Ordering::Relaxed)
    }

    /// Shared observable state: detection status and the capture guard.
    pub fn monitor(&self) -> CaptureMonitor {
        self.monitor.clone()
    }

    /// Take the capture-event receiver. Yields `Some` exactly once; the
    /// UI context owns it from then on. Dropping it switches the publisher
    /// to drop mode.
    pub fn take_events(&mut self) -> Option<Receiver<CaptureEvent>> {
        self.event_rx.take()
    }

    pub fn state(&self) -> CameraSessionState {
        self.state
    }

    /// The device selected by `configure()`, if any.
    pub fn device(&self) -> Option<&DeviceInfo> {
        self.device.as_ref()
    }

    /// Whether the worker thread is currently alive.
    pub fn is_running(&self) -> bool {
        self.state == CameraSessionState::Running
            && self.worker.as_ref().is_some_and(|h| !h.is_finished())
    }
}

impl Drop for CameraSession {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::ScriptedClassifier;
    use crate::session::backend::SyntheticBackend;
    use crate::session::types::Facing;

    fn session_with_backend(backend: SyntheticBackend) -> CameraSession {
        CameraSession::new(
            Box::new(backend),
            Box::new(ScriptedClassifier::new(vec![])),
            SessionSettings::default(),
            DetectorSettings::default(),
        )
    }

    #[test]
    fn test_configure_selects_rear_device() {
        let mut session = session_with_backend(SyntheticBackend::default());
        session.configure().unwrap();
        assert_eq!(session.state(), CameraSessionState::Idle);
        assert_eq!(session.device().unwrap().facing, Facing::Back);
    }

    #[test]
    fn test_configure_without_rear_device_is_terminal() {
        let front_only = SyntheticBackend::new(vec![DeviceInfo {
            id: "front0".to_string(),
            name: "Selfie Camera".to_string(),
            facing: Facing::Front,
        }]);
        let mut session = session_with_backend(front_only);

        assert_eq!(
            session.configure().unwrap_err(),
            CaptureError::DeviceUnavailable
        );
        assert_eq!(session.state(), CameraSessionState::Unconfigured);
        assert!(session.device().is_none());

        // start() is unreachable on an unconfigured session.
        assert_eq!(session.start().unwrap_err(), CaptureError::DeviceUnavailable);
        assert_eq!(session.state(), CameraSessionState::Unconfigured);
    }

    #[test]
    fn test_configure_twice_is_noop() {
        let mut session = session_with_backend(SyntheticBackend::default());
        session.configure().unwrap();
        session.configure().unwrap();
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_capture_before_start_is_session_not_running() {
        let mut session = session_with_backend(SyntheticBackend::default());
        session.configure().unwrap();
        assert_eq!(
            session.capture_photo().unwrap_err(),
            CaptureError::SessionNotRunning
        );
    }

    #[test]
    fn test_stop_without_start_is_noop() {
        let mut session = session_with_backend(SyntheticBackend::default());
        session.configure().unwrap();
        session.stop();
        session.stop();
        assert_eq!(session.state(), CameraSessionState::Idle);
    }

    #[test]
    fn test_reset_camera_clears_stale_guard_before_restart() {
        let mut session = session_with_backend(SyntheticBackend::default());
        session.configure().unwrap();
        session.monitor().set_capturing(true);

        session.reset_camera().unwrap();
        assert!(!session.monitor().is_capturing());
        assert!(session.is_running());
        session.stop();
    }

    #[test]
    fn test_take_events_yields_once() {
        let mut session = session_with_backend(SyntheticBackend::default());
        assert!(session.take_events().is_some());
        assert!(session.take_events().is_none());
    }

    #[test]
    fn test_set_auto_capture_round_trips() {
        let session = session_with_backend(SyntheticBackend::default());
        assert!(session.auto_capture());
        session.set_auto_capture(false);
        assert!(!session.auto_capture());
    }
}
