//! Capture orchestration state machine.
//!
//! One state machine coordinates the auto-capture path (frames -> classifier
//! -> debouncer) and the manual-capture path (UI command), so the two can
//! never race into a duplicate still request. All methods run on the session
//! worker thread; the UI observes progress through [`CaptureMonitor`] and the
//! event channel.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::classify::FrameClassifier;
use crate::detect::FoodDetector;
use crate::errors::CaptureError;
use crate::publish::{CaptureMonitor, ResultPublisher};
use crate::session::backend::{CameraDevice, PhotoDelivery};
use crate::session::{CaptureEvent, CapturedPhoto, Frame};

/// Orchestrator states.
///
/// `Analyzing` only exists for the duration of a synchronous classification
/// call; between worker iterations the machine rests in `Idle` or
/// `AwaitingPhoto`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PipelineState {
    Idle,
    Analyzing,
    CaptureRequested,
    AwaitingPhoto,
}

struct PendingCapture {
    delivery: PhotoDelivery,
    requested_at: Instant,
}

pub(crate) struct CapturePipeline {
    state: PipelineState,
    detector: FoodDetector,
    monitor: CaptureMonitor,
    publisher: ResultPublisher,
    auto_capture: Arc<AtomicBool>,
    pending: Option<PendingCapture>,
    watchdog: Duration,
}

impl CapturePipeline {
    pub(crate) fn new(
        detector: FoodDetector,
        monitor: CaptureMonitor,
        publisher: ResultPublisher,
        auto_capture: Arc<AtomicBool>,
        watchdog: Duration,
    ) -> Self {
        Self {
            state: PipelineState::Idle,
            detector,
            monitor,
            publisher,
            auto_capture,
            pending: None,
            watchdog,
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> PipelineState {
        self.state
    }

    /// One frame arrived on the worker thread.
    ///
    /// Frames are dropped, not queued, unless the machine is idle with
    /// auto-capture enabled: a frame arriving while a capture is in flight
    /// must not enqueue classification work or re-trigger a second capture.
    pub(crate) fn on_frame(
        &mut self,
        frame: &Frame,
        classifier: &mut dyn FrameClassifier,
        device: &mut dyn CameraDevice,
    ) {
        if self.state != PipelineState::Idle || self.monitor.is_capturing() {
            return;
        }
        if !self.auto_capture.load(Ordering::Relaxed) {
            return;
        }

        self.state = PipelineState::Analyzing;
        let ranked = match classifier.classify(frame) {
            Ok(ranked) => ranked,
            Err(err) => {
                log::warn!("skipping frame: {}", err);
                self.state = PipelineState::Idle;
                return;
            }
        };

        let (sample, armed) = self.detector.observe(&ranked);
        self.monitor.set_detection(sample);

        if armed {
            log::info!(
                "consecutive food frames confirmed (confidence {:.2}), arming capture",
                sample.confidence
            );
            self.request_capture(device);
        } else {
            self.state = PipelineState::Idle;
        }
    }

    /// Manual capture command from the UI.
    ///
    /// A no-op while a capture is already in flight, so a double-tap delivers
    /// exactly one photo.
    pub(crate) fn on_manual_capture(&mut self, device: &mut dyn CameraDevice) {
        if self.state != PipelineState::Idle || self.monitor.is_capturing() {
            log::debug!("manual capture ignored: capture already in flight");
            return;
        }
        self.request_capture(device);
    }

    /// Poll the in-flight still request, if any.
    ///
    /// Drives the `AwaitingPhoto -> Idle` transitions: photo delivery,
    /// platform failure, a platform that hung up without answering, and the
    /// watchdog for a platform that never answers at all. Every one of these
    /// paths clears the capture guard.
    pub(crate) fn poll_photo(&mut self) {
        if self.state != PipelineState::AwaitingPhoto {
            return;
        }
        let Some(pending) = &self.pending else {
            // Unreachable by construction; recover rather than wedge the guard.
            self.finish_capture();
            return;
        };

        use std::sync::mpsc::TryRecvError;
        let outcome = match pending.delivery.try_recv() {
            Ok(Ok(bytes)) => CaptureEvent::Photo(CapturedPhoto {
                bytes,
                captured_at: SystemTime::now(),
            }),
            Ok(Err(err)) => CaptureEvent::Failed(err),
            Err(TryRecvError::Empty) => {
                if pending.requested_at.elapsed() <= self.watchdog {
                    return;
                }
                log::error!(
                    "no photo delivered within {:?}, force-clearing capture guard",
                    self.watchdog
                );
                CaptureEvent::Failed(CaptureError::Platform(
                    "still capture timed out".to_string(),
                ))
            }
            Err(TryRecvError::Disconnected) => CaptureEvent::Failed(CaptureError::Platform(
                "photo pipeline closed without delivering a photo".to_string(),
            )),
        };

        // Guard down before the event goes out: a subscriber that reacts to
        // the outcome by retrying must find the machine capturable again.
        self.finish_capture();
        self.publisher.publish(outcome);
    }

    /// Force-clear the guard and detection state and return to `Idle`.
    ///
    /// Used when the UI discards a captured photo and returns to live
    /// preview. Any still request still in flight is abandoned; its eventual
    /// completion has nowhere to deliver and is dropped by the platform side.
    pub(crate) fn on_reset(&mut self) {
        self.pending = None;
        self.state = PipelineState::Idle;
        self.detector.reset();
        self.monitor.set_capturing(false);
        self.monitor.clear_detection();
    }

    fn request_capture(&mut self, device: &mut dyn CameraDevice) {
        self.state = PipelineState::CaptureRequested;
        // The guard goes up before the asynchronous hand-off so a frame
        // arriving mid-request is dropped rather than re-triggering.
        self.monitor.set_capturing(true);

        match device.request_still() {
            Ok(delivery) => {
                self.pending = Some(PendingCapture {
                    delivery,
                    requested_at: Instant::now(),
                });
                self.state = PipelineState::AwaitingPhoto;
            }
            Err(err) => {
                self.finish_capture();
                self.publisher.publish(CaptureEvent::Failed(err));
            }
        }
    }

    /// Common tail of every capture completion and failure path.
    fn finish_capture(&mut self) {
        self.pending = None;
        self.monitor.set_capturing(false);
        self.detector.reset();
        self.monitor.clear_detection();
        self.state = PipelineState::Idle;
    }
}
