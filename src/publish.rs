//! Result hand-off and shared observables.
//!
//! Capture outcomes are produced on the session worker thread and consumed on
//! the UI's own context. The publisher crosses that boundary exactly once per
//! event over an mpsc channel; live detection status crosses it continuously
//! through lock-free atomics.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::mpsc::Sender;
use std::sync::Arc;

use crate::detect::DetectionSample;
use crate::session::CaptureEvent;

/// Publishes capture outcomes from the worker thread to the UI context.
///
/// Deliver-or-drop: if the receiving side has been torn down between request
/// and delivery, the event is dropped with a debug log. A late platform
/// callback must never crash the pipeline.
pub struct ResultPublisher {
    tx: Sender<CaptureEvent>,
}

impl ResultPublisher {
    pub(crate) fn new(tx: Sender<CaptureEvent>) -> Self {
        Self { tx }
    }

    pub(crate) fn publish(&self, event: CaptureEvent) {
        match &event {
            CaptureEvent::Photo(photo) => {
                log::info!("publishing captured photo ({} bytes)", photo.bytes.len());
            }
            CaptureEvent::Failed(err) => {
                log::warn!("publishing capture failure: {}", err);
            }
        }
        if self.tx.send(event).is_err() {
            log::debug!("capture event dropped: UI receiver is gone");
        }
    }
}

/// Cheaply cloneable view of the pipeline's observable state.
///
/// `is_capturing` mirrors the capture guard: while it reads `true`, exactly
/// one still request is in flight and further capture calls are no-ops.
#[derive(Clone)]
pub struct CaptureMonitor {
    inner: Arc<MonitorInner>,
}

struct MonitorInner {
    food_detected: AtomicBool,
    confidence_bits: AtomicU32,
    capturing: AtomicBool,
}

impl CaptureMonitor {
    pub(crate) fn new() -> Self {
        Self {
            inner: Arc::new(MonitorInner {
                food_detected: AtomicBool::new(false),
                confidence_bits: AtomicU32::new(0.0f32.to_bits()),
                capturing: AtomicBool::new(false),
            }),
        }
    }

    pub fn is_food_detected(&self) -> bool {
        self.inner.food_detected.load(Ordering::Relaxed)
    }

    pub fn detection_confidence(&self) -> f32 {
        f32::from_bits(self.inner.confidence_bits.load(Ordering::Relaxed))
    }

    pub fn is_capturing(&self) -> bool {
        self.inner.capturing.load(Ordering::SeqCst)
    }

    pub(crate) fn set_detection(&self, sample: DetectionSample) {
        self.inner
            .food_detected
            .store(sample.is_food, Ordering::Relaxed);
        self.inner
            .confidence_bits
            .store(sample.confidence.to_bits(), Ordering::Relaxed);
    }

    pub(crate) fn clear_detection(&self) {
        self.set_detection(DetectionSample {
            is_food: false,
            confidence: 0.0,
        });
    }

    pub(crate) fn set_capturing(&self, capturing: bool) {
        self.inner.capturing.store(capturing, Ordering::SeqCst);
    }
}

impl Default for CaptureMonitor {
    fn default() -> Self {
        Self::new()
    }
}
