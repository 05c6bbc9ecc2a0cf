//! Session worker thread.
//!
//! Everything that touches the device after `start()` happens here: frame
//! pulls, classification, capture requests, and photo polling. The loop never
//! blocks on the UI; commands and the stop signal are checked between frames.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use super::backend::CameraDevice;
use crate::classify::FrameClassifier;
use crate::pipeline::CapturePipeline;

/// Commands sent from the controller to the worker thread.
pub(crate) enum SessionCommand {
    /// Request one still capture (manual trigger).
    Capture,
    /// Clear guard and detection state, keep streaming.
    Reset,
    /// Stop streaming and exit the loop.
    Stop,
}

/// Run the session loop on a dedicated thread.
///
/// Frames are processed strictly one at a time, so the debouncer never
/// observes reordered samples and at most one classification is in flight.
/// Exiting while a still request is pending simply drops the delivery
/// channel; the platform's eventual completion has nowhere to go, which is
/// the deliver-or-drop contract.
pub(crate) fn run_session_loop(
    mut device: Box<dyn CameraDevice>,
    classifier: Arc<Mutex<Box<dyn FrameClassifier>>>,
    mut pipeline: CapturePipeline,
    stop: Arc<AtomicBool>,
    rx: Receiver<SessionCommand>,
) {
    if let Err(err) = device.start_stream() {
        log::error!("failed to start frame stream: {}", err);
        return;
    }
    log::debug!("session worker started");

    'outer: while !stop.load(Ordering::Relaxed) {
        // Commands first, so a manual capture beats the next frame.
        while let Ok(command) = rx.try_recv() {
            match command {
                SessionCommand::Capture => pipeline.on_manual_capture(&mut *device),
                SessionCommand::Reset => pipeline.on_reset(),
                SessionCommand::Stop => break 'outer,
            }
        }

        pipeline.poll_photo();

        if let Some(frame) = device.next_frame() {
            match classifier.lock() {
                Ok(mut guard) => {
                    pipeline.on_frame(&frame, &mut **guard, &mut *device);
                }
                Err(_) => {
                    log::error!("classifier mutex poisoned, stopping session worker");
                    break;
                }
            }
        }

        // Small sleep to allow checking the stop signal.
        thread::sleep(Duration::from_millis(1));
    }

    device.stop_stream();
    log::debug!("session worker stopped");
}
