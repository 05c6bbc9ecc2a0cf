//! foodsnap library crate.
//!
//! Live food-capture pipeline: a camera session streams frames on a dedicated
//! worker thread, a classifier ranks each frame, a debouncer smooths the
//! noisy per-frame signal into a stable food-present decision, and an
//! orchestrator fires exactly one still capture per decision. Results cross
//! back to the caller's context through [`session::CaptureEvent`]s.

pub mod classify;
pub mod config;
pub mod detect;
pub mod errors;
mod pipeline;
pub mod publish;
pub mod session;
