//! Frame classifier boundary.
//!
//! The visual classifier itself is an external collaborator. This module
//! defines the call contract the pipeline relies on: one frame in, a ranked
//! list of `(label, confidence)` out, exactly one completion per request.

use std::collections::VecDeque;

use crate::session::Frame;

/// One ranked label produced by the classifier for a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Classification {
    /// Label text as reported by the model (matched case-insensitively).
    pub label: String,
    /// Confidence in the range 0.0-1.0.
    pub confidence: f32,
}

impl Classification {
    pub fn new(label: impl Into<String>, confidence: f32) -> Self {
        Self {
            label: label.into(),
            confidence,
        }
    }
}

/// Error reported by a classifier implementation.
///
/// A failed classification skips the frame; it never stops the session.
#[derive(Debug, Clone, thiserror::Error)]
#[error("classification failed: {0}")]
pub struct ClassifyError(pub String);

/// Boundary trait over the external visual classifier.
///
/// Implementations are invoked once per analyzed frame, always on the session
/// worker thread, and must return exactly once per request: either the ranked
/// label list or an error. The list is expected to be ordered by descending
/// confidence; the detector only inspects a fixed prefix of it.
pub trait FrameClassifier: Send {
    fn classify(&mut self, frame: &Frame) -> Result<Vec<Classification>, ClassifyError>;
}

/// Classifier that replays a pre-built script, one result per frame.
///
/// Used by the `simulate` subcommand and the integration tests to drive the
/// pipeline deterministically without a real model. Once the script is
/// exhausted, every further frame classifies as the configured filler result.
pub struct ScriptedClassifier {
    script: VecDeque<Vec<Classification>>,
    exhausted: Vec<Classification>,
}

impl ScriptedClassifier {
    pub fn new(script: Vec<Vec<Classification>>) -> Self {
        Self {
            script: script.into(),
            exhausted: vec![Classification::new("table", 0.4)],
        }
    }

    /// Override the result returned after the script runs out.
    pub fn with_filler(mut self, filler: Vec<Classification>) -> Self {
        self.exhausted = filler;
        self
    }

    /// Number of scripted frames not yet consumed.
    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl FrameClassifier for ScriptedClassifier {
    fn classify(&mut self, _frame: &Frame) -> Result<Vec<Classification>, ClassifyError> {
        Ok(self
            .script
            .pop_front()
            .unwrap_or_else(|| self.exhausted.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    fn test_frame() -> Frame {
        Frame {
            data: vec![0; 12],
            width: 2,
            height: 2,
            timestamp: Instant::now(),
        }
    }

    #[test]
    fn test_scripted_classifier_replays_in_order() {
        let mut classifier = ScriptedClassifier::new(vec![
            vec![Classification::new("pizza", 0.9)],
            vec![Classification::new("lamp", 0.7)],
        ]);
        let frame = test_frame();

        let first = classifier.classify(&frame).unwrap();
        assert_eq!(first[0].label, "pizza");
        let second = classifier.classify(&frame).unwrap();
        assert_eq!(second[0].label, "lamp");
        assert_eq!(classifier.remaining(), 0);
    }

    #[test]
    fn test_scripted_classifier_filler_after_exhaustion() {
        let mut classifier = ScriptedClassifier::new(vec![])
            .with_filler(vec![Classification::new("curtain", 0.3)]);
        let frame = test_frame();

        for _ in 0..3 {
            let result = classifier.classify(&frame).unwrap();
            assert_eq!(result[0].label, "curtain");
        }
    }
}
