//! Food-detection debouncing.
//!
//! Raw per-frame classification is high-variance: a live stream at 10-30 Hz
//! flips labels constantly. The detector smooths that signal by requiring a
//! run of consecutive qualifying frames before arming a capture, trading a
//! few frame-intervals of latency for far fewer spurious captures.

use crate::classify::Classification;

/// Label keywords that qualify a classification as food.
pub const FOOD_KEYWORDS: [&str; 21] = [
    "food",
    "meal",
    "dish",
    "plate",
    "pizza",
    "burger",
    "salad",
    "fruit",
    "vegetable",
    "sandwich",
    "pasta",
    "rice",
    "bread",
    "meat",
    "chicken",
    "dessert",
    "cake",
    "cookie",
    "breakfast",
    "lunch",
    "dinner",
];

/// How many top-ranked labels are scanned per frame.
pub const DEFAULT_TOP_LABELS: usize = 10;

/// Minimum frame confidence before a keyword match counts as food.
pub const DEFAULT_MIN_CONFIDENCE: f32 = 0.5;

/// Consecutive qualifying frames required before auto-capture arms.
pub const DEFAULT_REQUIRED_HITS: u32 = 3;

/// Tunable thresholds for the detector. Defaults match the keyword scan the
/// pipeline was designed around; the keyword list itself is fixed.
#[derive(Debug, Clone, Copy)]
pub struct DetectorSettings {
    pub min_confidence: f32,
    pub required_hits: u32,
    pub top_labels: usize,
}

impl Default for DetectorSettings {
    fn default() -> Self {
        Self {
            min_confidence: DEFAULT_MIN_CONFIDENCE,
            required_hits: DEFAULT_REQUIRED_HITS,
            top_labels: DEFAULT_TOP_LABELS,
        }
    }
}

/// Smoothed decision for a single analyzed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionSample {
    pub is_food: bool,
    /// Maximum confidence among keyword-matching labels, 0.0 if none matched.
    pub confidence: f32,
}

/// Debounce counters. Mutated only by the detector, read by the orchestrator.
#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionState {
    pub consecutive_hits: u32,
    pub last_confidence: f32,
}

/// Per-frame debouncer over ranked classifier output.
///
/// Pure state machine: no I/O, no clock. The caller is responsible for not
/// feeding samples while a capture is in flight.
#[derive(Debug)]
pub struct FoodDetector {
    settings: DetectorSettings,
    state: DetectionState,
}

impl FoodDetector {
    pub fn new(settings: DetectorSettings) -> Self {
        Self {
            settings,
            state: DetectionState::default(),
        }
    }

    /// Classify one frame's ranked labels as food or not.
    ///
    /// Scans the first `top_labels` entries; the frame confidence is the
    /// maximum confidence among keyword-matching entries. The frame counts as
    /// food when that confidence exceeds `min_confidence`.
    pub fn sample(&self, ranked: &[Classification]) -> DetectionSample {
        let mut max_confidence: f32 = 0.0;

        for entry in ranked.iter().take(self.settings.top_labels) {
            let label = entry.label.to_lowercase();
            if FOOD_KEYWORDS.iter().any(|k| label.contains(k)) {
                max_confidence = max_confidence.max(entry.confidence);
            }
        }

        DetectionSample {
            is_food: max_confidence > self.settings.min_confidence,
            confidence: max_confidence,
        }
    }

    /// Feed one sample into the debounce counter.
    ///
    /// Returns `true` when the run of consecutive food frames reaches the
    /// required count. Arming resets the counter immediately; it does not
    /// wait for further frames.
    pub fn update(&mut self, sample: DetectionSample) -> bool {
        self.state.last_confidence = sample.confidence;

        if sample.is_food {
            self.state.consecutive_hits += 1;
            if self.state.consecutive_hits >= self.settings.required_hits {
                self.state.consecutive_hits = 0;
                return true;
            }
        } else {
            self.state.consecutive_hits = 0;
        }

        false
    }

    /// Convenience: `sample` followed by `update`.
    pub fn observe(&mut self, ranked: &[Classification]) -> (DetectionSample, bool) {
        let sample = self.sample(ranked);
        let armed = self.update(sample);
        (sample, armed)
    }

    pub fn state(&self) -> DetectionState {
        self.state
    }

    /// Clear all counters, e.g. after a capture fires or the camera resets.
    pub fn reset(&mut self) {
        self.state = DetectionState::default();
    }
}

impl Default for FoodDetector {
    fn default() -> Self {
        Self::new(DetectorSettings::default())
    }
}
