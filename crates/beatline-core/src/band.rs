//! Frequency bands and their spectral flux history.
//!
//! A [`FrequencyBand`] owns an append-only, time-ordered sequence of
//! [`FluxSample`]s for one Hz range and computes its own adaptive threshold
//! from a centered moving-average window. Bands share nothing with each
//! other; the analyzer drives all of them against the same frame sequence.

use serde::{Deserialize, Serialize};

/// One frame's worth of spectral flux data for a single band.
///
/// A sample is appended with only `time` and `flux` filled in. The derived
/// fields are written exactly once, `window_size / 2 + 1` frames later, when
/// the band's cursor reaches the sample and its neighbors exist. After that
/// the sample is immutable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FluxSample {
    /// Frame time in seconds
    pub time: f32,
    /// Raw rectified spectral flux (always >= 0)
    pub flux: f32,
    /// Adaptive threshold at this sample (centered window mean x multiplier)
    pub threshold: f32,
    /// `max(0, flux - threshold)`
    pub pruned_flux: f32,
    /// Whether this sample was flagged as an onset
    pub is_onset: bool,
}

/// A contiguous frequency range analyzed independently for onsets.
///
/// Boundaries are exclusive on both ends: a spectrum bin contributes to this
/// band iff `lower_hz < bin_hz < upper_hz`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrequencyBand {
    /// Display name, e.g. "Bass"
    pub name: String,
    /// Lower frequency boundary in Hz (exclusive)
    pub lower_hz: f32,
    /// Upper frequency boundary in Hz (exclusive)
    pub upper_hz: f32,
    /// Sensitivity multiplier scaling the adaptive average. With 1.5, a
    /// flux sample more than 1.5x the local average survives thresholding.
    pub threshold_multiplier: f32,

    #[serde(skip)]
    samples: Vec<FluxSample>,
    /// Index of the next sample eligible for threshold evaluation. Starts at
    /// `window_size / 2` and only ever increases, by one per frame once
    /// enough history exists.
    #[serde(skip)]
    cursor: usize,
}

impl FrequencyBand {
    /// Create a band covering the open interval `(lower_hz, upper_hz)`.
    pub fn new(
        name: impl Into<String>,
        lower_hz: f32,
        upper_hz: f32,
        threshold_multiplier: f32,
    ) -> Self {
        Self {
            name: name.into(),
            lower_hz,
            upper_hz,
            threshold_multiplier,
            samples: Vec::new(),
            cursor: 0,
        }
    }

    /// All flux samples recorded so far, in frame order.
    pub fn samples(&self) -> &[FluxSample] {
        &self.samples
    }

    /// The next sample index awaiting threshold evaluation.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Clear the sample history and rewind the cursor to its initial
    /// position for the given window size. Used when a generation run is
    /// discarded and restarted; history is never partially reused.
    pub fn reset(&mut self, window_size: usize) {
        self.samples.clear();
        self.cursor = window_size / 2;
    }

    pub(crate) fn set_initial_cursor(&mut self, window_size: usize) {
        self.cursor = window_size / 2;
    }

    pub(crate) fn push_sample(&mut self, time: f32, flux: f32) {
        self.samples.push(FluxSample {
            time,
            flux,
            ..FluxSample::default()
        });
    }

    /// Mean flux over the centered window around the cursor, scaled by the
    /// threshold multiplier. The window is `[cursor - w/2, cursor + w/2)`
    /// clamped to the recorded history.
    pub(crate) fn flux_threshold(&self, window_size: usize) -> f32 {
        let half = window_size / 2;
        let start = self.cursor.saturating_sub(half);
        let end = (self.cursor + half).min(self.samples.len().saturating_sub(1));

        if end <= start {
            return 0.0;
        }

        let sum: f32 = self.samples[start..end].iter().map(|s| s.flux).sum();
        let average = sum / (end - start) as f32;
        average * self.threshold_multiplier
    }

    /// Evaluate the sample at the cursor and decide the onset flag for the
    /// sample one behind it, then advance. Called once per frame by the
    /// analyzer, only after the history has reached the window size.
    pub(crate) fn evaluate_pending(&mut self, window_size: usize) {
        debug_assert!(self.samples.len() >= window_size);
        debug_assert!(self.cursor < self.samples.len());

        let threshold = self.flux_threshold(window_size);

        let sample = &mut self.samples[self.cursor];
        sample.threshold = threshold;
        sample.pruned_flux = (sample.flux - threshold).max(0.0);

        // The previous index now has thresholded neighbors on both sides
        // and can be checked for a local peak. Its onset flag is decided
        // here exactly once and never revisited.
        if let Some(peak_index) = self.cursor.checked_sub(1) {
            if self.is_pruned_peak(peak_index) {
                self.samples[peak_index].is_onset = true;
            }
        }

        self.cursor += 1;
    }

    /// Test helper: a band whose samples carry pre-decided onset flags.
    #[cfg(test)]
    pub(crate) fn with_onsets(len: usize, onsets: &[usize]) -> Self {
        let mut band = Self::new("test", 0.0, 100.0, 1.0);
        band.samples = (0..len)
            .map(|i| FluxSample {
                time: i as f32 * 0.1,
                flux: if onsets.contains(&i) { 10.0 } else { 0.0 },
                threshold: 0.0,
                pruned_flux: if onsets.contains(&i) { 10.0 } else { 0.0 },
                is_onset: onsets.contains(&i),
            })
            .collect();
        band.cursor = len;
        band
    }

    /// A sample is a peak iff its pruned flux strictly exceeds both
    /// immediate neighbors. Sequence edges are never peaks.
    fn is_pruned_peak(&self, index: usize) -> bool {
        if index == 0 || index + 1 >= self.samples.len() {
            return false;
        }
        let pruned = self.samples[index].pruned_flux;
        pruned > self.samples[index - 1].pruned_flux && pruned > self.samples[index + 1].pruned_flux
    }
}
