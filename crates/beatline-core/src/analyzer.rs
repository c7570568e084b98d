//! Multi-band spectral flux analysis over magnitude-spectrum frames.
//!
//! The analyzer is fed whole-clip audio as a strictly ordered sequence of
//! magnitude spectra. Each call to [`SpectrumAnalyzer::analyze`] updates
//! every configured band's flux history; onset decisions lag the incoming
//! stream by `window_size / 2 + 1` frames because the adaptive threshold
//! needs a centered window, and once made they are never revisited.

use crate::band::FrequencyBand;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Configuration for [`SpectrumAnalyzer`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyzerConfig {
    /// Sample rate of the source audio in Hz
    pub sample_rate: u32,
    /// FFT size the incoming spectra were produced with (power of 2).
    /// Determines the bin -> frequency mapping.
    pub fft_size: usize,
    /// Number of samples averaged in the adaptive threshold window
    pub window_size: usize,
    /// Number of display bars averaged per frame (0 disables bar frames)
    pub bars: usize,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            fft_size: 1024,
            window_size: 50,
            bars: 0,
        }
    }
}

/// Per-frame bar averages of the magnitude spectrum, kept for the plotting
/// collaborator. Not used by placement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpectrumFrame {
    /// Frame time in seconds
    pub time: f32,
    /// Mean magnitude of each equal-width bin group
    pub bars: Vec<f32>,
}

/// Orchestrates N independent [`FrequencyBand`] state machines against
/// successive magnitude-spectrum frames.
pub struct SpectrumAnalyzer {
    config: AnalyzerConfig,
    bands: Vec<FrequencyBand>,
    /// Frequency each spectrum bin index represents
    hz_per_bin: f32,
    current_spectrum: Vec<f32>,
    previous_spectrum: Vec<f32>,
    bar_frames: Vec<SpectrumFrame>,
    frames_analyzed: usize,
}

impl SpectrumAnalyzer {
    /// Create an analyzer over the given bands.
    ///
    /// Fails if the window size is too small to ever define a centered
    /// window, or if any band carries a negative threshold multiplier.
    pub fn new(config: AnalyzerConfig, mut bands: Vec<FrequencyBand>) -> Result<Self> {
        if config.window_size < 2 {
            return Err(CoreError::InvalidConfig(format!(
                "threshold window size must be at least 2, got {}",
                config.window_size
            )));
        }
        if config.fft_size == 0 || config.sample_rate == 0 {
            return Err(CoreError::InvalidConfig(
                "fft size and sample rate must be non-zero".to_string(),
            ));
        }
        for band in &bands {
            if band.threshold_multiplier < 0.0 {
                return Err(CoreError::InvalidConfig(format!(
                    "band \"{}\" has negative threshold multiplier {}",
                    band.name, band.threshold_multiplier
                )));
            }
        }

        // Evaluation begins halfway through the first threshold window.
        for band in &mut bands {
            band.set_initial_cursor(config.window_size);
        }

        let hz_per_bin = config.sample_rate as f32 / config.fft_size as f32;

        debug!(
            sample_rate = config.sample_rate,
            fft_size = config.fft_size,
            window_size = config.window_size,
            bands = bands.len(),
            "spectrum analyzer created"
        );

        Ok(Self {
            config,
            bands,
            hz_per_bin,
            current_spectrum: Vec::new(),
            previous_spectrum: Vec::new(),
            bar_frames: Vec::new(),
            frames_analyzed: 0,
        })
    }

    /// Process one magnitude-spectrum frame.
    ///
    /// Must be called once per frame, in time order, never skipped. An empty
    /// spectrum is tolerated and yields zero flux for every band.
    pub fn analyze(&mut self, spectrum: &[f32], time: f32) {
        self.set_current_spectrum(spectrum);

        if self.config.bars > 0 {
            let bars = self.bar_averages(spectrum);
            self.bar_frames.push(SpectrumFrame { time, bars });
        }

        let window_size = self.config.window_size;
        for band_index in 0..self.bands.len() {
            let flux = self.rectified_flux(&self.bands[band_index]);
            let band = &mut self.bands[band_index];
            band.push_sample(time, flux);

            if band.samples().len() >= window_size {
                band.evaluate_pending(window_size);
            }
        }

        self.frames_analyzed += 1;
        trace!(frame = self.frames_analyzed, time, "analyzed spectrum frame");
    }

    /// Sum of positive magnitude increases over the bins strictly inside the
    /// band's boundaries. The spectrum before the first frame is all zeros.
    fn rectified_flux(&self, band: &FrequencyBand) -> f32 {
        let mut sum = 0.0f32;
        for (i, &magnitude) in self.current_spectrum.iter().enumerate() {
            let bin_hz = i as f32 * self.hz_per_bin;
            if band.lower_hz < bin_hz && bin_hz < band.upper_hz {
                let previous = self.previous_spectrum.get(i).copied().unwrap_or(0.0);
                sum += (magnitude - previous).max(0.0);
            }
        }
        sum
    }

    fn set_current_spectrum(&mut self, spectrum: &[f32]) {
        std::mem::swap(&mut self.previous_spectrum, &mut self.current_spectrum);
        self.current_spectrum.clear();
        self.current_spectrum.extend_from_slice(spectrum);
    }

    /// Mean magnitude of each equal-width group of bins, for display bars.
    fn bar_averages(&self, spectrum: &[f32]) -> Vec<f32> {
        let chunk = (spectrum.len() / self.config.bars).max(1);
        spectrum
            .chunks(chunk)
            .take(self.config.bars)
            .map(|bins| bins.iter().sum::<f32>() / bins.len() as f32)
            .collect()
    }

    /// The configured bands with their accumulated flux histories.
    pub fn bands(&self) -> &[FrequencyBand] {
        &self.bands
    }

    /// A single band by index.
    pub fn band(&self, index: usize) -> Option<&FrequencyBand> {
        self.bands.get(index)
    }

    /// Recorded bar frames (empty unless `bars > 0`).
    pub fn bar_frames(&self) -> &[SpectrumFrame] {
        &self.bar_frames
    }

    /// Number of frames analyzed so far. Equals every band's sample count.
    pub fn frames_analyzed(&self) -> usize {
        self.frames_analyzed
    }

    /// The analyzer configuration.
    pub fn config(&self) -> &AnalyzerConfig {
        &self.config
    }

    /// Discard all per-clip state so the analyzer can process a fresh clip.
    /// Band histories and cursors are fully reset, never partially reused.
    pub fn reset(&mut self) {
        for band in &mut self.bands {
            band.reset(self.config.window_size);
        }
        self.current_spectrum.clear();
        self.previous_spectrum.clear();
        self.bar_frames.clear();
        self.frames_analyzed = 0;
        debug!("spectrum analyzer reset");
    }
}
