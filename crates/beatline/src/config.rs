//! Generation configuration file (RON).

use anyhow::{Context, Result};
use beatline_core::{FrequencyBand, LevelConfig, LevelFeature};
use serde::Deserialize;
use std::path::Path;

/// Settings for the FFT and threshold stages.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AnalysisSettings {
    /// FFT size in samples (power of 2)
    pub fft_size: usize,
    /// Samples between successive frames
    pub hop_size: usize,
    /// Adaptive threshold window size in frames
    pub window_size: usize,
    /// Number of display bars recorded per frame (0 disables)
    pub bars: usize,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            fft_size: 1024,
            hop_size: 1024,
            window_size: 50,
            bars: 0,
        }
    }
}

/// Everything a generation run needs besides the song itself.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerationConfig {
    /// Level options (spacing, physics constants, cosmetics)
    pub level: LevelConfig,
    /// FFT / threshold settings
    #[serde(default)]
    pub analysis: AnalysisSettings,
    /// Frequency bands to detect onsets in
    pub bands: Vec<FrequencyBand>,
    /// Features to place, bound to bands by index
    pub features: Vec<LevelFeature>,
}

impl GenerationConfig {
    /// Load a configuration from a RON file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Self = ron::from_str(&content)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        config
            .validate()
            .with_context(|| format!("invalid config file {}", path.display()))?;
        Ok(config)
    }

    /// Reject settings the FFT stage cannot run on. The analyzer validates
    /// its own inputs again, but the FFT frames are produced before the
    /// analyzer exists, so the checks have to happen here.
    fn validate(&self) -> Result<()> {
        anyhow::ensure!(
            self.analysis.fft_size >= 2,
            "fftSize must be at least 2, got {}",
            self.analysis.fft_size
        );
        anyhow::ensure!(
            self.analysis.hop_size >= 1,
            "hopSize must be at least 1, got {}",
            self.analysis.hop_size
        );
        Ok(())
    }
}
