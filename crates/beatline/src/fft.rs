//! Hann-windowed FFT magnitude frames over a PCM clip.
//!
//! This is the black-box transform stage in front of the analyzer: PCM in,
//! ordered magnitude-spectrum frames out. Frames step through the clip at a
//! fixed hop, each covering `fft_size` samples.

use num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// One magnitude-spectrum frame with its clip time.
#[derive(Debug, Clone)]
pub struct SpectrumFrame {
    /// Time of the frame's first sample in seconds
    pub time: f32,
    /// Magnitudes of the non-negative frequency bins (`fft_size / 2 + 1`)
    pub magnitudes: Vec<f32>,
}

/// Batch FFT processor with a precomputed Hann window.
pub struct FftProcessor {
    fft: Arc<dyn Fft<f32>>,
    fft_size: usize,
    hop_size: usize,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    scratch: Vec<Complex<f32>>,
}

impl FftProcessor {
    /// Plan a forward FFT of `fft_size` samples advancing by `hop_size`.
    pub fn new(fft_size: usize, hop_size: usize) -> Self {
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(fft_size);
        let scratch_len = fft.get_inplace_scratch_len();

        let window: Vec<f32> = (0..fft_size)
            .map(|i| {
                let t = i as f32 / (fft_size - 1) as f32;
                0.5 * (1.0 - (2.0 * std::f32::consts::PI * t).cos())
            })
            .collect();

        Self {
            fft,
            fft_size,
            hop_size: hop_size.max(1),
            window,
            buffer: vec![Complex::new(0.0, 0.0); fft_size],
            scratch: vec![Complex::new(0.0, 0.0); scratch_len],
        }
    }

    /// Transform a whole clip into ordered magnitude frames.
    ///
    /// The tail shorter than one FFT window is dropped; a clip shorter than
    /// `fft_size` yields no frames.
    pub fn magnitude_frames(&mut self, samples: &[f32], sample_rate: u32) -> Vec<SpectrumFrame> {
        let mut frames = Vec::new();
        if samples.len() < self.fft_size {
            return frames;
        }

        let half = self.fft_size / 2 + 1;
        let norm_factor = 1.0 / (self.fft_size as f32).sqrt();

        let mut start = 0usize;
        while start + self.fft_size <= samples.len() {
            for (i, &sample) in samples[start..start + self.fft_size].iter().enumerate() {
                let clean = if sample.is_finite() { sample } else { 0.0 };
                self.buffer[i] = Complex::new(clean * self.window[i], 0.0);
            }

            self.fft
                .process_with_scratch(&mut self.buffer, &mut self.scratch);

            let magnitudes: Vec<f32> = self.buffer[..half]
                .iter()
                .map(|bin| bin.norm() * norm_factor)
                .collect();

            frames.push(SpectrumFrame {
                time: start as f32 / sample_rate as f32,
                magnitudes,
            });

            start += self.hop_size;
        }

        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: u32, count: usize) -> Vec<f32> {
        (0..count)
            .map(|i| (2.0 * std::f32::consts::PI * freq * i as f32 / sample_rate as f32).sin())
            .collect()
    }

    #[test]
    fn frame_count_follows_hop_size() {
        let mut processor = FftProcessor::new(1024, 512);
        let frames = processor.magnitude_frames(&sine(440.0, 44100, 4096), 44100);
        // Starts at 0, 512, ..., 3072.
        assert_eq!(frames.len(), 7);
        assert_eq!(frames[0].magnitudes.len(), 513);
        assert!((frames[1].time - 512.0 / 44100.0).abs() < 1e-6);
    }

    #[test]
    fn short_clip_yields_no_frames() {
        let mut processor = FftProcessor::new(1024, 512);
        assert!(processor.magnitude_frames(&[0.0; 100], 44100).is_empty());
    }

    #[test]
    fn sine_energy_lands_in_the_right_bin() {
        let sample_rate = 8192;
        let mut processor = FftProcessor::new(1024, 1024);
        // 440 Hz at 8192 Hz with fft 1024: bin width 8 Hz, peak near bin 55.
        let frames = processor.magnitude_frames(&sine(440.0, sample_rate, 2048), sample_rate);
        assert!(!frames.is_empty());

        let magnitudes = &frames[0].magnitudes;
        let peak_bin = magnitudes
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i)
            .unwrap();
        assert!((54..=56).contains(&peak_bin), "peak at bin {peak_bin}");
    }

    #[test]
    fn non_finite_samples_are_sanitized() {
        let mut processor = FftProcessor::new(64, 64);
        let mut samples = vec![0.5f32; 128];
        samples[10] = f32::NAN;
        samples[20] = f32::INFINITY;

        let frames = processor.magnitude_frames(&samples, 8000);
        for frame in frames {
            assert!(frame.magnitudes.iter().all(|m| m.is_finite()));
        }
    }
}
