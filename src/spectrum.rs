//! Single-sided amplitude spectrum of a displacement time series

use rustfft::{FftPlanner, num_complex::Complex};
use serde::Serialize;

use crate::dynamics::TimeSeries;

/// Relative tolerance on the sampling interval of a uniform time grid
pub const UNIFORM_SAMPLING_TOLERANCE: f64 = 1e-6;

#[derive(Debug, thiserror::Error)]
pub enum SpectrumError {
    #[error("non-uniform samples: step #{index} is {step}s, expected {expected}s")]
    NonUniformSamples {
        index: usize,
        step: f64,
        expected: f64,
    },
    #[error("sampling interval must be positive and finite, found {0}")]
    InvalidSampleInterval(f64),
    #[error("expected at least 2 samples, found {0}")]
    TooFewSamples(usize),
    #[error("degree-of-freedom must be 0 or 1, found {0}")]
    InvalidDof(usize),
}
type Result<T> = std::result::Result<T, SpectrumError>;

/// Spectrum bin
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bin {
    /// frequency [Hz]
    pub frequency: f64,
    pub magnitude: f64,
}

/// Non-negative frequency bins of the discrete Fourier transform
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Spectrum {
    pub bins: Vec<Bin>,
}

impl Spectrum {
    /// Spectrum of the displacement of degree-of-freedom `dof`
    ///
    /// The time points of `series` must be evenly spaced
    pub fn from_time_series(series: &TimeSeries, dof: usize) -> Result<Self> {
        let displacement = series
            .displacement(dof)
            .ok_or(SpectrumError::InvalidDof(dof))?;
        let time = series.times();
        if time.len() < 2 {
            return Err(SpectrumError::TooFewSamples(time.len()));
        }
        let expected = (time[time.len() - 1] - time[0]) / (time.len() - 1) as f64;
        if let Some((index, step)) = time
            .windows(2)
            .map(|w| w[1] - w[0])
            .enumerate()
            .find(|(_, step)| {
                (step - expected).abs() > UNIFORM_SAMPLING_TOLERANCE * expected.abs()
            })
        {
            return Err(SpectrumError::NonUniformSamples {
                index,
                step,
                expected,
            });
        }
        spectrum(&displacement, expected)
    }
    pub fn len(&self) -> usize {
        self.bins.len()
    }
    pub fn is_empty(&self) -> bool {
        self.bins.is_empty()
    }
    pub fn frequencies(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.frequency).collect()
    }
    pub fn magnitudes(&self) -> Vec<f64> {
        self.bins.iter().map(|b| b.magnitude).collect()
    }
    /// Largest bin, the DC bin excluded
    pub fn peak(&self) -> Option<Bin> {
        self.bins
            .iter()
            .skip(1)
            .copied()
            .max_by(|a, b| a.magnitude.total_cmp(&b.magnitude))
    }
}

/// Single-sided amplitude spectrum of `samples` taken every `sample_interval` seconds
///
/// The bins are the non-negative frequencies `k/(NΔt)`, `k = 0..(N+1)/2`.
/// Magnitudes are scaled by `2/N`, except the DC bin which is scaled by `1/N`,
/// so that a sinusoid of amplitude `A` shows a peak of height `A`.
///
/// The samples must be evenly spaced, this is not checked here (see [Spectrum::from_time_series]).
pub fn spectrum(samples: &[f64], sample_interval: f64) -> Result<Spectrum> {
    if !(sample_interval.is_finite() && sample_interval > 0f64) {
        return Err(SpectrumError::InvalidSampleInterval(sample_interval));
    }
    let n = samples.len();
    if n < 2 {
        return Err(SpectrumError::TooFewSamples(n));
    }
    let mut buffer: Vec<Complex<f64>> = samples.iter().map(|&x| Complex::new(x, 0f64)).collect();
    let mut planner = FftPlanner::<f64>::new();
    planner.plan_fft_forward(n).process(&mut buffer);

    let df = 1f64 / (n as f64 * sample_interval);
    let bins: Vec<_> = buffer
        .iter()
        .take(n.div_ceil(2))
        .enumerate()
        .map(|(k, x)| Bin {
            frequency: k as f64 * df,
            magnitude: if k == 0 { 1f64 } else { 2f64 } * x.norm() / n as f64,
        })
        .collect();
    log::debug!("spectrum: {} samples, {} bins, Δf={df:.3e}Hz", n, bins.len());
    Ok(Spectrum { bins })
}
