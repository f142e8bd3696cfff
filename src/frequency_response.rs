//! Frequency response functionalities
//!
//! Two estimates of the steady-state response to a harmonic force:
//!  - [FrequencyResponse]: the analytic transfer function evaluated on the imaginary axis,
//!  - [sweep_frequency_response]: the peak displacement measured at the end of
//!    a transient simulation, for each forcing frequency.

use indicatif::{ParallelProgressIterator, ProgressStyle};
use nalgebra::{Matrix2, Vector2};
use rayon::prelude::*;
use serde::Serialize;

use crate::{
    data::{Cartesian2Polar, FrequencyResponseData},
    dynamics::{self, DynamicsError, StateVector, TimeGrid},
    if64,
    structural::Structural,
};

#[derive(Debug, thiserror::Error)]
pub enum SweepError {
    #[error("forced response simulation failed")]
    Dynamics(#[from] DynamicsError),
    #[error("invalid sweep configuration: {0}")]
    InvalidConfig(String),
}
type Result<T> = std::result::Result<T, SweepError>;

/// Frequency sampling options
///
/// The frequencies units is rad/s
#[derive(Debug, Clone, clap::Subcommand)]
#[command(
    subcommand_help_heading = "Forcing frequencies [rad/s]",
    subcommand_value_name = "FORCING FREQUENCIES"
)]
pub enum Frequencies {
    /// a single frequency
    Single { value: f64 },
    /// logarithmic (log base 10) sampling of the interval `[lower,upper]` with `n` samples
    LogSpace {
        #[arg(short, long)]
        lower: f64,
        #[arg(short, long)]
        upper: f64,
        #[arg(short)]
        n: usize,
    },
    /// regular sampling of the interval `[lower,upper]` with `n` samples
    LinSpace {
        #[arg(short, long, default_value_t = 0.5)]
        lower: f64,
        #[arg(short, long, default_value_t = 5.0)]
        upper: f64,
        #[arg(short, default_value_t = 100)]
        n: usize,
    },
    /// a given set of frequencies
    Set {
        #[arg(short, long)]
        values: Vec<f64>,
    },
}
impl Default for Frequencies {
    fn default() -> Self {
        Self::linspace(0.5, 5.0, 100)
    }
}
impl From<f64> for Frequencies {
    fn from(value: f64) -> Self {
        Frequencies::Single { value }
    }
}
impl From<Vec<f64>> for Frequencies {
    fn from(values: Vec<f64>) -> Self {
        Frequencies::Set { values }
    }
}
impl From<&[f64]> for Frequencies {
    fn from(values: &[f64]) -> Self {
        Frequencies::Set {
            values: values.to_vec(),
        }
    }
}
impl From<&Self> for Frequencies {
    fn from(value: &Self) -> Self {
        value.clone()
    }
}
impl Frequencies {
    pub fn logspace(lower: f64, upper: f64, n: usize) -> Self {
        Self::LogSpace { lower, upper, n }
    }
    pub fn linspace(lower: f64, upper: f64, n: usize) -> Self {
        Self::LinSpace { lower, upper, n }
    }
    /// Returns the sampled frequencies
    pub fn values(&self) -> Vec<f64> {
        match self {
            Frequencies::Single { value } => vec![*value],
            Frequencies::LogSpace { lower, upper, n } => {
                TimeGrid::linspace(lower.log10(), upper.log10(), *n)
                    .into_iter()
                    .map(|log_w| 10f64.powf(log_w))
                    .collect()
            }
            Frequencies::LinSpace { lower, upper, n } => TimeGrid::linspace(*lower, *upper, *n),
            Frequencies::Set { values } => values.clone(),
        }
    }
    /// Returns the sampled frequencies, rejecting non-positive logarithmic bounds and non-finite values
    fn checked_values(&self) -> Result<Vec<f64>> {
        if let Frequencies::LogSpace { lower, upper, .. } = self {
            if !(*lower > 0f64 && *upper > 0f64) {
                return Err(SweepError::InvalidConfig(format!(
                    "logarithmic sampling bounds must be positive, found [{lower},{upper}]"
                )));
            }
        }
        let values = self.values();
        if let Some(w) = values.iter().find(|w| !w.is_finite()) {
            return Err(SweepError::InvalidConfig(format!(
                "forcing frequencies must be finite, found {w}"
            )));
        }
        Ok(values)
    }
}

/// Frequency response interface definition
pub trait FrequencyResponse {
    /// Transfer function type
    type Output;

    /// Returns the frequency response
    ///
    /// The argument is the imaginary frequency in radians
    fn j_omega(&self, jw: if64) -> Self::Output;
    /// Returns the frequencies and the frequency response
    ///
    /// The argument is frequencies in rad/s.
    /// The response is evaluated as is by [FrequencyResponse::j_omega], see the
    /// implementor for its value at a singular frequency
    fn frequency_response<T: Into<Frequencies>>(&self, w: T) -> Vec<FrequencyResponseData<Self::Output>>
    where
        <Self as FrequencyResponse>::Output: Cartesian2Polar + Send,
        <<Self as FrequencyResponse>::Output as Cartesian2Polar>::Output: Send,
        Self: Sync,
    {
        let frequencies: Frequencies = w.into();
        frequencies
            .values()
            .into_par_iter()
            .map(|w| FrequencyResponseData::new(w, self.j_omega(if64::new(0f64, w))))
            .collect()
    }
}

/// Steady-state amplitude estimation heuristic
///
/// The amplitude is the largest absolute displacement over the last `window`
/// samples of a simulation lasting `duration` seconds and sampled `n_sample` times.
/// The transient response must have died out by then.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SweepConfig {
    /// simulation duration [s]
    pub duration: f64,
    /// number of time samples
    pub n_sample: usize,
    /// number of trailing samples the amplitude is measured on
    pub window: usize,
    /// monitored degree-of-freedom (0 or 1)
    pub dof: usize,
    /// displays a progress bar
    pub progress: bool,
}
impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            duration: 30.,
            n_sample: 2000,
            window: 100,
            dof: 0,
            progress: false,
        }
    }
}
impl SweepConfig {
    fn check(&self) -> Result<()> {
        if !(self.duration.is_finite() && self.duration > 0f64) {
            return Err(SweepError::InvalidConfig(format!(
                "duration must be positive, found {}",
                self.duration
            )));
        }
        if self.n_sample < 2 {
            return Err(SweepError::InvalidConfig(format!(
                "expected at least 2 time samples, found {}",
                self.n_sample
            )));
        }
        if self.window == 0 || self.window > self.n_sample {
            return Err(SweepError::InvalidConfig(format!(
                "window must be in [1,{}], found {}",
                self.n_sample, self.window
            )));
        }
        if self.dof > 1 {
            return Err(SweepError::InvalidConfig(format!(
                "degree-of-freedom must be 0 or 1, found {}",
                self.dof
            )));
        }
        Ok(())
    }
}

/// Steady-state amplitude at a forcing frequency
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ResponsePoint {
    /// forcing frequency [rad/s]
    pub frequency: f64,
    pub amplitude: f64,
}

/// Steady-state amplitudes in the order of the forcing frequencies
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FrequencyResponseCurve {
    pub points: Vec<ResponsePoint>,
}
impl FrequencyResponseCurve {
    pub fn len(&self) -> usize {
        self.points.len()
    }
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
    pub fn frequencies(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.frequency).collect()
    }
    pub fn amplitudes(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.amplitude).collect()
    }
    /// Interior points larger than both neighbours
    pub fn local_maxima(&self) -> Vec<ResponsePoint> {
        self.points
            .windows(3)
            .filter(|w| w[1].amplitude > w[0].amplitude && w[1].amplitude > w[2].amplitude)
            .map(|w| w[1])
            .collect()
    }
}

/// Sweeps the forcing frequencies and measures the steady-state amplitude of each response
///
/// Each forced response starts at rest and is simulated independently, in parallel.
pub fn sweep_frequency_response<T: Into<Frequencies>>(
    m: &Matrix2<f64>,
    d: &Matrix2<f64>,
    k: &Matrix2<f64>,
    f0: &Vector2<f64>,
    frequencies: T,
    config: &SweepConfig,
) -> Result<FrequencyResponseCurve> {
    config.check()?;
    let frequencies: Frequencies = frequencies.into();
    let omegas = frequencies.checked_values()?;
    let time = TimeGrid::linspace(0f64, config.duration, config.n_sample);
    let z0 = StateVector::zeros();
    log::info!(
        "sweeping {} forcing frequencies ({}s, {} samples, window: {})",
        omegas.len(),
        config.duration,
        config.n_sample,
        config.window
    );

    let steady_state = |omega: f64| -> Result<ResponsePoint> {
        let series = dynamics::simulate_forced(m, d, k, f0, omega, &z0, &time)?;
        let amplitude = series.samples[series.len() - config.window..]
            .iter()
            .map(|s| s.state.0[config.dof].abs())
            .fold(0f64, f64::max);
        Ok(ResponsePoint {
            frequency: omega,
            amplitude,
        })
    };

    let points = if config.progress {
        let style = ProgressStyle::with_template("|{bar} {pos}/{len}|")
            .map_err(|e| SweepError::InvalidConfig(e.to_string()))?
            .progress_chars("-.-");
        omegas
            .into_par_iter()
            .progress_with_style(style)
            .map(steady_state)
            .collect::<Result<Vec<_>>>()?
    } else {
        omegas
            .into_par_iter()
            .map(steady_state)
            .collect::<Result<Vec<_>>>()?
    };
    log::info!("frequency sweep completed");
    Ok(FrequencyResponseCurve { points })
}

impl Structural {
    /// Frequency response curve of the model, see [sweep_frequency_response]
    pub fn sweep_frequency_response<T: Into<Frequencies>>(
        &self,
        f0: &Vector2<f64>,
        frequencies: T,
        config: &SweepConfig,
    ) -> Result<FrequencyResponseCurve> {
        sweep_frequency_response(
            &self.m,
            &self.damping_or_zero(),
            &self.k,
            f0,
            frequencies,
            config,
        )
    }
}
