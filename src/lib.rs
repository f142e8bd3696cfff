//! Vibration analysis of a two degree-of-freedom mass-spring chain
//!
//! ```text
//! |--k1--[m1]--k2--[m2]--k3--|
//! ```
//!
//! - [structural]: mass, stiffness and Rayleigh damping matrices,
//! - [modal]: natural frequencies and mode shapes,
//! - [dynamics]: free and harmonically forced time responses,
//! - [spectrum]: amplitude spectrum of a displacement time series,
//! - [frequency_response]: steady-state amplitude versus forcing frequency.

use num_complex::Complex;

pub mod cli;
pub mod data;
pub mod dynamics;
pub mod frequency_response;
pub mod modal;
pub mod spectrum;
pub mod structural;

#[allow(non_camel_case_types)]
pub type if64 = Complex<f64>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Structural(#[from] structural::StructuralError),
    #[error(transparent)]
    Modal(#[from] modal::ModalError),
    #[error(transparent)]
    Dynamics(#[from] dynamics::DynamicsError),
    #[error(transparent)]
    Spectrum(#[from] spectrum::SpectrumError),
    #[error(transparent)]
    Sweep(#[from] frequency_response::SweepError),
    #[error(transparent)]
    Data(#[from] data::DataError),
}
pub type Result<T> = std::result::Result<T, Error>;

pub use dynamics::{StateVector, TimeGrid, TimeSeries, simulate_forced, simulate_free};
pub use frequency_response::{
    FrequencyResponse, FrequencyResponseCurve, Frequencies, SweepConfig, sweep_frequency_response,
};
pub use modal::{ModalResult, analyze_modes};
pub use spectrum::{Spectrum, spectrum};
pub use structural::{PhysicalParameters, Structural};

/// Builds the mass, stiffness and, if either damping coefficient is non-zero, damping matrices
pub fn build_model(params: PhysicalParameters) -> Result<Structural> {
    Ok(Structural::from_parameters(params)?)
}
