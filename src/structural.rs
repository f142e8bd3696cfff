//! Two degree-of-freedom structural dynamic model
//!
//! Two masses `m1`, `m2` in a chain of three springs
//!
//! ```text
//! |--k1--[m1]--k2--[m2]--k3--|
//! ```
//!
//! with optional Rayleigh damping `D = αM + βK`.

use std::fmt::Display;

use nalgebra::{Matrix2, Vector2};
use num_complex::Complex;
use serde::{Deserialize, Serialize};

use crate::{dynamics::StateVector, frequency_response::FrequencyResponse, if64};

#[derive(Debug, thiserror::Error)]
pub enum StructuralError {
    #[error("invalid model: {0}")]
    InvalidModel(String),
    #[error("singular dynamic stiffness at {0}rad/s (undamped resonance)")]
    Resonance(f64),
}
type Result<T> = std::result::Result<T, StructuralError>;

/// Scalar physical parameters of the mass-spring chain
#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct PhysicalParameters {
    pub m1: f64,
    pub m2: f64,
    pub k1: f64,
    pub k2: f64,
    pub k3: f64,
    /// mass proportional damping coefficient
    pub alpha: f64,
    /// stiffness proportional damping coefficient
    pub beta: f64,
}
impl Default for PhysicalParameters {
    fn default() -> Self {
        Self {
            m1: 2.0,
            m2: 1.0,
            k1: 6.0,
            k2: 4.0,
            k3: 5.0,
            alpha: 0.05,
            beta: 0.01,
        }
    }
}
impl PhysicalParameters {
    fn check(&self) -> Result<()> {
        let named = [
            ("m1", self.m1),
            ("m2", self.m2),
            ("k1", self.k1),
            ("k2", self.k2),
            ("k3", self.k3),
            ("alpha", self.alpha),
            ("beta", self.beta),
        ];
        if let Some((name, value)) = named.iter().find(|(_, v)| !v.is_finite()) {
            return Err(StructuralError::InvalidModel(format!(
                "{name} must be finite, found {value}"
            )));
        }
        if let Some((name, value)) = named[..2].iter().find(|(_, v)| *v <= 0f64) {
            return Err(StructuralError::InvalidModel(format!(
                "mass {name} must be positive, found {value}"
            )));
        }
        Ok(())
    }
}

/// Two degree-of-freedom structural dynamic model
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Structural {
    // physical parameters the matrices are built from
    pub(crate) params: PhysicalParameters,
    // mass matrix
    pub(crate) m: Matrix2<f64>,
    // stiffness matrix
    pub(crate) k: Matrix2<f64>,
    // Rayleigh damping matrix
    pub(crate) d: Option<Matrix2<f64>>,
}

/// Two degree-of-freedom structural dynamic model builder
#[derive(Debug, Default)]
pub struct StructuralBuilder {
    params: PhysicalParameters,
    damped: bool,
}
impl StructuralBuilder {
    /// Sets the masses
    pub fn masses(mut self, m1: f64, m2: f64) -> Self {
        self.params.m1 = m1;
        self.params.m2 = m2;
        self
    }
    /// Sets the spring constants, from the left wall to the right wall
    pub fn stiffnesses(mut self, k1: f64, k2: f64, k3: f64) -> Self {
        self.params.k1 = k1;
        self.params.k2 = k2;
        self.params.k3 = k3;
        self
    }
    /// Enables Rayleigh damping `D = αM + βK`
    pub fn rayleigh_damping(mut self, alpha: f64, beta: f64) -> Self {
        self.params.alpha = alpha;
        self.params.beta = beta;
        self.damped = true;
        self
    }
    /// Builds the [Structural] model
    pub fn build(self) -> Result<Structural> {
        self.params.check()?;
        let PhysicalParameters {
            m1,
            m2,
            k1,
            k2,
            k3,
            alpha,
            beta,
        } = self.params;
        let m = Matrix2::new(m1, 0f64, 0f64, m2);
        let k = Matrix2::new(k1 + k2, -k2, -k2, k2 + k3);
        let d = self.damped.then(|| m * alpha + k * beta);
        log::debug!("built 2-DOF model: M={m:?}, K={k:?}, D={d:?}");
        Ok(Structural {
            params: self.params,
            m,
            k,
            d,
        })
    }
}

impl Structural {
    /// Creates a [Structural] builder
    ///
    /// The builder starts from the default parameters, undamped
    pub fn builder() -> StructuralBuilder {
        StructuralBuilder::default()
    }
    /// Builds the model from physical parameters
    ///
    /// The damping matrix is set if either damping coefficient is non-zero
    pub fn from_parameters(params: PhysicalParameters) -> Result<Self> {
        let builder = Self::builder()
            .masses(params.m1, params.m2)
            .stiffnesses(params.k1, params.k2, params.k3);
        if params.alpha != 0f64 || params.beta != 0f64 {
            builder.rayleigh_damping(params.alpha, params.beta)
        } else {
            builder
        }
        .build()
    }
    pub fn parameters(&self) -> &PhysicalParameters {
        &self.params
    }
    /// Mass matrix
    pub fn mass(&self) -> &Matrix2<f64> {
        &self.m
    }
    /// Stiffness matrix
    pub fn stiffness(&self) -> &Matrix2<f64> {
        &self.k
    }
    /// Damping matrix, if the model is damped
    pub fn damping(&self) -> Option<&Matrix2<f64>> {
        self.d.as_ref()
    }
    /// Damping matrix, zero if the model is undamped
    pub fn damping_or_zero(&self) -> Matrix2<f64> {
        self.d.unwrap_or_else(Matrix2::zeros)
    }
    /// Mechanical energy `½vᵀMv + ½xᵀKx`
    pub fn energy(&self, state: &StateVector) -> f64 {
        let x = state.displacement();
        let v = state.velocity();
        0.5 * (v.dot(&(self.m * v)) + x.dot(&(self.k * x)))
    }
    /// Receptance `(K + jωD − ω²M)⁻¹` at `omega` [rad/s], `None` where the dynamic stiffness is singular
    pub fn receptance(&self, omega: f64) -> Option<Matrix2<if64>> {
        let jw = if64::new(0f64, omega);
        let c = |mat: &Matrix2<f64>| mat.map(|x| Complex::new(x, 0f64));
        (c(&self.k) + c(&self.damping_or_zero()) * jw + c(&self.m) * jw * jw).try_inverse()
    }
    /// Steady-state displacement amplitudes for the harmonic force `f0 cos(ωt)`
    pub fn steady_state_amplitude(&self, f0: &Vector2<f64>, omega: f64) -> Result<Vector2<f64>> {
        let h = self
            .receptance(omega)
            .ok_or(StructuralError::Resonance(omega))?;
        Ok((h * f0.map(|x| Complex::new(x, 0f64))).map(|x| x.norm()))
    }
}

/// Steady-state amplitude of a damped single degree-of-freedom oscillator
///
/// `X = F / sqrt((k − mω²)² + (cω)²)`
pub fn single_dof_steady_state_amplitude(f: f64, k: f64, m: f64, c: f64, omega: f64) -> f64 {
    f / ((k - m * omega * omega).powi(2) + (c * omega).powi(2)).sqrt()
}

impl Display for Structural {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let PhysicalParameters {
            m1,
            m2,
            k1,
            k2,
            k3,
            alpha,
            beta,
        } = self.params;
        writeln!(f, "2-DOF mass-spring chain:")?;
        writeln!(f, " + masses: ({m1}, {m2})")?;
        writeln!(f, " + stiffnesses: ({k1}, {k2}, {k3})")?;
        if self.d.is_some() {
            writeln!(f, " + Rayleigh damping: α={alpha}, β={beta}")?;
        } else {
            writeln!(f, " + undamped")?;
        }
        Ok(())
    }
}

impl FrequencyResponse for Structural {
    type Output = Matrix2<if64>;

    /// Receptance `(K + jωD + (jω)²M)⁻¹`
    ///
    /// At an undamped resonance the dynamic stiffness is singular: every entry is
    /// then `+∞`, use [Structural::receptance] to detect it
    fn j_omega(&self, jw: if64) -> Self::Output {
        self.receptance(jw.im)
            .unwrap_or_else(|| Matrix2::from_element(if64::new(f64::INFINITY, 0f64)))
    }
}
