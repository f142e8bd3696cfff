//! Time-domain response of the 2-DOF model
//!
//! The equations of motion `Mẍ + Dẋ + Kx = F(t)` are integrated in the
//! first-order state-space form `ż = (v, a)` with `z = (x₁, x₂, v₁, v₂)`.
//!
//! The integrator is the classic 4th order Runge-Kutta scheme with a fixed step.
//! Each interval of the requested time grid is split into equal sub-steps no
//! longer than a hundredth of the shortest period the system can exhibit.

use std::f64::consts::PI;

use nalgebra::{Matrix2, Matrix4, Vector2, Vector4};
use serde::Serialize;

use crate::structural::Structural;

/// Minimum number of integration steps per period of the fastest oscillation
pub const STEPS_PER_PERIOD: f64 = 100.;

#[derive(Debug, thiserror::Error)]
pub enum DynamicsError {
    #[error("invalid model: singular mass matrix {0:?}")]
    InvalidModel(Matrix2<f64>),
    #[error("invalid time grid: {0}")]
    InvalidTimeGrid(String),
    #[error("integration failed: non-finite state at t={time}s")]
    IntegrationFailure { time: f64 },
}
type Result<T> = std::result::Result<T, DynamicsError>;

/// Displacements and velocities of both degrees of freedom
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StateVector(pub Vector4<f64>);

impl StateVector {
    pub fn new(x1: f64, x2: f64, v1: f64, v2: f64) -> Self {
        Self(Vector4::new(x1, x2, v1, v2))
    }
    /// State at rest
    pub fn zeros() -> Self {
        Self(Vector4::zeros())
    }
    pub fn x1(&self) -> f64 {
        self.0[0]
    }
    pub fn x2(&self) -> f64 {
        self.0[1]
    }
    pub fn v1(&self) -> f64 {
        self.0[2]
    }
    pub fn v2(&self) -> f64 {
        self.0[3]
    }
    pub fn displacement(&self) -> Vector2<f64> {
        self.0.fixed_rows::<2>(0).into_owned()
    }
    pub fn velocity(&self) -> Vector2<f64> {
        self.0.fixed_rows::<2>(2).into_owned()
    }
}
impl From<[f64; 4]> for StateVector {
    fn from(value: [f64; 4]) -> Self {
        Self(Vector4::from(value))
    }
}

/// State sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sample {
    pub time: f64,
    pub state: StateVector,
}

/// State samples at the requested time points
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TimeSeries {
    pub samples: Vec<Sample>,
}
impl TimeSeries {
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
    pub fn times(&self) -> Vec<f64> {
        self.samples.iter().map(|s| s.time).collect()
    }
    /// Displacement time series of degree-of-freedom `dof`, `None` unless `dof` is 0 or 1
    pub fn displacement(&self, dof: usize) -> Option<Vec<f64>> {
        (dof < 2).then(|| self.samples.iter().map(|s| s.state.0[dof]).collect())
    }
    /// Velocity time series of degree-of-freedom `dof`, `None` unless `dof` is 0 or 1
    pub fn velocity(&self, dof: usize) -> Option<Vec<f64>> {
        (dof < 2).then(|| self.samples.iter().map(|s| s.state.0[2 + dof]).collect())
    }
    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }
}

/// Time grid constructors
pub struct TimeGrid;
impl TimeGrid {
    /// `n` evenly spaced time points from `start` to `end`, both included
    pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
        match n {
            0 => vec![],
            1 => vec![start],
            _ => {
                let step = (end - start) / (n - 1) as f64;
                (0..n).map(|i| start + step * i as f64).collect()
            }
        }
    }
}

fn check_time_grid(time: &[f64]) -> Result<()> {
    if time.len() < 2 {
        return Err(DynamicsError::InvalidTimeGrid(format!(
            "expected at least 2 time points, found {}",
            time.len()
        )));
    }
    if let Some(t) = time.iter().find(|t| !t.is_finite()) {
        return Err(DynamicsError::InvalidTimeGrid(format!(
            "non-finite time point {t}"
        )));
    }
    if let Some(i) = time.windows(2).position(|w| w[1] <= w[0]) {
        return Err(DynamicsError::InvalidTimeGrid(format!(
            "time points must be strictly increasing, found {} then {} at index {}",
            time[i],
            time[i + 1],
            i + 1
        )));
    }
    Ok(())
}

/// First-order ordinary differential equations with a 4 elements state
pub trait StateSpace {
    /// Returns the state derivative `ż = f(t, z)`
    fn derivative(&self, t: f64, z: &Vector4<f64>) -> Vector4<f64>;
    /// Upper bound of the angular frequencies [rad/s] present in the solution
    fn max_rate(&self) -> f64;
}

/// Undamped and unforced dynamics `ẍ = −M⁻¹Kx`
#[derive(Debug, Clone)]
pub struct FreeVibration {
    // state matrix
    a: Matrix4<f64>,
}
impl FreeVibration {
    pub fn new(m: &Matrix2<f64>, k: &Matrix2<f64>) -> Result<Self> {
        let m_inv = m.try_inverse().ok_or(DynamicsError::InvalidModel(*m))?;
        Ok(Self {
            a: state_matrix(&m_inv, k, &Matrix2::zeros()),
        })
    }
}
impl StateSpace for FreeVibration {
    fn derivative(&self, _t: f64, z: &Vector4<f64>) -> Vector4<f64> {
        self.a * z
    }
    fn max_rate(&self) -> f64 {
        infinity_norm(&self.a)
    }
}

/// Damped dynamics under the harmonic force `F(t) = F₀cos(ωt)`
///
/// `ẍ = M⁻¹(F(t) − Dẋ − Kx)`
#[derive(Debug, Clone)]
pub struct ForcedVibration {
    // state matrix
    a: Matrix4<f64>,
    // M⁻¹F₀
    b: Vector2<f64>,
    // forcing angular frequency
    omega: f64,
}
impl ForcedVibration {
    pub fn new(
        m: &Matrix2<f64>,
        d: &Matrix2<f64>,
        k: &Matrix2<f64>,
        f0: &Vector2<f64>,
        omega: f64,
    ) -> Result<Self> {
        let m_inv = m.try_inverse().ok_or(DynamicsError::InvalidModel(*m))?;
        Ok(Self {
            a: state_matrix(&m_inv, k, d),
            b: m_inv * f0,
            omega,
        })
    }
}
impl StateSpace for ForcedVibration {
    fn derivative(&self, t: f64, z: &Vector4<f64>) -> Vector4<f64> {
        let mut dz = self.a * z;
        let f = (self.omega * t).cos();
        dz[2] += self.b[0] * f;
        dz[3] += self.b[1] * f;
        dz
    }
    fn max_rate(&self) -> f64 {
        infinity_norm(&self.a).max(self.omega.abs())
    }
}

/// `[[0, I], [−M⁻¹K, −M⁻¹D]]`
fn state_matrix(m_inv: &Matrix2<f64>, k: &Matrix2<f64>, d: &Matrix2<f64>) -> Matrix4<f64> {
    let mut a = Matrix4::zeros();
    a.fixed_view_mut::<2, 2>(0, 2).copy_from(&Matrix2::identity());
    a.fixed_view_mut::<2, 2>(2, 0).copy_from(&-(m_inv * k));
    a.fixed_view_mut::<2, 2>(2, 2).copy_from(&-(m_inv * d));
    a
}

/// Maximum absolute row sum, an upper bound of the spectral radius
fn infinity_norm(a: &Matrix4<f64>) -> f64 {
    a.row_iter()
        .map(|r| r.iter().map(|x| x.abs()).sum::<f64>())
        .fold(0f64, f64::max)
}

/// Fixed-step 4th order Runge-Kutta integrator
#[derive(Debug, Clone, Copy)]
pub struct Rk4 {
    /// maximum step size [s]
    pub max_step: f64,
}
impl Rk4 {
    /// Integrator resolving [STEPS_PER_PERIOD] steps per period of the fastest rate of `system`
    pub fn for_system<S: StateSpace>(system: &S) -> Self {
        let rate = system.max_rate();
        let max_step = if rate > 0f64 {
            2. * PI / (STEPS_PER_PERIOD * rate)
        } else {
            f64::INFINITY
        };
        Self { max_step }
    }
    fn step<S: StateSpace>(system: &S, t: f64, z: &Vector4<f64>, h: f64) -> Vector4<f64> {
        let k1 = system.derivative(t, z);
        let k2 = system.derivative(t + 0.5 * h, &(z + k1 * (0.5 * h)));
        let k3 = system.derivative(t + 0.5 * h, &(z + k2 * (0.5 * h)));
        let k4 = system.derivative(t + h, &(z + k3 * h));
        z + (k1 + k2 * 2. + k3 * 2. + k4) * (h / 6.)
    }
    /// Integrates `system` from `z0` at `time[0]` and samples the state at each time point
    pub fn integrate<S: StateSpace>(
        &self,
        system: &S,
        z0: &StateVector,
        time: &[f64],
    ) -> Result<TimeSeries> {
        check_time_grid(time)?;
        let mut z = z0.0;
        let mut samples = Vec::with_capacity(time.len());
        samples.push(Sample {
            time: time[0],
            state: *z0,
        });
        let mut n_steps = 0usize;
        for w in time.windows(2) {
            let (t0, t1) = (w[0], w[1]);
            let n = ((t1 - t0) / self.max_step).ceil().max(1.) as usize;
            let h = (t1 - t0) / n as f64;
            for i in 0..n {
                z = Self::step(system, t0 + h * i as f64, &z, h);
            }
            n_steps += n;
            if !z.iter().all(|x| x.is_finite()) {
                return Err(DynamicsError::IntegrationFailure { time: t1 });
            }
            samples.push(Sample {
                time: t1,
                state: StateVector(z),
            });
        }
        log::debug!(
            "RK4: {} samples, {} steps (max. step: {:.3e}s)",
            samples.len(),
            n_steps,
            self.max_step
        );
        Ok(TimeSeries { samples })
    }
}

/// Free vibration response sampled at the time points in `time`
pub fn simulate_free(
    m: &Matrix2<f64>,
    k: &Matrix2<f64>,
    z0: &StateVector,
    time: &[f64],
) -> Result<TimeSeries> {
    let system = FreeVibration::new(m, k)?;
    Rk4::for_system(&system).integrate(&system, z0, time)
}

/// Damped response to the force `f0 cos(omega t)` sampled at the time points in `time`
pub fn simulate_forced(
    m: &Matrix2<f64>,
    d: &Matrix2<f64>,
    k: &Matrix2<f64>,
    f0: &Vector2<f64>,
    omega: f64,
    z0: &StateVector,
    time: &[f64],
) -> Result<TimeSeries> {
    let system = ForcedVibration::new(m, d, k, f0, omega)?;
    Rk4::for_system(&system).integrate(&system, z0, time)
}

impl Structural {
    /// Free vibration response of the model, ignoring damping
    pub fn simulate_free(&self, z0: &StateVector, time: &[f64]) -> Result<TimeSeries> {
        simulate_free(&self.m, &self.k, z0, time)
    }
    /// Forced vibration response of the model
    pub fn simulate_forced(
        &self,
        f0: &Vector2<f64>,
        omega: f64,
        z0: &StateVector,
        time: &[f64],
    ) -> Result<TimeSeries> {
        simulate_forced(
            &self.m,
            &self.damping_or_zero(),
            &self.k,
            f0,
            omega,
            z0,
            time,
        )
    }
}

#[cfg(test)]
mod tests {
    use approx::{assert_abs_diff_eq, assert_relative_eq};

    use super::*;
    use crate::structural::PhysicalParameters;

    fn default_model() -> Structural {
        Structural::from_parameters(PhysicalParameters::default()).unwrap()
    }

    #[test]
    fn linspace() {
        let t = TimeGrid::linspace(0., 10., 1000);
        assert_eq!(t.len(), 1000);
        assert_eq!(t[0], 0.);
        assert_relative_eq!(t[999], 10., epsilon = 1e-12);
        assert_eq!(TimeGrid::linspace(1., 2., 1), vec![1.]);
    }

    #[test]
    fn free_samples_requested_times() {
        let structural = default_model();
        let time = vec![0., 0.1, 0.25, 1.0, 3.7];
        let ts = structural
            .simulate_free(&StateVector::new(1., 0.5, 0., 0.), &time)
            .unwrap();
        assert_eq!(ts.times(), time);
        assert_eq!(ts.samples[0].state, StateVector::new(1., 0.5, 0., 0.));
    }

    #[test]
    fn free_energy_is_conserved() {
        let structural = default_model();
        let time = TimeGrid::linspace(0., 10., 1000);
        let ts = structural
            .simulate_free(&StateVector::new(1., 0.5, 0., 0.), &time)
            .unwrap();
        let e0 = structural.energy(&ts.samples[0].state);
        for sample in &ts.samples {
            assert_relative_eq!(structural.energy(&sample.state), e0, max_relative = 1e-6);
        }
    }

    #[test]
    fn free_single_mode_is_harmonic() {
        // equal masses and end springs: in-phase mode ω² = k1/m
        let structural = Structural::builder()
            .masses(1., 1.)
            .stiffnesses(4., 3., 4.)
            .build()
            .unwrap();
        let time = TimeGrid::linspace(0., 5., 501);
        let ts = structural
            .simulate_free(&StateVector::new(1., 1., 0., 0.), &time)
            .unwrap();
        for sample in &ts.samples {
            let x = (2. * sample.time).cos();
            assert_abs_diff_eq!(sample.state.x1(), x, epsilon = 1e-6);
            assert_abs_diff_eq!(sample.state.x2(), x, epsilon = 1e-6);
        }
    }

    #[test]
    fn unforced_matches_free() {
        let structural = default_model();
        let time = TimeGrid::linspace(0., 10., 1000);
        let z0 = StateVector::new(1., 0.5, 0., 0.);
        let free = structural.simulate_free(&z0, &time).unwrap();
        let forced = simulate_forced(
            structural.mass(),
            &Matrix2::zeros(),
            structural.stiffness(),
            &Vector2::zeros(),
            2.5,
            &z0,
            &time,
        )
        .unwrap();
        for (a, b) in free.samples.iter().zip(&forced.samples) {
            assert_eq!(a.time, b.time);
            assert_abs_diff_eq!(a.state.0, b.state.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn forced_response_settles_to_receptance() {
        let structural = default_model();
        let f0 = Vector2::new(1., 0.);
        let omega = 1.0;
        let time = TimeGrid::linspace(0., 200., 8001);
        let ts = structural
            .simulate_forced(&f0, omega, &StateVector::zeros(), &time)
            .unwrap();
        let tail = &ts.displacement(0).unwrap()[7000..];
        let peak = tail.iter().fold(0f64, |a, x| a.max(x.abs()));
        let expected = structural.steady_state_amplitude(&f0, omega).unwrap()[0];
        assert_relative_eq!(peak, expected, max_relative = 1e-2);
    }

    #[test]
    fn time_grid_too_short() {
        let structural = default_model();
        let err = structural
            .simulate_free(&StateVector::zeros(), &[0.])
            .unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidTimeGrid(_)));
    }

    #[test]
    fn time_grid_non_monotonic() {
        let structural = default_model();
        let err = structural
            .simulate_free(&StateVector::zeros(), &[0., 1., 0.5, 2.])
            .unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidTimeGrid(_)));
        let err = structural
            .simulate_free(&StateVector::zeros(), &[0., 1., 1.])
            .unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidTimeGrid(_)));
    }

    #[test]
    fn singular_mass() {
        let m = Matrix2::new(0., 0., 0., 1.);
        let k = Matrix2::new(10., -4., -4., 9.);
        let err = simulate_free(&m, &k, &StateVector::zeros(), &[0., 1.]).unwrap_err();
        assert!(matches!(err, DynamicsError::InvalidModel(_)));
    }

    #[test]
    fn non_finite_initial_state() {
        let structural = default_model();
        let time = TimeGrid::linspace(0., 1., 11);
        let err = structural
            .simulate_free(&StateVector::new(f64::NAN, 0., 0., 0.), &time)
            .unwrap_err();
        assert!(
            matches!(err, DynamicsError::IntegrationFailure { time } if time == 0.1),
            "{err}"
        );
    }

    #[test]
    fn dof_out_of_range() {
        let structural = default_model();
        let ts = structural
            .simulate_free(&StateVector::new(1., 0.5, 0.2, 0.1), &[0., 0.5, 1.])
            .unwrap();
        assert_eq!(ts.displacement(1).unwrap()[0], 0.5);
        assert_eq!(ts.velocity(1).unwrap()[0], 0.1);
        for dof in [2, 3, 4] {
            assert!(ts.displacement(dof).is_none());
            assert!(ts.velocity(dof).is_none());
        }
    }

    #[test]
    fn deterministic() {
        let structural = default_model();
        let time = TimeGrid::linspace(0., 3., 300);
        let f0 = Vector2::new(1., 0.);
        let z0 = StateVector::zeros();
        let a = structural.simulate_forced(&f0, 2., &z0, &time).unwrap();
        let b = structural.simulate_forced(&f0, 2., &z0, &time).unwrap();
        assert_eq!(a, b);
    }
}
