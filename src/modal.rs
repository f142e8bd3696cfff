//! Modal analysis: natural frequencies and mode shapes
//!
//! Solves the generalized eigenvalue problem `Kφ = λMφ` as the standard
//! eigenvalue problem of the non-symmetric matrix `A = M⁻¹K`, with `λ = ω²`.

use std::{f64::consts, fmt::Display};

use nalgebra::{Matrix2, Vector2};
use serde::Serialize;

use crate::structural::Structural;

/// Mode shapes with a first component larger than this are scaled to make it 1
pub const NORMALIZATION_TOLERANCE: f64 = 1e-8;
/// Relative gap under which two eigenvalues are the same
pub const REPEATED_EIGENVALUE_TOLERANCE: f64 = 1e-12;

#[derive(Debug, thiserror::Error)]
pub enum ModalError {
    #[error("invalid model: singular mass matrix {0:?}")]
    InvalidModel(Matrix2<f64>),
    #[error("non-physical model: mode #{mode} has a negative eigenvalue ({eigenvalue})")]
    NonPhysicalModel { mode: usize, eigenvalue: f64 },
    #[error("non-physical model: complex eigenvalues {re}±{im}i")]
    ComplexEigenvalues { re: f64, im: f64 },
}
type Result<T> = std::result::Result<T, ModalError>;

/// Natural frequency and mode shape
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Mode {
    /// eigenvalue `λ = ω²`
    pub eigenvalue: f64,
    /// natural frequency [rad/s]
    pub natural_frequency: f64,
    pub shape: Vector2<f64>,
}

/// Modes sorted by ascending eigenvalue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModalResult {
    pub modes: Vec<Mode>,
}

impl ModalResult {
    /// Natural frequencies [rad/s]
    pub fn natural_frequencies(&self) -> Vec<f64> {
        self.modes.iter().map(|m| m.natural_frequency).collect()
    }
    /// Natural frequencies [Hz]
    pub fn frequencies_hz(&self) -> Vec<f64> {
        self.modes
            .iter()
            .map(|m| m.natural_frequency * 0.5 * consts::FRAC_1_PI)
            .collect()
    }
    /// Modal damping ratios `ζ = α/(2ω) + βω/2` of Rayleigh damping
    pub fn damping_ratios(&self, alpha: f64, beta: f64) -> Vec<f64> {
        self.modes
            .iter()
            .map(|m| 0.5 * (alpha / m.natural_frequency + beta * m.natural_frequency))
            .collect()
    }
    pub fn len(&self) -> usize {
        self.modes.len()
    }
    pub fn is_empty(&self) -> bool {
        self.modes.is_empty()
    }
}

impl Display for ModalResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Modes:")?;
        for (i, mode) in self.modes.iter().enumerate() {
            writeln!(
                f,
                " #{}: ω={:.4}rad/s ({:.4}Hz), φ=[{:.4}, {:.4}]",
                i + 1,
                mode.natural_frequency,
                mode.natural_frequency * 0.5 * consts::FRAC_1_PI,
                mode.shape[0],
                mode.shape[1]
            )?;
        }
        Ok(())
    }
}

/// Eigenvector of `a` for the real eigenvalue `lambda`
///
/// The right singular vector of `A − λI` with the smallest singular value
fn eigenvector(a: &Matrix2<f64>, lambda: f64) -> Vector2<f64> {
    let svd = (a - Matrix2::identity() * lambda).svd(false, true);
    let i = svd.singular_values.imin();
    svd.v_t
        .map(|v_t| v_t.row(i).transpose())
        .unwrap_or_else(Vector2::zeros)
}

/// Eigenvectors of `a` for the sorted real eigenvalues
///
/// A repeated eigenvalue of the diagonalizable `M⁻¹K` means `A − λI = 0`:
/// both right singular vectors are kept as an orthonormal basis of the eigenspace
fn eigenvectors(a: &Matrix2<f64>, eigenvalues: &[f64]) -> Vec<Vector2<f64>> {
    let scale = eigenvalues.iter().fold(1f64, |s, l| s.max(l.abs()));
    match eigenvalues {
        [l1, l2] if (l1 - l2).abs() <= REPEATED_EIGENVALUE_TOLERANCE * scale => {
            log::debug!("repeated eigenvalue {l1}");
            (a - Matrix2::identity() * *l1)
                .svd(false, true)
                .v_t
                .map(|v_t| v_t.row_iter().map(|r| r.transpose()).collect())
                .unwrap_or_else(|| vec![Vector2::x(), Vector2::y()])
        }
        _ => eigenvalues.iter().map(|l| eigenvector(a, *l)).collect(),
    }
}

/// Natural frequencies and mode shapes of the mass and stiffness matrices
pub fn analyze_modes(m: &Matrix2<f64>, k: &Matrix2<f64>) -> Result<ModalResult> {
    let m_inv = m.try_inverse().ok_or(ModalError::InvalidModel(*m))?;
    let a = m_inv * k;

    let eigenvalues = a.complex_eigenvalues();
    if let Some(lambda) = eigenvalues.iter().find(|l| l.im != 0f64) {
        return Err(ModalError::ComplexEigenvalues {
            re: lambda.re,
            im: lambda.im.abs(),
        });
    }
    let mut eigenvalues: Vec<f64> = eigenvalues.iter().map(|l| l.re).collect();
    // stable: equal eigenvalues keep the solver order
    eigenvalues.sort_by(f64::total_cmp);
    log::debug!("eigenvalues of M⁻¹K: {eigenvalues:?}");

    if let Some((i, &eigenvalue)) = eigenvalues.iter().enumerate().find(|(_, l)| **l < 0f64) {
        return Err(ModalError::NonPhysicalModel {
            mode: i + 1,
            eigenvalue,
        });
    }
    let shapes = eigenvectors(&a, &eigenvalues);

    let modes = eigenvalues
        .into_iter()
        .zip(shapes)
        .map(|(eigenvalue, mut shape)| {
            if shape[0].abs() > NORMALIZATION_TOLERANCE {
                shape /= shape[0];
            }
            Mode {
                eigenvalue,
                natural_frequency: eigenvalue.sqrt(),
                shape,
            }
        })
        .collect();
    Ok(ModalResult { modes })
}

impl Structural {
    /// Natural frequencies and mode shapes of the model
    pub fn modes(&self) -> Result<ModalResult> {
        analyze_modes(&self.m, &self.k)
    }
}
