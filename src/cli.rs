//! Command line interface

use clap::{Args, Parser, Subcommand};
use nalgebra::Vector2;

use crate::{
    dynamics::{StateVector, TimeGrid},
    frequency_response::{Frequencies, SweepConfig},
    structural::PhysicalParameters,
};

/// Physical parameters of the mass-spring chain
#[derive(Debug, Clone, Args)]
pub struct ModelArgs {
    /// mass #1
    #[arg(long, default_value_t = 2.0)]
    pub m1: f64,
    /// mass #2
    #[arg(long, default_value_t = 1.0)]
    pub m2: f64,
    /// stiffness of the spring between the left wall and mass #1
    #[arg(long, default_value_t = 6.0)]
    pub k1: f64,
    /// stiffness of the spring between the masses
    #[arg(long, default_value_t = 4.0)]
    pub k2: f64,
    /// stiffness of the spring between mass #2 and the right wall
    #[arg(long, default_value_t = 5.0)]
    pub k3: f64,
    /// mass proportional Rayleigh damping coefficient
    #[arg(long, default_value_t = 0.05)]
    pub alpha: f64,
    /// stiffness proportional Rayleigh damping coefficient
    #[arg(long, default_value_t = 0.01)]
    pub beta: f64,
}
impl From<&ModelArgs> for PhysicalParameters {
    fn from(args: &ModelArgs) -> Self {
        Self {
            m1: args.m1,
            m2: args.m2,
            k1: args.k1,
            k2: args.k2,
            k3: args.k3,
            alpha: args.alpha,
            beta: args.beta,
        }
    }
}

/// Harmonic force amplitudes
#[derive(Debug, Clone, Args)]
pub struct ForceArgs {
    /// force amplitude on mass #1
    #[arg(long, default_value_t = 1.0)]
    pub f1: f64,
    /// force amplitude on mass #2
    #[arg(long, default_value_t = 0.0)]
    pub f2: f64,
}
impl ForceArgs {
    pub fn amplitudes(&self) -> Vector2<f64> {
        Vector2::new(self.f1, self.f2)
    }
}

/// Initial conditions and time sampling
#[derive(Debug, Clone, Args)]
pub struct TimeArgs {
    /// initial displacement of mass #1
    #[arg(long, default_value_t = 1.0)]
    pub x1: f64,
    /// initial displacement of mass #2
    #[arg(long, default_value_t = 0.5)]
    pub x2: f64,
    /// initial velocity of mass #1
    #[arg(long, default_value_t = 0.0)]
    pub v1: f64,
    /// initial velocity of mass #2
    #[arg(long, default_value_t = 0.0)]
    pub v2: f64,
    /// simulation duration [s]
    #[arg(short, long, default_value_t = 10.0)]
    pub duration: f64,
    /// number of time samples
    #[arg(short, long, default_value_t = 1000)]
    pub n_sample: usize,
}
impl TimeArgs {
    pub fn initial_state(&self) -> StateVector {
        StateVector::new(self.x1, self.x2, self.v1, self.v2)
    }
    pub fn time(&self) -> Vec<f64> {
        TimeGrid::linspace(0f64, self.duration, self.n_sample)
    }
}

/// Analyses
#[derive(Debug, Clone, Subcommand)]
pub enum Analysis {
    /// natural frequencies and mode shapes
    Modes,
    /// undamped free vibration and its spectrum
    Free {
        #[command(flatten)]
        time: TimeArgs,
    },
    /// damped vibration under a harmonic force
    Forced {
        #[command(flatten)]
        force: ForceArgs,
        /// forcing angular frequency [rad/s]
        #[arg(short, long, default_value_t = 2.0)]
        omega: f64,
        #[command(flatten)]
        time: TimeArgs,
    },
    /// steady-state amplitude versus forcing frequency from transient simulations
    Sweep {
        #[command(flatten)]
        force: ForceArgs,
        /// simulation duration [s]
        #[arg(short, long, default_value_t = 30.0)]
        duration: f64,
        /// number of time samples
        #[arg(short, long, default_value_t = 2000)]
        n_sample: usize,
        /// number of trailing samples the steady-state amplitude is measured on
        #[arg(short, long, default_value_t = 100)]
        window: usize,
        /// monitored degree-of-freedom (0 or 1)
        #[arg(long, default_value_t = 0)]
        dof: usize,
        /// forcing frequencies, 100 samples in [0.5,5]rad/s if not set
        #[command(subcommand)]
        frequencies: Option<Frequencies>,
    },
    /// analytic steady-state frequency response (receptance)
    Receptance {
        /// forcing frequencies, 100 samples in [0.5,5]rad/s if not set
        #[command(subcommand)]
        frequencies: Option<Frequencies>,
    },
}

/// Command line interface
#[derive(Debug, Parser)]
#[command(version, about)]
pub struct Cli {
    #[command(flatten)]
    pub model: ModelArgs,
    /// data file, a Python pickle (.pkl) file
    #[arg(short, long, default_value_t = String::from("two_dof_vibration.pkl"))]
    pub filename: String,
    #[command(subcommand)]
    pub analysis: Analysis,
}

impl Cli {
    /// Returns the physical parameters of the model
    pub fn parameters(&self) -> PhysicalParameters {
        (&self.model).into()
    }
}

impl Analysis {
    /// Returns the frequency sweep configuration
    pub fn sweep_config(&self) -> Option<SweepConfig> {
        match self {
            Analysis::Sweep {
                duration,
                n_sample,
                window,
                dof,
                ..
            } => Some(SweepConfig {
                duration: *duration,
                n_sample: *n_sample,
                window: *window,
                dof: *dof,
                progress: true,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn defaults() {
        let cli = Cli::parse_from(["two-dof-vibration", "modes"]);
        assert_eq!(cli.parameters(), PhysicalParameters::default());
        assert_eq!(cli.filename, "two_dof_vibration.pkl");
    }

    #[test]
    fn sweep_defaults() {
        let cli = Cli::parse_from(["two-dof-vibration", "--m1", "3", "sweep"]);
        assert_eq!(cli.parameters().m1, 3.);
        let config = cli.analysis.sweep_config().unwrap();
        assert_eq!(
            config,
            SweepConfig {
                progress: true,
                ..Default::default()
            }
        );
        assert!(matches!(
            cli.analysis,
            Analysis::Sweep {
                frequencies: None,
                ..
            }
        ));
    }

    #[test]
    fn sweep_log_space() {
        let cli = Cli::parse_from([
            "two-dof-vibration",
            "sweep",
            "-w",
            "50",
            "log-space",
            "-l",
            "0.1",
            "-u",
            "10",
            "-n",
            "20",
        ]);
        let Analysis::Sweep {
            window,
            frequencies: Some(frequencies),
            ..
        } = cli.analysis
        else {
            panic!("expected a sweep")
        };
        assert_eq!(window, 50);
        assert_eq!(frequencies.values().len(), 20);
    }
}
