use clap::Parser;
use serde::Serialize;
use two_dof_vibration::{
    FrequencyResponse, Spectrum, Structural, TimeSeries,
    cli::{Analysis, Cli},
    data::Dump,
};

#[derive(Serialize)]
struct TimeResponseData {
    time_series: TimeSeries,
    spectra: [Spectrum; 2],
}
impl TimeResponseData {
    fn new(time_series: TimeSeries) -> two_dof_vibration::Result<Self> {
        let spectra = [
            Spectrum::from_time_series(&time_series, 0)?,
            Spectrum::from_time_series(&time_series, 1)?,
        ];
        for (i, spectrum) in spectra.iter().enumerate() {
            if let Some(peak) = spectrum.peak() {
                println!(
                    " + x{} spectrum peak: {:.4}Hz ({:.4})",
                    i + 1,
                    peak.frequency,
                    peak.magnitude
                );
            }
        }
        Ok(Self {
            time_series,
            spectra,
        })
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Cli::parse();

    let model = Structural::from_parameters(args.parameters())?;
    println!("{model}");
    let modal = model.modes()?;
    println!("{modal}");

    match &args.analysis {
        Analysis::Modes => modal.dump(&args.filename)?,
        Analysis::Free { time } => {
            let time_series = model.simulate_free(&time.initial_state(), &time.time())?;
            let data = TimeResponseData::new(time_series)?;
            data.dump(&args.filename)?
        }
        Analysis::Forced { force, omega, time } => {
            let time_series = model.simulate_forced(
                &force.amplitudes(),
                *omega,
                &time.initial_state(),
                &time.time(),
            )?;
            let data = TimeResponseData::new(time_series)?;
            data.dump(&args.filename)?
        }
        Analysis::Sweep {
            force, frequencies, ..
        } => {
            let config = args.analysis.sweep_config().unwrap_or_default();
            let curve = model.sweep_frequency_response(
                &force.amplitudes(),
                frequencies.clone().unwrap_or_default(),
                &config,
            )?;
            for peak in curve.local_maxima() {
                println!(
                    " + resonance peak: {:.4}rad/s ({:.4})",
                    peak.frequency, peak.amplitude
                );
            }
            curve.dump(&args.filename)?
        }
        Analysis::Receptance { frequencies } => {
            // entries are +∞ at an undamped resonance
            let frequency_response = model.frequency_response(frequencies.clone().unwrap_or_default());
            frequency_response.dump(&args.filename)?
        }
    }
    println!("data written to {}", args.filename);

    Ok(())
}
