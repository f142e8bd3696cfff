use approx::assert_relative_eq;
use nalgebra::Vector2;
use two_dof_vibration::{
    Error, Frequencies, PhysicalParameters, Spectrum, StateVector, SweepConfig, TimeGrid,
    analyze_modes, build_model, dynamics::DynamicsError, simulate_free,
    structural::StructuralError, sweep_frequency_response,
};

#[test]
fn default_pipeline() {
    let model = build_model(PhysicalParameters::default()).unwrap();
    let modal = analyze_modes(model.mass(), model.stiffness()).unwrap();
    assert_eq!(modal.len(), 2);
    for mode in &modal.modes {
        assert_relative_eq!(mode.shape[0], 1.);
    }

    let time = TimeGrid::linspace(0., 10., 1000);
    let z0 = StateVector::new(1., 0.5, 0., 0.);
    let free = simulate_free(model.mass(), model.stiffness(), &z0, &time).unwrap();
    assert_eq!(free.len(), 1000);

    // x1 oscillates at both natural frequencies, the first one dominates
    let spectrum = Spectrum::from_time_series(&free, 0).unwrap();
    assert_eq!(spectrum.len(), 500);
    let peak = spectrum.peak().unwrap();
    let f_hz = modal.frequencies_hz();
    let df = spectrum.bins[1].frequency;
    assert!(
        f_hz.iter().any(|f| (peak.frequency - f).abs() <= df),
        "peak: {peak:?}, natural frequencies: {f_hz:?}Hz"
    );

    let d = model.damping().copied().unwrap();
    let curve = sweep_frequency_response(
        model.mass(),
        &d,
        model.stiffness(),
        &Vector2::new(1., 0.),
        Frequencies::default(),
        &SweepConfig::default(),
    )
    .unwrap();
    assert_eq!(curve.len(), 100);
    assert!(curve.amplitudes().iter().all(|a| a.is_finite() && *a >= 0.));
    let (w_max, _) = curve
        .points
        .iter()
        .map(|p| (p.frequency, p.amplitude))
        .fold((0., 0.), |a, b| if b.1 > a.1 { b } else { a });
    assert!(
        modal
            .natural_frequencies()
            .iter()
            .any(|w| (w - w_max).abs() < 0.2),
        "largest amplitude at {w_max}rad/s"
    );
}

#[test]
fn zero_mass_is_invalid() {
    let params = PhysicalParameters {
        m1: 0.,
        ..Default::default()
    };
    assert!(matches!(
        build_model(params),
        Err(Error::Structural(StructuralError::InvalidModel(_)))
    ));
}

#[test]
fn single_point_time_grid() {
    let model = build_model(PhysicalParameters::default()).unwrap();
    assert!(matches!(
        model.simulate_free(&StateVector::zeros(), &[0.]),
        Err(DynamicsError::InvalidTimeGrid(_))
    ));
}
