use std::sync::Arc;

use anyhow::Result;
use approx::assert_relative_eq;
use arrow::{
    array::{Array, Float64Array},
    datatypes::DataType,
};
use popsynth::{
    samplers::{
        DerivedEpeakSampler, DurationSampler, EpeakLuminositySampler, FixedAuxSampler,
        NormalAuxSampler, TDecaySampler, UniformAuxSampler,
    },
    AuxiliarySampler, GraphError, LuminositySampler, PopsynthError, PopulationModel,
    PopulationSettings, PopulationSynth,
};
use pretty_assertions::assert_eq;

/// Durations, decay times and a luminosity tied to the peak energy, at
/// redshifts between 0.1 and 5.
fn pulse_model() -> Result<PopulationModel> {
    let mut model = PopulationModel::new();
    model.add_sampler(
        NormalAuxSampler::new("log_t90", true)?
            .with_parameter("mu", 1.)?
            .with_parameter("tau", 0.3)?
            .with_parameter("sigma", 0.05)?,
    )?;
    model.add_sampler(FixedAuxSampler::new("trise", 1.)?)?;
    model.add_sampler(TDecaySampler::new()?)?;
    model.add_sampler(DurationSampler::new()?)?;
    model.add_sampler(
        NormalAuxSampler::new("Epeak", false)?
            .with_parameter("mu", 2.5)?
            .with_parameter("tau", 0.2)?,
    )?;
    model.add_luminosity_sampler(EpeakLuminositySampler::new()?.with_parameter("s_scat", 0.05)?)?;
    model.add_distance_sampler(
        UniformAuxSampler::new("z", false)?
            .with_parameter("lower", 0.1)?
            .with_parameter("upper", 5.)?,
    )?;
    model.add_sampler(DerivedEpeakSampler::new()?)?;
    Ok(model)
}

fn settings(size: usize, seed: u64) -> PopulationSettings {
    PopulationSettings { size, seed }
}

#[test]
fn full_pulse_population() -> Result<()> {
    let model = pulse_model()?;
    let order = model.resolve()?;
    for (before, after) in [
        ("log_t90", "tdecay"),
        ("trise", "tdecay"),
        ("log_t90", "duration"),
        ("Epeak", "luminosity"),
        ("luminosity", "derived_Epeak"),
        ("z", "derived_Epeak"),
    ] {
        assert!(order.position(before) < order.position(after));
    }

    let synth = PopulationSynth::new(model, settings(500, 11));
    let population = synth.draw()?;

    assert_eq!(population.size(), 500);
    assert_eq!(
        population.sampler_names().collect::<Vec<_>>(),
        order.order().iter().map(String::as_str).collect::<Vec<_>>()
    );
    for name in population.sampler_names() {
        assert_eq!(population.true_values(name).unwrap().len(), 500);
    }
    assert_eq!(
        population.observed_names().collect::<Vec<_>>(),
        ["log_t90", "derived_Epeak"]
    );
    assert_eq!(population.luminosity(), population.true_values("luminosity"));
    assert_eq!(population.distance(), population.true_values("z"));
    assert!(population
        .distance()
        .unwrap()
        .iter()
        .all(|z| (0.1..5.).contains(z)));

    let log_t90 = population.true_values("log_t90").unwrap();
    let duration = population.true_values("duration").unwrap();
    for (&log_t90, &duration) in log_t90.iter().zip(duration) {
        assert_relative_eq!(duration, 1.5 * 10f64.powf(log_t90), max_relative = 1e-12);
    }

    let ep = population.true_values("derived_Epeak").unwrap();
    let ep_obs = population.obs_values("derived_Epeak").unwrap();
    assert!(ep.iter().all(|&ep| ep > 0.));
    assert_eq!(ep_obs.len(), 500);
    Ok(())
}

#[test]
fn seeded_draws_are_reproducible() -> Result<()> {
    let first = PopulationSynth::new(pulse_model()?, settings(200, 3)).draw()?;
    let second = PopulationSynth::new(pulse_model()?, settings(200, 3)).draw()?;
    assert_eq!(first, second);

    let other = PopulationSynth::new(pulse_model()?, settings(200, 4)).draw()?;
    assert_ne!(first, other);

    let synth = PopulationSynth::new(pulse_model()?, settings(100, 3));
    let many = synth.draw_many(3)?;
    assert_eq!(many, synth.draw_many(3)?);
    assert_eq!(many.len(), 3);
    Ok(())
}

#[test]
fn luminosity_and_derived_peak_energy_agree_without_scatter() -> Result<()> {
    let mut model = PopulationModel::new();
    model.add_sampler(
        NormalAuxSampler::new("Epeak", false)?
            .with_parameter("mu", 2.)?
            .with_parameter("tau", 0.5)?,
    )?;
    model.add_luminosity_sampler(EpeakLuminositySampler::new()?.with_parameter("s_scat", 0.)?)?;
    model.add_distance_sampler(FixedAuxSampler::new("z", 1.)?)?;
    model.add_sampler(
        DerivedEpeakSampler::new()?
            .with_parameter("s_scat", 0.)?
            .with_parameter("s_det", 0.)?,
    )?;

    let population = PopulationSynth::new(model, settings(50, 8)).draw()?;
    let log_ep = population.true_values("Epeak").unwrap();
    let derived = population.true_values("derived_Epeak").unwrap();
    let observed = population.obs_values("derived_Epeak").unwrap();
    for ((&log_ep, &derived), &observed) in log_ep.iter().zip(derived).zip(observed) {
        assert_relative_eq!(derived, 10f64.powf(log_ep), max_relative = 1e-9);
        assert_relative_eq!(observed, derived / 2., max_relative = 1e-9);
    }
    Ok(())
}

#[test]
fn luminosity_cycle_is_rejected_before_sampling() -> Result<()> {
    let mut model = PopulationModel::new();
    model.add_luminosity_sampler(EpeakLuminositySampler::new()?.with_epeak("derived_Epeak"))?;
    model.add_distance_sampler(FixedAuxSampler::new("z", 1.)?)?;
    model.add_sampler(DerivedEpeakSampler::new()?)?;

    let synth = PopulationSynth::new(model, PopulationSettings::default());
    match synth.draw() {
        Err(PopsynthError::Graph(GraphError::Cycle { cycle })) => {
            assert!(cycle.contains(&"luminosity".to_string()));
            assert!(cycle.contains(&"derived_Epeak".to_string()));
            assert_eq!(cycle.first(), cycle.last());
        }
        other => panic!("expected a cycle, got {other:?}"),
    }
    Ok(())
}

#[test]
fn catalog_export() -> Result<()> {
    let model = pulse_model()?;
    let population = PopulationSynth::new(model, settings(25, 1)).draw()?;
    let catalog = population.to_arrow();

    assert_eq!(catalog.len(), 25);
    assert_eq!(catalog.num_columns(), 8 + 2);
    let names: Vec<&str> = catalog
        .fields()
        .iter()
        .map(|field| field.name().as_str())
        .collect();
    assert!(names.contains(&"log_t90_obs"));
    assert!(names.contains(&"derived_Epeak_obs"));
    assert!(catalog
        .fields()
        .iter()
        .all(|field| field.data_type() == &DataType::Float64));

    let duration: &Arc<dyn Array> = catalog.column_by_name("duration").unwrap();
    let duration = duration.as_any().downcast_ref::<Float64Array>().unwrap();
    assert_eq!(&duration.values()[..], population.true_values("duration").unwrap());
    Ok(())
}

#[test]
fn default_scatter_never_aborts_a_draw() -> Result<()> {
    let mut model = PopulationModel::new();
    model.add_sampler(
        NormalAuxSampler::new("Epeak", false)?
            .with_parameter("mu", 2.)?
            .with_parameter("tau", 0.5)?,
    )?;
    model.add_luminosity_sampler(EpeakLuminositySampler::new()?)?;
    model.add_distance_sampler(
        UniformAuxSampler::new("z", false)?
            .with_parameter("lower", 0.1)?
            .with_parameter("upper", 5.)?,
    )?;
    model.add_sampler(DerivedEpeakSampler::new()?)?;

    let synth = PopulationSynth::new(model, settings(1000, 0));
    let populations = synth.draw_many(50)?;
    assert_eq!(populations.len(), 50);
    for population in &populations {
        let lum = population.luminosity().unwrap();
        let ep = population.true_values("derived_Epeak").unwrap();
        let ep_obs = population.obs_values("derived_Epeak").unwrap();
        for ((&lum, &ep), &ep_obs) in lum.iter().zip(ep).zip(ep_obs) {
            if lum < 0. {
                assert!(ep.is_nan() && ep_obs.is_nan());
            } else {
                assert!(ep.is_finite() && ep_obs.is_finite());
            }
        }
    }
    Ok(())
}

#[test]
fn luminosity_sampler_reports_its_inputs() -> Result<()> {
    let sampler = EpeakLuminositySampler::new()?.with_epeak("log_ep");
    assert_eq!(sampler.name(), "luminosity");
    assert_eq!(sampler.secondary_dependencies(), ["log_ep"]);
    assert_eq!(sampler.parameters().value("gamma")?, 1.5);
    Ok(())
}
