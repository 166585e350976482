//! Samplers for the properties of a single gamma-ray burst pulse.
//!
//! The peak energy `Epeak` and the luminosity are tied together by a power
//! law, `L = Nrest * (Epeak / 100 keV)^gamma`. Either side can be sampled
//! and the other derived from it.

use rand::RngCore;

use crate::{
    error::{Result, SamplerError, ValidationError},
    parameter::ParameterSet,
    sampler::{
        proportional_scatter, AuxiliarySampler, Declaration, DrawContext, LuminositySampler,
        ObservationContext, Secondaries,
    },
};

/// Pivot energy of the luminosity relation in keV.
const EPEAK_PIVOT: f64 = 100.;

fn add(values: &[f64], noise: Vec<f64>) -> Vec<f64> {
    values.iter().zip(noise).map(|(v, n)| v + n).collect()
}

/// Decay time of a pulse, derived from its duration and rise time.
///
/// Depends on `log_t90` (log10 of the duration in seconds) and `trise`.
/// The `sigma` parameter is reserved for measurement noise; the sampler is
/// unobserved and the latent values do not depend on it.
#[derive(Debug, Clone)]
pub struct TDecaySampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl TDecaySampler {
    pub fn new() -> std::result::Result<Self, ValidationError> {
        Ok(TDecaySampler {
            declaration: Declaration::new("tdecay", false)
                .depends_on("log_t90")
                .depends_on("trise"),
            params: ParameterSet::new().with("sigma", 1., None, None)?,
        })
    }
}

impl AuxiliarySampler for TDecaySampler {
    fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn true_sampler(&self, ctx: &DrawContext<'_>, _rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let log_t90 = ctx.secondary("log_t90")?;
        let trise = ctx.secondary("trise")?;
        Ok(log_t90
            .iter()
            .zip(trise)
            .map(|(&log_t90, &trise)| {
                let t90 = 10f64.powf(log_t90);
                (10. * t90 + trise + trise.sqrt() * (20. * t90 + trise).sqrt()) / 50.
            })
            .collect())
    }
}

/// Total duration of a pulse, `1.5 * t90`.
///
/// Like [`TDecaySampler`] it carries an unused `sigma` for measurement noise.
#[derive(Debug, Clone)]
pub struct DurationSampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl DurationSampler {
    pub fn new() -> std::result::Result<Self, ValidationError> {
        Ok(DurationSampler {
            declaration: Declaration::new("duration", false).depends_on("log_t90"),
            params: ParameterSet::new().with("sigma", 1., None, None)?,
        })
    }
}

impl AuxiliarySampler for DurationSampler {
    fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn true_sampler(&self, ctx: &DrawContext<'_>, _rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        Ok(ctx
            .secondary("log_t90")?
            .iter()
            .map(|&log_t90| 1.5 * 10f64.powf(log_t90))
            .collect())
    }
}

/// Luminosity computed from the peak energy, with scatter proportional to
/// the luminosity.
///
/// Reads the log10 of the peak energy in keV from the sampler named
/// `Epeak` unless configured otherwise.
#[derive(Debug, Clone)]
pub struct EpeakLuminositySampler {
    epeak: String,
    params: ParameterSet,
}

impl EpeakLuminositySampler {
    pub fn new() -> std::result::Result<Self, ValidationError> {
        let params = ParameterSet::new()
            .with("Nrest", 1e52, None, None)?
            .with("gamma", 1.5, Some(0.), None)?
            .with("s_scat", 0.3, None, None)?;
        Ok(EpeakLuminositySampler {
            epeak: "Epeak".to_string(),
            params,
        })
    }

    /// Read the peak energy from a differently named sampler.
    pub fn with_epeak(mut self, name: impl Into<String>) -> Self {
        self.epeak = name.into();
        self
    }
}

impl LuminositySampler for EpeakLuminositySampler {
    fn name(&self) -> &str {
        "luminosity"
    }

    fn secondary_dependencies(&self) -> Vec<String> {
        vec![self.epeak.clone()]
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn compute_luminosity(
        &self,
        secondaries: &Secondaries<'_>,
        _size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        let n_rest = self.params.value("Nrest")?;
        let gamma = self.params.value("gamma")?;
        let s_scat = self.params.value("s_scat")?;

        let lum: Vec<f64> = secondaries
            .get(&self.epeak)?
            .iter()
            .map(|&log_ep| n_rest * (10f64.powf(log_ep) / EPEAK_PIVOT).powf(gamma))
            .collect();
        let scatter = proportional_scatter(&lum, s_scat, rng)
            .map_err(|err| SamplerError::failure(secondaries.sampler(), err))?;
        Ok(add(&lum, scatter))
    }
}

/// Peak energy derived from the population luminosity by inverting the
/// luminosity relation.
///
/// The observed peak energy is redshifted with the population distance
/// and gets detector scatter proportional to the rest-frame value.
#[derive(Debug, Clone)]
pub struct DerivedEpeakSampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl DerivedEpeakSampler {
    pub fn new() -> std::result::Result<Self, ValidationError> {
        let params = ParameterSet::new()
            .with("Nrest", 1e52, None, None)?
            .with("gamma", 1.5, Some(0.), None)?
            .with("s_scat", 0.1, None, None)?
            .with("s_det", 0.1, None, None)?;
        Ok(DerivedEpeakSampler {
            declaration: Declaration::new("derived_Epeak", true)
                .uses_luminosity()
                .uses_distance(),
            params,
        })
    }
}

impl AuxiliarySampler for DerivedEpeakSampler {
    fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    fn parameters(&self) -> &ParameterSet {
        &self.params
    }

    fn parameters_mut(&mut self) -> &mut ParameterSet {
        &mut self.params
    }

    fn true_sampler(&self, ctx: &DrawContext<'_>, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        let log_n_rest = self.params.value("Nrest")?.log10();
        let gamma = self.params.value("gamma")?;
        let s_scat = self.params.value("s_scat")?;

        let ep: Vec<f64> = ctx
            .luminosity()?
            .iter()
            .map(|&lum| 10f64.powf((lum.log10() - log_n_rest) / gamma) * EPEAK_PIVOT)
            .collect();
        let scatter = proportional_scatter(&ep, s_scat, rng)
            .map_err(|err| SamplerError::failure(ctx.sampler(), err))?;
        Ok(add(&ep, scatter))
    }

    fn observation_sampler(
        &self,
        ctx: &ObservationContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        let s_det = self.params.value("s_det")?;
        let ep = ctx.true_values();
        let ep_obs: Vec<f64> = ep
            .iter()
            .zip(ctx.distance()?)
            .map(|(ep, z)| ep / (1. + z))
            .collect();
        let scatter = proportional_scatter(ep, s_det, rng)
            .map_err(|err| SamplerError::failure(ctx.sampler(), err))?;
        Ok(add(&ep_obs, scatter))
    }
}
