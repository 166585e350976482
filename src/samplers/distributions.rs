use rand::RngCore;
use rand_distr::{Distribution, LogNormal, Normal, Uniform};

use crate::{
    error::{Result, SamplerError, ValidationError},
    parameter::ParameterSet,
    sampler::{AuxiliarySampler, Declaration, DrawContext, ObservationContext},
};

/// Draw `size` values from `dist`, blaming `sampler` if the distribution
/// cannot be built.
fn draw_from<D, E>(
    sampler: &str,
    dist: std::result::Result<D, E>,
    size: usize,
    rng: &mut dyn RngCore,
) -> Result<Vec<f64>>
where
    D: Distribution<f64>,
    E: std::error::Error + Send + Sync + 'static,
{
    let dist = dist.map_err(|err| SamplerError::failure(sampler, err))?;
    Ok((0..size).map(|_| dist.sample(rng)).collect())
}

/// Latent values plus homoscedastic measurement noise.
fn with_measurement_noise(
    ctx: &ObservationContext<'_>,
    sigma: f64,
    rng: &mut dyn RngCore,
) -> Result<Vec<f64>> {
    let noise = draw_from(ctx.sampler(), Normal::new(0., sigma), ctx.size(), rng)?;
    Ok(ctx
        .true_values()
        .iter()
        .zip(noise)
        .map(|(value, noise)| value + noise)
        .collect())
}

/// Normally distributed latent values with mean `mu` and standard
/// deviation `tau`. Observations add normal noise of width `sigma`.
#[derive(Debug, Clone)]
pub struct NormalAuxSampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl NormalAuxSampler {
    pub fn new(name: &str, observed: bool) -> std::result::Result<Self, ValidationError> {
        let params = ParameterSet::new()
            .with("mu", 0., None, None)?
            .with("tau", 1., Some(0.), None)?
            .with("sigma", 1., Some(0.), None)?;
        Ok(NormalAuxSampler {
            declaration: Declaration::new(name, observed),
            params,
        })
    }
}

impl AuxiliarySampler for NormalAuxSampler {
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
        let mu = self.params.value("mu")?;
        let tau = self.params.value("tau")?;
        draw_from(ctx.sampler(), Normal::new(mu, tau), ctx.size(), rng)
    }

    fn observation_sampler(
        &self,
        ctx: &ObservationContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        with_measurement_noise(ctx, self.params.value("sigma")?, rng)
    }
}

/// Log-normally distributed latent values: `exp` of a normal with mean
/// `mu` and standard deviation `tau`.
#[derive(Debug, Clone)]
pub struct LogNormalAuxSampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl LogNormalAuxSampler {
    pub fn new(name: &str, observed: bool) -> std::result::Result<Self, ValidationError> {
        let params = ParameterSet::new()
            .with("mu", 0., None, None)?
            .with("tau", 1., Some(0.), None)?
            .with("sigma", 1., Some(0.), None)?;
        Ok(LogNormalAuxSampler {
            declaration: Declaration::new(name, observed),
            params,
        })
    }
}

impl AuxiliarySampler for LogNormalAuxSampler {
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
        let mu = self.params.value("mu")?;
        let tau = self.params.value("tau")?;
        draw_from(ctx.sampler(), LogNormal::new(mu, tau), ctx.size(), rng)
    }

    fn observation_sampler(
        &self,
        ctx: &ObservationContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        with_measurement_noise(ctx, self.params.value("sigma")?, rng)
    }
}

/// Uniform latent values on `[lower, upper)`.
#[derive(Debug, Clone)]
pub struct UniformAuxSampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl UniformAuxSampler {
    pub fn new(name: &str, observed: bool) -> std::result::Result<Self, ValidationError> {
        let params = ParameterSet::new()
            .with("lower", 0., None, None)?
            .with("upper", 1., None, None)?
            .with("sigma", 1., Some(0.), None)?;
        Ok(UniformAuxSampler {
            declaration: Declaration::new(name, observed),
            params,
        })
    }
}

impl AuxiliarySampler for UniformAuxSampler {
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
        let lower = self.params.value("lower")?;
        let upper = self.params.value("upper")?;
        draw_from(ctx.sampler(), Uniform::<f64>::new(lower, upper), ctx.size(), rng)
    }

    fn observation_sampler(
        &self,
        ctx: &ObservationContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        with_measurement_noise(ctx, self.params.value("sigma")?, rng)
    }
}

/// Every object gets the same latent `value`.
#[derive(Debug, Clone)]
pub struct FixedAuxSampler {
    declaration: Declaration,
    params: ParameterSet,
}

impl FixedAuxSampler {
    pub fn new(name: &str, value: f64) -> std::result::Result<Self, ValidationError> {
        Ok(FixedAuxSampler {
            declaration: Declaration::new(name, false),
            params: ParameterSet::new().with("value", value, None, None)?,
        })
    }
}

impl AuxiliarySampler for FixedAuxSampler {
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
        Ok(vec![self.params.value("value")?; ctx.size()])
    }
}
