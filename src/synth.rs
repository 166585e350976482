use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::{
    error::{Result, SamplerError, SharedQuantity},
    graph::{ExecutionPlan, PopulationModel},
    population::Population,
    sampler::{DrawContext, ObservationContext, SamplerNode},
};

/// Settings for drawing populations from a model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopulationSettings {
    /// Number of objects in each population.
    pub size: usize,
    /// Seed of the random number generator. Identical seeds give identical
    /// populations.
    pub seed: u64,
}

impl Default for PopulationSettings {
    fn default() -> Self {
        Self {
            size: 1000,
            seed: 0,
        }
    }
}

/// Draw one population of `size` objects.
///
/// The model is resolved before anything is sampled, so graph errors never
/// leave a partially drawn population behind. All randomness comes from
/// `rng`.
pub fn draw<R: Rng>(model: &PopulationModel, size: usize, rng: &mut R) -> Result<Population> {
    let plan = model.resolve()?;
    draw_plan(model, &plan, size, rng)
}

fn draw_plan<R: Rng>(
    model: &PopulationModel,
    plan: &ExecutionPlan,
    size: usize,
    rng: &mut R,
) -> Result<Population> {
    let mut population = Population::new(size);

    for &index in plan.steps() {
        let node = model.node_at(index);
        trace!(sampler = node.name(), "drawing latent values");

        let latent = {
            let ctx = context(node, &population, size);
            node.sample_true(&ctx, rng)?
        };
        check_len(node, size, latent.len())?;

        let observed = if node.declaration().observed() {
            trace!(sampler = node.name(), "drawing observed values");
            let mut ctx = ObservationContext::new(node.declaration(), &latent);
            if node.declaration().reads_distance() {
                if let Some(distance) = population.distance() {
                    ctx = ctx.with_distance(distance);
                }
            }
            let observed = node.sample_observed(&ctx, rng)?;
            check_len(node, size, observed.len())?;
            Some(observed)
        } else {
            None
        };

        population.insert_latent(node.name(), latent);
        if let Some(quantity) = node.role().produces() {
            population.publish(quantity, node.name());
        }
        if let Some(observed) = observed {
            population.insert_observed(node.name(), observed);
        }
    }

    debug!(size, samplers = plan.len(), "drew population");
    Ok(population)
}

/// Hand a sampler exactly the inputs it declared.
fn context<'a>(node: &'a SamplerNode, population: &'a Population, size: usize) -> DrawContext<'a> {
    let decl = node.declaration();
    let mut ctx = DrawContext::new(decl, size);
    for dep in decl.secondary_dependencies() {
        if let Some(values) = population.true_values(dep) {
            ctx = ctx.with_secondary(dep, values);
        }
    }
    for quantity in [SharedQuantity::Luminosity, SharedQuantity::Distance] {
        if decl.reads(quantity) {
            if let Some(values) = population.shared(quantity) {
                ctx = ctx.with_shared(quantity, values);
            }
        }
    }
    ctx
}

fn check_len(node: &SamplerNode, expected: usize, actual: usize) -> Result<()> {
    if expected != actual {
        return Err(SamplerError::LengthMismatch {
            sampler: node.name().to_string(),
            expected,
            actual,
        }
        .into());
    }
    Ok(())
}

/// A population model together with the settings to draw from it.
#[derive(Debug)]
pub struct PopulationSynth {
    model: PopulationModel,
    settings: PopulationSettings,
}

impl PopulationSynth {
    pub fn new(model: PopulationModel, settings: PopulationSettings) -> PopulationSynth {
        PopulationSynth { model, settings }
    }

    pub fn model(&self) -> &PopulationModel {
        &self.model
    }

    pub fn settings(&self) -> &PopulationSettings {
        &self.settings
    }

    /// Draw the population for the configured seed.
    pub fn draw(&self) -> Result<Population> {
        let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed);
        draw(&self.model, self.settings.size, &mut rng)
    }

    /// Draw `count` independent populations in parallel.
    ///
    /// Population `i` uses stream `i` of the seeded generator, so the
    /// result does not depend on how the work is scheduled.
    pub fn draw_many(&self, count: usize) -> Result<Vec<Population>> {
        let plan = self.model.resolve()?;
        (0..count)
            .into_par_iter()
            .map(|stream| {
                let mut rng = ChaCha8Rng::seed_from_u64(self.settings.seed);
                rng.set_stream(stream as u64);
                draw_plan(&self.model, &plan, self.settings.size, &mut rng)
            })
            .collect()
    }
}
