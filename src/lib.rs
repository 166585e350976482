//! Synthetic populations of gamma-ray burst pulses.
//!
//! A [`PopulationModel`] is a set of named samplers. Each sampler draws one
//! array of latent values per population, and optionally an array of
//! observed values, and may depend on the arrays of other samplers. The
//! model resolves these dependencies into an [`ExecutionPlan`] before
//! anything is sampled, so a missing dependency or a cycle is reported
//! without running a single sampler.
//!
//! Two quantities are shared across the whole population: the luminosity,
//! produced by the [`LuminositySampler`] of the model, and the distance,
//! produced by the sampler registered as distance sampler. Samplers declare
//! which of them they read.
//!
//! ```no_run
//! use popsynth::{
//!     samplers::{DurationSampler, NormalAuxSampler},
//!     AuxiliarySampler, PopulationModel, PopulationSettings, PopulationSynth,
//! };
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let mut model = PopulationModel::new();
//! model.add_sampler(NormalAuxSampler::new("log_t90", true)?.with_parameter("mu", 1.)?)?;
//! model.add_sampler(DurationSampler::new()?)?;
//!
//! let synth = PopulationSynth::new(model, PopulationSettings::default());
//! let population = synth.draw()?;
//! assert_eq!(population.true_values("duration").unwrap().len(), 1000);
//! # Ok(())
//! # }
//! ```

mod error;
mod graph;
pub mod inference;
mod parameter;
mod population;
mod sampler;
pub mod samplers;
pub mod source;
mod synth;

pub use error::{
    DependencyError, GraphError, NegativeScatter, PopsynthError, Result, SamplerError,
    SharedQuantity, ValidationError,
};
pub use graph::{ExecutionPlan, PopulationModel};
pub use parameter::{Parameter, ParameterSet};
pub use population::Population;
pub use sampler::{
    proportional_scatter, AuxiliarySampler, Declaration, DrawContext, LuminositySampler,
    ObservationContext, SamplerNode, SamplerRole, Secondaries,
};
pub use synth::{draw, PopulationSettings, PopulationSynth};
