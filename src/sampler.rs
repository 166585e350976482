use std::fmt::Debug;

use indexmap::IndexMap;
use rand::{Rng, RngCore};
use rand_distr::{Distribution, StandardNormal};

use crate::{
    error::{
        DependencyError, GraphError, NegativeScatter, Result, SharedQuantity, ValidationError,
    },
    parameter::ParameterSet,
};

/// Identity and capabilities of a sampler.
///
/// The declaration is everything the resolver needs to know about a
/// sampler: its name, whether it produces observed values, which shared
/// quantities it reads and which other samplers it reads the latent values
/// of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    name: String,
    observed: bool,
    uses_luminosity: bool,
    uses_distance: bool,
    secondary: Vec<String>,
}

impl Declaration {
    pub fn new(name: impl Into<String>, observed: bool) -> Declaration {
        Declaration {
            name: name.into(),
            observed,
            uses_luminosity: false,
            uses_distance: false,
            secondary: Vec::new(),
        }
    }

    pub fn uses_luminosity(mut self) -> Declaration {
        self.uses_luminosity = true;
        self
    }

    pub fn uses_distance(mut self) -> Declaration {
        self.uses_distance = true;
        self
    }

    /// Declare that this sampler reads the latent values of `name`.
    pub fn depends_on(mut self, name: impl Into<String>) -> Declaration {
        let name = name.into();
        if !self.secondary.contains(&name) {
            self.secondary.push(name);
        }
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn observed(&self) -> bool {
        self.observed
    }

    pub fn reads_luminosity(&self) -> bool {
        self.uses_luminosity
    }

    pub fn reads_distance(&self) -> bool {
        self.uses_distance
    }

    pub fn reads(&self, quantity: SharedQuantity) -> bool {
        match quantity {
            SharedQuantity::Luminosity => self.uses_luminosity,
            SharedQuantity::Distance => self.uses_distance,
        }
    }

    /// Names of the secondary samplers, in declaration order.
    pub fn secondary_dependencies(&self) -> &[String] {
        &self.secondary
    }

    pub fn validate(&self) -> std::result::Result<(), GraphError> {
        if self.name.is_empty() {
            return Err(GraphError::EmptyName);
        }
        Ok(())
    }
}

/// Read-only access to the latent values of declared secondary samplers.
#[derive(Debug, Clone)]
pub struct Secondaries<'a> {
    declaration: &'a Declaration,
    values: IndexMap<&'a str, &'a [f64]>,
}

impl<'a> Secondaries<'a> {
    pub fn new(declaration: &'a Declaration) -> Secondaries<'a> {
        Secondaries {
            declaration,
            values: IndexMap::new(),
        }
    }

    /// Attach the latent values of a secondary sampler. Values of samplers
    /// that were not declared as dependencies are ignored.
    pub fn insert(&mut self, name: &'a str, values: &'a [f64]) {
        if self.is_declared(name) {
            self.values.insert(name, values);
        }
    }

    pub fn get(&self, name: &str) -> std::result::Result<&'a [f64], DependencyError> {
        if !self.is_declared(name) {
            return Err(DependencyError::Undeclared {
                sampler: self.declaration.name().to_string(),
                dependency: name.to_string(),
            });
        }
        self.values
            .get(name)
            .copied()
            .ok_or_else(|| DependencyError::NotComputed {
                sampler: self.declaration.name().to_string(),
                dependency: name.to_string(),
            })
    }

    pub fn sampler(&self) -> &'a str {
        self.declaration.name()
    }

    fn is_declared(&self, name: &str) -> bool {
        self.declaration
            .secondary_dependencies()
            .iter()
            .any(|dep| dep == name)
    }
}

/// Everything a sampler may read while computing its latent values.
#[derive(Debug, Clone)]
pub struct DrawContext<'a> {
    size: usize,
    secondaries: Secondaries<'a>,
    luminosity: Option<&'a [f64]>,
    distance: Option<&'a [f64]>,
}

impl<'a> DrawContext<'a> {
    pub fn new(declaration: &'a Declaration, size: usize) -> DrawContext<'a> {
        DrawContext {
            size,
            secondaries: Secondaries::new(declaration),
            luminosity: None,
            distance: None,
        }
    }

    pub fn with_secondary(mut self, name: &'a str, values: &'a [f64]) -> DrawContext<'a> {
        self.secondaries.insert(name, values);
        self
    }

    pub fn with_shared(mut self, quantity: SharedQuantity, values: &'a [f64]) -> DrawContext<'a> {
        match quantity {
            SharedQuantity::Luminosity => self.luminosity = Some(values),
            SharedQuantity::Distance => self.distance = Some(values),
        }
        self
    }

    /// Number of values to draw.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn sampler(&self) -> &'a str {
        self.secondaries.sampler()
    }

    pub fn secondaries(&self) -> &Secondaries<'a> {
        &self.secondaries
    }

    pub fn secondary(&self, name: &str) -> std::result::Result<&'a [f64], DependencyError> {
        self.secondaries.get(name)
    }

    pub fn luminosity(&self) -> std::result::Result<&'a [f64], DependencyError> {
        self.shared(SharedQuantity::Luminosity)
    }

    pub fn distance(&self) -> std::result::Result<&'a [f64], DependencyError> {
        self.shared(SharedQuantity::Distance)
    }

    fn shared(&self, quantity: SharedQuantity) -> std::result::Result<&'a [f64], DependencyError> {
        let values = match quantity {
            SharedQuantity::Luminosity => self.luminosity,
            SharedQuantity::Distance => self.distance,
        };
        match values {
            Some(values) if self.secondaries.declaration.reads(quantity) => Ok(values),
            _ => Err(DependencyError::SharedQuantityUnavailable {
                sampler: self.sampler().to_string(),
                quantity,
            }),
        }
    }
}

/// Inputs of an observation: the latent values of the same sampler in the
/// same draw, and the distance if the sampler declared it.
#[derive(Debug, Clone)]
pub struct ObservationContext<'a> {
    declaration: &'a Declaration,
    true_values: &'a [f64],
    distance: Option<&'a [f64]>,
}

impl<'a> ObservationContext<'a> {
    pub fn new(declaration: &'a Declaration, true_values: &'a [f64]) -> ObservationContext<'a> {
        ObservationContext {
            declaration,
            true_values,
            distance: None,
        }
    }

    pub fn with_distance(mut self, distance: &'a [f64]) -> ObservationContext<'a> {
        self.distance = Some(distance);
        self
    }

    pub fn size(&self) -> usize {
        self.true_values.len()
    }

    pub fn sampler(&self) -> &'a str {
        self.declaration.name()
    }

    pub fn true_values(&self) -> &'a [f64] {
        self.true_values
    }

    pub fn distance(&self) -> std::result::Result<&'a [f64], DependencyError> {
        match self.distance {
            Some(distance) if self.declaration.reads_distance() => Ok(distance),
            _ => Err(DependencyError::SharedQuantityUnavailable {
                sampler: self.sampler().to_string(),
                quantity: SharedQuantity::Distance,
            }),
        }
    }
}

/// A generator of latent and optionally observed values.
///
/// Implementations must be pure functions of their parameters, the context
/// and the random number generator. All randomness has to come from `rng`,
/// otherwise draws are not reproducible.
pub trait AuxiliarySampler: Debug + Send + Sync {
    fn declaration(&self) -> &Declaration;

    fn parameters(&self) -> &ParameterSet;

    fn parameters_mut(&mut self) -> &mut ParameterSet;

    /// Change a parameter. Only possible before the sampler is added to a
    /// model.
    fn set_parameter(&mut self, name: &str, value: f64) -> std::result::Result<(), ValidationError> {
        self.parameters_mut().set(name, value)
    }

    /// Builder form of [`AuxiliarySampler::set_parameter`].
    fn with_parameter(mut self, name: &str, value: f64) -> std::result::Result<Self, ValidationError>
    where
        Self: Sized,
    {
        self.set_parameter(name, value)?;
        Ok(self)
    }

    /// Draw `ctx.size()` latent values.
    fn true_sampler(&self, ctx: &DrawContext<'_>, rng: &mut dyn RngCore) -> Result<Vec<f64>>;

    /// Turn latent values into observed ones. Only called for samplers
    /// that declare `observed`.
    fn observation_sampler(
        &self,
        ctx: &ObservationContext<'_>,
        _rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        Err(DependencyError::NotObserved {
            sampler: ctx.sampler().to_string(),
        }
        .into())
    }
}

/// A sampler whose latent values become the luminosity of the population.
///
/// It only sees its secondary samplers, so it can never depend on the
/// luminosity it produces or on the distance.
pub trait LuminositySampler: Debug + Send + Sync {
    fn name(&self) -> &str;

    fn secondary_dependencies(&self) -> Vec<String>;

    fn parameters(&self) -> &ParameterSet;

    fn parameters_mut(&mut self) -> &mut ParameterSet;

    fn set_parameter(&mut self, name: &str, value: f64) -> std::result::Result<(), ValidationError> {
        self.parameters_mut().set(name, value)
    }

    fn with_parameter(mut self, name: &str, value: f64) -> std::result::Result<Self, ValidationError>
    where
        Self: Sized,
    {
        self.set_parameter(name, value)?;
        Ok(self)
    }

    fn compute_luminosity(
        &self,
        secondaries: &Secondaries<'_>,
        size: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SamplerRole {
    Plain,
    Luminosity,
    Distance,
}

impl SamplerRole {
    /// The shared quantity this role publishes, if any.
    pub fn produces(&self) -> Option<SharedQuantity> {
        match self {
            SamplerRole::Plain => None,
            SamplerRole::Luminosity => Some(SharedQuantity::Luminosity),
            SamplerRole::Distance => Some(SharedQuantity::Distance),
        }
    }
}

#[derive(Debug)]
enum NodeKind {
    Plain(Box<dyn AuxiliarySampler>),
    Luminosity(Box<dyn LuminositySampler>),
    Distance(Box<dyn AuxiliarySampler>),
}

/// A sampler together with its role in a population model.
///
/// The sampler is frozen once it is wrapped in a node.
#[derive(Debug)]
pub struct SamplerNode {
    declaration: Declaration,
    kind: NodeKind,
}

impl SamplerNode {
    pub fn plain(sampler: impl AuxiliarySampler + 'static) -> SamplerNode {
        SamplerNode {
            declaration: sampler.declaration().clone(),
            kind: NodeKind::Plain(Box::new(sampler)),
        }
    }

    pub fn luminosity(sampler: impl LuminositySampler + 'static) -> SamplerNode {
        let declaration = sampler
            .secondary_dependencies()
            .into_iter()
            .fold(Declaration::new(sampler.name(), false), |decl, dep| {
                decl.depends_on(dep)
            });
        SamplerNode {
            declaration,
            kind: NodeKind::Luminosity(Box::new(sampler)),
        }
    }

    /// A sampler whose latent values are the distances (redshifts) of the
    /// population.
    pub fn distance(sampler: impl AuxiliarySampler + 'static) -> SamplerNode {
        SamplerNode {
            declaration: sampler.declaration().clone(),
            kind: NodeKind::Distance(Box::new(sampler)),
        }
    }

    pub fn name(&self) -> &str {
        self.declaration.name()
    }

    pub fn declaration(&self) -> &Declaration {
        &self.declaration
    }

    pub fn role(&self) -> SamplerRole {
        match self.kind {
            NodeKind::Plain(_) => SamplerRole::Plain,
            NodeKind::Luminosity(_) => SamplerRole::Luminosity,
            NodeKind::Distance(_) => SamplerRole::Distance,
        }
    }

    pub fn parameters(&self) -> &ParameterSet {
        match &self.kind {
            NodeKind::Plain(sampler) | NodeKind::Distance(sampler) => sampler.parameters(),
            NodeKind::Luminosity(sampler) => sampler.parameters(),
        }
    }

    pub fn sample_true(&self, ctx: &DrawContext<'_>, rng: &mut dyn RngCore) -> Result<Vec<f64>> {
        match &self.kind {
            NodeKind::Plain(sampler) | NodeKind::Distance(sampler) => sampler.true_sampler(ctx, rng),
            NodeKind::Luminosity(sampler) => {
                sampler.compute_luminosity(ctx.secondaries(), ctx.size(), rng)
            }
        }
    }

    /// Draw observed values. Fails for samplers that are not observed.
    pub fn sample_observed(
        &self,
        ctx: &ObservationContext<'_>,
        rng: &mut dyn RngCore,
    ) -> Result<Vec<f64>> {
        if !self.declaration.observed() {
            return Err(DependencyError::NotObserved {
                sampler: self.name().to_string(),
            }
            .into());
        }
        match &self.kind {
            NodeKind::Plain(sampler) | NodeKind::Distance(sampler) => {
                sampler.observation_sampler(ctx, rng)
            }
            NodeKind::Luminosity(_) => Err(DependencyError::NotObserved {
                sampler: self.name().to_string(),
            }
            .into()),
        }
    }
}

/// Zero-mean normal noise whose standard deviation is `scale` times each
/// value, so larger values scatter proportionally more.
///
/// Negative widths are an error. A non-finite width gives NaN noise, so
/// invalid values stay visible in the population instead of aborting it.
pub fn proportional_scatter<R: Rng + ?Sized>(
    values: &[f64],
    scale: f64,
    rng: &mut R,
) -> std::result::Result<Vec<f64>, NegativeScatter> {
    values
        .iter()
        .map(|&value| {
            let width = scale * value;
            if width < 0. {
                return Err(NegativeScatter { value, scale });
            }
            if !width.is_finite() {
                return Ok(f64::NAN);
            }
            let z: f64 = StandardNormal.sample(rng);
            Ok(width * z)
        })
        .collect()
}
