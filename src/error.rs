use std::fmt;

use thiserror::Error;

/// One of the two population-wide quantities that designated samplers
/// publish for everybody else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SharedQuantity {
    Luminosity,
    Distance,
}

impl fmt::Display for SharedQuantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SharedQuantity::Luminosity => write!(f, "luminosity"),
            SharedQuantity::Distance => write!(f, "distance"),
        }
    }
}

/// A parameter value that violates its declaration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("parameter `{parameter}` = {value} is outside of [{}, {}]", fmt_bound(.vmin), fmt_bound(.vmax))]
    OutOfBounds {
        parameter: String,
        value: f64,
        vmin: Option<f64>,
        vmax: Option<f64>,
    },
    #[error("no parameter named `{parameter}`")]
    UnknownParameter { parameter: String },
    #[error("invalid source configuration: {0}")]
    InvalidSource(String),
}

fn fmt_bound(bound: &Option<f64>) -> String {
    match bound {
        Some(value) => value.to_string(),
        None => "-".to_string(),
    }
}

/// Missing or premature access to data another sampler has to produce.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DependencyError {
    #[error("sampler `{sampler}` depends on unknown sampler `{dependency}`")]
    UnknownSampler { sampler: String, dependency: String },
    #[error("sampler `{sampler}` did not declare a dependency on `{dependency}`")]
    Undeclared { sampler: String, dependency: String },
    #[error("sampler `{sampler}` read `{dependency}` before it was computed")]
    NotComputed { sampler: String, dependency: String },
    #[error("{quantity} is not available to sampler `{sampler}`")]
    SharedQuantityUnavailable {
        sampler: String,
        quantity: SharedQuantity,
    },
    #[error("sampler `{sampler}` uses {quantity} but no sampler produces it")]
    MissingProducer {
        sampler: String,
        quantity: SharedQuantity,
    },
    #[error("sampler `{sampler}` has no observed values")]
    NotObserved { sampler: String },
}

/// Structural problems of the sampler graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("cycle detected: {}", .cycle.join(" -> "))]
    Cycle { cycle: Vec<String> },
    #[error("a sampler named `{0}` is already registered")]
    DuplicateName(String),
    #[error("sampler names must not be empty")]
    EmptyName,
    #[error("both `{first}` and `{second}` produce {quantity}")]
    DuplicateProducer {
        quantity: SharedQuantity,
        first: String,
        second: String,
    },
}

/// Failures raised while a sampler computes its values.
#[derive(Error, Debug)]
pub enum SamplerError {
    #[error("sampler `{sampler}` returned {actual} values, expected {expected}")]
    LengthMismatch {
        sampler: String,
        expected: usize,
        actual: usize,
    },
    #[error("sampler `{sampler}` failed")]
    Failure {
        sampler: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

/// A scatter width that no normal distribution can have.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
#[error("scatter width {scale} * {value} is negative")]
pub struct NegativeScatter {
    pub value: f64,
    pub scale: f64,
}

impl SamplerError {
    pub fn failure<E>(sampler: impl Into<String>, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        SamplerError::Failure {
            sampler: sampler.into(),
            source: Box::new(source),
        }
    }
}

#[derive(Error, Debug)]
pub enum PopsynthError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Dependency(#[from] DependencyError),
    #[error(transparent)]
    Graph(#[from] GraphError),
    #[error(transparent)]
    Sampler(#[from] SamplerError),
}

pub type Result<T> = std::result::Result<T, PopsynthError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn messages_name_the_culprit() {
        let err = ValidationError::OutOfBounds {
            parameter: "gamma".into(),
            value: -1.,
            vmin: Some(0.),
            vmax: None,
        };
        assert_eq!(
            err.to_string(),
            "parameter `gamma` = -1 is outside of [0, -]"
        );

        let err = GraphError::Cycle {
            cycle: vec!["a".into(), "b".into(), "a".into()],
        };
        assert_eq!(err.to_string(), "cycle detected: a -> b -> a");

        let err = DependencyError::MissingProducer {
            sampler: "derived_Epeak".into(),
            quantity: SharedQuantity::Luminosity,
        };
        assert_eq!(
            err.to_string(),
            "sampler `derived_Epeak` uses luminosity but no sampler produces it"
        );
    }
}
