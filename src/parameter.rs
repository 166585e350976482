//! Named scalar parameters of samplers.
//!
//! Every sampler owns a [`ParameterSet`]. Values are checked against their
//! bounds whenever they are assigned, so a sampler can never be registered
//! into a model with an invalid configuration.

use indexmap::IndexMap;

use crate::error::ValidationError;

#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    name: String,
    default: f64,
    value: f64,
    vmin: Option<f64>,
    vmax: Option<f64>,
}

impl Parameter {
    /// An unbounded parameter.
    pub fn new(name: impl Into<String>, default: f64) -> Parameter {
        Parameter {
            name: name.into(),
            default,
            value: default,
            vmin: None,
            vmax: None,
        }
    }

    /// A parameter with optional inclusive bounds. Fails if the default
    /// itself violates them.
    pub fn bounded(
        name: impl Into<String>,
        default: f64,
        vmin: Option<f64>,
        vmax: Option<f64>,
    ) -> Result<Parameter, ValidationError> {
        let param = Parameter {
            name: name.into(),
            default,
            value: default,
            vmin,
            vmax,
        };
        param.check(default)?;
        Ok(param)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn default_value(&self) -> f64 {
        self.default
    }

    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        (self.vmin, self.vmax)
    }

    /// Replace the current value. The old value is kept if the new one is
    /// rejected.
    pub fn assign(&mut self, value: f64) -> Result<(), ValidationError> {
        self.check(value)?;
        self.value = value;
        Ok(())
    }

    fn check(&self, value: f64) -> Result<(), ValidationError> {
        // NaN compares false, so it fails every bound that is set.
        let above_min = self.vmin.is_none_or(|vmin| vmin <= value);
        let below_max = self.vmax.is_none_or(|vmax| value <= vmax);
        if above_min && below_max {
            Ok(())
        } else {
            Err(ValidationError::OutOfBounds {
                parameter: self.name.clone(),
                value,
                vmin: self.vmin,
                vmax: self.vmax,
            })
        }
    }
}

/// The ordered parameters of one sampler.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParameterSet {
    params: IndexMap<String, Parameter>,
}

impl ParameterSet {
    pub fn new() -> ParameterSet {
        ParameterSet::default()
    }

    /// Bind a new parameter. Declaring a name twice replaces the earlier
    /// declaration.
    pub fn declare(
        &mut self,
        name: &str,
        default: f64,
        vmin: Option<f64>,
        vmax: Option<f64>,
    ) -> Result<(), ValidationError> {
        let param = Parameter::bounded(name, default, vmin, vmax)?;
        self.params.insert(name.to_string(), param);
        Ok(())
    }

    /// Builder form of [`ParameterSet::declare`].
    pub fn with(
        mut self,
        name: &str,
        default: f64,
        vmin: Option<f64>,
        vmax: Option<f64>,
    ) -> Result<ParameterSet, ValidationError> {
        self.declare(name, default, vmin, vmax)?;
        Ok(self)
    }

    pub fn get(&self, name: &str) -> Result<&Parameter, ValidationError> {
        self.params
            .get(name)
            .ok_or_else(|| ValidationError::UnknownParameter {
                parameter: name.to_string(),
            })
    }

    /// The current value of a parameter.
    pub fn value(&self, name: &str) -> Result<f64, ValidationError> {
        self.get(name).map(Parameter::value)
    }

    pub fn set(&mut self, name: &str, value: f64) -> Result<(), ValidationError> {
        self.params
            .get_mut(name)
            .ok_or_else(|| ValidationError::UnknownParameter {
                parameter: name.to_string(),
            })?
            .assign(value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Parameter> {
        self.params.values()
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_is_current_value() {
        let param = Parameter::new("Nrest", 1e52);
        assert_eq!(param.value(), 1e52);
        assert_eq!(param.default_value(), 1e52);
        assert_eq!(param.bounds(), (None, None));
    }

    #[test]
    fn assignment_checks_bounds() {
        let mut param = Parameter::bounded("gamma", 1.5, Some(0.), None).unwrap();
        param.assign(0.).unwrap();
        assert_eq!(param.value(), 0.);

        let err = param.assign(-0.5).unwrap_err();
        assert_eq!(
            err,
            ValidationError::OutOfBounds {
                parameter: "gamma".into(),
                value: -0.5,
                vmin: Some(0.),
                vmax: None,
            }
        );
        assert_eq!(param.value(), 0.);

        assert!(param.assign(f64::NAN).is_err());
    }

    #[test]
    fn invalid_default_fails_construction() {
        assert!(Parameter::bounded("alpha", 1., None, Some(0.)).is_err());
        assert!(Parameter::bounded("alpha", 0., None, Some(0.)).is_ok());
    }

    #[test]
    fn set_unknown_parameter() {
        let mut params = ParameterSet::new()
            .with("mu", 0., None, None)
            .unwrap()
            .with("tau", 1., Some(0.), None)
            .unwrap();
        assert_eq!(params.len(), 2);

        params.set("mu", 3.).unwrap();
        assert_eq!(params.value("mu"), Ok(3.));

        let err = params.set("sigma", 1.).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownParameter { .. }));
        assert!(params.set("tau", -1.).is_err());
        assert_eq!(params.value("tau"), Ok(1.));

        let names: Vec<_> = params.iter().map(|p| p.name()).collect();
        assert_eq!(names, ["mu", "tau"]);
    }
}
