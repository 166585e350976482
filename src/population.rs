use std::sync::Arc;

use arrow::{
    array::{ArrayRef, Float64Array, StructArray},
    datatypes::{DataType, Field},
};
use indexmap::IndexMap;

use crate::error::SharedQuantity;

/// The outcome of one population draw.
///
/// Holds the latent values of every sampler, the observed values of the
/// observed samplers and the shared luminosity and distance, all of length
/// `size`. Samplers appear in the order in which they ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Population {
    size: usize,
    latent: IndexMap<String, Box<[f64]>>,
    observed: IndexMap<String, Box<[f64]>>,
    luminosity: Option<String>,
    distance: Option<String>,
}

impl Population {
    pub(crate) fn new(size: usize) -> Population {
        Population {
            size,
            latent: IndexMap::new(),
            observed: IndexMap::new(),
            luminosity: None,
            distance: None,
        }
    }

    pub(crate) fn insert_latent(&mut self, name: &str, values: Vec<f64>) {
        self.latent.insert(name.to_string(), values.into());
    }

    pub(crate) fn insert_observed(&mut self, name: &str, values: Vec<f64>) {
        self.observed.insert(name.to_string(), values.into());
    }

    /// Mark the latent values of `name` as the population's `quantity`.
    pub(crate) fn publish(&mut self, quantity: SharedQuantity, name: &str) {
        let slot = match quantity {
            SharedQuantity::Luminosity => &mut self.luminosity,
            SharedQuantity::Distance => &mut self.distance,
        };
        *slot = Some(name.to_string());
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn true_values(&self, name: &str) -> Option<&[f64]> {
        self.latent.get(name).map(|values| &values[..])
    }

    pub fn obs_values(&self, name: &str) -> Option<&[f64]> {
        self.observed.get(name).map(|values| &values[..])
    }

    pub fn shared(&self, quantity: SharedQuantity) -> Option<&[f64]> {
        let name = match quantity {
            SharedQuantity::Luminosity => self.luminosity.as_deref(),
            SharedQuantity::Distance => self.distance.as_deref(),
        };
        self.true_values(name?)
    }

    pub fn luminosity(&self) -> Option<&[f64]> {
        self.shared(SharedQuantity::Luminosity)
    }

    pub fn distance(&self) -> Option<&[f64]> {
        self.shared(SharedQuantity::Distance)
    }

    /// Sampler names in execution order.
    pub fn sampler_names(&self) -> impl Iterator<Item = &str> {
        self.latent.keys().map(String::as_str)
    }

    pub fn observed_names(&self) -> impl Iterator<Item = &str> {
        self.observed.keys().map(String::as_str)
    }

    /// A catalog with one column per latent array and an additional
    /// `<name>_obs` column for every observed sampler. Always has `size`
    /// rows, even for a model without samplers.
    pub fn to_arrow(&self) -> StructArray {
        let latent = self.latent.iter().map(|(name, values)| (name.clone(), values));
        let observed = self
            .observed
            .iter()
            .map(|(name, values)| (format!("{name}_obs"), values));

        let columns: Vec<(Arc<Field>, ArrayRef)> = latent
            .chain(observed)
            .map(|(name, values)| {
                let field = Arc::new(Field::new(name, DataType::Float64, false));
                let array: ArrayRef = Arc::new(Float64Array::from(values.to_vec()));
                (field, array)
            })
            .collect();
        if columns.is_empty() {
            return StructArray::new_empty_fields(self.size, None);
        }
        StructArray::from(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Array;
    use pretty_assertions::assert_eq;

    #[test]
    fn shared_quantities_point_at_latent_values() {
        let mut population = Population::new(2);
        population.insert_latent("z", vec![0.5, 1.]);
        population.insert_latent("luminosity", vec![1e52, 2e52]);
        population.publish(SharedQuantity::Distance, "z");

        assert_eq!(population.distance(), Some(&[0.5, 1.][..]));
        assert_eq!(population.luminosity(), None);

        population.publish(SharedQuantity::Luminosity, "luminosity");
        assert_eq!(population.luminosity(), Some(&[1e52, 2e52][..]));
    }

    #[test]
    fn arrow_catalog() {
        let mut population = Population::new(3);
        population.insert_latent("Epeak", vec![1., 2., 3.]);
        population.insert_latent("derived_Epeak", vec![4., 5., 6.]);
        population.insert_observed("derived_Epeak", vec![2., 2.5, 3.]);

        let catalog = population.to_arrow();
        assert_eq!(catalog.len(), 3);
        assert_eq!(
            catalog.column_names(),
            ["Epeak", "derived_Epeak", "derived_Epeak_obs"]
        );
        let obs = catalog
            .column_by_name("derived_Epeak_obs")
            .unwrap()
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(obs.values().to_vec(), vec![2., 2.5, 3.]);
    }

    #[test]
    fn empty_catalog_keeps_its_rows() {
        let catalog = Population::new(10).to_arrow();
        assert_eq!(catalog.len(), 10);
        assert_eq!(catalog.num_columns(), 0);
    }
}
