//! The sampler graph of a population model and its execution order.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use itertools::Itertools;
use tracing::debug;

use crate::{
    error::{DependencyError, GraphError, Result, SharedQuantity},
    sampler::{AuxiliarySampler, LuminositySampler, SamplerNode},
};

/// A set of uniquely named samplers.
///
/// Samplers are kept in registration order, which also decides the order
/// of samplers that do not depend on each other.
#[derive(Debug, Default)]
pub struct PopulationModel {
    nodes: IndexMap<String, SamplerNode>,
}

impl PopulationModel {
    pub fn new() -> PopulationModel {
        PopulationModel::default()
    }

    /// Register a sampler node.
    pub fn add(&mut self, node: SamplerNode) -> std::result::Result<(), GraphError> {
        node.declaration().validate()?;
        if self.nodes.contains_key(node.name()) {
            return Err(GraphError::DuplicateName(node.name().to_string()));
        }
        if let Some(quantity) = node.role().produces() {
            if let Some(existing) = self.producer(quantity) {
                return Err(GraphError::DuplicateProducer {
                    quantity,
                    first: existing.name().to_string(),
                    second: node.name().to_string(),
                });
            }
        }
        self.nodes.insert(node.name().to_string(), node);
        Ok(())
    }

    /// Builder form of [`PopulationModel::add`].
    pub fn with(mut self, node: SamplerNode) -> std::result::Result<PopulationModel, GraphError> {
        self.add(node)?;
        Ok(self)
    }

    pub fn add_sampler(
        &mut self,
        sampler: impl AuxiliarySampler + 'static,
    ) -> std::result::Result<(), GraphError> {
        self.add(SamplerNode::plain(sampler))
    }

    pub fn add_luminosity_sampler(
        &mut self,
        sampler: impl LuminositySampler + 'static,
    ) -> std::result::Result<(), GraphError> {
        self.add(SamplerNode::luminosity(sampler))
    }

    pub fn add_distance_sampler(
        &mut self,
        sampler: impl AuxiliarySampler + 'static,
    ) -> std::result::Result<(), GraphError> {
        self.add(SamplerNode::distance(sampler))
    }

    pub fn get(&self, name: &str) -> Option<&SamplerNode> {
        self.nodes.get(name)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All samplers in registration order.
    pub fn nodes(&self) -> impl Iterator<Item = &SamplerNode> {
        self.nodes.values()
    }

    /// The sampler that publishes `quantity`, if one is registered.
    pub fn producer(&self, quantity: SharedQuantity) -> Option<&SamplerNode> {
        self.nodes
            .values()
            .find(|node| node.role().produces() == Some(quantity))
    }

    pub(crate) fn node_at(&self, index: usize) -> &SamplerNode {
        &self.nodes[index]
    }

    /// For every sampler, the indices of the samplers that have to run
    /// before it.
    fn dependencies(&self) -> std::result::Result<Vec<Vec<usize>>, DependencyError> {
        let producers: Vec<(SharedQuantity, Option<usize>)> =
            [SharedQuantity::Luminosity, SharedQuantity::Distance]
                .into_iter()
                .map(|quantity| {
                    let index = self
                        .nodes
                        .values()
                        .position(|node| node.role().produces() == Some(quantity));
                    (quantity, index)
                })
                .collect();

        self.nodes
            .values()
            .map(|node| -> std::result::Result<Vec<usize>, DependencyError> {
                let decl = node.declaration();
                let mut deps = Vec::new();
                for dep in decl.secondary_dependencies() {
                    let index = self.nodes.get_index_of(dep.as_str()).ok_or_else(|| {
                        DependencyError::UnknownSampler {
                            sampler: node.name().to_string(),
                            dependency: dep.clone(),
                        }
                    })?;
                    deps.push(index);
                }
                for &(quantity, producer) in &producers {
                    if !decl.reads(quantity) {
                        continue;
                    }
                    let index = producer.ok_or_else(|| DependencyError::MissingProducer {
                        sampler: node.name().to_string(),
                        quantity,
                    })?;
                    deps.push(index);
                }
                Ok(deps.into_iter().unique().collect())
            })
            .collect()
    }

    /// Order the samplers so that every sampler runs after everything it
    /// depends on.
    ///
    /// Uses Kahn's algorithm. Among samplers that are ready at the same
    /// time the one registered first runs first, so resolving the same
    /// model always gives the same plan.
    pub fn resolve(&self) -> Result<ExecutionPlan> {
        let deps = self.dependencies()?;
        let n = self.nodes.len();

        let mut in_degree: Vec<usize> = deps.iter().map(Vec::len).collect();
        let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); n];
        for (node, node_deps) in deps.iter().enumerate() {
            for &dep in node_deps {
                dependents[dep].push(node);
            }
        }

        let mut ready: BTreeSet<usize> = (0..n).filter(|&i| in_degree[i] == 0).collect();
        let mut steps = Vec::with_capacity(n);
        while let Some(next) = ready.pop_first() {
            steps.push(next);
            for &dependent in &dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        if steps.len() != n {
            let cycle = find_cycle(&deps, &in_degree)
                .into_iter()
                .map(|index| self.nodes[index].name().to_string())
                .collect();
            return Err(GraphError::Cycle { cycle }.into());
        }

        let plan = ExecutionPlan {
            names: steps
                .iter()
                .map(|&index| self.nodes[index].name().to_string())
                .collect(),
            steps,
        };
        debug!(order = ?plan.names, "resolved sampler graph");
        Ok(plan)
    }
}

/// Follow unresolved dependencies from an unresolved sampler until one
/// repeats. Every unresolved sampler has at least one unresolved
/// dependency, so the walk always closes a cycle.
fn find_cycle(deps: &[Vec<usize>], in_degree: &[usize]) -> Vec<usize> {
    let Some(start) = in_degree.iter().position(|&degree| degree > 0) else {
        return Vec::new();
    };
    let mut path = vec![start];
    let mut current = start;
    loop {
        let Some(&next) = deps[current].iter().find(|&&dep| in_degree[dep] > 0) else {
            return path;
        };
        if let Some(pos) = path.iter().position(|&visited| visited == next) {
            let mut cycle = path.split_off(pos);
            cycle.push(next);
            return cycle;
        }
        path.push(next);
        current = next;
    }
}

/// The order in which the samplers of a model run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionPlan {
    steps: Vec<usize>,
    names: Vec<String>,
}

impl ExecutionPlan {
    /// Sampler names in execution order.
    pub fn order(&self) -> &[String] {
        &self.names
    }

    pub fn position(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub(crate) fn steps(&self) -> &[usize] {
        &self.steps
    }
}
