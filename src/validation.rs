//! Static validation of a service configuration.
//!
//! Walks the registration table without building anything and reports the
//! problems a first resolution would run into: missing contracts, constructors
//! that cannot be selected, members that cannot be written, and cycles made
//! only of constructor edges. Factory bindings are opaque and contribute no
//! edges.

use std::collections::HashSet;

use crate::error::DiError;
use crate::key::Key;
use crate::lifetime::Lifetime;
use crate::metadata::Scanner;
use crate::options::ContainerOptions;
use crate::registration::{Binding, FastMap, Registry};

/// A problem that makes resolution of some contract fail.
#[derive(Debug, Clone)]
pub enum ValidationError {
    /// A constructor parameter or member refers to an unregistered contract
    MissingDependency {
        service: &'static str,
        dependency: &'static str,
    },
    /// No constructor, or no single constructor, can be selected
    ConstructorSelection {
        service: &'static str,
        error: DiError,
    },
    /// An autowired member has no setter
    NonWritableMember {
        service: &'static str,
        member: &'static str,
    },
    /// A cycle made only of constructor edges
    ConstructorCycle { cycle: Vec<&'static str> },
}

/// A configuration that resolves but may not behave as intended.
#[derive(Debug, Clone)]
pub enum ValidationWarning {
    /// A singleton's constructor captures a transient, which then lives as
    /// long as the singleton
    SingletonCapturesTransient {
        singleton: &'static str,
        transient: &'static str,
    },
}

/// Result of [`ServiceCollection::validate`](crate::ServiceCollection::validate).
#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ValidationError>,
    pub warnings: Vec<ValidationWarning>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

pub(crate) fn validate(registry: &Registry, options: &ContainerOptions) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut scanner = Scanner::new();
    let mut constructor_edges: FastMap<Key, Vec<Key>> = FastMap::default();

    for registration in registry.iter() {
        let Binding::Component { impl_id, describe, .. } = &registration.binding else {
            continue;
        };
        let service = registration.contract.display_name();
        let descriptor = scanner.describe(*impl_id, *describe);

        for member in descriptor.members() {
            if !member.is_writable() {
                report.errors.push(ValidationError::NonWritableMember {
                    service,
                    member: member.name(),
                });
            }
            if !registry.contains_key(&member.contract()) {
                report.errors.push(ValidationError::MissingDependency {
                    service,
                    dependency: member.contract().display_name(),
                });
            }
        }

        let constructor = match descriptor.select_constructor(options.constructor_selection) {
            Ok(constructor) => constructor,
            Err(error) => {
                report.errors.push(ValidationError::ConstructorSelection { service, error });
                continue;
            }
        };

        for parameter in constructor.parameters() {
            match registry.get(parameter) {
                None => report.errors.push(ValidationError::MissingDependency {
                    service,
                    dependency: parameter.display_name(),
                }),
                Some(dependency) => {
                    if registration.lifetime == Lifetime::Singleton
                        && dependency.lifetime == Lifetime::Transient
                    {
                        report.warnings.push(ValidationWarning::SingletonCapturesTransient {
                            singleton: service,
                            transient: parameter.display_name(),
                        });
                    }
                }
            }
        }
        constructor_edges.insert(registration.contract, constructor.parameters().to_vec());
    }

    for cycle in constructor_cycles(registry, &constructor_edges) {
        report.errors.push(ValidationError::ConstructorCycle { cycle });
    }

    tracing::debug!(
        errors = report.errors.len(),
        warnings = report.warnings.len(),
        "validated service configuration"
    );
    report
}

fn constructor_cycles(registry: &Registry, edges: &FastMap<Key, Vec<Key>>) -> Vec<Vec<&'static str>> {
    let mut visited = HashSet::new();
    let mut path = Vec::new();
    let mut cycles = Vec::new();

    for registration in registry.iter() {
        if !visited.contains(&registration.contract) {
            dfs_cycles(registration.contract, edges, &mut visited, &mut path, &mut cycles);
        }
    }
    cycles
}

fn dfs_cycles(
    current: Key,
    edges: &FastMap<Key, Vec<Key>>,
    visited: &mut HashSet<Key>,
    path: &mut Vec<Key>,
    cycles: &mut Vec<Vec<&'static str>>,
) {
    if let Some(start) = path.iter().position(|&k| k == current) {
        let cycle = path[start..]
            .iter()
            .chain(std::iter::once(&current))
            .map(Key::display_name)
            .collect();
        cycles.push(cycle);
        return;
    }
    if !visited.insert(current) {
        return;
    }

    path.push(current);
    if let Some(next) = edges.get(&current) {
        for &dependency in next {
            dfs_cycles(dependency, edges, visited, path, cycles);
        }
    }
    path.pop();
}
