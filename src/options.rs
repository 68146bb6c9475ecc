//! Container options.

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "config")]
use crate::error::{DiError, DiResult};

/// Default cap on nested resolutions within one request.
pub const DEFAULT_MAX_DEPTH: usize = 1024;

/// How the container picks one constructor among those a type declares.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "kebab-case"))]
pub enum ConstructorSelection {
    /// The constructor with the most parameters; a tie at that arity is ambiguous
    #[default]
    GreatestArity,
    /// Exactly one constructor must be declared
    Single,
}

/// Options fixed at [`build`](crate::ServiceCollection::build) time.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{ConstructorSelection, ContainerOptions, ServiceCollection};
///
/// let options = ContainerOptions::new()
///     .with_constructor_selection(ConstructorSelection::Single)
///     .with_max_depth(64);
///
/// let services = ServiceCollection::with_options(options);
/// let provider = services.build();
/// assert_eq!(provider.options().max_depth, 64);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default, rename_all = "snake_case"))]
pub struct ContainerOptions {
    /// Constructor selection policy
    pub constructor_selection: ConstructorSelection,
    /// Maximum nesting of resolutions inside one request
    pub max_depth: usize,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            constructor_selection: ConstructorSelection::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl ContainerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_constructor_selection(mut self, selection: ConstructorSelection) -> Self {
        self.constructor_selection = selection;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Parses options from JSON. Missing fields take their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json).map_err(|e| DiError::factory::<Self>(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let options = ContainerOptions::default();
        assert_eq!(options.constructor_selection, ConstructorSelection::GreatestArity);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);
    }

    #[cfg(feature = "config")]
    #[test]
    fn parses_partial_json() {
        let options = ContainerOptions::from_json(r#"{ "constructor_selection": "single" }"#).unwrap();
        assert_eq!(options.constructor_selection, ConstructorSelection::Single);
        assert_eq!(options.max_depth, DEFAULT_MAX_DEPTH);

        let options = ContainerOptions::from_json(r#"{ "max_depth": 8 }"#).unwrap();
        assert_eq!(options.constructor_selection, ConstructorSelection::GreatestArity);
        assert_eq!(options.max_depth, 8);

        assert!(ContainerOptions::from_json("not json").is_err());
    }
}
