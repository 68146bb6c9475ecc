//! Error types for the dependency injection container.

use thiserror::Error;

/// Dependency injection errors
///
/// Every failure of a top-level resolution is reported as
/// [`DiError::Resolution`], which carries the chain of contracts that was
/// under construction and wraps the underlying cause. Use
/// [`root_cause`](DiError::root_cause) to match on the cause.
///
/// # Examples
///
/// ```rust
/// use ferrous_wire::{DiError, ServiceCollection, Resolver};
///
/// let provider = ServiceCollection::new().build();
/// match provider.get::<String>() {
///     Err(err) => {
///         assert!(matches!(err.root_cause(), DiError::NotFound(_)));
///         assert!(err.to_string().contains("String"));
///     }
///     Ok(_) => unreachable!(),
/// }
/// ```
///
/// ```rust
/// use ferrous_wire::DiError;
///
/// let not_found = DiError::NotFound("MyService");
/// let cycle = DiError::ConstructorCycle(vec!["ServiceA", "ServiceB", "ServiceA"]);
///
/// assert_eq!(not_found.to_string(), "Service not found: MyService");
/// assert_eq!(cycle.to_string(), "Unresolvable constructor cycle: ServiceA -> ServiceB -> ServiceA");
/// ```
#[derive(Debug, Clone, Error)]
pub enum DiError {
    /// No registration exists for the contract
    #[error("Service not found: {0}")]
    NotFound(&'static str),

    /// More than one constructor qualifies under the selection policy
    #[error("Ambiguous constructor for {implementation}: {candidates} candidates with {arity} parameters")]
    AmbiguousConstructor {
        implementation: &'static str,
        arity: usize,
        candidates: usize,
    },

    /// The implementation declared no constructor at all
    #[error("No constructor declared for {0}")]
    NoConstructor(&'static str),

    /// An autowired member has no way to be assigned
    #[error("Autowired member `{member}` of {implementation} is not writable")]
    NonWritableInjectionTarget {
        implementation: &'static str,
        member: &'static str,
    },

    /// A cycle made only of constructor edges (includes path)
    #[error("Unresolvable constructor cycle: {}", .0.join(" -> "))]
    ConstructorCycle(Vec<&'static str>),

    /// Type downcast failed
    #[error("Type mismatch for: {0}")]
    TypeMismatch(&'static str),

    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),

    /// A constructor or factory reported a failure of its own
    #[error("Factory for {service} failed: {message}")]
    Factory {
        service: &'static str,
        message: String,
    },

    /// A failure tagged with the contract chain that was being built
    #[error("{source} (while resolving {})", .chain.join(" -> "))]
    Resolution {
        chain: Vec<&'static str>,
        #[source]
        source: Box<DiError>,
    },
}

impl DiError {
    /// Creates a factory failure for `T`.
    pub fn factory<T: ?Sized + 'static>(message: impl Into<String>) -> Self {
        DiError::Factory {
            service: std::any::type_name::<T>(),
            message: message.into(),
        }
    }

    /// The underlying cause with any resolution chain stripped.
    pub fn root_cause(&self) -> &DiError {
        match self {
            DiError::Resolution { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// The contract chain under construction when the error occurred.
    ///
    /// Empty for errors that were not raised by a resolution.
    pub fn chain(&self) -> &[&'static str] {
        match self {
            DiError::Resolution { chain, .. } => chain,
            _ => &[],
        }
    }

    pub(crate) fn with_chain(self, chain: Vec<&'static str>) -> Self {
        match self {
            already @ DiError::Resolution { .. } => already,
            source => DiError::Resolution {
                chain,
                source: Box::new(source),
            },
        }
    }
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
