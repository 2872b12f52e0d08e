//! Error types for the bean container.

use thiserror::Error;

/// Result type for container operations.
pub type ContainerResult<T> = Result<T, ContainerError>;

/// Errors raised while registering beans or booting the container.
///
/// Every variant is fatal: a boot that returns an error has not started
/// anything - there is no partial-start mode.
#[derive(Debug, Error)]
pub enum ContainerError {
    /// A bean name was registered twice.
    #[error("bean already registered: {name}")]
    DuplicateBean {
        /// The offending bean name.
        name: String,
    },

    /// A bean was requested that no one registered.
    #[error("unknown bean: {name}")]
    UnknownBean {
        /// The requested bean name.
        name: String,
    },

    /// A declared dependency does not resolve to any registered bean.
    #[error("bean '{bean}' depends on unregistered bean '{dependency}'")]
    UnresolvedDependency {
        /// The bean declaring the dependency.
        bean: String,
        /// The missing dependency name.
        dependency: String,
    },

    /// The declared dependency graph contains a cycle.
    #[error("dependency cycle: {path}")]
    DependencyCycle {
        /// The cycle, rendered as `a -> b -> a`.
        path: String,
    },

    /// A bean tried to resolve itself while being wired.
    #[error("bean '{bean}' resolved itself during wire")]
    SelfReference {
        /// The offending bean name.
        bean: String,
    },

    /// A resolved bean is not of the expected concrete type.
    #[error("bean '{bean}' is not a {expected}")]
    TypeMismatch {
        /// The resolved bean name.
        bean: String,
        /// The expected concrete type.
        expected: &'static str,
    },

    /// An operation was attempted in the wrong lifecycle phase.
    #[error("cannot {operation} in phase {phase}")]
    PhaseViolation {
        /// The rejected operation.
        operation: &'static str,
        /// The container phase at the time.
        phase: String,
    },

    /// A bean's own lifecycle hook failed.
    #[error("bean '{bean}' failed during {phase}: {source}")]
    Lifecycle {
        /// The failing bean name.
        bean: String,
        /// The lifecycle hook that failed.
        phase: &'static str,
        /// The underlying failure.
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
