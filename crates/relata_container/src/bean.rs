//! The bean trait and lifecycle hooks.

use crate::container::WireContext;
use parking_lot::RwLock;
use std::any::Any;
use std::sync::Arc;

/// Result type for bean lifecycle hooks.
///
/// Hooks report failures with their own error types; the container wraps
/// whatever comes back into [`ContainerError::Lifecycle`] together with
/// the bean name and phase.
///
/// [`ContainerError::Lifecycle`]: crate::ContainerError::Lifecycle
pub type BeanResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// A registered bean shared across the container.
pub type SharedBean = Arc<RwLock<dyn Bean>>;

/// A registered application component managed by the container lifecycle.
///
/// Every hook has a no-op default, so a bean implements only the phases
/// it participates in. `as_any` is the one mandatory method: it lets
/// sibling beans downcast a resolved handle to its concrete type during
/// Wire.
pub trait Bean: Any + Send + Sync {
    /// Names of the beans this bean must have injected during Wire.
    ///
    /// Resolution of every declared name is verified before any bean is
    /// wired; an unknown name or a cycle aborts the boot.
    fn dependencies(&self) -> Vec<String> {
        Vec::new()
    }

    /// Local setup, invoked immediately at registration.
    ///
    /// Must not touch other beans - at this point the registry may be
    /// partially populated. A failure here is a programmer error and
    /// aborts the registration.
    fn init(&mut self) -> BeanResult<()> {
        Ok(())
    }

    /// Resolves declared dependencies into typed handles.
    fn wire(&mut self, ctx: &WireContext<'_>) -> BeanResult<()> {
        let _ = ctx;
        Ok(())
    }

    /// Setup requiring injected dependencies.
    ///
    /// Runs after every bean's Wire completed. Beans run in registration
    /// order within this phase and must not assume a sibling's
    /// `post_construct` ran first.
    fn post_construct(&mut self) -> BeanResult<()> {
        Ok(())
    }

    /// Final cross-bean checks and side effects with wide blast radius.
    ///
    /// Runs only after every bean completed Construct.
    fn validate(&mut self) -> BeanResult<()> {
        Ok(())
    }

    /// Typed access for downcasting during Wire.
    fn as_any(&self) -> &dyn Any;
}
