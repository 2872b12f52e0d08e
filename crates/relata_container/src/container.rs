//! The container: registration, dependency verification, boot phases.

use crate::bean::{Bean, SharedBean};
use crate::error::{ContainerError, ContainerResult};
use parking_lot::RwLock;
use std::any::type_name;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Container lifecycle phase.
///
/// Transitions are forward-only: Registered -> Wired -> Constructed ->
/// Validated. Re-boot and late registration are rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Beans may still be registered; nothing has been wired.
    Registered,
    /// Every bean's dependencies are injected.
    Wired,
    /// Every bean's `post_construct` has run.
    Constructed,
    /// Boot is complete; the application is serving.
    Validated,
}

impl Default for Phase {
    fn default() -> Self {
        Self::Registered
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Registered => "registered",
            Self::Wired => "wired",
            Self::Constructed => "constructed",
            Self::Validated => "validated",
        };
        f.write_str(name)
    }
}

/// View handed to a bean while it is being wired.
///
/// Resolution is by bean name; the bean currently being wired cannot
/// resolve itself.
pub struct WireContext<'a> {
    container: &'a Container,
    current: &'a str,
}

impl WireContext<'_> {
    /// Returns the name of the bean being wired.
    #[must_use]
    pub fn current(&self) -> &str {
        self.current
    }

    /// Resolves a bean handle by name.
    pub fn resolve(&self, name: &str) -> ContainerResult<SharedBean> {
        if name == self.current {
            return Err(ContainerError::SelfReference {
                bean: self.current.to_string(),
            });
        }
        self.container
            .handle(name)
            .ok_or_else(|| ContainerError::UnresolvedDependency {
                bean: self.current.to_string(),
                dependency: name.to_string(),
            })
    }

    /// Resolves a bean, downcasts it to `T` and applies `f` under a read
    /// lock.
    ///
    /// A failed downcast is a fatal [`ContainerError::TypeMismatch`].
    pub fn with_bean<T, R>(&self, name: &str, f: impl FnOnce(&T) -> R) -> ContainerResult<R>
    where
        T: Bean,
    {
        let shared = self.resolve(name)?;
        let guard = shared.read();
        let typed =
            guard
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| ContainerError::TypeMismatch {
                    bean: name.to_string(),
                    expected: type_name::<T>(),
                })?;
        Ok(f(typed))
    }
}

/// Ordered, name-keyed bean registry driving the boot lifecycle.
///
/// Registration order is significant: every boot phase iterates beans in
/// the order they were registered.
#[derive(Default)]
pub struct Container {
    order: Vec<String>,
    beans: HashMap<String, SharedBean>,
    phase: Phase,
}

impl Container {
    /// Creates an empty container.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns registered bean names in registration order.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.order
    }

    /// Registers a bean under a unique name and runs its local `init`.
    ///
    /// `init` must not touch other beans; a failure here is a programmer
    /// error and aborts the registration.
    pub fn register<B: Bean>(&mut self, name: impl Into<String>, bean: B) -> ContainerResult<()> {
        let name = name.into();
        if self.phase != Phase::Registered {
            return Err(ContainerError::PhaseViolation {
                operation: "register",
                phase: self.phase.to_string(),
            });
        }
        if self.beans.contains_key(&name) {
            return Err(ContainerError::DuplicateBean { name });
        }

        let shared: SharedBean = Arc::new(RwLock::new(bean));
        shared
            .write()
            .init()
            .map_err(|source| ContainerError::Lifecycle {
                bean: name.clone(),
                phase: "init",
                source,
            })?;

        tracing::debug!(bean = %name, "registered");
        self.order.push(name.clone());
        self.beans.insert(name, shared);
        Ok(())
    }

    /// Returns the handle registered under `name`.
    pub fn get(&self, name: &str) -> ContainerResult<SharedBean> {
        self.handle(name).ok_or_else(|| ContainerError::UnknownBean {
            name: name.to_string(),
        })
    }

    /// Resolves a bean, downcasts it to `T` and applies `f` under a read
    /// lock.
    pub fn with_bean<T, R>(&self, name: &str, f: impl FnOnce(&T) -> R) -> ContainerResult<R>
    where
        T: Bean,
    {
        let shared = self.get(name)?;
        let guard = shared.read();
        let typed =
            guard
                .as_any()
                .downcast_ref::<T>()
                .ok_or_else(|| ContainerError::TypeMismatch {
                    bean: name.to_string(),
                    expected: type_name::<T>(),
                })?;
        Ok(f(typed))
    }

    /// Boots the application: verify the dependency graph, then Wire,
    /// Construct and Validate every bean, as three global sequential
    /// barriers in registration order.
    ///
    /// Any error aborts the whole boot before the next phase runs for
    /// anyone. A container that failed to boot stays in its current
    /// phase and cannot be re-booted.
    pub fn boot(&mut self) -> ContainerResult<()> {
        if self.phase != Phase::Registered {
            return Err(ContainerError::PhaseViolation {
                operation: "boot",
                phase: self.phase.to_string(),
            });
        }
        self.verify_dependencies()?;

        let order = self.order.clone();

        tracing::info!("boot: wire");
        for name in &order {
            let bean = Arc::clone(&self.beans[name]);
            let ctx = WireContext {
                container: &*self,
                current: name,
            };
            bean.write()
                .wire(&ctx)
                .map_err(|source| ContainerError::Lifecycle {
                    bean: name.clone(),
                    phase: "wire",
                    source,
                })?;
            tracing::debug!(bean = %name, "wired");
        }
        self.phase = Phase::Wired;

        tracing::info!("boot: construct");
        for name in &order {
            let bean = Arc::clone(&self.beans[name]);
            bean.write()
                .post_construct()
                .map_err(|source| ContainerError::Lifecycle {
                    bean: name.clone(),
                    phase: "construct",
                    source,
                })?;
            tracing::debug!(bean = %name, "constructed");
        }
        self.phase = Phase::Constructed;

        tracing::info!("boot: validate");
        for name in &order {
            let bean = Arc::clone(&self.beans[name]);
            bean.write()
                .validate()
                .map_err(|source| ContainerError::Lifecycle {
                    bean: name.clone(),
                    phase: "validate",
                    source,
                })?;
            tracing::debug!(bean = %name, "validated");
        }
        self.phase = Phase::Validated;

        Ok(())
    }

    fn handle(&self, name: &str) -> Option<SharedBean> {
        self.beans.get(name).map(Arc::clone)
    }

    /// Checks that every declared dependency resolves and that the graph
    /// is acyclic.
    fn verify_dependencies(&self) -> ContainerResult<()> {
        let mut declared: HashMap<&str, Vec<String>> = HashMap::new();
        for name in &self.order {
            let dependencies = self.beans[name].read().dependencies();
            for dependency in &dependencies {
                if !self.beans.contains_key(dependency) {
                    return Err(ContainerError::UnresolvedDependency {
                        bean: name.clone(),
                        dependency: dependency.clone(),
                    });
                }
            }
            declared.insert(name, dependencies);
        }

        // Depth-first search over the declared edges; a grey re-entry is
        // a cycle.
        #[derive(Clone, Copy, PartialEq)]
        enum Mark {
            White,
            Grey,
            Black,
        }

        fn visit<'a>(
            name: &'a str,
            declared: &'a HashMap<&str, Vec<String>>,
            marks: &mut HashMap<&'a str, Mark>,
            trail: &mut Vec<&'a str>,
        ) -> Option<String> {
            marks.insert(name, Mark::Grey);
            trail.push(name);
            if let Some(dependencies) = declared.get(name) {
                for dependency in dependencies {
                    match marks.get(dependency.as_str()).copied().unwrap_or(Mark::White) {
                        Mark::Grey => {
                            let start = trail
                                .iter()
                                .position(|n| *n == dependency.as_str())
                                .unwrap_or(0);
                            let mut path: Vec<&str> = trail[start..].to_vec();
                            path.push(dependency);
                            return Some(path.join(" -> "));
                        }
                        Mark::White => {
                            if let Some(path) = visit(dependency, declared, marks, trail) {
                                return Some(path);
                            }
                        }
                        Mark::Black => {}
                    }
                }
            }
            trail.pop();
            marks.insert(name, Mark::Black);
            None
        }

        let mut marks: HashMap<&str, Mark> = HashMap::new();
        for name in &self.order {
            if marks.get(name.as_str()).copied().unwrap_or(Mark::White) == Mark::White {
                let mut trail = Vec::new();
                if let Some(path) = visit(name, &declared, &mut marks, &mut trail) {
                    return Err(ContainerError::DependencyCycle { path });
                }
            }
        }
        Ok(())
    }
}

impl fmt::Debug for Container {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Container")
            .field("phase", &self.phase)
            .field("beans", &self.order)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bean::BeanResult;
    use parking_lot::Mutex;
    use std::any::Any;

    type Log = Arc<Mutex<Vec<String>>>;

    /// Records every lifecycle hook into a shared log.
    struct Probe {
        name: &'static str,
        dependencies: Vec<String>,
        log: Log,
        fail_in: Option<&'static str>,
    }

    impl Probe {
        fn new(name: &'static str, dependencies: &[&str], log: Log) -> Self {
            Self {
                name,
                dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
                log,
                fail_in: None,
            }
        }

        fn failing(name: &'static str, hook: &'static str, log: Log) -> Self {
            Self {
                name,
                dependencies: Vec::new(),
                log,
                fail_in: Some(hook),
            }
        }

        fn record(&self, hook: &'static str) -> BeanResult<()> {
            self.log.lock().push(format!("{}:{}", hook, self.name));
            if self.fail_in == Some(hook) {
                return Err(format!("{} failed", self.name).into());
            }
            Ok(())
        }
    }

    impl Bean for Probe {
        fn dependencies(&self) -> Vec<String> {
            self.dependencies.clone()
        }
        fn init(&mut self) -> BeanResult<()> {
            self.record("init")
        }
        fn wire(&mut self, _ctx: &WireContext<'_>) -> BeanResult<()> {
            self.record("wire")
        }
        fn post_construct(&mut self) -> BeanResult<()> {
            self.record("construct")
        }
        fn validate(&mut self) -> BeanResult<()> {
            self.record("validate")
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn log() -> Log {
        Arc::new(Mutex::new(Vec::new()))
    }

    #[test]
    fn phases_run_as_global_barriers() {
        let log = log();
        let mut container = Container::new();
        container.register("a", Probe::new("a", &[], log.clone())).unwrap();
        container.register("b", Probe::new("b", &["a"], log.clone())).unwrap();
        container.boot().unwrap();

        let events = log.lock().clone();
        assert_eq!(
            events,
            [
                "init:a",
                "init:b",
                "wire:a",
                "wire:b",
                "construct:a",
                "construct:b",
                "validate:a",
                "validate:b",
            ]
        );
        assert_eq!(container.phase(), Phase::Validated);
    }

    #[test]
    fn unresolved_dependency_fails_before_any_wire() {
        let log = log();
        let mut container = Container::new();
        container
            .register("a", Probe::new("a", &["missing"], log.clone()))
            .unwrap();

        let err = container.boot().unwrap_err();
        assert!(matches!(err, ContainerError::UnresolvedDependency { ref bean, ref dependency }
            if bean == "a" && dependency == "missing"));

        // only init ran - nothing was wired, constructed or validated
        assert_eq!(log.lock().clone(), ["init:a"]);
        assert_eq!(container.phase(), Phase::Registered);
    }

    #[test]
    fn wire_failure_aborts_before_construct() {
        let log = log();
        let mut container = Container::new();
        container
            .register("a", Probe::failing("a", "wire", log.clone()))
            .unwrap();
        container.register("b", Probe::new("b", &[], log.clone())).unwrap();

        let err = container.boot().unwrap_err();
        assert!(matches!(err, ContainerError::Lifecycle { phase: "wire", .. }));
        let events = log.lock().clone();
        assert!(!events.iter().any(|e| e.starts_with("construct")));
    }

    #[test]
    fn duplicate_name_rejected() {
        let log = log();
        let mut container = Container::new();
        container.register("a", Probe::new("a", &[], log.clone())).unwrap();
        let err = container
            .register("a", Probe::new("a", &[], log))
            .unwrap_err();
        assert!(matches!(err, ContainerError::DuplicateBean { .. }));
    }

    #[test]
    fn dependency_cycle_detected() {
        let log = log();
        let mut container = Container::new();
        container.register("a", Probe::new("a", &["b"], log.clone())).unwrap();
        container.register("b", Probe::new("b", &["a"], log)).unwrap();

        let err = container.boot().unwrap_err();
        assert!(matches!(err, ContainerError::DependencyCycle { .. }));
    }

    #[test]
    fn init_failure_aborts_registration() {
        let log = log();
        let mut container = Container::new();
        let err = container
            .register("a", Probe::failing("a", "init", log))
            .unwrap_err();
        assert!(matches!(err, ContainerError::Lifecycle { phase: "init", .. }));
        assert!(container.names().is_empty());
    }

    #[test]
    fn forward_only_lifecycle() {
        let log = log();
        let mut container = Container::new();
        container.register("a", Probe::new("a", &[], log.clone())).unwrap();
        container.boot().unwrap();

        let err = container.boot().unwrap_err();
        assert!(matches!(err, ContainerError::PhaseViolation { operation: "boot", .. }));

        let err = container
            .register("b", Probe::new("b", &[], log))
            .unwrap_err();
        assert!(matches!(
            err,
            ContainerError::PhaseViolation { operation: "register", .. }
        ));
    }

    #[test]
    fn with_bean_downcasts() {
        let log = log();
        let mut container = Container::new();
        container.register("a", Probe::new("a", &[], log)).unwrap();

        let name = container
            .with_bean::<Probe, _>("a", |probe| probe.name)
            .unwrap();
        assert_eq!(name, "a");
    }

    #[test]
    fn with_bean_wrong_type_is_mismatch() {
        struct Other;
        impl Bean for Other {
            fn as_any(&self) -> &dyn Any {
                self
            }
        }

        let log = log();
        let mut container = Container::new();
        container.register("a", Probe::new("a", &[], log)).unwrap();

        let err = container
            .with_bean::<Other, _>("a", |_| ())
            .unwrap_err();
        assert!(matches!(err, ContainerError::TypeMismatch { .. }));
    }
}
