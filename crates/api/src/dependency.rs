//! Dependency injection.
//!
//! A [`Dependency`] is a named provider whose result is injected into handler parameters declared with
//! [`Param::depends`](crate::Param::depends) (or used as a parameter default with
//! [`Param::default_from`](crate::Param::default_from)). Providers declare their own parameters exactly
//! like handlers do, so a dependency may depend on other dependencies, on the request, or on query values.
//!
//! Resolution state lives in a [`DependencyRegistry`] owned by the caller and handed to every dispatch:
//!
//! - an **override** registered for a dependency replaces its provider entirely; the override takes no
//!   arguments and its result is never cached
//! - a dependency built with [`Dependency::cached`] keeps its first result in the registry and returns it
//!   to every later resolution, across unrelated dispatches, until [`DependencyRegistry::clear_cache`]
//!
//! Both tables are keyed by the provider: a cached handle and its uncached original share one override,
//! and every cached handle of the same provider shares one cached value.
//!
//! A registry kept for the life of a warm process therefore amortizes expensive providers across
//! invocations. It is not synchronized: hosts dispatching concurrently in one process must wrap it in a
//! mutex.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::error::{BindError, BoxError};
use crate::extract::{Argument, Arguments, Payload, bind_dependency};
use crate::param::ParameterSpec;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

type Provider = dyn Fn(&mut Arguments) -> Result<Argument, BoxError> + Send + Sync;
type Override = Arc<dyn Fn() -> Result<Argument, BoxError> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DependencyId(u64);

struct DependencyInner {
    id: DependencyId,
    name: String,
    params: Vec<ParameterSpec>,
    provider: Box<Provider>,
}

/// A value provider that can be injected into handlers.
///
/// Cloning is cheap and keeps the identity: the registry keys its cache and overrides by the provider,
/// not by the handle.
#[derive(Clone)]
pub struct Dependency {
    inner: Arc<DependencyInner>,
    use_cache: bool,
}

impl Dependency {
    /// Creates an uncached dependency from a provider over its declared parameters.
    pub fn new<P, F, T, E>(name: impl Into<String>, params: P, provider: F) -> Self
    where
        P: IntoIterator<Item = ParameterSpec>,
        F: Fn(&mut Arguments) -> Result<T, E> + Send + Sync + 'static,
        T: Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let provider = move |args: &mut Arguments| -> Result<Argument, BoxError> {
            match provider(args) {
                Ok(value) => Ok(Argument::Object(Arc::new(value))),
                Err(e) => Err(e.into()),
            }
        };
        let id = DependencyId(NEXT_ID.fetch_add(1, Ordering::Relaxed));
        let inner = DependencyInner {
            id,
            name: name.into(),
            params: params.into_iter().collect(),
            provider: Box::new(provider),
        };
        Self { inner: Arc::new(inner), use_cache: false }
    }

    /// Returns a handle to the same provider whose results are cached by the registry.
    #[must_use]
    pub fn cached(self) -> Self {
        Self { use_cache: true, ..self }
    }

    pub fn id(&self) -> DependencyId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn params(&self) -> &[ParameterSpec] {
        &self.inner.params
    }

    pub fn use_cache(&self) -> bool {
        self.use_cache
    }

    fn provide(&self, args: &mut Arguments) -> Result<Argument, BoxError> {
        (self.inner.provider)(args)
    }
}

impl fmt::Debug for Dependency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Dependency")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("use_cache", &self.use_cache)
            .finish_non_exhaustive()
    }
}

/// Resolution state shared by every dispatch that receives it: cached results and overrides.
#[derive(Default)]
pub struct DependencyRegistry {
    cache: HashMap<DependencyId, Argument>,
    overrides: HashMap<DependencyId, Override>,
}

impl DependencyRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces `dependency` with `f` until the override is removed.
    pub fn set_override<F, T, E>(&mut self, dependency: &Dependency, f: F)
    where
        F: Fn() -> Result<T, E> + Send + Sync + 'static,
        T: Send + Sync + 'static,
        E: Into<BoxError>,
    {
        let f = move || -> Result<Argument, BoxError> {
            match f() {
                Ok(value) => Ok(Argument::Object(Arc::new(value))),
                Err(e) => Err(e.into()),
            }
        };
        self.overrides.insert(dependency.id(), Arc::new(f));
    }

    pub fn remove_override(&mut self, dependency: &Dependency) {
        self.overrides.remove(&dependency.id());
    }

    /// Removes every override; tests registering overrides call this between cases.
    pub fn clear_overrides(&mut self) {
        self.overrides.clear();
    }

    pub fn has_override(&self, dependency: &Dependency) -> bool {
        self.overrides.contains_key(&dependency.id())
    }

    pub fn cached(&self, dependency: &Dependency) -> Option<&Argument> {
        self.cache.get(&dependency.id())
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    /// Produces the value of `dependency` for the current dispatch.
    pub fn resolve(&mut self, dependency: &Dependency, payload: &Payload<'_>) -> Result<Argument, BindError> {
        if let Some(replacement) = self.overrides.get(&dependency.id()) {
            debug!(dependency = dependency.name(), "resolving override");
            let replacement = Arc::clone(replacement);
            return replacement().map_err(|source| BindError::Dependency { name: dependency.name().to_owned(), source });
        }

        if dependency.use_cache()
            && let Some(value) = self.cache.get(&dependency.id())
        {
            debug!(dependency = dependency.name(), "resolving from cache");
            return Ok(value.clone());
        }

        let mut args = bind_dependency(dependency.params(), payload, self)?;
        let value = dependency
            .provide(&mut args)
            .map_err(|source| BindError::Dependency { name: dependency.name().to_owned(), source })?;

        if dependency.use_cache() {
            debug!(dependency = dependency.name(), "caching dependency");
            self.cache.insert(dependency.id(), value.clone());
        }
        Ok(value)
    }
}

impl fmt::Debug for DependencyRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DependencyRegistry")
            .field("cached", &self.cache.len())
            .field("overrides", &self.overrides.len())
            .finish()
    }
}
