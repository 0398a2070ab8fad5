//! The service container: registration, resolution, scopes, and disposal.

use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::time::SystemTime;

use once_cell::sync::OnceCell;
use tracing::debug;

use crate::descriptor::ServiceDescriptor;
use crate::diagnostics::{ContainerDiagnostics, DebugInfo};
use crate::error::{DiError, DiResult};
use crate::internal::with_cycle_guard;
use crate::lazy::Lazy;
use crate::lifetime::Lifetime;
use crate::metrics::{ContainerMetrics, MetricsSnapshot};
use crate::registry::{AnyArc, CtorFn, FindCriteria, ServiceRegistry};
use crate::token::ServiceToken;

static NEXT_CONTAINER_ID: AtomicU64 = AtomicU64::new(1);

/// Named scopes known to a container, plus the ambient current one.
#[derive(Default)]
struct ScopeSet {
    created: HashSet<String>,
    current: Option<String>,
}

struct ContainerInner {
    id: String,
    created_at: SystemTime,
    registry: RwLock<ServiceRegistry>,
    scopes: Mutex<ScopeSet>,
    metrics: ContainerMetrics,
    disposed: AtomicBool,
    debug: AtomicBool,
    // Latches true once debug mode has been on; gates `debug_info` in
    // diagnostics so a never-debugged container reports `None`.
    debug_ever: AtomicBool,
}

/// Thread-safe service container with lifetime-aware resolution.
///
/// Cloning a container is cheap and yields a second handle to the same
/// underlying state; use [`fork`](ServiceContainer::fork) for an independent
/// copy.
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use lattice_di::{ServiceContainer, ServiceToken};
///
/// struct Config {
///     url: String,
/// }
/// struct Client {
///     url: String,
/// }
///
/// static CONFIG: ServiceToken<Config> = ServiceToken::new("app.config");
/// static CLIENT: ServiceToken<Client> = ServiceToken::new("app.client");
///
/// let container = ServiceContainer::new();
/// container.register_instance(&CONFIG, Config { url: "https://api".into() })?;
/// container.register_factory(&CLIENT, |c| {
///     let config = c.resolve(&CONFIG).unwrap();
///     Client { url: config.url.clone() }
/// }, lattice_di::Lifetime::Singleton)?;
///
/// let client = container.resolve(&CLIENT)?;
/// assert_eq!(client.url, "https://api");
/// let again = container.resolve(&CLIENT)?;
/// assert!(Arc::ptr_eq(&client, &again));
/// # Ok::<(), lattice_di::DiError>(())
/// ```
pub struct ServiceContainer {
    inner: Arc<ContainerInner>,
}

/// Where a freshly built instance lands.
enum CacheSlot {
    None,
    Singleton(Arc<OnceCell<AnyArc>>),
    Scoped(String),
}

/// Outcome of the read-locked planning phase of a resolution.
enum Plan {
    Hit(AnyArc),
    Build { ctor: CtorFn, slot: CacheSlot },
}

impl ServiceContainer {
    pub fn new() -> Self {
        Self::from_registry(ServiceRegistry::new())
    }

    /// Wraps an already-populated registry.
    pub fn from_registry(registry: ServiceRegistry) -> Self {
        let n = NEXT_CONTAINER_ID.fetch_add(1, Ordering::Relaxed);
        let inner = ContainerInner {
            id: format!("container-{}", n),
            created_at: SystemTime::now(),
            registry: RwLock::new(registry),
            scopes: Mutex::new(ScopeSet::default()),
            metrics: ContainerMetrics::new(),
            disposed: AtomicBool::new(false),
            debug: AtomicBool::new(false),
            debug_ever: AtomicBool::new(false),
        };
        let container = Self {
            inner: Arc::new(inner),
        };
        container
            .inner
            .metrics
            .set_total_services(container.registry_read().len());
        container
    }

    pub fn container_id(&self) -> &str {
        &self.inner.id
    }

    fn registry_read(&self) -> RwLockReadGuard<'_, ServiceRegistry> {
        self.inner.registry.read().unwrap_or_else(|e| e.into_inner())
    }

    fn registry_write(&self) -> RwLockWriteGuard<'_, ServiceRegistry> {
        self.inner.registry.write().unwrap_or_else(|e| e.into_inner())
    }

    fn scopes_lock(&self) -> MutexGuard<'_, ScopeSet> {
        self.inner.scopes.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn ensure_active(&self) -> DiResult<()> {
        if self.inner.disposed.load(Ordering::Acquire) {
            Err(DiError::Disposed)
        } else {
            Ok(())
        }
    }

    fn debug_enabled(&self) -> bool {
        self.inner.debug.load(Ordering::Relaxed)
    }

    fn after_registration(&self, name: &'static str, lifetime: Lifetime, count: usize) {
        self.inner.metrics.set_total_services(count);
        self.inner
            .metrics
            .record_registration(name, self.debug_enabled());
        debug!(service = name, lifetime = %lifetime, container = %self.inner.id, "registered service");
    }

    // ----- Registration -----

    /// Registers a constructor whose single product is shared by every
    /// resolver of `token`. Re-registering a token replaces its provider and
    /// discards any instance the old one produced.
    pub fn register_singleton<T, C>(&self, token: &ServiceToken<T>, ctor: C) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        self.ensure_active()?;
        let count = {
            let mut registry = self.registry_write();
            registry.register_singleton(token, ctor)?;
            registry.len()
        };
        self.after_registration(token.name(), Lifetime::Singleton, count);
        Ok(())
    }

    /// Registers a constructor invoked anew on every resolution.
    pub fn register_transient<T, C>(&self, token: &ServiceToken<T>, ctor: C) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        self.ensure_active()?;
        let count = {
            let mut registry = self.registry_write();
            registry.register_transient(token, ctor)?;
            registry.len()
        };
        self.after_registration(token.name(), Lifetime::Transient, count);
        Ok(())
    }

    /// Registers a constructor cached per named scope. Resolution requires
    /// an ambient current scope; distinct scopes get distinct instances.
    pub fn register_scoped<T, C>(
        &self,
        token: &ServiceToken<T>,
        ctor: C,
        scope_kind: &'static str,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        self.ensure_active()?;
        let count = {
            let mut registry = self.registry_write();
            registry.register_scoped(token, ctor, scope_kind)?;
            registry.len()
        };
        self.after_registration(token.name(), Lifetime::Scoped, count);
        Ok(())
    }

    /// Registers a factory that receives the container, so it can resolve
    /// its own dependencies, with an explicit lifetime.
    pub fn register_factory<T, F>(
        &self,
        token: &ServiceToken<T>,
        factory: F,
        lifetime: Lifetime,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> T + Send + Sync + 'static,
    {
        self.ensure_active()?;
        let count = {
            let mut registry = self.registry_write();
            registry.register_factory(token, factory, lifetime)?;
            registry.len()
        };
        self.after_registration(token.name(), lifetime, count);
        Ok(())
    }

    /// Registers a pre-built value; resolutions return it with stable
    /// identity.
    pub fn register_instance<T>(&self, token: &ServiceToken<T>, value: T) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        self.ensure_active()?;
        let count = {
            let mut registry = self.registry_write();
            registry.register_instance(token, value)?;
            registry.len()
        };
        self.after_registration(token.name(), Lifetime::Singleton, count);
        Ok(())
    }

    /// Registers a singleton whose constructor is intended to be driven
    /// through [`resolve_lazy`](ServiceContainer::resolve_lazy). Storage is
    /// identical to [`register_singleton`](ServiceContainer::register_singleton);
    /// the deferral lives in the [`Lazy`] handle.
    pub fn register_lazy<T, C>(&self, token: &ServiceToken<T>, ctor: C) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        self.register_singleton(token, ctor)
    }

    // ----- Resolution -----

    /// Resolves `token` according to its registered lifetime.
    ///
    /// Singletons and scoped services are built at most once per cache slot
    /// even under concurrent resolution; transients are built every call.
    /// Factories run with no internal lock held, so they may resolve other
    /// services freely. Cycles among factories are detected per thread and
    /// reported as [`DiError::Circular`] with the full token path.
    pub fn resolve<T>(&self, token: &ServiceToken<T>) -> DiResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.ensure_active()?;
        let name = token.name();
        let any = match with_cycle_guard(name, || self.resolve_erased(name)) {
            Ok(any) => any,
            Err(e) => {
                debug!(service = name, error = %e, container = %self.inner.id, "resolution failed");
                return Err(e);
            }
        };
        let instance = any
            .downcast::<T>()
            .map_err(|_| DiError::TypeMismatch(name))?;
        self.inner
            .metrics
            .record_resolution(name, self.debug_enabled());
        Ok(instance)
    }

    /// Like [`resolve`](ServiceContainer::resolve) but maps a missing
    /// registration to `Ok(None)`. Every other failure still surfaces as an
    /// error.
    pub fn try_resolve<T>(&self, token: &ServiceToken<T>) -> DiResult<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
    {
        match self.resolve(token) {
            Ok(instance) => Ok(Some(instance)),
            Err(DiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Returns a [`Lazy`] handle that defers resolution to its first `get`.
    /// `token` need not be registered yet.
    pub fn resolve_lazy<T>(&self, token: &ServiceToken<T>) -> DiResult<Lazy<T>>
    where
        T: Send + Sync + 'static,
    {
        self.ensure_active()?;
        Ok(Lazy::new(self.clone(), *token))
    }

    fn resolve_erased(&self, name: &'static str) -> DiResult<AnyArc> {
        let plan = self.plan_resolution(name)?;
        let (ctor, slot) = match plan {
            Plan::Hit(instance) => return Ok(instance),
            Plan::Build { ctor, slot } => (ctor, slot),
        };

        // No registry lock may be held here: the provider can re-enter the
        // container.
        match slot {
            CacheSlot::None => ctor(self),
            CacheSlot::Singleton(cell) => {
                // The cell serializes racing initializers, so the ctor runs
                // exactly once and every resolver sees the winner.
                cell.get_or_try_init(|| ctor(self)).cloned()
            }
            CacheSlot::Scoped(scope_id) => {
                let instance = ctor(self)?;
                let mut registry = self.registry_write();
                // A concurrent resolver may have won the race; keep its
                // instance for identity stability.
                if let Some(existing) = registry.scoped_instance(name, &scope_id) {
                    return Ok(existing);
                }
                registry.set_scoped_instance(name, &scope_id, instance.clone());
                Ok(instance)
            }
        }
    }

    /// Read-locked phase: either finds a cached instance or extracts the
    /// provider and decides where its product will be cached.
    fn plan_resolution(&self, name: &'static str) -> DiResult<Plan> {
        let registry = self.registry_read();
        let Some(registration) = registry.registration(name) else {
            return Err(DiError::NotFound(name));
        };
        match registration.descriptor.lifetime {
            Lifetime::Transient => Ok(Plan::Build {
                ctor: registration.ctor.clone(),
                slot: CacheSlot::None,
            }),
            Lifetime::Singleton => {
                if let Some(instance) = registration.singleton.get() {
                    return Ok(Plan::Hit(instance.clone()));
                }
                Ok(Plan::Build {
                    ctor: registration.ctor.clone(),
                    slot: CacheSlot::Singleton(registration.singleton.clone()),
                })
            }
            Lifetime::Scoped => {
                let ctor = registration.ctor.clone();
                drop(registry);
                let scope_id = self.current_scope_checked(name)?;
                let registry = self.registry_read();
                if let Some(instance) = registry.scoped_instance(name, &scope_id) {
                    return Ok(Plan::Hit(instance));
                }
                Ok(Plan::Build {
                    ctor,
                    slot: CacheSlot::Scoped(scope_id),
                })
            }
        }
    }

    /// The ambient scope id a scoped resolution must use. Never call while
    /// holding the registry lock.
    fn current_scope_checked(&self, service: &'static str) -> DiResult<String> {
        let scopes = self.scopes_lock();
        let Some(current) = scopes.current.clone() else {
            return Err(DiError::NoCurrentScope(service));
        };
        if !scopes.created.contains(&current) {
            return Err(DiError::ScopeNotFound(current));
        }
        Ok(current)
    }

    // ----- Scopes -----

    /// Creates a named scope. Ids are free-form but must be non-empty and
    /// unique among live scopes.
    pub fn create_scope(&self, scope_id: impl Into<String>) -> DiResult<()> {
        self.ensure_active()?;
        let scope_id = scope_id.into();
        if scope_id.is_empty() {
            return Err(DiError::InvalidRegistration("scope id must not be empty"));
        }
        let mut scopes = self.scopes_lock();
        if !scopes.created.insert(scope_id.clone()) {
            return Err(DiError::ScopeAlreadyExists(scope_id));
        }
        drop(scopes);
        debug!(scope = %scope_id, container = %self.inner.id, "created scope");
        Ok(())
    }

    /// Makes `scope_id` the ambient scope for subsequent scoped resolutions
    /// through this container (and all clones of it).
    pub fn set_current_scope(&self, scope_id: &str) -> DiResult<()> {
        self.ensure_active()?;
        let mut scopes = self.scopes_lock();
        if !scopes.created.contains(scope_id) {
            return Err(DiError::ScopeNotFound(scope_id.to_owned()));
        }
        scopes.current = Some(scope_id.to_owned());
        Ok(())
    }

    /// Clears the ambient scope; scoped resolutions fail until a new one is
    /// set.
    pub fn clear_current_scope(&self) {
        self.scopes_lock().current = None;
    }

    pub fn current_scope(&self) -> Option<String> {
        self.scopes_lock().current.clone()
    }

    /// Destroys a scope and evicts its cached instances. A current scope
    /// that is disposed stays current; resolving against it then fails with
    /// [`DiError::ScopeNotFound`].
    pub fn dispose_scope(&self, scope_id: &str) -> DiResult<()> {
        self.ensure_active()?;
        {
            let mut scopes = self.scopes_lock();
            if !scopes.created.remove(scope_id) {
                return Err(DiError::ScopeNotFound(scope_id.to_owned()));
            }
        }
        // Scopes lock released first; registry and scopes locks are never
        // held together.
        self.registry_write().clear_scoped_instances(scope_id);
        debug!(scope = %scope_id, container = %self.inner.id, "disposed scope");
        Ok(())
    }

    pub fn scope_exists(&self, scope_id: &str) -> bool {
        self.scopes_lock().created.contains(scope_id)
    }

    // ----- Introspection -----

    pub fn is_registered<T>(&self, token: &ServiceToken<T>) -> bool {
        self.registry_read().is_registered(token)
    }

    /// A copy of the descriptor for `token`, or `None` when unregistered.
    pub fn describe<T>(&self, token: &ServiceToken<T>) -> Option<ServiceDescriptor> {
        self.registry_read().get_descriptor(token).cloned()
    }

    /// Token names in registration order.
    pub fn registered_services(&self) -> Vec<&'static str> {
        self.registry_read().registered_services()
    }

    pub fn services_by_lifetime(&self, lifetime: Lifetime) -> Vec<&'static str> {
        self.registry_read().services_by_lifetime(lifetime)
    }

    pub fn services_by_tag(&self, tag: &str) -> Vec<&'static str> {
        self.registry_read().services_by_tag(tag)
    }

    /// Descriptor copies matching `criteria`, in registration order.
    pub fn find_services(&self, criteria: &FindCriteria) -> Vec<ServiceDescriptor> {
        self.registry_read()
            .find_services(criteria)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Cycles declared in token metadata. See
    /// [`ServiceRegistry::detect_circular_dependencies`].
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<&'static str>> {
        self.registry_read().detect_circular_dependencies()
    }

    /// Transitive dependency-name expansion of `name`. See
    /// [`ServiceRegistry::dependency_tree`].
    pub fn dependency_tree(&self, name: &str) -> Vec<&'static str> {
        self.registry_read().dependency_tree(name)
    }

    // ----- Forking -----

    /// An independent container with copies of every registration and the
    /// current singleton instances. Scopes, scoped instances, and metrics do
    /// not carry over.
    pub fn fork(&self) -> DiResult<ServiceContainer> {
        self.ensure_active()?;
        let mut registry = ServiceRegistry::new();
        self.registry_read().copy_to(&mut registry);
        Ok(Self::from_registry(registry))
    }

    // ----- Metrics and diagnostics -----

    pub fn metrics(&self) -> MetricsSnapshot {
        self.inner.metrics.snapshot()
    }

    /// Zeroes resolution counters and debug histories.
    pub fn clear_metrics(&self) {
        self.inner.metrics.clear();
    }

    /// Enables or disables per-token counting and event histories. Off by
    /// default; the aggregate resolution counter runs regardless.
    pub fn set_debug_mode(&self, enabled: bool) {
        self.inner.debug.store(enabled, Ordering::Relaxed);
        if enabled {
            self.inner.debug_ever.store(true, Ordering::Relaxed);
        }
    }

    pub fn debug_mode(&self) -> bool {
        self.debug_enabled()
    }

    /// A full diagnostic snapshot. `debug_info` is present only if debug
    /// mode has ever been enabled on this container.
    pub fn diagnostics(&self) -> ContainerDiagnostics {
        let debug_info = if self.inner.debug_ever.load(Ordering::Relaxed) {
            let (registrations, resolutions) = self.inner.metrics.debug_events();
            Some(DebugInfo {
                registrations,
                resolutions,
            })
        } else {
            None
        };
        ContainerDiagnostics {
            container_id: self.inner.id.clone(),
            created_at: self.inner.created_at,
            is_disposed: self.inner.disposed.load(Ordering::Acquire),
            registered_services: self.registry_read().registered_services(),
            metrics: self.inner.metrics.snapshot(),
            debug_info,
        }
    }

    // ----- Disposal -----

    /// Transitions the container to its terminal disposed state: all scopes
    /// are destroyed and every cached instance is released. Descriptors and
    /// metrics remain readable for post-mortem inspection. Idempotent.
    pub fn dispose(&self) {
        if self.inner.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        {
            let mut scopes = self.scopes_lock();
            scopes.created.clear();
            scopes.current = None;
        }
        self.registry_write().evict_all_instances();
        debug!(container = %self.inner.id, "disposed container");
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.load(Ordering::Acquire)
    }
}

impl Clone for ServiceContainer {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for ServiceContainer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceContainer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceContainer")
            .field("id", &self.inner.id)
            .field("services", &self.registry_read().len())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}
