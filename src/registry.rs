//! Descriptor and instance-cache storage.
//!
//! The registry is pure bookkeeping: it owns the descriptor table, the
//! singleton and per-scope instance caches, and the registration order, and
//! answers queries over them. It never instantiates anything — lifetime
//! policy lives in [`ServiceContainer`](crate::ServiceContainer).

use std::any::Any;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::SystemTime;

use once_cell::sync::OnceCell;

use crate::container::ServiceContainer;
use crate::descriptor::{ProviderKind, ServiceDescriptor};
use crate::error::{DiError, DiResult};
use crate::lifetime::Lifetime;
use crate::token::ServiceToken;

/// Type-erased shared instance.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

/// Type-erased provider invoked by the container during resolution.
pub(crate) type CtorFn = Arc<dyn Fn(&ServiceContainer) -> DiResult<AnyArc> + Send + Sync>;

/// Stored registration: the public descriptor, the erased provider, and the
/// singleton instance slot.
///
/// The slot is a shared `OnceCell` so a singleton constructor runs exactly
/// once even when resolvers race: the cell blocks concurrent initializers
/// while the winner builds, with no registry lock held.
#[derive(Clone)]
pub(crate) struct Registration {
    pub(crate) descriptor: ServiceDescriptor,
    pub(crate) ctor: CtorFn,
    pub(crate) singleton: Arc<OnceCell<AnyArc>>,
}

/// AND-combined search criteria for [`ServiceRegistry::find_services`].
///
/// Every filter left unset matches all descriptors.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{FindCriteria, Lifetime, ServiceRegistry, ServiceToken, TokenMetadata};
///
/// struct Renderer;
/// static RENDERER: ServiceToken<Renderer> = ServiceToken::with_metadata(
///     "app.renderer",
///     TokenMetadata::new().with_tags(&["graphics"]),
/// );
///
/// let mut registry = ServiceRegistry::new();
/// registry.register_singleton(&RENDERER, || Renderer).unwrap();
///
/// let criteria = FindCriteria::new()
///     .with_lifetime(Lifetime::Singleton)
///     .with_tag("graphics");
/// let found = registry.find_services(&criteria);
/// assert_eq!(found.len(), 1);
/// assert_eq!(found[0].name, "app.renderer");
/// ```
#[derive(Debug, Clone, Default)]
pub struct FindCriteria {
    lifetime: Option<Lifetime>,
    tag: Option<&'static str>,
    deprecated: Option<bool>,
    registered_after: Option<SystemTime>,
}

impl FindCriteria {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = Some(lifetime);
        self
    }

    pub fn with_tag(mut self, tag: &'static str) -> Self {
        self.tag = Some(tag);
        self
    }

    pub fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = Some(deprecated);
        self
    }

    pub fn registered_after(mut self, at: SystemTime) -> Self {
        self.registered_after = Some(at);
        self
    }

    fn matches(&self, descriptor: &ServiceDescriptor) -> bool {
        if let Some(lifetime) = self.lifetime {
            if descriptor.lifetime != lifetime {
                return false;
            }
        }
        if let Some(tag) = self.tag {
            if !descriptor.has_tag(tag) {
                return false;
            }
        }
        if let Some(deprecated) = self.deprecated {
            if descriptor.is_deprecated() != deprecated {
                return false;
            }
        }
        if let Some(at) = self.registered_after {
            if descriptor.registered_at <= at {
                return false;
            }
        }
        true
    }
}

/// Descriptor counts reported by [`ServiceRegistry::statistics`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryStatistics {
    pub total: usize,
    pub singletons: usize,
    pub scoped: usize,
    pub transients: usize,
    pub registration_order_len: usize,
}

/// Storage and lookup of service registrations and cached instances.
///
/// Most code interacts with the registry indirectly through a
/// [`ServiceContainer`](crate::ServiceContainer), which wraps one and layers
/// resolution policy, scoping, and metrics on top. Using a registry directly
/// is useful for inspection, pre-building a configuration, or forking via
/// [`copy_to`](ServiceRegistry::copy_to).
pub struct ServiceRegistry {
    registrations: HashMap<&'static str, Registration>,
    scoped: HashMap<(&'static str, String), AnyArc>,
    order: Vec<&'static str>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self {
            registrations: HashMap::new(),
            scoped: HashMap::new(),
            order: Vec::new(),
        }
    }

    // ----- Registration -----

    /// Registers a no-argument constructor with singleton lifetime.
    pub fn register_singleton<T, C>(&mut self, token: &ServiceToken<T>, ctor: C) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        let erased: CtorFn = Arc::new(move |_| Ok(Arc::new(ctor()) as AnyArc));
        self.insert(
            token,
            Lifetime::Singleton,
            ProviderKind::Constructor,
            None,
            erased,
        )
    }

    /// Registers a no-argument constructor with transient lifetime.
    pub fn register_transient<T, C>(&mut self, token: &ServiceToken<T>, ctor: C) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        let erased: CtorFn = Arc::new(move |_| Ok(Arc::new(ctor()) as AnyArc));
        self.insert(
            token,
            Lifetime::Transient,
            ProviderKind::Constructor,
            None,
            erased,
        )
    }

    /// Registers a no-argument constructor with scoped lifetime.
    ///
    /// `scope_kind` is a descriptive label for the kind of scope the service
    /// is meant to live in ("Request", "Session", ...); instance caching is
    /// keyed by the ambient scope id active at resolution time.
    pub fn register_scoped<T, C>(
        &mut self,
        token: &ServiceToken<T>,
        ctor: C,
        scope_kind: &'static str,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        C: Fn() -> T + Send + Sync + 'static,
    {
        if scope_kind.is_empty() {
            return Err(DiError::InvalidRegistration("scope kind must not be empty"));
        }
        let erased: CtorFn = Arc::new(move |_| Ok(Arc::new(ctor()) as AnyArc));
        self.insert(
            token,
            Lifetime::Scoped,
            ProviderKind::Constructor,
            Some(scope_kind),
            erased,
        )
    }

    /// Registers a factory receiving the container, with the given lifetime.
    pub fn register_factory<T, F>(
        &mut self,
        token: &ServiceToken<T>,
        factory: F,
        lifetime: Lifetime,
    ) -> DiResult<()>
    where
        T: Send + Sync + 'static,
        F: Fn(&ServiceContainer) -> T + Send + Sync + 'static,
    {
        let erased: CtorFn = Arc::new(move |c| Ok(Arc::new(factory(c)) as AnyArc));
        self.insert(token, lifetime, ProviderKind::Factory, None, erased)
    }

    /// Registers a pre-built instance. The stored value is returned with
    /// stable identity on every resolution.
    pub fn register_instance<T>(&mut self, token: &ServiceToken<T>, value: T) -> DiResult<()>
    where
        T: Send + Sync + 'static,
    {
        let instance: AnyArc = Arc::new(value);
        let stored = instance.clone();
        let erased: CtorFn = Arc::new(move |_| Ok(stored.clone()));
        self.insert(
            token,
            Lifetime::Singleton,
            ProviderKind::Instance,
            None,
            erased,
        )?;
        // Seed the slot so resolution is a pure lookup.
        if let Some(registration) = self.registrations.get(token.name()) {
            let _ = registration.singleton.set(instance);
        }
        Ok(())
    }

    fn insert<T>(
        &mut self,
        token: &ServiceToken<T>,
        lifetime: Lifetime,
        kind: ProviderKind,
        scope_kind: Option<&'static str>,
        ctor: CtorFn,
    ) -> DiResult<()> {
        let name = token.name();
        if name.is_empty() {
            return Err(DiError::InvalidRegistration("token name must not be empty"));
        }
        // A superseded descriptor must not leave stale instances behind;
        // the fresh OnceCell drops the old singleton slot.
        self.scoped.retain(|(n, _), _| *n != name);

        let descriptor = ServiceDescriptor::new(name, lifetime, kind, scope_kind, *token.metadata());
        if !self.registrations.contains_key(name) {
            self.order.push(name);
        }
        self.registrations.insert(
            name,
            Registration {
                descriptor,
                ctor,
                singleton: Arc::new(OnceCell::new()),
            },
        );
        Ok(())
    }

    // ----- Lookup -----

    pub fn is_registered<T>(&self, token: &ServiceToken<T>) -> bool {
        self.registrations.contains_key(token.name())
    }

    /// The descriptor for `token`, or `None` when absent (never an error).
    pub fn get_descriptor<T>(&self, token: &ServiceToken<T>) -> Option<&ServiceDescriptor> {
        self.descriptor_by_name(token.name())
    }

    pub fn descriptor_by_name(&self, name: &str) -> Option<&ServiceDescriptor> {
        self.registrations.get(name).map(|r| &r.descriptor)
    }

    pub(crate) fn registration(&self, name: &str) -> Option<&Registration> {
        self.registrations.get(name)
    }

    // ----- Instance caches -----

    pub(crate) fn scoped_instance(&self, name: &'static str, scope_id: &str) -> Option<AnyArc> {
        self.scoped.get(&(name, scope_id.to_owned())).cloned()
    }

    pub(crate) fn set_scoped_instance(
        &mut self,
        name: &'static str,
        scope_id: &str,
        value: AnyArc,
    ) {
        self.scoped.insert((name, scope_id.to_owned()), value);
    }

    /// Evicts all cached instances for `scope_id`. Registrations persist;
    /// only the live instances are forgotten.
    pub fn clear_scoped_instances(&mut self, scope_id: &str) {
        self.scoped.retain(|(_, s), _| s.as_str() != scope_id);
    }

    pub(crate) fn evict_all_instances(&mut self) {
        for registration in self.registrations.values_mut() {
            registration.singleton = Arc::new(OnceCell::new());
        }
        self.scoped.clear();
    }

    // ----- Queries -----

    /// Token names in registration order. Re-registration keeps a token's
    /// original position.
    pub fn registered_services(&self) -> Vec<&'static str> {
        self.order.clone()
    }

    pub fn services_by_lifetime(&self, lifetime: Lifetime) -> Vec<&'static str> {
        self.order
            .iter()
            .copied()
            .filter(|name| {
                self.registrations
                    .get(name)
                    .is_some_and(|r| r.descriptor.lifetime == lifetime)
            })
            .collect()
    }

    pub fn services_by_tag(&self, tag: &str) -> Vec<&'static str> {
        self.order
            .iter()
            .copied()
            .filter(|name| {
                self.registrations
                    .get(name)
                    .is_some_and(|r| r.descriptor.has_tag(tag))
            })
            .collect()
    }

    /// Descriptors matching every provided criterion, in registration order.
    pub fn find_services(&self, criteria: &FindCriteria) -> Vec<&ServiceDescriptor> {
        self.order
            .iter()
            .filter_map(|name| self.registrations.get(name).map(|r| &r.descriptor))
            .filter(|d| criteria.matches(d))
            .collect()
    }

    // ----- Dependency graph diagnostics -----

    /// Scans declared metadata dependency names for cycles.
    ///
    /// Pure graph traversal over descriptor metadata; no instances are
    /// created. Each cycle is reported once as a name path ending in the
    /// repeated name, e.g. `["a", "b", "a"]`.
    pub fn detect_circular_dependencies(&self) -> Vec<Vec<&'static str>> {
        let mut cycles = Vec::new();
        let mut seen = HashSet::new();
        for &start in &self.order {
            let mut path = Vec::new();
            self.walk_cycles(start, &mut path, &mut cycles, &mut seen);
        }
        cycles
    }

    fn walk_cycles(
        &self,
        node: &'static str,
        path: &mut Vec<&'static str>,
        cycles: &mut Vec<Vec<&'static str>>,
        seen: &mut HashSet<Vec<&'static str>>,
    ) {
        if let Some(pos) = path.iter().position(|&n| n == node) {
            let body = &path[pos..];
            // Canonicalize by rotating the smallest name first so each cycle
            // is reported once regardless of entry point.
            let min = body
                .iter()
                .enumerate()
                .min_by_key(|&(_, n)| n)
                .map(|(i, _)| i)
                .unwrap_or(0);
            let mut canonical: Vec<&'static str> =
                body[min..].iter().chain(body[..min].iter()).copied().collect();
            if seen.insert(canonical.clone()) {
                canonical.push(canonical[0]);
                cycles.push(canonical);
            }
            return;
        }
        let Some(registration) = self.registrations.get(node) else {
            return;
        };
        path.push(node);
        for &dep in registration.descriptor.metadata.dependencies {
            self.walk_cycles(dep, path, cycles, seen);
        }
        path.pop();
    }

    /// Expands the transitive dependency-name closure of `name` for
    /// diagnostic display: preorder, root first, each name once. Names that
    /// are declared but unregistered still appear as leaves. Unknown roots
    /// yield an empty sequence.
    pub fn dependency_tree(&self, name: &str) -> Vec<&'static str> {
        let Some((&root, _)) = self.registrations.get_key_value(name) else {
            return Vec::new();
        };
        let mut out = Vec::new();
        let mut visited = HashSet::new();
        self.expand_tree(root, &mut visited, &mut out);
        out
    }

    fn expand_tree(
        &self,
        node: &'static str,
        visited: &mut HashSet<&'static str>,
        out: &mut Vec<&'static str>,
    ) {
        if !visited.insert(node) {
            return;
        }
        out.push(node);
        if let Some(registration) = self.registrations.get(node) {
            for &dep in registration.descriptor.metadata.dependencies {
                self.expand_tree(dep, visited, out);
            }
        }
    }

    // ----- Maintenance -----

    /// Drops all descriptors, every cached instance, and the registration
    /// order.
    pub fn clear(&mut self) {
        self.registrations.clear();
        self.scoped.clear();
        self.order.clear();
    }

    /// Copies descriptors and singleton instances (not scoped instances)
    /// into `other`, overwriting same-name registrations there. Used for
    /// container forking and test setups.
    pub fn copy_to(&self, other: &mut ServiceRegistry) {
        for &name in &self.order {
            let Some(registration) = self.registrations.get(name) else {
                continue;
            };
            if !other.registrations.contains_key(name) {
                other.order.push(name);
            }
            other.scoped.retain(|(n, _), _| *n != name);
            // A fresh slot seeded with the current instance, if any: the two
            // registries must not share future initialization.
            let singleton = Arc::new(OnceCell::new());
            if let Some(instance) = registration.singleton.get() {
                let _ = singleton.set(instance.clone());
            }
            other.registrations.insert(
                name,
                Registration {
                    descriptor: registration.descriptor.clone(),
                    ctor: registration.ctor.clone(),
                    singleton,
                },
            );
        }
    }

    pub fn statistics(&self) -> RegistryStatistics {
        let mut singletons = 0;
        let mut scoped = 0;
        let mut transients = 0;
        for registration in self.registrations.values() {
            match registration.descriptor.lifetime {
                Lifetime::Singleton => singletons += 1,
                Lifetime::Scoped => scoped += 1,
                Lifetime::Transient => transients += 1,
            }
        }
        RegistryStatistics {
            total: self.registrations.len(),
            singletons,
            scoped,
            transients,
            registration_order_len: self.order.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

impl Default for ServiceRegistry {
    fn default() -> Self {
        Self::new()
    }
}
