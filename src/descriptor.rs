//! Service descriptors for introspection and diagnostics.

use std::time::SystemTime;

use crate::lifetime::Lifetime;
use crate::token::TokenMetadata;

/// Which kind of implementation backs a registration.
///
/// A descriptor carries exactly one of the three; the enum makes any other
/// state unrepresentable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// A no-argument constructor function.
    Constructor,
    /// A factory receiving the container to resolve its own dependencies.
    Factory,
    /// A pre-built instance handed over at registration time.
    Instance,
}

/// One registration record.
///
/// Descriptors are bookkeeping: they describe what was registered, when, and
/// how it will be provided, for use by registry queries and container
/// diagnostics. They never participate in instantiation. A descriptor is
/// replaced wholesale when its token is re-registered and removed on
/// [`clear`](crate::ServiceRegistry::clear).
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Lifetime, ProviderKind, ServiceRegistry, ServiceToken};
///
/// struct Exporter;
/// static EXPORTER: ServiceToken<Exporter> = ServiceToken::new("app.exporter");
///
/// let mut registry = ServiceRegistry::new();
/// registry.register_transient(&EXPORTER, || Exporter).unwrap();
///
/// let descriptor = registry.get_descriptor(&EXPORTER).unwrap();
/// assert_eq!(descriptor.name, "app.exporter");
/// assert_eq!(descriptor.lifetime, Lifetime::Transient);
/// assert_eq!(descriptor.kind, ProviderKind::Constructor);
/// assert!(descriptor.scope_kind.is_none());
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDescriptor {
    /// Name of the owning token.
    pub name: &'static str,
    /// Lifetime fixed at registration time.
    pub lifetime: Lifetime,
    /// Implementation kind.
    pub kind: ProviderKind,
    /// Scope kind declared at `register_scoped` time ("Request", ...).
    /// `None` for non-scoped registrations.
    pub scope_kind: Option<&'static str>,
    /// When the registration was made.
    pub registered_at: SystemTime,
    /// Copy of the token's metadata at registration time.
    pub metadata: TokenMetadata,
}

impl ServiceDescriptor {
    pub(crate) fn new(
        name: &'static str,
        lifetime: Lifetime,
        kind: ProviderKind,
        scope_kind: Option<&'static str>,
        metadata: TokenMetadata,
    ) -> Self {
        Self {
            name,
            lifetime,
            kind,
            scope_kind,
            registered_at: SystemTime::now(),
            metadata,
        }
    }

    /// True if the token was flagged deprecated.
    pub fn is_deprecated(&self) -> bool {
        self.metadata.deprecated
    }

    /// True if the token metadata carries `tag`.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.metadata.has_tag(tag)
    }
}
