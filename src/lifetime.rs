//! Service lifetime definitions.

use std::fmt;

/// Service lifetimes controlling instance caching behavior.
///
/// A lifetime is fixed at registration time and governs how many live
/// instances exist and when they are shared versus fresh.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{Lifetime, ServiceContainer, ServiceToken};
///
/// struct Session { id: u32 }
///
/// static SESSION: ServiceToken<Session> = ServiceToken::new("app.session");
///
/// let container = ServiceContainer::new();
/// container.register_scoped(&SESSION, || Session { id: 7 }, "Request").unwrap();
///
/// let descriptor = container.describe(&SESSION).unwrap();
/// assert_eq!(descriptor.lifetime, Lifetime::Scoped);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// One instance per container, created on first resolution and reused
    /// forever.
    Singleton,
    /// One instance per (token, scope) pair, discarded when the scope is
    /// disposed. Requires an ambient current scope at resolution time.
    Scoped,
    /// A fresh instance on every resolution, never cached.
    Transient,
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Singleton => f.write_str("singleton"),
            Lifetime::Scoped => f.write_str("scoped"),
            Lifetime::Transient => f.write_str("transient"),
        }
    }
}
