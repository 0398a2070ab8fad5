//! Error types for the dependency injection container.

use std::fmt;

/// Dependency injection errors.
///
/// Every precondition violation in this crate raises synchronously through
/// this enum; nothing silently no-ops. The only sanctioned soft path is
/// [`try_resolve`](crate::ServiceContainer::try_resolve), which maps the
/// single `NotFound` case to `Ok(None)` and still propagates everything else.
///
/// # Examples
///
/// ```rust
/// use lattice_di::{DiError, ServiceContainer, ServiceToken};
///
/// #[derive(Debug)]
/// struct Missing;
/// static MISSING: ServiceToken<Missing> = ServiceToken::new("app.missing");
///
/// let container = ServiceContainer::new();
/// match container.resolve(&MISSING) {
///     Err(DiError::NotFound(name)) => assert_eq!(name, "app.missing"),
///     other => panic!("unexpected: {other:?}"),
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiError {
    /// Operation attempted on a disposed container.
    Disposed,
    /// No registration exists for the token name.
    NotFound(&'static str),
    /// The stored instance could not be downcast to the token's type. Happens
    /// only when two tokens share a name but disagree on the service type.
    TypeMismatch(&'static str),
    /// Registration rejected before any state changed.
    InvalidRegistration(&'static str),
    /// `create_scope` called with an id that is already live.
    ScopeAlreadyExists(String),
    /// Scope id was never created, or was disposed and not recreated.
    ScopeNotFound(String),
    /// A scoped service was resolved with no ambient current scope set.
    NoCurrentScope(&'static str),
    /// A token was re-entered while its own construction was in flight.
    /// Carries the resolution path ending in the repeated name.
    Circular(Vec<&'static str>),
    /// The resolution stack exceeded the recursion limit.
    DepthExceeded(usize),
}

impl fmt::Display for DiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DiError::Disposed => {
                f.write_str("container is disposed; registration and resolution are unavailable")
            }
            DiError::NotFound(name) => write!(f, "service not found: {}", name),
            DiError::TypeMismatch(name) => write!(f, "type mismatch for: {}", name),
            DiError::InvalidRegistration(reason) => write!(f, "invalid registration: {}", reason),
            DiError::ScopeAlreadyExists(id) => write!(f, "scope '{}' already exists", id),
            DiError::ScopeNotFound(id) => write!(f, "scope '{}' does not exist", id),
            DiError::NoCurrentScope(name) => write!(
                f,
                "cannot resolve scoped service '{}': no current scope set",
                name
            ),
            DiError::Circular(path) => {
                write!(f, "circular dependency: {}", path.join(" -> "))
            }
            DiError::DepthExceeded(depth) => write!(f, "max resolution depth {} exceeded", depth),
        }
    }
}

impl std::error::Error for DiError {}

/// Result type for DI operations.
pub type DiResult<T> = Result<T, DiError>;
