//! Deferred resolution handles.

use std::fmt;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::container::ServiceContainer;
use crate::error::DiResult;
use crate::token::ServiceToken;

/// A handle that resolves its service on first [`get`](Lazy::get) and caches
/// the result for the handle's lifetime.
///
/// Obtained from [`ServiceContainer::resolve_lazy`]. The underlying service
/// need not be registered yet when the handle is created; only the first
/// `get` performs a real resolution, and clones of a handle share one cached
/// result. Errors are not cached, so a failed `get` can be retried after the
/// registration is fixed.
///
/// [`ServiceContainer::resolve_lazy`]: crate::ServiceContainer::resolve_lazy
///
/// # Examples
///
/// ```rust
/// use lattice_di::{ServiceContainer, ServiceToken};
///
/// struct ReportEngine {
///     templates: usize,
/// }
/// static REPORTS: ServiceToken<ReportEngine> = ServiceToken::new("app.reports");
///
/// let container = ServiceContainer::new();
/// let lazy = container.resolve_lazy(&REPORTS)?;
/// assert!(!lazy.is_initialized());
///
/// container.register_singleton(&REPORTS, || ReportEngine { templates: 12 })?;
/// assert_eq!(lazy.get()?.templates, 12);
/// assert!(lazy.is_initialized());
/// # Ok::<(), lattice_di::DiError>(())
/// ```
pub struct Lazy<T: Send + Sync + 'static> {
    inner: Arc<LazyInner<T>>,
}

struct LazyInner<T: Send + Sync + 'static> {
    container: ServiceContainer,
    token: ServiceToken<T>,
    cell: OnceCell<Arc<T>>,
}

impl<T: Send + Sync + 'static> Lazy<T> {
    pub(crate) fn new(container: ServiceContainer, token: ServiceToken<T>) -> Self {
        Self {
            inner: Arc::new(LazyInner {
                container,
                token,
                cell: OnceCell::new(),
            }),
        }
    }

    /// Resolves on first call, then returns the cached instance.
    pub fn get(&self) -> DiResult<Arc<T>> {
        self.inner
            .cell
            .get_or_try_init(|| self.inner.container.resolve(&self.inner.token))
            .map(Arc::clone)
    }

    /// True once a `get` has succeeded on this handle or any clone of it.
    pub fn is_initialized(&self) -> bool {
        self.inner.cell.get().is_some()
    }

    pub fn token(&self) -> &ServiceToken<T> {
        &self.inner.token
    }
}

impl<T: Send + Sync + 'static> Clone for Lazy<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: Send + Sync + 'static> fmt::Debug for Lazy<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lazy")
            .field("token", &self.inner.token.name())
            .field("initialized", &self.is_initialized())
            .finish()
    }
}
