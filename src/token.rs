//! Service interface tokens for registration and lookup.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

/// Optional metadata attached to a [`ServiceToken`].
///
/// Metadata is descriptive only: the container never consults it during
/// resolution. Tags drive registry queries ([`services_by_tag`]), and the
/// dependency-name list feeds the diagnostic cycle scan and dependency-tree
/// expansion ([`detect_circular_dependencies`], [`dependency_tree`]).
///
/// All fields are `'static` so tokens can live in module-level statics.
///
/// [`services_by_tag`]: crate::ServiceRegistry::services_by_tag
/// [`detect_circular_dependencies`]: crate::ServiceRegistry::detect_circular_dependencies
/// [`dependency_tree`]: crate::ServiceRegistry::dependency_tree
///
/// # Examples
///
/// ```rust
/// use lattice_di::{ServiceToken, TokenMetadata};
///
/// struct AudioEngine;
///
/// static AUDIO: ServiceToken<AudioEngine> = ServiceToken::with_metadata(
///     "app.audio",
///     TokenMetadata::new()
///         .with_description("mixer and playback clock")
///         .with_version("2.1")
///         .with_tags(&["media", "realtime"])
///         .with_dependencies(&["app.config"]),
/// );
///
/// assert!(AUDIO.metadata().has_tag("media"));
/// assert_eq!(AUDIO.metadata().dependencies, &["app.config"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenMetadata {
    /// Human-readable summary of the service contract.
    pub description: Option<&'static str>,
    /// Contract version string, free-form.
    pub version: Option<&'static str>,
    /// Tag set used by registry queries. Order is irrelevant.
    pub tags: &'static [&'static str],
    /// Ordered names of other tokens this service declares it depends on.
    pub dependencies: &'static [&'static str],
    /// Marks a contract scheduled for removal.
    pub deprecated: bool,
}

impl TokenMetadata {
    /// Empty metadata.
    pub const fn new() -> Self {
        Self {
            description: None,
            version: None,
            tags: &[],
            dependencies: &[],
            deprecated: false,
        }
    }

    pub const fn with_description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub const fn with_version(mut self, version: &'static str) -> Self {
        self.version = Some(version);
        self
    }

    pub const fn with_tags(mut self, tags: &'static [&'static str]) -> Self {
        self.tags = tags;
        self
    }

    pub const fn with_dependencies(mut self, dependencies: &'static [&'static str]) -> Self {
        self.dependencies = dependencies;
        self
    }

    pub const fn with_deprecated(mut self, deprecated: bool) -> Self {
        self.deprecated = deprecated;
        self
    }

    /// True if `tag` is in the tag set.
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|&t| t == tag)
    }
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self::new()
    }
}

/// Opaque typed handle identifying a service contract.
///
/// A token pairs a unique name with a service type `T`. The name is the sole
/// identity: two tokens with equal names address the same registration slot
/// in any registry they are used with, and re-registering a name overwrites
/// the previous registration. Callers are responsible for keeping names
/// unique within one registry; nothing is enforced across unrelated
/// registries.
///
/// The type parameter is phantom. It ties the token to `T` at compile time so
/// that [`resolve`](crate::ServiceContainer::resolve) returns `Arc<T>`
/// without any caller-side downcasting.
///
/// Tokens are plain `'static` data: create them once in a module-level
/// `static` and pass them by reference.
///
/// # Examples
///
/// ```rust
/// use lattice_di::ServiceToken;
///
/// struct Clock;
///
/// static CLOCK: ServiceToken<Clock> = ServiceToken::new("app.clock");
///
/// assert_eq!(CLOCK.name(), "app.clock");
/// assert_eq!(CLOCK, ServiceToken::<Clock>::new("app.clock"));
/// ```
pub struct ServiceToken<T> {
    name: &'static str,
    metadata: TokenMetadata,
    _marker: PhantomData<fn() -> T>,
}

impl<T> ServiceToken<T> {
    /// Creates a token with empty metadata. No side effects, no registry
    /// interaction.
    pub const fn new(name: &'static str) -> Self {
        Self::with_metadata(name, TokenMetadata::new())
    }

    /// Creates a token carrying metadata.
    pub const fn with_metadata(name: &'static str, metadata: TokenMetadata) -> Self {
        Self {
            name,
            metadata,
            _marker: PhantomData,
        }
    }

    /// The token's unique name.
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub const fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }
}

impl<T> Clone for ServiceToken<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for ServiceToken<T> {}

impl<T> PartialEq for ServiceToken<T> {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}

impl<T> Eq for ServiceToken<T> {}

impl<T> Hash for ServiceToken<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.name.hash(state);
    }
}

impl<T> fmt::Debug for ServiceToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceToken")
            .field("name", &self.name)
            .field("type", &std::any::type_name::<T>())
            .finish()
    }
}

impl<T> fmt::Display for ServiceToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}
