//! # lattice-di
//!
//! A token-keyed dependency injection container for Rust with lifetime
//! management, named scopes, lazy resolution, and built-in diagnostics.
//!
//! Services are identified by [`ServiceToken`]s, typed constants that pair a
//! unique name with the concrete service type. Registration binds a token to
//! a provider under a [`Lifetime`]; resolution returns `Arc<T>` handles with
//! the caching behavior that lifetime demands.
//!
//! ## Quick start
//!
//! ```rust
//! use std::sync::Arc;
//! use lattice_di::{Lifetime, ServiceContainer, ServiceToken};
//!
//! struct Database {
//!     dsn: String,
//! }
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! static DATABASE: ServiceToken<Database> = ServiceToken::new("app.database");
//! static USERS: ServiceToken<UserService> = ServiceToken::new("app.users");
//!
//! let container = ServiceContainer::new();
//! container.register_instance(&DATABASE, Database { dsn: "postgres://db".into() })?;
//! container.register_factory(
//!     &USERS,
//!     |c| UserService { db: c.resolve(&DATABASE).unwrap() },
//!     Lifetime::Singleton,
//! )?;
//!
//! let users = container.resolve(&USERS)?;
//! assert_eq!(users.db.dsn, "postgres://db");
//! # Ok::<(), lattice_di::DiError>(())
//! ```
//!
//! ## Lifetimes
//!
//! * [`Lifetime::Singleton`]: one instance per container, shared.
//! * [`Lifetime::Scoped`]: one instance per named scope; requires an ambient
//!   current scope set via [`ServiceContainer::set_current_scope`].
//! * [`Lifetime::Transient`]: a fresh instance on every resolution.
//!
//! ## Thread safety
//!
//! Containers are `Send + Sync` and cheap to clone; clones share state.
//! Singleton and scoped instances are created at most once per cache slot
//! even under concurrent resolution, and providers run without any internal
//! lock held so they may resolve their own dependencies.

pub mod container;
pub mod descriptor;
pub mod diagnostics;
pub mod error;
pub mod lazy;
pub mod lifetime;
pub mod metrics;
pub mod registry;
pub mod token;

mod internal;

pub use container::ServiceContainer;
pub use descriptor::{ProviderKind, ServiceDescriptor};
pub use diagnostics::{ContainerDiagnostics, DebugInfo};
pub use error::{DiError, DiResult};
pub use lazy::Lazy;
pub use lifetime::Lifetime;
pub use metrics::{DebugEvent, MetricsSnapshot};
pub use registry::{FindCriteria, RegistryStatistics, ServiceRegistry};
pub use token::{ServiceToken, TokenMetadata};
