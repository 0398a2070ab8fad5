use std::sync::{Arc, Mutex};

use lattice_di::{DiError, Lifetime, ProviderKind, ServiceContainer, ServiceToken};

struct Counter {
    hits: Mutex<u64>,
}

impl Counter {
    fn new() -> Self {
        Self { hits: Mutex::new(0) }
    }

    fn bump(&self) -> u64 {
        let mut hits = self.hits.lock().unwrap();
        *hits += 1;
        *hits
    }
}

static SHARED_COUNTER: ServiceToken<Counter> = ServiceToken::new("test.counter.shared");
static FRESH_COUNTER: ServiceToken<Counter> = ServiceToken::new("test.counter.fresh");

#[test]
fn singleton_state_is_shared() {
    let container = ServiceContainer::new();
    container
        .register_singleton(&SHARED_COUNTER, Counter::new)
        .unwrap();

    let a = container.resolve(&SHARED_COUNTER).unwrap();
    let b = container.resolve(&SHARED_COUNTER).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(a.bump(), 1);
    assert_eq!(b.bump(), 2);
}

#[test]
fn transient_state_is_isolated() {
    let container = ServiceContainer::new();
    container
        .register_transient(&FRESH_COUNTER, Counter::new)
        .unwrap();

    let a = container.resolve(&FRESH_COUNTER).unwrap();
    let b = container.resolve(&FRESH_COUNTER).unwrap();
    assert!(!Arc::ptr_eq(&a, &b));
    assert_eq!(a.bump(), 1);
    assert_eq!(b.bump(), 1);
}

#[test]
fn instance_registration_keeps_identity() {
    struct Config {
        name: &'static str,
    }
    static CONFIG: ServiceToken<Config> = ServiceToken::new("test.config");

    let container = ServiceContainer::new();
    container
        .register_instance(&CONFIG, Config { name: "prod" })
        .unwrap();

    let a = container.resolve(&CONFIG).unwrap();
    let b = container.resolve(&CONFIG).unwrap();
    assert_eq!(a.name, "prod");
    assert!(Arc::ptr_eq(&a, &b));

    let descriptor = container.describe(&CONFIG).unwrap();
    assert_eq!(descriptor.kind, ProviderKind::Instance);
    assert_eq!(descriptor.lifetime, Lifetime::Singleton);
}

#[test]
fn factory_resolves_dependencies_through_container() {
    struct Repo {
        rows: u32,
    }
    struct Service {
        repo: Arc<Repo>,
    }
    static REPO: ServiceToken<Repo> = ServiceToken::new("test.repo");
    static SERVICE: ServiceToken<Service> = ServiceToken::new("test.service");

    let container = ServiceContainer::new();
    container.register_singleton(&REPO, || Repo { rows: 42 }).unwrap();
    container
        .register_factory(
            &SERVICE,
            |c| Service {
                repo: c.resolve(&REPO).unwrap(),
            },
            Lifetime::Singleton,
        )
        .unwrap();

    let service = container.resolve(&SERVICE).unwrap();
    assert_eq!(service.repo.rows, 42);

    // Both paths see the same repo instance.
    let repo = container.resolve(&REPO).unwrap();
    assert!(Arc::ptr_eq(&service.repo, &repo));
}

#[test]
fn try_resolve_maps_not_found_to_none() {
    struct Ephemeral;
    static EPHEMERAL: ServiceToken<Ephemeral> = ServiceToken::new("test.ephemeral");

    let container = ServiceContainer::new();
    assert!(container.try_resolve(&EPHEMERAL).unwrap().is_none());

    container.register_transient(&EPHEMERAL, || Ephemeral).unwrap();
    assert!(container.try_resolve(&EPHEMERAL).unwrap().is_some());
}

#[test]
fn re_registration_replaces_provider_and_instance() {
    struct Flag {
        value: &'static str,
    }
    static FLAG: ServiceToken<Flag> = ServiceToken::new("test.flag");

    let container = ServiceContainer::new();
    container
        .register_singleton(&FLAG, || Flag { value: "old" })
        .unwrap();
    let old = container.resolve(&FLAG).unwrap();
    assert_eq!(old.value, "old");

    container
        .register_singleton(&FLAG, || Flag { value: "new" })
        .unwrap();
    let new = container.resolve(&FLAG).unwrap();
    assert_eq!(new.value, "new");
    assert!(!Arc::ptr_eq(&old, &new));

    // The handle resolved before re-registration still works.
    assert_eq!(old.value, "old");
}

#[test]
fn registration_order_is_preserved() {
    struct A;
    struct B;
    struct C;
    static TOKEN_A: ServiceToken<A> = ServiceToken::new("test.order.a");
    static TOKEN_B: ServiceToken<B> = ServiceToken::new("test.order.b");
    static TOKEN_C: ServiceToken<C> = ServiceToken::new("test.order.c");

    let container = ServiceContainer::new();
    container.register_transient(&TOKEN_A, || A).unwrap();
    container.register_transient(&TOKEN_B, || B).unwrap();
    container.register_transient(&TOKEN_C, || C).unwrap();

    // Re-registering keeps the original position.
    container.register_singleton(&TOKEN_A, || A).unwrap();
    assert_eq!(
        container.registered_services(),
        vec!["test.order.a", "test.order.b", "test.order.c"]
    );
}

#[test]
fn empty_token_name_is_rejected() {
    struct Nameless;
    static NAMELESS: ServiceToken<Nameless> = ServiceToken::new("");

    let container = ServiceContainer::new();
    let err = container
        .register_transient(&NAMELESS, || Nameless)
        .unwrap_err();
    assert!(matches!(err, DiError::InvalidRegistration(_)));
    assert!(!container.is_registered(&NAMELESS));
}

#[test]
fn clones_share_container_state() {
    let container = ServiceContainer::new();
    let clone = container.clone();
    clone
        .register_singleton(&SHARED_COUNTER, Counter::new)
        .unwrap();

    let a = container.resolve(&SHARED_COUNTER).unwrap();
    let b = clone.resolve(&SHARED_COUNTER).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(container.container_id(), clone.container_id());
}
