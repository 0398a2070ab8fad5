use std::sync::Arc;
use std::time::{Duration, SystemTime};

use lattice_di::{
    FindCriteria, Lifetime, ServiceContainer, ServiceRegistry, ServiceToken, TokenMetadata,
};

struct Cache;
struct Mailer;
struct Auditor;

static CACHE: ServiceToken<Cache> = ServiceToken::with_metadata(
    "svc.cache",
    TokenMetadata::new()
        .with_description("in-memory cache")
        .with_version("1.2")
        .with_tags(&["infra", "hot-path"]),
);
static MAILER: ServiceToken<Mailer> = ServiceToken::with_metadata(
    "svc.mailer",
    TokenMetadata::new()
        .with_tags(&["infra"])
        .with_dependencies(&["svc.cache"]),
);
static AUDITOR: ServiceToken<Auditor> = ServiceToken::with_metadata(
    "svc.auditor",
    TokenMetadata::new().with_deprecated(true),
);

fn populated() -> ServiceRegistry {
    let mut registry = ServiceRegistry::new();
    registry.register_singleton(&CACHE, || Cache).unwrap();
    registry.register_transient(&MAILER, || Mailer).unwrap();
    registry.register_scoped(&AUDITOR, || Auditor, "Session").unwrap();
    registry
}

#[test]
fn descriptors_expose_registration_details() {
    let registry = populated();
    let descriptor = registry.get_descriptor(&CACHE).unwrap();
    assert_eq!(descriptor.name, "svc.cache");
    assert_eq!(descriptor.lifetime, Lifetime::Singleton);
    assert_eq!(descriptor.metadata.description, Some("in-memory cache"));
    assert_eq!(descriptor.metadata.version, Some("1.2"));
    assert!(descriptor.has_tag("hot-path"));
    assert!(!descriptor.is_deprecated());
    assert!(descriptor.registered_at <= SystemTime::now());
}

#[test]
fn lifetime_and_tag_queries_keep_registration_order() {
    let registry = populated();
    assert_eq!(registry.services_by_lifetime(Lifetime::Singleton), vec!["svc.cache"]);
    assert_eq!(registry.services_by_lifetime(Lifetime::Transient), vec!["svc.mailer"]);
    assert_eq!(registry.services_by_tag("infra"), vec!["svc.cache", "svc.mailer"]);
    assert!(registry.services_by_tag("nope").is_empty());
}

#[test]
fn find_services_combines_criteria_with_and() {
    let registry = populated();

    let infra_singletons = registry.find_services(
        &FindCriteria::new()
            .with_lifetime(Lifetime::Singleton)
            .with_tag("infra"),
    );
    assert_eq!(infra_singletons.len(), 1);
    assert_eq!(infra_singletons[0].name, "svc.cache");

    let deprecated = registry.find_services(&FindCriteria::new().with_deprecated(true));
    assert_eq!(deprecated.len(), 1);
    assert_eq!(deprecated[0].name, "svc.auditor");

    // An empty criteria set matches everything.
    assert_eq!(registry.find_services(&FindCriteria::new()).len(), 3);
}

#[test]
fn find_services_by_registration_time() {
    let registry = populated();
    let epoch = SystemTime::UNIX_EPOCH;
    assert_eq!(
        registry
            .find_services(&FindCriteria::new().registered_after(epoch))
            .len(),
        3
    );
    let future = SystemTime::now() + Duration::from_secs(3600);
    assert!(registry
        .find_services(&FindCriteria::new().registered_after(future))
        .is_empty());
}

#[test]
fn statistics_count_by_lifetime() {
    let registry = populated();
    let stats = registry.statistics();
    assert_eq!(stats.total, 3);
    assert_eq!(stats.singletons, 1);
    assert_eq!(stats.scoped, 1);
    assert_eq!(stats.transients, 1);
    assert_eq!(stats.registration_order_len, 3);
}

#[test]
fn clear_empties_everything() {
    let mut registry = populated();
    assert_eq!(registry.len(), 3);
    registry.clear();
    assert!(registry.is_empty());
    assert!(registry.registered_services().is_empty());
    assert_eq!(registry.statistics().total, 0);
}

#[test]
fn dependency_tree_expands_transitively() {
    let registry = populated();
    // Mailer declares a dependency on the cache.
    assert_eq!(registry.dependency_tree("svc.mailer"), vec!["svc.mailer", "svc.cache"]);
    // Leaves expand to just themselves.
    assert_eq!(registry.dependency_tree("svc.cache"), vec!["svc.cache"]);
    // Unknown roots yield nothing.
    assert!(registry.dependency_tree("svc.ghost").is_empty());
}

#[test]
fn dependency_tree_lists_unregistered_dependencies() {
    struct Orphan;
    static ORPHAN: ServiceToken<Orphan> = ServiceToken::with_metadata(
        "svc.orphan",
        TokenMetadata::new().with_dependencies(&["svc.missing"]),
    );
    let mut registry = ServiceRegistry::new();
    registry.register_transient(&ORPHAN, || Orphan).unwrap();
    assert_eq!(registry.dependency_tree("svc.orphan"), vec!["svc.orphan", "svc.missing"]);
}

#[test]
fn declared_cycles_are_detected_once() {
    struct A;
    struct B;
    static DEP_A: ServiceToken<A> = ServiceToken::with_metadata(
        "cycle.a",
        TokenMetadata::new().with_dependencies(&["cycle.b"]),
    );
    static DEP_B: ServiceToken<B> = ServiceToken::with_metadata(
        "cycle.b",
        TokenMetadata::new().with_dependencies(&["cycle.a"]),
    );

    let mut registry = ServiceRegistry::new();
    registry.register_transient(&DEP_A, || A).unwrap();
    registry.register_transient(&DEP_B, || B).unwrap();

    let cycles = registry.detect_circular_dependencies();
    assert_eq!(cycles, vec![vec!["cycle.a", "cycle.b", "cycle.a"]]);
}

#[test]
fn acyclic_graphs_report_no_cycles() {
    let registry = populated();
    assert!(registry.detect_circular_dependencies().is_empty());
}

#[test]
fn copy_to_carries_registrations_and_singletons() {
    let source = ServiceContainer::new();
    source.register_singleton(&CACHE, || Cache).unwrap();
    let original = source.resolve(&CACHE).unwrap();

    let fork = source.fork().unwrap();
    assert!(fork.is_registered(&CACHE));
    assert_ne!(fork.container_id(), source.container_id());

    // The singleton instance carries over with identity intact.
    let forked = fork.resolve(&CACHE).unwrap();
    assert!(Arc::ptr_eq(&original, &forked));

    // But later registrations stay independent.
    fork.register_transient(&MAILER, || Mailer).unwrap();
    assert!(!source.is_registered(&MAILER));
}

#[test]
fn fork_does_not_carry_scopes() {
    let source = ServiceContainer::new();
    source.register_scoped(&AUDITOR, || Auditor, "Session").unwrap();
    source.create_scope("s-1").unwrap();
    source.set_current_scope("s-1").unwrap();
    source.resolve(&AUDITOR).unwrap();

    let fork = source.fork().unwrap();
    assert!(!fork.scope_exists("s-1"));
    assert_eq!(fork.current_scope(), None);
    assert_eq!(fork.metrics().total_resolutions, 0);
}
