use criterion::{black_box, criterion_group, criterion_main, Criterion};
use lattice_di::{Lifetime, ServiceContainer, ServiceToken};

struct Payload {
    data: Vec<u64>,
}

static SINGLETON: ServiceToken<Payload> = ServiceToken::new("bench.singleton");
static TRANSIENT: ServiceToken<Payload> = ServiceToken::new("bench.transient");
static SCOPED: ServiceToken<Payload> = ServiceToken::new("bench.scoped");
static CHAINED: ServiceToken<Payload> = ServiceToken::new("bench.chained");

fn payload() -> Payload {
    Payload {
        data: (0..64).collect(),
    }
}

fn bench_singleton_hit(c: &mut Criterion) {
    let container = ServiceContainer::new();
    container.register_singleton(&SINGLETON, payload).unwrap();
    // Prime the cache so the loop measures the hit path.
    let _ = container.resolve(&SINGLETON).unwrap();

    c.bench_function("singleton_hit", |b| {
        b.iter(|| {
            let v = container.resolve(&SINGLETON).unwrap();
            black_box(v.data.len());
        })
    });
}

fn bench_singleton_cold(c: &mut Criterion) {
    c.bench_function("singleton_cold", |b| {
        b.iter_batched(
            || {
                let container = ServiceContainer::new();
                container.register_singleton(&SINGLETON, payload).unwrap();
                container
            },
            |container| {
                let v = container.resolve(&SINGLETON).unwrap();
                black_box(v.data.len());
            },
            criterion::BatchSize::SmallInput,
        )
    });
}

fn bench_transient(c: &mut Criterion) {
    let container = ServiceContainer::new();
    container.register_transient(&TRANSIENT, payload).unwrap();

    c.bench_function("transient", |b| {
        b.iter(|| {
            let v = container.resolve(&TRANSIENT).unwrap();
            black_box(v.data.len());
        })
    });
}

fn bench_scoped_hit(c: &mut Criterion) {
    let container = ServiceContainer::new();
    container
        .register_scoped(&SCOPED, payload, "Request")
        .unwrap();
    container.create_scope("bench").unwrap();
    container.set_current_scope("bench").unwrap();
    let _ = container.resolve(&SCOPED).unwrap();

    c.bench_function("scoped_hit", |b| {
        b.iter(|| {
            let v = container.resolve(&SCOPED).unwrap();
            black_box(v.data.len());
        })
    });
}

fn bench_factory_chain(c: &mut Criterion) {
    let container = ServiceContainer::new();
    container.register_singleton(&SINGLETON, payload).unwrap();
    container
        .register_factory(
            &CHAINED,
            |c| {
                let dep = c.resolve(&SINGLETON).unwrap();
                Payload {
                    data: dep.data.clone(),
                }
            },
            Lifetime::Transient,
        )
        .unwrap();
    let _ = container.resolve(&SINGLETON).unwrap();

    c.bench_function("factory_with_dependency", |b| {
        b.iter(|| {
            let v = container.resolve(&CHAINED).unwrap();
            black_box(v.data.len());
        })
    });
}

fn bench_lazy_hit(c: &mut Criterion) {
    let container = ServiceContainer::new();
    container.register_lazy(&SINGLETON, payload).unwrap();
    let lazy = container.resolve_lazy(&SINGLETON).unwrap();
    let _ = lazy.get().unwrap();

    c.bench_function("lazy_hit", |b| {
        b.iter(|| {
            let v = lazy.get().unwrap();
            black_box(v.data.len());
        })
    });
}

criterion_group!(
    benches,
    bench_singleton_hit,
    bench_singleton_cold,
    bench_transient,
    bench_scoped_hit,
    bench_factory_chain,
    bench_lazy_hit
);
criterion_main!(benches);
