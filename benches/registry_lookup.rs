use criterion::*;
use loocast_runtime::{NamespaceId, Registry};

fn chained(depth: usize, keys: &[NamespaceId]) -> Registry<NamespaceId, usize> {
    let mut base = Registry::new();
    for (value, key) in keys.iter().enumerate() {
        base.register(key.clone(), value).expect("keys are distinct");
    }

    let mut registry = base;
    for _ in 0..depth {
        registry = Registry::with_base(registry.into_shared());
    }
    registry
}

fn registry_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("registry lookup");

    let root = NamespaceId::root("LooCast").expect("valid name");
    let keys: Vec<_> =
        (0..256).map(|i| root.child(format!("Module{i}")).expect("valid name")).collect();

    for depth in [0, 1, 4, 16] {
        let registry = chained(depth, &keys);
        group.throughput(Throughput::Elements(keys.len() as u64));
        let hit = BenchmarkId::new("hit", format!("{depth} scopes"));
        group.bench_with_input(hit, &registry, |b, registry| {
            b.iter(|| {
                for key in &keys {
                    black_box(registry.get(key).expect("registered in the base"));
                }
            });
        });

        let missing = root.child("Missing").expect("valid name");
        let miss = BenchmarkId::new("miss", format!("{depth} scopes"));
        group.bench_with_input(miss, &registry, |b, registry| {
            b.iter(|| black_box(registry.try_get(&missing)));
        });
    }
}

criterion_group!(benches, registry_lookup);
criterion_main!(benches);
