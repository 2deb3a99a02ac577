//! Benchmarks for origin reassignment, persistence, and network sync.

use std::hint::black_box;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, Criterion};
use origins_core::prelude::*;

#[derive(Debug)]
struct Charge {
    owner: EntityId,
    charges: u32,
}

impl Power for Charge {
    fn owner(&self) -> EntityId {
        self.owner
    }

    fn to_data(&self) -> serde_json::Value {
        serde_json::json!({ "charges": self.charges })
    }

    fn from_data(&mut self, data: &serde_json::Value) -> Result<(), PowerError> {
        self.charges = data["charges"].as_u64().unwrap_or(0) as u32;
        Ok(())
    }
}

/// A registry with two origins of `powers_per_origin` power types each.
fn registry(powers_per_origin: usize) -> (Arc<OriginRegistry>, OriginId, OriginId) {
    let mut reg = OriginRegistry::new();
    let mut types = Vec::new();
    for i in 0..powers_per_origin * 2 {
        let id = reg
            .register_power_type(&format!("bench:power_{i}"), |owner| {
                Box::new(Charge { owner, charges: 3 })
            })
            .unwrap();
        types.push(id);
    }
    let (left, right) = types.split_at(powers_per_origin);
    let a = reg.register_origin("bench:a", left).unwrap();
    let b = reg.register_origin("bench:b", right).unwrap();
    (Arc::new(reg), a, b)
}

fn bench_set_origin(c: &mut Criterion) {
    let (reg, a, b) = registry(16);
    let mut component = OriginComponent::new(EntityId::new(0, 0), reg);
    let mut flip = false;
    c.bench_function("set_origin_16_powers", |bench| {
        bench.iter(|| {
            flip = !flip;
            component
                .set_origin(black_box(if flip { a } else { b }))
                .unwrap();
        })
    });
}

fn bench_persisted_roundtrip(c: &mut Criterion) {
    let (reg, a, _) = registry(16);
    let mut component = OriginComponent::new(EntityId::new(0, 0), reg);
    component.set_origin(a).unwrap();
    let record = component.to_persisted();

    c.bench_function("to_persisted_16_powers", |bench| {
        bench.iter(|| black_box(component.to_persisted()))
    });
    c.bench_function("load_persisted_16_powers", |bench| {
        bench.iter(|| component.load_persisted(black_box(&record)).unwrap())
    });
}

fn bench_network_sync(c: &mut Criterion) {
    let (reg, a, _) = registry(16);
    let mut server = OriginComponent::new(EntityId::new(0, 0), Arc::clone(&reg));
    server.set_origin(a).unwrap();
    let payload = server.to_network_payload().unwrap();
    let mut client = OriginComponent::new(EntityId::new(0, 0), reg);

    c.bench_function("load_from_network_16_powers", |bench| {
        bench.iter(|| client.load_from_network(Some(black_box(payload.as_slice()))).unwrap())
    });
}

criterion_group!(
    benches,
    bench_set_origin,
    bench_persisted_roundtrip,
    bench_network_sync
);
criterion_main!(benches);
