//! Property tests for OriginComponent.
//!
//! Random sequences of reassignments, persisted loads, and network syncs are
//! applied to a component; after every step the held power set must equal
//! the set granted by the current origin.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use origins_core::prelude::*;
use proptest::prelude::*;

#[derive(Debug)]
struct Counted {
    owner: EntityId,
    value: i64,
    hooks: Arc<AtomicUsize>,
}

impl Power for Counted {
    fn owner(&self) -> EntityId {
        self.owner
    }

    fn on_added(&mut self) -> Result<(), PowerError> {
        self.hooks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn on_removed(&mut self) -> Result<(), PowerError> {
        self.hooks.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn to_data(&self) -> serde_json::Value {
        serde_json::json!(self.value)
    }

    fn from_data(&mut self, data: &serde_json::Value) -> Result<(), PowerError> {
        self.value = data
            .as_i64()
            .ok_or_else(|| PowerError::InvalidData(data.to_string()))?;
        Ok(())
    }
}

const POWER_NAMES: [&str; 4] = ["origins:p0", "origins:p1", "origins:p2", "origins:p3"];
const ORIGIN_NAMES: [&str; 4] = ["origins:empty", "origins:o1", "origins:o2", "origins:o3"];

fn setup(hooks: &Arc<AtomicUsize>) -> (Arc<OriginRegistry>, Vec<OriginId>) {
    let mut reg = OriginRegistry::new();
    let mut types = Vec::new();
    for name in POWER_NAMES {
        let hooks = Arc::clone(hooks);
        let id = reg
            .register_power_type(name, move |owner| {
                Box::new(Counted {
                    owner,
                    value: 0,
                    hooks: Arc::clone(&hooks),
                })
            })
            .unwrap();
        types.push(id);
    }
    let o1 = reg.register_origin("origins:o1", &[types[0], types[1]]).unwrap();
    let o2 = reg.register_origin("origins:o2", &[types[1], types[2]]).unwrap();
    let o3 = reg.register_origin("origins:o3", &[types[3]]).unwrap();
    (Arc::new(reg), vec![OriginId::EMPTY, o1, o2, o3])
}

#[derive(Debug, Clone)]
enum Op {
    SetOrigin(usize),
    LoadPersisted(ProfileRecord),
    Network(ProfileRecord),
}

fn record_strategy() -> impl Strategy<Value = ProfileRecord> {
    let origin = prop_oneof![
        (0..ORIGIN_NAMES.len()).prop_map(|i| ORIGIN_NAMES[i].to_owned()),
        Just("origins:unknown".to_owned()),
        Just("BAD".to_owned()),
    ];
    let power = (
        prop_oneof![
            (0..POWER_NAMES.len()).prop_map(|i| POWER_NAMES[i].to_owned()),
            Just("origins:retired".to_owned()),
        ],
        -100i64..100,
    )
        .prop_map(|(power_type, v)| PowerRecord {
            power_type,
            data: serde_json::json!(v),
        });
    (origin, any::<bool>(), prop::collection::vec(power, 0..6)).prop_map(
        |(origin, had_origin_before, powers)| ProfileRecord {
            origin,
            had_origin_before,
            powers,
        },
    )
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..ORIGIN_NAMES.len()).prop_map(Op::SetOrigin),
        record_strategy().prop_map(Op::LoadPersisted),
        record_strategy().prop_map(Op::Network),
    ]
}

fn granted(component: &OriginComponent) -> BTreeSet<PowerTypeId> {
    component
        .registry()
        .origin(component.origin())
        .map(|o| o.power_types().iter().copied().collect())
        .unwrap_or_default()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn held_powers_always_match_origin(ops in prop::collection::vec(op_strategy(), 1..30)) {
        let hooks = Arc::new(AtomicUsize::new(0));
        let (registry, origins) = setup(&hooks);
        let mut component = OriginComponent::new(EntityId::new(0, 0), registry);

        for op in ops {
            let had_before = component.had_origin_before();
            match op {
                Op::SetOrigin(i) => {
                    let changed = origins[i] != component.origin();
                    component.set_origin(origins[i]).unwrap();
                    if changed && i != 0 {
                        prop_assert!(component.had_origin_before());
                    } else {
                        // Same origin is a no-op, and the empty origin never
                        // sets the flag, even if a load cleared it.
                        prop_assert_eq!(component.had_origin_before(), had_before);
                    }
                }
                Op::LoadPersisted(record) => {
                    component.load_persisted(&record).unwrap();
                    prop_assert_eq!(component.had_origin_before(), record.had_origin_before);
                }
                Op::Network(record) => {
                    let hooks_before = hooks.load(Ordering::SeqCst);
                    component.apply_network_record(&record);
                    prop_assert_eq!(hooks.load(Ordering::SeqCst), hooks_before);
                    prop_assert_eq!(component.had_origin_before(), record.had_origin_before);
                }
            }

            let held: BTreeSet<PowerTypeId> = component.power_types().collect();
            prop_assert_eq!(held, granted(&component));
            prop_assert_eq!(component.power_count(), granted(&component).len());
        }
    }

    #[test]
    fn persisted_roundtrip(origin in 0..ORIGIN_NAMES.len(), values in prop::collection::vec(-1000i64..1000, 4)) {
        let hooks = Arc::new(AtomicUsize::new(0));
        let (registry, origins) = setup(&hooks);
        let mut component = OriginComponent::new(EntityId::new(3, 1), Arc::clone(&registry));
        component.set_origin(origins[origin]).unwrap();
        let types: Vec<PowerTypeId> = component.power_types().collect();
        for (power_type, value) in types.into_iter().zip(values) {
            component.power_as_mut::<Counted>(power_type).unwrap().value = value;
        }

        let record = component.to_persisted();
        let mut restored = OriginComponent::new(EntityId::new(3, 1), registry);
        restored.load_persisted(&record).unwrap();

        prop_assert_eq!(restored.origin(), component.origin());
        prop_assert_eq!(restored.had_origin_before(), component.had_origin_before());
        prop_assert_eq!(restored.to_persisted(), record);
    }
}
