//! Origins core -- per-entity origin and power management.
//!
//! An entity holds at most one *origin*, a registry-resident template listing
//! power types. The entity's [`OriginComponent`](component::OriginComponent)
//! keeps exactly one live [`Power`](power::Power) for each of those types and
//! decides when their lifecycle hooks fire across three triggers: explicit
//! reassignment, loading from durable storage, and applying a network sync.
//!
//! # Quick Start
//!
//! ```
//! use std::sync::Arc;
//! use origins_core::prelude::*;
//!
//! #[derive(Debug)]
//! struct SlowFalling(EntityId);
//!
//! impl Power for SlowFalling {
//!     fn owner(&self) -> EntityId {
//!         self.0
//!     }
//! }
//!
//! let mut registry = OriginRegistry::new();
//! let slow_falling = registry
//!     .register_power_type("origins:slow_falling", |owner| Box::new(SlowFalling(owner)))
//!     .unwrap();
//! let avian = registry.register_origin("origins:avian", &[slow_falling]).unwrap();
//!
//! let mut component = OriginComponent::new(EntityId::new(0, 0), Arc::new(registry));
//! component.set_origin(avian).unwrap();
//!
//! assert!(component.has_origin());
//! assert!(component.power_as::<SlowFalling>(slow_falling).is_some());
//!
//! let record = component.to_persisted();
//! assert_eq!(record.origin, "origins:avian");
//! ```

#![deny(unsafe_code)]

pub mod component;
pub mod entity;
pub mod identifier;
pub mod origin;
pub mod power;
pub mod record;
pub mod registry;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by registry and component operations.
#[derive(Debug, thiserror::Error)]
pub enum OriginsError {
    /// A textual identifier is not of the form `namespace:path`.
    #[error("invalid identifier '{raw}': {reason}")]
    InvalidIdentifier { raw: String, reason: &'static str },

    /// An identifier was registered twice.
    #[error("{kind} '{identifier}' is already registered")]
    DuplicateIdentifier {
        kind: &'static str,
        identifier: String,
    },

    /// An origin was referenced that is not registered.
    #[error("origin '{identifier}' not registered. Registered origins: [{registered}]")]
    UnknownOrigin {
        identifier: String,
        registered: String,
    },

    /// A power type was referenced that is not registered.
    #[error("power type '{identifier}' not registered")]
    UnknownPowerType { identifier: String },

    /// A power's lifecycle hook failed, aborting the transition.
    #[error("{hook} failed for power '{power_type}' on {entity}: {source}")]
    PowerHook {
        entity: entity::EntityId,
        power_type: String,
        hook: &'static str,
        source: power::PowerError,
    },

    /// A network payload could not be encoded or decoded.
    #[error("network payload codec error: {details}")]
    PayloadCodec { details: String },
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common usage.
pub mod prelude {
    pub use crate::component::OriginComponent;
    pub use crate::entity::{AllocatorState, EntityAllocator, EntityId};
    pub use crate::identifier::Identifier;
    pub use crate::origin::{Origin, OriginId, EMPTY_ORIGIN_IDENTIFIER};
    pub use crate::power::{Power, PowerError, PowerType, PowerTypeId};
    pub use crate::record::{PowerRecord, ProfileRecord};
    pub use crate::registry::OriginRegistry;
    pub use crate::OriginsError;
}
