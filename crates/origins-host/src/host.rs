//! Entity table that attaches an [`OriginComponent`] to every entity.
//!
//! The [`OriginHost`] stands in for the game runtime's entity model: it
//! allocates generational [`EntityId`]s, creates each entity's component at
//! spawn time (empty origin, no powers), and routes reassignment, persistence,
//! and network sync to the right component. All calls are expected on the
//! simulation thread; the host does no locking.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use origins_host::prelude::*;
//!
//! #[derive(Debug)]
//! struct Phasing(EntityId);
//!
//! impl Power for Phasing {
//!     fn owner(&self) -> EntityId {
//!         self.0
//!     }
//! }
//!
//! let mut registry = OriginRegistry::new();
//! let phasing = registry
//!     .register_power_type("origins:phasing", |owner| Box::new(Phasing(owner)))
//!     .unwrap();
//! registry.register_origin("origins:phantom", &[phasing]).unwrap();
//!
//! let mut host = OriginHost::new(Arc::new(registry), HostConfig::default());
//! let server_side = host.spawn();
//! let client_side = host.spawn();
//!
//! host.set_origin(server_side, "origins:phantom").unwrap();
//! let packet = host.sync_packet(server_side).unwrap();
//! host.apply_packet(client_side, Some(packet.as_slice())).unwrap();
//!
//! assert!(host.component(client_side).unwrap().has_power(phasing));
//! ```

use std::collections::BTreeMap;
use std::sync::Arc;

use origins_core::component::OriginComponent;
use origins_core::entity::{EntityAllocator, EntityId};
use origins_core::record::ProfileRecord;
use origins_core::registry::OriginRegistry;
use tracing::debug;

use crate::config::HostConfig;
use crate::HostError;

/// Entity table owning one [`OriginComponent`] per live entity.
pub struct OriginHost {
    registry: Arc<OriginRegistry>,
    config: HostConfig,
    pub(crate) allocator: EntityAllocator,
    /// Keyed by entity so iteration (and snapshots) are ordered.
    pub(crate) components: BTreeMap<EntityId, OriginComponent>,
}

impl OriginHost {
    /// Create an empty host sharing `registry` with every component it builds.
    pub fn new(registry: Arc<OriginRegistry>, config: HostConfig) -> Self {
        Self {
            registry,
            config,
            allocator: EntityAllocator::new(),
            components: BTreeMap::new(),
        }
    }

    /// Registry shared by every component.
    pub fn registry(&self) -> &Arc<OriginRegistry> {
        &self.registry
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    // -- entity lifecycle ---------------------------------------------------

    /// Create an entity with a fresh origin component attached.
    pub fn spawn(&mut self) -> EntityId {
        let entity = self.allocator.allocate();
        self.components
            .insert(entity, OriginComponent::new(entity, Arc::clone(&self.registry)));
        debug!(
            entity = %entity,
            component = OriginComponent::COMPONENT_KEY,
            "entity spawned"
        );
        entity
    }

    /// Destroy an entity together with its component.
    ///
    /// No hook fires: the powers go away with the entity. Returns `false`
    /// for dead or stale handles.
    pub fn despawn(&mut self, entity: EntityId) -> bool {
        if !self.allocator.deallocate(entity) {
            return false;
        }
        self.components.remove(&entity);
        debug!(entity = %entity, "entity despawned");
        true
    }

    /// `true` iff `entity` is a live, non-stale handle.
    pub fn is_alive(&self, entity: EntityId) -> bool {
        self.allocator.is_alive(entity)
    }

    /// Number of live entities.
    pub fn entity_count(&self) -> usize {
        self.components.len()
    }

    /// Live entities in id order.
    pub fn entities(&self) -> impl Iterator<Item = EntityId> + '_ {
        self.components.keys().copied()
    }

    // -- component access ---------------------------------------------------

    /// The origin component of `entity`, or `None` for dead or stale handles.
    pub fn component(&self, entity: EntityId) -> Option<&OriginComponent> {
        self.components.get(&entity)
    }

    /// Mutable access to the origin component of `entity`.
    pub fn component_mut(&mut self, entity: EntityId) -> Option<&mut OriginComponent> {
        self.components.get_mut(&entity)
    }

    fn require(&self, entity: EntityId) -> Result<&OriginComponent, HostError> {
        self.components
            .get(&entity)
            .ok_or(HostError::StaleEntity { entity })
    }

    fn require_mut(&mut self, entity: EntityId) -> Result<&mut OriginComponent, HostError> {
        self.components
            .get_mut(&entity)
            .ok_or(HostError::StaleEntity { entity })
    }

    // -- operations ---------------------------------------------------------

    /// Assign the origin registered under `identifier` to `entity`.
    pub fn set_origin(&mut self, entity: EntityId, identifier: &str) -> Result<(), HostError> {
        self.require_mut(entity)?
            .set_origin_by_identifier(identifier)?;
        Ok(())
    }

    /// Persisted form of `entity`'s component.
    pub fn save(&self, entity: EntityId) -> Result<ProfileRecord, HostError> {
        Ok(self.require(entity)?.to_persisted())
    }

    /// Overwrite `entity`'s component from a persisted record, firing hooks.
    pub fn load(&mut self, entity: EntityId, record: &ProfileRecord) -> Result<(), HostError> {
        self.require_mut(entity)?.load_persisted(record)?;
        Ok(())
    }

    /// Encode `entity`'s component as a sync payload.
    pub fn sync_packet(&self, entity: EntityId) -> Result<Vec<u8>, HostError> {
        Ok(self.require(entity)?.to_network_payload()?)
    }

    /// Apply a sync payload to `entity` without firing hooks.
    ///
    /// `None` is a no-op. Payloads larger than
    /// [`HostConfig::max_packet_bytes`] are rejected before decoding.
    pub fn apply_packet(&mut self, entity: EntityId, payload: Option<&[u8]>) -> Result<(), HostError> {
        let limit = self.config.max_packet_bytes;
        let component = self.require_mut(entity)?;
        if let Some(bytes) = payload {
            if bytes.len() > limit {
                return Err(HostError::PacketTooLarge {
                    entity,
                    size: bytes.len(),
                    limit,
                });
            }
        }
        component.load_from_network(payload)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
