//! The per-entity [`OriginComponent`].
//!
//! An `OriginComponent` holds the entity's current origin and exactly one
//! live [`Power`] for every power type that origin grants. It is the only
//! place that decides which lifecycle hooks fire, and when:
//!
//! | Operation                | `on_removed` (old) | `on_added` (new)            |
//! |--------------------------|--------------------|-----------------------------|
//! | [`set_origin`]           | every held power   | every granted power         |
//! | [`load_persisted`]       | every held power   | powers restored from record |
//! | [`load_from_network`]    | never              | never                       |
//!
//! Powers synthesized during a load (granted by the origin but missing from
//! the record) never receive `on_added` in either load path.
//!
//! Reassignment never preserves instances: switching between two origins
//! that share a power type still tears the old instance down and builds a
//! fresh one.
//!
//! [`set_origin`]: OriginComponent::set_origin
//! [`load_persisted`]: OriginComponent::load_persisted
//! [`load_from_network`]: OriginComponent::load_from_network

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::entity::EntityId;
use crate::identifier::Identifier;
use crate::origin::{Origin, OriginId};
use crate::power::{Power, PowerError, PowerTypeId};
use crate::record::{PowerRecord, ProfileRecord};
use crate::registry::OriginRegistry;
use crate::OriginsError;

/// Whether a reconcile pass runs lifecycle hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HookMode {
    /// Authoritative load: fire `on_removed` / `on_added`.
    Fire,
    /// Passive mirror of remote state: fire nothing.
    Suppress,
}

// ---------------------------------------------------------------------------
// OriginComponent
// ---------------------------------------------------------------------------

/// The origin profile attached to one entity.
///
/// Holds the current origin, one live power per power type that origin
/// grants, and whether the entity has ever held a non-empty origin. All
/// mutation goes through [`set_origin`](Self::set_origin) and the two load
/// paths, which keep the held powers equal to the granted set.
pub struct OriginComponent {
    owner: EntityId,
    registry: Arc<OriginRegistry>,
    origin: OriginId,
    /// Keyed by registry index, so iteration (and serialization) order is
    /// deterministic.
    powers: BTreeMap<PowerTypeId, Box<dyn Power>>,
    had_origin_before: bool,
}

impl OriginComponent {
    /// Kind tag under which hosts register this component.
    pub const COMPONENT_KEY: &'static str = "origins:origin";

    /// Create the component for a freshly attached entity: empty origin, no
    /// powers.
    pub fn new(owner: EntityId, registry: Arc<OriginRegistry>) -> Self {
        Self {
            owner,
            registry,
            origin: OriginId::EMPTY,
            powers: BTreeMap::new(),
            had_origin_before: false,
        }
    }

    // -- accessors ----------------------------------------------------------

    /// The entity this component is attached to.
    pub fn owner(&self) -> EntityId {
        self.owner
    }

    /// Registry the origin and power type ids are resolved against.
    pub fn registry(&self) -> &Arc<OriginRegistry> {
        &self.registry
    }

    /// Current origin; [`OriginId::EMPTY`] until one is assigned.
    pub fn origin(&self) -> OriginId {
        self.origin
    }

    /// Identifier of the current origin.
    pub fn origin_identifier(&self) -> &Identifier {
        self.current_origin().identifier()
    }

    /// `true` iff the current origin is not the empty origin.
    pub fn has_origin(&self) -> bool {
        !self.origin.is_empty()
    }

    /// `true` iff this entity has ever held a non-empty origin.
    pub fn had_origin_before(&self) -> bool {
        self.had_origin_before
    }

    /// `true` iff a power of `power_type` is held.
    pub fn has_power(&self, power_type: PowerTypeId) -> bool {
        self.powers.contains_key(&power_type)
    }

    /// The held power of `power_type`, if any.
    pub fn power(&self, power_type: PowerTypeId) -> Option<&(dyn Power + 'static)> {
        self.powers.get(&power_type).map(|p| p.as_ref())
    }

    /// Mutable access to the held power of `power_type`.
    pub fn power_mut(&mut self, power_type: PowerTypeId) -> Option<&mut (dyn Power + 'static)> {
        self.powers.get_mut(&power_type).map(|p| p.as_mut())
    }

    /// The power of `power_type`, narrowed to `T`. `None` if absent or of a
    /// different concrete type.
    pub fn power_as<T: Power>(&self, power_type: PowerTypeId) -> Option<&T> {
        self.power(power_type)?.downcast_ref::<T>()
    }

    pub fn power_as_mut<T: Power>(&mut self, power_type: PowerTypeId) -> Option<&mut T> {
        self.power_mut(power_type)?.downcast_mut::<T>()
    }

    /// Every held power.
    pub fn powers(&self) -> impl Iterator<Item = &(dyn Power + 'static)> + '_ {
        self.powers.values().map(|p| p.as_ref())
    }

    /// Power types currently held, in registry order.
    pub fn power_types(&self) -> impl Iterator<Item = PowerTypeId> + '_ {
        self.powers.keys().copied()
    }

    pub fn power_count(&self) -> usize {
        self.powers.len()
    }

    /// Held powers of concrete type `T`, skipping inactive ones unless
    /// `include_inactive` is set.
    pub fn powers_of<T: Power>(&self, include_inactive: bool) -> Vec<&T> {
        self.powers
            .values()
            .filter(|p| include_inactive || p.is_active())
            .filter_map(|p| p.downcast_ref::<T>())
            .collect()
    }

    /// Active powers of concrete type `T`.
    pub fn active_powers_of<T: Power>(&self) -> Vec<&T> {
        self.powers_of(false)
    }

    /// Held powers matching `predicate`, skipping inactive ones unless
    /// `include_inactive` is set.
    ///
    /// Unlike [`powers_of`](Self::powers_of) this can select a kind spanning
    /// several concrete types, e.g. `|p| p.is::<A>() || p.is::<B>()`.
    pub fn powers_where<F>(&self, include_inactive: bool, mut predicate: F) -> Vec<&(dyn Power + 'static)>
    where
        F: FnMut(&(dyn Power + 'static)) -> bool,
    {
        self.powers
            .values()
            .map(|p| p.as_ref())
            .filter(|p| include_inactive || p.is_active())
            .filter(|p| predicate(*p))
            .collect()
    }

    fn current_origin(&self) -> &Origin {
        self.registry.origin_or_empty(self.origin)
    }

    // -- reassignment -------------------------------------------------------

    /// Switch to `origin`, tearing down every held power and building a fresh
    /// one for each power type the new origin grants.
    ///
    /// Assigning the origin already held is a no-op and fires nothing.
    ///
    /// # Errors
    ///
    /// - [`OriginsError::UnknownOrigin`] if `origin` was not issued by this
    ///   component's registry. Nothing changes.
    /// - [`OriginsError::PowerHook`] if a hook fails. A failing `on_removed`
    ///   leaves the old origin and powers installed; a failing `on_added`
    ///   leaves the new origin and its full power set installed, with the
    ///   remaining `on_added` calls skipped.
    pub fn set_origin(&mut self, origin: OriginId) -> Result<(), OriginsError> {
        if origin == self.origin {
            return Ok(());
        }
        let registry = Arc::clone(&self.registry);
        let target = registry
            .origin(origin)
            .ok_or_else(|| OriginsError::UnknownOrigin {
                identifier: format!("{origin:?}"),
                registered: registry.registered_origin_names().join(", "),
            })?;

        self.fire_removed()?;

        let mut powers = BTreeMap::new();
        for &power_type in target.power_types() {
            if let Some(kind) = registry.power_type(power_type) {
                powers.insert(power_type, kind.create(self.owner));
            }
        }
        self.powers = powers;
        self.origin = origin;
        if !origin.is_empty() {
            self.had_origin_before = true;
        }
        debug!(
            entity = %self.owner,
            origin = %target.identifier(),
            powers = self.powers.len(),
            "origin assigned"
        );

        for &power_type in target.power_types() {
            self.fire_added(power_type)?;
        }
        Ok(())
    }

    /// Resolve `raw` against the registry and [`set_origin`](Self::set_origin).
    pub fn set_origin_by_identifier(&mut self, raw: &str) -> Result<(), OriginsError> {
        let origin = self.registry.resolve_origin(raw)?;
        self.set_origin(origin)
    }

    // -- persistence --------------------------------------------------------

    /// Overwrite this component from durable storage.
    ///
    /// Held powers receive `on_removed`. An unresolvable origin falls back to
    /// the empty origin with a warning. `had_origin_before` is copied
    /// verbatim. Power records are restored (and receive `on_added`) only
    /// if their type resolves and is granted by the loaded origin; granted
    /// types with no record get a default instance without `on_added`.
    pub fn load_persisted(&mut self, record: &ProfileRecord) -> Result<(), OriginsError> {
        self.fire_removed()?;
        let restored = self.rebuild(record, HookMode::Fire);
        for power_type in restored {
            self.fire_added(power_type)?;
        }
        Ok(())
    }

    /// Snapshot this component in the persisted form read by
    /// [`load_persisted`](Self::load_persisted).
    pub fn to_persisted(&self) -> ProfileRecord {
        let powers = self
            .powers
            .iter()
            .filter_map(|(&power_type, power)| {
                let identifier = self.registry.power_type_identifier(power_type)?;
                Some(PowerRecord {
                    power_type: identifier.to_string(),
                    data: power.to_data(),
                })
            })
            .collect();

        ProfileRecord {
            origin: self.origin_identifier().to_string(),
            had_origin_before: self.had_origin_before,
            powers,
        }
    }

    // -- network sync -------------------------------------------------------

    /// Apply a sync payload from the authoritative side.
    ///
    /// `None` is a no-op. Otherwise the payload is decoded and reconciled
    /// exactly like [`load_persisted`](Self::load_persisted), except that no
    /// lifecycle hook fires.
    ///
    /// # Errors
    ///
    /// [`OriginsError::PayloadCodec`] if the payload does not decode; the
    /// component is left untouched.
    pub fn load_from_network(&mut self, payload: Option<&[u8]>) -> Result<(), OriginsError> {
        let Some(bytes) = payload else {
            return Ok(());
        };
        let record = ProfileRecord::from_payload(bytes)?;
        self.apply_network_record(&record);
        Ok(())
    }

    /// Hook-suppressed reconcile of an already decoded record.
    pub fn apply_network_record(&mut self, record: &ProfileRecord) {
        self.rebuild(record, HookMode::Suppress);
    }

    /// Encode the payload [`load_from_network`](Self::load_from_network)
    /// consumes on the receiving side.
    pub fn to_network_payload(&self) -> Result<Vec<u8>, OriginsError> {
        self.to_persisted().to_payload()
    }

    // -- internals ----------------------------------------------------------

    /// Replace origin, flag and powers from `record` in one swap. Shared by
    /// both load paths; returns the power types restored from the record, in
    /// record order, which are the ones owed `on_added` when hooks fire.
    fn rebuild(&mut self, record: &ProfileRecord, hooks: HookMode) -> Vec<PowerTypeId> {
        let registry = Arc::clone(&self.registry);
        let origin = match registry.resolve_origin(&record.origin) {
            Ok(origin) => origin,
            Err(e) => {
                warn!(
                    entity = %self.owner,
                    origin = %record.origin,
                    error = %e,
                    "entity had unregistered origin -- falling back to empty origin"
                );
                OriginId::EMPTY
            }
        };
        let template = registry.origin_or_empty(origin);

        let mut powers: BTreeMap<PowerTypeId, Box<dyn Power>> = BTreeMap::new();
        // Restored power types in record order; these get `on_added`.
        let mut restored: Vec<PowerTypeId> = Vec::new();

        for entry in &record.powers {
            let Ok(power_type) = registry.resolve_power_type(&entry.power_type) else {
                trace!(
                    entity = %self.owner,
                    power_type = %entry.power_type,
                    "dropping record for unresolvable power type"
                );
                continue;
            };
            if !template.has_power_type(power_type) {
                trace!(
                    entity = %self.owner,
                    power_type = %entry.power_type,
                    origin = %template.identifier(),
                    "dropping record for power type not granted by origin"
                );
                continue;
            }
            let Some(kind) = registry.power_type(power_type) else {
                continue;
            };

            let mut power = kind.create(self.owner);
            if let Err(e) = power.from_data(&entry.data) {
                warn!(
                    entity = %self.owner,
                    power_type = %entry.power_type,
                    error = %e,
                    "discarding undecodable power data -- power will start from defaults"
                );
                continue;
            }
            if powers.insert(power_type, power).is_some() {
                debug!(
                    entity = %self.owner,
                    power_type = %entry.power_type,
                    "duplicate power record -- keeping the last one"
                );
                restored.retain(|&p| p != power_type);
            }
            restored.push(power_type);
        }

        for &power_type in template.power_types() {
            if powers.contains_key(&power_type) {
                continue;
            }
            if let Some(kind) = registry.power_type(power_type) {
                trace!(
                    entity = %self.owner,
                    power_type = %kind.identifier(),
                    "synthesizing power missing from record"
                );
                powers.insert(power_type, kind.create(self.owner));
            }
        }

        self.origin = origin;
        self.had_origin_before = record.had_origin_before;
        self.powers = powers;
        debug!(
            entity = %self.owner,
            origin = %template.identifier(),
            powers = self.powers.len(),
            restored = restored.len(),
            hooks = ?hooks,
            "origin component reconciled"
        );

        restored
    }

    fn fire_removed(&mut self) -> Result<(), OriginsError> {
        let owner = self.owner;
        let registry = &self.registry;
        for (&power_type, power) in self.powers.iter_mut() {
            power
                .on_removed()
                .map_err(|source| hook_error(registry, owner, power_type, "on_removed", source))?;
        }
        Ok(())
    }

    fn fire_added(&mut self, power_type: PowerTypeId) -> Result<(), OriginsError> {
        let owner = self.owner;
        let registry = &self.registry;
        if let Some(power) = self.powers.get_mut(&power_type) {
            power
                .on_added()
                .map_err(|source| hook_error(registry, owner, power_type, "on_added", source))?;
        }
        Ok(())
    }
}

fn hook_error(
    registry: &OriginRegistry,
    entity: EntityId,
    power_type: PowerTypeId,
    hook: &'static str,
    source: PowerError,
) -> OriginsError {
    OriginsError::PowerHook {
        entity,
        power_type: registry
            .power_type_identifier(power_type)
            .map(Identifier::to_string)
            .unwrap_or_else(|| format!("{power_type:?}")),
        hook,
        source,
    }
}

impl fmt::Debug for OriginComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OriginComponent")
            .field("owner", &self.owner)
            .field("origin", &self.origin)
            .field("powers", &self.powers)
            .field("had_origin_before", &self.had_origin_before)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for OriginComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "OriginComponent({})[", self.origin_identifier())?;
        for (&power_type, power) in &self.powers {
            match self.registry.power_type_identifier(power_type) {
                Some(id) => writeln!(f, "\t{id}: {}", power.to_data())?,
                None => writeln!(f, "\t{power_type:?}: {}", power.to_data())?,
            }
        }
        write!(f, "]")
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
