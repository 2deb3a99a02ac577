//! Registry of power types and origins.
//!
//! Every power type and origin must be registered before components can
//! reference it. Registration interns the textual [`Identifier`] into a
//! compact index id ([`PowerTypeId`] / [`OriginId`]); identity comparisons
//! throughout the crate are id comparisons. The empty origin is registered by
//! [`OriginRegistry::new`] and always has id [`OriginId::EMPTY`].
//!
//! A registry is built mutably and then shared read-only (typically behind an
//! `Arc`) by all components.

use std::collections::HashMap;

use crate::entity::EntityId;
use crate::identifier::Identifier;
use crate::origin::{Origin, OriginId};
use crate::power::{Power, PowerType, PowerTypeId};
use crate::OriginsError;

/// Interning table for power types and origins.
///
/// Ids are dense indices handed out in registration order, so identity
/// is index comparison. The empty origin is always registered at index 0.
#[derive(Debug)]
pub struct OriginRegistry {
    /// Indexed by `PowerTypeId.0`.
    power_types: Vec<PowerType>,
    power_types_by_identifier: HashMap<Identifier, PowerTypeId>,
    /// Indexed by `OriginId.0`; slot 0 is the empty origin.
    origins: Vec<Origin>,
    origins_by_identifier: HashMap<Identifier, OriginId>,
}

impl OriginRegistry {
    /// Create a registry holding only the empty origin.
    pub fn new() -> Self {
        let empty = Origin {
            id: OriginId::EMPTY,
            identifier: Identifier::new_unchecked("origins", "empty"),
            power_types: Vec::new(),
        };
        let mut origins_by_identifier = HashMap::new();
        origins_by_identifier.insert(empty.identifier.clone(), OriginId::EMPTY);
        Self {
            power_types: Vec::new(),
            power_types_by_identifier: HashMap::new(),
            origins: vec![empty],
            origins_by_identifier,
        }
    }

    /// Register a power type under `identifier` with the factory used to
    /// build fresh instances of it.
    ///
    /// # Errors
    ///
    /// [`OriginsError::InvalidIdentifier`] for a malformed identifier and
    /// [`OriginsError::DuplicateIdentifier`] if it is already taken.
    pub fn register_power_type<F>(
        &mut self,
        identifier: &str,
        factory: F,
    ) -> Result<PowerTypeId, OriginsError>
    where
        F: Fn(EntityId) -> Box<dyn Power> + Send + Sync + 'static,
    {
        let identifier: Identifier = identifier.parse()?;
        if self.power_types_by_identifier.contains_key(&identifier) {
            return Err(OriginsError::DuplicateIdentifier {
                kind: "power type",
                identifier: identifier.to_string(),
            });
        }

        let id = PowerTypeId(self.power_types.len() as u32);
        self.power_types_by_identifier.insert(identifier.clone(), id);
        self.power_types.push(PowerType {
            id,
            identifier,
            factory: Box::new(factory),
        });
        Ok(id)
    }

    /// Register an origin granting `power_types` in the given order.
    ///
    /// Repeated entries in `power_types` are collapsed to their first
    /// occurrence.
    pub fn register_origin(
        &mut self,
        identifier: &str,
        power_types: &[PowerTypeId],
    ) -> Result<OriginId, OriginsError> {
        let identifier: Identifier = identifier.parse()?;
        if self.origins_by_identifier.contains_key(&identifier) {
            return Err(OriginsError::DuplicateIdentifier {
                kind: "origin",
                identifier: identifier.to_string(),
            });
        }

        let mut granted: Vec<PowerTypeId> = Vec::with_capacity(power_types.len());
        for &power_type in power_types {
            if self.power_type(power_type).is_none() {
                return Err(OriginsError::UnknownPowerType {
                    identifier: format!("{power_type:?}"),
                });
            }
            if !granted.contains(&power_type) {
                granted.push(power_type);
            }
        }

        let id = OriginId(self.origins.len() as u32);
        self.origins_by_identifier.insert(identifier.clone(), id);
        self.origins.push(Origin {
            id,
            identifier,
            power_types: granted,
        });
        Ok(id)
    }

    /// Look up a power type by id.
    pub fn power_type(&self, id: PowerTypeId) -> Option<&PowerType> {
        self.power_types.get(id.0 as usize)
    }

    /// Look up an origin by id. `None` for ids from another registry.
    pub fn origin(&self, id: OriginId) -> Option<&Origin> {
        self.origins.get(id.0 as usize)
    }

    /// The always-present empty origin.
    pub fn empty_origin(&self) -> &Origin {
        &self.origins[OriginId::EMPTY.0 as usize]
    }

    /// Like [`origin`](Self::origin), substituting the empty origin for ids
    /// this registry never issued.
    pub fn origin_or_empty(&self, id: OriginId) -> &Origin {
        self.origin(id).unwrap_or_else(|| self.empty_origin())
    }

    /// Resolve a raw persisted identifier to a power type.
    ///
    /// # Errors
    ///
    /// [`OriginsError::InvalidIdentifier`] when `raw` is malformed,
    /// [`OriginsError::UnknownPowerType`] when nothing is registered under it.
    pub fn resolve_power_type(&self, raw: &str) -> Result<PowerTypeId, OriginsError> {
        let identifier: Identifier = raw.parse()?;
        self.power_types_by_identifier
            .get(&identifier)
            .copied()
            .ok_or_else(|| OriginsError::UnknownPowerType {
                identifier: identifier.to_string(),
            })
    }

    /// Resolve a raw persisted identifier to an origin.
    pub fn resolve_origin(&self, raw: &str) -> Result<OriginId, OriginsError> {
        let identifier: Identifier = raw.parse()?;
        self.origins_by_identifier
            .get(&identifier)
            .copied()
            .ok_or_else(|| OriginsError::UnknownOrigin {
                identifier: identifier.to_string(),
                registered: self.registered_origin_names().join(", "),
            })
    }

    /// Identifier a power type was registered under.
    pub fn power_type_identifier(&self, id: PowerTypeId) -> Option<&Identifier> {
        self.power_type(id).map(PowerType::identifier)
    }

    /// Identifier an origin was registered under.
    pub fn origin_identifier(&self, id: OriginId) -> Option<&Identifier> {
        self.origin(id).map(Origin::identifier)
    }

    /// Number of registered power types.
    pub fn power_type_count(&self) -> usize {
        self.power_types.len()
    }

    /// Number of registered origins, including the empty origin.
    pub fn origin_count(&self) -> usize {
        self.origins.len()
    }

    /// Every registered origin in registration order, empty origin first.
    pub fn origins(&self) -> impl Iterator<Item = &Origin> {
        self.origins.iter()
    }

    /// Identifiers of all registered origins, sorted.
    pub fn registered_origin_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .origins_by_identifier
            .keys()
            .map(Identifier::to_string)
            .collect();
        names.sort();
        names
    }
}

impl Default for OriginRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
