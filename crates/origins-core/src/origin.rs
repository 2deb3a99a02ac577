//! Origin templates.
//!
//! An [`Origin`] names an ordered list of power types. Origins are immutable
//! once registered. [`OriginId::EMPTY`] is always present in every
//! [`OriginRegistry`](crate::registry::OriginRegistry) and grants nothing.

use std::fmt;

use crate::identifier::Identifier;
use crate::power::PowerTypeId;

/// Persisted identifier of the empty origin.
pub const EMPTY_ORIGIN_IDENTIFIER: &str = "origins:empty";

// ---------------------------------------------------------------------------
// OriginId
// ---------------------------------------------------------------------------

/// Interned registry index of an [`Origin`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct OriginId(pub(crate) u32);

impl OriginId {
    /// The sentinel origin every component starts with.
    pub const EMPTY: OriginId = OriginId(0);

    /// Registry index of this origin.
    pub fn index(self) -> u32 {
        self.0
    }

    /// `true` for [`OriginId::EMPTY`].
    pub fn is_empty(self) -> bool {
        self == Self::EMPTY
    }
}

impl fmt::Debug for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OriginId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// Origin
// ---------------------------------------------------------------------------

/// A registered origin: an identifier plus the ordered, duplicate-free
/// list of power types it grants.
#[derive(Debug, Clone)]
pub struct Origin {
    pub(crate) id: OriginId,
    pub(crate) identifier: Identifier,
    /// Granted power types in declaration order, without duplicates.
    pub(crate) power_types: Vec<PowerTypeId>,
}

impl Origin {
    pub fn id(&self) -> OriginId {
        self.id
    }

    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Granted power types in declaration order.
    pub fn power_types(&self) -> &[PowerTypeId] {
        &self.power_types
    }

    /// `true` iff this origin grants `power_type`.
    pub fn has_power_type(&self, power_type: PowerTypeId) -> bool {
        self.power_types.contains(&power_type)
    }

    pub fn is_empty(&self) -> bool {
        self.id.is_empty()
    }
}
