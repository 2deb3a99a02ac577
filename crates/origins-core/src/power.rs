//! The [`Power`] trait and registry-resident [`PowerType`] factories.
//!
//! A power is a single, stateful behavior attached to one entity. What a
//! power *does* is up to its implementor; this crate only drives its
//! lifecycle (`on_added` / `on_removed`), asks whether it is active, and moves
//! its state in and out of the persisted form as an opaque JSON value.

use std::any::Any;
use std::fmt;

use crate::entity::EntityId;
use crate::identifier::Identifier;

// ---------------------------------------------------------------------------
// PowerTypeId
// ---------------------------------------------------------------------------

/// Interned registry index of a [`PowerType`].
///
/// Two power types are the same power type iff their ids are equal.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PowerTypeId(pub(crate) u32);

impl PowerTypeId {
    /// Registry index of this power type.
    pub fn index(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for PowerTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PowerTypeId({})", self.0)
    }
}

// ---------------------------------------------------------------------------
// PowerError
// ---------------------------------------------------------------------------

/// Failure reported by a power's hook or data decoder.
#[derive(Debug, thiserror::Error)]
pub enum PowerError {
    /// A lifecycle hook could not complete.
    #[error("hook failed: {0}")]
    Hook(String),

    /// Persisted data did not match what the power expects.
    #[error("invalid power data: {0}")]
    InvalidData(String),
}

impl From<serde_json::Error> for PowerError {
    fn from(e: serde_json::Error) -> Self {
        PowerError::InvalidData(e.to_string())
    }
}

// ---------------------------------------------------------------------------
// Power
// ---------------------------------------------------------------------------

/// Blanket `Any` access so `dyn Power` can be narrowed to its concrete type.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A live power instance owned by exactly one
/// [`OriginComponent`](crate::component::OriginComponent).
///
/// Every method except [`owner`](Power::owner) has a default so that simple
/// marker powers only need to remember who they belong to.
pub trait Power: AsAny + Send + fmt::Debug {
    /// The entity this power was created for. Never changes.
    fn owner(&self) -> EntityId;

    /// Called once when the power becomes attached to its entity.
    fn on_added(&mut self) -> Result<(), PowerError> {
        Ok(())
    }

    /// Called once when the power is detached from its entity.
    fn on_removed(&mut self) -> Result<(), PowerError> {
        Ok(())
    }

    /// Whether the power currently applies. Inactive powers are skipped by
    /// [`OriginComponent::powers_of`](crate::component::OriginComponent::powers_of)
    /// unless explicitly requested.
    fn is_active(&self) -> bool {
        true
    }

    /// Serialize internal state.
    fn to_data(&self) -> serde_json::Value {
        serde_json::Value::Null
    }

    /// Restore internal state from what [`to_data`](Power::to_data) produced.
    fn from_data(&mut self, _data: &serde_json::Value) -> Result<(), PowerError> {
        Ok(())
    }
}

impl dyn Power {
    /// `true` if the concrete type behind this power is `T`.
    pub fn is<T: Power>(&self) -> bool {
        self.as_any().is::<T>()
    }

    /// Borrow as concrete type `T`, or `None` if it is another type.
    pub fn downcast_ref<T: Power>(&self) -> Option<&T> {
        self.as_any().downcast_ref::<T>()
    }

    /// Mutably borrow as concrete type `T`.
    pub fn downcast_mut<T: Power>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut::<T>()
    }
}

// ---------------------------------------------------------------------------
// PowerType
// ---------------------------------------------------------------------------

/// Constructor for fresh power instances of one type.
pub type PowerFactory = dyn Fn(EntityId) -> Box<dyn Power> + Send + Sync;

/// A registered kind of power: its identity plus a factory.
pub struct PowerType {
    pub(crate) id: PowerTypeId,
    pub(crate) identifier: Identifier,
    pub(crate) factory: Box<PowerFactory>,
}

impl PowerType {
    pub fn id(&self) -> PowerTypeId {
        self.id
    }

    /// Identifier this power type was registered under.
    pub fn identifier(&self) -> &Identifier {
        &self.identifier
    }

    /// Construct a fresh, default-state instance for `owner`.
    pub fn create(&self, owner: EntityId) -> Box<dyn Power> {
        (self.factory)(owner)
    }
}

impl fmt::Debug for PowerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PowerType")
            .field("id", &self.id)
            .field("identifier", &self.identifier)
            .finish_non_exhaustive()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
