//! Origins host -- entity table and persistence around [`origins_core`].
//!
//! This crate plays the part of the runtime that owns entities: it attaches
//! an [`OriginComponent`](origins_core::component::OriginComponent) to every
//! spawned entity, routes reassignment, persistence, and network sync to it,
//! and saves or restores every entity at once through hash-verified
//! snapshots.
//!
//! # Modules
//!
//! - [`config`]: [`HostConfig`](config::HostConfig) tunables.
//! - [`logging`]: `tracing-subscriber` setup.
//! - [`host`]: the [`OriginHost`](host::OriginHost) entity table.
//! - [`snapshot`]: whole-host snapshot, restore, and JSON files.

#![deny(unsafe_code)]

pub mod config;
pub mod host;
pub mod logging;
pub mod snapshot;

/// Re-export the core crate for convenience.
pub use origins_core;

use origins_core::entity::EntityId;
use origins_core::OriginsError;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors produced by [`OriginHost`](host::OriginHost) operations.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The entity does not exist (despawned, stale generation, or never allocated).
    #[error("entity {entity:?} does not exist (stale or never allocated)")]
    StaleEntity { entity: EntityId },

    /// A sync payload exceeded [`HostConfig::max_packet_bytes`](config::HostConfig::max_packet_bytes).
    #[error("sync payload for {entity} is {size} bytes, limit is {limit}")]
    PacketTooLarge {
        entity: EntityId,
        size: usize,
        limit: usize,
    },

    /// The component rejected the operation.
    #[error(transparent)]
    Origins(#[from] OriginsError),
}

// ---------------------------------------------------------------------------
// Prelude
// ---------------------------------------------------------------------------

/// Convenience re-exports for common host usage.
pub mod prelude {
    pub use origins_core::prelude::*;

    pub use crate::config::HostConfig;
    pub use crate::host::OriginHost;
    pub use crate::logging::init_tracing;
    pub use crate::snapshot::{EntityProfile, HostSnapshot};
    pub use crate::HostError;
}
