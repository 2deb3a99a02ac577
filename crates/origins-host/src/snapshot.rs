//! Whole-host snapshot and restore with BLAKE3 hashing.
//!
//! A [`HostSnapshot`] captures the entity allocator and the persisted record
//! of every live entity's origin component, plus a BLAKE3 digest of both.
//! Restoring rebuilds every component from scratch through the persisted
//! load path, so restored powers receive `on_added` exactly as they would when
//! an entity is loaded from disk.
//!
//! The registry is not part of the snapshot: origins and power types must be
//! registered before restoring. Records referencing origins or power types
//! that no longer exist degrade the usual way (empty origin, dropped power).

use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::Path;
use std::sync::Arc;

use origins_core::component::OriginComponent;
use origins_core::entity::{AllocatorState, EntityAllocator, EntityId};
use origins_core::record::ProfileRecord;
use serde::{Deserialize, Serialize};

use crate::host::OriginHost;

// ---------------------------------------------------------------------------
// Snapshot types
// ---------------------------------------------------------------------------

/// Persisted origin state of one entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityProfile {
    pub entity_id: EntityId,
    pub record: ProfileRecord,
}

/// Allocator state and every live entity's persisted record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HostSnapshot {
    pub allocator: AllocatorState,
    /// One entry per live entity, ordered by entity id.
    pub profiles: Vec<EntityProfile>,
    /// BLAKE3 hex digest (64 lowercase hex chars) of `allocator` + `profiles`.
    pub hash: String,
}

fn compute_hash(allocator: &AllocatorState, profiles: &[EntityProfile]) -> Result<String, anyhow::Error> {
    #[derive(Serialize)]
    struct HashableState<'a> {
        allocator: &'a AllocatorState,
        profiles: &'a [EntityProfile],
    }

    let json_bytes = serde_json::to_vec(&HashableState {
        allocator,
        profiles,
    })
    .map_err(|e| anyhow::anyhow!("failed to serialize snapshot state for hashing: {e}"))?;

    Ok(blake3::hash(&json_bytes).to_hex().to_string())
}

// ---------------------------------------------------------------------------
// OriginHost snapshot/restore methods
// ---------------------------------------------------------------------------

impl OriginHost {
    /// Capture the persisted state of every live entity.
    pub fn capture_snapshot(&self) -> Result<HostSnapshot, anyhow::Error> {
        let allocator = self.allocator.state();
        let profiles: Vec<EntityProfile> = self
            .components
            .iter()
            .map(|(&entity_id, component)| EntityProfile {
                entity_id,
                record: component.to_persisted(),
            })
            .collect();
        let hash = compute_hash(&allocator, &profiles)?;
        Ok(HostSnapshot {
            allocator,
            profiles,
            hash,
        })
    }

    /// Replace every entity with the contents of `snapshot`.
    ///
    /// Validation happens before any state changes: hash (when
    /// [`HostConfig::verify_snapshot_hash`](crate::config::HostConfig::verify_snapshot_hash)
    /// is set), allocator consistency, and a one-to-one match between live
    /// allocator slots and profiles. Existing components are dropped without
    /// hooks, as with [`despawn`](OriginHost::despawn).
    ///
    /// # Errors
    ///
    /// Returns an error if validation fails or if a restored power's
    /// `on_added` hook fails. In the latter case the host already holds the
    /// restored entities.
    pub fn restore_from_snapshot(&mut self, snapshot: &HostSnapshot) -> Result<(), anyhow::Error> {
        if self.config().verify_snapshot_hash {
            let expected = compute_hash(&snapshot.allocator, &snapshot.profiles)?;
            if expected != snapshot.hash {
                return Err(anyhow::anyhow!(
                    "snapshot hash mismatch: recorded {} but recomputed {}. \
                     The snapshot may be corrupted or tampered with.",
                    snapshot.hash,
                    expected
                ));
            }
        }

        let allocator = EntityAllocator::from_state(&snapshot.allocator).ok_or_else(|| {
            anyhow::anyhow!("snapshot allocator state is inconsistent (bad lengths or free list)")
        })?;

        let mut seen = HashSet::new();
        for profile in &snapshot.profiles {
            if !allocator.is_alive(profile.entity_id) {
                return Err(anyhow::anyhow!(
                    "snapshot has a profile for {} which the allocator does not mark alive",
                    profile.entity_id
                ));
            }
            if !seen.insert(profile.entity_id) {
                return Err(anyhow::anyhow!(
                    "snapshot has more than one profile for {}",
                    profile.entity_id
                ));
            }
        }
        if let Some(missing) = allocator.alive_ids().find(|id| !seen.contains(id)) {
            return Err(anyhow::anyhow!(
                "snapshot has {} profiles but {} live entities; {missing} has no profile",
                seen.len(),
                allocator.alive_count()
            ));
        }

        self.allocator = allocator;
        self.components = snapshot
            .profiles
            .iter()
            .map(|p| {
                (
                    p.entity_id,
                    OriginComponent::new(p.entity_id, Arc::clone(self.registry())),
                )
            })
            .collect::<BTreeMap<_, _>>();

        for profile in &snapshot.profiles {
            if let Some(component) = self.components.get_mut(&profile.entity_id) {
                component.load_persisted(&profile.record).map_err(|e| {
                    anyhow::anyhow!("failed to restore {}: {e}", profile.entity_id)
                })?;
            }
        }
        Ok(())
    }

    /// Recompute the digest of the current state without keeping the
    /// snapshot.
    pub fn state_hash(&self) -> Result<String, anyhow::Error> {
        Ok(self.capture_snapshot()?.hash)
    }

    /// Write a snapshot of the host to `path` as pretty-printed JSON.
    pub fn save_to_path(&self, path: &Path) -> Result<(), anyhow::Error> {
        let snapshot = self.capture_snapshot()?;
        let json = serde_json::to_vec_pretty(&snapshot)
            .map_err(|e| anyhow::anyhow!("failed to serialize snapshot: {e}"))?;
        fs::write(path, json)
            .map_err(|e| anyhow::anyhow!("failed to write snapshot to {}: {e}", path.display()))?;
        tracing::info!(
            path = %path.display(),
            entities = snapshot.profiles.len(),
            "host snapshot saved"
        );
        Ok(())
    }

    /// Read a snapshot written by [`save_to_path`](Self::save_to_path) and
    /// restore it.
    pub fn load_from_path(&mut self, path: &Path) -> Result<(), anyhow::Error> {
        let bytes = fs::read(path)
            .map_err(|e| anyhow::anyhow!("failed to read snapshot from {}: {e}", path.display()))?;
        let snapshot: HostSnapshot = serde_json::from_slice(&bytes)
            .map_err(|e| anyhow::anyhow!("failed to parse snapshot {}: {e}", path.display()))?;
        self.restore_from_snapshot(&snapshot)?;
        tracing::info!(
            path = %path.display(),
            entities = snapshot.profiles.len(),
            "host snapshot loaded"
        );
        Ok(())
    }
}
