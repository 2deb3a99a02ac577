//! Host configuration.

use serde::{Deserialize, Serialize};

/// Tunables for an [`OriginHost`](crate::host::OriginHost).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset.
    /// Default: `"warn"`.
    pub log_filter: String,

    /// Largest sync payload [`OriginHost::apply_packet`](crate::host::OriginHost::apply_packet)
    /// will decode, in bytes. Default: 64 KiB.
    pub max_packet_bytes: usize,

    /// Recompute and compare the BLAKE3 digest before restoring a snapshot.
    /// Default: `true`.
    pub verify_snapshot_hash: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            log_filter: "warn".to_owned(),
            max_packet_bytes: 64 * 1024,
            verify_snapshot_hash: true,
        }
    }
}
