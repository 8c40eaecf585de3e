//! Checkpoint and restore of the in-flight attribution state.
//!
//! A restarted session must still be able to resolve fills for orders issued
//! before the restart. The checkpoint holds every in-flight attribution entry
//! plus the next order index, wrapped in a JSON envelope with a BLAKE3
//! checksum of the canonical state serialization.

use super::{Attribution, AttributionMap, Portfolio};
use crate::data::PriceProvider;
use crate::domain::{IndexGen, OrderIndex};
use crate::ledger::PositionLedger;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

pub const CHECKPOINT_VERSION: u32 = 1;

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("checkpoint I/O: {0}")]
    Io(String),

    #[error("checkpoint serialization: {0}")]
    Serde(String),

    #[error("checkpoint checksum mismatch: expected {expected}, got {actual}")]
    ChecksumMismatch { expected: String, actual: String },

    #[error("unsupported checkpoint version {0}")]
    UnsupportedVersion(u32),

    #[error("order index {0} appears more than once in checkpoint")]
    DuplicateEntry(OrderIndex),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointEntry {
    pub index: OrderIndex,
    #[serde(flatten)]
    pub attribution: Attribution,
}

/// Serializable attribution state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortfolioCheckpoint {
    pub version: u32,
    pub next_index: OrderIndex,
    pub entries: Vec<CheckpointEntry>,
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    checksum: String,
    state: PortfolioCheckpoint,
}

impl PortfolioCheckpoint {
    /// BLAKE3 of the compact JSON serialization of this state.
    pub fn checksum(&self) -> Result<String, CheckpointError> {
        let canonical =
            serde_json::to_string(self).map_err(|e| CheckpointError::Serde(e.to_string()))?;
        Ok(blake3::hash(canonical.as_bytes()).to_hex().to_string())
    }

    pub fn to_json(&self) -> Result<String, CheckpointError> {
        let envelope = Envelope {
            checksum: self.checksum()?,
            state: self.clone(),
        };
        serde_json::to_string_pretty(&envelope).map_err(|e| CheckpointError::Serde(e.to_string()))
    }

    /// Parse an envelope, verifying checksum and version.
    pub fn from_json(json: &str) -> Result<Self, CheckpointError> {
        let envelope: Envelope =
            serde_json::from_str(json).map_err(|e| CheckpointError::Serde(e.to_string()))?;
        let actual = envelope.state.checksum()?;
        if actual != envelope.checksum {
            return Err(CheckpointError::ChecksumMismatch {
                expected: envelope.checksum,
                actual,
            });
        }
        if envelope.state.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(envelope.state.version));
        }
        Ok(envelope.state)
    }

    /// Write atomically: temp file, then rename.
    pub fn save(&self, path: &Path) -> Result<(), CheckpointError> {
        let json = self.to_json()?;
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json).map_err(|e| CheckpointError::Io(format!("write: {e}")))?;
        fs::rename(&tmp_path, path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            CheckpointError::Io(format!("atomic rename failed: {e}"))
        })
    }

    pub fn load(path: &Path) -> Result<Self, CheckpointError> {
        let json = fs::read_to_string(path)
            .map_err(|e| CheckpointError::Io(format!("read {}: {e}", path.display())))?;
        Self::from_json(&json)
    }

    /// Rebuild the attribution map. Rejects repeated indices.
    pub fn attribution_map(&self) -> Result<AttributionMap, CheckpointError> {
        let mut map = AttributionMap::new();
        for entry in &self.entries {
            map.register(
                entry.index,
                &entry.attribution.strategy,
                &entry.attribution.symbol,
                entry.attribution.remaining,
            )
            .map_err(|_| CheckpointError::DuplicateEntry(entry.index))?;
        }
        Ok(map)
    }
}

impl<L: PositionLedger, P: PriceProvider> Portfolio<L, P> {
    /// Snapshot the in-flight attribution state.
    pub fn checkpoint(&self) -> PortfolioCheckpoint {
        PortfolioCheckpoint {
            version: CHECKPOINT_VERSION,
            next_index: self.index_gen.peek(),
            entries: self
                .attribution
                .iter()
                .map(|(index, attribution)| CheckpointEntry {
                    index,
                    attribution: attribution.clone(),
                })
                .collect(),
        }
    }

    /// Replace the attribution state with a checkpoint's.
    ///
    /// Index generation resumes past both the saved next index and the highest
    /// restored entry, so restored orders can never be re-issued.
    pub fn restore(&mut self, checkpoint: &PortfolioCheckpoint) -> Result<(), CheckpointError> {
        if checkpoint.version != CHECKPOINT_VERSION {
            return Err(CheckpointError::UnsupportedVersion(checkpoint.version));
        }
        let map = checkpoint.attribution_map()?;
        let resume = map
            .max_index()
            .map_or(0, |max| max.0.saturating_add(1))
            .max(checkpoint.next_index.0);

        self.attribution = map;
        self.index_gen = IndexGen::starting_at(resume);
        tracing::info!(
            entries = self.attribution.len(),
            next_index = %self.index_gen.peek(),
            "attribution state restored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::StrategyId;

    fn sample() -> PortfolioCheckpoint {
        PortfolioCheckpoint {
            version: CHECKPOINT_VERSION,
            next_index: OrderIndex(8),
            entries: vec![CheckpointEntry {
                index: OrderIndex(5),
                attribution: Attribution {
                    strategy: StrategyId::new("trend"),
                    symbol: "rb1710".into(),
                    remaining: 20,
                },
            }],
        }
    }

    #[test]
    fn json_envelope_verifies() {
        let cp = sample();
        let json = cp.to_json().unwrap();
        assert!(json.contains("\"checksum\""));
        assert!(json.contains("\"strategy\": \"trend\""));
        assert_eq!(PortfolioCheckpoint::from_json(&json).unwrap(), cp);
    }

    #[test]
    fn tampered_state_fails_checksum() {
        let json = sample().to_json().unwrap().replace("20", "2");
        assert!(matches!(
            PortfolioCheckpoint::from_json(&json),
            Err(CheckpointError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn duplicate_entries_are_rejected() {
        let mut cp = sample();
        cp.entries.push(cp.entries[0].clone());
        assert!(matches!(
            cp.attribution_map(),
            Err(CheckpointError::DuplicateEntry(OrderIndex(5)))
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let mut cp = sample();
        cp.version = 99;
        let json = cp.to_json().unwrap();
        assert!(matches!(
            PortfolioCheckpoint::from_json(&json),
            Err(CheckpointError::UnsupportedVersion(99))
        ));
    }
}
