//! Sandbox save files: versioned JSON snapshots of the whole state.
//!
//! The same snapshot types the quality controller uses for resize
//! transplants double as the save format, wrapped with a version number
//! so newer files are rejected instead of misread.

use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::quality::QualityLevel;
use crate::terrain::TerrainSnapshot;
use crate::water::WaterSnapshot;

const SNAPSHOT_VERSION: u32 = 1;

/// Complete sandbox state: quality level plus both field snapshots.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SandboxSnapshot {
    pub quality: QualityLevel,
    pub terrain: TerrainSnapshot,
    pub water: WaterSnapshot,
}

/// On-disk wrapper with a format version for forward compatibility.
#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    snapshot: SandboxSnapshot,
}

/// Write a snapshot as pretty JSON.
pub fn save_snapshot(snapshot: &SandboxSnapshot, path: &Path) -> io::Result<()> {
    let file = SnapshotFile {
        version: SNAPSHOT_VERSION,
        snapshot: snapshot.clone(),
    };

    let bytes = serde_json::to_vec_pretty(&file).map_err(|e| {
        io::Error::new(io::ErrorKind::Other, format!("serialization failed: {}", e))
    })?;

    fs::write(path, bytes)
}

/// Read a snapshot back, rejecting files written by a newer format.
pub fn load_snapshot(path: &Path) -> io::Result<SandboxSnapshot> {
    let bytes = fs::read(path)?;

    let file: SnapshotFile = serde_json::from_slice(&bytes).map_err(|e| {
        io::Error::new(io::ErrorKind::InvalidData, format!("deserialization failed: {}", e))
    })?;

    if file.version > SNAPSHOT_VERSION {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!(
                "snapshot version {} is newer than supported version {}",
                file.version, SNAPSHOT_VERSION,
            ),
        ));
    }

    Ok(file.snapshot)
}
