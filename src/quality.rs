//! Quality presets and the resolution controller.
//!
//! A preset fixes the grid resolution, the world-to-grid scale, and the
//! per-frame simulation step cap. Changing quality rebuilds the
//! terrain/water pair at the new dimensions through the snapshot
//! transplant; the controller itself owns neither - it only supplies
//! dimensions and the adaptive step ceiling the driving loop consults.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::grid::GridDimensions;
use crate::terrain::Terrain;
use crate::water::WaterField;

/// Target frame time the adaptive step cap defends (seconds).
const TARGET_FRAME_SECONDS: f32 = 1.0 / 30.0;

/// EMA weight for new frame-time samples.
const FRAME_SMOOTHING: f32 = 0.1;

/// Selectable quality level.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl QualityLevel {
    pub fn all() -> &'static [Self] {
        &[Self::Low, Self::Medium, Self::High]
    }

    pub fn preset(&self) -> &'static QualityPreset {
        match self {
            Self::Low => &QualityPreset {
                grid_size: 64,
                world_scale: 2.0,
                max_sim_steps: 2,
                label: "Low",
            },
            Self::Medium => &QualityPreset {
                grid_size: 128,
                world_scale: 1.0,
                max_sim_steps: 3,
                label: "Medium",
            },
            Self::High => &QualityPreset {
                grid_size: 192,
                world_scale: 0.667,
                max_sim_steps: 4,
                label: "High",
            },
        }
    }
}

impl std::fmt::Display for QualityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for QualityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("unknown quality level '{}'", other)),
        }
    }
}

/// Immutable per-level settings bundle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct QualityPreset {
    /// Cells per grid side (grids are square).
    pub grid_size: usize,
    /// World units represented by one cell.
    pub world_scale: f32,
    /// Upper bound on fixed simulation steps per rendered frame.
    pub max_sim_steps: u32,
    pub label: &'static str,
}

impl QualityPreset {
    pub fn dims(&self) -> GridDimensions {
        GridDimensions::square(self.grid_size)
    }
}

/// On-disk settings payload.
#[derive(Serialize, Deserialize)]
struct StoredSettings {
    quality: QualityLevel,
}

/// Holds the active quality level and the frame-time estimate behind the
/// adaptive step ceiling.
pub struct QualityController {
    current: QualityLevel,
    settings_path: Option<PathBuf>,
    smoothed_frame: f32,
}

impl QualityController {
    pub fn new(level: QualityLevel) -> Self {
        Self {
            current: level,
            settings_path: None,
            smoothed_frame: 1.0 / 60.0,
        }
    }

    /// Restore the stored level from a settings file (or the default if
    /// the file is missing/unreadable) and persist future changes there.
    pub fn with_settings_file(path: &Path) -> Self {
        let current = read_stored_level(path).unwrap_or_default();
        Self {
            current,
            settings_path: Some(path.to_path_buf()),
            smoothed_frame: 1.0 / 60.0,
        }
    }

    pub fn current_level(&self) -> QualityLevel {
        self.current
    }

    pub fn current_preset(&self) -> &'static QualityPreset {
        self.current.preset()
    }

    /// Switch levels and persist the choice. Persistence failures are
    /// silent: the in-memory switch always wins.
    pub fn set_quality(&mut self, level: QualityLevel) {
        self.current = level;
        if let Some(path) = &self.settings_path {
            let _ = write_stored_level(path, level);
        }
    }

    /// Switch levels from user-facing text. Unknown labels report
    /// failure and change nothing.
    pub fn set_quality_by_name(&mut self, name: &str) -> bool {
        match name.parse::<QualityLevel>() {
            Ok(level) => {
                self.set_quality(level);
                true
            }
            Err(_) => false,
        }
    }

    /// Step ceiling for this frame. Folds the new frame-time sample into
    /// the EMA; while frames run slower than the target, the cap scales
    /// down toward one step so the simulation degrades to slow-motion
    /// instead of dragging the frame rate further down.
    pub fn adaptive_max_steps(&mut self, frame_seconds: f32) -> u32 {
        self.smoothed_frame = self.smoothed_frame * (1.0 - FRAME_SMOOTHING)
            + frame_seconds.max(0.0) * FRAME_SMOOTHING;

        let cap = self.current_preset().max_sim_steps;
        if self.smoothed_frame <= TARGET_FRAME_SECONDS {
            cap
        } else {
            let scaled = cap as f32 * TARGET_FRAME_SECONDS / self.smoothed_frame;
            (scaled.floor() as u32).clamp(1, cap)
        }
    }
}

/// Rebuild a terrain/water pair at new dimensions, transplanting state
/// through snapshots (resampled as needed).
pub fn rebuild_for_dimensions(
    terrain: &Terrain,
    water: &WaterField,
    dims: GridDimensions,
) -> (Terrain, WaterField) {
    let terrain_snapshot = terrain.snapshot();
    let water_snapshot = water.snapshot();

    let mut new_terrain = Terrain::new(dims);
    new_terrain.load_snapshot(&terrain_snapshot);

    let mut new_water = WaterField::new(dims);
    new_water.params = water.params;
    new_water.load_snapshot(&water_snapshot);

    (new_terrain, new_water)
}

fn read_stored_level(path: &Path) -> Option<QualityLevel> {
    let bytes = fs::read(path).ok()?;
    let stored: StoredSettings = serde_json::from_slice(&bytes).ok()?;
    Some(stored.quality)
}

fn write_stored_level(path: &Path, quality: QualityLevel) -> io::Result<()> {
    let stored = StoredSettings { quality };
    let bytes = serde_json::to_vec_pretty(&stored)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("serialize failed: {}", e)))?;
    fs::write(path, bytes)
}
