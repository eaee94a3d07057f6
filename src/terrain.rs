//! Terrain heightfield: procedural island generation and brush editing.
//!
//! The heightmap is generated from layered Perlin noise shaped by a radial
//! falloff so every preset produces an island the water cannot leave, then
//! edited interactively with a Gaussian brush. All reads degrade to 0
//! outside the grid; writes outside the grid are no-ops.

use noise::{NoiseFn, Perlin, Seedable};
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridDimensions};

/// Lower clamp for terrain elevation.
pub const MIN_HEIGHT: f32 = 0.0;
/// Upper clamp for terrain elevation.
pub const MAX_HEIGHT: f32 = 40.0;

/// Default brush footprint, in cells.
pub const DEFAULT_BRUSH_RADIUS: f32 = 4.0;
/// Default elevation delta applied at the brush center per stroke.
pub const DEFAULT_BRUSH_STRENGTH: f32 = 1.5;

// =============================================================================
// GENERATION PRESETS
// =============================================================================

/// Terrain generation preset
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TerrainPreset {
    /// Central island with beaches and a couple of summits
    #[default]
    Island,
    /// Tall, craggy interior for springs and fast runoff
    Highlands,
    /// Flat-topped plateau with steep rims that pond water
    Mesa,
    /// Nearly level ground for flooding experiments
    Flats,
}

impl TerrainPreset {
    pub fn all() -> &'static [Self] {
        &[Self::Island, Self::Highlands, Self::Mesa, Self::Flats]
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Island => "Central island with gentle slopes",
            Self::Highlands => "Craggy peaks and valleys",
            Self::Mesa => "Steep-rimmed plateau",
            Self::Flats => "Nearly level ground",
        }
    }
}

impl std::fmt::Display for TerrainPreset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Island => write!(f, "island"),
            Self::Highlands => write!(f, "highlands"),
            Self::Mesa => write!(f, "mesa"),
            Self::Flats => write!(f, "flats"),
        }
    }
}

impl std::str::FromStr for TerrainPreset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "island" => Ok(Self::Island),
            "highlands" => Ok(Self::Highlands),
            "mesa" => Ok(Self::Mesa),
            "flats" => Ok(Self::Flats),
            other => Err(format!("unknown terrain preset '{}'", other)),
        }
    }
}

/// Parameters for terrain generation
#[derive(Clone, Debug, PartialEq)]
pub struct TerrainParams {
    /// Base frequency for the primary noise layer
    pub base_frequency: f64,
    /// Number of noise octaves
    pub octaves: u32,
    /// Amplitude decay per octave (0.0-1.0)
    pub persistence: f64,
    /// Frequency of the secondary detail layer
    pub detail_frequency: f64,
    /// Weight of the detail layer relative to the base layer
    pub detail_weight: f32,
    /// Exponent of the radial island falloff (higher = wider plateau)
    pub falloff_power: f32,
    /// Peak-to-trough scale of the noise contribution
    pub amplitude: f32,
    /// Elevation added everywhere before clamping
    pub base_height: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self::from_preset(TerrainPreset::Island)
    }
}

impl TerrainParams {
    pub fn from_preset(preset: TerrainPreset) -> Self {
        match preset {
            TerrainPreset::Island => Self {
                base_frequency: 2.0,
                octaves: 5,
                persistence: 0.5,
                detail_frequency: 7.0,
                detail_weight: 0.25,
                falloff_power: 2.0,
                amplitude: 14.0,
                base_height: 8.0,
            },
            TerrainPreset::Highlands => Self {
                base_frequency: 2.6,
                octaves: 6,
                persistence: 0.55,
                detail_frequency: 9.0,
                detail_weight: 0.35,
                falloff_power: 2.5,
                amplitude: 22.0,
                base_height: 10.0,
            },
            TerrainPreset::Mesa => Self {
                base_frequency: 1.4,
                octaves: 4,
                persistence: 0.45,
                detail_frequency: 6.0,
                detail_weight: 0.15,
                falloff_power: 6.0,
                amplitude: 9.0,
                base_height: 14.0,
            },
            TerrainPreset::Flats => Self {
                base_frequency: 1.8,
                octaves: 3,
                persistence: 0.4,
                detail_frequency: 5.0,
                detail_weight: 0.1,
                falloff_power: 1.5,
                amplitude: 2.0,
                base_height: 6.0,
            },
        }
    }
}

// =============================================================================
// TERRAIN
// =============================================================================

/// Serialized terrain state for quality-change transplants and save files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TerrainSnapshot {
    pub width: usize,
    pub height: usize,
    pub heights: Vec<f32>,
    pub brush_radius: f32,
    pub brush_strength: f32,
}

/// The editable heightfield.
pub struct Terrain {
    heights: Grid<f32>,
    pub brush_radius: f32,
    pub brush_strength: f32,
    /// Set on any mutation; cleared by the rendering collaborator.
    pub dirty: bool,
}

impl Terrain {
    /// Create a flat terrain at the minimum height.
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            heights: Grid::new_with(dims, MIN_HEIGHT),
            brush_radius: DEFAULT_BRUSH_RADIUS,
            brush_strength: DEFAULT_BRUSH_STRENGTH,
            dirty: true,
        }
    }

    pub fn dims(&self) -> GridDimensions {
        self.heights.dims()
    }

    pub fn width(&self) -> usize {
        self.heights.width()
    }

    pub fn height_cells(&self) -> usize {
        self.heights.height()
    }

    /// Raw heightmap access for renderers and the solver's inner loop.
    pub fn heights(&self) -> &Grid<f32> {
        &self.heights
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.heights.in_bounds(x, y)
    }

    /// Elevation at a cell; 0 outside the grid.
    pub fn height_at(&self, x: i32, y: i32) -> f32 {
        self.heights.value_or(x, y, 0.0)
    }

    /// Elevation at a cell, `None` outside the grid.
    pub fn height_checked(&self, x: i32, y: i32) -> Option<f32> {
        self.heights.at(x, y).copied()
    }

    /// Set a cell's elevation, clamped to the height bounds.
    /// Out-of-range coordinates are a no-op.
    pub fn set_height(&mut self, x: i32, y: i32, h: f32) {
        if self.heights.in_bounds(x, y) {
            self.heights
                .set(x as usize, y as usize, h.clamp(MIN_HEIGHT, MAX_HEIGHT));
            self.dirty = true;
        }
    }

    /// Bilinear elevation sample at fractional coordinates. The corner
    /// samples use the 0-default read, so values ramp to 0 across the
    /// grid edge; the discontinuity there is accepted behavior.
    pub fn height_interpolated(&self, x: f32, y: f32) -> f32 {
        self.heights.sample_bilinear(x, y)
    }

    /// Generate the heightfield for a preset. Deterministic given
    /// `(preset, seed)` and the grid dimensions.
    pub fn generate(&mut self, preset: TerrainPreset, seed: u64) {
        let params = TerrainParams::from_preset(preset);
        self.generate_with_params(&params, seed);
    }

    /// Generate from explicit parameters.
    pub fn generate_with_params(&mut self, params: &TerrainParams, seed: u64) {
        let base_noise = Perlin::new(1).set_seed(seed as u32);
        let detail_noise = Perlin::new(1).set_seed((seed as u32).wrapping_add(1111));

        let dims = self.heights.dims();
        let width = dims.width;
        let height = dims.height;

        for y in 0..height {
            for x in 0..width {
                // Normalize per axis to [-1, 1]; the island falloff uses
                // the Euclidean distance from the center in this space.
                let nx = x as f64 / width as f64 * 2.0 - 1.0;
                let ny = y as f64 / height as f64 * 2.0 - 1.0;

                let base = fbm(
                    &base_noise,
                    nx * params.base_frequency,
                    ny * params.base_frequency,
                    params.octaves,
                    params.persistence,
                    2.0,
                ) as f32;

                let detail = fbm(
                    &detail_noise,
                    nx * params.detail_frequency,
                    ny * params.detail_frequency,
                    3,
                    0.5,
                    2.0,
                ) as f32;

                let dist = ((nx * nx + ny * ny) as f32).sqrt();
                let falloff = (1.0 - dist.powf(params.falloff_power)).max(0.0);

                // Map the combined noise into [0, 1] before scaling so the
                // amplitude controls the full island relief.
                let combined = (base + detail * params.detail_weight) / (1.0 + params.detail_weight);
                let relief = combined * 0.5 + 0.5;

                let elevation = params.base_height + relief * params.amplitude * falloff;
                self.heights
                    .set(x, y, elevation.clamp(MIN_HEIGHT, MAX_HEIGHT));
            }
        }

        self.dirty = true;
    }

    /// Regenerate wholesale, discarding all edits.
    pub fn reset(&mut self, preset: TerrainPreset, seed: u64) {
        self.generate(preset, seed);
    }

    /// Apply a Gaussian-falloff elevation delta around a fractional
    /// center. Positive strength raises, negative lowers; results clamp
    /// to the height bounds.
    pub fn apply_brush(&mut self, cx: f32, cy: f32, signed_strength: f32) {
        let radius = self.brush_radius;
        if radius <= 0.0 {
            return;
        }

        let min_x = (cx - radius).floor() as i32;
        let max_x = (cx + radius).ceil() as i32;
        let min_y = (cy - radius).floor() as i32;
        let max_y = (cy + radius).ceil() as i32;
        let radius_sq = radius * radius;

        let mut touched = false;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if !self.heights.in_bounds(x, y) {
                    continue;
                }
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let dist_sq = dx * dx + dy * dy;
                if dist_sq > radius_sq {
                    continue;
                }

                let delta = signed_strength * (-dist_sq / (radius_sq / 2.0)).exp();
                let current = *self.heights.get(x as usize, y as usize);
                self.heights.set(
                    x as usize,
                    y as usize,
                    (current + delta).clamp(MIN_HEIGHT, MAX_HEIGHT),
                );
                touched = true;
            }
        }

        if touched {
            self.dirty = true;
        }
    }

    /// Raise terrain with the configured brush strength.
    pub fn raise(&mut self, cx: f32, cy: f32) {
        self.apply_brush(cx, cy, self.brush_strength.abs());
    }

    /// Lower terrain with the configured brush strength.
    pub fn lower(&mut self, cx: f32, cy: f32) {
        self.apply_brush(cx, cy, -self.brush_strength.abs());
    }

    /// Serialize heightmap and brush settings.
    pub fn snapshot(&self) -> TerrainSnapshot {
        TerrainSnapshot {
            width: self.heights.width(),
            height: self.heights.height(),
            heights: self.heights.as_slice().to_vec(),
            brush_radius: self.brush_radius,
            brush_strength: self.brush_strength,
        }
    }

    /// Restore from a snapshot, resampling when the snapshot dimensions
    /// differ from this terrain's grid. At matching dimensions the
    /// restore is exact.
    pub fn load_snapshot(&mut self, snapshot: &TerrainSnapshot) {
        let src_dims = GridDimensions::new(snapshot.width, snapshot.height);
        let mut source = Grid::new_with(src_dims, 0.0f32);
        let len = src_dims.cell_count().min(snapshot.heights.len());
        source.as_mut_slice()[..len].copy_from_slice(&snapshot.heights[..len]);

        self.heights = source.resampled(self.heights.dims());
        self.brush_radius = snapshot.brush_radius;
        self.brush_strength = snapshot.brush_strength;
        self.dirty = true;
    }
}

/// Fractional Brownian Motion - multi-octave noise
fn fbm(
    noise: &Perlin,
    x: f64,
    y: f64,
    octaves: u32,
    persistence: f64,
    lacunarity: f64,
) -> f64 {
    let mut total = 0.0;
    let mut amplitude = 1.0;
    let mut frequency = 1.0;
    let mut max_value = 0.0;

    for _ in 0..octaves {
        total += amplitude * noise.get([x * frequency, y * frequency]);
        max_value += amplitude;
        amplitude *= persistence;
        frequency *= lacunarity;
    }

    total / max_value
}
