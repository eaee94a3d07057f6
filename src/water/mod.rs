//! Water field: depth and velocity grids, springs, and direct edits.
//!
//! The field is paired 1:1 with a [`Terrain`] of identical dimensions and
//! advanced by the pressure-based flow solver in [`solver`]. Depth is
//! never negative after a step; all coordinate access degrades silently
//! out of bounds, matching the terrain contract.

pub mod params;
pub mod solver;

pub use params::{WaterParams, DEFAULT_SPRING_FLOW};

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::grid::{Grid, GridDimensions};
use crate::terrain::Terrain;

/// Margin of cells excluded from peak scanning at the grid border.
const PEAK_MARGIN: i32 = 2;

/// Minimum elevation for a cell to qualify as a spring-worthy peak.
const PEAK_MIN_ELEVATION: f32 = 6.0;

/// A fixed cell that injects water at a constant rate every step.
/// Duplicates at the same cell are allowed; their rates simply add.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Spring {
    pub x: i32,
    pub y: i32,
    pub flow_rate: f32,
}

/// Serialized water state for quality-change transplants and save files.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct WaterSnapshot {
    pub width: usize,
    pub height: usize,
    pub depth: Vec<f32>,
    pub velocity_x: Vec<f32>,
    pub velocity_y: Vec<f32>,
    pub springs: Vec<Spring>,
}

/// The simulated water body over a terrain.
pub struct WaterField {
    pub(crate) depth: Grid<f32>,
    pub(crate) depth_next: Grid<f32>,
    pub(crate) velocity_x: Grid<f32>,
    pub(crate) velocity_y: Grid<f32>,
    pub springs: Vec<Spring>,
    pub params: WaterParams,
    /// Set on any mutation; cleared by the rendering collaborator.
    pub dirty: bool,
}

impl WaterField {
    pub fn new(dims: GridDimensions) -> Self {
        Self {
            depth: Grid::new_with(dims, 0.0),
            depth_next: Grid::new_with(dims, 0.0),
            velocity_x: Grid::new_with(dims, 0.0),
            velocity_y: Grid::new_with(dims, 0.0),
            springs: Vec::new(),
            params: WaterParams::default(),
            dirty: true,
        }
    }

    pub fn dims(&self) -> GridDimensions {
        self.depth.dims()
    }

    pub fn width(&self) -> usize {
        self.depth.width()
    }

    pub fn height_cells(&self) -> usize {
        self.depth.height()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.depth.in_bounds(x, y)
    }

    /// Water depth at a cell; 0 outside the grid.
    pub fn depth_at(&self, x: i32, y: i32) -> f32 {
        self.depth.value_or(x, y, 0.0)
    }

    /// Water depth at a cell, `None` outside the grid.
    pub fn depth_checked(&self, x: i32, y: i32) -> Option<f32> {
        self.depth.at(x, y).copied()
    }

    /// Raw depth array, consumed directly by rendering and zone queries.
    pub fn depth_raw(&self) -> &[f32] {
        self.depth.as_slice()
    }

    pub fn velocity_x_raw(&self) -> &[f32] {
        self.velocity_x.as_slice()
    }

    pub fn velocity_y_raw(&self) -> &[f32] {
        self.velocity_y.as_slice()
    }

    /// Advance the simulation by one fixed step.
    pub fn simulate(&mut self, terrain: &Terrain, dt: f32) {
        solver::step(self, terrain, dt);
    }

    /// Deposit water in a disc with linear falloff from the center
    /// (deliberately not the terrain brush's Gaussian, so dropped water
    /// reads as a splash rather than a mound).
    pub fn add_water(&mut self, cx: f32, cy: f32, amount: f32, radius: f32) {
        if radius <= 0.0 || amount <= 0.0 {
            return;
        }

        let min_x = (cx - radius).floor() as i32;
        let max_x = (cx + radius).ceil() as i32;
        let min_y = (cy - radius).floor() as i32;
        let max_y = (cy + radius).ceil() as i32;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if !self.depth.in_bounds(x, y) {
                    continue;
                }
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                let dist = (dx * dx + dy * dy).sqrt();
                if dist > radius {
                    continue;
                }
                let deposit = amount * (1.0 - dist / radius);
                *self.depth.get_mut(x as usize, y as usize) += deposit;
            }
        }

        self.dirty = true;
    }

    /// Add a spring. Out-of-bounds springs are accepted but inert.
    pub fn add_spring(&mut self, x: i32, y: i32, flow_rate: f32) {
        self.springs.push(Spring { x, y, flow_rate });
        self.dirty = true;
    }

    /// Remove every spring within `radius` of a point.
    pub fn remove_springs_near(&mut self, cx: f32, cy: f32, radius: f32) {
        let radius_sq = radius * radius;
        self.springs.retain(|s| {
            let dx = s.x as f32 - cx;
            let dy = s.y as f32 - cy;
            dx * dx + dy * dy > radius_sq
        });
        self.dirty = true;
    }

    pub fn clear_springs(&mut self) {
        self.springs.clear();
        self.dirty = true;
    }

    /// Zero all depth and velocity. Springs survive a reset; use
    /// [`clear_springs`](Self::clear_springs) to drop them too.
    pub fn reset(&mut self) {
        self.depth.fill(0.0);
        self.depth_next.fill(0.0);
        self.velocity_x.fill(0.0);
        self.velocity_y.fill(0.0);
        self.dirty = true;
    }

    /// Total water volume over the whole grid. O(N) - meant for periodic
    /// display, not the per-step loop.
    pub fn total_water(&self) -> f64 {
        self.depth.as_slice().iter().map(|&d| d as f64).sum()
    }

    /// Find up to `count` terrain summits: cells strictly higher than all
    /// 8 neighbors, above the minimum elevation, kept only if far enough
    /// from every previously chosen peak.
    pub fn find_peaks(&self, terrain: &Terrain, count: usize) -> Vec<(i32, i32)> {
        let dims = self.dims();
        let w = dims.width as i32;
        let h = dims.height as i32;
        let min_separation = peak_separation(dims);
        let min_sep_sq = min_separation * min_separation;

        let mut candidates: Vec<(i32, i32, f32)> = Vec::new();
        for y in PEAK_MARGIN..h - PEAK_MARGIN {
            for x in PEAK_MARGIN..w - PEAK_MARGIN {
                let elevation = terrain.height_at(x, y);
                if elevation < PEAK_MIN_ELEVATION {
                    continue;
                }

                let mut is_peak = true;
                for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        if terrain.height_at(x + dx, y + dy) >= elevation {
                            is_peak = false;
                        }
                    }
                }

                if is_peak {
                    candidates.push((x, y, elevation));
                }
            }
        }

        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let mut peaks: Vec<(i32, i32)> = Vec::with_capacity(count);
        for (x, y, _) in candidates {
            if peaks.len() >= count {
                break;
            }
            let far_enough = peaks.iter().all(|&(px, py)| {
                let dx = (px - x) as f32;
                let dy = (py - y) as f32;
                dx * dx + dy * dy >= min_sep_sq
            });
            if far_enough {
                peaks.push((x, y));
            }
        }

        peaks
    }

    /// Replace all springs with one per found peak at the default rate.
    pub fn auto_generate_springs(&mut self, terrain: &Terrain, count: usize) -> usize {
        self.clear_springs();
        let peaks = self.find_peaks(terrain, count);
        for &(x, y) in &peaks {
            self.add_spring(x, y, DEFAULT_SPRING_FLOW);
        }
        peaks.len()
    }

    /// Sprinkle `drops` random rain deposits over the grid.
    pub fn rain<R: Rng>(&mut self, rng: &mut R, drops: usize, amount: f32, radius: f32) {
        let dims = self.dims();
        for _ in 0..drops {
            let x = rng.gen_range(0.0..dims.width as f32);
            let y = rng.gen_range(0.0..dims.height as f32);
            self.add_water(x, y, amount, radius);
        }
    }

    /// Serialize depth, velocity and springs.
    pub fn snapshot(&self) -> WaterSnapshot {
        WaterSnapshot {
            width: self.depth.width(),
            height: self.depth.height(),
            depth: self.depth.as_slice().to_vec(),
            velocity_x: self.velocity_x.as_slice().to_vec(),
            velocity_y: self.velocity_y.as_slice().to_vec(),
            springs: self.springs.clone(),
        }
    }

    /// Restore from a snapshot, resampling grids and rescaling spring
    /// coordinates when dimensions differ. Exact at matching dimensions.
    pub fn load_snapshot(&mut self, snapshot: &WaterSnapshot) {
        let src_dims = GridDimensions::new(snapshot.width, snapshot.height);
        let dst_dims = self.dims();

        self.depth = grid_from_slice(src_dims, &snapshot.depth).resampled(dst_dims);
        self.velocity_x = grid_from_slice(src_dims, &snapshot.velocity_x).resampled(dst_dims);
        self.velocity_y = grid_from_slice(src_dims, &snapshot.velocity_y).resampled(dst_dims);
        self.depth_next = Grid::new_with(dst_dims, 0.0);

        let scale_x = dst_dims.width as f32 / src_dims.width.max(1) as f32;
        let scale_y = dst_dims.height as f32 / src_dims.height.max(1) as f32;
        self.springs = snapshot
            .springs
            .iter()
            .map(|s| Spring {
                x: ((s.x as f32 * scale_x) as i32).clamp(0, dst_dims.width as i32 - 1),
                y: ((s.y as f32 * scale_y) as i32).clamp(0, dst_dims.height as i32 - 1),
                flow_rate: s.flow_rate,
            })
            .collect();

        self.dirty = true;
    }
}

/// Minimum pairwise distance between auto-placed springs, scaled to the
/// grid so peak spacing feels the same at every quality level.
fn peak_separation(dims: GridDimensions) -> f32 {
    (dims.width.min(dims.height) as f32 / 8.0).max(3.0)
}

fn grid_from_slice(dims: GridDimensions, values: &[f32]) -> Grid<f32> {
    let mut grid = Grid::new_with(dims, 0.0f32);
    let len = dims.cell_count().min(values.len());
    grid.as_mut_slice()[..len].copy_from_slice(&values[..len]);
    grid
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::{TerrainPreset, MAX_HEIGHT, MIN_HEIGHT};

    fn flat_pair(size: usize) -> (Terrain, WaterField) {
        let dims = GridDimensions::square(size);
        let mut water = WaterField::new(dims);
        water.params = WaterParams::lossless();
        (Terrain::new(dims), water)
    }

    #[test]
    fn test_add_water_linear_falloff() {
        let (_, mut water) = flat_pair(12);
        water.add_water(5.0, 5.0, 50.0, 3.0);

        let center = water.depth_at(5, 5);
        let edge = water.depth_at(5, 8);
        let outside = water.depth_at(5, 9);

        assert!(center > edge);
        assert!((center - 50.0).abs() < 1e-4);
        assert!(edge >= 0.0 && edge < 1e-4); // dist == radius deposits zero
        assert_eq!(outside, 0.0);

        let inner = water.depth_at(5, 6);
        assert!(inner > 0.0 && inner < center);
    }

    #[test]
    fn test_depth_reads_are_bounds_safe() {
        let (_, water) = flat_pair(10);
        assert_eq!(water.depth_at(-1, 0), 0.0);
        assert_eq!(water.depth_at(0, -1), 0.0);
        assert_eq!(water.depth_at(10, 3), 0.0);
        assert_eq!(water.depth_at(i32::MIN, i32::MAX), 0.0);
        assert!(water.depth_checked(-1, -1).is_none());
    }

    #[test]
    fn test_duplicate_springs_add_their_rates() {
        let (mut terrain, mut water) = flat_pair(12);
        // Pit: everything high except the spring cell, so no outflow.
        for y in 0..12 {
            for x in 0..12 {
                terrain.set_height(x, y, MAX_HEIGHT);
            }
        }
        terrain.set_height(5, 5, MIN_HEIGHT);

        water.add_spring(5, 5, 30.0);
        water.add_spring(5, 5, 30.0);

        let dt = 1.0 / 60.0;
        for _ in 0..6 {
            water.simulate(&terrain, dt);
        }
        assert!((water.depth_at(5, 5) - 60.0 * dt * 6.0).abs() < 1e-3);
    }

    #[test]
    fn test_out_of_bounds_spring_is_inert() {
        let (terrain, mut water) = flat_pair(10);
        water.add_spring(-3, 40, 100.0);
        for _ in 0..30 {
            water.simulate(&terrain, 1.0 / 60.0);
        }
        assert_eq!(water.total_water(), 0.0);
    }

    #[test]
    fn test_remove_springs_near_filters_by_radius() {
        let (_, mut water) = flat_pair(20);
        water.add_spring(2, 2, 10.0);
        water.add_spring(10, 10, 10.0);
        water.add_spring(11, 11, 10.0);

        water.remove_springs_near(10.0, 10.0, 2.5);
        assert_eq!(water.springs.len(), 1);
        assert_eq!((water.springs[0].x, water.springs[0].y), (2, 2));
    }

    #[test]
    fn test_reset_keeps_springs_clear_springs_drops_them() {
        let (_, mut water) = flat_pair(10);
        water.add_spring(4, 4, 5.0);
        water.add_water(4.0, 4.0, 10.0, 2.0);

        water.reset();
        assert_eq!(water.total_water(), 0.0);
        assert_eq!(water.springs.len(), 1);

        water.clear_springs();
        assert!(water.springs.is_empty());
    }

    #[test]
    fn test_find_peaks_respects_separation() {
        let dims = GridDimensions::square(64);
        let mut terrain = Terrain::new(dims);
        terrain.generate(TerrainPreset::Highlands, 2024);
        let water = WaterField::new(dims);

        let peaks = water.find_peaks(&terrain, 8);
        let min_sep = peak_separation(dims);
        for (i, &(ax, ay)) in peaks.iter().enumerate() {
            for &(bx, by) in &peaks[i + 1..] {
                let dx = (ax - bx) as f32;
                let dy = (ay - by) as f32;
                assert!(
                    (dx * dx + dy * dy).sqrt() >= min_sep,
                    "peaks ({},{}) and ({},{}) too close",
                    ax, ay, bx, by
                );
            }
        }
    }

    #[test]
    fn test_find_peaks_are_local_maxima() {
        let dims = GridDimensions::square(48);
        let mut terrain = Terrain::new(dims);
        terrain.generate(TerrainPreset::Island, 31);
        let water = WaterField::new(dims);

        for (x, y) in water.find_peaks(&terrain, 5) {
            let h = terrain.height_at(x, y);
            assert!(h >= PEAK_MIN_ELEVATION);
            for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    assert!(terrain.height_at(x + dx, y + dy) < h);
                }
            }
        }
    }

    #[test]
    fn test_auto_generate_springs_replaces_existing() {
        let dims = GridDimensions::square(48);
        let mut terrain = Terrain::new(dims);
        terrain.generate(TerrainPreset::Highlands, 8);
        let mut water = WaterField::new(dims);

        water.add_spring(1, 1, 99.0);
        let placed = water.auto_generate_springs(&terrain, 4);

        assert_eq!(water.springs.len(), placed);
        assert!(placed <= 4);
        assert!(water.springs.iter().all(|s| s.flow_rate == DEFAULT_SPRING_FLOW));
        assert!(!water.springs.iter().any(|s| s.x == 1 && s.y == 1));
    }

    #[test]
    fn test_snapshot_round_trip_is_exact() {
        let dims = GridDimensions::square(24);
        let mut terrain = Terrain::new(dims);
        terrain.generate(TerrainPreset::Island, 5);
        let mut water = WaterField::new(dims);
        water.params = WaterParams::lossless();
        water.add_water(12.0, 12.0, 20.0, 5.0);
        water.add_spring(6, 6, 12.5);
        for _ in 0..30 {
            water.simulate(&terrain, 1.0 / 60.0);
        }

        let snapshot = water.snapshot();
        let mut restored = WaterField::new(dims);
        restored.load_snapshot(&snapshot);

        assert_eq!(water.depth_raw(), restored.depth_raw());
        assert_eq!(water.velocity_x_raw(), restored.velocity_x_raw());
        assert_eq!(water.velocity_y_raw(), restored.velocity_y_raw());
        assert_eq!(water.springs, restored.springs);
    }

    #[test]
    fn test_snapshot_rescales_springs_on_resize() {
        let mut water = WaterField::new(GridDimensions::square(32));
        water.add_spring(16, 16, 10.0);
        water.add_water(16.0, 16.0, 8.0, 4.0);
        let snapshot = water.snapshot();

        let mut smaller = WaterField::new(GridDimensions::square(16));
        smaller.load_snapshot(&snapshot);

        assert_eq!(smaller.springs.len(), 1);
        assert_eq!((smaller.springs[0].x, smaller.springs[0].y), (8, 8));
        assert!(smaller.depth_at(8, 8) > 0.0);
    }
}
