//! Zone queries: aggregate water/terrain reads over discs and rectangles.
//!
//! Game-mode logic polls these once per frame to evaluate objectives
//! (did the basin fill, is water flowing through the gate, where can a
//! target spawn). Everything here is a pure function of current grid
//! state; nothing is cached and nothing mutates.

use rand::Rng;

use crate::terrain::Terrain;
use crate::water::WaterField;

/// Depth a cell must reach for the existence check to count it.
pub const DEFAULT_MIN_DEPTH: f32 = 0.5;

/// Cells shallower than this are ignored by flow queries; a film of
/// leftover water should not read as a current.
pub const FLOW_ACTIVITY_THRESHOLD: f32 = 0.1;

/// Attempts before a rejection-sampled position search gives up.
const RANDOM_POSITION_ATTEMPTS: usize = 50;

/// Average flow over a disc: mean velocity vector plus its magnitude.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FlowSample {
    pub velocity_x: f32,
    pub velocity_y: f32,
    pub speed: f32,
}

/// Read-only view over a paired terrain and water field.
pub struct ZoneDetector<'a> {
    terrain: &'a Terrain,
    water: &'a WaterField,
}

impl<'a> ZoneDetector<'a> {
    pub fn new(terrain: &'a Terrain, water: &'a WaterField) -> Self {
        Self { terrain, water }
    }

    /// Total water volume inside a disc.
    pub fn water_in_circle(&self, cx: f32, cy: f32, radius: f32) -> f32 {
        let mut total = 0.0;
        self.for_each_in_circle(cx, cy, radius, |x, y| {
            total += self.water.depth_at(x, y);
        });
        total
    }

    /// Total water volume inside an axis-aligned rectangle (inclusive
    /// cell bounds).
    pub fn water_in_rect(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> f32 {
        let mut total = 0.0;
        for y in min_y..=max_y {
            for x in min_x..=max_x {
                total += self.water.depth_at(x, y);
            }
        }
        total
    }

    /// Mean depth over a disc; 0 when the disc covers no cells.
    pub fn average_depth_in_circle(&self, cx: f32, cy: f32, radius: f32) -> f32 {
        let mut total = 0.0;
        let mut count = 0u32;
        self.for_each_in_circle(cx, cy, radius, |x, y| {
            total += self.water.depth_at(x, y);
            count += 1;
        });
        if count == 0 {
            0.0
        } else {
            total / count as f32
        }
    }

    /// Has the disc accumulated at least `threshold` volume?
    pub fn circle_filled(&self, cx: f32, cy: f32, radius: f32, threshold: f32) -> bool {
        self.water_in_circle(cx, cy, radius) >= threshold
    }

    /// Has the rectangle accumulated at least `threshold` volume?
    pub fn rect_filled(&self, min_x: i32, min_y: i32, max_x: i32, max_y: i32, threshold: f32) -> bool {
        self.water_in_rect(min_x, min_y, max_x, max_y) >= threshold
    }

    /// Any cell in the disc at or above [`DEFAULT_MIN_DEPTH`]?
    pub fn has_water(&self, cx: f32, cy: f32, radius: f32) -> bool {
        self.has_water_above(cx, cy, radius, DEFAULT_MIN_DEPTH)
    }

    /// Any cell in the disc at or above `min_depth`? Short-circuits on
    /// the first hit.
    pub fn has_water_above(&self, cx: f32, cy: f32, radius: f32, min_depth: f32) -> bool {
        let min_x = (cx - radius).floor() as i32;
        let max_x = (cx + radius).ceil() as i32;
        let min_y = (cy - radius).floor() as i32;
        let max_y = (cy + radius).ceil() as i32;
        let radius_sq = radius * radius;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius_sq && self.water.depth_at(x, y) >= min_depth {
                    return true;
                }
            }
        }
        false
    }

    /// Average velocity over the disc's active cells (depth above
    /// [`FLOW_ACTIVITY_THRESHOLD`]). Zero sample when nothing qualifies.
    pub fn flow_in_circle(&self, cx: f32, cy: f32, radius: f32) -> FlowSample {
        let vx_raw = self.water.velocity_x_raw();
        let vy_raw = self.water.velocity_y_raw();
        let width = self.water.width();

        let mut sum_x = 0.0f32;
        let mut sum_y = 0.0f32;
        let mut count = 0u32;
        self.for_each_in_circle(cx, cy, radius, |x, y| {
            if self.water.depth_at(x, y) > FLOW_ACTIVITY_THRESHOLD {
                let idx = y as usize * width + x as usize;
                sum_x += vx_raw[idx];
                sum_y += vy_raw[idx];
                count += 1;
            }
        });

        if count == 0 {
            return FlowSample::default();
        }
        let velocity_x = sum_x / count as f32;
        let velocity_y = sum_y / count as f32;
        FlowSample {
            velocity_x,
            velocity_y,
            speed: (velocity_x * velocity_x + velocity_y * velocity_y).sqrt(),
        }
    }

    /// Convenience pass-through so game logic needs only one handle.
    pub fn terrain_height(&self, x: i32, y: i32) -> f32 {
        self.terrain.height_at(x, y)
    }

    /// Rejection-sample an interior cell whose terrain height lies in
    /// `[min_height, max_height]`. Falls back to the grid center when no
    /// attempt lands in range.
    pub fn random_position<R: Rng>(
        &self,
        rng: &mut R,
        margin: i32,
        min_height: f32,
        max_height: f32,
    ) -> (i32, i32) {
        let dims = self.terrain.dims();
        let max_x = dims.width as i32 - margin;
        let max_y = dims.height as i32 - margin;

        if margin < max_x && margin < max_y {
            for _ in 0..RANDOM_POSITION_ATTEMPTS {
                let x = rng.gen_range(margin..max_x);
                let y = rng.gen_range(margin..max_y);
                let h = self.terrain.height_at(x, y);
                if h >= min_height && h <= max_height {
                    return (x, y);
                }
            }
        }

        dims.center()
    }

    /// Visit every in-bounds cell whose center lies inside the disc.
    /// Off-grid parts of the disc are not visited, so averages count
    /// only real cells.
    fn for_each_in_circle<F: FnMut(i32, i32)>(&self, cx: f32, cy: f32, radius: f32, mut f: F) {
        let min_x = (cx - radius).floor() as i32;
        let max_x = (cx + radius).ceil() as i32;
        let min_y = (cy - radius).floor() as i32;
        let max_y = (cy + radius).ceil() as i32;
        let radius_sq = radius * radius;

        for y in min_y..=max_y {
            for x in min_x..=max_x {
                if !self.water.in_bounds(x, y) {
                    continue;
                }
                let dx = x as f32 - cx;
                let dy = y as f32 - cy;
                if dx * dx + dy * dy <= radius_sq {
                    f(x, y);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    use crate::grid::GridDimensions;
    use crate::terrain::TerrainPreset;
    use crate::water::WaterParams;

    fn flat_pair(size: usize) -> (Terrain, WaterField) {
        let dims = GridDimensions::square(size);
        let mut water = WaterField::new(dims);
        water.params = WaterParams::lossless();
        (Terrain::new(dims), water)
    }

    #[test]
    fn test_water_in_circle_counts_deposit() {
        let (terrain, mut water) = flat_pair(20);
        water.add_water(10.0, 10.0, 4.0, 2.0);
        let total = water.total_water() as f32;

        let zones = ZoneDetector::new(&terrain, &water);
        let in_circle = zones.water_in_circle(10.0, 10.0, 3.0);
        assert!((in_circle - total).abs() < 1e-4);

        let elsewhere = zones.water_in_circle(2.0, 2.0, 2.0);
        assert_eq!(elsewhere, 0.0);
    }

    #[test]
    fn test_rect_query_and_fill_threshold() {
        let (terrain, mut water) = flat_pair(16);
        water.add_water(8.0, 8.0, 6.0, 1.5);
        let total = water.total_water() as f32;

        let zones = ZoneDetector::new(&terrain, &water);
        assert!((zones.water_in_rect(5, 5, 11, 11) - total).abs() < 1e-4);
        assert!(zones.rect_filled(5, 5, 11, 11, total * 0.9));
        assert!(!zones.rect_filled(0, 0, 3, 3, 0.1));
        // Rectangles reaching outside the grid read zeros there.
        assert!((zones.water_in_rect(-10, -10, 30, 30) - total).abs() < 1e-4);
    }

    #[test]
    fn test_average_depth_zero_for_empty_disc() {
        let (terrain, water) = flat_pair(12);
        let zones = ZoneDetector::new(&terrain, &water);
        assert_eq!(zones.average_depth_in_circle(6.0, 6.0, 2.0), 0.0);
        // Disc entirely off-grid covers no in-bounds cells but still
        // yields a defined 0.
        assert_eq!(zones.average_depth_in_circle(-40.0, -40.0, 2.0), 0.0);
    }

    #[test]
    fn test_average_at_grid_edge_counts_only_real_cells() {
        let (terrain, mut water) = flat_pair(12);
        // Uniform depth everywhere; a disc hanging off the corner must
        // still average to exactly that depth.
        for y in 0..12 {
            for x in 0..12 {
                water.add_water(x as f32, y as f32, 2.0, 0.5);
            }
        }
        let zones = ZoneDetector::new(&terrain, &water);
        let avg = zones.average_depth_in_circle(0.0, 0.0, 3.0);
        assert!((avg - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_has_water_uses_min_depth() {
        let (terrain, mut water) = flat_pair(12);
        water.add_water(6.0, 6.0, 0.3, 1.0);

        let zones = ZoneDetector::new(&terrain, &water);
        assert!(!zones.has_water(6.0, 6.0, 2.0)); // below the 0.5 default
        assert!(zones.has_water_above(6.0, 6.0, 2.0, 0.1));

        water.add_water(6.0, 6.0, 1.0, 1.0);
        let zones = ZoneDetector::new(&terrain, &water);
        assert!(zones.has_water(6.0, 6.0, 2.0));
    }

    #[test]
    fn test_flow_sample_zero_on_still_water() {
        let (terrain, mut water) = flat_pair(12);
        water.add_water(6.0, 6.0, 2.0, 1.5);

        let zones = ZoneDetector::new(&terrain, &water);
        let sample = zones.flow_in_circle(6.0, 6.0, 3.0);
        assert_eq!(sample, FlowSample::default());
    }

    #[test]
    fn test_flow_sample_points_downhill() {
        let dims = GridDimensions::square(16);
        let mut terrain = Terrain::new(dims);
        for y in 0..16 {
            for x in 0..16 {
                terrain.set_height(x, y, 16.0 - x as f32);
            }
        }
        let mut water = WaterField::new(dims);
        water.params = WaterParams::lossless();
        water.add_water(4.0, 8.0, 6.0, 2.0);
        for _ in 0..20 {
            water.simulate(&terrain, 1.0 / 60.0);
        }

        let zones = ZoneDetector::new(&terrain, &water);
        let sample = zones.flow_in_circle(6.0, 8.0, 4.0);
        assert!(sample.speed > 0.0);
        assert!(sample.velocity_x > 0.0, "flow should run down the +x ramp");
    }

    #[test]
    fn test_random_position_respects_range_and_margin() {
        let dims = GridDimensions::square(48);
        let mut terrain = Terrain::new(dims);
        terrain.generate(TerrainPreset::Island, 64);
        let water = WaterField::new(dims);
        let zones = ZoneDetector::new(&terrain, &water);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..20 {
            let (x, y) = zones.random_position(&mut rng, 4, 5.0, 30.0);
            if (x, y) == dims.center() {
                continue; // fallback is always acceptable
            }
            assert!(x >= 4 && x < 44 && y >= 4 && y < 44);
            let h = terrain.height_at(x, y);
            assert!(h >= 5.0 && h <= 30.0);
        }
    }

    #[test]
    fn test_random_position_falls_back_to_center() {
        let (terrain, water) = flat_pair(16);
        let zones = ZoneDetector::new(&terrain, &water);
        let mut rng = ChaCha8Rng::seed_from_u64(9);

        // Flat terrain is all 0; an impossible band forces the fallback.
        let pos = zones.random_position(&mut rng, 2, 100.0, 200.0);
        assert_eq!(pos, (8, 8));

        // A margin wider than the grid cannot sample at all.
        let pos = zones.random_position(&mut rng, 40, 0.0, 100.0);
        assert_eq!(pos, (8, 8));
    }
}
