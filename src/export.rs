//! PNG export of the sandbox state.
//!
//! Produces a top-down view: hypsometric land tint with water drawn as a
//! depth-scaled blue overlay, for quick visual inspection of headless
//! runs.

use std::path::Path;

use image::{ImageBuffer, Rgb};

use crate::terrain::{Terrain, MAX_HEIGHT};
use crate::water::WaterField;

/// Depth at which water reaches its full-strength tint.
const DEEP_WATER: f32 = 3.0;

/// Land color ramp: low green, mid brown, high near-white.
fn land_color(elevation: f32) -> Rgb<u8> {
    let t = (elevation / MAX_HEIGHT).clamp(0.0, 1.0);
    if t < 0.4 {
        let k = t / 0.4;
        Rgb([
            (60.0 + 100.0 * k) as u8,
            (140.0 - 20.0 * k) as u8,
            (60.0 - 20.0 * k) as u8,
        ])
    } else if t < 0.75 {
        let k = (t - 0.4) / 0.35;
        Rgb([
            (160.0 - 30.0 * k) as u8,
            (120.0 - 30.0 * k) as u8,
            (40.0 + 30.0 * k) as u8,
        ])
    } else {
        let k = (t - 0.75) / 0.25;
        let v = (130.0 + 125.0 * k) as u8;
        Rgb([v, v, v])
    }
}

/// Blend water over land: shallow water shows the bed through it, deep
/// water saturates to blue.
fn shade_cell(elevation: f32, depth: f32) -> Rgb<u8> {
    let land = land_color(elevation);
    if depth <= 0.0 {
        return land;
    }

    let strength = (depth / DEEP_WATER).clamp(0.0, 1.0);
    let water = Rgb([30u8, 90, 200]);
    Rgb([
        (land.0[0] as f32 * (1.0 - strength) + water.0[0] as f32 * strength) as u8,
        (land.0[1] as f32 * (1.0 - strength) + water.0[1] as f32 * strength) as u8,
        (land.0[2] as f32 * (1.0 - strength) + water.0[2] as f32 * strength) as u8,
    ])
}

/// Write the current state as a PNG.
pub fn export_png(terrain: &Terrain, water: &WaterField, path: &Path) -> image::ImageResult<()> {
    let width = terrain.width() as u32;
    let height = terrain.height_cells() as u32;

    let img = ImageBuffer::from_fn(width, height, |x, y| {
        let (xi, yi) = (x as i32, y as i32);
        shade_cell(terrain.height_at(xi, yi), water.depth_at(xi, yi))
    });

    img.save(path)
}
