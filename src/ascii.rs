//! ASCII rendering of the sandbox grids.
//!
//! Renders terrain height, water depth, combined surface, or the flow
//! field as character maps for the CLI and for timestamped text exports.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use chrono::Local;

use crate::terrain::{Terrain, MAX_HEIGHT};
use crate::water::WaterField;

/// ASCII rendering modes
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum AsciiMode {
    /// Terrain elevation gradient
    Height,
    /// Water depth gradient
    Depth,
    /// Terrain with water overlaid where it is deep enough to see
    Surface,
    /// Flow direction arrows
    Flow,
}

impl AsciiMode {
    pub fn name(&self) -> &'static str {
        match self {
            AsciiMode::Height => "Height",
            AsciiMode::Depth => "Depth",
            AsciiMode::Surface => "Surface",
            AsciiMode::Flow => "Flow",
        }
    }

    pub fn all() -> &'static [AsciiMode] {
        &[
            AsciiMode::Height,
            AsciiMode::Depth,
            AsciiMode::Surface,
            AsciiMode::Flow,
        ]
    }
}

impl std::str::FromStr for AsciiMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "height" => Ok(Self::Height),
            "depth" => Ok(Self::Depth),
            "surface" => Ok(Self::Surface),
            "flow" => Ok(Self::Flow),
            other => Err(format!("unknown ascii mode '{}'", other)),
        }
    }
}

const HEIGHT_RAMP: &[u8] = b" .:-=+*#%@";
const DEPTH_RAMP: &[u8] = b" .,:;ox%#@";

/// Depth below which the surface view shows terrain instead of water.
const SURFACE_WATER_VISIBLE: f32 = 0.05;

/// Speed below which the flow view shows a dot instead of an arrow.
const FLOW_VISIBLE_SPEED: f32 = 0.01;

fn ramp_char(ramp: &[u8], t: f32) -> char {
    let idx = (t.clamp(0.0, 1.0) * (ramp.len() - 1) as f32).round() as usize;
    ramp[idx] as char
}

/// Arrow for a flow direction, quantized to 8 compass directions.
fn flow_char(vx: f32, vy: f32) -> char {
    let speed = (vx * vx + vy * vy).sqrt();
    if speed < FLOW_VISIBLE_SPEED {
        return '.';
    }
    let angle = vy.atan2(vx);
    let octant = ((angle / std::f32::consts::FRAC_PI_4).round() as i32).rem_euclid(8);
    match octant {
        0 => '>',
        1 => '\\',
        2 => 'v',
        3 => '/',
        4 => '<',
        5 => '\\',
        6 => '^',
        _ => '/',
    }
}

/// Render one mode as a newline-terminated character map.
pub fn render_map(terrain: &Terrain, water: &WaterField, mode: AsciiMode) -> String {
    let width = terrain.width();
    let height = terrain.height_cells();
    let mut out = String::with_capacity((width + 1) * height);

    // Depth normalization tracks the current maximum so shallow scenes
    // still show contrast.
    let max_depth = water
        .depth_raw()
        .iter()
        .copied()
        .fold(0.0f32, f32::max)
        .max(1e-6);

    for y in 0..height {
        for x in 0..width {
            let (xi, yi) = (x as i32, y as i32);
            let c = match mode {
                AsciiMode::Height => {
                    ramp_char(HEIGHT_RAMP, terrain.height_at(xi, yi) / MAX_HEIGHT)
                }
                AsciiMode::Depth => ramp_char(DEPTH_RAMP, water.depth_at(xi, yi) / max_depth),
                AsciiMode::Surface => {
                    let depth = water.depth_at(xi, yi);
                    if depth > SURFACE_WATER_VISIBLE {
                        ramp_char(DEPTH_RAMP, depth / max_depth)
                    } else {
                        ramp_char(HEIGHT_RAMP, terrain.height_at(xi, yi) / MAX_HEIGHT)
                    }
                }
                AsciiMode::Flow => {
                    let idx = y * width + x;
                    flow_char(water.velocity_x_raw()[idx], water.velocity_y_raw()[idx])
                }
            };
            out.push(c);
        }
        out.push('\n');
    }

    out
}

/// Print a mode to stdout with a small header.
pub fn print_map(terrain: &Terrain, water: &WaterField, mode: AsciiMode) {
    println!(
        "--- {} ({}x{}) ---",
        mode.name(),
        terrain.width(),
        terrain.height_cells()
    );
    print!("{}", render_map(terrain, water, mode));
}

/// Export all modes to a timestamped text file.
pub fn export_maps(terrain: &Terrain, water: &WaterField, path: &Path) -> io::Result<()> {
    let mut file = File::create(path)?;

    writeln!(file, "tidepool state export")?;
    writeln!(file, "generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"))?;
    writeln!(file, "grid: {}x{}", terrain.width(), terrain.height_cells())?;
    writeln!(file, "total water: {:.3}", water.total_water())?;
    writeln!(file, "springs: {}", water.springs.len())?;

    for &mode in AsciiMode::all() {
        writeln!(file)?;
        writeln!(file, "=== {} ===", mode.name())?;
        file.write_all(render_map(terrain, water, mode).as_bytes())?;
    }

    Ok(())
}
