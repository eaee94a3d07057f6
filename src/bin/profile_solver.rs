//! Profiling tool for the flow solver across quality levels.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tidepool::quality::QualityLevel;
use tidepool::terrain::{Terrain, TerrainPreset};
use tidepool::water::WaterField;
use tidepool::zones::ZoneDetector;

const STEPS: usize = 600;
const DT: f32 = 1.0 / 60.0;

fn main() {
    let seed = 1337u64;
    println!("=== Solver Profiling ===");
    println!("Seed: {}, {} steps per level at dt {:.4}", seed, STEPS, DT);
    println!();

    for &level in QualityLevel::all() {
        let preset = level.preset();
        let dims = preset.dims();
        println!(
            "--- {} ({}x{}, {} cells) ---",
            preset.label,
            dims.width,
            dims.height,
            dims.cell_count()
        );

        let start = Instant::now();
        let mut terrain = Terrain::new(dims);
        terrain.generate(TerrainPreset::Island, seed);
        let generation_time = start.elapsed();
        println!("Terrain generation: {:?}", generation_time);

        let mut water = WaterField::new(dims);
        let start = Instant::now();
        let placed = water.auto_generate_springs(&terrain, 4);
        println!("Peak search + {} springs: {:?}", placed, start.elapsed());

        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        water.rain(&mut rng, 50, 5.0, 2.0);

        let start = Instant::now();
        for _ in 0..STEPS {
            water.simulate(&terrain, DT);
        }
        let sim_time = start.elapsed();
        let per_step = sim_time / STEPS as u32;
        println!("{} solver steps: {:?} ({:?}/step)", STEPS, sim_time, per_step);

        let zones = ZoneDetector::new(&terrain, &water);
        let (cx, cy) = dims.center();
        let radius = dims.width as f32 / 6.0;
        let start = Instant::now();
        let mut checksum = 0.0f32;
        for _ in 0..1000 {
            checksum += zones.water_in_circle(cx as f32, cy as f32, radius);
            checksum += zones.flow_in_circle(cx as f32, cy as f32, radius).speed;
        }
        println!(
            "1000 zone query pairs: {:?} (checksum {:.2})",
            start.elapsed(),
            checksum
        );

        println!("Total water after run: {:.2}", water.total_water());
        println!();
    }
}
