use std::path::PathBuf;
use std::time::Instant;

use clap::Parser;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use tidepool::ascii::{self, AsciiMode};
use tidepool::export;
use tidepool::quality::{rebuild_for_dimensions, QualityController, QualityLevel};
use tidepool::snapshot::{self, SandboxSnapshot};
use tidepool::stepper::FixedStepper;
use tidepool::terrain::{Terrain, TerrainPreset};
use tidepool::water::WaterField;
use tidepool::zones::ZoneDetector;

#[derive(Parser, Debug)]
#[command(name = "tidepool")]
#[command(about = "Headless terrain/water sandbox simulation")]
struct Args {
    /// Quality level (low, medium, high)
    #[arg(short, long)]
    quality: Option<QualityLevel>,

    /// Terrain preset (island, highlands, mesa, flats)
    #[arg(short, long, default_value = "island")]
    terrain: TerrainPreset,

    /// Random seed (uses a random seed if not specified)
    #[arg(short, long)]
    seed: Option<u64>,

    /// Number of springs to auto-place on terrain peaks
    #[arg(long, default_value = "3")]
    springs: usize,

    /// Simulated time to run, in seconds
    #[arg(long, default_value = "10.0")]
    seconds: f32,

    /// Random rain drops per simulated second
    #[arg(long, default_value = "0")]
    rain: usize,

    /// Print an ASCII view at the end (height, depth, surface, flow)
    #[arg(long)]
    ascii: Option<AsciiMode>,

    /// Export a PNG of the final state
    #[arg(long)]
    export_png: Option<PathBuf>,

    /// Export ASCII maps of the final state to a text file
    #[arg(long)]
    export_maps: Option<PathBuf>,

    /// Save the final state as a snapshot file
    #[arg(long)]
    save: Option<PathBuf>,

    /// Start from a snapshot file instead of generating terrain
    #[arg(long)]
    load: Option<PathBuf>,

    /// Switch to this quality level after the run, transplanting the
    /// final state onto the resized grid
    #[arg(long)]
    requality: Option<QualityLevel>,

    /// Quality settings file (stores the selected level between runs)
    #[arg(long)]
    settings: Option<PathBuf>,
}

fn main() {
    let args = Args::parse();

    let mut controller = match &args.settings {
        Some(path) => QualityController::with_settings_file(path),
        None => QualityController::new(QualityLevel::default()),
    };
    if let Some(level) = args.quality {
        controller.set_quality(level);
    }

    let seed = args.seed.unwrap_or_else(rand::random);
    let mut rng = ChaCha8Rng::seed_from_u64(seed);

    let preset = controller.current_preset();
    println!("Quality: {} ({}x{} grid)", preset.label, preset.grid_size, preset.grid_size);
    println!("Seed: {}", seed);

    // Build or restore the terrain/water pair.
    let (mut terrain, mut water) = match &args.load {
        Some(path) => match snapshot::load_snapshot(path) {
            Ok(snap) => {
                println!("Loaded snapshot from {}", path.display());
                controller.set_quality(snap.quality);
                let dims = controller.current_preset().dims();
                let mut terrain = Terrain::new(dims);
                terrain.load_snapshot(&snap.terrain);
                let mut water = WaterField::new(dims);
                water.load_snapshot(&snap.water);
                (terrain, water)
            }
            Err(e) => {
                eprintln!("Failed to load snapshot: {}", e);
                std::process::exit(1);
            }
        },
        None => {
            let dims = preset.dims();
            let mut terrain = Terrain::new(dims);
            println!("Generating {} terrain...", args.terrain);
            terrain.generate(args.terrain, seed);
            let water = WaterField::new(dims);
            (terrain, water)
        }
    };

    if args.load.is_none() && args.springs > 0 {
        let placed = water.auto_generate_springs(&terrain, args.springs);
        println!("Placed {} spring(s) on terrain peaks", placed);
        for spring in &water.springs {
            println!("  spring at ({}, {}) rate {:.1}", spring.x, spring.y, spring.flow_rate);
        }
    }

    // Frame-driven loop: 60 nominal frames per simulated second, each
    // frame paying out fixed steps bounded by the adaptive cap.
    let mut stepper = FixedStepper::new();
    let frame_time = 1.0 / 60.0;
    let total_frames = (args.seconds / frame_time).ceil() as u64;
    let mut steps_run = 0u64;

    println!("Simulating {:.1}s ({} frames)...", args.seconds, total_frames);
    let wall_start = Instant::now();
    let mut last_frame_cost = frame_time;
    let mut rain_budget = 0.0f32;

    for frame in 0..total_frames {
        let max_steps = controller.adaptive_max_steps(last_frame_cost);
        let steps = stepper.advance(frame_time, max_steps);

        let frame_start = Instant::now();
        for _ in 0..steps {
            water.simulate(&terrain, stepper.dt());
        }
        if args.rain > 0 {
            // Spread the per-second drop budget across frames.
            rain_budget += args.rain as f32 * frame_time;
            let drops = rain_budget.floor() as usize;
            if drops > 0 {
                rain_budget -= drops as f32;
                water.rain(&mut rng, drops, 2.0, 1.5);
            }
        }
        last_frame_cost = frame_start.elapsed().as_secs_f32().max(frame_time);
        steps_run += steps as u64;

        if frame % 60 == 59 {
            println!(
                "  t={:>4.1}s  total water {:>10.2}  steps {}",
                (frame + 1) as f32 * frame_time,
                water.total_water(),
                steps_run,
            );
        }
    }
    println!(
        "Done: {} steps in {:?} wall time",
        steps_run,
        wall_start.elapsed()
    );

    // Zone readout around the grid center, the way a game mode would
    // inspect an objective area.
    let dims = terrain.dims();
    let (cx, cy) = dims.center();
    let zones = ZoneDetector::new(&terrain, &water);
    let radius = dims.width as f32 / 8.0;
    println!("\n=== Zone readout at center ({}, {}) r={:.0} ===", cx, cy, radius);
    println!("  volume:    {:.2}", zones.water_in_circle(cx as f32, cy as f32, radius));
    println!("  avg depth: {:.3}", zones.average_depth_in_circle(cx as f32, cy as f32, radius));
    println!("  has water: {}", zones.has_water(cx as f32, cy as f32, radius));
    let flow = zones.flow_in_circle(cx as f32, cy as f32, radius);
    println!("  flow:      ({:.3}, {:.3}) speed {:.3}", flow.velocity_x, flow.velocity_y, flow.speed);

    // Runtime resolution switch: snapshot, rebuild at the new preset's
    // dimensions, restore with resampling.
    if let Some(level) = args.requality {
        let before = water.total_water();
        controller.set_quality(level);
        let new_dims = controller.current_preset().dims();
        let (new_terrain, new_water) = rebuild_for_dimensions(&terrain, &water, new_dims);
        terrain = new_terrain;
        water = new_water;
        println!(
            "\nSwitched to {} ({}x{}): total water {:.2} -> {:.2}",
            level,
            new_dims.width,
            new_dims.height,
            before,
            water.total_water(),
        );
    }

    if let Some(mode) = args.ascii {
        println!();
        ascii::print_map(&terrain, &water, mode);
    }

    if let Some(path) = &args.export_png {
        match export::export_png(&terrain, &water, path) {
            Ok(()) => println!("Wrote PNG to {}", path.display()),
            Err(e) => eprintln!("PNG export failed: {}", e),
        }
    }

    if let Some(path) = &args.export_maps {
        match ascii::export_maps(&terrain, &water, path) {
            Ok(()) => println!("Wrote ASCII maps to {}", path.display()),
            Err(e) => eprintln!("ASCII export failed: {}", e),
        }
    }

    if let Some(path) = &args.save {
        let snap = SandboxSnapshot {
            quality: controller.current_level(),
            terrain: terrain.snapshot(),
            water: water.snapshot(),
        };
        match snapshot::save_snapshot(&snap, path) {
            Ok(()) => println!("Saved snapshot to {}", path.display()),
            Err(e) => eprintln!("Snapshot save failed: {}", e),
        }
    }

}
