use std::collections::HashMap;
use std::error::Error;
use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};
use log::info;

use tile_world::config::{DumpConfig, DumpMode};
use tile_world::dump::export_dump;
use tile_world::palette::DefaultPalette;
use tile_world::store::MeshFile;
use tile_world::tiles::TileType;
use tile_world::world::{Layer, World, WorldModel};

#[derive(Parser, Debug)]
#[command(name = "tile_world")]
#[command(about = "Create, inspect, sanitize and render layered tile worlds")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a new world with the default layout
    Create {
        /// World directory
        dir: PathBuf,

        /// Side length exponent, the world is 2^power tiles wide (10-15)
        #[arg(short, long, default_value = "11")]
        power: u32,
    },

    /// Print size, height range and tile statistics
    Info {
        /// World directory
        dir: PathBuf,
    },

    /// Fix exposed rock and sunken surface, then save
    Sanitize {
        /// World directory
        dir: PathBuf,
    },

    /// Render a map dump to an image file
    Dump {
        /// World directory
        dir: PathBuf,

        /// Output image (format from extension, e.g. "map.png")
        #[arg(short, long)]
        out: PathBuf,

        /// JSON render config; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(short, long, value_enum)]
        mode: Option<DumpMode>,

        /// Tint tiles below sea level
        #[arg(long)]
        show_water: Option<bool>,

        /// Contour line interval for topographic dumps (0 disables)
        #[arg(short, long)]
        interval: Option<u16>,

        /// Seed for the sampling window of oversized worlds
        #[arg(short, long)]
        seed: Option<u64>,

        /// Largest image side in pixels
        #[arg(long)]
        max_side: Option<usize>,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    if let Err(e) = run(args.command) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(command: Command) -> Result<(), Box<dyn Error>> {
    match command {
        Command::Create { dir, power } => {
            println!("Creating world of side 2^{} in {}...", power, dir.display());
            let mut world = World::create(&dir, power)?;
            println!("Seeded {}x{} default layout", world.map().side(), world.map().side());
            world.map_mut().save_changes()?;
            world.close()?;
            println!("Done.");
        }
        Command::Info { dir } => {
            let world = World::open(&dir)?;
            print_info(world.map());
            world.close()?;
        }
        Command::Sanitize { dir } => {
            let mut world = World::open(&dir)?;
            let report = world.map_mut().save_changes()?;
            println!(
                "Raised {} surface tiles to rock level, re-typed {} exposed tiles to rock",
                report.raised, report.exposed
            );
            world.close()?;
        }
        Command::Dump {
            dir,
            out,
            config,
            mode,
            show_water,
            interval,
            seed,
            max_side,
        } => {
            let mut dump = match config {
                Some(path) => DumpConfig::load(path)?,
                None => DumpConfig::default(),
            };
            if let Some(mode) = mode {
                dump.mode = mode;
            }
            if let Some(show_water) = show_water {
                dump.show_water = show_water;
            }
            if let Some(interval) = interval {
                dump.contour_interval = interval;
            }
            if seed.is_some() {
                dump.seed = seed;
            }
            if let Some(max_side) = max_side {
                dump.max_side = max_side;
            }

            let world = World::open(&dir)?;
            println!("Rendering {:?} dump of {}...", dump.mode, dir.display());
            export_dump(world.map(), &DefaultPalette, &dump, &out)?;
            info!("Wrote {}", out.display());
            println!("Saved {}", out.display());
            world.close()?;
        }
    }
    Ok(())
}

fn print_info(map: &WorldModel<MeshFile>) {
    let side = map.side();
    println!("Size: {}x{}", side, side);

    let surface = map.layer(Layer::Surface);
    let mut min_h = i16::MAX;
    let mut max_h = i16::MIN;
    let mut below_sea = 0usize;
    let mut unknown = 0usize;
    let mut counts: HashMap<TileType, usize> = HashMap::new();
    for (_, _, cell) in surface.iter() {
        let h = cell.height();
        min_h = min_h.min(h);
        max_h = max_h.max(h);
        if h < 0 {
            below_sea += 1;
        }
        match cell.tile() {
            Some(tile) => *counts.entry(tile).or_insert(0) += 1,
            None => unknown += 1,
        }
    }

    let total = side * side;
    println!("Surface height range: {} to {}", min_h, max_h);
    println!(
        "Below sea level: {} tiles ({:.1}%)",
        below_sea,
        100.0 * below_sea as f64 / total as f64
    );

    let mut sorted: Vec<_> = counts.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.id().cmp(&b.0.id())));
    println!("Surface tiles:");
    for (tile, count) in sorted.iter().take(10) {
        println!("  {:<28} {:>10} ({:.1}%)", tile.to_string(), count, 100.0 * *count as f64 / total as f64);
    }
    if unknown > 0 {
        println!("  {:<28} {:>10}", "unknown", unknown);
    }

    let walls = map
        .layer(Layer::Cave)
        .iter()
        .filter(|(_, _, cell)| cell.tile().is_some_and(TileType::is_solid_cave_wall))
        .count();
    println!("Solid cave walls: {} of {} tiles", walls, total);
}
