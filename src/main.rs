//! Headless runner: builds a demo level, ticks it and optionally round-trips a save.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use gloom::config::SimConfig;
use gloom::game::{NoHooks, World};
use gloom::init_logging;
use gloom::level::{Level, Line, Sector, Side, ML_TWOSIDED};
use gloom::numeric::Fixed;
use gloom::saveg::{load_game, save_game, save_to_vec};
use gloom::specials::ceiling::CeilingKind;
use gloom::specials::door::DoorKind;
use gloom::specials::plat::PlatKind;
use log::info;

/// Runs the simulation core headless on a small demo level
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
    /// JSON file with simulation settings
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Tics to run
    #[arg(short, long, default_value_t = 350)]
    ticks: u32,
    /// Write a save game here, then reload and compare it
    #[arg(short, long)]
    save: Option<PathBuf>,
}

const LIFT_SWITCH: usize = 5;
const CRUSHER_SWITCH: usize = 6;
const DOOR_SWITCH: usize = 7;

fn portal(front: usize, back: usize, sides: &mut Vec<Side>) -> Line {
    let first = sides.len();
    for sector in [front, back] {
        sides.push(Side {
            sector,
            ..Side::default()
        });
    }
    Line {
        flags: ML_TWOSIDED,
        side_num: [Some(first), Some(first + 1)],
        front_sector: front,
        back_sector: Some(back),
        ..Line::default()
    }
}

fn switch(tag: i16, sides: &mut Vec<Side>) -> Line {
    sides.push(Side::default());
    Line {
        tag,
        side_num: [Some(sides.len() - 1), None],
        ..Line::default()
    }
}

/// A hall with a lift, a crusher, a door, a glowing room and a room lit by
/// fire.
fn demo_level() -> Level {
    let sector = |floor, ceiling, light, tag, special| Sector {
        tag,
        special,
        ..Sector::new(floor, ceiling, light)
    };
    let sectors = vec![
        sector(0, 128, 160, 0, 0),
        sector(64, 128, 160, 1, 0),
        sector(0, 96, 160, 2, 0),
        sector(0, 0, 160, 3, 0),
        sector(0, 128, 200, 0, 8),
        sector(0, 128, 192, 0, 17),
    ];
    let mut sides = Vec::new();
    let mut lines: Vec<Line> = (1..sectors.len())
        .map(|room| portal(0, room, &mut sides))
        .collect();
    for tag in 1..=3 {
        lines.push(switch(tag, &mut sides));
    }
    Level::new(sectors, lines, sides, 8, Vec::new())
}

fn demo_world(config: SimConfig) -> Result<World> {
    let mut world = World::new(demo_level(), config);
    world.spawn_specials();
    world.do_plat(LIFT_SWITCH, PlatKind::PerpetualRaise, 0)?;
    world.do_ceiling(CRUSHER_SWITCH, CeilingKind::CrushAndRaise)?;
    world.do_door(DOOR_SWITCH, DoorKind::Normal);

    let player = world
        .spawn_player(0, Fixed::ZERO, Fixed::ZERO, 0)
        .context("hall sector missing")?;
    let imp = world
        .spawn_mobj(3001, Fixed::from_int(64), Fixed::ZERO, 2)
        .context("crusher sector missing")?;
    if let Some(mobj) = world.thinkers.mobj_mut(imp) {
        mobj.target = Some(player);
        mobj.health = 60;
    }
    Ok(world)
}

fn round_trip(world: &World, path: &Path) -> Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    save_game(world, "gloom demo", BufWriter::new(file))
        .with_context(|| format!("writing {}", path.display()))?;
    let bytes = fs::read(path).with_context(|| format!("reading {}", path.display()))?;

    let mut reloaded = world.clone();
    let summary = load_game(&mut reloaded, &bytes).context("reloading save game")?;
    let again = save_to_vec(&reloaded, "gloom demo")?;
    ensure!(again == bytes, "reloaded world differs from the saved one");
    info!(
        "saved {} bytes to {}: {} actors, {} specials, reload matches",
        bytes.len(),
        path.display(),
        summary.actors,
        summary.specials
    );
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose);

    let config = args.config.as_deref().map_or_else(
        || Ok(SimConfig::default()),
        |path| SimConfig::load(path).with_context(|| format!("loading {}", path.display())),
    )?;
    let mut world = demo_world(config)?;
    let mut sounds = 0;
    for _ in 0..args.ticks {
        world.try_tick(&mut NoHooks)?;
        sounds += world.ctx.sounds.drain().count();
    }
    info!(
        "ran {} tics: {} thinkers, {sounds} sounds started",
        world.ctx.level_time,
        world.thinkers.len()
    );

    if let Some(path) = &args.save {
        round_trip(&world, path)?;
    }
    Ok(())
}
