//! Save games restore the mutable world and its actor references.

use anyhow::{ensure, Context, Result};
use gloom::game::{NoHooks, World};
use gloom::saveg::{load_game, peek_header, save_to_vec, LoadError};
use gloom::specials::ceiling::CeilingKind;
use gloom::specials::plat::PlatKind;
use gloom::thinker::ThinkerId;
use gloom::Fixed;
use rstest::{fixture, rstest};
use test_utils::{corridor, world_on, CRUSHER, CRUSHER_SWITCH, HALL, LIFT, LIFT_SWITCH};

#[fixture]
fn busy_world() -> World {
    let mut world = world_on(corridor());
    world
        .do_plat(LIFT_SWITCH, PlatKind::DownWaitUpStay, 0)
        .expect("plat slot");
    world
        .do_ceiling(CRUSHER_SWITCH, CeilingKind::CrushAndRaise)
        .expect("ceiling slot");
    for _ in 0..10 {
        world.tick(&mut NoHooks);
    }
    world
}

fn actor_ids(world: &World) -> Vec<ThinkerId> {
    world.thinkers.mobjs().map(|(id, _)| id).collect()
}

#[rstest]
fn running_mechanisms_survive_a_reload(busy_world: World) -> Result<()> {
    let bytes = save_to_vec(&busy_world, "mid-crush")?;
    let mut reloaded = world_on(corridor());
    let summary = load_game(&mut reloaded, &bytes)?;

    ensure!(summary.specials == 2, "expected two specials, got {}", summary.specials);
    ensure!(reloaded.ctx.level_time == 10);
    for sector in [LIFT, CRUSHER] {
        ensure!(reloaded.sector_busy(sector), "sector {sector} lost its mechanism");
        ensure!(
            reloaded.level.sectors[sector].floor_height
                == busy_world.level.sectors[sector].floor_height
        );
        ensure!(
            reloaded.level.sectors[sector].ceiling_height
                == busy_world.level.sectors[sector].ceiling_height
        );
    }
    ensure!(reloaded.active_plats.len() == 1 && reloaded.active_ceilings.len() == 1);

    let mut original = busy_world;
    for _ in 0..40 {
        original.tick(&mut NoHooks);
        reloaded.tick(&mut NoHooks);
    }
    ensure!(
        save_to_vec(&original, "")? == save_to_vec(&reloaded, "")?,
        "reloaded world diverged"
    );
    Ok(())
}

#[rstest]
fn references_keep_their_identity(mut busy_world: World) -> Result<()> {
    let hunter = busy_world
        .spawn_mobj(1, Fixed::ZERO, Fixed::ZERO, HALL)
        .context("hall exists")?;
    let missile = busy_world
        .spawn_mobj(2, Fixed::ZERO, Fixed::ZERO, HALL)
        .context("hall exists")?;
    let prey = busy_world
        .spawn_mobj(3, Fixed::ZERO, Fixed::ZERO, CRUSHER)
        .context("crusher exists")?;
    if let Some(m) = busy_world.thinkers.mobj_mut(hunter) {
        m.target = Some(prey);
        m.tracer = Some(hunter);
    }
    if let Some(m) = busy_world.thinkers.mobj_mut(missile) {
        m.target = Some(hunter);
        m.tracer = Some(prey);
    }

    let bytes = save_to_vec(&busy_world, "")?;
    load_game(&mut busy_world, &bytes)?;

    let ids = actor_ids(&busy_world);
    ensure!(ids.len() == 3);
    let kinds: Vec<i32> = ids
        .iter()
        .filter_map(|id| busy_world.thinkers.mobj(*id).map(|m| m.kind))
        .collect();
    ensure!(kinds == vec![1, 2, 3], "creation order changed: {kinds:?}");

    let hunter = busy_world.thinkers.mobj(ids[0]).context("hunter")?;
    ensure!(hunter.target == Some(ids[2]) && hunter.tracer == Some(ids[0]));
    let missile = busy_world.thinkers.mobj(ids[1]).context("missile")?;
    ensure!(missile.target == Some(ids[0]) && missile.tracer == Some(ids[2]));
    Ok(())
}

#[rstest]
fn removed_referent_saves_as_no_reference(mut busy_world: World) -> Result<()> {
    let hunter = busy_world
        .spawn_mobj(1, Fixed::ZERO, Fixed::ZERO, HALL)
        .context("hall exists")?;
    let gone = busy_world
        .spawn_mobj(2, Fixed::ZERO, Fixed::ZERO, HALL)
        .context("hall exists")?;
    if let Some(m) = busy_world.thinkers.mobj_mut(hunter) {
        m.target = Some(gone);
    }
    busy_world.remove_mobj(gone);
    busy_world.tick(&mut NoHooks);

    let bytes = save_to_vec(&busy_world, "")?;
    let summary = load_game(&mut busy_world, &bytes)?;
    ensure!(summary.unresolved_refs == 0);
    let ids = actor_ids(&busy_world);
    let hunter = busy_world.thinkers.mobj(ids[0]).context("hunter")?;
    ensure!(hunter.target.is_none());
    Ok(())
}

#[rstest]
fn header_describes_the_save(busy_world: World) -> Result<()> {
    let bytes = save_to_vec(&busy_world, "before the crusher")?;
    let header = peek_header(&bytes)?;
    ensure!(header.description == "before the crusher");
    ensure!(header.level_time == 10);
    Ok(())
}

#[rstest]
fn rejected_loads_leave_the_world_alone(mut busy_world: World) -> Result<()> {
    let bytes = save_to_vec(&busy_world, "")?;
    let before = save_to_vec(&busy_world, "")?;

    let mut foreign = bytes.clone();
    foreign[24..40].copy_from_slice(b"version 200\0\0\0\0\0");
    let err = load_game(&mut busy_world, &foreign).err().context("foreign save loaded")?;
    ensure!(matches!(err, LoadError::BadVersion { .. }), "unexpected {err}");

    let err = load_game(&mut busy_world, &bytes[..bytes.len() - 20])
        .err()
        .context("short save loaded")?;
    ensure!(err == LoadError::Truncated, "unexpected {err}");

    ensure!(save_to_vec(&busy_world, "")? == before, "world changed");
    Ok(())
}
