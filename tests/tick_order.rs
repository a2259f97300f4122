//! The tick calls its collaborators in a fixed order and respects pausing.

use gloom::context::SimContext;
use gloom::game::{TickHooks, World};
use gloom::player::Player;
use gloom::specials::plat::PlatKind;
use mockall::{mock, Sequence};
use rstest::{fixture, rstest};
use test_utils::{corridor, world_on, LIFT, LIFT_SWITCH};

mock! {
    Hooks {}
    impl TickHooks for Hooks {
        fn player_think(&mut self, slot: usize, player: &mut Player, ctx: &mut SimContext);
        fn music_info(&mut self, level_time: i32);
    }
}

#[fixture]
fn world() -> World {
    world_on(corridor())
}

#[rstest]
fn players_move_before_thinkers_and_music_after(mut world: World) {
    world.player_in_game[1] = true;
    world
        .do_plat(LIFT_SWITCH, PlatKind::DownWaitUpStay, 0)
        .expect("plat slot");
    let floor_before = world.level.sectors[LIFT].floor_height;

    let mut hooks = MockHooks::new();
    let mut seq = Sequence::new();
    hooks
        .expect_player_think()
        .withf(|slot, _, ctx| *slot == 1 && ctx.level_time == 0)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());
    hooks
        .expect_music_info()
        .withf(|time| *time == 0)
        .times(1)
        .in_sequence(&mut seq)
        .return_const(());

    world.tick(&mut hooks);
    assert!(world.level.sectors[LIFT].floor_height < floor_before);
    assert_eq!(world.ctx.level_time, 1);
}

#[rstest]
fn demo_playback_ignores_the_menu(mut world: World) {
    world.menu_active = true;
    world.demo_playback = true;
    let mut hooks = MockHooks::new();
    hooks.expect_music_info().times(3).return_const(());
    for _ in 0..3 {
        world.tick(&mut hooks);
    }
    assert_eq!(world.ctx.level_time, 3);
}

#[rstest]
fn paused_game_calls_nothing(mut world: World) {
    world.player_in_game[0] = true;
    world.paused = true;
    let mut hooks = MockHooks::new();
    hooks.expect_player_think().never();
    hooks.expect_music_info().never();
    world.tick(&mut hooks);
    assert_eq!(world.ctx.level_time, 0);
}
