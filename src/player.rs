//! Per-player state carried by the world and the save stream.

use crate::constants::{NUMAMMO, NUMCARDS, NUMPOWERS, NUMPSPRITES, NUMWEAPONS, MAXPLAYERS};
use crate::numeric::Fixed;
use crate::thinker::ThinkerId;

/// Life cycle of a player slot, numbered as archived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum PlayerState {
    /// Playing.
    #[default]
    Live = 0,
    /// Dead, waiting for the use key.
    Dead = 1,
    /// Respawns at the next opportunity.
    Reborn = 2,
}

impl PlayerState {
    /// The state archived as `value`.
    #[must_use]
    pub const fn from_i32(value: i32) -> Option<Self> {
        Some(match value {
            0 => Self::Live,
            1 => Self::Dead,
            2 => Self::Reborn,
            _ => return None,
        })
    }
}

/// One tic of player input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TicCmd {
    /// Forward speed; negative walks backwards.
    pub forward_move: i8,
    /// Strafe speed; negative moves left.
    pub side_move: i8,
    /// Turn amount, the high half of a binary angle.
    pub angle_turn: i16,
    /// Network consistency check value.
    pub consistency: i16,
    /// Chat character typed this tic, or zero.
    pub chat_char: u8,
    /// Attack, use and weapon-change bits.
    pub buttons: u8,
}

/// A weapon sprite layer. `state` 0 means the layer is off.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PspDef {
    /// Current frame.
    pub state: i32,
    /// Tics left in the frame.
    pub tics: i32,
    /// Horizontal screen offset.
    pub sx: Fixed,
    /// Vertical screen offset.
    pub sy: Fixed,
}

/// Key colours checked by locked doors.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyColor {
    /// Blue card or skull.
    Blue,
    /// Yellow card or skull.
    Yellow,
    /// Red card or skull.
    Red,
}

impl KeyColor {
    /// What a locked door tells a player without this key.
    #[must_use]
    pub const fn door_message(self) -> &'static str {
        match self {
            Self::Blue => "You need a blue key to open this door",
            Self::Yellow => "You need a yellow key to open this door",
            Self::Red => "You need a red key to open this door",
        }
    }
}

/// A player slot.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Player {
    /// The actor this player drives.
    pub mo: Option<ThinkerId>,
    /// Alive, dead or waiting to respawn.
    pub state: PlayerState,
    /// Input for the current tic.
    pub cmd: TicCmd,
    /// Eye height in world space.
    pub view_z: Fixed,
    /// Eye height above the floor.
    pub view_height: Fixed,
    /// Per-tic change of `view_height` while it settles.
    pub delta_view_height: Fixed,
    /// Weapon and view bob amplitude.
    pub bob: Fixed,
    /// Mirrors the actor's health for the status bar.
    pub health: i32,
    /// Armor remaining.
    pub armor_points: i32,
    /// Armor class: 0 none, 1 green, 2 blue.
    pub armor_type: i32,
    /// Tics left on each power-up.
    pub powers: [i32; NUMPOWERS],
    /// Held keys: three cards, then three skulls.
    pub cards: [bool; NUMCARDS],
    /// Whether the ammo limits are doubled.
    pub backpack: bool,
    /// Kills of each other player.
    pub frags: [i32; MAXPLAYERS],
    /// Weapon in hand.
    pub ready_weapon: i32,
    /// Weapon being switched to.
    pub pending_weapon: i32,
    /// Weapons picked up.
    pub weapon_owned: [bool; NUMWEAPONS],
    /// Ammunition carried per kind.
    pub ammo: [i32; NUMAMMO],
    /// Ammunition limits per kind.
    pub max_ammo: [i32; NUMAMMO],
    /// Attack button held last tic.
    pub attack_down: bool,
    /// Use button held last tic.
    pub use_down: bool,
    /// Cheat bits.
    pub cheats: i32,
    /// Tics the attack button has been held through refires.
    pub refire: i32,
    /// Monsters killed this level.
    pub kill_count: i32,
    /// Items collected this level.
    pub item_count: i32,
    /// Secrets found this level.
    pub secret_count: i32,
    /// Last message shown to the player. Not archived.
    pub message: Option<&'static str>,
    /// Red screen tint from damage.
    pub damage_count: i32,
    /// Gold screen tint from pickups.
    pub bonus_count: i32,
    /// Light boost from firing.
    pub extra_light: i32,
    /// Full-screen colormap override, such as invulnerability.
    pub fixed_colormap: i32,
    /// Translation table for the player's sprite.
    pub colormap: i32,
    /// Weapon and flash layers.
    pub psprites: [PspDef; NUMPSPRITES],
    /// Whether a secret exit was taken.
    pub did_secret: bool,
}

impl Player {
    /// Whether the player holds the card or skull key of `color`.
    #[must_use]
    pub const fn has_key(&self, color: KeyColor) -> bool {
        let [blue, yellow, red, blue_skull, yellow_skull, red_skull] = self.cards;
        match color {
            KeyColor::Blue => blue || blue_skull,
            KeyColor::Yellow => yellow || yellow_skull,
            KeyColor::Red => red || red_skull,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::card(0, KeyColor::Blue)]
    #[case::skull(5, KeyColor::Red)]
    fn either_key_form_opens(#[case] slot: usize, #[case] color: KeyColor) {
        let mut player = Player::default();
        assert!(!player.has_key(color));
        player.cards[slot] = true;
        assert!(player.has_key(color));
        assert!(!player.has_key(KeyColor::Yellow));
    }

    #[rstest]
    fn unknown_state_is_rejected() {
        assert_eq!(PlayerState::from_i32(2), Some(PlayerState::Reborn));
        assert_eq!(PlayerState::from_i32(7), None);
    }
}
