//! Special-stage chase: the emerald-carrying UFO that races the players to
//! the finish line, and the level it runs in.
//!
//! - [`level::Level`] owns the actors, the waypoint graph and the players, and
//!   runs one tic at a time.
//! - [`stage`] tracks which UFO the stage is chasing.
//! - [`ufo`] holds the UFO itself: its pieces, path following, pacing,
//!   damage and collisions.
//! - [`vfx`] spawns the decoration around it.

pub mod config;
pub mod level;
pub mod players;
pub mod stage;
pub mod ufo;
pub mod vfx;

pub use config::{ConfigError, GameSpeed, StageConfig};
pub use level::{Level, Quake, ScriptTrigger};
pub use players::{KartOwner, PlayerState, Players, SkinFlags};
pub use stage::{begin_stage, end_stage, special_ufo, special_ufo_distance, special_ufo_waypoint};
pub use ufo::{create_special_ufo, player_ufo_collide, ufo_collectible, ufo_damage, Ufo};
