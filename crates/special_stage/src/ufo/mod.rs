//! The special-stage UFO: an emerald carrier that races the players to the
//! finish line along the waypoint graph.
//!
//! The UFO keeps a chain of decorative pieces (one pod, three arms, one
//! stem) that orbit it. Damage from weapons eventually breaks the pieces
//! off; from then on the UFO is in its *pinch* phase and the emerald can be
//! collected.

pub mod collide;
pub mod damage;
pub mod path;
pub mod pieces;
pub mod speed;

use engine_core::{
    momentum_angle, Angle, Entity, Fixed, FixedVec3, Mobj, MobjFlags, MobjKind, MobjState,
    RandomClass, SkinColor, SoundId, HUM_VARIANTS, TICRATE,
};
use log::{info, warn};

use crate::level::Level;
use crate::vfx;
use pieces::{PieceKind, UfoPiece};

pub use collide::player_ufo_collide;
pub use damage::ufo_damage;

/// Slowest cruising speed.
pub const BASE_SPEED: Fixed = Fixed::from_int(42);
/// Acceleration per tic.
pub const SPEEDUP: Fixed = Fixed::HALF;
/// Deceleration per tic.
pub const SLOWDOWN: Fixed = Fixed::HALF;
/// How far ahead of the lead player the UFO wants to be, in map units.
pub const SPACING: Fixed = Fixed::from_int(768);
/// Lead error tolerated before the UFO stops matching the player.
pub const DEADZONE: Fixed = Fixed::from_int(2048);
/// Share of the lead player's speed the UFO matches.
pub const SPEED_FACTOR: Fixed = Fixed::from_ratio(3, 4);
/// Added to the speed on every accepted hit.
pub const DAMAGED_BONUS: Fixed = Fixed(BASE_SPEED.0 >> 1);
pub const START_SPEED: Fixed = Fixed(BASE_SPEED.0 << 1);

pub const NUM_ARMS: u32 = 3;
/// Height the UFO hovers above each waypoint, at unit scale.
pub const FLOAT_HEIGHT: i32 = 24;
/// Most urgent hum variant.
pub const MAX_HUM: i32 = HUM_VARIANTS as i32 - 1;

/// UFO-only state carried next to its [`Mobj`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ufo {
    /// Heap index of the waypoint being approached; -1 once the UFO is inert.
    pub waypoint: i32,
    /// Map units to the finish line, `u32::MAX` when unknown.
    pub distance_to_finish: u32,
    pub speed: Fixed,
    /// Tics until the exposed emerald can be picked up.
    pub collect_delay: i32,
    /// First piece of the chain.
    pub pieces: Option<Entity>,
}

/// Pinch phase: the shell is gone and only the emerald is left.
pub fn emerald_chase(mo: &Mobj) -> bool {
    mo.health <= 1
}

/// Whether a player touching the UFO right now would pick up the emerald.
pub fn ufo_collectible(level: &Level, ufo: Entity) -> bool {
    match (level.actors.mobj(ufo), level.actors.get::<Ufo>(ufo)) {
        (Some(mo), Some(state)) => {
            emerald_chase(&mo) && mo.flags.contains(MobjFlags::SPECIAL) && state.collect_delay <= 0
        }
        _ => false,
    }
}

/// Spawn the UFO as far back from the finish line as the circuit allows.
pub fn create_special_ufo(level: &mut Level) -> Entity {
    let start = level.graph.finish_waypoint().and_then(|finish| {
        level
            .graph
            .pathfind_through_circuit(finish.index, i32::MAX as u32, false, true)
            .and_then(|path| path.last_waypoint())
    });
    init_special_ufo(level, start)
}

fn init_special_ufo(level: &mut Level, start: Option<usize>) -> Entity {
    let start_pos = start
        .and_then(|i| level.graph.get(i))
        .map(|w| w.position);

    let mut mo = Mobj::new(
        MobjKind::SpecialUfo,
        start_pos.unwrap_or(FixedVec3::ZERO),
        MobjState::SpecialUfo,
    )
    .with_flags(MobjFlags::SHOOTABLE | MobjFlags::SOLID | MobjFlags::NOGRAVITY | MobjFlags::NOCLIP)
    .with_health(level.ufo_spawn_health)
    .with_size(
        level.ufo_radius * level.map_object_scale,
        level.ufo_height * level.map_object_scale,
    );
    mo.scale = level.map_object_scale;
    mo.dest_scale = level.map_object_scale;
    mo.ceiling_z = level.ceiling_z;
    mo.mass = Fixed::from_int(10_000);
    // TODO: take the emerald colour from the stage once more than one emerald exists.
    mo.color = SkinColor::ChaosEmerald1;
    let color = mo.color;

    let ufo = level.actors.spawn(mo);
    level.actors.attach(
        ufo,
        Ufo {
            waypoint: start.map_or(-1, |i| i as i32),
            distance_to_finish: u32::MAX,
            speed: START_SPEED * level.game_speed_scalar(),
            collect_delay: TICRATE as i32,
            pieces: None,
        },
    );

    match start {
        Some(index) => {
            path::update_distance_to_finish(level, ufo);
            info!("special UFO spawned at waypoint {}", index);
        }
        None => warn!("no waypoint circuit to the finish line; special UFO spawned inert at the origin"),
    }

    if let Some(overlay) = vfx::spawn_overlay(level, ufo, MobjState::EmeraldUnder) {
        if let Some(o) = level.actors.mobj_mut(overlay) {
            o.color = color;
        }
    }

    let mut tail = None;
    let pod = spawn_piece(level, ufo, PieceKind::Pod, Angle::ZERO);
    if let Some(pod) = pod {
        vfx::spawn_overlay(level, pod, MobjState::UfoOverlay);
        tail = pieces::append(&mut level.actors, ufo, pod, tail);
    }
    for i in 0..NUM_ARMS {
        let angle = Angle(Angle::full_circle_div(NUM_ARMS).0.wrapping_mul(i));
        if let Some(arm) = spawn_piece(level, ufo, PieceKind::Arm, angle) {
            tail = pieces::append(&mut level.actors, ufo, arm, tail);
        }
    }
    if let Some(stem) = spawn_piece(level, ufo, PieceKind::Stem, Angle::ZERO) {
        pieces::append(&mut level.actors, ufo, stem, tail);
    }

    ufo
}

fn spawn_piece(level: &mut Level, ufo: Entity, kind: PieceKind, angle: Angle) -> Option<Entity> {
    let piece = level
        .actors
        .spawn_from(ufo, FixedVec3::ZERO, MobjKind::UfoPiece, kind.state())?;
    if let Some(mo) = level.actors.mobj_mut(piece) {
        mo.flags = MobjFlags::NOGRAVITY | MobjFlags::NOCLIP;
        mo.angle = angle;
    }
    level.actors.attach(
        piece,
        UfoPiece {
            kind,
            owner: Some(ufo),
            prev: None,
            next: None,
        },
    );
    Some(piece)
}

/// Per-tic UFO behaviour: move, turn, re-measure, pace, hum, sparkle.
pub fn ufo_thinker(level: &mut Level, ufo: Entity) {
    path::follow_path(level, ufo);
    update_angle(level, ufo);
    path::update_distance_to_finish(level, ufo);
    speed::update_speed(level, ufo);
    update_sound(level, ufo);

    let Some(mo) = level.actors.mobj(ufo) else {
        return;
    };
    if emerald_chase(&mo) {
        emerald_vfx(level, ufo);
        if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
            state.collect_delay -= 1;
        }
    } else if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
        state.collect_delay = TICRATE as i32;
    }
}

/// Ease a quarter of the way toward the direction of travel.
fn update_angle(level: &mut Level, ufo: Entity) {
    if let Some(mo) = level.actors.mobj_mut(ufo) {
        let dest = momentum_angle(mo);
        let delta = Angle::delta_signed(mo.angle, dest);
        mo.angle = mo.angle.rotated(delta >> 2);
    }
}

/// Keep a hum going whose urgency tracks the remaining health.
fn update_sound(level: &mut Level, ufo: Entity) {
    let Some(mo) = level.actors.mobj(ufo) else {
        return;
    };
    if emerald_chase(&mo) {
        return;
    }
    if level
        .sounds
        .is_playing_any(ufo, |id| matches!(id, SoundId::ClawHum(_)))
    {
        return;
    }
    let max_health = level.ufo_spawn_health.max(1);
    let health_level = (MAX_HUM * mo.health / max_health).clamp(1, MAX_HUM);
    level
        .sounds
        .start(ufo, SoundId::ClawHum((MAX_HUM - health_level) as u8));
}

/// Bob the exposed emerald and shed sparkles.
fn emerald_vfx(level: &mut Level, ufo: Entity) {
    const BOB_TICS: u32 = 32;
    let leveltime = level.leveltime();
    let bob_angle = Angle((leveltime & (BOB_TICS - 1)).wrapping_mul(u32::MAX / BOB_TICS));

    let Some(mo) = level.actors.mobj_mut(ufo) else {
        return;
    };
    mo.spr_z_offset = mo.scale * 16 * bob_angle.sin();
    let mo = *mo;

    if leveltime % 3 == 0 {
        let offset = FixedVec3::new(
            Fixed::from_int(level.rng.range(RandomClass::Sparkle, -48, 48)),
            Fixed::from_int(level.rng.range(RandomClass::Sparkle, -48, 48)),
            Fixed::from_int(level.rng.range(RandomClass::Sparkle, 0, 64)) + mo.spr_z_offset / mo.scale,
        );
        vfx::spawn_sparkle(level, ufo, offset);
    }
}
