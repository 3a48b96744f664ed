//! Weapon damage and the break into the pinch phase.

use engine_core::{DamageKind, Entity, Fixed, MobjFlags, MobjKind, SoundId};
use log::{debug, info};

use super::{emerald_chase, pieces, Ufo, DAMAGED_BONUS};
use crate::level::{Level, ScriptTrigger};
use crate::players::SkinFlags;

/// Quake strength for both hit and break.
const QUAKE_INTENSITY: Fixed = Fixed::from_int(64);
const HIT_QUAKE_TICS: u32 = 10;
const BREAK_QUAKE_TICS: u32 = 20;

/// What the damage table needs to know about whatever hit the UFO.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inflictor {
    pub kind: MobjKind,
    pub health: i32,
    /// Boosts used by the attacking player, for kart rams.
    pub sneakers_used: u32,
}

/// Damage dealt by an inflictor, falling back on the damage kind when the
/// inflictor is missing or not a recognised weapon.
pub fn damage_amount(inflictor: Option<Inflictor>, kind: DamageKind) -> u8 {
    if let Some(inflictor) = inflictor {
        match inflictor.kind {
            // Orbiting shields chip away.
            MobjKind::JawzShield | MobjKind::OrbinautShield => return 10,
            MobjKind::Jawz => return 15,
            MobjKind::Orbinaut => return 20,
            MobjKind::Spb => return 30,
            // Sniped fruit hits harder than fruit left on the track.
            MobjKind::Banana if inflictor.health > 1 => return 30,
            MobjKind::Banana => return 10,
            MobjKind::Player => return (15 * inflictor.sneakers_used.max(1)).min(u8::MAX as u32) as u8,
            _ => {}
        }
    }

    match kind {
        DamageKind::Normal | DamageKind::Sting | DamageKind::Steal => 10,
        DamageKind::Voltage => 15,
        DamageKind::Wipeout => 20,
        DamageKind::Explode | DamageKind::Tumble => 30,
    }
}

fn resolve_inflictor(level: &Level, inflictor: Option<Entity>) -> Option<Inflictor> {
    let e = inflictor?;
    let mo = level.actors.mobj(e)?;
    let sneakers_used = level
        .players
        .owner_of(&level.actors, e)
        .and_then(|slot| level.players.get(slot))
        .map_or(0, |p| p.num_sneakers);
    Some(Inflictor {
        kind: mo.kind,
        health: mo.health,
        sneakers_used,
    })
}

/// Apply a hit to the UFO. Returns false when the hit was refused.
pub fn ufo_damage(
    level: &mut Level,
    ufo: Entity,
    inflictor: Option<Entity>,
    source: Option<Entity>,
    kind: DamageKind,
) -> bool {
    let Some(mo) = level.actors.mobj(ufo) else {
        return false;
    };
    if level.actors.get::<Ufo>(ufo).is_none() || emerald_chase(&mo) {
        return false;
    }

    let damage = damage_amount(resolve_inflictor(level, inflictor), kind);
    if damage == 0 {
        return false;
    }

    // Attackers with a shuffling skin show a new face after every hit.
    if let Some(slot) = source.and_then(|s| level.players.owner_of(&level.actors, s)) {
        let skin_count = level.players.skin_count;
        if let Some(player) = level.players.get_mut(slot) {
            if player.skin_flags.contains(SkinFlags::IRONMAN) {
                player.randomize_fake_skin(&mut level.rng, skin_count);
            }
        }
    }

    let bonus = DAMAGED_BONUS * level.game_speed_scalar();
    add_speed(level, ufo, bonus);

    let hitlag = u32::from(damage / 3) + 2;
    level.actors.set_hitlag(ufo, hitlag, true);
    if let Some(inflictor) = inflictor.filter(|e| level.actors.valid(*e)) {
        level.actors.set_hitlag(inflictor, hitlag, true);
    }
    pieces::copy_hitlag_to_pieces(&mut level.actors, ufo);

    if i32::from(damage) >= mo.health - 1 {
        enter_pinch(level, ufo);
        add_speed(level, ufo, bonus);
        return true;
    }

    level.sounds.start(ufo, SoundId::ClawHit);
    level.sounds.stop(ufo, SoundId::ClawZoom);
    level.start_quake(QUAKE_INTENSITY, HIT_QUAKE_TICS);
    if let Some(mo) = level.actors.mobj_mut(ufo) {
        mo.health -= i32::from(damage);
        debug!("special UFO took {} damage, {} health left", damage, mo.health);
    }
    true
}

fn add_speed(level: &mut Level, ufo: Entity, amount: Fixed) {
    if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
        state.speed += amount;
    }
}

/// Shed the shell: pieces fly off and the emerald becomes collectible.
fn enter_pinch(level: &mut Level, ufo: Entity) {
    pieces::dismantle(level, ufo);

    if let Some(mo) = level.actors.mobj_mut(ufo) {
        mo.health = 1;
        mo.flags.remove(MobjFlags::SHOOTABLE);
        mo.flags.insert(MobjFlags::SPECIAL | MobjFlags::PICKUPFROMBELOW);
        mo.shadow_scale = Fixed::from_ratio(1, 3);
    }

    level.fire_trigger(ScriptTrigger::PinchPhase { activator: ufo });

    level.sounds.stop_all(ufo);
    level.sounds.start(ufo, SoundId::ClawBreak);
    level.start_quake(QUAKE_INTENSITY, BREAK_QUAKE_TICS);
    info!("special UFO broke open; emerald exposed");
}
