//! Karts touching the UFO.

use engine_core::{momentum_angle, point_to_angle, Angle, DamageKind, Entity, MobjFlags, MobjKind};

use super::damage::ufo_damage;
use crate::level::Level;
use crate::players::kart_bounce;
use crate::stage;

/// Resolve a kart touching the UFO. A boosting kart rams it for damage and
/// spends its boost; otherwise a kart caught in its path stumbles. Either
/// way the two bounce apart, unless the kart passed over or under it.
pub fn player_ufo_collide(level: &mut Level, ufo: Entity, other: Entity) {
    let Some(slot) = level.players.owner_of(&level.actors, other) else {
        return;
    };
    let Some(player) = level.players.get(slot) else {
        return;
    };
    let (Some(ufo_mo), Some(other_mo)) = (level.actors.mobj(ufo), level.actors.mobj(other)) else {
        return;
    };

    if player.sneaker_timer > 0 && !player.in_pain() && player.flashing == 0 {
        ufo_damage(level, ufo, Some(other), Some(other), DamageKind::Steal);
        if let Some(player) = level.players.get_mut(slot) {
            player.sneaker_timer = 0;
        }
    } else {
        if other_mo.z > ufo_mo.top() {
            return;
        }
        if other_mo.top() < ufo_mo.z {
            return;
        }

        let move_angle = momentum_angle(&ufo_mo);
        let clip_angle = point_to_angle(ufo_mo.x, ufo_mo.y, other_mo.x, other_mo.y);
        if Angle::delta(move_angle, clip_angle) < Angle::DEG60 {
            if let Some(player) = level.players.get_mut(slot) {
                player.stumble();
            }
        }
    }

    kart_bounce(&mut level.actors, other, ufo);
}

/// Find karts overlapping the stage UFO this tic and resolve each contact.
/// Once the emerald is exposed, touching it is a pickup for the host to
/// handle, not a collision.
pub fn check_player_contacts(level: &mut Level) {
    let Some(ufo) = stage::special_ufo(level) else {
        return;
    };
    let Some(ufo_mo) = level.actors.mobj(ufo) else {
        return;
    };
    if ufo_mo.flags.contains(MobjFlags::SPECIAL) || !ufo_mo.flags.contains(MobjFlags::SOLID) {
        return;
    }

    let touching: Vec<Entity> = level
        .players
        .in_play(&level.actors)
        .filter_map(|(_, p)| p.mo)
        .filter(|mo| {
            level.actors.mobj(*mo).map_or(false, |k| {
                let reach = k.radius + ufo_mo.radius;
                k.kind == MobjKind::Player
                    && (k.x - ufo_mo.x).abs() < reach
                    && (k.y - ufo_mo.y).abs() < reach
            })
        })
        .collect();

    for kart in touching {
        player_ufo_collide(level, ufo, kart);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::test_support::level;
    use crate::ufo::Ufo;
    use engine_core::{Fixed, FixedVec3, Mobj, MobjState};

    /// UFO heading +x at the origin, a kart at `(x, y, z)` moving toward it.
    fn setup(x: i32, y: i32, z: i32) -> (Level, Entity, Entity, usize) {
        let mut level = level();
        let ufo = stage::begin_stage(&mut level);
        {
            let mo = level.actors.mobj_mut(ufo).unwrap();
            mo.x = Fixed::ZERO;
            mo.y = Fixed::ZERO;
            mo.z = Fixed::ZERO;
            mo.momx = Fixed::from_int(40);
            mo.momy = Fixed::ZERO;
        }
        let kart = level.actors.spawn(Mobj::new(
            MobjKind::Player,
            FixedVec3::from_ints(x, y, z),
            MobjState::Spawn,
        ));
        level.actors.mobj_mut(kart).unwrap().momx = Fixed::from_int(-20);
        let slot = level.players.join(&mut level.actors, kart, 0).unwrap();
        (level, ufo, kart, slot)
    }

    #[test]
    fn boosting_kart_rams_for_damage() {
        let (mut level, ufo, kart, slot) = setup(100, 0, 0);
        {
            let p = level.players.get_mut(slot).unwrap();
            p.sneaker_timer = 20;
            p.num_sneakers = 2;
        }
        player_ufo_collide(&mut level, ufo, kart);
        assert_eq!(level.actors.mobj(ufo).unwrap().health, 101 - 30);
        assert_eq!(level.players.get(slot).unwrap().sneaker_timer, 0);
        assert_eq!(level.players.get(slot).unwrap().stumble_timer, 0);
    }

    #[test]
    fn kart_in_front_stumbles_and_bounces() {
        let (mut level, ufo, kart, slot) = setup(100, 0, 0);
        player_ufo_collide(&mut level, ufo, kart);
        assert!(level.players.get(slot).unwrap().stumble_timer > 0);
        assert!(level.actors.mobj(kart).unwrap().momx > Fixed::from_int(-20));
        assert_eq!(level.actors.mobj(ufo).unwrap().health, 101);
    }

    #[test]
    fn kart_behind_only_bounces() {
        let (mut level, ufo, kart, slot) = setup(-100, 0, 0);
        level.actors.mobj_mut(kart).unwrap().momx = Fixed::from_int(60);
        player_ufo_collide(&mut level, ufo, kart);
        assert_eq!(level.players.get(slot).unwrap().stumble_timer, 0);
        assert!(level.actors.mobj(kart).unwrap().momx < Fixed::from_int(60));
    }

    #[test]
    fn kart_overhead_is_ignored() {
        let (mut level, ufo, kart, slot) = setup(100, 0, 500);
        player_ufo_collide(&mut level, ufo, kart);
        assert_eq!(level.players.get(slot).unwrap().stumble_timer, 0);
        assert_eq!(level.actors.mobj(kart).unwrap().momx, Fixed::from_int(-20));
    }

    #[test]
    fn pain_blocks_the_ram() {
        let (mut level, ufo, kart, slot) = setup(100, 0, 0);
        {
            let p = level.players.get_mut(slot).unwrap();
            p.sneaker_timer = 20;
            p.spinout_timer = 5;
        }
        player_ufo_collide(&mut level, ufo, kart);
        assert_eq!(level.actors.mobj(ufo).unwrap().health, 101);
        assert_eq!(level.players.get(slot).unwrap().sneaker_timer, 20);
    }

    #[test]
    fn contacts_are_found_by_overlap() {
        let (mut level, ufo, _kart, slot) = setup(50, 0, 0);
        level.players.get_mut(slot).unwrap().sneaker_timer = 20;
        check_player_contacts(&mut level);
        assert!(level.actors.mobj(ufo).unwrap().health < 101);

        // Exposed emerald: no collision handling.
        let health = level.actors.mobj(ufo).unwrap().health;
        level.actors.mobj_mut(ufo).unwrap().flags.insert(MobjFlags::SPECIAL);
        level.players.get_mut(slot).unwrap().sneaker_timer = 20;
        check_player_contacts(&mut level);
        assert_eq!(level.actors.mobj(ufo).unwrap().health, health);
        assert!(level.actors.get::<Ufo>(ufo).is_some());
    }
}
