//! Pacing: keep the UFO a fixed lead ahead of the best-placed player.

use engine_core::{fixed_div, Entity, Fixed, SoundId, FRACBITS};

use super::{emerald_chase, Ufo, BASE_SPEED, DEADZONE, SLOWDOWN, SPACING, SPEEDUP, SPEED_FACTOR};
use crate::level::Level;
use crate::vfx;

/// Speeds above this trigger the zoom loop while accelerating.
const ZOOM_SPEED: Fixed = Fixed::from_int(70);
/// Speeds above this trail speed lines from the exposed emerald.
const EMERALD_LINES_SPEED: Fixed = Fixed::from_int(50);

/// Distance-to-finish and pace of the best-placed player in play.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Leader {
    pub distance_to_finish: u32,
    /// Unscaled, already reduced by [`SPEED_FACTOR`].
    pub speed: Fixed,
}

/// Find the player closest to the finish. Their speed is capped at their
/// normal top speed so boosting doesn't make the UFO run away. Players with
/// no known distance yet (`u32::MAX`) never lead.
pub fn find_leader(level: &Level) -> Option<Leader> {
    let mut best: Option<Leader> = None;
    for (_, p) in level.players.in_play(&level.actors) {
        let best_dist = best.map_or(u32::MAX, |b| b.distance_to_finish);
        if p.distance_to_finish < best_dist {
            let speed = p.horizontal_speed().min(p.kart_speed);
            let speed = Fixed(fixed_div(speed.0, level.map_object_scale.0));
            best = Some(Leader {
                distance_to_finish: p.distance_to_finish,
                speed: speed * SPEED_FACTOR,
            });
        }
    }
    best
}

/// Scale a map-unit constant by the object scale and game speed, then drop
/// it to whole units.
fn scaled_units(value: Fixed, map_scale: Fixed, game_speed: Fixed) -> i64 {
    ((value * map_scale * game_speed).0 >> FRACBITS) as i64
}

/// The speed the UFO is aiming for this tic.
pub fn wanted_speed(
    ufo_distance: u32,
    leader: Option<Leader>,
    map_scale: Fixed,
    game_speed: Fixed,
) -> Fixed {
    let base = BASE_SPEED * game_speed;
    let Some(leader) = leader else {
        return base;
    };

    let spacing = scaled_units(SPACING, map_scale, game_speed).max(0) as u32;
    let deadzone = scaled_units(DEADZONE, map_scale, game_speed);

    let wanted_dist = leader.distance_to_finish.saturating_sub(spacing);
    let delta = ufo_distance as i64 - wanted_dist as i64;

    if delta > deadzone {
        // Too far behind the spot ahead of the leader.
        leader.speed.max(base << 2)
    } else if delta.abs() <= deadzone {
        (leader.speed >> 1).max(base)
    } else {
        // Too far ahead.
        base
    }
}

/// Move `current` toward `wanted` by at most one step either way.
pub fn slew(current: Fixed, wanted: Fixed) -> Fixed {
    let delta = wanted - current;
    if delta > Fixed::ZERO {
        if delta <= SPEEDUP {
            wanted
        } else {
            current + SPEEDUP
        }
    } else if delta < Fixed::ZERO {
        if delta.abs() <= SLOWDOWN {
            wanted
        } else {
            current - SLOWDOWN
        }
    } else {
        current
    }
}

/// Per-tic speed update, with the audio-visual cues for accelerating.
pub fn update_speed(level: &mut Level, ufo: Entity) {
    let (Some(mo), Some(state)) = (level.actors.mobj(ufo), level.actors.get::<Ufo>(ufo)) else {
        return;
    };

    let wanted = wanted_speed(
        state.distance_to_finish,
        find_leader(level),
        level.map_object_scale,
        level.game_speed_scalar(),
    );
    let speed = slew(state.speed, wanted);
    if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
        state.speed = speed;
    }

    if speed <= state.speed {
        return;
    }
    if emerald_chase(&mo) {
        if speed > EMERALD_LINES_SPEED {
            vfx::spawn_emerald_speed_lines(level, ufo);
        }
    } else if speed > ZOOM_SPEED && !level.sounds.is_playing(ufo, SoundId::ClawZoom) {
        level.sounds.start(ufo, SoundId::ClawZoom);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::test_support::level;
    use crate::ufo::create_special_ufo;
    use engine_core::{FixedVec3, Mobj, MobjKind, MobjState};
    use rand::prelude::*;

    fn add_player(level: &mut Level, distance: u32, speed: i32) -> usize {
        let kart = level
            .actors
            .spawn(Mobj::new(MobjKind::Player, FixedVec3::ZERO, MobjState::Spawn));
        let slot = level.players.join(&mut level.actors, kart, 0).unwrap();
        let p = level.players.get_mut(slot).unwrap();
        p.distance_to_finish = distance;
        p.rmomx = Fixed::from_int(speed);
        p.kart_speed = Fixed::from_int(100);
        slot
    }

    fn set_ufo(level: &mut Level, ufo: Entity, distance: u32, speed: Fixed) {
        let state = level.actors.get_mut::<Ufo>(ufo).unwrap();
        state.distance_to_finish = distance;
        state.speed = speed;
    }

    #[test]
    fn steady_state_pacing_matches_base_speed() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        add_player(&mut level, 10_000, 60);
        set_ufo(&mut level, ufo, 9232, Fixed::from_int(45));

        update_speed(&mut level, ufo);
        assert_eq!(
            level.actors.get::<Ufo>(ufo).unwrap().speed,
            Fixed::from_int(44) + Fixed::HALF
        );
    }

    #[test]
    fn falling_behind_catches_up() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        add_player(&mut level, 5000, 60);
        set_ufo(&mut level, ufo, 10_000, BASE_SPEED);

        let leader = find_leader(&level).unwrap();
        assert_eq!(
            wanted_speed(10_000, Some(leader), Fixed::ONE, Fixed::ONE),
            Fixed::from_int(168)
        );
        update_speed(&mut level, ufo);
        assert_eq!(
            level.actors.get::<Ufo>(ufo).unwrap().speed,
            BASE_SPEED + SPEEDUP
        );
    }

    #[test]
    fn too_far_ahead_drops_to_base() {
        let leader = Leader {
            distance_to_finish: 10_000,
            speed: Fixed::from_int(90),
        };
        assert_eq!(wanted_speed(5000, Some(leader), Fixed::ONE, Fixed::ONE), BASE_SPEED);
        assert_eq!(wanted_speed(5000, None, Fixed::ONE, Fixed::ONE), BASE_SPEED);
    }

    #[test]
    fn leader_speed_is_capped_and_factored() {
        let mut level = level();
        let slot = add_player(&mut level, 100, 300);
        add_player(&mut level, 5000, 10);
        let leader = find_leader(&level).unwrap();
        assert_eq!(leader.distance_to_finish, 100);
        // 300 capped to 100, times 3/4.
        assert_eq!(leader.speed, Fixed::from_int(75));

        level.players.get_mut(slot).unwrap().spectator = true;
        assert_eq!(find_leader(&level).unwrap().distance_to_finish, 5000);
    }

    #[test]
    fn player_without_a_distance_is_not_the_leader() {
        let mut level = level();
        let slot = add_player(&mut level, u32::MAX, 200);
        level.players.get_mut(slot).unwrap().kart_speed = Fixed::from_int(200);
        assert_eq!(find_leader(&level), None);
        assert_eq!(
            wanted_speed(u32::MAX, find_leader(&level), Fixed::ONE, Fixed::ONE),
            BASE_SPEED
        );

        add_player(&mut level, 9000, 60);
        assert_eq!(find_leader(&level).unwrap().distance_to_finish, 9000);
    }

    #[test]
    fn deadzone_is_stable() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let leader = Leader {
                distance_to_finish: rng.gen_range(800..100_000),
                speed: Fixed::from_int(rng.gen_range(0..120)),
            };
            let wanted_dist = leader.distance_to_finish - 768;
            let offset = rng.gen_range(-2048..=2048);
            let ufo_distance = (wanted_dist as i64 + offset).max(0) as u32;
            let wanted = wanted_speed(ufo_distance, Some(leader), Fixed::ONE, Fixed::ONE);
            assert_eq!(wanted, (leader.speed >> 1).max(BASE_SPEED));
        }
    }

    #[test]
    fn slew_is_bounded() {
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..500 {
            let current = Fixed::from_raw(rng.gen_range(0..200 << 16));
            let wanted = Fixed::from_raw(rng.gen_range(0..200 << 16));
            let next = slew(current, wanted);
            assert!((next - current).abs() <= SPEEDUP);
            // Never overshoots.
            assert!((wanted - next).abs() <= (wanted - current).abs());
        }
    }

    #[test]
    fn accelerating_past_the_zoom_threshold_starts_the_zoom_loop() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        set_ufo(&mut level, ufo, 10_000, Fixed::from_int(80));
        add_player(&mut level, 1000, 60);
        update_speed(&mut level, ufo);
        assert!(level.sounds.is_playing(ufo, SoundId::ClawZoom));
    }

    #[test]
    fn decelerating_is_silent() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        set_ufo(&mut level, ufo, 10_000, Fixed::from_int(80));
        update_speed(&mut level, ufo);
        assert!(!level.sounds.is_playing(ufo, SoundId::ClawZoom));
    }

    #[test]
    fn exposed_emerald_trails_lines_instead_of_zooming() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        level.actors.mobj_mut(ufo).unwrap().health = 1;
        set_ufo(&mut level, ufo, 10_000, Fixed::from_int(80));
        add_player(&mut level, 1000, 60);
        update_speed(&mut level, ufo);
        assert!(!level.sounds.is_playing(ufo, SoundId::ClawZoom));
        assert_eq!(level.actors.count_kind(MobjKind::FastLine), 1);
    }
}
