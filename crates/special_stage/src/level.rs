//! Level state and the per-tic driver.

use engine_core::{
    ActorWorld, Entity, Fixed, MobjKind, RandomStreams, SoundChannels, TicClock,
};
use waypoints::WaypointHeap;

use crate::config::{GameSpeed, StageConfig};
use crate::players::Players;
use crate::stage::SpecialStageInfo;
use crate::ufo;
use crate::ufo::pieces;
use crate::vfx;

/// Screen shake requested by the simulation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Quake {
    pub intensity: Fixed,
    pub tics: u32,
}

/// Map-script hooks the level can fire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptTrigger {
    /// The UFO's shell broke; the emerald is exposed.
    PinchPhase { activator: Entity },
}

/// Everything one running level owns.
///
/// Started quakes and fired script triggers are queued for the host and
/// only leave through [`Level::drain_quakes`] and [`Level::drain_triggers`];
/// a host is expected to drain both every tic.
pub struct Level {
    pub actors: ActorWorld,
    pub players: Players,
    pub graph: WaypointHeap,
    pub rng: RandomStreams,
    pub sounds: SoundChannels,
    pub clock: TicClock,
    pub special_stage: SpecialStageInfo,
    pub game_speed: GameSpeed,
    pub map_object_scale: Fixed,
    pub ceiling_z: Fixed,
    pub ufo_spawn_health: i32,
    pub ufo_radius: Fixed,
    pub ufo_height: Fixed,
    quake: Option<Quake>,
    quakes_started: Vec<Quake>,
    triggers: Vec<ScriptTrigger>,
}

impl Level {
    pub fn new(config: &StageConfig, graph: WaypointHeap) -> Self {
        Self {
            actors: ActorWorld::new(),
            players: Players::new(),
            graph,
            rng: RandomStreams::new(config.rng_seed),
            sounds: SoundChannels::new(),
            clock: TicClock::new(),
            special_stage: SpecialStageInfo::default(),
            game_speed: config.game_speed,
            map_object_scale: config.map_object_scale(),
            ceiling_z: Fixed::from_int(config.ceiling_height),
            ufo_spawn_health: config.ufo_spawn_health.max(1),
            ufo_radius: Fixed::from_int(config.ufo_radius),
            ufo_height: Fixed::from_int(config.ufo_height),
            quake: None,
            quakes_started: Vec::new(),
            triggers: Vec::new(),
        }
    }

    pub fn leveltime(&self) -> u32 {
        self.clock.leveltime()
    }

    pub fn game_speed_scalar(&self) -> Fixed {
        self.game_speed.scalar()
    }

    /// Run one tic: every actor thinks in spawn order, then moves.
    pub fn tick(&mut self) {
        self.clock.tick();

        for e in self.actors.in_spawn_order() {
            if !self.actors.valid(e) {
                continue;
            }
            if self.actors.tick_hitlag(e) {
                continue;
            }
            let Some(mo) = self.actors.mobj(e) else {
                continue;
            };

            match mo.kind {
                MobjKind::SpecialUfo => ufo::ufo_thinker(self, e),
                MobjKind::UfoPiece if mo.health <= 0 => pieces::piece_dead_thinker(self, e),
                MobjKind::UfoPiece => pieces::piece_thinker(self, e),
                MobjKind::Overlay => vfx::overlay_thinker(self, e),
                _ => {}
            }

            if !self.actors.valid(e) {
                continue;
            }
            self.actors.step_motion(e);
            if self.actors.tick_state(e) {
                self.remove_actor(e);
            }
        }

        ufo::collide::check_player_contacts(self);

        self.players.tick();
        self.sounds.tick();
        if let Some(q) = &mut self.quake {
            q.tics = q.tics.saturating_sub(1);
            if q.tics == 0 {
                self.quake = None;
            }
        }
    }

    /// Remove an actor, running its removal hook first.
    pub fn remove_actor(&mut self, e: Entity) {
        let Some(mo) = self.actors.mobj(e) else {
            return;
        };
        if mo.kind == MobjKind::UfoPiece {
            pieces::piece_removed(&mut self.actors, e);
        }
        self.sounds.stop_all(e);
        self.actors.despawn(e);
    }

    /// Start a screen shake. A stronger or longer one already running wins.
    pub fn start_quake(&mut self, intensity: Fixed, tics: u32) {
        let quake = Quake { intensity, tics };
        self.quake = match self.quake {
            Some(q) if q.intensity >= intensity && q.tics >= tics => Some(q),
            _ => Some(quake),
        };
        self.quakes_started.push(quake);
    }

    pub fn quake(&self) -> Option<Quake> {
        self.quake
    }

    pub fn drain_quakes(&mut self) -> Vec<Quake> {
        std::mem::take(&mut self.quakes_started)
    }

    pub fn fire_trigger(&mut self, trigger: ScriptTrigger) {
        self.triggers.push(trigger);
    }

    pub fn drain_triggers(&mut self) -> Vec<ScriptTrigger> {
        std::mem::take(&mut self.triggers)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use engine_core::{FixedVec3, Mobj, MobjState};

    #[test]
    fn tick_advances_leveltime_and_expires_actors() {
        let mut level = level();
        let mut mo = Mobj::new(MobjKind::FastLine, FixedVec3::ZERO, MobjState::FastLine);
        mo.tics = 2;
        let e = level.actors.spawn(mo);
        level.tick();
        assert!(level.actors.valid(e));
        level.tick();
        assert!(!level.actors.valid(e));
        assert_eq!(level.leveltime(), 2);
    }

    #[test]
    fn frozen_actors_do_not_move() {
        let mut level = level();
        let e = level
            .actors
            .spawn(Mobj::new(MobjKind::Other, FixedVec3::ZERO, MobjState::Spawn));
        level.actors.mobj_mut(e).unwrap().momx = Fixed::from_int(5);
        level.actors.set_hitlag(e, 1, false);
        level.tick();
        assert_eq!(level.actors.mobj(e).unwrap().x, Fixed::ZERO);
        level.tick();
        assert_eq!(level.actors.mobj(e).unwrap().x, Fixed::from_int(5));
    }

    #[test]
    fn quake_keeps_the_stronger_shake_and_counts_down() {
        let mut level = level();
        level.start_quake(Fixed::from_int(64), 20);
        level.start_quake(Fixed::from_int(64), 10);
        assert_eq!(level.quake().unwrap().tics, 20);
        assert_eq!(level.drain_quakes().len(), 2);
        for _ in 0..20 {
            level.tick();
        }
        assert!(level.quake().is_none());
    }

    #[test]
    fn host_queues_empty_on_drain() {
        let mut level = level();
        let e = level
            .actors
            .spawn(Mobj::new(MobjKind::Other, FixedVec3::ZERO, MobjState::Spawn));
        level.fire_trigger(ScriptTrigger::PinchPhase { activator: e });
        level.start_quake(Fixed::from_int(64), 10);
        level.tick();
        assert_eq!(level.drain_triggers().len(), 1);
        assert_eq!(level.drain_quakes().len(), 1);
        assert!(level.drain_triggers().is_empty());
        assert!(level.drain_quakes().is_empty());
    }
}
