//! The special-stage slot: which UFO, if any, this level is chasing.

use engine_core::Entity;
use log::info;
use waypoints::Waypoint;

use crate::level::Level;
use crate::ufo::{self, Ufo};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SpecialStageInfo {
    pub valid: bool,
    pub ufo: Option<Entity>,
}

/// Spawn the UFO and mark the stage active.
pub fn begin_stage(level: &mut Level) -> Entity {
    let ufo = ufo::create_special_ufo(level);
    level.special_stage = SpecialStageInfo {
        valid: true,
        ufo: Some(ufo),
    };
    info!("special stage started");
    ufo
}

/// Forget the stage's UFO. The actor itself is left to the level.
pub fn end_stage(level: &mut Level) {
    level.special_stage = SpecialStageInfo::default();
    info!("special stage ended");
}

/// The stage UFO, if the slot is active and the actor still exists.
pub fn special_ufo(level: &Level) -> Option<Entity> {
    let info = level.special_stage;
    if !info.valid {
        return None;
    }
    info.ufo.filter(|e| level.actors.valid(*e))
}

/// Waypoint the UFO is heading for. `ufo` defaults to the stage UFO.
pub fn special_ufo_waypoint(level: &Level, ufo: Option<Entity>) -> Option<&Waypoint> {
    let ufo = ufo.or_else(|| special_ufo(level))?;
    let state = level.actors.get::<Ufo>(ufo)?;
    if state.waypoint < 0 {
        return None;
    }
    level.graph.waypoint_at(state.waypoint)
}

/// The stage UFO's distance to the finish line, or `u32::MAX` without one.
pub fn special_ufo_distance(level: &Level) -> u32 {
    special_ufo(level)
        .and_then(|e| level.actors.get::<Ufo>(e))
        .map_or(u32::MAX, |u| u.distance_to_finish)
}
