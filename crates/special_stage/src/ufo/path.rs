//! Following the waypoint graph toward the finish line.

use engine_core::{approx_distance_3d, Entity, Fixed, FixedVec3, MobjFlags, FRACBITS};
use log::info;
use waypoints::{Path, WaypointHeap};

use super::{Ufo, FLOAT_HEIGHT};
use crate::level::Level;

/// Map units from `position` to the finish line, going through `next`.
/// `None` when the graph has no finish line or no path to it.
pub fn distance_to_finish(graph: &WaypointHeap, position: FixedVec3, next: usize) -> Option<u32> {
    let finish = graph.finish_waypoint()?;
    let waypoint = graph.get(next)?;
    let path = graph.pathfind(next, finish.index, false, false)?;

    let unit = |v: Fixed| Fixed::from_int(v.0 >> FRACBITS);
    let to_waypoint = approx_distance_3d(
        unit(position.x) - unit(waypoint.position.x),
        unit(position.y) - unit(waypoint.position.y),
        unit(position.z) - unit(waypoint.position.z),
    );
    Some(path.total_distance.saturating_add(to_waypoint.to_int().max(0) as u32))
}

/// Re-measure the UFO's distance to the finish. Keeps the old value when
/// there is nothing to measure against.
pub fn update_distance_to_finish(level: &mut Level, ufo: Entity) {
    let (Some(mo), Some(state)) = (level.actors.mobj(ufo), level.actors.get::<Ufo>(ufo)) else {
        return;
    };
    let Some(next) = level.graph.waypoint_at(state.waypoint).map(|w| w.index) else {
        return;
    };
    if let Some(distance) = distance_to_finish(&level.graph, mo.position(), next) {
        if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
            state.distance_to_finish = distance;
        }
    }
}

/// Result of walking one tic's worth of track.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    pub position: FixedVec3,
    /// Waypoint now being approached.
    pub waypoint: usize,
    pub reached_end: bool,
    /// Loop passes taken; bounded by the path length plus one.
    pub iterations: usize,
}

/// Walk up to `distance` along the graph from `position` toward the finish
/// line, hovering `float_height` above each waypoint. May pass several
/// waypoints in one call.
pub fn walk(
    graph: &WaypointHeap,
    position: FixedVec3,
    current: usize,
    finish: usize,
    distance: Fixed,
    float_height: Fixed,
) -> Step {
    let mut step = Step {
        position,
        waypoint: current,
        reached_end: false,
        iterations: 0,
    };
    let mut dist_left = distance;
    let mut path: Option<Path> = None;
    let mut path_index = 0;

    while dist_left > Fixed::ZERO {
        step.iterations += 1;
        let Some(wp) = graph.get(step.waypoint) else {
            break;
        };
        let target = FixedVec3::new(wp.position.x, wp.position.y, wp.position.z + float_height);
        let to_next = step.position.approx_distance_to(target);

        if to_next > dist_left {
            // Only part of the way there.
            let p = step.position;
            step.position = FixedVec3::new(
                p.x + (target.x - p.x) / to_next * dist_left,
                p.y + (target.y - p.y) / to_next * dist_left,
                p.z + (target.z - p.z) / to_next * dist_left,
            );
            break;
        }

        step.position = target;
        dist_left -= to_next;

        if step.waypoint == finish {
            step.reached_end = true;
            break;
        }

        // Waypoints can sit close enough together to pass several per tic,
        // so only plan the route once we actually arrive at one.
        if path.is_none() {
            path = graph.pathfind(step.waypoint, finish, false, false);
        }
        let Some(route) = &path else {
            break;
        };

        path_index += 1;
        match route.waypoint(path_index) {
            Some(next) => step.waypoint = next,
            None => {
                step.reached_end = true;
                break;
            }
        }
    }

    step
}

/// Move the UFO one tic along the track. Without a usable waypoint it
/// rises straight up at its current speed.
pub fn follow_path(level: &mut Level, ufo: Entity) {
    let (Some(mo), Some(state)) = (level.actors.mobj(ufo), level.actors.get::<Ufo>(ufo)) else {
        return;
    };

    let current = level.graph.waypoint_at(state.waypoint).map(|w| w.index);
    let finish = level.graph.finish_waypoint().map(|w| w.index);
    let (Some(current), Some(finish)) = (current, finish) else {
        if let Some(mo) = level.actors.mobj_mut(ufo) {
            mo.momx = Fixed::ZERO;
            mo.momy = Fixed::ZERO;
            mo.momz = state.speed;
        }
        return;
    };

    let step = walk(
        &level.graph,
        mo.position(),
        current,
        finish,
        state.speed * level.map_object_scale,
        mo.scale * FLOAT_HEIGHT,
    );

    if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
        state.waypoint = step.waypoint as i32;
    }
    level.actors.move_to(ufo, step.position);

    if step.reached_end {
        reach_finish(level, ufo);
    }
}

/// The UFO got away: it goes inert and every racer is out.
fn reach_finish(level: &mut Level, ufo: Entity) {
    if let Some(state) = level.actors.get_mut::<Ufo>(ufo) {
        state.waypoint = -1;
    }
    if let Some(mo) = level.actors.mobj_mut(ufo) {
        mo.flags.remove(MobjFlags::SPECIAL | MobjFlags::PICKUPFROMBELOW);
    }
    for player in level.players.racing_mut() {
        player.no_contest = true;
        player.do_exit();
    }
    info!("special UFO reached the finish line");
}
