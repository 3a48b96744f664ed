//! special-stage-sim: run the UFO chase headless with bot players.
//!
//! Reads the stage settings from `config.ron` and the run settings from
//! `sim.ron`, both optional.

use std::path::Path;

use anyhow::{Context, Result};
use engine_core::{
    hypot, Angle, DamageKind, Entity, Fixed, FixedVec3, Mobj, MobjFlags, MobjKind, MobjState,
    TICRATE,
};
use serde::{Deserialize, Serialize};
use waypoints::WaypointHeap;

use special_stage::ufo::{self, emerald_chase, path};
use special_stage::{stage, Level, ScriptTrigger, StageConfig, Ufo};

/// Run settings for the headless simulation.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct SimConfig {
    /// Tics to run before giving up.
    #[serde(default = "default_tics")]
    tics: u32,
    #[serde(default = "default_players")]
    players: usize,
    /// Map units.
    #[serde(default = "default_track_radius")]
    track_radius: i32,
    #[serde(default = "default_track_waypoints")]
    track_waypoints: usize,
    /// Map units per tic for the slowest bot; each further bot is a little faster.
    #[serde(default = "default_player_speed")]
    player_speed: i32,
    /// Tics between weapon hits on the UFO.
    #[serde(default = "default_attack_every")]
    attack_every: u32,
}

fn default_tics() -> u32 {
    TICRATE * 180
}
fn default_players() -> usize {
    4
}
fn default_track_radius() -> i32 {
    8000
}
fn default_track_waypoints() -> usize {
    48
}
fn default_player_speed() -> i32 {
    52
}
fn default_attack_every() -> u32 {
    TICRATE * 2
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            tics: default_tics(),
            players: default_players(),
            track_radius: default_track_radius(),
            track_waypoints: default_track_waypoints(),
            player_speed: default_player_speed(),
            attack_every: default_attack_every(),
        }
    }
}

impl SimConfig {
    fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::info!("{} not found, using default sim settings", path.display());
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        ron::from_str(&data).with_context(|| format!("parsing {}", path.display()))
    }
}

/// Evenly spaced waypoints on a circle, finish line at index 0.
fn circular_track(radius: i32, count: usize) -> Result<WaypointHeap> {
    let step = Angle::full_circle_div(count.max(1) as u32);
    let radius = Fixed::from_int(radius);
    let points: Vec<FixedVec3> = (0..count as u32)
        .map(|i| {
            let a = Angle(step.0.wrapping_mul(i));
            FixedVec3::new(radius * a.cos(), radius * a.sin(), Fixed::ZERO)
        })
        .collect();
    WaypointHeap::circuit(&points, 0).context("building the track")
}

struct Bot {
    slot: usize,
    mo: Entity,
    /// Waypoint being driven toward.
    next: usize,
    speed: Fixed,
    finished: bool,
}

fn spawn_bots(level: &mut Level, sim: &SimConfig) -> Vec<Bot> {
    let Some(start) = level.graph.finish_waypoint().map(|w| (w.index, w.position)) else {
        return Vec::new();
    };
    let next = level
        .graph
        .get(start.0)
        .and_then(|w| w.next.first())
        .map_or(start.0, |l| l.to);

    let mut bots = Vec::new();
    for i in 0..sim.players {
        let lane = Fixed::from_int(48 * i as i32 - 24 * sim.players as i32);
        let position = FixedVec3::new(start.1.x, start.1.y + lane, start.1.z);
        let mo = level.actors.spawn(
            Mobj::new(MobjKind::Player, position, MobjState::Spawn)
                .with_flags(MobjFlags::SOLID | MobjFlags::SHOOTABLE | MobjFlags::NOGRAVITY),
        );
        let skin = i % level.players.skin_count;
        let Some(slot) = level.players.join(&mut level.actors, mo, skin) else {
            log::warn!("no free player slot for bot {}", i);
            level.actors.despawn(mo);
            break;
        };
        let speed = Fixed::from_int(sim.player_speed + 2 * i as i32);
        if let Some(p) = level.players.get_mut(slot) {
            p.kart_speed = speed;
        }
        bots.push(Bot {
            slot,
            mo,
            next,
            speed,
            finished: false,
        });
    }
    bots
}

/// Drive each bot one tic along the track and refresh its distance.
fn drive_bots(level: &mut Level, bots: &mut [Bot]) {
    let Some(finish) = level.graph.finish_waypoint().map(|w| w.index) else {
        return;
    };
    for bot in bots.iter_mut().filter(|b| !b.finished) {
        let Some(mo) = level.actors.mobj(bot.mo) else {
            bot.finished = true;
            continue;
        };
        let stumbling = level
            .players
            .get(bot.slot)
            .map_or(false, |p| p.stumble_timer > 0 || p.exiting);
        let speed = if stumbling { bot.speed >> 2 } else { bot.speed };

        let step = path::walk(&level.graph, mo.position(), bot.next, finish, speed, Fixed::ZERO);
        bot.next = step.waypoint;
        bot.finished = step.reached_end;
        level.actors.move_to(bot.mo, step.position);
        if let Some(mo) = level.actors.mobj_mut(bot.mo) {
            mo.momx = Fixed::ZERO;
            mo.momy = Fixed::ZERO;
        }

        let distance = path::distance_to_finish(&level.graph, step.position, bot.next);
        if let Some(p) = level.players.get_mut(bot.slot) {
            let moved = step.position - mo.position();
            p.rmomx = moved.x;
            p.rmomy = moved.y;
            p.distance_to_finish = if bot.finished { 0 } else { distance.unwrap_or(u32::MAX) };
        }
    }
}

const WEAPONS: [MobjKind; 4] = [MobjKind::Orbinaut, MobjKind::Jawz, MobjKind::Banana, MobjKind::Spb];

/// One bot fires a weapon that connects with the UFO.
fn attack(level: &mut Level, ufo: Entity, bot: &Bot, round: usize) -> bool {
    let Some(kart) = level.actors.mobj(bot.mo) else {
        return false;
    };
    let weapon = level.actors.spawn(
        Mobj::new(WEAPONS[round % WEAPONS.len()], kart.position(), MobjState::Spawn)
            .with_flags(MobjFlags::NOGRAVITY)
            .with_health(1),
    );
    let hit = ufo::ufo_damage(level, ufo, Some(weapon), Some(bot.mo), DamageKind::Normal);
    level.remove_actor(weapon);
    hit
}

fn touching(level: &Level, ufo: Entity, kart: Entity) -> bool {
    match (level.actors.mobj(ufo), level.actors.mobj(kart)) {
        (Some(u), Some(k)) => hypot(u.x - k.x, u.y - k.y) < u.radius + k.radius,
        _ => false,
    }
}

#[derive(Debug, Default)]
struct Summary {
    hits: u32,
    sounds: usize,
    quakes: usize,
    collected_by: Option<usize>,
    escaped: bool,
    tics: u32,
}

fn run(level: &mut Level, sim: &SimConfig) -> Summary {
    let mut summary = Summary::default();
    let mut bots = spawn_bots(level, sim);
    let ufo = stage::begin_stage(level);
    let attack_every = sim.attack_every.max(1);
    let mut round = 0;

    for tic in 0..sim.tics {
        drive_bots(level, &mut bots);
        level.tick();
        summary.tics = tic + 1;

        summary.sounds += level.sounds.drain_started().len();
        summary.quakes += level.drain_quakes().len();
        for trigger in level.drain_triggers() {
            match trigger {
                ScriptTrigger::PinchPhase { .. } => {
                    log::info!("tic {}: shell broken, emerald exposed", level.leveltime());
                }
            }
        }

        let Some(state) = level.actors.get::<Ufo>(ufo) else {
            break;
        };
        if state.waypoint < 0 {
            summary.escaped = true;
            break;
        }

        if ufo::ufo_collectible(level, ufo) {
            if let Some(bot) = bots.iter().find(|b| touching(level, ufo, b.mo)) {
                summary.collected_by = Some(bot.slot);
                level.remove_actor(ufo);
                break;
            }
        }

        let pinched = level.actors.mobj(ufo).map_or(true, |mo| emerald_chase(&mo));
        if !bots.is_empty() && !pinched && (tic + 1) % attack_every == 0 {
            let bot = &bots[round % bots.len()];
            if attack(level, ufo, bot, round) {
                summary.hits += 1;
            }
            round += 1;
        }
    }

    stage::end_stage(level);
    summary
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let stage_config = StageConfig::load("config.ron");
    let sim = SimConfig::load(Path::new("sim.ron"))?;
    log::info!("stage: {:?}", stage_config);
    log::info!("sim: {:?}", sim);

    let graph = circular_track(sim.track_radius, sim.track_waypoints)?;
    let mut level = Level::new(&stage_config, graph);
    let summary = run(&mut level, &sim);

    log::info!(
        "ran {} tics ({:.1}s): {} hits landed, {} sounds, {} quakes",
        summary.tics,
        summary.tics as f32 / TICRATE as f32,
        summary.hits,
        summary.sounds,
        summary.quakes
    );
    match (summary.collected_by, summary.escaped) {
        (Some(slot), _) => log::info!("player {} collected the emerald", slot),
        (None, true) => log::info!("the UFO reached the finish line; no contest"),
        (None, false) => log::info!("time ran out"),
    }
    Ok(())
}
