//! Short-lived visual actors: overlays, speed lines and sparkles.

use engine_core::{
    momentum_angle, Entity, Fixed, FixedVec3, MobjFlags, MobjKind, MobjState, RandomClass,
    RenderFlags, SkinColor,
};

use crate::level::Level;

const FAST_LINE_TICS: i32 = 5;
const INV_LINES_TICS: i32 = 15;
const SPARKLE_TICS: i32 = 15;

/// Drawn on top of another actor and glued to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlay {
    pub target: Entity,
}

pub fn spawn_overlay(level: &mut Level, target: Entity, state: MobjState) -> Option<Entity> {
    let overlay = level
        .actors
        .spawn_from(target, FixedVec3::ZERO, MobjKind::Overlay, state)?;
    if let Some(mo) = level.actors.mobj_mut(overlay) {
        mo.flags = MobjFlags::NOGRAVITY | MobjFlags::NOCLIP;
    }
    level.actors.attach(overlay, Overlay { target });
    Some(overlay)
}

/// Snap to the target; disappear with it.
pub fn overlay_thinker(level: &mut Level, overlay: Entity) {
    let target = level
        .actors
        .get::<Overlay>(overlay)
        .and_then(|o| level.actors.mobj(o.target));
    let Some(target) = target else {
        level.remove_actor(overlay);
        return;
    };
    if let Some(mo) = level.actors.mobj_mut(overlay) {
        mo.x = target.x;
        mo.y = target.y;
        mo.z = target.z;
        mo.momx = Fixed::ZERO;
        mo.momy = Fixed::ZERO;
        mo.momz = Fixed::ZERO;
        mo.angle = target.angle;
        mo.scale = target.scale;
        mo.dest_scale = target.dest_scale;
        mo.spr_z_offset = target.spr_z_offset;
        mo.render_flags.remove(RenderFlags::DONTDRAW);
        if target.render_flags.contains(RenderFlags::DONTDRAW) {
            mo.render_flags.insert(RenderFlags::DONTDRAW);
        }
    }
}

fn spawn_line(
    level: &mut Level,
    parent: Entity,
    offset: FixedVec3,
    state: MobjState,
    tics: i32,
) -> Option<Entity> {
    let line = level
        .actors
        .spawn_from(parent, offset, MobjKind::FastLine, state)?;
    if let Some(mo) = level.actors.mobj_mut(line) {
        mo.flags = MobjFlags::NOGRAVITY | MobjFlags::NOCLIP;
        mo.tics = tics;
        mo.colorized = true;
    }
    Some(line)
}

/// White streaks around the pod while the UFO is zooming.
pub fn spawn_ufo_speed_lines(level: &mut Level, pod: Entity) {
    let Some(pod_mo) = level.actors.mobj(pod) else {
        return;
    };
    let offset = FixedVec3::new(
        Fixed::from_int(level.rng.range(RandomClass::Decoration, -120, 120)),
        Fixed::from_int(level.rng.range(RandomClass::Decoration, -120, 120)),
        pod_mo.height / 2 + Fixed::from_int(level.rng.range(RandomClass::Decoration, -24, 24)),
    );
    let Some(line) = spawn_line(level, pod, offset, MobjState::FastLine, FAST_LINE_TICS) else {
        return;
    };
    if let Some(mo) = level.actors.mobj_mut(line) {
        mo.scale = mo.scale * 3;
        mo.dest_scale = mo.scale;
        mo.angle = momentum_angle(&pod_mo);
        mo.color = SkinColor::White;
    }
}

/// Emerald-coloured streaks trailing the exposed emerald.
pub fn spawn_emerald_speed_lines(level: &mut Level, ufo: Entity) {
    let Some(ufo_mo) = level.actors.mobj(ufo) else {
        return;
    };
    let offset = FixedVec3::new(
        Fixed::from_int(level.rng.range(RandomClass::Decoration, -48, 48)),
        Fixed::from_int(level.rng.range(RandomClass::Decoration, -48, 48)),
        Fixed::from_int(level.rng.range(RandomClass::Decoration, 0, 64)),
    );
    let Some(line) = spawn_line(level, ufo, offset, MobjState::KartInvLines, INV_LINES_TICS) else {
        return;
    };
    if let Some(mo) = level.actors.mobj_mut(line) {
        mo.angle = momentum_angle(&ufo_mo);
        mo.momx = ufo_mo.momx * 3 / 4;
        mo.momy = ufo_mo.momy * 3 / 4;
        mo.momz = ufo_mo.momz * 3 / 4;
        mo.color = ufo_mo.color;
    }
}

/// One rising sparkle in the parent's colour.
pub fn spawn_sparkle(level: &mut Level, parent: Entity, offset: FixedVec3) -> Option<Entity> {
    let parent_mo = level.actors.mobj(parent)?;
    let sparkle = level
        .actors
        .spawn_from(parent, offset, MobjKind::EmeraldSpark, MobjState::EmeraldSpark)?;
    if let Some(mo) = level.actors.mobj_mut(sparkle) {
        mo.flags = MobjFlags::NOGRAVITY | MobjFlags::NOCLIP;
        mo.tics = SPARKLE_TICS;
        mo.color = parent_mo.color;
        mo.momz += parent_mo.scale * 8 * parent_mo.flip();
    }
    Some(sparkle)
}
