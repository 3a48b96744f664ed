//! The UFO's decorative pieces and the doubly linked chain that holds them.
//!
//! The chain is non-circular: the head's `prev` is `None`, and for every
//! piece `p` with `next == q`, `q.prev == p`. Links are plain [`Entity`]
//! handles, so a link to a removed piece reads as absent.

use engine_core::{
    ActorWorld, Angle, Entity, ExtraFlags, Fixed, FixedVec3, MobjFlags, MobjState, RandomClass,
    RenderFlags, SoundId, TICRATE,
};

use super::{Ufo, BASE_SPEED};
use crate::level::Level;
use crate::vfx;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PieceKind {
    /// Cockpit above the emerald.
    Pod,
    /// Catcher claw orbiting the emerald.
    Arm,
    /// Cable reaching up to the ceiling.
    Stem,
}

impl PieceKind {
    pub fn state(self) -> MobjState {
        match self {
            PieceKind::Pod => MobjState::UfoPod,
            PieceKind::Arm => MobjState::UfoArm,
            PieceKind::Stem => MobjState::UfoStem,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UfoPiece {
    pub kind: PieceKind,
    pub owner: Option<Entity>,
    pub prev: Option<Entity>,
    pub next: Option<Entity>,
}

/// Exists, still a piece, and not dying.
pub fn piece_valid(actors: &ActorWorld, piece: Option<Entity>) -> bool {
    let Some(piece) = piece else {
        return false;
    };
    actors.get::<UfoPiece>(piece).is_some()
        && actors.mobj(piece).map_or(false, |mo| mo.health > 0)
}

fn link(actors: &ActorWorld, piece: Entity) -> Option<UfoPiece> {
    actors.get::<UfoPiece>(piece)
}

fn live(actors: &ActorWorld, e: Option<Entity>) -> Option<Entity> {
    e.filter(|e| actors.valid(*e))
}

/// Add `piece` at the end of `ufo`'s chain and return the new tail.
/// `tail` is a hint for the current last piece; without it the chain is walked.
pub fn append(
    actors: &mut ActorWorld,
    ufo: Entity,
    piece: Entity,
    tail: Option<Entity>,
) -> Option<Entity> {
    let head = actors.get::<Ufo>(ufo)?.pieces;

    let tail = match live(actors, tail) {
        Some(t) => Some(t),
        None => {
            let mut last = live(actors, head);
            while let Some(next) = last.and_then(|l| live(actors, link(actors, l)?.next)) {
                last = Some(next);
            }
            last
        }
    };

    if let Some(p) = actors.get_mut::<UfoPiece>(piece) {
        p.owner = Some(ufo);
        p.prev = tail;
        p.next = None;
    }
    match tail {
        Some(t) => {
            if let Some(t) = actors.get_mut::<UfoPiece>(t) {
                t.next = Some(piece);
            }
        }
        None => {
            if let Some(u) = actors.get_mut::<Ufo>(ufo) {
                u.pieces = Some(piece);
            }
        }
    }
    Some(piece)
}

/// Take `piece` out of its chain, joining its neighbours and moving the
/// owner's head past it if needed. Unlinking a piece twice is harmless.
pub fn unlink(actors: &mut ActorWorld, piece: Entity) {
    let Some(node) = link(actors, piece) else {
        return;
    };
    let prev = live(actors, node.prev);
    let next = live(actors, node.next);

    if let Some(p) = prev.and_then(|p| actors.get_mut::<UfoPiece>(p)) {
        p.next = next;
    }
    if let Some(n) = next.and_then(|n| actors.get_mut::<UfoPiece>(n)) {
        n.prev = prev;
    }
    if let Some(owner) = live(actors, node.owner) {
        if let Some(u) = actors.get_mut::<Ufo>(owner) {
            if u.pieces == Some(piece) {
                u.pieces = next;
            }
        }
    }
    if let Some(p) = actors.get_mut::<UfoPiece>(piece) {
        p.prev = None;
        p.next = None;
    }
}

/// Removal hook: keep the chain whole when a piece disappears.
pub fn piece_removed(actors: &mut ActorWorld, piece: Entity) {
    unlink(actors, piece);
}

/// Valid pieces from the head forward, stopping at the first gap. Returned
/// as a snapshot so callers may remove pieces while walking it.
pub fn pieces(actors: &ActorWorld, ufo: Entity) -> Vec<Entity> {
    let mut out = Vec::new();
    let mut cursor = actors.get::<Ufo>(ufo).and_then(|u| u.pieces);
    while piece_valid(actors, cursor) {
        let Some(piece) = cursor else {
            break;
        };
        cursor = link(actors, piece).and_then(|p| p.next);
        out.push(piece);
        if out.len() > 64 {
            // A cycle would be a corrupted chain.
            break;
        }
    }
    out
}

/// Break every piece off. Links are left alone; the pieces expire shortly.
pub fn dismantle(level: &mut Level, ufo: Entity) {
    for piece in pieces(&level.actors, ufo) {
        kill_piece(level, piece);
    }
}

/// Copy the UFO's hitlag onto its pieces so the whole craft freezes together.
pub fn copy_hitlag_to_pieces(actors: &mut ActorWorld, ufo: Entity) {
    let Some(mo) = actors.mobj(ufo) else {
        return;
    };
    for piece in pieces(actors, ufo) {
        if let Some(p) = actors.mobj_mut(piece) {
            p.hitlag = mo.hitlag;
            p.eflags.remove(ExtraFlags::DAMAGEHITLAG);
            if mo.eflags.contains(ExtraFlags::DAMAGEHITLAG) {
                p.eflags.insert(ExtraFlags::DAMAGEHITLAG);
            }
        }
    }
}

/// Knock a piece off: it starts falling and expires after a second.
pub fn kill_piece(level: &mut Level, piece: Entity) {
    if !piece_valid(&level.actors, Some(piece)) {
        return;
    }
    let Some(node) = link(&level.actors, piece) else {
        return;
    };
    let Some(mo) = level.actors.mobj_mut(piece) else {
        return;
    };
    mo.health = 0;
    mo.tics = TICRATE as i32;
    mo.flags.remove(MobjFlags::NOGRAVITY);

    let (dir, thrust) = match node.kind {
        PieceKind::Stem => {
            mo.tics = 1;
            return;
        }
        PieceKind::Arm => (mo.angle, mo.scale * 12),
        PieceKind::Pod => {
            let scale = mo.scale;
            let degrees = level.rng.range(RandomClass::Decoration, 0, 359);
            (Angle::from_degrees(degrees), scale * 4)
        }
    };

    level.actors.thrust(piece, dir, -thrust);
    level.actors.set_mom_z(piece, Fixed::from_int(12), true);
}

/// Per-tic piece behaviour: follow the owner at this piece's station.
pub fn piece_thinker(level: &mut Level, piece: Entity) {
    let Some(node) = link(&level.actors, piece) else {
        level.remove_actor(piece);
        return;
    };
    let owner = live(&level.actors, node.owner);
    let (Some(ufo), Some(ufo_mo), Some(state)) = (
        owner,
        owner.and_then(|o| level.actors.mobj(o)),
        owner.and_then(|o| level.actors.get::<Ufo>(o)),
    ) else {
        kill_piece(level, piece);
        return;
    };

    let Some(mo) = level.actors.mobj_mut(piece) else {
        return;
    };
    mo.dest_scale = ufo_mo.dest_scale * 3 / 2;
    mo.scale_speed = ufo_mo.scale_speed;
    let mo = *mo;

    match node.kind {
        PieceKind::Pod => {
            level.actors.move_to(
                piece,
                FixedVec3::new(ufo_mo.x, ufo_mo.y, ufo_mo.z + mo.scale * 132),
            );
            if level.sounds.is_playing(ufo, SoundId::ClawZoom) && state.speed > Fixed::from_int(70) {
                vfx::spawn_ufo_speed_lines(level, piece);
            }
        }
        PieceKind::Arm => {
            let dis = mo.scale * 88;
            let x = ufo_mo.x - dis * mo.angle.cos();
            let y = ufo_mo.y - dis * mo.angle.sin();
            level
                .actors
                .move_to(piece, FixedVec3::new(x, y, ufo_mo.z + mo.scale * 24));
            let turn = Angle::DEG2.scaled(state.speed / BASE_SPEED);
            if let Some(mo) = level.actors.mobj_mut(piece) {
                mo.angle -= turn;
            }
        }
        PieceKind::Stem => {
            let stem_z = ufo_mo.z + mo.scale * 294;
            level
                .actors
                .move_to(piece, FixedVec3::new(ufo_mo.x, ufo_mo.y, stem_z));
            if ufo_mo.ceiling_z != Fixed::MAX {
                let stretch = (ufo_mo.ceiling_z - stem_z) / mo.scale / Fixed::from_int(15);
                if stretch > Fixed::ZERO {
                    if let Some(mo) = level.actors.mobj_mut(piece) {
                        mo.sprite_y_scale = stretch;
                    }
                }
            }
        }
    }
}

/// A dying piece flickers until it expires.
pub fn piece_dead_thinker(level: &mut Level, piece: Entity) {
    if let Some(mo) = level.actors.mobj_mut(piece) {
        mo.render_flags.toggle(RenderFlags::DONTDRAW);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::test_support::level;
    use crate::ufo::create_special_ufo;
    use engine_core::{Mobj, MobjKind};
    use rand::prelude::*;

    /// A bare UFO with `n` pieces chained behind it.
    fn chain(level: &mut Level, n: usize) -> (Entity, Vec<Entity>) {
        let ufo = level.actors.spawn(Mobj::new(
            MobjKind::SpecialUfo,
            FixedVec3::ZERO,
            MobjState::SpecialUfo,
        ));
        level.actors.attach(
            ufo,
            Ufo {
                waypoint: -1,
                distance_to_finish: u32::MAX,
                speed: BASE_SPEED,
                collect_delay: 0,
                pieces: None,
            },
        );
        let mut out = Vec::new();
        let mut tail = None;
        for _ in 0..n {
            let p = level.actors.spawn(Mobj::new(
                MobjKind::UfoPiece,
                FixedVec3::ZERO,
                MobjState::UfoArm,
            ));
            level.actors.attach(
                p,
                UfoPiece {
                    kind: PieceKind::Arm,
                    owner: None,
                    prev: None,
                    next: None,
                },
            );
            tail = append(&mut level.actors, ufo, p, tail);
            out.push(p);
        }
        (ufo, out)
    }

    fn node(level: &Level, p: Entity) -> UfoPiece {
        level.actors.get::<UfoPiece>(p).unwrap()
    }

    fn head(level: &Level, ufo: Entity) -> Option<Entity> {
        level.actors.get::<Ufo>(ufo).unwrap().pieces
    }

    /// Walk the chain and check both directions agree.
    fn assert_well_formed(level: &Level, ufo: Entity) -> Vec<Entity> {
        let mut seen = Vec::new();
        let mut prev = None;
        let mut cursor = head(level, ufo);
        while let Some(p) = cursor {
            assert_eq!(node(level, p).prev, prev, "broken back link at {:?}", p);
            seen.push(p);
            prev = Some(p);
            cursor = node(level, p).next;
            assert!(seen.len() <= 64, "cycle in piece chain");
        }
        seen
    }

    #[test]
    fn unlink_middle_then_head() {
        let mut level = level();
        let (ufo, p) = chain(&mut level, 4);
        let (h, a, b, c) = (p[0], p[1], p[2], p[3]);

        unlink(&mut level.actors, b);
        assert_eq!(assert_well_formed(&level, ufo), vec![h, a, c]);
        assert_eq!(node(&level, a).next, Some(c));
        assert_eq!(node(&level, c).prev, Some(a));
        assert_eq!(node(&level, b).prev, None);
        assert_eq!(node(&level, b).next, None);

        unlink(&mut level.actors, h);
        assert_eq!(head(&level, ufo), Some(a));
        assert_eq!(assert_well_formed(&level, ufo), vec![a, c]);

        // Second unlink of an already detached piece changes nothing.
        unlink(&mut level.actors, b);
        assert_eq!(assert_well_formed(&level, ufo), vec![a, c]);
    }

    #[test]
    fn append_without_tail_hint_walks_to_the_end() {
        let mut level = level();
        let (ufo, p) = chain(&mut level, 2);
        let extra = level.actors.spawn(Mobj::new(MobjKind::UfoPiece, FixedVec3::ZERO, MobjState::UfoStem));
        level.actors.attach(
            extra,
            UfoPiece {
                kind: PieceKind::Stem,
                owner: None,
                prev: None,
                next: None,
            },
        );
        append(&mut level.actors, ufo, extra, None);
        assert_eq!(assert_well_formed(&level, ufo), vec![p[0], p[1], extra]);
        assert_eq!(node(&level, extra).owner, Some(ufo));
    }

    #[test]
    fn random_removals_keep_the_chain_whole() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..100 {
            let mut level = level();
            let n = rng.gen_range(1..10);
            let (ufo, mut remaining) = chain(&mut level, n);
            while !remaining.is_empty() {
                let victim = remaining.remove(rng.gen_range(0..remaining.len()));
                if rng.gen_bool(0.5) {
                    level.remove_actor(victim);
                } else {
                    unlink(&mut level.actors, victim);
                }
                assert_eq!(assert_well_formed(&level, ufo), remaining);
            }
            assert_eq!(head(&level, ufo), None);
        }
    }

    #[test]
    fn iteration_stops_at_a_dying_piece() {
        let mut level = level();
        let (ufo, p) = chain(&mut level, 3);
        level.actors.mobj_mut(p[1]).unwrap().health = 0;
        assert_eq!(pieces(&level.actors, ufo), vec![p[0]]);
        assert!(!piece_valid(&level.actors, Some(p[1])));
        assert!(!piece_valid(&level.actors, None));
    }

    #[test]
    fn dismantle_keeps_links_and_tosses_pieces() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        let before = pieces(&level.actors, ufo);
        dismantle(&mut level, ufo);

        assert!(pieces(&level.actors, ufo).is_empty());
        assert_eq!(assert_well_formed(&level, ufo), before);
        for p in &before {
            let mo = level.actors.mobj(*p).unwrap();
            assert_eq!(mo.health, 0);
            assert!(!mo.flags.contains(MobjFlags::NOGRAVITY));
            match node(&level, *p).kind {
                PieceKind::Stem => assert_eq!(mo.tics, 1),
                _ => {
                    assert_eq!(mo.tics, TICRATE as i32);
                    assert_eq!(mo.momz, Fixed::from_int(12));
                }
            }
        }

        // Pieces flicker while dying and are gone, chain repaired, within a second.
        for _ in 0..=TICRATE {
            level.tick();
        }
        assert_eq!(level.actors.count_kind(MobjKind::UfoPiece), 0);
        assert_eq!(head(&level, ufo), None);
    }

    #[test]
    fn orphaned_piece_kills_itself() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        let arm = pieces(&level.actors, ufo)[1];
        level.remove_actor(ufo);
        piece_thinker(&mut level, arm);
        assert_eq!(level.actors.mobj(arm).unwrap().health, 0);
    }

    #[test]
    fn arms_orbit_against_their_angle() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        let arm = pieces(&level.actors, ufo)[1];
        let ufo_mo = level.actors.mobj(ufo).unwrap();
        piece_thinker(&mut level, arm);
        level.actors.step_motion(arm);
        let mo = level.actors.mobj(arm).unwrap();
        // Angle zero puts the first arm 88 units behind on x, 24 up.
        assert_eq!(mo.x, ufo_mo.x - Fixed::from_int(88));
        assert_eq!(mo.z, ufo_mo.z + Fixed::from_int(24));
        // Spin is 2 degrees scaled by speed over base speed (84 / 42).
        assert!(Angle::delta(mo.angle, Angle(0u32.wrapping_sub(Angle::DEG2.0 * 2))).0 < 16);
        assert_eq!(mo.dest_scale, Fixed::ONE * 3 / 2);
    }

    #[test]
    fn pod_rides_above_and_streaks_while_zooming() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        let pod = pieces(&level.actors, ufo)[0];
        assert_eq!(node(&level, pod).kind, PieceKind::Pod);
        level.actors.get_mut::<Ufo>(ufo).unwrap().speed = Fixed::from_int(80);

        // Not zooming: no streaks.
        piece_thinker(&mut level, pod);
        level.actors.step_motion(pod);
        let ufo_mo = level.actors.mobj(ufo).unwrap();
        let mo = level.actors.mobj(pod).unwrap();
        assert_eq!(mo.position(), FixedVec3::new(ufo_mo.x, ufo_mo.y, ufo_mo.z + Fixed::from_int(132)));
        assert_eq!(level.actors.count_kind(MobjKind::FastLine), 0);

        level.sounds.start(ufo, SoundId::ClawZoom);
        piece_thinker(&mut level, pod);
        assert_eq!(level.actors.count_kind(MobjKind::FastLine), 1);

        // Zooming but too slow.
        level.actors.get_mut::<Ufo>(ufo).unwrap().speed = Fixed::from_int(70);
        piece_thinker(&mut level, pod);
        assert_eq!(level.actors.count_kind(MobjKind::FastLine), 1);
    }

    #[test]
    fn stem_stretches_to_the_ceiling() {
        let mut level = level();
        let ufo = create_special_ufo(&mut level);
        let stem = *pieces(&level.actors, ufo).last().unwrap();
        piece_thinker(&mut level, stem);
        let ufo_mo = level.actors.mobj(ufo).unwrap();
        let expected = (ufo_mo.ceiling_z - (ufo_mo.z + Fixed::from_int(294))) / Fixed::from_int(15);
        assert_eq!(level.actors.mobj(stem).unwrap().sprite_y_scale, expected);
    }
}
