//! Actor storage and the engine-level actor operations.
//!
//! Actors are `hecs` entities carrying a [`Mobj`]. An [`Entity`] is a
//! generational handle, so a reference to a removed actor simply stops
//! resolving; [`ActorWorld::valid`] is the "was it removed?" check every
//! caller makes before dereferencing a stored handle.

use hecs::{Component, Entity, World};

use crate::angle::{point_to_angle, Angle};
use crate::components::{ExtraFlags, Mobj, MobjFlags, MobjKind, MobjState};
use crate::fixed::{hypot, Fixed, FixedVec3, FRACUNIT};

/// Downward acceleration per tic at unit scale.
pub const GRAVITY: Fixed = Fixed(FRACUNIT / 2);

/// The level's actors plus the spawn counter that orders their thinkers.
pub struct ActorWorld {
    world: World,
    next_serial: u64,
}

impl Default for ActorWorld {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorWorld {
    pub fn new() -> Self {
        Self {
            world: World::new(),
            next_serial: 0,
        }
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Add an actor to the level.
    pub fn spawn(&mut self, mut mobj: Mobj) -> Entity {
        mobj.serial = self.next_serial;
        self.next_serial += 1;
        self.world.spawn((mobj,))
    }

    /// Spawn relative to `parent`. Offsets are in the parent's scale and the
    /// child inherits its scale, scale target and gravity direction.
    pub fn spawn_from(
        &mut self,
        parent: Entity,
        offset: FixedVec3,
        kind: MobjKind,
        state: MobjState,
    ) -> Option<Entity> {
        let p = self.mobj(parent)?;
        let position = FixedVec3::new(
            p.x + offset.x * p.scale,
            p.y + offset.y * p.scale,
            p.z + offset.z * p.scale * p.flip(),
        );
        let mut child = Mobj::new(kind, position, state);
        child.scale = p.scale;
        child.dest_scale = p.dest_scale;
        child.scale_speed = p.scale_speed;
        child.floor_z = p.floor_z;
        child.ceiling_z = p.ceiling_z;
        if p.eflags.contains(ExtraFlags::VERTICALFLIP) {
            child.eflags.insert(ExtraFlags::VERTICALFLIP);
        }
        Some(self.spawn(child))
    }

    /// Attach an extra component to an existing actor. No-op if it was removed.
    pub fn attach<T: Component>(&mut self, e: Entity, component: T) {
        let _ = self.world.insert_one(e, component);
    }

    /// The actor still exists.
    pub fn valid(&self, e: Entity) -> bool {
        self.world.contains(e)
    }

    pub fn valid_opt(&self, e: Option<Entity>) -> bool {
        e.map_or(false, |e| self.valid(e))
    }

    /// Snapshot of an actor's common state.
    pub fn mobj(&self, e: Entity) -> Option<Mobj> {
        self.world.get::<&Mobj>(e).ok().map(|m| *m)
    }

    pub fn mobj_mut(&mut self, e: Entity) -> Option<&mut Mobj> {
        self.world.query_one_mut::<&mut Mobj>(e).ok()
    }

    /// Copy of an extra component.
    pub fn get<T: Component + Copy>(&self, e: Entity) -> Option<T> {
        self.world.get::<&T>(e).ok().map(|c| *c)
    }

    pub fn get_mut<T: Component>(&mut self, e: Entity) -> Option<&mut T> {
        self.world.query_one_mut::<&mut T>(e).ok()
    }

    /// Remove the actor. Returns false if it was already gone.
    pub fn despawn(&mut self, e: Entity) -> bool {
        self.world.despawn(e).is_ok()
    }

    /// Every actor, oldest first.
    pub fn in_spawn_order(&self) -> Vec<Entity> {
        let mut order: Vec<(u64, Entity)> = self
            .world
            .query::<&Mobj>()
            .iter()
            .map(|(e, mo)| (mo.serial, e))
            .collect();
        order.sort_unstable_by_key(|(serial, _)| *serial);
        order.into_iter().map(|(_, e)| e).collect()
    }

    pub fn count_kind(&self, kind: MobjKind) -> usize {
        self.world
            .query::<&Mobj>()
            .iter()
            .filter(|(_, mo)| mo.kind == kind)
            .count()
    }

    /// Set momentum so the next motion step lands exactly on `dest`.
    pub fn move_to(&mut self, e: Entity, dest: FixedVec3) {
        if let Some(mo) = self.mobj_mut(e) {
            mo.momx = dest.x - mo.x;
            mo.momy = dest.y - mo.y;
            mo.momz = dest.z - mo.z;
        }
    }

    /// Push horizontally along `angle`.
    pub fn thrust(&mut self, e: Entity, angle: Angle, amount: Fixed) {
        if let Some(mo) = self.mobj_mut(e) {
            mo.momx += amount * angle.cos();
            mo.momy += amount * angle.sin();
        }
    }

    /// Vertical launch, scaled by the actor's size and gravity direction.
    pub fn set_mom_z(&mut self, e: Entity, value: Fixed, relative: bool) {
        if let Some(mo) = self.mobj_mut(e) {
            let value = value * mo.scale * mo.flip();
            if relative {
                mo.momz += value;
            } else {
                mo.momz = value;
            }
        }
    }

    /// Freeze an actor for `tics`. Damage hitlag is tagged so it can be
    /// copied onto attached parts.
    pub fn set_hitlag(&mut self, e: Entity, tics: u32, from_damage: bool) {
        if let Some(mo) = self.mobj_mut(e) {
            mo.hitlag = mo.hitlag.max(tics);
            if from_damage {
                mo.eflags.insert(ExtraFlags::DAMAGEHITLAG);
            }
        }
    }

    /// Count down hitlag. Returns true while the actor is still frozen.
    pub fn tick_hitlag(&mut self, e: Entity) -> bool {
        let Some(mo) = self.mobj_mut(e) else {
            return false;
        };
        if mo.hitlag == 0 {
            return false;
        }
        mo.hitlag -= 1;
        if mo.hitlag == 0 {
            mo.eflags.remove(ExtraFlags::DAMAGEHITLAG);
        }
        true
    }

    /// Apply momentum, gravity, floor/ceiling clipping and scale easing.
    pub fn step_motion(&mut self, e: Entity) {
        let Some(mo) = self.mobj_mut(e) else {
            return;
        };

        mo.x += mo.momx;
        mo.y += mo.momy;
        mo.z += mo.momz;

        if !mo.flags.contains(MobjFlags::NOGRAVITY) {
            mo.momz -= GRAVITY * mo.scale * mo.flip();
        }

        if !mo.flags.contains(MobjFlags::NOCLIP) {
            if mo.z < mo.floor_z {
                mo.z = mo.floor_z;
                if mo.momz < Fixed::ZERO {
                    mo.momz = Fixed::ZERO;
                }
            } else if mo.ceiling_z != Fixed::MAX && mo.z + mo.height > mo.ceiling_z {
                mo.z = mo.ceiling_z - mo.height;
                if mo.momz > Fixed::ZERO {
                    mo.momz = Fixed::ZERO;
                }
            }
        }

        if mo.scale < mo.dest_scale {
            mo.scale = (mo.scale + mo.scale_speed).min(mo.dest_scale);
        } else if mo.scale > mo.dest_scale {
            mo.scale = (mo.scale - mo.scale_speed).max(mo.dest_scale);
        }
    }

    /// Count down the current state. Returns true when it just ran out.
    pub fn tick_state(&mut self, e: Entity) -> bool {
        let Some(mo) = self.mobj_mut(e) else {
            return false;
        };
        if mo.tics <= 0 {
            return false;
        }
        mo.tics -= 1;
        mo.tics == 0
    }
}

/// Direction of travel, or the facing angle when barely moving.
pub fn momentum_angle(mo: &Mobj) -> Angle {
    if hypot(mo.momx, mo.momy) > mo.scale * 6 {
        point_to_angle(Fixed::ZERO, Fixed::ZERO, mo.momx, mo.momy)
    } else {
        mo.angle
    }
}
