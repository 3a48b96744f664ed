//! Common actor component shared by every thing in the level.

use serde::{Deserialize, Serialize};

use crate::angle::Angle;
use crate::fixed::{Fixed, FixedVec3};

/// What an actor is. Drives thinker dispatch and the damage tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MobjKind {
    SpecialUfo,
    UfoPiece,
    Overlay,
    Player,
    /// Orbiting homing missile.
    JawzShield,
    /// Orbiting ricochet ball.
    OrbinautShield,
    /// Thrown homing missile.
    Jawz,
    /// Thrown ricochet ball.
    Orbinaut,
    /// Seeking bomb.
    Spb,
    /// Fruit; health > 1 while airborne, 1 once laid down.
    Banana,
    FastLine,
    EmeraldSpark,
    Other,
}

/// Animation / sprite state. Only the states this simulation switches
/// between are listed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MobjState {
    Spawn,
    SpecialUfo,
    UfoPod,
    UfoArm,
    UfoStem,
    UfoOverlay,
    EmeraldUnder,
    FastLine,
    KartInvLines,
    EmeraldSpark,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SkinColor {
    #[default]
    None,
    White,
    ChaosEmerald1,
    ChaosEmerald2,
    ChaosEmerald3,
    ChaosEmerald4,
    ChaosEmerald5,
    ChaosEmerald6,
    ChaosEmerald7,
}

bitflags::bitflags! {
    /// Behaviour flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct MobjFlags: u32 {
        /// Can be collected on touch.
        const SPECIAL         = 1 << 0;
        const SOLID           = 1 << 1;
        const SHOOTABLE       = 1 << 2;
        const NOGRAVITY       = 1 << 3;
        const NOCLIP          = 1 << 4;
        /// Collection also triggers when touched from underneath.
        const PICKUPFROMBELOW = 1 << 5;
    }
}

bitflags::bitflags! {
    /// Per-tic engine state flags.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct ExtraFlags: u32 {
        /// Current hitlag came from taking damage.
        const DAMAGEHITLAG = 1 << 0;
        const VERTICALFLIP = 1 << 1;
    }
}

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct RenderFlags: u32 {
        const DONTDRAW = 1 << 0;
    }
}

/// The actor component. Every entity the level thinks about carries one.
#[derive(Debug, Clone, Copy)]
pub struct Mobj {
    pub kind: MobjKind,
    /// Monotonic spawn order; thinkers run in ascending serial.
    pub serial: u64,

    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
    pub momx: Fixed,
    pub momy: Fixed,
    pub momz: Fixed,
    pub angle: Angle,

    pub scale: Fixed,
    pub dest_scale: Fixed,
    pub scale_speed: Fixed,
    pub radius: Fixed,
    pub height: Fixed,
    pub floor_z: Fixed,
    pub ceiling_z: Fixed,
    pub mass: Fixed,

    pub health: i32,
    /// Tics left in the current state; negative means "forever".
    pub tics: i32,
    pub state: MobjState,
    pub hitlag: u32,

    pub flags: MobjFlags,
    pub eflags: ExtraFlags,
    pub render_flags: RenderFlags,

    pub color: SkinColor,
    pub colorized: bool,
    pub shadow_scale: Fixed,
    pub sprite_y_scale: Fixed,
    /// Visual-only vertical offset.
    pub spr_z_offset: Fixed,
}

impl Mobj {
    pub fn new(kind: MobjKind, position: FixedVec3, state: MobjState) -> Self {
        Self {
            kind,
            serial: 0,
            x: position.x,
            y: position.y,
            z: position.z,
            momx: Fixed::ZERO,
            momy: Fixed::ZERO,
            momz: Fixed::ZERO,
            angle: Angle::ZERO,
            scale: Fixed::ONE,
            dest_scale: Fixed::ONE,
            scale_speed: Fixed::from_ratio(1, 12),
            radius: Fixed::from_int(16),
            height: Fixed::from_int(32),
            floor_z: Fixed::MIN,
            ceiling_z: Fixed::MAX,
            mass: Fixed::from_int(100),
            health: 1,
            tics: -1,
            state,
            hitlag: 0,
            flags: MobjFlags::empty(),
            eflags: ExtraFlags::empty(),
            render_flags: RenderFlags::empty(),
            color: SkinColor::None,
            colorized: false,
            shadow_scale: Fixed::ONE,
            sprite_y_scale: Fixed::ONE,
            spr_z_offset: Fixed::ZERO,
        }
    }

    pub fn with_flags(mut self, flags: MobjFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_health(mut self, health: i32) -> Self {
        self.health = health;
        self
    }

    pub fn with_size(mut self, radius: Fixed, height: Fixed) -> Self {
        self.radius = radius;
        self.height = height;
        self
    }

    pub fn position(&self) -> FixedVec3 {
        FixedVec3::new(self.x, self.y, self.z)
    }

    pub fn momentum(&self) -> FixedVec3 {
        FixedVec3::new(self.momx, self.momy, self.momz)
    }

    pub fn top(&self) -> Fixed {
        self.z + self.height
    }

    /// +1 normally, -1 when gravity is flipped.
    pub fn flip(&self) -> i32 {
        if self.eflags.contains(ExtraFlags::VERTICALFLIP) {
            -1
        } else {
            1
        }
    }
}

/// Damage categories carried by hits that have no recognised inflictor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum DamageKind {
    #[default]
    Normal,
    Sting,
    Voltage,
    Wipeout,
    Explode,
    Tumble,
    /// Boost ram that also takes the attacker's boost.
    Steal,
}
