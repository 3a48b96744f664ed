//! 16.16 fixed-point scalar and vector types.
//!
//! Every spatial quantity in the simulation goes through these types so two
//! machines replaying the same inputs land on bit-identical state. Floats
//! never enter the tic loop.

use std::ops::{Add, AddAssign, Div, Mul, Neg, Shl, Shr, Sub, SubAssign};

use serde::{Deserialize, Serialize};

pub const FRACBITS: u32 = 16;
pub const FRACUNIT: i32 = 1 << FRACBITS;

/// Signed 16.16 fixed-point value.
///
/// Arithmetic wraps like the two's-complement integers underneath it, so an
/// overflow is deterministic instead of a debug-build panic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fixed(pub i32);

impl Fixed {
    pub const ZERO: Fixed = Fixed(0);
    pub const ONE: Fixed = Fixed(FRACUNIT);
    pub const HALF: Fixed = Fixed(FRACUNIT >> 1);
    pub const MAX: Fixed = Fixed(i32::MAX);
    pub const MIN: Fixed = Fixed(i32::MIN);

    /// Whole number of map units.
    pub const fn from_int(n: i32) -> Self {
        Fixed(n << FRACBITS)
    }

    pub const fn from_raw(raw: i32) -> Self {
        Fixed(raw)
    }

    /// `num / den` as fixed-point, e.g. `from_ratio(3, 4)` is 0.75.
    pub const fn from_ratio(num: i32, den: i32) -> Self {
        Fixed((((num as i64) << FRACBITS) / den as i64) as i32)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Truncates toward negative infinity, like `>> FRACBITS`.
    pub const fn to_int(self) -> i32 {
        self.0 >> FRACBITS
    }

    pub fn abs(self) -> Self {
        Fixed(self.0.wrapping_abs())
    }

    pub fn is_positive(self) -> bool {
        self.0 > 0
    }
}

/// Product of two 16.16 values.
#[inline]
pub fn fixed_mul(a: i32, b: i32) -> i32 {
    ((a as i64 * b as i64) >> FRACBITS) as i32
}

/// Quotient of two 16.16 values. Saturates instead of trapping when the
/// result would not fit, including division by zero.
#[inline]
pub fn fixed_div(a: i32, b: i32) -> i32 {
    if (a.unsigned_abs() >> 14) >= b.unsigned_abs() {
        return if (a ^ b) < 0 { i32::MIN } else { i32::MAX };
    }
    (((a as i64) << FRACBITS) / b as i64) as i32
}

impl Add for Fixed {
    type Output = Fixed;
    fn add(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Fixed {
    fn add_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Fixed {
    type Output = Fixed;
    fn sub(self, rhs: Fixed) -> Fixed {
        Fixed(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Fixed {
    fn sub_assign(&mut self, rhs: Fixed) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

impl Neg for Fixed {
    type Output = Fixed;
    fn neg(self) -> Fixed {
        Fixed(self.0.wrapping_neg())
    }
}

impl Mul for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: Fixed) -> Fixed {
        Fixed(fixed_mul(self.0, rhs.0))
    }
}

/// Integer times fixed, e.g. `scale * 24`.
impl Mul<i32> for Fixed {
    type Output = Fixed;
    fn mul(self, rhs: i32) -> Fixed {
        Fixed(self.0.wrapping_mul(rhs))
    }
}

impl Div for Fixed {
    type Output = Fixed;
    fn div(self, rhs: Fixed) -> Fixed {
        Fixed(fixed_div(self.0, rhs.0))
    }
}

/// Fixed divided by a plain integer.
impl Div<i32> for Fixed {
    type Output = Fixed;
    fn div(self, rhs: i32) -> Fixed {
        Fixed(self.0.wrapping_div(rhs))
    }
}

impl Shr<u32> for Fixed {
    type Output = Fixed;
    fn shr(self, rhs: u32) -> Fixed {
        Fixed(self.0 >> rhs)
    }
}

impl Shl<u32> for Fixed {
    type Output = Fixed;
    fn shl(self, rhs: u32) -> Fixed {
        Fixed(self.0.wrapping_shl(rhs))
    }
}

/// Cheap octagonal distance estimate; what the track code uses for
/// step lengths so pathing and motion agree on "how far".
pub fn approx_distance(dx: Fixed, dy: Fixed) -> Fixed {
    let dx = dx.abs();
    let dy = dy.abs();
    if dx < dy {
        dx + dy - (dx >> 1)
    } else {
        dx + dy - (dy >> 1)
    }
}

/// Three-axis [`approx_distance`].
pub fn approx_distance_3d(dx: Fixed, dy: Fixed, dz: Fixed) -> Fixed {
    approx_distance(approx_distance(dx, dy), dz)
}

/// Exact planar length, computed with an integer square root.
pub fn hypot(dx: Fixed, dy: Fixed) -> Fixed {
    let x = dx.0.unsigned_abs() as u64;
    let y = dy.0.unsigned_abs() as u64;
    let len = isqrt(x * x + y * y);
    Fixed(len.min(i32::MAX as u64) as i32)
}

fn isqrt(n: u64) -> u64 {
    if n < 2 {
        return n;
    }
    // Newton iteration from an overestimate converges monotonically downward.
    let mut x = 1u64 << ((64 - n.leading_zeros()) / 2 + 1);
    loop {
        let y = (x + n / x) / 2;
        if y >= x {
            return x;
        }
        x = y;
    }
}

/// Position or momentum in map space.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FixedVec3 {
    pub x: Fixed,
    pub y: Fixed,
    pub z: Fixed,
}

impl FixedVec3 {
    pub const ZERO: FixedVec3 = FixedVec3 {
        x: Fixed::ZERO,
        y: Fixed::ZERO,
        z: Fixed::ZERO,
    };

    pub const fn new(x: Fixed, y: Fixed, z: Fixed) -> Self {
        Self { x, y, z }
    }

    /// Whole map units on each axis.
    pub const fn from_ints(x: i32, y: i32, z: i32) -> Self {
        Self::new(Fixed::from_int(x), Fixed::from_int(y), Fixed::from_int(z))
    }

    pub fn approx_distance_to(&self, other: FixedVec3) -> Fixed {
        approx_distance_3d(other.x - self.x, other.y - self.y, other.z - self.z)
    }
}

impl Add for FixedVec3 {
    type Output = FixedVec3;
    fn add(self, rhs: FixedVec3) -> FixedVec3 {
        FixedVec3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for FixedVec3 {
    type Output = FixedVec3;
    fn sub(self, rhs: FixedVec3) -> FixedVec3 {
        FixedVec3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}
