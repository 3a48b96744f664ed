//! Binary angles and the fine trig tables.
//!
//! Formats:
//! - 32-bit BAM angles: the full circle is 2^32, wrapping on overflow
//! - fine angles: BAM >> 19, 8192 steps per full rotation
//! - sine/cosine results are 16.16 [`Fixed`]

use std::ops::{Add, AddAssign, Sub, SubAssign};
use std::sync::OnceLock;

use crate::fixed::{Fixed, FRACBITS, FRACUNIT};

pub const FINEANGLES: usize = 8192;
pub const FINEMASK: usize = FINEANGLES - 1;
pub const ANGLETOFINESHIFT: u32 = 19;

const QUARTER: usize = FINEANGLES / 4;

/// Binary angle measurement. Addition and subtraction wrap around the circle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Angle(pub u32);

impl Angle {
    pub const ZERO: Angle = Angle(0);
    pub const DEG2: Angle = Angle(0x02D8_2D82);
    pub const DEG45: Angle = Angle(0x2000_0000);
    pub const DEG60: Angle = Angle(0x2AAA_AAAA);
    pub const DEG90: Angle = Angle(0x4000_0000);
    pub const DEG180: Angle = Angle(0x8000_0000);
    pub const DEG270: Angle = Angle(0xC000_0000);
    pub const MAX: Angle = Angle(u32::MAX);

    /// Whole degrees, any sign.
    pub fn from_degrees(deg: i32) -> Self {
        let turns = (deg as i64).rem_euclid(360);
        Angle(((turns << 32) / 360) as u32)
    }

    /// Equal slice of the circle, e.g. the spacing between `n` evenly placed arms.
    pub fn full_circle_div(n: u32) -> Self {
        Angle(u32::MAX / n.max(1))
    }

    pub fn fine_index(self) -> usize {
        (self.0 >> ANGLETOFINESHIFT) as usize & FINEMASK
    }

    pub fn sin(self) -> Fixed {
        fine_sine(self.fine_index())
    }

    pub fn cos(self) -> Fixed {
        fine_sine((self + Angle::DEG90).fine_index())
    }

    /// Unsigned shortest distance between two angles, `0..=DEG180`.
    pub fn delta(a: Angle, b: Angle) -> Angle {
        let d = a.0.wrapping_sub(b.0);
        if d > Angle::DEG180.0 {
            Angle(d.wrapping_neg())
        } else {
            Angle(d)
        }
    }

    /// Signed turn that takes `from` onto `to`.
    pub fn delta_signed(from: Angle, to: Angle) -> i32 {
        to.0.wrapping_sub(from.0) as i32
    }

    /// Rotate by a signed BAM amount.
    pub fn rotated(self, by: i32) -> Angle {
        Angle(self.0.wrapping_add(by as u32))
    }

    /// Scale the angle's magnitude by a fixed-point factor.
    pub fn scaled(self, factor: Fixed) -> Angle {
        Angle(((self.0 as i64 * factor.0 as i64) >> FRACBITS) as u32)
    }
}

impl Add for Angle {
    type Output = Angle;
    fn add(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_add(rhs.0))
    }
}

impl AddAssign for Angle {
    fn add_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_add(rhs.0);
    }
}

impl Sub for Angle {
    type Output = Angle;
    fn sub(self, rhs: Angle) -> Angle {
        Angle(self.0.wrapping_sub(rhs.0))
    }
}

impl SubAssign for Angle {
    fn sub_assign(&mut self, rhs: Angle) {
        self.0 = self.0.wrapping_sub(rhs.0);
    }
}

/// Sine of a fine angle index.
pub fn fine_sine(index: usize) -> Fixed {
    let table = quarter_table();
    let index = index & FINEMASK;
    let (quadrant, offset) = (index / QUARTER, index % QUARTER);
    let raw = match quadrant {
        0 => table[offset],
        1 => table[QUARTER - offset],
        2 => -table[offset],
        _ => -table[QUARTER - offset],
    };
    Fixed(raw)
}

/// Quarter-wave sine table, built once with integer arithmetic only so every
/// platform produces the same bits.
fn quarter_table() -> &'static [i32] {
    static TABLE: OnceLock<Vec<i32>> = OnceLock::new();
    TABLE.get_or_init(|| (0..=QUARTER).map(sine_q16).collect())
}

/// round(pi * 2^60)
const PI_Q60: i128 = 3_622_009_729_038_561_280;

fn sine_q16(step: usize) -> i32 {
    // theta = (pi / 2) * step / QUARTER, in Q60
    let theta = PI_Q60 * step as i128 / (2 * QUARTER as i128);
    let theta_sq = (theta * theta) >> 60;

    let mut term = theta;
    let mut sum = theta;
    for n in 1..=12i128 {
        term = -((term * theta_sq) >> 60) / ((2 * n) * (2 * n + 1));
        sum += term;
    }

    let q16 = (sum + (1 << 43)) >> 44;
    q16.clamp(0, FRACUNIT as i128) as i32
}

/// atan(2^-i) in BAM units, for the vectoring CORDIC in [`point_to_angle`].
const CORDIC_ATAN: [u32; 31] = [
    536_870_912, 316_933_406, 167_458_907, 85_004_756, 42_667_331, 21_354_465, 10_679_838,
    5_340_245, 2_670_163, 1_335_087, 667_544, 333_772, 166_886, 83_443, 41_722, 20_861, 10_430,
    5_215, 2_608, 1_304, 652, 326, 163, 81, 41, 20, 10, 5, 3, 1, 1,
];

/// Direction from `(x1, y1)` to `(x2, y2)`. Zero-length vectors face angle zero.
pub fn point_to_angle(x1: Fixed, y1: Fixed, x2: Fixed, y2: Fixed) -> Angle {
    let dx = x2.0 as i64 - x1.0 as i64;
    let dy = y2.0 as i64 - y1.0 as i64;
    if dx == 0 && dy == 0 {
        return Angle::ZERO;
    }

    // Widen short vectors so the low iterations still resolve; 2^40 leaves
    // headroom for the CORDIC gain inside an i64.
    let magnitude = dx.unsigned_abs().max(dy.unsigned_abs());
    let shift = magnitude.leading_zeros().saturating_sub(23);
    let (dx, dy) = (dx << shift, dy << shift);

    // Fold the left half-plane over so the rotation only has to cover +-90.
    let (mut x, mut y, mut angle) = if dx < 0 {
        (-dx, -dy, Angle::DEG180.0)
    } else {
        (dx, dy, 0u32)
    };

    for (i, step) in CORDIC_ATAN.iter().enumerate() {
        let (nx, ny) = if y > 0 {
            angle = angle.wrapping_add(*step);
            (x + (y >> i), y - (x >> i))
        } else {
            angle = angle.wrapping_sub(*step);
            (x - (y >> i), y + (x >> i))
        };
        x = nx;
        y = ny;
    }

    Angle(angle)
}
