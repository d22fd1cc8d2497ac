use crate::vec3::Float;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Div, Mul};

/// Linear RGB. Channels are intended non-negative but are not clamped;
/// the only clamp to [0, 1] happens in to_srgb8 at pixel-write time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct RGB {
    pub r: Float,
    pub g: Float,
    pub b: Float,
}

impl Add for RGB {
    type Output = RGB;

    fn add(self, other: RGB) -> RGB {
        RGB {
            r: self.r + other.r,
            g: self.g + other.g,
            b: self.b + other.b,
        }
    }
}

// Per-channel scalar add, used by the sigmoid tone map denominator.
impl Add<Float> for RGB {
    type Output = RGB;

    fn add(self, rhs: Float) -> RGB {
        RGB {
            r: self.r + rhs,
            g: self.g + rhs,
            b: self.b + rhs,
        }
    }
}

impl AddAssign for RGB {
    fn add_assign(&mut self, other: RGB) {
        *self = *self + other;
    }
}

impl Mul<Float> for RGB {
    type Output = RGB;

    fn mul(self, rhs: Float) -> RGB {
        RGB {
            r: self.r * rhs,
            g: self.g * rhs,
            b: self.b * rhs,
        }
    }
}

// Element-wise product, e.g. surface color modulated by light color.
impl Mul<RGB> for RGB {
    type Output = RGB;

    fn mul(self, rhs: RGB) -> RGB {
        RGB {
            r: self.r * rhs.r,
            g: self.g * rhs.g,
            b: self.b * rhs.b,
        }
    }
}

impl Div<Float> for RGB {
    type Output = RGB;

    fn div(self, rhs: Float) -> RGB {
        RGB {
            r: self.r / rhs,
            g: self.g / rhs,
            b: self.b / rhs,
        }
    }
}

impl RGB {
    pub fn new() -> RGB {
        RGB {
            r: 0.0,
            g: 0.0,
            b: 0.0,
        }
    }

    pub fn uniform(v: Float) -> RGB {
        RGB { r: v, g: v, b: v }
    }

    pub fn white() -> RGB {
        RGB::uniform(1.0)
    }

    pub fn powf(self, e: Float) -> RGB {
        RGB {
            r: self.r.powf(e),
            g: self.g.powf(e),
            b: self.b.powf(e),
        }
    }

    pub fn inv(self) -> RGB {
        RGB {
            r: 1.0 / self.r,
            g: 1.0 / self.g,
            b: 1.0 / self.b,
        }
    }

    pub fn to_srgb8(self) -> [u8; 3] {
        [
            (255.0 * self.r.clamp(0.0, 1.0)) as u8,
            (255.0 * self.g.clamp(0.0, 1.0)) as u8,
            (255.0 * self.b.clamp(0.0, 1.0)) as u8,
        ]
    }
}
