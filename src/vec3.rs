use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Neg, Sub};

pub type Float = f64;

/// Bias applied to reflected and shadow ray origins.
pub const EPSILON: Float = 1.0e-4;

#[derive(Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Vec3 {
    pub x: Float,
    pub y: Float,
    pub z: Float,
}

pub type Point = Vec3;

impl fmt::Debug for Vec3 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "vec3: {{ x={:.3} y={:.3} z={:.3} }}",
            self.x, self.y, self.z
        )
    }
}

impl Add for Vec3 {
    type Output = Vec3;

    fn add(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x + other.x,
            y: self.y + other.y,
            z: self.z + other.z,
        }
    }
}

impl Sub for Vec3 {
    type Output = Vec3;

    fn sub(self, other: Vec3) -> Vec3 {
        Vec3 {
            x: self.x - other.x,
            y: self.y - other.y,
            z: self.z - other.z,
        }
    }
}

impl Neg for Vec3 {
    type Output = Vec3;

    fn neg(self) -> Vec3 {
        Vec3 {
            x: -self.x,
            y: -self.y,
            z: -self.z,
        }
    }
}

impl Mul<Float> for Vec3 {
    type Output = Vec3;

    fn mul(self, rhs: Float) -> Vec3 {
        Vec3 {
            x: self.x * rhs,
            y: self.y * rhs,
            z: self.z * rhs,
        }
    }
}

impl Div<Float> for Vec3 {
    type Output = Vec3;

    fn div(self, rhs: Float) -> Vec3 {
        Vec3 {
            x: self.x / rhs,
            y: self.y / rhs,
            z: self.z / rhs,
        }
    }
}

impl AddAssign<Vec3> for Vec3 {
    fn add_assign(&mut self, other: Vec3) {
        *self = *self + other;
    }
}

impl Vec3 {
    pub fn zero() -> Vec3 {
        Vec3 {
            x: 0.0,
            y: 0.0,
            z: 0.0,
        }
    }

    pub fn new(x: Float, y: Float, z: Float) -> Vec3 {
        Vec3 { x, y, z }
    }

    pub fn dot(self, rhs: Vec3) -> Float {
        self.x * rhs.x + self.y * rhs.y + self.z * rhs.z
    }

    pub fn cross(self, rhs: Vec3) -> Vec3 {
        Vec3 {
            x: self.y * rhs.z - self.z * rhs.y,
            y: self.z * rhs.x - self.x * rhs.z,
            z: self.x * rhs.y - self.y * rhs.x,
        }
    }

    pub fn norm(self) -> Float {
        self.dot(self).sqrt()
    }

    /// Unit vector in the direction of self. Requires a non-zero input;
    /// use try_normalized where the input may legitimately degenerate.
    pub fn normalized(self) -> Vec3 {
        let norm = self.norm();
        assert!(norm > 0.0);
        self / norm
    }

    pub fn try_normalized(self) -> Option<Vec3> {
        let norm = self.norm();
        if norm > 0.0 { Some(self / norm) } else { None }
    }

    /// Mirror reflection of an incident direction about a unit normal.
    pub fn reflect(self, normal: Vec3) -> Vec3 {
        self - normal * self.dot(normal) * 2.0
    }

    /// Rodrigues rotation of self about a unit axis by theta radians.
    pub fn rotate_about(self, axis: Vec3, theta: Float) -> Vec3 {
        let (sin, cos) = theta.sin_cos();
        let dot = self.dot(axis);
        Vec3 {
            x: axis.x * dot * (1.0 - cos)
                + self.x * cos
                + (-axis.z * self.y + axis.y * self.z) * sin,
            y: axis.y * dot * (1.0 - cos)
                + self.y * cos
                + (axis.z * self.x - axis.x * self.z) * sin,
            z: axis.z * dot * (1.0 - cos)
                + self.z * cos
                + (-axis.y * self.x + axis.x * self.y) * sin,
        }
    }

    /// Random point inside the unit sphere. The radius is drawn
    /// uniformly, so samples cluster toward the center.
    pub fn random_in_unit_sphere<R: Rng>(rng: &mut R) -> Vec3 {
        let r: Float = rng.gen_range(0.0..1.0);
        let theta: Float = rng.gen_range(0.0..std::f64::consts::PI);
        let phi: Float = rng.gen_range(0.0..std::f64::consts::TAU);
        Vec3 {
            x: r * theta.sin() * phi.cos(),
            y: r * theta.sin() * phi.sin(),
            z: r * theta.cos(),
        }
    }
}
