use crate::Ray;
use crate::vec3::Float;
use crate::vec3::Point;
use crate::vec3::Vec3;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CameraError {
    #[error("camera direction has zero length")]
    ZeroDirection,
    #[error("camera up vector is parallel to the view direction")]
    DegenerateBasis,
    #[error("camera vfov {0} is outside (0, 180) degrees")]
    BadFov(Float),
}

/// Pinhole camera. `init` must run (with the aspect ratio set) before
/// `get_ray` is called; the loader leaves that to render setup, where
/// the output resolution is known.
#[derive(Debug, Serialize, Deserialize)]
pub struct Camera {
    pub pos: Point,
    pub dir: Vec3,
    pub up: Vec3,
    pub vfov: Float,
    #[serde(skip)]
    pub aspect: Float,
    #[serde(skip)]
    pub screen_u: Vec3,
    #[serde(skip)]
    pub screen_v: Vec3,
}

impl Camera {
    pub fn new(pos: Point, dir: Vec3, up: Vec3, vfov: Float) -> Self {
        Self {
            pos,
            dir,
            up,
            vfov,
            aspect: 0.0,
            screen_u: Vec3::zero(),
            screen_v: Vec3::zero(),
        }
    }

    pub fn init(&mut self) -> Result<(), CameraError> {
        if !(0.0 < self.vfov && self.vfov < 180.0) {
            return Err(CameraError::BadFov(self.vfov));
        }
        self.dir = self.dir.try_normalized().ok_or(CameraError::ZeroDirection)?;

        let theta = self.vfov.to_radians();
        let half_height = (theta / 2.0).tan();
        let half_width = self.aspect * half_height;

        let u = self
            .up
            .cross(self.dir)
            .try_normalized()
            .ok_or(CameraError::DegenerateBasis)?;
        let v = self.dir.cross(u).normalized();

        self.screen_u = u * 2.0 * half_width;
        self.screen_v = v * 2.0 * half_height;
        log::debug!("camera screen_u: {:?}", self.screen_u);
        log::debug!("camera screen_v: {:?}", self.screen_v);
        Ok(())
    }

    // u: -0.5 .. 0.5
    // v: -0.5 .. 0.5
    pub fn get_ray(&self, u: Float, v: Float) -> Ray {
        let pixel = self.pos + self.dir + self.screen_u * u + self.screen_v * v;
        Ray {
            orig: self.pos,
            dir: pixel - self.pos,
        }
    }

    pub fn display(&self) {
        let s = "camera:".to_string().green();
        let s_pos = format!("pos: {:?}", self.pos).dimmed();
        let s_dir = format!("dir: {:?}", self.dir).dimmed();
        println!("-- {s} {s_pos}");
        println!("-- {s} {s_dir}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_camera() -> Camera {
        let mut c = Camera::new(
            Vec3::zero(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            90.0,
        );
        c.aspect = 1.0;
        c.init().unwrap();
        c
    }

    #[test]
    fn center_ray_follows_view_direction() {
        let c = test_camera();
        let ray = c.get_ray(0.0, 0.0);
        assert_eq!(ray.orig, Vec3::zero());
        let d = ray.dir.normalized();
        assert!((d.z - 1.0).abs() < 1e-12);
    }

    #[test]
    fn edge_ray_spans_half_the_fov() {
        // vfov 90 means the screen edge sits at 45 degrees off axis
        let c = test_camera();
        let ray = c.get_ray(0.0, 0.5);
        let d = ray.dir.normalized();
        assert!((d.z - (0.5f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn parallel_up_vector_is_rejected() {
        let mut c = Camera::new(
            Vec3::zero(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 0.0, 1.0),
            60.0,
        );
        c.aspect = 1.0;
        assert!(matches!(c.init(), Err(CameraError::DegenerateBasis)));
    }

    #[test]
    fn flat_fov_is_rejected() {
        let mut c = Camera::new(
            Vec3::zero(),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(0.0, 1.0, 0.0),
            180.0,
        );
        c.aspect = 1.0;
        assert!(matches!(c.init(), Err(CameraError::BadFov(_))));
    }
}
