pub mod camera;
pub mod color;
pub mod image;
pub mod light;
pub mod render;
pub mod scene;
pub mod texture;
pub mod three_d;
pub mod vec3;

use vec3::Float;
use vec3::Point;
use vec3::Vec3;

#[derive(Debug)]
pub struct Ray {
    pub orig: Point,
    pub dir: Vec3,
}

impl Ray {
    pub fn new(orig: Point, dir: Vec3) -> Self {
        Self { orig, dir }
    }

    /// Point at parameter s along the ray. Intersections report their
    /// distance as `s * |dir|`, not s itself, so distances stay
    /// comparable across rays with non-unit directions.
    pub fn at(&self, s: Float) -> Point {
        self.orig + self.dir * s
    }
}

#[derive(Debug, Default, Clone, Copy)]
pub struct RenderStats {
    pub num_rays_primary: u64,
    pub num_rays_shadow: u64,
    pub num_rays_reflection: u64,
    pub num_rays_reflection_max: u64,
}

impl RenderStats {
    pub fn add(&mut self, other: RenderStats) {
        self.num_rays_primary += other.num_rays_primary;
        self.num_rays_shadow += other.num_rays_shadow;
        self.num_rays_reflection += other.num_rays_reflection;
        self.num_rays_reflection_max += other.num_rays_reflection_max;
    }

    pub fn total(&self) -> u64 {
        self.num_rays_primary + self.num_rays_shadow + self.num_rays_reflection
    }
}
