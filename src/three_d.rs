use crate::Ray;
use crate::color::RGB;
use crate::texture::HeightField;
use crate::texture::TextureMap;
use crate::vec3::Float;
use crate::vec3::Point;
use crate::vec3::Vec3;
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI, TAU};

/// Phong shading coefficients. The defaults are the ones spheres were
/// tuned with; planes get their own set from the scene loader.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Phong {
    pub kd: Float,
    pub ks: Float,
    pub alpha: Float,
}

impl Default for Phong {
    fn default() -> Self {
        Phong {
            kd: 0.6,
            ks: 1.4,
            alpha: 10.0,
        }
    }
}

impl Phong {
    pub fn matte() -> Self {
        Phong {
            kd: 0.0,
            ks: 0.0,
            alpha: 0.0,
        }
    }
}

/// Fixed axis/angle rotation applied to a surface normal before texture
/// lookup. Frozen at construction; the axis must be unit length.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Rotation {
    pub axis: Vec3,
    pub angle: Float,
}

impl Default for Rotation {
    fn default() -> Self {
        Rotation {
            axis: Vec3::new(-1.0, 2.0, -1.0).normalized(),
            angle: 4.3,
        }
    }
}

impl Rotation {
    pub fn identity() -> Self {
        Rotation {
            axis: Vec3::new(0.0, 1.0, 0.0),
            angle: 0.0,
        }
    }

    pub fn random<R: rand::Rng>(rng: &mut R) -> Self {
        let angle = rng.gen_range(0.0..TAU);
        let axis = loop {
            if let Some(a) = Vec3::random_in_unit_sphere(rng).try_normalized() {
                break a;
            }
        };
        Rotation { axis, angle }
    }

    pub fn apply(&self, v: Vec3) -> Vec3 {
        v.rotate_about(self.axis, self.angle)
    }
}

/// Outcome of a ray/primitive intersection. Built fresh per query and
/// consumed immediately; `distance` is the parameter times |dir|.
#[derive(Debug)]
pub struct RaycastHit<'a> {
    pub surface: &'a Primitive,
    pub distance: Float,
    pub location: Point,
    pub normal: Vec3,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sphere {
    pub center: Point,
    pub radius: Float,
    pub color: RGB,
    #[serde(default)]
    pub phong: Phong,
    #[serde(default = "Sphere::default_reflectivity")]
    pub reflectivity: Float,
}

impl Sphere {
    pub fn new(center: Point, radius: Float, color: RGB) -> Self {
        Self {
            center,
            radius,
            color,
            phong: Phong::default(),
            reflectivity: Self::default_reflectivity(),
        }
    }

    fn default_reflectivity() -> Float {
        0.2
    }

    pub fn normal_at(&self, point: Point) -> Vec3 {
        (point - self.center).normalized()
    }

    fn roots(&self, ray: &Ray) -> Option<(Float, Float)> {
        let oc = ray.orig - self.center;
        let a = ray.dir.dot(ray.dir);
        let b = 2.0 * ray.dir.dot(oc);
        let c = oc.dot(oc) - self.radius * self.radius;

        let d = b * b - 4.0 * a * c;
        if d < 0.0 {
            return None;
        }
        let sqrt_d = d.sqrt();
        Some(((-b - sqrt_d) / (2.0 * a), (-b + sqrt_d) / (2.0 * a)))
    }

    /// Entry point of the ray. A ray starting inside the sphere has a
    /// negative near root and reports no hit; the exit point is only
    /// ever used by the sky dome.
    fn near_root(&self, ray: &Ray) -> Option<Float> {
        let (near, _) = self.roots(ray)?;
        (near >= 0.0).then_some(near)
    }

    fn far_root(&self, ray: &Ray) -> Option<Float> {
        let (_, far) = self.roots(ray)?;
        (far >= 0.0).then_some(far)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Plane {
    pub point: Point,
    pub normal: Vec3,
    pub color: RGB,
    #[serde(default = "Phong::matte")]
    pub phong: Phong,
    #[serde(default = "Plane::default_reflectivity")]
    pub reflectivity: Float,
}

impl Plane {
    pub fn new(point: Point, normal: Vec3, color: RGB) -> Self {
        Self {
            point,
            normal,
            color,
            phong: Phong::matte(),
            reflectivity: Self::default_reflectivity(),
        }
    }

    fn default_reflectivity() -> Float {
        1.0
    }

    fn root(&self, ray: &Ray) -> Option<Float> {
        let denom = ray.dir.dot(self.normal);
        // parallel ray never meets the plane
        if denom == 0.0 {
            return None;
        }
        let s = (self.point - ray.orig).dot(self.normal) / denom;
        (s >= 0.0).then_some(s)
    }
}

#[derive(Debug, Clone)]
pub struct BumpSphere {
    pub sphere: Sphere,
    pub height_map: HeightField,
}

impl BumpSphere {
    pub fn new(sphere: Sphere, height_map: HeightField) -> Self {
        Self { sphere, height_map }
    }

    /// Geometric normal bent by forward differences of the height field
    /// along an orthonormal tangent basis. The poles, where the basis
    /// degenerates, keep the unperturbed normal.
    fn perturbed_normal(&self, point: Point) -> Vec3 {
        let normal = self.sphere.normal_at(point);
        let (us, vs) = latlong_scaled(normal);
        let w = self.height_map.width();
        let h = self.height_map.height();
        let u = ((w as Float * us) as usize).min(w - 2);
        let v = ((h as Float * vs) as usize).min(h - 2);

        let Some(p_u) = Vec3::new(0.0, 1.0, 0.0).cross(normal).try_normalized() else {
            return normal;
        };
        let p_v = (-(p_u.cross(normal))).normalized();
        let b_u = self.height_map.at(u, v + 1) - self.height_map.at(u, v);
        let b_v = self.height_map.at(u + 1, v) - self.height_map.at(u, v);

        (normal + p_u * b_u + p_v * b_v)
            .try_normalized()
            .unwrap_or(normal)
    }
}

#[derive(Debug, Clone)]
pub struct TexturedSphere {
    pub sphere: Sphere,
    pub texture: TextureMap,
    pub rotation: Rotation,
}

impl TexturedSphere {
    pub fn new(sphere: Sphere, texture: TextureMap, rotation: Rotation) -> Self {
        Self {
            sphere,
            texture,
            rotation,
        }
    }
}

/// Enclosing shell textured on the inside, used as a sky dome. Rays hit
/// its far quadratic root and the normal faces inward.
#[derive(Debug, Clone)]
pub struct SkyDome {
    pub sphere: Sphere,
    pub texture: TextureMap,
    pub rotation: Rotation,
}

impl SkyDome {
    pub fn new(sphere: Sphere, texture: TextureMap, rotation: Rotation) -> Self {
        Self {
            sphere,
            texture,
            rotation,
        }
    }
}

/// Longitude/latitude of a unit normal, scaled to [0, 1] texture space.
fn latlong_scaled(normal: Vec3) -> (Float, Float) {
    let alpha = (normal.z.atan2(-normal.x) + TAU) % TAU;
    let beta = normal.y.clamp(-1.0, 1.0).asin() + FRAC_PI_2;
    (1.0 - alpha / TAU, 1.0 - beta / PI)
}

fn rotated_texel(sphere: &Sphere, texture: &TextureMap, rotation: Rotation, point: Point) -> RGB {
    let normal = rotation.apply(sphere.normal_at(point)).normalized();
    let (us, vs) = latlong_scaled(normal);
    let w = texture.width();
    let h = texture.height();
    let u = ((w as Float * us) as usize).min(w - 1);
    let v = ((h as Float * vs) as usize).min(h - 1);
    texture.texel(u, v)
}

#[derive(Debug, Clone)]
pub enum Primitive {
    Sphere(Sphere),
    Plane(Plane),
    BumpSphere(BumpSphere),
    TexturedSphere(TexturedSphere),
    SkyDome(SkyDome),
}

impl Primitive {
    pub fn intersect<'a>(&'a self, ray: &Ray) -> Option<RaycastHit<'a>> {
        let s = match self {
            Primitive::Sphere(sphere) => sphere.near_root(ray),
            Primitive::Plane(plane) => plane.root(ray),
            Primitive::BumpSphere(bump) => bump.sphere.near_root(ray),
            Primitive::TexturedSphere(tex) => tex.sphere.near_root(ray),
            Primitive::SkyDome(dome) => dome.sphere.far_root(ray),
        }?;
        let location = ray.at(s);
        Some(RaycastHit {
            surface: self,
            distance: s * ray.dir.norm(),
            location,
            normal: self.normal_at(location),
        })
    }

    pub fn normal_at(&self, point: Point) -> Vec3 {
        match self {
            Primitive::Sphere(sphere) => sphere.normal_at(point),
            Primitive::Plane(plane) => plane.normal,
            Primitive::BumpSphere(bump) => bump.perturbed_normal(point),
            Primitive::TexturedSphere(tex) => tex.sphere.normal_at(point),
            Primitive::SkyDome(dome) => -dome.sphere.normal_at(point),
        }
    }

    pub fn color_at(&self, point: Point) -> RGB {
        match self {
            Primitive::Sphere(sphere) => sphere.color,
            Primitive::Plane(plane) => plane.color,
            Primitive::BumpSphere(bump) => bump.sphere.color,
            Primitive::TexturedSphere(tex) => {
                rotated_texel(&tex.sphere, &tex.texture, tex.rotation, point)
            }
            Primitive::SkyDome(dome) => {
                rotated_texel(&dome.sphere, &dome.texture, dome.rotation, point)
            }
        }
    }

    pub fn phong(&self) -> Phong {
        match self {
            Primitive::Sphere(sphere) => sphere.phong,
            Primitive::Plane(plane) => plane.phong,
            Primitive::BumpSphere(bump) => bump.sphere.phong,
            Primitive::TexturedSphere(tex) => tex.sphere.phong,
            Primitive::SkyDome(dome) => dome.sphere.phong,
        }
    }

    pub fn reflectivity(&self) -> Float {
        match self {
            Primitive::Sphere(sphere) => sphere.reflectivity,
            Primitive::Plane(plane) => plane.reflectivity,
            Primitive::BumpSphere(bump) => bump.sphere.reflectivity,
            Primitive::TexturedSphere(tex) => tex.sphere.reflectivity,
            Primitive::SkyDome(dome) => dome.sphere.reflectivity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_sphere_at(center: Point) -> Sphere {
        Sphere::new(center, 1.0, RGB::white())
    }

    #[test]
    fn head_on_sphere_hit_distance() {
        // from outside, aimed at the center: distance = |oc| - radius
        let p = Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0, RGB::white()));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let hit = p.intersect(&ray).unwrap();
        assert!((hit.distance - 8.0).abs() < 1e-12);
        assert!((hit.normal.z + 1.0).abs() < 1e-12);
    }

    #[test]
    fn distance_is_metric_for_non_unit_directions() {
        let p = Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, 10.0), 2.0, RGB::white()));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 4.0));
        let hit = p.intersect(&ray).unwrap();
        assert!((hit.distance - 8.0).abs() < 1e-12);
    }

    #[test]
    fn sphere_behind_origin_misses() {
        let p = Primitive::Sphere(unit_sphere_at(Vec3::new(0.0, 0.0, -5.0)));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        assert!(p.intersect(&ray).is_none());
    }

    #[test]
    fn ray_from_inside_sphere_reports_no_hit() {
        // near-root-only policy: the exit point is not returned
        let p = Primitive::Sphere(unit_sphere_at(Vec3::zero()));
        let ray = Ray::new(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
        assert!(p.intersect(&ray).is_none());
    }

    #[test]
    fn sky_dome_hits_far_root_with_inward_normal() {
        let dome = SkyDome::new(
            Sphere::new(Vec3::zero(), 10.0, RGB::white()),
            TextureMap::solid(RGB::white()),
            Rotation::identity(),
        );
        let p = Primitive::SkyDome(dome);
        let ray = Ray::new(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
        let hit = p.intersect(&ray).unwrap();
        assert!((hit.distance - 10.0).abs() < 1e-12);
        assert!((hit.normal.x + 1.0).abs() < 1e-12);
    }

    #[test]
    fn plane_hit_distance_exactly_five() {
        let p = Primitive::Plane(Plane::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            RGB::white(),
        ));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let hit = p.intersect(&ray).unwrap();
        assert_eq!(hit.distance, 5.0);
    }

    #[test]
    fn parallel_ray_misses_plane() {
        let p = Primitive::Plane(Plane::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            RGB::white(),
        ));
        let ray = Ray::new(Vec3::zero(), Vec3::new(1.0, 0.0, 0.0));
        assert!(p.intersect(&ray).is_none());
    }

    #[test]
    fn plane_behind_ray_misses() {
        let p = Primitive::Plane(Plane::new(
            Vec3::new(0.0, 0.0, 5.0),
            Vec3::new(0.0, 0.0, -1.0),
            RGB::white(),
        ));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, -1.0));
        assert!(p.intersect(&ray).is_none());
    }

    #[test]
    fn flat_height_field_leaves_normal_unchanged() {
        let field = HeightField::new(4, 4, vec![0.5; 16]).unwrap();
        let p = Primitive::BumpSphere(BumpSphere::new(unit_sphere_at(Vec3::zero()), field));
        let n = p.normal_at(Vec3::new(1.0, 0.0, 0.0));
        assert!((n.x - 1.0).abs() < 1e-12);
        assert!(n.y.abs() < 1e-12);
        assert!(n.z.abs() < 1e-12);
    }

    #[test]
    fn bump_pole_keeps_geometric_normal() {
        let mut samples = vec![0.0; 16];
        samples[5] = 1.0;
        let field = HeightField::new(4, 4, samples).unwrap();
        let p = Primitive::BumpSphere(BumpSphere::new(unit_sphere_at(Vec3::zero()), field));
        let n = p.normal_at(Vec3::new(0.0, 1.0, 0.0));
        assert!((n.y - 1.0).abs() < 1e-12);
    }

    #[test]
    fn sloped_height_field_bends_normal() {
        // rows ramp upward, so the v-difference is non-zero everywhere
        let samples: Vec<Float> = (0..16).map(|i| (i / 4) as Float * 0.25).collect();
        let field = HeightField::new(4, 4, samples).unwrap();
        let p = Primitive::BumpSphere(BumpSphere::new(unit_sphere_at(Vec3::zero()), field));
        let n = p.normal_at(Vec3::new(1.0, 0.0, 0.0));
        assert!((n.norm() - 1.0).abs() < 1e-12);
        assert!((n.x - 1.0).abs() > 1e-6);
    }

    #[test]
    fn texture_lookup_picks_expected_texel() {
        let texels = vec![
            RGB::uniform(0.0),
            RGB::uniform(0.1),
            RGB::uniform(0.2),
            RGB::uniform(0.3),
            RGB::uniform(0.4),
            RGB::uniform(0.5),
            RGB::uniform(0.6),
            RGB::uniform(0.7),
        ];
        let texture = TextureMap::new(4, 2, texels).unwrap();
        let p = Primitive::TexturedSphere(TexturedSphere::new(
            unit_sphere_at(Vec3::zero()),
            texture,
            Rotation::identity(),
        ));
        // normal (1,0,0): alpha = pi -> u = w/2; beta = pi/2 -> v = h/2
        assert_eq!(p.color_at(Vec3::new(1.0, 0.0, 0.0)), RGB::uniform(0.6));
        // normal (-1,0,0): alpha = 0 -> u clamps to w-1
        assert_eq!(p.color_at(Vec3::new(-1.0, 0.0, 0.0)), RGB::uniform(0.7));
    }

    #[test]
    fn texture_rotation_shifts_lookup() {
        let texels = vec![
            RGB::uniform(0.0),
            RGB::uniform(0.1),
            RGB::uniform(0.2),
            RGB::uniform(0.3),
            RGB::uniform(0.4),
            RGB::uniform(0.5),
            RGB::uniform(0.6),
            RGB::uniform(0.7),
        ];
        let texture = TextureMap::new(4, 2, texels).unwrap();
        let half_turn = Rotation {
            axis: Vec3::new(0.0, 1.0, 0.0),
            angle: PI,
        };
        let p = Primitive::TexturedSphere(TexturedSphere::new(
            unit_sphere_at(Vec3::zero()),
            texture,
            half_turn,
        ));
        // rotated half a turn about y, (1,0,0) samples where (-1,0,0) would
        assert_eq!(p.color_at(Vec3::new(1.0, 0.0, 0.0)), RGB::uniform(0.7));
    }

    #[test]
    fn random_rotation_has_unit_axis() {
        use rand::SeedableRng;
        let mut rng = rand::rngs::StdRng::seed_from_u64(3);
        for _ in 0..20 {
            let rotation = Rotation::random(&mut rng);
            assert!((rotation.axis.norm() - 1.0).abs() < 1e-12);
            assert!((0.0..TAU).contains(&rotation.angle));
        }
    }

    #[test]
    fn sphere_defaults_match_tuning() {
        let phong = Phong::default();
        assert_eq!((phong.kd, phong.ks, phong.alpha), (0.6, 1.4, 10.0));
        assert_eq!(unit_sphere_at(Vec3::zero()).reflectivity, 0.2);
    }
}
