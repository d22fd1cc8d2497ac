use colored::Colorize;
use indicatif::{ParallelProgressIterator, ProgressBar, ProgressStyle};
use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rayon::prelude::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Instant;
use thiserror::Error;

use crate::Ray;
use crate::RenderStats;
use crate::camera::Camera;
use crate::camera::CameraError;
use crate::color::RGB;
use crate::image::Image;
use crate::scene::Scene;
use crate::three_d::RaycastHit;
use crate::vec3::EPSILON;
use crate::vec3::Float;
use crate::vec3::Point;
use crate::vec3::Vec3;

const TONEMAP_BRIGHTNESS: Float = 2.0;
const TONEMAP_CONTRAST: Float = 1.3;
const GAMMA: Float = 2.2;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("image resolution {0}x{1} has a zero dimension")]
    ZeroResolution(u32, u32),
    #[error("shadow sample count must be at least 1")]
    ZeroShadowRays,
    #[error("area light radius must be finite and non-negative")]
    BadLightSize,
    #[error("depth of field needs at least 1 sample ray")]
    ZeroDofRays,
    #[error("depth of field focal plane must be finite and positive")]
    BadFocalPlane,
    #[error("depth of field aperture must be finite and non-negative")]
    BadDofAmount,
    #[error(transparent)]
    Camera(#[from] CameraError),
}

pub struct RenderConfig {
    pub res_x: u32,
    pub res_y: u32,
    /// Maximum reflection bounces per primary ray.
    pub bounces: u32,
    pub shadow_rays: u32,
    /// Area light radius; 0 keeps shadows hard.
    pub light_size: Float,
    pub use_dof: bool,
    pub dof_rays: u32,
    pub dof_focal_plane: Float,
    pub dof_amount: Float,
    pub background: RGB,
    pub seed: u64,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            res_x: 800,
            res_y: 600,
            bounces: 5,
            shadow_rays: 1,
            light_size: 0.0,
            use_dof: false,
            dof_rays: 5,
            dof_focal_plane: 8.8,
            dof_amount: 0.30,
            background: RGB::uniform(0.001),
            seed: 0,
        }
    }
}

impl RenderConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.res_x == 0 || self.res_y == 0 {
            return Err(ConfigError::ZeroResolution(self.res_x, self.res_y));
        }
        if self.shadow_rays == 0 {
            return Err(ConfigError::ZeroShadowRays);
        }
        if !self.light_size.is_finite() || self.light_size < 0.0 {
            return Err(ConfigError::BadLightSize);
        }
        if self.use_dof {
            if self.dof_rays == 0 {
                return Err(ConfigError::ZeroDofRays);
            }
            if !self.dof_focal_plane.is_finite() || self.dof_focal_plane <= 0.0 {
                return Err(ConfigError::BadFocalPlane);
            }
            if !self.dof_amount.is_finite() || self.dof_amount < 0.0 {
                return Err(ConfigError::BadDofAmount);
            }
        }
        Ok(())
    }
}

/// Sigmoidal compression followed by gamma encoding. The only place
/// linear radiance is bent; the 8-bit clamp stays in Image.
pub fn tonemap(linear: RGB) -> RGB {
    let pow_rgb = linear.powf(TONEMAP_CONTRAST);
    let display =
        pow_rgb * (pow_rgb + (0.5 / TONEMAP_BRIGHTNESS).powf(TONEMAP_CONTRAST)).inv();
    display.powf(1.0 / GAMMA)
}

pub struct RenderJob {
    scene: Scene,
    camera: Camera,
    cfg: RenderConfig,
    image: Arc<Mutex<Image>>,
    total_stats: Mutex<RenderStats>,
    start_ts: Instant,
}

impl RenderJob {
    pub fn new(scene: Scene, mut camera: Camera, cfg: RenderConfig) -> Result<Self, ConfigError> {
        cfg.validate()?;
        camera.aspect = cfg.res_x as Float / cfg.res_y as Float;
        camera.init()?;
        let image = Image::new(cfg.res_x, cfg.res_y);
        Ok(Self {
            scene,
            camera,
            cfg,
            image: Arc::new(Mutex::new(image)),
            total_stats: Mutex::new(RenderStats::default()),
            start_ts: Instant::now(),
        })
    }

    pub fn image(&self) -> Arc<Mutex<Image>> {
        self.image.clone()
    }

    /// Recursive trace: closest hit, direct Phong lighting, then an
    /// optional reflected continuation blended by the surface
    /// reflectivity. Misses return the configured background.
    pub fn trace(
        &self,
        stats: &mut RenderStats,
        rng: &mut StdRng,
        ray: &Ray,
        bounces_left: u32,
    ) -> RGB {
        let Some(hit) = self.scene.closest_intersection(ray) else {
            return self.cfg.background;
        };

        let direct = self.illuminate(stats, rng, &hit, ray.orig);

        let reflectivity = hit.surface.reflectivity();
        if reflectivity == 0.0 {
            return direct;
        }
        if bounces_left == 0 {
            stats.num_rays_reflection_max += 1;
            return direct;
        }

        stats.num_rays_reflection += 1;
        let r = ray.dir.reflect(hit.normal).normalized();
        let reflected_ray = Ray::new(hit.location + r * EPSILON, r);
        let reflected = self.trace(stats, rng, &reflected_ray, bounces_left - 1);

        direct * (1.0 - reflectivity) + reflected * reflectivity
    }

    /// Phong shading at a hit point: ambient plus, per light, diffuse
    /// and specular terms scaled by sampled shadow visibility.
    fn illuminate(
        &self,
        stats: &mut RenderStats,
        rng: &mut StdRng,
        hit: &RaycastHit<'_>,
        origin: Point,
    ) -> RGB {
        let surface = hit.surface;
        let p = hit.location;
        let n = hit.normal;
        let phong = surface.phong();
        let c_diff = surface.color_at(p);

        let mut color = c_diff * self.scene.ambient();

        for light in self.scene.lights() {
            let to_light = light.pos - p;
            let distance = to_light.norm();
            let Some(l) = to_light.try_normalized() else {
                continue;
            };
            let Some(v) = (origin - p).try_normalized() else {
                continue;
            };
            let i = light.illumination_at(distance);
            let r = n * (2.0 * l.dot(n)) - l;

            let mut visible = 0u32;
            for _ in 0..self.cfg.shadow_rays {
                stats.num_rays_shadow += 1;
                let offset = Vec3::random_in_unit_sphere(rng) * self.cfg.light_size;
                let light_pos = light.pos + offset;
                let Some(l2) = (light_pos - p).try_normalized() else {
                    continue;
                };
                let shadow_ray = Ray::new(p + n * EPSILON, l2);
                let blocked_at = self
                    .scene
                    .closest_intersection(&shadow_ray)
                    .map_or(Float::INFINITY, |h| h.distance);
                if blocked_at >= (light_pos - p).norm() {
                    visible += 1;
                }
            }
            let visible_ratio = visible as Float / self.cfg.shadow_rays as Float;

            let diffuse = c_diff * phong.kd * i * l.dot(n).max(0.0);
            let specular = light.rgb * phong.ks * i * r.dot(v).max(0.0).powf(phong.alpha);
            color += diffuse * visible_ratio;
            color += specular * visible_ratio;
        }
        color
    }

    fn pixel_color(&self, stats: &mut RenderStats, rng: &mut StdRng, x: u32, y: u32) -> RGB {
        let du = 1.0 / self.cfg.res_x as Float;
        let dv = 1.0 / self.cfg.res_y as Float;
        let u = 0.5 - (x as Float + 0.5) * du;
        let v = 0.5 - (y as Float + 0.5) * dv;
        let ray = self.camera.get_ray(u, v);

        if !self.cfg.use_dof {
            stats.num_rays_primary += 1;
            return tonemap(self.trace(stats, rng, &ray, self.cfg.bounces));
        }

        let scale = self.cfg.dof_focal_plane / ray.dir.z;
        if !scale.is_finite() {
            // ray parallel to the focal plane, nothing to converge on
            stats.num_rays_primary += 1;
            return tonemap(self.trace(stats, rng, &ray, self.cfg.bounces));
        }
        let focal_point = ray.orig + ray.dir * scale;
        let amount = self.cfg.dof_amount;

        // samples are averaged after tone mapping, not before
        let mut sum = RGB::new();
        for _ in 0..self.cfg.dof_rays {
            let from = ray.orig
                + Vec3::new(
                    -amount / 2.0 + amount * rng.gen_range(0.0..1.0),
                    -amount / 2.0 + amount * rng.gen_range(0.0..1.0),
                    0.0,
                );
            let Some(dir) = (focal_point - from).try_normalized() else {
                continue;
            };
            stats.num_rays_primary += 1;
            let dof_ray = Ray::new(from, dir);
            sum += tonemap(self.trace(stats, rng, &dof_ray, self.cfg.bounces));
        }
        sum / self.cfg.dof_rays as Float
    }

    /// Row-parallel render. Every row owns a seeded RNG derived from the
    /// configured seed, so output is reproducible regardless of how
    /// rayon schedules the rows.
    pub fn render(&self, exit_req: Arc<AtomicBool>) {
        let style = ProgressStyle::with_template(
            "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} rows",
        )
        .unwrap();
        let pb = ProgressBar::new(self.cfg.res_y as u64).with_style(style);

        (0..self.cfg.res_y)
            .into_par_iter()
            .progress_with(pb)
            .for_each(|y| {
                if exit_req.load(Ordering::SeqCst) {
                    return;
                }
                let mut rng = StdRng::seed_from_u64(self.row_seed(y));
                let mut stats = RenderStats::default();
                let row: Vec<RGB> = (0..self.cfg.res_x)
                    .map(|x| self.pixel_color(&mut stats, &mut rng, x, y))
                    .collect();
                self.image.lock().unwrap().push_row(y, &row);
                self.total_stats.lock().unwrap().add(stats);
            });
    }

    fn row_seed(&self, y: u32) -> u64 {
        self.cfg
            .seed
            .wrapping_add((y as u64 + 1).wrapping_mul(0x9e37_79b9_7f4a_7c15))
    }

    pub fn print_stats(&self) {
        let stats = self.total_stats.lock().unwrap();
        let elapsed = self.start_ts.elapsed();
        let secs = elapsed.as_secs_f64().max(1e-9);
        let krays = stats.total() as Float / secs / 1000.0;
        println!(
            "duration: {} -- {} krays/sec",
            format!("{:.2} sec", secs).bold(),
            format!("{:.1}", krays).bold()
        );
        let ray_stats = [
            ("num_rays_primary", stats.num_rays_primary),
            ("num_rays_shadow", stats.num_rays_shadow),
            ("num_rays_reflection", stats.num_rays_reflection),
            ("num_rays_reflection_max", stats.num_rays_reflection_max),
        ];
        for (s, n) in ray_stats {
            println!("{:<24} {:>12}", format!("{}:", s), n);
        }
    }

    pub fn save_image(&self, file: &Path) -> Result<(), image::ImageError> {
        self.image.lock().unwrap().save(file)
    }
}
