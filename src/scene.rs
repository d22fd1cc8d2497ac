use crate::Ray;
use crate::camera::Camera;
use crate::color::RGB;
use crate::light::PointLight;
use crate::texture::HeightField;
use crate::texture::TextureError;
use crate::texture::TextureMap;
use crate::three_d::BumpSphere;
use crate::three_d::Plane;
use crate::three_d::Primitive;
use crate::three_d::RaycastHit;
use crate::three_d::Rotation;
use crate::three_d::SkyDome;
use crate::three_d::Sphere;
use crate::three_d::TexturedSphere;
use crate::vec3::Float;
use crate::vec3::Vec3;
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse scene entry: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Texture(#[from] TextureError),
    #[error("scene file has no camera entry")]
    MissingCamera,
    #[error("{0} has a zero-length normal or rotation axis")]
    DegenerateVector(String),
}

/// Primitives, point lights and one ambient term. Built once, read-only
/// while rendering; nothing here mutates after load.
#[derive(Default)]
pub struct Scene {
    surfaces: Vec<Primitive>,
    lights: Vec<PointLight>,
    ambient: RGB,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_surface(&mut self, surface: Primitive) {
        self.surfaces.push(surface);
    }

    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    pub fn set_ambient(&mut self, ambient: RGB) {
        self.ambient = ambient;
    }

    pub fn ambient(&self) -> RGB {
        self.ambient
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    pub fn surfaces(&self) -> &[Primitive] {
        &self.surfaces
    }

    /// Nearest valid intersection along the ray, linear scan. The
    /// strict comparison keeps the first surface on exact distance ties.
    pub fn closest_intersection(&self, ray: &Ray) -> Option<RaycastHit<'_>> {
        let mut closest: Option<RaycastHit<'_>> = None;
        for surface in &self.surfaces {
            if let Some(hit) = surface.intersect(ray) {
                if closest
                    .as_ref()
                    .map_or(true, |c| hit.distance < c.distance)
                {
                    closest = Some(hit);
                }
            }
        }
        closest
    }
}

pub struct LoadedScene {
    pub scene: Scene,
    pub camera: Camera,
    pub resolution: Option<(u32, u32)>,
    pub background: Option<RGB>,
}

#[derive(Deserialize)]
struct AmbientSpec {
    rgb: RGB,
    intensity: Float,
}

#[derive(Deserialize)]
struct BumpSphereSpec {
    #[serde(flatten)]
    sphere: Sphere,
    height_map: PathBuf,
}

#[derive(Deserialize)]
struct TexturedSphereSpec {
    #[serde(flatten)]
    sphere: Sphere,
    texture: PathBuf,
    #[serde(default)]
    rotation: Rotation,
}

#[derive(Deserialize)]
struct SkyDomeSpec {
    #[serde(flatten)]
    sphere: Sphere,
    texture: PathBuf,
    #[serde(default = "dome_rotation")]
    rotation: Rotation,
}

fn dome_rotation() -> Rotation {
    Rotation {
        axis: Vec3::new(0.0, 1.0, 0.0),
        angle: 1.3,
    }
}

fn unit_axis(rotation: Rotation, entry: &str) -> Result<Rotation, SceneError> {
    let axis = rotation
        .axis
        .try_normalized()
        .ok_or_else(|| SceneError::DegenerateVector(entry.to_string()))?;
    Ok(Rotation { axis, ..rotation })
}

pub fn load_scene(path: &Path) -> Result<LoadedScene, SceneError> {
    let data = fs::read_to_string(path)?;
    let json: serde_json::Value = serde_json::from_str(&data)?;
    from_json(&json)
}

/// Keyed scene description: `camera`, `ambient`, `resolution`,
/// `background`, then numbered `point-light.N`, `sphere.N`, `plane.N`,
/// `bumpy-sphere.N`, `textured-sphere.N` entries and one `sky-dome`.
pub fn from_json(json: &serde_json::Value) -> Result<LoadedScene, SceneError> {
    let camera: Camera = match json.get("camera") {
        None | Some(serde_json::Value::Null) => return Err(SceneError::MissingCamera),
        Some(value) => serde_json::from_value(value.clone())?,
    };

    let resolution = match json.get("resolution") {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(serde_json::from_value::<(u32, u32)>(value.clone())?),
    };

    let background = match json.get("background") {
        None | Some(serde_json::Value::Null) => None,
        Some(value) => Some(serde_json::from_value::<RGB>(value.clone())?),
    };

    let mut scene = Scene::new();

    if let Some(value) = json.get("ambient") {
        if !value.is_null() {
            let ambient: AmbientSpec = serde_json::from_value(value.clone())?;
            scene.set_ambient(ambient.rgb * ambient.intensity);
        }
    }

    let mut num_lights = 0;
    loop {
        let key = format!("point-light.{num_lights}");
        let Some(value) = json.get(key.as_str()) else {
            break;
        };
        let mut light: PointLight = serde_json::from_value(value.clone())?;
        light.name = key;
        scene.add_light(light);
        num_lights += 1;
    }

    let mut num_spheres = 0;
    loop {
        let key = format!("sphere.{num_spheres}");
        let Some(value) = json.get(key.as_str()) else {
            break;
        };
        let sphere: Sphere = serde_json::from_value(value.clone())?;
        scene.add_surface(Primitive::Sphere(sphere));
        num_spheres += 1;
    }

    let mut num_planes = 0;
    loop {
        let key = format!("plane.{num_planes}");
        let Some(value) = json.get(key.as_str()) else {
            break;
        };
        let mut plane: Plane = serde_json::from_value(value.clone())?;
        plane.normal = plane
            .normal
            .try_normalized()
            .ok_or_else(|| SceneError::DegenerateVector(key))?;
        scene.add_surface(Primitive::Plane(plane));
        num_planes += 1;
    }

    let mut num_bumpy = 0;
    loop {
        let key = format!("bumpy-sphere.{num_bumpy}");
        let Some(value) = json.get(key.as_str()) else {
            break;
        };
        let spec: BumpSphereSpec = serde_json::from_value(value.clone())?;
        let height_map = HeightField::open(&spec.height_map)?;
        scene.add_surface(Primitive::BumpSphere(BumpSphere::new(
            spec.sphere,
            height_map,
        )));
        num_bumpy += 1;
    }

    let mut num_textured = 0;
    loop {
        let key = format!("textured-sphere.{num_textured}");
        let Some(value) = json.get(key.as_str()) else {
            break;
        };
        let spec: TexturedSphereSpec = serde_json::from_value(value.clone())?;
        let texture = TextureMap::open(&spec.texture)?;
        let rotation = unit_axis(spec.rotation, &key)?;
        scene.add_surface(Primitive::TexturedSphere(TexturedSphere::new(
            spec.sphere,
            texture,
            rotation,
        )));
        num_textured += 1;
    }

    if let Some(value) = json.get("sky-dome") {
        if !value.is_null() {
            let spec: SkyDomeSpec = serde_json::from_value(value.clone())?;
            let texture = TextureMap::open(&spec.texture)?;
            let rotation = unit_axis(spec.rotation, "sky-dome")?;
            scene.add_surface(Primitive::SkyDome(SkyDome::new(
                spec.sphere,
                texture,
                rotation,
            )));
        }
    }

    log::info!(
        "scene: {} spheres, {} planes, {} bumpy, {} textured, {} lights",
        num_spheres,
        num_planes,
        num_bumpy,
        num_textured,
        num_lights
    );

    Ok(LoadedScene {
        scene,
        camera,
        resolution,
        background,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sphere_at(z: Float) -> Primitive {
        Primitive::Sphere(Sphere::new(Vec3::new(0.0, 0.0, z), 1.0, RGB::white()))
    }

    #[test]
    fn closest_intersection_picks_nearest() {
        let mut scene = Scene::new();
        scene.add_surface(sphere_at(20.0));
        scene.add_surface(sphere_at(10.0));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let hit = scene.closest_intersection(&ray).unwrap();
        assert!((hit.distance - 9.0).abs() < 1e-12);
    }

    #[test]
    fn exact_ties_keep_first_surface() {
        let mut scene = Scene::new();
        scene.add_surface(sphere_at(10.0));
        scene.add_surface(sphere_at(10.0));
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        let hit = scene.closest_intersection(&ray).unwrap();
        assert!(std::ptr::eq(hit.surface, &scene.surfaces()[0]));
    }

    #[test]
    fn empty_scene_misses() {
        let scene = Scene::new();
        let ray = Ray::new(Vec3::zero(), Vec3::new(0.0, 0.0, 1.0));
        assert!(scene.closest_intersection(&ray).is_none());
    }

    fn minimal_json() -> serde_json::Value {
        json!({
            "resolution": [64, 48],
            "camera": {
                "pos": { "x": 0.0, "y": 0.0, "z": -5.0 },
                "dir": { "x": 0.0, "y": 0.0, "z": 1.0 },
                "up": { "x": 0.0, "y": 1.0, "z": 0.0 },
                "vfov": 60.0
            },
            "ambient": { "rgb": { "r": 1.0, "g": 1.0, "b": 1.0 }, "intensity": 0.02 },
            "point-light.0": {
                "pos": { "x": 0.0, "y": 5.0, "z": 0.0 },
                "rgb": { "r": 1.0, "g": 1.0, "b": 1.0 },
                "intensity": 80.0
            },
            "sphere.0": {
                "center": { "x": 0.0, "y": 0.0, "z": 0.0 },
                "radius": 1.0,
                "color": { "r": 0.9, "g": 0.2, "b": 0.2 }
            },
            "plane.0": {
                "point": { "x": 0.0, "y": -1.0, "z": 0.0 },
                "normal": { "x": 0.0, "y": 2.0, "z": 0.0 },
                "color": { "r": 0.5, "g": 0.5, "b": 0.5 }
            }
        })
    }

    #[test]
    fn loads_minimal_scene() {
        let loaded = from_json(&minimal_json()).unwrap();
        assert_eq!(loaded.resolution, Some((64, 48)));
        assert_eq!(loaded.scene.surfaces().len(), 2);
        assert_eq!(loaded.scene.lights().len(), 1);
        assert_eq!(loaded.scene.ambient(), RGB::uniform(0.02));
        // plane normals are normalized at load time
        let Primitive::Plane(plane) = &loaded.scene.surfaces()[1] else {
            panic!("expected a plane");
        };
        assert!((plane.normal.norm() - 1.0).abs() < 1e-12);
        // sphere entries without overrides carry the default coefficients
        let Primitive::Sphere(sphere) = &loaded.scene.surfaces()[0] else {
            panic!("expected a sphere");
        };
        assert_eq!(sphere.phong.kd, 0.6);
        assert_eq!(sphere.reflectivity, 0.2);
    }

    #[test]
    fn missing_camera_is_an_error() {
        let mut json = minimal_json();
        json.as_object_mut().unwrap().remove("camera");
        assert!(matches!(from_json(&json), Err(SceneError::MissingCamera)));
    }

    #[test]
    fn malformed_sphere_is_an_error() {
        let mut json = minimal_json();
        json["sphere.0"] = json!({ "radius": "not-a-number" });
        assert!(matches!(from_json(&json), Err(SceneError::Json(_))));
    }

    #[test]
    fn zero_plane_normal_is_an_error() {
        let mut json = minimal_json();
        json["plane.0"]["normal"] = json!({ "x": 0.0, "y": 0.0, "z": 0.0 });
        assert!(matches!(
            from_json(&json),
            Err(SceneError::DegenerateVector(_))
        ));
    }
}
