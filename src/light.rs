use crate::color::RGB;
use crate::vec3::Float;
use crate::vec3::Point;
use colored::Colorize;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PointLight {
    #[serde(skip)]
    pub name: String,
    pub pos: Point,
    pub rgb: RGB,
    pub intensity: Float,
}

impl PointLight {
    pub fn new(pos: Point, rgb: RGB, intensity: Float) -> Self {
        Self {
            name: String::new(),
            pos,
            rgb,
            intensity,
        }
    }

    /// Light color reaching a point at the given distance, attenuated
    /// by the inverse-square law over the sphere of radius d.
    pub fn illumination_at(&self, distance: Float) -> RGB {
        self.rgb * (self.intensity / (4.0 * PI * distance * distance))
    }

    pub fn display(&self) {
        let s = format!("{:3} {:?} {:?}", self.intensity, self.pos, self.rgb).dimmed();
        println!("-- {:12}: {s}", self.name.blue());
    }
}
