use crate::color::RGB;
use crate::vec3::Float;
use std::path::Path;
use thiserror::Error;

/// Height values are scaled by this factor when a field is decoded from
/// an image, matching the bump relief the renderer was tuned against.
pub const BUMP_FACTOR: Float = 2.0;

#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode texture image: {0}")]
    Decode(#[from] image::ImageError),
    #[error("texture data is {len} texels, expected {width}x{height}")]
    BadLength {
        width: usize,
        height: usize,
        len: usize,
    },
    #[error("field is {width}x{height}, needs at least {min}x{min}")]
    TooSmall {
        width: usize,
        height: usize,
        min: usize,
    },
}

/// Row-major color field sampled by spherical UV lookups.
#[derive(Debug, Clone)]
pub struct TextureMap {
    width: usize,
    height: usize,
    texels: Vec<RGB>,
}

impl TextureMap {
    pub fn new(width: usize, height: usize, texels: Vec<RGB>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::TooSmall {
                width,
                height,
                min: 1,
            });
        }
        if texels.len() != width * height {
            return Err(TextureError::BadLength {
                width,
                height,
                len: texels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            texels,
        })
    }

    /// 1x1 map, the fallback for texture variants built from a plain color.
    pub fn solid(color: RGB) -> Self {
        Self {
            width: 1,
            height: 1,
            texels: vec![color],
        }
    }

    pub fn open(path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = (img.width() as usize, img.height() as usize);
        let texels = img
            .pixels()
            .map(|p| RGB {
                r: p.0[0] as Float / 256.0,
                g: p.0[1] as Float / 256.0,
                b: p.0[2] as Float / 256.0,
            })
            .collect();
        Self::new(width, height, texels)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn texel(&self, u: usize, v: usize) -> RGB {
        self.texels[v * self.width + u]
    }
}

/// Row-major scalar field driving bump-map normal perturbation.
#[derive(Debug, Clone)]
pub struct HeightField {
    width: usize,
    height: usize,
    samples: Vec<Float>,
}

impl HeightField {
    /// Forward differencing needs a neighbor in both directions, so the
    /// field must be at least 2x2.
    pub fn new(width: usize, height: usize, samples: Vec<Float>) -> Result<Self, TextureError> {
        if width < 2 || height < 2 {
            return Err(TextureError::TooSmall {
                width,
                height,
                min: 2,
            });
        }
        if samples.len() != width * height {
            return Err(TextureError::BadLength {
                width,
                height,
                len: samples.len(),
            });
        }
        Ok(Self {
            width,
            height,
            samples,
        })
    }

    pub fn open(path: &Path) -> Result<Self, TextureError> {
        let img = image::open(path)?.to_rgb8();
        let (width, height) = (img.width() as usize, img.height() as usize);
        let samples = img
            .pixels()
            .map(|p| BUMP_FACTOR * p.0[2] as Float / 255.0)
            .collect();
        Self::new(width, height, samples)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn at(&self, u: usize, v: usize) -> Float {
        self.samples[v * self.width + u]
    }
}
