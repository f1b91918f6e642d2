// Decoded RGBA images shared read-only by every render thread.
// Loaded once at startup; nothing here is mutated after that.

use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use thiserror::Error;

/// Sprite handle used by billboards.
pub type SpriteId = u32;

/// CPU-side storage: RGBA8, row-major, `w * h * 4` bytes.
#[derive(Clone, Debug, PartialEq)]
pub struct Texture {
    w: usize,
    h: usize,
    pixels: Vec<u8>,
}

/// Things that can go wrong while loading or looking up textures.
#[derive(Debug, Error)]
pub enum TextureError {
    #[error("failed to decode `{path}`: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("texture is {w}x{h} but got {len} bytes")]
    BadSize { w: usize, h: usize, len: usize },

    /// Attempted to register a second texture under an existing id.
    #[error("sprite id {0} already present in bank")]
    Duplicate(SpriteId),

    /// A billboard referenced an id that was never registered.
    #[error("no sprite texture registered for id {0}")]
    MissingSprite(SpriteId),
}

impl Texture {
    /// Wrap raw RGBA8 bytes.
    pub fn from_rgba(w: usize, h: usize, pixels: Vec<u8>) -> Result<Self, TextureError> {
        if w == 0 || h == 0 || pixels.len() != w * h * 4 {
            return Err(TextureError::BadSize {
                w,
                h,
                len: pixels.len(),
            });
        }
        Ok(Self { w, h, pixels })
    }

    /// One colour repeated over a `w × h` image. Panics on a zero dimension.
    pub fn solid(w: usize, h: usize, rgba: [u8; 4]) -> Self {
        assert!(w > 0 && h > 0, "solid texture must be non-empty, got {w}x{h}");
        Self {
            w,
            h,
            pixels: rgba.repeat(w * h),
        }
    }

    /// Decode any format the `image` crate understands into RGBA8.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, TextureError> {
        let path = path.as_ref();
        let img = image::open(path)
            .map_err(|source| TextureError::Decode {
                path: path.to_path_buf(),
                source,
            })?
            .to_rgba8();
        let (w, h) = img.dimensions();
        log::debug!("decoded {} ({w}x{h})", path.display());
        Self::from_rgba(w as usize, h as usize, img.into_raw())
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.w
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.h
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Nearest-neighbour texel fetch. Panics outside the image.
    #[inline]
    pub fn texel(&self, x: usize, y: usize) -> [u8; 4] {
        assert!(
            x < self.w && y < self.h,
            "texel ({x}, {y}) outside {}x{} texture",
            self.w,
            self.h
        );
        let i = (y * self.w + x) * 4;
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Texel under the fractional part of a world coordinate pair.
    #[inline]
    pub fn sample_wrapped(&self, u: f32, v: f32) -> [u8; 4] {
        let tx = ((u.rem_euclid(1.0) * self.w as f32) as usize).min(self.w - 1);
        let ty = ((v.rem_euclid(1.0) * self.h as f32) as usize).min(self.h - 1);
        self.texel(tx, ty)
    }
}

/// On-disk locations of the five textures the renderer cannot run without.
#[derive(Clone, Debug)]
pub struct GameAssets {
    pub wall: PathBuf,
    pub boundary: PathBuf,
    pub floor: PathBuf,
    pub ceiling: PathBuf,
    pub sky: PathBuf,
}

impl GameAssets {
    /// Conventional file names inside one directory.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref();
        Self {
            wall: dir.join("wall.png"),
            boundary: dir.join("boundary.png"),
            floor: dir.join("floor.png"),
            ceiling: dir.join("ceiling.png"),
            sky: dir.join("sky.png"),
        }
    }
}

/// The decoded environment textures.
#[derive(Clone, Debug)]
pub struct GameTextures {
    pub wall: Texture,
    pub boundary: Texture,
    pub floor: Texture,
    pub ceiling: Texture,
    pub sky: Texture,
}

impl GameTextures {
    /// Load every required texture; the first failure aborts.
    pub fn load(assets: &GameAssets) -> Result<Self, TextureError> {
        let textures = Self {
            wall: Texture::from_file(&assets.wall)?,
            boundary: Texture::from_file(&assets.boundary)?,
            floor: Texture::from_file(&assets.floor)?,
            ceiling: Texture::from_file(&assets.ceiling)?,
            sky: Texture::from_file(&assets.sky)?,
        };
        log::info!("environment textures loaded");
        Ok(textures)
    }

    /// Procedural stand-ins: checkerboards and a gradient sky.
    pub fn builtin() -> Self {
        Self {
            wall: checker(16, [150, 60, 40, 255], [110, 40, 30, 255]),
            boundary: checker(16, [90, 90, 110, 255], [60, 60, 80, 255]),
            floor: checker(8, [70, 70, 70, 255], [50, 50, 50, 255]),
            ceiling: checker(8, [40, 40, 60, 255], [30, 30, 45, 255]),
            sky: gradient(64, 32, [20, 30, 80, 255], [120, 160, 220, 255]),
        }
    }
}

fn checker(size: usize, a: [u8; 4], b: [u8; 4]) -> Texture {
    let mut pixels = Vec::with_capacity(size * size * 4);
    for y in 0..size {
        for x in 0..size {
            let c = if ((x / 4) ^ (y / 4)) & 1 == 0 { a } else { b };
            pixels.extend_from_slice(&c);
        }
    }
    Texture {
        w: size,
        h: size,
        pixels,
    }
}

fn gradient(w: usize, h: usize, top: [u8; 4], bottom: [u8; 4]) -> Texture {
    let mut pixels = Vec::with_capacity(w * h * 4);
    for y in 0..h {
        let t = y as f32 / (h - 1).max(1) as f32;
        let c: [u8; 4] =
            std::array::from_fn(|i| (top[i] as f32 + (bottom[i] as f32 - top[i] as f32) * t) as u8);
        for _ in 0..w {
            pixels.extend_from_slice(&c);
        }
    }
    Texture { w, h, pixels }
}

/// Sprite textures keyed by billboard id.
///
/// Filled at startup, then only read.
#[derive(Default, Debug)]
pub struct SpriteBank {
    by_id: HashMap<SpriteId, Texture>,
}

impl SpriteBank {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Register `tex` under `id`. Fails if the id is taken.
    pub fn insert(&mut self, id: SpriteId, tex: Texture) -> Result<(), TextureError> {
        if self.by_id.contains_key(&id) {
            return Err(TextureError::Duplicate(id));
        }
        self.by_id.insert(id, tex);
        Ok(())
    }

    /// Borrow the texture for `id`.
    pub fn get(&self, id: SpriteId) -> Result<&Texture, TextureError> {
        self.by_id.get(&id).ok_or(TextureError::MissingSprite(id))
    }
}

/*======================================================================*/
/*                               Tests                                  */
/*======================================================================*/
