mod camera;
mod map;
mod texture;

pub use camera::{Camera, CameraParams, ParamsError};

pub use map::{Cell, GameMap, MapError};

pub use texture::{GameAssets, GameTextures, SpriteBank, SpriteId, Texture, TextureError};
