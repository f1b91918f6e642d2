//! Rendering abstraction layer.
//!
//! *The game loop never touches a pixel buffer directly.*
//! It hands the map, the camera and the frame's [`Billboard`]s to a type that
//! implements [`Renderer`] and receives the finished frame in `end_frame`.
//!
//! The software back-end lives in [`software`]; its passes run on a fixed
//! [`WorkerPool`](crate::engine::WorkerPool) and write into one shared
//! [`GameView`].

use bitflags::bitflags;
use glam::Vec2;
use thiserror::Error;

use crate::{
    engine::{PoolError, SectionError},
    world::{Camera, CameraParams, GameMap, SpriteId, TextureError},
};

pub mod frame;
pub mod software;

pub use frame::GameView;
pub(crate) use frame::SharedView;
pub use software::Software;

/// Pixel format handed to the window (0x00RRGGBB).
pub type Rgba = u32;

bitflags! {
    /// Game-state switches read once per frame.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct FrameFlags: u8 {
        /// Perspective-correct floor/ceiling via the row background pass.
        const LINEAR = 0x01;
        /// Sky instead of ceiling (linear mode only).
        const SKY    = 0x02;
        const PAUSED = 0x04;
        /// Map overlay requested.
        const TABBED = 0x08;
    }
}

/// Renderer tunables.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GraphicsVars {
    /// Screen-height multiplier for a wall at distance 1.
    pub wall_height_factor: f32,
    /// Distance at which walls and floor fade fully to black.
    pub max_sight_depth: f32,
    /// Billboards closer than this are not drawn.
    pub min_sprite_distance: f32,
    /// How many times the sky texture repeats over a full turn.
    pub sky_turns: f32,
    /// Minimap cell size in pixels.
    pub minimap_cell: usize,
}

impl Default for GraphicsVars {
    fn default() -> Self {
        Self {
            wall_height_factor: 1.0,
            max_sight_depth: 16.0,
            min_sprite_distance: 0.2,
            sky_turns: 2.0,
            minimap_cell: 6,
        }
    }
}

/// Camera-facing sprite, projected by the entity layer each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Billboard {
    pub id: SpriteId,
    /// Euclidean distance from the camera, in map units.
    pub distance: f32,
    /// Screen column (in pixels) of the sprite centre.
    pub position_on_screen: f32,
    /// Height relative to a wall.
    pub size: f32,
}

impl Billboard {
    /// Project a world-space sprite using the same angle-linear column
    /// mapping as the ray sweep. `None` if it is behind the camera or
    /// entirely outside the field of view.
    pub fn project(
        id: SpriteId,
        world_pos: Vec2,
        size: f32,
        camera: &Camera,
        params: &CameraParams,
        width: usize,
    ) -> Option<Self> {
        let rel = world_pos - camera.pos;
        let distance = rel.length();
        if distance <= f32::EPSILON || width == 0 {
            return None;
        }
        // signed angle from forward, + to the left
        let angle = camera.forward().angle_to(rel);
        let half = params.fov * 0.5;
        // allow sprites whose centre is slightly off-screen
        if angle.abs() > half + std::f32::consts::FRAC_PI_4 {
            return None;
        }
        let span = (width.max(2) - 1) as f32;
        let position_on_screen = (half - angle) / params.fov * span;
        Some(Self {
            id,
            distance,
            position_on_screen,
            size,
        })
    }
}

/// Frame-level failures. Every one of them is fatal for the frame.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error(transparent)]
    Texture(#[from] TextureError),

    #[error(transparent)]
    Pool(#[from] PoolError),

    #[error(transparent)]
    Section(#[from] SectionError),
}

/// A back-end that owns its frame buffer.
///
/// `end_frame` hands the finished frame to a user-supplied closure.
pub trait Renderer {
    /// Clear the frame buffer.
    fn begin_frame(&mut self);

    /// Cast rays and composite background, walls and sprites.
    fn draw_view(
        &mut self,
        flags: FrameFlags,
        camera: &Camera,
        params: &CameraParams,
        map: &GameMap,
        billboards: &[Billboard],
    ) -> Result<(), RenderError>;

    /// Finish the frame and **loan** it to `submit` as `0x00RRGGBB`.
    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    #[test]
    fn billboard_straight_ahead_is_centred() {
        let cam = Camera::new(Vec2::new(1.0, 1.0), 0.0);
        let params = CameraParams {
            fov: FRAC_PI_2,
            ..CameraParams::default()
        };
        let b = Billboard::project(3, Vec2::new(4.0, 1.0), 1.0, &cam, &params, 101).unwrap();
        assert!((b.distance - 3.0).abs() < 1e-5);
        assert!((b.position_on_screen - 50.0).abs() < 1e-3);
    }

    #[test]
    fn billboard_on_the_left_maps_to_low_columns() {
        let cam = Camera::new(Vec2::ZERO, 0.0);
        let params = CameraParams {
            fov: FRAC_PI_2,
            ..CameraParams::default()
        };
        // 45° to the left (+Y in a CCW world) = column 0
        let b = Billboard::project(0, Vec2::new(1.0, 1.0), 1.0, &cam, &params, 101).unwrap();
        assert!(b.position_on_screen.abs() < 1e-3);
    }

    #[test]
    fn billboard_behind_is_culled() {
        let cam = Camera::new(Vec2::ZERO, 0.0);
        let params = CameraParams::default();
        assert!(Billboard::project(0, Vec2::new(-3.0, 0.0), 1.0, &cam, &params, 64).is_none());
    }
}
