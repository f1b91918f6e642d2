//! ---------------------------------------------------------------------------
//! Multithreaded software (CPU) raycast renderer
//!
//! * Fills an RGBA [`GameView`](crate::renderer::GameView); alpha encodes
//!   distance fog and is resolved against black on presentation.
//! * Every pass is split into sections and run on the shared
//!   [`WorkerPool`](crate::engine::WorkerPool): background by rows, walls by
//!   columns, each sprite by its own screen columns.
//! * Passes are strictly sequential: background → walls → sprites (far to near).
//!
//! Safety: the only `unsafe` code writes through `SharedView`, and every task
//! writes the pixels of its own index range only. The writer and the pass
//! tasks are crate-private, so the only way to run them is
//! [`WorkerPool::dispatch`](crate::engine::WorkerPool::dispatch) with
//! sections from one factory, which never overlap.
//!
//! ```compile_fail
//! use maze_raycaster::renderer::software::ViewTask;
//! ```
//!
//! ```compile_fail
//! use maze_raycaster::renderer::SharedView;
//! ```
//! ---------------------------------------------------------------------------

mod background;
mod overlay;
mod renderer;
mod sprites;
mod view;

pub(crate) use background::BackgroundTask;
pub use overlay::MapMarker;
pub use renderer::Software;
pub(crate) use sprites::SpriteTask;
pub use sprites::{ByDistance, SpriteLayout, depth_order, sprite_queue};
pub(crate) use view::ViewTask;

/// Linear fog: opaque at the eye, transparent (black) at `max_depth`.
#[inline]
pub fn fog_alpha(distance: f32, max_depth: f32) -> u8 {
    (255.0 * (1.0 - distance / max_depth)).clamp(0.0, 255.0) as u8
}

/// Distance to the floor (or ceiling) seen through screen row `y`.
///
/// A wall of height 1 at distance `d` spans `height * factor / d` pixels
/// centred on the horizon, so its foot sits `height * factor / (2d)` below it.
/// The centre row of an odd-height view is treated as half a pixel off the
/// horizon, so the result is always finite.
#[inline]
pub fn row_distance(y: usize, height: usize, factor: f32) -> f32 {
    let h = height as f32;
    let offset = ((y as f32 + 0.5) - h * 0.5).abs().max(0.5);
    h * factor / (2.0 * offset)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fog_is_linear_and_clamped() {
        assert_eq!(fog_alpha(0.0, 10.0), 255);
        assert_eq!(fog_alpha(5.0, 10.0), 127);
        assert_eq!(fog_alpha(10.0, 10.0), 0);
        assert_eq!(fog_alpha(25.0, 10.0), 0);
        assert_eq!(fog_alpha(-1.0, 10.0), 255);
    }

    #[test]
    fn row_distance_shrinks_towards_screen_edge() {
        let near = row_distance(99, 100, 1.0);
        let far = row_distance(51, 100, 1.0);
        assert!(near < far);
        // bottom row of a 100px screen: offset 49.5
        assert!((near - 100.0 / 99.0).abs() < 1e-5);
        // symmetric around the horizon
        assert_eq!(row_distance(0, 100, 1.0), near);
    }

    #[test]
    fn centre_row_of_odd_view_is_finite() {
        // row 2 of 5 sits exactly on the horizon
        let d = row_distance(2, 5, 1.0);
        assert!(d.is_finite());
        assert_eq!(d, 5.0);
        assert!(d > row_distance(1, 5, 1.0));
    }
}
