//! Fixed-step raymarcher: one ray per screen column against the map grid.

use glam::Vec2;

use crate::world::{Camera, CameraParams, Cell, GameMap};

/// What stopped a ray.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HitKind {
    Wall,
    Boundary,
    /// Ran out of render distance without hitting anything.
    #[default]
    Empty,
    OutOfBounds,
}

/// Which family of grid lines the ray crossed last.
///
/// `Vertical` = a line `x = k`, so the wall face runs along Y.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Side {
    Vertical,
    Horizontal,
    #[default]
    Unknown,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RayInfo {
    pub hit: HitKind,
    /// Hit point relative to the camera position.
    pub hit_pos: Vec2,
    pub length: f32,
    pub last_side: Side,
}

/// Angle offset of column `col` from the forward vector: `+fov/2` at
/// column 0 down to `-fov/2` at column `width - 1`.
#[inline]
pub fn column_angle(col: usize, width: usize, fov: f32) -> f32 {
    if width < 2 {
        return 0.0;
    }
    let t = col as f32 / (width - 1) as f32;
    fov * 0.5 - fov * t
}

/// Unit ray direction for screen column `col`.
#[inline]
pub fn column_dir(camera: &Camera, col: usize, width: usize, fov: f32) -> Vec2 {
    Vec2::from_angle(column_angle(col, width, fov)).rotate(camera.forward())
}

/// March one ray from `origin` along the unit vector `dir`.
///
/// Terminates after at most `params.max_steps()` iterations.
pub fn cast_ray(origin: Vec2, dir: Vec2, params: &CameraParams, map: &GameMap) -> RayInfo {
    let inc = dir * params.precision;
    let mut pos = origin;
    let mut cell = pos.floor();
    let mut side = Side::Unknown;

    for step in 1..=params.max_steps() {
        let prev = pos;
        pos += inc;
        let length = step as f32 * params.precision;

        let next = pos.floor();
        let crossed_x = next.x != cell.x;
        let crossed_y = next.y != cell.y;
        side = match (crossed_x, crossed_y) {
            (true, false) => Side::Vertical,
            (false, true) => Side::Horizontal,
            (true, true) => first_crossing(prev, inc, cell),
            (false, false) => side,
        };
        cell = next;

        let hit = match map.cell(cell.x as i64, cell.y as i64) {
            None => Some(HitKind::OutOfBounds),
            Some(Cell::Wall) => Some(HitKind::Wall),
            Some(Cell::Boundary) => Some(HitKind::Boundary),
            Some(Cell::Empty | Cell::Goal) => None,
        };
        if let Some(hit) = hit {
            return RayInfo {
                hit,
                hit_pos: pos - origin,
                length,
                last_side: side,
            };
        }

        if length > params.max_render_dist {
            break;
        }
    }

    RayInfo {
        hit: HitKind::Empty,
        hit_pos: pos - origin,
        length: params.max_render_dist,
        last_side: side,
    }
}

/// The step cut through a cell corner: pick the axis whose boundary it met first.
fn first_crossing(prev: Vec2, inc: Vec2, cell: Vec2) -> Side {
    let boundary = |p: f32, d: f32, c: f32| {
        let edge = if d > 0.0 { c + 1.0 } else { c };
        ((edge - p) / d).abs()
    };
    let tx = boundary(prev.x, inc.x, cell.x);
    let ty = boundary(prev.y, inc.y, cell.y);
    if tx <= ty {
        Side::Vertical
    } else {
        Side::Horizontal
    }
}

/// Owns the per-column ray buffer; sized once, overwritten every frame.
#[derive(Debug)]
pub struct RayCaster {
    rays: Vec<RayInfo>,
}

impl RayCaster {
    pub fn new(width: usize) -> Self {
        Self {
            rays: vec![RayInfo::default(); width],
        }
    }

    #[inline]
    pub fn rays(&self) -> &[RayInfo] {
        &self.rays
    }

    /// Recompute one ray per column for the current camera.
    pub fn cast_rays(&mut self, camera: &Camera, params: &CameraParams, map: &GameMap) -> &[RayInfo] {
        let width = self.rays.len();
        for (col, ray) in self.rays.iter_mut().enumerate() {
            let dir = column_dir(camera, col, width, params.fov);
            *ray = cast_ray(camera.pos, dir, params, map);
        }
        &self.rays
    }
}

/*====================================================================*/
/*                                Tests                                */
/*====================================================================*/
#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::FRAC_PI_2;

    fn params() -> CameraParams {
        CameraParams {
            fov: FRAC_PI_2,
            max_render_dist: 20.0,
            precision: 0.01,
        }
    }

    /// 8x3 corridor, wall at column 6.
    fn corridor() -> GameMap {
        GameMap::from_rows(&["bbbbbbbb", "b     wb", "bbbbbbbb"]).unwrap()
    }

    #[test]
    fn straight_ray_hits_wall_at_known_distance() {
        let p = params();
        let ray = cast_ray(Vec2::new(1.5, 1.5), Vec2::X, &p, &corridor());
        assert_eq!(ray.hit, HitKind::Wall);
        assert_eq!(ray.last_side, Side::Vertical);
        // wall face at x = 6.0
        assert!((ray.length - 4.5).abs() <= p.precision + 1e-4, "{}", ray.length);
        assert!((ray.hit_pos.y).abs() < 1e-5);
    }

    #[test]
    fn ray_into_side_wall_is_horizontal() {
        let ray = cast_ray(Vec2::new(2.5, 1.5), Vec2::Y, &params(), &corridor());
        assert_eq!(ray.hit, HitKind::Boundary);
        assert_eq!(ray.last_side, Side::Horizontal);
        assert!((ray.length - 0.5).abs() <= 0.011);
    }

    #[test]
    fn open_map_edge_reports_out_of_bounds() {
        let map = GameMap::from_rows(&["    ", "    "]).unwrap();
        let ray = cast_ray(Vec2::new(0.5, 0.5), Vec2::X, &params(), &map);
        assert_eq!(ray.hit, HitKind::OutOfBounds);
    }

    #[test]
    fn short_render_distance_gives_empty() {
        let p = CameraParams {
            max_render_dist: 1.0,
            ..params()
        };
        let ray = cast_ray(Vec2::new(1.5, 1.5), Vec2::X, &p, &corridor());
        assert_eq!(ray.hit, HitKind::Empty);
        assert_eq!(ray.length, 1.0);
    }

    #[test]
    fn zero_precision_returns_without_marching() {
        let p = CameraParams {
            precision: 0.0,
            ..params()
        };
        let ray = cast_ray(Vec2::new(1.5, 1.5), Vec2::X, &p, &corridor());
        assert_eq!(ray.hit, HitKind::Empty);
        assert_eq!(ray.hit_pos, Vec2::ZERO);
        assert_eq!(ray.length, p.max_render_dist);
    }

    #[test]
    fn sweep_is_symmetric() {
        let cam = Camera::new(Vec2::new(2.0, 2.0), 0.7);
        let fov = params().fov;
        let first = column_dir(&cam, 0, 320, fov);
        let last = column_dir(&cam, 319, 320, fov);
        assert_eq!(first, Vec2::from_angle(fov / 2.0).rotate(cam.forward()));
        assert_eq!(last, Vec2::from_angle(-fov / 2.0).rotate(cam.forward()));
        // leftmost ray agrees with the projection plane
        let left = (cam.forward() - cam.half_plane(fov)).normalize();
        assert!((first - left).length() < 1e-5);
    }

    #[test]
    fn every_ray_resolves_within_step_budget() {
        let map = GameMap::from_rows(&["bbbbbb", "b  w b", "b w  b", "bbbbbb"]).unwrap();
        let p = params();
        let mut caster = RayCaster::new(64);
        for (x, y, yaw) in [(1.5, 1.5, 0.0), (4.2, 2.7, 2.0), (1.1, 2.9, 4.5)] {
            let cam = Camera::new(Vec2::new(x, y), yaw);
            for ray in caster.cast_rays(&cam, &p, &map) {
                assert_ne!(ray.hit, HitKind::Empty);
                assert!(ray.length <= p.max_steps() as f32 * p.precision + 1e-3);
            }
        }
    }

    #[test]
    fn ray_buffer_keeps_its_size() {
        let mut caster = RayCaster::new(10);
        let cam = Camera::new(Vec2::new(1.5, 1.5), 0.0);
        caster.cast_rays(&cam, &params(), &corridor());
        caster.cast_rays(&cam, &params(), &corridor());
        assert_eq!(caster.rays().len(), 10);
    }
}
