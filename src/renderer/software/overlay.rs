//! Top-down overlays drawn after the 3D view: the full map, the minimap
//! and its markers, rays and path.
//!
//! Everything here runs on the calling thread and writes opaque pixels,
//! clipped to the view. Map `y` grows upwards, screen `y` downwards, so
//! every map-to-screen transform flips it.

use glam::Vec2;

use crate::{
    renderer::software::Software,
    world::{Camera, Cell, GameMap},
};

const WALL: [u8; 4] = [170, 80, 50, 255];
const BOUNDARY: [u8; 4] = [110, 110, 140, 255];
const FLOOR: [u8; 4] = [25, 25, 25, 255];
const GOAL: [u8; 4] = [240, 200, 40, 255];
const PATH: [u8; 4] = [40, 200, 90, 255];
const RAY: [u8; 4] = [230, 230, 120, 255];
const PLAYER: [u8; 4] = [230, 60, 60, 255];

/// Someone to show on the map: a position and a heading.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MapMarker {
    pub pos: Vec2,
    pub yaw: f32,
    pub color: [u8; 4],
}

/// Map-to-screen transform for one overlay.
#[derive(Clone, Copy, Debug)]
struct MapFrame {
    ox: f32,
    oy: f32,
    cell: f32,
    map_h: f32,
}

impl MapFrame {
    /// Pinned to the top-left corner at a fixed cell size.
    fn minimap(map: &GameMap, cell: usize) -> Self {
        Self {
            ox: 0.0,
            oy: 0.0,
            cell: cell.max(1) as f32,
            map_h: map.height() as f32,
        }
    }

    /// As large as fits, centred.
    fn fullscreen(map: &GameMap, w: usize, h: usize) -> Self {
        let cell = (w / map.width()).min(h / map.height()).max(1) as f32;
        Self {
            ox: ((w as f32 - cell * map.width() as f32) * 0.5).max(0.0).floor(),
            oy: ((h as f32 - cell * map.height() as f32) * 0.5).max(0.0).floor(),
            cell,
            map_h: map.height() as f32,
        }
    }

    #[inline]
    fn to_screen(self, p: Vec2) -> (i32, i32) {
        (
            (self.ox + p.x * self.cell).floor() as i32,
            (self.oy + (self.map_h - p.y) * self.cell).floor() as i32,
        )
    }

    /// Top-left corner and size of cell `(x, y)`.
    #[inline]
    fn cell_rect(self, x: usize, y: usize) -> (i32, i32, i32) {
        let (sx, sy) = self.to_screen(Vec2::new(x as f32, (y + 1) as f32));
        (sx, sy, self.cell as i32)
    }
}

fn cell_color(cell: Cell) -> [u8; 4] {
    match cell {
        Cell::Wall => WALL,
        Cell::Boundary => BOUNDARY,
        Cell::Empty => FLOOR,
        Cell::Goal => GOAL,
    }
}

impl Software {
    /// Full-screen map with the route and the player (paused / tab view).
    pub fn draw_map(&mut self, map: &GameMap, camera: &Camera, path: &[(usize, usize)]) {
        let frame = MapFrame::fullscreen(map, self.view.width(), self.view.height());
        self.view.clear([0, 0, 0, 255]);
        self.draw_cells(map, frame);
        self.draw_path(frame, path);
        self.draw_marker(
            frame,
            &MapMarker {
                pos: camera.pos,
                yaw: camera.yaw,
                color: PLAYER,
            },
        );
    }

    /// Cell grid in the top-left corner.
    pub fn draw_minimap_background(&mut self, map: &GameMap) {
        let frame = MapFrame::minimap(map, self.vars.minimap_cell);
        self.draw_cells(map, frame);
    }

    /// Direction triangles for the player and entities.
    pub fn draw_minimap_triangles(&mut self, map: &GameMap, markers: &[MapMarker]) {
        let frame = MapFrame::minimap(map, self.vars.minimap_cell);
        for m in markers {
            self.draw_marker(frame, m);
        }
    }

    /// Fan of the last cast, from the camera to every hit point.
    pub fn draw_minimap_rays(&mut self, map: &GameMap, camera: &Camera) {
        let frame = MapFrame::minimap(map, self.vars.minimap_cell);
        let (x0, y0) = frame.to_screen(camera.pos);
        // every ray shares the origin, a handful is enough to read the fan
        let stride = (self.caster.rays().len() / 32).max(1);
        let ends: Vec<(i32, i32)> = self
            .caster
            .rays()
            .iter()
            .step_by(stride)
            .map(|r| frame.to_screen(camera.pos + r.hit_pos))
            .collect();
        for (x1, y1) in ends {
            self.draw_line(x0, y0, x1, y1, RAY);
        }
    }

    /// Highlight the cells of a route on the minimap.
    pub fn draw_path_out(&mut self, map: &GameMap, path: &[(usize, usize)]) {
        let frame = MapFrame::minimap(map, self.vars.minimap_cell);
        self.draw_path(frame, path);
    }

    /*──────────────────────── primitives ───────────────────────*/

    fn draw_cells(&mut self, map: &GameMap, frame: MapFrame) {
        for y in 0..map.height() {
            for x in 0..map.width() {
                let Some(cell) = map.cell(x as i64, y as i64) else {
                    continue;
                };
                let (sx, sy, size) = frame.cell_rect(x, y);
                self.fill_rect(sx, sy, size, size, cell_color(cell));
            }
        }
    }

    fn draw_path(&mut self, frame: MapFrame, path: &[(usize, usize)]) {
        for &(x, y) in path {
            let (sx, sy, size) = frame.cell_rect(x, y);
            // inset so the grid stays readable
            let pad = (size / 4).max(if size > 2 { 1 } else { 0 });
            self.fill_rect(sx + pad, sy + pad, size - 2 * pad, size - 2 * pad, PATH);
        }
    }

    fn draw_marker(&mut self, frame: MapFrame, m: &MapMarker) {
        let f = Vec2::from_angle(m.yaw);
        let r = f.perp() * 0.3;
        let tip = frame.to_screen(m.pos + f * 0.6);
        let left = frame.to_screen(m.pos - f * 0.3 + r);
        let right = frame.to_screen(m.pos - f * 0.3 - r);
        self.fill_triangle(tip, left, right, m.color);
    }

    fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, rgba: [u8; 4]) {
        for py in y..y + h {
            for px in x..x + w {
                self.view.put_clipped(px, py, rgba);
            }
        }
    }

    /// Bresenham, all octants.
    fn draw_line(&mut self, mut x0: i32, mut y0: i32, x1: i32, y1: i32, rgba: [u8; 4]) {
        let dx = (x1 - x0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let dy = -(y1 - y0).abs();
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.view.put_clipped(x0, y0, rgba);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// Edge-function fill over the bounding box; winding-agnostic.
    fn fill_triangle(&mut self, a: (i32, i32), b: (i32, i32), c: (i32, i32), rgba: [u8; 4]) {
        fn edge(p: (i32, i32), q: (i32, i32), r: (i32, i32)) -> i64 {
            (q.0 - p.0) as i64 * (r.1 - p.1) as i64 - (q.1 - p.1) as i64 * (r.0 - p.0) as i64
        }
        let area = edge(a, b, c);
        if area == 0 {
            self.draw_line(a.0, a.1, b.0, b.1, rgba);
            self.draw_line(b.0, b.1, c.0, c.1, rgba);
            return;
        }
        let w = self.view.width() as i32;
        let h = self.view.height() as i32;
        let x0 = a.0.min(b.0).min(c.0).max(0);
        let x1 = a.0.max(b.0).max(c.0).min(w - 1);
        let y0 = a.1.min(b.1).min(c.1).max(0);
        let y1 = a.1.max(b.1).max(c.1).min(h - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = (x, y);
                let (e0, e1, e2) = (edge(b, c, p), edge(c, a, p), edge(a, b, p));
                let inside = if area > 0 {
                    e0 >= 0 && e1 >= 0 && e2 >= 0
                } else {
                    e0 <= 0 && e1 <= 0 && e2 <= 0
                };
                if inside {
                    self.view.put(x as usize, y as usize, rgba);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        renderer::GraphicsVars,
        world::{GameTextures, SpriteBank},
    };

    fn software(w: usize, h: usize) -> Software {
        let vars = GraphicsVars {
            minimap_cell: 4,
            ..GraphicsVars::default()
        };
        Software::new(w, h, 1, GameTextures::builtin(), SpriteBank::new(), vars)
    }

    fn corner_map() -> GameMap {
        // (0, 0) is a goal; row 0 is drawn at the bottom
        GameMap::from_rows(&["g  ", "   ", "  w"]).unwrap()
    }

    #[test]
    fn minimap_flips_rows() {
        let mut s = software(32, 32);
        s.draw_minimap_background(&corner_map());
        // map (0, 0) → screen rows 8..12, map (2, 2) → screen rows 0..4
        assert_eq!(s.view().get(1, 9), GOAL);
        assert_eq!(s.view().get(9, 1), WALL);
        assert_eq!(s.view().get(5, 5), FLOOR);
    }

    #[test]
    fn minimap_clips_to_the_view() {
        let mut s = software(6, 6);
        s.draw_minimap_background(&GameMap::bordered(10, 10));
        assert_eq!(s.view().get(0, 0), BOUNDARY);
    }

    #[test]
    fn path_is_inset_inside_its_cell() {
        let mut s = software(32, 32);
        let map = corner_map();
        s.draw_minimap_background(&map);
        s.draw_path_out(&map, &[(1, 1)]);
        // cell (1, 1) spans screen x 4..8, y 4..8
        assert_eq!(s.view().get(5, 5), PATH);
        assert_eq!(s.view().get(4, 4), FLOOR);
    }

    #[test]
    fn marker_triangle_covers_its_position() {
        let mut s = software(32, 32);
        let map = GameMap::bordered(4, 4);
        let m = MapMarker {
            pos: Vec2::new(2.0, 2.0),
            yaw: 0.0,
            color: [1, 2, 3, 255],
        };
        s.draw_minimap_triangles(&map, &[m]);
        // (2, 2) → screen (8, 8)
        assert_eq!(s.view().get(8, 8), [1, 2, 3, 255]);
    }

    #[test]
    fn rays_start_at_the_camera() {
        let mut s = software(40, 40);
        let map = GameMap::bordered(8, 8);
        let cam = Camera::new(Vec2::new(4.5, 4.5), 0.0);
        s.cast_rays(&cam, &crate::world::CameraParams::default(), &map);
        s.draw_minimap_rays(&map, &cam);
        // (4.5, 4.5) → screen (18, 14)
        assert_eq!(s.view().get(18, 14), RAY);
    }

    #[test]
    fn full_map_is_centred_with_the_player() {
        let mut s = software(40, 20);
        let map = GameMap::bordered(4, 4);
        let cam = Camera::new(Vec2::new(2.0, 2.0), 0.0);
        s.draw_map(&map, &cam, &[]);
        // cell size 5, map 20x20 centred: x 10..30
        assert_eq!(s.view().get(5, 10), [0, 0, 0, 255]);
        assert_eq!(s.view().get(11, 1), BOUNDARY);
        assert_eq!(s.view().get(20, 10), PLAYER);
    }
}
