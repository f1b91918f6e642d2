use std::ops::Range;

use glam::Vec2;

use crate::{
    engine::{HitKind, RayInfo, SectionTask, Side, column_dir},
    renderer::{
        GraphicsVars, SharedView,
        software::{fog_alpha, row_distance},
    },
    world::{Camera, CameraParams, GameTextures, Texture},
};

/// Column pass: textured walls, plus floor/ceiling when not in linear mode.
#[derive(Clone, Copy)]
pub(crate) struct ViewTask<'a> {
    pub view: SharedView<'a>,
    pub rays: &'a [RayInfo],
    pub textures: &'a GameTextures,
    pub camera: Camera,
    pub params: CameraParams,
    pub vars: GraphicsVars,
    pub linear: bool,
}

impl SectionTask for ViewTask<'_> {
    fn run(&self, range: Range<usize>) {
        for col in range {
            self.draw_column(col);
        }
    }
}

impl ViewTask<'_> {
    fn wall_texture(&self, hit: HitKind) -> Option<&Texture> {
        match hit {
            HitKind::Wall => Some(&self.textures.wall),
            HitKind::Boundary => Some(&self.textures.boundary),
            HitKind::Empty | HitKind::OutOfBounds => None,
        }
    }

    fn draw_column(&self, col: usize) {
        let ray = &self.rays[col];
        let h = self.view.height();
        let hf = h as f32;

        let tex = self.wall_texture(ray.hit);
        // nothing solid in this column: the band collapses onto the horizon
        let wall_h = match tex {
            Some(_) => (hf / ray.length.max(f32::EPSILON)) * self.vars.wall_height_factor,
            None => 0.0,
        };
        let floor_height = (hf - wall_h) * 0.5; // first row of the wall band
        let band_top = floor_height.max(0.0) as usize;
        let band_bot = ((floor_height + wall_h).min(hf) as usize).max(band_top);

        if let Some(tex) = tex {
            let tex_x =
                ((wall_u(ray, self.camera.pos) * tex.width() as f32) as usize).min(tex.width() - 1);
            let alpha = fog_alpha(ray.length, self.vars.max_sight_depth);
            let v_step = tex.height() as f32 / wall_h;
            let mut v = (band_top as f32 - floor_height) * v_step;

            for y in band_top..band_bot {
                if v as usize >= tex.height() {
                    v = 0.0;
                }
                let [r, g, b, _] = tex.texel(tex_x, v as usize);
                // SAFETY: this section owns column `col`.
                unsafe { self.view.put(col, y, [r, g, b, alpha]) };
                v += v_step;
            }
        }

        if self.linear {
            return;
        }

        // inverse projection along this column's ray
        let dir = column_dir(&self.camera, col, self.rays.len(), self.params.fov);
        for y in (0..band_top).chain(band_bot..h) {
            let dist = row_distance(y, h, self.vars.wall_height_factor);
            let p = self.camera.pos + dir * dist;
            let tex = if y < band_top {
                &self.textures.ceiling
            } else {
                &self.textures.floor
            };
            let [r, g, b, _] = tex.sample_wrapped(p.x, p.y);
            // SAFETY: this section owns column `col`.
            unsafe { self.view.put(col, y, [r, g, b, 255]) };
        }
    }
}

/// Horizontal texture coordinate of a wall hit, in `[0, 1)`.
///
/// The coordinate runs along the wall face; it is mirrored when the face is
/// seen from the side that would otherwise show the texture flipped.
pub(crate) fn wall_u(ray: &RayInfo, origin: Vec2) -> f32 {
    let hit = origin + ray.hit_pos;
    let (u, mirror) = match ray.last_side {
        Side::Vertical => (hit.y.rem_euclid(1.0), ray.hit_pos.x > 0.0),
        Side::Horizontal | Side::Unknown => (hit.x.rem_euclid(1.0), ray.hit_pos.y < 0.0),
    };
    if mirror { 1.0 - u } else { u }
}
