use std::{f32::consts::TAU, ops::Range};

use crate::{
    engine::SectionTask,
    renderer::{
        GraphicsVars, SharedView,
        software::{fog_alpha, row_distance},
    },
    world::{Camera, CameraParams, GameTextures, Texture},
};

/// Row pass for linear mode: floor below the horizon, ceiling or sky above.
///
/// World positions are interpolated across each row between the leftmost
/// (`forward - half_plane`) and rightmost (`forward + half_plane`) rays, so
/// there is no trigonometry per pixel.
#[derive(Clone, Copy)]
pub(crate) struct BackgroundTask<'a> {
    pub view: SharedView<'a>,
    pub textures: &'a GameTextures,
    pub camera: Camera,
    pub params: CameraParams,
    pub vars: GraphicsVars,
    pub sky: bool,
}

impl SectionTask for BackgroundTask<'_> {
    fn run(&self, range: Range<usize>) {
        let horizon = self.view.height() as f32 * 0.5;
        for y in range {
            if y as f32 + 0.5 > horizon {
                self.draw_plane_row(y, &self.textures.floor);
            } else if self.sky {
                self.draw_sky_row(y, horizon);
            } else {
                self.draw_plane_row(y, &self.textures.ceiling);
            }
        }
    }
}

impl BackgroundTask<'_> {
    fn draw_plane_row(&self, y: usize, tex: &Texture) {
        let w = self.view.width();
        let dist = row_distance(y, self.view.height(), self.vars.wall_height_factor);
        let alpha = fog_alpha(dist, self.vars.max_sight_depth);

        let fwd = self.camera.forward();
        let half_plane = self.camera.half_plane(self.params.fov);
        let left = fwd - half_plane;
        let right = fwd + half_plane;

        let step = (right - left) * (dist / w as f32);
        let mut p = self.camera.pos + left * dist + step * 0.5;

        for x in 0..w {
            let [r, g, b, _] = tex.sample_wrapped(p.x, p.y);
            // SAFETY: this section owns row `y`.
            unsafe { self.view.put(x, y, [r, g, b, alpha]) };
            p += step;
        }
    }

    fn draw_sky_row(&self, y: usize, horizon: f32) {
        let sky = &self.textures.sky;
        let w = self.view.width();
        let ty = ((y as f32 / horizon * sky.height() as f32) as usize).min(sky.height() - 1);

        // leftmost column looks at yaw + fov/2; turning left scrolls the sky right
        let turns = self.vars.sky_turns;
        let u0 = -(self.camera.yaw + self.params.fov * 0.5) / TAU * turns;
        let du = self.params.fov / (w.max(2) - 1) as f32 / TAU * turns;

        for x in 0..w {
            let u = (u0 + du * x as f32).rem_euclid(1.0);
            let tx = ((u * sky.width() as f32) as usize).min(sky.width() - 1);
            let [r, g, b, _] = sky.texel(tx, ty);
            // SAFETY: this section owns row `y`.
            unsafe { self.view.put(x, y, [r, g, b, 255]) };
        }
    }
}
