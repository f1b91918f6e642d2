use crate::{
    engine::{RayCaster, RayInfo, SectionFactory, WorkerPool},
    renderer::{
        Billboard, FrameFlags, GameView, GraphicsVars, RenderError, Renderer, Rgba,
        software::{BackgroundTask, SpriteLayout, SpriteTask, ViewTask, sprite_queue},
    },
    world::{Camera, CameraParams, GameMap, GameTextures, SpriteBank},
};

/// Opaque black: what is left where no pass writes.
const CLEAR: [u8; 4] = [0, 0, 0, 255];

pub struct Software {
    pub(super) view: GameView,
    argb: Vec<Rgba>,
    pub(super) caster: RayCaster,
    pool: WorkerPool,
    textures: GameTextures,
    sprites: SpriteBank,
    pub vars: GraphicsVars,
}

impl Software {
    /// `threads == 0` sizes the pool to the machine.
    pub fn new(
        width: usize,
        height: usize,
        threads: usize,
        textures: GameTextures,
        sprites: SpriteBank,
        vars: GraphicsVars,
    ) -> Self {
        let pool = WorkerPool::new(threads);
        log::info!(
            "software renderer {width}x{height}, {} sections per pass",
            pool.worker_count()
        );
        Self {
            view: GameView::new(width, height),
            argb: vec![0; width * height],
            caster: RayCaster::new(width),
            pool,
            textures,
            sprites,
            vars,
        }
    }

    #[inline]
    pub fn view(&self) -> &GameView {
        &self.view
    }

    /// Rays of the last cast, one per screen column.
    #[inline]
    pub fn rays(&self) -> &[RayInfo] {
        self.caster.rays()
    }

    #[inline]
    pub fn worker_count(&self) -> usize {
        self.pool.worker_count()
    }

    pub fn cast_rays(&mut self, camera: &Camera, params: &CameraParams, map: &GameMap) {
        self.caster.cast_rays(camera, params, map);
    }

    /// Row pass: floor plus ceiling or sky. One section per worker.
    pub fn draw_background(
        &mut self,
        sky: bool,
        camera: &Camera,
        params: &CameraParams,
    ) -> Result<(), RenderError> {
        let mut factory = SectionFactory::new(self.view.height(), self.pool.worker_count())?;
        factory.set_target(BackgroundTask {
            view: self.view.shared(),
            textures: &self.textures,
            camera: *camera,
            params: *params,
            vars: self.vars,
            sky,
        });
        self.pool.dispatch(&factory)?;
        Ok(())
    }

    /// Column pass over the current rays.
    pub fn draw_walls(
        &mut self,
        linear: bool,
        camera: &Camera,
        params: &CameraParams,
    ) -> Result<(), RenderError> {
        let mut factory = SectionFactory::new(self.view.width(), self.pool.worker_count())?;
        factory.set_target(ViewTask {
            view: self.view.shared(),
            rays: self.caster.rays(),
            textures: &self.textures,
            camera: *camera,
            params: *params,
            vars: self.vars,
            linear,
        });
        self.pool.dispatch(&factory)?;
        Ok(())
    }

    /// Painter's pass, far to near. Each sprite is its own batch over the
    /// columns it covers, so nearer sprites always land on top.
    pub fn draw_sprites(&mut self, billboards: &[Billboard]) -> Result<(), RenderError> {
        let mut queue = sprite_queue(billboards, self.vars.min_sprite_distance);
        if queue.is_empty() {
            return Ok(());
        }
        let (w, h) = (self.view.width(), self.view.height());
        let view = self.view.shared();
        let mut factory = SectionFactory::new(0, self.pool.worker_count())?;

        while let Some(entry) = queue.pop() {
            let b = entry.0;
            let tex = self.sprites.get(b.id)?;
            let Some(layout) = SpriteLayout::new(&b, tex, w, h, &self.vars) else {
                continue;
            };
            factory.set_task_number(layout.columns());
            factory.set_target(SpriteTask {
                view,
                rays: self.caster.rays(),
                tex,
                layout,
                distance: b.distance,
            });
            self.pool.dispatch(&factory)?;
        }
        Ok(())
    }
}

impl Renderer for Software {
    fn begin_frame(&mut self) {
        self.view.clear(CLEAR);
    }

    fn draw_view(
        &mut self,
        flags: FrameFlags,
        camera: &Camera,
        params: &CameraParams,
        map: &GameMap,
        billboards: &[Billboard],
    ) -> Result<(), RenderError> {
        let linear = flags.contains(FrameFlags::LINEAR);
        self.cast_rays(camera, params, map);
        if linear {
            self.draw_background(flags.contains(FrameFlags::SKY), camera, params)?;
        }
        self.draw_walls(linear, camera, params)?;
        self.draw_sprites(billboards)
    }

    fn end_frame<F>(&mut self, submit: F)
    where
        F: FnOnce(&[Rgba], usize, usize),
    {
        self.view.to_argb(&mut self.argb);
        submit(&self.argb, self.view.width(), self.view.height());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{engine::HitKind, world::Texture};
    use glam::Vec2;

    fn renderer(threads: usize) -> Software {
        let mut sprites = SpriteBank::new();
        sprites
            .insert(7, Texture::solid(4, 4, [255, 255, 0, 255]))
            .unwrap();
        Software::new(
            48,
            32,
            threads,
            GameTextures::builtin(),
            sprites,
            GraphicsVars::default(),
        )
    }

    fn room() -> GameMap {
        GameMap::from_rows(&[
            "bbbbbbbbbb",
            "b        b",
            "b  w     b",
            "b        b",
            "bbbbbbbbbb",
        ])
        .unwrap()
    }

    fn frame(r: &mut Software, flags: FrameFlags, billboards: &[Billboard]) -> Vec<Rgba> {
        let cam = Camera::new(Vec2::new(1.5, 1.5), 0.3);
        r.begin_frame();
        r.draw_view(flags, &cam, &CameraParams::default(), &room(), billboards)
            .unwrap();
        let mut out = Vec::new();
        r.end_frame(|px, w, h| {
            assert_eq!(px.len(), w * h);
            out.extend_from_slice(px);
        });
        out
    }

    #[test]
    fn every_ray_hits_inside_a_closed_room() {
        let mut r = renderer(2);
        frame(&mut r, FrameFlags::LINEAR, &[]);
        assert_eq!(r.rays().len(), 48);
        assert!(r.rays().iter().all(|ray| ray.hit != HitKind::Empty));
    }

    #[test]
    fn worker_count_does_not_change_the_frame() {
        let flags = FrameFlags::LINEAR | FrameFlags::SKY;
        let a = frame(&mut renderer(1), flags, &[]);
        let b = frame(&mut renderer(3), flags, &[]);
        assert_eq!(a, b);
    }

    #[test]
    fn sprites_skip_fog() {
        let b = Billboard {
            id: 7,
            distance: 1.0,
            position_on_screen: 24.0,
            size: 0.5,
        };
        let px = frame(&mut renderer(2), FrameFlags::empty(), &[b]);
        assert!(px.contains(&0x00_FF_FF_00));
        let px = frame(&mut renderer(2), FrameFlags::empty(), &[]);
        assert!(!px.contains(&0x00_FF_FF_00));
    }

    #[test]
    fn unknown_sprite_is_an_error() {
        let mut r = renderer(1);
        let b = Billboard {
            id: 99,
            distance: 2.0,
            position_on_screen: 24.0,
            size: 1.0,
        };
        r.begin_frame();
        let err = r
            .draw_view(
                FrameFlags::LINEAR,
                &Camera::new(Vec2::new(1.5, 1.5), 0.0),
                &CameraParams::default(),
                &room(),
                &[b],
            )
            .unwrap_err();
        assert!(matches!(err, RenderError::Texture(_)));
    }
}
