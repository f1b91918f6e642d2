use std::{cmp::Ordering, collections::BinaryHeap, ops::Range};

use crate::{
    engine::{RayInfo, SectionTask},
    renderer::{Billboard, GraphicsVars, SharedView},
    world::Texture,
};

/// Max-heap key: the farthest billboard pops first (painter's algorithm).
#[derive(Clone, Copy, Debug)]
pub struct ByDistance(pub Billboard);

impl PartialEq for ByDistance {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for ByDistance {}

impl PartialOrd for ByDistance {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for ByDistance {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.distance.total_cmp(&other.0.distance)
    }
}

/// Billboards worth drawing this frame, keyed for far-to-near popping.
pub fn sprite_queue(billboards: &[Billboard], min_distance: f32) -> BinaryHeap<ByDistance> {
    billboards
        .iter()
        .filter(|b| b.distance.is_finite() && b.distance > min_distance && b.size > 0.0)
        .copied()
        .map(ByDistance)
        .collect()
}

/// The order the sprite pass draws billboards in.
pub fn depth_order(billboards: &[Billboard], min_distance: f32) -> Vec<Billboard> {
    let mut heap = sprite_queue(billboards, min_distance);
    let mut out = Vec::with_capacity(heap.len());
    while let Some(ByDistance(b)) = heap.pop() {
        out.push(b);
    }
    out
}

/// Screen footprint of one billboard, clipped to the view.
#[derive(Clone, Debug, PartialEq)]
pub struct SpriteLayout {
    /// Unclipped left edge and top edge, in pixels.
    pub left: f32,
    pub top: f32,
    /// Texels per screen pixel.
    pub u_step: f32,
    pub v_step: f32,
    /// Clipped half-open pixel ranges.
    pub cols: Range<usize>,
    pub rows: Range<usize>,
}

impl SpriteLayout {
    /// `None` when the sprite falls completely off-screen.
    pub fn new(
        b: &Billboard,
        tex: &Texture,
        view_w: usize,
        view_h: usize,
        vars: &GraphicsVars,
    ) -> Option<Self> {
        let hf = view_h as f32;
        let wall_h = (hf / b.distance) * vars.wall_height_factor;
        let height = wall_h * b.size;
        let width = height * tex.width() as f32 / tex.height() as f32;

        // feet on the floor line at this distance
        let floor_line = (hf + wall_h) * 0.5;
        let top = floor_line - height;
        let left = b.position_on_screen - width * 0.5;

        let x0 = left.max(0.0).floor() as usize;
        let x1 = (left + width).min(view_w as f32).ceil().max(0.0) as usize;
        let y0 = top.max(0.0).floor() as usize;
        let y1 = (top + height).min(hf).ceil().max(0.0) as usize;
        if x0 >= x1.min(view_w) || y0 >= y1.min(view_h) {
            return None;
        }

        Some(Self {
            left,
            top,
            u_step: tex.width() as f32 / width,
            v_step: tex.height() as f32 / height,
            cols: x0..x1.min(view_w),
            rows: y0..y1.min(view_h),
        })
    }

    /// Size of the sprite-local task domain.
    #[inline]
    pub fn columns(&self) -> usize {
        self.cols.len()
    }
}

/// Column pass for one sprite. Section indices are sprite-local:
/// index `i` is screen column `layout.cols.start + i`.
#[derive(Clone)]
pub(crate) struct SpriteTask<'a> {
    pub view: SharedView<'a>,
    pub rays: &'a [RayInfo],
    pub tex: &'a Texture,
    pub layout: SpriteLayout,
    pub distance: f32,
}

impl SectionTask for SpriteTask<'_> {
    fn run(&self, range: Range<usize>) {
        let l = &self.layout;
        for i in range {
            let x = l.cols.start + i;
            // a nearer wall (or the edge of the visible band) hides this column
            if self.distance >= self.rays[x].length {
                continue;
            }
            let tx =
                (((x as f32 + 0.5 - l.left) * l.u_step) as usize).min(self.tex.width() - 1);
            for y in l.rows.clone() {
                let ty =
                    (((y as f32 + 0.5 - l.top) * l.v_step) as usize).min(self.tex.height() - 1);
                let texel = self.tex.texel(tx, ty);
                // binary alpha: partially transparent texels are dropped
                if texel[3] == 255 {
                    // SAFETY: this section owns column `x`.
                    unsafe { self.view.put(x, y, texel) };
                }
            }
        }
    }
}
