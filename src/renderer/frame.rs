//! The RGBA pixel buffer every render pass writes into.
//!
//! Within one batch, sections write disjoint pixel sets (whole columns for
//! walls and sprites, whole rows for the background), so the buffer is shared
//! between threads through [`SharedView`] without any lock.

use std::marker::PhantomData;

use crate::renderer::Rgba;

/// Owned `width * height * 4` byte RGBA buffer, allocated once.
#[derive(Clone, Debug, PartialEq)]
pub struct GameView {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl GameView {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width * height * 4],
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn clear(&mut self, rgba: [u8; 4]) {
        for px in self.pixels.chunks_exact_mut(4) {
            px.copy_from_slice(&rgba);
        }
    }

    /// Read one pixel. Panics outside the buffer.
    #[inline]
    pub fn get(&self, x: usize, y: usize) -> [u8; 4] {
        let i = self.index(x, y);
        [
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ]
    }

    /// Sequential write. Panics outside the buffer.
    #[inline]
    pub fn put(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        let i = self.index(x, y);
        self.pixels[i..i + 4].copy_from_slice(&rgba);
    }

    /// Write, silently clipping to the buffer (overlay primitives).
    #[inline]
    pub fn put_clipped(&mut self, x: i32, y: i32, rgba: [u8; 4]) {
        if x >= 0 && y >= 0 && (x as usize) < self.width && (y as usize) < self.height {
            self.put(x as usize, y as usize, rgba);
        }
    }

    /// Lock-free writer for one parallel batch.
    pub(crate) fn shared(&mut self) -> SharedView<'_> {
        SharedView {
            ptr: self.pixels.as_mut_ptr(),
            width: self.width,
            height: self.height,
            _buf: PhantomData,
        }
    }

    /// Composite over black into `0x00RRGGBB`; alpha acts as distance fog.
    pub fn to_argb(&self, dst: &mut [Rgba]) {
        assert_eq!(dst.len(), self.width * self.height, "destination size mismatch");
        for (out, px) in dst.iter_mut().zip(self.pixels.chunks_exact(4)) {
            let a = px[3] as u32;
            let r = px[0] as u32 * a / 255;
            let g = px[1] as u32 * a / 255;
            let b = px[2] as u32 * a / 255;
            *out = (r << 16) | (g << 8) | b;
        }
    }

    #[inline]
    fn index(&self, x: usize, y: usize) -> usize {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} view",
            self.width,
            self.height
        );
        (y * self.width + x) * 4
    }
}

/// Shared, unsynchronised view of a [`GameView`] for the duration of one batch.
#[derive(Clone, Copy)]
pub(crate) struct SharedView<'a> {
    ptr: *mut u8,
    width: usize,
    height: usize,
    _buf: PhantomData<&'a mut [u8]>,
}

// SAFETY: writers only go through `put`, whose contract forbids two threads
// touching the same pixel within one batch.
unsafe impl Send for SharedView<'_> {}
unsafe impl Sync for SharedView<'_> {}

impl SharedView<'_> {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    /// Store one pixel. Panics outside the buffer.
    ///
    /// # Safety
    /// No other thread may read or write pixel `(x, y)` during the current
    /// batch. Sections satisfy this by owning disjoint columns or rows.
    #[inline]
    pub unsafe fn put(&self, x: usize, y: usize, rgba: [u8; 4]) {
        assert!(
            x < self.width && y < self.height,
            "pixel ({x}, {y}) outside {}x{} view",
            self.width,
            self.height
        );
        let i = (y * self.width + x) * 4;
        // SAFETY: in bounds (checked above), exclusive per caller contract.
        unsafe {
            std::ptr::copy_nonoverlapping(rgba.as_ptr(), self.ptr.add(i), 4);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn put_and_get() {
        let mut view = GameView::new(4, 3);
        view.put(3, 2, [1, 2, 3, 4]);
        assert_eq!(view.get(3, 2), [1, 2, 3, 4]);
        assert_eq!(&view.pixels()[(2 * 4 + 3) * 4..][..4], &[1, 2, 3, 4]);
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn out_of_range_write_panics() {
        GameView::new(4, 3).put(4, 0, [0; 4]);
    }

    #[test]
    fn shared_writes_land_in_buffer() {
        let mut view = GameView::new(2, 2);
        {
            let shared = view.shared();
            // SAFETY: single thread.
            unsafe { shared.put(1, 1, [9, 9, 9, 255]) };
        }
        assert_eq!(view.get(1, 1), [9, 9, 9, 255]);
    }

    #[test]
    fn argb_applies_alpha_fog() {
        let mut view = GameView::new(2, 1);
        view.put(0, 0, [255, 128, 0, 255]);
        view.put(1, 0, [200, 200, 200, 0]);
        let mut out = vec![0; 2];
        view.to_argb(&mut out);
        assert_eq!(out, vec![0x00FF_8000, 0]);
    }

    #[test]
    fn clipped_put_ignores_outside() {
        let mut view = GameView::new(2, 2);
        view.put_clipped(-1, 0, [1; 4]);
        view.put_clipped(0, 5, [1; 4]);
        assert!(view.pixels().iter().all(|&b| b == 0));
    }
}
