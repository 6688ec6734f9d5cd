//! Rendering surfaces.
//!
//! A [`Surface`] is the external drawing target the engine reads pixels
//! from and writes them back to. The engine never owns a surface; it
//! borrows one mutably for the duration of a pass.
//!
//! [`RasterSurface`] is an in-memory implementation backed by an
//! `(height, width, 4)` RGBA array. Hosts with their own drawing targets
//! (a browser canvas, a window framebuffer) implement [`Surface`] directly.

use std::ops::{Deref, DerefMut};

use ndarray::{Array3, ArrayView3};
use tracing::{debug, trace};

use crate::color::{round_channel, Rgba};
use crate::error::{FilterError, FilterResult};

/// Raw RGBA pixels handed out by a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawImage {
    pub width: usize,
    pub height: usize,
    /// `width * height * 4` bytes, row-major RGBA.
    pub data: Vec<u8>,
}

fn rgba_len(width: usize, height: usize) -> FilterResult<usize> {
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or_else(|| FilterError::InvalidDimensions(format!("{width}x{height} overflows")))
}

fn shape_rgba(width: usize, height: usize, data: Vec<u8>) -> FilterResult<Array3<u8>> {
    let expected = rgba_len(width, height)?;
    if data.len() != expected {
        return Err(FilterError::InvalidDimensions(format!(
            "{width}x{height} RGBA needs {expected} bytes, got {}",
            data.len()
        )));
    }
    Array3::from_shape_vec((height, width, 4), data)
        .map_err(|e| FilterError::InvalidDimensions(e.to_string()))
}

/// Capabilities the engine needs from a drawing target.
pub trait Surface {
    /// Copy out the current pixels.
    ///
    /// Fails with [`FilterError::NotARenderableSurface`] when the target
    /// has no pixel storage.
    fn acquire_buffer(&self) -> FilterResult<RawImage>;

    /// Replace the surface's pixels with `data` (same dimensions as the
    /// last acquired buffer).
    fn commit_buffer(&mut self, data: &[u8]) -> FilterResult<()>;

    /// Composite `source` with its top-left corner at `(dx, dy)`, using the
    /// current global alpha as opacity. Pixels falling outside are clipped.
    fn draw_image_at(&mut self, source: &SourceImage, dx: i64, dy: i64) -> FilterResult<()>;

    fn global_alpha(&self) -> f32;

    fn set_global_alpha(&mut self, alpha: f32);

    /// Resize to `width x height`, clearing to transparent black.
    fn resize(&mut self, width: usize, height: usize) -> FilterResult<()>;
}

impl<S: Surface + ?Sized> Surface for &mut S {
    fn acquire_buffer(&self) -> FilterResult<RawImage> {
        (**self).acquire_buffer()
    }

    fn commit_buffer(&mut self, data: &[u8]) -> FilterResult<()> {
        (**self).commit_buffer(data)
    }

    fn draw_image_at(&mut self, source: &SourceImage, dx: i64, dy: i64) -> FilterResult<()> {
        (**self).draw_image_at(source, dx, dy)
    }

    fn global_alpha(&self) -> f32 {
        (**self).global_alpha()
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        (**self).set_global_alpha(alpha)
    }

    fn resize(&mut self, width: usize, height: usize) -> FilterResult<()> {
        (**self).resize(width, height)
    }
}

// ============================================================================
// Source images
// ============================================================================

/// A decoded RGBA image that can be drawn onto a surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    pixels: Array3<u8>,
}

impl SourceImage {
    /// Wrap flat RGBA bytes.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> FilterResult<Self> {
        Ok(SourceImage {
            pixels: shape_rgba(width, height, data)?,
        })
    }

    /// Wrap an `(height, width, 4)` array.
    pub fn from_array(pixels: Array3<u8>) -> FilterResult<Self> {
        if pixels.dim().2 != 4 {
            return Err(FilterError::InvalidDimensions(format!(
                "expected 4 channels, got {}",
                pixels.dim().2
            )));
        }
        Ok(SourceImage {
            pixels: pixels.as_standard_layout().into_owned(),
        })
    }

    pub fn from_raw(raw: RawImage) -> FilterResult<Self> {
        Self::from_rgba(raw.width, raw.height, raw.data)
    }

    pub fn width(&self) -> usize {
        self.pixels.dim().1
    }

    pub fn height(&self) -> usize {
        self.pixels.dim().0
    }

    pub fn view(&self) -> ArrayView3<'_, u8> {
        self.pixels.view()
    }
}

// ============================================================================
// Compositing
// ============================================================================

/// Porter-Duff "over" of `src` onto `dst`, with the source alpha scaled by
/// `opacity`.
#[inline]
pub fn blend_over_u8(dst: &mut [u8; 4], src: [u8; 4], opacity: f32) {
    let src_a = src[3] as f32 / 255.0 * opacity.clamp(0.0, 1.0);
    if src_a <= 0.0 {
        return;
    }

    let dst_a = dst[3] as f32 / 255.0;
    let out_a = src_a + dst_a * (1.0 - src_a);
    if out_a <= 0.0 {
        return;
    }

    for c in 0..3 {
        let v = (src[c] as f32 * src_a + dst[c] as f32 * dst_a * (1.0 - src_a)) / out_a;
        dst[c] = round_channel(v);
    }
    dst[3] = round_channel(out_a * 255.0);
}

// ============================================================================
// RasterSurface
// ============================================================================

/// In-memory surface.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterSurface {
    pixels: Option<Array3<u8>>,
    global_alpha: f32,
}

impl RasterSurface {
    /// Transparent black surface.
    pub fn new(width: usize, height: usize) -> Self {
        RasterSurface {
            pixels: Some(Array3::zeros((height, width, 4))),
            global_alpha: 1.0,
        }
    }

    /// Surface with every pixel set to `px`.
    pub fn filled(width: usize, height: usize, px: [u8; 4]) -> Self {
        let mut pixels = Array3::zeros((height, width, 4));
        for mut p in pixels.lanes_mut(ndarray::Axis(2)) {
            for (c, v) in p.iter_mut().enumerate() {
                *v = px[c];
            }
        }
        RasterSurface {
            pixels: Some(pixels),
            global_alpha: 1.0,
        }
    }

    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> FilterResult<Self> {
        Ok(RasterSurface {
            pixels: Some(shape_rgba(width, height, data)?),
            global_alpha: 1.0,
        })
    }

    pub fn from_array(pixels: Array3<u8>) -> FilterResult<Self> {
        let source = SourceImage::from_array(pixels)?;
        Ok(RasterSurface {
            pixels: Some(source.pixels),
            global_alpha: 1.0,
        })
    }

    /// A surface with no pixel storage; every buffer request fails.
    pub fn unbound() -> Self {
        RasterSurface {
            pixels: None,
            global_alpha: 1.0,
        }
    }

    pub fn is_bound(&self) -> bool {
        self.pixels.is_some()
    }

    pub fn width(&self) -> usize {
        self.pixels.as_ref().map_or(0, |p| p.dim().1)
    }

    pub fn height(&self) -> usize {
        self.pixels.as_ref().map_or(0, |p| p.dim().0)
    }

    pub fn view(&self) -> Option<ArrayView3<'_, u8>> {
        self.pixels.as_ref().map(|p| p.view())
    }

    /// Color at `(x, y)`, if inside the surface.
    pub fn pixel(&self, x: usize, y: usize) -> Option<Rgba> {
        let p = self.pixels.as_ref()?;
        if y >= p.dim().0 || x >= p.dim().1 {
            return None;
        }
        Some(Rgba::from_bytes([p[[y, x, 0]], p[[y, x, 1]], p[[y, x, 2]], p[[y, x, 3]]]))
    }

    /// Flat RGBA bytes (empty when unbound).
    pub fn to_rgba_vec(&self) -> Vec<u8> {
        self.pixels
            .as_ref()
            .map(|p| p.iter().copied().collect())
            .unwrap_or_default()
    }

    pub fn into_array(self) -> Option<Array3<u8>> {
        self.pixels
    }

    fn bound_mut(&mut self) -> FilterResult<&mut Array3<u8>> {
        self.pixels
            .as_mut()
            .ok_or_else(|| FilterError::NotARenderableSurface("surface has no pixel storage".into()))
    }
}

impl Surface for RasterSurface {
    fn acquire_buffer(&self) -> FilterResult<RawImage> {
        let pixels = self
            .pixels
            .as_ref()
            .ok_or_else(|| FilterError::NotARenderableSurface("surface has no pixel storage".into()))?;
        let (height, width, _) = pixels.dim();
        Ok(RawImage {
            width,
            height,
            data: pixels.iter().copied().collect(),
        })
    }

    fn commit_buffer(&mut self, data: &[u8]) -> FilterResult<()> {
        let pixels = self.bound_mut()?;
        let (height, width, _) = pixels.dim();
        *pixels = shape_rgba(width, height, data.to_vec())?;
        trace!(width, height, "commit_buffer");
        Ok(())
    }

    fn draw_image_at(&mut self, source: &SourceImage, dx: i64, dy: i64) -> FilterResult<()> {
        let opacity = self.global_alpha;
        let pixels = self.bound_mut()?;
        let (height, width, _) = pixels.dim();
        let src = source.view();
        trace!(dx, dy, opacity, "draw_image_at");

        for y in 0..source.height() {
            let ty = y as i64 + dy;
            if ty < 0 || ty >= height as i64 {
                continue;
            }
            let ty = ty as usize;
            for x in 0..source.width() {
                let tx = x as i64 + dx;
                if tx < 0 || tx >= width as i64 {
                    continue;
                }
                let tx = tx as usize;

                let s = [src[[y, x, 0]], src[[y, x, 1]], src[[y, x, 2]], src[[y, x, 3]]];
                let mut d = [
                    pixels[[ty, tx, 0]],
                    pixels[[ty, tx, 1]],
                    pixels[[ty, tx, 2]],
                    pixels[[ty, tx, 3]],
                ];
                blend_over_u8(&mut d, s, opacity);
                for (c, v) in d.into_iter().enumerate() {
                    pixels[[ty, tx, c]] = v;
                }
            }
        }
        Ok(())
    }

    fn global_alpha(&self) -> f32 {
        self.global_alpha
    }

    fn set_global_alpha(&mut self, alpha: f32) {
        self.global_alpha = if alpha.is_nan() { 1.0 } else { alpha.clamp(0.0, 1.0) };
    }

    fn resize(&mut self, width: usize, height: usize) -> FilterResult<()> {
        let pixels = self.bound_mut()?;
        debug!(width, height, "Resizing surface");
        *pixels = Array3::zeros((height, width, 4));
        Ok(())
    }
}

// ============================================================================
// Global alpha guard
// ============================================================================

/// Overrides a surface's global alpha and restores it to `1.0` when
/// dropped, including on early return.
pub struct GlobalAlphaGuard<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
}

impl<'s, S: Surface + ?Sized> GlobalAlphaGuard<'s, S> {
    pub fn new(surface: &'s mut S, alpha: f32) -> Self {
        surface.set_global_alpha(alpha);
        GlobalAlphaGuard { surface }
    }
}

impl<S: Surface + ?Sized> Deref for GlobalAlphaGuard<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.surface
    }
}

impl<S: Surface + ?Sized> DerefMut for GlobalAlphaGuard<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.surface
    }
}

impl<S: Surface + ?Sized> Drop for GlobalAlphaGuard<'_, S> {
    fn drop(&mut self) {
        self.surface.set_global_alpha(1.0);
    }
}
