//! Pixel buffer engine.
//!
//! A [`PixelBuffer`] copies the pixels out of a surface, runs filter passes
//! over the copy and commits the result back once per pass. Pixels are
//! visited in parallel, so filters must not depend on visiting order; the
//! index handed to a filter is the pixel's position, not a visit counter.
//!
//! Each committed pass advances the buffer's pass counter. Noise-driven
//! methods are keyed by it, so consecutive `mutate` passes draw fresh
//! offsets instead of repeating the previous ones.
//!
//! A buffer with zero pixels is not operable. Mutating passes on it return
//! `Ok(false)` without touching the surface and histogram queries return
//! `None`.

use std::collections::HashMap;
use std::fmt;

use ndarray::ArrayView3;
use rayon::prelude::*;
use tracing::{debug, trace, warn};

use crate::color::Rgba;
use crate::config::HistogramOptions;
use crate::error::{FilterError, FilterResult};
use crate::filters::method::{ColorMethod, MethodLookup};
use crate::filters::registry::{FilterRegistry, ResolvedFilter};
use crate::filters::Filter;
use crate::surface::{RawImage, Surface};

/// Pixel count of `raw`, checking its byte length without overflowing.
fn checked_pixel_count(raw: &RawImage) -> FilterResult<usize> {
    let length = raw.width.checked_mul(raw.height).ok_or_else(|| {
        FilterError::InvalidDimensions(format!("{}x{} overflows", raw.width, raw.height))
    })?;
    if length.checked_mul(4) != Some(raw.data.len()) {
        return Err(FilterError::InvalidDimensions(format!(
            "{}x{} RGBA needs {} bytes, surface returned {}",
            raw.width,
            raw.height,
            length.saturating_mul(4),
            raw.data.len()
        )));
    }
    Ok(length)
}

/// Working copy of a surface's pixels.
pub struct PixelBuffer<'s, S: Surface + ?Sized> {
    surface: &'s mut S,
    data: Vec<u8>,
    width: usize,
    height: usize,
    length: usize,
    passes: u32,
}

impl<'s, S: Surface + ?Sized> PixelBuffer<'s, S> {
    /// Copy the current pixels out of `surface`.
    pub fn acquire(surface: &'s mut S) -> FilterResult<Self> {
        let raw = surface.acquire_buffer()?;
        let length = checked_pixel_count(&raw)?;
        Ok(PixelBuffer {
            surface,
            data: raw.data,
            width: raw.width,
            height: raw.height,
            length,
            passes: 0,
        })
    }

    /// Start the pass counter at `pass`, continuing an earlier sequence.
    pub fn starting_at_pass(mut self, pass: u32) -> Self {
        self.passes = pass;
        self
    }

    /// Pass counter: the starting pass plus the passes committed since.
    pub fn passes(&self) -> u32 {
        self.passes
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// True when there is at least one pixel to work on.
    pub fn is_operable(&self) -> bool {
        self.length > 0
    }

    /// Raw RGBA bytes of the working copy.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// The working copy as `(height, width, 4)`.
    pub fn view(&self) -> FilterResult<ArrayView3<'_, u8>> {
        ArrayView3::from_shape((self.height, self.width, 4), &self.data)
            .map_err(|e| FilterError::InvalidDimensions(e.to_string()))
    }

    /// Color of pixel `index`.
    pub fn pixel(&self, index: usize) -> Option<Rgba> {
        let start = index.checked_mul(4)?;
        let px = self.data.get(start..start.checked_add(4)?)?;
        Some(Rgba::from_bytes([px[0], px[1], px[2], px[3]]))
    }

    pub fn surface(&self) -> &S {
        self.surface
    }

    /// Give the surface back, dropping the working copy.
    pub fn into_surface(self) -> &'s mut S {
        self.surface
    }

    /// Re-read the surface, discarding the working copy.
    pub fn refresh(&mut self) -> FilterResult<()> {
        let raw = self.surface.acquire_buffer()?;
        let length = checked_pixel_count(&raw)?;
        self.width = raw.width;
        self.height = raw.height;
        self.length = length;
        self.data = raw.data;
        Ok(())
    }

    fn commit(&mut self) -> FilterResult<()> {
        self.surface.commit_buffer(&self.data)
    }

    // ------------------------------------------------------------------------
    // Passes
    // ------------------------------------------------------------------------

    /// Run `filter` over every pixel and commit once.
    ///
    /// Returns `Ok(false)` without committing when the buffer is not
    /// operable.
    pub fn apply_filter<F: Filter + ?Sized>(&mut self, filter: &F) -> FilterResult<bool> {
        if !self.is_operable() {
            trace!("apply_filter on empty buffer skipped");
            return Ok(false);
        }
        debug!(width = self.width, height = self.height, "Applying filter pass");

        self.data
            .par_chunks_exact_mut(4)
            .enumerate()
            .for_each(|(i, px)| {
                let color = Rgba::from_bytes([px[0], px[1], px[2], px[3]]);
                px.copy_from_slice(&filter.apply(i, color).to_bytes());
            });

        self.commit()?;
        self.passes = self.passes.wrapping_add(1);
        Ok(true)
    }

    /// Run a color method over every pixel.
    ///
    /// `mutate` is keyed by the pass counter, so it never repeats the
    /// offsets of an earlier pass on this buffer.
    pub fn apply_method(&mut self, method: ColorMethod) -> FilterResult<bool> {
        method.validate()?;
        let method = method.advanced_by(self.passes);
        trace!(method = method.name(), pass = self.passes, "apply_method");
        self.apply_filter(&method)
    }

    /// Resolve `name` to a color method and run it.
    ///
    /// With [`MethodLookup::Lenient`] an unknown name skips the pass and
    /// returns `Ok(false)`; with [`MethodLookup::Strict`] it is an error.
    /// Bad arguments for a known name are always an error.
    pub fn apply_method_named(
        &mut self,
        name: &str,
        args: &[f32],
        lookup: MethodLookup,
    ) -> FilterResult<bool> {
        match ColorMethod::from_name(name, args) {
            Ok(method) => self.apply_method(method),
            Err(err) => skip_unknown(err, lookup),
        }
    }

    /// Resolve `name` through `registry` (built-ins first, then custom
    /// filters) and run it.
    pub fn apply_registered(
        &mut self,
        registry: &FilterRegistry,
        name: &str,
        args: &[f32],
        lookup: MethodLookup,
    ) -> FilterResult<bool> {
        match registry.resolve(name, args) {
            Ok(ResolvedFilter::Builtin(method)) => self.apply_method(method),
            Ok(filter) => self.apply_filter(&filter),
            Err(err) => skip_unknown(err, lookup),
        }
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    /// Count pixels per color.
    ///
    /// Keys are `#rrggbb` when `options.use_hex` is set (alpha variants
    /// merge), otherwise the full `rgba(...)` identifier. Entries below a
    /// positive `minimum_count` are dropped. Returns `None` when the buffer
    /// is not operable.
    pub fn color_histogram(&self, options: HistogramOptions) -> Option<Histogram> {
        if !self.is_operable() {
            return None;
        }
        trace!(use_hex = options.use_hex, "color_histogram");

        let by_pixel: HashMap<[u8; 4], u32> = self
            .data
            .par_chunks_exact(4)
            .fold(HashMap::new, |mut map, px| {
                *map.entry([px[0], px[1], px[2], px[3]]).or_insert(0) += 1;
                map
            })
            .reduce(HashMap::new, |mut a, b| {
                for (px, n) in b {
                    *a.entry(px).or_insert(0) += n;
                }
                a
            });

        let mut counts: HashMap<String, u32> = HashMap::with_capacity(by_pixel.len());
        for (px, n) in by_pixel {
            let color = Rgba::from_bytes(px);
            let key = if options.use_hex {
                color.to_hex()
            } else {
                color.to_string()
            };
            *counts.entry(key).or_insert(0) += n;
        }

        if let Some(min) = options.threshold() {
            counts.retain(|_, n| *n >= min);
        }

        Some(Histogram {
            counts,
            use_hex: options.use_hex,
        })
    }
}

fn skip_unknown(err: FilterError, lookup: MethodLookup) -> FilterResult<bool> {
    match (err, lookup) {
        (FilterError::UnknownFilterMethod(name), MethodLookup::Lenient) => {
            warn!(name = %name, "Unknown filter method, pass skipped");
            Ok(false)
        }
        (err, _) => Err(err),
    }
}

impl<S: Surface + ?Sized> fmt::Debug for PixelBuffer<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("length", &self.length)
            .field("passes", &self.passes)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Histogram
// ============================================================================

/// Color occurrence counts from one buffer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Histogram {
    counts: HashMap<String, u32>,
    use_hex: bool,
}

impl Histogram {
    pub fn get(&self, key: &str) -> Option<u32> {
        self.counts.get(key).copied()
    }

    /// Count for `color` under this histogram's key mode.
    pub fn count_of(&self, color: Rgba) -> u32 {
        let key = if self.use_hex {
            color.to_hex()
        } else {
            color.to_string()
        };
        self.get(&key).unwrap_or(0)
    }

    /// Number of distinct colors.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().map(|&n| n as u64).sum()
    }

    pub fn uses_hex(&self) -> bool {
        self.use_hex
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.counts.iter().map(|(k, &n)| (k.as_str(), n))
    }

    /// The `n` most frequent colors, ties broken by key.
    pub fn most_common(&self, n: usize) -> Vec<(&str, u32)> {
        let mut entries: Vec<(&str, u32)> = self.iter().collect();
        entries.sort_unstable_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        entries.truncate(n);
        entries
    }

    pub fn into_inner(self) -> HashMap<String, u32> {
        self.counts
    }
}
