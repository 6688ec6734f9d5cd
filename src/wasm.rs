//! WebAssembly exports for canvasfx filters.
//!
//! These functions are exposed to JavaScript via wasm-bindgen. Each takes
//! the flat RGBA bytes of an `ImageData` plus its dimensions and returns a
//! new byte vector of the same size, ready to be put back on the canvas.
//! Dimension mismatches and bad arguments surface as a thrown `Error`.

use wasm_bindgen::prelude::*;

use crate::canvas::Canvas;
use crate::config::{BlurOptions, HistogramOptions, NoiseOptions};
use crate::error::{FilterError, FilterResult};
use crate::filters::SeededNoise;
use crate::surface::RasterSurface;

fn to_js(err: FilterError) -> JsError {
    JsError::new(&err.to_string())
}

fn run(
    data: &[u8],
    width: usize,
    height: usize,
    effect: impl FnOnce(&mut Canvas<RasterSurface>) -> FilterResult<bool>,
) -> Result<Vec<u8>, JsError> {
    let surface = RasterSurface::from_rgba(width, height, data.to_vec()).map_err(to_js)?;
    let mut canvas = Canvas::new(surface).map_err(to_js)?;
    effect(&mut canvas).map_err(to_js)?;
    Ok(canvas.into_surface().to_rgba_vec())
}

// ============================================================================
// Color Filters
// ============================================================================

/// Invert RGB channels; alpha preserved.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// Flat array of RGBA bytes with inverted colors
#[wasm_bindgen]
pub fn invert_rgba_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.invert())
}

/// Rotate every pixel's hue by 180 degrees.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// Flat array of RGBA bytes with complementary colors
#[wasm_bindgen]
pub fn complement_rgba_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.complement())
}

/// Convert to grayscale using BT.709 luminance.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
///
/// # Returns
/// Flat array of RGBA bytes with gray values
#[wasm_bindgen]
pub fn grayscale_rgba_wasm(data: &[u8], width: usize, height: usize) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.grayscale())
}

/// Scale each pixel's distance from its luminance.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `multiplier` - Chroma scale (1.0 = unchanged, >1.0 more saturated)
///
/// # Returns
/// Flat array of RGBA bytes with adjusted saturation
#[wasm_bindgen]
pub fn saturate_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    multiplier: f32,
) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.saturate(multiplier))
}

/// Pull each pixel toward its luminance gray.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `multiplier` - Chroma kept, clamped to 0.0-1.0 (0.0 = grayscale)
///
/// # Returns
/// Flat array of RGBA bytes with reduced saturation
#[wasm_bindgen]
pub fn desaturate_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    multiplier: f32,
) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.desaturate(multiplier))
}

/// Blend halfway toward a color.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `color` - CSS-style color string (`#rrggbb`, `rgb(...)`, a name)
///
/// # Returns
/// Flat array of RGBA bytes mixed with `color`
#[wasm_bindgen]
pub fn mix_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    color: &str,
) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.mix(color))
}

// ============================================================================
// Noise, Blur, Aging
// ============================================================================

/// Perturb every RGB channel by up to `decay * 255`, `passes` times.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `passes` - Number of noise passes
/// * `decay` - Noise strength in (0.0, 1.0]
/// * `seed` - Noise seed; equal seeds give equal output
///
/// # Returns
/// Flat array of RGBA bytes with noise applied
#[wasm_bindgen]
pub fn noise_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    passes: u32,
    decay: f32,
    seed: u64,
) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| {
        c.noise_with(NoiseOptions::new(passes, decay), &SeededNoise::new(seed))
    })
}

/// Overdraw blur: redraw the image at its 9 neighboring offsets per pass.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `passes` - Number of blur passes (0 leaves the image unchanged)
///
/// # Returns
/// Flat array of RGBA bytes, blurred
#[wasm_bindgen]
pub fn blur_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    passes: u32,
) -> Result<Vec<u8>, JsError> {
    run(data, width, height, |c| c.blur(BlurOptions::new(passes)))
}

/// Light noise followed by one blur pass.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `seed` - Noise seed; equal seeds give equal output
///
/// # Returns
/// Flat array of RGBA bytes with the aged look
#[wasm_bindgen]
pub fn age_rgba_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    seed: u64,
) -> Result<Vec<u8>, JsError> {
    let surface = RasterSurface::from_rgba(width, height, data.to_vec()).map_err(to_js)?;
    let mut canvas = Canvas::new(surface).map_err(to_js)?.with_noise_seed(seed);
    canvas.age().map_err(to_js)?;
    Ok(canvas.into_surface().to_rgba_vec())
}

// ============================================================================
// Histogram
// ============================================================================

/// Count distinct colors.
///
/// # Arguments
/// * `data` - Flat array of RGBA bytes (length = width * height * 4)
/// * `width` - Image width in pixels
/// * `height` - Image height in pixels
/// * `use_hex` - Key by `#rrggbb`, merging colors that differ only in alpha
///
/// # Returns
/// Number of distinct colors, 0 for empty images
#[wasm_bindgen]
pub fn distinct_colors_wasm(
    data: &[u8],
    width: usize,
    height: usize,
    use_hex: bool,
) -> Result<usize, JsError> {
    let surface = RasterSurface::from_rgba(width, height, data.to_vec()).map_err(to_js)?;
    let mut canvas = Canvas::new(surface).map_err(to_js)?;
    let options = HistogramOptions {
        use_hex,
        minimum_count: None,
    };
    Ok(canvas
        .histogram(options)
        .map_err(to_js)?
        .map_or(0, |h| h.len()))
}
