//! Pure color functions: Invert, Complement, Saturate, Desaturate,
//! Grayscale, Mix, Mutate.
//!
//! Each function has the shape `(color, ...args) -> color` and can be
//! handed straight to a buffer pass, either as a function pointer or
//! wrapped in a closure that binds the extra arguments:
//!
//! ```
//! use canvasfx::{filters, PixelBuffer, RasterSurface, Rgba};
//!
//! let mut surface = RasterSurface::filled(2, 2, [200, 100, 50, 255]);
//! let mut buffer = PixelBuffer::acquire(&mut surface).unwrap();
//! buffer.apply_filter(&|c: Rgba| filters::saturate(c, 1.5)).unwrap();
//! ```

use crate::color::{Rgb, Rgba};
use crate::filters::noise::Entropy;

/// `255 - channel` for red, green and blue; alpha unchanged.
pub fn invert(color: Rgba) -> Rgba {
    color.invert()
}

/// Hue rotated by 180 degrees.
pub fn complement(color: Rgba) -> Rgba {
    color.complement()
}

pub fn saturate(color: Rgba, multiplier: f32) -> Rgba {
    color.saturate(multiplier)
}

pub fn desaturate(color: Rgba, multiplier: f32) -> Rgba {
    color.desaturate(multiplier)
}

/// BT.709 luminance gray, alpha preserved.
pub fn grayscale(color: Rgba) -> Rgba {
    color.grayscale()
}

/// Halfway blend toward `other`.
pub fn mix(color: Rgba, other: Rgb) -> Rgba {
    color.mix(other)
}

pub fn mix_weighted(color: Rgba, other: Rgb, weight: f32) -> Rgba {
    color.mix_weighted(other, weight)
}

/// Random perturbation bounded by `±decay * 255` per channel.
pub fn mutate<E: Entropy + ?Sized>(color: Rgba, decay: f32, rng: &mut E) -> Rgba {
    color.mutate(decay, rng)
}
