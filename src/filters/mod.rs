//! Per-pixel filters.
//!
//! A filter maps one pixel's color (plus its index in the buffer) to a new
//! color. Filters are `Sync` because a pass may visit pixels from several
//! threads; any closure `Fn(Rgba) -> Rgba + Sync` is a filter.
//!
//! ## Filter Categories
//!
//! - **Pure color functions** (`color_adjust`): invert, complement,
//!   saturate, desaturate, grayscale, mix
//! - **Noise** (`noise`): mutate, driven by an injectable noise source
//! - **Named dispatch** (`method`, `registry`): the closed set of color
//!   methods and a registry for custom filters

pub mod color_adjust;
pub mod method;
pub mod noise;
pub mod registry;

use crate::color::Rgba;

/// A per-pixel color transformation.
pub trait Filter: Sync {
    /// Map the pixel at `index` (in pixels, not bytes) to its new color.
    fn apply(&self, index: usize, color: Rgba) -> Rgba;
}

impl<F> Filter for F
where
    F: Fn(Rgba) -> Rgba + Sync,
{
    #[inline]
    fn apply(&self, _index: usize, color: Rgba) -> Rgba {
        self(color)
    }
}

pub use color_adjust::{complement, desaturate, grayscale, invert, mix, mix_weighted, mutate, saturate};
pub use method::{ColorMethod, MethodLookup};
pub use noise::{Entropy, Mutate, NoiseSource, SeededNoise, SimpleRng};
pub use registry::{FilterRegistry, ResolvedFilter};
