//! Composite effects over a surface.
//!
//! A [`Canvas`] pairs a surface with the source image that was drawn onto
//! it. Every effect acquires a fresh [`PixelBuffer`], runs its passes and
//! commits before returning, so effects can be chained freely.
//!
//! ## Effects
//!
//! | Effect | Built from |
//! |--------|------------|
//! | `invert`, `complement`, `grayscale`, `saturate`, `desaturate` | one filter pass |
//! | `mix` | one filter pass toward a normalized RGB color |
//! | `noise` | `passes` mutate passes |
//! | `blur` | 9 offset redraws of the source per pass at 1/8 opacity |
//! | `age` | one mutate pass at decay 0.05, then one blur pass |

use tracing::debug;

use crate::buffer::{Histogram, PixelBuffer};
use crate::color::{IntoRgb, Rgba};
use crate::config::{
    check_multiplier, BlurOptions, HistogramOptions, NoiseOptions, AGE_DECAY, BLUR_OPACITY,
    DEFAULT_MIX_WEIGHT,
};
use crate::error::FilterResult;
use crate::filters::method::{ColorMethod, MethodLookup};
use crate::filters::noise::{Mutate, NoiseSource, SeededNoise};
use crate::filters::registry::FilterRegistry;
use crate::filters::Filter;
use crate::surface::{GlobalAlphaGuard, SourceImage, Surface};

// ============================================================================
// Image input
// ============================================================================

/// Resolves a string source (path, URL, key) into a decoded image.
pub trait ImageLoader {
    fn load(&self, src: &str) -> FilterResult<SourceImage>;
}

impl<F> ImageLoader for F
where
    F: Fn(&str) -> FilterResult<SourceImage>,
{
    fn load(&self, src: &str) -> FilterResult<SourceImage> {
        self(src)
    }
}

/// Either an already decoded image or a string for an [`ImageLoader`].
#[derive(Debug, Clone, PartialEq)]
pub enum ImageInput {
    Decoded(SourceImage),
    Path(String),
}

impl From<SourceImage> for ImageInput {
    fn from(image: SourceImage) -> Self {
        ImageInput::Decoded(image)
    }
}

impl From<&str> for ImageInput {
    fn from(src: &str) -> Self {
        ImageInput::Path(src.to_string())
    }
}

impl From<String> for ImageInput {
    fn from(src: String) -> Self {
        ImageInput::Path(src)
    }
}

// ============================================================================
// Canvas
// ============================================================================

/// A surface plus the unmodified source image effects refer back to.
#[derive(Debug)]
pub struct Canvas<S: Surface> {
    surface: S,
    source: SourceImage,
    noise: SeededNoise,
    /// Passes committed so far; keys the noise of every later pass.
    passes: u32,
}

impl<S: Surface> Canvas<S> {
    /// Use the surface's current pixels as the source image.
    pub fn new(surface: S) -> FilterResult<Self> {
        let source = SourceImage::from_raw(surface.acquire_buffer()?)?;
        Ok(Canvas {
            surface,
            source,
            noise: SeededNoise::from_entropy(),
            passes: 0,
        })
    }

    /// Resize `surface` to `image`, draw it at full opacity and keep it as
    /// the source image.
    pub fn from_image(mut surface: S, image: SourceImage) -> FilterResult<Self> {
        surface.resize(image.width(), image.height())?;
        surface.set_global_alpha(1.0);
        surface.draw_image_at(&image, 0, 0)?;
        debug!(width = image.width(), height = image.height(), "Drew source image");
        Ok(Canvas {
            surface,
            source: image,
            noise: SeededNoise::from_entropy(),
            passes: 0,
        })
    }

    /// Resolve `input` (loading strings through `loader`), draw it onto
    /// `surface` and call `on_ready` once the image is in place.
    ///
    /// `on_ready` is not called when loading or drawing fails.
    pub fn draw<L, F>(
        surface: S,
        input: impl Into<ImageInput>,
        loader: &L,
        on_ready: F,
    ) -> FilterResult<Self>
    where
        L: ImageLoader + ?Sized,
        F: FnOnce(&mut Canvas<S>),
    {
        let image = match input.into() {
            ImageInput::Decoded(image) => image,
            ImageInput::Path(src) => {
                debug!(src = %src, "Loading image");
                loader.load(&src)?
            }
        };
        let mut canvas = Self::from_image(surface, image)?;
        on_ready(&mut canvas);
        Ok(canvas)
    }

    /// Use a fixed seed for `noise` and `age`, making them reproducible.
    pub fn with_noise_seed(mut self, seed: u64) -> Self {
        self.noise = SeededNoise::new(seed);
        self.passes = 0;
        self
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn into_surface(self) -> S {
        self.surface
    }

    /// The image blur redraws from.
    pub fn source(&self) -> &SourceImage {
        &self.source
    }

    /// Acquire a working buffer over the surface, its pass counter
    /// continuing from the canvas's.
    pub fn buffer(&mut self) -> FilterResult<PixelBuffer<'_, S>> {
        let pass = self.passes;
        Ok(PixelBuffer::acquire(&mut self.surface)?.starting_at_pass(pass))
    }

    /// Run `op` on a fresh buffer and carry its pass counter back.
    fn with_buffer(
        &mut self,
        op: impl FnOnce(&mut PixelBuffer<'_, S>) -> FilterResult<bool>,
    ) -> FilterResult<bool> {
        let mut buffer = PixelBuffer::acquire(&mut self.surface)?.starting_at_pass(self.passes);
        let result = op(&mut buffer);
        self.passes = buffer.passes();
        result
    }

    // ------------------------------------------------------------------------
    // Generic passes
    // ------------------------------------------------------------------------

    pub fn apply_filter<F: Filter + ?Sized>(&mut self, filter: &F) -> FilterResult<bool> {
        self.with_buffer(|b| b.apply_filter(filter))
    }

    pub fn apply_method(&mut self, method: ColorMethod) -> FilterResult<bool> {
        self.with_buffer(|b| b.apply_method(method))
    }

    pub fn apply_method_named(
        &mut self,
        name: &str,
        args: &[f32],
        lookup: MethodLookup,
    ) -> FilterResult<bool> {
        self.with_buffer(|b| b.apply_method_named(name, args, lookup))
    }

    pub fn apply_registered(
        &mut self,
        registry: &FilterRegistry,
        name: &str,
        args: &[f32],
        lookup: MethodLookup,
    ) -> FilterResult<bool> {
        self.with_buffer(|b| b.apply_registered(registry, name, args, lookup))
    }

    /// Color histogram of the current surface; `Ok(None)` when it has no
    /// pixels.
    pub fn histogram(&mut self, options: HistogramOptions) -> FilterResult<Option<Histogram>> {
        Ok(self.buffer()?.color_histogram(options))
    }

    // ------------------------------------------------------------------------
    // Color effects
    // ------------------------------------------------------------------------

    pub fn invert(&mut self) -> FilterResult<bool> {
        self.apply_method(ColorMethod::Invert)
    }

    pub fn complement(&mut self) -> FilterResult<bool> {
        self.apply_method(ColorMethod::Complement)
    }

    pub fn grayscale(&mut self) -> FilterResult<bool> {
        self.apply_method(ColorMethod::Grayscale)
    }

    pub fn saturate(&mut self, multiplier: f32) -> FilterResult<bool> {
        check_multiplier(multiplier)?;
        self.apply_method(ColorMethod::Saturate(multiplier))
    }

    pub fn desaturate(&mut self, multiplier: f32) -> FilterResult<bool> {
        check_multiplier(multiplier)?;
        self.apply_method(ColorMethod::Desaturate(multiplier))
    }

    /// Blend every pixel halfway toward `color` (a string or color value).
    pub fn mix(&mut self, color: impl IntoRgb) -> FilterResult<bool> {
        self.mix_weighted(color, DEFAULT_MIX_WEIGHT)
    }

    pub fn mix_weighted(&mut self, color: impl IntoRgb, weight: f32) -> FilterResult<bool> {
        let color = color.into_rgb()?;
        debug!(color = %color, weight, "Mixing");
        self.apply_method(ColorMethod::Mix { color, weight })
    }

    // ------------------------------------------------------------------------
    // Noise, blur, aging
    // ------------------------------------------------------------------------

    /// `options.passes` mutate passes using the canvas's noise source.
    pub fn noise(&mut self, options: NoiseOptions) -> FilterResult<bool> {
        let noise = self.noise;
        self.noise_with(options, &noise)
    }

    /// `options.passes` mutate passes drawing from `noise`.
    ///
    /// Returns `Ok(false)` when no pass ran (zero passes or no pixels).
    pub fn noise_with<N: NoiseSource>(
        &mut self,
        options: NoiseOptions,
        noise: &N,
    ) -> FilterResult<bool> {
        options.validate()?;
        debug!(passes = options.passes, decay = options.decay, "Applying noise");

        self.with_buffer(|buffer| {
            let mut ran = false;
            for _ in 0..options.passes {
                let filter = Mutate::new(options.decay, noise).for_pass(buffer.passes());
                ran |= buffer.apply_filter(&filter)?;
            }
            Ok(ran)
        })
    }

    /// Approximate a box blur by redrawing the source image at the 9
    /// offsets around each pixel, each at [`BLUR_OPACITY`].
    ///
    /// The surface's global alpha is back at 1.0 when this returns, even on
    /// error. Returns whether any drawing happened.
    pub fn blur(&mut self, options: BlurOptions) -> FilterResult<bool> {
        let passes = options.passes;
        debug!(passes, "Applying blur");
        let mut guard = GlobalAlphaGuard::new(&mut self.surface, BLUR_OPACITY);
        for _ in 0..passes {
            for dy in -1..=1 {
                for dx in -1..=1 {
                    guard.draw_image_at(&self.source, dx, dy)?;
                }
            }
        }
        Ok(passes > 0)
    }

    /// One mutate pass at [`AGE_DECAY`] followed by one blur pass.
    pub fn age(&mut self) -> FilterResult<bool> {
        debug!("Aging");
        let noised = self.noise(NoiseOptions::new(1, AGE_DECAY))?;
        let blurred = self.blur(BlurOptions::default())?;
        Ok(noised || blurred)
    }

    /// Color at `(x, y)` of the committed surface, via a fresh buffer.
    pub fn pixel(&mut self, x: usize, y: usize) -> FilterResult<Option<Rgba>> {
        let buffer = self.buffer()?;
        if x >= buffer.width() {
            return Ok(None);
        }
        let index = y.checked_mul(buffer.width()).and_then(|i| i.checked_add(x));
        Ok(index.and_then(|i| buffer.pixel(i)))
    }
}
