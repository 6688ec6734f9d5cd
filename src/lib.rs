//! canvasfx
//!
//! Per-pixel color filters over RGBA surfaces, with Python bindings via
//! PyO3 and WASM bindings for JavaScript.
//!
//! ## Pixel Format
//! Buffers are flat RGBA8 (`width * height * 4` bytes, row-major). Each
//! pixel is decoded into an [`Rgba`] value (integer color channels, float
//! alpha), passed through a filter and encoded back.
//!
//! ## Layers
//! - [`color`]: RGBA/RGB values, parsing, hex and identifier strings
//! - [`filters`]: pure per-pixel functions, named methods, noise sources
//! - [`buffer`]: the pass engine and color histograms
//! - [`surface`]: the drawing-target abstraction and an in-memory surface
//! - [`canvas`]: composite effects (blur, noise, age, mix, ...)
//!
//! ## Example
//! ```
//! use canvasfx::{Canvas, HistogramOptions, RasterSurface};
//!
//! let mut canvas = Canvas::new(RasterSurface::filled(2, 2, [255, 255, 255, 255])).unwrap();
//! canvas.invert().unwrap();
//! let hist = canvas.histogram(HistogramOptions::hex()).unwrap().unwrap();
//! assert_eq!(hist.get("#000000"), Some(4));
//! ```

pub mod buffer;
pub mod canvas;
pub mod color;
pub mod config;
pub mod error;
pub mod filters;
pub mod surface;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use buffer::{Histogram, PixelBuffer};
pub use canvas::{Canvas, ImageInput, ImageLoader};
pub use color::{IntoRgb, Rgb, Rgba};
pub use config::{BlurOptions, HistogramOptions, NoiseOptions};
pub use error::{FilterError, FilterResult};
pub use filters::{ColorMethod, Filter, FilterRegistry, MethodLookup, NoiseSource, SeededNoise};
pub use surface::{GlobalAlphaGuard, RasterSurface, RawImage, SourceImage, Surface};

// Python bindings (only when python feature is enabled)
#[cfg(feature = "python")]
mod python {
    use std::collections::HashMap;

    use numpy::{IntoPyArray, PyArray3, PyReadonlyArray3};
    use pyo3::exceptions::PyValueError;
    use pyo3::prelude::*;

    use crate::canvas::Canvas;
    use crate::config::{BlurOptions, HistogramOptions, NoiseOptions};
    use crate::error::{FilterError, FilterResult};
    use crate::surface::RasterSurface;

    impl From<FilterError> for PyErr {
        fn from(err: FilterError) -> PyErr {
            PyValueError::new_err(err.to_string())
        }
    }

    /// Run `effect` over a copy of `image` and hand the result back.
    fn run<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        effect: impl FnOnce(&mut Canvas<RasterSurface>) -> FilterResult<bool>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        let surface = RasterSurface::from_array(image.as_array().to_owned())?;
        let mut canvas = Canvas::new(surface)?;
        effect(&mut canvas)?;
        let result = canvas
            .into_surface()
            .into_array()
            .ok_or_else(|| PyValueError::new_err("surface lost its pixels"))?;
        Ok(result.into_pyarray(py))
    }

    // ========================================================================
    // Color Filters
    // ========================================================================

    /// Invert RGB channels of an RGBA u8 image. Alpha preserved.
    #[pyfunction]
    pub fn invert<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.invert())
    }

    /// Rotate every pixel's hue by 180 degrees.
    #[pyfunction]
    pub fn complement<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.complement())
    }

    /// Convert to BT.709 luminance gray.
    #[pyfunction]
    pub fn grayscale<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.grayscale())
    }

    /// Scale chroma by `multiplier` (1.0 = no change).
    #[pyfunction]
    pub fn saturate<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        multiplier: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.saturate(multiplier))
    }

    /// Scale chroma by `multiplier` limited to 0.0-1.0.
    #[pyfunction]
    pub fn desaturate<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        multiplier: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.desaturate(multiplier))
    }

    /// Blend toward `color` (any CSS-style color string).
    #[pyfunction]
    #[pyo3(signature = (image, color, weight=0.5))]
    pub fn mix<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        color: &str,
        weight: f32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.mix_weighted(color, weight))
    }

    // ========================================================================
    // Noise and Blur
    // ========================================================================

    /// Repeated random perturbation, reproducible for a given seed.
    #[pyfunction]
    #[pyo3(signature = (image, passes=1, decay=0.025, seed=0))]
    pub fn noise<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        passes: u32,
        decay: f32,
        seed: u64,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| {
            let noise = crate::filters::SeededNoise::new(seed);
            c.noise_with(NoiseOptions::new(passes, decay), &noise)
        })
    }

    /// Overdraw blur of the image onto itself.
    #[pyfunction]
    #[pyo3(signature = (image, passes=1))]
    pub fn blur<'py>(
        py: Python<'py>,
        image: PyReadonlyArray3<'py, u8>,
        passes: u32,
    ) -> PyResult<Bound<'py, PyArray3<u8>>> {
        run(py, image, |c| c.blur(BlurOptions::new(passes)))
    }

    // ========================================================================
    // Histogram
    // ========================================================================

    /// Color counts keyed by `rgba(...)` or `#rrggbb`; None for empty images.
    #[pyfunction]
    #[pyo3(signature = (image, use_hex=false, minimum_count=None))]
    pub fn color_histogram(
        image: PyReadonlyArray3<'_, u8>,
        use_hex: bool,
        minimum_count: Option<u32>,
    ) -> PyResult<Option<HashMap<String, u32>>> {
        let surface = RasterSurface::from_array(image.as_array().to_owned())?;
        let mut canvas = Canvas::new(surface)?;
        let options = HistogramOptions {
            use_hex,
            minimum_count,
        };
        Ok(canvas.histogram(options)?.map(|h| h.into_inner()))
    }

    /// canvasfx extension module
    #[pymodule]
    pub fn canvasfx(m: &Bound<'_, PyModule>) -> PyResult<()> {
        // Color filters
        m.add_function(wrap_pyfunction!(invert, m)?)?;
        m.add_function(wrap_pyfunction!(complement, m)?)?;
        m.add_function(wrap_pyfunction!(grayscale, m)?)?;
        m.add_function(wrap_pyfunction!(saturate, m)?)?;
        m.add_function(wrap_pyfunction!(desaturate, m)?)?;
        m.add_function(wrap_pyfunction!(mix, m)?)?;

        // Noise and blur
        m.add_function(wrap_pyfunction!(noise, m)?)?;
        m.add_function(wrap_pyfunction!(blur, m)?)?;

        // Histogram
        m.add_function(wrap_pyfunction!(color_histogram, m)?)?;

        Ok(())
    }
}

#[cfg(feature = "python")]
pub use python::canvasfx;
