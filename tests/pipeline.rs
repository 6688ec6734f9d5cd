//! End-to-end effect chains through the public API.

use canvasfx::filters::{self, NoiseSource, SimpleRng};
use canvasfx::{
    Canvas, ColorMethod, FilterError, FilterRegistry, HistogramOptions, MethodLookup,
    NoiseOptions, PixelBuffer, RasterSurface, Rgb, Rgba, SourceImage, Surface,
};

fn gradient(width: usize, height: usize) -> SourceImage {
    let mut data = Vec::with_capacity(width * height * 4);
    for y in 0..height {
        for x in 0..width {
            data.extend_from_slice(&[(x * 40) as u8, (y * 40) as u8, 128, 255]);
        }
    }
    SourceImage::from_rgba(width, height, data).unwrap()
}

#[test]
fn test_chained_effects_stay_in_range() {
    let mut canvas = Canvas::from_image(RasterSurface::new(1, 1), gradient(6, 5))
        .unwrap()
        .with_noise_seed(17);

    canvas.saturate(2.0).unwrap();
    canvas.complement().unwrap();
    canvas.noise(NoiseOptions::new(2, 0.3)).unwrap();
    canvas.mix("rgba(10, 200, 30, 0.2)").unwrap();
    canvas.age().unwrap();
    canvas.desaturate(0.5).unwrap();

    let surface = canvas.surface();
    assert_eq!((surface.width(), surface.height()), (6, 5));
    assert_eq!(surface.global_alpha(), 1.0);

    let hist = canvas.histogram(HistogramOptions::default()).unwrap().unwrap();
    assert_eq!(hist.total(), 30);
}

#[test]
fn test_grayscale_pipeline_histogram_is_gray() {
    let mut canvas = Canvas::from_image(RasterSurface::new(1, 1), gradient(4, 4)).unwrap();
    canvas.grayscale().unwrap();

    let hist = canvas.histogram(HistogramOptions::hex()).unwrap().unwrap();
    for (key, _) in hist.iter() {
        let c: Rgb = key.parse().unwrap();
        assert_eq!(c.r, c.g);
        assert_eq!(c.g, c.b);
    }
}

#[test]
fn test_invert_twice_restores_surface() {
    let source = gradient(5, 3);
    let mut canvas = Canvas::from_image(RasterSurface::new(1, 1), source.clone()).unwrap();
    canvas.invert().unwrap();
    canvas.apply_method_named("invert", &[], MethodLookup::Strict).unwrap();

    let restored = SourceImage::from_raw(canvas.surface().acquire_buffer().unwrap()).unwrap();
    assert_eq!(restored, source);
}

#[test]
fn test_custom_noise_source_is_injected() {
    /// Always pushes channels to the top of the range.
    struct Saturating;

    struct Max;
    impl filters::Entropy for Max {
        fn next_unit(&mut self) -> f32 {
            0.999
        }
    }

    impl NoiseSource for Saturating {
        type Stream = Max;
        fn stream(&self, _pass: u32, _pixel: usize) -> Max {
            Max
        }
    }

    let mut canvas = Canvas::new(RasterSurface::filled(3, 3, [250, 250, 250, 255])).unwrap();
    canvas.noise_with(NoiseOptions::new(1, 0.1), &Saturating).unwrap();
    assert_eq!(canvas.surface().to_rgba_vec(), [255, 255, 255, 255].repeat(9));
}

#[test]
fn test_buffer_and_registry_together() {
    let mut registry = FilterRegistry::new();
    registry
        .register("threshold", |c: Rgba| {
            if c.luma() >= 128.0 {
                Rgba::new(255, 255, 255, c.alpha())
            } else {
                Rgba::new(0, 0, 0, c.alpha())
            }
        })
        .unwrap();

    let mut surface = RasterSurface::from_rgba(2, 1, vec![200, 200, 200, 255, 20, 20, 20, 255]).unwrap();
    let mut buffer = PixelBuffer::acquire(&mut surface).unwrap();
    buffer
        .apply_registered(&registry, "threshold", &[], MethodLookup::Strict)
        .unwrap();
    buffer.apply_method(ColorMethod::Invert).unwrap();

    assert_eq!(surface.to_rgba_vec(), vec![0, 0, 0, 255, 255, 255, 255, 255]);
}

#[test]
fn test_strict_lookup_reports_unknown() {
    let mut canvas = Canvas::new(RasterSurface::filled(1, 1, [0, 0, 0, 255])).unwrap();
    let err = canvas
        .apply_method_named("vignette", &[], MethodLookup::Strict)
        .unwrap_err();
    assert!(matches!(err, FilterError::UnknownFilterMethod(_)));
    assert!(!canvas
        .apply_method_named("vignette", &[], MethodLookup::Lenient)
        .unwrap());
}

#[test]
fn test_pure_functions_with_explicit_rng() {
    let mut rng = SimpleRng::new(123);
    let c = filters::mutate(Rgba::opaque(128, 128, 128), 0.5, &mut rng);
    assert_eq!(c.alpha(), 1.0);
    assert_eq!(filters::invert(filters::invert(c)), c);
}
