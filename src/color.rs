//! Color values: RGBA and RGB.
//!
//! Channels are stored as `u8` so red, green and blue can never leave
//! 0-255. Alpha is an `f32` kept in 0.0-1.0 by every constructor and
//! transform. All channel arithmetic happens in `f32` and is brought back
//! with [`round_channel`], which rounds instead of truncating.
//!
//! ## String forms
//!
//! | Form | Example |
//! |------|---------|
//! | Short hex | `#f80`, `#f808` |
//! | Long hex | `#ff8800`, `#ff880080` |
//! | Functional | `rgb(255, 136, 0)`, `rgba(255, 136, 0, 0.5)` |
//! | Named | `orange`, `transparent` |

use std::fmt;
use std::str::FromStr;

use crate::config::DEFAULT_MIX_WEIGHT;
use crate::error::{FilterError, FilterResult};
use crate::filters::noise::Entropy;

// BT.709 luminosity coefficients
pub const LUMA_R: f32 = 0.2126;
pub const LUMA_G: f32 = 0.7152;
pub const LUMA_B: f32 = 0.0722;

/// Round a channel value to the nearest integer and clamp it to 0-255.
///
/// NaN maps to 0.
#[inline]
pub fn round_channel(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

#[inline]
fn clamp_alpha(a: f32) -> f32 {
    if a.is_nan() {
        1.0
    } else {
        a.clamp(0.0, 1.0)
    }
}

const NAMED_COLORS: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("red", [255, 0, 0]),
    ("lime", [0, 255, 0]),
    ("green", [0, 128, 0]),
    ("blue", [0, 0, 255]),
    ("yellow", [255, 255, 0]),
    ("cyan", [0, 255, 255]),
    ("aqua", [0, 255, 255]),
    ("magenta", [255, 0, 255]),
    ("fuchsia", [255, 0, 255]),
    ("gray", [128, 128, 128]),
    ("grey", [128, 128, 128]),
    ("silver", [192, 192, 192]),
    ("maroon", [128, 0, 0]),
    ("olive", [128, 128, 0]),
    ("navy", [0, 0, 128]),
    ("purple", [128, 0, 128]),
    ("teal", [0, 128, 128]),
    ("orange", [255, 165, 0]),
    ("brown", [165, 42, 42]),
    ("pink", [255, 192, 203]),
];

// ============================================================================
// RGBA
// ============================================================================

/// An RGBA color with integer color channels and float alpha.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct Rgba {
    r: u8,
    g: u8,
    b: u8,
    a: f32,
}

impl Rgba {
    /// Create a color. Alpha is clamped to 0.0-1.0 (NaN becomes opaque).
    pub fn new(r: u8, g: u8, b: u8, a: f32) -> Self {
        Rgba { r, g, b, a: clamp_alpha(a) }
    }

    /// Fully opaque color.
    pub fn opaque(r: u8, g: u8, b: u8) -> Self {
        Rgba { r, g, b, a: 1.0 }
    }

    /// Validate unbounded components, rejecting anything out of range.
    ///
    /// Color channels must be finite and within 0-255 (fractions are
    /// rounded), alpha must be within 0.0-1.0.
    pub fn from_components(r: f32, g: f32, b: f32, a: f32) -> FilterResult<Self> {
        for (name, v) in [("red", r), ("green", g), ("blue", b)] {
            if !v.is_finite() || !(0.0..=255.0).contains(&v) {
                return Err(FilterError::InvalidColor(format!(
                    "{name} channel {v} outside 0-255"
                )));
            }
        }
        if !a.is_finite() || !(0.0..=1.0).contains(&a) {
            return Err(FilterError::InvalidColor(format!(
                "alpha {a} outside 0.0-1.0"
            )));
        }
        Ok(Rgba {
            r: round_channel(r),
            g: round_channel(g),
            b: round_channel(b),
            a,
        })
    }

    /// Clamp unbounded components into range instead of rejecting them.
    pub fn clamped(r: f32, g: f32, b: f32, a: f32) -> Self {
        Rgba {
            r: round_channel(r),
            g: round_channel(g),
            b: round_channel(b),
            a: clamp_alpha(a),
        }
    }

    /// Decode one pixel from RGBA bytes.
    #[inline]
    pub fn from_bytes(px: [u8; 4]) -> Self {
        Rgba {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3] as f32 / 255.0,
        }
    }

    /// Encode as RGBA bytes; alpha is rounded to the nearest byte.
    #[inline]
    pub fn to_bytes(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.alpha_byte()]
    }

    pub fn red(&self) -> u8 {
        self.r
    }

    pub fn green(&self) -> u8 {
        self.g
    }

    pub fn blue(&self) -> u8 {
        self.b
    }

    pub fn alpha(&self) -> f32 {
        self.a
    }

    #[inline]
    pub fn alpha_byte(&self) -> u8 {
        round_channel(self.a * 255.0)
    }

    /// Same color with a different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Rgba::new(self.r, self.g, self.b, a)
    }

    /// Drop alpha.
    pub fn rgb(self) -> Rgb {
        Rgb::new(self.r, self.g, self.b)
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex(&self) -> String {
        self.rgb().to_hex()
    }

    /// BT.709 luminance in channel units (0.0-255.0).
    #[inline]
    pub fn luma(&self) -> f32 {
        LUMA_R * self.r as f32 + LUMA_G * self.g as f32 + LUMA_B * self.b as f32
    }

    #[inline]
    fn map_rgb(self, f: impl Fn(u8) -> u8) -> Self {
        Rgba {
            r: f(self.r),
            g: f(self.g),
            b: f(self.b),
            a: self.a,
        }
    }

    // ------------------------------------------------------------------------
    // Transforms
    // ------------------------------------------------------------------------

    /// `255 - channel` for red, green and blue.
    pub fn invert(self) -> Self {
        self.map_rgb(|c| 255 - c)
    }

    /// Rotate the hue by 180 degrees, keeping HSL saturation and lightness.
    ///
    /// In HSL this reduces to `max + min - channel`; grays are their own
    /// complement.
    pub fn complement(self) -> Self {
        let max = self.r.max(self.g).max(self.b) as u16;
        let min = self.r.min(self.g).min(self.b) as u16;
        self.map_rgb(|c| (max + min - c as u16) as u8)
    }

    /// Scale every channel's distance from the luminance gray by `factor`.
    fn scale_saturation(self, factor: f32) -> Self {
        let gray = self.luma();
        self.map_rgb(|c| round_channel(gray + (c as f32 - gray) * factor))
    }

    /// Scale chroma by `multiplier`: above 1.0 saturates, below 1.0
    /// desaturates, 1.0 is a no-op. Negative multipliers act as 0.0.
    pub fn saturate(self, multiplier: f32) -> Self {
        self.scale_saturation(multiplier.max(0.0))
    }

    /// Scale chroma by `multiplier` limited to 0.0-1.0, so this never adds
    /// saturation. 1.0 is a no-op and 0.0 is full grayscale.
    pub fn desaturate(self, multiplier: f32) -> Self {
        self.scale_saturation(multiplier.clamp(0.0, 1.0))
    }

    /// Luminance gray; identical to `desaturate(0.0)`.
    pub fn grayscale(self) -> Self {
        self.desaturate(0.0)
    }

    /// Blend halfway toward `other`.
    pub fn mix(self, other: Rgb) -> Self {
        self.mix_weighted(other, DEFAULT_MIX_WEIGHT)
    }

    /// Linear interpolation toward `other`; `weight` 0.0 keeps `self`,
    /// 1.0 yields `other`. Alpha is untouched.
    pub fn mix_weighted(self, other: Rgb, weight: f32) -> Self {
        let w = weight.clamp(0.0, 1.0);
        let lerp = |from: u8, to: u8| round_channel(from as f32 + (to as f32 - from as f32) * w);
        Rgba {
            r: lerp(self.r, other.r),
            g: lerp(self.g, other.g),
            b: lerp(self.b, other.b),
            a: self.a,
        }
    }

    /// Perturb each color channel by up to `±decay * 255`.
    ///
    /// Draws one sample per channel from `rng` in red, green, blue order.
    pub fn mutate<E: Entropy + ?Sized>(self, decay: f32, rng: &mut E) -> Self {
        let span = decay.clamp(0.0, 1.0) * 255.0;
        let mut jitter = |c: u8| {
            let offset = (rng.next_unit() * 2.0 - 1.0) * span;
            round_channel(c as f32 + offset)
        };
        let r = jitter(self.r);
        let g = jitter(self.g);
        let b = jitter(self.b);
        Rgba { r, g, b, a: self.a }
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Rgba::opaque(0, 0, 0)
    }
}

impl From<Rgb> for Rgba {
    fn from(c: Rgb) -> Self {
        Rgba::opaque(c.r, c.g, c.b)
    }
}

impl From<Rgba> for String {
    fn from(c: Rgba) -> Self {
        c.to_string()
    }
}

impl TryFrom<String> for Rgba {
    type Error = FilterError;

    fn try_from(s: String) -> FilterResult<Self> {
        s.parse()
    }
}

/// Canonical `rgba(r,g,b,a)` identifier; equal colors print identically.
impl fmt::Display for Rgba {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rgba({},{},{},{})", self.r, self.g, self.b, self.a)
    }
}

impl FromStr for Rgba {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        let text = s.trim().to_ascii_lowercase();
        let invalid = || FilterError::InvalidColor(s.to_string());

        if let Some(hex) = text.strip_prefix('#') {
            return parse_hex(hex).ok_or_else(invalid);
        }
        if let Some(body) = text.strip_prefix("rgba(").or_else(|| text.strip_prefix("rgb(")) {
            let body = body.strip_suffix(')').ok_or_else(invalid)?;
            return parse_functional(body).ok_or_else(invalid);
        }
        if text == "transparent" {
            return Ok(Rgba::new(0, 0, 0, 0.0));
        }
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == text)
            .map(|(_, [r, g, b])| Rgba::opaque(*r, *g, *b))
            .ok_or_else(invalid)
    }
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    if !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    let nibble = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();

    match hex.len() {
        3 => Some(Rgba::opaque(nibble(0)?, nibble(1)?, nibble(2)?)),
        4 => Some(Rgba::from_bytes([nibble(0)?, nibble(1)?, nibble(2)?, nibble(3)?])),
        6 => Some(Rgba::opaque(byte(0)?, byte(2)?, byte(4)?)),
        8 => Some(Rgba::from_bytes([byte(0)?, byte(2)?, byte(4)?, byte(6)?])),
        _ => None,
    }
}

fn parse_functional(body: &str) -> Option<Rgba> {
    let parts: Vec<f32> = body
        .split(',')
        .map(|p| p.trim().parse::<f32>().ok())
        .collect::<Option<_>>()?;
    match parts.as_slice() {
        [r, g, b] => Rgba::from_components(*r, *g, *b, 1.0).ok(),
        [r, g, b, a] => Rgba::from_components(*r, *g, *b, *a).ok(),
        _ => None,
    }
}

// ============================================================================
// RGB
// ============================================================================

/// An opaque color without alpha.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "String", try_from = "String"))]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Rgb { r, g, b }
    }

    /// `#rrggbb` in lowercase.
    pub fn to_hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Opaque RGBA.
    pub fn to_rgba(self) -> Rgba {
        self.into()
    }
}

impl From<Rgba> for Rgb {
    fn from(c: Rgba) -> Self {
        c.rgb()
    }
}

impl From<Rgb> for String {
    fn from(c: Rgb) -> Self {
        c.to_hex()
    }
}

impl TryFrom<String> for Rgb {
    type Error = FilterError;

    fn try_from(s: String) -> FilterResult<Self> {
        s.parse()
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

/// Accepts every string form [`Rgba`] does; alpha is discarded.
impl FromStr for Rgb {
    type Err = FilterError;

    fn from_str(s: &str) -> FilterResult<Self> {
        s.parse::<Rgba>().map(Rgba::rgb)
    }
}

/// Anything that can be normalized to an [`Rgb`] for mixing.
pub trait IntoRgb {
    fn into_rgb(self) -> FilterResult<Rgb>;
}

impl IntoRgb for Rgb {
    fn into_rgb(self) -> FilterResult<Rgb> {
        Ok(self)
    }
}

impl IntoRgb for Rgba {
    fn into_rgb(self) -> FilterResult<Rgb> {
        Ok(self.rgb())
    }
}

impl IntoRgb for &str {
    fn into_rgb(self) -> FilterResult<Rgb> {
        self.parse()
    }
}

impl IntoRgb for String {
    fn into_rgb(self) -> FilterResult<Rgb> {
        self.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use crate::filters::noise::SimpleRng;

    /// Entropy that always returns the same sample.
    struct Fixed(f32);

    impl Entropy for Fixed {
        fn next_unit(&mut self) -> f32 {
            self.0
        }
    }

    fn sample_colors() -> Vec<Rgba> {
        let mut out = Vec::new();
        for r in (0..=255).step_by(51) {
            for g in (0..=255).step_by(85) {
                for b in [0u8, 7, 128, 254, 255] {
                    out.push(Rgba::new(r as u8, g as u8, b, 0.6));
                }
            }
        }
        out
    }

    // ========================================================================
    // Parsing and formatting
    // ========================================================================

    #[test]
    fn test_parse_hex_forms() {
        assert_eq!("#ff8800".parse::<Rgba>().unwrap(), Rgba::opaque(255, 136, 0));
        assert_eq!("#F80".parse::<Rgba>().unwrap(), Rgba::opaque(255, 136, 0));

        let half = "#ff880080".parse::<Rgba>().unwrap();
        assert_eq!(half.alpha_byte(), 0x80);
        assert_eq!(half.rgb(), Rgb::new(255, 136, 0));
    }

    #[test]
    fn test_parse_functional_and_named() {
        let c: Rgba = "rgba(200, 100, 50, 0.5)".parse().unwrap();
        assert_eq!(c, Rgba::new(200, 100, 50, 0.5));

        let c: Rgba = " rgb(1,2,3) ".parse().unwrap();
        assert_eq!(c, Rgba::opaque(1, 2, 3));

        assert_eq!("Orange".parse::<Rgba>().unwrap(), Rgba::opaque(255, 165, 0));
        assert_eq!("transparent".parse::<Rgba>().unwrap().alpha(), 0.0);
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for bad in ["", "#12", "#gggggg", "#+f+f+f", "rgb(1,2)", "rgb(300,0,0)", "rgba(0,0,0,2)", "chartreuse-ish"] {
            let err = bad.parse::<Rgba>().unwrap_err();
            assert!(matches!(err, FilterError::InvalidColor(_)), "{bad} should be invalid");
        }
    }

    #[test]
    fn test_from_components_validates() {
        assert!(Rgba::from_components(0.0, 0.0, 0.0, 1.0).is_ok());
        assert!(Rgba::from_components(256.0, 0.0, 0.0, 1.0).is_err());
        assert!(Rgba::from_components(-1.0, 0.0, 0.0, 1.0).is_err());
        assert!(Rgba::from_components(0.0, 0.0, 0.0, 1.5).is_err());
        assert!(Rgba::from_components(f32::NAN, 0.0, 0.0, 1.0).is_err());

        let c = Rgba::clamped(300.0, -4.0, 127.5, 3.0);
        assert_eq!(c, Rgba::opaque(255, 0, 128));
    }

    #[test]
    fn test_hex_and_identifier() {
        let c = Rgba::new(200, 100, 50, 0.5);
        assert_eq!(c.to_hex(), "#c86432");
        assert_eq!(c.to_string(), "rgba(200,100,50,0.5)");
        assert_eq!(Rgba::opaque(0, 0, 0).to_string(), "rgba(0,0,0,1)");

        // Hex collapses alpha variants, the full identifier does not
        let other = c.with_alpha(1.0);
        assert_eq!(c.to_hex(), other.to_hex());
        assert_ne!(c.to_string(), other.to_string());
    }

    #[test]
    fn test_luma_weights() {
        assert_relative_eq!(Rgba::opaque(255, 255, 255).luma(), 255.0, epsilon = 1e-3);
        assert_relative_eq!(Rgba::opaque(255, 0, 0).luma(), 54.213, epsilon = 1e-3);
        assert_relative_eq!(Rgba::opaque(0, 255, 0).luma(), 182.376, epsilon = 1e-3);
        assert_relative_eq!(Rgba::from_bytes([0, 0, 0, 51]).alpha(), 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_byte_roundtrip_preserves_alpha() {
        for a in [0u8, 1, 51, 128, 254, 255] {
            let px = [10, 20, 30, a];
            assert_eq!(Rgba::from_bytes(px).to_bytes(), px);
        }
    }

    #[test]
    fn test_rgb_conversions() {
        let rgb: Rgb = "#0a0b0c".parse().unwrap();
        assert_eq!(rgb, Rgb::new(10, 11, 12));
        assert_eq!(rgb.to_rgba().alpha(), 1.0);
        assert_eq!(Rgb::from(Rgba::new(1, 2, 3, 0.2)), Rgb::new(1, 2, 3));
        assert_eq!(rgb.to_string(), "#0a0b0c");
        assert_eq!("white".into_rgb().unwrap(), Rgb::new(255, 255, 255));
    }

    // ========================================================================
    // Transforms
    // ========================================================================

    #[test]
    fn test_invert_roundtrip() {
        for c in sample_colors() {
            assert_eq!(c.invert().invert(), c);
        }
        assert_eq!(Rgba::opaque(255, 255, 255).invert(), Rgba::opaque(0, 0, 0));
    }

    #[test]
    fn test_complement_rotates_hue() {
        assert_eq!(Rgba::opaque(255, 0, 0).complement(), Rgba::opaque(0, 255, 255));
        assert_eq!(Rgba::opaque(200, 100, 50).complement(), Rgba::opaque(50, 150, 200));
        // Grays have no hue
        assert_eq!(Rgba::opaque(90, 90, 90).complement(), Rgba::opaque(90, 90, 90));
        for c in sample_colors() {
            assert_eq!(c.complement().complement(), c);
        }
    }

    #[test]
    fn test_grayscale_equal_channels() {
        for c in sample_colors() {
            let g = c.grayscale();
            assert_eq!(g.red(), g.green());
            assert_eq!(g.green(), g.blue());
            assert_eq!(g.alpha(), c.alpha());
        }
        // 0.7152 * 255 = 182.4
        assert_eq!(Rgba::opaque(0, 255, 0).grayscale().red(), 182);
    }

    #[test]
    fn test_desaturate_identity_at_one() {
        for c in sample_colors() {
            assert_eq!(c.desaturate(1.0), c);
            assert_eq!(c.saturate(1.0), c);
        }
    }

    #[test]
    fn test_saturation_direction() {
        let c = Rgba::opaque(180, 120, 100);
        let more = c.saturate(1.5);
        let less = c.desaturate(0.5);
        let spread = |x: Rgba| x.red() as i32 - x.blue() as i32;
        assert!(spread(more) > spread(c));
        assert!(spread(less) < spread(c));
        // desaturate never adds chroma
        assert_eq!(c.desaturate(3.0), c);
    }

    #[test]
    fn test_mix_halfway() {
        let c = Rgba::opaque(200, 100, 50).mix(Rgb::new(0, 0, 0));
        assert_eq!(c, Rgba::opaque(100, 50, 25));

        let keep = Rgba::new(10, 20, 30, 0.25).mix_weighted(Rgb::new(255, 255, 255), 0.0);
        assert_eq!(keep, Rgba::new(10, 20, 30, 0.25));
        let full = Rgba::new(10, 20, 30, 0.25).mix_weighted(Rgb::new(255, 255, 255), 1.0);
        assert_eq!(full, Rgba::new(255, 255, 255, 0.25));
    }

    #[test]
    fn test_mutate_bounded_by_decay() {
        let c = Rgba::opaque(128, 128, 128);
        // 0.0 -> -span, 0.5 -> 0, ~1.0 -> +span
        assert_eq!(c.mutate(0.1, &mut Fixed(0.5)), c);
        assert_eq!(c.mutate(0.1, &mut Fixed(0.0)), Rgba::opaque(103, 103, 103));

        let mut rng = SimpleRng::new(7);
        for _ in 0..200 {
            let m = c.mutate(0.05, &mut rng);
            for (a, b) in [(m.red(), c.red()), (m.green(), c.green()), (m.blue(), c.blue())] {
                assert!((a as i32 - b as i32).abs() <= 13);
            }
        }
    }

    #[test]
    fn test_mutate_clamps_at_edges() {
        let white = Rgba::opaque(255, 255, 255);
        assert_eq!(white.mutate(1.0, &mut Fixed(0.999)), white);
        let black = Rgba::opaque(0, 0, 0);
        assert_eq!(black.mutate(1.0, &mut Fixed(0.0)), black);
    }

    #[test]
    fn test_transforms_keep_alpha_in_range() {
        let mut rng = SimpleRng::new(1);
        for c in sample_colors() {
            for out in [
                c.invert(),
                c.complement(),
                c.saturate(4.0),
                c.desaturate(0.3),
                c.grayscale(),
                c.mix(Rgb::new(9, 9, 9)),
                c.mutate(1.0, &mut rng),
            ] {
                assert!((0.0..=1.0).contains(&out.alpha()));
            }
        }
    }
}
