//! The closed set of color methods a buffer pass can dispatch onto.
//!
//! Names are resolved once, at the call boundary, into a [`ColorMethod`];
//! the per-pixel loop never looks anything up by string.

use std::fmt;

use super::noise::{NoiseSource, SeededNoise};
use super::Filter;
use crate::color::{Rgb, Rgba};
use crate::config::{check_multiplier, DEFAULT_MIX_WEIGHT};
use crate::error::{FilterError, FilterResult};

/// What to do when a method name is not recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MethodLookup {
    /// Skip the pass and report that nothing ran.
    #[default]
    Lenient,
    /// Fail with [`FilterError::UnknownFilterMethod`].
    Strict,
}

/// A color-value operation with its arguments bound.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ColorMethod {
    Invert,
    Complement,
    Grayscale,
    Saturate(f32),
    Desaturate(f32),
    Mix { color: Rgb, weight: f32 },
    /// `pass` keys the noise stream; buffers advance it per committed pass.
    Mutate { decay: f32, seed: u64, pass: u32 },
}

impl ColorMethod {
    /// Every name accepted by [`ColorMethod::from_name`].
    pub const NAMES: &'static [&'static str] = &[
        "invert",
        "complement",
        "grayscale",
        "greyscale",
        "saturate",
        "desaturate",
        "mix",
        "mutate",
    ];

    pub fn is_known(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// Seeded `mutate` at pass 0.
    pub fn mutate(decay: f32, seed: u64) -> Self {
        ColorMethod::Mutate { decay, seed, pass: 0 }
    }

    /// Shift a `mutate` method's noise stream forward by `passes`; other
    /// methods are returned unchanged.
    pub fn advanced_by(self, passes: u32) -> Self {
        match self {
            ColorMethod::Mutate { decay, seed, pass } => ColorMethod::Mutate {
                decay,
                seed,
                pass: pass.wrapping_add(passes),
            },
            other => other,
        }
    }

    /// Resolve a method name and its numeric arguments.
    ///
    /// | Name | Arguments |
    /// |------|-----------|
    /// | `invert`, `complement`, `grayscale` | none |
    /// | `saturate`, `desaturate` | multiplier |
    /// | `mix` | r, g, b, optional weight (default 0.5) |
    /// | `mutate` | decay (seed 0; use [`ColorMethod::mutate`] for others) |
    pub fn from_name(name: &str, args: &[f32]) -> FilterResult<Self> {
        let bad_args = || {
            FilterError::InvalidParameter(format!(
                "{name}: unexpected arguments {args:?}"
            ))
        };

        let method = match (name, args) {
            ("invert", []) => ColorMethod::Invert,
            ("complement", []) => ColorMethod::Complement,
            ("grayscale" | "greyscale", []) => ColorMethod::Grayscale,
            ("saturate", [m]) => ColorMethod::Saturate(*m),
            ("desaturate", [m]) => ColorMethod::Desaturate(*m),
            ("mix", [r, g, b]) => ColorMethod::Mix {
                color: rgb_from_args(*r, *g, *b)?,
                weight: DEFAULT_MIX_WEIGHT,
            },
            ("mix", [r, g, b, w]) => ColorMethod::Mix {
                color: rgb_from_args(*r, *g, *b)?,
                weight: *w,
            },
            ("mutate", [decay]) => ColorMethod::mutate(*decay, 0),
            _ if Self::is_known(name) => return Err(bad_args()),
            _ => return Err(FilterError::UnknownFilterMethod(name.to_string())),
        };
        method.validate()?;
        Ok(method)
    }

    /// Check the bound arguments.
    pub fn validate(&self) -> FilterResult<()> {
        match *self {
            ColorMethod::Saturate(m) | ColorMethod::Desaturate(m) => check_multiplier(m),
            ColorMethod::Mix { weight, .. } if !(0.0..=1.0).contains(&weight) => Err(
                FilterError::InvalidParameter(format!("mix weight must be in [0, 1], got {weight}")),
            ),
            ColorMethod::Mutate { decay, .. } if !(decay > 0.0 && decay <= 1.0) => Err(
                FilterError::InvalidParameter(format!("decay must be in (0, 1], got {decay}")),
            ),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ColorMethod::Invert => "invert",
            ColorMethod::Complement => "complement",
            ColorMethod::Grayscale => "grayscale",
            ColorMethod::Saturate(_) => "saturate",
            ColorMethod::Desaturate(_) => "desaturate",
            ColorMethod::Mix { .. } => "mix",
            ColorMethod::Mutate { .. } => "mutate",
        }
    }
}

fn rgb_from_args(r: f32, g: f32, b: f32) -> FilterResult<Rgb> {
    Rgba::from_components(r, g, b, 1.0).map(Rgba::rgb)
}

impl Filter for ColorMethod {
    fn apply(&self, index: usize, color: Rgba) -> Rgba {
        match *self {
            ColorMethod::Invert => color.invert(),
            ColorMethod::Complement => color.complement(),
            ColorMethod::Grayscale => color.grayscale(),
            ColorMethod::Saturate(m) => color.saturate(m),
            ColorMethod::Desaturate(m) => color.desaturate(m),
            ColorMethod::Mix { color: other, weight } => color.mix_weighted(other, weight),
            ColorMethod::Mutate { decay, seed, pass } => {
                let mut rng = SeededNoise::new(seed).stream(pass, index);
                color.mutate(decay, &mut rng)
            }
        }
    }
}

impl fmt::Display for ColorMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
