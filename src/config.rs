//! # Conversion parameters
//!
//! This module defines the [`ConversionConfig`](crate::config::ConversionConfig) struct
//! and its builder, which control how a MARS beam is filtered, reweighted, duplicated and
//! sampled on its way to the G4Beamline format.
//!
//! ## Parameters
//!
//! - **`p_cut`** – momentum window `[p_min, p_max]` in **MeV/c**, or `[0, 0]` for no cut
//!   (see [`MomentumCut`]).
//! - **`mult`** – factor applied to every particle weight, **before** duplication.
//! - **`duplicate`** – whether each particle is duplicated according to its weight
//!   (a weight of 2.3 gives 2 copies with 70% probability and 3 copies with 30% probability).
//! - **`fraction`** – fraction of the (duplicated) beam kept in the output, picked at random.
//!
//! ## Sources
//!
//! Parameters are assembled either with the fluent [`ConversionConfigBuilder`], or from a
//! key-value document through [`PartialConfig`]. A document must provide all four keys:
//! a missing key is reported as [`ConfigError::MissingKey`] before any beam is read.
//!
//! ```rust
//! use mars2g4bl::config::{ConversionConfig, MomentumCut};
//!
//! let config = ConversionConfig::builder()
//!     .momentum_cut("[100, 300]".parse::<MomentumCut>().unwrap())
//!     .mult(2.0)
//!     .duplicate(true)
//!     .fraction(0.5)
//!     .build()
//!     .unwrap();
//! assert!(config.duplicate);
//! ```
use std::{
    cmp::Ordering::{Equal, Greater, Less},
    fmt,
    str::FromStr,
    sync::LazyLock,
};

use camino::Utf8Path;
use regex::Regex;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    beam_errors::BeamError,
    constants::{GeV, MeV, GEV_TO_MEV},
};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Missing configuration key '{0}' (required keys: 'p_cut', 'mult', 'duplicate', 'fraction')")]
    MissingKey(&'static str),

    #[error("The weight multiplier must be a positive number, got {0}")]
    InvalidMultiplier(f64),

    #[error("The beam fraction must be a positive number, got {0}")]
    InvalidFraction(f64),

    #[error("Momentum cut bounds must be finite and non-negative, got [{0}, {1}]")]
    InvalidMomentumCut(f64, f64),

    #[error("The lower momentum cut {min} is greater than the upper cut {max}")]
    InvertedMomentumCut { min: f64, max: f64 },

    #[error("Wrong format for the momentum cut '{0}': expected [p_low, p_high] in MeV/c, or 0")]
    MomentumCutFormat(String),

    #[error("Invalid value '{value}' for '{key}'")]
    InvalidValue { key: &'static str, value: String },

    #[error("Unable to parse the configuration document: {0}")]
    InvalidDocument(String),
}

/// Optional momentum window applied on the total momentum of the MARS particles.
///
/// Bounds are expressed in **MeV/c** and are inclusive. The `[0, 0]` pair is the
/// conventional "no cut" value.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum MomentumCut {
    #[default]
    NoCut,
    Window { min: MeV, max: MeV },
}

static MOMENTUM_CUT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\s*\[?\s*([^\s,\[\]]+)\s*(?:,\s*|\s+)([^\s,\[\]]+)\s*\]?\s*$")
        .expect("momentum cut regex is valid")
});

impl MomentumCut {
    /// Build a momentum cut from a `[p_min, p_max]` pair in MeV/c.
    ///
    /// Arguments
    /// -----------------
    /// * `min`, `max`: inclusive bounds in MeV/c. `(0, 0)` disables the cut.
    ///
    /// Return
    /// ----------
    /// * The validated cut, or a [`ConfigError`] if a bound is negative / not finite or if
    ///   `min > max`.
    pub fn from_bounds(min: MeV, max: MeV) -> Result<Self, ConfigError> {
        if !min.is_finite() || !max.is_finite() || min < 0.0 || max < 0.0 {
            return Err(ConfigError::InvalidMomentumCut(min, max));
        }
        if min == 0.0 && max == 0.0 {
            return Ok(MomentumCut::NoCut);
        }
        if min > max {
            return Err(ConfigError::InvertedMomentumCut { min, max });
        }
        Ok(MomentumCut::Window { min, max })
    }

    pub fn bounds(&self) -> [MeV; 2] {
        match self {
            MomentumCut::NoCut => [0.0, 0.0],
            MomentumCut::Window { min, max } => [*min, *max],
        }
    }

    pub fn is_active(&self) -> bool {
        matches!(self, MomentumCut::Window { .. })
    }

    /// Whether a total momentum expressed in **GeV/c** (MARS units) passes the cut.
    ///
    /// The MeV/c bounds are divided by 1000 so the comparison happens in the units of the
    /// MARS file, before any conversion of the particle momentum.
    pub fn accepts(&self, p_total: GeV) -> bool {
        match self {
            MomentumCut::NoCut => true,
            MomentumCut::Window { min, max } => {
                p_total >= min / GEV_TO_MEV && p_total <= max / GEV_TO_MEV
            }
        }
    }
}

impl FromStr for MomentumCut {
    type Err = ConfigError;

    /// Parse `"0"`, `"[p_low, p_high]"`, `"p_low,p_high"` or `"p_low p_high"` (MeV/c).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim() == "0" {
            return Ok(MomentumCut::NoCut);
        }
        let caps = MOMENTUM_CUT_RE
            .captures(s)
            .ok_or_else(|| ConfigError::MomentumCutFormat(s.to_string()))?;
        let parse = |i: usize| {
            caps[i]
                .parse::<f64>()
                .map_err(|_| ConfigError::MomentumCutFormat(s.to_string()))
        };
        MomentumCut::from_bounds(parse(1)?, parse(2)?)
    }
}

impl fmt::Display for MomentumCut {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MomentumCut::NoCut => write!(f, "none"),
            MomentumCut::Window { min, max } => write!(f, "[{min}, {max}] MeV/c"),
        }
    }
}

/// Validated parameters of a MARS → G4Beamline conversion.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionConfig {
    pub p_cut: MomentumCut,
    pub mult: f64,
    pub duplicate: bool,
    pub fraction: f64,
}

impl ConversionConfig {
    /// Create a builder initialized with the neutral parameters
    /// (no cut, `mult = 1`, no duplication, `fraction = 1`).
    pub fn builder() -> ConversionConfigBuilder {
        ConversionConfigBuilder::new()
    }

    /// Whether the random sub-sampling stage has anything to do.
    pub fn samples_fraction(&self) -> bool {
        self.fraction < 1.0
    }
}

impl Default for ConversionConfig {
    fn default() -> Self {
        ConversionConfig {
            p_cut: MomentumCut::NoCut,
            mult: 1.0,
            duplicate: false,
            fraction: 1.0,
        }
    }
}

/// Builder for [`ConversionConfig`].
#[derive(Debug, Clone)]
pub struct ConversionConfigBuilder {
    p_cut: [MeV; 2],
    mult: f64,
    duplicate: bool,
    fraction: f64,
}

impl Default for ConversionConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversionConfigBuilder {
    pub fn new() -> Self {
        let defaults = ConversionConfig::default();
        Self {
            p_cut: defaults.p_cut.bounds(),
            mult: defaults.mult,
            duplicate: defaults.duplicate,
            fraction: defaults.fraction,
        }
    }

    pub fn p_cut(mut self, min: MeV, max: MeV) -> Self {
        self.p_cut = [min, max];
        self
    }
    pub fn momentum_cut(mut self, cut: MomentumCut) -> Self {
        self.p_cut = cut.bounds();
        self
    }
    pub fn mult(mut self, v: f64) -> Self {
        self.mult = v;
        self
    }
    pub fn duplicate(mut self, v: bool) -> Self {
        self.duplicate = v;
        self
    }
    pub fn fraction(mut self, v: f64) -> Self {
        self.fraction = v;
        self
    }

    /// NaN compares as invalid.
    #[inline]
    fn gt0(x: f64) -> bool {
        x.partial_cmp(&0.0) == Some(Greater)
    }

    /// Finalize the builder.
    ///
    /// Validation rules
    /// -----------------
    /// * `mult` must be finite and `> 0`,
    /// * `fraction` must be finite and `> 0`; values above 1 are clamped to 1,
    /// * the momentum window must satisfy [`MomentumCut::from_bounds`].
    pub fn build(self) -> Result<ConversionConfig, ConfigError> {
        if !Self::gt0(self.mult) || !self.mult.is_finite() {
            return Err(ConfigError::InvalidMultiplier(self.mult));
        }
        if !Self::gt0(self.fraction) || !self.fraction.is_finite() {
            return Err(ConfigError::InvalidFraction(self.fraction));
        }

        let fraction = match self.fraction.partial_cmp(&1.0) {
            Some(Greater) => {
                tracing::warn!(
                    fraction = self.fraction,
                    "beam fraction above 1, the whole beam is kept"
                );
                1.0
            }
            Some(Less) | Some(Equal) | None => self.fraction,
        };

        Ok(ConversionConfig {
            p_cut: MomentumCut::from_bounds(self.p_cut[0], self.p_cut[1])?,
            mult: self.mult,
            duplicate: self.duplicate,
            fraction,
        })
    }
}

impl fmt::Display for ConversionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if f.alternate() {
            const PARAM_COL: usize = 30;
            writeln!(f, "MARS → G4Beamline conversion parameters")?;
            writeln!(f, "---------------------------------------")?;

            macro_rules! line {
                ($fmt:expr, $val:expr, $comment:expr) => {{
                    let s = format!($fmt, $val);
                    let pad = " ".repeat(PARAM_COL.saturating_sub(s.len()).max(1));
                    writeln!(f, "  {}{}# {}", s, pad, $comment)
                }};
            }

            line!("p_cut     = {}", self.p_cut, "momentum window (MeV/c)")?;
            line!("mult      = {}", self.mult, "weight multiplier")?;
            line!("duplicate = {}", self.duplicate, "duplicate by weight")?;
            line!("fraction  = {}", self.fraction, "fraction of the beam kept")
        } else {
            write!(
                f,
                "p_cut={}, mult={}, duplicate={}, fraction={}",
                self.p_cut, self.mult, self.duplicate, self.fraction
            )
        }
    }
}

/// Key-value form of the conversion parameters, where every key may be missing.
///
/// This is what a configuration document (JSON) or the command line provides. Layers are
/// combined with [`PartialConfig::merge`] and turned into a [`ConversionConfig`] with
/// [`PartialConfig::resolve`].
///
/// ```json
/// { "p_cut": [0, 0], "mult": 1.0, "duplicate": true, "fraction": 0.1 }
/// ```
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PartialConfig {
    pub p_cut: Option<[MeV; 2]>,
    pub mult: Option<f64>,
    pub duplicate: Option<bool>,
    #[serde(alias = "frac")]
    pub fraction: Option<f64>,
}

impl PartialConfig {
    pub fn from_json_str(document: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(document).map_err(|e| ConfigError::InvalidDocument(e.to_string()))
    }

    pub fn from_json_file(path: &Utf8Path) -> Result<Self, BeamError> {
        let document = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&document)?)
    }

    /// Combine two layers; keys present in `overrides` win.
    pub fn merge(self, overrides: PartialConfig) -> PartialConfig {
        PartialConfig {
            p_cut: overrides.p_cut.or(self.p_cut),
            mult: overrides.mult.or(self.mult),
            duplicate: overrides.duplicate.or(self.duplicate),
            fraction: overrides.fraction.or(self.fraction),
        }
    }

    /// Turn the layer into validated parameters.
    ///
    /// Return
    /// ----------
    /// * [`ConfigError::MissingKey`] for the first absent key (in the order
    ///   `p_cut`, `mult`, `duplicate`, `fraction`), or any validation error of
    ///   [`ConversionConfigBuilder::build`].
    pub fn resolve(self) -> Result<ConversionConfig, ConfigError> {
        let [min, max] = self.p_cut.ok_or(ConfigError::MissingKey("p_cut"))?;
        let mult = self.mult.ok_or(ConfigError::MissingKey("mult"))?;
        let duplicate = self.duplicate.ok_or(ConfigError::MissingKey("duplicate"))?;
        let fraction = self.fraction.ok_or(ConfigError::MissingKey("fraction"))?;

        ConversionConfig::builder()
            .p_cut(min, max)
            .mult(mult)
            .duplicate(duplicate)
            .fraction(fraction)
            .build()
    }
}

#[cfg(test)]
mod config_test {
    use super::*;

    #[test]
    fn test_default_builder() {
        let config = ConversionConfig::builder().build().unwrap();
        assert_eq!(config, ConversionConfig::default());
        assert!(!config.samples_fraction());
    }

    #[test]
    fn test_momentum_cut_sentinel() {
        assert_eq!(MomentumCut::from_bounds(0.0, 0.0), Ok(MomentumCut::NoCut));
        assert!(!MomentumCut::NoCut.is_active());
        assert!(MomentumCut::NoCut.accepts(1e6));
    }

    #[test]
    fn test_momentum_cut_window() {
        let cut = MomentumCut::from_bounds(100.0, 300.0).unwrap();
        assert!(cut.is_active());
        assert!(cut.accepts(0.1));
        assert!(cut.accepts(0.2));
        assert!(cut.accepts(0.3));
        assert!(!cut.accepts(0.0999));
        assert!(!cut.accepts(0.3001));
    }

    #[test]
    fn test_momentum_cut_errors() {
        assert_eq!(
            MomentumCut::from_bounds(300.0, 100.0),
            Err(ConfigError::InvertedMomentumCut {
                min: 300.0,
                max: 100.0
            })
        );
        assert_eq!(
            MomentumCut::from_bounds(-1.0, 100.0),
            Err(ConfigError::InvalidMomentumCut(-1.0, 100.0))
        );
        assert!(MomentumCut::from_bounds(f64::NAN, 100.0).is_err());
        assert!(MomentumCut::from_bounds(0.0, f64::INFINITY).is_err());
    }

    #[test]
    fn test_momentum_cut_from_str() {
        assert_eq!("0".parse::<MomentumCut>(), Ok(MomentumCut::NoCut));
        assert_eq!("[0, 0]".parse::<MomentumCut>(), Ok(MomentumCut::NoCut));
        let window = MomentumCut::Window {
            min: 100.0,
            max: 250.5,
        };
        assert_eq!("[100, 250.5]".parse::<MomentumCut>(), Ok(window));
        assert_eq!("100,250.5".parse::<MomentumCut>(), Ok(window));
        assert_eq!(" 100 250.5 ".parse::<MomentumCut>(), Ok(window));
        assert_eq!("[1e2,2.505e2]".parse::<MomentumCut>(), Ok(window));

        assert_eq!(
            "[100]".parse::<MomentumCut>(),
            Err(ConfigError::MomentumCutFormat("[100]".into()))
        );
        assert_eq!(
            "[a, b]".parse::<MomentumCut>(),
            Err(ConfigError::MomentumCutFormat("[a, b]".into()))
        );
        assert!("[300, 100]".parse::<MomentumCut>().is_err());
    }

    #[test]
    fn test_builder_validation() {
        assert_eq!(
            ConversionConfig::builder().mult(0.0).build(),
            Err(ConfigError::InvalidMultiplier(0.0))
        );
        assert_eq!(
            ConversionConfig::builder().mult(-2.0).build(),
            Err(ConfigError::InvalidMultiplier(-2.0))
        );
        assert!(ConversionConfig::builder().mult(f64::NAN).build().is_err());
        assert_eq!(
            ConversionConfig::builder().fraction(0.0).build(),
            Err(ConfigError::InvalidFraction(0.0))
        );
        assert_eq!(
            ConversionConfig::builder().fraction(-0.5).build(),
            Err(ConfigError::InvalidFraction(-0.5))
        );
        assert!(ConversionConfig::builder()
            .fraction(f64::INFINITY)
            .build()
            .is_err());
        assert!(ConversionConfig::builder().p_cut(5.0, 1.0).build().is_err());
    }

    #[test]
    fn test_fraction_clamped() {
        let config = ConversionConfig::builder().fraction(3.0).build().unwrap();
        assert_eq!(config.fraction, 1.0);

        let config = ConversionConfig::builder().fraction(0.25).build().unwrap();
        assert_eq!(config.fraction, 0.25);
        assert!(config.samples_fraction());
    }

    #[test]
    fn test_partial_config_missing_keys() {
        let partial = PartialConfig::from_json_str(r#"{"mult": 1.0}"#).unwrap();
        assert_eq!(partial.resolve(), Err(ConfigError::MissingKey("p_cut")));

        let partial =
            PartialConfig::from_json_str(r#"{"p_cut": [0, 0], "mult": 1.0, "duplicate": true}"#)
                .unwrap();
        assert_eq!(partial.resolve(), Err(ConfigError::MissingKey("fraction")));
    }

    #[test]
    fn test_partial_config_resolve() {
        let partial = PartialConfig::from_json_str(
            r#"{"p_cut": [100, 200], "mult": 2.5, "duplicate": false, "frac": 0.5}"#,
        )
        .unwrap();
        let config = partial.resolve().unwrap();
        assert_eq!(
            config,
            ConversionConfig {
                p_cut: MomentumCut::Window {
                    min: 100.0,
                    max: 200.0
                },
                mult: 2.5,
                duplicate: false,
                fraction: 0.5,
            }
        );
    }

    #[test]
    fn test_partial_config_merge() {
        let file = PartialConfig {
            p_cut: Some([0.0, 0.0]),
            mult: Some(1.0),
            duplicate: Some(false),
            fraction: Some(1.0),
        };
        let cli = PartialConfig {
            mult: Some(4.0),
            duplicate: Some(true),
            ..Default::default()
        };
        let merged = file.merge(cli);
        assert_eq!(merged.mult, Some(4.0));
        assert_eq!(merged.duplicate, Some(true));
        assert_eq!(merged.p_cut, Some([0.0, 0.0]));
        assert_eq!(merged.fraction, Some(1.0));
    }

    #[test]
    fn test_partial_config_bad_document() {
        assert!(matches!(
            PartialConfig::from_json_str(r#"{"mult": "two"}"#),
            Err(ConfigError::InvalidDocument(_))
        ));
        assert!(matches!(
            PartialConfig::from_json_str(r#"{"multiplier": 2}"#),
            Err(ConfigError::InvalidDocument(_))
        ));
    }

    #[test]
    fn test_display() {
        let config = ConversionConfig::builder()
            .p_cut(100.0, 200.0)
            .build()
            .unwrap();
        assert_eq!(
            config.to_string(),
            "p_cut=[100, 200] MeV/c, mult=1, duplicate=false, fraction=1"
        );
        let sheet = format!("{config:#}");
        assert!(sheet.contains("duplicate = false"));
        assert!(sheet.contains("# weight multiplier"));
    }
}
