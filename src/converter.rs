//! # MARS → G4Beamline conversion pipeline
//!
//! The conversion runs a fixed sequence of stages over the whole beam, each stage producing a
//! new collection from the previous one:
//!
//! 1. **Width detection** – 8 columns (no time) or 9 columns (time included), see [`detect_time_column`].
//! 2. **Momentum cut** – keep particles whose total momentum lies in the configured window,
//!    compared in MARS units (GeV/c) before any conversion, see [`apply_momentum_cut`].
//! 3. **Unit conversion** – cm → mm, GeV/c → MeV/c, s → ns into the 12-column layout, see [`convert_units`].
//! 4. **PDG mapping** – MARS particle code → PDG id, see [`assign_pdg_ids`].
//! 5. **Weight rescaling** – weights multiplied by `mult`, see [`rescale_weights`].
//! 6. **Duplication** (optional) – each particle becomes `floor(w)` or `floor(w) + 1` unit-weight
//!    copies, see [`duplicate_by_weight`]; otherwise the rescaled weight is written, see [`apply_weights`].
//! 7. **Sampling** (optional) – a random subset of `floor(fraction × n)` rows is kept, see [`sample_fraction`].
//! 8. **Event ids** – rows are numbered `1..=n` in their final order, see [`reassign_event_ids`].
//!
//! The two random stages draw from a caller-provided [`rand::Rng`]; seeding it makes a
//! conversion reproducible.
//!
//! ```rust
//! use mars2g4bl::prelude::*;
//! use nalgebra::DMatrix;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! let matrix = DMatrix::from_row_slice(1, 8, &[1.0, 1.0, 2.0, 3.0, 0.1, 0.2, 0.9, 1.0]);
//! let config = ConversionConfig::builder().build().unwrap();
//! let mut rng = StdRng::seed_from_u64(42);
//!
//! let (beam, report) = convert_matrix(&matrix, &config, &mut rng).unwrap();
//! assert_eq!(beam.tracks()[0].pdg_id, 2212);
//! assert_eq!(report.written, 1);
//! ```
use std::fmt;

use camino::{Utf8Path, Utf8PathBuf};
use nalgebra::DMatrix;
use rand::{seq::SliceRandom, Rng};

use crate::{
    beam::{
        g4bl_writer::write_g4bl_file, mars_reader::read_mars_file, G4blBeam, G4blTrack,
        MarsBeam, MarsRecord,
    },
    beam_errors::BeamError,
    config::{ConversionConfig, MomentumCut},
    constants::{
        CM_TO_MM, G4BL_EXTENSION, GEV_TO_MEV, PRIMARY_PARENT_ID, PRIMARY_TRACK_ID, S_TO_NS,
    },
    particle::MarsParticle,
};

pub use crate::beam::detect_time_column;

/// Row counts after each stage of a conversion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ConversionReport {
    pub time_included: bool,
    pub loaded: usize,
    pub after_momentum_cut: usize,
    pub after_duplication: usize,
    pub written: usize,
}

impl fmt::Display for ConversionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "MARS particles loaded ...... : {}", self.loaded)?;
        writeln!(
            f,
            "  time column .............. : {}",
            if self.time_included { "yes" } else { "no" }
        )?;
        writeln!(f, "  after momentum cut ....... : {}", self.after_momentum_cut)?;
        writeln!(f, "  after duplication ........ : {}", self.after_duplication)?;
        write!(f, "G4Beamline particles written : {}", self.written)
    }
}

/// Keep the records whose total momentum (GeV/c) passes `cut` (bounds in MeV/c, inclusive).
pub fn apply_momentum_cut(records: &[MarsRecord], cut: &MomentumCut) -> Vec<MarsRecord> {
    records
        .iter()
        .filter(|r| cut.accepts(r.total_momentum()))
        .cloned()
        .collect()
}

/// Remap MARS records into G4Beamline tracks, converting positions to mm, momenta to MeV/c
/// and time to ns (0 when absent).
///
/// PDG id, event id and weight are left at 0 for the following stages.
pub fn convert_units(records: &[MarsRecord]) -> Vec<G4blTrack> {
    records
        .iter()
        .map(|r| G4blTrack {
            position: r.position * CM_TO_MM,
            momentum: r.momentum * GEV_TO_MEV,
            time: r.time.map_or(0.0, |t| t * S_TO_NS),
            pdg_id: 0,
            event_id: 0,
            track_id: PRIMARY_TRACK_ID,
            parent_id: PRIMARY_PARENT_ID,
            weight: 0.0,
        })
        .collect()
}

/// Set the PDG id of each track from the MARS code of the matching record.
///
/// Return
/// ----------
/// * The tracks with their PDG ids, or [`BeamError::UnknownParticleCode`] for the first code
///   outside the MARS table.
pub fn assign_pdg_ids(
    tracks: &[G4blTrack],
    records: &[MarsRecord],
) -> Result<Vec<G4blTrack>, BeamError> {
    tracks
        .iter()
        .zip(records)
        .map(|(track, record)| {
            let particle = MarsParticle::from_code(record.code)?;
            Ok(G4blTrack {
                pdg_id: particle.pdg_id(),
                ..track.clone()
            })
        })
        .collect()
}

/// Multiply every weight by `mult`; runs before duplication, which counts copies on the result.
pub fn rescale_weights(records: &[MarsRecord], mult: f64) -> Vec<f64> {
    records.iter().map(|r| r.weight * mult).collect()
}

/// Number of copies of a particle of weight `weight`, given a uniform draw in `[0, 1)`.
///
/// With `n = floor(weight)` and `f = weight - n`, the particle is copied `n + 1` times when
/// `draw < f` and `n` times otherwise, so the expected number of copies equals the weight.
/// Non-positive or non-finite weights give no copy.
///
/// Return
/// ----------
/// * The number of copies, or [`BeamError::DuplicationOverflow`] if it does not fit in a `usize`.
pub fn duplication_count(weight: f64, draw: f64) -> Result<usize, BeamError> {
    if !weight.is_finite() || weight <= 0.0 {
        return Ok(0);
    }
    let whole = weight.floor();
    // `usize::MAX as f64` rounds up to 2^64
    if whole >= usize::MAX as f64 {
        return Err(BeamError::DuplicationOverflow { copies: weight });
    }
    let remainder = weight - whole;
    Ok(whole as usize + usize::from(draw < remainder))
}

/// Expand each track into [`duplication_count`] copies of unit weight.
///
/// One uniform number is drawn per track, in track order. Tracks with zero copies are dropped.
///
/// Return
/// ----------
/// * The copies, or [`BeamError::DuplicationOverflow`] when the total number of copies
///   overflows or cannot be allocated.
pub fn duplicate_by_weight(
    tracks: &[G4blTrack],
    weights: &[f64],
    rng: &mut impl Rng,
) -> Result<Vec<G4blTrack>, BeamError> {
    let counts = weights
        .iter()
        .map(|&w| duplication_count(w, rng.random::<f64>()))
        .collect::<Result<Vec<usize>, _>>()?;

    let overflow = || BeamError::DuplicationOverflow {
        copies: weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum(),
    };
    let total = counts
        .iter()
        .try_fold(0_usize, |acc, &count| acc.checked_add(count))
        .ok_or_else(overflow)?;

    let mut duplicated: Vec<G4blTrack> = Vec::new();
    duplicated.try_reserve_exact(total).map_err(|_| overflow())?;
    for (track, &count) in tracks.iter().zip(&counts) {
        let copy = G4blTrack {
            weight: 1.0,
            ..track.clone()
        };
        duplicated.extend(std::iter::repeat_n(copy, count));
    }
    Ok(duplicated)
}

/// Write the rescaled weights on the tracks, without duplication.
pub fn apply_weights(tracks: &[G4blTrack], weights: &[f64]) -> Vec<G4blTrack> {
    tracks
        .iter()
        .zip(weights)
        .map(|(track, &weight)| G4blTrack {
            weight,
            ..track.clone()
        })
        .collect()
}

/// Keep a uniformly random subset of `floor(fraction × n)` tracks, without replacement.
///
/// The row indices are shuffled and the first ones are kept, in shuffled order. A fraction
/// of 1 or more returns the tracks unchanged and consumes no randomness.
pub fn sample_fraction(tracks: &[G4blTrack], fraction: f64, rng: &mut impl Rng) -> Vec<G4blTrack> {
    if fraction >= 1.0 {
        return tracks.to_vec();
    }
    let keep = (fraction.max(0.0) * tracks.len() as f64).floor() as usize;

    let mut indices: Vec<usize> = (0..tracks.len()).collect();
    indices.shuffle(rng);
    indices
        .into_iter()
        .take(keep)
        .map(|i| tracks[i].clone())
        .collect()
}

/// Number the tracks `1..=n` in their current order.
pub fn reassign_event_ids(tracks: &[G4blTrack]) -> Vec<G4blTrack> {
    tracks
        .iter()
        .zip(1..)
        .map(|(track, event_id)| G4blTrack {
            event_id,
            ..track.clone()
        })
        .collect()
}

/// Convert a MARS beam into a G4Beamline beam.
///
/// Arguments
/// -----------------
/// * `beam`: the MARS particles.
/// * `config`: validated conversion parameters.
/// * `rng`: random source for duplication and sampling.
///
/// Return
/// ----------
/// * The G4Beamline beam and the per-stage row counts, or
///   [`BeamError::UnknownParticleCode`] if a retained particle has a code outside the MARS table.
pub fn convert(
    beam: &MarsBeam,
    config: &ConversionConfig,
    rng: &mut impl Rng,
) -> Result<(G4blBeam, ConversionReport), BeamError> {
    let mut report = ConversionReport {
        time_included: beam.time_included(),
        loaded: beam.len(),
        ..Default::default()
    };

    let records = apply_momentum_cut(beam.records(), &config.p_cut);
    report.after_momentum_cut = records.len();
    if config.p_cut.is_active() {
        tracing::info!(
            cut = %config.p_cut,
            kept = records.len(),
            dropped = beam.len() - records.len(),
            "momentum cut applied"
        );
    }

    let tracks = convert_units(&records);
    let tracks = assign_pdg_ids(&tracks, &records)?;
    let weights = rescale_weights(&records, config.mult);

    let tracks = if config.duplicate {
        let duplicated = duplicate_by_weight(&tracks, &weights, rng)?;
        tracing::info!(
            particles = tracks.len(),
            copies = duplicated.len(),
            "particles duplicated by weight"
        );
        duplicated
    } else {
        apply_weights(&tracks, &weights)
    };
    report.after_duplication = tracks.len();

    let tracks = if config.samples_fraction() {
        let sampled = sample_fraction(&tracks, config.fraction, rng);
        tracing::info!(
            fraction = config.fraction,
            kept = sampled.len(),
            "random fraction of the beam selected"
        );
        sampled
    } else {
        tracks
    };

    let tracks = reassign_event_ids(&tracks);
    report.written = tracks.len();
    tracing::debug!(?report, "conversion done");

    Ok((G4blBeam::new(tracks), report))
}

/// Validate the width of a loaded MARS matrix and convert it.
///
/// See also
/// ------------
/// * [`MarsBeam::from_matrix`] – Width validation.
/// * [`convert`] – The conversion itself.
pub fn convert_matrix(
    matrix: &DMatrix<f64>,
    config: &ConversionConfig,
    rng: &mut impl Rng,
) -> Result<(G4blBeam, ConversionReport), BeamError> {
    let beam = MarsBeam::from_matrix(matrix)?;
    convert(&beam, config, rng)
}

/// Default G4Beamline file for a MARS file: same directory and stem, `.beam` extension.
///
/// ```rust
/// use camino::{Utf8Path, Utf8PathBuf};
/// use mars2g4bl::converter::default_output_path;
///
/// assert_eq!(
///     default_output_path(Utf8Path::new("/data/run1.dat")),
///     Utf8PathBuf::from("/data/run1.beam")
/// );
/// ```
pub fn default_output_path(mars_file: &Utf8Path) -> Utf8PathBuf {
    mars_file.with_extension(G4BL_EXTENSION)
}

/// Read a MARS file, convert it and write the G4Beamline file.
///
/// Nothing is written unless every stage succeeds.
pub fn convert_file(
    mars_file: &Utf8Path,
    g4bl_file: &Utf8Path,
    config: &ConversionConfig,
    rng: &mut impl Rng,
) -> Result<ConversionReport, BeamError> {
    tracing::info!(path = %mars_file, "loading MARS beam file");
    let matrix = read_mars_file(mars_file)?;
    let (beam, report) = convert_matrix(&matrix, config, rng)?;

    let title = format!(
        "G4beamline beam converted from MARS file {}",
        mars_file.file_name().unwrap_or(mars_file.as_str())
    );
    write_g4bl_file(g4bl_file, &beam, &title)?;
    tracing::info!(path = %g4bl_file, particles = beam.len(), "G4Beamline beam file written");
    Ok(report)
}
