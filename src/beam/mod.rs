//! # Beams: MARS records and G4Beamline tracks
//!
//! In-memory representation of both ends of the conversion.
//!
//! Modules
//! -----------------
//! * [`mars_reader`](crate::beam::mars_reader) – Whitespace-separated MARS beam file → numeric matrix.
//! * [`g4bl_writer`](crate::beam::g4bl_writer) – G4Beamline BLTrackFile writer (and reader, for checks).
//!
//! Data Model
//! -----------------
//! * [`MarsRecord`] – One MARS particle: particle code, position (**cm**), momentum (**GeV/c**),
//!   weight and optional time (**s**).
//! * [`MarsBeam`] – The MARS records of one file, with the "time included" flag derived from the
//!   file width (8 or 9 columns).
//! * [`G4blTrack`] – One G4Beamline particle: position (**mm**), momentum (**MeV/c**), time (**ns**),
//!   PDG id, event id, track/parent id and weight.
//! * [`G4blBeam`] – The output particles, in file order.
//!
//! Both beams can be viewed as `nalgebra::DMatrix<f64>` with one particle per row, which is
//! the layout of the text files.
use nalgebra::{DMatrix, Vector3};

use crate::{
    beam_errors::BeamError,
    constants::{
        EventId, GeV, PdgId, G4BL_COLUMNS, MARS_COLUMNS_NO_TIME, MARS_COLUMNS_WITH_TIME,
    },
};

pub mod g4bl_writer;
pub mod mars_reader;

/// Whether a MARS matrix of the given width carries the time column.
///
/// Return
/// ----------
/// * `Ok(false)` for 8 columns, `Ok(true)` for 9, [`BeamError::InvalidColumnCount`] otherwise.
pub fn detect_time_column(n_columns: usize) -> Result<bool, BeamError> {
    match n_columns {
        MARS_COLUMNS_NO_TIME => Ok(false),
        MARS_COLUMNS_WITH_TIME => Ok(true),
        n => Err(BeamError::InvalidColumnCount(n)),
    }
}

/// A single particle of a MARS beam file, in MARS units.
#[derive(Debug, Clone, PartialEq)]
pub struct MarsRecord {
    /// MARS particle code (see [`MarsParticle`](crate::particle::MarsParticle))
    pub code: i32,
    /// cm
    pub position: Vector3<f64>,
    /// GeV/c
    pub momentum: Vector3<f64>,
    pub weight: f64,
    /// seconds, when the file has a time column
    pub time: Option<f64>,
}

impl MarsRecord {
    /// Parse one matrix row (`i x y z px py pz w [t]`).
    ///
    /// The particle code is truncated towards zero, like an integer cast of the stored value.
    fn from_row(row: &[f64], time_included: bool) -> Self {
        MarsRecord {
            code: row[0] as i32,
            position: Vector3::new(row[1], row[2], row[3]),
            momentum: Vector3::new(row[4], row[5], row[6]),
            weight: row[7],
            time: time_included.then(|| row[8]),
        }
    }

    /// Total momentum `sqrt(px² + py² + pz²)` in GeV/c.
    pub fn total_momentum(&self) -> GeV {
        self.momentum.norm()
    }
}

/// The content of a MARS beam file.
#[derive(Debug, Clone, PartialEq)]
pub struct MarsBeam {
    records: Vec<MarsRecord>,
    time_included: bool,
}

impl MarsBeam {
    pub fn new(records: Vec<MarsRecord>, time_included: bool) -> Self {
        MarsBeam {
            records,
            time_included,
        }
    }

    /// Build a MARS beam from a loaded numeric matrix (one particle per row).
    ///
    /// Return
    /// ----------
    /// * The beam, or [`BeamError::InvalidColumnCount`] if the matrix is neither 8 nor 9
    ///   columns wide.
    pub fn from_matrix(matrix: &DMatrix<f64>) -> Result<Self, BeamError> {
        let time_included = detect_time_column(matrix.ncols())?;
        let mut row = [0.0; MARS_COLUMNS_WITH_TIME];
        let records = matrix
            .row_iter()
            .map(|r| {
                for (dst, src) in row.iter_mut().zip(r.iter()) {
                    *dst = *src;
                }
                MarsRecord::from_row(&row, time_included)
            })
            .collect();
        Ok(MarsBeam::new(records, time_included))
    }

    pub fn records(&self) -> &[MarsRecord] {
        &self.records
    }

    pub fn time_included(&self) -> bool {
        self.time_included
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// A single particle of a G4Beamline BLTrackFile, in G4Beamline units.
#[derive(Debug, Clone, PartialEq)]
pub struct G4blTrack {
    /// mm
    pub position: Vector3<f64>,
    /// MeV/c
    pub momentum: Vector3<f64>,
    /// ns
    pub time: f64,
    pub pdg_id: PdgId,
    pub event_id: EventId,
    pub track_id: i32,
    pub parent_id: i32,
    pub weight: f64,
}

impl G4blTrack {
    /// The 12 columns of the track, in file order.
    pub fn to_row(&self) -> [f64; G4BL_COLUMNS] {
        [
            self.position.x,
            self.position.y,
            self.position.z,
            self.momentum.x,
            self.momentum.y,
            self.momentum.z,
            self.time,
            self.pdg_id as f64,
            self.event_id as f64,
            self.track_id as f64,
            self.parent_id as f64,
            self.weight,
        ]
    }
}

/// The particles of a G4Beamline beam, in output order.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct G4blBeam {
    tracks: Vec<G4blTrack>,
}

impl G4blBeam {
    pub fn new(tracks: Vec<G4blTrack>) -> Self {
        G4blBeam { tracks }
    }

    pub fn tracks(&self) -> &[G4blTrack] {
        &self.tracks
    }

    pub fn into_tracks(self) -> Vec<G4blTrack> {
        self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// The beam as a `len × 12` matrix.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        let data: Vec<f64> = self.tracks.iter().flat_map(|t| t.to_row()).collect();
        DMatrix::from_row_slice(self.tracks.len(), G4BL_COLUMNS, &data)
    }
}

#[cfg(test)]
mod beam_test {
    use super::*;

    #[test]
    fn test_detect_time_column() {
        assert_eq!(detect_time_column(8), Ok(false));
        assert_eq!(detect_time_column(9), Ok(true));
        assert_eq!(detect_time_column(7), Err(BeamError::InvalidColumnCount(7)));
        assert_eq!(detect_time_column(0), Err(BeamError::InvalidColumnCount(0)));
        assert_eq!(
            detect_time_column(12),
            Err(BeamError::InvalidColumnCount(12))
        );
    }

    #[test]
    fn test_mars_beam_from_matrix() {
        let matrix = DMatrix::from_row_slice(
            2,
            8,
            &[
                1.0, 1.0, 2.0, 3.0, 0.1, 0.2, 0.3, 1.5, //
                3.0, -1.0, -2.0, -3.0, 0.0, 0.0, 2.0, 0.5,
            ],
        );
        let beam = MarsBeam::from_matrix(&matrix).unwrap();
        assert_eq!(beam.len(), 2);
        assert!(!beam.time_included());
        assert_eq!(
            beam.records()[0],
            MarsRecord {
                code: 1,
                position: Vector3::new(1.0, 2.0, 3.0),
                momentum: Vector3::new(0.1, 0.2, 0.3),
                weight: 1.5,
                time: None,
            }
        );
        assert_eq!(beam.records()[1].code, 3);
        assert_eq!(beam.records()[1].total_momentum(), 2.0);
    }

    #[test]
    fn test_mars_beam_with_time() {
        let matrix =
            DMatrix::from_row_slice(1, 9, &[8.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.2, 1.0, 3e-9]);
        let beam = MarsBeam::from_matrix(&matrix).unwrap();
        assert!(beam.time_included());
        assert_eq!(beam.records()[0].time, Some(3e-9));
    }

    #[test]
    fn test_mars_beam_bad_width() {
        let matrix = DMatrix::<f64>::zeros(3, 7);
        assert_eq!(
            MarsBeam::from_matrix(&matrix),
            Err(BeamError::InvalidColumnCount(7))
        );
        let matrix = DMatrix::<f64>::zeros(3, 12);
        assert_eq!(
            MarsBeam::from_matrix(&matrix),
            Err(BeamError::InvalidColumnCount(12))
        );
    }

    #[test]
    fn test_g4bl_beam_to_matrix() {
        let track = G4blTrack {
            position: Vector3::new(10.0, 20.0, 30.0),
            momentum: Vector3::new(100.0, 200.0, 300.0),
            time: 4.0,
            pdg_id: -13,
            event_id: 7,
            track_id: 0,
            parent_id: 0,
            weight: 1.0,
        };
        let beam = G4blBeam::new(vec![track.clone(), track]);
        let matrix = beam.to_matrix();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), G4BL_COLUMNS);
        assert_eq!(matrix[(1, 0)], 10.0);
        assert_eq!(matrix[(1, 7)], -13.0);
        assert_eq!(matrix[(1, 8)], 7.0);
        assert_eq!(matrix[(0, 11)], 1.0);
    }
}
