//! # G4Beamline BLTrackFile writer
//!
//! Serializes a [`G4blBeam`] into the ASCII BLTrackFile layout read by G4Beamline's
//! `beam ascii` command:
//!
//! ```text
//! #BLTrackFile <title>
//! #x y z Px Py Pz t PDGid EventID TrackID ParentID Weight
//! #mm mm mm MeV/c MeV/c MeV/c ns - - - - -
//! 10.0 20.0 30.0 100.0 200.0 989.9 0.0 2212 1 0 0 1.0
//! ```
//!
//! Rows are space-separated; the PDG, event, track and parent ids are written as integers.
//! [`write_g4bl_file`] writes into a temporary sibling file and renames it once complete, so
//! a failed conversion never leaves a truncated beam behind.
//!
//! [`read_g4bl_beam`] parses the same layout back, mostly to verify written files.
use std::{
    fs::File,
    io::{BufWriter, Read, Write},
};

use camino::{Utf8Path, Utf8PathBuf};
use itertools::Itertools;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::{
    beam::{G4blBeam, G4blTrack},
    beam_errors::BeamError,
    constants::{EventId, PdgId, G4BL_COLUMN_NAMES, G4BL_COLUMN_UNITS},
};

/// Flat, serializable view of a [`G4blTrack`], in file column order.
#[derive(Debug, Serialize, Deserialize)]
struct G4blRow {
    x: f64,
    y: f64,
    z: f64,
    px: f64,
    py: f64,
    pz: f64,
    t: f64,
    pdg_id: PdgId,
    event_id: EventId,
    track_id: i32,
    parent_id: i32,
    weight: f64,
}

impl From<&G4blTrack> for G4blRow {
    fn from(track: &G4blTrack) -> Self {
        G4blRow {
            x: track.position.x,
            y: track.position.y,
            z: track.position.z,
            px: track.momentum.x,
            py: track.momentum.y,
            pz: track.momentum.z,
            t: track.time,
            pdg_id: track.pdg_id,
            event_id: track.event_id,
            track_id: track.track_id,
            parent_id: track.parent_id,
            weight: track.weight,
        }
    }
}

impl From<G4blRow> for G4blTrack {
    fn from(row: G4blRow) -> Self {
        G4blTrack {
            position: Vector3::new(row.x, row.y, row.z),
            momentum: Vector3::new(row.px, row.py, row.pz),
            time: row.t,
            pdg_id: row.pdg_id,
            event_id: row.event_id,
            track_id: row.track_id,
            parent_id: row.parent_id,
            weight: row.weight,
        }
    }
}

/// Write a beam in BLTrackFile format to any writer.
///
/// Arguments
/// -----------------
/// * `writer`: destination; it is flushed before returning.
/// * `beam`: the tracks to write, in order.
/// * `title`: free text placed after `#BLTrackFile` on the first line.
pub fn write_g4bl_beam<W: Write>(
    mut writer: W,
    beam: &G4blBeam,
    title: &str,
) -> Result<(), BeamError> {
    writeln!(writer, "#BLTrackFile {title}")?;
    writeln!(writer, "#{}", G4BL_COLUMN_NAMES.iter().join(" "))?;
    writeln!(writer, "#{}", G4BL_COLUMN_UNITS.iter().join(" "))?;

    let mut csv_writer = csv::WriterBuilder::new()
        .delimiter(b' ')
        .has_headers(false)
        .from_writer(writer);
    for track in beam.tracks() {
        csv_writer.serialize(G4blRow::from(track))?;
    }

    let mut writer = csv_writer.into_inner().map_err(|e| e.into_error())?;
    writer.flush()?;
    Ok(())
}

fn temporary_path(path: &Utf8Path) -> Result<Utf8PathBuf, BeamError> {
    let file_name = path
        .file_name()
        .ok_or_else(|| BeamError::Utf8PathError(format!("not a file path: {path}")))?;
    Ok(path.with_file_name(format!(".{file_name}.part")))
}

/// Write a beam in BLTrackFile format to `path`, replacing any existing file.
///
/// The file only appears at `path` once fully written.
pub fn write_g4bl_file(path: &Utf8Path, beam: &G4blBeam, title: &str) -> Result<(), BeamError> {
    let tmp_path = temporary_path(path)?;

    let result = File::create(&tmp_path)
        .map_err(BeamError::from)
        .and_then(|file| write_g4bl_beam(BufWriter::new(file), beam, title))
        .and_then(|_| std::fs::rename(&tmp_path, path).map_err(BeamError::from));

    if result.is_err() {
        let _ = std::fs::remove_file(&tmp_path);
    }
    result?;

    tracing::debug!(path = %path, tracks = beam.len(), "G4Beamline beam file written");
    Ok(())
}

/// Read a BLTrackFile written by [`write_g4bl_beam`].
pub fn read_g4bl_beam<R: Read>(reader: R) -> Result<G4blBeam, BeamError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(b' ')
        .comment(Some(b'#'))
        .has_headers(false)
        .from_reader(reader);

    let tracks = csv_reader
        .deserialize::<G4blRow>()
        .map_ok(G4blTrack::from)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(G4blBeam::new(tracks))
}

pub fn read_g4bl_file(path: &Utf8Path) -> Result<G4blBeam, BeamError> {
    read_g4bl_beam(File::open(path)?)
}
