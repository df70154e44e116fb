//! # Constants and type definitions for mars2g4bl
//!
//! This module centralizes the **unit conversion factors**, the **record layouts** of the
//! MARS and G4Beamline beam files, and a few **type aliases** used throughout the crate.
//!
//! ## Overview
//!
//! - MARS works in **cm**, **GeV/c** and **seconds**.
//! - G4Beamline expects **mm**, **MeV/c** and **nanoseconds**.
//! - MARS rows carry 8 columns, or 9 when the time of record is included.
//! - G4Beamline rows always carry 12 columns.

// -------------------------------------------------------------------------------------------------
// Unit conversions (MARS → G4Beamline)
// -------------------------------------------------------------------------------------------------

/// Centimeters → millimeters
pub const CM_TO_MM: f64 = 10.0;

/// GeV/c → MeV/c
pub const GEV_TO_MEV: f64 = 1_000.0;

/// Seconds → nanoseconds
pub const S_TO_NS: f64 = 1e9;

// -------------------------------------------------------------------------------------------------
// Record layouts
// -------------------------------------------------------------------------------------------------

/// Width of a MARS row without the time column: `i x y z px py pz w`
pub const MARS_COLUMNS_NO_TIME: usize = 8;

/// Width of a MARS row with the time column: `i x y z px py pz w t`
pub const MARS_COLUMNS_WITH_TIME: usize = 9;

/// Width of a G4Beamline BLTrackFile row
pub const G4BL_COLUMNS: usize = 12;

/// Column names of a G4Beamline BLTrackFile row, in file order
pub const G4BL_COLUMN_NAMES: [&str; G4BL_COLUMNS] = [
    "x", "y", "z", "Px", "Py", "Pz", "t", "PDGid", "EventID", "TrackID", "ParentID", "Weight",
];

/// Units of a G4Beamline BLTrackFile row, in file order
pub const G4BL_COLUMN_UNITS: [&str; G4BL_COLUMNS] = [
    "mm", "mm", "mm", "MeV/c", "MeV/c", "MeV/c", "ns", "-", "-", "-", "-", "-",
];

/// TrackID written for every converted particle (primary)
pub const PRIMARY_TRACK_ID: i32 = 0;

/// ParentID written for every converted particle (primary)
pub const PRIMARY_PARENT_ID: i32 = 0;

/// Extension of the G4Beamline file derived from the MARS file name
pub const G4BL_EXTENSION: &str = "beam";

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Momentum in MeV/c
pub type MeV = f64;
/// Momentum in GeV/c
pub type GeV = f64;
/// PDG Monte Carlo particle numbering
pub type PdgId = i32;
/// 1-based event identifier
pub type EventId = u64;
