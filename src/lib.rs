//! # mars2g4bl
//!
//! Conversion of particle beams recorded by the **MARS** Monte Carlo transport code into the
//! ASCII beam format read by **G4Beamline**.
//!
//! The conversion converts units (cm → mm, GeV/c → MeV/c, s → ns), maps MARS particle codes
//! to PDG ids, applies an optional momentum window, rescales weights, optionally duplicates
//! particles according to their weight, optionally keeps a random fraction of the beam and
//! finally numbers the events `1..=n`.
//!
//! ```rust,no_run
//! use camino::Utf8Path;
//! use mars2g4bl::prelude::*;
//! use rand::{rngs::StdRng, SeedableRng};
//!
//! # fn run() -> Result<(), BeamError> {
//! let config = ConversionConfig::builder()
//!     .p_cut(100.0, 500.0)
//!     .duplicate(true)
//!     .fraction(0.1)
//!     .build()?;
//!
//! let input = Utf8Path::new("run1.dat");
//! let mut rng = StdRng::from_os_rng();
//! let report = convert_file(input, &default_output_path(input), &config, &mut rng)?;
//! println!("{report}");
//! # Ok(()) }
//! ```
pub mod beam;
pub mod beam_errors;
pub mod config;
pub mod constants;
pub mod converter;
pub mod particle;

pub use beam::{G4blBeam, G4blTrack, MarsBeam, MarsRecord};
pub use beam_errors::BeamError;
pub use config::{ConversionConfig, MomentumCut};
pub use particle::MarsParticle;

pub mod prelude {
    pub use crate::beam::{
        g4bl_writer::{read_g4bl_file, write_g4bl_file},
        mars_reader::read_mars_file,
        G4blBeam, G4blTrack, MarsBeam, MarsRecord,
    };
    pub use crate::beam_errors::BeamError;
    pub use crate::config::{ConfigError, ConversionConfig, MomentumCut, PartialConfig};
    pub use crate::converter::{
        convert, convert_file, convert_matrix, default_output_path, ConversionReport,
    };
    pub use crate::particle::MarsParticle;
}
