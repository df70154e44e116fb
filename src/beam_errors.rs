use thiserror::Error;

use crate::config::ConfigError;

/// Line-level failures while reading a MARS beam file.
///
/// Variants
/// -----------------
/// * `EmptyFile` – The file holds no data row.
/// * `InvalidNumber` – A token could not be parsed as a floating-point number.
/// * `RaggedRow` – A row does not have the width of the first data row.
#[derive(Error, Debug, PartialEq)]
pub enum ParseBeamError {
    #[error("The beam file contains no particle")]
    EmptyFile,
    #[error("Invalid number: {0}")]
    InvalidNumber(String),
    #[error("Expected {expected} columns, found {found}")]
    RaggedRow { expected: usize, found: usize },
}

#[derive(Error, Debug)]
pub enum BeamError {
    #[error("Unable to perform file operation: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV error while handling the G4Beamline file: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Unable to load the MARS beam file at line {line}: {source}")]
    Load {
        line: usize,
        #[source]
        source: ParseBeamError,
    },

    #[error(
        "Not a MARS beam: rows have {0} columns, expected 8 (no time) or 9 (time included)"
    )]
    InvalidColumnCount(usize),

    #[error("Unknown MARS particle code: {0}")]
    UnknownParticleCode(i32),

    #[error("Duplication by weight would produce {copies} particles, more than can be allocated")]
    DuplicationOverflow { copies: f64 },

    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("UTF-8 Path error: {0}")]
    Utf8PathError(String),
}

impl PartialEq for BeamError {
    fn eq(&self, other: &Self) -> bool {
        use BeamError::*;
        match (self, other) {
            // Not comparable: equal when the variant matches
            (IoError(_), IoError(_)) => true,
            (CsvError(_), CsvError(_)) => true,

            (
                Load {
                    line: l1,
                    source: s1,
                },
                Load {
                    line: l2,
                    source: s2,
                },
            ) => l1 == l2 && s1 == s2,
            (InvalidColumnCount(a), InvalidColumnCount(b)) => a == b,
            (UnknownParticleCode(a), UnknownParticleCode(b)) => a == b,
            (DuplicationOverflow { copies: a }, DuplicationOverflow { copies: b }) => a == b,
            (Config(a), Config(b)) => a == b,
            (Utf8PathError(a), Utf8PathError(b)) => a == b,

            _ => false,
        }
    }
}
