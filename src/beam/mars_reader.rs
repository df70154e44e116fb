//! # MARS beam file reader
//!
//! Reads the ASCII beam records written by MARS into a dense numeric matrix, one particle
//! per row. Every row holds `i x y z px py pz w` and, for some MARS runs, a trailing time `t`.
//!
//! ## Format
//! -----------------
//! * Fields are separated by any amount of whitespace.
//! * Blank lines and lines starting with `#` are ignored.
//! * Fortran double-precision exponents (`1.5D-03`) are accepted.
//! * All data rows must share the width of the first data row.
//!
//! The reader does not interpret the columns: width validation (8 or 9) happens in
//! [`MarsBeam::from_matrix`](crate::beam::MarsBeam::from_matrix).
//!
//! ## Error Handling
//! -----------------
//! Failures are reported as [`BeamError::Load`] with the 1-based line number and a
//! [`ParseBeamError`] payload. An input without any data row reports line 0.
use std::{
    fs::File,
    io::{BufRead, BufReader},
};

use camino::Utf8Path;
use nalgebra::DMatrix;

use crate::beam_errors::{BeamError, ParseBeamError};

/// Parse one floating-point token, with a fallback for Fortran `D` exponents.
fn parse_value(token: &str) -> Result<f64, ParseBeamError> {
    token
        .parse::<f64>()
        .or_else(|_| token.replace(['D', 'd'], "E").parse::<f64>())
        .map_err(|_| ParseBeamError::InvalidNumber(token.to_string()))
}

/// Read a MARS beam from any buffered source.
///
/// Arguments
/// -----------------
/// * `reader`: the text source.
///
/// Return
/// ----------
/// * A `n_particles × n_columns` matrix, or a [`BeamError`] on I/O or parse failure.
pub fn read_mars_matrix<R: BufRead>(reader: R) -> Result<DMatrix<f64>, BeamError> {
    let mut data: Vec<f64> = Vec::new();
    let mut n_columns: Option<usize> = None;
    let mut n_rows = 0;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let content = line.trim();
        if content.is_empty() || content.starts_with('#') {
            continue;
        }

        let load_error = |source| BeamError::Load {
            line: index + 1,
            source,
        };

        let start = data.len();
        for token in content.split_whitespace() {
            data.push(parse_value(token).map_err(load_error)?);
        }
        let width = data.len() - start;

        let expected = *n_columns.get_or_insert(width);
        if width != expected {
            return Err(load_error(ParseBeamError::RaggedRow {
                expected,
                found: width,
            }));
        }
        n_rows += 1;
    }

    let n_columns = n_columns.ok_or(BeamError::Load {
        line: 0,
        source: ParseBeamError::EmptyFile,
    })?;

    Ok(DMatrix::from_row_slice(n_rows, n_columns, &data))
}

/// Read a MARS beam file.
///
/// See also
/// ------------
/// * [`read_mars_matrix`] – Parsing rules and errors.
pub fn read_mars_file(path: &Utf8Path) -> Result<DMatrix<f64>, BeamError> {
    let file = File::open(path)?;
    let matrix = read_mars_matrix(BufReader::new(file))?;
    tracing::debug!(
        path = %path,
        rows = matrix.nrows(),
        columns = matrix.ncols(),
        "MARS beam file loaded"
    );
    Ok(matrix)
}

#[cfg(test)]
mod mars_reader_test {
    use super::*;

    #[test]
    fn test_read_8_columns() {
        let input = "\
# MARS beam
1 1.0 2.0 3.0 0.1 0.2 0.3 1.0
3   -1.5e0 0 0    0 0 0.25  0.5

";
        let matrix = read_mars_matrix(input.as_bytes()).unwrap();
        assert_eq!(matrix.nrows(), 2);
        assert_eq!(matrix.ncols(), 8);
        assert_eq!(matrix[(0, 3)], 3.0);
        assert_eq!(matrix[(1, 0)], 3.0);
        assert_eq!(matrix[(1, 1)], -1.5);
        assert_eq!(matrix[(1, 7)], 0.5);
    }

    #[test]
    fn test_read_fortran_exponent() {
        let input = "8 0.0 0.0 0.0 0.0 0.0 1.5D-01 2.0d0 1.0D-09\n";
        let matrix = read_mars_matrix(input.as_bytes()).unwrap();
        assert_eq!(matrix.ncols(), 9);
        assert_eq!(matrix[(0, 6)], 0.15);
        assert_eq!(matrix[(0, 7)], 2.0);
        assert_eq!(matrix[(0, 8)], 1e-9);
    }

    #[test]
    fn test_ragged_row() {
        let input = "1 0 0 0 0 0 1 1\n1 0 0 0 0 0 1\n";
        assert_eq!(
            read_mars_matrix(input.as_bytes()),
            Err(BeamError::Load {
                line: 2,
                source: ParseBeamError::RaggedRow {
                    expected: 8,
                    found: 7
                }
            })
        );
    }

    #[test]
    fn test_invalid_number() {
        let input = "\n1 0 0 0 0 0 1 abc\n";
        assert_eq!(
            read_mars_matrix(input.as_bytes()),
            Err(BeamError::Load {
                line: 2,
                source: ParseBeamError::InvalidNumber("abc".into())
            })
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(
            read_mars_matrix("# only a comment\n\n".as_bytes()),
            Err(BeamError::Load {
                line: 0,
                source: ParseBeamError::EmptyFile
            })
        );
    }

    #[test]
    fn test_missing_file() {
        let result = read_mars_file(Utf8Path::new("tests/data/does_not_exist.dat"));
        assert!(matches!(result, Err(BeamError::IoError(_))));
    }
}
