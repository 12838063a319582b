//! Sequence geometry from the `DimSize` header entry.

use std::fmt::{Display, Formatter};
use std::path::Path;

use log::debug;

use crate::process::scan::{HeaderLine, HeaderScanner, Terminator};
use crate::utils::errors::{HeaderError, LoadError, ScanError};

pub const DIM_SIZE_KEY: &str = "DimSize";

/// Frame geometry of a sequence: every frame is `columns * rows` bytes of
/// 8-bit grayscale.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SequenceHeader {
    pub columns: usize,
    pub rows: usize,
    pub frame_count: usize,
}

impl Display for SequenceHeader {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}x{}, {} frames",
            self.columns, self.rows, self.frame_count
        )
    }
}

impl SequenceHeader {
    /// Byte length of one frame, saturating at `u64::MAX`.
    pub fn frame_len(&self) -> u64 {
        (self.columns as u64).saturating_mul(self.rows as u64)
    }

    /// Byte length of the whole payload, or `None` if it does not fit in
    /// a `u64`.
    pub fn payload_len(&self) -> Option<u64> {
        (self.columns as u64)
            .checked_mul(self.rows as u64)?
            .checked_mul(self.frame_count as u64)
    }

    /// Scans `path` up to the first blank line or the data sentinel.
    pub fn read_path<P: AsRef<Path>>(path: P) -> Result<Self, LoadError> {
        let scanner = HeaderScanner::open(path, Terminator::BlankLine)?;
        Self::from_lines(scanner)
    }

    /// Takes the first `DimSize` line from `lines`.
    pub fn from_lines<I>(lines: I) -> Result<Self, LoadError>
    where
        I: IntoIterator<Item = Result<HeaderLine, ScanError>>,
    {
        for line in lines {
            let line = line?;
            let Some((DIM_SIZE_KEY, value)) = line.key_value() else {
                continue;
            };

            let header = Self::parse_dim_size(value)?;
            debug!("DimSize on line {}: {header}", line.number);
            return Ok(header);
        }

        Err(HeaderError::MissingDimensions.into())
    }

    /// Parses the value of a `DimSize` entry: `<columns> <rows> <frames>`.
    pub fn parse_dim_size(value: &str) -> Result<Self, HeaderError> {
        let malformed = || HeaderError::MalformedDimensions(value.to_string());

        let fields = value
            .split_whitespace()
            .map(|token| token.parse::<usize>().map_err(|_| malformed()))
            .collect::<Result<Vec<_>, _>>()?;

        let [columns, rows, frame_count] = fields[..] else {
            return Err(malformed());
        };

        if columns == 0 || rows == 0 {
            return Err(HeaderError::ZeroDimensions { columns, rows });
        }

        let header = Self {
            columns,
            rows,
            frame_count,
        };

        // Every frame offset must be addressable.
        if header.payload_len().is_none() {
            return Err(malformed());
        }

        Ok(header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn scan(data: &str) -> Result<SequenceHeader, LoadError> {
        SequenceHeader::from_lines(HeaderScanner::new(
            Cursor::new(data.as_bytes()),
            Terminator::BlankLine,
        ))
    }

    #[test]
    fn parses_dim_size() {
        let header = scan("NDims = 3\nDimSize = 640 480 25\nElementType = MET_UCHAR\n").unwrap();
        assert_eq!(
            header,
            SequenceHeader {
                columns: 640,
                rows: 480,
                frame_count: 25
            }
        );
        assert_eq!(header.frame_len(), 307_200);
        assert_eq!(header.to_string(), "640x480, 25 frames");
    }

    #[test]
    fn first_dim_size_wins() {
        let header = scan("DimSize = 2 2 3\nDimSize = 4 4 4\n").unwrap();
        assert_eq!(header.frame_count, 3);
    }

    #[test]
    fn missing_dim_size() {
        let err = scan("NDims = 3\nElementDataFile = LOCAL\nDimSize = 1 1 1\n").unwrap_err();
        assert!(err.is_missing_dimensions());

        // A blank line ends the metadata scan before DimSize is reached.
        let err = scan("NDims = 3\n\nDimSize = 1 1 1\n").unwrap_err();
        assert!(err.is_missing_dimensions());
    }

    #[test]
    fn malformed_dim_size() {
        for value in ["2 2", "2 2 x", "2 2 3 4", "-2 2 3", ""] {
            assert!(
                matches!(
                    SequenceHeader::parse_dim_size(value),
                    Err(HeaderError::MalformedDimensions(_))
                ),
                "{value:?}"
            );
        }

        assert!(matches!(
            SequenceHeader::parse_dim_size("0 2 3"),
            Err(HeaderError::ZeroDimensions { .. })
        ));
        assert_eq!(SequenceHeader::parse_dim_size("2 2 0").unwrap().frame_count, 0);
    }

    #[test]
    fn large_payload_len() {
        let header = SequenceHeader::parse_dim_size("1024 1024 8192").unwrap();
        assert_eq!(header.payload_len(), Some(8_589_934_592));
    }

    #[test]
    fn overflowing_dim_size() {
        for value in [
            "4294967296 4294967296 1",
            "18446744073709551615 2 1",
            "4294967296 4294967295 2",
        ] {
            assert!(
                matches!(
                    SequenceHeader::parse_dim_size(value),
                    Err(HeaderError::MalformedDimensions(_))
                ),
                "{value:?}"
            );
        }

        let err = scan("DimSize = 4294967296 4294967296 1\nElementDataFile = LOCAL\n").unwrap_err();
        assert!(err.is_missing_dimensions());

        let header = SequenceHeader {
            columns: usize::MAX,
            rows: usize::MAX,
            frame_count: 2,
        };
        assert_eq!(header.frame_len(), u64::MAX);
        assert_eq!(header.payload_len(), None);
    }
}
