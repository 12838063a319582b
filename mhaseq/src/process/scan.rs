//! Line scanner for the text header of a sequence file.
//!
//! The header is a run of `Key = Value` lines terminated by the
//! `ElementDataFile = LOCAL` sentinel; the pixel payload begins with the byte
//! right after the sentinel's line terminator. Lines are read as raw bytes so
//! the scanner can count exactly how much of the file the header occupies,
//! whatever the line-ending width.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use log::trace;

use crate::utils::errors::ScanError;

/// Key of the line that marks the end of the text header.
pub const DATA_FILE_KEY: &str = "ElementDataFile";
/// Value of [`DATA_FILE_KEY`] announcing an inline binary payload.
pub const DATA_FILE_LOCAL: &str = "LOCAL";

/// Where a scan stops, besides the sentinel line which always ends it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminator {
    /// Stop at the first empty line (metadata scans).
    BlankLine,
    /// Only the sentinel ends the scan (payload-locating scans).
    Sentinel,
}

/// A single header line with its terminator stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct HeaderLine {
    /// 1-based line number.
    pub number: usize,
    /// Byte offset of the first byte of this line.
    pub offset: u64,
    pub text: String,
}

impl HeaderLine {
    /// Splits `Key = Value` on the first `=`, trimming both sides.
    pub fn key_value(&self) -> Option<(&str, &str)> {
        split_key_value(&self.text)
    }

    pub fn is_sentinel(&self) -> bool {
        matches!(
            self.key_value(),
            Some((DATA_FILE_KEY, value)) if value == DATA_FILE_LOCAL
        )
    }
}

pub fn split_key_value(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.split_once('=')?;
    Some((key.trim(), value.trim()))
}

/// Lazy iterator over header lines.
///
/// The scanner never interprets line content apart from recognising the
/// sentinel; it keeps a running count of consumed bytes so that a
/// [`Terminator::Sentinel`] scan yields the payload offset.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use mhaseq::process::scan::{HeaderScanner, Terminator};
///
/// let data = b"NDims = 3\r\nElementDataFile = LOCAL\r\n\x00\x01";
/// let scanner = HeaderScanner::new(Cursor::new(&data[..]), Terminator::Sentinel);
/// assert_eq!(scanner.payload_offset()?, 36);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct HeaderScanner<R> {
    reader: R,
    terminator: Terminator,
    consumed: u64,
    line_number: usize,
    sentinel_found: bool,
    done: bool,
    buf: Vec<u8>,
}

impl HeaderScanner<BufReader<File>> {
    /// Opens `path` and positions the scanner at the start of the file.
    pub fn open<P: AsRef<Path>>(path: P, terminator: Terminator) -> Result<Self, ScanError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| ScanError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        Ok(Self::new(BufReader::new(file), terminator))
    }
}

impl<R: BufRead> HeaderScanner<R> {
    pub fn new(reader: R, terminator: Terminator) -> Self {
        Self {
            reader,
            terminator,
            consumed: 0,
            line_number: 0,
            sentinel_found: false,
            done: false,
            buf: Vec::with_capacity(256),
        }
    }

    /// Bytes consumed so far, line terminators included.
    pub fn consumed(&self) -> u64 {
        self.consumed
    }

    pub fn sentinel_found(&self) -> bool {
        self.sentinel_found
    }

    /// Drains the rest of the header and returns the offset of the first
    /// payload byte.
    pub fn payload_offset(mut self) -> Result<u64, ScanError> {
        for line in self.by_ref() {
            line?;
        }

        if !self.sentinel_found {
            return Err(ScanError::MissingDataSentinel);
        }

        trace!("Payload starts at byte {}", self.consumed);
        Ok(self.consumed)
    }
}

impl<R: BufRead> Iterator for HeaderScanner<R> {
    type Item = Result<HeaderLine, ScanError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        self.buf.clear();
        let read = match self.reader.read_until(b'\n', &mut self.buf) {
            Ok(read) => read,
            Err(e) => {
                self.done = true;
                return Some(Err(e.into()));
            }
        };

        if read == 0 {
            self.done = true;
            return None;
        }

        let offset = self.consumed;
        self.consumed += read as u64;
        self.line_number += 1;

        let mut bytes = &self.buf[..];
        if let Some(rest) = bytes.strip_suffix(b"\n") {
            bytes = rest;
        }
        if let Some(rest) = bytes.strip_suffix(b"\r") {
            bytes = rest;
        }

        let line = HeaderLine {
            number: self.line_number,
            offset,
            text: String::from_utf8_lossy(bytes).into_owned(),
        };

        if self.terminator == Terminator::BlankLine && line.text.trim().is_empty() {
            self.done = true;
            return None;
        }

        if line.is_sentinel() {
            self.done = true;
            self.sentinel_found = true;
        }

        Some(Ok(line))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &[u8] = b"ObjectType = Image\nNDims = 3\nDimSize = 2 2 3\nElementDataFile = LOCAL\n";

    #[test]
    fn stops_after_sentinel() {
        let mut data = HEADER.to_vec();
        data.extend_from_slice(b"\nbinary\n");

        let lines = HeaderScanner::new(Cursor::new(&data), Terminator::Sentinel)
            .collect::<Result<Vec<_>, _>>()
            .unwrap();

        assert_eq!(lines.len(), 4);
        assert!(lines[3].is_sentinel());
        assert_eq!(lines[2].key_value(), Some(("DimSize", "2 2 3")));
        assert_eq!(lines[1].offset, 19);
    }

    #[test]
    fn payload_offset_counts_crlf() {
        let unix = HeaderScanner::new(Cursor::new(HEADER), Terminator::Sentinel)
            .payload_offset()
            .unwrap();
        assert_eq!(unix, HEADER.len() as u64);

        let dos = String::from_utf8_lossy(HEADER).replace('\n', "\r\n");
        let offset = HeaderScanner::new(Cursor::new(dos.as_bytes()), Terminator::Sentinel)
            .payload_offset()
            .unwrap();
        assert_eq!(offset, dos.len() as u64);
        assert_eq!(offset, unix + 4);
    }

    #[test]
    fn blank_line_ends_metadata_scan() {
        let data = b"NDims = 3\n\nDimSize = 1 1 1\nElementDataFile = LOCAL\n";

        let count = HeaderScanner::new(Cursor::new(&data[..]), Terminator::BlankLine).count();
        assert_eq!(count, 1);

        let count = HeaderScanner::new(Cursor::new(&data[..]), Terminator::Sentinel).count();
        assert_eq!(count, 4);
    }

    #[test]
    fn missing_sentinel() {
        let data = b"NDims = 3\nDimSize = 1 1 1\n";
        let result = HeaderScanner::new(Cursor::new(&data[..]), Terminator::Sentinel).payload_offset();
        assert!(matches!(result, Err(ScanError::MissingDataSentinel)));
    }

    #[test]
    fn sentinel_tolerates_spacing() {
        let data = b"ElementDataFile=LOCAL\n\xff\xfe";
        let offset = HeaderScanner::new(Cursor::new(&data[..]), Terminator::Sentinel)
            .payload_offset()
            .unwrap();
        assert_eq!(offset, 22);
    }

    #[test]
    fn open_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result = HeaderScanner::open(dir.path().join("nope.mha"), Terminator::Sentinel);
        assert!(matches!(result, Err(ScanError::FileNotFound { .. })));
    }
}
