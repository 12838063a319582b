use std::fs::File;
use std::io::{self, Read, Seek, SeekFrom};
use std::path::Path;
use std::time::Instant;

use log::trace;

use crate::process::scan::{HeaderScanner, Terminator};
use crate::structs::header::SequenceHeader;
use crate::utils::errors::{LoadError, ReadError, ScanError};

/// Random access to the frames of the binary payload.
///
/// Frames are `columns * rows` bytes each, stored back to back right after
/// the header sentinel. The reader never clamps indices; navigation does that.
///
/// # Example
///
/// ```rust
/// use std::io::Cursor;
/// use mhaseq::process::reader::FrameReader;
/// use mhaseq::structs::header::SequenceHeader;
///
/// let header = SequenceHeader { columns: 2, rows: 1, frame_count: 2 };
/// let data = b"hdr\nABCD".to_vec();
/// let mut reader = FrameReader::new(Cursor::new(data), header, 4)?;
///
/// assert_eq!(reader.read_frame(1)?, b"CD");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct FrameReader<R> {
    source: R,
    header: SequenceHeader,
    payload_start: u64,
    source_len: u64,
}

impl FrameReader<File> {
    /// Opens `path`, locating the payload by scanning its header up to the
    /// data sentinel.
    pub fn open<P: AsRef<Path>>(path: P, header: SequenceHeader) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let payload_start = HeaderScanner::open(path, Terminator::Sentinel)?.payload_offset()?;

        let file = File::open(path).map_err(|source| ScanError::FileNotFound {
            path: path.to_path_buf(),
            source,
        })?;

        let reader = Self::new(file, header, payload_start).map_err(ScanError::from)?;
        trace!("Payload of {} starts at byte {payload_start}", path.display());
        Ok(reader)
    }
}

impl<R: Read + Seek> FrameReader<R> {
    pub fn new(mut source: R, header: SequenceHeader, payload_start: u64) -> io::Result<Self> {
        let source_len = source.seek(SeekFrom::End(0))?;

        Ok(Self {
            source,
            header,
            payload_start,
            source_len,
        })
    }

    pub fn header(&self) -> &SequenceHeader {
        &self.header
    }

    pub fn payload_start(&self) -> u64 {
        self.payload_start
    }

    /// Frames fully present in the source, which may be fewer than declared.
    pub fn available_frames(&self) -> u64 {
        let payload = self.source_len.saturating_sub(self.payload_start);
        payload
            .checked_div(self.header.frame_len())
            .unwrap_or(0)
            .min(self.header.frame_count as u64)
    }

    /// Absolute byte offset of frame `index`, or `None` past `u64::MAX`.
    pub fn frame_offset(&self, index: usize) -> Option<u64> {
        (index as u64)
            .checked_mul(self.header.frame_len())?
            .checked_add(self.payload_start)
    }

    /// Checks that frame `index` is declared and fully present, returning
    /// its offset and length.
    fn locate(&self, index: usize) -> Result<(u64, u64), ReadError> {
        let count = self.header.frame_count;
        if index >= count {
            return Err(ReadError::FrameOutOfRange { index, count });
        }

        let frame_len = self.header.frame_len();
        let truncated = |available| ReadError::TruncatedRead {
            index,
            expected: frame_len,
            available,
        };

        let offset = self.frame_offset(index).ok_or(truncated(0))?;
        let available = self.source_len.saturating_sub(offset);
        if available < frame_len {
            return Err(truncated(available));
        }

        Ok((offset, frame_len))
    }

    /// Reads frame `index` into `buf`, which must be exactly one frame long.
    ///
    /// `buf` is left untouched on error.
    pub fn read_frame_into(&mut self, index: usize, buf: &mut [u8]) -> Result<(), ReadError> {
        let (offset, frame_len) = self.locate(index)?;
        if buf.len() as u64 != frame_len {
            return Err(ReadError::BufferSize {
                expected: frame_len as usize,
                actual: buf.len(),
            });
        }

        self.read_at(index, offset, buf)
    }

    /// Reads frame `index` into a freshly allocated buffer.
    ///
    /// Nothing is allocated unless the whole frame is present in the source.
    pub fn read_frame(&mut self, index: usize) -> Result<Vec<u8>, ReadError> {
        let (offset, frame_len) = self.locate(index)?;
        let mut buf = vec![0u8; frame_len as usize];
        self.read_at(index, offset, &mut buf)?;
        Ok(buf)
    }

    fn read_at(&mut self, index: usize, offset: u64, buf: &mut [u8]) -> Result<(), ReadError> {
        let start = Instant::now();
        let expected = buf.len() as u64;
        let available = self.source_len.saturating_sub(offset);

        self.source.seek(SeekFrom::Start(offset))?;
        self.source.read_exact(buf).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => ReadError::TruncatedRead {
                index,
                expected,
                available,
            },
            _ => ReadError::Io(e),
        })?;

        trace!(
            "Read frame {index} ({} bytes at {offset}) in {:.3} ms",
            buf.len(),
            start.elapsed().as_secs_f64() * 1000.0
        );

        Ok(())
    }
}
