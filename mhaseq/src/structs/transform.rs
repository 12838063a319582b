//! Per-frame tracking transforms and their validity flags.
//!
//! Each frame of a tracked sequence carries header entries such as
//!
//! ```text
//! Seq_Frame0000_ProbeToTrackerTransform = -0.224 -0.529 0.818 212.75 0.520 0.645 0.559 -14.04 -0.824 0.551 0.130 -26.11 0 0 0 1
//! Seq_Frame0000_ProbeToTrackerTransformStatus = OK
//! ```
//!
//! Records are associated with frames by the order in which their lines
//! appear: the i-th transform line belongs to frame i, whatever number is
//! embedded in its key.

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

use log::Level::Warn;
use log::{debug, trace, warn};
use nalgebra::Matrix4;

use crate::log_or_err;
use crate::process::scan::{HeaderLine, HeaderScanner, Terminator};
use crate::structs::matrix::{AFFINE_COEFFICIENTS, affine_from_coefficients};
use crate::utils::errors::{LoadError, ScanError, TransformError};

/// Marker that opens every frame-scoped key.
pub const FRAME_PREFIX: &str = "Seq_Frame";
/// Marker that closes the transform family name in a frame-scoped key.
pub const TRANSFORM_MARKER: &str = "Transform";
pub const STATUS_SUFFIX: &str = "Status";

/// Transform roles whose lines are read into the transform table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransformRole {
    ProbeToTracker,
    UltrasoundToTracker,
}

impl TransformRole {
    pub const ALL: [TransformRole; 2] = [
        TransformRole::ProbeToTracker,
        TransformRole::UltrasoundToTracker,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TransformRole::ProbeToTracker => "ProbeToTracker",
            TransformRole::UltrasoundToTracker => "UltrasoundToTracker",
        }
    }

    /// Matches `<FrameIdentifier>_<Role>Transform`, returning the role and
    /// the frame identifier.
    fn match_transform_key(key: &str) -> Option<(Self, &str)> {
        Self::ALL.into_iter().find_map(|role| {
            let rest = key
                .strip_suffix(TRANSFORM_MARKER)?
                .strip_suffix(role.as_str())?;
            Some((role, rest.strip_suffix('_').unwrap_or(rest)))
        })
    }

    /// Matches `<FrameIdentifier>_<Role>TransformStatus`.
    fn match_status_key(key: &str) -> Option<Self> {
        let rest = key.strip_suffix(STATUS_SUFFIX)?;
        Self::match_transform_key(rest).map(|(role, _)| role)
    }
}

impl Display for TransformRole {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One transform line of the header.
#[derive(Debug, Clone, PartialEq)]
pub struct TransformRecord {
    /// Position among the transform lines; this is the frame it belongs to.
    pub frame_index: usize,
    /// Top three rows of the 4x4 affine matrix, row-major.
    pub coefficients: [f64; AFFINE_COEFFICIENTS],
    /// Full header key, e.g. `Seq_Frame0000_ProbeToTrackerTransform`.
    pub source_name: String,
    /// Key with the role suffix removed, e.g. `Seq_Frame0000`.
    pub frame_id: String,
    pub role: TransformRole,
    /// `<source dir>/<frame_id>.png`, for matching saved snapshots.
    pub display_file: PathBuf,
}

impl TransformRecord {
    pub fn matrix(&self) -> Matrix4<f64> {
        affine_from_coefficients(&self.coefficients)
    }

    /// Frame number embedded in the key (`Seq_Frame0042...` gives 42).
    ///
    /// Informational only, frames are matched by line order.
    pub fn embedded_index(&self) -> Option<usize> {
        let digits = self
            .frame_id
            .find(FRAME_PREFIX)
            .map(|pos| &self.frame_id[pos + FRAME_PREFIX.len()..])?;
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse().ok()
    }
}

/// Validity label of a frame's transform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformStatus {
    Ok,
    Invalid,
    Unknown,
}

impl From<Option<bool>> for TransformStatus {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TransformStatus::Ok,
            Some(false) => TransformStatus::Invalid,
            None => TransformStatus::Unknown,
        }
    }
}

impl Display for TransformStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            TransformStatus::Ok => "OK",
            TransformStatus::Invalid => "INVALID",
            TransformStatus::Unknown => "Unknown",
        })
    }
}

/// Everything the header says about per-frame transforms.
#[derive(Debug, Clone, Default)]
pub struct TransformTable {
    records: Vec<TransformRecord>,
    validity: Vec<bool>,
    names: BTreeSet<String>,
}

impl TransformTable {
    pub fn records(&self) -> &[TransformRecord] {
        &self.records
    }

    pub fn record(&self, frame: usize) -> Option<&TransformRecord> {
        self.records.get(frame)
    }

    /// Validity flags in line order; may be shorter than the frame count.
    pub fn validity(&self) -> &[bool] {
        &self.validity
    }

    /// `None` when no status was recorded at this position.
    pub fn is_valid(&self, frame: usize) -> Option<bool> {
        self.validity.get(frame).copied()
    }

    pub fn status(&self, frame: usize) -> TransformStatus {
        self.is_valid(frame).into()
    }

    /// Distinct transform family names seen in frame-scoped keys.
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() && self.validity.is_empty() && self.names.is_empty()
    }

    /// Counts of (OK, INVALID) flags.
    pub fn validity_counts(&self) -> (usize, usize) {
        let valid = self.validity.iter().filter(|&&v| v).count();
        (valid, self.validity.len() - valid)
    }
}

/// Extracts the family name between `Seq_Frame<digits>_` and `Transform`.
pub fn transform_family(key: &str) -> Option<&str> {
    let start = key.find(FRAME_PREFIX)? + FRAME_PREFIX.len();
    let (_, rest) = key[start..].split_once('_')?;
    let end = rest.find(TRANSFORM_MARKER)?;
    let name = &rest[..end];
    (!name.is_empty()).then_some(name)
}

/// Builds a [`TransformTable`] from header lines.
///
/// Malformed transform lines and unknown status values are skipped with a
/// warning, or abort the parse when the fail level is raised to
/// [`log::Level::Warn`].
#[derive(Debug, Clone)]
pub struct TransformTableParser {
    base_dir: PathBuf,
    fail_level: log::Level,
}

impl TransformTableParser {
    /// Parser for a header read from `source`; display files are rooted at
    /// its directory.
    pub fn new<P: AsRef<Path>>(source: P) -> Self {
        let base_dir = source
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self {
            base_dir,
            fail_level: log::Level::Error,
        }
    }

    pub fn set_fail_level(&mut self, level: log::Level) {
        self.fail_level = level;
    }

    /// Scans the header of `path`.
    ///
    /// An unopenable file yields an empty table rather than an error.
    pub fn read_path<P: AsRef<Path>>(&self, path: P) -> Result<TransformTable, LoadError> {
        match HeaderScanner::open(path, Terminator::BlankLine) {
            Ok(scanner) => self.parse(scanner),
            Err(e) => {
                warn!("{e}; no transforms read");
                Ok(TransformTable::default())
            }
        }
    }

    pub fn parse<I>(&self, lines: I) -> Result<TransformTable, LoadError>
    where
        I: IntoIterator<Item = Result<HeaderLine, ScanError>>,
    {
        let mut table = TransformTable::default();

        for line in lines {
            let line = line?;
            let Some((key, value)) = line.key_value() else {
                continue;
            };

            if let Some(name) = transform_family(key) {
                table.names.insert(name.to_string());
            }

            if let Some((role, frame_id)) = TransformRole::match_transform_key(key) {
                match parse_coefficients(line.number, value) {
                    Ok(coefficients) => {
                        let record = TransformRecord {
                            frame_index: table.records.len(),
                            coefficients,
                            source_name: key.to_string(),
                            frame_id: frame_id.to_string(),
                            role,
                            display_file: self.base_dir.join(format!("{frame_id}.png")),
                        };

                        if let Some(embedded) = record.embedded_index() {
                            if embedded != record.frame_index {
                                debug!(
                                    "Line {}: {key} is transform #{} by order",
                                    line.number, record.frame_index
                                );
                            }
                        }

                        trace!("{key} -> frame {}", record.frame_index);
                        table.records.push(record);
                    }
                    Err(err) => log_or_err!(self.fail_level, Warn, err),
                }
            } else if TransformRole::match_status_key(key).is_some() {
                match value.split_whitespace().next() {
                    Some("OK") => table.validity.push(true),
                    Some("INVALID") => table.validity.push(false),
                    token => log_or_err!(
                        self.fail_level,
                        Warn,
                        TransformError::UnknownStatus {
                            line: line.number,
                            token: token.unwrap_or_default().to_string(),
                        }
                    ),
                }
            }
        }

        debug!(
            "Read {} transforms, {} status flags, families: {:?}",
            table.records.len(),
            table.validity.len(),
            table.names
        );

        Ok(table)
    }
}

fn parse_coefficients(
    line: usize,
    value: &str,
) -> Result<[f64; AFFINE_COEFFICIENTS], TransformError> {
    let tokens = value.split_whitespace().collect::<Vec<_>>();
    if tokens.len() < AFFINE_COEFFICIENTS {
        return Err(TransformError::TooFewCoefficients {
            line,
            found: tokens.len(),
        });
    }

    let mut coefficients = [0.0; AFFINE_COEFFICIENTS];
    for (slot, token) in coefficients.iter_mut().zip(&tokens) {
        *slot = token
            .parse()
            .map_err(|_| TransformError::NonNumericCoefficient {
                line,
                token: token.to_string(),
            })?;
    }

    Ok(coefficients)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const HEADER: &str = "\
ObjectType = Image
DimSize = 2 2 3
Seq_Frame0000_ProbeToTrackerTransform = 1 0 0 10 0 1 0 20 0 0 1 30 0 0 0 1
Seq_Frame0000_ProbeToTrackerTransformStatus = OK
Seq_Frame0000_StylusToTrackerTransform = 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
Seq_Frame0001_ProbeToTrackerTransform = 0 -1 0 1 1 0 0 2 0 0 1 3 0 0 0 1
Seq_Frame0001_ProbeToTrackerTransformStatus = INVALID
Seq_Frame0002_UltrasoundToTrackerTransform = 2 0 0 0 0 2 0 0 0 0 2 0 0 0 0 1
Seq_Frame0002_UltrasoundToTrackerTransformStatus = OK
ElementDataFile = LOCAL
Seq_Frame0003_ProbeToTrackerTransform = 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
";

    fn parse(parser: &TransformTableParser, text: &str) -> Result<TransformTable, LoadError> {
        parser.parse(HeaderScanner::new(
            Cursor::new(text.as_bytes()),
            Terminator::BlankLine,
        ))
    }

    #[test]
    fn reads_records_in_line_order() {
        let parser = TransformTableParser::new("/data/scans/seq.mha");
        let table = parse(&parser, HEADER).unwrap();

        assert_eq!(table.records().len(), 3);
        assert_eq!(table.validity(), &[true, false, true]);

        let first = table.record(0).unwrap();
        assert_eq!(first.role, TransformRole::ProbeToTracker);
        assert_eq!(first.coefficients[3], 10.0);
        assert_eq!(first.coefficients[11], 30.0);
        assert_eq!(first.frame_id, "Seq_Frame0000");
        assert_eq!(
            first.display_file,
            PathBuf::from("/data/scans/Seq_Frame0000.png")
        );

        let third = table.record(2).unwrap();
        assert_eq!(third.role, TransformRole::UltrasoundToTracker);
        assert_eq!(third.matrix()[(1, 1)], 2.0);

        assert!(table.record(3).is_none());
    }

    #[test]
    fn collects_family_names() {
        let table = parse(&TransformTableParser::new("seq.mha"), HEADER).unwrap();
        let names = table.names().iter().map(String::as_str).collect::<Vec<_>>();
        assert_eq!(names, ["ProbeToTracker", "StylusToTracker", "UltrasoundToTracker"]);
    }

    #[test]
    fn association_ignores_embedded_index() {
        let text = "\
Seq_Frame0007_ProbeToTrackerTransform = 1 0 0 7 0 1 0 0 0 0 1 0 0 0 0 1
Seq_Frame0003_ProbeToTrackerTransform = 1 0 0 3 0 1 0 0 0 0 1 0 0 0 0 1
";
        let table = parse(&TransformTableParser::new("seq.mha"), text).unwrap();
        assert_eq!(table.record(0).unwrap().coefficients[3], 7.0);
        assert_eq!(table.record(0).unwrap().embedded_index(), Some(7));
        assert_eq!(table.record(1).unwrap().frame_index, 1);
    }

    #[test]
    fn status_lookup() {
        let text = "\
Seq_Frame0000_ProbeToTrackerTransformStatus = OK
Seq_Frame0001_ProbeToTrackerTransformStatus = MISSING
Seq_Frame0002_ProbeToTrackerTransformStatus = INVALID
";
        let table = parse(&TransformTableParser::new("seq.mha"), text).unwrap();
        assert_eq!(table.validity(), &[true, false]);
        assert_eq!(table.status(0), TransformStatus::Ok);
        assert_eq!(table.status(1), TransformStatus::Invalid);
        assert_eq!(table.status(2), TransformStatus::Unknown);
        assert_eq!(table.status(2).to_string(), "Unknown");
        assert_eq!(table.validity_counts(), (1, 1));
    }

    #[test]
    fn malformed_lines_are_skipped_unless_strict() {
        let text = "\
Seq_Frame0000_ProbeToTrackerTransform = 1 0 0
Seq_Frame0001_ProbeToTrackerTransform = 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
";
        let mut parser = TransformTableParser::new("seq.mha");
        let table = parse(&parser, text).unwrap();
        assert_eq!(table.records().len(), 1);
        assert_eq!(table.record(0).unwrap().frame_id, "Seq_Frame0001");

        parser.set_fail_level(log::Level::Warn);
        let err = parse(&parser, text).unwrap_err();
        assert!(matches!(
            err,
            LoadError::Transform(TransformError::TooFewCoefficients { line: 1, found: 3 })
        ));
    }

    #[test]
    fn non_numeric_coefficient() {
        let text =
            "Seq_Frame0000_ProbeToTrackerTransform = 1 0 0 x 0 1 0 0 0 0 1 0 0 0 0 1\n";
        let mut parser = TransformTableParser::new("seq.mha");
        parser.set_fail_level(log::Level::Warn);
        assert!(matches!(
            parse(&parser, text),
            Err(LoadError::Transform(TransformError::NonNumericCoefficient { .. }))
        ));
    }

    #[test]
    fn family_name_extraction() {
        assert_eq!(
            transform_family("Seq_Frame0000_ProbeToTrackerTransform"),
            Some("ProbeToTracker")
        );
        assert_eq!(
            transform_family("Seq_Frame12_ImageToProbeTransformStatus"),
            Some("ImageToProbe")
        );
        assert_eq!(transform_family("Seq_Frame0000_Timestamp"), None);
        assert_eq!(transform_family("TransformSeq_Frame"), None);
    }

    #[test]
    fn unopenable_file_gives_empty_table() {
        let dir = tempfile::tempdir().unwrap();
        let parser = TransformTableParser::new(dir.path().join("missing.mha"));
        let table = parser.read_path(dir.path().join("missing.mha")).unwrap();
        assert!(table.is_empty());
    }
}
