use std::path::PathBuf;

#[macro_export]
macro_rules! log_or_err {
    ($fail_level:expr, $level:expr, $err:expr $(,)?) => {{
        if $level <= $fail_level {
            return Err($err.into());
        } else {
            match $level {
                ::log::Level::Error => ::log::error!("{}", $err),
                ::log::Level::Warn => ::log::warn!("{}", $err),
                ::log::Level::Info => ::log::info!("{}", $err),
                ::log::Level::Debug => ::log::debug!("{}", $err),
                ::log::Level::Trace => ::log::trace!("{}", $err),
            }
        }
    }};
}

#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("Cannot open {path} for reading: {source}")]
    FileNotFound {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Header ended before \"ElementDataFile = LOCAL\" was found")]
    MissingDataSentinel,

    #[error("I/O error while scanning header: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum HeaderError {
    #[error("No \"DimSize\" entry found in header")]
    MissingDimensions,

    #[error("Malformed \"DimSize\" entry: {0:?}")]
    MalformedDimensions(String),

    #[error("Image dimensions must be non-zero, got {columns}x{rows}")]
    ZeroDimensions { columns: usize, rows: usize },
}

#[derive(thiserror::Error, Debug)]
pub enum TransformError {
    #[error("Transform line {line} has {found} numeric values, expected at least 12")]
    TooFewCoefficients { line: usize, found: usize },

    #[error("Transform line {line} has a non-numeric value {token:?}")]
    NonNumericCoefficient { line: usize, token: String },

    #[error("Status line {line} has unrecognized value {token:?}")]
    UnknownStatus { line: usize, token: String },
}

#[derive(thiserror::Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    Scan(#[from] ScanError),

    #[error(transparent)]
    Header(#[from] HeaderError),

    #[error(transparent)]
    Transform(#[from] TransformError),
}

impl LoadError {
    /// True when the load failed because the path could not be opened.
    pub fn is_file_not_found(&self) -> bool {
        matches!(self, LoadError::Scan(ScanError::FileNotFound { .. }))
    }

    /// True when the header carried no usable `DimSize` entry.
    pub fn is_missing_dimensions(&self) -> bool {
        matches!(
            self,
            LoadError::Header(HeaderError::MissingDimensions | HeaderError::MalformedDimensions(_))
        )
    }
}

#[derive(thiserror::Error, Debug)]
pub enum ReadError {
    #[error("Frame {index} is out of range (sequence has {count} frames)")]
    FrameOutOfRange { index: usize, count: usize },

    #[error("Frame {index} is truncated: expected {expected} bytes, {available} available")]
    TruncatedRead {
        index: usize,
        expected: u64,
        available: u64,
    },

    #[error("Destination buffer holds {actual} bytes, frame needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("No sequence loaded")]
    NotLoaded,

    #[error("I/O error while reading frame: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(thiserror::Error, Debug)]
pub enum NavigateError {
    #[error("Sequence has no frames")]
    EmptySequence,

    #[error(transparent)]
    Read(#[from] ReadError),
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ComposeError {
    #[error("Calibration matrix for {width}x{height} is not invertible")]
    SingularCalibration { width: usize, height: usize },

    #[error("No transform record for frame {index} ({count} parsed)")]
    NoTransformForFrame { index: usize, count: usize },
}
