use std::collections::BTreeSet;
use std::fmt::Display;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::Instant;

use log::{debug, info, warn};
use nalgebra::Matrix4;
use rand::Rng;

use crate::process::compose::TransformComposer;
use crate::process::navigate::{FrameNavigator, PlayMode};
use crate::process::reader::FrameReader;
use crate::structs::calibration::{CalibrationTable, DeviceCalibration};
use crate::structs::header::SequenceHeader;
use crate::structs::transform::{TransformStatus, TransformTable, TransformTableParser};
use crate::utils::errors::{ComposeError, LoadError, NavigateError, ReadError};

static NO_NAMES: BTreeSet<String> = BTreeSet::new();

/// Settings applied to every load of a [`Session`].
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Header problems at or above this level abort the load; lower ones are
    /// logged. Defaults to [`log::Level::Error`].
    pub fail_level: log::Level,
    pub calibration: CalibrationTable,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            fail_level: log::Level::Error,
            calibration: CalibrationTable::builtin(),
        }
    }
}

/// What a caller needs to show one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameView {
    pub index: usize,
    pub frame_count: usize,
    pub pixels: Vec<u8>,
    pub transform: Matrix4<f64>,
    pub status: TransformStatus,
}

impl FrameView {
    /// `"<index>/<frame count>"`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.index, self.frame_count)
    }
}

#[derive(Debug)]
struct LoadedSequence {
    path: PathBuf,
    header: SequenceHeader,
    table: TransformTable,
    reader: FrameReader<File>,
    navigator: FrameNavigator,
    composer: TransformComposer,
}

/// An open sequence file and the viewer state over it.
///
/// Loading parses the header once and keeps the file open for frame reads.
/// Every navigation call moves the current frame and renders it; if the
/// render fails the frame index is restored.
///
/// ```rust,no_run
/// use mhaseq::process::session::Session;
///
/// let mut session = Session::default();
/// let header = session.load("scan.mha")?;
/// println!("{header}");
///
/// let view = session.next_valid()?;
/// println!("{} {}", view.label(), view.status);
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug, Default)]
pub struct Session {
    options: SessionOptions,
    loaded: Option<LoadedSequence>,
    apply_transforms: bool,
    play_mode: PlayMode,
    last_error: Option<String>,
}

impl Session {
    pub fn new(options: SessionOptions) -> Self {
        Self {
            options,
            ..Default::default()
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    /// Loads `path`, replacing the current sequence only on success.
    ///
    /// Loading the path that is already open keeps the session as it is.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<SequenceHeader, LoadError> {
        let path = path.as_ref();

        if let Some(loaded) = &self.loaded {
            if loaded.path == path {
                debug!("{} is already loaded", path.display());
                self.last_error = None;
                return Ok(loaded.header);
            }
        }

        let result = self.open(path);
        let result = self.record(result)?;

        let header = result.header;
        self.loaded = Some(result);
        Ok(header)
    }

    fn open(&self, path: &Path) -> Result<LoadedSequence, LoadError> {
        info!("Loading sequence {}", path.display());
        let start = Instant::now();

        let header = SequenceHeader::read_path(path)?;
        debug!(
            "Dimensions read in {:.3} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let reader = FrameReader::open(path, header)?;
        debug!(
            "Payload located at byte {} in {:.3} ms",
            reader.payload_start(),
            start.elapsed().as_secs_f64() * 1000.0
        );
        if reader.available_frames() < header.frame_count as u64 {
            warn!(
                "{} declares {} frames but only {} are present",
                path.display(),
                header.frame_count,
                reader.available_frames()
            );
        }

        let mut parser = TransformTableParser::new(path);
        parser.set_fail_level(self.options.fail_level);
        let table = parser.read_path(path)?;
        debug!(
            "Transforms read in {:.3} ms",
            start.elapsed().as_secs_f64() * 1000.0
        );

        let calibration = self.options.calibration.select(header.columns, header.rows);
        if calibration.from_table {
            debug!("Using {}x{} calibration", header.columns, header.rows);
        } else {
            debug!(
                "No calibration for {}x{}, using identity",
                header.columns, header.rows
            );
        }

        let (valid, invalid) = table.validity_counts();
        info!(
            "{header}; {} transforms ({valid} OK, {invalid} INVALID); available transforms: {}",
            table.records().len(),
            table
                .names()
                .iter()
                .map(String::as_str)
                .collect::<Vec<_>>()
                .join(", ")
        );

        let mut navigator = FrameNavigator::new(header.frame_count);
        navigator.set_play_mode(self.play_mode);

        Ok(LoadedSequence {
            path: path.to_path_buf(),
            header,
            table,
            reader,
            navigator,
            composer: TransformComposer::new(calibration),
        })
    }

    /// Releases the current sequence.
    pub fn close(&mut self) {
        if let Some(loaded) = self.loaded.take() {
            debug!("Closed {}", loaded.path.display());
        }
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.is_some()
    }

    pub fn path(&self) -> Option<&Path> {
        self.loaded.as_ref().map(|l| l.path.as_path())
    }

    pub fn header(&self) -> Option<&SequenceHeader> {
        self.loaded.as_ref().map(|l| &l.header)
    }

    pub fn transform_table(&self) -> Option<&TransformTable> {
        self.loaded.as_ref().map(|l| &l.table)
    }

    pub fn calibration(&self) -> Option<&DeviceCalibration> {
        self.loaded.as_ref().map(|l| l.composer.calibration())
    }

    /// Byte offset of the first frame.
    pub fn payload_start(&self) -> Option<u64> {
        self.loaded.as_ref().map(|l| l.reader.payload_start())
    }

    pub fn current_frame(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.navigator.current())
    }

    pub fn frame_count(&self) -> usize {
        self.loaded.as_ref().map_or(0, |l| l.header.frame_count)
    }

    /// `"<current>/<frame count>"`.
    pub fn frame_label(&self) -> String {
        format!("{}/{}", self.current_frame(), self.frame_count())
    }

    /// Message of the most recent failed call, cleared by the next success.
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn apply_transforms(&self) -> bool {
        self.apply_transforms
    }

    pub fn set_apply_transforms(&mut self, apply: bool) {
        self.apply_transforms = apply;
    }

    pub fn play_mode(&self) -> PlayMode {
        self.play_mode
    }

    pub fn set_play_mode(&mut self, mode: PlayMode) {
        self.play_mode = mode;
        if let Some(loaded) = &mut self.loaded {
            loaded.navigator.set_play_mode(mode);
        }
    }

    pub fn pixels(&mut self, frame: usize) -> Result<Vec<u8>, ReadError> {
        let result = match &mut self.loaded {
            Some(loaded) => loaded.reader.read_frame(frame),
            None => Err(ReadError::NotLoaded),
        };
        self.record(result)
    }

    pub fn pixels_into(&mut self, frame: usize, buf: &mut [u8]) -> Result<(), ReadError> {
        let result = match &mut self.loaded {
            Some(loaded) => loaded.reader.read_frame_into(frame, buf),
            None => Err(ReadError::NotLoaded),
        };
        self.record(result)
    }

    /// Display transform of `frame`, or the reason there is none.
    pub fn try_display_transform(
        &self,
        frame: usize,
        apply: bool,
    ) -> Result<Matrix4<f64>, ComposeError> {
        match &self.loaded {
            Some(loaded) => loaded.composer.compose(loaded.table.records(), frame, apply),
            None => Ok(Matrix4::identity()),
        }
    }

    /// Display transform of `frame`; the identity when transforms are not
    /// applied, the frame has no transform, or the calibration is singular.
    pub fn display_transform(&self, frame: usize, apply: bool) -> Matrix4<f64> {
        self.try_display_transform(frame, apply)
            .unwrap_or_else(|e| {
                match e {
                    ComposeError::SingularCalibration { .. } => warn!("{e}"),
                    ComposeError::NoTransformForFrame { .. } => debug!("{e}"),
                }
                Matrix4::identity()
            })
    }

    pub fn transform_status(&self, frame: usize) -> TransformStatus {
        self.loaded
            .as_ref()
            .map_or(TransformStatus::Unknown, |l| l.table.status(frame))
    }

    pub fn available_transform_names(&self) -> &BTreeSet<String> {
        self.loaded.as_ref().map_or(&NO_NAMES, |l| l.table.names())
    }

    /// Pixels, display transform and status of the current frame.
    pub fn render(&mut self) -> Result<FrameView, ReadError> {
        let index = self.current_frame();
        let pixels = self.pixels(index)?;

        Ok(FrameView {
            index,
            frame_count: self.frame_count(),
            pixels,
            transform: self.display_transform(index, self.apply_transforms),
            status: self.transform_status(index),
        })
    }

    pub fn go_to(&mut self, frame: i64) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, _| nav.go_to(frame))
    }

    pub fn next(&mut self) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, _| nav.next())
    }

    pub fn previous(&mut self) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, _| nav.previous())
    }

    pub fn next_valid(&mut self) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, validity| nav.next_valid(validity))
    }

    pub fn previous_valid(&mut self) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, validity| nav.previous_valid(validity))
    }

    pub fn next_invalid(&mut self) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, validity| nav.next_invalid(validity))
    }

    pub fn previous_invalid(&mut self) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, validity| nav.previous_invalid(validity))
    }

    pub fn random(&mut self) -> Result<FrameView, NavigateError> {
        self.random_with(&mut rand::rng())
    }

    pub fn random_with<R: Rng>(&mut self, rng: &mut R) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, _| nav.random_with(rng))
    }

    pub fn play_next(&mut self) -> Result<FrameView, NavigateError> {
        self.play_next_with(&mut rand::rng())
    }

    pub fn play_next_with<R: Rng>(&mut self, rng: &mut R) -> Result<FrameView, NavigateError> {
        self.navigate(|nav, _| nav.play_next_with(rng))
    }

    fn navigate<F>(&mut self, step: F) -> Result<FrameView, NavigateError>
    where
        F: FnOnce(&mut FrameNavigator, &[bool]) -> Result<usize, NavigateError>,
    {
        let Some(loaded) = &mut self.loaded else {
            return self.record(Err(NavigateError::EmptySequence));
        };

        let saved = loaded.navigator.clone();
        if let Err(e) = step(&mut loaded.navigator, loaded.table.validity()) {
            return self.record(Err(e));
        }

        match self.render() {
            Ok(view) => Ok(view),
            Err(e) => {
                if let Some(loaded) = &mut self.loaded {
                    loaded.navigator = saved;
                }
                Err(e.into())
            }
        }
    }

    fn record<T, E: Display>(&mut self, result: Result<T, E>) -> Result<T, E> {
        self.last_error = result.as_ref().err().map(ToString::to_string);
        result
    }
}
