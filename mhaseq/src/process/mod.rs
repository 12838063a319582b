/// Line scanning of the text header.
///
/// Provides the [`HeaderScanner`](scan::HeaderScanner), a lazy iterator over
/// header lines that also reports where the binary payload begins.
pub mod scan;

/// Random access to frames of the binary payload.
///
/// Provides the [`FrameReader`](reader::FrameReader), which seeks straight to
/// a frame's byte offset and reads exactly one frame.
pub mod reader;

/// Frame navigation.
///
/// Provides the [`FrameNavigator`](navigate::FrameNavigator) state machine:
/// wrap-around stepping, seeking to the next valid or invalid frame, random
/// jumps and playback.
pub mod navigate;

/// Display transform composition.
///
/// Provides the [`TransformComposer`](compose::TransformComposer), combining
/// tracked transforms with the device calibration.
pub mod compose;

/// Caller-facing sequence session.
///
/// Provides the [`Session`](session::Session), which owns a loaded sequence
/// and renders frames as the caller navigates.
pub mod session;

/// A complete 2x2 sequence of four frames. Frame `i` is filled with byte
/// `i + 1`; transform statuses are `INVALID, OK, INVALID, OK`.
pub const EXAMPLE_SEQUENCE: &[u8] = b"ObjectType = Image
NDims = 3
AnatomicalOrientation = RAI
BinaryData = True
BinaryDataByteOrderMSB = False
CenterOfRotation = 0 0 0
CompressedData = False
DimSize = 2 2 4
ElementNumberOfChannels = 1
ElementSpacing = 1 1 1
Offset = 0 0 0
TransformMatrix = 1 0 0 0 1 0 0 0 1
UltrasoundImageOrientation = MF
ElementType = MET_UCHAR
Seq_Frame0000_FrameNumber = 0
Seq_Frame0000_ProbeToTrackerTransform = 1 0 0 10 0 1 0 20 0 0 1 30 0 0 0 1
Seq_Frame0000_ProbeToTrackerTransformStatus = INVALID
Seq_Frame0000_Timestamp = 0.000
Seq_Frame0001_FrameNumber = 1
Seq_Frame0001_ProbeToTrackerTransform = 0 -1 0 11 1 0 0 21 0 0 1 31 0 0 0 1
Seq_Frame0001_ProbeToTrackerTransformStatus = OK
Seq_Frame0001_Timestamp = 0.033
Seq_Frame0002_FrameNumber = 2
Seq_Frame0002_ProbeToTrackerTransform = 1 0 0 12 0 1 0 22 0 0 1 32 0 0 0 1
Seq_Frame0002_ProbeToTrackerTransformStatus = INVALID
Seq_Frame0002_StylusToTrackerTransform = 1 0 0 0 0 1 0 0 0 0 1 0 0 0 0 1
Seq_Frame0002_Timestamp = 0.067
Seq_Frame0003_FrameNumber = 3
Seq_Frame0003_ProbeToTrackerTransform = 1 0 0 13 0 1 0 23 0 0 1 33 0 0 0 1
Seq_Frame0003_ProbeToTrackerTransformStatus = OK
Seq_Frame0003_Timestamp = 0.100
ElementDataFile = LOCAL
\x01\x01\x01\x01\x02\x02\x02\x02\x03\x03\x03\x03\x04\x04\x04\x04";
