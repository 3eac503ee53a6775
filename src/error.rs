use std::sync::Arc;

use rootcause::Report;
use thiserror::Error;

use crate::data::FileKind;

/// Every failure the model family parsers can report.
///
/// All kinds are terminal for the container being decoded: no partially
/// reconstructed model is ever returned alongside one of these.
#[derive(Error, Debug, Clone)]
pub enum ErrorKind {
    #[error("{file}: unexpected {field}: 0x{actual:08X} (expected 0x{expected:08X})")]
    FormatMismatch {
        file: FileKind,
        field: &'static str,
        expected: u32,
        actual: u32,
    },
    #[error("{file}: declared size {declared} does not match stream length {actual}")]
    SizeMismatch {
        file: FileKind,
        declared: usize,
        actual: usize,
    },
    #[error("missing mandatory {file} companion: not embedded and no `{expected_name}` supplied")]
    MissingCompanion { file: FileKind, expected_name: String },
    #[error("{file} checksum 0x{companion:08X} does not match container checksum 0x{container:08X}")]
    ChecksumMismatch {
        file: FileKind,
        container: u32,
        companion: u32,
    },
    #[error("{file}: level {} has {coarser_count} vertices, more than level {level} ({count})", .level + 1)]
    InconsistentLevelOfDetail {
        file: FileKind,
        level: usize,
        count: u32,
        coarser_count: u32,
    },
    #[error("{file}: level count {num_lods} outside 1..={max}")]
    InvalidLevelCount {
        file: FileKind,
        num_lods: u32,
        max: usize,
    },
    #[error("malformed topology at node {key:?}: {reason}")]
    MalformedTopology { key: Vec<usize>, reason: String },
    #[error("{file}: data too short: need {need} bytes at offset 0x{offset:X}, have {have}")]
    OutOfBounds {
        file: FileKind,
        offset: usize,
        need: usize,
        have: usize,
    },
    #[error("{file}: decode error at 0x{offset:X}: {detail}")]
    Decode {
        file: FileKind,
        offset: usize,
        detail: String,
    },
    #[error("I/O error reading {path}")]
    Io {
        path: String,
        #[source]
        err: Arc<std::io::Error>,
    },
    #[error("could not load {path}: {detail}")]
    Loader { path: String, detail: String },
}

impl ErrorKind {
    pub(crate) fn io(path: impl Into<String>, err: std::io::Error) -> Self {
        ErrorKind::Io {
            path: path.into(),
            err: Arc::new(err),
        }
    }
}

/// Result type returned by the public entry points.
pub type MdlResult<T> = Result<T, Report<ErrorKind>>;
