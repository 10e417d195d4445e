//! Codec I/O adapter.
//!
//! Bridges byte streams to the PNG codec's pull (read) and push (write)
//! model, tracks each load/save through its session stages, and turns every
//! codec-reported condition into a [`SnapshotError`].

use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::Path;

use crate::error::SnapshotError;

/// Which direction a codec session runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Operation {
    Load,
    Save,
}

impl Operation {
    /// Wrap a codec message in this operation's uniform failure.
    pub(crate) fn failure(self, message: impl fmt::Display) -> SnapshotError {
        match self {
            Operation::Load => SnapshotError::Decode(message.to_string()),
            Operation::Save => SnapshotError::Encode(message.to_string()),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Operation::Load => "load",
            Operation::Save => "save",
        })
    }
}

/// Progress of one codec session.
///
/// Stages only move forward. A failure at any stage skips straight to
/// [`Stage::ContextReleased`], which is also where every successful session
/// ends.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum Stage {
    Start,
    ContextCreated,
    HeaderExchanged,
    PixelDataTransferred,
    Finalized,
    ContextReleased,
}

/// Scope guard for one load or save.
///
/// Codec state and streams are owned by the session's stack frame and drop
/// with it; the guard records how far the session got before release.
pub(crate) struct Session {
    op: Operation,
    stage: Stage,
}

impl Session {
    pub(crate) fn begin(op: Operation) -> Self {
        Self {
            op,
            stage: Stage::Start,
        }
    }

    pub(crate) fn advance(&mut self, stage: Stage) {
        debug_assert!(stage > self.stage, "{:?} -> {:?}", self.stage, stage);
        log::debug!("{} session: {:?} -> {:?}", self.op, self.stage, stage);
        self.stage = stage;
    }

    pub(crate) fn stage(&self) -> Stage {
        self.stage
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.stage == Stage::Finalized {
            log::debug!("{} session complete, context released", self.op);
        } else {
            log::debug!(
                "{} session aborted at {:?}, context released",
                self.op,
                self.stage
            );
        }
        self.stage = Stage::ContextReleased;
    }
}

/// Read side of the adapter: hands the codec bytes from `inner`.
pub(crate) struct CodecReader<R> {
    inner: R,
    consumed: u64,
}

impl<R: Read> CodecReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self { inner, consumed: 0 }
    }

    /// Bytes handed to the codec so far.
    pub(crate) fn consumed(&self) -> u64 {
        self.consumed
    }
}

impl<R: Read> Read for CodecReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.consumed += n as u64;
        Ok(n)
    }
}

/// Write side of the adapter: pushes codec output into `inner`.
pub(crate) struct CodecWriter<W> {
    inner: W,
    committed: u64,
}

impl<W: Write> CodecWriter<W> {
    pub(crate) fn new(inner: W) -> Self {
        Self {
            inner,
            committed: 0,
        }
    }

    /// Bytes accepted by the underlying stream so far.
    pub(crate) fn committed(&self) -> u64 {
        self.committed
    }
}

impl<W: Write> Write for CodecWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.committed += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Translate a codec decode failure.
pub(crate) fn decoding_failure(err: png::DecodingError, consumed: u64) -> SnapshotError {
    match err {
        png::DecodingError::LimitsExceeded => {
            SnapshotError::LimitExceeded("codec memory limit reached".into())
        }
        other => Operation::Load.failure(format_args!("{other} (after {consumed} bytes)")),
    }
}

/// Translate a codec encode failure.
pub(crate) fn encoding_failure(err: png::EncodingError) -> SnapshotError {
    Operation::Save.failure(err)
}

pub(crate) fn open_file(path: &Path) -> Result<BufReader<File>, SnapshotError> {
    File::open(path)
        .map(BufReader::new)
        .map_err(|source| SnapshotError::Open {
            path: path.to_path_buf(),
            source,
        })
}

pub(crate) fn create_file(path: &Path) -> Result<BufWriter<File>, SnapshotError> {
    File::create(path)
        .map(BufWriter::new)
        .map_err(|source| SnapshotError::Open {
            path: path.to_path_buf(),
            source,
        })
}
