use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::prelude::*;

use crate::errors::GenerationError;

/// Where generation logs go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// Human-readable lines on stderr.
    Stderr,
    /// One JSON object per event, appended to this file.
    JsonFile(PathBuf),
}

/// Install the global subscriber for `target`.
///
/// `filter` follows `RUST_LOG` syntax, e.g. `"demandsim_generate=debug"`.
/// Fails if a global subscriber is already set.
pub fn init_logging(target: &LogTarget, filter: &str) -> Result<(), GenerationError> {
    let filter =
        EnvFilter::try_new(filter).map_err(|err| GenerationError::Logging(err.to_string()))?;

    let layer = match target {
        LogTarget::Stderr => tracing_subscriber::fmt::layer()
            .with_writer(io::stderr)
            .boxed(),
        LogTarget::JsonFile(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            let file = Arc::new(Mutex::new(file));
            let make_writer = BoxMakeWriter::new(move || SharedFile {
                file: Arc::clone(&file),
            });
            tracing_subscriber::fmt::layer()
                .json()
                .with_timer(UtcTime::rfc_3339())
                .with_writer(make_writer)
                .boxed()
        }
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|err| GenerationError::Logging(err.to_string()))
}

struct SharedFile {
    file: Arc<Mutex<File>>,
}

impl SharedFile {
    fn with_file<T>(&self, op: impl FnOnce(&mut File) -> io::Result<T>) -> io::Result<T> {
        let mut file = self
            .file
            .lock()
            .map_err(|_| io::Error::other("log file lock poisoned"))?;
        op(&mut file)
    }
}

impl Write for SharedFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.with_file(|file| file.write(buf))
    }

    fn flush(&mut self) -> io::Result<()> {
        self.with_file(|file| file.flush())
    }
}
