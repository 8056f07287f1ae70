//! Output sink resolution.
//!
//! A sink is opened only once a response has been accepted. Explicit paths
//! are trusted and overwritten; filenames derived from the URL are created
//! exclusively so an unrelated existing file is never clobbered.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};
use tracing::debug;
use url::Url;

use super::error::SessionError;
use crate::config::OutputTarget;

/// Filename used when the URL path has no usable last segment.
pub const DEFAULT_FILENAME: &str = "index.html";

/// Characters that end the part of a URL path a filename is taken from.
const PATH_TERMINATORS: &[char] = &['?', '#', ';', '&'];

/// Where an open sink writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkOrigin {
    /// Standard output.
    Stdout,
    /// A user-chosen path.
    Explicit(PathBuf),
    /// A filename derived from the URL.
    Derived(PathBuf),
}

impl SinkOrigin {
    /// Path for diagnostics; `-` for standard output.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Stdout => Path::new("-"),
            Self::Explicit(path) | Self::Derived(path) => path,
        }
    }
}

type SinkWriter = BufWriter<Box<dyn AsyncWrite + Send + Unpin>>;

/// An open, buffered, write-only destination for body bytes.
pub struct OutputSink {
    origin: SinkOrigin,
    writer: SinkWriter,
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}

impl OutputSink {
    fn new(origin: SinkOrigin, writer: Box<dyn AsyncWrite + Send + Unpin>) -> Self {
        Self {
            origin,
            writer: BufWriter::new(writer),
        }
    }

    /// Where this sink writes to.
    #[must_use]
    pub fn origin(&self) -> &SinkOrigin {
        &self.origin
    }

    /// Writes all of `data` before returning.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error.
    pub async fn write_all(&mut self, data: &[u8]) -> io::Result<()> {
        self.writer.write_all(data).await
    }

    /// Flushes buffered bytes and closes the sink.
    ///
    /// Dropping a sink without closing it loses whatever is still buffered.
    ///
    /// # Errors
    ///
    /// Returns the underlying IO error if the final flush fails.
    pub async fn close(mut self) -> io::Result<()> {
        self.writer.flush().await
    }
}

/// Derives a local filename from a URL path.
///
/// The path is cut at the first `?`, `#`, `;` or `&`, trailing slashes are
/// stripped, and the last segment is used. An empty result falls back to
/// [`DEFAULT_FILENAME`].
#[must_use]
pub fn derive_filename(path: &str) -> &str {
    let end = path.find(PATH_TERMINATORS).unwrap_or(path.len());
    let trimmed = path[..end].trim_end_matches('/');
    let name = trimmed.rsplit('/').next().unwrap_or_default();
    if name.is_empty() { DEFAULT_FILENAME } else { name }
}

/// Opens output sinks relative to a base directory.
#[derive(Debug, Clone)]
pub struct SinkResolver {
    base_dir: PathBuf,
}

impl SinkResolver {
    /// Creates a resolver placing derived filenames in `base_dir`.
    #[must_use]
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self {
            base_dir: base_dir.into(),
        }
    }

    /// Opens the destination for the (possibly redirected) `url`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::SinkOpen`] if the destination cannot be opened,
    /// including when a derived filename already exists.
    pub async fn resolve(
        &self,
        url: &Url,
        target: &OutputTarget,
    ) -> Result<OutputSink, SessionError> {
        match target {
            OutputTarget::Stdout => {
                debug!("writing body to standard output");
                Ok(OutputSink::new(SinkOrigin::Stdout, Box::new(tokio::io::stdout())))
            }
            OutputTarget::Path(path) => {
                let file = OpenOptions::new()
                    .write(true)
                    .create(true)
                    .truncate(true)
                    .open(path)
                    .await
                    .map_err(|e| SessionError::sink_open(path.clone(), e))?;
                debug!(path = %path.display(), "opened explicit output file");
                Ok(OutputSink::new(
                    SinkOrigin::Explicit(path.clone()),
                    Box::new(file),
                ))
            }
            OutputTarget::Derived => {
                let path = self.base_dir.join(derive_filename(url.path()));
                let file = OpenOptions::new()
                    .write(true)
                    .create_new(true)
                    .open(&path)
                    .await
                    .map_err(|e| SessionError::sink_open(path.clone(), e))?;
                debug!(path = %path.display(), "created output file from URL");
                Ok(OutputSink::new(SinkOrigin::Derived(path), Box::new(file)))
            }
        }
    }
}

impl Default for SinkResolver {
    fn default() -> Self {
        Self::new(".")
    }
}
