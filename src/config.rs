//! Session configuration built once from the command line.

use std::path::{Path, PathBuf};

use url::Url;

use crate::session::{SetupError, TrustPolicy};

/// URL schemes the client can download from.
pub const SUPPORTED_SCHEMES: &[&str] = &["http", "https"];

/// Where the response body goes.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum OutputTarget {
    /// A filename derived from the final URL, created exclusively.
    #[default]
    Derived,
    /// The process's standard output.
    Stdout,
    /// A path chosen by the user; overwritten if it exists.
    Path(PathBuf),
}

impl OutputTarget {
    /// Interprets the `-O` argument: absent → derived, `-` → stdout.
    #[must_use]
    pub fn from_arg(arg: Option<&str>) -> Self {
        match arg {
            None => Self::Derived,
            Some("-") => Self::Stdout,
            Some(path) => Self::Path(PathBuf::from(path)),
        }
    }
}

/// Everything a download session needs to know, fixed before it starts.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    url: Url,
    output: OutputTarget,
    output_dir: PathBuf,
    quiet: bool,
    trust: TrustPolicy,
}

impl SessionConfig {
    /// Creates a configuration writing derived filenames to the current directory.
    #[must_use]
    pub fn new(url: Url, output: OutputTarget, trust: TrustPolicy) -> Self {
        Self {
            url,
            output,
            output_dir: PathBuf::from("."),
            quiet: false,
            trust,
        }
    }

    /// Parses and validates a download URL.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] for malformed URLs and schemes other than
    /// `http`/`https`.
    pub fn parse_url(raw: &str) -> Result<Url, SetupError> {
        let url = Url::parse(raw.trim()).map_err(|source| SetupError::InvalidUrl {
            url: raw.to_string(),
            source,
        })?;
        if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
            return Err(SetupError::UnsupportedScheme {
                scheme: url.scheme().to_string(),
            });
        }
        Ok(url)
    }

    /// Sets the directory derived filenames are created in.
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = dir.into();
        self
    }

    /// Sets quiet mode.
    #[must_use]
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// The URL the session starts from.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The output destination.
    #[must_use]
    pub fn output(&self) -> &OutputTarget {
        &self.output
    }

    /// Directory for derived filenames.
    #[must_use]
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Whether diagnostics are suppressed.
    #[must_use]
    pub fn quiet(&self) -> bool {
        self.quiet
    }

    /// The certificate trust policy.
    #[must_use]
    pub fn trust(&self) -> &TrustPolicy {
        &self.trust
    }
}
