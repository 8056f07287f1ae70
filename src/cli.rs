//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use uget_core::{OutputTarget, SessionConfig, SetupError, TrustPolicy};

/// Download one URL over HTTP or HTTPS.
///
/// The body is written to a file named after the last URL path segment
/// (never overwriting an existing file), to the file given with -O, or to
/// standard output with -O -.
#[derive(Parser, Debug)]
#[command(name = "uget")]
#[command(author, version, about)]
pub struct Args {
    /// URL to download
    pub url: String,

    /// Write output to FILE (overwrites; use "-" for stdout)
    #[arg(short = 'O', value_name = "FILE", allow_hyphen_values = true)]
    pub output: Option<String>,

    /// Directory to create filenames derived from the URL in
    #[arg(short = 'P', long, value_name = "DIR", default_value = ".")]
    pub directory_prefix: PathBuf,

    /// Suppress diagnostic messages (exit code is unaffected)
    #[arg(short, long)]
    pub quiet: bool,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Don't validate the server's certificate
    #[arg(long)]
    pub no_check_certificate: bool,

    /// Load CA certificates from FILE (repeatable)
    #[arg(long = "ca-certificate", value_name = "FILE")]
    pub ca_certificates: Vec<PathBuf>,
}

impl Args {
    /// Builds the session configuration.
    ///
    /// # Errors
    ///
    /// Returns [`SetupError`] if the URL is malformed or has an unsupported scheme.
    pub fn into_config(self) -> Result<SessionConfig, SetupError> {
        let url = SessionConfig::parse_url(&self.url)?;
        let mut trust = TrustPolicy::new(!self.no_check_certificate);
        for path in self.ca_certificates {
            trust.load_ca_source(path);
        }
        Ok(
            SessionConfig::new(url, OutputTarget::from_arg(self.output.as_deref()), trust)
                .with_output_dir(self.directory_prefix)
                .with_quiet(self.quiet),
        )
    }

    /// Default log filter when `RUST_LOG` is unset.
    #[must_use]
    pub fn log_level(&self) -> &'static str {
        if self.quiet {
            "off"
        } else {
            match self.verbose {
                0 => "info",
                1 => "debug",
                _ => "trace",
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;

    const URL: &str = "http://example.com/file.bin";

    #[test]
    fn test_cli_url_only_uses_defaults() {
        let args = Args::try_parse_from(["uget", URL]).unwrap();
        assert_eq!(args.url, URL);
        assert_eq!(args.output, None);
        assert!(!args.quiet);
        assert_eq!(args.verbose, 0);
        assert!(!args.no_check_certificate);
        assert!(args.ca_certificates.is_empty());
        assert_eq!(args.directory_prefix, PathBuf::from("."));
    }

    #[test]
    fn test_cli_missing_url_is_error() {
        let err = Args::try_parse_from(["uget"]).unwrap_err();
        assert_eq!(
            err.kind(),
            clap::error::ErrorKind::MissingRequiredArgument
        );
    }

    #[test]
    fn test_cli_extra_positional_is_error() {
        assert!(Args::try_parse_from(["uget", URL, "http://example.com/other"]).is_err());
    }

    #[test]
    fn test_cli_output_dash_means_stdout() {
        let args = Args::try_parse_from(["uget", "-O", "-", URL]).unwrap();
        assert_eq!(args.output.as_deref(), Some("-"));
        let config = args.into_config().unwrap();
        assert_eq!(config.output(), &OutputTarget::Stdout);
    }

    #[test]
    fn test_cli_output_path() {
        let args = Args::try_parse_from(["uget", "-O", "result.bin", URL]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(
            config.output(),
            &OutputTarget::Path(PathBuf::from("result.bin"))
        );
    }

    #[test]
    fn test_cli_quiet_flag_sets_quiet() {
        let args = Args::try_parse_from(["uget", "-q", URL]).unwrap();
        assert!(args.quiet);
        assert_eq!(args.log_level(), "off");
        assert!(args.into_config().unwrap().quiet());
    }

    #[test]
    fn test_cli_verbose_flag_increments_count() {
        let args = Args::try_parse_from(["uget", "-v", URL]).unwrap();
        assert_eq!(args.log_level(), "debug");
        let args = Args::try_parse_from(["uget", "-vv", URL]).unwrap();
        assert_eq!(args.log_level(), "trace");
        let args = Args::try_parse_from(["uget", URL]).unwrap();
        assert_eq!(args.log_level(), "info");
    }

    #[test]
    fn test_cli_certificate_options() {
        let args = Args::try_parse_from([
            "uget",
            "--no-check-certificate",
            "--ca-certificate=/etc/ssl/a.pem",
            "--ca-certificate",
            "/etc/ssl/b.pem",
            URL,
        ])
        .unwrap();
        let config = args.into_config().unwrap();
        assert!(!config.trust().verify_certificates());
        let sources: Vec<&Path> = config.trust().ca_sources().collect();
        assert_eq!(
            sources,
            vec![Path::new("/etc/ssl/a.pem"), Path::new("/etc/ssl/b.pem")]
        );
    }

    #[test]
    fn test_cli_directory_prefix() {
        let args = Args::try_parse_from(["uget", "-P", "/tmp/downloads", URL]).unwrap();
        let config = args.into_config().unwrap();
        assert_eq!(config.output_dir(), Path::new("/tmp/downloads"));
    }

    #[test]
    fn test_cli_invalid_url_fails_config() {
        let args = Args::try_parse_from(["uget", "gopher://example.com/"]).unwrap();
        assert!(matches!(
            args.into_config(),
            Err(SetupError::UnsupportedScheme { .. })
        ));
    }

    #[test]
    fn test_cli_invalid_flag_returns_error() {
        let err = Args::try_parse_from(["uget", "--invalid-flag", URL]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::UnknownArgument);
    }

    #[test]
    fn test_cli_help_flag_shows_usage() {
        let err = Args::try_parse_from(["uget", "--help"]).unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::DisplayHelp);
    }
}
