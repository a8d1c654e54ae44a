//! Command-line arguments.
//!
//! The scheduled job invokes the importer with single-dash long flags
//! (`-input`, `-dry-run`); those are rewritten to their `--` form before clap
//! sees them.

use std::ffi::OsString;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use gigboard_core::review::ShowSource;

/// Long flags that may be written with a single dash.
const LONG_FLAGS: [&str; 4] = ["input", "dry-run", "source", "concurrency"];

#[derive(Debug, Parser)]
#[command(name = "gigboard-import")]
#[command(about = "Import discovered shows from scraper output")]
pub struct Cli {
    /// JSON file, or directory of JSON files, of raw event records
    #[arg(long)]
    pub input: PathBuf,

    /// Plan every record and print the outcome without writing
    #[arg(long)]
    pub dry_run: bool,

    /// Provenance recorded on created shows
    #[arg(long, value_enum, default_value_t = SourceArg::Discovery)]
    pub source: SourceArg,

    /// Maximum number of sources imported concurrently (overrides IMPORT_CONCURRENCY)
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    pub concurrency: Option<u16>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceArg {
    Discovery,
    Import,
}

impl From<SourceArg> for ShowSource {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Discovery => ShowSource::Discovery,
            SourceArg::Import => ShowSource::Import,
        }
    }
}

/// Rewrite `-flag` and `-flag=value` to `--flag` forms for known long flags.
pub fn normalize_args<I>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = OsString>,
{
    args.into_iter()
        .map(|arg| {
            let Some(text) = arg.to_str() else {
                return arg;
            };
            let Some(rest) = text.strip_prefix('-').filter(|r| !r.starts_with('-')) else {
                return arg;
            };
            let name = rest.split_once('=').map_or(rest, |(name, _)| name);
            if LONG_FLAGS.contains(&name) {
                OsString::from(format!("-{text}"))
            } else {
                arg
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<OsString> {
        list.iter().map(OsString::from).collect()
    }

    #[test]
    fn single_dash_flags_are_rewritten() {
        let normalized = normalize_args(args(&[
            "gigboard-import",
            "-input",
            "events.json",
            "-dry-run",
            "-concurrency=2",
        ]));
        assert_eq!(
            normalized,
            args(&[
                "gigboard-import",
                "--input",
                "events.json",
                "--dry-run",
                "--concurrency=2",
            ])
        );
    }

    #[test]
    fn other_arguments_are_untouched() {
        let original = args(&["gigboard-import", "--input", "-", "-h", "--dry-run"]);
        assert_eq!(normalize_args(original.clone()), original);
    }

    #[test]
    fn parses_legacy_invocation() {
        let cli = Cli::try_parse_from(normalize_args(args(&[
            "gigboard-import",
            "-input",
            "scraped/",
            "-dry-run",
        ])))
        .unwrap();
        assert_eq!(cli.input, PathBuf::from("scraped/"));
        assert!(cli.dry_run);
        assert_eq!(cli.source, SourceArg::Discovery);
        assert_eq!(cli.concurrency, None);
    }

    #[test]
    fn input_is_required() {
        assert!(Cli::try_parse_from(args(&["gigboard-import", "--dry-run"])).is_err());
    }

    #[test]
    fn zero_concurrency_is_rejected() {
        let result = Cli::try_parse_from(args(&[
            "gigboard-import",
            "--input",
            "a.json",
            "--concurrency",
            "0",
        ]));
        assert!(result.is_err());
    }

    #[test]
    fn source_maps_to_provenance() {
        assert_eq!(ShowSource::from(SourceArg::Import), ShowSource::Import);
    }
}
