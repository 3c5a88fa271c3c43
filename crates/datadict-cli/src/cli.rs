//! Clap CLI definition: root struct, subcommands, and shared argument types.
use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use datadict_core::CodeField;

/// Default cap on any single input, dictionary included (64 MiB).
pub const DEFAULT_MAX_INPUT_SIZE: u64 = 64 * 1024 * 1024;

/// A CLI argument that is either a filesystem path or the stdin sentinel
/// `"-"`.
#[derive(Clone, Debug)]
pub enum PathOrStdin {
    /// Read from standard input.
    Stdin,
    /// Read from the given filesystem path.
    Path(PathBuf),
}

impl std::str::FromStr for PathOrStdin {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s == "-" {
            Ok(PathOrStdin::Stdin)
        } else {
            Ok(PathOrStdin::Path(PathBuf::from(s)))
        }
    }
}

/// The code-section field probed during enum resolution.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum ResolveField {
    /// The local identifier (default).
    #[default]
    LocalId,
    /// The namespace identifier.
    NamespaceId,
    /// The global identifier.
    GlobalId,
}

impl From<ResolveField> for CodeField {
    fn from(field: ResolveField) -> Self {
        match field {
            ResolveField::LocalId => CodeField::LocalId,
            ResolveField::NamespaceId => CodeField::NamespaceId,
            ResolveField::GlobalId => CodeField::GlobalId,
        }
    }
}

/// All top-level subcommands exposed by the `datadict` binary.
#[derive(Subcommand)]
pub enum Command {
    /// Validate a JSON value (or batch of values) against the dictionary.
    Validate {
        /// Path to the term dictionary: a JSON array of term records.
        #[arg(long, value_name = "FILE")]
        dictionary: PathBuf,

        /// JSON input to validate, or `-` for stdin.
        #[arg(value_name = "INPUT")]
        input: PathOrStdin,

        /// Key of the descriptor describing the input. Without it the input
        /// must be an object (or array of objects) whose property names are
        /// descriptor keys.
        #[arg(long, value_name = "KEY")]
        descriptor: Option<String>,

        /// Treat the input as an array of values sharing the descriptor.
        #[arg(long, requires = "descriptor")]
        zip: bool,

        /// Enable enum-code and timestamp resolution.
        #[arg(long)]
        resolve: bool,

        /// Flag unmatched object properties as errors.
        #[arg(long)]
        expect_terms: bool,

        /// Flag leaves without a declared type as errors.
        #[arg(long)]
        expect_type: bool,

        /// Permit the empty string as a default-namespace reference.
        #[arg(long)]
        allow_default_namespace: bool,

        /// Code-section field probed during enum resolution.
        #[arg(long, value_enum, default_value = "local-id")]
        resolve_field: ResolveField,

        /// Language tag for report messages.
        #[arg(long, default_value = "en", env = "DATADICT_LANGUAGE")]
        language: String,

        /// Disable the term cache.
        #[arg(long)]
        no_cache: bool,

        /// Also memoize failed term lookups.
        #[arg(long)]
        cache_missing: bool,
    },

    /// Check that a proposed term update cannot invalidate stored data.
    Compare {
        /// Path to the original term record, or `-` for stdin.
        #[arg(value_name = "ORIGINAL")]
        original: PathOrStdin,

        /// Path to the proposed update, or `-` for stdin.
        #[arg(value_name = "UPDATED")]
        updated: PathOrStdin,
    },
}

/// Root of the `datadict` CLI.
#[derive(Parser)]
#[command(
    name = "datadict",
    version,
    about = "Data-dictionary validation engine",
    propagate_version = true
)]
pub struct Cli {
    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Maximum size in bytes for any single input.
    #[arg(long, global = true, default_value_t = DEFAULT_MAX_INPUT_SIZE)]
    pub max_input_size: u64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]
    #![allow(clippy::panic)]

    use clap::Parser;

    use super::*;

    #[test]
    fn stdin_sentinel_parses() {
        let parsed: PathOrStdin = "-".parse().expect("infallible");
        assert!(matches!(parsed, PathOrStdin::Stdin));
        let parsed: PathOrStdin = "input.json".parse().expect("infallible");
        match parsed {
            PathOrStdin::Path(p) => assert_eq!(p, PathBuf::from("input.json")),
            PathOrStdin::Stdin => panic!("expected a path"),
        }
    }

    #[test]
    fn validate_flags_parse() {
        let cli = Cli::parse_from([
            "datadict",
            "validate",
            "--dictionary",
            "terms.json",
            "--descriptor",
            "age",
            "--zip",
            "--resolve",
            "--language",
            "it",
            "-",
        ]);
        match cli.command {
            Command::Validate {
                dictionary,
                descriptor,
                zip,
                resolve,
                language,
                input,
                ..
            } => {
                assert_eq!(dictionary, PathBuf::from("terms.json"));
                assert_eq!(descriptor.as_deref(), Some("age"));
                assert!(zip);
                assert!(resolve);
                assert_eq!(language, "it");
                assert!(matches!(input, PathOrStdin::Stdin));
            }
            Command::Compare { .. } => panic!("expected validate"),
        }
    }

    #[test]
    fn zip_requires_a_descriptor() {
        let result = Cli::try_parse_from([
            "datadict",
            "validate",
            "--dictionary",
            "terms.json",
            "--zip",
            "-",
        ]);
        assert!(result.is_err(), "--zip without --descriptor must fail");
    }

    #[test]
    fn compare_takes_two_inputs() {
        let cli = Cli::parse_from(["datadict", "compare", "old.json", "new.json"]);
        match cli.command {
            Command::Compare { original, updated } => {
                assert!(matches!(original, PathOrStdin::Path(_)));
                assert!(matches!(updated, PathOrStdin::Path(_)));
            }
            Command::Validate { .. } => panic!("expected compare"),
        }
    }

    #[test]
    fn resolve_field_maps_to_code_field() {
        assert_eq!(CodeField::from(ResolveField::LocalId), CodeField::LocalId);
        assert_eq!(
            CodeField::from(ResolveField::NamespaceId),
            CodeField::NamespaceId
        );
        assert_eq!(CodeField::from(ResolveField::GlobalId), CodeField::GlobalId);
    }
}
