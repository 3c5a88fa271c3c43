/// CLI error types with associated exit codes.
///
/// [`CliError`] is the top-level error type for the `datadict` binary. Every
/// variant maps to a stable exit code (1 or 2) via [`CliError::exit_code`]:
///
/// - Exit code **2** — input failure: the tool could not read or parse its
///   input, or the dictionary itself is unusable. These terminate before a
///   meaningful verdict exists.
/// - Exit code **1** — logical failure: the tool ran to completion and the
///   result is a well-defined failure (validation errors, incompatible
///   update).
use std::fmt;
use std::path::PathBuf;

/// All error conditions the `datadict` CLI can produce.
#[derive(Debug)]
pub enum CliError {
    // --- Exit code 2: input failures ---
    /// A file argument could not be found on the filesystem.
    FileNotFound {
        /// The path that was not found.
        path: PathBuf,
    },

    /// The process lacks permission to read a file.
    PermissionDenied {
        /// The path that could not be read.
        path: PathBuf,
    },

    /// The input exceeds the configured `--max-input-size` limit.
    InputTooLarge {
        /// A human-readable label for the source (`"-"` for stdin).
        source: String,
        /// The configured size limit in bytes.
        limit: u64,
        /// The actual size in bytes, if known (disk files only).
        actual: Option<u64>,
    },

    /// The input bytes are not valid UTF-8.
    InvalidUtf8 {
        /// A human-readable label for the source.
        source: String,
        /// The byte offset of the first invalid byte sequence.
        byte_offset: usize,
    },

    /// An I/O error occurred while reading from stdin.
    StdinReadError {
        /// The underlying I/O error message.
        detail: String,
    },

    /// A generic I/O error not covered by the variants above.
    IoError {
        /// A human-readable label for the source.
        source: String,
        /// The underlying I/O error message.
        detail: String,
    },

    /// The input (or the dictionary) is not the JSON shape expected.
    ParseFailed {
        /// A human-readable label for the source.
        source: String,
        /// Parser detail including position information.
        detail: String,
    },

    /// The validation engine raised: entry misuse, dictionary corruption,
    /// or a failing store.
    EngineFailure {
        /// The raised error's message.
        detail: String,
    },

    // --- Exit code 1: logical failures ---
    /// A validation run reported one or more errors.
    ///
    /// The report has already been printed; this variant exists so `main`
    /// can exit with code 1 cleanly.
    ValidationErrors,

    /// The update-compatibility checker rejected the proposed update.
    IncompatibleUpdate,
}

impl CliError {
    /// Returns the process exit code for this error.
    ///
    /// - `2` — input failure (file not found, parse error, engine raise).
    /// - `1` — logical failure (validation errors, incompatible update).
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::FileNotFound { .. }
            | Self::PermissionDenied { .. }
            | Self::InputTooLarge { .. }
            | Self::InvalidUtf8 { .. }
            | Self::StdinReadError { .. }
            | Self::IoError { .. }
            | Self::ParseFailed { .. }
            | Self::EngineFailure { .. } => 2,

            Self::ValidationErrors | Self::IncompatibleUpdate => 1,
        }
    }

    /// Returns a human-readable error message suitable for stderr.
    pub fn message(&self) -> String {
        match self {
            Self::FileNotFound { path } => {
                format!("error: file not found: {}", path.display())
            }
            Self::PermissionDenied { path } => {
                format!("error: permission denied: {}", path.display())
            }
            Self::InputTooLarge {
                source,
                limit,
                actual: Some(actual),
            } => {
                format!("error: input too large: {source} is {actual} bytes, limit is {limit} bytes")
            }
            Self::InputTooLarge {
                source,
                limit,
                actual: None,
            } => {
                format!("error: input too large: {source} exceeded limit of {limit} bytes")
            }
            Self::InvalidUtf8 {
                source,
                byte_offset,
            } => {
                format!(
                    "error: invalid UTF-8 in {source}: first invalid byte at offset {byte_offset}"
                )
            }
            Self::StdinReadError { detail } => {
                format!("error: failed to read stdin: {detail}")
            }
            Self::IoError { source, detail } => {
                format!("error: I/O error reading {source}: {detail}")
            }
            Self::ParseFailed { source, detail } => {
                format!("error: could not parse {source}: {detail}")
            }
            Self::EngineFailure { detail } => {
                format!("error: {detail}")
            }
            Self::ValidationErrors => "error: validation failed with one or more errors".to_owned(),
            Self::IncompatibleUpdate => {
                "error: the proposed update restricts existing data".to_owned()
            }
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

impl std::error::Error for CliError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use std::path::PathBuf;

    use super::*;

    #[test]
    fn input_failures_are_exit_2() {
        let errors = [
            CliError::FileNotFound {
                path: PathBuf::from("terms.json"),
            },
            CliError::PermissionDenied {
                path: PathBuf::from("/root/terms.json"),
            },
            CliError::InputTooLarge {
                source: "-".to_owned(),
                limit: 512,
                actual: None,
            },
            CliError::InvalidUtf8 {
                source: "input.json".to_owned(),
                byte_offset: 42,
            },
            CliError::StdinReadError {
                detail: "broken pipe".to_owned(),
            },
            CliError::IoError {
                source: "input.json".to_owned(),
                detail: "device full".to_owned(),
            },
            CliError::ParseFailed {
                source: "input.json".to_owned(),
                detail: "line 1".to_owned(),
            },
            CliError::EngineFailure {
                detail: "descriptor \"x\" not found".to_owned(),
            },
        ];
        for e in errors {
            assert_eq!(e.exit_code(), 2, "{e}");
        }
    }

    #[test]
    fn logical_failures_are_exit_1() {
        assert_eq!(CliError::ValidationErrors.exit_code(), 1);
        assert_eq!(CliError::IncompatibleUpdate.exit_code(), 1);
    }

    #[test]
    fn messages_carry_context() {
        let e = CliError::FileNotFound {
            path: PathBuf::from("terms.json"),
        };
        assert!(e.message().contains("terms.json"));

        let e = CliError::InputTooLarge {
            source: "big.json".to_owned(),
            limit: 1_000_000,
            actual: Some(2_000_000),
        };
        let msg = e.message();
        assert!(msg.contains("2000000"), "message: {msg}");
        assert!(msg.contains("1000000"), "message: {msg}");

        let e = CliError::ParseFailed {
            source: "input.json".to_owned(),
            detail: "expected value at line 1 column 2".to_owned(),
        };
        assert!(e.message().contains("input.json"));
    }

    #[test]
    fn display_matches_message() {
        let e = CliError::ValidationErrors;
        assert_eq!(format!("{e}"), e.message());
    }
}
