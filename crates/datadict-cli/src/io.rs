/// File and stdin reading with size enforcement and UTF-8 validation.
///
/// This module is the single entry point for all input I/O in the `datadict`
/// binary. `datadict-core` never touches the filesystem; all reading happens
/// here.
///
/// Key behaviours:
/// - Disk files: size checked via `std::fs::metadata` before any read.
/// - Stdin: buffered with a `Read::take` cap so allocation is bounded.
/// - UTF-8 validation via `std::str::from_utf8` with byte-offset reporting.
/// - All I/O errors are converted to [`CliError`] variants with exit code 2.
use std::io::Read as _;
use std::path::Path;

use crate::cli::PathOrStdin;
use crate::error::CliError;

/// Reads the entire contents of `source` into a `String`.
///
/// # Errors
///
/// Returns [`CliError`] (exit code 2) for missing files, permission
/// problems, inputs over `max_size`, other I/O errors, and invalid UTF-8.
pub fn read_input(source: &PathOrStdin, max_size: u64) -> Result<String, CliError> {
    match source {
        PathOrStdin::Path(path) => read_file(path, max_size),
        PathOrStdin::Stdin => read_stdin(max_size),
    }
}

/// Reads a disk file, enforcing the size limit and UTF-8 requirement.
pub fn read_file(path: &Path, max_size: u64) -> Result<String, CliError> {
    // Size check via metadata, so nothing is allocated for oversized files.
    let file_size = std::fs::metadata(path)
        .map_err(|e| io_error_to_cli(&e, path))?
        .len();

    if file_size > max_size {
        return Err(CliError::InputTooLarge {
            source: path.display().to_string(),
            limit: max_size,
            actual: Some(file_size),
        });
    }

    let bytes = std::fs::read(path).map_err(|e| io_error_to_cli(&e, path))?;
    bytes_to_string(&bytes, &path.display().to_string())
}

/// Reads stdin through a capped reader so the allocation is bounded.
fn read_stdin(max_size: u64) -> Result<String, CliError> {
    let mut bytes = Vec::new();
    let stdin = std::io::stdin();
    let mut capped = stdin.lock().take(max_size.saturating_add(1));
    capped
        .read_to_end(&mut bytes)
        .map_err(|e| CliError::StdinReadError {
            detail: e.to_string(),
        })?;

    if bytes.len() as u64 > max_size {
        return Err(CliError::InputTooLarge {
            source: "-".to_owned(),
            limit: max_size,
            actual: None,
        });
    }
    bytes_to_string(&bytes, "-")
}

/// Validates UTF-8, reporting the byte offset of the first bad sequence.
fn bytes_to_string(bytes: &[u8], source: &str) -> Result<String, CliError> {
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_owned()),
        Err(e) => Err(CliError::InvalidUtf8 {
            source: source.to_owned(),
            byte_offset: e.valid_up_to(),
        }),
    }
}

/// Maps a `std::io::Error` from a disk-file operation to a [`CliError`].
fn io_error_to_cli(e: &std::io::Error, path: &Path) -> CliError {
    if e.kind() == std::io::ErrorKind::NotFound {
        return CliError::FileNotFound {
            path: path.to_path_buf(),
        };
    }
    if e.kind() == std::io::ErrorKind::PermissionDenied {
        return CliError::PermissionDenied {
            path: path.to_path_buf(),
        };
    }
    CliError::IoError {
        source: path.display().to_string(),
        detail: e.to_string(),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
