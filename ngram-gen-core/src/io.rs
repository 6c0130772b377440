use std::fs::File;
use std::io::BufRead;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Opens a corpus source for reading.
///
/// # Errors
/// Returns `Source` with the offending path; an unreadable source aborts the
/// whole ingestion run.
pub fn open_source<P: AsRef<Path>>(path: P) -> Result<File> {
	let path = path.as_ref();
	File::open(path).map_err(|source| Error::Source { path: path.to_owned(), source })
}

/// Reads a list of source paths, one per line.
///
/// - A trailing `\r` is dropped, other whitespace is part of the path
/// - Blank lines are skipped
pub fn read_source_list<R: BufRead>(reader: R) -> Result<Vec<PathBuf>> {
	let mut sources = Vec::new();
	for line in reader.lines() {
		let line = line?;
		let line = line.strip_suffix('\r').unwrap_or(&line);
		if !line.trim().is_empty() {
			sources.push(PathBuf::from(line));
		}
	}
	Ok(sources)
}

/// Uses the explicit `args` if any were given, otherwise reads the list from
/// `fallback` (typically stdin).
pub fn resolve_sources<R: BufRead>(args: Vec<PathBuf>, fallback: R) -> Result<Vec<PathBuf>> {
	if !args.is_empty() {
		return Ok(args);
	}
	read_source_list(fallback)
}
