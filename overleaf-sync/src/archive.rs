//! Materializes project archives on disk.
//!
//! Responsibilities:
//! - Replace a project directory with the contents of a zip archive.
//! - Stream entries one at a time; the archive is never held in memory.
//! - Derive stable, filesystem-safe directory names from project names.

use crate::error::ArchiveError;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Seek, Write};
use std::path::{Path, PathBuf};
use tracing::debug;
use zip::ZipArchive;

/// Longest directory name we produce, in bytes.
const MAX_NAME_BYTES: usize = 255;

/// What an extraction wrote.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MaterializeSummary {
    pub files: usize,
    pub directories: usize,
    pub bytes: u64,
}

/// Replaces the contents of `target_dir` with the entries of a zip archive.
///
/// Any previous contents of `target_dir` are removed first, so repeated runs
/// never accumulate stale files. Entry paths are kept as-is relative to
/// `target_dir`; entries that would land outside it are rejected.
pub fn extract<R: Read + Seek>(
    reader: R,
    target_dir: &Path,
) -> Result<MaterializeSummary, ArchiveError> {
    let mut archive = ZipArchive::new(reader).map_err(ArchiveError::Open)?;

    clear_dir(target_dir)?;

    let mut summary = MaterializeSummary::default();
    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| ArchiveError::Entry { index, source })?;

        let name = entry.name().to_string();
        let relative = entry
            .enclosed_name()
            .ok_or_else(|| ArchiveError::UnsafeEntry(name.clone()))?;
        let dest = target_dir.join(relative);

        if entry.is_dir() {
            fs::create_dir_all(&dest).map_err(|e| ArchiveError::write(&dest, e))?;
            summary.directories += 1;
            continue;
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ArchiveError::write(parent, e))?;
        }

        debug!("writing {name} to {}", dest.display());
        let file = File::create(&dest).map_err(|e| ArchiveError::write(&dest, e))?;
        let mut writer = BufWriter::new(file);
        let mut buffer = [0u8; 64 * 1024];
        loop {
            let read = entry.read(&mut buffer).map_err(|source| ArchiveError::Read {
                name: name.clone(),
                source,
            })?;
            if read == 0 {
                break;
            }
            writer
                .write_all(&buffer[..read])
                .map_err(|e| ArchiveError::write(&dest, e))?;
            summary.bytes += read as u64;
        }
        writer.flush().map_err(|e| ArchiveError::write(&dest, e))?;
        summary.files += 1;
    }

    Ok(summary)
}

/// Opens the zip at `zip_path` and extracts it on the blocking pool.
pub async fn extract_file(
    zip_path: PathBuf,
    target_dir: PathBuf,
) -> Result<MaterializeSummary, ArchiveError> {
    tokio::task::spawn_blocking(move || {
        let file =
            File::open(&zip_path).map_err(|e| ArchiveError::Open(zip::result::ZipError::Io(e)))?;
        extract(file, &target_dir)
    })
    .await
    .map_err(|e| ArchiveError::Task(e.to_string()))?
}

/// Removes `dir` and everything below it. A missing `dir` is not an error.
pub fn remove_dir(dir: &Path) -> Result<(), ArchiveError> {
    match fs::remove_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(ArchiveError::write(dir, e)),
    }
}

/// Removes `dir` and everything below it, then recreates it empty.
pub fn clear_dir(dir: &Path) -> Result<(), ArchiveError> {
    remove_dir(dir)?;
    fs::create_dir_all(dir).map_err(|e| ArchiveError::write(dir, e))
}

/// Directory name for a project: a single, deterministic path segment.
///
/// Characters that are illegal in file names on common filesystems, and
/// control characters, are dropped. Windows device names get a `_` suffix,
/// trailing dots and spaces are trimmed, and the result is clamped to 255
/// bytes. If nothing usable remains, the project id is used instead.
pub fn project_dir_name(name: &str, id: &str) -> String {
    let sanitized = sanitize_segment(name);
    if !sanitized.is_empty() {
        return sanitized;
    }
    let from_id = sanitize_segment(id);
    if from_id.is_empty() {
        "project".to_string()
    } else {
        from_id
    }
}

fn sanitize_segment(value: &str) -> String {
    let mut out: String = value
        .chars()
        .filter(|&c| !matches!(c, '/' | '?' | '<' | '>' | '\\' | ':' | '*' | '|' | '"'))
        .filter(|&c| !c.is_control())
        .collect();

    if out.chars().all(|c| c == '.') {
        return String::new();
    }

    let trimmed_len = out.trim_end_matches(['.', ' ']).len();
    out.truncate(trimmed_len);

    if is_windows_reserved(&out) {
        match out.find('.') {
            Some(dot) => out.insert(dot, '_'),
            None => out.push('_'),
        }
    }

    if out.len() > MAX_NAME_BYTES {
        let mut cut = MAX_NAME_BYTES;
        while !out.is_char_boundary(cut) {
            cut -= 1;
        }
        out.truncate(cut);
        let trimmed_len = out.trim_end_matches(['.', ' ']).len();
        out.truncate(trimmed_len);
    }

    out
}

fn is_windows_reserved(name: &str) -> bool {
    let base = name.split('.').next().unwrap_or(name).to_ascii_uppercase();
    let is_port = |prefix: &str| {
        base.strip_prefix(prefix)
            .is_some_and(|rest| rest.len() == 1 && rest.as_bytes()[0].is_ascii_digit())
    };
    matches!(base.as_str(), "CON" | "PRN" | "AUX" | "NUL") || is_port("COM") || is_port("LPT")
}
