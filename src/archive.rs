// src/archive.rs

//! Zip packaging of a work directory.
//!
//! Entry names are relative to the archived directory and always use `/`.
//! Entries are written in sorted order so the same tree gives the same
//! archive layout.
//!
//! Symlinked directories are skipped, so a link pointing outside the work
//! directory (or back into it) cannot pull in a foreign or endless tree.
//! Symlinked files are stored with the contents of their target.

use std::fs::File;
use std::io::{self, Seek, Write};
use std::path::Path;

use tracing::{debug, info, warn};
use zip::result::{ZipError, ZipResult};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::errors::{Result, WorkerError};
use crate::fs::FileSystem;

/// Archive behaviour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArchiveOptions {
    /// If true, subdirectory contents are archived too.
    ///
    /// If false, only the top-level entries are added; subdirectories then
    /// appear as empty directory entries.
    pub recursive: bool,
}

impl Default for ArchiveOptions {
    fn default() -> Self {
        Self { recursive: true }
    }
}

/// Write a deflate-compressed zip of `source_dir` to `dest`, replacing any
/// existing file. The parent directory of `dest` is created if missing.
pub fn archive_dir(
    fs: &dyn FileSystem,
    source_dir: &Path,
    dest: &Path,
    options: ArchiveOptions,
) -> Result<()> {
    let to_archive_error = |source: ZipError| WorkerError::Archive {
        path: dest.to_path_buf(),
        source,
    };

    if let Some(parent) = dest.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| to_archive_error(e.into()))?;
        }
    }

    let file = File::create(dest).map_err(|e| to_archive_error(e.into()))?;
    let (_, count) = write_zip(fs, source_dir, file, options).map_err(to_archive_error)?;

    info!(source = ?source_dir, archive = ?dest, entries = count, "archive written");
    Ok(())
}

/// Write a zip of `source_dir` into an arbitrary seekable writer and return
/// the writer once the archive is finished.
pub fn write_archive<W: Write + Seek>(
    fs: &dyn FileSystem,
    source_dir: &Path,
    writer: W,
    options: ArchiveOptions,
) -> Result<W> {
    let (writer, _) =
        write_zip(fs, source_dir, writer, options).map_err(|source| WorkerError::Archive {
            path: source_dir.to_path_buf(),
            source,
        })?;
    Ok(writer)
}

fn write_zip<W: Write + Seek>(
    fs: &dyn FileSystem,
    source_dir: &Path,
    writer: W,
    options: ArchiveOptions,
) -> ZipResult<(W, usize)> {
    let mut zip = ZipWriter::new(writer);
    let count = add_dir_entries(fs, &mut zip, source_dir, "", options)?;
    let writer = zip.finish()?;
    Ok((writer, count))
}

/// Add the entries of `dir` under the archive `prefix`. Returns how many
/// entries were written.
fn add_dir_entries<W: Write + Seek>(
    fs: &dyn FileSystem,
    zip: &mut ZipWriter<W>,
    dir: &Path,
    prefix: &str,
    options: ArchiveOptions,
) -> ZipResult<usize> {
    let file_options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    let mut children = fs.read_dir(dir)?;
    children.sort();

    let mut count = 0;
    for child in children {
        let Some(name) = child.file_name() else {
            continue;
        };
        let entry_name = format!("{prefix}{}", name.to_string_lossy());

        if fs.is_dir(&child) && fs.is_symlink(&child) {
            warn!(entry = %entry_name, "skipping symlinked directory");
        } else if fs.is_dir(&child) {
            debug!(entry = %entry_name, "adding directory");
            zip.add_directory(format!("{entry_name}/"), file_options)?;
            count += 1;
            if options.recursive {
                count += add_dir_entries(fs, zip, &child, &format!("{entry_name}/"), options)?;
            }
        } else if fs.is_file(&child) {
            debug!(entry = %entry_name, "adding file");
            zip.start_file(entry_name, file_options)?;
            let mut reader = fs.open_read(&child)?;
            io::copy(&mut reader, zip)?;
            count += 1;
        }
    }

    Ok(count)
}
