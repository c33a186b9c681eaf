// Archiver: turns a project directory into a single zip file on disk.
//
// The zip lives inside a fresh `alice-*` temporary directory owned by the
// returned `Archive`. Dropping the `Archive` removes the directory, so the
// file disappears on every exit path that unwinds (success, error, panic).
// The directory is also registered with `cleanup` so an interrupt removes it.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Component, Path, PathBuf};

use tempfile::TempDir;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::cleanup::{self, PendingDir};
use crate::error::AliceError;

/// Directory names that are never uploaded, at any depth.
pub const EXCLUDED_DIRS: &[&str] = &[
    "node_modules",
    ".git",
    "dist",
    "build",
    ".next",
    "venv",
    "__pycache__",
    ".vercel",
    "coverage",
];

/// File name of the zip inside the temporary directory.
pub const ARCHIVE_NAME: &str = "code.zip";

/// Maximum deflate level: uploads are bandwidth-bound, not CPU-bound.
const COMPRESSION_LEVEL: i64 = 9;

/// A temporary zip of a source tree. Deleted when dropped.
#[derive(Debug)]
pub struct Archive {
    dir: TempDir,
    _pending: PendingDir,
    path: PathBuf,
    entries: usize,
    size: u64,
}

impl Archive {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of files stored in the zip.
    pub fn entry_count(&self) -> usize {
        self.entries
    }

    /// Size of the zip on disk, in bytes.
    pub fn size_bytes(&self) -> u64 {
        self.size
    }

    /// Delete the archive now and report whether removal succeeded.
    pub fn close(self) -> std::io::Result<()> {
        let dir = self.dir.path().to_path_buf();
        self.dir.close()?;
        debug!(dir = %dir.display(), "removed temporary archive");
        Ok(())
    }
}

/// Whether a path relative to the source root falls under the exclusion policy.
pub fn is_excluded(relative: &Path) -> bool {
    relative.components().any(|c| match c {
        Component::Normal(name) => name
            .to_str()
            .is_some_and(|name| EXCLUDED_DIRS.contains(&name)),
        _ => false,
    })
}

/// Zip every includable file under `source` into a new temporary archive
/// in the OS temp directory.
pub fn create_archive(source: &Path) -> Result<Archive, AliceError> {
    create_archive_in(source, &std::env::temp_dir())
}

/// Like [`create_archive`], with the temporary directory created under
/// `temp_parent`. The temporary directory is never archived, even when it
/// sits inside `source`.
pub fn create_archive_in(source: &Path, temp_parent: &Path) -> Result<Archive, AliceError> {
    let root = check_source_dir(source)?;

    let dir = tempfile::Builder::new()
        .prefix("alice-")
        .tempdir_in(temp_parent)
        .map_err(|e| AliceError::archive("Failed to create temporary directory", e))?;
    let pending = cleanup::track(dir.path());
    let path = dir.path().join(ARCHIVE_NAME);
    let own_dir = dir
        .path()
        .canonicalize()
        .map_err(|e| AliceError::archive("Failed to resolve temporary directory", e))?;
    debug!(source = %root.display(), archive = %path.display(), "creating archive");

    // On any error below `dir` is dropped, discarding the partial zip.
    let file = File::create(&path)
        .map_err(|e| AliceError::archive(format!("Failed to create {}", path.display()), e))?;
    let mut zip = ZipWriter::new(BufWriter::new(file));
    let entries = write_tree(&root, &own_dir, &mut zip)?;
    let mut out = zip
        .finish()
        .map_err(|e| AliceError::archive("Failed to finalize zip", e))?;
    out.flush()
        .map_err(|e| AliceError::archive("Failed to flush zip to disk", e))?;
    drop(out);

    let size = std::fs::metadata(&path)
        .map_err(|e| AliceError::archive("Failed to stat archive", e))?
        .len();
    debug!(entries, size, "archive ready");

    Ok(Archive {
        dir,
        _pending: pending,
        path,
        entries,
        size,
    })
}

fn check_source_dir(source: &Path) -> Result<PathBuf, AliceError> {
    let root = source.canonicalize().map_err(|e| AliceError::Path {
        path: source.to_path_buf(),
        message: "directory does not exist or is not accessible".into(),
        source: Some(e),
    })?;
    if !root.is_dir() {
        return Err(AliceError::path(source, "not a directory"));
    }
    std::fs::read_dir(&root).map_err(|e| AliceError::Path {
        path: source.to_path_buf(),
        message: "directory is not readable".into(),
        source: Some(e),
    })?;
    Ok(root)
}

/// Add every file under `root` except excluded paths and `skip_dir`, which
/// holds the zip being written.
fn write_tree<W>(root: &Path, skip_dir: &Path, zip: &mut ZipWriter<W>) -> Result<usize, AliceError>
where
    W: Write + std::io::Seek,
{
    let walker = WalkDir::new(root)
        .follow_links(false)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            !is_excluded(relative) && entry.path() != skip_dir
        });

    let mut entries = 0;
    for entry in walker {
        let entry = entry.map_err(|e| AliceError::archive("Failed to walk source tree", e))?;
        let path = entry.path();
        if entry.file_type().is_dir() {
            continue;
        }
        // Symlinks are stored by content when they point at a regular file.
        if entry.file_type().is_symlink() && !path.is_file() {
            warn!(path = %path.display(), "skipping symlink that is not a regular file");
            continue;
        }

        let relative = path.strip_prefix(root).unwrap_or(path);
        let name = zip_entry_name(relative);
        let mut source = File::open(path).map_err(|e| {
            AliceError::archive(format!("Failed to read {}", path.display()), e)
        })?;
        let len = source.metadata().map(|m| m.len()).unwrap_or(0);

        zip.start_file(name.as_str(), file_options(len))
            .map_err(|e| AliceError::archive(format!("Failed to add {name}"), e))?;
        std::io::copy(&mut source, zip)
            .map_err(|e| AliceError::archive(format!("Failed to compress {name}"), e))?;
        entries += 1;
    }
    Ok(entries)
}

fn file_options(len: u64) -> SimpleFileOptions {
    SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(COMPRESSION_LEVEL))
        .large_file(len >= u32::MAX as u64)
}

/// Zip entry names always use `/`, whatever the host separator.
fn zip_entry_name(relative: &Path) -> String {
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
