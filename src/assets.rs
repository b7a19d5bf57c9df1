//! Static asset copying.
//!
//! Stage 6 of the build. Every top-level entry of the statics directory is
//! copied into the output directory, recursing into directories. Contents are
//! copied byte for byte; nothing is rewritten.
//!
//! ```text
//! statics/                  build/
//! ├── css/site.css     →    ├── css/site.css
//! ├── favicon.ico      →    ├── favicon.ico
//! └── .DS_Store             (hidden entries are skipped)
//! ```

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum CopyError {
    #[error("cannot list {path}: {source}")]
    List {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot walk {path}: {source}")]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}

/// What the copy stage put into the output directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopyReport {
    /// Top-level entries copied, by name.
    pub entries: Vec<String>,
    /// Regular files written.
    pub files: usize,
}

fn is_hidden(name: &str) -> bool {
    name.starts_with('.')
}

/// Copy each top-level entry of `statics_dir` into `output_dir`.
///
/// A missing statics directory copies nothing. The first I/O failure aborts
/// the remaining copies.
pub fn copy_statics(statics_dir: &Path, output_dir: &Path) -> Result<CopyReport, CopyError> {
    let mut report = CopyReport::default();
    if !statics_dir.is_dir() {
        debug!(dir = %statics_dir.display(), "no statics directory, skipping");
        return Ok(report);
    }

    let list_err = |source| CopyError::List {
        path: statics_dir.to_path_buf(),
        source,
    };
    let mut entries = Vec::new();
    for entry in fs::read_dir(statics_dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let name = entry.file_name().to_string_lossy().to_string();
        if !is_hidden(&name) {
            entries.push((name, entry.path()));
        }
    }
    entries.sort();

    for (name, path) in entries {
        report.files += copy_entry(&path, &output_dir.join(&name))?;
        report.entries.push(name);
    }

    info!(
        entries = report.entries.len(),
        files = report.files,
        "copied statics"
    );
    Ok(report)
}

/// Copy a file or a whole directory tree to `dest`. Returns the number of
/// files written.
fn copy_entry(src: &Path, dest: &Path) -> Result<usize, CopyError> {
    let mut files = 0;
    for entry in WalkDir::new(src).sort_by_file_name() {
        let entry = entry.map_err(|source| CopyError::Walk {
            path: src.to_path_buf(),
            source,
        })?;
        let relative = entry.path().strip_prefix(src).unwrap_or(Path::new(""));
        let target = if relative.as_os_str().is_empty() {
            dest.to_path_buf()
        } else {
            dest.join(relative)
        };

        let copy_err = |source| CopyError::Copy {
            from: entry.path().to_path_buf(),
            to: target.clone(),
            source,
        };
        if entry.file_type().is_dir() {
            fs::create_dir_all(&target).map_err(copy_err)?;
        } else {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent).map_err(copy_err)?;
            }
            fs::copy(entry.path(), &target).map_err(copy_err)?;
            files += 1;
        }
    }
    Ok(files)
}
