//! Lesson metadata aggregation.
//!
//! Stage 4 of the build. After the converter has exported every lesson,
//! this module discovers each lesson's `codelab.json`, decodes it into a
//! [`LessonRecord`], rewrites its URL so it resolves from the site root, and
//! groups the records by tag for the landing page.
//!
//! ## Discovery
//!
//! Exactly one level of lesson directories is considered:
//!
//! ```text
//! build/learnings/
//! ├── gcp-intro/codelab.json      ← found
//! ├── bigquery-101/codelab.json   ← found
//! ├── stray.json                  ← ignored (not in a lesson directory)
//! └── nested/deeper/codelab.json  ← ignored (too deep)
//! ```
//!
//! ## Tag Index
//!
//! Tags are lower-cased before grouping. A record is appended to a bucket once
//! per tag instance, so a lesson tagged `["GCP", "gcp"]` shows up twice under
//! `gcp`. Buckets keep arrival order.
//!
//! ## Failure
//!
//! One unreadable or malformed metadata file fails the whole aggregation.
//! There is no best-effort mode.

use crate::types::{LessonRecord, METADATA_FILE};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum AggregateError {
    #[error("cannot list lessons in {path}: {source}")]
    Discover {
        path: PathBuf,
        source: walkdir::Error,
    },
    #[error("cannot read lesson metadata {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed lesson metadata {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

impl AggregateError {
    /// The metadata file (or lessons directory) that caused the failure.
    pub fn path(&self) -> &Path {
        match self {
            Self::Discover { path, .. } | Self::Read { path, .. } | Self::Parse { path, .. } => {
                path
            }
        }
    }
}

/// Lower-cased tag → positions of the lessons carrying it.
///
/// Positions index into the owning [`Catalog`]'s lesson list. Every bucket is
/// non-empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagIndex {
    buckets: BTreeMap<String, Vec<usize>>,
}

impl TagIndex {
    /// Group `lessons` by their lower-cased tags.
    pub fn build(lessons: &[LessonRecord]) -> Self {
        let mut buckets: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (pos, lesson) in lessons.iter().enumerate() {
            for tag in lesson.normalized_tags() {
                buckets.entry(tag).or_default().push(pos);
            }
        }
        Self { buckets }
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, tag: &str) -> bool {
        self.buckets.contains_key(tag)
    }

    /// Lesson positions for a lower-cased tag.
    pub fn positions(&self, tag: &str) -> &[usize] {
        self.buckets.get(tag).map(Vec::as_slice).unwrap_or_default()
    }

    /// Distinct tags. Callers should not rely on the order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.buckets.keys().map(String::as_str)
    }
}

/// Every exported lesson plus its tag grouping.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    lessons: Vec<LessonRecord>,
    index: TagIndex,
}

impl Catalog {
    pub fn new(lessons: Vec<LessonRecord>) -> Self {
        let index = TagIndex::build(&lessons);
        Self { lessons, index }
    }

    /// All lessons in discovery order.
    pub fn lessons(&self) -> &[LessonRecord] {
        &self.lessons
    }

    pub fn index(&self) -> &TagIndex {
        &self.index
    }

    /// Distinct lower-cased tags in use.
    pub fn technologies(&self) -> Vec<&str> {
        self.index.keys().collect()
    }

    /// Lessons tagged `tag` (matched case-insensitively), in arrival order.
    pub fn bucket(&self, tag: &str) -> Vec<&LessonRecord> {
        self.index
            .positions(&tag.to_lowercase())
            .iter()
            .map(|&pos| &self.lessons[pos])
            .collect()
    }

    /// The tag mapping with positions resolved, ready to serialize.
    pub fn mappings(&self) -> BTreeMap<&str, Vec<&LessonRecord>> {
        self.index
            .buckets
            .iter()
            .map(|(tag, positions)| {
                let lessons = positions.iter().map(|&pos| &self.lessons[pos]).collect();
                (tag.as_str(), lessons)
            })
            .collect()
    }
}

/// A lesson that breaks a site convention. Reported, never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonWarning {
    pub lesson: String,
    pub message: String,
}

/// Find every `<lessons_dir>/*/codelab.json`, sorted by path.
///
/// A missing lessons directory means nothing was exported and yields no paths.
pub fn discover_metadata(lessons_dir: &Path) -> Result<Vec<PathBuf>, AggregateError> {
    if !lessons_dir.is_dir() {
        debug!(dir = %lessons_dir.display(), "no lessons directory");
        return Ok(Vec::new());
    }

    let mut paths = Vec::new();
    for entry in WalkDir::new(lessons_dir).min_depth(2).max_depth(2) {
        let entry = entry.map_err(|source| AggregateError::Discover {
            path: lessons_dir.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file() && entry.file_name() == METADATA_FILE {
            paths.push(entry.into_path());
        }
    }
    paths.sort();
    Ok(paths)
}

/// Join a lesson URL onto the lessons folder with exactly one `/` between.
///
/// ```text
/// rewrite_url("learnings/", "foo.html") → "learnings/foo.html"
/// rewrite_url("learnings", "foo.html")  → "learnings/foo.html"
/// ```
pub fn rewrite_url(prefix: &str, url: &str) -> String {
    let prefix = prefix.trim_end_matches('/');
    let url = url.trim_start_matches('/');
    format!("{prefix}/{url}")
}

/// Read one metadata file and rewrite its URL under `url_prefix`.
pub fn parse_record(path: &Path, url_prefix: &str) -> Result<LessonRecord, AggregateError> {
    let bytes = fs::read(path).map_err(|source| AggregateError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let mut record: LessonRecord =
        serde_json::from_slice(&bytes).map_err(|source| AggregateError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    record.url = rewrite_url(url_prefix, &record.url);
    Ok(record)
}

/// Discover and parse every exported lesson under `lessons_dir`.
pub fn aggregate(lessons_dir: &Path, url_prefix: &str) -> Result<Catalog, AggregateError> {
    let paths = discover_metadata(lessons_dir)?;
    let mut lessons = Vec::with_capacity(paths.len());
    for path in &paths {
        debug!(path = %path.display(), "reading lesson metadata");
        lessons.push(parse_record(path, url_prefix)?);
    }

    let catalog = Catalog::new(lessons);
    info!(
        lessons = catalog.lessons().len(),
        technologies = catalog.index().len(),
        "aggregated lesson metadata"
    );
    Ok(catalog)
}

/// Check lessons against the site conventions: the expected category is
/// present and at least one tag is set. Each violation is logged.
pub fn lint(catalog: &Catalog, expected_category: &str) -> Vec<LessonWarning> {
    let mut warnings = Vec::new();
    for lesson in catalog.lessons() {
        let name = if lesson.id.is_empty() {
            lesson.url.clone()
        } else {
            lesson.id.clone()
        };
        if !expected_category.is_empty()
            && !lesson
                .category
                .iter()
                .any(|c| c.eq_ignore_ascii_case(expected_category))
        {
            warnings.push(LessonWarning {
                lesson: name.clone(),
                message: format!("category does not include \"{expected_category}\""),
            });
        }
        if lesson.tags.is_empty() {
            warnings.push(LessonWarning {
                lesson: name,
                message: "no tags; lesson will not appear under any technology".to_string(),
            });
        }
    }
    for w in &warnings {
        warn!(lesson = %w.lesson, "{}", w.message);
    }
    warnings
}
