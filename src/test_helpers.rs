//! Shared test utilities for the codelab-site test suite.
//!
//! Provides a fixture project, lesson/template writers, and a
//! [`FakeConverter`] that stands in for `claat` by writing lesson
//! directories directly.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::test_helpers::*;
//!
//! let site = setup_site(&["doc-a", "doc-b"]);
//! let config = config::load_config(site.path()).unwrap();
//! let converter = FakeConverter::new().with_tags("doc-a", &["GCP", "gcp"]);
//! let report = pipeline::build(&config, &converter, |_| {}).unwrap();
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

use crate::export::{Converter, ExportError, ExportRequest};
use crate::types::METADATA_FILE;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and write a `learnings.json`
/// listing `docs`.
pub fn setup_site(docs: &[&str]) -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    let sources = serde_json::json!({ "googleDocs": docs });
    std::fs::write(tmp.path().join("learnings.json"), sources.to_string()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Writers
// =========================================================================

/// Metadata JSON for a lesson whose id and URL are both `id`.
pub fn lesson_json(id: &str, tags: &[&str]) -> String {
    serde_json::json!({
        "environment": "web",
        "updated": "2019-03-01T12:00:00Z",
        "id": id,
        "duration": 1200,
        "title": format!("Lesson {id}"),
        "author": "Codelab Team",
        "summary": format!("Summary of {id}"),
        "theme": "default",
        "category": ["cloud"],
        "tags": tags,
        "feedback": "",
        "url": id,
        "status": ["published"]
    })
    .to_string()
}

/// Write `<dir>/<id>/codelab.json` with `contents`.
pub fn write_lesson(dir: &Path, id: &str, contents: &str) -> PathBuf {
    let lesson_dir = dir.join(id);
    std::fs::create_dir_all(&lesson_dir).unwrap();
    let path = lesson_dir.join(METADATA_FILE);
    std::fs::write(&path, contents).unwrap();
    path
}

pub fn write_template(dir: &Path, name: &str, contents: &str) {
    std::fs::create_dir_all(dir).unwrap();
    std::fs::write(dir.join(name), contents).unwrap();
}

// =========================================================================
// Fake converter
// =========================================================================

/// An owned copy of one [`ExportRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedExport {
    pub document: String,
    pub format: String,
    pub analytics_id: String,
    pub output_dir: PathBuf,
}

/// Writes `<output_dir>/<document>/codelab.json` instead of running claat.
///
/// Lessons are tagged `["gcp"]` unless overridden with [`with_tags`](Self::with_tags).
/// Uses Mutex (not RefCell) to match the `&self` converter interface.
#[derive(Default)]
pub struct FakeConverter {
    tags: HashMap<String, Vec<String>>,
    raw: HashMap<String, String>,
    fail_on: Option<String>,
    requests: Mutex<Vec<RecordedExport>>,
}

impl FakeConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tags(mut self, document: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            document.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    /// Write `contents` verbatim as the document's metadata file.
    pub fn with_raw(mut self, document: &str, contents: &str) -> Self {
        self.raw.insert(document.to_string(), contents.to_string());
        self
    }

    pub fn failing_on(mut self, document: &str) -> Self {
        self.fail_on = Some(document.to_string());
        self
    }

    pub fn requests(&self) -> Vec<RecordedExport> {
        self.requests.lock().unwrap().clone()
    }

    /// Documents exported successfully, in order.
    pub fn exported(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.document).collect()
    }
}

impl Converter for FakeConverter {
    fn export(&self, request: &ExportRequest<'_>) -> Result<(), ExportError> {
        if self.fail_on.as_deref() == Some(request.document) {
            return Err(ExportError::Converter {
                document: request.document.to_string(),
                message: "simulated failure".to_string(),
            });
        }

        let contents = match self.raw.get(request.document) {
            Some(raw) => raw.clone(),
            None => {
                let tags: Vec<&str> = match self.tags.get(request.document) {
                    Some(tags) => tags.iter().map(String::as_str).collect(),
                    None => vec!["gcp"],
                };
                lesson_json(request.document, &tags)
            }
        };
        write_lesson(request.output_dir, request.document, &contents);
        std::fs::write(
            request.output_dir.join(request.document).join("index.html"),
            "<html><body>lesson</body></html>",
        )
        .unwrap();

        self.requests.lock().unwrap().push(RecordedExport {
            document: request.document.to_string(),
            format: request.format.to_string(),
            analytics_id: request.analytics_id.to_string(),
            output_dir: request.output_dir.to_path_buf(),
        });
        Ok(())
    }
}
