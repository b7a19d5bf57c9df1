//! Lesson export via the external converter.
//!
//! Stage 3 of the build. Each configured document is handed to the converter
//! (`claat` by default), which writes one lesson directory, containing
//! rendered HTML and a `codelab.json`, under the lessons folder:
//!
//! ```text
//! claat export -f html -ga UA-88560603-1 -o build/learnings <doc-id>
//! ```
//!
//! Documents are exported one at a time, in configuration order. The first
//! failure stops the run; documents after it are not attempted.
//!
//! The [`Converter`] trait is the seam between the pipeline and the
//! subprocess: [`ClaatConverter`] is the production implementation, tests
//! use an in-process fake that writes metadata files directly.

use crate::config::{ConverterConfig, SourceConfig};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum ExportError {
    /// The converter binary could not be launched.
    #[error("failed to start {program} for document {document}: {source}")]
    Spawn {
        program: String,
        document: String,
        source: std::io::Error,
    },
    /// The converter binary ran and exited non-zero.
    #[error("{program} failed for document {document}: {status}")]
    Failed {
        program: String,
        document: String,
        status: ExitStatus,
    },
    /// Failure reported by a [`Converter`] that does not run a subprocess.
    #[error("converter failed for document {document}: {message}")]
    Converter { document: String, message: String },
}

/// One document to export and where the lesson should land.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest<'a> {
    pub document: &'a str,
    pub format: &'a str,
    pub analytics_id: &'a str,
    pub output_dir: &'a Path,
}

impl ExportRequest<'_> {
    /// Converter arguments: `export -f <format> -ga <id> -o <dir> <document>`.
    pub fn args(&self) -> Vec<OsString> {
        vec![
            "export".into(),
            "-f".into(),
            self.format.into(),
            "-ga".into(),
            self.analytics_id.into(),
            "-o".into(),
            self.output_dir.as_os_str().to_owned(),
            self.document.into(),
        ]
    }
}

/// Turns one source document into a lesson directory.
pub trait Converter {
    fn export(&self, request: &ExportRequest<'_>) -> Result<(), ExportError>;
}

/// Runs the converter binary as a blocking subprocess.
///
/// Stdout and stderr are inherited so the converter's own progress output
/// appears inline with the build log.
#[derive(Debug, Clone)]
pub struct ClaatConverter {
    program: String,
}

impl ClaatConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.program.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Converter for ClaatConverter {
    fn export(&self, request: &ExportRequest<'_>) -> Result<(), ExportError> {
        debug!(program = %self.program, args = ?request.args(), "spawning converter");
        let status = Command::new(&self.program)
            .args(request.args())
            .status()
            .map_err(|source| ExportError::Spawn {
                program: self.program.clone(),
                document: request.document.to_string(),
                source,
            })?;
        if !status.success() {
            return Err(ExportError::Failed {
                program: self.program.clone(),
                document: request.document.to_string(),
                status,
            });
        }
        Ok(())
    }
}

/// Progress events emitted while exporting, consumed by the CLI printer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportEvent {
    Started {
        index: usize,
        total: usize,
        document: String,
    },
    Finished {
        index: usize,
        document: String,
    },
}

/// Summary of a successful export stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub output_dir: PathBuf,
    pub documents: Vec<String>,
}

/// Export every configured document, in order, stopping at the first failure.
pub fn export_all(
    sources: &SourceConfig,
    settings: &ConverterConfig,
    output_dir: &Path,
    converter: &dyn Converter,
    mut on_event: impl FnMut(ExportEvent),
) -> Result<ExportReport, ExportError> {
    let total = sources.google_docs.len();
    let mut documents = Vec::with_capacity(total);

    for (index, document) in sources.google_docs.iter().enumerate() {
        info!(document = %document, "exporting lesson");
        on_event(ExportEvent::Started {
            index,
            total,
            document: document.clone(),
        });
        let request = ExportRequest {
            document,
            format: &settings.format,
            analytics_id: &settings.analytics_id,
            output_dir,
        };
        converter.export(&request)?;
        on_event(ExportEvent::Finished {
            index,
            document: document.clone(),
        });
        documents.push(document.clone());
    }

    Ok(ExportReport {
        output_dir: output_dir.to_path_buf(),
        documents,
    })
}
