//! Stage orchestration.
//!
//! Runs the stages in order, each to completion before the next:
//!
//! ```text
//! 1. load config       learnings.json        → SourceConfig
//! 2. prepare output    rm -r build/; mkdir build/
//! 3. export            claat per document    → build/learnings/<id>/
//! 4. aggregate         codelab.json files    → Catalog
//! 5. render            templates/*.html      → build/index.html
//! 6. copy statics      statics/*             → build/
//! ```
//!
//! The first error ends the build. The output directory is left as it was at
//! that moment; the next run starts by deleting it.

use crate::aggregate::{self, AggregateError, Catalog, LessonWarning};
use crate::assets::{self, CopyError, CopyReport};
use crate::config::{self, ConfigError, SiteConfig, SourceConfig};
use crate::export::{self, Converter, ExportError, ExportEvent, ExportReport};
use crate::render::{self, RenderError, Templates};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum BuildError {
    #[error("configuration: {0}")]
    Config(#[from] ConfigError),
    #[error("preparing output directory {path}: {source}")]
    Output {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("export: {0}")]
    Export(#[from] ExportError),
    #[error("lesson metadata: {0}")]
    Aggregate(#[from] AggregateError),
    #[error("landing page: {0}")]
    Render(#[from] RenderError),
    #[error("static assets: {0}")]
    Copy(#[from] CopyError),
}

/// Everything a finished build produced.
#[derive(Debug, Default)]
pub struct BuildReport {
    pub export: ExportReport,
    pub catalog: Catalog,
    pub warnings: Vec<LessonWarning>,
    pub landing: PathBuf,
    pub statics: CopyReport,
}

/// Delete the output directory if present and recreate it empty.
pub fn prepare_output(output_dir: &Path) -> Result<(), BuildError> {
    let output_err = |source| BuildError::Output {
        path: output_dir.to_path_buf(),
        source,
    };
    match fs::remove_dir_all(output_dir) {
        Ok(()) => info!(dir = %output_dir.display(), "removed previous build"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => return Err(output_err(e)),
    }
    fs::create_dir_all(output_dir).map_err(output_err)?;
    Ok(())
}

/// Stages 1–3: read sources, reset the output directory, export every lesson.
pub fn run_export(
    config: &SiteConfig,
    converter: &dyn Converter,
    on_event: impl FnMut(ExportEvent),
) -> Result<ExportReport, BuildError> {
    info!(path = %config.sources_path().display(), "reading sources");
    let sources: SourceConfig = config::load_sources(config)?;
    if sources.is_empty() {
        warn!(path = %config.sources_path().display(), "no documents listed");
    }

    prepare_output(&config.output_path())?;

    info!(documents = sources.google_docs.len(), "exporting lessons");
    let report = export::export_all(
        &sources,
        &config.converter,
        &config.lessons_path(),
        converter,
        on_event,
    )?;
    Ok(report)
}

/// Stage 4: aggregate whatever lessons are in the output directory and lint them.
pub fn run_aggregate(config: &SiteConfig) -> Result<(Catalog, Vec<LessonWarning>), BuildError> {
    let catalog = aggregate::aggregate(&config.lessons_path(), &config.lesson_url_prefix())?;
    let warnings = aggregate::lint(&catalog, &config.landing.expected_category);
    Ok((catalog, warnings))
}

/// Stage 5: render the landing page for `catalog`.
pub fn run_render(config: &SiteConfig, catalog: &Catalog) -> Result<PathBuf, BuildError> {
    let templates = render::compile_templates(&config.templates_path())?;
    let landing = render::render_landing(
        &templates,
        &config.landing.template,
        catalog,
        &config.landing_path(),
    )?;
    Ok(landing)
}

/// Stage 6: copy statics into the output directory.
pub fn run_copy(config: &SiteConfig) -> Result<CopyReport, BuildError> {
    Ok(assets::copy_statics(
        &config.statics_path(),
        &config.output_path(),
    )?)
}

/// Run every stage in order.
pub fn build(
    config: &SiteConfig,
    converter: &dyn Converter,
    on_event: impl FnMut(ExportEvent),
) -> Result<BuildReport, BuildError> {
    let export = run_export(config, converter, on_event)?;
    let (catalog, warnings) = run_aggregate(config)?;
    let landing = run_render(config, &catalog)?;
    let statics = run_copy(config)?;
    Ok(BuildReport {
        export,
        catalog,
        warnings,
        landing,
        statics,
    })
}

/// Validate a project without writing anything: config, sources and
/// templates must all load, and the landing template must exist.
pub fn check(config: &SiteConfig) -> Result<(SourceConfig, Templates), BuildError> {
    let sources = config::load_sources(config)?;
    let templates = render::compile_templates(&config.templates_path())?;
    templates.require(&config.landing.template)?;
    Ok((sources, templates))
}
