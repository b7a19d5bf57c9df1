//! # Codelab Site
//!
//! Builds the landing site for a collection of codelabs. Lesson sources are
//! external documents; the `claat` converter turns each one into a lesson
//! directory, and this crate indexes the results by technology and renders
//! the page that links them together.
//!
//! # Architecture: Six-Stage Pipeline
//!
//! ```text
//! 1. Config      learnings.json      →  SourceConfig
//! 2. Output      build/              →  deleted and recreated
//! 3. Export      claat per document  →  build/learnings/<id>/codelab.json
//! 4. Aggregate   codelab.json files  →  Catalog (lessons + tag index)
//! 5. Render      templates/*.html    →  build/index.html
//! 6. Statics     statics/*           →  build/
//! ```
//!
//! Stages run sequentially and the first error ends the build. Nothing is
//! carried between runs; the output directory is the only artifact.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`config`] | `site.toml` loading and merging, `learnings.json` decoding |
//! | [`export`] | Stage 3: the [`export::Converter`] seam and the `claat` subprocess |
//! | [`aggregate`] | Stage 4: metadata discovery, URL rewriting, tag index |
//! | [`render`] | Stage 5: template minification, compilation and rendering |
//! | [`assets`] | Stage 6: recursive static copy |
//! | [`pipeline`] | Stage ordering, output reset, unified [`pipeline::BuildError`] |
//! | [`types`] | [`types::LessonRecord`], the per-lesson metadata |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Explicit Configuration
//!
//! Every path and fixed name lives in [`config::SiteConfig`], built once at
//! startup and passed to each stage. The stock defaults reproduce the
//! conventional layout (`learnings.json`, `templates/`, `statics/`, `build/`),
//! so a project needs no `site.toml` at all.
//!
//! ## Permissive Metadata
//!
//! `codelab.json` is decoded leniently: unknown fields are ignored and missing
//! ones default to empty. Site conventions (every lesson in the `cloud`
//! category, at least one tag) are reported as warnings, never enforced.
//!
//! ## Runtime Templates
//!
//! The landing page is rendered with [minijinja] from templates on disk, so
//! the page markup can change without rebuilding the binary. Templates are
//! minified before compilation and undefined variables are hard errors.

pub mod aggregate;
pub mod assets;
pub mod config;
pub mod export;
pub mod output;
pub mod pipeline;
pub mod render;
pub mod types;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Initialize tracing with the specified verbosity level.
///
/// `verbose` maps 0 → INFO, 1 → DEBUG, 2+ → TRACE. `RUST_LOG` directives
/// are honoured on top.
pub fn init_tracing(verbose: u8) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let level = match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}
