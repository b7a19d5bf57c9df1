//! Landing page rendering.
//!
//! Stage 5 of the build. Loads the HTML templates from the templates
//! directory, minifies each one, registers it with a [minijinja] environment
//! under its file stem, and renders the landing template (`index`) against
//! the aggregated [`Catalog`].
//!
//! ## Templates
//!
//! ```text
//! templates/
//! ├── index.html         → "index" (rendered to build/index.html)
//! └── lesson_card.html   → "lesson_card" ({% include "lesson_card" %})
//! ```
//!
//! Minification runs on the template source, before parsing, with template
//! syntax (`{{ }}`, `{% %}`, `{# #}`) preserved. Output is HTML-escaped.
//!
//! ## Context
//!
//! | Variable | Contents |
//! |----------|----------|
//! | `technologies` | distinct lower-cased tags |
//! | `mappings` | tag → lessons carrying it |
//! | `learnings` | every lesson, in discovery order |
//! | `generated_at` | RFC 3339 build timestamp |
//!
//! Undefined variables and fields are errors, not empty strings, so a typo in
//! a template fails the build instead of silently producing a blank page.

use crate::aggregate::Catalog;
use crate::types::LessonRecord;
use minijinja::{AutoEscape, Environment, ErrorKind, UndefinedBehavior};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("cannot read templates from {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("minified template {path} is not valid UTF-8")]
    Minify { path: PathBuf },
    #[error("template error in {path}: {source}")]
    Syntax {
        path: PathBuf,
        source: minijinja::Error,
    },
    #[error("template \"{name}\" not found in {dir}")]
    MissingTemplate { name: String, dir: PathBuf },
    #[error("rendering template \"{name}\" failed: {source}")]
    Render {
        name: String,
        source: minijinja::Error,
    },
    #[error("cannot write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Variables exposed to the landing templates.
#[derive(Debug, Serialize)]
pub struct LandingContext<'a> {
    pub technologies: Vec<&'a str>,
    pub mappings: BTreeMap<&'a str, Vec<&'a LessonRecord>>,
    pub learnings: &'a [LessonRecord],
    pub generated_at: String,
}

impl<'a> LandingContext<'a> {
    pub fn new(catalog: &'a Catalog) -> Self {
        Self {
            technologies: catalog.technologies(),
            mappings: catalog.mappings(),
            learnings: catalog.lessons(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// The compiled template set from one templates directory.
pub struct Templates {
    dir: PathBuf,
    env: Environment<'static>,
    names: Vec<String>,
}

impl std::fmt::Debug for Templates {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Templates")
            .field("dir", &self.dir)
            .field("names", &self.names)
            .finish()
    }
}

impl Templates {
    /// Template names in load order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// The minified source registered under `name`.
    pub fn source(&self, name: &str) -> Option<String> {
        self.env
            .get_template(name)
            .ok()
            .map(|t| t.source().to_string())
    }

    /// Render `name` against `context`.
    pub fn render<S: Serialize>(&self, name: &str, context: S) -> Result<String, RenderError> {
        let template = self.env.get_template(name).map_err(|err| {
            if err.kind() == ErrorKind::TemplateNotFound {
                RenderError::MissingTemplate {
                    name: name.to_string(),
                    dir: self.dir.clone(),
                }
            } else {
                RenderError::Render {
                    name: name.to_string(),
                    source: err,
                }
            }
        })?;
        template.render(context).map_err(|source| RenderError::Render {
            name: name.to_string(),
            source,
        })
    }

    /// Fail unless `name` was loaded.
    pub fn require(&self, name: &str) -> Result<(), RenderError> {
        if self.names.iter().any(|n| n == name) {
            Ok(())
        } else {
            Err(RenderError::MissingTemplate {
                name: name.to_string(),
                dir: self.dir.clone(),
            })
        }
    }
}

/// Minify an HTML template, keeping template tags intact.
pub fn minify_template(path: &Path, source: &str) -> Result<String, RenderError> {
    let mut cfg = minify_html::Cfg::new();
    cfg.keep_closing_tags = true;
    cfg.keep_html_and_head_opening_tags = true;
    cfg.preserve_brace_template_syntax = true;
    let minified = minify_html::minify(source.as_bytes(), &cfg);
    String::from_utf8(minified).map_err(|_| RenderError::Minify {
        path: path.to_path_buf(),
    })
}

/// List `*.html` files directly inside `dir`, sorted. A missing directory
/// yields no files.
fn template_files(dir: &Path) -> Result<Vec<PathBuf>, RenderError> {
    if !dir.is_dir() {
        return Ok(Vec::new());
    }
    let io_err = |source| RenderError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        let is_html = path
            .extension()
            .map(|e| e.eq_ignore_ascii_case("html"))
            .unwrap_or(false);
        if path.is_file() && is_html {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Load, minify and compile every template in `dir`.
pub fn compile_templates(dir: &Path) -> Result<Templates, RenderError> {
    let mut env = Environment::new();
    env.set_undefined_behavior(UndefinedBehavior::Strict);
    env.set_auto_escape_callback(|_| AutoEscape::Html);

    let mut names = Vec::new();
    for path in template_files(dir)? {
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_default();
        let source = fs::read_to_string(&path).map_err(|source| RenderError::Io {
            path: path.clone(),
            source,
        })?;
        let minified = minify_template(&path, &source)?;
        debug!(
            template = %name,
            original = source.len(),
            minified = minified.len(),
            "compiled template"
        );
        env.add_template_owned(name.clone(), minified)
            .map_err(|source| RenderError::Syntax {
                path: path.clone(),
                source,
            })?;
        names.push(name);
    }

    Ok(Templates {
        dir: dir.to_path_buf(),
        env,
        names,
    })
}

/// Render `template` for `catalog` and write it to `output`.
pub fn render_landing(
    templates: &Templates,
    template: &str,
    catalog: &Catalog,
    output: &Path,
) -> Result<PathBuf, RenderError> {
    let html = templates.render(template, LandingContext::new(catalog))?;
    if let Some(parent) = output.parent() {
        fs::create_dir_all(parent).map_err(|source| RenderError::Write {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    fs::write(output, html).map_err(|source| RenderError::Write {
        path: output.to_path_buf(),
        source,
    })?;
    info!(path = %output.display(), "rendered landing page");
    Ok(output.to_path_buf())
}
