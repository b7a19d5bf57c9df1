//! Site configuration module.
//!
//! Two files drive a build, both read from the project root:
//!
//! - `learnings.json`: the list of lesson sources (required).
//! - `site.toml`: paths, converter settings and landing page options
//!   (optional; every key has a stock default).
//!
//! ## Project Layout
//!
//! ```text
//! project/
//! ├── learnings.json           # {"googleDocs": ["<doc-id>", ...]}
//! ├── site.toml                # Optional overrides (see below)
//! ├── templates/               # Landing page templates (*.html, one must be index.html)
//! │   ├── index.html
//! │   └── lesson_card.html
//! ├── statics/                 # Copied verbatim into build/
//! │   └── css/site.css
//! └── build/                   # Recreated from empty on every run
//!     ├── index.html
//!     └── learnings/<lesson-id>/codelab.json
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! sources_file = "learnings.json"
//! output_dir = "build"
//! lessons_dir = "learnings"    # Relative to output_dir
//! templates_dir = "templates"
//! statics_dir = "statics"
//!
//! [converter]
//! program = "claat"
//! format = "html"
//! analytics_id = "UA-88560603-1"
//!
//! [landing]
//! template = "index"
//! output_file = "index.html"
//! expected_category = "cloud"
//! ```
//!
//! Config files are sparse and merged over the stock defaults. Unknown keys
//! are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Component, Path, PathBuf};
use thiserror::Error;

/// Name of the optional site configuration file in the project root.
pub const SITE_CONFIG_FILE: &str = "site.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("malformed sources file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// The external documents to export, as listed in `learnings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    /// Google Doc identifiers handed to the converter, in export order.
    #[serde(rename = "googleDocs", default)]
    pub google_docs: Vec<String>,
}

impl SourceConfig {
    pub fn is_empty(&self) -> bool {
        self.google_docs.is_empty()
    }
}

/// Everything a build needs to know about paths and fixed names.
///
/// Constructed once at startup and passed by reference to every stage.
/// `root` is not part of `site.toml`; it comes from the command line.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(skip)]
    pub root: PathBuf,
    /// Sources file, relative to the root.
    pub sources_file: String,
    /// Build output directory, relative to the root. Deleted on every run.
    pub output_dir: String,
    /// Folder under `output_dir` the converter writes lessons into. Also the
    /// prefix of every lesson URL on the landing page.
    pub lessons_dir: String,
    pub templates_dir: String,
    pub statics_dir: String,
    pub converter: ConverterConfig,
    pub landing: LandingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::new(),
            sources_file: "learnings.json".to_string(),
            output_dir: "build".to_string(),
            lessons_dir: "learnings".to_string(),
            templates_dir: "templates".to_string(),
            statics_dir: "statics".to_string(),
            converter: ConverterConfig::default(),
            landing: LandingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate that names are usable and directories stay inside the root.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (key, value) in [
            ("sources_file", &self.sources_file),
            ("output_dir", &self.output_dir),
            ("lessons_dir", &self.lessons_dir),
            ("templates_dir", &self.templates_dir),
            ("statics_dir", &self.statics_dir),
            ("landing.output_file", &self.landing.output_file),
        ] {
            validate_relative(key, value)?;
        }
        self.validate_output_dir()?;
        if self.converter.program.trim().is_empty() {
            return Err(ConfigError::Validation(
                "converter.program must not be empty".into(),
            ));
        }
        if self.converter.format.trim().is_empty() {
            return Err(ConfigError::Validation(
                "converter.format must not be empty".into(),
            ));
        }
        if self.landing.template.trim().is_empty() {
            return Err(ConfigError::Validation(
                "landing.template must not be empty".into(),
            ));
        }
        Ok(())
    }

    /// The output directory is deleted on every build, so it must be a real
    /// subdirectory that holds none of the project's inputs.
    fn validate_output_dir(&self) -> Result<(), ConfigError> {
        let output = normalized(&self.output_dir);
        if output.as_os_str().is_empty() {
            return Err(ConfigError::Validation(format!(
                "output_dir must not be the project root: {}",
                self.output_dir
            )));
        }
        for (key, value) in [
            ("sources_file", &self.sources_file),
            ("templates_dir", &self.templates_dir),
            ("statics_dir", &self.statics_dir),
        ] {
            if normalized(value).starts_with(&output) {
                return Err(ConfigError::Validation(format!(
                    "output_dir {} would delete {key} {value} on every build",
                    self.output_dir
                )));
            }
        }
        Ok(())
    }

    pub fn sources_path(&self) -> PathBuf {
        self.root.join(&self.sources_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.root.join(&self.output_dir)
    }

    pub fn lessons_path(&self) -> PathBuf {
        self.output_path().join(&self.lessons_dir)
    }

    pub fn templates_path(&self) -> PathBuf {
        self.root.join(&self.templates_dir)
    }

    pub fn statics_path(&self) -> PathBuf {
        self.root.join(&self.statics_dir)
    }

    pub fn landing_path(&self) -> PathBuf {
        self.output_path().join(&self.landing.output_file)
    }

    /// URL prefix for lesson links, relative to the output root.
    pub fn lesson_url_prefix(&self) -> String {
        self.lessons_dir.replace('\\', "/")
    }
}

fn validate_relative(key: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Validation(format!("{key} must not be empty")));
    }
    let path = Path::new(value);
    let escapes = path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes {
        return Err(ConfigError::Validation(format!(
            "{key} must be a relative path inside the project: {value}"
        )));
    }
    Ok(())
}

/// `value` with `.` components dropped. Only meaningful after
/// `validate_relative` has accepted it.
fn normalized(value: &str) -> PathBuf {
    Path::new(value)
        .components()
        .filter(|c| matches!(c, Component::Normal(_)))
        .collect()
}

/// How the external converter is invoked.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConverterConfig {
    /// Executable name or path (looked up on `PATH`).
    pub program: String,
    /// Value passed to `-f`.
    pub format: String,
    /// Value passed to `-ga`.
    pub analytics_id: String,
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: "claat".to_string(),
            format: "html".to_string(),
            analytics_id: "UA-88560603-1".to_string(),
        }
    }
}

/// Landing page rendering settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LandingConfig {
    /// Template rendered as the landing page (file stem under `templates_dir`).
    pub template: String,
    /// Output file, relative to `output_dir`.
    pub output_file: String,
    /// Category every lesson is expected to carry. Lessons without it are
    /// reported as warnings.
    pub expected_category: String,
}

impl Default for LandingConfig {
    fn default() -> Self {
        Self {
            template: "index".to_string(),
            output_file: "index.html".to_string(),
            expected_category: "cloud".to_string(),
        }
    }
}

/// Returns the stock default config as a `toml::Value::Table`.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(SiteConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `site.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(root: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = root.join(SITE_CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto the stock defaults, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the site config for a project root.
///
/// Uses stock defaults when there is no `site.toml`.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(root)?;
    let mut config = resolve_config(base, overlay)?;
    config.root = root.to_path_buf();
    Ok(config)
}

/// Read and decode the sources file named by `config`.
///
/// A missing file is an error; a file without `googleDocs` yields no sources.
pub fn load_sources(config: &SiteConfig) -> Result<SourceConfig, ConfigError> {
    let path = config.sources_path();
    let content = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| ConfigError::Json { path, source })
}

/// Returns a fully-commented stock `site.toml`.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Codelab Site Configuration
# ==========================
# All settings are optional. Values shown below are the defaults.
# Unknown keys will cause an error.

# JSON file listing the documents to export: {"googleDocs": ["<id>", ...]}
sources_file = "learnings.json"

# Build output. Deleted and recreated at the start of every build.
output_dir = "build"

# Folder inside output_dir where lessons are exported. Lesson links on the
# landing page are prefixed with this folder name.
lessons_dir = "learnings"

# Landing page templates (*.html). Each file is registered under its stem,
# so templates/lesson_card.html is included as "lesson_card".
templates_dir = "templates"

# Copied verbatim into output_dir after the landing page is rendered.
statics_dir = "statics"

# ---------------------------------------------------------------------------
# Converter: invoked once per document as
#   <program> export -f <format> -ga <analytics_id> -o <output_dir>/<lessons_dir> <doc>
# ---------------------------------------------------------------------------
[converter]
program = "claat"
format = "html"
analytics_id = "UA-88560603-1"

# ---------------------------------------------------------------------------
# Landing page
# ---------------------------------------------------------------------------
[landing]
# Template rendered as the landing page.
template = "index"
# Written to <output_dir>/<output_file>.
output_file = "index.html"
# Lessons whose category list lacks this value are reported as warnings.
expected_category = "cloud"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_paths() {
        let mut config = SiteConfig::default();
        config.root = PathBuf::from("/site");
        assert_eq!(config.sources_path(), PathBuf::from("/site/learnings.json"));
        assert_eq!(config.output_path(), PathBuf::from("/site/build"));
        assert_eq!(config.lessons_path(), PathBuf::from("/site/build/learnings"));
        assert_eq!(config.templates_path(), PathBuf::from("/site/templates"));
        assert_eq!(config.statics_path(), PathBuf::from("/site/statics"));
        assert_eq!(config.landing_path(), PathBuf::from("/site/build/index.html"));
    }

    #[test]
    fn default_converter_settings() {
        let config = SiteConfig::default();
        assert_eq!(config.converter.program, "claat");
        assert_eq!(config.converter.format, "html");
        assert_eq!(config.converter.analytics_id, "UA-88560603-1");
        assert_eq!(config.landing.template, "index");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output_dir, "build");
        assert_eq!(config.root, tmp.path());
    }

    #[test]
    fn load_config_merges_sparse_file() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(SITE_CONFIG_FILE),
            r#"
output_dir = "public"

[converter]
analytics_id = "G-TEST"
"#,
        )
        .unwrap();

        let config = load_config(tmp.path()).unwrap();
        assert_eq!(config.output_dir, "public");
        assert_eq!(config.converter.analytics_id, "G-TEST");
        // Untouched keys keep their defaults
        assert_eq!(config.converter.program, "claat");
        assert_eq!(config.lessons_dir, "learnings");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SITE_CONFIG_FILE), "not toml [[[").unwrap();
        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(SITE_CONFIG_FILE),
            r#"
[converter]
programme = "claat"
"#,
        )
        .unwrap();
        assert!(load_config(tmp.path()).is_err());
    }

    #[test]
    fn validate_rejects_escaping_dirs() {
        let mut config = SiteConfig::default();
        config.output_dir = "../elsewhere".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("output_dir"));

        let mut config = SiteConfig::default();
        config.statics_dir = "/abs/statics".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_output_dir_at_root() {
        for output in [".", "./", "./."] {
            let mut config = SiteConfig::default();
            config.output_dir = output.to_string();
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains("project root"), "{output}");
        }
    }

    #[test]
    fn validate_rejects_output_dir_holding_inputs() {
        let cases = [
            ("templates", "templates_dir"),
            ("./statics", "statics_dir"),
            ("site", "templates_dir"),
        ];
        for (output, key) in cases {
            let mut config = SiteConfig::default();
            config.output_dir = output.to_string();
            config.templates_dir = if output == "site" {
                "site/templates".to_string()
            } else {
                "templates".to_string()
            };
            let err = config.validate().unwrap_err();
            assert!(err.to_string().contains(key), "{output}: {err}");
        }

        let mut config = SiteConfig::default();
        config.output_dir = "data".to_string();
        config.sources_file = "data/learnings.json".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("sources_file"));
    }

    #[test]
    fn validate_allows_sibling_dirs_with_shared_prefix() {
        let mut config = SiteConfig::default();
        config.output_dir = "stat".to_string();
        assert!(config.validate().is_ok());

        let mut config = SiteConfig::default();
        config.output_dir = "./out".to_string();
        config.templates_dir = ".".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_config_rejects_output_dir_at_root_before_any_delete() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(SITE_CONFIG_FILE), "output_dir = \".\"\n").unwrap();
        fs::write(tmp.path().join("learnings.json"), "{}").unwrap();

        let result = load_config(tmp.path());
        assert!(matches!(result, Err(ConfigError::Validation(_))));
        assert!(tmp.path().join("learnings.json").exists());
    }

    #[test]
    fn validate_rejects_empty_program() {
        let mut config = SiteConfig::default();
        config.converter.program = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[converter]
program = "claat"
format = "html"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str(
            r#"
[converter]
format = "md"
"#,
        )
        .unwrap();
        let merged = merge_toml(base, overlay);
        let converter = merged.get("converter").unwrap();
        assert_eq!(converter.get("format").unwrap().as_str(), Some("md"));
        assert_eq!(converter.get("program").unwrap().as_str(), Some("claat"));
    }

    #[test]
    fn load_sources_reads_google_docs() {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join("learnings.json"),
            r#"{"googleDocs": ["doc-a", "doc-b"], "comment": "ignored"}"#,
        )
        .unwrap();
        let config = load_config(tmp.path()).unwrap();
        let sources = load_sources(&config).unwrap();
        assert_eq!(sources.google_docs, vec!["doc-a", "doc-b"]);
    }

    #[test]
    fn load_sources_missing_key_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("learnings.json"), "{}").unwrap();
        let config = load_config(tmp.path()).unwrap();
        assert!(load_sources(&config).unwrap().is_empty());
    }

    #[test]
    fn load_sources_missing_file_is_error() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(tmp.path()).unwrap();
        let result = load_sources(&config);
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn load_sources_malformed_json_is_error() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("learnings.json"), r#"{"googleDocs": "doc-a"}"#).unwrap();
        let config = load_config(tmp.path()).unwrap();
        let err = load_sources(&config).unwrap_err();
        assert!(matches!(err, ConfigError::Json { .. }));
        assert!(err.to_string().contains("learnings.json"));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let parsed: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(parsed.sources_file, defaults.sources_file);
        assert_eq!(parsed.output_dir, defaults.output_dir);
        assert_eq!(parsed.lessons_dir, defaults.lessons_dir);
        assert_eq!(parsed.converter.analytics_id, defaults.converter.analytics_id);
        assert_eq!(parsed.landing.expected_category, defaults.landing.expected_category);
    }
}
