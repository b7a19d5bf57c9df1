use clap::{Parser, Subcommand};
use codelab_site::export::ClaatConverter;
use codelab_site::pipeline::{self, BuildError};
use codelab_site::{config, output};
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "codelab-site")]
#[command(version, about = "Build the codelab landing site")]
#[command(long_about = "\
Build the codelab landing site

Exports every document listed in learnings.json with claat, indexes the
resulting lessons by tag, renders templates/index.html into build/ and copies
statics/ alongside it.

Project layout:

  learnings.json        {\"googleDocs\": [\"<doc-id>\", ...]}
  site.toml             Optional overrides ('codelab-site gen-config')
  templates/*.html      Landing templates; index.html is rendered
  statics/              Copied verbatim into build/
  build/                Output, deleted and recreated on every build

Running without a command is the same as 'codelab-site build'.")]
struct Cli {
    /// Project root containing learnings.json, templates/ and statics/
    #[arg(long, default_value = ".", global = true)]
    root: PathBuf,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, PartialEq, Eq)]
enum Command {
    /// Run the full pipeline: export → index → render → copy statics
    Build,
    /// Reset the output directory and export every lesson
    Export,
    /// Print the tag index of the lessons already in the output directory
    Index,
    /// Render the landing page and copy statics from already exported lessons
    Render,
    /// Validate config, sources and templates without writing anything
    Check,
    /// Print a stock site.toml with all options documented
    GenConfig,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    codelab_site::init_tracing(cli.verbose);

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), BuildError> {
    let load = || config::load_config(&cli.root);

    match cli.command.unwrap_or(Command::Build) {
        Command::Build => {
            let config = load()?;
            let converter = ClaatConverter::from_config(&config.converter);
            println!("==> Exporting lessons with {}", converter.program());
            let report = pipeline::build(&config, &converter, |event| {
                output::print_export_event(&event)
            })?;
            println!("==> Lessons");
            output::print_catalog(&report.catalog);
            output::print_warnings(&report.warnings);
            println!("==> Build complete: {}", config.output_path().display());
            output::print_build_report(&report, &config.root);
        }
        Command::Export => {
            let config = load()?;
            let converter = ClaatConverter::from_config(&config.converter);
            println!("==> Exporting lessons with {}", converter.program());
            let report = pipeline::run_export(&config, &converter, |event| {
                output::print_export_event(&event)
            })?;
            println!(
                "==> Exported {} documents → {}",
                report.documents.len(),
                report.output_dir.display()
            );
        }
        Command::Index => {
            let config = load()?;
            let (catalog, warnings) = pipeline::run_aggregate(&config)?;
            output::print_catalog(&catalog);
            output::print_warnings(&warnings);
        }
        Command::Render => {
            let config = load()?;
            let (catalog, warnings) = pipeline::run_aggregate(&config)?;
            output::print_warnings(&warnings);
            let landing = pipeline::run_render(&config, &catalog)?;
            println!("==> Rendered {}", landing.display());
            let statics = pipeline::run_copy(&config)?;
            println!("==> Copied {} static files", statics.files);
        }
        Command::Check => {
            let config = load()?;
            println!("==> Checking {}", config.root.display());
            let (sources, templates) = pipeline::check(&config)?;
            output::print_check(sources.google_docs.len(), &templates);
            println!("==> Project is valid");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}
