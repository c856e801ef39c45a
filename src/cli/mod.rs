//! CLI module for Classy

mod args;

pub use args::{Args, Command};

use crate::catalog::Catalog;
use crate::config::{CliOverrides, Config};
use crate::error::{Error, Result};
use crate::importer::Importer;
use crate::logging;
use crate::output::SiteGenerator;
use crate::server;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::debug;

/// Config file picked up from the working directory when `--config` is absent
pub const DEFAULT_CONFIG: &str = "classy.toml";

/// Run the CLI application
pub fn run() -> ExitCode {
    let args = Args::parse_args();

    match execute(args) {
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn execute(args: Args) -> Result<()> {
    match args.command {
        Command::Import {
            source_root,
            project,
            release,
            catalog,
            exclude,
            config,
            verbose,
        } => {
            let cfg = prepare(
                config.as_deref(),
                CliOverrides {
                    catalog,
                    exclude,
                    ..Default::default()
                },
                verbose,
            )?;
            let project = project.unwrap_or_else(|| cfg.project.name.clone());

            if !source_root.exists() {
                return Err(Error::PathNotFound(source_root));
            }

            println!("Importing {} {} from {}", project, release, source_root.display());
            let importer = Importer::new(cfg.clone())?.with_verbose(verbose);
            let result = importer.process(&source_root)?;
            println!("Parsed {} files", result.files_parsed);

            if !result.parse_errors.is_empty() {
                println!("\nParse errors ({}):", result.parse_errors.len());
                for (path, err) in result.parse_errors.iter().take(5) {
                    println!("  {}: {}", path.display(), err);
                }
                if result.parse_errors.len() > 5 {
                    println!("  ... and {} more", result.parse_errors.len() - 5);
                }
            }

            let mut catalog = Catalog::load_or_new(&cfg.catalog.path)?;
            let summary = catalog.import_project_version(result.members, &project, &release)?;
            catalog.save(&cfg.catalog.path)?;

            println!("{}", summary.summary());
            println!("Catalog written to: {}", cfg.catalog.path.display());
            Ok(())
        }

        Command::Build {
            catalog,
            output,
            no_diagrams,
            config,
            verbose,
        } => {
            let cfg = prepare(
                config.as_deref(),
                CliOverrides {
                    catalog,
                    output,
                    no_diagrams,
                    ..Default::default()
                },
                verbose,
            )?;

            let catalog = Catalog::load(&cfg.catalog.path)?;
            println!("Generating site...");
            let report = SiteGenerator::new(&catalog, &cfg)?.generate()?;

            println!("{}", report.summary());
            println!("Site written to: {}", cfg.output.directory.display());
            Ok(())
        }

        Command::Serve {
            catalog,
            host,
            port,
            config,
            verbose,
        } => {
            let cfg = prepare(
                config.as_deref(),
                CliOverrides {
                    catalog,
                    host,
                    port,
                    ..Default::default()
                },
                verbose,
            )?;

            let catalog = Catalog::load(&cfg.catalog.path)?;
            println!(
                "Serving {} on http://{}:{}",
                cfg.catalog.path.display(),
                cfg.server.host,
                cfg.server.port
            );
            println!("Press Ctrl+C to stop");

            let runtime = tokio::runtime::Runtime::new()?;
            runtime.block_on(server::serve(cfg, catalog))
        }

        Command::Version => {
            println!("classy {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

/// Load config, apply command line overrides and start logging
fn prepare(config_path: Option<&Path>, overrides: CliOverrides, verbose: bool) -> Result<Config> {
    let mut cfg = load_config(config_path)?;
    cfg.merge_cli(overrides);
    cfg.validate()?;

    logging::init(&cfg.logging, verbose)?;
    debug!(?cfg, "configuration loaded");
    Ok(cfg)
}

/// An explicit config path must exist; the default one is optional
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) if !path.exists() => Err(Error::PathNotFound(path.to_path_buf())),
        Some(path) => Config::load(path),
        None => {
            let default_path = PathBuf::from(DEFAULT_CONFIG);
            if default_path.exists() {
                Config::load(&default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}
