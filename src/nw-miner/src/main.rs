//! nw-miner - New World pak miner
//!
//! Extracts datasheets (converted to `;`-separated text), and the models,
//! materials and textures referenced by a list of asset records.

mod batch;
mod cli;
mod commands;
mod config;
mod paks;
mod records;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands};
use commands::Session;
use config::Config;

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "nw_miner=debug,nw_pak=debug"
    } else {
        "nw_miner=info,nw_pak=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = Config::load()?;
    let session = || Session::new(&config, cli.jobs, cli.oodle_exec.clone(), cli.oodle_dll.clone());

    match &cli.command {
        Commands::Run {
            paks,
            output,
            records,
            keep_datasheets,
        } => {
            let output = config.output_dir(output.clone());
            commands::run::run(
                &session()?,
                paks,
                &output,
                records.as_deref(),
                *keep_datasheets || config.keep_datasheets,
            )?;
        }

        Commands::Datasheets {
            paks,
            output,
            keep_datasheets,
        } => {
            let output = config.output_dir(output.clone());
            commands::datasheets::run(
                &session()?,
                paks,
                &output,
                *keep_datasheets || config.keep_datasheets,
            )?;
        }

        Commands::Convert {
            dir,
            keep_datasheets,
        } => {
            commands::datasheets::run_convert(
                &session()?,
                dir,
                *keep_datasheets || config.keep_datasheets,
            )?;
        }

        Commands::Index { paks, output } => {
            commands::index::run(paks, &config.output_dir(output.clone()))?;
        }

        Commands::Assets {
            paks,
            records,
            output,
        } => {
            let output = config.output_dir(output.clone());
            commands::assets::run(&session()?, paks, records, &output)?;
        }

        Commands::List { pak } => {
            commands::list::run(pak)?;
        }

        Commands::Configure { show } => {
            commands::configure::handle(
                *show,
                commands::configure::Updates {
                    jobs: cli.jobs,
                    oodle_exec: cli.oodle_exec.clone(),
                    oodle_dll: cli.oodle_dll.clone(),
                },
            )?;
        }
    }

    Ok(())
}
