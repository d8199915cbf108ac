//! Configuration command handlers
//!
//! Handles the `configure` subcommand for setting nw-miner defaults.

use crate::config::Config;
use anyhow::Result;
use std::path::PathBuf;

/// Values to store; `None` leaves the current setting alone
#[derive(Debug, Default)]
pub struct Updates {
    pub jobs: Option<usize>,
    pub oodle_exec: Option<String>,
    pub oodle_dll: Option<PathBuf>,
}

impl Updates {
    pub fn is_empty(&self) -> bool {
        self.jobs.is_none() && self.oodle_exec.is_none() && self.oodle_dll.is_none()
    }

    /// Apply to `config`; returns whether anything changed
    pub fn apply(self, config: &mut Config) -> bool {
        let before = config.clone();
        if let Some(jobs) = self.jobs {
            config.jobs = Some(jobs);
        }
        if let Some(exec) = self.oodle_exec {
            config.oodle.exec = Some(exec);
        }
        if let Some(dll) = self.oodle_dll {
            config.oodle.dll = Some(dll);
        }
        *config != before
    }
}

/// Handle the configure command
pub fn handle(show: bool, updates: Updates) -> Result<()> {
    let mut config = Config::load()?;

    if show {
        show_config(&config);
        return Ok(());
    }

    if updates.is_empty() {
        show_usage();
        return Ok(());
    }

    if updates.apply(&mut config) {
        let path = config.save()?;
        println!("Config saved to: {}", path.display());
    } else {
        println!("Configuration unchanged");
    }

    Ok(())
}

/// Display current configuration
fn show_config(config: &Config) {
    match config.jobs {
        Some(jobs) => println!("Jobs: {}", jobs),
        None => println!("Jobs: all cores"),
    }
    println!("Output: {}", config.output_dir(None).display());
    println!("Bulk extensions: {}", config.bulk_extensions.join(", "));
    println!("Keep datasheets: {}", config.keep_datasheets);
    match (&config.oodle.exec, &config.oodle.dll) {
        (Some(exec), _) => println!("Oodle: exec `{}`", exec),
        (None, Some(dll)) => println!("Oodle: native {}", dll.display()),
        (None, None) => println!("Oodle: built-in (oozextract)"),
    }

    if let Ok(path) = Config::config_path() {
        println!("Config file: {}", path.display());
    }
}

/// Show usage help for the configure command
fn show_usage() {
    println!("Usage: nw-miner configure [--jobs N] [--oodle-exec CMD] [--oodle-dll PATH]");
    println!("   or: nw-miner configure --show");
    println!();
    println!("Note: without an Oodle setting, entries are decompressed with the");
    println!("      built-in decoder. Use --oodle-exec to run a helper instead.");
}
