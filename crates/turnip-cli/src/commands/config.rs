//! `turnip config`: read and edit `~/.turnip/config.toml`

use std::collections::BTreeMap;

use clap::{Args, Subcommand};

use crate::config::{config_file_path, Config};
use crate::output::{self, OutputFormat};

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print one setting
    Get {
        /// Setting name, e.g. resolver.fuzzy_threshold
        key: String,
    },
    /// Change one setting and save
    Set { key: String, value: String },
    /// Restore one setting to its default and save
    Reset { key: String },
    /// Print every setting
    List,
    /// Print where the config file lives
    Path,
    /// Write a config file with default settings
    Init {
        /// Replace an existing file
        #[arg(long)]
        force: bool,
    },
}

pub async fn run(args: &ConfigArgs, format: OutputFormat) -> anyhow::Result<()> {
    match &args.command {
        ConfigCommands::Get { key } => {
            let config = Config::load();
            let value = config.get(key).ok_or_else(|| unknown_key(key))?;
            println!("{}", value);
        }
        ConfigCommands::Set { key, value } => {
            let mut config = Config::load();
            config.set(key, value)?;
            config.save()?;
            tracing::info!("Updated {} in {}", key, config_file_path().display());
            println!("{} = {}", key, config.get(key).unwrap_or_default());
        }
        ConfigCommands::Reset { key } => {
            let mut config = Config::load();
            let value = config.reset(key)?;
            config.save()?;
            println!("{} = {} (default)", key, value);
        }
        ConfigCommands::List => list(&Config::load(), format),
        ConfigCommands::Path => println!("{}", config_file_path().display()),
        ConfigCommands::Init { force } => {
            let path = config_file_path();
            if path.exists() && !force {
                anyhow::bail!(
                    "{} already exists; pass --force to replace it",
                    path.display()
                );
            }
            let config = Config::default();
            config.save()?;
            println!(
                "Wrote default config to {} (storage {}, graph '{}')",
                path.display(),
                config.storage,
                config.default_graph
            );
        }
    }
    Ok(())
}

fn list(config: &Config, format: OutputFormat) {
    let settings: BTreeMap<&str, String> = Config::keys()
        .iter()
        .filter_map(|key| config.get(key).map(|value| (*key, value)))
        .collect();

    match format {
        OutputFormat::Json => println!("{}", output::to_json(&settings)),
        OutputFormat::Table => {
            println!("# {}", config_file_path().display());
            let rows: Vec<Vec<String>> = settings
                .into_iter()
                .map(|(key, value)| vec![key.to_string(), value])
                .collect();
            println!("{}", output::table(&["SETTING", "VALUE"], &rows));
        }
    }
}

fn unknown_key(key: &str) -> anyhow::Error {
    anyhow::anyhow!(
        "No such setting '{}'; turnip knows: {}",
        key,
        Config::keys().join(", ")
    )
}
