use clap::{Args, Subcommand, ValueEnum};

use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub command: ConfigSubcommand,
}

#[derive(Subcommand)]
pub enum ConfigSubcommand {
    /// Show current configuration values
    Show {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

impl ConfigCommand {
    pub fn run(&self, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            ConfigSubcommand::Show { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(config)?);
                    }
                    OutputFormat::Text => {
                        println!("Configuration");
                        println!("=============\n");
                        println!("config file: {}", Config::default_config_path().display());
                        println!("database_path: {}", config.database_path.display());
                        println!("class: {}", config.class);
                        match &config.remote.base_url {
                            Some(url) => {
                                println!("remote: {}", url);
                                println!(
                                    "api key: {}",
                                    if config.remote.api_key.is_some() {
                                        "set"
                                    } else {
                                        "not set"
                                    }
                                );
                            }
                            None => println!("remote: not configured"),
                        }
                    }
                }
                Ok(())
            }
        }
    }
}
