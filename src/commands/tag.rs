use clap::{Args, Subcommand, ValueEnum};
use std::path::PathBuf;

use lessonbook_core::DataService;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct TagCommand {
    #[command(subcommand)]
    pub command: TagSubcommand,
}

#[derive(Subcommand)]
pub enum TagSubcommand {
    /// Show the master tag catalogue, or one lesson's tags
    List {
        /// Lesson number; omit for the catalogue
        number: Option<String>,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Attach a catalogue tag to a lesson
    Add {
        /// Lesson number
        number: String,

        /// Tag statement ("Area: detail")
        tag: String,
    },

    /// Detach a tag from a lesson
    Remove {
        /// Lesson number
        number: String,

        /// Tag statement
        tag: String,
    },

    /// Replace the master catalogue from a file (one statement per line)
    SetCatalogue {
        /// Path to the statements file
        file: PathBuf,
    },
}

impl TagCommand {
    pub async fn run(&self, service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            TagSubcommand::List { number, format } => {
                let tags: Vec<String> = match number {
                    Some(number) => service
                        .registry()
                        .tag_map
                        .get(number)
                        .cloned()
                        .unwrap_or_default(),
                    None => service.tag_catalogue().to_vec(),
                };
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&tags)?);
                    }
                    OutputFormat::Text => {
                        if tags.is_empty() {
                            println!("No tags");
                        }
                        for tag in tags {
                            println!("{}", tag);
                        }
                    }
                }
                Ok(())
            }

            TagSubcommand::Add { number, tag } => {
                if service.lesson(number).is_none() {
                    return Err(format!("Lesson not found: {}", number).into());
                }
                service.add_tag_to_lesson(number, tag).await?;
                println!("Tagged lesson {}", number);
                Ok(())
            }

            TagSubcommand::Remove { number, tag } => {
                service.remove_tag_from_lesson(number, tag).await?;
                println!("Untagged lesson {}", number);
                Ok(())
            }

            TagSubcommand::SetCatalogue { file } => {
                let contents = std::fs::read_to_string(file)?;
                let statements: Vec<String> = contents
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect();
                let count = statements.len();
                service.set_tag_catalogue(statements).await?;
                println!("Catalogue now holds {} statement(s)", count);
                Ok(())
            }
        }
    }
}
