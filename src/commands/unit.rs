use clap::{Args, Subcommand, ValueEnum};

use lessonbook_core::{DataService, Unit};

use super::confirm;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct UnitCommand {
    #[command(subcommand)]
    pub command: UnitSubcommand,
}

#[derive(Subcommand)]
pub enum UnitSubcommand {
    /// List the units of the active class
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Create or update a unit
    Set {
        /// Unit name
        name: String,

        /// Display color (hex)
        #[arg(long, default_value = "#6b7280")]
        color: String,

        /// Lesson number to include (can be repeated)
        #[arg(long = "lesson", value_name = "NUMBER")]
        lessons: Vec<String>,

        /// Term label (e.g. A1)
        #[arg(long)]
        term: Option<String>,

        /// Unit description
        #[arg(long)]
        description: Option<String>,

        /// Update an existing unit instead of creating one
        #[arg(long)]
        id: Option<String>,
    },

    /// Delete a unit
    Delete {
        /// Unit id
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl UnitCommand {
    pub async fn run(&self, service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            UnitSubcommand::List { format } => {
                if service.units().is_empty() {
                    println!("No units for class {}", service.class());
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(service.units())?);
                    }
                    OutputFormat::Text => {
                        println!("{:<36}  {:<24}  {:<8}  LESSONS", "ID", "NAME", "TERM");
                        println!("{}", "-".repeat(84));
                        for unit in service.units() {
                            println!(
                                "{:<36}  {:<24}  {:<8}  {}",
                                unit.id,
                                unit.name,
                                unit.term.as_deref().unwrap_or("-"),
                                unit.lesson_numbers.join(", ")
                            );
                        }
                    }
                }
                Ok(())
            }

            UnitSubcommand::Set {
                name,
                color,
                lessons,
                term,
                description,
                id,
            } => {
                let mut unit = Unit::new(name, color).with_lesson_numbers(lessons.clone());
                if let Some(id) = id {
                    unit.id = id.clone();
                }
                if let Some(term) = term {
                    unit = unit.with_term(term);
                }
                if let Some(description) = description {
                    unit.description = description.clone();
                }
                let unit_id = unit.id.clone();
                service.update_unit(unit).await?;
                println!("Saved unit {}", unit_id);
                Ok(())
            }

            UnitSubcommand::Delete { id, force } => {
                if !service.units().iter().any(|u| u.id == *id) {
                    return Err(format!("Unit not found: {}", id).into());
                }
                if !confirm(&format!("Delete unit {}?", id), *force)? {
                    println!("Cancelled");
                    return Ok(());
                }
                service.delete_unit(id).await?;
                println!("Deleted unit {}", id);
                Ok(())
            }
        }
    }
}
