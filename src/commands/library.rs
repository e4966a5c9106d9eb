use clap::{Args, Subcommand, ValueEnum};

use lessonbook_core::{Activity, DataService};

use super::confirm;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct LibraryCommand {
    #[command(subcommand)]
    pub command: LibrarySubcommand,
}

#[derive(Subcommand)]
pub enum LibrarySubcommand {
    /// List the global activity library
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Filter by category
        #[arg(long)]
        category: Option<String>,
    },

    /// Add an activity to the library
    Add {
        /// Activity name
        name: String,

        /// Category
        #[arg(long)]
        category: String,

        /// Lesson number the activity belongs to
        #[arg(long, default_value = "1")]
        number: String,

        /// Duration in minutes
        #[arg(long, default_value_t = 0)]
        duration: u32,

        /// Description
        #[arg(long)]
        description: Option<String>,

        /// Level
        #[arg(long)]
        level: Option<String>,
    },

    /// Delete an activity from the library
    Delete {
        /// Activity id
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl LibraryCommand {
    pub async fn run(&self, service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            LibrarySubcommand::List { format, category } => {
                let activities: Vec<&Activity> = service
                    .library()
                    .iter()
                    .filter(|a| {
                        category
                            .as_ref()
                            .map(|c| a.category.eq_ignore_ascii_case(c))
                            .unwrap_or(true)
                    })
                    .collect();
                if activities.is_empty() {
                    println!("No activities found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&activities)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<26}  {:<20}  {:<6}  {:>7}",
                            "ID", "NAME", "CATEGORY", "LESSON", "MINUTES"
                        );
                        println!("{}", "-".repeat(104));
                        for activity in &activities {
                            println!(
                                "{:<36}  {:<26}  {:<20}  {:<6}  {:>7}",
                                activity.id,
                                activity.name,
                                activity.category,
                                activity.lesson_number,
                                activity.duration_minutes
                            );
                        }
                        println!("\nTotal: {} activit(ies)", activities.len());
                    }
                }
                Ok(())
            }

            LibrarySubcommand::Add {
                name,
                category,
                number,
                duration,
                description,
                level,
            } => {
                if name.trim().is_empty() {
                    return Err("Activity name cannot be empty".into());
                }
                let mut activity =
                    Activity::new(name.trim(), category, number).with_duration(*duration);
                if let Some(description) = description {
                    activity = activity.with_description(description);
                }
                if let Some(level) = level {
                    activity = activity.with_level(level);
                }
                let created = service.add_activity(activity).await?;
                println!("Added activity {} ({})", created.name, created.id);
                Ok(())
            }

            LibrarySubcommand::Delete { id, force } => {
                if !service.library().iter().any(|a| a.id == *id) {
                    return Err(format!("Activity not found: {}", id).into());
                }
                if !confirm(&format!("Delete activity {}?", id), *force)? {
                    println!("Cancelled");
                    return Ok(());
                }
                service.delete_activity(id).await?;
                println!("Deleted activity {}", id);
                Ok(())
            }
        }
    }
}
