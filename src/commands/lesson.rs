use clap::{Args, Subcommand, ValueEnum};

use lessonbook_core::DataService;

use super::confirm;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct LessonCommand {
    #[command(subcommand)]
    pub command: LessonSubcommand,
}

#[derive(Subcommand)]
pub enum LessonSubcommand {
    /// List the numbered lessons of the active class
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Show one lesson's grouped activities
    Show {
        /// Lesson number
        number: String,

        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Delete a lesson without renumbering the rest
    Delete {
        /// Lesson number
        number: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },

    /// Set a lesson's title
    SetTitle {
        /// Lesson number
        number: String,

        /// New title
        title: String,
    },
}

impl LessonCommand {
    pub async fn run(&self, service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            LessonSubcommand::List { format } => {
                if service.lesson_numbers().is_empty() {
                    println!("No lessons for class {}", service.class());
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(service.registry())?);
                    }
                    OutputFormat::Text => {
                        println!("{:<8}  {:<30}  {:>10}  {:>7}", "LESSON", "TITLE", "ACTIVITIES", "MINUTES");
                        println!("{}", "-".repeat(62));
                        for number in service.lesson_numbers().to_vec() {
                            let Some(lesson) = service.lesson(&number) else {
                                continue;
                            };
                            println!(
                                "{:<8}  {:<30}  {:>10}  {:>7}",
                                number,
                                lesson.display_title(),
                                lesson.activity_count(),
                                lesson.total_duration
                            );
                        }
                        println!("\nTotal: {} lesson(s)", service.lesson_numbers().len());
                    }
                }
                Ok(())
            }

            LessonSubcommand::Show { number, format } => {
                let Some(lesson) = service.lesson(number) else {
                    return Err(format!("Lesson not found: {}", number).into());
                };
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(lesson)?);
                    }
                    OutputFormat::Text => {
                        println!("Lesson {}: {}", number, lesson.display_title());
                        println!("Duration: {} min", lesson.total_duration);
                        if !lesson.tags.is_empty() {
                            println!("Tags: {}", lesson.tags.join("; "));
                        }
                        for category in &lesson.category_order {
                            println!("\n{}:", category);
                            for activity in lesson.grouped.get(category).into_iter().flatten() {
                                println!("  - {} ({} min)", activity.name, activity.duration_minutes);
                            }
                        }
                    }
                }
                Ok(())
            }

            LessonSubcommand::Delete { number, force } => {
                if service.lesson(number).is_none() {
                    return Err(format!("Lesson not found: {}", number).into());
                }
                let prompt = format!("Delete lesson {} from class {}?", number, service.class());
                if !confirm(&prompt, *force)? {
                    println!("Cancelled");
                    return Ok(());
                }
                service.delete_lesson(number).await?;
                println!("Deleted lesson {}", number);
                Ok(())
            }

            LessonSubcommand::SetTitle { number, title } => {
                if service.lesson(number).is_none() {
                    return Err(format!("Lesson not found: {}", number).into());
                }
                service.update_lesson_title(number, title).await?;
                println!("Lesson {} titled \"{}\"", number, title);
                Ok(())
            }
        }
    }
}
