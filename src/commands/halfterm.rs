use clap::{Args, Subcommand, ValueEnum};

use lessonbook_core::DataService;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Args)]
pub struct HalfTermCommand {
    #[command(subcommand)]
    pub command: HalfTermSubcommand,
}

#[derive(Subcommand)]
pub enum HalfTermSubcommand {
    /// List the six half-terms of the active class
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Replace a half-term's lesson assignment
    Assign {
        /// Half-term id (A1, A2, SP1, SP2, SM1, SM2)
        id: String,

        /// Lesson numbers in teaching order
        lessons: Vec<String>,

        /// Mark the half-term complete
        #[arg(long)]
        complete: bool,
    },
}

impl HalfTermCommand {
    pub async fn run(&self, service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            HalfTermSubcommand::List { format } => {
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(service.half_terms())?);
                    }
                    OutputFormat::Text => {
                        println!("{:<5}  {:<10}  {:<8}  {:<9}  LESSONS", "ID", "NAME", "MONTHS", "COMPLETE");
                        println!("{}", "-".repeat(60));
                        for term in service.half_terms() {
                            println!(
                                "{:<5}  {:<10}  {:<8}  {:<9}  {}",
                                term.id,
                                term.name,
                                term.months,
                                if term.is_complete { "yes" } else { "no" },
                                term.lessons.join(", ")
                            );
                        }
                    }
                }
                Ok(())
            }

            HalfTermSubcommand::Assign {
                id,
                lessons,
                complete,
            } => {
                if !service.half_terms().iter().any(|t| t.id == *id) {
                    return Err(format!("Half-term not found: {}", id).into());
                }
                service
                    .update_half_term(id, lessons.clone(), *complete)
                    .await?;
                println!(
                    "Half-term {} now covers {} lesson(s)",
                    id,
                    service.lessons_for_half_term(id).len()
                );
                Ok(())
            }
        }
    }
}
