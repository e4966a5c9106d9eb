use chrono::{NaiveDate, NaiveTime, TimeZone, Utc};
use clap::{Args, Subcommand, ValueEnum};

use lessonbook_core::{DataService, LessonPlan, PlanStatus};

use super::confirm;
use crate::config::Config;

#[derive(Clone, ValueEnum, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Clone, ValueEnum)]
pub enum StatusArg {
    Planned,
    Completed,
    Cancelled,
    Draft,
}

impl From<&StatusArg> for PlanStatus {
    fn from(value: &StatusArg) -> Self {
        match value {
            StatusArg::Planned => PlanStatus::Planned,
            StatusArg::Completed => PlanStatus::Completed,
            StatusArg::Cancelled => PlanStatus::Cancelled,
            StatusArg::Draft => PlanStatus::Draft,
        }
    }
}

#[derive(Args)]
pub struct PlanCommand {
    #[command(subcommand)]
    pub command: PlanSubcommand,
}

#[derive(Subcommand)]
pub enum PlanSubcommand {
    /// Create or update a lesson plan
    Add {
        /// Plan date (YYYY-MM-DD)
        date: String,

        /// Week number
        #[arg(long, default_value_t = 1)]
        week: u32,

        /// Bind the plan to a lesson number
        #[arg(long)]
        number: Option<String>,

        /// Plan title
        #[arg(long)]
        title: Option<String>,

        /// Free-form notes
        #[arg(long)]
        notes: Option<String>,

        /// Plan status
        #[arg(long, value_enum, default_value = "planned")]
        status: StatusArg,

        /// Term label (e.g. A1)
        #[arg(long)]
        term: Option<String>,

        /// Library activity to include, by name (can be repeated)
        #[arg(long = "activity", value_name = "NAME")]
        activities: Vec<String>,

        /// Update an existing plan instead of creating one
        #[arg(long)]
        id: Option<String>,
    },

    /// List lesson plans
    List {
        /// Output format
        #[arg(long, short, value_enum, default_value = "text")]
        format: OutputFormat,

        /// Show every class, not just the active one
        #[arg(long)]
        all: bool,
    },

    /// Delete a plan; a numbered plan renumbers the survivors
    Delete {
        /// Plan id
        id: String,

        /// Skip confirmation prompt
        #[arg(long, short)]
        force: bool,
    },
}

impl PlanCommand {
    pub async fn run(
        &self,
        service: &mut DataService,
        config: &Config,
    ) -> Result<(), Box<dyn std::error::Error>> {
        match &self.command {
            PlanSubcommand::Add {
                date,
                week,
                number,
                title,
                notes,
                status,
                term,
                activities,
                id,
            } => {
                let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                    .map_err(|e| format!("Invalid date '{}': {}", date, e))?;
                let date = Utc.from_utc_datetime(&date.and_time(NaiveTime::MIN));

                let mut picked = Vec::new();
                for name in activities {
                    let found = service
                        .library()
                        .iter()
                        .find(|a| a.name.eq_ignore_ascii_case(name))
                        .cloned()
                        .ok_or_else(|| format!("Activity not in library: {}", name))?;
                    picked.push(found);
                }

                let mut plan = LessonPlan::new(&config.class, date)
                    .with_week(*week)
                    .with_status(status.into())
                    .with_activities(picked);
                if let Some(id) = id {
                    plan.id = id.clone();
                }
                if let Some(number) = number {
                    plan = plan.with_lesson_number(number);
                }
                if let Some(title) = title {
                    plan = plan.with_title(title);
                }
                if let Some(notes) = notes {
                    plan = plan.with_notes(notes);
                }
                if let Some(term) = term {
                    plan = plan.with_term(term);
                }

                let plan_id = plan.id.clone();
                service.add_or_update_plan(plan).await?;
                println!("Saved plan {}", plan_id);
                Ok(())
            }

            PlanSubcommand::List { format, all } => {
                let plans: Vec<&LessonPlan> = if *all {
                    service.plans().iter().collect()
                } else {
                    service.class_plans().collect()
                };
                if plans.is_empty() {
                    println!("No plans found");
                    return Ok(());
                }
                match format {
                    OutputFormat::Json => {
                        println!("{}", serde_json::to_string_pretty(&plans)?);
                    }
                    OutputFormat::Text => {
                        println!(
                            "{:<36}  {:<10}  {:<6}  {:<8}  {:<10}  TITLE",
                            "ID", "DATE", "CLASS", "LESSON", "STATUS"
                        );
                        println!("{}", "-".repeat(96));
                        for plan in &plans {
                            println!(
                                "{:<36}  {:<10}  {:<6}  {:<8}  {:<10}  {}",
                                plan.id,
                                plan.date.format("%Y-%m-%d"),
                                plan.class_name,
                                plan.lesson_number.as_deref().unwrap_or("-"),
                                plan.status.to_string(),
                                plan.title.as_deref().unwrap_or(""),
                            );
                        }
                        println!("\nTotal: {} plan(s)", plans.len());
                    }
                }
                Ok(())
            }

            PlanSubcommand::Delete { id, force } => {
                let Some(plan) = service.plans().iter().find(|p| p.id == *id) else {
                    return Err(format!("Plan not found: {}", id).into());
                };
                let prompt = match &plan.lesson_number {
                    Some(number) => format!(
                        "Delete plan {} (lesson {})? Later lessons renumber.",
                        id, number
                    ),
                    None => format!("Delete plan {}?", id),
                };
                if !confirm(&prompt, *force)? {
                    println!("Cancelled");
                    return Ok(());
                }
                service.delete_plan(id).await?;
                println!("Deleted plan {}", id);
                Ok(())
            }
        }
    }
}
