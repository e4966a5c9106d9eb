use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use commands::{
    ConfigCommand, HalfTermCommand, ImportCommand, LessonCommand, LibraryCommand, PlanCommand,
    TagCommand, UnitCommand,
};
use config::Config;
use lessonbook_core::{DataService, LocalCache};

#[derive(Parser)]
#[command(name = "lessonbook")]
#[command(version)]
#[command(about = "Lesson planning data manager", long_about = None)]
struct Cli {
    /// Path to config file
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Override the active class
    #[arg(long, global = true)]
    class: Option<String>,

    /// Treat the class's stored data as cleared: start from empty
    /// state without reading either store
    #[arg(long, global = true)]
    cleared: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Import a lesson table (JSON rows)
    Import(ImportCommand),

    /// Inspect and edit numbered lessons
    Lesson(LessonCommand),

    /// Manage user-created lesson plans
    Plan(PlanCommand),

    /// Manage teaching units
    Unit(UnitCommand),

    /// Manage half-term assignments
    Halfterm(HalfTermCommand),

    /// Manage curriculum tags
    Tag(TagCommand),

    /// Manage the global activity library
    Library(LibraryCommand),

    /// Manage configuration
    Config(ConfigCommand),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "lessonbook=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config)?;
    if let Some(class) = cli.class {
        config.class = class;
    }

    let Some(command) = cli.command else {
        println!("Use --help to see available commands");
        return Ok(());
    };

    if let Commands::Config(cmd) = &command {
        return cmd.run(&config);
    }

    let cache = LocalCache::open(&config.database_path).await?;
    let mut service = DataService::open(cache, &config.remote, &config.class, cli.cleared).await?;

    match command {
        Commands::Import(cmd) => cmd.run(&mut service).await,
        Commands::Lesson(cmd) => cmd.run(&mut service).await,
        Commands::Plan(cmd) => cmd.run(&mut service, &config).await,
        Commands::Unit(cmd) => cmd.run(&mut service).await,
        Commands::Halfterm(cmd) => cmd.run(&mut service).await,
        Commands::Tag(cmd) => cmd.run(&mut service).await,
        Commands::Library(cmd) => cmd.run(&mut service).await,
        Commands::Config(_) => unreachable!(),
    }
}
