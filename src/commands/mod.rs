mod config_cmd;
mod halfterm;
mod import;
mod lesson;
mod library;
mod plan;
mod tag;
mod unit;

pub use config_cmd::ConfigCommand;
pub use halfterm::HalfTermCommand;
pub use import::ImportCommand;
pub use lesson::LessonCommand;
pub use library::LibraryCommand;
pub use plan::PlanCommand;
pub use tag::TagCommand;
pub use unit::UnitCommand;

use std::io::{self, Write};

/// Asks for confirmation on stdin unless `force` is set.
pub(crate) fn confirm(prompt: &str, force: bool) -> io::Result<bool> {
    if force {
        return Ok(true);
    }
    print!("{} [y/N] ", prompt);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
