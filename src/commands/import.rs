use clap::Args;
use serde_json::Value;
use std::path::PathBuf;

use lessonbook_core::DataService;

#[derive(Args)]
pub struct ImportCommand {
    /// Path to a JSON table file: an array of rows, each an array of
    /// cells (strings or numbers). Row 0 is the header.
    pub file: PathBuf,
}

impl ImportCommand {
    pub async fn run(&self, service: &mut DataService) -> Result<(), Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(&self.file)?;
        let raw: Vec<Vec<Value>> = serde_json::from_str(&contents)?;
        let rows: Vec<Vec<String>> = raw.into_iter().map(|row| row.into_iter().map(cell_to_string).collect()).collect();

        let summary = service.import_table(&rows).await?;
        println!(
            "Imported {} activities across {} lessons ({} categories) into class {}",
            summary.activities,
            summary.lessons,
            summary.categories,
            service.class()
        );
        Ok(())
    }
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
