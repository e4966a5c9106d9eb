use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The master tag catalogue in both shapes the stores use: the flat
/// statement list and the structured area -> detail map.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TagStatements {
    pub all_statements: Vec<String>,
    pub structured_statements: BTreeMap<String, Vec<String>>,
}

impl TagStatements {
    pub fn from_flat(statements: &[String]) -> Self {
        Self {
            all_statements: statements.to_vec(),
            structured_statements: structure_statements(statements),
        }
    }
}

/// Splits "Area: detail" statements into an area -> detail map.
/// A statement with no ":" keeps its full text as the detail.
pub fn structure_statements(statements: &[String]) -> BTreeMap<String, Vec<String>> {
    let mut structured: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for statement in statements {
        let (area, detail) = match statement.split_once(':') {
            Some((area, detail)) => (area.trim(), detail.trim()),
            None => (statement.trim(), statement.trim()),
        };
        structured
            .entry(area.to_string())
            .or_default()
            .push(detail.to_string());
    }
    structured
}

/// Rebuilds the flat "Area: detail" list from the structured map.
pub fn flatten_structured(structured: &BTreeMap<String, Vec<String>>) -> Vec<String> {
    let mut flat = Vec::new();
    for (area, details) in structured {
        for detail in details {
            flat.push(format!("{}: {}", area, detail));
        }
    }
    flat
}

/// Built-in catalogue used until a class defines its own.
pub fn default_catalogue() -> Vec<String> {
    [
        "Listening and Attention: Responds to changes in tempo and dynamics",
        "Listening and Attention: Identifies familiar songs from a short phrase",
        "Singing: Joins in with repeated refrains",
        "Singing: Matches pitch over a small range",
        "Rhythm and Pulse: Keeps a steady beat with body percussion",
        "Rhythm and Pulse: Copies simple rhythm patterns",
        "Movement: Moves in time with the music",
        "Movement: Uses props to respond to musical cues",
        "Ensemble: Starts and stops together with the group",
        "Ensemble: Takes turns within a group activity",
        "Expression: Explores loud and quiet sounds",
        "Expression: Chooses instruments to represent ideas",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}
