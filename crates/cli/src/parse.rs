//! ArgMatches → Action conversion.
//!
//! Turns clap's parsed arguments into a typed [`Action`], parsing vectors,
//! payloads and filters on the way so bad input fails before any client is
//! opened.

use clap::ArgMatches;
use dataclients_core::record::payload_from_json;
use dataclients_core::{Filter, Payload};

/// Vector or text input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    /// Explicit embedding
    Vector(Vec<f32>),
    /// Text for the configured embedder
    Text(String),
}

/// One CLI invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Upsert {
        collection: String,
        id: String,
        input: Input,
        payload: Payload,
    },
    Search {
        collection: String,
        input: Input,
        n_results: usize,
        filter: Option<Filter>,
        with_vectors: bool,
    },
    Get {
        collection: String,
        ids: Vec<String>,
    },
    Delete {
        collection: String,
        ids: Vec<String>,
    },
    Count {
        collection: String,
    },
    Prune {
        collection: String,
        default_days: Option<i64>,
    },
}

impl Action {
    /// Collection the action targets.
    pub fn collection(&self) -> &str {
        match self {
            Action::Upsert { collection, .. }
            | Action::Search { collection, .. }
            | Action::Get { collection, .. }
            | Action::Delete { collection, .. }
            | Action::Count { collection }
            | Action::Prune { collection, .. } => collection,
        }
    }
}

/// Convert clap ArgMatches into an Action.
pub fn matches_to_action(matches: &ArgMatches) -> Result<Action, String> {
    let (sub_name, m) = matches
        .subcommand()
        .ok_or_else(|| "No command provided".to_string())?;
    let collection = required(m, "collection")?;

    match sub_name {
        "upsert" => Ok(Action::Upsert {
            collection,
            id: required(m, "id")?,
            input: parse_input(m)?,
            payload: m
                .get_one::<String>("payload")
                .map(|s| parse_payload(s))
                .transpose()?
                .unwrap_or_default(),
        }),
        "search" => Ok(Action::Search {
            collection,
            input: parse_input(m)?,
            n_results: required(m, "n")?
                .parse::<usize>()
                .map_err(|e| format!("Invalid n-results: {}", e))?,
            filter: m
                .get_one::<String>("filter")
                .map(|s| parse_filter(s))
                .transpose()?,
            with_vectors: m.get_flag("with-vectors"),
        }),
        "get" => Ok(Action::Get {
            collection,
            ids: ids(m),
        }),
        "delete" => Ok(Action::Delete {
            collection,
            ids: ids(m),
        }),
        "count" => Ok(Action::Count { collection }),
        "prune" => Ok(Action::Prune {
            collection,
            default_days: m
                .get_one::<String>("default-days")
                .map(|s| s.parse::<i64>())
                .transpose()
                .map_err(|e| format!("Invalid default-days: {}", e))?,
        }),
        other => Err(format!("Unknown command: {}", other)),
    }
}

// =========================================================================
// Argument helpers
// =========================================================================

fn required(m: &ArgMatches, name: &str) -> Result<String, String> {
    m.get_one::<String>(name)
        .cloned()
        .ok_or_else(|| format!("Missing argument: {}", name))
}

fn ids(m: &ArgMatches) -> Vec<String> {
    m.get_many::<String>("ids")
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn parse_input(m: &ArgMatches) -> Result<Input, String> {
    if let Some(csv) = m.get_one::<String>("vector") {
        return parse_vector(csv).map(Input::Vector);
    }
    m.get_one::<String>("text")
        .map(|t| Input::Text(t.clone()))
        .ok_or_else(|| "Either --vector or --text is required".to_string())
}

// =========================================================================
// Value parsing
// =========================================================================

/// Parse comma-separated floats, tolerating surrounding brackets.
pub fn parse_vector(s: &str) -> Result<Vec<f32>, String> {
    let inner = s.trim().trim_start_matches('[').trim_end_matches(']');
    if inner.trim().is_empty() {
        return Err("Vector is empty".to_string());
    }
    inner
        .split(',')
        .map(|part| {
            part.trim()
                .parse::<f32>()
                .map_err(|e| format!("Invalid vector component '{}': {}", part.trim(), e))
        })
        .collect()
}

/// Parse a JSON object of scalars into a payload.
pub fn parse_payload(s: &str) -> Result<Payload, String> {
    let value: serde_json::Value =
        serde_json::from_str(s).map_err(|e| format!("Invalid payload JSON: {}", e))?;
    let object = value
        .as_object()
        .ok_or_else(|| "Payload must be a JSON object".to_string())?;
    if let Some((key, _)) = object
        .iter()
        .find(|(_, v)| v.is_null() || v.is_array() || v.is_object())
    {
        return Err(format!("Payload value for '{}' must be a scalar", key));
    }
    Ok(payload_from_json(object, &[]))
}

/// Parse the JSON filter form.
pub fn parse_filter(s: &str) -> Result<Filter, String> {
    let value: serde_json::Value =
        serde_json::from_str(s).map_err(|e| format!("Invalid filter JSON: {}", e))?;
    Filter::from_json(&value).map_err(|e| e.to_string())
}
