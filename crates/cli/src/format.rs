//! Output formatting.

use dataclients::{Error, SearchResult, VectorRecord};
use dataclients_core::record::payload_to_json;
use serde_json::{json, Value};

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

/// Result of an executed action.
#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    /// Write or delete succeeded
    Ok,
    Count(usize),
    Hits(Vec<SearchResult>),
    /// Positional fetch results with the requested ids
    Records(Vec<(String, Option<VectorRecord>)>),
    Pruned(usize),
}

fn hit_json(hit: &SearchResult) -> Value {
    let mut v = json!({
        "id": hit.id,
        "score": hit.score,
        "payload": payload_to_json(&hit.payload),
    });
    if let Some(text) = &hit.text {
        v["text"] = json!(text);
    }
    if let Some(vector) = &hit.vector {
        v["vector"] = json!(vector);
    }
    v
}

fn record_json(record: &VectorRecord) -> Value {
    let mut v = json!({
        "id": record.id,
        "vector": record.vector,
        "payload": payload_to_json(&record.payload),
    });
    if let Some(text) = &record.text {
        v["text"] = json!(text);
    }
    v
}

fn short_vector(vector: &[f32]) -> String {
    let head: Vec<String> = vector.iter().take(4).map(|x| format!("{:.4}", x)).collect();
    if vector.len() > 4 {
        format!("[{}, ... ({} dims)]", head.join(", "), vector.len())
    } else {
        format!("[{}]", head.join(", "))
    }
}

/// Render an output.
pub fn format_output(output: &Output, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => format_json(output).to_string(),
        OutputMode::Human => format_human(output),
    }
}

fn format_json(output: &Output) -> Value {
    match output {
        Output::Ok => json!({"ok": true}),
        Output::Count(n) => json!({"count": n}),
        Output::Pruned(n) => json!({"deleted": n}),
        Output::Hits(hits) => Value::Array(hits.iter().map(hit_json).collect()),
        Output::Records(records) => Value::Array(
            records
                .iter()
                .map(|(_, r)| r.as_ref().map_or(Value::Null, record_json))
                .collect(),
        ),
    }
}

fn format_human(output: &Output) -> String {
    match output {
        Output::Ok => "OK".to_string(),
        Output::Count(n) => format!("(integer) {}", n),
        Output::Pruned(n) => format!("(deleted) {}", n),
        Output::Hits(hits) if hits.is_empty() => "(empty list)".to_string(),
        Output::Hits(hits) => hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                let mut line = format!("{}) {} score={:.4}", i + 1, hit.id, hit.score);
                if !hit.payload.is_empty() {
                    line.push_str(&format!(" {}", Value::Object(payload_to_json(&hit.payload))));
                }
                if let Some(text) = &hit.text {
                    line.push_str(&format!(" \"{}\"", text));
                }
                if let Some(vector) = &hit.vector {
                    line.push_str(&format!(" {}", short_vector(vector)));
                }
                line
            })
            .collect::<Vec<_>>()
            .join("\n"),
        Output::Records(records) => records
            .iter()
            .map(|(id, record)| match record {
                None => format!("{}: (nil)", id),
                Some(r) => {
                    let mut line = format!("{}: {}", id, short_vector(&r.vector));
                    if !r.payload.is_empty() {
                        line.push_str(&format!(" {}", Value::Object(payload_to_json(&r.payload))));
                    }
                    if let Some(text) = &r.text {
                        line.push_str(&format!(" \"{}\"", text));
                    }
                    line
                }
            })
            .collect::<Vec<_>>()
            .join("\n"),
    }
}

/// Render an error.
pub fn format_error(err: &Error, mode: OutputMode) -> String {
    match mode {
        OutputMode::Json => json!({
            "error": err.to_string(),
            "kind": err.kind().name(),
            "retryable": err.is_retryable(),
        })
        .to_string(),
        OutputMode::Human => format!("(error) {}: {}", err.kind().name(), err),
    }
}
