/// Mine log templates from a stream of raw log lines
///
/// Reads lines from stdin (or a file given as the first argument), feeds them
/// through the streaming miner, and prints the discovered template dictionary
/// as JSON lines. Input may be plain text or JSON records carrying a `line`
/// field, the shape emitted by the upstream log exporter.
///
/// Configuration via environment variables:
/// - MINER_TOKEN_PATTERN: tokenizer split regex (default `\s+`)
/// - MINER_STATE_FILE: load miner state from this file if it exists, and
///   save back to it on exit
/// - MINER_MAX_LINES: stop after this many lines
use anyhow::{Context, Result};
use log_template_miner::template_map::TemplateMap;
use serde::Deserialize;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Deserialize)]
struct LogRecord {
    line: String,
}

/// Accept both raw text lines and JSON log records
fn extract_line(raw: &str) -> String {
    if raw.trim_start().starts_with('{') {
        if let Ok(record) = serde_json::from_str::<LogRecord>(raw) {
            return record.line;
        }
    }
    raw.to_string()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let token_pattern =
        std::env::var("MINER_TOKEN_PATTERN").unwrap_or_else(|_| r"\s+".to_string());
    let state_file = std::env::var("MINER_STATE_FILE").ok();
    let max_lines: u64 = std::env::var("MINER_MAX_LINES")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(u64::MAX);

    let mut map = match &state_file {
        Some(path) if Path::new(path).exists() => {
            tracing::info!("Loading miner state from {}", path);
            TemplateMap::load_from_file(path)?
        }
        _ => TemplateMap::new(&token_pattern)?,
    };

    let args: Vec<String> = std::env::args().collect();
    let reader: Box<dyn BufRead> = match args.get(1) {
        Some(path) => Box::new(BufReader::new(
            File::open(path).with_context(|| format!("Failed to open log file: {}", path))?,
        )),
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut total: u64 = 0;
    for line in reader.lines() {
        let line = line.context("Failed to read input line")?;
        let content = extract_line(&line);
        if content.trim().is_empty() {
            continue;
        }

        map.insert(&content);
        total += 1;
        if total == max_lines {
            break;
        }
    }

    for template in &map {
        println!("{}", template.to_json());
    }
    tracing::info!("{} lines grouped into {} templates", total, map.len());

    if let Some(path) = state_file {
        map.save_to_file(&path)?;
        tracing::info!("Saved miner state to {}", path);
    }

    Ok(())
}
