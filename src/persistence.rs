/// Saving and loading miner state
///
/// The binary form is an opaque bincode blob; only this crate is expected to
/// read it back. A JSON form is offered alongside for human inspection of a
/// persisted template dictionary. Both round-trip the full map: templates,
/// counters, and the tokenizer pattern (recompiled on load).
use crate::template::{Template, TemplateState};
use crate::template_map::TemplateMap;
use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

#[derive(Debug, Serialize, Deserialize)]
struct MapState {
    token_pattern: String,
    templates: Vec<TemplateState>,
    next_line_id: u64,
    next_template_id: u64,
}

impl MapState {
    fn from_map(map: &TemplateMap) -> Self {
        Self {
            token_pattern: map.token_pattern().to_string(),
            templates: map.iter().map(|t| t.clone().into_state()).collect(),
            next_line_id: map.line_count(),
            next_template_id: map.next_template_id(),
        }
    }

    fn into_map(self) -> Result<TemplateMap> {
        let refmt = Regex::new(&self.token_pattern).with_context(|| {
            format!(
                "Invalid tokenizer pattern in saved state: {:?}",
                self.token_pattern
            )
        })?;

        let templates = self
            .templates
            .into_iter()
            .map(|state| Template::from_state(state, refmt.clone()))
            .collect();

        Ok(TemplateMap::from_parts(
            self.token_pattern,
            refmt,
            templates,
            self.next_line_id,
            self.next_template_id,
        ))
    }
}

/// Write the whole map to disk as a binary blob
pub fn save(path: impl AsRef<Path>, map: &TemplateMap) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create state file: {}", path.display()))?;

    bincode::serialize_into(BufWriter::new(file), &MapState::from_map(map))
        .with_context(|| format!("Failed to serialize miner state to {}", path.display()))
}

/// Read a map back from a blob written by [`save`]
pub fn load(path: impl AsRef<Path>) -> Result<TemplateMap> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open state file: {}", path.display()))?;

    #[allow(deprecated)]
    let state: MapState = match bincode::config()
        .limit(100 * 1024 * 1024)
        .deserialize_from(BufReader::new(file))
    {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!(
                "{} does not contain a saved template map: {}",
                path.display(),
                err
            );
            anyhow::bail!("Failed to deserialize miner state from {}", path.display());
        }
    };

    state.into_map()
}

/// Write the whole map to disk as human-readable JSON
pub fn save_json(path: impl AsRef<Path>, map: &TemplateMap) -> Result<()> {
    let path = path.as_ref();
    let file = File::create(path)
        .with_context(|| format!("Failed to create state file: {}", path.display()))?;

    serde_json::to_writer_pretty(BufWriter::new(file), &MapState::from_map(map))
        .with_context(|| format!("Failed to serialize miner state to {}", path.display()))
}

/// Read a map back from JSON written by [`save_json`]
pub fn load_json(path: impl AsRef<Path>) -> Result<TemplateMap> {
    let path = path.as_ref();
    let file = File::open(path)
        .with_context(|| format!("Failed to open state file: {}", path.display()))?;

    let state: MapState = match serde_json::from_reader(BufReader::new(file)) {
        Ok(state) => state,
        Err(err) => {
            tracing::warn!(
                "{} does not contain a saved template map: {}",
                path.display(),
                err
            );
            anyhow::bail!("Failed to deserialize miner state from {}", path.display());
        }
    };

    state.into_map()
}

impl TemplateMap {
    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<()> {
        save(path, self)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self> {
        load(path)
    }

    pub fn save_to_json(&self, path: impl AsRef<Path>) -> Result<()> {
        save_json(path, self)
    }

    pub fn load_from_json(path: impl AsRef<Path>) -> Result<Self> {
        load_json(path)
    }
}
