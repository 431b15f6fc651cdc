/// Streaming template map: the online clustering driver
///
/// Every inserted line is tokenized, scored against the existing templates
/// with the greedy LCS kernel, and either merged into the best candidate or
/// promoted to a fresh template. Templates live for the lifetime of the map
/// and are never split or dropped.
use crate::template::{tokenize, Template};
use anyhow::{Context, Result};
use regex::Regex;
use std::ops::Index;

#[derive(Debug, Clone)]
pub struct TemplateMap {
    token_pattern: String,
    refmt: Regex,
    templates: Vec<Template>,
    next_line_id: u64,
    next_template_id: u64,
}

impl TemplateMap {
    /// Create an empty map with the given tokenizer pattern
    ///
    /// The pattern is a split regex; an invalid pattern is fatal here rather
    /// than surfacing later in the hot path.
    pub fn new(token_pattern: &str) -> Result<Self> {
        let refmt = Regex::new(token_pattern)
            .with_context(|| format!("Invalid tokenizer pattern: {:?}", token_pattern))?;

        Ok(Self {
            token_pattern: token_pattern.to_string(),
            refmt,
            templates: Vec::new(),
            next_line_id: 0,
            next_template_id: 0,
        })
    }

    /// Assign a raw line to a template, creating one if nothing matches
    ///
    /// Line ids are handed out in call order starting at 1, so the ids
    /// scattered across all templates always form `1..=n` with no gaps.
    pub fn insert(&mut self, entry: &str) -> &Template {
        let seq = tokenize(&self.refmt, entry);
        let matched = self.best_match_index(&seq);

        self.next_line_id += 1;
        let line_id = self.next_line_id;

        match matched {
            Some(idx) => {
                self.templates[idx].insert(&seq, line_id);
                tracing::debug!(
                    "line {} merged into template {}",
                    line_id,
                    self.templates[idx].id()
                );
                &self.templates[idx]
            }
            None => {
                let template_id = self.next_template_id;
                self.next_template_id += 1;
                self.templates
                    .push(Template::new(template_id, seq, line_id, self.refmt.clone()));
                tracing::debug!("line {} created template {}", line_id, template_id);

                let idx = self.templates.len() - 1;
                &self.templates[idx]
            }
        }
    }

    /// Best-scoring template for a token sequence, if any clears the bar
    ///
    /// Candidates are length-pruned to `[L/2, 2L]` before scoring and must
    /// reach a greedy LCS of at least `L/2`. Ties go to the earliest-created
    /// template.
    pub fn best_match(&self, seq: &[String]) -> Option<&Template> {
        self.best_match_index(seq).map(|idx| &self.templates[idx])
    }

    /// Convenience form of [`best_match`](Self::best_match) for raw lines
    pub fn match_line(&self, line: &str) -> Option<&Template> {
        self.best_match(&tokenize(&self.refmt, line))
    }

    fn best_match_index(&self, seq: &[String]) -> Option<usize> {
        let seq_len = seq.len();
        let mut best: Option<usize> = None;
        let mut best_len = 0;

        for (idx, template) in self.templates.iter().enumerate() {
            let template_len = template.len();
            // Doubled comparisons keep the L/2 bounds exact without floats
            if 2 * template_len < seq_len || template_len > 2 * seq_len {
                continue;
            }

            let lcs = template.lcs_length(seq);
            if 2 * lcs >= seq_len && lcs > best_len {
                best = Some(idx);
                best_len = lcs;
            }
        }

        best
    }

    pub fn get(&self, idx: usize) -> Option<&Template> {
        self.templates.get(idx)
    }

    /// Number of templates discovered so far
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Number of lines inserted so far
    pub fn line_count(&self) -> u64 {
        self.next_line_id
    }

    pub fn token_pattern(&self) -> &str {
        &self.token_pattern
    }

    /// Templates in creation order
    pub fn iter(&self) -> std::slice::Iter<'_, Template> {
        self.templates.iter()
    }

    /// Log every template's JSON form
    pub fn dump(&self) {
        for template in &self.templates {
            tracing::info!("{}", template.to_json());
        }
    }

    pub(crate) fn next_template_id(&self) -> u64 {
        self.next_template_id
    }

    pub(crate) fn from_parts(
        token_pattern: String,
        refmt: Regex,
        templates: Vec<Template>,
        next_line_id: u64,
        next_template_id: u64,
    ) -> Self {
        Self {
            token_pattern,
            refmt,
            templates,
            next_line_id,
            next_template_id,
        }
    }
}

impl Index<usize> for TemplateMap {
    type Output = Template;

    fn index(&self, idx: usize) -> &Template {
        &self.templates[idx]
    }
}

impl<'a> IntoIterator for &'a TemplateMap {
    type Item = &'a Template;
    type IntoIter = std::slice::Iter<'a, Template>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
