// Log template discovered by online LCS mining
// A template is a token skeleton where variable positions have collapsed
// into `*` wildcards, e.g. ["User", "*", "logged", "in"]

use regex::Regex;
use serde_json::json;

/// Wildcard token standing for one or more variable tokens
pub const WILDCARD: &str = "*";

/// Split a raw line into tokens using the tokenizer pattern
///
/// The line is trimmed first; split fields are kept verbatim, so an empty
/// line yields a single empty token.
pub(crate) fn tokenize(refmt: &Regex, line: &str) -> Vec<String> {
    refmt.split(line.trim()).map(str::to_string).collect()
}

#[derive(Debug, Clone)]
pub struct Template {
    id: u64,
    tokens: Vec<String>,
    line_ids: Vec<u64>,
    positions: Vec<usize>,
    separator: String,
    refmt: Regex,
}

impl Template {
    /// Create a template from the first line of its cluster
    ///
    /// The initial token sequence carries no wildcards, so `positions` starts
    /// empty and the separator is a bare space until the first merge.
    pub fn new(id: u64, tokens: Vec<String>, line_id: u64, refmt: Regex) -> Self {
        Self {
            id,
            tokens,
            line_ids: vec![line_id],
            positions: Vec::new(),
            separator: " ".to_string(),
            refmt,
        }
    }

    /// Convenience constructor taking the raw line instead of tokens
    pub fn from_line(id: u64, line: &str, line_id: u64, refmt: Regex) -> Self {
        let tokens = tokenize(&refmt, line);
        Self::new(id, tokens, line_id, refmt)
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Number of tokens, wildcards included
    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Ids of every line merged into this template, in arrival order
    pub fn line_ids(&self) -> &[u64] {
        &self.line_ids
    }

    /// Indices of the wildcard tokens
    pub fn positions(&self) -> &[usize] {
        &self.positions
    }

    /// Alternation of the template's concrete-token runs, used by `reparam`
    pub fn separator(&self) -> &str {
        &self.separator
    }

    fn is_wildcard_at(&self, idx: usize) -> bool {
        self.positions.contains(&idx)
    }

    /// Greedy longest-common-subsequence length between this template and `seq`
    ///
    /// Single left-to-right pass: each concrete token matches the first
    /// occurrence in `seq` after the previous match and never backtracks.
    /// Wildcard positions do not contribute. This deliberately under-counts
    /// compared to the optimal DP answer; the clustering quality depends on
    /// the exact greedy result, so it must not be "fixed".
    pub fn lcs_length(&self, seq: &[String]) -> usize {
        let mut count = 0;
        let mut lastmatch: Option<usize> = None;

        for i in 0..self.tokens.len() {
            if self.is_wildcard_at(i) {
                continue;
            }

            let start = lastmatch.map_or(0, |m| m + 1);
            for j in start..seq.len() {
                if self.tokens[i] == seq[j] {
                    lastmatch = Some(j);
                    count += 1;
                    break;
                }
            }
        }

        count
    }

    pub fn lcs_length_line(&self, line: &str) -> usize {
        self.lcs_length(&tokenize(&self.refmt, line))
    }

    /// Merge a new line into the template
    ///
    /// Walks the current token sequence against `seq`: concrete tokens that
    /// still match are kept, everything else collapses into a wildcard.
    /// Consecutive wildcards coalesce into one, and trailing tokens of `seq`
    /// with no counterpart in the template are discarded. The merged buffer
    /// is re-split by the tokenizer pattern, then the wildcard positions and
    /// the separator are recomputed.
    pub fn insert(&mut self, seq: &[String], line_id: u64) {
        self.line_ids.push(line_id);

        let mut merged = String::new();
        let mut lastmatch: Option<usize> = None;
        let mut placeholder = false;

        for i in 0..self.tokens.len() {
            if self.is_wildcard_at(i) {
                if !placeholder {
                    merged.push_str("* ");
                }
                placeholder = true;
                continue;
            }

            let start = lastmatch.map_or(0, |m| m + 1);
            for j in start..seq.len() {
                if self.tokens[i] == seq[j] {
                    placeholder = false;
                    merged.push_str(&self.tokens[i]);
                    merged.push(' ');
                    lastmatch = Some(j);
                    break;
                } else if !placeholder {
                    merged.push_str("* ");
                    placeholder = true;
                }
            }
        }

        self.tokens = self.refmt.split(merged.trim()).map(str::to_string).collect();
        self.positions = wildcard_positions(&self.tokens);
        self.separator = derive_separator(&self.tokens);
    }

    /// Extract the variable-slot contents of `seq` under this template
    ///
    /// Each wildcard yields one slot holding the tokens it absorbed; a slot
    /// ends when the next concrete template token shows up in `seq`. Returns
    /// `None` when the line does not align with the template.
    pub fn param(&self, seq: &[String]) -> Option<Vec<Vec<String>>> {
        let mut j = 0;
        let mut slots = Vec::new();

        for i in 0..self.tokens.len() {
            if self.is_wildcard_at(i) {
                let mut slot = Vec::new();
                while j < seq.len() {
                    if i + 1 < self.tokens.len() && self.tokens[i + 1] == seq[j] {
                        break;
                    }
                    slot.push(seq[j].clone());
                    j += 1;
                }
                slots.push(slot);
            } else if seq.get(j) != Some(&self.tokens[i]) {
                return None;
            } else {
                j += 1;
            }
        }

        if j != seq.len() {
            return None;
        }

        Some(slots)
    }

    pub fn param_line(&self, line: &str) -> Option<Vec<Vec<String>>> {
        self.param(&tokenize(&self.refmt, line))
    }

    /// Recover the variable slots from a fully-joined line by splitting on
    /// the derived separator pattern
    ///
    /// Returns `None` when the split does not produce exactly one fragment
    /// per wildcard, or when the template has no concrete tokens left to
    /// split on.
    pub fn reparam(&self, line: &str) -> Option<Vec<Vec<String>>> {
        if self.separator.is_empty() {
            return None;
        }

        let sep = Regex::new(&self.separator).ok()?;
        let mut slots = Vec::new();
        for fragment in sep.split(line.trim()) {
            if !fragment.is_empty() {
                slots.push(tokenize(&self.refmt, fragment));
            }
        }

        if slots.len() == self.positions.len() {
            Some(slots)
        } else {
            None
        }
    }

    pub fn reparam_tokens(&self, seq: &[String]) -> Option<Vec<Vec<String>>> {
        self.reparam(&seq.join(" "))
    }

    /// Diagnostic JSON form: `lcsseq` (tokens joined by spaces, trailing
    /// space kept), `lineids`, `position`
    pub fn to_json(&self) -> String {
        let mut lcsseq = String::new();
        for token in &self.tokens {
            lcsseq.push_str(token);
            lcsseq.push(' ');
        }

        json!({
            "lcsseq": lcsseq,
            "lineids": self.line_ids,
            "position": self.positions,
        })
        .to_string()
    }

    pub(crate) fn into_state(self) -> TemplateState {
        TemplateState {
            id: self.id,
            tokens: self.tokens,
            line_ids: self.line_ids,
            positions: self.positions,
            separator: self.separator,
        }
    }

    pub(crate) fn from_state(state: TemplateState, refmt: Regex) -> Self {
        Self {
            id: state.id,
            tokens: state.tokens,
            line_ids: state.line_ids,
            positions: state.positions,
            separator: state.separator,
            refmt,
        }
    }
}

/// Serializable template fields; the tokenizer regex is recompiled on load
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub(crate) struct TemplateState {
    pub id: u64,
    pub tokens: Vec<String>,
    pub line_ids: Vec<u64>,
    pub positions: Vec<usize>,
    pub separator: String,
}

fn wildcard_positions(tokens: &[String]) -> Vec<usize> {
    tokens
        .iter()
        .enumerate()
        .filter(|(_, token)| *token == WILDCARD)
        .map(|(idx, _)| idx)
        .collect()
}

/// Join the maximal runs of concrete tokens with `|`
///
/// Every non-empty run contributes one alternation branch; runs adjacent to
/// the sequence ends count like any other. An all-wildcard template yields an
/// empty separator.
fn derive_separator(tokens: &[String]) -> String {
    let mut runs: Vec<String> = Vec::new();
    let mut run: Vec<&str> = Vec::new();

    for token in tokens {
        if token == WILDCARD {
            if !run.is_empty() {
                runs.push(run.join(" "));
                run.clear();
            }
        } else {
            run.push(token);
        }
    }
    if !run.is_empty() {
        runs.push(run.join(" "));
    }

    runs.join("|")
}
