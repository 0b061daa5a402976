use std::collections::HashMap;

use anyhow::{Context, Result};
use once_cell::sync::OnceCell;

/// Curated display labels keyed by the competition name as stored upstream.
#[derive(Debug, Default)]
pub struct CompetitionLabels {
    exact: HashMap<String, String>,
    normalized: OnceCell<HashMap<String, String>>,
}

impl CompetitionLabels {
    pub fn new(exact: HashMap<String, String>) -> Self {
        Self {
            exact,
            normalized: OnceCell::new(),
        }
    }

    pub fn default_table() -> Result<Self> {
        let raw = include_str!("../assets/competition_labels.json");
        Self::from_json(raw).context("parse embedded competition labels")
    }

    pub fn from_json(raw: &str) -> Result<Self> {
        let exact = serde_json::from_str::<HashMap<String, String>>(raw)
            .context("competition labels must be a string map")?;
        Ok(Self::new(exact))
    }

    pub fn exact(&self) -> &HashMap<String, String> {
        &self.exact
    }

    /// Built on first use; concurrent first calls settle on the same table.
    pub fn normalized(&self) -> &HashMap<String, String> {
        self.normalized
            .get_or_init(|| normalized_table(&self.exact))
    }

    pub fn label_for<'a>(&'a self, name: &'a str) -> &'a str {
        label_for_competition(name, &self.exact, self.normalized())
    }

    /// `(raw name, label)` pairs for a competition select box.
    pub fn options<'a, I>(&'a self, names: I) -> Vec<(&'a str, &'a str)>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names
            .into_iter()
            .map(|name| (name, self.label_for(name)))
            .collect()
    }
}

pub fn normalized_table(exact: &HashMap<String, String>) -> HashMap<String, String> {
    exact
        .iter()
        .map(|(name, label)| (normalize_competition_key(name), label.clone()))
        .collect()
}

pub fn label_for_competition<'a>(
    name: &'a str,
    exact: &'a HashMap<String, String>,
    normalized: &'a HashMap<String, String>,
) -> &'a str {
    if let Some(label) = exact.get(name) {
        return label;
    }
    normalized
        .get(&normalize_competition_key(name))
        .map(String::as_str)
        .unwrap_or(name)
}

/// Matching key for league names that differ only in apostrophe style,
/// spacing or letter case: `"LIGAT HA’’AL"` -> `"ligat ha'al"`.
pub fn normalize_competition_key(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.trim().chars().peekable();
    while let Some(ch) = chars.next() {
        if is_apostrophe(ch) {
            while chars.next_if(|c| is_apostrophe(*c)).is_some() {}
            while out.ends_with(' ') {
                out.pop();
            }
            out.push('\'');
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
        } else if ch.is_whitespace() {
            if !out.ends_with(' ') {
                out.push(' ');
            }
        } else {
            out.push(ch);
        }
    }
    fold_case(&out)
}

fn is_apostrophe(ch: char) -> bool {
    matches!(ch, '\'' | '`' | '\u{2018}' | '\u{2019}' | '\u{00B4}')
}

/// Unicode full case folding, so `ß`/`ss`, `µ`/`μ` and ligatures compare equal.
fn fold_case(s: &str) -> String {
    caseless::default_case_fold_str(s)
}
