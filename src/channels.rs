//! Channel selection by file-naming convention.
//!
//! Datasets label the same electrode differently (`"EEG-C3"` in BCI IV 2a,
//! `"EEG:C3"` in 2b), so the channel list is a function of the file name.
use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::{ConvertError, Result};

/// Files whose name starts with `prefix` keep `channels`, in that order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelRule {
    pub prefix: String,
    pub channels: Vec<String>,
}

impl ChannelRule {
    pub fn new(prefix: &str, channels: &[&str]) -> Self {
        Self {
            prefix: prefix.to_string(),
            channels: channels.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// Rules for BCI Competition IV datasets 2a (`A*`) and 2b (`B*`).
pub fn bci_competition_iv_rules() -> Vec<ChannelRule> {
    vec![
        ChannelRule::new("A", &["EEG-C3", "EEG-C4", "EEG-Cz"]),
        ChannelRule::new("B", &["EEG:C3", "EEG:C4", "EEG:Cz"]),
    ]
}

/// Channel names to keep for `file_name`.
///
/// The first rule whose prefix matches wins; `fallback` applies when none
/// match. Without a fallback an unmapped file is a configuration error.
pub fn channels_for_file(
    file_name: &str,
    rules: &[ChannelRule],
    fallback: Option<&[String]>,
) -> Result<Vec<String>> {
    if let Some(rule) = rules.iter().find(|r| file_name.starts_with(&r.prefix)) {
        return Ok(rule.channels.clone());
    }
    match fallback {
        Some(channels) => Ok(channels.to_vec()),
        None => {
            let known: Vec<&str> = rules.iter().map(|r| r.prefix.as_str()).collect();
            Err(ConvertError::configuration(
                file_name,
                format!("no channel rule matches this file name (known prefixes: {known:?})"),
            ))
        }
    }
}

/// Resolve `requested` names to row indices of `available`, preserving the
/// requested order. An empty request keeps every channel.
pub fn select_channels(available: &[String], requested: &[String], file: &str) -> Result<Vec<usize>> {
    if requested.is_empty() {
        return Ok((0..available.len()).collect());
    }
    let mut picks = Vec::with_capacity(requested.len());
    let mut missing = Vec::new();
    for name in requested {
        match available.iter().position(|a| a == name) {
            Some(i) => picks.push(i),
            None => missing.push(name.as_str()),
        }
    }
    if !missing.is_empty() {
        let what = if missing.len() == requested.len() { "no requested channel" } else { "some requested channels" };
        return Err(ConvertError::configuration(
            file,
            format!("{what} found: missing {missing:?}, available {available:?}"),
        ));
    }
    Ok(picks)
}

/// Names that occur more than once, in first-seen order.
pub fn duplicate_names(names: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut dups = Vec::new();
    for n in names {
        if !seen.insert(n.as_str()) && !dups.contains(n) {
            dups.push(n.clone());
        }
    }
    dups
}
