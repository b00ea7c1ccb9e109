//! Parsing of the sweep tool's text output.
//!
//! Resource lines look like
//! `eu-west-1 - EC2Instance - i-0abc - [Name: "web", tag:Team: "core"] - would remove`.

use std::collections::BTreeMap;

use crate::executor::types::ResourceDescriptor;

const SEPARATOR: &str = " - ";
const WOULD_REMOVE: &str = "would remove";
const REMOVED: &str = "removed";
const TAG_PREFIX: &str = "tag:";

/// Lines selected from a run's combined output.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FilteredOutput {
    /// Lines that count as resources to delete (or deleted).
    pub counted: Vec<String>,
    /// Every selected line, for the filtered report.
    pub report: Vec<String>,
}

/// Dry runs count "would remove" lines. Real runs count "removed" lines
/// and also report leftover "would remove" lines, which indicate
/// resources the tool failed to delete.
pub fn filter_output(output: &str, dry_run: bool) -> FilteredOutput {
    let lines: Vec<&str> = output.lines().collect();
    let matching = |needle: &str| -> Vec<String> {
        lines
            .iter()
            .filter(|line| line.to_lowercase().contains(needle))
            .map(|line| line.trim().to_string())
            .collect()
    };

    if dry_run {
        let counted = matching(WOULD_REMOVE);
        FilteredOutput {
            report: counted.clone(),
            counted,
        }
    } else {
        let counted = matching(REMOVED);
        let mut report = counted.clone();
        report.extend(matching(WOULD_REMOVE));
        FilteredOutput { counted, report }
    }
}

/// Parse one resource line. Lines not in the tool's layout are kept with
/// the raw line as identifier so they still count.
pub fn parse_resource_line(line: &str) -> ResourceDescriptor {
    try_parse(line.trim()).unwrap_or_else(|| ResourceDescriptor {
        region: String::new(),
        resource_type: String::new(),
        identifier: line.trim().to_string(),
        tags: BTreeMap::new(),
        properties: BTreeMap::new(),
        state: String::new(),
    })
}

fn try_parse(line: &str) -> Option<ResourceDescriptor> {
    let mut head = line.splitn(3, SEPARATOR);
    let region = head.next()?.trim();
    let resource_type = head.next()?.trim();
    let rest = head.next()?;

    let (identifier, attributes, state) = match rest.find(" - [") {
        Some(open) => {
            let identifier = &rest[..open];
            let bracketed = &rest[open + SEPARATOR.len()..];
            let close = bracketed.rfind("]")?;
            let state = bracketed[close + 1..].trim_start().strip_prefix("-")?;
            (identifier, &bracketed[1..close], state)
        }
        None => {
            let (identifier, state) = rest.rsplit_once(SEPARATOR)?;
            (identifier, "", state)
        }
    };

    if region.is_empty() || resource_type.is_empty() || identifier.trim().is_empty() {
        return None;
    }

    let mut tags = BTreeMap::new();
    let mut properties = BTreeMap::new();
    for (key, value) in parse_attributes(attributes) {
        match key.strip_prefix(TAG_PREFIX) {
            Some(tag) => {
                tags.insert(tag.to_string(), value);
            }
            None => {
                properties.insert(key, value);
            }
        }
    }

    Some(ResourceDescriptor {
        region: region.to_string(),
        resource_type: resource_type.to_string(),
        identifier: identifier.trim().to_string(),
        tags,
        properties,
        state: state.trim().to_string(),
    })
}

/// `Key: "value", Other: "value"` pairs. Malformed trailing input is ignored.
fn parse_attributes(input: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = input.trim();

    while !rest.is_empty() {
        let Some(colon) = rest.find(": \"") else {
            break;
        };
        let key = rest[..colon].trim().to_string();
        let after = &rest[colon + 3..];
        let Some(end) = after.find('"') else {
            break;
        };
        pairs.push((key, after[..end].to_string()));
        rest = after[end + 1..].trim_start_matches(',').trim_start();
    }
    pairs
}

/// First token of `tool --version` output that looks like a version.
pub fn extract_version(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .map(|token| token.trim_matches(|c: char| c == ',' || c == '(' || c == ')'))
        .find(|token| {
            let digits = token.strip_prefix('v').unwrap_or(token);
            digits.starts_with(|c: char| c.is_ascii_digit()) && digits.contains('.')
        })
        .map(str::to_string)
}

/// Versions compare equal ignoring a leading `v`.
pub fn versions_match(expected: &str, actual: &str) -> bool {
    let normalize = |v: &str| v.trim().trim_start_matches('v').to_string();
    normalize(expected) == normalize(actual)
}
