use std::{collections::HashMap, sync::OnceLock};

/// A top-level Terragrunt block keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct KeywordEntry {
    pub label: &'static str,
    /// Whether the block takes a name label (`dependency "vpc" { }`).
    pub labeled: bool,
    pub documentation: &'static str,
}

const fn entry(
    label: &'static str,
    labeled: bool,
    documentation: &'static str,
) -> KeywordEntry {
    KeywordEntry {
        label,
        labeled,
        documentation,
    }
}

static KEYWORDS: &[KeywordEntry] = &[
    entry("terraform", false, "Where the Terraform module lives and how it is invoked."),
    entry("remote_state", false, "Backend configuration for Terraform state."),
    entry("include", true, "Merge in a parent configuration."),
    entry("locals", false, "Local values, referenced as `local.<name>`."),
    entry(
        "dependency",
        true,
        "Another unit whose outputs are read as `dependency.<name>.outputs`.",
    ),
    entry("dependencies", false, "Units that must be applied before this one."),
    entry("generate", true, "Write a file into the working directory before running Terraform."),
    entry("errors", false, "Retry and ignore rules for Terraform errors."),
    entry("exclude", false, "Conditions under which this unit is skipped."),
    entry("feature", true, "A feature flag, read as `feature.<name>.value`."),
    entry("engine", false, "Alternative engine used to run Terraform."),
    entry("catalog", false, "Module catalog sources."),
    entry("unit", true, "A unit within a stack."),
    entry("stack", true, "A nested stack."),
];

static KEYWORD_MAP: OnceLock<HashMap<&'static str, usize>> = OnceLock::new();

pub(crate) fn all() -> &'static [KeywordEntry] {
    KEYWORDS
}

pub(crate) fn lookup(name: &str) -> Option<&'static KeywordEntry> {
    let map = KEYWORD_MAP.get_or_init(|| KEYWORDS.iter().enumerate().map(|(i, entry)| (entry.label, i)).collect());
    map.get(name).map(|&i| &KEYWORDS[i])
}
