use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::analysis::DEFAULT_DIAGNOSTIC_SOURCE;

#[derive(Debug, Clone, PartialEq)]
pub struct DiagnosticsSettings {
    /// When `false`, parses still run (hover and definition need them) but
    /// an empty diagnostics list is published.
    pub enable: bool,
    /// `source` field of every published diagnostic.
    pub source: String,
}

impl Default for DiagnosticsSettings {
    fn default() -> Self {
        Self {
            enable: true,
            source: DEFAULT_DIAGNOSTIC_SOURCE.to_owned(),
        }
    }
}

impl DiagnosticsSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: DiagnosticsSettingsPatch,
    ) {
        if let Some(v) = patch.enable {
            self.enable = v;
        }
        if let Some(v) = patch.source {
            self.source = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        let trimmed = self.source.trim();
        if trimmed.is_empty() {
            self.source = DEFAULT_DIAGNOSTIC_SOURCE.to_owned();
        } else if trimmed.len() != self.source.len() {
            self.source = trimmed.to_owned();
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct DiagnosticsSettingsPatch {
    pub(crate) enable: Option<bool>,
    pub(crate) source: Option<String>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
