//! Server configuration.
//!
//! Settings are split into one file per category. [`ServerSettings`]
//! aggregates them and merges JSON patches from LSP initialization options
//! and `didChangeConfiguration` payloads. Unknown keys are ignored and
//! out-of-range values are clamped.

pub(crate) mod diagnostics;
pub(crate) mod logging;
pub(crate) mod navigation;
pub(crate) mod parse;
pub(crate) mod session;

use std::collections::HashMap;

use diagnostics::DiagnosticsSettingsPatch;
pub use diagnostics::DiagnosticsSettings;
use logging::LoggingSettingsPatch;
pub use logging::{LogLevel, LoggingSettings};
use navigation::NavigationSettingsPatch;
pub use navigation::{MAX_HOVER_GRACE_MS, NavigationSettings};
use parse::ParseSettingsPatch;
pub use parse::{
    MAX_PARSE_DEBOUNCE_MS, MAX_PARSE_TIMEOUT_MS, MIN_PARSE_DEBOUNCE_MS, MIN_PARSE_TIMEOUT_MS, ParseSettings,
};
use serde::Deserialize;
use serde_json::Value;
pub use session::{Capabilities, ServerConfig, ServerInfoConfig};

pub const SETTINGS_SECTION_KEY: &str = "terragrunt-analyzer";

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ServerSettings {
    pub parse: ParseSettings,
    pub diagnostics: DiagnosticsSettings,
    pub navigation: NavigationSettings,
    pub logging: LoggingSettings,
}

impl ServerSettings {
    pub fn from_lsp_payload(payload: Option<&Value>) -> Self {
        let mut settings = Self::default();
        if let Some(payload) = payload {
            settings = settings.merged_with_payload(payload);
        }
        settings
    }

    pub fn merged_with_payload(
        &self,
        payload: &Value,
    ) -> Self {
        let mut merged = self.clone();

        for candidate in payload_candidates(payload) {
            if let Ok(patch) = serde_json::from_value::<ServerSettingsPatch>(candidate.clone()) {
                merged.apply_patch(patch);
            }
        }

        merged.normalize();
        merged
    }

    fn apply_patch(
        &mut self,
        patch: ServerSettingsPatch,
    ) {
        if let Some(p) = patch.parse {
            self.parse.apply_patch(p);
        }
        if let Some(p) = patch.diagnostics {
            self.diagnostics.apply_patch(p);
        }
        if let Some(p) = patch.navigation {
            self.navigation.apply_patch(p);
        }
        if let Some(p) = patch.logging {
            self.logging.apply_patch(p);
        }
    }

    fn normalize(&mut self) {
        self.parse.normalize();
        self.diagnostics.normalize();
        self.navigation.normalize();
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
struct ServerSettingsPatch {
    parse: Option<ParseSettingsPatch>,
    diagnostics: Option<DiagnosticsSettingsPatch>,
    navigation: Option<NavigationSettingsPatch>,
    logging: Option<LoggingSettingsPatch>,
    #[serde(flatten)]
    _extra: HashMap<String, Value>,
}

fn payload_candidates(payload: &Value) -> Vec<Value> {
    let mut candidates = Vec::new();
    candidates.push(payload.clone());
    if let Some(scoped) = payload.get(SETTINGS_SECTION_KEY) {
        candidates.push(scoped.clone());
    }
    candidates
}

#[cfg(test)]
#[path = "../../tests/src/config/settings_tests.rs"]
mod tests;
