use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const MIN_PARSE_TIMEOUT_MS: u64 = 100;
pub const MAX_PARSE_TIMEOUT_MS: u64 = 60_000;
pub const MIN_PARSE_DEBOUNCE_MS: u64 = 0;
pub const MAX_PARSE_DEBOUNCE_MS: u64 = 5000;

#[derive(Debug, Clone, PartialEq)]
pub struct ParseSettings {
    /// Budget for one parse; an attempt past it is abandoned and the
    /// previous result kept.
    pub timeout_ms: u64,
    /// Idle delay after an edit before parsing starts.
    pub debounce_ms: u64,
}

impl Default for ParseSettings {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            debounce_ms: 100,
        }
    }
}

impl ParseSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: ParseSettingsPatch,
    ) {
        if let Some(v) = patch.timeout_ms {
            self.timeout_ms = v;
        }
        if let Some(v) = patch.debounce_ms {
            self.debounce_ms = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.timeout_ms = self.timeout_ms.clamp(MIN_PARSE_TIMEOUT_MS, MAX_PARSE_TIMEOUT_MS);
        self.debounce_ms = self.debounce_ms.clamp(MIN_PARSE_DEBOUNCE_MS, MAX_PARSE_DEBOUNCE_MS);
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct ParseSettingsPatch {
    pub(crate) timeout_ms: Option<u64>,
    pub(crate) debounce_ms: Option<u64>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
