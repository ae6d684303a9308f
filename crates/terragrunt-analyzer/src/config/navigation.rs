use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

pub const MAX_HOVER_GRACE_MS: u64 = 2000;

#[derive(Debug, Clone, PartialEq)]
pub struct NavigationSettings {
    /// How long hover and definition wait for an in-flight parse of the
    /// current text before answering from the previous result.
    pub hover_grace_ms: u64,
    /// Read dependency configs from disk to provide definition targets.
    pub resolve_dependencies: bool,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            hover_grace_ms: 150,
            resolve_dependencies: true,
        }
    }
}

impl NavigationSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: NavigationSettingsPatch,
    ) {
        if let Some(v) = patch.hover_grace_ms {
            self.hover_grace_ms = v;
        }
        if let Some(v) = patch.resolve_dependencies {
            self.resolve_dependencies = v;
        }
    }

    pub(crate) fn normalize(&mut self) {
        self.hover_grace_ms = self.hover_grace_ms.min(MAX_HOVER_GRACE_MS);
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct NavigationSettingsPatch {
    pub(crate) hover_grace_ms: Option<u64>,
    pub(crate) resolve_dependencies: Option<bool>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
