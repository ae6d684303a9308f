use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;
use tower_lsp::lsp_types::MessageType;

/// Threshold for `window/logMessage`. Ordered from quietest to noisiest, so a
/// message is sent when its own level is at or below the configured one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Level a client message type is filed under. `LOG` is per-document
    /// chatter and only shows at `debug`.
    pub fn of_message(kind: MessageType) -> Self {
        match kind {
            MessageType::ERROR => LogLevel::Error,
            MessageType::WARNING => LogLevel::Warn,
            MessageType::INFO => LogLevel::Info,
            _ => LogLevel::Debug,
        }
    }

    pub fn admits(
        self,
        kind: MessageType,
    ) -> bool {
        Self::of_message(kind) <= self
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoggingSettings {
    /// Verbosity of `window/logMessage` notifications sent to the client.
    /// Server-side tracing is configured on the command line instead.
    pub level: LogLevel,
}

impl LoggingSettings {
    pub(crate) fn apply_patch(
        &mut self,
        patch: LoggingSettingsPatch,
    ) {
        if let Some(level) = patch.level {
            self.level = level;
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default, rename_all = "camelCase")]
pub(crate) struct LoggingSettingsPatch {
    pub(crate) level: Option<LogLevel>,
    #[serde(flatten)]
    pub(crate) _extra: HashMap<String, Value>,
}
