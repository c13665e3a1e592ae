//! Severity → behaviour table.

use serde::{Deserialize, Serialize};
use tracelog_core::Level;

/// What the logger does with a record once it passes the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityAction {
    /// Dispatch to the sinks only.
    Record,
    /// Dispatch to the sinks and hand a copy to the alert transport.
    RecordAndForward,
    /// Dispatch, forward, flush every sink, then panic with the message.
    RecordAndAbort,
}

impl SeverityAction {
    pub const fn forwards(self) -> bool {
        matches!(self, SeverityAction::RecordAndForward | SeverityAction::RecordAndAbort)
    }

    pub const fn aborts(self) -> bool {
        matches!(self, SeverityAction::RecordAndAbort)
    }
}

/// One action per level. Defaults: error forwards, critical aborts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeverityPolicy {
    pub debug: SeverityAction,
    pub info: SeverityAction,
    pub warn: SeverityAction,
    pub error: SeverityAction,
    pub crit: SeverityAction,
}

impl Default for SeverityPolicy {
    fn default() -> Self {
        Self {
            debug: SeverityAction::Record,
            info: SeverityAction::Record,
            warn: SeverityAction::Record,
            error: SeverityAction::RecordAndForward,
            crit: SeverityAction::RecordAndAbort,
        }
    }
}

impl SeverityPolicy {
    pub fn action_for(&self, level: Level) -> SeverityAction {
        match level {
            Level::Debug => self.debug,
            Level::Info => self.info,
            Level::Warn => self.warn,
            Level::Error => self.error,
            Level::Critical => self.crit,
        }
    }

    pub fn with_action(mut self, level: Level, action: SeverityAction) -> Self {
        let slot = match level {
            Level::Debug => &mut self.debug,
            Level::Info => &mut self.info,
            Level::Warn => &mut self.warn,
            Level::Error => &mut self.error,
            Level::Critical => &mut self.crit,
        };
        *slot = action;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let policy = SeverityPolicy::default();
        assert_eq!(policy.action_for(Level::Debug), SeverityAction::Record);
        assert_eq!(policy.action_for(Level::Info), SeverityAction::Record);
        assert_eq!(policy.action_for(Level::Warn), SeverityAction::Record);
        assert_eq!(policy.action_for(Level::Error), SeverityAction::RecordAndForward);
        assert_eq!(policy.action_for(Level::Critical), SeverityAction::RecordAndAbort);
    }

    #[test]
    fn overrides_single_level() {
        let policy = SeverityPolicy::default().with_action(Level::Critical, SeverityAction::RecordAndForward);
        assert_eq!(policy.action_for(Level::Critical), SeverityAction::RecordAndForward);
        assert_eq!(policy.action_for(Level::Error), SeverityAction::RecordAndForward);
    }

    #[test]
    fn abort_implies_forward() {
        assert!(SeverityAction::RecordAndAbort.forwards());
        assert!(!SeverityAction::Record.forwards());
        assert!(!SeverityAction::RecordAndForward.aborts());
    }

    #[test]
    fn partial_table_deserializes_with_defaults() {
        let policy: SeverityPolicy = serde_json::from_str(r#"{"crit": "record_and_forward"}"#).unwrap();
        assert_eq!(policy.crit, SeverityAction::RecordAndForward);
        assert_eq!(policy.error, SeverityAction::RecordAndForward);
        assert_eq!(policy.info, SeverityAction::Record);
    }
}
