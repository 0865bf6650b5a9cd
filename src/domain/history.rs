use serde::{Deserialize, Serialize};

use super::{AccountKind, Payload};

/// Composite of a game's two dependent history accounts.
///
/// Fields are filled independently as their subscriptions deliver data and are
/// never reset to `None` once set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub round_history: Option<Payload>,
    pub user_prediction_history: Option<Payload>,
}

impl HistoryEntry {
    /// Write one dependent payload, leaving the sibling field untouched.
    ///
    /// Returns false when `kind` is not a history kind.
    pub fn merge(&mut self, kind: AccountKind, payload: Payload) -> bool {
        match kind {
            AccountKind::RoundHistory => self.round_history = Some(payload),
            AccountKind::UserPredictionHistory => self.user_prediction_history = Some(payload),
            _ => return false,
        }
        true
    }

    pub fn is_complete(&self) -> bool {
        self.round_history.is_some() && self.user_prediction_history.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_merge_keeps_sibling() {
        let mut entry = HistoryEntry::default();
        assert!(entry.merge(AccountKind::RoundHistory, json!({"r": 1})));
        assert!(entry.merge(AccountKind::UserPredictionHistory, json!({"u": 1})));
        assert_eq!(entry.round_history, Some(json!({"r": 1})));
        assert_eq!(entry.user_prediction_history, Some(json!({"u": 1})));
        assert!(entry.is_complete());
    }

    #[test]
    fn test_merge_order_independent() {
        let mut a = HistoryEntry::default();
        a.merge(AccountKind::RoundHistory, json!(1));
        a.merge(AccountKind::UserPredictionHistory, json!(2));

        let mut b = HistoryEntry::default();
        b.merge(AccountKind::UserPredictionHistory, json!(2));
        b.merge(AccountKind::RoundHistory, json!(1));

        assert_eq!(a, b);
    }

    #[test]
    fn test_merge_ignores_top_level_kinds() {
        let mut entry = HistoryEntry::default();
        assert!(!entry.merge(AccountKind::Game, json!(1)));
        assert_eq!(entry, HistoryEntry::default());
    }

    #[test]
    fn test_serializes_absent_as_null() {
        let mut entry = HistoryEntry::default();
        entry.merge(AccountKind::RoundHistory, json!({"r": 1}));
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"roundHistory": {"r": 1}, "userPredictionHistory": null})
        );
    }
}
