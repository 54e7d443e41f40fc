//! Decides where a chat turn is persisted and implements the two ways of
//! removing history: flag-only discard and targeted hard delete.

use std::collections::HashSet;
use tracing::{debug, info};

use crate::profile_db::UserProfile;

/// Flags that feed the persistence decision for one exchange.
#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceInputs {
    pub is_discarded: bool,
    pub save_to_history: bool,
    pub profile_discards: bool,
    pub is_roleplay: bool,
}

/// Why an exchange stays out of the main history.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Discarded,
    Roleplay,
    ProfileDiscards,
    CallerOptOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PersistenceDecision {
    pub save_to_history: bool,
    pub is_discarded: bool,
    pub skip: Option<SkipReason>,
}

impl PersistenceDecision {
    /// Main-history append happens only when nothing vetoed it.
    pub fn appends_to_main_history(&self) -> bool {
        self.skip.is_none() && self.save_to_history && !self.is_discarded
    }
}

/// First matching rule wins: explicit discard, roleplay, profile-level
/// discard, then the caller's own choice.
pub fn decide(inputs: PersistenceInputs) -> PersistenceDecision {
    let decision = if inputs.is_discarded {
        PersistenceDecision { save_to_history: false, is_discarded: true, skip: Some(SkipReason::Discarded) }
    } else if inputs.is_roleplay {
        PersistenceDecision { save_to_history: false, is_discarded: false, skip: Some(SkipReason::Roleplay) }
    } else if inputs.profile_discards {
        PersistenceDecision { save_to_history: false, is_discarded: true, skip: Some(SkipReason::ProfileDiscards) }
    } else if !inputs.save_to_history {
        PersistenceDecision { save_to_history: false, is_discarded: false, skip: Some(SkipReason::CallerOptOut) }
    } else {
        PersistenceDecision { save_to_history: true, is_discarded: false, skip: None }
    };
    debug!("Persistence decision: {:?}", decision);
    decision
}

/// Which entries a discard flags.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscardSelector {
    pub conversation_id: Option<String>,
    pub batch_id: Option<String>,
    pub force_clear: bool,
}

impl DiscardSelector {
    fn matches(&self, conversation_id: Option<&str>, batch_id: Option<&str>) -> bool {
        if self.force_clear {
            return true;
        }
        let by_conversation = matches!(
            (self.conversation_id.as_deref(), conversation_id),
            (Some(wanted), Some(actual)) if !wanted.is_empty() && wanted == actual
        );
        let by_batch = matches!(
            (self.batch_id.as_deref(), batch_id),
            (Some(wanted), Some(actual)) if !wanted.is_empty() && wanted == actual
        );
        by_conversation || by_batch
    }
}

/// Turns discarding on for the profile and flags matching entries.
/// Nothing is removed. Returns how many entries matched.
pub fn discard(profile: &mut UserProfile, selector: &DiscardSelector) -> usize {
    profile.preferences.discard_conversation = true;
    profile.preferences.save_to_history = false;

    let mut marked = 0;
    for entry in profile.chat_history.iter_mut() {
        if selector.matches(entry.conversation_id.as_deref(), entry.batch_id.as_deref()) {
            entry.is_discarded = true;
            marked += 1;
        }
    }
    info!("Marked {} entries as discarded for {}", marked, profile.username);
    marked
}

/// Strategies tried by [`hard_delete`], in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteStrategy {
    BatchId,
    ConversationId,
    Timestamps,
    SingleIdFragment,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub removed: usize,
    /// The strategy that removed entries, `None` when nothing matched.
    pub strategy: Option<DeleteStrategy>,
}

/// Physically removes entries. Strategies run in order and the first one
/// that removes anything ends the search.
pub fn hard_delete(profile: &mut UserProfile, batch_id: Option<&str>, timestamps: &[String]) -> DeleteOutcome {
    let batch_id = batch_id.filter(|id| !id.is_empty());
    let wanted_timestamps: HashSet<&str> = timestamps.iter().map(String::as_str).collect();

    let strategies = [
        DeleteStrategy::BatchId,
        DeleteStrategy::ConversationId,
        DeleteStrategy::Timestamps,
        DeleteStrategy::SingleIdFragment,
    ];

    for strategy in strategies {
        let removed = match (strategy, batch_id) {
            (DeleteStrategy::BatchId, Some(id)) => {
                remove_where(profile, |e| e.batch_id.as_deref() == Some(id))
            }
            (DeleteStrategy::ConversationId, Some(id)) => {
                remove_where(profile, |e| e.conversation_id.as_deref() == Some(id))
            }
            (DeleteStrategy::Timestamps, _) if !wanted_timestamps.is_empty() => {
                remove_where(profile, |e| wanted_timestamps.contains(e.timestamp.as_str()))
            }
            (DeleteStrategy::SingleIdFragment, Some(id)) => match single_id_fragment(id) {
                Some(fragment) => remove_where(profile, |e| e.timestamp.contains(fragment)),
                None => 0,
            },
            _ => 0,
        };

        if removed > 0 {
            info!("Deleted {} entries for {} by {:?}", removed, profile.username, strategy);
            return DeleteOutcome { removed, strategy: Some(strategy) };
        }
    }

    DeleteOutcome { removed: 0, strategy: None }
}

/// Physically removes every entry of one batch, nothing else.
pub fn delete_batch(profile: &mut UserProfile, batch_id: &str) -> usize {
    let removed = remove_where(profile, |e| e.batch_id.as_deref() == Some(batch_id));
    info!("Deleted {} entries of batch {} for {}", removed, batch_id, profile.username);
    removed
}

/// `single-<fragment>-...` ids carry a piece of the entry timestamp.
fn single_id_fragment(id: &str) -> Option<&str> {
    if !id.starts_with("single-") {
        return None;
    }
    id.split('-').nth(1).filter(|fragment| !fragment.is_empty())
}

fn remove_where<F>(profile: &mut UserProfile, predicate: F) -> usize
where
    F: Fn(&crate::profile_db::ChatEntry) -> bool,
{
    let before = profile.chat_history.len();
    profile.chat_history.retain(|entry| !predicate(entry));
    before - profile.chat_history.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile_db::ChatEntry;
    use proptest::prelude::*;

    fn entry(conversation: Option<&str>, batch: Option<&str>, timestamp: &str) -> ChatEntry {
        ChatEntry {
            conversation_id: conversation.map(str::to_string),
            batch_id: batch.map(str::to_string),
            timestamp: timestamp.to_string(),
            ..ChatEntry::exchange("hi", "hello")
        }
    }

    fn create_test_profile() -> UserProfile {
        let mut profile = UserProfile::new_default("sam");
        profile.chat_history = vec![
            entry(Some("c1"), Some("b0"), "2024-03-01T09:00:00Z"),
            entry(Some("c1"), Some("b0"), "2024-03-01T09:01:00Z"),
            entry(Some("c2"), Some("b2"), "2024-03-02T10:00:00Z"),
            entry(None, None, "2024-03-03T11:00:00Z"),
        ];
        profile
    }

    // ===== Decision =====

    #[test]
    fn test_decision_order() {
        let all = PersistenceInputs { is_discarded: true, save_to_history: true, profile_discards: true, is_roleplay: true };
        assert_eq!(decide(all).skip, Some(SkipReason::Discarded));

        let roleplay = PersistenceInputs { is_roleplay: true, profile_discards: true, save_to_history: true, ..Default::default() };
        let decision = decide(roleplay);
        assert_eq!(decision.skip, Some(SkipReason::Roleplay));
        assert!(!decision.is_discarded);

        let profile = PersistenceInputs { profile_discards: true, save_to_history: true, ..Default::default() };
        let decision = decide(profile);
        assert_eq!(decision.skip, Some(SkipReason::ProfileDiscards));
        assert!(decision.is_discarded);

        let opt_out = PersistenceInputs::default();
        assert_eq!(decide(opt_out).skip, Some(SkipReason::CallerOptOut));

        let save = PersistenceInputs { save_to_history: true, ..Default::default() };
        assert!(decide(save).appends_to_main_history());
    }

    #[test]
    fn test_only_clean_inputs_append() {
        for bits in 0u8..16 {
            let inputs = PersistenceInputs {
                is_discarded: bits & 1 != 0,
                save_to_history: bits & 2 != 0,
                profile_discards: bits & 4 != 0,
                is_roleplay: bits & 8 != 0,
            };
            let expected = inputs.save_to_history && !inputs.is_discarded && !inputs.profile_discards && !inputs.is_roleplay;
            assert_eq!(decide(inputs).appends_to_main_history(), expected, "{:?}", inputs);
        }
    }

    // ===== Discard =====

    #[test]
    fn test_discard_by_conversation_flags_and_updates_preferences() {
        let mut profile = create_test_profile();
        let selector = DiscardSelector { conversation_id: Some("c1".into()), ..Default::default() };

        assert_eq!(discard(&mut profile, &selector), 2);
        assert_eq!(profile.chat_history.len(), 4);
        assert!(profile.preferences.discard_conversation);
        assert!(!profile.preferences.save_to_history);
        assert_eq!(profile.active_history_len(), 2);
    }

    #[test]
    fn test_discard_by_batch_and_force() {
        let mut profile = create_test_profile();
        let by_batch = DiscardSelector { batch_id: Some("b2".into()), ..Default::default() };
        assert_eq!(discard(&mut profile, &by_batch), 1);

        let force = DiscardSelector { force_clear: true, ..Default::default() };
        assert_eq!(discard(&mut profile, &force), 4);
        assert_eq!(profile.active_history_len(), 0);
    }

    #[test]
    fn test_discard_without_selector_flags_nothing() {
        let mut profile = create_test_profile();
        assert_eq!(discard(&mut profile, &DiscardSelector::default()), 0);
        assert!(profile.preferences.discard_conversation);
    }

    // ===== Hard delete =====

    #[test]
    fn test_hard_delete_prefers_batch_id() {
        let mut profile = create_test_profile();
        let outcome = hard_delete(&mut profile, Some("b0"), &["2024-03-03T11:00:00Z".to_string()]);
        assert_eq!(outcome, DeleteOutcome { removed: 2, strategy: Some(DeleteStrategy::BatchId) });
        assert_eq!(profile.chat_history.len(), 2);
    }

    #[test]
    fn test_delete_batch_ignores_conversation_ids() {
        let mut profile = create_test_profile();
        assert_eq!(delete_batch(&mut profile, "c2"), 0);
        assert_eq!(delete_batch(&mut profile, "b0"), 2);
        assert!(profile.chat_history.iter().all(|e| e.batch_id.as_deref() != Some("b0")));
        assert_eq!(profile.chat_history.len(), 2);
    }

    #[test]
    fn test_hard_delete_by_conversation_id() {
        let mut profile = create_test_profile();
        let outcome = hard_delete(&mut profile, Some("c2"), &[]);
        assert_eq!(outcome.strategy, Some(DeleteStrategy::ConversationId));
        assert_eq!(outcome.removed, 1);
    }

    #[test]
    fn test_hard_delete_falls_through_to_timestamps() {
        let mut profile = create_test_profile();
        let outcome = hard_delete(&mut profile, Some("b1"), &["2024-03-02T10:00:00Z".to_string()]);
        assert_eq!(outcome, DeleteOutcome { removed: 1, strategy: Some(DeleteStrategy::Timestamps) });
        assert!(profile.chat_history.iter().all(|e| e.timestamp != "2024-03-02T10:00:00Z"));
    }

    #[test]
    fn test_hard_delete_single_id_fragment() {
        let mut profile = create_test_profile();
        let outcome = hard_delete(&mut profile, Some("single-2024"), &[]);
        assert_eq!(outcome.strategy, Some(DeleteStrategy::SingleIdFragment));
        assert_eq!(outcome.removed, 4);

        let mut profile = create_test_profile();
        let outcome = hard_delete(&mut profile, Some("nothing"), &[]);
        assert_eq!(outcome, DeleteOutcome { removed: 0, strategy: None });
        assert_eq!(profile.chat_history.len(), 4);
    }

    proptest! {
        #[test]
        fn prop_discard_flags_matches_and_keeps_count(
            specs in proptest::collection::vec((0u8..3, 0u8..3), 0..20),
            target in 0u8..3,
        ) {
            let mut profile = UserProfile::new_default("prop");
            profile.chat_history = specs
                .iter()
                .map(|(c, b)| {
                    let conversation = format!("c{}", c);
                    let batch = format!("b{}", b);
                    entry(Some(&conversation), Some(&batch), "2024-01-01T00:00:00Z")
                })
                .collect();
            let before = profile.chat_history.len();
            let wanted = format!("c{}", target);
            let selector = DiscardSelector { conversation_id: Some(wanted.clone()), ..Default::default() };

            let marked = discard(&mut profile, &selector);

            prop_assert_eq!(profile.chat_history.len(), before);
            prop_assert_eq!(marked, specs.iter().filter(|(c, _)| *c == target).count());
            for e in &profile.chat_history {
                if e.conversation_id.as_deref() == Some(wanted.as_str()) {
                    prop_assert!(e.is_discarded);
                }
            }
        }
    }
}
