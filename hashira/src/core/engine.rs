use super::{Behavior, RuleSet, StateStore, WindowId, WindowState};
use crate::effect::{execute_effects, Effect};
use crate::platform::{WindowInfo, WindowManipulator, WindowSystem};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No bookkeeping exists for the window.
    Untracked,
    /// The window was destroyed.
    Gone,
    /// The window exists but is not on any workspace.
    Detached,
    /// Neither title nor class is available yet.
    NoMetadata,
}

/// Outcome of a single evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    Skipped(SkipReason),
    /// No rule matched and nothing was owned.
    Unmanaged,
    /// A rule matched and the window already had its behavior.
    Unchanged,
    Applied(Vec<Effect>),
    /// Owned behavior was retracted.
    Stripped(Vec<Effect>),
    /// A rule matched but at least one mutation failed.
    Failed,
}

/// Evaluates windows against the current rule set and applies the
/// difference between what a rule wants and what the window has.
#[derive(Debug, Default)]
pub struct ReconciliationEngine {
    rules: RuleSet,
}

impl ReconciliationEngine {
    pub fn new(rules: RuleSet) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &RuleSet {
        &self.rules
    }

    pub fn set_rules(&mut self, rules: RuleSet) {
        self.rules = rules;
    }

    pub fn evaluate<S: WindowSystem, M: WindowManipulator>(
        &self,
        window_id: WindowId,
        store: &mut StateStore,
        window_system: &S,
        manipulator: &M,
    ) -> Evaluation {
        let Some(state) = store.get_mut(window_id) else {
            return Evaluation::Skipped(SkipReason::Untracked);
        };

        // Destruction races are expected here, not errors
        let Some(info) = window_system.window_info(window_id) else {
            tracing::debug!("Window {:#x} is gone, skipping", window_id);
            return Evaluation::Skipped(SkipReason::Gone);
        };
        if !info.is_attached() {
            tracing::debug!("Window {:#x} is not on a workspace, skipping", window_id);
            return Evaluation::Skipped(SkipReason::Detached);
        }
        if !info.has_metadata() {
            tracing::debug!("Window {:#x} has no title or class yet", window_id);
            return Evaluation::Skipped(SkipReason::NoMetadata);
        }

        if self.rules.is_empty() {
            return release(state, &info, manipulator);
        }

        match self
            .rules
            .find_match(info.title.as_deref(), info.class.as_deref())
        {
            Some(rule) => {
                let desired = Behavior::from_rule(rule);
                tracing::debug!(
                    "Window {:#x} ({}) matched rule \"{}\"",
                    window_id,
                    info.display_name(),
                    rule.pattern
                );
                apply(state, &info, desired, manipulator)
            }
            None => release(state, &info, manipulator),
        }
    }
}

fn apply<M: WindowManipulator>(
    state: &mut WindowState,
    info: &WindowInfo,
    desired: Behavior,
    manipulator: &M,
) -> Evaluation {
    state.owns_behavior = true;

    let effects = Effect::plan(info.behavior, desired);
    if effects.is_empty() {
        return Evaluation::Unchanged;
    }

    tracing::info!(
        "Applying rules to {} ({:#x}): sticky={}, above={}",
        info.display_name(),
        info.id,
        desired.sticky,
        desired.above
    );

    let errors = execute_effects(manipulator, info.id, &effects);
    if errors.is_empty() {
        Evaluation::Applied(effects)
    } else {
        // The window's state is unknown now; stop claiming it
        state.owns_behavior = false;
        Evaluation::Failed
    }
}

fn release<M: WindowManipulator>(
    state: &mut WindowState,
    info: &WindowInfo,
    manipulator: &M,
) -> Evaluation {
    if !state.owns_behavior {
        return Evaluation::Unmanaged;
    }

    tracing::info!("Removing rules from {} ({:#x})", info.display_name(), info.id);
    let effects = strip_behavior(info, manipulator);
    state.owns_behavior = false;
    Evaluation::Stripped(effects)
}

/// Clears above and sticky on a window, touching only what is set.
/// Failures are logged and otherwise ignored.
pub fn strip_behavior<M: WindowManipulator>(info: &WindowInfo, manipulator: &M) -> Vec<Effect> {
    let effects = Effect::plan(info.behavior, Behavior::NONE);
    execute_effects(manipulator, info.id, &effects);
    effects
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::mock::{create_sticky_window, create_test_window, Call, MockPlatform};
    use crate::platform::SubscriptionId;
    use hashira_ipc::{MatchField, WindowRule};

    fn engine_with(rules: Vec<WindowRule>) -> ReconciliationEngine {
        ReconciliationEngine::new(RuleSet::new(rules))
    }

    fn track(store: &mut StateStore, window_id: WindowId) {
        store.insert(window_id, WindowState::new(SubscriptionId(window_id as u64)));
    }

    fn owns(store: &StateStore, window_id: WindowId) -> bool {
        store.get(window_id).is_some_and(|s| s.owns_behavior)
    }

    #[test]
    fn test_class_rule_sticks_without_above() {
        let platform =
            MockPlatform::new().with_windows(vec![create_test_window(1, "Mozilla", "Firefox")]);
        let engine = engine_with(vec![WindowRule::new(
            "Firefox",
            MatchField::Class,
            true,
            false,
        )]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Applied(vec![Effect::Stick]));
        assert_eq!(platform.calls(), vec![Call::Stick(1)]);
        assert!(owns(&store, 1));
    }

    #[test]
    fn test_anchored_title_rule_retracts_after_rename() {
        let platform =
            MockPlatform::new().with_windows(vec![create_test_window(1, "Calculator", "")]);
        let engine = engine_with(vec![WindowRule::new(
            "^Calculator$",
            MatchField::Title,
            false,
            true,
        )]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        engine.evaluate(1, &mut store, &platform, &platform);
        assert_eq!(platform.calls(), vec![Call::MakeAbove(1)]);

        platform.clear_calls();
        platform.set_title(1, "Calculator - Editing");
        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Stripped(vec![Effect::UnmakeAbove]));
        assert_eq!(platform.calls(), vec![Call::UnmakeAbove(1)]);
        assert!(!owns(&store, 1));
    }

    #[test]
    fn test_class_rule_retracts_after_class_change() {
        let platform =
            MockPlatform::new().with_windows(vec![create_test_window(1, "Mozilla", "Firefox")]);
        let engine = engine_with(vec![WindowRule::new(
            "^firefox$",
            MatchField::Class,
            true,
            false,
        )]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        engine.evaluate(1, &mut store, &platform, &platform);
        assert!(owns(&store, 1));

        platform.clear_calls();
        platform.set_class(1, "Firefox-Developer");
        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Stripped(vec![Effect::Unstick]));
        assert_eq!(platform.calls(), vec![Call::Unstick(1)]);
        assert!(!owns(&store, 1));
    }

    #[test]
    fn test_first_match_wins_never_sticks() {
        let platform = MockPlatform::new().with_windows(vec![
            create_test_window(1, "Terminal", ""),
            create_test_window(2, "Files", ""),
        ]);
        let engine = engine_with(vec![
            WindowRule::new(".*", MatchField::Title, false, true),
            WindowRule::new("Terminal", MatchField::Title, true, false),
        ]);
        let mut store = StateStore::new();
        track(&mut store, 1);
        track(&mut store, 2);

        engine.evaluate(1, &mut store, &platform, &platform);
        engine.evaluate(2, &mut store, &platform, &platform);

        assert_eq!(platform.calls(), vec![Call::MakeAbove(1), Call::MakeAbove(2)]);
        assert_eq!(platform.behavior(1), Some(Behavior::new(true, false)));
    }

    #[test]
    fn test_invalid_rule_is_skipped() {
        let platform = MockPlatform::new().with_windows(vec![create_test_window(1, "Editor", "")]);
        let engine = engine_with(vec![
            WindowRule::new("(unclosed", MatchField::Title, true, false),
            WindowRule::new("editor", MatchField::Title, false, true),
        ]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Applied(vec![Effect::MakeAbove]));
    }

    #[test]
    fn test_second_evaluation_is_idempotent() {
        let platform = MockPlatform::new().with_windows(vec![create_test_window(1, "Notes", "")]);
        let engine = engine_with(vec![WindowRule::new("Notes", MatchField::Title, true, true)]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        engine.evaluate(1, &mut store, &platform, &platform);
        assert_eq!(platform.calls().len(), 2);

        platform.clear_calls();
        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Unchanged);
        assert!(platform.calls().is_empty());
        assert!(owns(&store, 1));
    }

    #[test]
    fn test_unmanaged_window_is_never_touched() {
        let platform =
            MockPlatform::new().with_windows(vec![create_sticky_window(1, "Panel", "")]);
        platform.set_behavior(1, Behavior::new(true, true));
        let engine = engine_with(vec![WindowRule::new("Notes", MatchField::Title, true, true)]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        assert_eq!(
            engine.evaluate(1, &mut store, &platform, &platform),
            Evaluation::Unmanaged
        );
        assert_eq!(
            engine.evaluate(1, &mut store, &platform, &platform),
            Evaluation::Unmanaged
        );
        assert!(platform.calls().is_empty());
    }

    #[test]
    fn test_empty_rule_set_strips_owned_windows_only() {
        let platform = MockPlatform::new().with_windows(vec![
            create_test_window(1, "Notes", ""),
            create_sticky_window(2, "Panel", ""),
        ]);
        let mut engine =
            engine_with(vec![WindowRule::new("Notes", MatchField::Title, true, true)]);
        let mut store = StateStore::new();
        track(&mut store, 1);
        track(&mut store, 2);
        engine.evaluate(1, &mut store, &platform, &platform);
        engine.evaluate(2, &mut store, &platform, &platform);
        platform.clear_calls();

        engine.set_rules(RuleSet::new(vec![]));
        engine.evaluate(1, &mut store, &platform, &platform);
        engine.evaluate(2, &mut store, &platform, &platform);

        assert_eq!(platform.calls(), vec![Call::Unstick(1), Call::UnmakeAbove(1)]);
        assert!(!owns(&store, 1));
        assert!(!owns(&store, 2));
        assert_eq!(platform.behavior(2), Some(Behavior::new(false, true)));
    }

    #[test]
    fn test_strip_only_touches_set_behaviors() {
        let platform = MockPlatform::new().with_windows(vec![create_test_window(1, "Notes", "")]);
        let mut engine =
            engine_with(vec![WindowRule::new("Notes", MatchField::Title, false, true)]);
        let mut store = StateStore::new();
        track(&mut store, 1);
        engine.evaluate(1, &mut store, &platform, &platform);
        platform.clear_calls();

        engine.set_rules(RuleSet::new(vec![]));
        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Stripped(vec![Effect::UnmakeAbove]));
        assert_eq!(platform.calls(), vec![Call::UnmakeAbove(1)]);
    }

    #[test]
    fn test_rule_can_unset_existing_behavior() {
        let platform =
            MockPlatform::new().with_windows(vec![create_sticky_window(1, "Player", "mpv")]);
        let engine = engine_with(vec![WindowRule::new("mpv", MatchField::Class, false, true)]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(
            result,
            Evaluation::Applied(vec![Effect::Unstick, Effect::MakeAbove])
        );
        assert_eq!(platform.behavior(1), Some(Behavior::new(true, false)));
    }

    #[test]
    fn test_mutation_failure_rolls_back_ownership() {
        let platform = MockPlatform::new().with_windows(vec![create_test_window(1, "Notes", "")]);
        platform.fail_mutations(1);
        let engine = engine_with(vec![WindowRule::new("Notes", MatchField::Title, true, true)]);
        let mut store = StateStore::new();
        track(&mut store, 1);

        let result = engine.evaluate(1, &mut store, &platform, &platform);

        assert_eq!(result, Evaluation::Failed);
        // Both mutations were attempted
        assert_eq!(platform.calls(), vec![Call::Stick(1), Call::MakeAbove(1)]);
        assert!(!owns(&store, 1));
    }

    #[test]
    fn test_skips_untracked_gone_detached_and_blank_windows() {
        let platform = MockPlatform::new().with_windows(vec![
            create_test_window(1, "Notes", ""),
            create_test_window(2, "Notes", ""),
            create_test_window(3, "", ""),
        ]);
        platform.detach(2);
        let engine = engine_with(vec![WindowRule::new(".*", MatchField::Title, true, true)]);
        let mut store = StateStore::new();
        track(&mut store, 2);
        track(&mut store, 3);
        track(&mut store, 4);

        assert_eq!(
            engine.evaluate(1, &mut store, &platform, &platform),
            Evaluation::Skipped(SkipReason::Untracked)
        );
        assert_eq!(
            engine.evaluate(2, &mut store, &platform, &platform),
            Evaluation::Skipped(SkipReason::Detached)
        );
        assert_eq!(
            engine.evaluate(3, &mut store, &platform, &platform),
            Evaluation::Skipped(SkipReason::NoMetadata)
        );
        assert_eq!(
            engine.evaluate(4, &mut store, &platform, &platform),
            Evaluation::Skipped(SkipReason::Gone)
        );
        assert!(platform.calls().is_empty());
    }
}
