use std::collections::BTreeSet;
use std::time::Duration;

use super::engine::strip_behavior;
use super::{
    Evaluation, Phase, ReconciliationEngine, RuleSet, SkipReason, StateStore, WindowId,
    WindowState,
};
use crate::event::Event;
use crate::platform::{TimerId, Timers, WindowManipulator, WindowSystem};
use hashira_ipc::WindowRule;

/// Drives the per-window state machine and owns every subscription and
/// debounce timer. All mutations of window bookkeeping go through here.
pub struct LifecycleCoordinator<S, M, T> {
    window_system: S,
    manipulator: M,
    timers: T,
    engine: ReconciliationEngine,
    store: StateStore,
    debounce_delay: Duration,
}

impl<S, M, T> LifecycleCoordinator<S, M, T>
where
    S: WindowSystem,
    M: WindowManipulator,
    T: Timers,
{
    pub fn new(
        window_system: S,
        manipulator: M,
        timers: T,
        rules: Vec<WindowRule>,
        debounce_delay: Duration,
    ) -> Self {
        Self {
            window_system,
            manipulator,
            timers,
            engine: ReconciliationEngine::new(RuleSet::new(rules)),
            store: StateStore::new(),
            debounce_delay,
        }
    }

    pub fn store(&self) -> &StateStore {
        &self.store
    }

    pub fn rules(&self) -> &RuleSet {
        self.engine.rules()
    }

    pub fn window_system(&self) -> &S {
        &self.window_system
    }

    pub fn timers(&self) -> &T {
        &self.timers
    }

    /// Tracks and reconciles every window already on the active workspace.
    pub fn start(&mut self) {
        let windows = self.window_system.active_workspace_windows();
        tracing::info!(
            "Starting with {} rules, {} windows on the active workspace",
            self.engine.rules().len(),
            windows.len()
        );
        for window_id in windows {
            if self.observe(window_id) {
                self.reconcile(window_id);
            }
        }
    }

    pub fn handle_event(&mut self, event: Event) {
        tracing::debug!("Handling event: {:?}", event);
        match event {
            Event::WindowCreated { window_id } => self.on_window_created(window_id),
            Event::WindowRemoved { window_id } => self.on_window_removed(window_id),
            Event::TitleChanged { window_id } => self.on_title_changed(window_id),
            Event::WorkspaceSwitched => self.on_workspace_switched(),
            Event::RulesChanged { rules } => self.update_rules(rules),
            Event::DebounceElapsed { window_id, timer } => {
                self.on_debounce_elapsed(window_id, timer)
            }
        }
    }

    fn on_window_created(&mut self, window_id: WindowId) {
        if self.window_system.window_info(window_id).is_none() {
            tracing::debug!("Created window {:#x} already gone", window_id);
            return;
        }
        // Metadata usually arrives shortly after creation
        if self.observe(window_id) {
            self.schedule_debounce(window_id);
        }
    }

    fn on_window_removed(&mut self, window_id: WindowId) {
        if self.forget(window_id) {
            tracing::info!("Window {:#x} removed", window_id);
        }
    }

    fn on_title_changed(&mut self, window_id: WindowId) {
        if !self.store.contains(window_id) {
            return;
        }
        self.reconcile(window_id);
    }

    fn on_workspace_switched(&mut self) {
        let windows = self.window_system.active_workspace_windows();
        tracing::debug!("Workspace switched, {} windows active", windows.len());
        for window_id in windows {
            if self.observe(window_id) {
                self.reconcile(window_id);
            }
        }
    }

    /// Replaces the rule set and re-evaluates every known window once.
    pub fn update_rules(&mut self, rules: Vec<WindowRule>) {
        tracing::info!("Rules changed, {} rules loaded", rules.len());
        self.engine.set_rules(RuleSet::new(rules));

        let mut windows: BTreeSet<WindowId> = self.store.ids().into_iter().collect();
        windows.extend(self.window_system.active_workspace_windows());

        for window_id in windows {
            if self.observe(window_id) {
                self.reconcile(window_id);
            }
        }
    }

    fn on_debounce_elapsed(&mut self, window_id: WindowId, timer: TimerId) {
        // Releases the timer handle; a no-op for timers that already finished
        self.timers.cancel(timer);

        let Some(state) = self.store.get_mut(window_id) else {
            tracing::debug!("Debounce for untracked window {:#x} ignored", window_id);
            return;
        };
        if state.debounce != Some(timer) {
            tracing::debug!("Stale debounce for window {:#x} ignored", window_id);
            return;
        }
        state.debounce = None;
        self.reconcile(window_id);

        if let Some(state) = self.store.get_mut(window_id) {
            state.phase = Phase::Reconciled;
        }
    }

    /// Starts tracking a window. Returns true if the window is tracked
    /// afterwards.
    fn observe(&mut self, window_id: WindowId) -> bool {
        if self.store.contains(window_id) {
            return true;
        }
        match self.manipulator.subscribe_title(window_id) {
            Ok(subscription) => {
                self.store
                    .insert(window_id, WindowState::new(subscription));
                tracing::debug!("Tracking window {:#x}", window_id);
                true
            }
            Err(e) => {
                tracing::debug!("Not tracking window {:#x}: {}", window_id, e);
                false
            }
        }
    }

    fn schedule_debounce(&mut self, window_id: WindowId) {
        let Some(state) = self.store.get_mut(window_id) else {
            return;
        };
        if let Some(previous) = state.debounce.take() {
            self.timers.cancel(previous);
        }
        state.debounce = Some(self.timers.schedule(window_id, self.debounce_delay));
        state.phase = Phase::Debounced;
    }

    fn reconcile(&mut self, window_id: WindowId) {
        let result = self.engine.evaluate(
            window_id,
            &mut self.store,
            &self.window_system,
            &self.manipulator,
        );

        match result {
            Evaluation::Skipped(SkipReason::Gone) => {
                self.forget(window_id);
            }
            Evaluation::Skipped(_) => {}
            _ => {
                if let Some(state) = self.store.get_mut(window_id) {
                    if state.debounce.is_none() {
                        state.phase = Phase::Reconciled;
                    }
                }
            }
        }
    }

    /// Drops all bookkeeping for a window without touching the window.
    fn forget(&mut self, window_id: WindowId) -> bool {
        let Some(state) = self.store.remove(window_id) else {
            return false;
        };
        if let Some(timer) = state.debounce {
            self.timers.cancel(timer);
        }
        if let Some(subscription) = state.subscription {
            self.manipulator.unsubscribe_title(subscription);
        }
        true
    }

    /// Retracts owned behavior from windows that still exist, then tears
    /// down every timer and subscription. Never fails.
    pub fn shutdown(&mut self) {
        let entries = self.store.drain();
        tracing::info!("Shutting down, releasing {} windows", entries.len());

        for (window_id, state) in entries {
            if let Some(timer) = state.debounce {
                self.timers.cancel(timer);
            }
            if state.owns_behavior {
                if let Some(info) = self.window_system.window_info(window_id) {
                    strip_behavior(&info, &self.manipulator);
                }
            }
            if let Some(subscription) = state.subscription {
                self.manipulator.unsubscribe_title(subscription);
            }
        }
    }
}
