use std::time::Duration;

use thiserror::Error;

use crate::core::{Behavior, WindowId, WorkspaceId};

/// Snapshot of a window as reported by the windowing environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowInfo {
    pub id: WindowId,
    pub title: Option<String>,
    pub class: Option<String>,
    /// None while the window is not attached to any workspace.
    pub workspace: Option<WorkspaceId>,
    pub behavior: Behavior,
}

impl WindowInfo {
    pub fn is_attached(&self) -> bool {
        self.workspace.is_some()
    }

    /// Freshly created windows often have neither title nor class yet.
    pub fn has_metadata(&self) -> bool {
        let present = |s: &Option<String>| s.as_deref().is_some_and(|s| !s.is_empty());
        present(&self.title) || present(&self.class)
    }

    pub fn display_name(&self) -> &str {
        self.title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or("Unknown")
    }
}

/// Opaque handle for a title-change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(pub u64);

/// Opaque handle for a scheduled one-shot timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(pub u64);

#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("window {0:#x} no longer exists")]
    WindowGone(WindowId),
    #[error("connection error: {0}")]
    Connection(String),
    #[error("request failed: {0}")]
    Request(String),
}

/// Trait for querying window information from the system.
/// This abstraction allows mocking in tests.
pub trait WindowSystem {
    /// Returns None once the window has been destroyed.
    fn window_info(&self, window_id: WindowId) -> Option<WindowInfo>;
    fn active_workspace_windows(&self) -> Vec<WindowId>;
}

/// Trait for manipulating windows (side effects).
/// This abstraction allows mocking in tests.
pub trait WindowManipulator {
    fn make_above(&self, window_id: WindowId) -> Result<(), PlatformError>;
    fn unmake_above(&self, window_id: WindowId) -> Result<(), PlatformError>;
    fn stick(&self, window_id: WindowId) -> Result<(), PlatformError>;
    fn unstick(&self, window_id: WindowId) -> Result<(), PlatformError>;
    fn subscribe_title(&self, window_id: WindowId) -> Result<SubscriptionId, PlatformError>;
    /// Must tolerate subscriptions whose window is already gone.
    fn unsubscribe_title(&self, subscription: SubscriptionId);
}

/// One-shot timers delivering a debounce event for a window.
pub trait Timers {
    fn schedule(&mut self, window_id: WindowId, delay: Duration) -> TimerId;
    /// Safe to call for timers that already fired or were cancelled.
    fn cancel(&mut self, timer: TimerId);
    fn pending(&self) -> usize;
}
