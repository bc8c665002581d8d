use crate::core::WindowId;
use crate::platform::TimerId;
use hashira_ipc::WindowRule;

/// Inputs to the lifecycle coordinator, produced by the window system
/// event thread, the debounce timers and the rules file watcher.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    WindowCreated { window_id: WindowId },
    WindowRemoved { window_id: WindowId },
    TitleChanged { window_id: WindowId },
    WorkspaceSwitched,
    RulesChanged { rules: Vec<WindowRule> },
    DebounceElapsed { window_id: WindowId, timer: TimerId },
}
