use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::core::WindowId;
use crate::event::Event;
use crate::platform::{TimerId, Timers};

/// Debounce timers as tokio tasks that post `DebounceElapsed` back into the
/// event loop. Must be used from within a tokio runtime.
pub struct TokioTimers {
    event_tx: mpsc::UnboundedSender<Event>,
    next_id: u64,
    handles: HashMap<TimerId, JoinHandle<()>>,
}

impl TokioTimers {
    pub fn new(event_tx: mpsc::UnboundedSender<Event>) -> Self {
        Self {
            event_tx,
            next_id: 0,
            handles: HashMap::new(),
        }
    }
}

impl Timers for TokioTimers {
    fn schedule(&mut self, window_id: WindowId, delay: Duration) -> TimerId {
        self.next_id += 1;
        let timer = TimerId(self.next_id);
        let event_tx = self.event_tx.clone();

        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = event_tx.send(Event::DebounceElapsed { window_id, timer });
        });
        self.handles.insert(timer, handle);
        timer
    }

    fn cancel(&mut self, timer: TimerId) {
        if let Some(handle) = self.handles.remove(&timer) {
            handle.abort();
        }
    }

    fn pending(&self) -> usize {
        self.handles.len()
    }
}

impl Drop for TokioTimers {
    fn drop(&mut self) {
        for (_, handle) in self.handles.drain() {
            handle.abort();
        }
    }
}
