use tokio::sync::mpsc;

use crate::event::Event;
use hashira_ipc::{Command, Response};

pub type IpcCommandWithResponse = (Command, mpsc::Sender<Response>);

/// Every producer (X11 event thread, rules watcher, debounce timers) feeds
/// the same unbounded event channel so per-window order is preserved.
pub struct Channels {
    pub event_tx: mpsc::UnboundedSender<Event>,
    pub event_rx: mpsc::UnboundedReceiver<Event>,
    pub ipc_tx: mpsc::Sender<IpcCommandWithResponse>,
    pub ipc_rx: mpsc::Receiver<IpcCommandWithResponse>,
}

pub fn create_channels() -> Channels {
    // Channel: event sources -> event loop
    let (event_tx, event_rx) = mpsc::unbounded_channel::<Event>();

    // Channel: IPC server -> event loop
    let (ipc_tx, ipc_rx) = mpsc::channel::<IpcCommandWithResponse>(256);

    Channels {
        event_tx,
        event_rx,
        ipc_tx,
        ipc_rx,
    }
}
