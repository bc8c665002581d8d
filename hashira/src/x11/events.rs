use std::collections::HashSet;
use std::thread::JoinHandle;

use tokio::sync::mpsc;
use x11rb::connection::Connection;
use x11rb::protocol::xproto::{AtomEnum, Window};
use x11rb::protocol::Event as X11Event;

use super::X11Backend;
use crate::event::Event;

/// Spawns the thread that blocks on the X connection and turns property
/// and structure notifications into coordinator events.
pub fn spawn_event_thread(
    backend: X11Backend,
    event_tx: mpsc::UnboundedSender<Event>,
) -> std::io::Result<JoinHandle<()>> {
    std::thread::Builder::new()
        .name("x11-events".to_string())
        .spawn(move || run_event_loop(backend, event_tx))
}

fn run_event_loop(backend: X11Backend, event_tx: mpsc::UnboundedSender<Event>) {
    let mut known: HashSet<Window> = backend.client_list().into_iter().collect();
    tracing::debug!("X11 event thread started, {} clients", known.len());

    loop {
        let x11_event = match backend.connection().wait_for_event() {
            Ok(event) => event,
            Err(e) => {
                tracing::error!("X11 connection lost: {}", e);
                return;
            }
        };

        for event in translate(&backend, &mut known, x11_event) {
            if event_tx.send(event).is_err() {
                tracing::debug!("Event receiver closed, stopping X11 event thread");
                return;
            }
        }
    }
}

fn translate(backend: &X11Backend, known: &mut HashSet<Window>, event: X11Event) -> Vec<Event> {
    let atoms = backend.atoms();

    match event {
        X11Event::PropertyNotify(e) if e.window == backend.root() => {
            if e.atom == atoms._NET_CLIENT_LIST {
                let current = backend.client_list();
                let (created, removed) = diff_client_list(known, &current);
                *known = current.into_iter().collect();

                removed
                    .into_iter()
                    .map(|window_id| Event::WindowRemoved { window_id })
                    .chain(
                        created
                            .into_iter()
                            .map(|window_id| Event::WindowCreated { window_id }),
                    )
                    .collect()
            } else if e.atom == atoms._NET_CURRENT_DESKTOP {
                vec![Event::WorkspaceSwitched]
            } else {
                vec![]
            }
        }
        X11Event::PropertyNotify(e)
            if e.atom == atoms._NET_WM_NAME || e.atom == u32::from(AtomEnum::WM_NAME) =>
        {
            vec![Event::TitleChanged {
                window_id: e.window,
            }]
        }
        // Usually preceded by a client list update, which already removed it
        X11Event::DestroyNotify(e) => {
            if known.remove(&e.window) {
                vec![Event::WindowRemoved {
                    window_id: e.window,
                }]
            } else {
                vec![]
            }
        }
        X11Event::Error(e) => {
            tracing::debug!("X11 error: {:?}", e);
            vec![]
        }
        _ => vec![],
    }
}

/// Compares the previous and current `_NET_CLIENT_LIST`. Returns created
/// windows in list order and removed windows in ascending order.
pub fn diff_client_list(known: &HashSet<Window>, current: &[Window]) -> (Vec<Window>, Vec<Window>) {
    let created: Vec<Window> = current
        .iter()
        .filter(|window| !known.contains(window))
        .copied()
        .collect();

    let current: HashSet<Window> = current.iter().copied().collect();
    let mut removed: Vec<Window> = known.difference(&current).copied().collect();
    removed.sort_unstable();

    (created, removed)
}
