mod channels;
mod command;
mod timers;

pub use channels::*;
pub use command::process_command;
pub use timers::TokioTimers;

use anyhow::{Context, Result};
use tokio::signal::unix::{signal, SignalKind};

use crate::core::{Config, LifecycleCoordinator};
use crate::ipc::IpcServer;
use crate::rules_store::{watch_rules_file, RulesStore};
use crate::x11::{spawn_event_thread, X11Backend};
use hashira_ipc::Command;

pub struct App {}

impl App {
    pub fn run(config: Config) -> Result<()> {
        let rules_store = RulesStore::new(&config.rules_path);
        let rules = match rules_store.load() {
            Ok(rules) => rules,
            Err(e) => {
                tracing::warn!("Starting without rules: {}", e);
                Vec::new()
            }
        };

        let backend = X11Backend::connect().context("Failed to connect to the X server")?;

        // Reconciliation is single threaded; only the X11 reader and the
        // rules watcher run on their own threads.
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        runtime.block_on(Self::run_async(config, backend, rules_store, rules))
    }

    async fn run_async(
        config: Config,
        backend: X11Backend,
        rules_store: RulesStore,
        rules: Vec<hashira_ipc::WindowRule>,
    ) -> Result<()> {
        let Channels {
            event_tx,
            mut event_rx,
            ipc_tx,
            mut ipc_rx,
        } = create_channels();

        spawn_event_thread(backend.clone(), event_tx.clone())
            .context("Failed to start X11 event thread")?;
        watch_rules_file(rules_store.clone(), event_tx.clone())
            .context("Failed to start rules watcher")?;

        let ipc_server = IpcServer::new(&config.socket_path, ipc_tx);
        tokio::spawn(async move {
            if let Err(e) = ipc_server.run().await {
                tracing::error!("IPC server error: {}", e);
            }
        });

        let mut coordinator = LifecycleCoordinator::new(
            backend.clone(),
            backend,
            TokioTimers::new(event_tx),
            rules,
            config.debounce_delay,
        );
        coordinator.start();

        let mut sigterm = signal(SignalKind::terminate())?;
        tracing::info!("Event loop started");

        loop {
            tokio::select! {
                Some(event) = event_rx.recv() => {
                    coordinator.handle_event(event);
                }
                Some((cmd, resp_tx)) = ipc_rx.recv() => {
                    let response = process_command(&mut coordinator, &rules_store, &cmd);
                    let _ = resp_tx.send(response).await;
                    if matches!(cmd, Command::Quit) {
                        break;
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT");
                    break;
                }
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM");
                    break;
                }
                else => break,
            }
        }

        coordinator.shutdown();
        tracing::info!("Event loop exited");
        Ok(())
    }
}
